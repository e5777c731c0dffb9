//! On-disk session storage and report export
//!
//! A session is a plain directory:
//!
//! ```text
//! <root>/
//!   images/       flattened JPEG captures
//!   metadata/     one JSON record per entry
//!   _templates/   report.md.j2, report.html.j2
//!   report.md
//!   report.html
//! ```

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{RgbImage, RgbaImage};
use serde_json::{Value, json};

use super::report::{Escape, render_str};
use super::templates::{HTML_TEMPLATE, MARKDOWN_TEMPLATE, ensure_templates, load_template};
use crate::capture::CapturedImage;
use crate::config::AnnotatorConfig;
use crate::domain::{Entry, ImageRef, Layout};
use crate::error::{Error, Result};

pub const IMAGES_DIR: &str = "images";
pub const METADATA_DIR: &str = "metadata";
pub const TEMPLATES_DIR: &str = "_templates";
pub const MARKDOWN_REPORT: &str = "report.md";
pub const HTML_REPORT: &str = "report.html";

/// Tunables for writing a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    /// JPEG quality for entry images (1-100)
    pub jpeg_quality: u8,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { jpeg_quality: 95 }
    }
}

impl From<&AnnotatorConfig> for SessionOptions {
    fn from(config: &AnnotatorConfig) -> Self {
        Self {
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionRepository {
    root: PathBuf,
    options: SessionOptions,
}

impl SessionRepository {
    /// Open (creating if needed) the session at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(root, SessionOptions::default())
    }

    pub fn open_with(root: impl Into<PathBuf>, options: SessionOptions) -> Result<Self> {
        let repo = Self {
            root: root.into(),
            options,
        };
        std::fs::create_dir_all(repo.images_dir())?;
        std::fs::create_dir_all(repo.metadata_dir())?;
        let written = ensure_templates(&repo.templates_dir())?;
        if !written.is_empty() {
            log::debug!("Initialized templates {:?} in {:?}", written, repo.root);
        }
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// Directory name of the session, used as the report title
    pub fn session_name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    fn metadata_dir(&self) -> PathBuf {
        self.root.join(METADATA_DIR)
    }

    fn templates_dir(&self) -> PathBuf {
        self.root.join(TEMPLATES_DIR)
    }

    /// Write a flattened raster as JPEG, returning its session-relative path
    ///
    /// Names follow `entry_<YYYYmmdd_HHMMSS>.jpg` in local time; a `_<n>`
    /// suffix keeps saves within the same second apart.
    pub fn save_image(&self, raster: &RgbaImage) -> Result<String> {
        let dir = self.images_dir();
        std::fs::create_dir_all(&dir)?;

        // Encode first so a failed encode leaves no file behind; JPEG has no alpha
        let rgb: RgbImage = raster.convert();
        let mut bytes = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(
            &mut bytes,
            self.options.jpeg_quality,
        ))?;

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let (name, mut file) = create_unique(&dir, &stamp)?;
        let path = dir.join(&name);
        if let Err(err) = file.write_all(&bytes) {
            drop(file);
            if let Err(rm) = std::fs::remove_file(&path) {
                log::warn!("Could not remove partial image {:?}: {}", path, rm);
            }
            return Err(err.into());
        }

        log::info!("Saved image {:?}", path);
        Ok(format!("{IMAGES_DIR}/{name}"))
    }

    /// Write an entry record, replacing any record with the same id
    pub fn save_entry(&self, entry: &Entry) -> Result<PathBuf> {
        let dir = self.metadata_dir();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.json", entry.id));
        let json = serde_json::to_string_pretty(entry)?;
        std::fs::write(&path, json)?;
        log::info!("Saved entry {} ({:?})", entry.id, entry.title);
        Ok(path)
    }

    /// Save a flattened raster together with a new entry describing it
    pub fn save_annotated(
        &self,
        raster: &RgbaImage,
        title: &str,
        notes: &str,
        layout: Layout,
        tags: Vec<String>,
    ) -> Result<Entry> {
        let path = self.save_image(raster)?;
        let mut image = ImageRef::new(path, raster.width(), raster.height());
        image.quality = Some(self.options.jpeg_quality);

        let mut entry = Entry::new(title, notes, layout, image);
        entry.tags = tags;
        self.save_entry(&entry)?;
        Ok(entry)
    }

    /// All entries, oldest first
    ///
    /// Records are read in file name order and then stably sorted by
    /// timestamp; records with unparseable timestamps come first. Any
    /// record that does not parse aborts the load.
    pub fn load_entries(&self) -> Result<Vec<Entry>> {
        let dir = self.metadata_dir();
        let mut paths = match std::fs::read_dir(&dir) {
            Ok(read_dir) => read_dir
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
                .collect::<Vec<_>>(),
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        paths.sort();

        let mut entries = paths
            .iter()
            .map(|path| read_entry(path))
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by_key(Entry::parsed_timestamp);
        log::debug!("Loaded {} entries from {:?}", entries.len(), dir);
        Ok(entries)
    }

    /// Look up a single entry by id
    pub fn entry(&self, id: &str) -> Result<Option<Entry>> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Ok(None);
        }
        let path = self.metadata_dir().join(format!("{id}.json"));
        if !path.is_file() {
            return Ok(None);
        }
        read_entry(&path).map(Some)
    }

    /// Re-open an entry's saved image, e.g. to annotate it again
    pub fn load_entry_image(&self, entry: &Entry) -> Result<CapturedImage> {
        CapturedImage::open(&self.asset_path(&entry.image.path)?)
    }

    /// Resolve a session-relative asset path
    ///
    /// Absolute paths and any `..`, root or prefix component are rejected
    /// with `MissingAsset`, so records can only point inside the session.
    pub fn asset_path(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);
        let inside = !relative.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !inside {
            return Err(Error::MissingAsset(path.to_path_buf()));
        }
        Ok(self.root.join(path))
    }

    /// Render `report.md` from the session's Markdown template
    pub fn export_markdown(&self) -> Result<PathBuf> {
        let entries = self.load_entries()?;
        let context = json!({ "entries": entries });
        let source = load_template(&self.templates_dir(), MARKDOWN_TEMPLATE)?;
        let report = render_str(&source, &context, Escape::None)?;

        let out = self.root.join(MARKDOWN_REPORT);
        std::fs::write(&out, report)?;
        log::info!("Exported {} entries to {:?}", entries.len(), out);
        Ok(out)
    }

    /// Render a self-contained `report.html` with images embedded as base64
    ///
    /// Entries whose image file is missing are still exported, with
    /// `image_base64` set to null.
    pub fn export_html(&self) -> Result<PathBuf> {
        let entries = self.load_entries()?;
        let mut embedded = Vec::with_capacity(entries.len());
        for entry in &entries {
            let mut value = serde_json::to_value(entry)?;
            if let Value::Object(map) = &mut value {
                let data = self.read_image_base64(entry);
                map.insert("image_base64".to_string(), data.map_or(Value::Null, Value::String));
                map.insert(
                    "image_mime".to_string(),
                    Value::from(image_mime(&entry.image.path)),
                );
            }
            embedded.push(value);
        }

        let context = json!({
            "entries": embedded,
            "session_name": self.session_name(),
            "export_date": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        });
        let source = load_template(&self.templates_dir(), HTML_TEMPLATE)?;
        let report = render_str(&source, &context, Escape::Html)?;

        let out = self.root.join(HTML_REPORT);
        std::fs::write(&out, report)?;
        log::info!("Exported {} entries to {:?}", entries.len(), out);
        Ok(out)
    }

    /// Export both the Markdown and the HTML report
    pub fn export_all(&self) -> Result<(PathBuf, PathBuf)> {
        Ok((self.export_markdown()?, self.export_html()?))
    }

    fn read_image_base64(&self, entry: &Entry) -> Option<String> {
        let path = match self.asset_path(&entry.image.path) {
            Ok(path) => path,
            Err(_) => {
                log::warn!(
                    "Image path {:?} of entry {} is outside the session, not embedding it",
                    entry.image.path,
                    entry.id
                );
                return None;
            }
        };
        match std::fs::read(&path) {
            Ok(bytes) => Some(STANDARD.encode(bytes)),
            Err(err) => {
                log::warn!("Image for entry {} unavailable at {:?}: {}", entry.id, path, err);
                None
            }
        }
    }
}

fn read_entry(path: &Path) -> Result<Entry> {
    let json = std::fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|source| Error::CorruptEntry {
        path: path.to_path_buf(),
        source,
    })
}

/// Create `entry_<stamp>.jpg`, or the first free `entry_<stamp>_<n>.jpg`
fn create_unique(dir: &Path, stamp: &str) -> Result<(String, File)> {
    let mut n = 0u32;
    loop {
        let name = match n {
            0 => format!("entry_{stamp}.jpg"),
            n => format!("entry_{stamp}_{n}.jpg"),
        };
        match OpenOptions::new().write(true).create_new(true).open(dir.join(&name)) {
            Ok(file) => return Ok((name, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => n += 1,
            Err(err) => return Err(err.into()),
        }
    }
}

fn image_mime(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::AnnotationModel;
    use crate::domain::{Point, Tool};
    use crate::render::{FontFace, RenderEngine};
    use image::Rgba;
    use tempfile::TempDir;

    fn session() -> (TempDir, SessionRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = SessionRepository::open(dir.path().join("bug-bash")).unwrap();
        (dir, repo)
    }

    fn raster(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([200, 210, 220, 255]))
    }

    fn entry_at(title: &str, timestamp: &str) -> Entry {
        let mut e = Entry::new(title, "", Layout::ImageLeft, ImageRef::new("images/none.jpg", 1, 1));
        e.timestamp = timestamp.to_string();
        e
    }

    #[test]
    fn test_open_creates_layout() {
        let (_dir, repo) = session();
        for sub in [IMAGES_DIR, METADATA_DIR, TEMPLATES_DIR] {
            assert!(repo.root().join(sub).is_dir(), "{sub} missing");
        }
        assert!(repo.root().join(TEMPLATES_DIR).join(MARKDOWN_TEMPLATE).is_file());
        assert!(repo.root().join(TEMPLATES_DIR).join(HTML_TEMPLATE).is_file());
        assert_eq!(repo.session_name(), "bug-bash");
    }

    #[test]
    fn test_annotated_capture_round_trip() {
        let (_dir, repo) = session();

        let mut model = AnnotationModel::new(RenderEngine::with_font(FontFace::Builtin));
        model.load_image(CapturedImage::new(raster(100, 100)).unwrap());
        model.set_active_tool(Tool::Box, None, None);
        model.begin_stroke(Point::new(10.0, 10.0));
        model.end_stroke(Point::new(60.0, 50.0)).unwrap();

        let flattened = model.take_for_save().unwrap();
        let entry = repo
            .save_annotated(&flattened, "Login button", "Misaligned", Layout::ImageTop, vec![
                "ui".to_string(),
            ])
            .unwrap();

        let loaded = repo.load_entries().unwrap();
        assert_eq!(loaded, vec![entry.clone()]);
        assert_eq!((entry.image.width, entry.image.height), (100, 100));
        assert_eq!(entry.image.quality, Some(95));
        assert!(entry.image.path.starts_with("images/entry_"));

        let reopened = repo.load_entry_image(&entry).unwrap();
        assert_eq!(reopened.dimensions(), (100, 100));
        // The box outline survived JPEG compression as a reddish edge
        let edge = reopened.rgba.get_pixel(11, 30);
        assert!(edge[0] > 180 && edge[1] < 120, "edge pixel {edge:?}");
    }

    #[test]
    fn test_entry_record_round_trip() {
        let (_dir, repo) = session();
        let mut entry = Entry::new("t", "n", Layout::ImageLeft, ImageRef::new("images/x.jpg", 3, 4));
        entry.tags = vec!["a".to_string(), "b".to_string()];
        entry.context.insert("app".to_string(), json!({"window": "Settings", "pid": 42}));

        let path = repo.save_entry(&entry).unwrap();
        assert_eq!(path.file_name().unwrap(), format!("{}.json", entry.id).as_str());
        assert_eq!(repo.entry(&entry.id).unwrap(), Some(entry.clone()));
        assert_eq!(repo.entry("nope").unwrap(), None);
        assert_eq!(repo.entry("../escape").unwrap(), None);
    }

    #[test]
    fn test_entries_sorted_by_timestamp() {
        let (_dir, repo) = session();
        let mut late = entry_at("late", "2026-03-01T10:00:00.000000+00:00");
        late.id = "aaaaaaaa".to_string();
        let mut early = entry_at("early", "2026-03-01T11:00:00.000000+02:00");
        early.id = "bbbbbbbb".to_string();
        let mut broken = entry_at("broken", "yesterday");
        broken.id = "cccccccc".to_string();
        for e in [&late, &early, &broken] {
            repo.save_entry(e).unwrap();
        }

        let titles: Vec<String> = repo.load_entries().unwrap().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, ["broken", "early", "late"]);
    }

    #[test]
    fn test_corrupt_entry_aborts_load() {
        let (_dir, repo) = session();
        repo.save_entry(&entry_at("fine", "2026-01-01T00:00:00+00:00")).unwrap();
        let bad = repo.root().join(METADATA_DIR).join("zzzz.json");
        std::fs::write(&bad, "{ not json").unwrap();

        match repo.load_entries() {
            Err(Error::CorruptEntry { path, .. }) => assert_eq!(path, bad),
            other => panic!("expected CorruptEntry, got {other:?}"),
        }
    }

    #[test]
    fn test_same_second_saves_do_not_collide() {
        let (_dir, repo) = session();
        let paths: Vec<String> = (0..3).map(|_| repo.save_image(&raster(8, 8)).unwrap()).collect();
        assert_ne!(paths[0], paths[1]);
        assert_ne!(paths[1], paths[2]);
        for p in &paths {
            assert!(repo.root().join(p).is_file());
        }
    }

    #[test]
    fn test_markdown_export_idempotent() {
        let (_dir, repo) = session();
        repo.save_annotated(&raster(20, 10), "First", "notes 1", Layout::ImageLeft, vec![])
            .unwrap();
        repo.save_annotated(&raster(20, 10), "Second", "notes 2", Layout::ImageLeft, vec![])
            .unwrap();

        let out = repo.export_markdown().unwrap();
        let first = std::fs::read(&out).unwrap();
        repo.export_markdown().unwrap();
        let second = std::fs::read(&out).unwrap();
        assert_eq!(first, second);

        let text = String::from_utf8(first).unwrap();
        assert!(text.contains("## First"));
        assert!(text.contains("| notes 2 |"));
        assert!(text.contains("](images/entry_"));
    }

    #[test]
    fn test_html_export_with_missing_image() {
        let (_dir, repo) = session();
        let mut saved = Vec::new();
        for title in ["one", "two", "<three>"] {
            saved.push(
                repo.save_annotated(&raster(16, 16), title, "", Layout::ImageLeft, vec![])
                    .unwrap(),
            );
        }
        std::fs::remove_file(repo.root().join(&saved[1].image.path)).unwrap();

        let html = std::fs::read_to_string(repo.export_html().unwrap()).unwrap();
        assert_eq!(html.matches("data:image/jpeg;base64,").count(), 2);
        assert_eq!(html.matches("Image not found").count(), 1);
        assert!(html.contains("&lt;three&gt;"));
        assert!(!html.contains("<three>"));
        assert!(html.contains("<title>bug-bash</title>"));
    }

    #[test]
    fn test_export_falls_back_when_template_deleted() {
        let (_dir, repo) = session();
        std::fs::remove_file(repo.root().join(TEMPLATES_DIR).join(MARKDOWN_TEMPLATE)).unwrap();
        repo.save_annotated(&raster(4, 4), "Only", "", Layout::ImageLeft, vec![]).unwrap();
        let text = std::fs::read_to_string(repo.export_markdown().unwrap()).unwrap();
        assert!(text.contains("## Only"));
    }

    #[test]
    fn test_custom_template_used() {
        let (_dir, repo) = session();
        std::fs::write(
            repo.root().join(TEMPLATES_DIR).join(MARKDOWN_TEMPLATE),
            "{{ entries | length }} entries",
        )
        .unwrap();
        // Reopening must not restore the default
        let repo = SessionRepository::open(repo.root()).unwrap();
        repo.save_annotated(&raster(4, 4), "x", "", Layout::ImageLeft, vec![]).unwrap();
        let text = std::fs::read_to_string(repo.export_markdown().unwrap()).unwrap();
        assert_eq!(text, "1 entries");
    }

    #[test]
    fn test_failed_encode_leaves_no_file() {
        let (_dir, repo) = session();
        // Baseline JPEG is limited to 65535 pixels per side
        assert!(repo.save_image(&raster(65_536, 1)).is_err());
        let left: Vec<_> = std::fs::read_dir(repo.root().join(IMAGES_DIR)).unwrap().collect();
        assert!(left.is_empty(), "left behind {left:?}");
    }

    #[test]
    fn test_image_paths_confined_to_session() {
        let (dir, repo) = session();
        let secret = dir.path().join("secret.txt");
        std::fs::write(&secret, "do not embed").unwrap();
        let leaked = STANDARD.encode("do not embed");

        let mut escaped = Vec::new();
        for (id, path) in [
            ("escape01", "../secret.txt".to_string()),
            ("escape02", secret.to_string_lossy().into_owned()),
            ("escape03", "images/../../secret.txt".to_string()),
        ] {
            let mut e = entry_at(id, "2026-01-01T00:00:00+00:00");
            e.id = id.to_string();
            e.image.path = path;
            repo.save_entry(&e).unwrap();
            escaped.push(e);
        }

        let html = std::fs::read_to_string(repo.export_html().unwrap()).unwrap();
        assert!(!html.contains(&leaked));
        assert_eq!(html.matches("Image not found").count(), 3);
        for e in &escaped {
            assert!(matches!(repo.load_entry_image(e), Err(Error::MissingAsset(_))));
        }

        assert_eq!(repo.asset_path("images/a.jpg").unwrap(), repo.root().join("images/a.jpg"));
        assert!(repo.asset_path("").is_err());
    }

    #[test]
    fn test_html_template_with_full_jinja() {
        let (_dir, repo) = session();
        std::fs::write(
            repo.root().join(TEMPLATES_DIR).join(HTML_TEMPLATE),
            "{% for e in entries %}{% if e.layout == 'image-top' %}top{% elif e.image_base64 %}embedded{% endif %} {{ e.caption|default(e.title|upper) }}|{% endfor %}",
        )
        .unwrap();
        let mut top = repo
            .save_annotated(&raster(4, 4), "Header", "", Layout::ImageTop, vec![])
            .unwrap();
        top.timestamp = "2026-01-01T00:00:00+00:00".to_string();
        repo.save_entry(&top).unwrap();
        let mut left = repo
            .save_annotated(&raster(4, 4), "", "", Layout::ImageLeft, vec![])
            .unwrap();
        left.timestamp = "2026-01-02T00:00:00+00:00".to_string();
        repo.save_entry(&left).unwrap();

        let html = std::fs::read_to_string(repo.export_html().unwrap()).unwrap();
        assert_eq!(html, "top HEADER|embedded UNTITLED|");
    }

    #[test]
    fn test_missing_entry_image() {
        let (_dir, repo) = session();
        let entry = entry_at("gone", "2026-01-01T00:00:00+00:00");
        assert!(matches!(repo.load_entry_image(&entry), Err(Error::MissingAsset(_))));
    }
}
