//! Persisted session entries

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How the report places the screenshot relative to the notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layout {
    #[default]
    #[serde(rename = "image-left")]
    ImageLeft,
    #[serde(rename = "image-top")]
    ImageTop,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::ImageLeft => "image-left",
            Layout::ImageTop => "image-top",
        }
    }
}

impl std::str::FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image-left" => Ok(Layout::ImageLeft),
            "image-top" => Ok(Layout::ImageTop),
            other => Err(format!("unknown layout '{other}' (expected image-left or image-top)")),
        }
    }
}

/// Reference from an entry to its image file inside the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Path relative to the session root
    pub path: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub quality: Option<u8>,
    #[serde(default)]
    pub hires: bool,
}

impl ImageRef {
    pub fn new(path: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
            quality: None,
            hires: false,
        }
    }
}

/// One annotated capture plus its metadata
///
/// Field order matches the on-disk record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub title: String,
    /// ISO-8601 UTC timestamp, kept verbatim for byte-exact round trips
    pub timestamp: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub layout: Layout,
    pub image: ImageRef,
    pub notes: String,
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl Entry {
    /// Create a fresh entry with a short random id and the current UTC time
    pub fn new(title: &str, notes: &str, layout: Layout, image: ImageRef) -> Self {
        let title = match title.trim() {
            "" => "Untitled",
            t => t,
        };
        Self {
            id: short_id(),
            title: title.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            tags: Vec::new(),
            layout,
            image,
            notes: notes.trim().to_string(),
            context: Map::new(),
        }
    }

    /// Parsed timestamp, if the stored string is valid RFC 3339
    pub fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.timestamp).ok()
    }
}

fn short_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_defaults() {
        let e = Entry::new("  ", " some notes \n", Layout::ImageTop, ImageRef::new("images/a.jpg", 4, 3));
        assert_eq!(e.title, "Untitled");
        assert_eq!(e.notes, "some notes");
        assert_eq!(e.id.len(), 8);
        assert!(e.timestamp.ends_with("+00:00"));
        assert!(e.parsed_timestamp().is_some());
        assert!(e.tags.is_empty());
    }

    #[test]
    fn test_minimal_record_defaults() {
        let json = r#"{
            "id": "abc12345",
            "title": "t",
            "timestamp": "2024-01-01T00:00:00+00:00",
            "image": {"path": "images/x.jpg", "width": 10, "height": 20},
            "notes": ""
        }"#;
        let e: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(e.layout, Layout::ImageLeft);
        assert!(e.tags.is_empty());
        assert!(e.context.is_empty());
        assert_eq!(e.image.quality, None);
        assert!(!e.image.hires);
    }

    #[test]
    fn test_layout_wire_names() {
        assert_eq!(serde_json::to_string(&Layout::ImageTop).unwrap(), "\"image-top\"");
        assert_eq!("image-left".parse::<Layout>(), Ok(Layout::ImageLeft));
        assert!("sideways".parse::<Layout>().is_err());
    }
}
