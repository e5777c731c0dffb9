use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use snapnote::annotations::replay;
use snapnote::domain::{Annotation, Layout};
use snapnote::{
    AnnotationModel, AnnotatorConfig, CaptureSource, FileCapture, SessionOptions,
    SessionRepository,
};

#[derive(Parser)]
#[command(
    name = "snapnote",
    version,
    about = "Annotate screen captures and collect them into session reports"
)]
pub struct Cli {
    /// Session directory (defaults to the configured sessions directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub session: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List the entries of a session")]
    List,

    #[command(about = "Annotate an image and add it to the session")]
    Add(AddArgs),

    #[command(about = "Export the session report")]
    Export(ExportArgs),

    #[command(about = "Print the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct AddArgs {
    /// Image file to annotate
    pub image: PathBuf,

    #[arg(long, default_value = "")]
    pub title: String,

    #[arg(long, default_value = "")]
    pub notes: String,

    /// image-left or image-top (defaults to the configured layout)
    #[arg(long)]
    pub layout: Option<Layout>,

    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// JSON array of annotations in display coordinates
    #[arg(long, value_name = "FILE")]
    pub annotations: Option<PathBuf>,

    /// Size of the surface the annotations were drawn on, as WxH
    #[arg(long, value_name = "WxH")]
    pub display: Option<DisplaySize>,
}

#[derive(Args)]
pub struct ExportArgs {
    #[arg(long, value_enum, default_value_t = ExportFormat::All)]
    pub format: ExportFormat,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Also write it to the config file, filling in missing fields
    #[arg(long)]
    pub write: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExportFormat {
    Md,
    Html,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

impl FromStr for DisplaySize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid dimension '{v}': {e}"))
        };
        Ok(Self {
            width: parse(w)?,
            height: parse(h)?,
        })
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let config = AnnotatorConfig::load();
    if let Commands::Config(args) = &cli.command {
        return show_config(&config, args.write);
    }

    let root = cli.session.unwrap_or_else(|| config.sessions_dir());
    let repo = SessionRepository::open_with(&root, SessionOptions::from(&config))
        .with_context(|| format!("Failed to open session {}", root.display()))?;

    match cli.command {
        Commands::List => list(&repo),
        Commands::Add(args) => add(&repo, &config, args),
        Commands::Export(args) => export(&repo, args.format),
        Commands::Config(args) => show_config(&config, args.write),
    }
}

fn show_config(config: &AnnotatorConfig, write: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if write {
        let path = config.save().context("Failed to write config file")?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

fn list(repo: &SessionRepository) -> Result<()> {
    for entry in repo.load_entries()? {
        println!("{} — {}", entry.id, entry.title);
    }
    Ok(())
}

fn add(repo: &SessionRepository, config: &AnnotatorConfig, args: AddArgs) -> Result<()> {
    let image = FileCapture::new(&args.image)
        .capture()
        .with_context(|| format!("Failed to load {}", args.image.display()))?;

    let mut model = AnnotationModel::from_config(config);
    model.load_image(image);
    if let Some(size) = args.display {
        model.set_display_size(size.width, size.height);
    }

    if let Some(path) = &args.annotations {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let annotations: Vec<Annotation> = serde_json::from_str(&json)
            .with_context(|| format!("Invalid annotation file {}", path.display()))?;
        replay(&mut model, &annotations)?;
    }

    let raster = model.take_for_save()?;
    let entry = repo.save_annotated(
        &raster,
        &args.title,
        &args.notes,
        args.layout.unwrap_or(config.layout),
        args.tags,
    )?;
    println!("{}", entry.id);
    Ok(())
}

fn export(repo: &SessionRepository, format: ExportFormat) -> Result<()> {
    let written = match format {
        ExportFormat::Md => vec![repo.export_markdown()?],
        ExportFormat::Html => vec![repo.export_html()?],
        ExportFormat::All => {
            let (md, html) = repo.export_all()?;
            vec![md, html]
        }
    };
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
