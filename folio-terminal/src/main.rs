/// folio-terminal - Portfolio shell with a rotating model preview
///
/// Controls:
///   - 1/2 or h/p: Home / Projects
///   - j/k or Arrow Keys: Select a project
///   - Enter: Launch demo, c: View code, o: Open demo in browser
///   - t: Toggle theme, r: Remount the viewer
///   - Q/ESC: Quit
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal;
use env_logger::{Env, Target};
use folio_core::portfolio::{self, HERO_MODEL};
use folio_core::{Project, ViewerConfig};
use folio_terminal::TerminalApp;
use log::info;
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "folio-terminal", version, about = "AR/VR portfolio with a terminal model viewer")]
struct Cli {
    /// Model shown in the hero viewer (.glb, .gltf or .stl)
    #[arg(default_value = HERO_MODEL)]
    model: String,

    /// Directory that model references resolve against, like a web
    /// server's public directory
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Viewer configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Project list (JSON array); defaults to the built-in showcase
    #[arg(long)]
    projects: Option<PathBuf>,

    /// Frame rate of the render loop
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Render this many frames to stdout and exit
    #[arg(long)]
    headless_frames: Option<u32>,
}

fn init_logging(cli: &Cli) -> Result<()> {
    // stderr would tear through the alternate screen, so the interactive
    // UI stays quiet unless logs have somewhere else to go
    let interactive = cli.headless_frames.is_none();
    let default_filter = if interactive && cli.log_file.is_none() { "off" } else { "info" };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter));
    if let Some(path) = &cli.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    let projects = match &cli.projects {
        Some(path) => portfolio::load_projects(path)
            .with_context(|| format!("failed to load projects {}", path.display()))?,
        None => Project::defaults(),
    };
    info!("{} projects, hero model {}", projects.len(), cli.model);

    let (cols, rows) = match cli.headless_frames {
        Some(_) => (80, 24),
        None => terminal::size().context("failed to query terminal size")?,
    };
    let mut app = TerminalApp::new(cols, rows, cli.fps, config, projects, &cli.model);
    if let Some(root) = &cli.assets {
        info!("serving models from {}", root.display());
        app = app.with_assets_root(root);
    }

    if let Some(frames) = cli.headless_frames {
        for row in app.run_headless(frames) {
            println!("{}", row.trim_end());
        }
        return Ok(());
    }

    app.run()?;

    Ok(())
}
