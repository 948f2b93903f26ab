/// Labyrinth Terminal Viewer
///
/// Renders a triangulated OBJ mesh (or a cube) in the terminal.
/// Controls:
///   - W/S: Move forward/back
///   - A/D: Strafe
///   - Space/C: Move up/down
///   - Left/Right: Turn the model
///   - Up/Down: Pitch the camera
///   - Q/ESC: Quit
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use labyrinth_core::{
    load_mesh, FlatVertexBuffer, MatrixConvention, RawGeometry, VertexStrategy, ViewerConfig,
};
use labyrinth_terminal::TerminalApp;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "labyrinth-terminal", version, about = "Render an OBJ mesh in the terminal")]
struct Cli {
    /// Triangulated OBJ file; a cube is shown when omitted
    model: Option<PathBuf>,

    /// Viewer config in TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    #[arg(long, value_enum)]
    convention: Option<ConventionArg>,

    #[arg(long)]
    max_fps: Option<u32>,

    /// Write logs here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    SharedPosition,
    TupleKeyed,
}

impl From<StrategyArg> for VertexStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::SharedPosition => VertexStrategy::SharedPosition,
            StrategyArg::TupleKeyed => VertexStrategy::TupleKeyed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConventionArg {
    ModelView,
    SeparateViewModel,
}

impl From<ConventionArg> for MatrixConvention {
    fn from(arg: ConventionArg) -> Self {
        match arg {
            ConventionArg::ModelView => MatrixConvention::ModelView,
            ConventionArg::SeparateViewModel => MatrixConvention::SeparateViewModel,
        }
    }
}

fn init_tracing(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("labyrinth_core=info,labyrinth_terminal=info"));

    let (file_layer, stderr_layer) = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
            (Some(layer), None)
        }
        None => (None, Some(fmt::layer().with_writer(std::io::stderr))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_ref())?;

    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy.into();
    }
    if let Some(convention) = cli.convention {
        config.convention = convention.into();
    }
    if cli.max_fps.is_some() {
        config.max_fps = cli.max_fps;
    }
    config.validate().context("invalid viewer config")?;

    let mesh = match &cli.model {
        Some(path) => load_mesh(path, config.strategy)
            .with_context(|| format!("failed to load model {}", path.display()))?,
        None => FlatVertexBuffer::build(&RawGeometry::cube(2.0), config.strategy)
            .context("failed to build default cube")?,
    };
    info!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        strategy = ?config.strategy,
        "mesh loaded"
    );

    let app = TerminalApp::new(&mesh, config).context("failed to start terminal viewer")?;
    app.run().context("terminal viewer failed")?;
    Ok(())
}
