use std::path::PathBuf;
use std::process::ExitCode;

use attackflow::error::ErrorCode;
use attackflow::transport::{ChunkSource, HttpSource, ReaderSource, StreamRequest};
use attackflow::{
    AppConfig, ConfigError, Direction, ExtractionSession, GraphAccumulator, LayoutResult, Outcome, TransportError, drive,
};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("cannot open {path}: {source}")]
    Open { path: PathBuf, source: std::io::Error },
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Transport(e) => e.error_code(),
            Self::Open { .. } => "E_OPEN",
            Self::Render(_) => "E_RENDER",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "attackflow", about = "Stream an attack flow from the analysis backend and lay it out")]
struct Cli {
    /// Layout direction override (`TB` or `LR`).
    #[arg(long, global = true)]
    direction: Option<Direction>,

    /// Print a summary line to stderr after every relayout.
    #[arg(long, global = true)]
    progress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a URL or a text through the backend streaming endpoint.
    Extract(ExtractArgs),
    /// Replay a recorded event stream from a file, or `-` for stdin.
    Replay { input: PathBuf },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ExtractArgs {
    #[arg(long)]
    url: Option<String>,

    #[arg(long)]
    text: Option<String>,
}

impl ExtractArgs {
    fn request(self) -> StreamRequest {
        match (self.url, self.text) {
            (Some(url), _) => StreamRequest::url(url),
            (None, text) => StreamRequest::text(text.unwrap_or_default()),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(code = e.code(), error = %e, "attackflow: aborted");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the session ended in error; the partial graph is
/// still printed.
async fn run(cli: Cli) -> Result<bool, CliError> {
    let mut config = AppConfig::from_env()?;
    if let Some(direction) = cli.direction {
        config.layout.direction = direction;
    }

    let mut source = open_source(&config, cli.command).await?;

    let mut accumulator = GraphAccumulator::new(config.layout.clone());
    if cli.progress {
        accumulator = accumulator.with_observer(print_progress);
    }
    let mut session = ExtractionSession::new(accumulator);
    let outcome = drive(&mut source, &mut session).await;
    info!(
        session = %session.id(),
        status = ?outcome.status,
        chunks = outcome.chunks,
        bytes = outcome.bytes,
        "attackflow: stream finished"
    );

    let (result, terminal) = session.into_sink().into_parts();
    println!("{}", serde_json::to_string_pretty(&result)?);

    match terminal {
        Some(Outcome::Failed(e)) => {
            error!(code = e.error_code(), retryable = e.retryable(), error = %e, "attackflow: session failed");
            Ok(false)
        }
        _ => Ok(true),
    }
}

async fn open_source(config: &AppConfig, command: Command) -> Result<Box<dyn ChunkSource>, CliError> {
    match command {
        Command::Extract(args) => {
            let source = HttpSource::connect(config, &args.request()).await?;
            Ok(Box::new(source))
        }
        Command::Replay { input } if input.as_os_str() == "-" => Ok(Box::new(ReaderSource::new(tokio::io::stdin()))),
        Command::Replay { input } => {
            let file = tokio::fs::File::open(&input)
                .await
                .map_err(|source| CliError::Open { path: input.clone(), source })?;
            Ok(Box::new(ReaderSource::new(file)))
        }
    }
}

fn print_progress(snapshot: &LayoutResult) {
    eprintln!("layout: {} nodes, {} edges", snapshot.nodes.len(), snapshot.edges.len());
}
