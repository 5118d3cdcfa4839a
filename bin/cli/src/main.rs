use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use realty_assist_ai::image::{mime_from_extension, sniff_mime};
use realty_assist_ai::{GeminiBackend, HttpImageFetcher, LlmBackend};
use realty_assist_conversation::{ImageReference, InMemorySessionStore};
use realty_assist_core::SessionId;
use realty_assist_routing::{ChatRequest, ChatService, IssueDetection, RoutingStrategy};

mod config;
mod error;

use crate::config::CliConfig;
use crate::error::CliError;

/// Realty Assist - property issue and tenancy assistant
#[derive(Parser)]
#[command(name = "realty-assist", version, about)]
struct Cli {
    /// Routing strategy (heuristic_first or classifier)
    #[arg(short, long, env = "ROUTING__STRATEGY")]
    strategy: Option<RoutingStrategy>,

    /// Configuration file layered under the environment
    #[arg(short, long, env = "REALTY_ASSIST_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Talk to the assistant; type `quit` to leave
    Chat,
    /// Analyze a local image of a property issue
    Analyze {
        /// Image file to analyze
        path: PathBuf,
        /// What you want to know about the image
        query: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info,realty_assist_routing=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> realty_assist_core::Result<(), CliError> {
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(strategy) = cli.strategy {
        config.routing.strategy = strategy;
    }

    let backend: Arc<dyn LlmBackend> =
        Arc::new(GeminiBackend::new(config.gemini.clone()).map_err(CliError::from)?);
    let fetcher = Arc::new(
        HttpImageFetcher::new(Duration::from_secs(config.image_fetch_timeout_secs))
            .map_err(CliError::from)?,
    );

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let chat = ChatService::new(
                config.routing.build_router(backend, fetcher),
                Arc::new(InMemorySessionStore::new()),
            );
            chat_loop(&chat).await
        }
        Command::Analyze { path, query } => {
            let issues = IssueDetection::new(backend, fetcher)
                .with_temperature(config.routing.issue_temperature);
            let image = read_image(&path).await?;
            let diagnosis = issues
                .detect(Some(image), query.as_deref())
                .await
                .map_err(CliError::from)?;
            println!("{diagnosis}");
            Ok(())
        }
    }
}

async fn chat_loop(chat: &ChatService) -> realty_assist_core::Result<(), CliError> {
    let session_id = SessionId::generate();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("Property assistant ready. Type 'quit' to exit.");
    loop {
        stdout.write_all(b"\nYou: ").await.map_err(CliError::io)?;
        stdout.flush().await.map_err(CliError::io)?;

        let Some(line) = lines.next_line().await.map_err(CliError::io)? else {
            break;
        };
        let text = line.trim();
        if text.eq_ignore_ascii_case("quit") {
            break;
        }
        if text.is_empty() {
            continue;
        }

        let request = ChatRequest::new(text).with_session_id(session_id.as_str());
        match chat.handle(request).await {
            Ok(response) => println!("\nAssistant: {}", response.reply),
            Err(e) => {
                tracing::debug!(error = ?e, "chat turn failed");
                println!("\nAssistant is unavailable right now: {}", e.current_context());
            }
        }
    }
    println!("Goodbye!");
    Ok(())
}

async fn read_image(path: &Path) -> realty_assist_core::Result<ImageReference, CliError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| CliError::Io {
        reason: format!("{}: {e}", path.display()),
    })?;
    let mime_type = sniff_mime(&bytes)
        .or_else(|| mime_from_extension(&path.to_string_lossy()))
        .ok_or_else(|| CliError::UnsupportedImage {
            path: path.display().to_string(),
        })?
        .to_string();
    Ok(ImageReference::InlineData { bytes, mime_type })
}
