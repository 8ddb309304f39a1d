use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use docket_client::Orchestrator;
use docket_core::{derive_result_key, upload_key, Document, FlowState};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "contract-analyzer", about = "Submit contracts for analysis and serve the upload broker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the broker HTTP service
    Serve,
    /// Upload a document and wait for its report
    Submit {
        path: PathBuf,
        #[arg(long, default_value = docket_core::config::DEFAULT_UPLOAD_CONTENT_TYPE)]
        content_type: String,
    },
    /// Print the storage keys a filename maps to
    Key { filename: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = contract_analyzer::config::load();

    match cli.command {
        Command::Serve => {
            let app = contract_analyzer::build(&config).await?;
            let addr = contract_analyzer::config::listen_addr(&config);
            println!("[contract-analyzer] listening on http://{addr}");
            app.listen(addr).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Submit { path, content_type } => submit(&config, path, content_type).await,
        Command::Key { filename } => {
            println!("upload: {}", upload_key(&filename));
            println!("result: {}", derive_result_key(&filename));
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn submit(
    config: &docket_core::DocketConfigSnapshot,
    path: PathBuf,
    content_type: String,
) -> Result<ExitCode> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("{} has no usable file name", path.display()))?
        .to_string();
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let orchestrator = Orchestrator::from_config(config)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let state = FlowState::default().choose(Document::new(filename, content_type, bytes));
    let state = orchestrator.run(state, &cancel).await;

    match (state.report(), state.notice()) {
        (Some(report), _) => {
            println!("{report}");
            Ok(ExitCode::SUCCESS)
        }
        (None, Some(notice)) => {
            eprintln!("{notice}");
            Ok(ExitCode::FAILURE)
        }
        (None, None) => Err(anyhow!("submission ended in state {}", state.label())),
    }
}
