//! Arbiter - Command Line Entry Point
//!
//! Reads a judging payload as JSON and prints the JSON response.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use arbiter::{
    Config, Judge,
    constants::DEFAULT_LOG_FILTER,
    models::{Payload, Response},
    sandbox::DockerSandbox,
    store::{DirProblemStore, ProblemCache, ProblemStore},
};

#[derive(Debug, Parser)]
#[command(name = "arbiter", version, about = "Sandboxed judging engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Judge a payload against every test case of its problem
    Judge {
        /// Payload JSON file, or `-` for stdin
        payload: PathBuf,
        /// Serve problems from the cache instead of the problems directory
        #[arg(long)]
        cached: bool,
    },
    /// Run a payload on its stdin and judge it against the reference solution
    Run {
        /// Payload JSON file, or `-` for stdin
        payload: PathBuf,
        /// Serve problems from the cache instead of the problems directory
        #[arg(long)]
        cached: bool,
    },
    /// Load every problem under a directory into the cache
    Cache {
        /// Defaults to PROBLEMS_DIR
        problems_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Judge,
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize tracing; stdout is reserved for the response
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Judge { payload, cached } => serve(config, &payload, cached, Mode::Judge).await,
        Command::Run { payload, cached } => serve(config, &payload, cached, Mode::Run).await,
        Command::Cache { problems_dir } => {
            let dir = problems_dir.unwrap_or_else(|| config.storage.problems_dir.clone());
            tracing::info!("Loading problems from {}...", dir.display());
            let catalog = DirProblemStore::new(dir).load_all().await?;

            let cache = ProblemCache::new(&config.storage.problem_cache_path);
            let merged = cache.update(catalog).await?;
            tracing::info!(
                "Cached {} problems at {}",
                merged.len(),
                cache.path().display()
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn serve(config: Config, path: &Path, cached: bool, mode: Mode) -> anyhow::Result<ExitCode> {
    let payload = read_payload(path).await?;

    let store: Arc<dyn ProblemStore> = if cached {
        Arc::new(ProblemCache::new(&config.storage.problem_cache_path).load().await?)
    } else {
        Arc::new(DirProblemStore::new(&config.storage.problems_dir))
    };

    tracing::info!("Connecting to Docker...");
    let sandbox = DockerSandbox::connect(&config.docker)?;
    let version = sandbox.version().await?;
    tracing::info!("Connected to Docker version: {}", version);

    let judge = Judge::new(Arc::new(sandbox), store, config);

    let token = CancellationToken::new();
    tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling running sandboxes");
                token.cancel();
            }
        }
    });

    let response: Response = match mode {
        Mode::Judge => judge.judge_default(&payload, &token).await,
        Mode::Run => judge.run_default(&payload, &token).await,
    };
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(if response.is_pass() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn read_payload(path: &Path) -> anyhow::Result<Payload> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("reading payload from stdin")?;
        raw
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading payload {}", path.display()))?
    };

    serde_json::from_str(&raw).context("decoding payload")
}
