//! Solace application binary - composition root.
//!
//! 1. Load configuration from TOML and apply CLI overrides
//! 2. Initialise tracing
//! 3. Build the embedder and open (or build) the shared document index
//! 4. Run the requested command: index, chat, or report

mod cli;
mod repl;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use solace_chat::{ChatCompletionsClient, ChatSession, RiskFile, SessionOptions};
use solace_core::config::{EmbeddingBackend, SolaceConfig};
use solace_core::error::SolaceError;
use solace_vector::{DynEmbeddingService, MockEmbedding, OnnxEmbeddingService, Retriever, RetrieverOptions};

use cli::{CliArgs, Command};
use repl::Repl;

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Load the config file if present. Errors are returned so they can be
/// logged once tracing is up.
fn load_config(path: &Path) -> (SolaceConfig, Option<SolaceError>) {
    if !path.exists() {
        return (SolaceConfig::default(), None);
    }
    match SolaceConfig::load(path) {
        Ok(config) => (config, None),
        Err(e) => (SolaceConfig::default(), Some(e)),
    }
}

fn build_embedder(config: &SolaceConfig) -> Result<Box<dyn DynEmbeddingService>, SolaceError> {
    match config.embedding.backend {
        EmbeddingBackend::Onnx => {
            let model_dir = config.resolve_path(&config.embedding.model_dir);
            let service = OnnxEmbeddingService::from_directory(&model_dir)?;
            tracing::info!(model_dir = %model_dir.display(), "ONNX embedding model loaded");
            Ok(Box::new(service))
        }
        EmbeddingBackend::Hash => {
            tracing::warn!("Using hash embeddings; retrieval will not be semantic");
            Ok(Box::new(MockEmbedding::with_dimensions(
                config.embedding.dimensions,
            )))
        }
    }
}

async fn open_retriever(config: &SolaceConfig, force_rebuild: bool) -> AppResult<Retriever> {
    let embedder = build_embedder(config)?;
    let options = RetrieverOptions {
        force_rebuild,
        ..RetrieverOptions::from_config(config)
    };
    match Retriever::open(&options, embedder).await {
        Ok(retriever) => Ok(retriever),
        Err(SolaceError::EmptyCorpus) => {
            tracing::error!(
                docs_dir = %options.docs_dir.display(),
                "No usable .txt documents found; cannot build the index"
            );
            Err(SolaceError::EmptyCorpus.into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_index(config: &SolaceConfig, rebuild: bool) -> AppResult<()> {
    let retriever = open_retriever(config, rebuild).await?;
    let index = retriever.index();
    println!(
        "Index ready: {} chunks, {} dimensions",
        index.len(),
        index.dimensions()
    );
    Ok(())
}

async fn run_chat(config: &SolaceConfig, json: bool) -> AppResult<()> {
    let retriever = Arc::new(open_retriever(config, false).await?);
    let generator = Arc::new(ChatCompletionsClient::from_config(&config.llm)?);
    let risk_file = RiskFile::new(config.resolve_path(&config.risk.output_path));

    let session = ChatSession::new(retriever, generator, SessionOptions::from_config(config))
        .with_risk_file(risk_file);
    tracing::info!(session = %session.id(), "Chat session started");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut repl = Repl::new(session, std::io::stdout(), json);
    repl.run(stdin).await?;

    if json {
        println!("{}", repl.session().risk_report().to_json());
    }
    Ok(())
}

/// JSON report derived from the saved risk score.
fn saved_report(config: &SolaceConfig) -> AppResult<String> {
    let risk_file = RiskFile::new(config.resolve_path(&config.risk.output_path));
    Ok(risk_file.report()?.to_json())
}

fn run_report(config: &SolaceConfig) -> AppResult<()> {
    println!("{}", saved_report(config)?);
    Ok(())
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let (mut config, config_error) = load_config(&config_file);
    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Solace v{}", env!("CARGO_PKG_VERSION"));
    match config_error {
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config; using defaults"
        ),
        None if config_file.exists() => {
            tracing::info!(path = %config_file.display(), "Configuration loaded")
        }
        None => tracing::info!(path = %config_file.display(), "No config file; using defaults"),
    }

    match args.command {
        Command::Index { rebuild } => run_index(&config, rebuild).await,
        Command::Chat { json } => run_chat(&config, json).await,
        Command::Report => run_report(&config),
    }
}
