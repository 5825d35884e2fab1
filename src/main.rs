//! fact-checker binary

use anyhow::Context;
use clap::{Parser, Subcommand};
use fact_checker::{
    api::{build_router, AppState},
    config::{Config, CorpusSourceKind},
    knowledge::{summarize, Bm25Params, Chunk, ChunkSource, JsonArticleSource, LexicalIndex, SharedLexicalIndex},
    logging,
    retrieval::QdrantVectorIndex,
    FactCheckOrchestrator,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "fact-checker", version, about = "Retrieval-augmented fact checking")]
struct Cli {
    /// TOML configuration file; FACTCHECK__* environment variables override it
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Start the HTTP API (default)
    Serve,
    /// Check one statement and print the JSON outcome
    Check {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Summarize the loaded knowledge base
    Inspect {
        /// Number of chunk previews to list
        #[arg(default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(Some(&cli.config)).context("Failed to load configuration")?;
    logging::init(&config.logging)?;

    let vector_index = Arc::new(QdrantVectorIndex::connect(config.vector_db.clone())?);
    let corpus = load_corpus(&config, vector_index.clone()).await;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Inspect { limit } => {
            let summary = summarize(&corpus, limit);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Check { text } => {
            let orchestrator = build_orchestrator(&config, vector_index, corpus)?;
            let outcome = orchestrator.check(&text.join(" ")).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Serve => {
            let orchestrator = build_orchestrator(&config, vector_index, corpus)?;
            let router = build_router(
                AppState {
                    orchestrator: Arc::new(orchestrator),
                },
                config.server.max_body_bytes,
            );

            let address = format!("{}:{}", config.server.host, config.server.port);
            let listener = tokio::net::TcpListener::bind(&address)
                .await
                .with_context(|| format!("Failed to bind {}", address))?;
            info!("Fact checker listening on {}", address);

            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}

/// Snapshot the corpus; a failed load leaves the knowledge base empty
async fn load_corpus(config: &Config, vector_index: Arc<QdrantVectorIndex>) -> Vec<Chunk> {
    let source: Arc<dyn ChunkSource> = match config.corpus.source {
        CorpusSourceKind::VectorDb => vector_index,
        CorpusSourceKind::Json => Arc::new(JsonArticleSource::new(
            &config.corpus.path,
            config.corpus.chunk_size,
            config.corpus.chunk_overlap,
        )),
    };

    match source.fetch().await {
        Ok(chunks) => {
            info!("Loaded {} chunks from {}", chunks.len(), source.name());
            chunks
        }
        Err(e) => {
            warn!("Failed to load corpus from {}: {}", source.name(), e);
            Vec::new()
        }
    }
}

fn build_orchestrator(
    config: &Config,
    vector_index: Arc<QdrantVectorIndex>,
    corpus: Vec<Chunk>,
) -> anyhow::Result<FactCheckOrchestrator> {
    let params = Bm25Params {
        k1: config.retrieval.bm25_k1,
        b: config.retrieval.bm25_b,
    };
    let lexical = LexicalIndex::build_with_params(corpus, params);
    if lexical.is_empty() {
        warn!("Knowledge base is empty; checks will report it as unavailable");
    }

    FactCheckOrchestrator::from_config(config, vector_index, Arc::new(SharedLexicalIndex::new(lexical)))
        .context("Failed to create fact-check services")
}
