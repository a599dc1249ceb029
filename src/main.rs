//! # AskLyn — keyword-retrieval chat demo
//!
//! Usage:
//!   asklyn serve                         # Start the gateway (127.0.0.1:5000)
//!   asklyn serve --port 8080             # Custom port
//!   asklyn ask "What is RAG?"            # One-shot answer from the seed documents
//!   asklyn init-config                   # Write ~/.asklyn/config.toml

use anyhow::{Context, Result, bail};
use asklyn_core::AskLynConfig;
use asklyn_knowledge::{KnowledgeStore, ResponseComposer, Retriever};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "asklyn",
    version,
    about = "💬 AskLyn — TF-IDF retrieval over an in-memory knowledge base"
)]
struct Cli {
    /// Config file (default: $ASKLYN_CONFIG or ~/.asklyn/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway
    Serve {
        /// Bind address (overrides gateway.host)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides gateway.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Answer a single query against the seed documents and exit
    Ask {
        query: String,

        /// Maximum documents to retrieve (overrides retrieval.top_k)
        #[arg(long)]
        top_k: Option<usize>,

        /// Print similarity scores for the retrieved documents
        #[arg(long)]
        show_scores: bool,
    },
    /// Write a default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

fn load_config(path: Option<&str>) -> Result<AskLynConfig> {
    let mut config = match path {
        Some(p) => {
            let path = expand_path(p);
            AskLynConfig::load_from(&path)
                .with_context(|| format!("loading {}", path.display()))?
        }
        None => AskLynConfig::load()?,
    };
    config.apply_env_overrides();
    tracing::debug!(
        "Config loaded (top_k={}, min_score={}, seeds={})",
        config.retrieval.top_k,
        config.retrieval.min_score,
        config.knowledge.seed_documents.len()
    );
    Ok(config)
}

/// Default directives when `RUST_LOG` is unset. `asklyn` matches every
/// `asklyn_*` crate by prefix.
fn log_filter(verbose: bool) -> &'static str {
    if verbose {
        "asklyn=debug,tower_http=debug"
    } else {
        "asklyn=info"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose))),
        )
        .with_target(false)
        .init();

    match cli.command {
        Command::Serve { host, port } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            config.validate()?;

            println!("💬 AskLyn v{}", env!("CARGO_PKG_VERSION"));
            println!("   🌐 Chat UI: http://{}", config.gateway.bind_addr());
            println!("   📚 Seed documents: {}", config.knowledge.seed_documents.len());
            println!();

            asklyn_gateway::start(config).await?;
        }
        Command::Ask {
            query,
            top_k,
            show_scores,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(k) = top_k {
                config.retrieval.top_k = k;
            }
            config.validate()?;
            if query.is_empty() {
                bail!("No message provided");
            }

            let store = KnowledgeStore::from_config(&config.knowledge);
            let retriever = Retriever::from_config(&config.retrieval);
            let results = retriever.search(&store, &query, retriever.top_k());

            if show_scores {
                for r in &results {
                    println!("[{:.4}] #{} {}", r.score, r.index, r.content);
                }
                println!();
            }

            let context: Vec<String> = results.into_iter().map(|r| r.content).collect();
            let composer = ResponseComposer::from_config(&config.identity);
            println!("{}", composer.compose(&query, &context));
        }
        Command::InitConfig { force } => {
            let path = cli
                .config
                .as_deref()
                .map(expand_path)
                .unwrap_or_else(AskLynConfig::default_path);
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            AskLynConfig::default().save_to(&path)?;
            println!("✅ Wrote default config to {}", path.display());
        }
    }

    Ok(())
}
