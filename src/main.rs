//! menumatch CLI
//!
//! `build` embeds a catalog and persists the index; `order` resolves one
//! order against it and prints the result as JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use menumatch::index::{Catalog, CatalogIndex, CatalogIndexBuilder, CatalogStore};
use menumatch::matcher::Resolver;
use menumatch::semantic::{EmbeddingProvider, provider_from_config};
use menumatch::{MenumatchConfig, OrderAssembler};

#[derive(Parser)]
#[command(name = "menumatch")]
#[command(about = "Resolve food orders against an embedded menu catalog")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a catalog and persist the index
    Build {
        /// Catalog definition (JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Pipeline configuration (YAML)
        #[arg(long, env = "MENUMATCH_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Resolve one order and print it as JSON
    Order {
        /// Pipeline configuration (YAML)
        #[arg(long, env = "MENUMATCH_CONFIG")]
        config: Option<PathBuf>,

        /// Build the index from this catalog instead of loading the store
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Treat the text as a transcript and normalize number words first
        #[arg(long, conflicts_with = "delimited")]
        spoken: bool,

        /// Parse `<quantity> <name>; ...` instead of free text
        #[arg(long)]
        delimited: bool,

        /// Order text
        text: String,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<MenumatchConfig> {
    match path {
        Some(path) => MenumatchConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(MenumatchConfig::default()),
    }
}

async fn build_index(
    config: &MenumatchConfig,
    catalog: &Path,
    provider: &dyn EmbeddingProvider,
) -> Result<CatalogIndex> {
    let catalog = Catalog::from_path(catalog)?;
    let builder = CatalogIndexBuilder::new(config.build.clone());
    let (index, stats) = builder.build_with_stats(&catalog, provider).await?;
    tracing::info!(
        embeddings = stats.embeddings,
        elapsed_micros = stats.elapsed_micros,
        "catalog embedded"
    );
    Ok(index)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Commands::Build { catalog, config } => {
            let config = load_config(config.as_deref())?;
            if !config.store.is_persistent() {
                bail!("store.backend is in_memory; nothing would be persisted");
            }
            let provider = provider_from_config(&config.semantic_with_env())?;
            let index = build_index(&config, &catalog, provider.as_ref()).await?;

            let store =
                CatalogStore::open(&config.store.backend_config(), config.store.compression)?;
            let stats = store.save(&index)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Order {
            config,
            catalog,
            spoken,
            delimited,
            text,
        } => {
            let config = load_config(config.as_deref())?;
            let provider: Arc<dyn EmbeddingProvider> =
                provider_from_config(&config.semantic_with_env())?;

            let index = match &catalog {
                Some(catalog) => build_index(&config, catalog, provider.as_ref()).await?,
                None => {
                    let store = CatalogStore::open(
                        &config.store.backend_config(),
                        config.store.compression,
                    )?;
                    store
                        .load(provider.dimension())
                        .context("loading catalog index (run `menumatch build` first)")?
                }
            };
            if index.model_name() != provider.model_name() {
                tracing::warn!(
                    index_model = index.model_name(),
                    provider_model = provider.model_name(),
                    "catalog index was built with a different provider"
                );
            }

            let resolver = Resolver::new(Arc::new(index), config.resolver.clone())?;
            let assembler = OrderAssembler::new(
                provider,
                Arc::new(resolver),
                config.segment.clone(),
                config.assembler.clone(),
            )?;

            let order = if delimited {
                assembler.assemble_delimited(&text).await?
            } else if spoken {
                assembler.assemble_spoken(&text).await?
            } else {
                assembler.assemble(&text).await?
            };
            println!("{}", serde_json::to_string_pretty(&order)?);
        }
    }

    Ok(())
}
