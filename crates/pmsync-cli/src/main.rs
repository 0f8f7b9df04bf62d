use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pmsync_core::ResourceKind;
use pmsync_storage::{create_table_sql, PgStore};
use pmsync_sync::{connect_store, load_catalog, StoreBackend, SyncConfig, SyncPipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pmsync")]
#[command(about = "Mirror project-management resources into a local store")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the sync plan once and print the run summary.
    Sync {
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Use the in-memory store instead of postgres.
        #[arg(long)]
        memory: bool,
    },
    /// Create any missing tables for the catalog.
    Migrate,
    /// Print the table DDL derived from the catalog.
    Schema {
        #[arg(long)]
        kind: Option<String>,
    },
    /// List configured resource types with their keys and dependencies.
    Resources,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = SyncConfig::from_env();

    match cli.command.unwrap_or(Commands::Sync {
        plan: None,
        memory: false,
    }) {
        Commands::Sync { plan, memory } => {
            if let Some(plan) = plan {
                config.plan_path = plan;
            }
            if memory {
                config.store = StoreBackend::Memory;
            }
            let store = connect_store(&config).await?;
            let pipeline = SyncPipeline::new(config)?;
            let summary = pipeline.run_once(store).await?;
            println!(
                "sync complete: run_id={} pages={} envelopes={} written={} failed={} skipped={} warnings={} aborted={} reports={}",
                summary.run_id,
                summary.pages,
                summary.envelopes,
                summary.written,
                summary.failed,
                summary.skipped,
                summary.warnings,
                summary.aborted,
                summary.reports_dir
            );
        }
        Commands::Migrate => {
            let catalog = load_catalog(&config)?;
            let store = PgStore::connect(&config.database_url, config.db_max_connections)
                .await
                .context("connecting to postgres")?;
            let tables = store
                .ensure_tables(catalog.configs())
                .await
                .context("creating tables")?;
            info!(tables, "migrate complete");
            println!("migrate complete: tables={tables}");
        }
        Commands::Schema { kind } => {
            let catalog = load_catalog(&config)?;
            let configs: Vec<_> = match kind {
                Some(kind) => vec![catalog.config_for_api_type(&kind)?],
                None => catalog.configs().collect(),
            };
            for resource in configs {
                println!("{};\n", create_table_sql(resource)?);
            }
        }
        Commands::Resources => {
            let catalog = load_catalog(&config)?;
            for resource in catalog.configs() {
                let dependencies = catalog
                    .dependencies_of(resource.kind)
                    .into_iter()
                    .map(ResourceKind::api_type)
                    .collect::<Vec<_>>();
                println!(
                    "{:<22} key={:<16} required=[{}] depends_on=[{}]",
                    resource.kind,
                    resource.key_column,
                    resource.required_fields.join(", "),
                    dependencies.join(", ")
                );
            }
        }
    }

    Ok(())
}
