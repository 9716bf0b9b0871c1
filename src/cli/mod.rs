pub mod audit;
pub mod collection;
pub mod purge;
pub mod schema;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tokio::runtime::Runtime;

use crate::config::AppConfig;
use crate::database::TextSearchIndex;
use crate::logging::log_performance;

#[derive(Parser)]
#[command(name = "kurly-store")]
#[command(about = "Storage provisioning and maintenance for the Kurly skincare review dataset")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Config file (defaults to ~/.kurly-store/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or inspect the relational schema
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Delete every product and review created on one date
    Purge {
        /// Creation date to delete (YYYY-MM-DD, session time zone)
        #[arg(long)]
        date: String,
        /// Only count what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
    /// Manage the review-embedding collection
    Collection {
        #[command(subcommand)]
        command: CollectionCommands,
    },
    /// Check a merged crawl dump against the database
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },
}

#[derive(Subcommand)]
pub enum SchemaCommands {
    /// Create tables, indexes, triggers and views (idempotent)
    Apply {
        /// Add ON DELETE CASCADE from reviews to products
        #[arg(long)]
        cascade_fk: bool,
        /// Keyword index over review contents (trigram, simple)
        #[arg(long, default_value = "trigram")]
        text_search: TextSearchIndex,
    },
    /// Show row counts and which views exist
    Status,
}

#[derive(Subcommand)]
pub enum CollectionCommands {
    /// Delete and recreate the collection (destroys stored vectors)
    Provision {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the live collection configuration
    Inspect,
}

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Count duplicate reviews in a dump
    Duplicates {
        /// Path to the merged JSON dump
        dump: PathBuf,
    },
    /// List dump products missing from the database and write INSERT SQL
    MissingProducts {
        /// Path to the merged JSON dump
        dump: PathBuf,
        /// Where to write the SQL script
        #[arg(short, long, default_value = "insert_missing_products.sql")]
        output: PathBuf,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Schema { command } => match command {
                SchemaCommands::Apply { .. } => "schema apply",
                SchemaCommands::Status => "schema status",
            },
            Commands::Purge { .. } => "purge",
            Commands::Collection { command } => match command {
                CollectionCommands::Provision { .. } => "collection provision",
                CollectionCommands::Inspect => "collection inspect",
            },
            Commands::Audit { command } => match command {
                AuditCommands::Duplicates { .. } => "audit duplicates",
                AuditCommands::MissingProducts { .. } => "audit missing-products",
            },
        }
    }
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let config = AppConfig::load(self.config.as_deref()).context("Failed to load configuration")?;
        let rt = Runtime::new()?;
        let operation = self.command.name();
        let started = Instant::now();

        let result = rt.block_on(async {
            match self.command {
                Commands::Schema { command } => match command {
                    SchemaCommands::Apply {
                        cascade_fk,
                        text_search,
                    } => schema::handle_apply_command(&config, cascade_fk, text_search).await,
                    SchemaCommands::Status => schema::handle_status_command(&config).await,
                },
                Commands::Purge { date, dry_run } => {
                    purge::handle_purge_command(&config, &date, dry_run).await
                }
                Commands::Collection { command } => match command {
                    CollectionCommands::Provision { yes } => {
                        collection::handle_provision_command(&config, yes).await
                    }
                    CollectionCommands::Inspect => {
                        collection::handle_inspect_command(&config).await
                    }
                },
                Commands::Audit { command } => match command {
                    AuditCommands::Duplicates { dump } => {
                        audit::handle_duplicates_command(&dump).await
                    }
                    AuditCommands::MissingProducts { dump, output } => {
                        audit::handle_missing_products_command(&config, &dump, &output).await
                    }
                },
            }
        });

        log_performance(operation, started.elapsed().as_millis() as u64, result.is_ok());
        result
    }
}
