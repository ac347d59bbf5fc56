//! CLI command implementations
//!
//! Every command opens the database described by `--config` / `--db` and
//! delegates to the engine's logged operations.

pub mod assign;
pub mod entity;
pub mod find;
pub mod init;
pub mod schema;

use clap::Args;
use lazyrow_store::config::{default_database_path, load_config};
use lazyrow_store::{Database, StoreConfig};
use std::path::PathBuf;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Config file (default: lazyrow.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Effective store configuration: config file, then `--db`
    pub fn store_config(&self) -> lazyrow_store::Result<StoreConfig> {
        let mut config = load_config(self.config.as_deref())?.unwrap_or_default();
        if let Some(db) = &self.db {
            config.database = Some(db.clone());
        }
        if config.database.is_none() {
            config.database = Some(default_database_path());
        }
        Ok(config)
    }

    pub fn open_database(&self) -> lazyrow_store::Result<Database> {
        Database::open(self.store_config()?)
    }
}

pub fn print_json(value: &serde_json::Value) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
