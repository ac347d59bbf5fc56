//! init
//!
//! Usage: lazyrow init [--force]
//!
//! Writes the config file named by `--config` (default `lazyrow.toml`),
//! pointing at `--db` (default `lazyrow.db`).

use super::{CliResult, GlobalArgs};
use clap::Args;
use lazyrow_store::config::{default_config_path, default_database_path, write_config};
use lazyrow_store::StoreConfig;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

pub fn execute(global: &GlobalArgs, args: InitArgs) -> CliResult {
    let path = global.config.clone().unwrap_or_else(default_config_path);
    let database = global.db.clone().unwrap_or_else(default_database_path);
    let config = StoreConfig::default().with_database(database);

    write_config(&path, &config, args.force)?;
    println!("Wrote {}", path.display());
    Ok(())
}
