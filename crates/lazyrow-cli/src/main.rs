//! lazyrow CLI
//!
//! Command-line access to a lazyrow database

use clap::{Parser, Subcommand};

mod commands;

use commands::GlobalArgs;

#[derive(Debug, Parser)]
#[command(name = "lazyrow")]
#[command(about = "lazyrow - schema-on-write objects over SQLite", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or update an object
    Put(commands::entity::PutArgs),
    /// Print one object by class and identity
    Get(commands::entity::GetArgs),
    /// Delete one object by class and identity
    Delete(commands::entity::DeleteArgs),
    /// Query objects of a class
    Find(commands::find::FindArgs),
    /// Print the registered schema of a class
    Schema(commands::schema::SchemaArgs),
    /// Write a config file
    Init(commands::init::InitArgs),
}

fn main() {
    let cli = Cli::parse();

    if cli.global.verbose {
        lazyrow_core::logging_facility::init(lazyrow_core::logging_facility::Profile::Development);
    }

    let result = match cli.command {
        Commands::Put(args) => commands::entity::execute_put(&cli.global, args),
        Commands::Get(args) => commands::entity::execute_get(&cli.global, args),
        Commands::Delete(args) => commands::entity::execute_delete(&cli.global, args),
        Commands::Find(args) => commands::find::execute(&cli.global, args),
        Commands::Schema(args) => commands::schema::execute(&cli.global, args),
        Commands::Init(args) => commands::init::execute(&cli.global, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
