//! lazyrow store - SQLite execution of the lazyrow core
//!
//! Provides:
//! - `Database`, the synchronous persistence context (save, fetch, delete,
//!   find, get)
//! - The connection gate serializing access to the single physical connection
//! - The persisted schema registry with lazy loading and rollback eviction
//! - Migrations for the metadata tables
//! - TOML configuration

pub mod config;
pub mod connection;
pub mod database;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod persist;
pub mod query;
pub mod registry;
pub mod side_table;

// Re-export key types
pub use config::{JournalMode, StoreConfig};
pub use connection::{ConnectionGate, SqlSession};
pub use database::Database;
pub use errors::Result;
pub use registry::SchemaRegistry;
