//! lazyrow core - value model, schema catalog and SQL synthesis
//!
//! This crate holds everything that does not need a live connection:
//! - Value & descriptor system (classification, literals, decoding)
//! - Predicate builder and the SQL command builders
//! - Pure schema catalog with monotonic evolution
//! - Statements for list side tables
//! - Entity state (overlays, typed accessors), query descriptions and the
//!   model registry used for typed hydration
//!
//! Execution lives in `lazyrow-store`; async dispatch in `lazyrow-engine`.

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod predicate;
pub mod schema;
pub mod side_table;
pub mod sql;
pub mod value;

pub use lazyrow_core_types as core_types;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, LazyrowError, Result};
pub use model::{Entity, Model, ModelRegistry, ObjectId, Query};
pub use predicate::Predicate;
pub use schema::Schema;
pub use sql::{OrderBy, SqlValue, Statement};
pub use value::{classify, Descriptor, TypeTag, Value};
