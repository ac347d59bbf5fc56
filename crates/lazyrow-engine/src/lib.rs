//! lazyrow engine - operation boundary and async execution
//!
//! Provides:
//! - Logged entry points for every top-level operation (`commands`)
//! - `Engine`, which runs those operations on tokio's blocking pool and
//!   hands back `OpFuture`s

pub mod commands;
pub mod executor;

pub use executor::{Engine, EntityFailure, OpFuture};
