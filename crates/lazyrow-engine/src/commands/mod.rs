//! Operation boundary.
//!
//! The engine layer owns lifecycle logging for every top-level operation:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Lower layers (store, core) use only `tracing::debug!()` and `warn!()`.

pub mod entity;
pub mod query;

use lazyrow_core::core_types::RequestContext;
use lazyrow_core::ExError;

/// Attach the request's correlation ids to an error
pub(crate) fn correlate(err: ExError, ctx: &RequestContext) -> ExError {
    let err = err.with_request_id(ctx.request_id.clone());
    match &ctx.trace_id {
        Some(trace_id) => err.with_trace_id(trace_id.clone()),
        None => err,
    }
}
