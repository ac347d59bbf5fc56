//! Read-only query handlers with boundary logging.

use super::correlate;
use lazyrow_core::core_types::RequestContext;
use lazyrow_core::{log_op_end, log_op_error, log_op_start};
use lazyrow_core::{Entity, ObjectId, Query, Schema};
use lazyrow_store::{Database, Result};

/// Run a query; a class that was never saved yields no rows
///
/// ## Errors
///
/// - `IllegalArgument`: include of an unknown column
/// - `SqlExecution`: filter or order on a column the table lacks
pub fn entity_find(db: &Database, query: &Query, ctx: &RequestContext) -> Result<Vec<Entity>> {
    log_op_start!(
        "entity_find",
        entity = query.class(),
        request_id = %ctx.request_id
    );
    let start = std::time::Instant::now();

    let found = db.find(query).map_err(|e| {
        let e = correlate(e, ctx);
        log_op_error!(
            "entity_find",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            entity = query.class()
        );
        e
    })?;

    log_op_end!(
        "entity_find",
        duration_ms = start.elapsed().as_millis() as u64,
        entity = query.class(),
        row_count = found.len()
    );
    Ok(found)
}

/// Load one entity by class and identity
///
/// ## Errors
///
/// - `ObjectNotFound`: missing table or row
pub fn entity_get(
    db: &Database,
    class: &str,
    id: ObjectId,
    ctx: &RequestContext,
) -> Result<Entity> {
    log_op_start!(
        "entity_get",
        entity = class,
        object_id = id,
        request_id = %ctx.request_id
    );
    let start = std::time::Instant::now();

    let entity = db.get(class, id).map_err(|e| {
        let e = correlate(e, ctx);
        log_op_error!(
            "entity_get",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            entity = class
        );
        e
    })?;

    log_op_end!(
        "entity_get",
        duration_ms = start.elapsed().as_millis() as u64,
        entity = class,
        object_id = id
    );
    Ok(entity)
}

/// Registered schema of a class
pub fn schema_describe(db: &Database, class: &str, ctx: &RequestContext) -> Result<Schema> {
    log_op_start!("schema_describe", entity = class, request_id = %ctx.request_id);
    let start = std::time::Instant::now();

    let schema = db.schema(class).map_err(|e| {
        let e = correlate(e, ctx);
        log_op_error!(
            "schema_describe",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            entity = class
        );
        e
    })?;

    log_op_end!(
        "schema_describe",
        duration_ms = start.elapsed().as_millis() as u64,
        entity = class,
        column_count = schema.columns().len()
    );
    Ok(schema)
}
