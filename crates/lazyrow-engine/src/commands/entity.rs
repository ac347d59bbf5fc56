//! Entity command handlers with boundary logging.

use super::correlate;
use lazyrow_core::core_types::RequestContext;
use lazyrow_core::{log_op_end, log_op_error, log_op_start};
use lazyrow_core::{Entity, ObjectId};
use lazyrow_store::{Database, Result};

/// Save an entity and its new or dirty children
///
/// ## Errors
///
/// - `IncorrectType`: a column is reused with another descriptor
/// - `IllegalArgument`: a value cannot be stored
/// - `SqlExecution`: the engine rejected a statement
///
/// The entity is unchanged when an error is returned.
pub fn entity_save(db: &Database, entity: &mut Entity, ctx: &RequestContext) -> Result<ObjectId> {
    let class = entity.class().to_string();
    log_op_start!(
        "entity_save",
        entity = class.as_str(),
        request_id = %ctx.request_id
    );
    let start = std::time::Instant::now();

    let id = db.save(entity).map_err(|e| {
        let e = correlate(e, ctx);
        log_op_error!(
            "entity_save",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            entity = class.as_str()
        );
        e
    })?;

    log_op_end!(
        "entity_save",
        duration_ms = start.elapsed().as_millis() as u64,
        entity = class.as_str(),
        object_id = id
    );
    Ok(id)
}

/// Reload an entity's persisted snapshot
///
/// ## Errors
///
/// - `ObjectNotFound`: no identity, unknown class or no such row
pub fn entity_fetch(db: &Database, entity: &mut Entity, ctx: &RequestContext) -> Result<()> {
    let class = entity.class().to_string();
    log_op_start!(
        "entity_fetch",
        entity = class.as_str(),
        object_id = ?entity.id(),
        request_id = %ctx.request_id
    );
    let start = std::time::Instant::now();

    db.fetch(entity).map_err(|e| {
        let e = correlate(e, ctx);
        log_op_error!(
            "entity_fetch",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            entity = class.as_str()
        );
        e
    })?;

    log_op_end!(
        "entity_fetch",
        duration_ms = start.elapsed().as_millis() as u64,
        entity = class.as_str()
    );
    Ok(())
}

/// Delete an entity's row and list rows
///
/// ## Errors
///
/// - `ObjectNotFound`: no identity or no such row
/// - `SqlExecution`: the row is still referenced while foreign keys are enforced
pub fn entity_delete(db: &Database, entity: &Entity, ctx: &RequestContext) -> Result<()> {
    log_op_start!(
        "entity_delete",
        entity = entity.class(),
        object_id = ?entity.id(),
        request_id = %ctx.request_id
    );
    let start = std::time::Instant::now();

    db.delete(entity).map_err(|e| {
        let e = correlate(e, ctx);
        log_op_error!(
            "entity_delete",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            entity = entity.class()
        );
        e
    })?;

    log_op_end!(
        "entity_delete",
        duration_ms = start.elapsed().as_millis() as u64,
        entity = entity.class()
    );
    Ok(())
}
