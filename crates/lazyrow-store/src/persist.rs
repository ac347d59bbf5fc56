//! Entity persistence: save, fetch and delete
//!
//! These functions run inside a transaction opened by the caller. `save`
//! mutates the entity it is given (identity, overlays, cascaded children), so
//! callers hand it a working copy and only keep it once the transaction has
//! committed.

use crate::connection::SqlSession;
use crate::errors::Result;
use crate::registry::SchemaRegistry;
use crate::side_table;
use chrono::{DateTime, Utc};
use lazyrow_core::errors::ExError;
use lazyrow_core::model::ID;
use lazyrow_core::predicate::Predicate;
use lazyrow_core::schema::{column_def, identity_column};
use lazyrow_core::sql::{AlterTable, CreateTable, Delete, Insert, Select, SqlValue, Update};
use lazyrow_core::value::{decode, Descriptor, Value};
use lazyrow_core::{Entity, LazyrowError, ObjectId, Schema};
use std::collections::BTreeMap;

pub(crate) fn not_found(entity: &str, object_id: Option<ObjectId>) -> ExError {
    LazyrowError::ObjectNotFound {
        entity: entity.to_string(),
        object_id,
    }
    .into()
}

/// True when a cascaded save has something to write for `child`
fn needs_save(child: &Entity) -> bool {
    child.is_new() || child.is_dirty()
}

/// Save an entity and, first, every unsaved or dirty entity it points to
///
/// Create path when the entity has no identity, update path otherwise.
pub fn save(
    session: &SqlSession<'_>,
    registry: &mut SchemaRegistry,
    entity: &mut Entity,
    now: DateTime<Utc>,
) -> Result<ObjectId> {
    let class = entity.class().to_string();
    entity.stamp(now);

    let was_empty = registry.resolve(session, &class)?.is_empty();
    let new_columns = registry
        .diff(session, &class, entity.staged())
        .map_err(|e| e.with_entity(class.as_str()))?;
    apply_schema_changes(session, &class, was_empty, &new_columns)?;

    for (key, child) in entity.pending_children_mut() {
        if needs_save(child) {
            tracing::debug!(entity = %class, column = key, child = child.class(), "cascading save");
            save(session, registry, child, now)?;
        }
    }
    for child in entity.pending_list_elements_mut() {
        if needs_save(child) {
            save(session, registry, child, now)?;
        }
    }

    let mut row: Vec<(String, SqlValue)> = Vec::new();
    for (key, value) in entity.pending().iter().chain(entity.pending_children()) {
        if !matches!(value, Value::List(_)) {
            row.push((key.clone(), value.to_sql_value()?));
        }
    }

    let id = match entity.id() {
        None => {
            let insert = row
                .into_iter()
                .fold(Insert::new(class.as_str()), |insert, (c, v)| insert.value(c, v));
            session.insert_returning_id(&insert.build()?)?
        }
        Some(id) => {
            let update = row
                .into_iter()
                .fold(Update::new(class.as_str()), |update, (c, v)| update.set(c, v))
                .filter(Predicate::equal_to(ID, id));
            if session.execute(&update.build()?)? == 0 {
                tracing::warn!(entity = %class, object_id = id, "update matched no row");
                return Err(not_found(&class, Some(id)));
            }
            id
        }
    };

    for (column, value) in entity.pending() {
        if let Value::List(items) = value {
            side_table::write(session, &class, column, id, items)?;
        }
    }

    entity.commit_pending(id)?;
    tracing::debug!(entity = %class, object_id = id, "entity saved");
    Ok(id)
}

/// CREATE TABLE for a first save, ALTER TABLE for later new columns
fn apply_schema_changes(
    session: &SqlSession<'_>,
    class: &str,
    was_empty: bool,
    new_columns: &BTreeMap<String, Descriptor>,
) -> Result<()> {
    if new_columns.is_empty() {
        return Ok(());
    }

    let defs = new_columns.iter().filter_map(|(c, d)| column_def(c, d));
    if was_empty {
        let create = CreateTable::new(class)
            .column(identity_column())
            .columns(defs);
        session.execute(&create.build()?)?;
    } else {
        session.execute_all(&AlterTable::new(class).add_columns(defs).build())?;
    }

    for (column, descriptor) in new_columns.iter().filter(|(_, d)| d.is_list()) {
        side_table::ensure(session, class, column, descriptor)?;
    }
    Ok(())
}

/// Reload an entity's snapshot by identity, keeping its overlays
pub fn fetch(
    session: &SqlSession<'_>,
    registry: &mut SchemaRegistry,
    entity: &mut Entity,
) -> Result<()> {
    let id = entity
        .id()
        .ok_or_else(|| not_found(entity.class(), None))?;
    let schema = registry.resolve(session, entity.class())?.clone();
    if schema.is_empty() {
        return Err(not_found(entity.class(), Some(id)));
    }

    let values = load_row(session, &schema, id)?
        .ok_or_else(|| not_found(entity.class(), Some(id)))?;
    entity.load_snapshot(values);
    Ok(())
}

/// Delete an entity's row and its side-table rows
///
/// The in-memory entity is left untouched.
pub fn delete(
    session: &SqlSession<'_>,
    registry: &mut SchemaRegistry,
    entity: &Entity,
) -> Result<()> {
    let id = entity
        .id()
        .ok_or_else(|| not_found(entity.class(), None))?;
    let schema = registry.resolve(session, entity.class())?.clone();
    if schema.is_empty() {
        return Err(not_found(entity.class(), Some(id)));
    }

    side_table::clear_all(session, &schema, id)?;
    let delete = Delete::new(entity.class())
        .filter(Predicate::equal_to(ID, id))
        .build()?;
    if session.execute(&delete)? == 0 {
        return Err(not_found(entity.class(), Some(id)));
    }
    tracing::debug!(entity = entity.class(), object_id = id, "entity deleted");
    Ok(())
}

/// Read one row by identity, list columns included
pub(crate) fn load_row(
    session: &SqlSession<'_>,
    schema: &Schema,
    id: ObjectId,
) -> Result<Option<BTreeMap<String, Value>>> {
    let columns: Vec<&str> = std::iter::once(ID)
        .chain(schema.table_columns().map(|(c, _)| c))
        .collect();
    let select = Select::new(schema.entity(), columns.iter().copied())
        .filter(Predicate::equal_to(ID, id))
        .build()?;

    let Some(row) = session.query(&select)?.into_iter().next() else {
        return Ok(None);
    };

    let mut values = BTreeMap::new();
    for (column, raw) in columns.iter().zip(row).skip(1) {
        decode_into(schema, column, raw, &mut values)?;
    }
    load_lists(session, schema, id, &mut values)?;
    Ok(Some(values))
}

/// Decode one stored value by the schema's descriptor; NULL leaves the key absent
pub(crate) fn decode_into(
    schema: &Schema,
    column: &str,
    raw: SqlValue,
    values: &mut BTreeMap<String, Value>,
) -> Result<()> {
    let descriptor = schema
        .descriptor(column)
        .ok_or_else(|| LazyrowError::Internal {
            message: format!("{}.{} is not registered", schema.entity(), column),
        })?;
    if let Some(value) = decode(descriptor, column, raw)? {
        values.insert(column.to_string(), value);
    }
    Ok(())
}

pub(crate) fn load_lists(
    session: &SqlSession<'_>,
    schema: &Schema,
    id: ObjectId,
    values: &mut BTreeMap<String, Value>,
) -> Result<()> {
    for (column, descriptor) in schema.list_columns() {
        let items = side_table::read(session, schema.entity(), column, descriptor, id)?;
        if !items.is_empty() {
            values.insert(column.to_string(), Value::List(items));
        }
    }
    Ok(())
}
