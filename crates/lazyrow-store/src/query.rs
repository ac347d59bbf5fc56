//! Query execution: find and get
//!
//! `find` turns a `Query` into one SELECT, joining the tables of included
//! pointer columns, and hydrates every row into an entity whose data is
//! available. Querying a class that was never saved yields no rows.

use crate::connection::SqlSession;
use crate::errors::Result;
use crate::persist::{decode_into, load_lists, load_row, not_found};
use crate::registry::SchemaRegistry;
use lazyrow_core::model::{ID, RESERVED_COLUMNS};
use lazyrow_core::predicate::Predicate;
use lazyrow_core::sql::{CreateIndex, Join, ProjectedColumn, Select, SqlValue, Statement};
use lazyrow_core::value::Value;
use lazyrow_core::{Entity, LazyrowError, ObjectId, Query, Schema};
use std::collections::BTreeMap;

/// Whether a table of that name exists
pub fn table_exists(session: &SqlSession<'_>, table: &str) -> Result<bool> {
    let stmt = Statement::with_params(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        vec![SqlValue::Text(table.to_string())],
    );
    Ok(session.scalar_count(&stmt)? > 0)
}

/// Included pointer column joined to its target's schema
struct Inclusion {
    column: String,
    target: Schema,
}

pub fn find(
    session: &SqlSession<'_>,
    registry: &mut SchemaRegistry,
    query: &Query,
) -> Result<Vec<Entity>> {
    let class = query.class();
    if !table_exists(session, class)? {
        tracing::debug!(entity = class, "no table, empty result");
        return Ok(Vec::new());
    }
    let schema = registry.resolve(session, class)?.clone();
    let inclusions = resolve_includes(session, registry, &schema, query.includes())?;

    ensure_equality_index(session, &schema, query.predicate())?;

    let columns = std::iter::once(ID).chain(schema.table_columns().map(|(c, _)| c));
    let mut select = Select::new(class, columns);
    for inclusion in &inclusions {
        let joined = std::iter::once(ID).chain(inclusion.target.table_columns().map(|(c, _)| c));
        select = select.join(Join::new(
            inclusion.column.as_str(),
            inclusion.target.entity(),
            joined,
        ));
    }
    if let Some(predicate) = query.predicate() {
        select = select.filter(predicate.clone());
    }
    for order in query.ordering() {
        select = select.order_by(order.clone());
    }
    if let Some(limit) = query.limit_value() {
        select = select.limit(limit);
    }
    if let Some(skip) = query.skip_value() {
        select = select.offset(skip);
    }

    let layout = select.projection();
    let rows = session.query(&select.build()?)?;
    tracing::debug!(entity = class, rows = rows.len(), "query executed");

    rows.into_iter()
        .map(|row| hydrate_row(session, &schema, &inclusions, &layout, row))
        .collect()
}

/// Classify the requested includes
///
/// Reserved, scalar and list keys are ignored with a warning, unknown keys are
/// rejected. A pointer whose target table does not exist yet has nothing to
/// join and is skipped.
fn resolve_includes(
    session: &SqlSession<'_>,
    registry: &mut SchemaRegistry,
    schema: &Schema,
    includes: &[String],
) -> Result<Vec<Inclusion>> {
    let mut inclusions = Vec::new();
    for key in includes {
        let Some(descriptor) = schema.descriptor(key) else {
            if RESERVED_COLUMNS.contains(&key.as_str()) {
                tracing::warn!(entity = schema.entity(), key = %key, "include of a reserved column ignored");
                continue;
            }
            return Err(LazyrowError::illegal_argument(format!(
                "{} has no column {} to include",
                schema.entity(),
                key
            ))
            .into());
        };

        match descriptor.entity().filter(|_| descriptor.is_pointer()) {
            Some(target) => {
                if table_exists(session, target)? {
                    let target = registry.resolve(session, target)?.clone();
                    inclusions.push(Inclusion {
                        column: key.clone(),
                        target,
                    });
                } else {
                    tracing::debug!(entity = schema.entity(), key = %key, joined = target, "include target has no table");
                }
            }
            None => {
                tracing::warn!(
                    entity = schema.entity(),
                    key = %key,
                    descriptor = %descriptor,
                    "include of a non-pointer column ignored"
                );
            }
        }
    }
    Ok(inclusions)
}

/// Index the columns a predicate compares for equality
fn ensure_equality_index(
    session: &SqlSession<'_>,
    schema: &Schema,
    predicate: Option<&Predicate>,
) -> Result<()> {
    let Some(predicate) = predicate else {
        return Ok(());
    };
    let keys: Vec<&str> = predicate
        .equality_columns()
        .into_iter()
        .filter(|c| schema.descriptor(c).is_some_and(|d| !d.is_list()))
        .collect();
    if keys.is_empty() {
        return Ok(());
    }
    session.execute(&CreateIndex::new(schema.entity(), keys).if_not_exists().build()?)?;
    Ok(())
}

fn hydrate_row(
    session: &SqlSession<'_>,
    schema: &Schema,
    inclusions: &[Inclusion],
    layout: &[ProjectedColumn],
    row: Vec<SqlValue>,
) -> Result<Entity> {
    let mut id: Option<ObjectId> = None;
    let mut values = BTreeMap::new();
    let mut joined: Vec<(Option<ObjectId>, BTreeMap<String, Value>)> =
        vec![(None, BTreeMap::new()); inclusions.len()];

    for (slot, raw) in layout.iter().zip(row) {
        match slot.join {
            None if slot.column == ID => id = raw.as_i64(),
            None => decode_into(schema, &slot.column, raw, &mut values)?,
            Some(i) => {
                let (joined_id, joined_values) = &mut joined[i];
                if slot.column == ID {
                    *joined_id = raw.as_i64();
                } else {
                    decode_into(&inclusions[i].target, &slot.column, raw, joined_values)?;
                }
            }
        }
    }

    let id = id.ok_or_else(|| LazyrowError::Decode {
        column: ID.to_string(),
        reason: format!("{} row without identity", schema.entity()),
    })?;

    for (inclusion, (joined_id, mut joined_values)) in inclusions.iter().zip(joined) {
        // NULL pointer or dangling reference: nothing was joined
        let Some(joined_id) = joined_id else {
            continue;
        };
        load_lists(session, &inclusion.target, joined_id, &mut joined_values)?;
        let child = Entity::hydrated(inclusion.target.entity(), joined_id, joined_values);
        values.insert(inclusion.column.clone(), Value::from(child));
    }

    load_lists(session, schema, id, &mut values)?;
    Ok(Entity::hydrated(schema.entity(), id, values))
}

/// Load one entity by class and identity
pub fn get(
    session: &SqlSession<'_>,
    registry: &mut SchemaRegistry,
    class: &str,
    id: ObjectId,
) -> Result<Entity> {
    if !table_exists(session, class)? {
        return Err(not_found(class, Some(id)));
    }
    let schema = registry.resolve(session, class)?.clone();
    let values = load_row(session, &schema, id)?.ok_or_else(|| not_found(class, Some(id)))?;
    Ok(Entity::hydrated(class, id, values))
}
