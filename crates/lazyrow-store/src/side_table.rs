//! Execution of list side-table statements

use crate::connection::SqlSession;
use crate::errors::Result;
use lazyrow_core::side_table;
use lazyrow_core::value::{decode, Descriptor, Value};
use lazyrow_core::{LazyrowError, ObjectId, Schema};

/// Create the side table of a list column if needed
pub fn ensure(session: &SqlSession<'_>, owner: &str, column: &str, list: &Descriptor) -> Result<()> {
    session.execute(&side_table::create(owner, column, list)?)?;
    Ok(())
}

/// Replace the stored elements of one parent with `elements`
pub fn write(
    session: &SqlSession<'_>,
    owner: &str,
    column: &str,
    parent_id: ObjectId,
    elements: &[Value],
) -> Result<()> {
    session.execute(&side_table::clear(owner, column, parent_id)?)?;
    session.execute_all(&side_table::insert(owner, column, parent_id, elements)?)?;
    Ok(())
}

/// Elements of one parent in insertion order
pub fn read(
    session: &SqlSession<'_>,
    owner: &str,
    column: &str,
    list: &Descriptor,
    parent_id: ObjectId,
) -> Result<Vec<Value>> {
    let element = list
        .element_descriptor()
        .ok_or_else(|| LazyrowError::Internal {
            message: format!("{}.{} is not a list column", owner, column),
        })?;

    let mut values = Vec::new();
    for row in session.query(&side_table::select(owner, column, parent_id))? {
        let raw = row.into_iter().next().ok_or_else(|| LazyrowError::Decode {
            column: column.to_string(),
            reason: "side table row has no value".to_string(),
        })?;
        if let Some(value) = decode(&element, column, raw)? {
            values.push(value);
        }
    }
    Ok(values)
}

/// Remove every side-table row of one parent
pub fn clear_all(session: &SqlSession<'_>, schema: &Schema, parent_id: ObjectId) -> Result<()> {
    for (column, _) in schema.list_columns() {
        session.execute(&side_table::clear(schema.entity(), column, parent_id)?)?;
    }
    Ok(())
}
