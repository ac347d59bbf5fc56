//! Statements for list side tables
//!
//! A list property `<column>` of class `<Owner>` lives in
//! `_list_<Owner>_<column>(parentId, value)`, one row per element. Names
//! whose parts contain `_` are length-prefixed (see `sql::derived_name`). The
//! `UNIQUE (parentId, value) ON CONFLICT REPLACE` constraint makes re-inserting
//! the same elements idempotent, so lists behave as ordered sets.

use crate::errors::{LazyrowError, Result};
use crate::model::ObjectId;
use crate::predicate::Predicate;
use crate::sql::{
    derived_name, quote_ident, ColumnDef, ConflictClause, CreateTable, Delete, Insert, SqlType,
    SqlValue, Statement,
};
use crate::value::{Descriptor, Value};

pub const SIDE_TABLE_PREFIX: &str = "_list";
pub const PARENT_COLUMN: &str = "parentId";
pub const VALUE_COLUMN: &str = "value";

/// Rows per INSERT, kept well below SQLite's bound-parameter limit
const INSERT_CHUNK: usize = 256;

pub fn table_name(owner: &str, column: &str) -> String {
    derived_name(SIDE_TABLE_PREFIX, &[owner, column])
}

/// CREATE TABLE IF NOT EXISTS for a list column
pub fn create(owner: &str, column: &str, list: &Descriptor) -> Result<Statement> {
    let element = list.element_descriptor().ok_or_else(|| LazyrowError::Internal {
        message: format!("{}.{} is not a list column", owner, column),
    })?;
    let sql_type = element.sql_type().ok_or_else(|| LazyrowError::Internal {
        message: format!("{}.{} has no storable element type", owner, column),
    })?;

    let mut value = ColumnDef::new(VALUE_COLUMN, sql_type).not_null();
    if let Some(target) = element.entity() {
        value = value.references(target);
    }

    CreateTable::new(table_name(owner, column))
        .if_not_exists()
        .column(
            ColumnDef::new(PARENT_COLUMN, SqlType::Integer)
                .not_null()
                .references(owner),
        )
        .column(value)
        .unique([PARENT_COLUMN, VALUE_COLUMN])
        .on_conflict(ConflictClause::Replace)
        .build()
}

/// INSERTs of every element for one parent
///
/// Deletes nothing; pair with `clear` for a full rewrite.
pub fn insert(
    owner: &str,
    column: &str,
    parent_id: ObjectId,
    elements: &[Value],
) -> Result<Vec<Statement>> {
    let rows = elements
        .iter()
        .map(|e| Ok(vec![SqlValue::Integer(parent_id), e.to_sql_value()?]))
        .collect::<Result<Vec<_>>>()?;

    let table = table_name(owner, column);
    rows.chunks(INSERT_CHUNK)
        .map(|chunk| {
            Insert::rows(
                table.clone(),
                vec![PARENT_COLUMN.to_string(), VALUE_COLUMN.to_string()],
                chunk.to_vec(),
            )
            .build()
        })
        .collect()
}

/// Elements of one parent in insertion order
pub fn select(owner: &str, column: &str, parent_id: ObjectId) -> Statement {
    Statement::with_params(
        format!(
            "SELECT {} FROM {} WHERE {} = ? ORDER BY rowid",
            quote_ident(VALUE_COLUMN),
            quote_ident(&table_name(owner, column)),
            quote_ident(PARENT_COLUMN)
        ),
        vec![SqlValue::Integer(parent_id)],
    )
}

pub fn clear(owner: &str, column: &str, parent_id: ObjectId) -> Result<Statement> {
    Delete::new(table_name(owner, column))
        .filter(Predicate::equal_to(PARENT_COLUMN, parent_id))
        .build()
}
