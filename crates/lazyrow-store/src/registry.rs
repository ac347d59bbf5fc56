//! Persisted schema registry
//!
//! Schemas are read from `_lazyrow_schema` the first time a class is touched
//! and cached afterwards. Columns introduced by `diff` are written to the
//! metadata table in the caller's transaction; if that transaction rolls back,
//! the cached schemas it changed are evicted and reloaded on next use.

use crate::connection::SqlSession;
use crate::errors::Result;
use lazyrow_core::predicate::Predicate;
use lazyrow_core::sql::{Insert, Select, SqlValue};
use lazyrow_core::value::Descriptor;
use lazyrow_core::{LazyrowError, Schema};
use std::collections::{BTreeMap, HashMap, HashSet};

pub const SCHEMA_TABLE: &str = "_lazyrow_schema";

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    cache: HashMap<String, Schema>,
    touched: HashSet<String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema of `entity`, loading it from the metadata table on first use
    pub fn resolve(&mut self, session: &SqlSession<'_>, entity: &str) -> Result<&Schema> {
        if !self.cache.contains_key(entity) {
            let schema = load(session, entity)?;
            tracing::debug!(entity, columns = schema.columns().len(), "schema loaded");
            self.cache.insert(entity.to_string(), schema);
        }
        self.cache.get(entity).ok_or_else(|| {
            LazyrowError::Internal {
                message: format!("schema cache lost {}", entity),
            }
            .into()
        })
    }

    /// Register the proposed columns, returning only the new ones
    ///
    /// # Errors
    ///
    /// `IncorrectType` when a proposed column is registered with another
    /// descriptor; nothing is written in that case.
    pub fn diff(
        &mut self,
        session: &SqlSession<'_>,
        entity: &str,
        proposed: &BTreeMap<String, Descriptor>,
    ) -> Result<BTreeMap<String, Descriptor>> {
        let new_columns = self.resolve(session, entity)?.diff(proposed)?;
        if new_columns.is_empty() {
            return Ok(new_columns);
        }

        let registered_at = chrono::Utc::now().timestamp_millis();
        let rows = new_columns
            .iter()
            .map(|(column, descriptor)| {
                vec![
                    SqlValue::Text(entity.to_string()),
                    SqlValue::Text(column.clone()),
                    SqlValue::Text(descriptor.to_string()),
                    SqlValue::Integer(registered_at),
                ]
            })
            .collect();
        let insert = Insert::rows(
            SCHEMA_TABLE,
            vec![
                "entity".to_string(),
                "column".to_string(),
                "descriptor".to_string(),
                "registered_at".to_string(),
            ],
            rows,
        )
        .build()?;

        self.touched.insert(entity.to_string());
        session.execute(&insert)?;

        if let Some(schema) = self.cache.get_mut(entity) {
            schema.register(new_columns.clone());
        }
        tracing::debug!(
            entity,
            columns = ?new_columns.keys().collect::<Vec<_>>(),
            "columns registered"
        );
        Ok(new_columns)
    }

    /// Cached schema without touching the database
    pub fn cached(&self, entity: &str) -> Option<&Schema> {
        self.cache.get(entity)
    }

    /// The enclosing transaction committed
    pub fn commit(&mut self) {
        self.touched.clear();
    }

    /// The enclosing transaction rolled back
    pub fn rollback(&mut self) {
        for entity in self.touched.drain() {
            self.cache.remove(&entity);
            tracing::debug!(entity = %entity, "schema evicted after rollback");
        }
    }
}

fn load(session: &SqlSession<'_>, entity: &str) -> Result<Schema> {
    let select = Select::new(SCHEMA_TABLE, ["column", "descriptor"])
        .filter(Predicate::equal_to("entity", entity))
        .build()?;

    let mut columns = BTreeMap::new();
    for row in session.query(&select)? {
        match row.as_slice() {
            [SqlValue::Text(column), SqlValue::Text(descriptor)] => {
                columns.insert(column.clone(), descriptor.parse::<Descriptor>()?);
            }
            other => {
                return Err(LazyrowError::Decode {
                    column: SCHEMA_TABLE.to_string(),
                    reason: format!("unexpected metadata row {:?}", other),
                }
                .into())
            }
        }
    }
    Ok(Schema::with_columns(entity, columns))
}
