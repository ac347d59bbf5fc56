//! Per-class column catalog with monotonic evolution
//!
//! A `Schema` only ever grows. `diff` is pure: it reports which proposed
//! columns are new and refuses any column whose descriptor would change.
//! Persisting the result is the store's job.

use crate::errors::{LazyrowError, Result};
use crate::model::ID;
use crate::sql::{ColumnDef, SqlType};
use crate::value::Descriptor;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    entity: String,
    columns: BTreeMap<String, Descriptor>,
}

impl Schema {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            columns: BTreeMap::new(),
        }
    }

    pub fn with_columns(entity: impl Into<String>, columns: BTreeMap<String, Descriptor>) -> Self {
        Self {
            entity: entity.into(),
            columns,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn columns(&self) -> &BTreeMap<String, Descriptor> {
        &self.columns
    }

    pub fn descriptor(&self, column: &str) -> Option<&Descriptor> {
        self.columns.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// True before the class was ever saved
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns proposed here but not yet registered
    ///
    /// # Errors
    ///
    /// `IncorrectType` for the first proposed column registered with another
    /// descriptor; the schema is not touched either way.
    pub fn diff(
        &self,
        proposed: &BTreeMap<String, Descriptor>,
    ) -> Result<BTreeMap<String, Descriptor>> {
        let mut new_columns = BTreeMap::new();
        for (column, descriptor) in proposed {
            match self.columns.get(column) {
                Some(registered) if registered == descriptor => {}
                Some(registered) => {
                    return Err(LazyrowError::IncorrectType {
                        entity: self.entity.clone(),
                        column: column.clone(),
                        registered: registered.to_string(),
                        attempted: descriptor.to_string(),
                    })
                }
                None => {
                    new_columns.insert(column.clone(), descriptor.clone());
                }
            }
        }
        Ok(new_columns)
    }

    /// Add columns produced by `diff`; existing columns are never replaced
    pub fn register(&mut self, columns: BTreeMap<String, Descriptor>) {
        for (column, descriptor) in columns {
            self.columns.entry(column).or_insert(descriptor);
        }
    }

    /// Columns stored in the class table itself, in name order
    pub fn table_columns(&self) -> impl Iterator<Item = (&str, &Descriptor)> {
        self.columns
            .iter()
            .filter(|(_, d)| !d.is_list())
            .map(|(c, d)| (c.as_str(), d))
    }

    /// Columns stored in side tables
    pub fn list_columns(&self) -> impl Iterator<Item = (&str, &Descriptor)> {
        self.columns
            .iter()
            .filter(|(_, d)| d.is_list())
            .map(|(c, d)| (c.as_str(), d))
    }

    pub fn pointer_columns(&self) -> impl Iterator<Item = (&str, &Descriptor)> {
        self.columns
            .iter()
            .filter(|(_, d)| d.is_pointer())
            .map(|(c, d)| (c.as_str(), d))
    }
}

/// The identity column every class table starts with
pub fn identity_column() -> ColumnDef {
    ColumnDef::new(ID, SqlType::Integer).primary_key().not_null()
}

/// Table column definition for a non-list descriptor
pub fn column_def(column: &str, descriptor: &Descriptor) -> Option<ColumnDef> {
    let sql_type = descriptor.sql_type()?;
    let def = ColumnDef::new(column, sql_type);
    Some(match (descriptor.is_pointer(), descriptor.entity()) {
        (true, Some(target)) => def.references(target),
        _ => def,
    })
}
