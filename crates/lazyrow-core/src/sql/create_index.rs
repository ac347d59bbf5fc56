use super::statement::{derived_name, quote_ident, Statement};
use crate::errors::{LazyrowError, Result};

pub const INDEX_PREFIX: &str = "idx";

/// CREATE INDEX named `idx_<table>_<key1>_<key2>...`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    table: String,
    keys: Vec<String>,
    if_not_exists: bool,
}

impl CreateIndex {
    pub fn new<S: Into<String>>(table: impl Into<String>, keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            table: table.into(),
            keys: keys.into_iter().map(Into::into).collect(),
            if_not_exists: false,
        }
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Index name derived from table and keys in the order given
    pub fn name(&self) -> String {
        let mut parts = vec![self.table.as_str()];
        parts.extend(self.keys.iter().map(String::as_str));
        derived_name(INDEX_PREFIX, &parts)
    }

    pub fn build(&self) -> Result<Statement> {
        if self.keys.is_empty() {
            return Err(LazyrowError::illegal_argument(format!(
                "index on {} needs at least one key",
                self.table
            )));
        }
        let keys: Vec<String> = self.keys.iter().map(|k| quote_ident(k)).collect();
        Ok(Statement::new(format!(
            "CREATE INDEX {}{} ON {} ({})",
            if self.if_not_exists { "IF NOT EXISTS " } else { "" },
            quote_ident(&self.name()),
            quote_ident(&self.table),
            keys.join(", ")
        )))
    }
}
