use super::statement::{quote_ident, Statement};
use crate::errors::{LazyrowError, Result};
use crate::value::SqlType;

/// One column of a CREATE TABLE or ALTER TABLE ADD COLUMN
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    name: String,
    sql_type: SqlType,
    primary_key: bool,
    not_null: bool,
    references: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            primary_key: false,
            not_null: false,
            references: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Foreign key to the identity column of `table`
    pub fn references(mut self, table: impl Into<String>) -> Self {
        self.references = Some(table.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn render(&self) -> String {
        let mut out = format!("{} {}", quote_ident(&self.name), self.sql_type.as_str());
        if self.primary_key {
            out.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            out.push_str(" NOT NULL");
        }
        if let Some(table) = &self.references {
            out.push_str(&format!(" REFERENCES {}(\"id\")", quote_ident(table)));
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictClause {
    Rollback,
    Abort,
    Fail,
    Ignore,
    Replace,
}

impl ConflictClause {
    fn as_str(&self) -> &'static str {
        match self {
            ConflictClause::Rollback => "ROLLBACK",
            ConflictClause::Abort => "ABORT",
            ConflictClause::Fail => "FAIL",
            ConflictClause::Ignore => "IGNORE",
            ConflictClause::Replace => "REPLACE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    table: String,
    columns: Vec<ColumnDef>,
    if_not_exists: bool,
    unique: Vec<Vec<String>>,
    on_conflict: Option<ConflictClause>,
}

impl CreateTable {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            if_not_exists: false,
            unique: Vec::new(),
            on_conflict: None,
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = ColumnDef>) -> Self {
        self.columns.extend(columns);
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Composite UNIQUE constraint over the given columns
    pub fn unique<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.unique.push(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Conflict resolution applied to the UNIQUE constraints
    pub fn on_conflict(mut self, clause: ConflictClause) -> Self {
        self.on_conflict = Some(clause);
        self
    }

    pub fn build(&self) -> Result<Statement> {
        if self.columns.is_empty() {
            return Err(LazyrowError::illegal_argument(format!(
                "table {} needs at least one column",
                self.table
            )));
        }
        if self.columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(LazyrowError::illegal_argument(format!(
                "table {} declares more than one primary key column",
                self.table
            )));
        }

        let mut parts: Vec<String> = self.columns.iter().map(ColumnDef::render).collect();
        for group in &self.unique {
            let cols: Vec<String> = group.iter().map(|c| quote_ident(c)).collect();
            let mut constraint = format!("UNIQUE ({})", cols.join(", "));
            if let Some(clause) = self.on_conflict {
                constraint.push_str(" ON CONFLICT ");
                constraint.push_str(clause.as_str());
            }
            parts.push(constraint);
        }

        let sql = format!(
            "CREATE TABLE {}{} ({})",
            if self.if_not_exists { "IF NOT EXISTS " } else { "" },
            quote_ident(&self.table),
            parts.join(", ")
        );
        Ok(Statement::new(sql))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_table() {
        let stmt = CreateTable::new("Movie")
            .column(ColumnDef::new("id", SqlType::Integer).primary_key().not_null())
            .column(ColumnDef::new("title", SqlType::Text))
            .column(ColumnDef::new("director", SqlType::Integer).references("Person"))
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "CREATE TABLE \"Movie\" (\"id\" INTEGER PRIMARY KEY NOT NULL, \"title\" TEXT, \
             \"director\" INTEGER REFERENCES \"Person\"(\"id\"))"
        );
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_unique_group_with_conflict_clause() {
        let stmt = CreateTable::new("_list_Movie_tags")
            .if_not_exists()
            .column(ColumnDef::new("parentId", SqlType::Integer).not_null())
            .column(ColumnDef::new("value", SqlType::Text).not_null())
            .unique(["parentId", "value"])
            .on_conflict(ConflictClause::Replace)
            .build()
            .unwrap();
        assert!(stmt.sql.starts_with("CREATE TABLE IF NOT EXISTS \"_list_Movie_tags\""));
        assert!(stmt
            .sql
            .ends_with("UNIQUE (\"parentId\", \"value\") ON CONFLICT REPLACE)"));
    }

    #[test]
    fn test_rejects_empty_and_double_primary_key() {
        assert!(CreateTable::new("t").build().is_err());
        let two = CreateTable::new("t")
            .column(ColumnDef::new("a", SqlType::Integer).primary_key())
            .column(ColumnDef::new("b", SqlType::Integer).primary_key());
        assert!(two.build().is_err());
    }
}
