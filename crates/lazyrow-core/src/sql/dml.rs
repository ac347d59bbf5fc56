use super::statement::{quote_ident, Statement};
use crate::errors::{LazyrowError, Result};
use crate::predicate::Predicate;
use crate::value::SqlValue;

/// INSERT of one or more rows with the same column list
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl Insert {
    /// Single-row insert; add values with `value`
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            rows: vec![Vec::new()],
        }
    }

    /// Multi-row insert; every row must match `columns`
    pub fn rows(
        table: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<SqlValue>>,
    ) -> Self {
        Self {
            table: table.into(),
            columns,
            rows,
        }
    }

    pub fn value(mut self, column: impl Into<String>, value: SqlValue) -> Self {
        self.columns.push(column.into());
        if let Some(row) = self.rows.first_mut() {
            row.push(value);
        }
        self
    }

    pub fn build(&self) -> Result<Statement> {
        let table = quote_ident(&self.table);

        if self.columns.is_empty() {
            return Ok(Statement::new(format!("INSERT INTO {} DEFAULT VALUES", table)));
        }
        if self.rows.is_empty() {
            return Err(LazyrowError::illegal_argument(format!(
                "insert into {} has no rows",
                self.table
            )));
        }

        let placeholders = format!("({})", vec!["?"; self.columns.len()].join(", "));
        let mut params = Vec::with_capacity(self.columns.len() * self.rows.len());
        for row in &self.rows {
            if row.len() != self.columns.len() {
                return Err(LazyrowError::illegal_argument(format!(
                    "insert into {} has {} columns but a row with {} values",
                    self.table,
                    self.columns.len(),
                    row.len()
                )));
            }
            params.extend(row.iter().cloned());
        }

        let columns: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            table,
            columns.join(", "),
            vec![placeholders; self.rows.len()].join(", ")
        );
        Ok(Statement::with_params(sql, params))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    table: String,
    sets: Vec<(String, SqlValue)>,
    predicate: Option<Predicate>,
}

impl Update {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            sets: Vec::new(),
            predicate: None,
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: SqlValue) -> Self {
        self.sets.push((column.into(), value));
        self
    }

    /// Without a predicate every row is updated
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn build(&self) -> Result<Statement> {
        if self.sets.is_empty() {
            return Err(LazyrowError::illegal_argument(format!(
                "update of {} sets no columns",
                self.table
            )));
        }

        let assignments: Vec<String> = self
            .sets
            .iter()
            .map(|(c, _)| format!("{} = ?", quote_ident(c)))
            .collect();
        let mut params: Vec<SqlValue> = self.sets.iter().map(|(_, v)| v.clone()).collect();
        let mut sql = format!(
            "UPDATE {} SET {}",
            quote_ident(&self.table),
            assignments.join(", ")
        );

        if let Some(predicate) = &self.predicate {
            let (clause, bound) = predicate.render(None)?;
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            params.extend(bound);
        }
        Ok(Statement::with_params(sql, params))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    table: String,
    predicate: Option<Predicate>,
}

impl Delete {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicate: None,
        }
    }

    /// Without a predicate every row is deleted
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn build(&self) -> Result<Statement> {
        let mut sql = format!("DELETE FROM {}", quote_ident(&self.table));
        let mut params = Vec::new();
        if let Some(predicate) = &self.predicate {
            let (clause, bound) = predicate.render(None)?;
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            params = bound;
        }
        Ok(Statement::with_params(sql, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_single_row() {
        let stmt = Insert::new("Movie")
            .value("title", SqlValue::Text("Fight Club".to_string()))
            .value("rating", SqlValue::Real(8.9))
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO \"Movie\" (\"title\", \"rating\") VALUES (?, ?)"
        );
        assert_eq!(stmt.params.len(), 2);
        assert_eq!(
            stmt.to_literal_sql(),
            "INSERT INTO \"Movie\" (\"title\", \"rating\") VALUES ('Fight Club', 8.9)"
        );
    }

    #[test]
    fn test_insert_without_columns_uses_defaults() {
        let stmt = Insert::new("Movie").build().unwrap();
        assert_eq!(stmt.sql, "INSERT INTO \"Movie\" DEFAULT VALUES");
    }

    #[test]
    fn test_insert_many_rows() {
        let stmt = Insert::rows(
            "_list_Movie_tags",
            vec!["parentId".to_string(), "value".to_string()],
            vec![
                vec![SqlValue::Integer(1), SqlValue::Text("a".to_string())],
                vec![SqlValue::Integer(1), SqlValue::Text("b".to_string())],
            ],
        )
        .build()
        .unwrap();
        assert!(stmt.sql.ends_with("VALUES (?, ?), (?, ?)"));
        assert_eq!(stmt.params.len(), 4);
    }

    #[test]
    fn test_insert_row_width_mismatch() {
        let insert = Insert::rows(
            "t",
            vec!["a".to_string()],
            vec![vec![SqlValue::Integer(1), SqlValue::Integer(2)]],
        );
        assert!(insert.build().is_err());
    }

    #[test]
    fn test_update_params_precede_predicate_params() {
        let stmt = Update::new("Movie")
            .set("rating", SqlValue::Real(9.0))
            .filter(Predicate::equal_to("id", 3i64))
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE \"Movie\" SET \"rating\" = ? WHERE \"id\" = ?"
        );
        assert_eq!(stmt.params, vec![SqlValue::Real(9.0), SqlValue::Integer(3)]);
    }

    #[test]
    fn test_update_without_sets_is_rejected() {
        assert!(matches!(
            Update::new("Movie").build(),
            Err(LazyrowError::IllegalArgument { .. })
        ));
    }

    #[test]
    fn test_where_is_omitted_without_predicate() {
        let update = Update::new("Movie")
            .set("seen", SqlValue::Integer(1))
            .build()
            .unwrap();
        assert_eq!(update.sql, "UPDATE \"Movie\" SET \"seen\" = ?");

        let delete = Delete::new("Movie").build().unwrap();
        assert_eq!(delete.sql, "DELETE FROM \"Movie\"");

        let delete = Delete::new("Movie")
            .filter(Predicate::equal_to("id", 1i64))
            .build()
            .unwrap();
        assert_eq!(delete.sql, "DELETE FROM \"Movie\" WHERE \"id\" = ?");
    }
}
