use super::create_table::ColumnDef;
use super::statement::{quote_ident, Statement};

/// ALTER TABLE ... ADD COLUMN for every new column
///
/// SQLite accepts a single ADD COLUMN per statement, so `build` yields one
/// statement per column, to be executed in order in the same transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTable {
    table: String,
    columns: Vec<ColumnDef>,
}

impl AlterTable {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
        }
    }

    pub fn add_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn add_columns(mut self, columns: impl IntoIterator<Item = ColumnDef>) -> Self {
        self.columns.extend(columns);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn build(&self) -> Vec<Statement> {
        let table = quote_ident(&self.table);
        self.columns
            .iter()
            .map(|c| Statement::new(format!("ALTER TABLE {} ADD COLUMN {}", table, c.render())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlType;

    #[test]
    fn test_one_statement_per_column() {
        let stmts = AlterTable::new("Movie")
            .add_column(ColumnDef::new("year", SqlType::Integer))
            .add_column(ColumnDef::new("studio", SqlType::Integer).references("Studio"))
            .build();
        assert_eq!(stmts.len(), 2);
        assert_eq!(
            stmts[0].sql,
            "ALTER TABLE \"Movie\" ADD COLUMN \"year\" INTEGER"
        );
        assert_eq!(
            stmts[1].sql,
            "ALTER TABLE \"Movie\" ADD COLUMN \"studio\" INTEGER REFERENCES \"Studio\"(\"id\")"
        );
    }

    #[test]
    fn test_empty_alter_builds_nothing() {
        let alter = AlterTable::new("Movie");
        assert!(alter.is_empty());
        assert!(alter.build().is_empty());
    }
}
