use super::statement::{quote_ident, Statement};
use crate::errors::{LazyrowError, Result};
use crate::model::ID;
use crate::predicate::Predicate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// LEFT JOIN of another table through a foreign-key column
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Foreign-key column on the base table
    pub column: String,
    /// Joined table
    pub table: String,
    /// Columns projected from the joined table
    pub columns: Vec<String>,
}

impl Join {
    pub fn new<S: Into<String>>(
        column: impl Into<String>,
        table: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            column: column.into(),
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Position of one projected value in a result row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedColumn {
    /// Index into the joins, `None` for the base table
    pub join: Option<usize>,
    pub column: String,
    /// Output name; `<column>_<joinedColumn>` for joined columns
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    table: String,
    columns: Vec<String>,
    joins: Vec<Join>,
    predicate: Option<Predicate>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    pub fn new<S: Into<String>>(table: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            joins: Vec::new(),
            predicate: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn join_alias(index: usize) -> String {
        format!("j{}", index + 1)
    }

    /// Layout of a result row, in projection order
    pub fn projection(&self) -> Vec<ProjectedColumn> {
        let base = self.columns.iter().map(|c| ProjectedColumn {
            join: None,
            column: c.clone(),
            alias: c.clone(),
        });
        let joined = self.joins.iter().enumerate().flat_map(|(i, join)| {
            join.columns.iter().map(move |c| ProjectedColumn {
                join: Some(i),
                column: c.clone(),
                alias: format!("{}_{}", join.column, c),
            })
        });
        base.chain(joined).collect()
    }

    pub fn build(&self) -> Result<Statement> {
        if self.columns.is_empty() {
            return Err(LazyrowError::illegal_argument(format!(
                "select from {} projects no columns",
                self.table
            )));
        }

        let table = quote_ident(&self.table);
        let projected: Vec<String> = self
            .projection()
            .into_iter()
            .map(|p| match p.join {
                None => format!("{}.{}", table, quote_ident(&p.column)),
                Some(i) => format!(
                    "{}.{} AS {}",
                    quote_ident(&Self::join_alias(i)),
                    quote_ident(&p.column),
                    quote_ident(&p.alias)
                ),
            })
            .collect();

        let mut sql = format!("SELECT {} FROM {}", projected.join(", "), table);

        for (i, join) in self.joins.iter().enumerate() {
            let alias = quote_ident(&Self::join_alias(i));
            sql.push_str(&format!(
                " LEFT JOIN {} AS {} ON {}.{} = {}.{}",
                quote_ident(&join.table),
                alias,
                alias,
                quote_ident(ID),
                table,
                quote_ident(&join.column)
            ));
        }

        let mut params = Vec::new();
        if let Some(predicate) = &self.predicate {
            let (clause, bound) = predicate.render(Some(&self.table))?;
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            params = bound;
        }

        if !self.order_by.is_empty() {
            let orders: Vec<String> = self
                .order_by
                .iter()
                .map(|o| {
                    format!(
                        "{}.{} {}",
                        table,
                        quote_ident(&o.column),
                        if o.descending { "DESC" } else { "ASC" }
                    )
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders.join(", "));
        }

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        Ok(Statement::with_params(sql, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    #[test]
    fn test_plain_select() {
        let stmt = Select::new("Movie", ["id", "title"]).build().unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT \"Movie\".\"id\", \"Movie\".\"title\" FROM \"Movie\""
        );
    }

    #[test]
    fn test_join_aliases_and_projection() {
        let select = Select::new("Movie", ["id", "director"])
            .join(Join::new("director", "Person", ["id", "name"]));
        let stmt = select.build().unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT \"Movie\".\"id\", \"Movie\".\"director\", \"j1\".\"id\" AS \"director_id\", \
             \"j1\".\"name\" AS \"director_name\" FROM \"Movie\" \
             LEFT JOIN \"Person\" AS \"j1\" ON \"j1\".\"id\" = \"Movie\".\"director\""
        );

        let layout = select.projection();
        assert_eq!(layout.len(), 4);
        assert_eq!(layout[3].join, Some(0));
        assert_eq!(layout[3].alias, "director_name");
    }

    #[test]
    fn test_where_order_limit_offset() {
        let stmt = Select::new("Movie", ["id"])
            .filter(Predicate::greater_than("rating", 8.0))
            .order_by(OrderBy::desc("rating"))
            .order_by(OrderBy::asc("title"))
            .limit(10)
            .offset(20)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT \"Movie\".\"id\" FROM \"Movie\" WHERE \"Movie\".\"rating\" > ? \
             ORDER BY \"Movie\".\"rating\" DESC, \"Movie\".\"title\" ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(stmt.params, vec![SqlValue::Real(8.0)]);
    }

    #[test]
    fn test_offset_without_limit() {
        let stmt = Select::new("Movie", ["id"]).offset(5).build().unwrap();
        assert!(stmt.sql.ends_with("LIMIT -1 OFFSET 5"));
    }
}
