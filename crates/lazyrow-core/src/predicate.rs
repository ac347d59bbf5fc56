//! Boolean expression trees over columns
//!
//! A predicate is immutable; `and`/`or` consume both sides and wrap each in
//! parentheses so arbitrarily nested trees keep their precedence. Rendering
//! yields `?` placeholders with the bound values in textual order; `Display`
//! yields the literal-inlined form used in logs.

use crate::errors::{LazyrowError, Result};
use crate::sql::statement::quote_ident;
use crate::value::{SqlValue, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    Contains,
    NotContains,
    In,
    NotIn,
    Is,
    IsNot,
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Single(Value),
    Many(Vec<Value>),
    Pattern(String),
    Null,
}

/// One comparison of a column against an operand
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    column: String,
    op: Operator,
    operand: Operand,
}

impl Comparison {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn op(&self) -> Operator {
        self.op
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Leaf(Comparison),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    fn leaf(column: impl Into<String>, op: Operator, operand: Operand) -> Self {
        Predicate::Leaf(Comparison {
            column: column.into(),
            op,
            operand,
        })
    }

    pub fn equal_to(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(column, Operator::EqualTo, Operand::Single(value.into()))
    }

    pub fn not_equal_to(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(column, Operator::NotEqualTo, Operand::Single(value.into()))
    }

    pub fn greater_than(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(column, Operator::GreaterThan, Operand::Single(value.into()))
    }

    pub fn greater_than_or_equal(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(
            column,
            Operator::GreaterThanOrEqual,
            Operand::Single(value.into()),
        )
    }

    pub fn less_than(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(column, Operator::LessThan, Operand::Single(value.into()))
    }

    pub fn less_than_or_equal(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(
            column,
            Operator::LessThanOrEqual,
            Operand::Single(value.into()),
        )
    }

    pub fn starts_with(column: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::leaf(column, Operator::StartsWith, Operand::Pattern(prefix.into()))
    }

    pub fn not_starts_with(column: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::leaf(
            column,
            Operator::NotStartsWith,
            Operand::Pattern(prefix.into()),
        )
    }

    pub fn ends_with(column: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::leaf(column, Operator::EndsWith, Operand::Pattern(suffix.into()))
    }

    pub fn not_ends_with(column: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::leaf(
            column,
            Operator::NotEndsWith,
            Operand::Pattern(suffix.into()),
        )
    }

    pub fn contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::leaf(column, Operator::Contains, Operand::Pattern(needle.into()))
    }

    pub fn not_contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::leaf(
            column,
            Operator::NotContains,
            Operand::Pattern(needle.into()),
        )
    }

    pub fn is_in<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::leaf(column, Operator::In, Operand::Many(values))
    }

    pub fn not_in<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::leaf(column, Operator::NotIn, Operand::Many(values))
    }

    /// Null-safe identity comparison; `None` renders `IS NULL`
    pub fn is(column: impl Into<String>, value: Option<Value>) -> Self {
        let operand = value.map(Operand::Single).unwrap_or(Operand::Null);
        Self::leaf(column, Operator::Is, operand)
    }

    /// Null-safe negated identity comparison; `None` renders `IS NOT NULL`
    pub fn is_not(column: impl Into<String>, value: Option<Value>) -> Self {
        let operand = value.map(Operand::Single).unwrap_or(Operand::Null);
        Self::leaf(column, Operator::IsNot, operand)
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// Render with placeholders, columns optionally qualified by a table
    pub fn render(&self, qualifier: Option<&str>) -> Result<(String, Vec<SqlValue>)> {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.write_to(qualifier, &mut sql, &mut Sink::Params(&mut params))?;
        Ok((sql, params))
    }

    /// Columns compared with `equal_to`, first occurrence first
    pub fn equality_columns(&self) -> Vec<&str> {
        let mut columns = Vec::new();
        self.collect_equality_columns(&mut columns);
        columns
    }

    fn collect_equality_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Leaf(c) if c.op == Operator::EqualTo => {
                if !out.contains(&c.column.as_str()) {
                    out.push(&c.column);
                }
            }
            Predicate::Leaf(_) => {}
            Predicate::And(l, r) | Predicate::Or(l, r) => {
                l.collect_equality_columns(out);
                r.collect_equality_columns(out);
            }
        }
    }

    fn write_to(&self, qualifier: Option<&str>, sql: &mut String, sink: &mut Sink<'_>) -> Result<()> {
        match self {
            Predicate::Leaf(c) => c.write_to(qualifier, sql, sink),
            Predicate::And(l, r) => Self::write_pair(l, "AND", r, qualifier, sql, sink),
            Predicate::Or(l, r) => Self::write_pair(l, "OR", r, qualifier, sql, sink),
        }
    }

    fn write_pair(
        left: &Predicate,
        joiner: &str,
        right: &Predicate,
        qualifier: Option<&str>,
        sql: &mut String,
        sink: &mut Sink<'_>,
    ) -> Result<()> {
        sql.push('(');
        left.write_to(qualifier, sql, sink)?;
        sql.push_str(") ");
        sql.push_str(joiner);
        sql.push_str(" (");
        right.write_to(qualifier, sql, sink)?;
        sql.push(')');
        Ok(())
    }
}

/// Where operand values go while rendering
enum Sink<'a> {
    Params(&'a mut Vec<SqlValue>),
    Inline,
}

impl Sink<'_> {
    fn push(&mut self, sql: &mut String, value: SqlValue) {
        match self {
            Sink::Params(params) => {
                sql.push('?');
                params.push(value);
            }
            Sink::Inline => sql.push_str(&value.to_literal()),
        }
    }
}

impl Comparison {
    fn write_to(&self, qualifier: Option<&str>, sql: &mut String, sink: &mut Sink<'_>) -> Result<()> {
        if let Some(table) = qualifier {
            sql.push_str(&quote_ident(table));
            sql.push('.');
        }
        sql.push_str(&quote_ident(&self.column));

        match (&self.operand, self.op) {
            (Operand::Single(value), op) => {
                sql.push_str(match op {
                    Operator::EqualTo => " = ",
                    Operator::NotEqualTo => " <> ",
                    Operator::GreaterThan => " > ",
                    Operator::GreaterThanOrEqual => " >= ",
                    Operator::LessThan => " < ",
                    Operator::LessThanOrEqual => " <= ",
                    Operator::Is => " IS ",
                    Operator::IsNot => " IS NOT ",
                    other => return Err(mismatched(other)),
                });
                sink.push(sql, value.to_sql_value()?);
            }
            (Operand::Null, Operator::Is) => sql.push_str(" IS NULL"),
            (Operand::Null, Operator::IsNot) => sql.push_str(" IS NOT NULL"),
            (Operand::Many(values), op @ (Operator::In | Operator::NotIn)) => {
                sql.push_str(if op == Operator::In { " IN (" } else { " NOT IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    sink.push(sql, value.to_sql_value()?);
                }
                sql.push(')');
            }
            (Operand::Pattern(text), op) => {
                let escaped = escape_like(text);
                let (negated, pattern) = match op {
                    Operator::StartsWith => (false, format!("{}%", escaped)),
                    Operator::NotStartsWith => (true, format!("{}%", escaped)),
                    Operator::EndsWith => (false, format!("%{}", escaped)),
                    Operator::NotEndsWith => (true, format!("%{}", escaped)),
                    Operator::Contains => (false, format!("%{}%", escaped)),
                    Operator::NotContains => (true, format!("%{}%", escaped)),
                    other => return Err(mismatched(other)),
                };
                sql.push_str(if negated { " NOT LIKE " } else { " LIKE " });
                sink.push(sql, SqlValue::Text(pattern));
                sql.push_str(" ESCAPE '\\'");
            }
            (_, other) => return Err(mismatched(other)),
        }
        Ok(())
    }
}

fn mismatched(op: Operator) -> LazyrowError {
    LazyrowError::Internal {
        message: format!("operand does not fit operator {:?}", op),
    }
}

/// Escape LIKE wildcards so the operand matches literally
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sql = String::new();
        match self.write_to(None, &mut sql, &mut Sink::Inline) {
            Ok(()) => f.write_str(&sql),
            Err(e) => write!(f, "<unrenderable predicate: {}>", e),
        }
    }
}
