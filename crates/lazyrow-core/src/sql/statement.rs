use crate::value::SqlValue;
use std::fmt;

/// SQL text plus the values bound to its `?` placeholders, in order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// The statement with every placeholder replaced by its literal
    ///
    /// For logs and diagnostics only; execution always binds parameters.
    pub fn to_literal_sql(&self) -> String {
        let mut out = String::with_capacity(self.sql.len());
        let mut params = self.params.iter();
        let mut quote: Option<char> = None;

        for ch in self.sql.chars() {
            match (quote, ch) {
                (None, '\'' | '"') => {
                    quote = Some(ch);
                    out.push(ch);
                }
                (Some(q), c) if c == q => {
                    quote = None;
                    out.push(ch);
                }
                (None, '?') => match params.next() {
                    Some(value) => out.push_str(&value.to_literal()),
                    None => out.push('?'),
                },
                _ => out.push(ch),
            }
        }
        out
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Quote an identifier, doubling embedded double quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Derived object name `<prefix>_<part1>_<part2>...`
///
/// When every part is non-empty and free of `_` the plain form is used.
/// Otherwise each part is length-prefixed after a `__` marker
/// (`<prefix>__<len1>_<part1>_<len2>_<part2>...`), which the plain form can
/// never contain, so distinct part sequences always get distinct names.
pub fn derived_name(prefix: &str, parts: &[&str]) -> String {
    let plain = parts.iter().all(|p| !p.is_empty() && !p.contains('_'));
    let mut name = String::from(prefix);
    if plain {
        for part in parts {
            name.push('_');
            name.push_str(part);
        }
    } else {
        name.push('_');
        for part in parts {
            name.push_str(&format!("_{}_{}", part.chars().count(), part));
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_name_plain_parts() {
        assert_eq!(derived_name("idx", &["Movie", "title", "year"]), "idx_Movie_title_year");
    }

    #[test]
    fn test_derived_name_separates_underscored_parts() {
        let joined = derived_name("_list", &["Movie", "x_tags"]);
        let split = derived_name("_list", &["Movie_x", "tags"]);
        assert_eq!(joined, "_list__5_Movie_6_x_tags");
        assert_eq!(split, "_list__7_Movie_x_4_tags");
        assert_ne!(derived_name("idx", &["Movie", "a_b"]), derived_name("idx", &["Movie", "a", "b"]));
    }

    #[test]
    fn test_quote_ident_doubles_quotes() {
        assert_eq!(quote_ident("Movie"), "\"Movie\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_to_literal_sql_skips_quoted_question_marks() {
        let stmt = Statement::with_params(
            "SELECT \"what?\" FROM \"t\" WHERE \"a\" = ? AND \"b\" LIKE ? ESCAPE '\\' AND \"c\" = '?'",
            vec![SqlValue::Integer(1), SqlValue::Text("x%".to_string())],
        );
        assert_eq!(
            stmt.to_literal_sql(),
            "SELECT \"what?\" FROM \"t\" WHERE \"a\" = 1 AND \"b\" LIKE 'x%' ESCAPE '\\' AND \"c\" = '?'"
        );
    }
}
