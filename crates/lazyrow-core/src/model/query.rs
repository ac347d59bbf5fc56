use crate::predicate::Predicate;
use crate::sql::OrderBy;

/// Description of a `find` over one entity class
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    class: String,
    predicate: Option<Predicate>,
    includes: Vec<String>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    skip: Option<u64>,
}

impl Query {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            predicate: None,
            includes: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            skip: None,
        }
    }

    /// Add a condition; repeated calls are combined with AND
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Hydrate a pointer column fully through a join
    pub fn include(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.includes.contains(&key) {
            self.includes.push(key);
        }
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by.push(OrderBy::asc(column));
        self
    }

    pub fn order_by_desc(mut self, column: impl Into<String>) -> Self {
        self.order_by.push(OrderBy::desc(column));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn ordering(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn skip_value(&self) -> Option<u64> {
        self.skip
    }
}
