//! find
//!
//! Usage: lazyrow find <CLASS> [--eq key[:type]=value]... [--include key]...
//!        [--order key|-key]... [--limit N] [--skip N]

use super::assign::{parse_assignment, Assignment};
use super::{print_json, CliResult, GlobalArgs};
use clap::Args;
use lazyrow_core::core_types::RequestContext;
use lazyrow_core::{Predicate, Query};
use lazyrow_engine::commands::query::entity_find;

#[derive(Debug, Args)]
pub struct FindArgs {
    /// Entity class
    pub class: String,

    /// Equality filter as key[:type]=value; repeated filters are ANDed
    #[arg(long = "eq", value_parser = parse_assignment)]
    pub equals: Vec<Assignment>,

    /// Pointer column to hydrate in the same query
    #[arg(long)]
    pub include: Vec<String>,

    /// Sort column; a leading '-' sorts descending
    #[arg(long, allow_hyphen_values = true)]
    pub order: Vec<String>,

    #[arg(long)]
    pub limit: Option<u64>,

    #[arg(long)]
    pub skip: Option<u64>,
}

impl FindArgs {
    fn to_query(&self) -> Query {
        let mut query = Query::new(self.class.as_str());
        for assignment in &self.equals {
            query = query.filter(Predicate::equal_to(
                assignment.key.as_str(),
                assignment.value.clone(),
            ));
        }
        for key in &self.include {
            query = query.include(key.as_str());
        }
        for order in &self.order {
            query = match order.strip_prefix('-') {
                Some(column) => query.order_by_desc(column),
                None => query.order_by(order.as_str()),
            };
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(skip) = self.skip {
            query = query.skip(skip);
        }
        query
    }
}

pub fn execute(global: &GlobalArgs, args: FindArgs) -> CliResult {
    let db = global.open_database()?;
    let found = entity_find(&db, &args.to_query(), &RequestContext::new())?;
    print_json(&serde_json::Value::Array(
        found.iter().map(|e| e.to_json()).collect(),
    ))
}
