//! schema
//!
//! Usage: lazyrow schema <CLASS>

use super::{print_json, CliResult, GlobalArgs};
use clap::Args;
use lazyrow_core::core_types::RequestContext;
use lazyrow_engine::commands::query::schema_describe;

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Entity class
    pub class: String,
}

pub fn execute(global: &GlobalArgs, args: SchemaArgs) -> CliResult {
    let db = global.open_database()?;
    let schema = schema_describe(&db, &args.class, &RequestContext::new())?;

    let columns: serde_json::Map<String, serde_json::Value> = schema
        .columns()
        .iter()
        .map(|(column, descriptor)| (column.clone(), serde_json::Value::from(descriptor.to_string())))
        .collect();
    print_json(&serde_json::json!({
        "entity": schema.entity(),
        "columns": columns,
    }))
}
