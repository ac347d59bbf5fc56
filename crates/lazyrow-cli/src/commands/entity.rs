//! put / get / delete
//!
//! Usage:
//!   lazyrow put <CLASS> [--id N] key[:type]=value...
//!   lazyrow get <CLASS> <ID>
//!   lazyrow delete <CLASS> <ID>

use super::assign::{parse_assignment, Assignment};
use super::{print_json, CliResult, GlobalArgs};
use clap::Args;
use lazyrow_core::core_types::RequestContext;
use lazyrow_core::{Entity, ObjectId};
use lazyrow_engine::commands::entity::{entity_delete, entity_save};
use lazyrow_engine::commands::query::entity_get;

#[derive(Debug, Args)]
pub struct PutArgs {
    /// Entity class
    pub class: String,

    /// Update the object with this identity instead of creating one
    #[arg(long)]
    pub id: Option<ObjectId>,

    /// Properties as key[:type]=value
    #[arg(required = true, value_parser = parse_assignment)]
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    pub class: String,
    pub id: ObjectId,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub class: String,
    pub id: ObjectId,
}

pub fn execute_put(global: &GlobalArgs, args: PutArgs) -> CliResult {
    let db = global.open_database()?;

    let mut entity = match args.id {
        Some(id) => Entity::reference(args.class, id),
        None => Entity::new(args.class),
    };
    for assignment in args.assignments {
        entity.put(&assignment.key, assignment.value)?;
    }

    entity_save(&db, &mut entity, &RequestContext::new())?;
    print_json(&entity.to_json())
}

pub fn execute_get(global: &GlobalArgs, args: GetArgs) -> CliResult {
    let db = global.open_database()?;
    let entity = entity_get(&db, &args.class, args.id, &RequestContext::new())?;
    print_json(&entity.to_json())
}

pub fn execute_delete(global: &GlobalArgs, args: DeleteArgs) -> CliResult {
    let db = global.open_database()?;
    let entity = Entity::reference(args.class.as_str(), args.id);
    entity_delete(&db, &entity, &RequestContext::new())?;
    print_json(&serde_json::json!({
        "class": args.class,
        "id": args.id,
        "deleted": true,
    }))
}
