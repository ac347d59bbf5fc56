pub mod entity;
pub mod query;
pub mod registry;

pub use entity::{Entity, ObjectId, CREATED_AT, ID, RESERVED_COLUMNS, UPDATED_AT};
pub use query::Query;
pub use registry::{Model, ModelRegistry};
