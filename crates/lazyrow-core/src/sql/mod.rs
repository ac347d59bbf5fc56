//! Pure SQL command builders
//!
//! Each builder renders one deterministic statement (or, for `AlterTable`, one
//! statement per added column) with `?` placeholders and the bound values in
//! textual order.

pub mod alter_table;
pub mod create_index;
pub mod create_table;
pub mod dml;
pub mod select;
pub mod statement;

pub use alter_table::AlterTable;
pub use create_index::CreateIndex;
pub use create_table::{ColumnDef, ConflictClause, CreateTable};
pub use dml::{Delete, Insert, Update};
pub use select::{Join, OrderBy, ProjectedColumn, Select};
pub use statement::{derived_name, quote_ident, Statement};

pub use crate::value::{SqlType, SqlValue};
