//! Canonical field keys and event names for structured logging

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Persistence subjects
pub const FIELD_ENTITY: &str = "entity";
pub const FIELD_OBJECT_ID: &str = "object_id";
pub const FIELD_COLUMN: &str = "column";
pub const FIELD_ROW_COUNT: &str = "row_count";
pub const FIELD_SQL: &str = "sql";

pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
