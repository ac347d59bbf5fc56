use crate::model::ObjectId;
use lazyrow_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using LazyrowError
pub type Result<T> = std::result::Result<T, LazyrowError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every error that crosses the public boundary is classified into one of
/// these kinds. Each kind maps to a stable code usable by callers, tests and
/// the CLI's exit diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// The SQL engine rejected a statement
    SqlExecution,
    /// A column is being reused with an incompatible descriptor
    IncorrectType,
    /// No row for the requested identity, or no table for the requested class
    ObjectNotFound,
    /// Caller handed in a value or key that can never be persisted
    IllegalArgument,
    /// Operation is not valid in the entity's or connection's current state
    IllegalState,
    /// Stored data or metadata could not be decoded
    Persistence,
    Configuration,
    Io,
    /// A background unit of work panicked or was cancelled
    Concurrency,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::SqlExecution => "ERR_SQL_EXECUTION",
            ExErrorKind::IncorrectType => "ERR_INCORRECT_TYPE",
            ExErrorKind::ObjectNotFound => "ERR_OBJECT_NOT_FOUND",
            ExErrorKind::IllegalArgument => "ERR_ILLEGAL_ARGUMENT",
            ExErrorKind::IllegalState => "ERR_ILLEGAL_STATE",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus whatever context was known where the error
/// was raised: the operation, the entity class, the object identity and the
/// column involved.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity: Option<String>,
    object_id: Option<ObjectId>,
    column: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity: None,
            object_id: None,
            column: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity class context
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Add object identity context
    pub fn with_object_id(mut self, id: ObjectId) -> Self {
        self.object_id = Some(id);
        self
    }

    /// Add column context
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn object_id(&self) -> Option<ObjectId> {
        self.object_id
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// Fill in the operation name unless a lower layer already set one
    pub fn or_op(mut self, op: &str) -> Self {
        if self.op.is_none() {
            self.op = Some(op.to_string());
        }
        self
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity) = &self.entity {
            write!(f, " (entity: {})", entity)?;
        }
        if let Some(id) = self.object_id {
            write!(f, " (object_id: {})", id)?;
        }
        if let Some(column) = &self.column {
            write!(f, " (column: {})", column)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain errors raised by the value model, schema catalog and entity overlay
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LazyrowError {
    /// A column already registered with one descriptor is written with another
    #[error("Column {entity}.{column} is registered as {registered}, cannot store {attempted}")]
    IncorrectType {
        entity: String,
        column: String,
        registered: String,
        attempted: String,
    },

    /// A typed accessor was used on a property holding another kind of value
    #[error("Property {entity}.{key} holds {actual}, not {requested}")]
    WrongAccessor {
        entity: String,
        key: String,
        actual: String,
        requested: String,
    },

    #[error("Object not found: {entity} {object_id:?}")]
    ObjectNotFound {
        entity: String,
        object_id: Option<ObjectId>,
    },

    #[error("Illegal argument: {reason}")]
    IllegalArgument { reason: String },

    /// A reference without identity was used where its identity is needed
    #[error("Reference to unsaved {entity} cannot be stored")]
    UnsavedReference { entity: String },

    /// Property read on an entity that was never fetched or saved
    #[error("Data for {entity} is not available; fetch it before reading {key}")]
    DataNotAvailable { entity: String, key: String },

    /// Property read on an available entity that has no value for the key
    #[error("Property {key} is absent from {entity}")]
    PropertyAbsent { entity: String, key: String },

    #[error("Cannot decode column {column}: {reason}")]
    Decode { column: String, reason: String },

    #[error("Invalid descriptor text: {text}")]
    InvalidDescriptor { text: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LazyrowError {
    pub fn illegal_argument(reason: impl Into<String>) -> Self {
        LazyrowError::IllegalArgument {
            reason: reason.into(),
        }
    }
}

impl From<LazyrowError> for ExError {
    fn from(err: LazyrowError) -> Self {
        match err {
            LazyrowError::IncorrectType {
                entity,
                column,
                registered,
                attempted,
            } => ExError::new(ExErrorKind::IncorrectType)
                .with_entity(entity)
                .with_column(column)
                .with_message(format!(
                    "Column is registered as {}, cannot store {}",
                    registered, attempted
                )),

            LazyrowError::WrongAccessor {
                entity,
                key,
                actual,
                requested,
            } => ExError::new(ExErrorKind::IncorrectType)
                .with_entity(entity)
                .with_column(key)
                .with_message(format!("Property holds {}, not {}", actual, requested)),

            LazyrowError::ObjectNotFound { entity, object_id } => {
                let err = ExError::new(ExErrorKind::ObjectNotFound)
                    .with_entity(entity)
                    .with_message("Object not found");
                match object_id {
                    Some(id) => err.with_object_id(id),
                    None => err,
                }
            }

            LazyrowError::IllegalArgument { reason } => {
                ExError::new(ExErrorKind::IllegalArgument).with_message(reason)
            }

            LazyrowError::UnsavedReference { entity } => {
                ExError::new(ExErrorKind::IllegalArgument)
                    .with_entity(entity)
                    .with_message("Reference to an unsaved object cannot be stored")
            }

            LazyrowError::DataNotAvailable { entity, key } => {
                ExError::new(ExErrorKind::IllegalState)
                    .with_entity(entity)
                    .with_column(key)
                    .with_message("Data not available: object was never fetched or saved")
            }

            LazyrowError::PropertyAbsent { entity, key } => ExError::new(ExErrorKind::IllegalState)
                .with_entity(entity)
                .with_column(key)
                .with_message("Property is absent from the object"),

            LazyrowError::Decode { column, reason } => ExError::new(ExErrorKind::Persistence)
                .with_column(column)
                .with_message(format!("Cannot decode stored value: {}", reason)),

            LazyrowError::InvalidDescriptor { text } => ExError::new(ExErrorKind::Persistence)
                .with_message(format!("Invalid descriptor in schema metadata: {}", text)),

            LazyrowError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for LazyrowError {
    fn from(err: serde_json::Error) -> Self {
        LazyrowError::Internal {
            message: format!("JSON rendering failed: {}", err),
        }
    }
}
