//! Boundary logging macros
//!
//! Every top-level operation emits exactly one `start` event and then either
//! one `end` or one `end_error` event. All three share `__op_event!`, which
//! stamps the component and operation name.

#[doc(hidden)]
#[macro_export]
macro_rules! __op_event {
    ($level:expr, $op:expr, $event:expr $(, $($field:tt)*)?) => {
        tracing::event!(
            $level,
            component = module_path!(),
            op = $op,
            event = $event,
            $($($field)*)?
        )
    };
}

/// Log the start of an operation
///
/// ```
/// # use lazyrow_core::log_op_start;
/// log_op_start!("entity_save");
/// log_op_start!("entity_save", entity = "Movie");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__op_event!(
            tracing::Level::INFO,
            $op,
            $crate::core_types::schema::EVENT_START
            $(, $($field)*)?
        )
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use lazyrow_core::log_op_end;
/// log_op_end!("entity_save", duration_ms = 3);
/// log_op_end!("entity_save", duration_ms = 3, object_id = 7);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__op_event!(
            tracing::Level::INFO,
            $op,
            $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)*)?
        )
    };
}

/// Log a failed operation with its error kind and code
///
/// Accepts anything convertible into `ExError`.
///
/// ```
/// # use lazyrow_core::log_op_error;
/// # use lazyrow_core::errors::LazyrowError;
/// let err = LazyrowError::illegal_argument("empty key");
/// log_op_error!("entity_save", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__op_event!(
            tracing::Level::ERROR,
            $op,
            $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message(),
            $($($field)*)?
        );
    }};
}
