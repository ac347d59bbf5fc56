//! Async execution of database operations
//!
//! `Engine` moves every operation onto tokio's blocking pool, where it runs
//! against the shared `Database`. The returned `OpFuture` resolves on
//! whichever runtime polls it; `continue_on` hands the result to a
//! continuation spawned on a chosen runtime instead.
//!
//! Entity operations take the entity by value and give it back on success and
//! on failure, so a failed save can be corrected and retried.

use crate::commands::entity::{entity_delete, entity_fetch, entity_save};
use crate::commands::query::{entity_find, entity_get, schema_describe};
use lazyrow_core::core_types::RequestContext;
use lazyrow_core::errors::{ExError, ExErrorKind};
use lazyrow_core::{Entity, ObjectId, Query, Schema};
use lazyrow_store::Database;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};

/// A failed entity operation together with the entity it was given
#[derive(Debug)]
pub struct EntityFailure {
    pub error: ExError,
    /// `None` only when the background task itself panicked or was cancelled
    pub entity: Option<Entity>,
}

impl std::fmt::Display for EntityFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for EntityFailure {}

/// Conversion of a lost background task into an operation error
pub trait FromJoinError {
    fn from_join_error(err: JoinError) -> Self;
}

impl FromJoinError for ExError {
    fn from_join_error(err: JoinError) -> Self {
        let reason = if err.is_cancelled() {
            "background task was cancelled"
        } else {
            "background task panicked"
        };
        ExError::new(ExErrorKind::Concurrency)
            .with_op("execute")
            .with_message(reason)
    }
}

impl FromJoinError for EntityFailure {
    fn from_join_error(err: JoinError) -> Self {
        EntityFailure {
            error: ExError::from_join_error(err),
            entity: None,
        }
    }
}

/// Result of an operation running on the blocking pool
#[must_use = "futures do nothing unless awaited or handed to continue_on"]
pub struct OpFuture<T, E = ExError> {
    task: JoinHandle<Result<T, E>>,
}

impl<T, E> OpFuture<T, E>
where
    T: Send + 'static,
    E: FromJoinError + Send + 'static,
{
    fn spawn<F>(handle: &Handle, work: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        Self {
            task: handle.spawn_blocking(work),
        }
    }

    /// Deliver the result to `continuation` on the runtime behind `handle`
    pub fn continue_on<F, R>(self, handle: &Handle, continuation: F) -> JoinHandle<R>
    where
        F: FnOnce(Result<T, E>) -> R + Send + 'static,
        R: Send + 'static,
    {
        handle.spawn(async move { continuation(self.await) })
    }
}

impl<T, E: FromJoinError> Future for OpFuture<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(err)) => Poll::Ready(Err(E::from_join_error(err))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Async facade over a shared `Database`
#[derive(Clone)]
pub struct Engine {
    db: Arc<Database>,
    handle: Handle,
}

impl Engine {
    /// Engine running its work on the current tokio runtime
    ///
    /// ## Errors
    ///
    /// `IllegalState` when called outside a tokio runtime.
    pub fn new(db: Database) -> Result<Self, ExError> {
        let handle = Handle::try_current().map_err(|e| {
            ExError::new(ExErrorKind::IllegalState)
                .with_op("engine")
                .with_message(e.to_string())
        })?;
        Ok(Self::with_handle(db, handle))
    }

    pub fn with_handle(db: Database, handle: Handle) -> Self {
        Self {
            db: Arc::new(db),
            handle,
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Run arbitrary synchronous work against the database
    pub fn submit<T, F>(&self, work: F) -> OpFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, ExError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        OpFuture::spawn(&self.handle, move || work(&db))
    }

    fn submit_entity<F>(&self, entity: Entity, work: F) -> OpFuture<Entity, EntityFailure>
    where
        F: FnOnce(&Database, &mut Entity, &RequestContext) -> Result<(), ExError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let ctx = RequestContext::new();
        OpFuture::spawn(&self.handle, move || {
            let mut entity = entity;
            match work(&db, &mut entity, &ctx) {
                Ok(()) => Ok(entity),
                Err(error) => Err(EntityFailure {
                    error,
                    entity: Some(entity),
                }),
            }
        })
    }

    /// Save; the returned entity carries its identity
    pub fn save(&self, entity: Entity) -> OpFuture<Entity, EntityFailure> {
        self.submit_entity(entity, |db, entity, ctx| {
            entity_save(db, entity, ctx).map(|_| ())
        })
    }

    pub fn fetch(&self, entity: Entity) -> OpFuture<Entity, EntityFailure> {
        self.submit_entity(entity, entity_fetch)
    }

    pub fn delete(&self, entity: Entity) -> OpFuture<Entity, EntityFailure> {
        self.submit_entity(entity, |db, entity, ctx| entity_delete(db, entity, ctx))
    }

    pub fn find(&self, query: Query) -> OpFuture<Vec<Entity>> {
        let ctx = RequestContext::new();
        self.submit(move |db| entity_find(db, &query, &ctx))
    }

    pub fn get(&self, class: impl Into<String>, id: ObjectId) -> OpFuture<Entity> {
        let class = class.into();
        let ctx = RequestContext::new();
        self.submit(move |db| entity_get(db, &class, id, &ctx))
    }

    pub fn schema(&self, class: impl Into<String>) -> OpFuture<Schema> {
        let class = class.into();
        let ctx = RequestContext::new();
        self.submit(move |db| schema_describe(db, &class, &ctx))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("db", &self.db).finish()
    }
}
