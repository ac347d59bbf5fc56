//! The synchronous persistence context
//!
//! A `Database` owns one `ConnectionGate`; every operation below is one engine
//! transaction on it. Typed access goes through the `ModelRegistry` installed
//! with `with_models`.

use crate::config::StoreConfig;
use crate::connection::{ConnectionGate, SqlSession};
use crate::errors::Result;
use crate::registry::SchemaRegistry;
use crate::{persist, query};
use lazyrow_core::value::now_millis;
use lazyrow_core::{Entity, LazyrowError, Model, ModelRegistry, ObjectId, Query, Schema};
use std::any::Any;

pub struct Database {
    gate: ConnectionGate,
    models: ModelRegistry,
}

impl Database {
    /// Open (and migrate) the database described by `config`
    pub fn open(config: StoreConfig) -> Result<Self> {
        let gate = ConnectionGate::new(config);
        gate.open()?;
        Ok(Self {
            gate,
            models: ModelRegistry::new(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(StoreConfig::default())
    }

    pub fn with_models(mut self, models: ModelRegistry) -> Self {
        self.models = models;
        self
    }

    /// Release this context's connection reference
    pub fn close(&self) -> Result<()> {
        self.gate.close()
    }

    pub fn gate(&self) -> &ConnectionGate {
        &self.gate
    }

    /// Save `entity` and everything it points to that is new or dirty
    ///
    /// The entity is only updated once the transaction has committed; on
    /// failure it keeps its identity and overlays exactly as they were.
    pub fn save(&self, entity: &mut Entity) -> Result<ObjectId> {
        let mut working = entity.clone();
        let now = now_millis();
        let id = self
            .gate
            .transaction(|session, registry| persist::save(session, registry, &mut working, now))
            .map_err(|e| e.or_op("save"))?;
        *entity = working;
        Ok(id)
    }

    /// Reload the persisted snapshot of `entity`
    pub fn fetch(&self, entity: &mut Entity) -> Result<()> {
        self.gate
            .transaction(|session, registry| persist::fetch(session, registry, entity))
            .map_err(|e| e.or_op("fetch"))
    }

    pub fn delete(&self, entity: &Entity) -> Result<()> {
        self.gate
            .transaction(|session, registry| persist::delete(session, registry, entity))
            .map_err(|e| e.or_op("delete"))
    }

    pub fn find(&self, query: &Query) -> Result<Vec<Entity>> {
        self.gate
            .transaction(|session, registry| query::find(session, registry, query))
            .map_err(|e| e.or_op("find"))
    }

    pub fn get(&self, class: &str, id: ObjectId) -> Result<Entity> {
        self.gate
            .transaction(|session, registry| query::get(session, registry, class, id))
            .map_err(|e| e.or_op("get"))
    }

    /// Registered schema of a class; empty when the class was never saved
    pub fn schema(&self, class: &str) -> Result<Schema> {
        self.gate
            .transaction(|session, registry| Ok(registry.resolve(session, class)?.clone()))
    }

    /// Hydrate an entity into the model registered for its class
    pub fn hydrate(&self, entity: &Entity) -> Result<Box<dyn Any + Send>> {
        Ok(self.models.hydrate(entity)?)
    }

    pub fn get_as<M: Model>(&self, id: ObjectId) -> Result<M> {
        let entity = self.get(M::CLASS, id)?;
        Ok(M::from_entity(&entity)?)
    }

    pub fn find_as<M: Model>(&self, query: &Query) -> Result<Vec<M>> {
        if query.class() != M::CLASS {
            return Err(LazyrowError::illegal_argument(format!(
                "query on {} cannot produce {}",
                query.class(),
                M::CLASS
            ))
            .into());
        }
        self.find(query)?
            .iter()
            .map(|entity| Ok(M::from_entity(entity)?))
            .collect()
    }

    /// Run raw statements in one transaction against the managed connection
    pub fn transaction<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&SqlSession<'_>, &mut SchemaRegistry) -> Result<T>,
    {
        self.gate.transaction(work)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", self.gate.config())
            .field("models", &self.models)
            .finish()
    }
}
