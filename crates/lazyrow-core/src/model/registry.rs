//! Static mapping from entity class names to typed hydration functions
//!
//! Built once at startup; a `Database` holding a registry can turn rows of a
//! registered class into caller-defined types without runtime reflection.

use super::entity::Entity;
use crate::errors::{LazyrowError, Result};
use std::any::Any;
use std::collections::HashMap;

/// A caller-defined type backed by one entity class
pub trait Model: Sized + Send + 'static {
    /// Entity class (and table) name
    const CLASS: &'static str;

    fn from_entity(entity: &Entity) -> Result<Self>;
}

type HydrateFn = fn(&Entity) -> Result<Box<dyn Any + Send>>;

fn hydrate_as<M: Model>(entity: &Entity) -> Result<Box<dyn Any + Send>> {
    let model = M::from_entity(entity)?;
    Ok(Box::new(model))
}

#[derive(Clone, Default)]
pub struct ModelRegistry {
    hydrators: HashMap<&'static str, HydrateFn>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut classes: Vec<_> = self.hydrators.keys().collect();
        classes.sort();
        f.debug_struct("ModelRegistry")
            .field("classes", &classes)
            .finish()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M: Model>(&mut self) -> &mut Self {
        self.hydrators.insert(M::CLASS, hydrate_as::<M>);
        self
    }

    pub fn contains(&self, class: &str) -> bool {
        self.hydrators.contains_key(class)
    }

    /// Hydrate an entity into the type registered for its class
    pub fn hydrate(&self, entity: &Entity) -> Result<Box<dyn Any + Send>> {
        let hydrate = self.hydrators.get(entity.class()).ok_or_else(|| {
            LazyrowError::illegal_argument(format!(
                "no model registered for class {}",
                entity.class()
            ))
        })?;
        hydrate(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq)]
    struct Movie {
        title: String,
    }

    impl Model for Movie {
        const CLASS: &'static str = "Movie";

        fn from_entity(entity: &Entity) -> Result<Self> {
            Ok(Self {
                title: entity.get_string("title")?.to_string(),
            })
        }
    }

    #[test]
    fn test_hydrate_registered_class() {
        let mut registry = ModelRegistry::new();
        registry.register::<Movie>();
        assert!(registry.contains("Movie"));

        let mut values = BTreeMap::new();
        values.insert("title".to_string(), "Fight Club".into());
        let entity = Entity::hydrated("Movie", 1, values);

        let any = registry.hydrate(&entity).unwrap();
        let movie = any.downcast::<Movie>().unwrap();
        assert_eq!(movie.title, "Fight Club");
    }

    #[test]
    fn test_hydrate_unknown_class_fails() {
        let registry = ModelRegistry::new();
        let entity = Entity::hydrated("Person", 1, BTreeMap::new());
        assert!(matches!(
            registry.hydrate(&entity),
            Err(LazyrowError::IllegalArgument { .. })
        ));
    }
}
