#![allow(clippy::unwrap_used, clippy::expect_used)]

// Integration tests for typed access through registered models

use lazyrow_core::errors::ExErrorKind;
use lazyrow_core::{Entity, Model, ModelRegistry, Predicate, Query};
use lazyrow_store::Database;

#[derive(Debug, PartialEq)]
struct Movie {
    title: String,
    year: i32,
}

impl Model for Movie {
    const CLASS: &'static str = "Movie";

    fn from_entity(entity: &Entity) -> lazyrow_core::Result<Self> {
        Ok(Self {
            title: entity.get_string("title")?.to_string(),
            year: entity.get_int("year")?,
        })
    }
}

fn database() -> Database {
    let mut models = ModelRegistry::new();
    models.register::<Movie>();
    let db = Database::open_in_memory().unwrap().with_models(models);

    for (title, year) in [("Alien", 1979), ("Aliens", 1986)] {
        let mut movie = Entity::new("Movie");
        movie.put("title", title).unwrap();
        movie.put("year", year).unwrap();
        db.save(&mut movie).unwrap();
    }
    db
}

#[test]
fn test_get_as_model() {
    let db = database();
    let movie: Movie = db.get_as(1).unwrap();
    assert_eq!(
        movie,
        Movie {
            title: "Alien".to_string(),
            year: 1979
        }
    );
}

#[test]
fn test_find_as_model() {
    let db = database();
    let movies: Vec<Movie> = db
        .find_as(&Query::new("Movie").filter(Predicate::greater_than("year", 1980)))
        .unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].title, "Aliens");
}

#[test]
fn test_find_as_rejects_other_class() {
    let db = database();
    let err = db.find_as::<Movie>(&Query::new("Person")).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::IllegalArgument);
}

#[test]
fn test_hydrate_by_class_name() {
    let db = database();
    let entity = db.get("Movie", 2).unwrap();
    let hydrated = db.hydrate(&entity).unwrap();
    let movie = hydrated.downcast::<Movie>().unwrap();
    assert_eq!(movie.year, 1986);

    let err = db.hydrate(&Entity::new("Person")).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::IllegalArgument);
}

#[test]
fn test_model_mismatch_surfaces_accessor_error() {
    let db = database();
    let mut odd = Entity::new("Movie");
    odd.put("title", "Untitled").unwrap();
    let id = db.save(&mut odd).unwrap();

    // No year stored: the accessor reports the absent property
    let err = db.get_as::<Movie>(id).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::IllegalState);
}
