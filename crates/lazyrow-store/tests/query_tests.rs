#![allow(clippy::unwrap_used, clippy::expect_used)]

// Integration tests for find / get: filters, ordering, paging, includes

use lazyrow_core::errors::ExErrorKind;
use lazyrow_core::sql::CreateIndex;
use lazyrow_core::{Entity, Predicate, Query, SqlValue, Statement, Value};
use lazyrow_store::Database;

fn person(name: &str) -> Entity {
    let mut person = Entity::new("Person");
    person.put("name", name).unwrap();
    person
}

fn movie(title: &str, year: i32, director: Option<Entity>) -> Entity {
    let mut movie = Entity::new("Movie");
    movie.put("title", title).unwrap();
    movie.put("year", year).unwrap();
    if let Some(director) = director {
        movie.put("director", director).unwrap();
    }
    movie
}

fn seeded() -> Database {
    let db = Database::open_in_memory().unwrap();
    let mut scott = person("Ridley Scott");
    scott.put("awards", vec!["BAFTA", "Saturn"]).unwrap();
    db.save(&mut scott).unwrap();

    for mut m in [
        movie("Alien", 1979, Some(scott.clone())),
        movie("Blade Runner", 1982, Some(scott)),
        movie("Aliens", 1986, Some(person("James Cameron"))),
        movie("Solaris", 1972, None),
    ] {
        db.save(&mut m).unwrap();
    }
    db
}

fn titles(found: &[Entity]) -> Vec<&str> {
    found.iter().map(|e| e.get_string("title").unwrap()).collect()
}

#[test]
fn test_missing_table_semantics() {
    // Given: A database where Movie was never saved
    let db = Database::open_in_memory().unwrap();

    // Then: find is empty and get reports the missing object
    assert!(db.find(&Query::new("Movie")).unwrap().is_empty());
    let err = db.get("Movie", 1).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::ObjectNotFound);
}

#[test]
fn test_find_all_hydrates_every_row() {
    let db = seeded();
    let found = db.find(&Query::new("Movie").order_by("year")).unwrap();
    assert_eq!(titles(&found), ["Solaris", "Alien", "Blade Runner", "Aliens"]);
    assert!(found.iter().all(|e| e.is_data_available() && !e.is_new()));
}

#[test]
fn test_find_with_equality_filter() {
    let db = seeded();
    let found = db
        .find(&Query::new("Movie").filter(Predicate::equal_to("year", 1982)))
        .unwrap();
    assert_eq!(titles(&found), ["Blade Runner"]);
}

#[test]
fn test_find_with_combined_filters() {
    let db = seeded();
    let query = Query::new("Movie")
        .filter(Predicate::starts_with("title", "Alien"))
        .filter(Predicate::greater_than("year", 1980))
        .order_by("title");
    assert_eq!(titles(&db.find(&query).unwrap()), ["Aliens"]);

    let query = Query::new("Movie")
        .filter(Predicate::less_than("year", 1975).or(Predicate::contains("title", "Runner")))
        .order_by("year");
    assert_eq!(titles(&db.find(&query).unwrap()), ["Solaris", "Blade Runner"]);
}

#[test]
fn test_find_with_in_and_null_filters() {
    let db = seeded();
    let query = Query::new("Movie")
        .filter(Predicate::is_in("year", [1972, 1986]))
        .order_by_desc("year");
    assert_eq!(titles(&db.find(&query).unwrap()), ["Aliens", "Solaris"]);

    let query = Query::new("Movie").filter(Predicate::is("director", None));
    assert_eq!(titles(&db.find(&query).unwrap()), ["Solaris"]);
}

#[test]
fn test_like_patterns_are_literal() {
    let db = Database::open_in_memory().unwrap();
    for title in ["100% Alien", "100 Aliens"] {
        let mut m = movie(title, 2000, None);
        db.save(&mut m).unwrap();
    }
    let found = db
        .find(&Query::new("Movie").filter(Predicate::starts_with("title", "100%")))
        .unwrap();
    assert_eq!(titles(&found), ["100% Alien"]);
}

#[test]
fn test_limit_and_skip() {
    let db = seeded();
    let query = Query::new("Movie").order_by("year").limit(2).skip(1);
    assert_eq!(titles(&db.find(&query).unwrap()), ["Alien", "Blade Runner"]);

    let query = Query::new("Movie").order_by("year").skip(3);
    assert_eq!(titles(&db.find(&query).unwrap()), ["Aliens"]);
}

#[test]
fn test_include_hydrates_pointer() {
    // Given: Movies with directors
    let db = seeded();

    // When: The director is included
    let found = db
        .find(
            &Query::new("Movie")
                .filter(Predicate::equal_to("title", "Alien"))
                .include("director"),
        )
        .unwrap();

    // Then: The director is fully populated, list columns included
    let director = found[0].get_entity("director").unwrap();
    assert!(director.is_data_available());
    assert_eq!(director.get_string("name").unwrap(), "Ridley Scott");
    assert_eq!(
        director.get_list("awards").unwrap(),
        &[Value::from("BAFTA"), Value::from("Saturn")]
    );
}

#[test]
fn test_without_include_pointer_is_unresolved() {
    let db = seeded();
    let found = db
        .find(&Query::new("Movie").filter(Predicate::equal_to("title", "Alien")))
        .unwrap();
    let director = found[0].get_entity("director").unwrap();
    assert!(director.id().is_some());
    assert!(!director.is_data_available());
}

#[test]
fn test_include_with_null_pointer_leaves_key_absent() {
    let db = seeded();
    let found = db
        .find(
            &Query::new("Movie")
                .filter(Predicate::equal_to("title", "Solaris"))
                .include("director"),
        )
        .unwrap();
    assert_eq!(found.len(), 1);
    assert!(!found[0].contains("director"));
}

#[test]
fn test_include_on_scalar_or_reserved_is_ignored() {
    let db = seeded();
    let found = db
        .find(&Query::new("Movie").include("title").include("createdAt"))
        .unwrap();
    assert_eq!(found.len(), 4);
}

#[test]
fn test_include_on_unknown_column_is_illegal_argument() {
    let db = seeded();
    let err = db
        .find(&Query::new("Movie").include("producer"))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::IllegalArgument);
}

#[test]
fn test_filter_on_unknown_column_is_sql_execution() {
    let db = seeded();
    let err = db
        .find(&Query::new("Movie").filter(Predicate::equal_to("producer", "x")))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::SqlExecution);
}

#[test]
fn test_equality_index_is_created_once() {
    // Given: Two queries on the same equality column
    let db = seeded();
    let query = Query::new("Movie").filter(Predicate::equal_to("title", "Alien"));

    // When: Both run
    db.find(&query).unwrap();
    db.find(&query).unwrap();

    // Then: Exactly one index exists for that column
    let count = db
        .transaction(|s, _| {
            s.scalar_count(&Statement::with_params(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?",
                vec![SqlValue::Text("idx_Movie_title".to_string())],
            ))
        })
        .unwrap();
    assert_eq!(count, 1);
}

fn index_columns(db: &Database, keys: &[&str]) -> Vec<Vec<SqlValue>> {
    let name = CreateIndex::new("Movie", keys.iter().copied()).name();
    db.transaction(|s, _| {
        s.query(&Statement::with_params(
            "SELECT name FROM pragma_index_info(?) ORDER BY seqno",
            vec![SqlValue::Text(name)],
        ))
    })
    .unwrap()
}

#[test]
fn test_underscored_key_and_composite_keys_get_distinct_indexes() {
    // Given: Movie has columns a_b, a and b
    let db = Database::open_in_memory().unwrap();
    let mut movie = Entity::new("Movie");
    movie.put("a_b", 1).unwrap();
    movie.put("a", 2).unwrap();
    movie.put("b", 3).unwrap();
    db.save(&mut movie).unwrap();

    // When: One query filters on a_b and another on a and b
    db.find(&Query::new("Movie").filter(Predicate::equal_to("a_b", 1)))
        .unwrap();
    let found = db
        .find(
            &Query::new("Movie")
                .filter(Predicate::equal_to("a", 2).and(Predicate::equal_to("b", 3))),
        )
        .unwrap();
    assert_eq!(found.len(), 1);

    // Then: Each key set has its own index over exactly its columns
    let text = |s: &str| vec![SqlValue::Text(s.to_string())];
    assert_eq!(index_columns(&db, &["a_b"]), vec![text("a_b")]);
    assert_eq!(index_columns(&db, &["a", "b"]), vec![text("a"), text("b")]);
}

#[test]
fn test_get_single_row() {
    let db = seeded();
    let found = db
        .find(&Query::new("Movie").filter(Predicate::equal_to("title", "Aliens")))
        .unwrap();
    let id = found[0].id().unwrap();

    let aliens = db.get("Movie", id).unwrap();
    assert_eq!(aliens.get_int("year").unwrap(), 1986);
    assert_eq!(db.get("Movie", 404).unwrap_err().kind(), ExErrorKind::ObjectNotFound);
}
