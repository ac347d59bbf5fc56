#![allow(clippy::unwrap_used, clippy::expect_used)]

// Integration tests for cascading saves of pointer properties and pointer lists

use lazyrow_core::{Descriptor, Entity, SqlValue, Statement, TypeTag, Value};
use lazyrow_store::Database;

fn person(name: &str) -> Entity {
    let mut person = Entity::new("Person");
    person.put("name", name).unwrap();
    person
}

fn stored_column(db: &Database, sql: &str) -> Vec<Vec<SqlValue>> {
    db.transaction(|s, _| s.query(&Statement::new(sql))).unwrap()
}

#[test]
fn test_unsaved_child_is_saved_first() {
    // Given: A movie pointing at an unsaved director
    let db = Database::open_in_memory().unwrap();
    let mut movie = Entity::new("Movie");
    movie.put("title", "Alien").unwrap();
    movie.put("director", person("Ridley Scott")).unwrap();

    // When: Only the movie is saved
    let id = db.save(&mut movie).unwrap();

    // Then: The director received an identity
    let director_id = movie.get_entity("director").unwrap().id().unwrap();

    // And: The movie row references that identity
    assert_eq!(
        stored_column(&db, "SELECT \"director\" FROM \"Movie\""),
        vec![vec![SqlValue::Integer(director_id)]]
    );

    // And: Reading the movie yields an unresolved reference
    let loaded = db.get("Movie", id).unwrap();
    let director = loaded.get_entity("director").unwrap();
    assert_eq!(director.id(), Some(director_id));
    assert!(!director.is_data_available());

    assert_eq!(
        db.schema("Movie").unwrap().descriptor("director"),
        Some(&Descriptor::pointer("Person"))
    );
}

#[test]
fn test_cascade_is_depth_first() {
    let db = Database::open_in_memory().unwrap();

    let mut agency = Entity::new("Agency");
    agency.put("name", "CAA").unwrap();
    let mut director = person("Ridley Scott");
    director.put("agency", agency).unwrap();
    let mut movie = Entity::new("Movie");
    movie.put("director", director).unwrap();

    db.save(&mut movie).unwrap();

    let director = movie.get_entity("director").unwrap();
    let agency = director.get_entity("agency").unwrap();
    assert!(director.id().is_some());
    assert!(agency.id().is_some());
    assert_eq!(
        stored_column(&db, "SELECT \"agency\" FROM \"Person\""),
        vec![vec![SqlValue::Integer(agency.id().unwrap())]]
    );
}

#[test]
fn test_dirty_saved_child_is_saved_again() {
    let db = Database::open_in_memory().unwrap();
    let mut director = person("Ridley");
    let director_id = db.save(&mut director).unwrap();

    director.put("name", "Ridley Scott").unwrap();
    let mut movie = Entity::new("Movie");
    movie.put("director", director).unwrap();
    db.save(&mut movie).unwrap();

    let stored = db.get("Person", director_id).unwrap();
    assert_eq!(stored.get_string("name").unwrap(), "Ridley Scott");
}

#[test]
fn test_saved_clean_child_is_only_referenced() {
    let db = Database::open_in_memory().unwrap();
    let mut director = person("Ridley Scott");
    let director_id = db.save(&mut director).unwrap();
    let stamped = director.updated_at();

    let mut movie = Entity::new("Movie");
    movie.put("director", director).unwrap();
    db.save(&mut movie).unwrap();

    assert_eq!(db.get("Person", director_id).unwrap().updated_at(), stamped);
}

#[test]
fn test_shared_child_is_saved_once() {
    let db = Database::open_in_memory().unwrap();
    let mut director = person("Ridley Scott");
    db.save(&mut director).unwrap();

    let mut alien = Entity::new("Movie");
    alien.put("director", director.clone()).unwrap();
    let mut gladiator = Entity::new("Movie");
    gladiator.put("director", director).unwrap();
    db.save(&mut alien).unwrap();
    db.save(&mut gladiator).unwrap();

    let people = stored_column(&db, "SELECT COUNT(*) FROM \"Person\"");
    assert_eq!(people, vec![vec![SqlValue::Integer(1)]]);
}

#[test]
fn test_pointer_list_elements_are_cascaded() {
    // Given: A movie whose cast mixes saved and unsaved people
    let db = Database::open_in_memory().unwrap();
    let mut sigourney = person("Sigourney Weaver");
    let sigourney_id = db.save(&mut sigourney).unwrap();
    let mut movie = Entity::new("Movie");
    movie
        .put("cast", vec![sigourney, person("Tom Skerritt"), person("John Hurt")])
        .unwrap();

    // When: The movie is saved
    let id = db.save(&mut movie).unwrap();

    // Then: Every element has an identity and the stored list keeps their order
    let ids: Vec<_> = movie
        .get_list("cast")
        .unwrap()
        .iter()
        .map(|v| v.as_entity().unwrap().id().unwrap())
        .collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], sigourney_id);

    let loaded = db.get("Movie", id).unwrap();
    let stored: Vec<_> = loaded
        .get_list("cast")
        .unwrap()
        .iter()
        .map(|v| v.as_entity().unwrap().id().unwrap())
        .collect();
    assert_eq!(stored, ids);
    assert_eq!(
        db.schema("Movie").unwrap().descriptor("cast"),
        Some(&Descriptor::list(TypeTag::Pointer, Some("Person".to_string())))
    );
}

#[test]
fn test_pointer_list_references_compare_by_identity() {
    let db = Database::open_in_memory().unwrap();
    let mut movie = Entity::new("Movie");
    movie.put("cast", vec![person("John Hurt")]).unwrap();
    let id = db.save(&mut movie).unwrap();

    let hurt_id = movie.get_list("cast").unwrap()[0]
        .as_entity()
        .unwrap()
        .id()
        .unwrap();
    let loaded = db.get("Movie", id).unwrap();
    assert_eq!(
        loaded.get_list("cast").unwrap(),
        &[Value::from(Entity::reference("Person", hurt_id))]
    );
}
