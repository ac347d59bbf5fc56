use crate::errors::{LazyrowError, Result};
use crate::value::{classify, Descriptor, TypeTag, Value};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Engine-generated row identity
pub type ObjectId = i64;

pub const ID: &str = "id";
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Columns managed by the persistence engine; `put` refuses them
pub const RESERVED_COLUMNS: [&str; 3] = [ID, CREATED_AT, UPDATED_AT];

/// A schema-backed record
///
/// Reads consult the pending overlays first, then the persisted snapshot.
/// The snapshot is only readable once the entity was fetched, found or saved
/// (`is_data_available`). Identity is assigned by the first successful save
/// and never changes afterwards.
///
/// Pointer properties own their child (`Box<Entity>`), so an object graph
/// reachable from an entity is always a finite tree.
#[derive(Debug, Clone)]
pub struct Entity {
    class: String,
    id: Option<ObjectId>,
    persisted: BTreeMap<String, Value>,
    pending: BTreeMap<String, Value>,
    pending_children: BTreeMap<String, Value>,
    staged: BTreeMap<String, Descriptor>,
    data_available: bool,
}

impl Entity {
    /// Create a transient entity of the given class
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            id: None,
            persisted: BTreeMap::new(),
            pending: BTreeMap::new(),
            pending_children: BTreeMap::new(),
            staged: BTreeMap::new(),
            data_available: false,
        }
    }

    /// An unresolved reference: identity known, data not available
    pub fn reference(class: impl Into<String>, id: ObjectId) -> Self {
        let mut entity = Self::new(class);
        entity.id = Some(id);
        entity
    }

    /// A fully populated entity as read from a row
    pub fn hydrated(
        class: impl Into<String>,
        id: ObjectId,
        values: BTreeMap<String, Value>,
    ) -> Self {
        let mut entity = Self::reference(class, id);
        entity.persisted = values;
        entity.data_available = true;
        entity
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_data_available(&self) -> bool {
        self.data_available
    }

    /// True while there are values not yet flushed by a save
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty() || !self.pending_children.is_empty()
    }

    /// Stage a property value
    ///
    /// The value is classified immediately; the descriptor is checked against
    /// the registered schema when the entity is saved.
    pub fn put(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        if key.is_empty() {
            return Err(LazyrowError::illegal_argument("property key is empty"));
        }
        if RESERVED_COLUMNS.contains(&key) {
            return Err(LazyrowError::illegal_argument(format!(
                "property key '{}' is reserved",
                key
            )));
        }

        let value = value.into().at_storage_precision();
        let descriptor = classify(&value)?;

        if descriptor.is_pointer() {
            self.pending.remove(key);
            self.pending_children.insert(key.to_string(), value);
        } else {
            self.pending_children.remove(key);
            self.pending.insert(key.to_string(), value);
        }
        self.staged.insert(key.to_string(), descriptor);
        Ok(())
    }

    /// Read a property
    pub fn get(&self, key: &str) -> Result<&Value> {
        if let Some(value) = self
            .pending_children
            .get(key)
            .or_else(|| self.pending.get(key))
        {
            return Ok(value);
        }

        if !self.data_available {
            return Err(LazyrowError::DataNotAvailable {
                entity: self.class.clone(),
                key: key.to_string(),
            });
        }

        self.persisted
            .get(key)
            .ok_or_else(|| LazyrowError::PropertyAbsent {
                entity: self.class.clone(),
                key: key.to_string(),
            })
    }

    /// True when `get(key)` would return a value
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    pub fn get_string(&self, key: &str) -> Result<&str> {
        match self.get(key)? {
            Value::String(s) => Ok(s),
            other => Err(self.wrong_accessor(key, other, TypeTag::String)),
        }
    }

    pub fn get_entity(&self, key: &str) -> Result<&Entity> {
        match self.get(key)? {
            Value::Pointer(entity) => Ok(entity),
            other => Err(self.wrong_accessor(key, other, TypeTag::Pointer)),
        }
    }

    pub fn get_list(&self, key: &str) -> Result<&[Value]> {
        match self.get(key)? {
            Value::List(items) => Ok(items),
            other => Err(self.wrong_accessor(key, other, TypeTag::List)),
        }
    }

    fn wrong_accessor(&self, key: &str, actual: &Value, requested: TypeTag) -> LazyrowError {
        LazyrowError::WrongAccessor {
            entity: self.class.clone(),
            key: key.to_string(),
            actual: actual.type_name().to_string(),
            requested: requested.name().to_string(),
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.get_date(CREATED_AT).ok()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.get_date(UPDATED_AT).ok()
    }

    /// Keys readable right now, overlays included, in key order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .pending
            .keys()
            .chain(self.pending_children.keys())
            .map(String::as_str)
            .collect();
        if self.data_available {
            keys.extend(self.persisted.keys().map(String::as_str));
        }
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Descriptors derived at `put` time for every pending key
    pub fn staged(&self) -> &BTreeMap<String, Descriptor> {
        &self.staged
    }

    /// Pending non-pointer values
    pub fn pending(&self) -> &BTreeMap<String, Value> {
        &self.pending
    }

    /// Pending pointer values
    pub fn pending_children(&self) -> &BTreeMap<String, Value> {
        &self.pending_children
    }

    /// Children awaiting a cascaded save, in key order
    pub fn pending_children_mut(&mut self) -> impl Iterator<Item = (&str, &mut Entity)> {
        self.pending_children
            .iter_mut()
            .filter_map(|(key, value)| match value {
                Value::Pointer(entity) => Some((key.as_str(), entity.as_mut())),
                _ => None,
            })
    }

    /// Entities held by pending pointer lists, in key then element order
    pub fn pending_list_elements_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.pending
            .values_mut()
            .filter_map(|value| match value {
                Value::List(items) => Some(items.iter_mut()),
                _ => None,
            })
            .flatten()
            .filter_map(|item| match item {
                Value::Pointer(entity) => Some(entity.as_mut()),
                _ => None,
            })
    }

    /// Write the reserved timestamps for a save happening at `instant`
    ///
    /// The create path sets both to the same instant.
    pub fn stamp(&mut self, instant: DateTime<Utc>) {
        let date = Descriptor::scalar(TypeTag::Date);
        if self.id.is_none() {
            self.pending
                .insert(CREATED_AT.to_string(), Value::Date(instant));
            self.staged.insert(CREATED_AT.to_string(), date.clone());
        }
        self.pending
            .insert(UPDATED_AT.to_string(), Value::Date(instant));
        self.staged.insert(UPDATED_AT.to_string(), date);
    }

    /// Merge the overlays into the snapshot after a committed save
    ///
    /// # Errors
    ///
    /// Fails with `Internal` when called with an identity different from
    /// the one already assigned.
    pub fn commit_pending(&mut self, id: ObjectId) -> Result<()> {
        match self.id {
            Some(existing) if existing != id => {
                return Err(LazyrowError::Internal {
                    message: format!(
                        "{} already has identity {}, cannot commit as {}",
                        self.class, existing, id
                    ),
                })
            }
            _ => self.id = Some(id),
        }

        let pending = std::mem::take(&mut self.pending);
        let children = std::mem::take(&mut self.pending_children);
        self.persisted.extend(pending);
        self.persisted.extend(children);
        self.staged.clear();
        self.data_available = true;
        Ok(())
    }

    /// Replace the snapshot with freshly read values, keeping the overlays
    pub fn load_snapshot(&mut self, values: BTreeMap<String, Value>) {
        self.persisted = values;
        self.data_available = true;
    }

    /// JSON object of identity plus readable properties
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert("class".to_string(), serde_json::Value::from(self.class.as_str()));
        object.insert(
            ID.to_string(),
            self.id
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
        );
        for key in self.keys() {
            if let Ok(value) = self.get(key) {
                object.insert(key.to_string(), value.to_json());
            }
        }
        serde_json::Value::Object(object)
    }
}

macro_rules! typed_getter {
    ($($name:ident => $variant:ident: $native:ty),* $(,)?) => {
        impl Entity {
            $(
                pub fn $name(&self, key: &str) -> Result<$native> {
                    match self.get(key)? {
                        Value::$variant(v) => Ok(*v),
                        other => Err(self.wrong_accessor(key, other, TypeTag::$variant)),
                    }
                }
            )*
        }
    };
}

typed_getter! {
    get_int => Integer: i32,
    get_long => Long: i64,
    get_short => Short: i16,
    get_byte => Byte: i8,
    get_double => Double: f64,
    get_float => Float: f32,
    get_bool => Boolean: bool,
    get_date => Date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_truncates_dates_to_millis() {
        let precise = DateTime::<Utc>::from_timestamp(1_700_000_000, 987_654_321).unwrap();
        let mut movie = Entity::new("Movie");
        movie.put("released", Value::Date(precise)).unwrap();
        assert_eq!(
            movie.get_date("released").unwrap().timestamp_subsec_nanos(),
            987_000_000
        );
    }

    #[test]
    fn test_put_rejects_empty_and_reserved_keys() {
        let mut movie = Entity::new("Movie");
        assert!(matches!(
            movie.put("", "x"),
            Err(LazyrowError::IllegalArgument { .. })
        ));
        for key in RESERVED_COLUMNS {
            assert!(movie.put(key, 1).is_err(), "{}", key);
        }
        assert!(!movie.is_dirty());
    }

    #[test]
    fn test_pointer_goes_to_children_overlay() {
        let mut movie = Entity::new("Movie");
        movie.put("director", Entity::new("Person")).unwrap();
        movie.put("title", "Fight Club").unwrap();

        assert!(movie.pending_children().contains_key("director"));
        assert!(movie.pending().contains_key("title"));
        assert_eq!(
            movie.staged().get("director"),
            Some(&Descriptor::pointer("Person"))
        );
    }

    #[test]
    fn test_reput_moves_between_overlays() {
        let mut movie = Entity::new("Movie");
        movie.put("x", Entity::new("Person")).unwrap();
        movie.put("x", 3).unwrap();
        assert!(movie.pending_children().is_empty());
        assert_eq!(movie.get_int("x").unwrap(), 3);
    }

    #[test]
    fn test_read_before_available_is_data_not_available() {
        let reference = Entity::reference("Movie", 1);
        assert!(matches!(
            reference.get("title"),
            Err(LazyrowError::DataNotAvailable { .. })
        ));
    }

    #[test]
    fn test_read_absent_key_is_property_absent() {
        let movie = Entity::hydrated("Movie", 1, BTreeMap::new());
        assert!(matches!(
            movie.get("title"),
            Err(LazyrowError::PropertyAbsent { .. })
        ));
    }

    #[test]
    fn test_pending_overlay_wins_over_snapshot() {
        let mut values = BTreeMap::new();
        values.insert("title".to_string(), Value::from("Old"));
        let mut movie = Entity::hydrated("Movie", 1, values);
        movie.put("title", "New").unwrap();
        assert_eq!(movie.get_string("title").unwrap(), "New");
    }

    #[test]
    fn test_typed_getter_mismatch() {
        let mut movie = Entity::new("Movie");
        movie.put("rating", 8.9).unwrap();
        let err = movie.get_int("rating").unwrap_err();
        assert!(matches!(err, LazyrowError::WrongAccessor { .. }));
        assert_eq!(movie.get_double("rating").unwrap(), 8.9);
    }

    #[test]
    fn test_stamp_uses_one_instant_on_create() {
        let mut movie = Entity::new("Movie");
        let now = crate::value::now_millis();
        movie.stamp(now);
        assert_eq!(movie.created_at(), Some(now));
        assert_eq!(movie.updated_at(), Some(now));

        let mut saved = Entity::reference("Movie", 4);
        saved.stamp(now);
        assert!(!saved.pending().contains_key(CREATED_AT));
        assert!(saved.pending().contains_key(UPDATED_AT));
    }

    #[test]
    fn test_commit_pending_merges_and_clears() {
        let mut movie = Entity::new("Movie");
        movie.put("title", "Fight Club").unwrap();
        movie.commit_pending(7).unwrap();

        assert_eq!(movie.id(), Some(7));
        assert!(!movie.is_dirty());
        assert!(movie.staged().is_empty());
        assert!(movie.is_data_available());
        assert_eq!(movie.get_string("title").unwrap(), "Fight Club");

        assert!(movie.commit_pending(8).is_err());
    }

    #[test]
    fn test_pending_list_elements_are_reachable() {
        let mut movie = Entity::new("Movie");
        movie
            .put("cast", vec![Entity::new("Person"), Entity::new("Person")])
            .unwrap();
        assert_eq!(movie.pending_list_elements_mut().count(), 2);
    }

    #[test]
    fn test_to_json_includes_identity_and_properties() {
        let mut movie = Entity::new("Movie");
        movie.put("title", "Fight Club").unwrap();
        let json = movie.to_json();
        assert_eq!(json["class"], "Movie");
        assert!(json["id"].is_null());
        assert_eq!(json["title"], "Fight Club");
    }
}
