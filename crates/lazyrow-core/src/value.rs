//! Value & descriptor model
//!
//! `Value` is what callers put into an entity; `Descriptor` is the canonical
//! type of a column, derived once from the first value written to it;
//! `SqlValue` is what actually gets bound to a statement parameter or read
//! back from a row. Every conversion between the three lives here so literal
//! and parameter formatting have exactly one implementation.

use crate::errors::{LazyrowError, Result};
use crate::model::Entity;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Type tag of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Integer,
    Long,
    Short,
    Byte,
    Double,
    Float,
    String,
    Boolean,
    Date,
    Pointer,
    List,
}

impl TypeTag {
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Integer => "Integer",
            TypeTag::Long => "Long",
            TypeTag::Short => "Short",
            TypeTag::Byte => "Byte",
            TypeTag::Double => "Double",
            TypeTag::Float => "Float",
            TypeTag::String => "String",
            TypeTag::Boolean => "Boolean",
            TypeTag::Date => "Date",
            TypeTag::Pointer => "Pointer",
            TypeTag::List => "List",
        }
    }

    fn scalar_from_name(name: &str) -> Option<TypeTag> {
        let tag = match name {
            "Integer" => TypeTag::Integer,
            "Long" => TypeTag::Long,
            "Short" => TypeTag::Short,
            "Byte" => TypeTag::Byte,
            "Double" => TypeTag::Double,
            "Float" => TypeTag::Float,
            "String" => TypeTag::String,
            "Boolean" => TypeTag::Boolean,
            "Date" => TypeTag::Date,
            _ => return None,
        };
        Some(tag)
    }

    /// Column storage class; lists have none because they live in side tables
    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            TypeTag::Integer
            | TypeTag::Long
            | TypeTag::Short
            | TypeTag::Byte
            | TypeTag::Boolean
            | TypeTag::Date
            | TypeTag::Pointer => Some(SqlType::Integer),
            TypeTag::Double | TypeTag::Float => Some(SqlType::Real),
            TypeTag::String => Some(SqlType::Text),
            TypeTag::List => None,
        }
    }
}

/// SQLite storage class used in DDL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl SqlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
        }
    }
}

/// Canonical column type
///
/// Two descriptors are equal iff tag, element tag and referenced entity all
/// match. The text form (`Integer`, `Pointer<Person>`, `List<String>`,
/// `List<Pointer<Person>>`) is what the schema metadata table stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    tag: TypeTag,
    element: Option<TypeTag>,
    entity: Option<String>,
}

impl Descriptor {
    /// Descriptor of a scalar tag (anything but Pointer and List)
    pub fn scalar(tag: TypeTag) -> Self {
        debug_assert!(!matches!(tag, TypeTag::Pointer | TypeTag::List));
        Self {
            tag,
            element: None,
            entity: None,
        }
    }

    pub fn pointer(entity: impl Into<String>) -> Self {
        Self {
            tag: TypeTag::Pointer,
            element: None,
            entity: Some(entity.into()),
        }
    }

    /// List descriptor; `entity` is set only for lists of pointers
    pub fn list(element: TypeTag, entity: Option<String>) -> Self {
        Self {
            tag: TypeTag::List,
            element: Some(element),
            entity,
        }
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn element(&self) -> Option<TypeTag> {
        self.element
    }

    /// Referenced entity for pointers and pointer lists
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn is_list(&self) -> bool {
        self.tag == TypeTag::List
    }

    pub fn is_pointer(&self) -> bool {
        self.tag == TypeTag::Pointer
    }

    /// Descriptor of one element of a list
    pub fn element_descriptor(&self) -> Option<Descriptor> {
        match (self.tag, self.element) {
            (TypeTag::List, Some(TypeTag::Pointer)) => {
                self.entity.as_ref().map(|e| Descriptor::pointer(e.clone()))
            }
            (TypeTag::List, Some(tag)) => Some(Descriptor::scalar(tag)),
            _ => None,
        }
    }

    /// Storage class of the column; `None` for list columns
    pub fn sql_type(&self) -> Option<SqlType> {
        self.tag.sql_type()
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.tag, self.element, &self.entity) {
            (TypeTag::Pointer, _, Some(entity)) => write!(f, "Pointer<{}>", entity),
            (TypeTag::List, Some(TypeTag::Pointer), Some(entity)) => {
                write!(f, "List<Pointer<{}>>", entity)
            }
            (TypeTag::List, Some(element), _) => write!(f, "List<{}>", element.name()),
            (tag, _, _) => f.write_str(tag.name()),
        }
    }
}

impl FromStr for Descriptor {
    type Err = LazyrowError;

    fn from_str(text: &str) -> Result<Self> {
        let invalid = || LazyrowError::InvalidDescriptor {
            text: text.to_string(),
        };

        if let Some(inner) = strip_generic(text, "List") {
            if let Some(entity) = strip_generic(inner, "Pointer") {
                if entity.is_empty() {
                    return Err(invalid());
                }
                return Ok(Descriptor::list(TypeTag::Pointer, Some(entity.to_string())));
            }
            let element = TypeTag::scalar_from_name(inner).ok_or_else(invalid)?;
            return Ok(Descriptor::list(element, None));
        }

        if let Some(entity) = strip_generic(text, "Pointer") {
            if entity.is_empty() {
                return Err(invalid());
            }
            return Ok(Descriptor::pointer(entity));
        }

        TypeTag::scalar_from_name(text)
            .map(Descriptor::scalar)
            .ok_or_else(invalid)
    }
}

fn strip_generic<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    text.strip_prefix(name)?
        .strip_prefix('<')?
        .strip_suffix('>')
}

impl Serialize for Descriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Descriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A value bound to, or read from, a statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    /// Render as an SQL literal
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Real(f) if f.is_nan() => "NULL".to_string(),
            SqlValue::Real(f) if f.is_infinite() => {
                if *f > 0.0 { "9e999" } else { "-9e999" }.to_string()
            }
            // Debug keeps a decimal point or exponent so the literal stays REAL
            SqlValue::Real(f) => format!("{:?}", f),
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

/// A property value
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i32),
    Long(i64),
    Short(i16),
    Byte(i8),
    Double(f64),
    Float(f32),
    String(String),
    Boolean(bool),
    Date(DateTime<Utc>),
    /// Reference to another entity, stored as its identity
    Pointer(Box<Entity>),
    /// Multi-valued property, stored in a side table
    List(Vec<Value>),
}

impl Value {
    /// Name of the value's variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        self.tag().name()
    }

    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Integer(_) => TypeTag::Integer,
            Value::Long(_) => TypeTag::Long,
            Value::Short(_) => TypeTag::Short,
            Value::Byte(_) => TypeTag::Byte,
            Value::Double(_) => TypeTag::Double,
            Value::Float(_) => TypeTag::Float,
            Value::String(_) => TypeTag::String,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::Date(_) => TypeTag::Date,
            Value::Pointer(_) => TypeTag::Pointer,
            Value::List(_) => TypeTag::List,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Pointer(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The value as it will read back from storage: dates, including dates
    /// inside lists, truncated to whole milliseconds
    pub fn at_storage_precision(self) -> Value {
        match self {
            Value::Date(d) => Value::Date(truncate_to_millis(d)),
            Value::List(items) => {
                Value::List(items.into_iter().map(Value::at_storage_precision).collect())
            }
            other => other,
        }
    }

    /// Canonical bound form of a column value
    ///
    /// Booleans become 0/1, dates epoch milliseconds, references their
    /// identity. Lists are not column values and are rejected.
    pub fn to_sql_value(&self) -> Result<SqlValue> {
        let value = match self {
            Value::Integer(i) => SqlValue::Integer(i64::from(*i)),
            Value::Long(i) => SqlValue::Integer(*i),
            Value::Short(i) => SqlValue::Integer(i64::from(*i)),
            Value::Byte(i) => SqlValue::Integer(i64::from(*i)),
            Value::Double(f) => SqlValue::Real(*f),
            Value::Float(f) => SqlValue::Real(f64::from(*f)),
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Boolean(b) => SqlValue::Integer(i64::from(*b)),
            Value::Date(d) => SqlValue::Integer(d.timestamp_millis()),
            Value::Pointer(entity) => match entity.id() {
                Some(id) => SqlValue::Integer(id),
                None => {
                    return Err(LazyrowError::UnsavedReference {
                        entity: entity.class().to_string(),
                    })
                }
            },
            Value::List(_) => {
                return Err(LazyrowError::illegal_argument(
                    "a list cannot be bound as a single column value",
                ))
            }
        };
        Ok(value)
    }

    /// Canonical SQL literal of a column value
    pub fn to_literal(&self) -> Result<String> {
        Ok(self.to_sql_value()?.to_literal())
    }

    /// JSON rendering used by the CLI and debugging output
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Integer(i) => Json::from(*i),
            Value::Long(i) => Json::from(*i),
            Value::Short(i) => Json::from(*i),
            Value::Byte(i) => Json::from(*i),
            Value::Double(f) => Json::from(*f),
            Value::Float(f) => Json::from(f64::from(*f)),
            Value::String(s) => Json::from(s.as_str()),
            Value::Boolean(b) => Json::from(*b),
            Value::Date(d) => Json::from(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Pointer(entity) => entity.to_json(),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            // references compare by identity; unsaved ones only equal themselves
            (Value::Pointer(a), Value::Pointer(b)) => {
                a.class() == b.class()
                    && match (a.id(), b.id()) {
                        (Some(x), Some(y)) => x == y,
                        _ => std::ptr::eq(a.as_ref(), b.as_ref()),
                    }
            }
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

/// Derive the descriptor of a value
///
/// Lists must be non-empty and homogeneous; nested lists are unsupported.
pub fn classify(value: &Value) -> Result<Descriptor> {
    match value {
        Value::Pointer(entity) => {
            if entity.class().is_empty() {
                return Err(LazyrowError::illegal_argument(
                    "referenced entity has an empty class name",
                ));
            }
            Ok(Descriptor::pointer(entity.class()))
        }
        Value::List(items) => classify_list(items),
        scalar => Ok(Descriptor::scalar(scalar.tag())),
    }
}

fn classify_list(items: &[Value]) -> Result<Descriptor> {
    let first = items
        .first()
        .ok_or_else(|| LazyrowError::illegal_argument("cannot classify an empty list"))?;

    let element = match first {
        Value::List(_) => {
            return Err(LazyrowError::illegal_argument(
                "nested lists are not supported",
            ))
        }
        other => classify(other)?,
    };

    for item in &items[1..] {
        let item_descriptor = match item {
            Value::List(_) => {
                return Err(LazyrowError::illegal_argument(
                    "nested lists are not supported",
                ))
            }
            other => classify(other)?,
        };
        if item_descriptor != element {
            return Err(LazyrowError::illegal_argument(format!(
                "list mixes {} and {} elements",
                element, item_descriptor
            )));
        }
    }

    Ok(Descriptor::list(
        element.tag(),
        element.entity().map(str::to_string),
    ))
}

/// Decode a stored column value by its descriptor
///
/// NULL decodes to `None`. Pointer columns decode to an unresolved reference:
/// identity known, data not available.
pub fn decode(descriptor: &Descriptor, column: &str, raw: SqlValue) -> Result<Option<Value>> {
    let mismatch = |raw: &SqlValue| LazyrowError::Decode {
        column: column.to_string(),
        reason: format!("{:?} is not a valid {}", raw, descriptor),
    };

    if raw.is_null() {
        return Ok(None);
    }

    let value = match (descriptor.tag(), &raw) {
        (TypeTag::Integer, SqlValue::Integer(i)) => {
            Value::Integer(i32::try_from(*i).map_err(|_| mismatch(&raw))?)
        }
        (TypeTag::Long, SqlValue::Integer(i)) => Value::Long(*i),
        (TypeTag::Short, SqlValue::Integer(i)) => {
            Value::Short(i16::try_from(*i).map_err(|_| mismatch(&raw))?)
        }
        (TypeTag::Byte, SqlValue::Integer(i)) => {
            Value::Byte(i8::try_from(*i).map_err(|_| mismatch(&raw))?)
        }
        (TypeTag::Double, SqlValue::Real(f)) => Value::Double(*f),
        (TypeTag::Double, SqlValue::Integer(i)) => Value::Double(*i as f64),
        (TypeTag::Float, SqlValue::Real(f)) => Value::Float(*f as f32),
        (TypeTag::Float, SqlValue::Integer(i)) => Value::Float(*i as f32),
        (TypeTag::String, SqlValue::Text(s)) => Value::String(s.clone()),
        (TypeTag::Boolean, SqlValue::Integer(i)) => Value::Boolean(*i != 0),
        (TypeTag::Date, SqlValue::Integer(ms)) => Value::Date(
            Utc.timestamp_millis_opt(*ms)
                .single()
                .ok_or_else(|| mismatch(&raw))?,
        ),
        (TypeTag::Pointer, SqlValue::Integer(id)) => {
            let entity = descriptor.entity().ok_or_else(|| mismatch(&raw))?;
            Value::Pointer(Box::new(Entity::reference(entity, *id)))
        }
        _ => return Err(mismatch(&raw)),
    };

    Ok(Some(value))
}

/// Current instant at the precision dates are stored with
pub fn now_millis() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}

pub fn truncate_to_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(instant.timestamp_millis())
        .single()
        .unwrap_or(instant)
}

macro_rules! value_from {
    ($($native:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$native> for Value {
                fn from(v: $native) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    i32 => Integer,
    i64 => Long,
    i16 => Short,
    i8 => Byte,
    f64 => Double,
    f32 => Float,
    String => String,
    bool => Boolean,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Date(truncate_to_millis(v))
    }
}

impl From<Entity> for Value {
    fn from(v: Entity) -> Self {
        Value::Pointer(Box::new(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}
