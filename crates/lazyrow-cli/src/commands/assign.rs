//! `key[:type]=value` parsing
//!
//! Types: int, long, short, byte, double, float, string (default), bool,
//! date (RFC 3339), ref (`Class#id`) and `list<T>` with comma-separated
//! elements.

use chrono::{DateTime, Utc};
use lazyrow_core::{Entity, LazyrowError, Value};

/// One parsed property assignment
#[derive(Debug, Clone)]
pub struct Assignment {
    pub key: String,
    pub value: Value,
}

/// clap value parser for `key[:type]=value`
pub fn parse_assignment(text: &str) -> Result<Assignment, LazyrowError> {
    let (target, raw) = text.split_once('=').ok_or_else(|| {
        LazyrowError::illegal_argument(format!("expected key[:type]=value, got '{}'", text))
    })?;
    let (key, type_name) = target.split_once(':').unwrap_or((target, "string"));
    if key.is_empty() {
        return Err(LazyrowError::illegal_argument(format!(
            "missing key in '{}'",
            text
        )));
    }

    Ok(Assignment {
        key: key.to_string(),
        value: parse_value(type_name, raw)?,
    })
}

pub fn parse_value(type_name: &str, raw: &str) -> Result<Value, LazyrowError> {
    if let Some(element) = type_name
        .strip_prefix("list<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        let items = raw
            .split(',')
            .map(|item| parse_value(element, item.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::List(items));
    }

    let invalid = |reason: String| {
        LazyrowError::illegal_argument(format!("'{}' is not a valid {}: {}", raw, type_name, reason))
    };

    let value = match type_name {
        "int" => Value::Integer(raw.parse::<i32>().map_err(|e| invalid(format!("{}", e)))?),
        "long" => Value::Long(raw.parse::<i64>().map_err(|e| invalid(format!("{}", e)))?),
        "short" => Value::Short(raw.parse::<i16>().map_err(|e| invalid(format!("{}", e)))?),
        "byte" => Value::Byte(raw.parse::<i8>().map_err(|e| invalid(format!("{}", e)))?),
        "double" => Value::Double(raw.parse::<f64>().map_err(|e| invalid(format!("{}", e)))?),
        "float" => Value::Float(raw.parse::<f32>().map_err(|e| invalid(format!("{}", e)))?),
        "bool" => Value::Boolean(raw.parse::<bool>().map_err(|e| invalid(format!("{}", e)))?),
        "string" => Value::from(raw),
        "date" => {
            let instant = DateTime::parse_from_rfc3339(raw)
                .map_err(|e| invalid(e.to_string()))?
                .with_timezone(&Utc);
            Value::from(instant)
        }
        "ref" => {
            let (class, id) = raw
                .split_once('#')
                .ok_or_else(|| invalid("expected Class#id".to_string()))?;
            let id = id.parse::<i64>().map_err(|e| invalid(format!("{}", e)))?;
            Value::from(Entity::reference(class, id))
        }
        other => {
            return Err(LazyrowError::illegal_argument(format!(
                "unknown type '{}'",
                other
            )))
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untyped_value_is_string() {
        let a = parse_assignment("title=Alien").unwrap();
        assert_eq!(a.key, "title");
        assert_eq!(a.value, Value::from("Alien"));
    }

    #[test]
    fn test_value_may_contain_separators() {
        let a = parse_assignment("note=a=b:c").unwrap();
        assert_eq!(a.key, "note");
        assert_eq!(a.value, Value::from("a=b:c"));
    }

    #[test]
    fn test_typed_scalars() {
        assert_eq!(parse_assignment("y:int=1979").unwrap().value, Value::Integer(1979));
        assert_eq!(parse_assignment("y:long=7").unwrap().value, Value::Long(7));
        assert_eq!(parse_assignment("r:double=8.5").unwrap().value, Value::Double(8.5));
        assert_eq!(parse_assignment("ok:bool=true").unwrap().value, Value::Boolean(true));
    }

    #[test]
    fn test_date_is_rfc3339() {
        let a = parse_assignment("at:date=1979-05-25T00:00:00Z").unwrap();
        match a.value {
            Value::Date(d) => assert_eq!(d.timestamp_millis(), 296_438_400_000),
            other => panic!("expected a date, got {:?}", other),
        }
    }

    #[test]
    fn test_reference() {
        let a = parse_assignment("director:ref=Person#3").unwrap();
        let entity = a.value.as_entity().unwrap();
        assert_eq!(entity.class(), "Person");
        assert_eq!(entity.id(), Some(3));
    }

    #[test]
    fn test_list() {
        let a = parse_assignment("years:list<int>=1979, 1986").unwrap();
        assert_eq!(a.value, Value::from(vec![1979, 1986]));
    }

    #[test]
    fn test_rejections() {
        assert!(parse_assignment("title").is_err());
        assert!(parse_assignment("=x").is_err());
        assert!(parse_assignment("y:int=abc").is_err());
        assert!(parse_assignment("y:uuid=abc").is_err());
        assert!(parse_assignment("d:ref=Person").is_err());
    }
}
