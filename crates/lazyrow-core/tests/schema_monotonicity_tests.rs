#![allow(clippy::unwrap_used, clippy::expect_used)]

use lazyrow_core::errors::LazyrowError;
use lazyrow_core::{classify, Descriptor, Entity, Schema, TypeTag, Value};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::Integer),
        any::<i64>().prop_map(Value::Long),
        any::<i16>().prop_map(Value::Short),
        any::<i8>().prop_map(Value::Byte),
        any::<f64>().prop_map(Value::Double),
        any::<bool>().prop_map(Value::Boolean),
        "[a-zA-Z0-9 ']{0,12}".prop_map(Value::String),
        prop_oneof![Just("Person"), Just("Studio")]
            .prop_map(|class| Value::from(Entity::reference(class, 1))),
        prop::collection::vec("[a-z]{1,4}", 1..4).prop_map(Value::from),
        prop::collection::vec(any::<i64>(), 1..4).prop_map(Value::from),
    ]
}

fn one_column(column: &str, descriptor: Descriptor) -> BTreeMap<String, Descriptor> {
    let mut columns = BTreeMap::new();
    columns.insert(column.to_string(), descriptor);
    columns
}

proptest! {
    #[test]
    fn prop_changed_descriptor_always_rejected(first in arb_value(), second in arb_value()) {
        let mut schema = Schema::new("Movie");
        let registered = classify(&first).unwrap();
        let new = schema.diff(&one_column("x", registered.clone())).unwrap();
        schema.register(new);
        let before = schema.clone();

        let attempted = classify(&second).unwrap();
        let result = schema.diff(&one_column("x", attempted.clone()));

        if attempted == registered {
            prop_assert!(result.unwrap().is_empty());
        } else {
            let is_incorrect_type = matches!(result, Err(LazyrowError::IncorrectType { .. }));
            prop_assert!(is_incorrect_type);
        }
        prop_assert_eq!(schema, before);
    }

    #[test]
    fn prop_classify_is_stable(value in arb_value()) {
        let a = classify(&value).unwrap();
        let b = classify(&value.clone()).unwrap();
        prop_assert_eq!(&a, &b);
        let reparsed: Descriptor = a.to_string().parse().unwrap();
        prop_assert_eq!(reparsed, a);
    }

    #[test]
    fn prop_string_literals_round_trip_quotes(text in ".{0,24}") {
        let literal = Value::String(text.clone()).to_literal().unwrap();
        prop_assert!(literal.starts_with('\'') && literal.ends_with('\''));
        let inner = &literal[1..literal.len() - 1];
        prop_assert_eq!(inner.replace("''", "'"), text);
    }
}

#[test]
fn test_list_of_pointers_differs_from_list_of_other_pointers() {
    let a = Descriptor::list(TypeTag::Pointer, Some("Person".to_string()));
    let b = Descriptor::list(TypeTag::Pointer, Some("Studio".to_string()));
    let schema = Schema::with_columns("Movie", one_column("cast", a));
    assert!(matches!(
        schema.diff(&one_column("cast", b)),
        Err(LazyrowError::IncorrectType { .. })
    ));
}
