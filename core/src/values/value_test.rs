use super::{Key, Table, Value};
use pretty_assertions::assert_eq;
use std::cmp::Ordering;

#[test]
fn test_numeric_equality_crosses_int_and_float() {
    assert!(Value::Int(2).equals(&Value::Float(2.0)));
    assert!(!Value::Int(2).equals(&Value::str("2")));
    assert!(!Value::Bool(true).equals(&Value::Int(1)));
}

#[test]
fn test_collection_equality_is_structural() {
    let a = Value::list(vec![Value::Int(1), Value::str("x")]);
    let b = Value::list(vec![Value::Int(1), Value::str("x")]);
    assert_eq!(a, b);

    let left = Table::from_values([Value::Int(1), Value::Int(2)]).unwrap();
    let right = Table::from_values([Value::Int(2), Value::Int(1)]).unwrap();
    assert_eq!(Value::set(left), Value::set(right));
}

#[test]
fn test_compare() {
    assert_eq!(Value::Int(1).compare(&Value::Float(1.5)), Some(Ordering::Less));
    assert_eq!(Value::str("b").compare(&Value::str("a")), Some(Ordering::Greater));
    assert_eq!(
        Value::list(vec![Value::Int(1), Value::Int(2)]).compare(&Value::list(vec![Value::Int(1)])),
        Some(Ordering::Greater)
    );
    assert_eq!(Value::Int(1).compare(&Value::str("1")), None);
}

#[test]
fn test_truthiness() {
    assert!(!Value::None.is_truthy());
    assert!(!Value::Int(0).is_truthy());
    assert!(!Value::str("").is_truthy());
    assert!(!Value::list(vec![]).is_truthy());
    assert!(Value::str("0").is_truthy());
    assert!(!Value::Range { start: 3, stop: 0, step: 1 }.is_truthy());
}

#[test]
fn test_range_len() {
    assert_eq!(Value::Range { start: 0, stop: 10, step: 3 }.range_len(), 4);
    assert_eq!(Value::Range { start: 5, stop: 0, step: -2 }.range_len(), 3);
    assert_eq!(Value::Range { start: 0, stop: 0, step: 1 }.range_len(), 0);
}

#[test]
fn test_type_names() {
    assert_eq!(Value::Int(1).type_name(), "int");
    assert_eq!(Value::None.type_name(), "none");
    assert_eq!(Value::tuple(vec![]).type_name(), "tuple");
    assert!(Key::of(&Value::tuple(vec![Value::list(vec![])])).is_none());
}

#[test]
fn test_deeply_nested_values_drop_without_recursing() {
    let mut value = Value::None;
    for level in 0..1_000_000 {
        value = match level % 3 {
            0 => Value::list(vec![value]),
            1 => Value::tuple(vec![Value::Int(level), value]),
            _ => {
                let mut table = Table::new();
                table.insert(Key::Int(level), Value::Int(level), value);
                Value::dict(table)
            }
        };
    }
    drop(value);
}

#[test]
fn test_shared_children_survive_their_parent() {
    let shared = Value::list(vec![Value::Int(7)]);
    let parent = Value::list(vec![shared.clone(), Value::tuple(vec![shared.clone()])]);
    drop(parent);
    assert_eq!(shared, Value::list(vec![Value::Int(7)]));
}
