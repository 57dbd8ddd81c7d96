//! Insertion-ordered hash table backing dictionaries and sets.

use super::{MAX_COMPARE_DEPTH, Value};
use hashbrown::HashMap;
use std::rc::Rc;

/// Hashable projection of a [`Value`].
///
/// Integral floats hash as integers so `1` and `1.0` name the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    None,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(Rc<str>),
    Tuple(Vec<Key>),
}

impl Key {
    /// The key for `value`, or `None` when the value cannot be hashed.
    /// Tuples nested past [`MAX_COMPARE_DEPTH`] count as unhashable.
    pub fn of(value: &Value) -> Option<Key> {
        Self::of_at(value, 0)
    }

    fn of_at(value: &Value, depth: usize) -> Option<Key> {
        if depth > MAX_COMPARE_DEPTH {
            return None;
        }
        match value {
            Value::None => Some(Key::None),
            Value::Bool(b) => Some(Key::Bool(*b)),
            Value::Int(n) => Some(Key::Int(*n)),
            Value::Float(x) => {
                if x.fract() == 0.0 && x.is_finite() && x.abs() < 9.0e15 {
                    Some(Key::Int(*x as i64))
                } else {
                    Some(Key::Float(x.to_bits()))
                }
            }
            Value::Str(s) => Some(Key::Str(s.clone())),
            Value::Tuple(items) => items
                .iter()
                .map(|item| Self::of_at(item, depth + 1))
                .collect::<Option<Vec<_>>>()
                .map(Key::Tuple),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table<V> {
    entries: Vec<(Value, V)>,
    index: HashMap<Key, usize>,
}

impl<V> Table<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &Key) -> Option<&V> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Insert or replace. A replaced entry keeps its original position.
    pub fn insert(&mut self, key: Key, original: Value, value: V) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((original, value));
            }
        }
    }

    pub fn remove(&mut self, key: &Key) -> Option<(Value, V)> {
        let position = self.index.remove(key)?;
        let removed = self.entries.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Remove and return the most recently inserted entry.
    pub fn pop_last(&mut self) -> Option<(Value, V)> {
        let (key, _) = self.entries.last()?;
        let key = Key::of(key)?;
        self.remove(&key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn into_entries(self) -> Vec<(Value, V)> {
        self.entries
    }
}

impl Table<()> {
    /// Build a set table, skipping duplicates. Fails on the first unhashable item.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Result<Self, Value> {
        let mut table = Table::new();
        for value in values {
            let key = Key::of(&value).ok_or_else(|| value.clone())?;
            table.insert(key, value, ());
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Value {
        Value::Str(s.into())
    }

    #[test]
    fn test_insertion_order_survives_replacement() {
        let mut table = Table::new();
        for (name, n) in [("b", 1), ("a", 2), ("b", 3)] {
            table.insert(Key::of(&text(name)).unwrap(), text(name), Value::Int(n));
        }
        let keys: Vec<String> = table.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(table.get(&Key::of(&text("b")).unwrap()), Some(&Value::Int(3)));
    }

    #[test]
    fn test_remove_reindexes() {
        let mut table = Table::from_values([Value::Int(1), Value::Int(2), Value::Int(3)]).unwrap();
        assert!(table.remove(&Key::Int(1)).is_some());
        assert!(table.contains(&Key::Int(3)));
        assert_eq!(table.pop_last().map(|(k, _)| k), Some(Value::Int(3)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_integral_floats_share_int_keys() {
        assert_eq!(Key::of(&Value::Float(2.0)), Some(Key::Int(2)));
        assert!(Key::of(&Value::List(Default::default())).is_none());
    }
}
