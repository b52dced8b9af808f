use std::ops::Range;

use hashbrown::HashMap;
use relstore_error::{internal, RelError, Result};

use crate::row::ScalarRow;
use crate::scalar::ScalarValue;

/// Identity of a row within a relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Value of the primary key column.
    Value(ScalarValue),
    /// Sequential position, used when there's no primary key.
    Position(usize),
}

impl Key {
    pub fn value(&self) -> Option<&ScalarValue> {
        match self {
            Key::Value(v) => Some(v),
            Key::Position(_) => None,
        }
    }
}

/// Key to row mapping with position lookups in both directions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowIndex {
    rows: HashMap<Key, ScalarRow>,
    key_to_pos: HashMap<Key, usize>,
    pos_to_key: HashMap<usize, Key>,
}

impl RowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        RowIndex {
            rows: HashMap::with_capacity(cap),
            key_to_pos: HashMap::with_capacity(cap),
            pos_to_key: HashMap::with_capacity(cap),
        }
    }

    /// Index a row at `pos` under `key`.
    ///
    /// Errors if `key` is already indexed.
    pub fn insert(&mut self, key: Key, pos: usize, row: ScalarRow) -> Result<()> {
        if self.rows.contains_key(&key) {
            return Err(match key {
                Key::Value(v) => RelError::DuplicateKey(v.to_string()),
                Key::Position(p) => internal!("position {p} indexed twice"),
            });
        }
        self.key_to_pos.insert(key.clone(), pos);
        self.pos_to_key.insert(pos, key.clone());
        self.rows.insert(key, row);
        Ok(())
    }

    pub fn get(&self, key: &Key) -> Option<&ScalarRow> {
        self.rows.get(key)
    }

    pub fn position(&self, key: &Key) -> Option<usize> {
        self.key_to_pos.get(key).copied()
    }

    pub fn key_at(&self, pos: usize) -> Option<&Key> {
        self.pos_to_key.get(&pos)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.rows.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A chosen ordering of keys, optionally partitioned into groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedIndex {
    keys: Vec<Key>,
    /// End offset (exclusive) into `keys` for each group. Empty if the
    /// relation hasn't been grouped.
    group_ends: Vec<usize>,
}

impl OrderedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: Key) {
        self.keys.push(key);
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn group_ends(&self) -> &[usize] {
        &self.group_ends
    }

    pub fn is_grouped(&self) -> bool {
        !self.group_ends.is_empty()
    }

    /// Replace the ordering with grouped runs of keys.
    ///
    /// Each inner vec is one group, groups are laid out in the order given.
    pub fn set_groups(&mut self, groups: impl IntoIterator<Item = Vec<Key>>) {
        let mut keys = Vec::with_capacity(self.keys.len());
        let mut ends = Vec::new();
        for group in groups {
            keys.extend(group);
            ends.push(keys.len());
        }
        self.keys = keys;
        self.group_ends = ends;
    }

    /// Ranges into `keys` for every group.
    ///
    /// An ungrouped, non-empty ordering is a single group.
    pub fn group_ranges(&self) -> Vec<Range<usize>> {
        if !self.is_grouped() {
            if self.keys.is_empty() {
                return Vec::new();
            }
            return vec![0..self.keys.len()];
        }

        let mut start = 0;
        self.group_ends
            .iter()
            .map(|&end| {
                let range = start..end;
                start = end;
                range
            })
            .collect()
    }

    /// Group sizes computed from consecutive group boundaries.
    pub fn group_sizes(&self) -> Vec<usize> {
        self.group_ranges().iter().map(|r| r.len()).collect()
    }
}

impl FromIterator<Key> for OrderedIndex {
    fn from_iter<T: IntoIterator<Item = Key>>(iter: T) -> Self {
        OrderedIndex {
            keys: iter.into_iter().collect(),
            group_ends: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn insert_and_lookup() {
        let mut index = RowIndex::new();
        let key = Key::Value(ScalarValue::from("Mon"));
        index.insert(key.clone(), 0, row!["Mon", 5.0]).unwrap();

        assert_eq!(Some(&row!["Mon", 5.0]), index.get(&key));
        assert_eq!(Some(0), index.position(&key));
        assert_eq!(Some(&key), index.key_at(0));
    }

    #[test]
    fn duplicate_value_key() {
        let mut index = RowIndex::new();
        let key = Key::Value(ScalarValue::from(1_i64));
        index.insert(key.clone(), 0, row![1_i64]).unwrap();
        let err = index.insert(key, 1, row![1_i64]).unwrap_err();
        assert!(matches!(err, RelError::DuplicateKey(_)));
    }

    #[test]
    fn group_ranges_from_boundaries() {
        let mut ordered: OrderedIndex = (0..5).map(Key::Position).collect();
        assert_eq!(vec![0..5], ordered.group_ranges());

        ordered.set_groups([
            vec![Key::Position(3)],
            vec![Key::Position(0), Key::Position(4)],
            vec![Key::Position(1), Key::Position(2)],
        ]);
        assert_eq!(&[1, 3, 5], ordered.group_ends());
        assert_eq!(vec![1, 2, 2], ordered.group_sizes());
        assert_eq!(Key::Position(3), ordered.keys()[0]);
    }

    #[test]
    fn empty_ordering_has_no_groups() {
        assert!(OrderedIndex::new().group_ranges().is_empty());
    }
}
