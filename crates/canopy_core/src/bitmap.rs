//! Sorted integer key sets.

use serde::{Deserialize, Serialize};

/// A sorted set of unique entity keys.
///
/// This is the materialized form of a hierarchy query handed to the outer
/// query engine, and the representation of the orphan set. Decoding sorts
/// and deduplicates the keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<i32>", into = "Vec<i32>")]
pub struct Bitmap(Vec<i32>);

impl Bitmap {
    /// Creates an empty bitmap.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the bitmap holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn contains(&self, key: i32) -> bool {
        self.0.binary_search(&key).is_ok()
    }

    /// Adds a key, returning false if it was already present.
    pub fn insert(&mut self, key: i32) -> bool {
        match self.0.binary_search(&key) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, key);
                true
            }
        }
    }

    /// Removes a key, returning false if it was absent.
    pub fn remove(&mut self, key: i32) -> bool {
        match self.0.binary_search(&key) {
            Ok(pos) => {
                self.0.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Iterates keys in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }

    /// Returns the keys as a sorted slice.
    #[must_use]
    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    /// Consumes the bitmap, returning the sorted keys.
    #[must_use]
    pub fn into_vec(self) -> Vec<i32> {
        self.0
    }

    /// Returns true if the keys are strictly ascending.
    pub(crate) fn is_normalized(&self) -> bool {
        self.0.windows(2).all(|pair| pair[0] < pair[1])
    }

    /// Wraps keys as-is, skipping normalization.
    #[cfg(test)]
    pub(crate) fn from_raw(keys: Vec<i32>) -> Self {
        Self(keys)
    }
}

impl FromIterator<i32> for Bitmap {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let mut keys: Vec<i32> = iter.into_iter().collect();
        keys.sort_unstable();
        keys.dedup();
        Self(keys)
    }
}

impl From<Vec<i32>> for Bitmap {
    fn from(keys: Vec<i32>) -> Self {
        keys.into_iter().collect()
    }
}

impl From<Bitmap> for Vec<i32> {
    fn from(bitmap: Bitmap) -> Self {
        bitmap.0
    }
}

impl<'a> IntoIterator for &'a Bitmap {
    type Item = &'a i32;
    type IntoIter = std::slice::Iter<'a, i32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn collect_sorts_and_dedups() {
        let bitmap: Bitmap = vec![5, 1, 3, 1, 5].into();
        assert_eq!(bitmap.as_slice(), &[1, 3, 5]);
        assert_eq!(bitmap.len(), 3);
    }

    #[test]
    fn insert_and_remove_keep_order() {
        let mut bitmap = Bitmap::new();
        assert!(bitmap.insert(10));
        assert!(bitmap.insert(-2));
        assert!(bitmap.insert(4));
        assert!(!bitmap.insert(4));
        assert_eq!(bitmap.as_slice(), &[-2, 4, 10]);

        assert!(bitmap.remove(4));
        assert!(!bitmap.remove(4));
        assert!(!bitmap.contains(4));
        assert!(bitmap.contains(10));
        assert_eq!(bitmap.into_vec(), vec![-2, 10]);
    }

    #[test]
    fn decoding_normalizes_keys() {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(&vec![9, 2, 9, -1], &mut buf).unwrap();
        let bitmap: Bitmap = ciborium::de::from_reader(buf.as_slice()).unwrap();

        assert_eq!(bitmap.as_slice(), &[-1, 2, 9]);
        assert!(bitmap.is_normalized());
        assert!(!Bitmap::from_raw(vec![3, 1]).is_normalized());
        assert!(!Bitmap::from_raw(vec![1, 1]).is_normalized());
    }

    proptest! {
        #[test]
        fn inserts_match_btreeset(keys in prop::collection::vec(-50i32..50, 0..64)) {
            let mut bitmap = Bitmap::new();
            let mut reference = BTreeSet::new();
            for key in keys {
                prop_assert_eq!(bitmap.insert(key), reference.insert(key));
            }
            let expected: Vec<i32> = reference.into_iter().collect();
            prop_assert_eq!(bitmap.as_slice(), expected.as_slice());
        }
    }
}
