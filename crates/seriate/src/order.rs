//! Key comparator capability.
//!
//! A [`KeyComparer`] supplies the total order every series and cursor in
//! this crate navigates by. Cursors resolve ties through the comparator
//! alone and never compare keys by bit equality.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Total ordering over a key type.
///
/// Implementations must be a total order and stay stable for the
/// lifetime of any series using them. `hash_key` must be consistent
/// with `compare`: keys that compare equal hash identically.
pub trait KeyComparer<K> {
    /// Compares two keys.
    fn compare(&self, a: &K, b: &K) -> Ordering;

    /// Hashes a key consistently with `compare` equality.
    fn hash_key(&self, key: &K, state: &mut dyn Hasher);

    /// Returns true if the two keys compare equal.
    fn eq_keys(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

/// The intrinsic `Ord`/`Hash` order of a key type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord + Hash> KeyComparer<K> for NaturalOrder {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }

    fn hash_key(&self, key: &K, mut state: &mut dyn Hasher) {
        key.hash(&mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(key: &i64) -> u64 {
        let mut hasher = DefaultHasher::new();
        NaturalOrder.hash_key(key, &mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_natural_order_is_total() {
        assert_eq!(NaturalOrder.compare(&1i64, &2i64), Ordering::Less);
        assert_eq!(NaturalOrder.compare(&2i64, &1i64), Ordering::Greater);
        assert_eq!(NaturalOrder.compare(&7i64, &7i64), Ordering::Equal);
    }

    #[test]
    fn test_hash_consistent_with_equality() {
        assert!(NaturalOrder.eq_keys(&42i64, &42i64));
        assert_eq!(hash_of(&42), hash_of(&42));
    }
}
