//! Ordered series: the source capability and a live in-memory series.
//!
//! A [`Series`] is an ordered mapping from keys to values with unique
//! keys, iteration in comparator order, and an update gate that async
//! cursors wait on. [`LiveSeries`] is the crate's reference source: an
//! append-friendly `BTreeMap` behind a read-write lock, with a
//! [`ManualGate`](crate::gate::ManualGate) pulsed on every insert and
//! closed on seal.
//!
//! # Example
//!
//! ```rust,ignore
//! use seriate::series::{LiveSeries, Series};
//! use seriate::cursor::Cursor;
//!
//! let series = LiveSeries::new();
//! series.insert(1i64, 10.0);
//! series.insert(2i64, 20.0);
//!
//! let mut cursor = series.cursor();
//! while cursor.move_next() {
//!     println!("{:?} -> {:?}", cursor.key(), cursor.value());
//! }
//! series.seal(); // async consumers now observe end-of-stream
//! ```

use std::collections::BTreeMap;
use std::hash::Hash;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::cursor::{Cursor, CursorState, Lookup};
use crate::gate::{ManualGate, WaitFuture};
use crate::order::{KeyComparer, NaturalOrder};

/// An immutable key/value pair: the cursor's observable position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair<K, V> {
    /// The key.
    pub key: K,
    /// The value at the key.
    pub value: V,
}

impl<K, V> Pair<K, V> {
    /// Creates a pair.
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

/// Source capability consumed by cursors.
///
/// Implementations guarantee unique keys, iteration order equal to
/// comparator order, and a fresh cursor positioned before the first
/// element.
pub trait Series<K, V> {
    /// The cursor type this source yields.
    type Cursor: Cursor<K, V>;

    /// Comparator capability shared with every cursor of this source.
    type Cmp: KeyComparer<K> + Clone;

    /// Returns a fresh cursor positioned before the first element.
    fn cursor(&self) -> Self::Cursor;

    /// Returns the comparator the series orders by.
    fn comparer(&self) -> Self::Cmp;

    /// True if key positions are sparse or opaque.
    fn is_indexed(&self) -> bool;

    /// True if the source is sealed: no further appends will occur.
    fn is_readonly(&self) -> bool;

    /// A future completing `true` when new data is available and `false`
    /// when the source becomes permanently readonly.
    fn updated(&self) -> WaitFuture;
}

#[derive(Debug)]
struct Shared<K, V> {
    map: RwLock<BTreeMap<K, V>>,
    gate: ManualGate,
    readonly: AtomicBool,
}

/// An append-friendly in-memory ordered series.
///
/// Cloning the handle shares the underlying data; every clone observes
/// the same inserts and the same seal. Readers navigate through
/// [`LiveCursor`]s that take the read lock per movement, so writers and
/// any number of cursors interleave freely.
#[derive(Debug)]
pub struct LiveSeries<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Clone for LiveSeries<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<K, V> Default for LiveSeries<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> LiveSeries<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    /// Creates an empty, mutable series.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                map: RwLock::new(BTreeMap::new()),
                gate: ManualGate::new(),
                readonly: AtomicBool::new(false),
            }),
        }
    }

    /// Inserts a pair, overwriting any existing value at the key.
    ///
    /// Returns `false` if the series is sealed; waiting cursors are
    /// woken otherwise.
    pub fn insert(&self, key: K, value: V) -> bool {
        if self.is_sealed() {
            return false;
        }
        {
            let mut map = self.shared.map.write().expect("series map poisoned");
            map.insert(key, value);
        }
        // Pulse: complete the current gate epoch, then re-arm it.
        self.shared.gate.set();
        self.shared.gate.reset();
        true
    }

    /// Seals the series. Appends are rejected from now on and async
    /// consumers observe end-of-stream once they exhaust the data.
    pub fn seal(&self) {
        self.shared.readonly.store(true, Ordering::Release);
        self.shared.gate.close();
    }

    /// True once [`LiveSeries::seal`] has been called.
    pub fn is_sealed(&self) -> bool {
        self.shared.readonly.load(Ordering::Acquire)
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.shared.map.read().expect("series map poisoned").len()
    }

    /// True if no pairs are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point lookup.
    pub fn try_get(&self, key: &K) -> Option<V> {
        self.shared
            .map
            .read()
            .expect("series map poisoned")
            .get(key)
            .cloned()
    }
}

impl<K, V> FromIterator<(K, V)> for LiveSeries<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let series = Self::new();
        {
            let mut map = series.shared.map.write().expect("series map poisoned");
            map.extend(iter);
        }
        series
    }
}

impl<K, V> Series<K, V> for LiveSeries<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    type Cursor = LiveCursor<K, V>;
    type Cmp = NaturalOrder;

    fn cursor(&self) -> LiveCursor<K, V> {
        LiveCursor {
            shared: self.shared.clone(),
            state: CursorState::Uninitialized,
            current: None,
        }
    }

    fn comparer(&self) -> NaturalOrder {
        NaturalOrder
    }

    fn is_indexed(&self) -> bool {
        false
    }

    fn is_readonly(&self) -> bool {
        self.is_sealed()
    }

    fn updated(&self) -> WaitFuture {
        self.shared.gate.wait()
    }
}

/// Cursor over a [`LiveSeries`].
///
/// Holds a shared handle to the source, its lifecycle state, and the
/// current pair. Each movement takes the source's read lock for one
/// `BTreeMap` range query.
#[derive(Debug)]
pub struct LiveCursor<K, V> {
    shared: Arc<Shared<K, V>>,
    state: CursorState,
    current: Option<(K, V)>,
}

impl<K: Clone, V: Clone> Clone for LiveCursor<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            state: self.state,
            current: self.current.clone(),
        }
    }
}

impl<K, V> LiveCursor<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    fn set_position(&mut self, found: Option<(K, V)>) -> bool {
        match found {
            Some(pair) => {
                self.current = Some(pair);
                self.state = CursorState::AtElement;
                true
            }
            None => false,
        }
    }
}

impl<K, V> Cursor<K, V> for LiveCursor<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    type Cmp = NaturalOrder;

    fn comparer(&self) -> NaturalOrder {
        NaturalOrder
    }

    fn state(&self) -> CursorState {
        self.state
    }

    fn move_first(&mut self) -> bool {
        if self.state == CursorState::Disposed {
            return false;
        }
        let first = {
            let map = self.shared.map.read().expect("series map poisoned");
            map.iter().next().map(|(k, v)| (k.clone(), v.clone()))
        };
        if self.set_position(first) {
            true
        } else {
            if self.shared.readonly.load(Ordering::Acquire) {
                self.state = CursorState::AfterEnd;
                self.current = None;
            }
            false
        }
    }

    fn move_last(&mut self) -> bool {
        if self.state == CursorState::Disposed {
            return false;
        }
        let last = {
            let map = self.shared.map.read().expect("series map poisoned");
            map.iter().next_back().map(|(k, v)| (k.clone(), v.clone()))
        };
        self.set_position(last)
    }

    fn move_next(&mut self) -> bool {
        match self.state {
            CursorState::Uninitialized => self.move_first(),
            CursorState::AtElement => {
                let Some((cur, _)) = &self.current else {
                    return false;
                };
                let next = {
                    let map = self.shared.map.read().expect("series map poisoned");
                    map.range((Bound::Excluded(cur.clone()), Bound::Unbounded))
                        .next()
                        .map(|(k, v)| (k.clone(), v.clone()))
                };
                if self.set_position(next) {
                    true
                } else {
                    if self.shared.readonly.load(Ordering::Acquire) {
                        self.state = CursorState::AfterEnd;
                        self.current = None;
                    }
                    false
                }
            }
            CursorState::AfterEnd | CursorState::Disposed => false,
        }
    }

    fn move_previous(&mut self) -> bool {
        match self.state {
            CursorState::Uninitialized | CursorState::AfterEnd => self.move_last(),
            CursorState::AtElement => {
                let Some((cur, _)) = &self.current else {
                    return false;
                };
                let prev = {
                    let map = self.shared.map.read().expect("series map poisoned");
                    map.range((Bound::Unbounded, Bound::Excluded(cur.clone())))
                        .next_back()
                        .map(|(k, v)| (k.clone(), v.clone()))
                };
                self.set_position(prev)
            }
            CursorState::Disposed => false,
        }
    }

    fn move_at(&mut self, key: &K, direction: Lookup) -> bool {
        if self.state == CursorState::Disposed {
            return false;
        }
        let found = {
            let map = self.shared.map.read().expect("series map poisoned");
            match direction {
                Lookup::Eq => map.get(key).map(|v| (key.clone(), v.clone())),
                Lookup::Lt => map
                    .range((Bound::Unbounded, Bound::Excluded(key.clone())))
                    .next_back()
                    .map(|(k, v)| (k.clone(), v.clone())),
                Lookup::Le => map
                    .range((Bound::Unbounded, Bound::Included(key.clone())))
                    .next_back()
                    .map(|(k, v)| (k.clone(), v.clone())),
                Lookup::Ge => map
                    .range((Bound::Included(key.clone()), Bound::Unbounded))
                    .next()
                    .map(|(k, v)| (k.clone(), v.clone())),
                Lookup::Gt => map
                    .range((Bound::Excluded(key.clone()), Bound::Unbounded))
                    .next()
                    .map(|(k, v)| (k.clone(), v.clone())),
            }
        };
        self.set_position(found)
    }

    fn key(&self) -> Option<&K> {
        self.current.as_ref().map(|(k, _)| k)
    }

    fn value(&self) -> Option<V> {
        self.current.as_ref().map(|(_, v)| v.clone())
    }

    fn try_get_value(&self, key: &K) -> Option<V> {
        if self.state == CursorState::Disposed {
            return None;
        }
        self.shared
            .map
            .read()
            .expect("series map poisoned")
            .get(key)
            .cloned()
    }

    fn is_readonly(&self) -> bool {
        self.shared.readonly.load(Ordering::Acquire)
    }

    fn updated(&self) -> WaitFuture {
        self.shared.gate.wait()
    }

    fn move_next_batch(&mut self) -> Option<Vec<Pair<K, V>>> {
        // Batches are served only over a sealed source; a mutable one
        // refuses so element mode remains the sole provisional path.
        if !self.is_readonly() || self.state == CursorState::Disposed {
            return None;
        }
        let lower = match (&self.state, &self.current) {
            (CursorState::AfterEnd, _) => return None,
            (CursorState::AtElement, Some((cur, _))) => Bound::Excluded(cur.clone()),
            _ => Bound::Unbounded,
        };
        let batch: Vec<Pair<K, V>> = {
            let map = self.shared.map.read().expect("series map poisoned");
            map.range((lower, Bound::Unbounded))
                .map(|(k, v)| Pair::new(k.clone(), v.clone()))
                .collect()
        };
        if batch.is_empty() {
            self.state = CursorState::AfterEnd;
            self.current = None;
            return None;
        }
        let last = batch.last().cloned();
        if let Some(pair) = last {
            self.current = Some((pair.key, pair.value));
            self.state = CursorState::AtElement;
        }
        Some(batch)
    }

    fn dispose(&mut self) {
        self.state = CursorState::Disposed;
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LiveSeries<i64, f64> {
        let series = LiveSeries::new();
        series.insert(1, 10.0);
        series.insert(3, 30.0);
        series.insert(2, 20.0);
        series
    }

    #[test]
    fn test_iteration_in_key_order() {
        let series = sample();
        let mut cursor = series.cursor();
        let mut keys = Vec::new();
        while cursor.move_next() {
            keys.push(*cursor.key().unwrap());
        }
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[test]
    fn test_move_next_at_end_is_provisional() {
        let series = sample();
        let mut cursor = series.cursor();
        while cursor.move_next() {}
        assert_eq!(cursor.state(), CursorState::AtElement);
        assert_eq!(cursor.key(), Some(&3));

        series.insert(4, 40.0);
        assert!(cursor.move_next());
        assert_eq!(cursor.key(), Some(&4));

        series.seal();
        assert!(!cursor.move_next());
        assert_eq!(cursor.state(), CursorState::AfterEnd);
        assert!(!cursor.move_next());
    }

    #[test]
    fn test_move_previous_from_after_end() {
        let series = sample();
        series.seal();
        let mut cursor = series.cursor();
        while cursor.move_next() {}
        assert_eq!(cursor.state(), CursorState::AfterEnd);
        assert!(cursor.move_previous());
        assert_eq!(cursor.key(), Some(&3));
        assert!(cursor.move_previous());
        assert_eq!(cursor.key(), Some(&2));
    }

    #[test]
    fn test_move_at_directions() {
        let series = sample();
        let mut cursor = series.cursor();

        assert!(cursor.move_at(&2, Lookup::Eq));
        assert_eq!(cursor.key(), Some(&2));

        assert!(!cursor.move_at(&5, Lookup::Eq));
        // Failed lookup leaves the position unchanged.
        assert_eq!(cursor.key(), Some(&2));

        assert!(cursor.move_at(&2, Lookup::Lt));
        assert_eq!(cursor.key(), Some(&1));
        assert!(cursor.move_at(&2, Lookup::Le));
        assert_eq!(cursor.key(), Some(&2));
        assert!(cursor.move_at(&2, Lookup::Gt));
        assert_eq!(cursor.key(), Some(&3));
        assert!(cursor.move_at(&0, Lookup::Ge));
        assert_eq!(cursor.key(), Some(&1));
        assert!(!cursor.move_at(&0, Lookup::Lt));
    }

    #[test]
    fn test_lookup_position_coherence() {
        let series = sample();
        let mut cursor = series.cursor();
        assert!(cursor.move_at(&3, Lookup::Eq));
        assert_eq!(cursor.try_get_value(&3), cursor.value());
    }

    #[test]
    fn test_clone_is_independent() {
        let series = sample();
        let mut a = series.cursor();
        assert!(a.move_first());
        let mut b = a.clone();
        assert!(b.move_next());
        assert_eq!(a.key(), Some(&1));
        assert_eq!(b.key(), Some(&2));
    }

    #[test]
    fn test_insert_rejected_after_seal() {
        let series = sample();
        series.seal();
        assert!(!series.insert(9, 90.0));
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_batch_refused_while_mutable() {
        let series = sample();
        let mut cursor = series.cursor();
        assert!(cursor.move_next_batch().is_none());

        series.seal();
        let batch = cursor.move_next_batch().unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].key, 1);
        // The batch consumed everything; element mode agrees.
        assert!(!cursor.move_next());
        assert!(cursor.move_next_batch().is_none());
    }

    #[test]
    fn test_batch_resumes_after_element_mode() {
        let series = sample();
        series.seal();
        let mut cursor = series.cursor();
        assert!(cursor.move_next());
        let batch = cursor.move_next_batch().unwrap();
        let keys: Vec<i64> = batch.iter().map(|p| p.key).collect();
        assert_eq!(keys, vec![2, 3]);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let series = sample();
        let mut cursor = series.cursor();
        cursor.move_first();
        cursor.dispose();
        cursor.dispose();
        assert_eq!(cursor.state(), CursorState::Disposed);
        assert!(!cursor.move_next());
        assert!(cursor.try_get_value(&1).is_none());
    }
}
