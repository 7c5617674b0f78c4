//! Type-erased cursor.
//!
//! Composition normally builds a nested value type whose shape is the
//! pipeline. [`DynCursor`] deliberately forgets that shape behind a
//! boxed vtable, for heterogeneous collections and library boundaries.
//! The cost is one indirection per operation; erase at the edge, not
//! eagerly.

use std::cmp::Ordering;
use std::hash::Hasher;
use std::sync::Arc;

use crate::cursor::{Cursor, CursorState, Lookup};
use crate::gate::WaitFuture;
use crate::order::KeyComparer;
use crate::series::Pair;

trait ErasedCursor<K, V>: Send {
    fn state(&self) -> CursorState;
    fn move_first(&mut self) -> bool;
    fn move_last(&mut self) -> bool;
    fn move_next(&mut self) -> bool;
    fn move_previous(&mut self) -> bool;
    fn move_at(&mut self, key: &K, direction: Lookup) -> bool;
    fn key(&self) -> Option<&K>;
    fn value(&self) -> Option<V>;
    fn try_get_value(&self, key: &K) -> Option<V>;
    fn is_continuous(&self) -> bool;
    fn is_indexed(&self) -> bool;
    fn is_readonly(&self) -> bool;
    fn updated(&self) -> WaitFuture;
    fn move_next_batch(&mut self) -> Option<Vec<Pair<K, V>>>;
    fn dispose(&mut self);
    fn clone_boxed(&self) -> Box<dyn ErasedCursor<K, V>>;
}

impl<K, V, C> ErasedCursor<K, V> for C
where
    C: Cursor<K, V> + Send + 'static,
    K: 'static,
    V: 'static,
{
    fn state(&self) -> CursorState {
        Cursor::state(self)
    }

    fn move_first(&mut self) -> bool {
        Cursor::move_first(self)
    }

    fn move_last(&mut self) -> bool {
        Cursor::move_last(self)
    }

    fn move_next(&mut self) -> bool {
        Cursor::move_next(self)
    }

    fn move_previous(&mut self) -> bool {
        Cursor::move_previous(self)
    }

    fn move_at(&mut self, key: &K, direction: Lookup) -> bool {
        Cursor::move_at(self, key, direction)
    }

    fn key(&self) -> Option<&K> {
        Cursor::key(self)
    }

    fn value(&self) -> Option<V> {
        Cursor::value(self)
    }

    fn try_get_value(&self, key: &K) -> Option<V> {
        Cursor::try_get_value(self, key)
    }

    fn is_continuous(&self) -> bool {
        Cursor::is_continuous(self)
    }

    fn is_indexed(&self) -> bool {
        Cursor::is_indexed(self)
    }

    fn is_readonly(&self) -> bool {
        Cursor::is_readonly(self)
    }

    fn updated(&self) -> WaitFuture {
        Cursor::updated(self)
    }

    fn move_next_batch(&mut self) -> Option<Vec<Pair<K, V>>> {
        Cursor::move_next_batch(self)
    }

    fn dispose(&mut self) {
        Cursor::dispose(self)
    }

    fn clone_boxed(&self) -> Box<dyn ErasedCursor<K, V>> {
        Box::new(self.clone())
    }
}

trait ErasedOrder<K>: Send + Sync {
    fn compare_keys(&self, a: &K, b: &K) -> Ordering;
    fn hash_erased(&self, key: &K, state: &mut dyn Hasher);
}

impl<K, C> ErasedOrder<K> for C
where
    C: KeyComparer<K> + Send + Sync,
{
    fn compare_keys(&self, a: &K, b: &K) -> Ordering {
        self.compare(a, b)
    }

    fn hash_erased(&self, key: &K, state: &mut dyn Hasher) {
        self.hash_key(key, state);
    }
}

/// A comparator whose concrete type has been erased.
pub struct DynOrder<K> {
    inner: Arc<dyn ErasedOrder<K>>,
}

impl<K> Clone for DynOrder<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K> KeyComparer<K> for DynOrder<K> {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self.inner.compare_keys(a, b)
    }

    fn hash_key(&self, key: &K, state: &mut dyn Hasher) {
        self.inner.hash_erased(key, state);
    }
}

/// A cursor whose pipeline type has been erased.
pub struct DynCursor<K, V> {
    inner: Box<dyn ErasedCursor<K, V>>,
    cmp: DynOrder<K>,
}

impl<K, V> DynCursor<K, V>
where
    K: 'static,
    V: 'static,
{
    /// Boxes a concrete cursor.
    pub fn new<C>(cursor: C) -> Self
    where
        C: Cursor<K, V> + Send + 'static,
        C::Cmp: Send + Sync + 'static,
    {
        let cmp = DynOrder {
            inner: Arc::new(cursor.comparer()) as Arc<dyn ErasedOrder<K>>,
        };
        Self {
            inner: Box::new(cursor),
            cmp,
        }
    }
}

impl<K, V> Clone for DynCursor<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_boxed(),
            cmp: self.cmp.clone(),
        }
    }
}

impl<K, V> Cursor<K, V> for DynCursor<K, V> {
    type Cmp = DynOrder<K>;

    fn comparer(&self) -> DynOrder<K> {
        self.cmp.clone()
    }

    fn state(&self) -> CursorState {
        self.inner.state()
    }

    fn move_first(&mut self) -> bool {
        self.inner.move_first()
    }

    fn move_last(&mut self) -> bool {
        self.inner.move_last()
    }

    fn move_next(&mut self) -> bool {
        self.inner.move_next()
    }

    fn move_previous(&mut self) -> bool {
        self.inner.move_previous()
    }

    fn move_at(&mut self, key: &K, direction: Lookup) -> bool {
        self.inner.move_at(key, direction)
    }

    fn key(&self) -> Option<&K> {
        self.inner.key()
    }

    fn value(&self) -> Option<V> {
        self.inner.value()
    }

    fn try_get_value(&self, key: &K) -> Option<V> {
        self.inner.try_get_value(key)
    }

    fn is_continuous(&self) -> bool {
        self.inner.is_continuous()
    }

    fn is_indexed(&self) -> bool {
        self.inner.is_indexed()
    }

    fn is_readonly(&self) -> bool {
        self.inner.is_readonly()
    }

    fn updated(&self) -> WaitFuture {
        self.inner.updated()
    }

    fn move_next_batch(&mut self) -> Option<Vec<Pair<K, V>>> {
        self.inner.move_next_batch()
    }

    fn dispose(&mut self) {
        self.inner.dispose()
    }
}
