//! Always-empty cursor.

use std::marker::PhantomData;

use crate::cursor::{Cursor, CursorState, Lookup};
use crate::gate::WaitFuture;
use crate::order::NaturalOrder;

/// A cursor over no stored elements.
///
/// `Empty` is continuous: it defines the default value at every key, so
/// it is the neutral element of the combinator algebra. Zipping against
/// it samples the default without constraining the discrete side's
/// domain.
#[derive(Debug)]
pub struct Empty<K, V> {
    state: CursorState,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Empty<K, V> {
    /// Creates an empty cursor.
    pub fn new() -> Self {
        Self {
            state: CursorState::Uninitialized,
            _marker: PhantomData,
        }
    }
}

impl<K, V> Default for Empty<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for Empty<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            _marker: PhantomData,
        }
    }
}

impl<K, V> Cursor<K, V> for Empty<K, V>
where
    K: Ord + std::hash::Hash,
    V: Default,
{
    type Cmp = NaturalOrder;

    fn comparer(&self) -> NaturalOrder {
        NaturalOrder
    }

    fn state(&self) -> CursorState {
        self.state
    }

    fn move_first(&mut self) -> bool {
        false
    }

    fn move_last(&mut self) -> bool {
        false
    }

    fn move_next(&mut self) -> bool {
        false
    }

    fn move_previous(&mut self) -> bool {
        false
    }

    fn move_at(&mut self, _key: &K, _direction: Lookup) -> bool {
        false
    }

    fn key(&self) -> Option<&K> {
        None
    }

    fn value(&self) -> Option<V> {
        None
    }

    fn try_get_value(&self, _key: &K) -> Option<V> {
        Some(V::default())
    }

    fn is_continuous(&self) -> bool {
        true
    }

    fn is_readonly(&self) -> bool {
        true
    }

    fn updated(&self) -> WaitFuture {
        WaitFuture::ready(false)
    }

    fn dispose(&mut self) {
        self.state = CursorState::Disposed;
    }
}
