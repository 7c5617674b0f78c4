//! Value projection combinator.

use std::marker::PhantomData;

use crate::cursor::{Cursor, CursorState, Lookup};
use crate::gate::WaitFuture;
use crate::series::Pair;

/// Projects an inner cursor's values through a function, keeping keys.
///
/// Movement is delegated verbatim; the value is computed lazily on each
/// access, so iterating a `Map` allocates nothing per element.
pub struct Map<K, VIn, VOut, F, C>
where
    C: Cursor<K, VIn>,
    F: Fn(&K, VIn) -> VOut + Clone,
{
    inner: C,
    f: F,
    _marker: PhantomData<fn() -> (K, VIn, VOut)>,
}

impl<K, VIn, VOut, F, C> Map<K, VIn, VOut, F, C>
where
    C: Cursor<K, VIn>,
    F: Fn(&K, VIn) -> VOut + Clone,
{
    /// Wraps `inner`, projecting every value through `f`.
    pub fn new(inner: C, f: F) -> Self {
        Self {
            inner,
            f,
            _marker: PhantomData,
        }
    }

    /// Returns the inner cursor.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<K, VIn, VOut, F, C> Clone for Map<K, VIn, VOut, F, C>
where
    C: Cursor<K, VIn>,
    F: Fn(&K, VIn) -> VOut + Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            f: self.f.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, VIn, VOut, F, C> Cursor<K, VOut> for Map<K, VIn, VOut, F, C>
where
    C: Cursor<K, VIn>,
    F: Fn(&K, VIn) -> VOut + Clone,
{
    type Cmp = C::Cmp;

    fn comparer(&self) -> C::Cmp {
        self.inner.comparer()
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

    fn value(&self) -> Option<VOut> {
        let key = self.inner.key()?;
        let value = self.inner.value()?;
        Some((self.f)(key, value))
    }

    fn try_get_value(&self, key: &K) -> Option<VOut> {
        self.inner.try_get_value(key).map(|v| (self.f)(key, v))
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

    fn move_next_batch(&mut self) -> Option<Vec<Pair<K, VOut>>> {
        let batch = self.inner.move_next_batch()?;
        Some(
            batch
                .into_iter()
                .map(|pair| {
                    let value = (self.f)(&pair.key, pair.value);
                    Pair::new(pair.key, value)
                })
                .collect(),
        )
    }

    fn dispose(&mut self) {
        self.inner.dispose();
    }
}
