//! Scalar arithmetic and comparison combinators.
//!
//! [`Op`] and [`Comparison`] are specializations of the projection
//! combinator where the transform is a recognized scalar operation,
//! carried as a zero-sized capability type so monomorphization collapses
//! each value access to the primitive instruction.

use std::marker::PhantomData;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

use crate::cursor::{Cursor, CursorState, Lookup};
use crate::gate::WaitFuture;
use crate::series::Pair;

/// A pure scalar operation applied to every value of a cursor.
///
/// `apply(value, operand)` receives the series value first; reverse
/// variants put the scalar on the left.
pub trait ScalarOp<V>: Copy + Default {
    /// Applies the operation.
    fn apply(value: V, operand: V) -> V;
}

/// A pure scalar predicate over every value of a cursor.
pub trait CompareOp<V>: Copy + Default {
    /// Evaluates the predicate.
    fn apply(value: &V, operand: &V) -> bool;
}

macro_rules! scalar_op {
    ($(#[$doc:meta])* $name:ident, [$($bound:tt)*], $value:ident, $operand:ident, $body:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl<V: $($bound)*> ScalarOp<V> for $name {
            #[inline]
            fn apply($value: V, $operand: V) -> V {
                $body
            }
        }
    };
}

scalar_op!(
    /// `value + operand`.
    AddOp, [Add<Output = V>], value, operand, value + operand
);
scalar_op!(
    /// `value - operand`.
    SubOp, [Sub<Output = V>], value, operand, value - operand
);
scalar_op!(
    /// `operand - value`.
    RSubOp, [Sub<Output = V>], value, operand, operand - value
);
scalar_op!(
    /// `value * operand`.
    MulOp, [Mul<Output = V>], value, operand, value * operand
);
scalar_op!(
    /// `value / operand`.
    DivOp, [Div<Output = V>], value, operand, value / operand
);
scalar_op!(
    /// `operand / value`.
    RDivOp, [Div<Output = V>], value, operand, operand / value
);
scalar_op!(
    /// `value % operand`.
    RemOp, [Rem<Output = V>], value, operand, value % operand
);
scalar_op!(
    /// `operand % value`.
    RRemOp, [Rem<Output = V>], value, operand, operand % value
);

/// `-value`; the operand is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NegOp;

impl<V: Neg<Output = V>> ScalarOp<V> for NegOp {
    #[inline]
    fn apply(value: V, _operand: V) -> V {
        -value
    }
}

/// Unary plus: the value unchanged, the operand ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlusOp;

impl<V> ScalarOp<V> for PlusOp {
    #[inline]
    fn apply(value: V, _operand: V) -> V {
        value
    }
}

macro_rules! compare_op {
    ($(#[$doc:meta])* $name:ident, [$($bound:tt)*], $value:ident, $operand:ident, $body:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl<V: $($bound)*> CompareOp<V> for $name {
            #[inline]
            fn apply($value: &V, $operand: &V) -> bool {
                $body
            }
        }
    };
}

compare_op!(
    /// `value == operand`.
    EqOp, [PartialEq], value, operand, value == operand
);
compare_op!(
    /// `value != operand`.
    NeOp, [PartialEq], value, operand, value != operand
);
compare_op!(
    /// `value < operand`.
    LtOp, [PartialOrd], value, operand, value < operand
);
compare_op!(
    /// `operand < value`.
    LtROp, [PartialOrd], value, operand, operand < value
);
compare_op!(
    /// `value > operand`.
    GtOp, [PartialOrd], value, operand, value > operand
);
compare_op!(
    /// `operand > value`.
    GtROp, [PartialOrd], value, operand, operand > value
);
compare_op!(
    /// `value <= operand`.
    LeOp, [PartialOrd], value, operand, value <= operand
);
compare_op!(
    /// `operand <= value`.
    LeROp, [PartialOrd], value, operand, operand <= value
);
compare_op!(
    /// `value >= operand`.
    GeOp, [PartialOrd], value, operand, value >= operand
);
compare_op!(
    /// `operand >= value`.
    GeROp, [PartialOrd], value, operand, operand >= value
);

/// Applies a scalar operation to every value of the inner cursor.
pub struct Op<K, V, O, C>
where
    O: ScalarOp<V>,
    C: Cursor<K, V>,
{
    inner: C,
    operand: V,
    _marker: PhantomData<fn() -> (K, O)>,
}

impl<K, V, O, C> Op<K, V, O, C>
where
    O: ScalarOp<V>,
    C: Cursor<K, V>,
{
    /// Wraps `inner` with the operation and its scalar operand.
    pub fn new(inner: C, operand: V) -> Self {
        Self {
            inner,
            operand,
            _marker: PhantomData,
        }
    }
}

impl<K, V, O, C> Clone for Op<K, V, O, C>
where
    V: Clone,
    O: ScalarOp<V>,
    C: Cursor<K, V>,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            operand: self.operand.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V, O, C> Cursor<K, V> for Op<K, V, O, C>
where
    V: Clone,
    O: ScalarOp<V>,
    C: Cursor<K, V>,
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

    fn value(&self) -> Option<V> {
        self.inner
            .value()
            .map(|v| O::apply(v, self.operand.clone()))
    }

    fn try_get_value(&self, key: &K) -> Option<V> {
        self.inner
            .try_get_value(key)
            .map(|v| O::apply(v, self.operand.clone()))
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
        let batch = self.inner.move_next_batch()?;
        Some(
            batch
                .into_iter()
                .map(|pair| Pair::new(pair.key, O::apply(pair.value, self.operand.clone())))
                .collect(),
        )
    }

    fn dispose(&mut self) {
        self.inner.dispose();
    }
}

/// Compares every value of the inner cursor against a scalar, yielding
/// booleans at the same keys.
pub struct Comparison<K, V, O, C>
where
    O: CompareOp<V>,
    C: Cursor<K, V>,
{
    inner: C,
    operand: V,
    _marker: PhantomData<fn() -> (K, O)>,
}

impl<K, V, O, C> Comparison<K, V, O, C>
where
    O: CompareOp<V>,
    C: Cursor<K, V>,
{
    /// Wraps `inner` with the predicate and its scalar operand.
    pub fn new(inner: C, operand: V) -> Self {
        Self {
            inner,
            operand,
            _marker: PhantomData,
        }
    }
}

impl<K, V, O, C> Clone for Comparison<K, V, O, C>
where
    V: Clone,
    O: CompareOp<V>,
    C: Cursor<K, V>,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            operand: self.operand.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V, O, C> Cursor<K, bool> for Comparison<K, V, O, C>
where
    V: Clone,
    O: CompareOp<V>,
    C: Cursor<K, V>,
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

    fn value(&self) -> Option<bool> {
        self.inner.value().map(|v| O::apply(&v, &self.operand))
    }

    fn try_get_value(&self, key: &K) -> Option<bool> {
        self.inner
            .try_get_value(key)
            .map(|v| O::apply(&v, &self.operand))
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

    fn move_next_batch(&mut self) -> Option<Vec<Pair<K, bool>>> {
        let batch = self.inner.move_next_batch()?;
        Some(
            batch
                .into_iter()
                .map(|pair| Pair::new(pair.key, O::apply(&pair.value, &self.operand)))
                .collect(),
        )
    }

    fn dispose(&mut self) {
        self.inner.dispose();
    }
}
