//! Cursor protocol for ordered series.
//!
//! A [`Cursor`] is a single-reader navigator over an ordered series:
//! synchronous bidirectional movement, point lookups, and an async
//! move-next that waits for the source to advance.
//!
//! The key semantic is the difference between "end, readonly" and "end,
//! mutable". A sync [`Cursor::move_next`] returning `false` does **not**
//! mean the sequence is complete; it means "no element right now". Only
//! [`Cursor::next_async`] folds that distinction into a terminal result:
//! it resolves `false` iff the source is sealed and exhausted.
//!
//! Combinators ([`Map`], [`Op`], [`Comparison`], [`Zip`], [`Empty`],
//! [`DynCursor`]) are cursors themselves, parametric in their inner
//! cursor type, so a pipeline is a nested value type known at
//! composition time and pays no allocation per element.
//!
//! # Example
//!
//! ```rust,ignore
//! use seriate::cursor::{Cursor, CursorExt, Lookup};
//!
//! let mut pipeline = left.cursor().zip(right.cursor()).map(|_, (a, b)| a + b);
//! while pipeline.move_next() {
//!     println!("{:?} -> {:?}", pipeline.key(), pipeline.value());
//! }
//! ```

mod arith;
mod empty;
mod erased;
mod map;
mod zip;

pub use arith::{
    AddOp, CompareOp, Comparison, DivOp, EqOp, GeOp, GeROp, GtOp, GtROp, LeOp, LeROp, LtOp, LtROp,
    MulOp, NeOp, NegOp, Op, PlusOp, RDivOp, RRemOp, RSubOp, RemOp, ScalarOp, SubOp,
};
pub use empty::Empty;
pub use erased::{DynCursor, DynOrder};
pub use map::Map;
pub use zip::Zip;

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::{Result, SeriesError};
use crate::gate::{CancelToken, WaitFuture};
use crate::order::KeyComparer;
use crate::series::Pair;

/// Direction argument for [`Cursor::move_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Position exactly on the key.
    Eq,
    /// Position on the greatest key strictly less than the argument.
    Lt,
    /// Position on the greatest key less than or equal to the argument.
    Le,
    /// Position on the smallest key greater than or equal to the argument.
    Ge,
    /// Position on the smallest key strictly greater than the argument.
    Gt,
}

/// Observable lifecycle state of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Initial state; the current pair is undefined.
    Uninitialized,
    /// Positioned on an element; key and value are valid.
    AtElement,
    /// Past the last element of a readonly series.
    AfterEnd,
    /// Disposed; every operation is a no-op.
    Disposed,
}

/// A stateful navigator over an ordered series.
///
/// Movement operations return `true` when the cursor lands on an
/// element, `false` otherwise; they never error. On failure the cursor
/// position is unchanged. Cloning produces an independent cursor with
/// the same logical state.
pub trait Cursor<K, V>: Clone {
    /// Comparator capability shared with the source.
    type Cmp: KeyComparer<K> + Clone;

    /// Returns the comparator this cursor orders by.
    fn comparer(&self) -> Self::Cmp;

    /// Returns the cursor's lifecycle state.
    fn state(&self) -> CursorState;

    /// Positions at the minimum key. Returns `true` if an element exists.
    fn move_first(&mut self) -> bool;

    /// Positions at the maximum key. Returns `true` if an element exists.
    fn move_last(&mut self) -> bool;

    /// Advances one key.
    ///
    /// `false` at the end is provisional on a mutable source: new keys
    /// may still arrive, and a later call resumes at the first unseen
    /// key strictly greater than the last emitted one.
    fn move_next(&mut self) -> bool;

    /// Regresses one key. Symmetric to [`Cursor::move_next`].
    fn move_previous(&mut self) -> bool;

    /// Positions exactly on `key` or on its neighbor per `direction`.
    fn move_at(&mut self, key: &K, direction: Lookup) -> bool;

    /// The current key, defined only in the `AtElement` state.
    fn key(&self) -> Option<&K>;

    /// The current value, defined only in the `AtElement` state.
    fn value(&self) -> Option<V>;

    /// Point lookup without moving the cursor.
    fn try_get_value(&self, key: &K) -> Option<V>;

    /// True if the cursor defines a value at every key of its domain,
    /// not only at stored keys.
    fn is_continuous(&self) -> bool {
        false
    }

    /// True if key positions in the source are sparse or opaque.
    fn is_indexed(&self) -> bool {
        false
    }

    /// True if the source is sealed: no further appends will occur.
    fn is_readonly(&self) -> bool;

    /// A future completing `true` when the source gains data and `false`
    /// when it becomes permanently readonly.
    fn updated(&self) -> WaitFuture;

    /// Returns the next chunk of consecutive elements, advancing past
    /// it, or `None` when batching is unavailable.
    ///
    /// Implementations may refuse universally. Alternating element and
    /// batch mode must produce the same total sequence.
    fn move_next_batch(&mut self) -> Option<Vec<Pair<K, V>>> {
        None
    }

    /// Releases inner resources. Idempotent.
    fn dispose(&mut self);

    /// Async advance: resolves `true` once a sync advance succeeds,
    /// `false` once the source is sealed and exhausted, and
    /// `Err(Cancelled)` if `cancel` fires first (position unchanged).
    fn next_async(&mut self, cancel: CancelToken) -> NextFuture<'_, K, V, Self>
    where
        Self: Sized,
    {
        NextFuture::new(self, cancel)
    }
}

/// Future returned by [`Cursor::next_async`].
///
/// A small state machine: retry the sync advance, and between retries
/// await the source's update gate raced against the cancellation token.
pub struct NextFuture<'a, K, V, C: Cursor<K, V>> {
    cursor: &'a mut C,
    wait: Option<WaitFuture>,
    cancel: CancelToken,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<'a, K, V, C: Cursor<K, V>> NextFuture<'a, K, V, C> {
    fn new(cursor: &'a mut C, cancel: CancelToken) -> Self {
        Self {
            cursor,
            wait: None,
            cancel,
            _marker: PhantomData,
        }
    }
}

impl<K, V, C: Cursor<K, V>> Future for NextFuture<'_, K, V, C> {
    type Output = Result<bool>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.cancel.poll_cancelled(cx).is_ready() {
            return Poll::Ready(Err(SeriesError::Cancelled));
        }
        loop {
            if this.cursor.move_next() {
                this.wait = None;
                return Poll::Ready(Ok(true));
            }
            if this.cursor.is_readonly() {
                return Poll::Ready(Ok(false));
            }
            match &mut this.wait {
                // Take the gate first, then re-check the source, so an
                // append racing with this poll is never missed.
                None => this.wait = Some(this.cursor.updated()),
                Some(wait) => match Pin::new(wait).poll(cx) {
                    Poll::Ready(_) => this.wait = None,
                    Poll::Pending => return Poll::Pending,
                },
            }
        }
    }
}

/// Builder-style composition for cursors.
///
/// Mirrors the operator algebra of the series API: arithmetic against a
/// scalar, comparisons, projection, and pairwise zip.
pub trait CursorExt<K, V>: Cursor<K, V> + Sized {
    /// Projects every value through `f`, keeping keys.
    fn map<VOut, F>(self, f: F) -> Map<K, V, VOut, F, Self>
    where
        F: Fn(&K, V) -> VOut + Clone,
    {
        Map::new(self, f)
    }

    /// Adds a scalar to every value.
    fn add(self, operand: V) -> Op<K, V, AddOp, Self>
    where
        V: std::ops::Add<Output = V>,
    {
        Op::new(self, operand)
    }

    /// Subtracts a scalar from every value.
    fn sub(self, operand: V) -> Op<K, V, SubOp, Self>
    where
        V: std::ops::Sub<Output = V>,
    {
        Op::new(self, operand)
    }

    /// Subtracts every value from a scalar.
    fn rsub(self, operand: V) -> Op<K, V, RSubOp, Self>
    where
        V: std::ops::Sub<Output = V>,
    {
        Op::new(self, operand)
    }

    /// Multiplies every value by a scalar.
    fn mul(self, operand: V) -> Op<K, V, MulOp, Self>
    where
        V: std::ops::Mul<Output = V>,
    {
        Op::new(self, operand)
    }

    /// Divides every value by a scalar.
    fn div(self, operand: V) -> Op<K, V, DivOp, Self>
    where
        V: std::ops::Div<Output = V>,
    {
        Op::new(self, operand)
    }

    /// Divides a scalar by every value.
    fn rdiv(self, operand: V) -> Op<K, V, RDivOp, Self>
    where
        V: std::ops::Div<Output = V>,
    {
        Op::new(self, operand)
    }

    /// Remainder of every value by a scalar.
    fn rem(self, operand: V) -> Op<K, V, RemOp, Self>
    where
        V: std::ops::Rem<Output = V>,
    {
        Op::new(self, operand)
    }

    /// Remainder of a scalar by every value.
    fn rrem(self, operand: V) -> Op<K, V, RRemOp, Self>
    where
        V: std::ops::Rem<Output = V>,
    {
        Op::new(self, operand)
    }

    /// Negates every value.
    fn negate(self) -> Op<K, V, NegOp, Self>
    where
        V: Default + std::ops::Neg<Output = V>,
    {
        Op::new(self, V::default())
    }

    /// Unary plus: every value unchanged.
    fn plus(self) -> Op<K, V, PlusOp, Self>
    where
        V: Default,
    {
        Op::new(self, V::default())
    }

    /// Compares every value against a scalar.
    fn compare<O: CompareOp<V>>(self, operand: V) -> Comparison<K, V, O, Self> {
        Comparison::new(self, operand)
    }

    /// Pairs this cursor with another at common keys.
    fn zip<VR, R>(self, right: R) -> Zip<K, V, VR, Self, R>
    where
        K: Clone,
        V: Clone,
        VR: Clone,
        R: Cursor<K, VR>,
    {
        Zip::new(self, right)
    }

    /// Erases the pipeline type behind one indirection per operation.
    fn boxed(self) -> DynCursor<K, V>
    where
        Self: Send + 'static,
        Self::Cmp: Send + Sync + 'static,
        K: 'static,
        V: 'static,
    {
        DynCursor::new(self)
    }
}

impl<K, V, C: Cursor<K, V> + Sized> CursorExt<K, V> for C {}
