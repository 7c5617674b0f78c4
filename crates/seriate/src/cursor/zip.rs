//! Pairwise zip combinator.
//!
//! [`Zip`] produces `(left, right)` value pairs at keys where both
//! operand cursors have a value. With two discrete operands the output
//! domain is the intersection of their key sets, reached by repeatedly
//! seeking the lagging side. When either operand is continuous, the
//! discrete side drives and the continuous side is sampled by point
//! lookup at the driver's key.

use std::cmp::Ordering;

use crate::cursor::{Cursor, CursorState, Lookup};
use crate::gate::WaitFuture;
use crate::order::KeyComparer;

/// Which operand drives iteration for the current call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drive {
    /// Both discrete: intersection-seek.
    Matched,
    /// Left drives, right is sampled by lookup.
    Left,
    /// Right drives, left is sampled by lookup.
    Right,
}

/// Zips two cursors over the same key type.
///
/// Operand cursors are owned by value and taken at their current
/// position; pass fresh cursors for whole-series zips. On a failed
/// movement both operands are restored to the last emitted position, so
/// a provisional `false` on mutable sources can be retried without
/// skipping keys.
pub struct Zip<K, VL, VR, L, R>
where
    L: Cursor<K, VL>,
    R: Cursor<K, VR>,
{
    left: L,
    right: R,
    current: Option<(K, (VL, VR))>,
    state: CursorState,
}

impl<K, VL, VR, L, R> Zip<K, VL, VR, L, R>
where
    K: Clone,
    VL: Clone,
    VR: Clone,
    L: Cursor<K, VL>,
    R: Cursor<K, VR>,
{
    /// Creates a zip over the two operands.
    pub fn new(left: L, right: R) -> Self {
        Self {
            left,
            right,
            current: None,
            state: CursorState::Uninitialized,
        }
    }

    fn drive(&self) -> Drive {
        match (self.left.is_continuous(), self.right.is_continuous()) {
            (false, false) => Drive::Matched,
            (true, false) => Drive::Right,
            // Both continuous: the first operand drives, arbitrarily but
            // stably.
            (false, true) | (true, true) => Drive::Left,
        }
    }

    fn keys(&self) -> Option<(K, K)> {
        match (self.left.key(), self.right.key()) {
            (Some(l), Some(r)) => Some((l.clone(), r.clone())),
            _ => None,
        }
    }

    fn emit_current(&mut self) -> bool {
        let Some(key) = self.left.key().cloned() else {
            return false;
        };
        let (Some(vl), Some(vr)) = (self.left.value(), self.right.value()) else {
            return false;
        };
        self.current = Some((key, (vl, vr)));
        true
    }

    fn emit_at_driver(&mut self, drive: Drive) -> bool {
        let (key, vl, vr) = match drive {
            Drive::Left => {
                let Some(key) = self.left.key().cloned() else {
                    return false;
                };
                let Some(vl) = self.left.value() else {
                    return false;
                };
                let Some(vr) = self.right.try_get_value(&key) else {
                    return false;
                };
                (key, vl, vr)
            }
            Drive::Right => {
                let Some(key) = self.right.key().cloned() else {
                    return false;
                };
                let Some(vr) = self.right.value() else {
                    return false;
                };
                let Some(vl) = self.left.try_get_value(&key) else {
                    return false;
                };
                (key, vl, vr)
            }
            Drive::Matched => return false,
        };
        self.current = Some((key, (vl, vr)));
        true
    }

    /// Intersection-seek: advance the lagging side until keys agree.
    fn align_forward(&mut self) -> bool {
        let cmp = self.left.comparer();
        loop {
            let Some((lk, rk)) = self.keys() else {
                return false;
            };
            match cmp.compare(&lk, &rk) {
                Ordering::Equal => return self.emit_current(),
                Ordering::Less => {
                    if !self.left.move_at(&rk, Lookup::Ge) {
                        return false;
                    }
                }
                Ordering::Greater => {
                    if !self.right.move_at(&lk, Lookup::Ge) {
                        return false;
                    }
                }
            }
        }
    }

    /// Mirror of `align_forward` for backward movement.
    fn align_backward(&mut self) -> bool {
        let cmp = self.left.comparer();
        loop {
            let Some((lk, rk)) = self.keys() else {
                return false;
            };
            match cmp.compare(&lk, &rk) {
                Ordering::Equal => return self.emit_current(),
                Ordering::Less => {
                    if !self.right.move_at(&lk, Lookup::Le) {
                        return false;
                    }
                }
                Ordering::Greater => {
                    if !self.left.move_at(&rk, Lookup::Le) {
                        return false;
                    }
                }
            }
        }
    }

    /// Runs `step`, restoring both operands when it fails.
    ///
    /// On failure with both sources sealed the end is terminal.
    fn guarded<F>(&mut self, step: F) -> bool
    where
        F: FnOnce(&mut Self) -> bool,
    {
        if matches!(self.state, CursorState::Disposed) {
            return false;
        }
        let saved_left = self.left.clone();
        let saved_right = self.right.clone();
        if step(self) {
            self.state = CursorState::AtElement;
            return true;
        }
        self.left = saved_left;
        self.right = saved_right;
        if self.state == CursorState::AtElement
            && self.left.is_readonly()
            && self.right.is_readonly()
        {
            self.state = CursorState::AfterEnd;
            self.current = None;
        }
        false
    }
}

impl<K, VL, VR, L, R> Clone for Zip<K, VL, VR, L, R>
where
    K: Clone,
    VL: Clone,
    VR: Clone,
    L: Cursor<K, VL>,
    R: Cursor<K, VR>,
{
    fn clone(&self) -> Self {
        Self {
            left: self.left.clone(),
            right: self.right.clone(),
            current: self.current.clone(),
            state: self.state,
        }
    }
}

impl<K, VL, VR, L, R> Cursor<K, (VL, VR)> for Zip<K, VL, VR, L, R>
where
    K: Clone,
    VL: Clone,
    VR: Clone,
    L: Cursor<K, VL>,
    R: Cursor<K, VR>,
{
    type Cmp = L::Cmp;

    fn comparer(&self) -> L::Cmp {
        self.left.comparer()
    }

    fn state(&self) -> CursorState {
        self.state
    }

    fn move_first(&mut self) -> bool {
        let drive = self.drive();
        self.guarded(|zip| match drive {
            Drive::Matched => {
                if !zip.left.move_first() || !zip.right.move_first() {
                    return false;
                }
                zip.align_forward()
            }
            Drive::Left => zip.left.move_first() && zip.emit_at_driver(Drive::Left),
            Drive::Right => zip.right.move_first() && zip.emit_at_driver(Drive::Right),
        })
    }

    fn move_last(&mut self) -> bool {
        let drive = self.drive();
        self.guarded(|zip| match drive {
            Drive::Matched => {
                if !zip.left.move_last() || !zip.right.move_last() {
                    return false;
                }
                zip.align_backward()
            }
            Drive::Left => zip.left.move_last() && zip.emit_at_driver(Drive::Left),
            Drive::Right => zip.right.move_last() && zip.emit_at_driver(Drive::Right),
        })
    }

    fn move_next(&mut self) -> bool {
        if self.state == CursorState::Uninitialized {
            return self.move_first();
        }
        if self.state == CursorState::AfterEnd {
            return false;
        }
        let drive = self.drive();
        self.guarded(|zip| match drive {
            Drive::Matched => {
                if !zip.left.move_next() {
                    return false;
                }
                zip.align_forward()
            }
            Drive::Left => zip.left.move_next() && zip.emit_at_driver(Drive::Left),
            Drive::Right => zip.right.move_next() && zip.emit_at_driver(Drive::Right),
        })
    }

    fn move_previous(&mut self) -> bool {
        if matches!(
            self.state,
            CursorState::Uninitialized | CursorState::AfterEnd
        ) {
            return self.move_last();
        }
        let drive = self.drive();
        self.guarded(|zip| match drive {
            Drive::Matched => {
                if !zip.left.move_previous() {
                    return false;
                }
                zip.align_backward()
            }
            Drive::Left => zip.left.move_previous() && zip.emit_at_driver(Drive::Left),
            Drive::Right => zip.right.move_previous() && zip.emit_at_driver(Drive::Right),
        })
    }

    fn move_at(&mut self, key: &K, direction: Lookup) -> bool {
        let drive = self.drive();
        self.guarded(|zip| match drive {
            Drive::Matched => {
                if !zip.left.move_at(key, direction) || !zip.right.move_at(key, direction) {
                    return false;
                }
                match direction {
                    Lookup::Eq => zip.emit_current(),
                    Lookup::Ge | Lookup::Gt => zip.align_forward(),
                    Lookup::Le | Lookup::Lt => zip.align_backward(),
                }
            }
            Drive::Left => zip.left.move_at(key, direction) && zip.emit_at_driver(Drive::Left),
            Drive::Right => zip.right.move_at(key, direction) && zip.emit_at_driver(Drive::Right),
        })
    }

    fn key(&self) -> Option<&K> {
        self.current.as_ref().map(|(k, _)| k)
    }

    fn value(&self) -> Option<(VL, VR)> {
        self.current.as_ref().map(|(_, v)| v.clone())
    }

    fn try_get_value(&self, key: &K) -> Option<(VL, VR)> {
        let vl = self.left.try_get_value(key)?;
        let vr = self.right.try_get_value(key)?;
        Some((vl, vr))
    }

    fn is_continuous(&self) -> bool {
        self.left.is_continuous() && self.right.is_continuous()
    }

    fn is_indexed(&self) -> bool {
        self.left.is_indexed() || self.right.is_indexed()
    }

    fn is_readonly(&self) -> bool {
        // One side at its end while the other source is still mutable is
        // "not yet", never a terminal end.
        self.left.is_readonly() && self.right.is_readonly()
    }

    fn updated(&self) -> WaitFuture {
        WaitFuture::either(self.left.updated(), self.right.updated())
    }

    fn dispose(&mut self) {
        self.left.dispose();
        self.right.dispose();
        self.state = CursorState::Disposed;
        self.current = None;
    }
}
