//! Pooled byte buffers for the codec.
//!
//! The frame codec rents scratch and destination buffers here and must
//! give every buffer back on every exit path, including failures.
//! [`PooledBuf`] makes that structural: the buffer returns to its shelf
//! on drop.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Smallest capacity handed out.
const MIN_CAPACITY: usize = 64;

/// Buffers retained per capacity shelf before excess is dropped.
const SHELF_LIMIT: usize = 8;

#[derive(Debug, Default)]
struct PoolInner {
    shelves: Mutex<BTreeMap<usize, Vec<Vec<u8>>>>,
    outstanding: AtomicUsize,
}

/// A shelf of reusable byte buffers, bucketed by power-of-two capacity.
#[derive(Debug, Clone, Default)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rents a buffer of at least `min_len` bytes.
    ///
    /// Capacity is rounded up to a power of two so returned buffers
    /// land back on a small number of shelves.
    pub fn rent(&self, min_len: usize) -> PooledBuf {
        let capacity = min_len.max(MIN_CAPACITY).next_power_of_two();
        let mut buf = {
            let mut shelves = self.inner.shelves.lock().expect("buffer pool poisoned");
            shelves
                .get_mut(&capacity)
                .and_then(|shelf| shelf.pop())
                .unwrap_or_else(|| Vec::with_capacity(capacity))
        };
        buf.clear();
        buf.resize(capacity, 0);
        self.inner.outstanding.fetch_add(1, Ordering::Relaxed);
        PooledBuf {
            buf: Some(buf),
            pool: self.inner.clone(),
        }
    }

    /// Number of rented buffers not yet returned.
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    fn shelved(&self, capacity: usize) -> usize {
        self.inner
            .shelves
            .lock()
            .expect("buffer pool poisoned")
            .get(&capacity)
            .map_or(0, Vec::len)
    }
}

/// A rented buffer that returns itself to the pool on drop.
#[derive(Debug)]
pub struct PooledBuf {
    buf: Option<Vec<u8>>,
    pool: Arc<PoolInner>,
}

impl Deref for PooledBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or(&[])
    }
}

impl DerefMut for PooledBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or(&mut [])
    }
}

impl Drop for PooledBuf {
    fn drop(&mut self) {
        let Some(buf) = self.buf.take() else {
            return;
        };
        self.pool.outstanding.fetch_sub(1, Ordering::Relaxed);
        let capacity = buf.capacity();
        let mut shelves = self.pool.shelves.lock().expect("buffer pool poisoned");
        let shelf = shelves.entry(capacity).or_default();
        if shelf.len() < SHELF_LIMIT {
            shelf.push(buf);
        }
    }
}
