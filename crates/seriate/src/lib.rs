//! Seriate - ordered time-series cursors and a columnar codec
//!
//! This crate provides the core primitives for working with live ordered
//! series: sequences keyed by a totally-ordered key (commonly a
//! timestamp) with associated values.
//!
//! # Components
//!
//! - [`LiveSeries`]: append-friendly in-memory ordered series
//! - [`Cursor`] and its combinators: composable, allocation-free
//!   pipelines over one or more live series
//! - [`ManualGate`] / [`AutoSignal`]: async update notification that
//!   lets cursors block until a source advances
//! - [`FrameCodec`]: framed columnar encoding with delta pre-processing
//!   and byte-shuffled block compression
//!
//! # Example
//!
//! ```rust,ignore
//! use seriate::cursor::{Cursor, CursorExt};
//! use seriate::series::{LiveSeries, Series};
//!
//! let bids: LiveSeries<i64, f64> = LiveSeries::new();
//! let asks: LiveSeries<i64, f64> = LiveSeries::new();
//!
//! // Mid-price pipeline over the two live series.
//! let mut mid = bids.cursor().zip(asks.cursor()).map(|_, (b, a)| (b + a) / 2.0);
//!
//! bids.insert(1, 99.5);
//! asks.insert(1, 100.5);
//! assert!(mid.move_next());
//! assert_eq!(mid.value(), Some(100.0));
//!
//! // Async consumers wait for appends instead of polling.
//! // mid.next_async(cancel).await
//! ```

#![deny(missing_docs)]

pub mod codec;
pub mod cursor;
pub mod error;
pub mod gate;
pub mod order;
pub mod series;
pub mod time;

pub use codec::{Algorithm, CodecConfig, FrameCodec};
pub use cursor::{Cursor, CursorExt, CursorState, Lookup};
pub use error::{Result, SeriesError};
pub use gate::{AutoSignal, CancelToken, ManualGate, WaitFuture};
pub use order::{KeyComparer, NaturalOrder};
pub use series::{LiveSeries, Pair, Series};
pub use time::Timestamp;
