//! Error and Result types for Seriate operations.

use thiserror::Error;

/// A convenience `Result` type for Seriate operations.
pub type Result<T> = std::result::Result<T, SeriesError>;

/// The error type for cursor and codec operations.
///
/// Cursor movement reports "no element" through boolean returns, never
/// through this type. Errors are reserved for invariant violations and
/// external failures (compressor, cancellation).
#[derive(Debug, Error)]
pub enum SeriesError {
    /// Operation on a cursor or buffer after dispose.
    #[error("Handle used after dispose")]
    Disposed,

    /// Destination buffer too small to hold the encoded output.
    #[error("Insufficient capacity: need at least {needed} bytes, have {capacity}")]
    InsufficientCapacity {
        /// Minimum number of bytes the operation required.
        needed: usize,
        /// Capacity of the buffer that was supplied.
        capacity: usize,
    },

    /// Unsupported frame format version.
    #[error("Unsupported frame version: expected {expected}, got {got}")]
    UnsupportedVersion {
        /// Version the reader supports.
        expected: u8,
        /// Version found in the frame.
        got: u8,
    },

    /// Frame flags are inconsistent with the requested element type.
    #[error("Invalid frame flags: {flags:#06b}")]
    InvalidFlags {
        /// Raw flag nibble from the frame header.
        flags: u8,
    },

    /// Frame shorter than its own header or declared length.
    #[error("Truncated frame: got {got} bytes, need at least {min}")]
    TruncatedFrame {
        /// Bytes available.
        got: usize,
        /// Minimum bytes required.
        min: usize,
    },

    /// The block compressor rejected the input or reported a negative size.
    #[error("Compression error: {0}")]
    CompressionError(String),

    /// The block decompressor rejected the payload.
    #[error("Decompression error: {0}")]
    DecompressionError(String),

    /// An async wait observed its cancellation token.
    #[error("Operation cancelled")]
    Cancelled,
}
