//! Columnar frame codec.
//!
//! Serializes a contiguous run of fixed-size values into a
//! self-describing compressed frame:
//!
//! ```text
//! Offset  Size    Field
//! ------  ----    -----
//! 0x00    4       total frame length (i32 LE)
//! 0x04    1       packed version:4 | flags:4
//! 0x05    3       reserved (zero)
//! 0x08    N       block compressor payload (16-byte block header + data)
//! ```
//!
//! Flag bit 0 marks the payload compressed (always set), bit 1 marks
//! delta pre-processing. Delta-capable element types are encoded as
//! differences before compression: most types against the first element,
//! [`Timestamp`](crate::time::Timestamp) against the previous one. The
//! two baselines are deliberately distinct and must not be unified
//! without re-measuring compression.
//!
//! # Example
//!
//! ```rust,ignore
//! use seriate::codec::{CodecConfig, FrameCodec};
//!
//! let codec = FrameCodec::new(CodecConfig::default());
//! let values = vec![1i64, 2, 3, 5, 8];
//! let mut frame = vec![0u8; codec.max_frame_len::<i64>(values.len())];
//! let total = codec.encode_delta(&values, &mut frame)?;
//! let (decoded, read) = codec.decode_delta::<i64>(&frame[..total])?;
//! assert_eq!(decoded, values);
//! assert_eq!(read, total);
//! ```

pub mod block;
mod element;
pub mod pool;

pub use block::{cbuffer_sizes, compress_ctx, decompress_ctx, Algorithm, CompressContext};
pub use element::{DeltaElement, DeltaPolicy, Element};
pub use pool::{BufferPool, PooledBuf};

use tracing::debug;

use crate::error::{Result, SeriesError};
use block::{host_parallelism, BLOCK_HEADER_SIZE};

/// Frame header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Current frame format version (high nibble of byte 4).
pub const FRAME_VERSION: u8 = 0;

/// Flag bit 0: payload went through the block compressor.
pub const FLAG_COMPRESSED: u8 = 0b0001;

/// Flag bit 1: values were delta-encoded before compression.
pub const FLAG_DELTA: u8 = 0b0010;

/// Frame length at or below which the payload holds no elements.
const EMPTY_FRAME_MAX: usize = FRAME_HEADER_SIZE + BLOCK_HEADER_SIZE;

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Backend block compression algorithm.
    pub algorithm: Algorithm,
    /// Backend compression level.
    pub level: i32,
    /// Whether to byte-shuffle element bytes before compression.
    pub shuffle: bool,
    /// Logical block size hint; `0` selects the backend default.
    pub block_size: usize,
    /// Worker hint forwarded to the backend.
    pub nthreads: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            level: 9,
            shuffle: true,
            block_size: 0,
            nthreads: host_parallelism(),
        }
    }
}

impl CodecConfig {
    /// Selects the backend algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Selects the backend compression level.
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Enables or disables the byte shuffle.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }
}

/// Writer/reader for encoded array frames.
///
/// Scratch buffers are rented from the attached pool and return on
/// every exit path, including failures.
#[derive(Debug, Clone, Default)]
pub struct FrameCodec {
    config: CodecConfig,
    pool: BufferPool,
}

impl FrameCodec {
    /// Creates a codec with its own buffer pool.
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config,
            pool: BufferPool::new(),
        }
    }

    /// Creates a codec sharing an existing pool.
    pub fn with_pool(config: CodecConfig, pool: BufferPool) -> Self {
        Self { config, pool }
    }

    /// Returns the codec configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Upper bound on the frame length for `count` elements of `T`.
    pub fn max_frame_len<T: Element>(&self, count: usize) -> usize {
        FRAME_HEADER_SIZE + BLOCK_HEADER_SIZE + self.config.nthreads * 4 + T::SIZE * count
    }

    fn compress_context<T: Element>(&self) -> CompressContext {
        CompressContext {
            level: self.config.level,
            shuffle: self.config.shuffle,
            typesize: T::SIZE,
            algorithm: self.config.algorithm,
            block_size: self.config.block_size,
            nthreads: self.config.nthreads,
        }
    }

    /// Encodes `values` as a plain (non-delta) frame into `dst`.
    ///
    /// Returns the total frame length.
    pub fn encode<T: Element>(&self, values: &[T], dst: &mut [u8]) -> Result<usize> {
        self.encode_impl(values, dst, None::<fn(&[T], &mut [u8])>)
    }

    /// Encodes `values` with delta pre-processing into `dst`.
    ///
    /// The first element is stored verbatim; later elements store the
    /// difference dictated by [`DeltaElement::POLICY`].
    pub fn encode_delta<T: DeltaElement>(&self, values: &[T], dst: &mut [u8]) -> Result<usize> {
        self.encode_impl(values, dst, Some(delta_transform::<T>))
    }

    fn encode_impl<T, F>(&self, values: &[T], dst: &mut [u8], delta: Option<F>) -> Result<usize>
    where
        T: Element,
        F: Fn(&[T], &mut [u8]),
    {
        if dst.len() < FRAME_HEADER_SIZE {
            return Err(SeriesError::InsufficientCapacity {
                needed: FRAME_HEADER_SIZE,
                capacity: dst.len(),
            });
        }

        let mut flags = FLAG_COMPRESSED;
        if delta.is_some() {
            flags |= FLAG_DELTA;
        }

        let total = if values.is_empty() {
            FRAME_HEADER_SIZE
        } else {
            let nbytes = T::SIZE * values.len();
            let mut scratch = self.pool.rent(nbytes);
            match &delta {
                Some(transform) => transform(values, &mut scratch[..nbytes]),
                None => {
                    for (i, value) in values.iter().enumerate() {
                        value.write_to(&mut scratch[i * T::SIZE..]);
                    }
                }
            }

            let ctx = self.compress_context::<T>();
            let compressed =
                compress_ctx(&ctx, &scratch[..nbytes], &mut dst[FRAME_HEADER_SIZE..]);
            if compressed <= 0 {
                return Err(SeriesError::InsufficientCapacity {
                    needed: self.max_frame_len::<T>(values.len()),
                    capacity: dst.len(),
                });
            }
            FRAME_HEADER_SIZE + compressed as usize
        };

        dst[0..4].copy_from_slice(&(total as i32).to_le_bytes());
        dst[4] = (FRAME_VERSION << 4) | flags;
        dst[5..8].fill(0);
        Ok(total)
    }

    /// Decodes a plain frame of `T` from `src`.
    ///
    /// Returns the elements and the total frame length consumed. A
    /// frame carrying the delta flag is rejected: `T` declares no delta
    /// capability here.
    pub fn decode<T: Element>(&self, src: &[u8]) -> Result<(Vec<T>, usize)> {
        let (payload, flags, total) = self.read_header(src)?;
        if flags & FLAG_DELTA != 0 {
            debug!(flags, "delta frame rejected for a non-delta element type");
            return Err(SeriesError::InvalidFlags { flags });
        }
        let Some(payload) = payload else {
            return Ok((Vec::new(), total));
        };
        let values = self.decode_payload::<T>(payload)?;
        Ok((values, total))
    }

    /// Decodes a frame of a delta-capable `T`, reversing delta
    /// pre-processing when the frame carries the delta flag.
    pub fn decode_delta<T: DeltaElement>(&self, src: &[u8]) -> Result<(Vec<T>, usize)> {
        let (payload, flags, total) = self.read_header(src)?;
        let Some(payload) = payload else {
            return Ok((Vec::new(), total));
        };
        let mut values = self.decode_payload::<T>(payload)?;
        if flags & FLAG_DELTA != 0 {
            delta_restore(&mut values);
        }
        Ok((values, total))
    }

    /// Validates the 8-byte header. Returns the block payload (`None`
    /// for an empty frame), the flag nibble, and the total length.
    fn read_header<'a>(&self, src: &'a [u8]) -> Result<(Option<&'a [u8]>, u8, usize)> {
        if src.len() < FRAME_HEADER_SIZE {
            return Err(SeriesError::TruncatedFrame {
                got: src.len(),
                min: FRAME_HEADER_SIZE,
            });
        }
        let total = i32::from_le_bytes(src[0..4].try_into().expect("header slice"));
        if total < FRAME_HEADER_SIZE as i32 {
            return Err(SeriesError::TruncatedFrame {
                got: total.max(0) as usize,
                min: FRAME_HEADER_SIZE,
            });
        }
        let total = total as usize;
        if src.len() < total {
            return Err(SeriesError::TruncatedFrame {
                got: src.len(),
                min: total,
            });
        }

        let version = src[4] >> 4;
        let flags = src[4] & 0x0F;
        if version != FRAME_VERSION {
            debug!(version, "frame version rejected");
            return Err(SeriesError::UnsupportedVersion {
                expected: FRAME_VERSION,
                got: version,
            });
        }
        if flags & FLAG_COMPRESSED == 0 {
            return Err(SeriesError::InvalidFlags { flags });
        }

        if total <= EMPTY_FRAME_MAX {
            return Ok((None, flags, total));
        }
        Ok((Some(&src[FRAME_HEADER_SIZE..total]), flags, total))
    }

    fn decode_payload<T: Element>(&self, payload: &[u8]) -> Result<Vec<T>> {
        let (nbytes, cbytes, _block_size) = cbuffer_sizes(payload).ok_or_else(|| {
            SeriesError::DecompressionError("unreadable block header".to_string())
        })?;
        if cbytes != payload.len() {
            return Err(SeriesError::TruncatedFrame {
                got: payload.len(),
                min: cbytes,
            });
        }
        if nbytes % T::SIZE != 0 {
            return Err(SeriesError::DecompressionError(format!(
                "payload of {nbytes} bytes is not a whole number of {}-byte elements",
                T::SIZE
            )));
        }

        let mut scratch = self.pool.rent(nbytes);
        let produced = decompress_ctx(payload, &mut scratch, self.config.nthreads);
        if produced != nbytes as isize {
            return Err(SeriesError::DecompressionError(format!(
                "block decompressor returned {produced}, expected {nbytes}"
            )));
        }

        let count = nbytes / T::SIZE;
        let mut values = Vec::with_capacity(count);
        for i in 0..count {
            values.push(T::read_from(&scratch[i * T::SIZE..]));
        }
        Ok(values)
    }
}

/// Applies the element type's delta policy, writing transformed bytes.
fn delta_transform<T: DeltaElement>(values: &[T], dst: &mut [u8]) {
    let first = values[0];
    first.write_to(dst);
    match T::POLICY {
        DeltaPolicy::FromFirst => {
            for (i, value) in values.iter().enumerate().skip(1) {
                T::delta(first, *value).write_to(&mut dst[i * T::SIZE..]);
            }
        }
        DeltaPolicy::FromPrevious => {
            for (i, pair) in values.windows(2).enumerate() {
                T::delta(pair[0], pair[1]).write_to(&mut dst[(i + 1) * T::SIZE..]);
            }
        }
    }
}

/// Reverses [`delta_transform`] in place.
fn delta_restore<T: DeltaElement>(values: &mut [T]) {
    if values.is_empty() {
        return;
    }
    match T::POLICY {
        DeltaPolicy::FromFirst => {
            let first = values[0];
            for value in values.iter_mut().skip(1) {
                *value = T::add_delta(first, *value);
            }
        }
        DeltaPolicy::FromPrevious => {
            for i in 1..values.len() {
                values[i] = T::add_delta(values[i - 1], values[i]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Timestamp;

    fn codec(algorithm: Algorithm) -> FrameCodec {
        FrameCodec::new(CodecConfig::default().with_algorithm(algorithm))
    }

    #[test]
    fn test_empty_frame_layout() {
        let codec = codec(Algorithm::Lz4);
        let mut frame = [0u8; 16];
        let total = codec.encode::<i64>(&[], &mut frame).unwrap();
        assert_eq!(total, 8);
        assert_eq!(frame[4], 0x01);
        assert_eq!(&frame[5..8], &[0, 0, 0]);

        let (decoded, read) = codec.decode::<i64>(&frame[..total]).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(read, 8);
    }

    #[test]
    fn test_round_trip_plain() {
        for algorithm in [Algorithm::Lz4, Algorithm::Zstd] {
            let codec = codec(algorithm);
            let values: Vec<f64> = (0..1000).map(|i| (i as f64).sin()).collect();
            let mut frame = vec![0u8; codec.max_frame_len::<f64>(values.len())];
            let total = codec.encode(&values, &mut frame).unwrap();
            let (decoded, read) = codec.decode::<f64>(&frame[..total]).unwrap();
            assert_eq!(decoded, values);
            assert_eq!(read, total);
        }
    }

    #[test]
    fn test_round_trip_delta_from_first() {
        let codec = codec(Algorithm::Zstd);
        let values: Vec<i64> = (0..500).map(|i| 1_000 + (i % 17)).collect();
        let mut frame = vec![0u8; codec.max_frame_len::<i64>(values.len())];
        let total = codec.encode_delta(&values, &mut frame).unwrap();
        assert_ne!(frame[4] & FLAG_DELTA, 0);
        let (decoded, read) = codec.decode_delta::<i64>(&frame[..total]).unwrap();
        assert_eq!(decoded, values);
        assert_eq!(read, total);
    }

    #[test]
    fn test_timestamp_delta_uses_previous_baseline() {
        let values = vec![
            Timestamp::from_nanos(1_000),
            Timestamp::from_nanos(2_000),
            Timestamp::from_nanos(3_500),
            Timestamp::from_nanos(5_500),
        ];
        let mut raw = vec![0u8; values.len() * 8];
        delta_transform(&values, &mut raw);
        let stored: Vec<i64> = raw
            .chunks_exact(8)
            .map(|chunk| i64::read_from(chunk))
            .collect();
        // First verbatim, then successive differences.
        assert_eq!(stored, vec![1_000, 1_000, 1_500, 2_000]);

        let mut restored: Vec<Timestamp> = raw
            .chunks_exact(8)
            .map(|chunk| Timestamp::read_from(chunk))
            .collect();
        delta_restore(&mut restored);
        assert_eq!(restored, values);
    }

    #[test]
    fn test_generic_delta_uses_first_baseline() {
        let values = vec![100i64, 103, 99, 100];
        let mut raw = vec![0u8; values.len() * 8];
        delta_transform(&values, &mut raw);
        let stored: Vec<i64> = raw
            .chunks_exact(8)
            .map(|chunk| i64::read_from(chunk))
            .collect();
        assert_eq!(stored, vec![100, 3, -1, 0]);
    }

    #[test]
    fn test_decode_rejects_delta_flag_without_capability() {
        let codec = codec(Algorithm::Lz4);
        let values: Vec<i64> = (0..64).collect();
        let mut frame = vec![0u8; codec.max_frame_len::<i64>(values.len())];
        let total = codec.encode_delta(&values, &mut frame).unwrap();
        // `decode` is the entry point for types without a delta
        // capability and must reject the delta flag.
        let err = codec.decode::<i64>(&frame[..total]).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidFlags { .. }));
    }

    #[test]
    fn test_decode_rejects_wrong_version() {
        let codec = codec(Algorithm::Lz4);
        let values: Vec<i64> = (0..64).collect();
        let mut frame = vec![0u8; codec.max_frame_len::<i64>(values.len())];
        let total = codec.encode(&values, &mut frame).unwrap();
        frame[4] = ((FRAME_VERSION + 1) << 4) | (frame[4] & 0x0F);
        let err = codec.decode::<i64>(&frame[..total]).unwrap_err();
        assert!(matches!(err, SeriesError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_encode_rejects_tiny_destination() {
        let codec = codec(Algorithm::Lz4);
        let values: Vec<i64> = (0..64).collect();
        let mut tiny = [0u8; 12];
        let err = codec.encode(&values, &mut tiny).unwrap_err();
        assert!(matches!(err, SeriesError::InsufficientCapacity { .. }));
    }

    #[test]
    fn test_byte_frame_nests_inside_byte_frame() {
        // The non-primitive path recurses with T = u8; a frame must
        // survive being treated as payload for another frame.
        let codec = codec(Algorithm::Zstd);
        let values: Vec<i64> = (0..128).map(|i| i * 3).collect();
        let mut inner = vec![0u8; codec.max_frame_len::<i64>(values.len())];
        let inner_total = codec.encode(&values, &mut inner).unwrap();

        let mut outer = vec![0u8; codec.max_frame_len::<u8>(inner_total)];
        let outer_total = codec.encode(&inner[..inner_total], &mut outer).unwrap();

        let (inner_again, _) = codec.decode::<u8>(&outer[..outer_total]).unwrap();
        assert_eq!(&inner_again, &inner[..inner_total]);
        let (decoded, _) = codec.decode::<i64>(&inner_again).unwrap();
        assert_eq!(decoded, values);
    }
}
