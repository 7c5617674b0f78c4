//! Property-based and scenario tests for the columnar frame codec.
//!
//! Verifies lossless round-trips across both backend algorithms, the
//! delta encodings, and the corruption handling of the frame reader.

use proptest::prelude::*;
use seriate::codec::{Algorithm, BufferPool, CodecConfig, FrameCodec, FRAME_HEADER_SIZE};
use seriate::{SeriesError, Timestamp};

fn codec(algorithm: Algorithm) -> FrameCodec {
    FrameCodec::new(CodecConfig::default().with_algorithm(algorithm))
}

fn encode_plain<T: seriate::codec::Element>(codec: &FrameCodec, values: &[T]) -> Vec<u8> {
    let mut frame = vec![0u8; codec.max_frame_len::<T>(values.len())];
    let total = codec.encode(values, &mut frame).unwrap();
    frame.truncate(total);
    frame
}

/// Strategy for float arrays including empties and heavy repetition.
fn f64_values() -> impl Strategy<Value = Vec<f64>> {
    prop_oneof![
        prop::collection::vec(-1_000_000.0f64..1_000_000.0, 0..200),
        // Repeated values stress the shuffle + compressor path.
        (any::<i32>(), 1..200usize)
            .prop_map(|(v, n)| vec![f64::from(v); n]),
    ]
}

fn i64_values() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-1_000_000_000i64..1_000_000_000, 0..200)
}

/// Monotone timestamps with realistic nanosecond spacing.
fn timestamp_values() -> impl Strategy<Value = Vec<Timestamp>> {
    (
        0i64..1_000_000_000_000i64,
        prop::collection::vec(1i64..1_000_000_000, 0..100),
    )
        .prop_map(|(base, deltas)| {
            let mut out = vec![Timestamp::from_nanos(base)];
            let mut current = base;
            for delta in deltas {
                current = current.saturating_add(delta);
                out.push(Timestamp::from_nanos(current));
            }
            out
        })
}

proptest! {
    /// decode(encode(a)) == a for both algorithms.
    #[test]
    fn test_round_trip_f64(values in f64_values()) {
        for algorithm in [Algorithm::Lz4, Algorithm::Zstd] {
            let codec = codec(algorithm);
            let frame = encode_plain(&codec, &values);
            let (decoded, read) = codec.decode::<f64>(&frame).unwrap();
            prop_assert_eq!(&decoded, &values);
            prop_assert_eq!(read, frame.len());
        }
    }

    /// Delta round-trip reconstructs element-wise exactly.
    #[test]
    fn test_round_trip_i64_delta(values in i64_values()) {
        for algorithm in [Algorithm::Lz4, Algorithm::Zstd] {
            let codec = codec(algorithm);
            let mut frame = vec![0u8; codec.max_frame_len::<i64>(values.len())];
            let total = codec.encode_delta(&values, &mut frame).unwrap();
            let (decoded, _) = codec.decode_delta::<i64>(&frame[..total]).unwrap();
            prop_assert_eq!(decoded, values.clone());
        }
    }

    /// Timestamp arrays survive the deltas-from-previous specialization.
    #[test]
    fn test_round_trip_timestamp_delta(values in timestamp_values()) {
        let codec = codec(Algorithm::Lz4);
        let mut frame = vec![0u8; codec.max_frame_len::<Timestamp>(values.len())];
        let total = codec.encode_delta(&values, &mut frame).unwrap();
        let (decoded, _) = codec.decode_delta::<Timestamp>(&frame[..total]).unwrap();
        prop_assert_eq!(decoded, values.clone());
    }

    /// A plain frame decodes identically through the delta entry point.
    #[test]
    fn test_plain_frame_via_delta_decoder(values in i64_values()) {
        let codec = codec(Algorithm::Zstd);
        let frame = encode_plain(&codec, &values);
        let (decoded, _) = codec.decode_delta::<i64>(&frame).unwrap();
        prop_assert_eq!(decoded, values.clone());
    }
}

#[test]
fn test_singleton_round_trip() {
    let codec = codec(Algorithm::Lz4);
    let frame = encode_plain(&codec, &[42.5f64]);
    let (decoded, _) = codec.decode::<f64>(&frame).unwrap();
    assert_eq!(decoded, vec![42.5]);
}

#[test]
fn test_delta_timestamp_scenario() {
    // Ticks [1000, 2000, 3500, 5500] with lz4 and delta on: losslessly
    // decoded, and smaller than headers plus the raw representation
    // because the deltas compress.
    let ticks: Vec<Timestamp> = [1_000, 2_000, 3_500, 5_500]
        .into_iter()
        .map(Timestamp::from_nanos)
        .collect();

    let codec = codec(Algorithm::Lz4);
    let mut frame = vec![0u8; codec.max_frame_len::<Timestamp>(ticks.len())];
    let total = codec.encode_delta(&ticks, &mut frame).unwrap();

    let raw_len = ticks.len() * 8;
    let stored_raw = FRAME_HEADER_SIZE + seriate::codec::block::BLOCK_HEADER_SIZE + raw_len;
    assert!(
        total < stored_raw,
        "deltas failed to compress: {total} >= {stored_raw} bytes"
    );

    let (decoded, read) = codec.decode_delta::<Timestamp>(&frame[..total]).unwrap();
    assert_eq!(decoded, ticks);
    assert_eq!(read, total);
}

#[test]
fn test_empty_frame_scenario() {
    // A length-0 array encodes to exactly the 8-byte header with
    // version/flags byte 0x01 and decodes back to an empty array.
    let codec = codec(Algorithm::Zstd);
    let mut frame = [0u8; FRAME_HEADER_SIZE];
    let total = codec.encode::<f64>(&[], &mut frame).unwrap();
    assert_eq!(total, FRAME_HEADER_SIZE);
    assert_eq!(frame[4], 0x01);

    let (decoded, read) = codec.decode::<f64>(&frame).unwrap();
    assert!(decoded.is_empty());
    assert_eq!(read, FRAME_HEADER_SIZE);
}

#[test]
fn test_corrupt_version_rejected_without_leaks() {
    // A frame stamped with a newer version fails with a version error
    // and every pooled buffer is returned on the failure path.
    let pool = BufferPool::new();
    let codec = FrameCodec::with_pool(
        CodecConfig::default().with_algorithm(Algorithm::Lz4),
        pool.clone(),
    );

    let values: Vec<i64> = (0..256).collect();
    let mut frame = vec![0u8; codec.max_frame_len::<i64>(values.len())];
    let total = codec.encode(&values, &mut frame).unwrap();
    frame.truncate(total);
    frame[4] = (1 << 4) | (frame[4] & 0x0F);

    let err = codec.decode::<i64>(&frame).unwrap_err();
    assert!(matches!(err, SeriesError::UnsupportedVersion { expected: 0, got: 1 }));
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn test_truncated_frame_rejected_without_leaks() {
    let pool = BufferPool::new();
    let codec = FrameCodec::with_pool(CodecConfig::default(), pool.clone());

    let values: Vec<i64> = (0..256).collect();
    let mut frame = vec![0u8; codec.max_frame_len::<i64>(values.len())];
    let total = codec.encode(&values, &mut frame).unwrap();

    let err = codec.decode::<i64>(&frame[..total - 1]).unwrap_err();
    assert!(matches!(err, SeriesError::TruncatedFrame { .. }));
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn test_mangled_payload_rejected() {
    let codec = codec(Algorithm::Zstd);
    let values: Vec<f64> = (0..128).map(|i| i as f64).collect();
    let mut frame = vec![0u8; codec.max_frame_len::<f64>(values.len())];
    let total = codec.encode(&values, &mut frame).unwrap();
    frame.truncate(total);

    // Flip bytes inside the compressed payload.
    for byte in frame.iter_mut().skip(FRAME_HEADER_SIZE + 16).take(8) {
        *byte = !*byte;
    }
    assert!(codec.decode::<f64>(&frame).is_err());
}
