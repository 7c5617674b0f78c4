//! Block compressor boundary.
//!
//! The frame codec consumes a byte-shuffle-aware block compressor
//! through the narrow contract in this module: `compress_ctx`,
//! `decompress_ctx`, and the `cbuffer_sizes` probe. Sizes are returned
//! as signed integers with negative values meaning failure, so the
//! caller can map "did not fit" to its own capacity error.
//!
//! Every block starts with a 16-byte header:
//!
//! ```text
//! Offset  Size    Field
//! ------  ----    -----
//! 0x00    1       version (u8)
//! 0x01    1       flags: bit0 shuffle, bit1 memcpy, bits 4..8 codec id
//! 0x02    1       typesize (u8)
//! 0x03    1       reserved
//! 0x04    4       nbytes (u32 LE, uncompressed length)
//! 0x08    4       blocksize (u32 LE)
//! 0x0C    4       cbytes (u32 LE, total block length incl. header)
//! ```
//!
//! When the backend codec fails to shrink the input, the payload is
//! stored verbatim with the memcpy flag, so a block never grows past
//! `input + 16` bytes.

use tracing::debug;

/// Block header size in bytes.
pub const BLOCK_HEADER_SIZE: usize = 16;

/// Current block format version.
pub const BLOCK_VERSION: u8 = 1;

/// Flag bit: payload bytes were shuffled by typesize before compression.
const FLAG_SHUFFLE: u8 = 0b0000_0001;
/// Flag bit: payload is stored verbatim, no codec applied.
const FLAG_MEMCPY: u8 = 0b0000_0010;
/// Codec id shift within the flags byte.
const CODEC_SHIFT: u8 = 4;

/// Backend compression algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// LZ4 block format: fastest, moderate ratio.
    #[default]
    Lz4,
    /// Zstandard: slower, better ratio.
    Zstd,
}

impl Algorithm {
    /// Resolves an algorithm name; empty and `"default"` select the
    /// default.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lz4" => Some(Self::Lz4),
            "zstd" => Some(Self::Zstd),
            "" | "default" => Some(Self::default()),
            _ => None,
        }
    }

    /// The canonical algorithm name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
        }
    }

    fn id(self) -> u8 {
        match self {
            Self::Lz4 => 1,
            Self::Zstd => 2,
        }
    }

    fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Lz4),
            2 => Some(Self::Zstd),
            _ => None,
        }
    }
}

/// Parameters for one `compress_ctx` call.
#[derive(Debug, Clone)]
pub struct CompressContext {
    /// Compression level passed to the backend codec.
    pub level: i32,
    /// Whether to byte-shuffle the input by `typesize` first.
    pub shuffle: bool,
    /// Element size in bytes; shuffling requires the input length to be
    /// a multiple of it.
    pub typesize: usize,
    /// Backend algorithm.
    pub algorithm: Algorithm,
    /// Logical block size recorded in the header; `0` means the whole
    /// input is one block.
    pub block_size: usize,
    /// Worker hint recorded for the backend; this implementation
    /// compresses on the calling thread.
    pub nthreads: usize,
}

impl Default for CompressContext {
    fn default() -> Self {
        Self {
            level: 9,
            shuffle: true,
            typesize: 1,
            algorithm: Algorithm::default(),
            block_size: 0,
            nthreads: host_parallelism(),
        }
    }
}

/// Number of workers the host advertises.
pub fn host_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Worst-case block length for an input of `src_len` bytes.
pub fn max_compressed_len(src_len: usize) -> usize {
    BLOCK_HEADER_SIZE + src_len
}

/// Transposes `src` so that byte `j` of every element lands in plane
/// `j`. Same-significance bytes of similar values then sit next to each
/// other, which is what the backend codec exploits.
fn shuffle_bytes(typesize: usize, src: &[u8], dst: &mut [u8]) {
    let count = src.len() / typesize;
    for i in 0..count {
        for j in 0..typesize {
            dst[j * count + i] = src[i * typesize + j];
        }
    }
}

fn unshuffle_bytes(typesize: usize, src: &[u8], dst: &mut [u8]) {
    let count = src.len() / typesize;
    for i in 0..count {
        for j in 0..typesize {
            dst[i * typesize + j] = src[j * count + i];
        }
    }
}

/// Compresses `src` into `dst`, returning the total block length.
///
/// Returns a negative value when `dst` is too small or the backend
/// rejects the input; `dst` contents are unspecified in that case.
pub fn compress_ctx(ctx: &CompressContext, src: &[u8], dst: &mut [u8]) -> isize {
    let nbytes = src.len();
    if nbytes > u32::MAX as usize || dst.len() < BLOCK_HEADER_SIZE {
        return -1;
    }

    let shuffled = ctx.shuffle && ctx.typesize > 1 && nbytes > 0 && nbytes % ctx.typesize == 0;
    let mut scratch = Vec::new();
    let input: &[u8] = if shuffled {
        scratch.resize(nbytes, 0);
        shuffle_bytes(ctx.typesize, src, &mut scratch);
        &scratch
    } else {
        src
    };

    let encoded = match ctx.algorithm {
        Algorithm::Lz4 => Some(lz4_flex::block::compress(input)),
        Algorithm::Zstd => match zstd::bulk::compress(input, ctx.level) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                debug!(error = %err, "zstd compression failed, storing verbatim");
                None
            }
        },
    };

    // Memcpy fallback keeps the `input + header` worst case.
    let (payload, memcpy) = match &encoded {
        Some(bytes) if bytes.len() < nbytes => (bytes.as_slice(), false),
        _ => (input, true),
    };

    let cbytes = BLOCK_HEADER_SIZE + payload.len();
    if dst.len() < cbytes || cbytes > u32::MAX as usize {
        return -1;
    }

    let mut flags = ctx.algorithm.id() << CODEC_SHIFT;
    if shuffled {
        flags |= FLAG_SHUFFLE;
    }
    if memcpy {
        flags |= FLAG_MEMCPY;
    }
    let block_size = if ctx.block_size == 0 {
        nbytes
    } else {
        ctx.block_size
    };

    dst[0] = BLOCK_VERSION;
    dst[1] = flags;
    dst[2] = ctx.typesize.min(u8::MAX as usize) as u8;
    dst[3] = 0;
    dst[4..8].copy_from_slice(&(nbytes as u32).to_le_bytes());
    dst[8..12].copy_from_slice(&(block_size as u32).to_le_bytes());
    dst[12..16].copy_from_slice(&(cbytes as u32).to_le_bytes());
    dst[BLOCK_HEADER_SIZE..cbytes].copy_from_slice(payload);

    cbytes as isize
}

/// Probes a block header for `(nbytes, cbytes, blocksize)`.
pub fn cbuffer_sizes(src: &[u8]) -> Option<(usize, usize, usize)> {
    if src.len() < BLOCK_HEADER_SIZE || src[0] != BLOCK_VERSION {
        return None;
    }
    let nbytes = u32::from_le_bytes(src[4..8].try_into().expect("header slice")) as usize;
    let block_size = u32::from_le_bytes(src[8..12].try_into().expect("header slice")) as usize;
    let cbytes = u32::from_le_bytes(src[12..16].try_into().expect("header slice")) as usize;
    Some((nbytes, cbytes, block_size))
}

/// Decompresses a block into `dst`, returning the uncompressed length.
///
/// Returns a negative value on a malformed header, a backend failure,
/// or when `dst` is smaller than the declared `nbytes`. The `nthreads`
/// hint is accepted for parity with `compress_ctx`.
pub fn decompress_ctx(src: &[u8], dst: &mut [u8], _nthreads: usize) -> isize {
    let Some((nbytes, cbytes, _block_size)) = cbuffer_sizes(src) else {
        return -1;
    };
    if src.len() < cbytes || dst.len() < nbytes {
        return -1;
    }
    let flags = src[1];
    let typesize = src[2] as usize;
    let payload = &src[BLOCK_HEADER_SIZE..cbytes];

    let raw: Vec<u8>;
    let plain: &[u8] = if flags & FLAG_MEMCPY != 0 {
        if payload.len() != nbytes {
            return -1;
        }
        payload
    } else {
        let decoded = match Algorithm::from_id(flags >> CODEC_SHIFT) {
            Some(Algorithm::Lz4) => lz4_flex::block::decompress(payload, nbytes)
                .map_err(|err| debug!(error = %err, "lz4 decompression failed"))
                .ok(),
            Some(Algorithm::Zstd) => zstd::bulk::decompress(payload, nbytes)
                .map_err(|err| debug!(error = %err, "zstd decompression failed"))
                .ok(),
            None => None,
        };
        match decoded {
            Some(bytes) if bytes.len() == nbytes => {
                raw = bytes;
                &raw
            }
            _ => return -1,
        }
    };

    if flags & FLAG_SHUFFLE != 0 && typesize > 1 && nbytes % typesize == 0 {
        unshuffle_bytes(typesize, plain, &mut dst[..nbytes]);
    } else {
        dst[..nbytes].copy_from_slice(plain);
    }
    nbytes as isize
}
