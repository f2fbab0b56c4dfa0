use std::fmt;
use std::str::FromStr;

use crate::error::CompressError;

// ── Algorithm ids ──────────────────────────────────────────────────────────

pub const ALGORITHM_NONE: i32 = 0;
pub const ALGORITHM_DEFLATE: i32 = 1;
pub const ALGORITHM_GZIP: i32 = 2;
pub const ALGORITHM_SNAPPY: i32 = 3;
pub const ALGORITHM_ZSTD: i32 = 4;
pub const ALGORITHM_LZ4: i32 = 5;

/// One past the highest valid id. Any raw id `>= ALGORITHM_COUNT` (or
/// negative) is rejected with [`CompressError::InvalidAlgorithm`].
pub const ALGORITHM_COUNT: i32 = 6;

/// Message compression algorithm, as negotiated upstream by the two peers.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Identity encoding: payload is sent as-is.
    None = ALGORITHM_NONE,
    /// zlib-wrapped DEFLATE (RFC 1950), the RPC "deflate" content-coding.
    Deflate = ALGORITHM_DEFLATE,
    /// DEFLATE with gzip framing (RFC 1952).
    Gzip = ALGORITHM_GZIP,
    /// Snappy raw block format.
    Snappy = ALGORITHM_SNAPPY,
    /// Zstandard frame.
    Zstd = ALGORITHM_ZSTD,
    /// LZ4 block with a little-endian u32 size prefix.
    Lz4 = ALGORITHM_LZ4,
}

impl Algorithm {
    pub const ALL: [Algorithm; ALGORITHM_COUNT as usize] = [
        Algorithm::None,
        Algorithm::Deflate,
        Algorithm::Gzip,
        Algorithm::Snappy,
        Algorithm::Zstd,
        Algorithm::Lz4,
    ];

    /// Validate a raw id received from the framing layer.
    pub fn from_raw(raw: i32) -> Result<Self, CompressError> {
        match raw {
            ALGORITHM_NONE => Ok(Algorithm::None),
            ALGORITHM_DEFLATE => Ok(Algorithm::Deflate),
            ALGORITHM_GZIP => Ok(Algorithm::Gzip),
            ALGORITHM_SNAPPY => Ok(Algorithm::Snappy),
            ALGORITHM_ZSTD => Ok(Algorithm::Zstd),
            ALGORITHM_LZ4 => Ok(Algorithm::Lz4),
            _ => Err(CompressError::InvalidAlgorithm { raw }),
        }
    }

    #[inline]
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Encoding name as it appears on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::None => "identity",
            Algorithm::Deflate => "deflate",
            Algorithm::Gzip => "gzip",
            Algorithm::Snappy => "snappy",
            Algorithm::Zstd => "zstd",
            Algorithm::Lz4 => "lz4",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i32> for Algorithm {
    type Error = CompressError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Algorithm::from_raw(raw)
    }
}

impl FromStr for Algorithm {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "identity" | "none" => Ok(Algorithm::None),
            "deflate" => Ok(Algorithm::Deflate),
            "gzip" => Ok(Algorithm::Gzip),
            "snappy" => Ok(Algorithm::Snappy),
            "zstd" => Ok(Algorithm::Zstd),
            "lz4" => Ok(Algorithm::Lz4),
            _ => Err(CompressError::UnknownCompressor { name: s.to_string() }),
        }
    }
}
