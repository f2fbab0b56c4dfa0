//! Algorithm dispatch and the never-inflate policy.
//!
//! Compression is total: the caller always gets a decodable payload, either
//! compressed with the requested algorithm or a verbatim copy of the input,
//! and learns which from the returned flag. Decompression failures are always
//! surfaced and never leave partial output behind.

use msgz_core::{drive, Algorithm, ChunkedBuffer, CompressError, StreamCodec, DEFAULT_CHUNK_SIZE};

use crate::block::{BlockEngine, Lz4Compress, Lz4Decompress, SnappyCompress, SnappyDecompress};
use crate::zlib::{ZlibDecoder, ZlibEncoder, ZlibFormat};
use crate::zstd_engine::{ZstdDecoder, ZstdEncoder, DEFAULT_ZSTD_LEVEL};

/// Default DEFLATE level (zlib's `Z_DEFAULT_COMPRESSION`).
pub const DEFAULT_DEFLATE_LEVEL: u32 = 6;

/// Tunables shared by every call made through one [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
    /// Capacity of each output range.
    pub chunk_size: usize,
    /// DEFLATE level for deflate and gzip (0-9).
    pub deflate_level: u32,
    pub zstd_level: i32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            deflate_level: DEFAULT_DEFLATE_LEVEL,
            zstd_level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

impl CompressOptions {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_deflate_level(mut self, level: u32) -> Self {
        self.deflate_level = level.min(9);
        self
    }

    pub fn with_zstd_level(mut self, level: i32) -> Self {
        self.zstd_level = level;
        self
    }
}

/// Selects a codec for an algorithm and applies the fallback policy.
///
/// Holds no per-call state, so one dispatcher can serve any number of
/// threads at once.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    options: CompressOptions,
}

impl Dispatcher {
    pub fn new(options: CompressOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompressOptions {
        &self.options
    }

    fn encoder(&self, algorithm: Algorithm) -> Result<Option<Box<dyn StreamCodec>>, CompressError> {
        let codec: Box<dyn StreamCodec> = match algorithm {
            Algorithm::None => return Ok(None),
            Algorithm::Deflate => Box::new(ZlibEncoder::new(ZlibFormat::Zlib, self.options.deflate_level)),
            Algorithm::Gzip => Box::new(ZlibEncoder::new(ZlibFormat::Gzip, self.options.deflate_level)),
            Algorithm::Snappy => Box::new(BlockEngine::new(SnappyCompress::default())),
            Algorithm::Zstd => Box::new(ZstdEncoder::new(self.options.zstd_level)?),
            Algorithm::Lz4 => Box::new(BlockEngine::new(Lz4Compress)),
        };
        Ok(Some(codec))
    }

    fn decoder(&self, algorithm: Algorithm) -> Result<Option<Box<dyn StreamCodec>>, CompressError> {
        let codec: Box<dyn StreamCodec> = match algorithm {
            Algorithm::None => return Ok(None),
            Algorithm::Deflate => Box::new(ZlibDecoder::new(ZlibFormat::Zlib)),
            Algorithm::Gzip => Box::new(ZlibDecoder::new(ZlibFormat::Gzip)),
            Algorithm::Snappy => Box::new(BlockEngine::new(SnappyDecompress::default())),
            Algorithm::Zstd => Box::new(ZstdDecoder::new()?),
            Algorithm::Lz4 => Box::new(BlockEngine::new(Lz4Decompress)),
        };
        Ok(Some(codec))
    }

    /// Compress without the copy fallback.
    ///
    /// On success `output` holds the compressed payload, strictly shorter
    /// than `input`. On error `output` is unchanged: `Codec` means the engine
    /// failed, `SizeRegression` means it worked but did not shrink the
    /// payload. `Algorithm::None` always reports `SizeRegression`.
    pub fn try_compress(
        &self,
        algorithm: Algorithm,
        input: &ChunkedBuffer,
        output: &mut ChunkedBuffer,
    ) -> Result<(), CompressError> {
        let original = input.len();
        let Some(mut codec) = self.encoder(algorithm)? else {
            return Err(CompressError::SizeRegression { compressed: original, original });
        };

        let mark = output.chunk_count();
        let before = output.len();
        drive(codec.as_mut(), input, output, self.options.chunk_size)?;

        let compressed = output.len() - before;
        if compressed >= original {
            output.truncate_chunks(mark);
            return Err(CompressError::SizeRegression { compressed, original });
        }
        Ok(())
    }

    /// Append `input` to `output`, compressed with `algorithm` when that
    /// makes it strictly smaller and copied verbatim otherwise.
    ///
    /// Returns whether compression was applied.
    pub fn compress(&self, algorithm: Algorithm, input: &ChunkedBuffer, output: &mut ChunkedBuffer) -> bool {
        if algorithm == Algorithm::None {
            output.extend_from(input);
            return false;
        }
        match self.try_compress(algorithm, input, output) {
            Ok(()) => {
                tracing::debug!(%algorithm, original = input.len(), "payload compressed");
                true
            }
            Err(CompressError::SizeRegression { compressed, original }) => {
                tracing::debug!(%algorithm, compressed, original, "compression not beneficial, sending uncompressed");
                output.extend_from(input);
                false
            }
            Err(err) => {
                tracing::info!(%algorithm, error = %err, "compression failed, sending uncompressed");
                output.extend_from(input);
                false
            }
        }
    }

    /// [`Dispatcher::compress`] for an unvalidated algorithm id. An invalid
    /// id is logged and the input is copied.
    pub fn compress_raw(&self, raw: i32, input: &ChunkedBuffer, output: &mut ChunkedBuffer) -> bool {
        match Algorithm::from_raw(raw) {
            Ok(algorithm) => self.compress(algorithm, input, output),
            Err(err) => {
                tracing::error!(error = %err, "cannot compress");
                output.extend_from(input);
                false
            }
        }
    }

    /// Append the decompressed form of `input` to `output`.
    ///
    /// On error `output` is exactly as it was before the call.
    pub fn decompress(
        &self,
        algorithm: Algorithm,
        input: &ChunkedBuffer,
        output: &mut ChunkedBuffer,
    ) -> Result<(), CompressError> {
        match self.decoder(algorithm)? {
            None => {
                output.extend_from(input);
                Ok(())
            }
            Some(mut codec) => drive(codec.as_mut(), input, output, self.options.chunk_size),
        }
    }

    /// [`Dispatcher::decompress`] for an unvalidated algorithm id.
    pub fn decompress_raw(
        &self,
        raw: i32,
        input: &ChunkedBuffer,
        output: &mut ChunkedBuffer,
    ) -> Result<(), CompressError> {
        let algorithm = Algorithm::from_raw(raw).map_err(|err| {
            tracing::error!(error = %err, "cannot decompress");
            err
        })?;
        self.decompress(algorithm, input, output)
    }
}

/// [`Dispatcher::compress`] with default options.
pub fn compress(algorithm: Algorithm, input: &ChunkedBuffer, output: &mut ChunkedBuffer) -> bool {
    Dispatcher::default().compress(algorithm, input, output)
}

/// [`Dispatcher::decompress`] with default options.
pub fn decompress(
    algorithm: Algorithm,
    input: &ChunkedBuffer,
    output: &mut ChunkedBuffer,
) -> Result<(), CompressError> {
    Dispatcher::default().decompress(algorithm, input, output)
}
