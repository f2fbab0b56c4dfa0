use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress};
use msgz_core::{CompressError, Flush, Status, Step, StreamCodec};

/// Largest DEFLATE window (32 KiB).
const WINDOW_BITS: u8 = 15;

/// Framing around the DEFLATE stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZlibFormat {
    /// RFC 1950: 2-byte header, adler32 trailer.
    Zlib,
    /// RFC 1952: 10-byte header, crc32 + length trailer.
    Gzip,
}

impl ZlibFormat {
    fn name(self) -> &'static str {
        match self {
            ZlibFormat::Zlib => "deflate",
            ZlibFormat::Gzip => "gzip",
        }
    }
}

fn map_status(status: flate2::Status) -> Status {
    match status {
        flate2::Status::Ok => Status::Progress,
        // Z_BUF_ERROR: no progress possible with this window, retry with more.
        flate2::Status::BufError => Status::Exhausted,
        flate2::Status::StreamEnd => Status::StreamEnd,
    }
}

/// DEFLATE encoder over flate2's low-level `Compress` state.
pub struct ZlibEncoder {
    format: ZlibFormat,
    inner: Compress,
}

impl ZlibEncoder {
    pub fn new(format: ZlibFormat, level: u32) -> Self {
        let level = Compression::new(level.min(9));
        let inner = match format {
            ZlibFormat::Zlib => Compress::new(level, true),
            ZlibFormat::Gzip => Compress::new_gzip(level, WINDOW_BITS),
        };
        Self { format, inner }
    }
}

impl StreamCodec for ZlibEncoder {
    fn name(&self) -> &'static str {
        self.format.name()
    }

    fn feed(&mut self, input: &[u8], output: &mut [u8], flush: Flush) -> Result<Step, CompressError> {
        let flush = match flush {
            Flush::Continue => FlushCompress::None,
            Flush::Finish => FlushCompress::Finish,
        };
        let (in_before, out_before) = (self.inner.total_in(), self.inner.total_out());
        let status = self
            .inner
            .compress(input, output, flush)
            .map_err(|e| CompressError::codec(self.format.name(), e.to_string()))?;
        Ok(Step {
            consumed: (self.inner.total_in() - in_before) as usize,
            produced: (self.inner.total_out() - out_before) as usize,
            status: map_status(status),
        })
    }
}

/// DEFLATE decoder over flate2's low-level `Decompress` state.
///
/// Checksum and length trailers are verified by the engine; a mismatch
/// surfaces as a codec fault.
pub struct ZlibDecoder {
    format: ZlibFormat,
    inner: Decompress,
}

impl ZlibDecoder {
    pub fn new(format: ZlibFormat) -> Self {
        let inner = match format {
            ZlibFormat::Zlib => Decompress::new(true),
            ZlibFormat::Gzip => Decompress::new_gzip(WINDOW_BITS),
        };
        Self { format, inner }
    }
}

impl StreamCodec for ZlibDecoder {
    fn name(&self) -> &'static str {
        self.format.name()
    }

    fn feed(&mut self, input: &[u8], output: &mut [u8], flush: Flush) -> Result<Step, CompressError> {
        let flush = match flush {
            Flush::Continue => FlushDecompress::None,
            Flush::Finish => FlushDecompress::Finish,
        };
        let (in_before, out_before) = (self.inner.total_in(), self.inner.total_out());
        let status = self
            .inner
            .decompress(input, output, flush)
            .map_err(|e| CompressError::codec(self.format.name(), e.to_string()))?;
        Ok(Step {
            consumed: (self.inner.total_in() - in_before) as usize,
            produced: (self.inner.total_out() - out_before) as usize,
            status: map_status(status),
        })
    }

    fn finishes_empty_input(&self) -> bool {
        false
    }
}
