use msgz_core::{CompressError, Flush, Status, Step, StreamCodec};

/// A one-shot transform over a whole payload (e.g. a block compressor).
pub trait BlockTransform {
    fn name(&self) -> &'static str;

    fn apply(&mut self, input: &[u8]) -> Result<Vec<u8>, CompressError>;

    /// See [`StreamCodec::finishes_empty_input`].
    fn finishes_empty_input(&self) -> bool;
}

/// Presents a [`BlockTransform`] as a push-style [`StreamCodec`].
///
/// Every range fed with [`Flush::Continue`] is staged. On [`Flush::Finish`]
/// the transform runs once over the staged payload and its result is
/// drained into as many output windows as it takes.
pub struct BlockEngine<T> {
    transform: T,
    staged: Vec<u8>,
    result: Option<Vec<u8>>,
    drained: usize,
}

impl<T: BlockTransform> BlockEngine<T> {
    pub fn new(transform: T) -> Self {
        Self {
            transform,
            staged: Vec::new(),
            result: None,
            drained: 0,
        }
    }
}

impl<T: BlockTransform> StreamCodec for BlockEngine<T> {
    fn name(&self) -> &'static str {
        self.transform.name()
    }

    fn feed(&mut self, input: &[u8], output: &mut [u8], flush: Flush) -> Result<Step, CompressError> {
        let mut consumed = 0;
        if self.result.is_none() {
            consumed = input.len();
            if flush == Flush::Continue {
                self.staged.extend_from_slice(input);
                return Ok(Step { consumed, produced: 0, status: Status::Progress });
            }
            // A single-range payload is transformed in place, without staging.
            let result = if self.staged.is_empty() {
                self.transform.apply(input)?
            } else {
                self.staged.extend_from_slice(input);
                let staged = std::mem::take(&mut self.staged);
                self.transform.apply(&staged)?
            };
            self.result = Some(result);
        }

        // Input offered after the stream finished stays unconsumed, which
        // the driver reports as a desynchronized stream.
        let Some(result) = self.result.as_ref() else {
            return Err(CompressError::codec(self.transform.name(), "block result missing"));
        };
        let n = (result.len() - self.drained).min(output.len());
        output[..n].copy_from_slice(&result[self.drained..self.drained + n]);
        self.drained += n;

        let status = if self.drained == result.len() {
            Status::StreamEnd
        } else {
            Status::Progress
        };
        Ok(Step { consumed, produced: n, status })
    }

    fn finishes_empty_input(&self) -> bool {
        self.transform.finishes_empty_input()
    }
}

// ── Snappy ─────────────────────────────────────────────────────────────────

/// Snappy raw-format compression.
pub struct SnappyCompress(snap::raw::Encoder);

impl Default for SnappyCompress {
    fn default() -> Self {
        Self(snap::raw::Encoder::new())
    }
}

impl BlockTransform for SnappyCompress {
    fn name(&self) -> &'static str {
        "snappy"
    }

    fn apply(&mut self, input: &[u8]) -> Result<Vec<u8>, CompressError> {
        self.0
            .compress_vec(input)
            .map_err(|e| CompressError::codec("snappy", e.to_string()))
    }

    fn finishes_empty_input(&self) -> bool {
        true
    }
}

/// Snappy raw-format decompression. The decoder rejects input whose decoded
/// length disagrees with the length preamble.
pub struct SnappyDecompress(snap::raw::Decoder);

impl Default for SnappyDecompress {
    fn default() -> Self {
        Self(snap::raw::Decoder::new())
    }
}

impl BlockTransform for SnappyDecompress {
    fn name(&self) -> &'static str {
        "snappy"
    }

    fn apply(&mut self, input: &[u8]) -> Result<Vec<u8>, CompressError> {
        self.0
            .decompress_vec(input)
            .map_err(|e| CompressError::codec("snappy", e.to_string()))
    }

    fn finishes_empty_input(&self) -> bool {
        false
    }
}

// ── LZ4 ────────────────────────────────────────────────────────────────────

/// LZ4 block compression with a little-endian u32 length prefix.
#[derive(Default)]
pub struct Lz4Compress;

impl BlockTransform for Lz4Compress {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn apply(&mut self, input: &[u8]) -> Result<Vec<u8>, CompressError> {
        Ok(lz4_flex::block::compress_prepend_size(input))
    }

    fn finishes_empty_input(&self) -> bool {
        true
    }
}

#[derive(Default)]
pub struct Lz4Decompress;

impl BlockTransform for Lz4Decompress {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn apply(&mut self, input: &[u8]) -> Result<Vec<u8>, CompressError> {
        lz4_flex::block::decompress_size_prepended(input)
            .map_err(|e| CompressError::codec("lz4", e.to_string()))
    }

    fn finishes_empty_input(&self) -> bool {
        false
    }
}
