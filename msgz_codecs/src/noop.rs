use msgz_core::{ChunkedBuffer, CompressError, Compressor};

/// No-op compressor: passes payloads through by reference.
///
/// Useful for peers that negotiated no compression, and for payloads that
/// are already compressed (images, archives) where another pass would only
/// cost CPU.
pub struct NoopCompressor;

impl Compressor for NoopCompressor {
    fn name(&self) -> &str {
        "noop"
    }

    fn compress(&self, input: &ChunkedBuffer, output: &mut ChunkedBuffer) -> bool {
        output.extend_from(input);
        true
    }

    fn decompress(&self, input: &ChunkedBuffer, output: &mut ChunkedBuffer) -> Result<(), CompressError> {
        output.extend_from(input);
        Ok(())
    }
}
