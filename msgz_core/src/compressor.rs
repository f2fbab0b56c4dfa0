use crate::buffer::ChunkedBuffer;
use crate::error::CompressError;

/// A named, long-lived compressor addressed by its encoding name.
///
/// Implementations are stored behind `Arc` in a registry and may be called
/// from many threads at once, so `compress`/`decompress` take `&self` and
/// must keep all codec state local to the call.
pub trait Compressor: Send + Sync {
    /// Encoding name used as the registry key (e.g. "gzip").
    fn name(&self) -> &str;

    /// Lifecycle hook called before the compressor is put into service.
    fn start(&self) {}

    /// Lifecycle hook called when the compressor is taken out of service.
    fn stop(&self) {}

    /// Append the encoded form of `input` to `output`.
    ///
    /// Returns `true` when `output` received this compressor's encoding and
    /// `false` when it fell back to a verbatim copy.
    fn compress(&self, input: &ChunkedBuffer, output: &mut ChunkedBuffer) -> bool;

    /// Append the decoded form of `input` to `output`. On error `output` is
    /// left unchanged.
    fn decompress(&self, input: &ChunkedBuffer, output: &mut ChunkedBuffer)
        -> Result<(), CompressError>;
}
