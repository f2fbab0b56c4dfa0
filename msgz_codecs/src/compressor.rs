use std::sync::atomic::{AtomicBool, Ordering};

use msgz_core::{Algorithm, ChunkedBuffer, CompressError, Compressor};

use crate::dispatch::{CompressOptions, Dispatcher};

/// Compressor backed by one [`Algorithm`] through a [`Dispatcher`].
///
/// Each call builds fresh codec state, so one instance can be shared across
/// threads. `start`/`stop` only flip the `running` flag; the compressor
/// keeps working in either state.
pub struct AlgorithmCompressor {
    algorithm: Algorithm,
    dispatcher: Dispatcher,
    running: AtomicBool,
}

impl AlgorithmCompressor {
    pub fn new(algorithm: Algorithm) -> Self {
        Self::with_options(algorithm, CompressOptions::default())
    }

    pub fn with_options(algorithm: Algorithm, options: CompressOptions) -> Self {
        Self {
            algorithm,
            dispatcher: Dispatcher::new(options),
            running: AtomicBool::new(false),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Compressor for AlgorithmCompressor {
    fn name(&self) -> &str {
        self.algorithm.name()
    }

    fn start(&self) {
        if !self.running.swap(true, Ordering::AcqRel) {
            tracing::debug!(compressor = self.name(), "compressor started");
        }
    }

    fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            tracing::debug!(compressor = self.name(), "compressor stopped");
        }
    }

    fn compress(&self, input: &ChunkedBuffer, output: &mut ChunkedBuffer) -> bool {
        self.dispatcher.compress(self.algorithm, input, output)
    }

    fn decompress(&self, input: &ChunkedBuffer, output: &mut ChunkedBuffer) -> Result<(), CompressError> {
        self.dispatcher.decompress(self.algorithm, input, output)
    }
}
