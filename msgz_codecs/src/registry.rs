use std::collections::HashMap;
use std::sync::Arc;

use msgz_core::{Algorithm, CompressError, Compressor};
use parking_lot::RwLock;

use crate::compressor::AlgorithmCompressor;
use crate::noop::NoopCompressor;

/// Maps encoding names to long-lived [`Compressor`] instances.
///
/// The registry owns the lifecycle of what it holds: a compressor is
/// started when registered and stopped when it is removed, replaced, or the
/// registry is dropped. Lookups hand out `Arc` clones, so a compressor
/// removed while in use stays alive until its callers are done with it.
pub struct CompressorRegistry {
    compressors: RwLock<HashMap<String, Arc<dyn Compressor>>>,
}

impl CompressorRegistry {
    /// A registry holding the built-in compressors: noop, deflate, gzip,
    /// snappy, zstd and lz4.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register(Arc::new(NoopCompressor));
        for algorithm in Algorithm::ALL {
            if algorithm != Algorithm::None {
                registry.register(Arc::new(AlgorithmCompressor::new(algorithm)));
            }
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            compressors: RwLock::new(HashMap::new()),
        }
    }

    /// Insert `compressor` under its name, replacing (and stopping) any
    /// previous entry. Returns the replaced compressor.
    ///
    /// Registering the instance that is already stored under that name is a
    /// no-op: it stays registered and running, and nothing is returned.
    pub fn register(&self, compressor: Arc<dyn Compressor>) -> Option<Arc<dyn Compressor>> {
        let name = compressor.name().to_string();
        let previous = {
            let mut compressors = self.compressors.write();
            if let Some(current) = compressors.get(&name) {
                if Arc::ptr_eq(current, &compressor) {
                    return None;
                }
            }
            compressor.start();
            compressors.insert(name.clone(), compressor)
        };
        if let Some(previous) = &previous {
            tracing::debug!(encoding = %name, "replacing registered compressor");
            previous.stop();
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Compressor>> {
        self.compressors.read().get(name).cloned()
    }

    /// Like [`CompressorRegistry::get`], but a miss is an
    /// [`CompressError::UnknownCompressor`].
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Compressor>, CompressError> {
        self.get(name).ok_or_else(|| CompressError::UnknownCompressor {
            name: name.to_string(),
        })
    }

    /// Remove and stop the compressor registered under `name`, if any.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Compressor>> {
        let removed = self.compressors.write().remove(name);
        if let Some(removed) = &removed {
            removed.stop();
        }
        removed
    }

    /// Registered encoding names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.compressors.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.compressors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CompressorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CompressorRegistry {
    fn drop(&mut self) {
        for compressor in self.compressors.get_mut().values() {
            compressor.stop();
        }
    }
}
