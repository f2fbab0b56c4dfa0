use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use msgz_codecs::{AlgorithmCompressor, CompressorRegistry, NoopCompressor};
use msgz_core::{Algorithm, ChunkedBuffer, CompressError, Compressor};

/// Copies payloads and counts lifecycle calls.
struct Recording {
    name: &'static str,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl Recording {
    fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        })
    }
}

impl Compressor for Recording {
    fn name(&self) -> &str {
        self.name
    }

    fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn compress(&self, input: &ChunkedBuffer, output: &mut ChunkedBuffer) -> bool {
        output.extend_from(input);
        false
    }

    fn decompress(&self, input: &ChunkedBuffer, output: &mut ChunkedBuffer) -> Result<(), CompressError> {
        output.extend_from(input);
        Ok(())
    }
}

fn same(a: &Arc<dyn Compressor>, b: &Arc<dyn Compressor>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

#[test]
fn test_builtin_compressors_are_registered() {
    let registry = CompressorRegistry::new();
    assert_eq!(
        registry.names(),
        vec!["deflate", "gzip", "lz4", "noop", "snappy", "zstd"]
    );
    for name in ["noop", "deflate", "gzip"] {
        assert_eq!(registry.get(name).unwrap().name(), name);
    }
}

#[test]
fn test_unknown_name_is_not_found() {
    let registry = CompressorRegistry::new();
    assert!(registry.get("fake-should-not-exist").is_none());
    let err = registry.lookup("fake-should-not-exist").err().unwrap();
    assert_eq!(
        err,
        CompressError::UnknownCompressor { name: "fake-should-not-exist".into() }
    );
}

#[test]
fn test_register_then_get_returns_same_instance() {
    let registry = CompressorRegistry::empty();
    assert!(registry.is_empty());

    let custom: Arc<dyn Compressor> = Recording::new("custom");
    assert!(registry.register(Arc::clone(&custom)).is_none());
    assert!(same(&registry.get("custom").unwrap(), &custom));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_register_overwrites_last_write_wins() {
    let registry = CompressorRegistry::new();
    let first = Recording::new("gzip");
    let second = Recording::new("gzip");

    let replaced = registry.register(first.clone()).unwrap();
    assert_eq!(replaced.name(), "gzip");
    registry.register(second.clone());

    let current = registry.get("gzip").unwrap();
    let second_dyn: Arc<dyn Compressor> = second.clone();
    assert!(same(&current, &second_dyn));
    assert_eq!(first.starts.load(Ordering::SeqCst), 1);
    assert_eq!(first.stops.load(Ordering::SeqCst), 1);
    assert_eq!(second.stops.load(Ordering::SeqCst), 0);
}

#[test]
fn test_reregistering_same_instance_keeps_it_running() {
    let registry = CompressorRegistry::empty();
    let recording = Recording::new("recording");

    assert!(registry.register(recording.clone()).is_none());
    assert!(registry.register(recording.clone()).is_none());
    assert_eq!(registry.len(), 1);
    assert!(
        recording.starts.load(Ordering::SeqCst) > recording.stops.load(Ordering::SeqCst)
    );

    let gzip = Arc::new(AlgorithmCompressor::new(Algorithm::Gzip));
    registry.register(gzip.clone());
    registry.register(gzip.clone());
    assert!(gzip.is_running());
}

#[test]
fn test_remove_is_idempotent() {
    let registry = CompressorRegistry::new();
    assert!(registry.remove("deflate").is_some());
    assert!(registry.get("deflate").is_none());
    assert!(registry.remove("deflate").is_none());
    assert!(registry.remove("never-registered").is_none());
    assert_eq!(registry.len(), 5);
}

#[test]
fn test_lifecycle_follows_registration() {
    let recording = Recording::new("recording");
    {
        let registry = CompressorRegistry::empty();
        registry.register(recording.clone());
        assert_eq!(recording.starts.load(Ordering::SeqCst), 1);
        assert_eq!(recording.stops.load(Ordering::SeqCst), 0);
    }
    // Dropping the registry stops what it still holds.
    assert_eq!(recording.stops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_algorithm_compressor_start_stop() {
    let compressor = AlgorithmCompressor::new(Algorithm::Zstd);
    assert!(!compressor.is_running());
    compressor.start();
    compressor.start();
    assert!(compressor.is_running());
    compressor.stop();
    assert!(!compressor.is_running());

    // Still usable while stopped.
    let input = ChunkedBuffer::from(vec![b'x'; 2048]);
    let mut compressed = ChunkedBuffer::new();
    assert!(compressor.compress(&input, &mut compressed));
    let mut output = ChunkedBuffer::new();
    compressor.decompress(&compressed, &mut output).unwrap();
    assert_eq!(output.to_bytes(), input.to_bytes());
}

#[test]
fn test_noop_compressor_shares_input_ranges() {
    let input = ChunkedBuffer::from(&b"test value"[..]);
    let mut output = ChunkedBuffer::new();
    assert!(NoopCompressor.compress(&input, &mut output));

    assert_eq!(input.chunk_count(), output.chunk_count());
    for (a, b) in input.iter().zip(output.iter()) {
        assert_eq!(a.as_ptr(), b.as_ptr());
        assert_eq!(a.len(), b.len());
    }
}

#[test]
fn test_registry_compressors_round_trip() {
    let registry = CompressorRegistry::new();
    let input = ChunkedBuffer::from(b"registry payload, registry payload, registry payload. ".repeat(40));
    for name in registry.names() {
        let compressor = registry.lookup(&name).unwrap();
        let mut compressed = ChunkedBuffer::new();
        let applied = compressor.compress(&input, &mut compressed);
        assert!(applied, "{name} should compress a repetitive payload");

        let mut output = ChunkedBuffer::new();
        compressor.decompress(&compressed, &mut output).unwrap();
        assert_eq!(output.to_bytes(), input.to_bytes(), "{name}");
    }
}

#[test]
fn test_concurrent_register_get_remove() {
    let registry = Arc::new(CompressorRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let name: &'static str = ["alpha", "beta"][i % 2];
                for _ in 0..200 {
                    registry.register(Recording::new(name));
                    if let Some(found) = registry.get(name) {
                        assert_eq!(found.name(), name);
                    }
                    registry.remove(name);
                    assert!(registry.get("gzip").is_some());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(registry.len(), 6);
}
