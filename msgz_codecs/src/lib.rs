pub mod block;
mod compressor;
pub mod dispatch;
mod noop;
mod registry;
pub mod zlib;
pub mod zstd_engine;

pub use compressor::AlgorithmCompressor;
pub use dispatch::{compress, decompress, CompressOptions, Dispatcher, DEFAULT_DEFLATE_LEVEL};
pub use noop::NoopCompressor;
pub use registry::CompressorRegistry;
pub use zstd_engine::DEFAULT_ZSTD_LEVEL;
