pub mod algorithm;
pub mod buffer;
pub mod codec;
pub mod compressor;
pub mod error;

pub use algorithm::{Algorithm, ALGORITHM_COUNT};
pub use buffer::{ChunkedBuffer, SplitMode};
pub use codec::{drive, Flush, Status, Step, StreamCodec, DEFAULT_CHUNK_SIZE};
pub use compressor::Compressor;
pub use error::CompressError;
