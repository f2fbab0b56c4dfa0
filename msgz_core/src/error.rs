use thiserror::Error;

/// Failure outcomes of the compression layer.
///
/// Only [`CompressError::Codec`] is a fault reported by an engine. The other
/// variants describe caller mistakes (`InvalidAlgorithm`,
/// `UnknownCompressor`) or a policy outcome (`SizeRegression`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompressError {
    #[error("invalid compression algorithm {raw}")]
    InvalidAlgorithm { raw: i32 },

    #[error("{codec} codec fault: {reason}")]
    Codec { codec: &'static str, reason: String },

    #[error("compression not beneficial: {compressed} bytes >= {original} bytes")]
    SizeRegression { compressed: usize, original: usize },

    #[error("no compressor registered for encoding '{name}'")]
    UnknownCompressor { name: String },
}

impl CompressError {
    pub fn codec(codec: &'static str, reason: impl Into<String>) -> Self {
        CompressError::Codec {
            codec,
            reason: reason.into(),
        }
    }

    /// True for engine-reported corruption or desynchronization.
    pub fn is_fault(&self) -> bool {
        matches!(self, CompressError::Codec { .. })
    }
}
