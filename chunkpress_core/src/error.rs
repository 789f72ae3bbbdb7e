use thiserror::Error;

/// Raised only by [`Codec::compress`](crate::Codec::compress).
///
/// Capacity and size problems are detected before the codec writes a single
/// byte, so the destination is untouched when either of the first two
/// variants is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The caller-supplied destination cannot hold the worst-case output.
    #[error(
        "{codec}: destination holds {capacity} bytes but {raw_len} input bytes may need up to {required}"
    )]
    InsufficientCapacity {
        codec: &'static str,
        raw_len: usize,
        required: usize,
        capacity: usize,
    },

    /// The chunk is larger than any codec accepts.
    #[error("{codec}: chunk of {raw_len} bytes exceeds the {max} byte chunk limit")]
    InputTooLarge {
        codec: &'static str,
        raw_len: usize,
        max: usize,
    },

    /// The underlying library refused the input after validation passed.
    #[error("{codec} compression failed: {reason}")]
    Backend { codec: &'static str, reason: String },
}

/// Raised only by [`Codec::decompress`](crate::Codec::decompress): the
/// compressed bytes are malformed, truncated, or decode past the destination.
///
/// Retrying with the same bytes cannot succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{codec}: corrupt chunk: {reason}")]
pub struct CorruptDataError {
    pub codec: &'static str,
    pub reason: String,
}

impl CorruptDataError {
    pub fn new(codec: &'static str, reason: impl Into<String>) -> Self {
        Self {
            codec,
            reason: reason.into(),
        }
    }
}

/// A persisted or user-supplied codec identifier that maps to no codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnknownCodecError {
    #[error("unknown codec id {0}")]
    Id(u16),

    #[error("unknown codec '{0}'")]
    Name(String),
}
