use chunkpress_core::{Codec, CodecId, CorruptDataError, EncodingError};
use zstd::zstd_safe;

/// Default zstd level for registry instances.
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Zstandard chunk codec.
///
/// Each chunk is one zstd frame, compressed with a fresh context per call so
/// that one instance can serve any number of threads. The level only affects
/// compression; any level decodes with the same codec.
///
/// Best for: general text, JSON, logs, mixed structured columns.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self {
            level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Codec for ZstdCodec {
    fn id(&self) -> CodecId {
        CodecId::Zstd
    }

    fn max_compressed_len(&self, raw_len: usize) -> usize {
        zstd_safe::compress_bound(raw_len)
    }

    fn encode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, EncodingError> {
        zstd::bulk::compress_to_buffer(src, dst, self.level).map_err(|e| EncodingError::Backend {
            codec: self.name(),
            reason: e.to_string(),
        })
    }

    fn decode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CorruptDataError> {
        // Fails on truncated frames, trailing garbage and output past `dst`.
        zstd::bulk::decompress_to_buffer(src, dst)
            .map_err(|e| CorruptDataError::new(self.name(), e.to_string()))
    }
}
