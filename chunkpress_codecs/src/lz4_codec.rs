use chunkpress_core::{Codec, CodecId, CorruptDataError, EncodingError};
use lz4_flex::block::{compress_into, decompress_into, get_maximum_output_size};

/// LZ4 block codec.
///
/// Fastest decompression of all bundled codecs. Chunks are bare LZ4 blocks
/// with no size header; the reader supplies the recorded raw length.
/// Decoding goes through lz4_flex's bounds-checked decoder, which rejects
/// offsets and lengths that would leave the input or the destination.
///
/// Best for: hot columns, low-latency random access.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Codec;

impl Codec for Lz4Codec {
    fn id(&self) -> CodecId {
        CodecId::Lz4
    }

    fn max_compressed_len(&self, raw_len: usize) -> usize {
        get_maximum_output_size(raw_len)
    }

    fn encode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, EncodingError> {
        compress_into(src, dst).map_err(|e| EncodingError::Backend {
            codec: self.name(),
            reason: e.to_string(),
        })
    }

    fn decode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CorruptDataError> {
        decompress_into(src, dst).map_err(|e| CorruptDataError::new(self.name(), e.to_string()))
    }
}
