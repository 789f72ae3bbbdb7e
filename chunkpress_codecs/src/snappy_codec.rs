use chunkpress_core::{Codec, CodecId, CorruptDataError, EncodingError};
use snap::raw::{decompress_len, max_compress_len, Decoder, Encoder};

/// Snappy raw-format chunk codec.
///
/// The raw format opens with a varint of the uncompressed length, which the
/// decoder checks against both the destination and the bytes it actually
/// produces. Encoder and decoder are created per call; they own scratch
/// tables and are not shareable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnappyCodec;

impl Codec for SnappyCodec {
    fn id(&self) -> CodecId {
        CodecId::Snappy
    }

    fn max_compressed_len(&self, raw_len: usize) -> usize {
        max_compress_len(raw_len)
    }

    fn decompressed_len(&self, compressed: &[u8]) -> Result<Option<usize>, CorruptDataError> {
        decompress_len(compressed)
            .map(Some)
            .map_err(|e| CorruptDataError::new(self.name(), e.to_string()))
    }

    fn encode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, EncodingError> {
        Encoder::new()
            .compress(src, dst)
            .map_err(|e| EncodingError::Backend {
                codec: self.name(),
                reason: e.to_string(),
            })
    }

    fn decode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CorruptDataError> {
        Decoder::new()
            .decompress(src, dst)
            .map_err(|e| CorruptDataError::new(self.name(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_raw_length() {
        let raw = b"snappy snappy snappy snappy snappy".repeat(10);
        let mut compressed = vec![0u8; SnappyCodec.max_compressed_len(raw.len())];
        let n = SnappyCodec.compress(&raw, &mut compressed).unwrap();
        assert_eq!(
            SnappyCodec.decompressed_len(&compressed[..n]),
            Ok(Some(raw.len()))
        );
    }

    #[test]
    fn destination_smaller_than_header_is_corrupt() {
        let raw = vec![1u8; 128];
        let mut compressed = vec![0u8; SnappyCodec.max_compressed_len(raw.len())];
        let n = SnappyCodec.compress(&raw, &mut compressed).unwrap();

        let mut out = vec![0u8; 127];
        assert!(SnappyCodec.decompress(&compressed[..n], &mut out).is_err());
    }
}
