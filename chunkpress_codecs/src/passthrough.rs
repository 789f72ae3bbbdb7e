use chunkpress_core::{Codec, CodecId, CorruptDataError, EncodingError};

/// No-op codec: stores chunks verbatim, with no compression.
///
/// Useful for:
/// - Verifying the file format independently of any algorithm.
/// - Columns that are already compressed, where a real codec would expand them.
///
/// The chunk carries no length of its own, so a truncated chunk can only be
/// caught by [`Codec::decompress_exact`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughCodec;

impl Codec for PassThroughCodec {
    fn id(&self) -> CodecId {
        CodecId::PassThrough
    }

    fn max_compressed_len(&self, raw_len: usize) -> usize {
        raw_len
    }

    fn decompressed_len(&self, compressed: &[u8]) -> Result<Option<usize>, CorruptDataError> {
        Ok(Some(compressed.len()))
    }

    fn encode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, EncodingError> {
        dst[..src.len()].copy_from_slice(src);
        Ok(src.len())
    }

    fn decode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CorruptDataError> {
        if src.len() > dst.len() {
            return Err(CorruptDataError::new(
                self.name(),
                format!("{} stored bytes exceed a {} byte destination", src.len(), dst.len()),
            ));
        }
        dst[..src.len()].copy_from_slice(src);
        Ok(src.len())
    }
}
