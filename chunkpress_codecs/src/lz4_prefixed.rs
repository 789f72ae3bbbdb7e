use chunkpress_core::{Codec, CodecId, CorruptDataError, EncodingError};
use lz4_flex::block::{compress_into, decompress_into, get_maximum_output_size};

const PREFIX_LEN: usize = 4;

/// LZ4 block preceded by its raw length as a little-endian u32.
///
/// Self-describing variant of [`Lz4Codec`](crate::Lz4Codec): the prefix lets
/// the chunk report its own size and lets decoding insist on producing exactly
/// that many bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4LengthPrefixedCodec;

fn read_prefix<'a>(
    codec: &'static str,
    src: &'a [u8],
) -> Result<(usize, &'a [u8]), CorruptDataError> {
    if src.len() < PREFIX_LEN {
        return Err(CorruptDataError::new(
            codec,
            format!("{} bytes is too short for the length prefix", src.len()),
        ));
    }
    let (prefix, block) = src.split_at(PREFIX_LEN);
    let raw_len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
    Ok((raw_len, block))
}

impl Codec for Lz4LengthPrefixedCodec {
    fn id(&self) -> CodecId {
        CodecId::Lz4LengthPrefixed
    }

    fn max_compressed_len(&self, raw_len: usize) -> usize {
        PREFIX_LEN + get_maximum_output_size(raw_len)
    }

    fn decompressed_len(&self, compressed: &[u8]) -> Result<Option<usize>, CorruptDataError> {
        read_prefix(self.name(), compressed).map(|(raw_len, _)| Some(raw_len))
    }

    fn encode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, EncodingError> {
        let (prefix, body) = dst.split_at_mut(PREFIX_LEN);
        prefix.copy_from_slice(&(src.len() as u32).to_le_bytes());
        let written = compress_into(src, body).map_err(|e| EncodingError::Backend {
            codec: self.name(),
            reason: e.to_string(),
        })?;
        Ok(PREFIX_LEN + written)
    }

    fn decode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CorruptDataError> {
        let (raw_len, block) = read_prefix(self.name(), src)?;
        if raw_len > dst.len() {
            return Err(CorruptDataError::new(
                self.name(),
                format!("prefix claims {raw_len} bytes for a {} byte destination", dst.len()),
            ));
        }
        let written = decompress_into(block, &mut dst[..raw_len])
            .map_err(|e| CorruptDataError::new(self.name(), e.to_string()))?;
        if written != raw_len {
            return Err(CorruptDataError::new(
                self.name(),
                format!("decoded {written} bytes but the prefix claims {raw_len}"),
            ));
        }
        Ok(written)
    }
}
