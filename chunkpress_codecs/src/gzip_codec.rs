use std::io::{Read, Write};

use chunkpress_core::{Codec, CodecId, CorruptDataError, EncodingError};
use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Default gzip level for registry instances.
pub const DEFAULT_GZIP_LEVEL: u32 = 6;

/// gzip header (10 bytes, no optional fields) plus CRC32/ISIZE trailer (8 bytes).
const GZIP_FRAMING: usize = 18;

/// Gzip chunk codec: each chunk is one gzip member.
///
/// The member trailer carries a CRC32 and the raw length, so bit flips and
/// truncation are detected by the decoder itself.
///
/// Best for: cold columns where size matters more than decode speed.
#[derive(Debug, Clone, Copy)]
pub struct GzipCodec {
    /// Compression level, 0 (store) to 9 (best).
    pub level: u32,
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self {
            level: DEFAULT_GZIP_LEVEL,
        }
    }
}

impl GzipCodec {
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }

    fn corrupt(&self, reason: impl Into<String>) -> CorruptDataError {
        CorruptDataError::new(self.name(), reason)
    }
}

impl Codec for GzipCodec {
    fn id(&self) -> CodecId {
        CodecId::Gzip
    }

    /// Conservative deflate bound (zlib's `deflateBound` for arbitrary
    /// parameters) plus the gzip framing.
    fn max_compressed_len(&self, raw_len: usize) -> usize {
        raw_len + ((raw_len + 7) >> 3) + ((raw_len + 63) >> 6) + 5 + GZIP_FRAMING
    }

    fn decompressed_len(&self, compressed: &[u8]) -> Result<Option<usize>, CorruptDataError> {
        if compressed.len() < GZIP_FRAMING {
            return Err(self.corrupt("too short for a gzip member"));
        }
        let isize_bytes = &compressed[compressed.len() - 4..];
        let raw_len = u32::from_le_bytes([isize_bytes[0], isize_bytes[1], isize_bytes[2], isize_bytes[3]]);
        Ok(Some(raw_len as usize))
    }

    fn encode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, EncodingError> {
        let backend = |e: std::io::Error| EncodingError::Backend {
            codec: self.name(),
            reason: e.to_string(),
        };
        let capacity = dst.len();
        let mut encoder = GzEncoder::new(dst, Compression::new(self.level));
        encoder.write_all(src).map_err(backend)?;
        let unused = encoder.finish().map_err(backend)?;
        Ok(capacity - unused.len())
    }

    fn decode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CorruptDataError> {
        let mut decoder = GzDecoder::new(src);
        let mut filled = 0;
        loop {
            if filled == dst.len() {
                // Destination full: the member must end here.
                let mut probe = [0u8; 1];
                match decoder.read(&mut probe) {
                    Ok(0) => break,
                    Ok(_) => {
                        return Err(self.corrupt(format!(
                            "decodes past the {} byte destination",
                            dst.len()
                        )))
                    }
                    Err(e) => return Err(self.corrupt(e.to_string())),
                }
            }
            match decoder.read(&mut dst[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) => return Err(self.corrupt(e.to_string())),
            }
        }

        let trailing = decoder.into_inner().len();
        if trailing != 0 {
            return Err(self.corrupt(format!("{trailing} trailing bytes after the gzip member")));
        }
        Ok(filled)
    }
}
