use crate::codec_id::CodecId;
use crate::error::{CorruptDataError, EncodingError};
use crate::format::MAX_CHUNK_SIZE;

/// Chunk compression contract shared by every algorithm.
///
/// Each `Codec` implementation:
/// - Is identified by a stable [`CodecId`] stored in the chunk file header.
/// - Compresses and decompresses one chunk at a time, with no state carried
///   between calls. A single instance is shared by every thread in the process.
/// - Writes only into the caller's destination slice, starting at index 0, and
///   reports how many bytes are valid. It never allocates the destination.
///
/// Callers go through [`compress`](Codec::compress),
/// [`decompress`](Codec::decompress) and
/// [`decompress_exact`](Codec::decompress_exact). Adapters implement the
/// `encode_chunk`/`decode_chunk` hooks, which only run after the shared
/// validation below has passed.
pub trait Codec: Send + Sync {
    /// Stable identifier stored in the chunk file header.
    fn id(&self) -> CodecId;

    /// Human-readable codec name for CLI display.
    fn name(&self) -> &'static str {
        self.id().name()
    }

    /// Worst-case compressed size for `raw_len` input bytes.
    ///
    /// Destination buffers handed to [`compress`](Codec::compress) must be at
    /// least this large. The bound may exceed `raw_len`.
    fn max_compressed_len(&self, raw_len: usize) -> usize;

    /// Raw size recorded inside the compressed bytes, for formats that carry one.
    fn decompressed_len(&self, _compressed: &[u8]) -> Result<Option<usize>, CorruptDataError> {
        Ok(None)
    }

    /// Adapter hook: compress all of `src` into the front of `dst`.
    ///
    /// Only called with `dst.len() >= self.max_compressed_len(src.len())`.
    fn encode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, EncodingError>;

    /// Adapter hook: decompress all of `src` into the front of `dst` using a
    /// bounds-checked decoder. Must fail rather than stop early on truncated input
    /// whenever the format allows the truncation to be noticed.
    fn decode_chunk(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CorruptDataError>;

    /// Compress one raw chunk into `dst` and return the compressed length.
    ///
    /// The readable output is `dst[..n]`. Fails with [`EncodingError`] before
    /// touching `dst` if the chunk is too large or `dst` is smaller than
    /// [`max_compressed_len`](Codec::max_compressed_len).
    fn compress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, EncodingError> {
        if src.len() > MAX_CHUNK_SIZE {
            return Err(EncodingError::InputTooLarge {
                codec: self.name(),
                raw_len: src.len(),
                max: MAX_CHUNK_SIZE,
            });
        }
        let required = self.max_compressed_len(src.len());
        if dst.len() < required {
            return Err(EncodingError::InsufficientCapacity {
                codec: self.name(),
                raw_len: src.len(),
                required,
                capacity: dst.len(),
            });
        }

        let written = self.encode_chunk(src, dst)?;
        if written > required {
            return Err(EncodingError::Backend {
                codec: self.name(),
                reason: format!("wrote {written} bytes, above its own bound of {required}"),
            });
        }
        Ok(written)
    }

    /// Decompress one compressed chunk into `dst` and return the raw length.
    ///
    /// `dst` must be at least as large as the chunk's recorded raw size. The
    /// readable output is `dst[..n]`; on error the contents of `dst` are
    /// undefined and must not be read.
    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CorruptDataError> {
        let written = self.decode_chunk(src, dst)?;
        if written > dst.len() {
            return Err(CorruptDataError::new(
                self.name(),
                format!("reported {written} bytes for a {} byte destination", dst.len()),
            ));
        }
        Ok(written)
    }

    /// Like [`decompress`](Codec::decompress), with `dst` sized to exactly the
    /// independently recorded raw size: anything other than a full `dst` is
    /// corruption.
    fn decompress_exact(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CorruptDataError> {
        let written = self.decompress(src, dst)?;
        if written != dst.len() {
            return Err(CorruptDataError::new(
                self.name(),
                format!("decoded {written} bytes but {} were recorded", dst.len()),
            ));
        }
        Ok(written)
    }
}
