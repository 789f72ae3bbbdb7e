use crate::codec::Codec;
use crate::error::{CorruptDataError, EncodingError};

/// A caller-owned, fixed-capacity chunk buffer with an explicit valid length.
///
/// The whole capacity is handed to the codec as the destination slice; the
/// length the codec returns becomes the readable region `[0, len)`. A failed
/// call resets the length to zero, so undefined output is never exposed.
///
/// Writers size one buffer with [`for_compression`](ChunkBuffer::for_compression)
/// and reuse it for every chunk of a file.
#[derive(Debug, Clone, Default)]
pub struct ChunkBuffer {
    data: Vec<u8>,
    len: usize,
}

impl ChunkBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            len: 0,
        }
    }

    /// Buffer large enough for the worst-case output of `codec` on a
    /// `raw_len` byte chunk.
    pub fn for_compression(codec: &dyn Codec, raw_len: usize) -> Self {
        Self::with_capacity(codec.max_compressed_len(raw_len))
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The valid region written by the last successful call.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Grow the capacity to at least `capacity`. Never shrinks.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if self.data.len() < capacity {
            self.data.resize(capacity, 0);
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Compress `raw` into this buffer.
    pub fn compress_from(&mut self, codec: &dyn Codec, raw: &[u8]) -> Result<usize, EncodingError> {
        self.len = 0;
        let written = codec.compress(raw, &mut self.data)?;
        self.len = written;
        Ok(written)
    }

    /// Decompress `compressed` into the first `raw_len` bytes of this buffer,
    /// growing it if needed. Anything other than exactly `raw_len` output bytes
    /// is corruption.
    pub fn decompress_from(
        &mut self,
        codec: &dyn Codec,
        compressed: &[u8],
        raw_len: usize,
    ) -> Result<usize, CorruptDataError> {
        self.len = 0;
        self.ensure_capacity(raw_len);
        let written = codec.decompress_exact(compressed, &mut self.data[..raw_len])?;
        self.len = written;
        Ok(written)
    }

    /// Consume the buffer, keeping only the valid region.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.data.truncate(self.len);
        self.data
    }
}
