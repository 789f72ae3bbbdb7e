use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};
use xxhash_rust::xxh3::xxh3_64;

use crate::buffer::ChunkBuffer;
use crate::codec::Codec;
use crate::format::{
    ChunkEntry, FileHeader, CHUNK_ENTRY_SIZE, FLAG_HAS_CHECKSUM, FORMAT_VERSION, HEADER_SIZE,
    MAX_CHUNK_SIZE,
};

/// Streaming writer for chunk files.
///
/// # Write contract
/// Call [`write`](ChunkWriter::write) any number of times with arbitrary-sized
/// byte slices. The writer accumulates data and compresses an independent chunk
/// whenever `chunk_size` raw bytes have been gathered. Call
/// [`finish`](ChunkWriter::finish) to flush the trailing partial chunk, append
/// the chunk index and footer, and write back the final header.
///
/// The compression destination is allocated once, sized by the codec's
/// worst-case bound for a full chunk, and reused for every chunk.
///
/// # Format layout written
/// ```text
/// [HEADER: 48 bytes placeholder]
/// [CHUNK 0] [CHUNK 1] ... [CHUNK N-1]      ← independent compressed chunks
/// [CHUNK INDEX: 24 bytes × N]
/// [FOOTER: 8 bytes, u64 LE offset of chunk index]
/// ← seek back to 0, overwrite header with real values
/// ```
pub struct ChunkWriter {
    out: BufWriter<File>,
    codec: Arc<dyn Codec>,
    chunk_size: u32,
    /// Pending raw bytes not yet compressed into a chunk.
    pending: Vec<u8>,
    scratch: ChunkBuffer,
    /// In-memory chunk index, appended to the file on `finish()`.
    entries: Vec<ChunkEntry>,
    /// Current write position in the file (mirrors the file cursor).
    current_offset: u64,
}

impl ChunkWriter {
    /// Create a new chunk file at `path`, overwriting any existing file.
    ///
    /// `chunk_size` is the nominal raw bytes per chunk; use
    /// [`DEFAULT_CHUNK_SIZE`](crate::format::DEFAULT_CHUNK_SIZE) if unsure.
    pub fn create(
        path: impl AsRef<Path>,
        codec: Arc<dyn Codec>,
        chunk_size: u32,
    ) -> anyhow::Result<Self> {
        if chunk_size == 0 || chunk_size as usize > MAX_CHUNK_SIZE {
            anyhow::bail!(
                "chunk size {} out of range (1..={} bytes)",
                chunk_size,
                MAX_CHUNK_SIZE
            );
        }
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut out = BufWriter::new(file);
        // Placeholder header, overwritten in finish()
        out.write_all(&[0u8; HEADER_SIZE as usize])?;

        let scratch = ChunkBuffer::for_compression(codec.as_ref(), chunk_size as usize);
        debug!(
            codec = codec.name(),
            chunk_size,
            scratch_capacity = scratch.capacity(),
            "chunk writer created"
        );

        Ok(Self {
            out,
            codec,
            chunk_size,
            pending: Vec::with_capacity(chunk_size as usize),
            scratch,
            entries: Vec::new(),
            current_offset: HEADER_SIZE,
        })
    }

    /// Buffer `data` and compress complete chunks as they fill up.
    pub fn write(&mut self, mut data: &[u8]) -> anyhow::Result<()> {
        let chunk_size = self.chunk_size as usize;
        while !data.is_empty() {
            let take = (chunk_size - self.pending.len()).min(data.len());
            self.pending.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.pending.len() == chunk_size {
                self.flush_chunk()?;
            }
        }
        Ok(())
    }

    /// Compress the pending bytes as one chunk and append it to the file.
    fn flush_chunk(&mut self) -> anyhow::Result<()> {
        let index = self.entries.len();
        let compressed_len = self
            .scratch
            .compress_from(self.codec.as_ref(), &self.pending)
            .with_context(|| format!("compressing chunk {index}"))?;
        let compressed = self.scratch.as_slice();

        self.out.write_all(compressed)?;
        self.entries.push(ChunkEntry {
            offset: self.current_offset,
            compressed_len: compressed_len as u32,
            raw_len: self.pending.len() as u32,
            checksum: xxh3_64(compressed),
        });
        debug!(
            chunk = index,
            raw_len = self.pending.len(),
            compressed_len,
            "chunk flushed"
        );

        self.current_offset += compressed_len as u64;
        self.pending.clear();
        Ok(())
    }

    /// Number of chunks compressed so far.
    pub fn chunk_count(&self) -> usize {
        self.entries.len()
    }

    /// Flush remaining buffered data, write the chunk index + footer, and seal
    /// the file by writing the final header.
    ///
    /// Returns the number of chunks written.
    pub fn finish(mut self) -> anyhow::Result<u64> {
        if !self.pending.is_empty() {
            self.flush_chunk()?;
        }

        // ── Chunk index ────────────────────────────────────────────────────
        let index_offset = self.current_offset;
        for entry in &self.entries {
            self.out.write_all(&entry.to_bytes())?;
        }
        self.current_offset += self.entries.len() as u64 * CHUNK_ENTRY_SIZE;

        // ── Footer: 8-byte u64 LE offset of chunk index start ──────────────
        self.out.write_all(&index_offset.to_le_bytes())?;

        // ── Seek back to 0 and write the real header ────────────────────────
        let chunk_count = self.entries.len() as u64;
        let header = FileHeader {
            version: FORMAT_VERSION,
            codec_id: self.codec.id().as_u16(),
            chunk_size: self.chunk_size,
            chunk_count,
            flags: FLAG_HAS_CHECKSUM,
        };
        self.out.seek(SeekFrom::Start(0))?;
        self.out.write_all(&header.to_bytes())?;
        self.out.flush()?;

        info!(
            codec = self.codec.name(),
            chunks = chunk_count,
            index_offset,
            "chunk file sealed"
        );
        Ok(chunk_count)
    }
}
