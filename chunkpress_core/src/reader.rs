use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use rayon::prelude::*;
use tracing::{debug, info};
use xxhash_rust::xxh3::xxh3_64;

use crate::buffer::ChunkBuffer;
use crate::codec::Codec;
use crate::format::{
    ChunkEntry, FileHeader, CHUNK_ENTRY_SIZE, FLAG_HAS_CHECKSUM, FOOTER_SIZE, FORMAT_VERSION,
    HEADER_SIZE, MAX_CHUNK_SIZE,
};

/// Read only the fixed header of a chunk file.
///
/// Callers use the stored codec id to pick the codec (through the registry)
/// before opening the file with [`ChunkReader::open`].
pub fn read_header(path: impl AsRef<Path>) -> anyhow::Result<FileHeader> {
    let path = path.as_ref();
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = [0u8; HEADER_SIZE as usize];
    file.read_exact(&mut buf)
        .with_context(|| format!("reading header of {}", path.display()))?;
    FileHeader::from_bytes(&buf)
}

/// Reject index entries that point outside the chunk region or whose raw
/// length breaks the fixed chunk grid. Every chunk but the last holds exactly
/// `chunk_size` raw bytes; the last holds between 1 and `chunk_size`.
fn check_entry(
    idx: u64,
    entry: &ChunkEntry,
    header: &FileHeader,
    index_offset: u64,
    is_last: bool,
) -> anyhow::Result<()> {
    let end = entry.offset.saturating_add(entry.compressed_len as u64);
    if entry.offset < HEADER_SIZE || end > index_offset {
        anyhow::bail!(
            "chunk {} spans bytes {}..{} outside the chunk region {}..{}",
            idx,
            entry.offset,
            end,
            HEADER_SIZE,
            index_offset
        );
    }
    let raw_ok = if is_last {
        entry.raw_len > 0 && entry.raw_len <= header.chunk_size
    } else {
        entry.raw_len == header.chunk_size
    };
    if !raw_ok {
        anyhow::bail!(
            "chunk {} records {} raw bytes, inconsistent with chunk size {}",
            idx,
            entry.raw_len,
            header.chunk_size
        );
    }
    Ok(())
}

/// Random-access reader for chunk files.
///
/// # Open sequence
/// 1. Read the 48-byte header (magic, version, codec_id, chunk_count, chunk_size).
/// 2. Seek to `file_end - 8`, read the `index_offset` u64.
/// 3. Seek to `index_offset`, load the full chunk index into RAM.
///
/// # Access pattern
/// [`read_chunk`](ChunkReader::read_chunk) seeks directly to one chunk and
/// decodes only that chunk into a buffer sized to its recorded raw length.
/// [`read_range`](ChunkReader::read_range) resolves a byte range to the minimal
/// span of chunks. [`read_all`](ChunkReader::read_all) decodes every chunk in
/// parallel.
pub struct ChunkReader {
    file: File,
    pub header: FileHeader,
    entries: Vec<ChunkEntry>,
    codec: Arc<dyn Codec>,
}

impl ChunkReader {
    /// Open a chunk file.
    ///
    /// `codec` must match the codec id stored in the header; there is no
    /// detection from the payload bytes.
    pub fn open(path: impl AsRef<Path>, codec: Arc<dyn Codec>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

        // ── Read and validate header ────────────────────────────────────────
        let mut header_buf = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header_buf)?;
        let header = FileHeader::from_bytes(&header_buf)?;

        if header.version != FORMAT_VERSION {
            anyhow::bail!(
                "unsupported format version {} (only version {} is supported)",
                header.version,
                FORMAT_VERSION
            );
        }
        if header.codec_id != codec.id().as_u16() {
            anyhow::bail!(
                "codec mismatch: file uses codec id {} but provided codec '{}' has id {}",
                header.codec_id,
                codec.name(),
                codec.id().as_u16()
            );
        }

        if header.chunk_size == 0 || header.chunk_size as usize > MAX_CHUNK_SIZE {
            anyhow::bail!("invalid chunk size {} in header", header.chunk_size);
        }

        // ── Read footer → index offset ──────────────────────────────────────
        let file_len = file.seek(SeekFrom::End(0))?;
        let index_len = header
            .chunk_count
            .checked_mul(CHUNK_ENTRY_SIZE)
            .ok_or_else(|| {
                anyhow::anyhow!("chunk count {} overflows the index", header.chunk_count)
            })?;
        let min_len = index_len.checked_add(HEADER_SIZE + FOOTER_SIZE);
        if min_len.map_or(true, |min| file_len < min) {
            anyhow::bail!(
                "file is {} bytes, too short for {} chunk index entries",
                file_len,
                header.chunk_count
            );
        }
        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer_buf = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer_buf)?;
        let index_offset = u64::from_le_bytes(footer_buf);
        if index_offset.checked_add(index_len + FOOTER_SIZE) != Some(file_len) {
            anyhow::bail!(
                "index offset {} inconsistent with file length {}",
                index_offset,
                file_len
            );
        }

        // ── Load chunk index ────────────────────────────────────────────────
        file.seek(SeekFrom::Start(index_offset))?;
        let mut entries = Vec::with_capacity(header.chunk_count as usize);
        let mut entry_buf = [0u8; CHUNK_ENTRY_SIZE as usize];
        for idx in 0..header.chunk_count {
            file.read_exact(&mut entry_buf)?;
            let entry = ChunkEntry::from_bytes(&entry_buf)?;
            let is_last = idx + 1 == header.chunk_count;
            check_entry(idx, &entry, &header, index_offset, is_last)?;
            entries.push(entry);
        }

        info!(
            path = %path.display(),
            codec = codec.name(),
            chunks = header.chunk_count,
            "chunk file opened"
        );
        Ok(Self {
            file,
            header,
            entries,
            codec,
        })
    }

    /// Total number of chunks in the file.
    #[inline]
    pub fn chunk_count(&self) -> u64 {
        self.header.chunk_count
    }

    /// Nominal raw bytes per chunk (the last chunk may be smaller).
    #[inline]
    pub fn chunk_size(&self) -> u32 {
        self.header.chunk_size
    }

    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    /// Total uncompressed size of all chunks in bytes.
    pub fn raw_size(&self) -> u64 {
        self.entries.iter().map(|e| e.raw_len as u64).sum()
    }

    /// Total compressed size of all chunks in bytes (excluding index/header).
    pub fn compressed_size(&self) -> u64 {
        self.entries.iter().map(|e| e.compressed_len as u64).sum()
    }

    /// Compression ratio (raw / compressed).
    pub fn ratio(&self) -> f64 {
        let compressed = self.compressed_size();
        if compressed == 0 {
            return 1.0;
        }
        self.raw_size() as f64 / compressed as f64
    }

    pub fn entries(&self) -> &[ChunkEntry] {
        &self.entries
    }

    fn entry(&self, idx: u64) -> anyhow::Result<&ChunkEntry> {
        self.entries.get(idx as usize).ok_or_else(|| {
            anyhow::anyhow!(
                "chunk index {} out of range (total {})",
                idx,
                self.header.chunk_count
            )
        })
    }

    /// Read the compressed bytes of chunk `idx` and verify their checksum.
    fn fetch_compressed(&mut self, idx: u64) -> anyhow::Result<(ChunkEntry, Vec<u8>)> {
        let entry = self.entry(idx)?.clone();

        self.file.seek(SeekFrom::Start(entry.offset))?;
        let mut compressed = vec![0u8; entry.compressed_len as usize];
        self.file
            .read_exact(&mut compressed)
            .with_context(|| format!("reading chunk {idx}"))?;

        if self.header.has_flag(FLAG_HAS_CHECKSUM) {
            let computed = xxh3_64(&compressed);
            if computed != entry.checksum {
                anyhow::bail!(
                    "chunk {} checksum mismatch: expected {:016x}, got {:016x}",
                    idx,
                    entry.checksum,
                    computed
                );
            }
        }
        Ok((entry, compressed))
    }

    /// Decompress chunk `idx` into `out`, whose valid region afterwards is
    /// exactly the chunk's raw bytes. `out` is grown as needed and can be
    /// reused across calls.
    pub fn read_chunk_into(&mut self, idx: u64, out: &mut ChunkBuffer) -> anyhow::Result<usize> {
        let (entry, compressed) = self.fetch_compressed(idx)?;
        let raw_len = out
            .decompress_from(self.codec.as_ref(), &compressed, entry.raw_len as usize)
            .with_context(|| format!("decompressing chunk {idx}"))?;
        debug!(chunk = idx, raw_len, "chunk read");
        Ok(raw_len)
    }

    /// Decompress and return the raw bytes of chunk `idx`.
    ///
    /// Only the chunk at `entries[idx].offset` is read from disk.
    pub fn read_chunk(&mut self, idx: u64) -> anyhow::Result<Vec<u8>> {
        let mut out = ChunkBuffer::default();
        self.read_chunk_into(idx, &mut out)?;
        Ok(out.into_vec())
    }

    /// Decompress and return exactly `len` bytes starting at raw byte offset
    /// `start` within the logical (uncompressed) column, clamped to its end.
    pub fn read_range(&mut self, start: u64, len: u64) -> anyhow::Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }

        let raw_total = self.raw_size();
        if start >= raw_total {
            anyhow::bail!(
                "read_range start {} is beyond raw size {}",
                start,
                raw_total
            );
        }

        let end = start.saturating_add(len).min(raw_total);
        let chunk_size = self.header.chunk_size as u64;
        let first_chunk = start / chunk_size;
        let last_chunk = (end - 1) / chunk_size;

        let mut result = Vec::with_capacity((end - start) as usize);
        let mut scratch = ChunkBuffer::with_capacity(chunk_size as usize);

        for chunk_idx in first_chunk..=last_chunk {
            self.read_chunk_into(chunk_idx, &mut scratch)?;
            let chunk_raw = scratch.as_slice();
            let chunk_start = chunk_idx * chunk_size;

            let slice_start = if chunk_idx == first_chunk {
                (start - chunk_start) as usize
            } else {
                0
            };
            let slice_end = if chunk_idx == last_chunk {
                ((end - chunk_start) as usize).min(chunk_raw.len())
            } else {
                chunk_raw.len()
            };

            result.extend_from_slice(&chunk_raw[slice_start..slice_end]);
        }

        Ok(result)
    }

    /// Decompress every chunk and return the concatenated raw column.
    ///
    /// Compressed chunks are fetched sequentially, then decoded in parallel on
    /// the rayon pool, each into its own slice of the output.
    pub fn read_all(&mut self) -> anyhow::Result<Vec<u8>> {
        let mut compressed = Vec::with_capacity(self.entries.len());
        for idx in 0..self.chunk_count() {
            compressed.push(self.fetch_compressed(idx)?);
        }

        let mut raw = vec![0u8; self.raw_size() as usize];
        let mut slots = Vec::with_capacity(compressed.len());
        let mut rest = raw.as_mut_slice();
        for (entry, _) in &compressed {
            let (slot, tail) = std::mem::take(&mut rest).split_at_mut(entry.raw_len as usize);
            slots.push(slot);
            rest = tail;
        }

        let codec = self.codec.as_ref();
        slots
            .into_par_iter()
            .zip(compressed.par_iter())
            .enumerate()
            .try_for_each(|(idx, (slot, (_, bytes)))| {
                codec
                    .decompress_exact(bytes, slot)
                    .map(|_| ())
                    .with_context(|| format!("decompressing chunk {idx}"))
            })?;

        debug!(chunks = compressed.len(), raw_len = raw.len(), "all chunks read");
        Ok(raw)
    }
}
