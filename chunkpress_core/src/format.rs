/// Magic bytes opening every chunk file.
pub const MAGIC: &[u8; 8] = b"CPRESS1\n";

/// Current (and only) on-disk format version.
pub const FORMAT_VERSION: u16 = 1;

/// Fixed size of the chunk file header in bytes.
///   magic[8] + version:u16 + codec_id:u16 + chunk_size:u32
///   + chunk_count:u64 + flags:u64 + reserved[16]
///   = 8 + 2 + 2 + 4 + 8 + 8 + 16 = 48
pub const HEADER_SIZE: u64 = 48;

/// Size of each ChunkEntry in the chunk index, in bytes.
///   offset:u64 + compressed_len:u32 + raw_len:u32 + checksum:u64
///   = 8 + 4 + 4 + 8 = 24
pub const CHUNK_ENTRY_SIZE: u64 = 24;

/// Size of the index footer (single u64 offset) in bytes.
pub const FOOTER_SIZE: u64 = 8;

/// Default chunk size: 64 KB.
pub const DEFAULT_CHUNK_SIZE: u32 = 64 * 1024;

/// Largest raw chunk any codec accepts: 1 GB. Keeps every bound and length
/// representable in the u32 fields of [`ChunkEntry`].
pub const MAX_CHUNK_SIZE: usize = 1 << 30;

// ── Flags ──────────────────────────────────────────────────────────────────

/// Each chunk carries an xxhash3-64 checksum of its compressed bytes.
pub const FLAG_HAS_CHECKSUM: u64 = 1 << 0;

// ── Header ─────────────────────────────────────────────────────────────────

/// Decoded representation of the 48-byte chunk file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u16,
    /// Raw [`CodecId`](crate::CodecId) value; resolved by the caller.
    pub codec_id: u16,
    /// Nominal raw bytes per chunk (the last chunk may be smaller).
    pub chunk_size: u32,
    pub chunk_count: u64,
    pub flags: u64,
}

impl FileHeader {
    /// Serialize to exactly `HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE as usize] {
        let mut buf = [0u8; HEADER_SIZE as usize];
        buf[..8].copy_from_slice(MAGIC);
        buf[8..10].copy_from_slice(&self.version.to_le_bytes());
        buf[10..12].copy_from_slice(&self.codec_id.to_le_bytes());
        buf[12..16].copy_from_slice(&self.chunk_size.to_le_bytes());
        buf[16..24].copy_from_slice(&self.chunk_count.to_le_bytes());
        buf[24..32].copy_from_slice(&self.flags.to_le_bytes());
        // reserved[16] stays zero
        buf
    }

    /// Deserialize from `HEADER_SIZE` bytes, checking the magic.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE as usize]) -> anyhow::Result<Self> {
        if &buf[..8] != MAGIC {
            anyhow::bail!("invalid magic bytes, not a chunk file");
        }
        Ok(Self {
            version: u16::from_le_bytes(buf[8..10].try_into()?),
            codec_id: u16::from_le_bytes(buf[10..12].try_into()?),
            chunk_size: u32::from_le_bytes(buf[12..16].try_into()?),
            chunk_count: u64::from_le_bytes(buf[16..24].try_into()?),
            flags: u64::from_le_bytes(buf[24..32].try_into()?),
        })
    }

    pub fn has_flag(&self, flag: u64) -> bool {
        self.flags & flag != 0
    }
}

// ── Chunk index entry ───────────────────────────────────────────────────────

/// One entry in the chunk index: where a compressed chunk lives and how big
/// it was before compression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkEntry {
    /// Byte offset of this chunk from the start of the file.
    pub offset: u64,
    pub compressed_len: u32,
    /// Length of the original chunk; sizes the decompression buffer.
    pub raw_len: u32,
    /// xxhash3-64 of the compressed bytes.
    pub checksum: u64,
}

impl ChunkEntry {
    /// Serialize to exactly `CHUNK_ENTRY_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; CHUNK_ENTRY_SIZE as usize] {
        let mut buf = [0u8; CHUNK_ENTRY_SIZE as usize];
        buf[0..8].copy_from_slice(&self.offset.to_le_bytes());
        buf[8..12].copy_from_slice(&self.compressed_len.to_le_bytes());
        buf[12..16].copy_from_slice(&self.raw_len.to_le_bytes());
        buf[16..24].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Deserialize from `CHUNK_ENTRY_SIZE` bytes.
    pub fn from_bytes(buf: &[u8; CHUNK_ENTRY_SIZE as usize]) -> anyhow::Result<Self> {
        Ok(Self {
            offset: u64::from_le_bytes(buf[0..8].try_into()?),
            compressed_len: u32::from_le_bytes(buf[8..12].try_into()?),
            raw_len: u32::from_le_bytes(buf[12..16].try_into()?),
            checksum: u64::from_le_bytes(buf[16..24].try_into()?),
        })
    }
}
