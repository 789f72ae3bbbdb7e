/// Integration tests for the chunk file writer/reader: every chunk can be read
/// on its own, through whichever codec the file header names.
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Arc;

use chunkpress_codecs::{codec_by_id, codec_by_raw_id, Lz4Codec, PassThroughCodec, ZstdCodec};
use chunkpress_core::format::DEFAULT_CHUNK_SIZE;
use chunkpress_core::{read_header, ChunkBuffer, ChunkReader, ChunkWriter, CodecId};
use tempfile::TempDir;

/// Generate `len` deterministic bytes using a simple LCG.
fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (rng >> 56) as u8
        })
        .collect()
}

/// Generate `len` highly compressible bytes (repeating pattern).
fn compressible_bytes(len: usize) -> Vec<u8> {
    let pattern = b"the quick brown fox jumps over the lazy dog. ";
    (0..len).map(|i| pattern[i % pattern.len()]).collect()
}

// ── helpers ───────────────────────────────────────────────────────────────

fn temp_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(format!("{name}.cpress"))
}

fn write_file(path: &PathBuf, id: CodecId, chunk_size: u32, data: &[u8]) -> u64 {
    let mut w = ChunkWriter::create(path, codec_by_id(id), chunk_size).unwrap();
    w.write(data).unwrap();
    w.finish().unwrap()
}

// ── tests ──────────────────────────────────────────────────────────────────

#[test]
fn test_roundtrip_every_codec() {
    let dir = tempfile::tempdir().unwrap();
    let data = compressible_bytes(4 * DEFAULT_CHUNK_SIZE as usize + 1234);

    for id in CodecId::ALL {
        let path = temp_path(&dir, id.name());
        let chunks = write_file(&path, id, DEFAULT_CHUNK_SIZE, &data);
        assert_eq!(chunks, 5, "{id}: 4 full + 1 partial");

        let mut r = ChunkReader::open(&path, codec_by_id(id)).unwrap();
        let mut reconstructed = Vec::new();
        for i in 0..r.chunk_count() {
            reconstructed.extend(r.read_chunk(i).unwrap());
        }
        assert_eq!(reconstructed, data, "{id} round-trip should be byte-exact");
        assert_eq!(r.raw_size(), data.len() as u64);
    }
}

#[test]
fn test_codec_resolved_from_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "resolve");
    let data = pseudo_random_bytes(100_000, 5);
    write_file(&path, CodecId::Snappy, 4096, &data);

    let header = read_header(&path).unwrap();
    assert_eq!(header.codec_id, CodecId::Snappy.as_u16());
    assert_eq!(header.chunk_size, 4096);

    let codec = codec_by_raw_id(header.codec_id).unwrap();
    let mut r = ChunkReader::open(&path, codec).unwrap();
    assert_eq!(r.read_all().unwrap(), data);
}

#[test]
fn test_random_access_skips_prior_chunks() {
    const NUM_CHUNKS: usize = 16;
    const TARGET_CHUNK: u64 = 12;

    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "random_access");
    let data = pseudo_random_bytes(NUM_CHUNKS * DEFAULT_CHUNK_SIZE as usize, 0xDEAD_BEEF);

    let chunk_count = write_file(&path, CodecId::Zstd, DEFAULT_CHUNK_SIZE, &data);
    assert_eq!(chunk_count, NUM_CHUNKS as u64);

    let mut r = ChunkReader::open(&path, Arc::new(ZstdCodec::default())).unwrap();
    let raw = r.read_chunk(TARGET_CHUNK).unwrap();

    let start = TARGET_CHUNK as usize * DEFAULT_CHUNK_SIZE as usize;
    let end = start + DEFAULT_CHUNK_SIZE as usize;
    assert_eq!(raw.as_slice(), &data[start..end]);
}

#[test]
fn test_read_chunk_into_reuses_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "reuse");
    let data = compressible_bytes(3 * 1000 + 10);
    write_file(&path, CodecId::Lz4, 1000, &data);

    let mut r = ChunkReader::open(&path, Arc::new(Lz4Codec)).unwrap();
    let mut buf = ChunkBuffer::with_capacity(1000);
    for i in 0..r.chunk_count() {
        let n = r.read_chunk_into(i, &mut buf).unwrap();
        let start = i as usize * 1000;
        assert_eq!(buf.as_slice(), &data[start..start + n]);
    }
    assert_eq!(buf.len(), 10, "last chunk is the partial one");
    assert_eq!(buf.capacity(), 1000);
}

#[test]
fn test_read_range_crosses_chunk_boundary() {
    let chunk_size = 1024u32;
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "read_range");
    let data = compressible_bytes(4 * chunk_size as usize);
    write_file(&path, CodecId::Gzip, chunk_size, &data);

    let mut r = ChunkReader::open(&path, codec_by_id(CodecId::Gzip)).unwrap();

    // Straddles the boundary between chunk 0 and chunk 1
    let start = chunk_size as u64 - 100;
    let result = r.read_range(start, 300).unwrap();
    assert_eq!(result.as_slice(), &data[start as usize..start as usize + 300]);

    // Clamped at the end of the column
    let tail = r.read_range(data.len() as u64 - 10, 1000).unwrap();
    assert_eq!(tail.as_slice(), &data[data.len() - 10..]);

    assert!(r.read_range(data.len() as u64, 1).is_err());
}

#[test]
fn test_read_all_matches_sequential_reads() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "read_all");
    let mut data = compressible_bytes(200_000);
    data.extend(pseudo_random_bytes(57_123, 8));
    write_file(&path, CodecId::Lz4LengthPrefixed, 8192, &data);

    let mut r = ChunkReader::open(&path, codec_by_id(CodecId::Lz4LengthPrefixed)).unwrap();
    assert_eq!(r.read_all().unwrap(), data);
}

#[test]
fn test_codec_mismatch_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "codec_mismatch");
    write_file(&path, CodecId::Zstd, DEFAULT_CHUNK_SIZE, b"hello world test data for codec mismatch");

    let result = ChunkReader::open(&path, Arc::new(Lz4Codec));
    let err = result.err().unwrap().to_string();
    assert!(
        err.contains("codec mismatch"),
        "error message should mention codec mismatch, got: {err}"
    );
}

#[test]
fn test_single_partial_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "single_chunk");
    let data = b"a small payload that fits in one partial chunk";

    assert_eq!(write_file(&path, CodecId::PassThrough, DEFAULT_CHUNK_SIZE, data), 1);

    let mut r = ChunkReader::open(&path, Arc::new(PassThroughCodec)).unwrap();
    assert_eq!(r.chunk_count(), 1);
    assert_eq!(r.read_chunk(0).unwrap().as_slice(), data.as_slice());
    assert!(r.read_chunk(1).is_err());
}

#[test]
fn test_empty_file_has_no_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "empty");
    assert_eq!(write_file(&path, CodecId::Zstd, DEFAULT_CHUNK_SIZE, b""), 0);

    let mut r = ChunkReader::open(&path, codec_by_id(CodecId::Zstd)).unwrap();
    assert_eq!(r.chunk_count(), 0);
    assert!(r.read_all().unwrap().is_empty());
    assert_eq!(r.ratio(), 1.0);
}

#[test]
fn test_incompressible_data_no_size_gain() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "incompressible");
    let data = pseudo_random_bytes(DEFAULT_CHUNK_SIZE as usize * 4, 0x1234_5678);
    write_file(&path, CodecId::Zstd, DEFAULT_CHUNK_SIZE, &data);

    let r = ChunkReader::open(&path, codec_by_id(CodecId::Zstd)).unwrap();
    let ratio = r.ratio();
    assert!(
        ratio < 1.10,
        "zstd on random data should not meaningfully compress: ratio={:.4}",
        ratio
    );
}

#[test]
fn test_damaged_chunk_fails_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "damaged");
    let data = compressible_bytes(3 * 4096);
    write_file(&path, CodecId::Snappy, 4096, &data);

    let target = {
        let r = ChunkReader::open(&path, codec_by_id(CodecId::Snappy)).unwrap();
        r.entries()[1].clone()
    };
    let mut f = OpenOptions::new().write(true).open(&path).unwrap();
    f.seek(SeekFrom::Start(target.offset + 1)).unwrap();
    f.write_all(&[0xEE]).unwrap();
    drop(f);

    let mut r = ChunkReader::open(&path, codec_by_id(CodecId::Snappy)).unwrap();
    assert!(r.read_chunk(0).is_ok());
    let err = r.read_chunk(1).unwrap_err().to_string();
    assert!(err.contains("checksum"), "got: {err}");
    assert!(r.read_all().is_err());
}

#[test]
fn test_invalid_chunk_size_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "zero_chunk");
    assert!(ChunkWriter::create(&path, codec_by_id(CodecId::Lz4), 0).is_err());
}

#[test]
fn test_foreign_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "foreign");
    std::fs::write(&path, vec![0u8; 128]).unwrap();

    assert!(read_header(&path).is_err());
    assert!(ChunkReader::open(&path, codec_by_id(CodecId::Lz4)).is_err());
}

// ── damaged headers and indexes ────────────────────────────────────────────

fn patch(path: &PathBuf, pos: u64, bytes: &[u8]) {
    let mut f = OpenOptions::new().write(true).open(path).unwrap();
    f.seek(SeekFrom::Start(pos)).unwrap();
    f.write_all(bytes).unwrap();
}

/// File position of index entry `idx`, taken from the footer.
fn entry_pos(path: &PathBuf, idx: u64) -> u64 {
    let bytes = std::fs::read(path).unwrap();
    let footer: [u8; 8] = bytes[bytes.len() - 8..].try_into().unwrap();
    u64::from_le_bytes(footer) + idx * 24
}

#[test]
fn test_huge_chunk_count_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "huge_count");
    write_file(&path, CodecId::Lz4, 1024, &compressible_bytes(4096));

    // chunk_count lives at header bytes 16..24
    patch(&path, 16, &u64::MAX.to_le_bytes());

    assert_eq!(read_header(&path).unwrap().chunk_count, u64::MAX);
    assert!(ChunkReader::open(&path, codec_by_id(CodecId::Lz4)).is_err());

    patch(&path, 16, &(u64::MAX / 24).to_le_bytes());
    assert!(ChunkReader::open(&path, codec_by_id(CodecId::Lz4)).is_err());
}

#[test]
fn test_zero_chunk_size_in_header_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "zero_size_header");
    write_file(&path, CodecId::Lz4, 1024, &compressible_bytes(4096));

    // chunk_size lives at header bytes 12..16
    patch(&path, 12, &0u32.to_le_bytes());
    let err = ChunkReader::open(&path, codec_by_id(CodecId::Lz4)).err().unwrap();
    assert!(err.to_string().contains("chunk size"), "got: {err}");
}

#[test]
fn test_short_interior_chunk_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "short_interior");
    write_file(&path, CodecId::PassThrough, 1024, &compressible_bytes(3 * 1024));

    // entry 0: compressed_len at +8, raw_len at +12
    let pos = entry_pos(&path, 0);
    patch(&path, pos + 8, &10u32.to_le_bytes());
    patch(&path, pos + 12, &10u32.to_le_bytes());

    let err = ChunkReader::open(&path, codec_by_id(CodecId::PassThrough))
        .err()
        .unwrap();
    assert!(err.to_string().contains("chunk 0"), "got: {err}");
}

#[test]
fn test_oversized_last_chunk_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "long_tail");
    write_file(&path, CodecId::Zstd, 1024, &compressible_bytes(2 * 1024 + 5));

    let pos = entry_pos(&path, 2);
    patch(&path, pos + 12, &1025u32.to_le_bytes());
    assert!(ChunkReader::open(&path, codec_by_id(CodecId::Zstd)).is_err());
}

#[test]
fn test_entry_outside_chunk_region_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "stray_offset");
    write_file(&path, CodecId::Snappy, 1024, &compressible_bytes(3 * 1024));

    // Chunk 1 pointing into the index itself
    let index_pos = entry_pos(&path, 0);
    patch(&path, entry_pos(&path, 1), &index_pos.to_le_bytes());
    assert!(ChunkReader::open(&path, codec_by_id(CodecId::Snappy)).is_err());

    // Chunk 1 pointing into the header
    patch(&path, entry_pos(&path, 1), &4u64.to_le_bytes());
    assert!(ChunkReader::open(&path, codec_by_id(CodecId::Snappy)).is_err());

    // Chunk 1 with an offset so large the end overflows
    patch(&path, entry_pos(&path, 1), &(u64::MAX - 2).to_le_bytes());
    assert!(ChunkReader::open(&path, codec_by_id(CodecId::Snappy)).is_err());
}
