use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use chunkpress_codecs::{all_codecs, codec_by_id, codec_by_raw_id, GzipCodec, ZstdCodec};
use chunkpress_core::format::DEFAULT_CHUNK_SIZE;
use chunkpress_core::{read_header, ChunkBuffer, ChunkReader, ChunkWriter, Codec, CodecId};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "chunkpress",
    about = "Compress columns into independently decodable chunks, inspect them, and read them back",
    version
)]
struct Cli {
    /// Worker threads for parallel decompression (default: all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a chunk file
    Compress {
        /// Source file to compress ("-" reads stdin)
        input: PathBuf,
        /// Destination chunk file
        output: PathBuf,
        /// Codec: passthrough | snappy | zstd | lz4 | lz4-length-prefixed | gzip
        #[arg(short, long, default_value = "lz4")]
        codec: String,
        /// Compression level (zstd 1–22, gzip 0–9; ignored by other codecs)
        #[arg(long)]
        level: Option<i32>,
        /// Raw bytes per chunk (default: 65536 = 64 KB)
        #[arg(short = 's', long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: u32,
    },
    /// Fully decompress a chunk file back to raw bytes
    Decompress {
        /// Source chunk file
        input: PathBuf,
        /// Destination file ("-" writes to stdout)
        output: PathBuf,
    },
    /// Print header metadata and chunk index statistics
    Inspect {
        /// Chunk file to inspect
        file: PathBuf,
        /// Print per-chunk details
        #[arg(long)]
        chunks: bool,
    },
    /// Decompress a single chunk by index
    ///
    /// Only the requested chunk is read from disk.
    ReadChunk {
        /// Chunk file
        file: PathBuf,
        /// Zero-based chunk index to read
        #[arg(short, long)]
        index: u64,
        /// Write raw bytes to a file instead of printing a hex dump
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Benchmark random-access reads across N randomly chosen chunks
    Bench {
        /// Chunk file
        file: PathBuf,
        /// Number of random chunks to read
        #[arg(short, long, default_value_t = 1000)]
        count: u64,
        /// Fixed random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// List the available codecs and their identifiers
    Codecs,
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Registry instance, or a fresh one when a non-default level is requested.
fn codec_for_write(name: &str, level: Option<i32>) -> anyhow::Result<Arc<dyn Codec>> {
    let id: CodecId = name.parse()?;
    let codec: Arc<dyn Codec> = match (id, level) {
        (CodecId::Zstd, Some(level)) => Arc::new(ZstdCodec::new(level)),
        (CodecId::Gzip, Some(level)) => {
            let level = u32::try_from(level)
                .map_err(|_| anyhow::anyhow!("gzip level must be 0–9, got {}", level))?;
            Arc::new(GzipCodec::new(level))
        }
        _ => codec_by_id(id),
    };
    Ok(codec)
}

/// Open a chunk file with the codec named in its header.
fn open_reader(path: &Path) -> anyhow::Result<ChunkReader> {
    let header = read_header(path)?;
    let codec = codec_by_raw_id(header.codec_id)
        .with_context(|| format!("resolving codec of {}", path.display()))?;
    ChunkReader::open(path, codec)
}

fn human_bytes(n: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if n < 1024 {
        return format!("{} B", n);
    }
    let mut value = n as f64 / 1024.0;
    for unit in &UNITS[..UNITS.len() - 1] {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} {}", value, UNITS[UNITS.len() - 1])
}

/// One 16-byte row of a hex dump: offset, hex columns, printable ASCII.
fn hex_row(offset: usize, row: &[u8]) -> String {
    let hex: Vec<String> = row.iter().map(|b| format!("{:02x}", b)).collect();
    let ascii: String = row
        .iter()
        .map(|&b| if b == b' ' || b.is_ascii_graphic() { b as char } else { '.' })
        .collect();
    format!("  {:04x}  {:<47}  |{}|", offset, hex.join(" "), ascii)
}

/// `count` reproducible chunk indices in `0..chunk_count` (splitmix64).
fn sample_chunks(seed: u64, count: u64, chunk_count: u64) -> Vec<u64> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            (z ^ (z >> 31)) % chunk_count
        })
        .collect()
}

/// Nearest-rank percentile of an ascending, non-empty slice.
fn percentile(sorted: &[Duration], p: f64) -> Duration {
    let rank = ((sorted.len() as f64 * p).ceil() as usize).clamp(1, sorted.len());
    sorted[rank - 1]
}

fn throughput(bytes: u64, secs: f64) -> String {
    if secs <= 0.0 {
        return "n/a".to_string();
    }
    format!("{}/s", human_bytes((bytes as f64 / secs) as u64))
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compress(
    input: PathBuf,
    output: PathBuf,
    codec_name: &str,
    level: Option<i32>,
    chunk_size: u32,
) -> anyhow::Result<()> {
    let codec = codec_for_write(codec_name, level)?;
    let codec_display = codec.name();

    let mut writer = ChunkWriter::create(&output, codec, chunk_size)?;

    let mut src: Box<dyn Read> = if input.to_str() == Some("-") {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&input)
            .with_context(|| format!("opening input file {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let t0 = Instant::now();
    let mut bytes_read = 0u64;
    let mut buf = vec![0u8; chunk_size as usize];
    loop {
        let n = src.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write(&buf[..n])?;
        bytes_read += n as u64;
    }

    let chunk_count = writer.finish()?;
    let elapsed = t0.elapsed();

    let compressed_size = std::fs::metadata(&output)?.len();
    let ratio = if compressed_size == 0 {
        1.0
    } else {
        bytes_read as f64 / compressed_size as f64
    };

    eprintln!("  codec       : {}", codec_display);
    eprintln!("  chunk size  : {}", human_bytes(chunk_size as u64));
    eprintln!("  chunks      : {}", chunk_count);
    eprintln!("  raw size    : {}", human_bytes(bytes_read));
    eprintln!("  compressed  : {}", human_bytes(compressed_size));
    eprintln!("  ratio       : {:.2}x", ratio);
    eprintln!("  throughput  : {}", throughput(bytes_read, elapsed.as_secs_f64()));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_decompress(input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let mut reader = open_reader(&input)?;

    let mut dst: Box<dyn Write> = if output.to_str() == Some("-") {
        Box::new(io::stdout().lock())
    } else {
        Box::new(
            File::create(&output)
                .with_context(|| format!("creating output file {}", output.display()))?,
        )
    };

    let t0 = Instant::now();
    let raw = reader.read_all()?;
    dst.write_all(&raw)?;
    dst.flush()?;
    let elapsed = t0.elapsed();

    eprintln!("  chunks      : {}", reader.chunk_count());
    eprintln!("  raw size    : {}", human_bytes(raw.len() as u64));
    eprintln!("  throughput  : {}", throughput(raw.len() as u64, elapsed.as_secs_f64()));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_inspect(file: PathBuf, show_chunks: bool) -> anyhow::Result<()> {
    let reader = open_reader(&file)?;
    let file_size = std::fs::metadata(&file)?.len();
    let codec = reader.codec();

    println!("=== Chunk file: {} ===", file.display());
    println!();
    println!("  format version : {}", reader.header.version);
    println!("  codec          : {} (id={})", codec.name(), reader.header.codec_id);
    println!("  chunk size     : {}", human_bytes(reader.chunk_size() as u64));
    println!("  chunk count    : {}", reader.chunk_count());
    println!("  raw size       : {}", human_bytes(reader.raw_size()));
    println!("  compressed     : {}", human_bytes(reader.compressed_size()));
    println!("  file on disk   : {}", human_bytes(file_size));
    println!("  ratio          : {:.2}x", reader.ratio());
    println!("  flags          : 0x{:016x}", reader.header.flags);

    if show_chunks {
        println!();
        println!(
            "  {:>8}  {:>14}  {:>12}  {:>12}  {:>16}",
            "chunk", "file offset", "compressed", "raw", "checksum"
        );
        println!("  {}", "-".repeat(70));
        for (i, e) in reader.entries().iter().enumerate() {
            println!(
                "  {:>8}  {:>14}  {:>12}  {:>12}  {:016x}",
                i,
                e.offset,
                human_bytes(e.compressed_len as u64),
                human_bytes(e.raw_len as u64),
                e.checksum
            );
        }
    }

    Ok(())
}

fn run_read_chunk(file: PathBuf, index: u64, output: Option<PathBuf>) -> anyhow::Result<()> {
    let mut reader = open_reader(&file)?;
    let entry = reader.entries().get(index as usize).cloned().ok_or_else(|| {
        anyhow::anyhow!(
            "chunk index {} out of range (total {})",
            index,
            reader.chunk_count()
        )
    })?;

    eprintln!(
        "seeking to chunk {} (offset {} bytes from file start)...",
        index, entry.offset
    );

    let t0 = Instant::now();
    let raw = reader.read_chunk(index)?;
    let elapsed = t0.elapsed();

    eprintln!(
        "  decoded {} in {:.3}ms",
        human_bytes(raw.len() as u64),
        elapsed.as_secs_f64() * 1000.0
    );

    match output {
        Some(path) => {
            std::fs::write(&path, &raw)?;
            eprintln!("  written to {}", path.display());
        }
        None => {
            let preview = &raw[..raw.len().min(256)];
            println!(
                "--- chunk {} ({} bytes, first {} shown) ---",
                index,
                raw.len(),
                preview.len()
            );
            for (i, row) in preview.chunks(16).enumerate() {
                println!("{}", hex_row(i * 16, row));
            }
            if raw.len() > 256 {
                println!("  ... ({} bytes remaining not shown)", raw.len() - 256);
            }
        }
    }

    Ok(())
}

fn run_bench(file: PathBuf, count: u64, seed: u64) -> anyhow::Result<()> {
    let mut reader = open_reader(&file)?;
    let chunk_count = reader.chunk_count();

    if chunk_count == 0 {
        anyhow::bail!("file has no chunks");
    }
    if count == 0 {
        anyhow::bail!("--count must be at least 1");
    }

    let indices = sample_chunks(seed, count, chunk_count);
    eprintln!(
        "reading {} random chunks out of {}...",
        count, chunk_count
    );

    let mut scratch = ChunkBuffer::with_capacity(reader.chunk_size() as usize);
    let mut latencies = Vec::with_capacity(indices.len());
    let mut total_raw = 0u64;
    let t0 = Instant::now();
    for idx in indices {
        let t = Instant::now();
        total_raw += reader.read_chunk_into(idx, &mut scratch)? as u64;
        latencies.push(t.elapsed());
    }
    let elapsed = t0.elapsed().as_secs_f64();
    latencies.sort_unstable();

    println!();
    println!("=== Random Chunk Access Benchmark ===");
    println!("  chunks read : {}", count);
    println!("  total raw   : {}", human_bytes(total_raw));
    println!("  elapsed     : {:.3}s", elapsed);
    println!("  throughput  : {}", throughput(total_raw, elapsed));
    println!("  latency (µs):");
    for (label, p) in [("min", 0.0), ("p50", 0.50), ("p95", 0.95), ("p99", 0.99), ("max", 1.0)] {
        println!("    {:<4} : {}", label, percentile(&latencies, p).as_micros());
    }

    Ok(())
}

fn run_codecs() -> anyhow::Result<()> {
    let raw_len = DEFAULT_CHUNK_SIZE as usize;
    println!("  {:>4}  {:<22}  {:>22}", "id", "name", "bound for 64 KB chunk");
    for codec in all_codecs() {
        println!(
            "  {:>4}  {:<22}  {:>22}",
            codec.id().as_u16(),
            codec.name(),
            codec.max_compressed_len(raw_len)
        );
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring the decompression thread pool")?;
        debug!(threads, "rayon pool configured");
    }

    match cli.command {
        Commands::Compress {
            input,
            output,
            codec,
            level,
            chunk_size,
        } => run_compress(input, output, &codec, level, chunk_size),
        Commands::Decompress { input, output } => run_decompress(input, output),
        Commands::Inspect { file, chunks } => run_inspect(file, chunks),
        Commands::ReadChunk {
            file,
            index,
            output,
        } => run_read_chunk(file, index, output),
        Commands::Bench { file, count, seed } => run_bench(file, count, seed),
        Commands::Codecs => run_codecs(),
    }
}
