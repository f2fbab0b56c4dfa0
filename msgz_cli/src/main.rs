use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use xxhash_rust::xxh3::xxh3_64;

use msgz_codecs::{CompressOptions, CompressorRegistry, Dispatcher, DEFAULT_DEFLATE_LEVEL, DEFAULT_ZSTD_LEVEL};
use msgz_core::{Algorithm, ChunkedBuffer, SplitMode, DEFAULT_CHUNK_SIZE};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "msgz",
    about = "Compress and decompress message payloads the way the RPC send/receive path does",
    version
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Chunking options shared by every command.
#[derive(clap::Args)]
struct Layout {
    /// Capacity of each output chunk in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    /// Split the input into chunks of this many bytes before processing
    #[arg(long, default_value_t = 64 * 1024)]
    split: usize,
}

impl Layout {
    fn options(&self) -> CompressOptions {
        CompressOptions::default().with_chunk_size(self.chunk_size)
    }
}

/// Layout plus encoder levels, for commands that compress.
#[derive(clap::Args)]
struct Tuning {
    /// DEFLATE level for deflate and gzip (0–9)
    #[arg(long, default_value_t = DEFAULT_DEFLATE_LEVEL)]
    level: u32,
    /// Zstd compression level (1–22)
    #[arg(long, default_value_t = DEFAULT_ZSTD_LEVEL)]
    zstd_level: i32,
    #[command(flatten)]
    layout: Layout,
}

impl Tuning {
    fn options(&self) -> CompressOptions {
        self.layout
            .options()
            .with_deflate_level(self.level)
            .with_zstd_level(self.zstd_level)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a payload; falls back to a verbatim copy when that is not smaller
    Compress {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        /// Destination file ("-" writes stdout)
        output: PathBuf,
        /// Algorithm: identity | deflate | gzip | snappy | zstd | lz4
        #[arg(short, long, default_value = "gzip")]
        algorithm: Algorithm,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Decompress a payload produced with the given algorithm
    Decompress {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        /// Destination file ("-" writes stdout)
        output: PathBuf,
        /// Algorithm the payload was compressed with
        #[arg(short, long)]
        algorithm: Algorithm,
        #[command(flatten)]
        layout: Layout,
    },
    /// List the compressors in the built-in registry
    List,
    /// Round-trip a file through every algorithm and report the results
    Probe {
        /// File to probe ("-" reads stdin)
        input: PathBuf,
        #[command(flatten)]
        tuning: Tuning,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn is_stdio(path: &Path) -> bool {
    path.to_str() == Some("-")
}

/// Read a whole payload and cut it into `split`-byte chunks.
fn read_payload(path: &Path, split: usize) -> anyhow::Result<ChunkedBuffer> {
    let mut data = Vec::new();
    if is_stdio(path) {
        io::stdin().lock().read_to_end(&mut data)?;
    } else {
        File::open(path)
            .with_context(|| format!("opening input file {:?}", path))?
            .read_to_end(&mut data)?;
    }
    Ok(ChunkedBuffer::from(Bytes::from(data)).resplit(SplitMode::Every(split)))
}

fn write_payload(path: &Path, payload: &ChunkedBuffer) -> anyhow::Result<()> {
    let mut dst: Box<dyn Write> = if is_stdio(path) {
        Box::new(io::stdout().lock())
    } else {
        Box::new(File::create(path).with_context(|| format!("creating output file {:?}", path))?)
    };
    for chunk in payload {
        dst.write_all(chunk)?;
    }
    dst.flush()?;
    Ok(())
}

fn ratio(raw: usize, encoded: usize) -> f64 {
    if encoded == 0 {
        return 1.0;
    }
    raw as f64 / encoded as f64
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compress(input: PathBuf, output: PathBuf, algorithm: Algorithm, tuning: Tuning) -> anyhow::Result<()> {
    let payload = read_payload(&input, tuning.layout.split)?;
    let dispatcher = Dispatcher::new(tuning.options());

    let t0 = Instant::now();
    let mut compressed = ChunkedBuffer::new();
    let applied = dispatcher.compress(algorithm, &payload, &mut compressed);
    let elapsed = t0.elapsed();

    write_payload(&output, &compressed)?;

    eprintln!("  algorithm   : {}", algorithm);
    eprintln!("  applied     : {}", applied);
    eprintln!("  raw size    : {}", human_bytes(payload.len() as u64));
    eprintln!("  output size : {}", human_bytes(compressed.len() as u64));
    eprintln!("  chunks      : {} in, {} out", payload.chunk_count(), compressed.chunk_count());
    eprintln!("  ratio       : {:.2}x", ratio(payload.len(), compressed.len()));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    if !applied && algorithm != Algorithm::None {
        eprintln!("  note        : stored uncompressed; decompress with --algorithm identity");
    }
    Ok(())
}

fn run_decompress(input: PathBuf, output: PathBuf, algorithm: Algorithm, layout: Layout) -> anyhow::Result<()> {
    let payload = read_payload(&input, layout.split)?;
    let dispatcher = Dispatcher::new(layout.options());

    let t0 = Instant::now();
    let mut restored = ChunkedBuffer::new();
    dispatcher
        .decompress(algorithm, &payload, &mut restored)
        .with_context(|| format!("decompressing {:?} as {}", input, algorithm))?;
    let elapsed = t0.elapsed();

    write_payload(&output, &restored)?;

    eprintln!("  algorithm   : {}", algorithm);
    eprintln!("  input size  : {}", human_bytes(payload.len() as u64));
    eprintln!("  raw size    : {}", human_bytes(restored.len() as u64));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_list() -> anyhow::Result<()> {
    let registry = CompressorRegistry::new();
    println!("  {:<10}  {:>4}", "encoding", "id");
    println!("  {}", "-".repeat(16));
    for name in registry.names() {
        let id = name
            .parse::<Algorithm>()
            .map(|a| a.id().to_string())
            .unwrap_or_else(|_| "-".to_string());
        println!("  {:<10}  {:>4}", name, id);
    }
    Ok(())
}

fn run_probe(input: PathBuf, tuning: Tuning) -> anyhow::Result<()> {
    let payload = read_payload(&input, tuning.layout.split)?;
    let dispatcher = Dispatcher::new(tuning.options());
    let digest = xxh3_64(&payload.to_bytes());

    println!("=== {:?}: {} ({} chunks), xxh3 {:016x} ===", input, human_bytes(payload.len() as u64), payload.chunk_count(), digest);
    println!();
    println!(
        "  {:<9}  {:>7}  {:>12}  {:>8}  {:>10}  {:>9}",
        "algorithm", "applied", "output", "ratio", "round trip", "elapsed"
    );
    println!("  {}", "-".repeat(66));

    for algorithm in Algorithm::ALL {
        let t0 = Instant::now();
        let mut compressed = ChunkedBuffer::new();
        let applied = dispatcher.compress(algorithm, &payload, &mut compressed);

        let used = if applied { algorithm } else { Algorithm::None };
        let mut restored = ChunkedBuffer::new();
        dispatcher
            .decompress(used, &compressed, &mut restored)
            .with_context(|| format!("{} round trip", algorithm))?;
        let elapsed = t0.elapsed();

        let verdict = if xxh3_64(&restored.to_bytes()) == digest { "ok" } else { "MISMATCH" };
        if verdict != "ok" {
            tracing::error!(%algorithm, "round trip digest mismatch");
        }
        println!(
            "  {:<9}  {:>7}  {:>12}  {:>7.2}x  {:>10}  {:>7.2}ms",
            algorithm.name(),
            applied,
            human_bytes(compressed.len() as u64),
            ratio(payload.len(), compressed.len()),
            verdict,
            elapsed.as_secs_f64() * 1000.0
        );
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Compress {
            input,
            output,
            algorithm,
            tuning,
        } => run_compress(input, output, algorithm, tuning),
        Commands::Decompress {
            input,
            output,
            algorithm,
            layout,
        } => run_decompress(input, output, algorithm, layout),
        Commands::List => run_list(),
        Commands::Probe { input, tuning } => run_probe(input, tuning),
    }
}
