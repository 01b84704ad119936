use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lz4block::{DecompressConfig, Decompressor, StreamDecompressor};

#[derive(Parser, Debug)]
#[command(name = "lz4block")]
#[command(about = "Decompress a raw LZ4 block stream")]
#[command(version)]
struct Args {
    /// Input LZ4 block stream (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (use - for stdout)
    #[arg(short, long)]
    output: PathBuf,

    /// Read and write buffer size in bytes
    #[arg(long, default_value = "131072")]
    buffer_size: usize,

    /// Show verbose statistics
    #[arg(short, long)]
    verbose: bool,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: tracing::Level,
}

const EXIT_ERROR: u8 = 1;

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let is_stdin = args.input.to_str() == Some("-");
    let is_stdout = args.output.to_str() == Some("-");

    // The decoder buffers its input itself
    let input: Box<dyn Read> =
        if is_stdin { Box::new(io::stdin().lock()) } else { Box::new(File::open(&args.input)?) };

    let output: Box<dyn Write> = if is_stdout {
        Box::new(io::stdout().lock())
    } else {
        Box::new(BufWriter::new(File::create(&args.output)?))
    };

    let config = DecompressConfig { buffer_size: args.buffer_size };
    tracing::info!(input = %args.input.display(), buffer_size = config.buffer_size, "decompressing");

    let start = std::time::Instant::now();
    let stats = StreamDecompressor::new(config).decompress(input, output)?;
    let elapsed = start.elapsed();

    if args.verbose {
        eprintln!("Decompression complete:");
        eprintln!("  Input bytes:      {}", stats.input_bytes);
        eprintln!("  Output bytes:     {}", stats.output_bytes);
        eprintln!("  Sequences:        {}", stats.sequences);
        eprintln!("  Time:             {:.2?}", elapsed);
        eprintln!(
            "  Throughput:       {:.1} MB/s",
            stats.output_bytes as f64 / elapsed.as_secs_f64() / 1_000_000.0
        );
    }

    Ok(())
}
