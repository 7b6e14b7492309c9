//! heapfile CLI
//!
//! Drives the heap file layer: seed a file with generated records, scan it
//! in either buffering mode, or time both modes against each other.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use heapfile::{heap, Config, HeapReader, Record, Result};

/// heapfile CLI
#[derive(Parser, Debug)]
#[command(name = "heapfile-cli")]
#[command(about = "Flat-file heap storage: generate and scan heap files")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a heap file seeded with numbered records
    Generate {
        /// Destination path
        #[arg(short, long)]
        path: PathBuf,

        /// Number of records to generate
        #[arg(short, long, default_value = "1000000")]
        records: usize,

        /// Records packed into each block
        #[arg(long, default_value = "1000")]
        records_per_block: usize,
    },

    /// Scan a heap file and report record count and elapsed time
    Read {
        /// Heap file to scan
        #[arg(short, long)]
        path: PathBuf,

        /// Disable read-ahead (single-buffer mode)
        #[arg(long)]
        single_buffer: bool,
    },

    /// Time a single-buffer scan against a dual-buffer scan of the same file
    Compare {
        /// Heap file to scan
        #[arg(short, long)]
        path: PathBuf,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,heapfile=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Generate {
            path,
            records,
            records_per_block,
        } => {
            let config = Config::builder()
                .records_per_block(records_per_block)
                .build();

            tracing::info!(
                records,
                records_per_block,
                block_size = config.block_size(),
                "creating heap file at {}",
                path.display()
            );

            let start = Instant::now();
            let header = heap::generate(&path, records, &config)?;
            tracing::info!(
                number_of_blocks = header.number_of_blocks,
                "file created in {} ms",
                start.elapsed().as_millis()
            );
        }

        Commands::Read {
            path,
            single_buffer,
        } => {
            let (count, ms) = timed_scan(&path, !single_buffer)?;
            let mode = if single_buffer {
                "single buffer"
            } else {
                "dual buffer"
            };
            tracing::info!("{} scan: read {} records in {} ms", mode, count, ms);
        }

        Commands::Compare { path } => {
            let (single_count, single_ms) = timed_scan(&path, false)?;
            let (dual_count, dual_ms) = timed_scan(&path, true)?;
            tracing::info!(
                "single buffer: read {} records in {} ms",
                single_count,
                single_ms
            );
            tracing::info!("dual buffer:   read {} records in {} ms", dual_count, dual_ms);
        }
    }

    Ok(())
}

/// Scan the whole file, returning (record count, elapsed milliseconds)
fn timed_scan(path: &PathBuf, dual_buffering: bool) -> Result<(usize, u128)> {
    let reader = HeapReader::open(path, dual_buffering)?;
    let start = Instant::now();
    let records: Vec<Record> = reader.read_all().collect::<Result<_>>()?;
    Ok((records.len(), start.elapsed().as_millis()))
}
