//! seglog CLI
//!
//! Append to, read from, and inspect a single segment on disk.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use seglog::{Config, LogError, Result, Segment};
use tracing_subscriber::{fmt, EnvFilter};

/// seglog CLI
#[derive(Parser, Debug)]
#[command(name = "seglog-cli")]
#[command(about = "Inspect and edit a commit log segment")]
#[command(version)]
struct Args {
    /// Directory holding the segment files
    #[arg(short, long, default_value = "./seglog_data")]
    dir: PathBuf,

    /// Base offset of the segment
    #[arg(short, long, default_value = "0")]
    base_offset: u64,

    /// Store size in bytes at which the segment is full
    #[arg(long, default_value = "67108864")]
    max_store_bytes: u64,

    /// Index pre-allocation size in bytes
    #[arg(long, default_value = "12582912")]
    max_index_bytes: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append one record per argument
    Append {
        /// Record payloads
        #[arg(required = true)]
        payloads: Vec<String>,
    },

    /// Print the record at an absolute offset
    Read {
        /// The offset to read
        offset: u64,
    },

    /// Print every index entry
    Dump,

    /// Print segment sizes and offsets
    Stat,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,seglog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::builder()
        .max_store_bytes(args.max_store_bytes)
        .max_index_bytes(args.max_index_bytes)
        .initial_offset(args.base_offset)
        .build();
    config.validate()?;

    let mut segment = Segment::open(&args.dir, config.segment.initial_offset, &config.segment)?;

    let outcome = match args.command {
        Commands::Append { payloads } => append(&mut segment, &payloads),
        Commands::Read { offset } => segment.read(offset).map(|payload| {
            println!("{}", String::from_utf8_lossy(&payload));
        }),
        Commands::Dump => dump(&segment),
        Commands::Stat => {
            stat(&segment);
            Ok(())
        }
    };

    // Close even on failure so the index is shrunk back to its used size
    let closed = segment.close();
    outcome.and(closed)
}

fn append(segment: &mut Segment, payloads: &[String]) -> Result<()> {
    for payload in payloads {
        match segment.append(payload.as_bytes()) {
            Ok(offset) => println!("{}", offset),
            Err(e @ LogError::CapacityExceeded { .. }) => {
                tracing::warn!(next_offset = segment.next_offset(), "segment is full");
                return Err(e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn dump(segment: &Segment) -> Result<()> {
    println!("{:>20} {:>10} {:>20} {:>10}", "offset", "relative", "position", "length");
    for offset in segment.base_offset()..segment.next_offset() {
        let entry = segment.entry(offset)?;
        let payload = segment.read(offset)?;
        println!(
            "{:>20} {:>10} {:>20} {:>10}",
            offset,
            entry.offset,
            entry.position,
            payload.len()
        );
    }
    Ok(())
}

fn stat(segment: &Segment) {
    println!("base_offset: {}", segment.base_offset());
    println!("next_offset: {}", segment.next_offset());
    println!("records:     {}", segment.next_offset() - segment.base_offset());
    println!("store_size:  {}", segment.store_size());
    println!("index_size:  {}", segment.index_size());
    println!("maxed:       {}", segment.is_maxed());
}
