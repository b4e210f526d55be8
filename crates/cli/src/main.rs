//! DBRC cache trace-replay CLI.
//!
//! This binary drives the cache model from the command line. It performs:
//! 1. **Configuration:** Load a JSON configuration file or fall back to the
//!    built-in defaults.
//! 2. **Replay:** Run an address trace (one hex address per line, optional
//!    `r`/`w` prefix) through the full timing path.
//! 3. **Reporting:** Print the hit/miss/latency statistics afterwards.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::info;

use dbrc_core::config::DbrcConfig;
use dbrc_core::sim::{load_trace, trace, System};

#[derive(Parser, Debug)]
#[command(
    name = "dbrc",
    author,
    version,
    about = "Dynamic Block Relocation Cache trace replayer",
    long_about = "Replay an address trace through the DBRC timing model.\n\n\
        Traces hold one access per line: a hex address, optionally prefixed\n\
        with `r` or `w`. Configuration is JSON (see DbrcConfig); the CLI\n\
        uses built-in defaults when no file is given.\n\n\
        Examples:\n  dbrc run traces/hello.trace\n  dbrc run traces/hello.trace --config dbrc.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace file and print statistics.
    Run {
        /// Trace file to replay.
        trace: PathBuf,

        /// JSON configuration file (defaults are used when omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { trace, config } => cmd_run(trace, config),
    }
}

/// Loads the configuration and trace, replays, and prints statistics.
fn cmd_run(trace_path: PathBuf, config_path: Option<PathBuf>) {
    let config = match config_path {
        Some(path) => {
            let content = fs::read_to_string(&path).unwrap_or_else(|e| {
                eprintln!("error reading config {}: {}", path.display(), e);
                process::exit(1);
            });
            serde_json::from_str::<DbrcConfig>(&content).unwrap_or_else(|e| {
                eprintln!("error parsing config {}: {}", path.display(), e);
                process::exit(1);
            })
        }
        None => DbrcConfig::default(),
    };

    let mut system = System::new(&config, 1).unwrap_or_else(|e| {
        eprintln!("configuration fault: {}", e);
        process::exit(1);
    });

    let ops = load_trace(&trace_path).unwrap_or_else(|e| {
        eprintln!("error loading trace {}: {}", trace_path.display(), e);
        process::exit(1);
    });

    info!(
        "replaying {} accesses, {} blocks of {} bytes, {} levels",
        ops.len(),
        system.cache().geometry().capacity,
        system.cache().geometry().block_size,
        system.cache().geometry().levels
    );

    trace::replay(&mut system, &ops);

    println!("replayed {} accesses in {} cycles", ops.len(), system.now());
    system.stats().print();
}
