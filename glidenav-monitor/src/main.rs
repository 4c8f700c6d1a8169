//! glidenav: replay + live-monitor CLI for NMEA/FLARM navigation streams.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod live;
mod replay;

#[derive(Parser)]
#[command(
    name = "glidenav",
    version,
    about = "NMEA/FLARM navigation stream decoder"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a capture file and print the decoded navigation state
    Replay {
        /// Path to capture file (one sentence per line, `-` for stdin)
        file: PathBuf,

        /// Consumer cycle length in seconds
        #[arg(long, default_value = "1.0")]
        cycle: f64,

        /// Print the final state as JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Append every accepted/rejected raw line to this file
        #[arg(long)]
        log_raw: Option<PathBuf>,
    },

    /// Decode a live stream from stdin with a fixed-rate status cycle
    Live {
        /// Source name used in diagnostics
        #[arg(long, default_value = "gps0")]
        source: String,

        /// Consumer cycle length in seconds
        #[arg(long, default_value = "1.0")]
        cycle: f64,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Replay {
            file,
            cycle,
            json,
            log_raw,
        } => replay::run(file, cycle, json, log_raw),
        Commands::Live { source, cycle } => live::run(source, cycle),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
