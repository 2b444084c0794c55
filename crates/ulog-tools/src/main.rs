//! ulogctl
//!
//! Command-line inspection of update-log files and rotated log directories.
//!
//! ```bash
//! ulogctl info 00000001.ulog
//! ulogctl export /var/lib/db/ulog
//! ulogctl summary /var/lib/db/ulog
//! ulogctl find-rts /var/lib/db/ulog 1500000000000000
//! ulogctl key-history /var/lib/db/ulog user:42
//! ```
//!
//! Output goes to stdout; diagnostics go to stderr and are filtered by
//! `RUST_LOG` or `--log-level` (default `warn`).

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use ulog_core::Timestamp;
use ulog_replay::{open_source, GapPolicy, LogDirectory, ReaderConfig};
use ulog_tools::inspect;

#[derive(Parser)]
#[command(name = "ulogctl")]
#[command(about = "Inspect replication update logs", long_about = None)]
struct Cli {
    /// Log file extension, without the dot
    #[arg(long, global = true, default_value = "ulog")]
    ext: String,

    /// Largest record body accepted, in bytes
    #[arg(long, global = true, default_value_t = ReaderConfig::default().max_body_size)]
    max_body_size: u32,

    /// Fail instead of stopping when a directory has a sequence gap
    #[arg(long, global = true)]
    strict_gaps: bool,

    /// Log filter for diagnostics, e.g. `debug` or `ulog_replay=trace`
    #[arg(long, global = true, env = "RUST_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header of the first record in a file
    Info {
        /// Log file
        file: PathBuf,
    },
    /// Print every record with its body in hex
    Export {
        /// Log file or directory
        path: PathBuf,
    },
    /// Print every record with decoded, readable arguments
    PrettyExport {
        /// Log file or directory
        path: PathBuf,
        /// Maximum width of the argument column
        #[arg(long, default_value_t = inspect::DEFAULT_PRETTY_WIDTH)]
        max_length: usize,
    },
    /// Print call counts and body sizes per command
    Summary {
        /// Log file or directory
        path: PathBuf,
    },
    /// Print which file of a directory contains a timestamp
    FindRts {
        /// Log directory
        dir: PathBuf,
        /// Timestamp in microseconds
        ts: u64,
    },
    /// Print the files of a directory that end before a timestamp
    UlogsBefore {
        /// Log directory
        dir: PathBuf,
        /// Timestamp in microseconds
        ts: u64,
    },
    /// Print every operation on one key
    KeyHistory {
        /// Log file or directory
        path: PathBuf,
        /// Key to follow
        key: String,
    },
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

impl Cli {
    fn reader_config(&self) -> Result<ReaderConfig> {
        let config = ReaderConfig {
            extension: self.ext.clone(),
            max_body_size: self.max_body_size,
            gap_policy: if self.strict_gaps {
                GapPolicy::Fail
            } else {
                GapPolicy::Stop
            },
            ..ReaderConfig::default()
        };
        config.validate().context("invalid reader options")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    let config = cli.reader_config()?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match &cli.command {
        Commands::Info { file } => {
            let header = inspect::first_header(file, &config)
                .with_context(|| format!("failed to read {}", file.display()))?;
            if let Some(h) = header {
                writeln!(out, "{}\t{}:{}", h.timestamp, h.server_id, h.message_id)?;
            }
        }
        Commands::Export { path } => {
            let mut source = open(path, &config)?;
            for row in inspect::export_rows(&mut source) {
                writeln!(out, "{}", row.context("export failed")?)?;
            }
        }
        Commands::PrettyExport { path, max_length } => {
            let mut source = open(path, &config)?;
            for row in inspect::pretty_rows(&mut source, *max_length) {
                writeln!(out, "{}", row.context("export failed")?)?;
            }
        }
        Commands::Summary { path } => {
            let mut source = open(path, &config)?;
            let summary = inspect::command_summary(&mut source).context("summary failed")?;
            writeln!(out, "{:>12}{:>16}{:>16}", "FUNCTION", "CALLS", "SIZE")?;
            for (name, totals) in &summary {
                writeln!(out, "{:>12}{:>16}{:>16}", name, totals.calls, totals.bytes)?;
            }
        }
        Commands::FindRts { dir, ts } => {
            let logs = open_dir(dir, &config)?;
            match inspect::locate_timestamp(&logs, Timestamp(*ts))? {
                Some(location) => writeln!(out, "{location}")?,
                None => tracing::warn!(dir = %dir.display(), "no records in log directory"),
            }
        }
        Commands::UlogsBefore { dir, ts } => {
            let logs = open_dir(dir, &config)?;
            for path in inspect::files_before(&logs, Timestamp(*ts))? {
                writeln!(out, "{}", path.display())?;
            }
        }
        Commands::KeyHistory { path, key } => {
            let mut source = open(path, &config)?;
            for event in inspect::key_history(&mut source, key.as_bytes())? {
                writeln!(out, "{event}")?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

fn open(path: &Path, config: &ReaderConfig) -> Result<ulog_replay::LogSource> {
    open_source(path, config).with_context(|| format!("failed to open {}", path.display()))
}

fn open_dir(dir: &Path, config: &ReaderConfig) -> Result<LogDirectory> {
    LogDirectory::open(dir, config)
        .with_context(|| format!("failed to scan {}", dir.display()))
}
