//! Inspection utilities for update logs.
//!
//! [`inspect`] turns a log file or directory into rows and summaries
//! without printing anything; the `ulogctl` binary formats them.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod inspect;

pub use inspect::{
    command_summary, export_rows, files_before, first_header, key_history, locate_timestamp,
    pretty_rows, CommandTotals, ExportRow, ExportRows, KeyEvent, PrettyRow, PrettyRows,
    TimestampLocation, DEFAULT_PRETTY_WIDTH,
};
