//! Decoding, traversal, and replay of rotated replication update logs.
//!
//! A replication master appends every mutating database operation to a
//! numbered sequence of update-log files. This crate reads those files
//! back, one record at a time, and replays them into a
//! [`ReplayHandler`](ulog_core::ReplayHandler).
//!
//! # Architecture
//!
//! - [`LogFileReader`] decodes records from any `Read` source
//! - [`LogDirectory`] finds the contiguous run of numbered files in a directory
//! - [`LogDirReader`] chains that run into one record stream
//! - [`replay`] feeds any [`RecordSource`] into a handler
//!
//! # Format
//!
//! ```text
//! [MAGIC 0xC9] [timestamp u64] [server_id u16] [message_id u16] [body_size u32]
//! [reserved u8] [command u8] [fields ...] [expiration u8]
//! ```
//!
//! All integers are big-endian. The field layout depends on the command's
//! [`PayloadShape`](ulog_core::PayloadShape).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod config;
pub mod dir;
pub mod dispatch;
pub mod error;
pub mod reader;
pub mod source;

pub use config::{ConfigError, GapPolicy, ReaderConfig};
pub use dir::{LogDirReader, LogDirectory, LogFileEntry, LogFiles};
pub use dispatch::{dispatch, putlist_pairs, replay, Dispatch, ReplayStats};
pub use error::{HeaderFault, SequenceGap, UlogError};
pub use reader::{HeaderIter, LogFileReader, RecordIter};
pub use source::{open_source, LogSource, RecordSource};
