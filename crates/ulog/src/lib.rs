//! ulog: a reader and replayer for rotated replication update logs.
//!
//! This is the top-level facade crate that re-exports the public API of the
//! ulog sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use ulog::prelude::*;
//!
//! // One `out` record for key "k", built by hand.
//! let mut log = vec![MAGIC];
//! log.extend_from_slice(&1_500_000_000_000_000u64.to_be_bytes());
//! log.extend_from_slice(&1u16.to_be_bytes());
//! log.extend_from_slice(&7u16.to_be_bytes());
//! log.extend_from_slice(&8u32.to_be_bytes());
//! log.extend_from_slice(&[0xC8, 0x20, 0, 0, 0, 1, b'k', 0]);
//!
//! let records: Vec<DecodedRecord> = LogFileReader::new(log.as_slice())
//!     .records()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(records[0].command, Command::Out);
//! assert_eq!(records[0].args.key(), Some(&b"k"[..]));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `ulog-core` | Command table, record model, handler trait |
//! | [`replay`] | `ulog-replay` | Codecs, file and directory readers, replay |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Command table, record model, and identifiers (`ulog-core`).
///
/// Implement [`types::ReplayHandler`] to receive replayed operations.
pub use ulog_core as types;

/// Decoding, traversal, and replay (`ulog-replay`).
///
/// Read one file with [`replay::LogFileReader`], a rotated directory with
/// [`replay::LogDirectory`], and feed either into a handler with
/// [`replay::replay`].
pub use ulog_replay as replay;

/// Common imports for typical ulog usage.
///
/// ```rust
/// use ulog::prelude::*;
/// ```
pub mod prelude {
    // Record model
    pub use ulog_core::{
        Command, CommandArgs, DecodedRecord, MessageId, PayloadShape, RecordHeader, ServerId,
        Timestamp, MAGIC,
    };

    // Handler
    pub use ulog_core::ReplayHandler;

    // Readers
    pub use ulog_replay::{
        open_source, LogDirReader, LogDirectory, LogFileReader, LogSource, RecordSource,
    };

    // Replay and configuration
    pub use ulog_replay::{replay, GapPolicy, ReaderConfig, ReplayStats};

    // Errors
    pub use ulog_replay::{HeaderFault, UlogError};
}
