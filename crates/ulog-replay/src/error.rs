//! Error types for update-log decoding, traversal, and replay.

use std::io;

use thiserror::Error;
use ulog_core::{PayloadShape, UnknownCommand};

use crate::config::ConfigError;

/// Why a record header could not be trusted.
///
/// Any of these means the stream is unreliable from this offset onward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum HeaderFault {
    /// The leading byte was not the record magic.
    #[error("bad magic byte {found:#04x}")]
    BadMagic {
        /// The byte found where the magic was expected.
        found: u8,
    },
    /// The stream ended partway through a header.
    #[error("short header read: got {got} of 17 bytes")]
    ShortRead {
        /// Bytes read before end of stream (1 to 16).
        got: usize,
    },
    /// The declared body size exceeds the configured limit.
    #[error("declared body size {size} exceeds limit {limit}")]
    OversizedBody {
        /// The body size declared by the header.
        size: u32,
        /// The configured maximum.
        limit: u32,
    },
}

/// A break in the sequence numbers of a log directory.
///
/// Traversal stops before `found`; files from `found` onward are never read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("sequence gap after {previous}: next file is {found}")]
pub struct SequenceGap {
    /// The last sequence number in the contiguous run.
    pub previous: u64,
    /// The first sequence number past the gap.
    pub found: u64,
}

/// Errors that can occur while decoding or replaying an update log.
#[derive(Debug, Error)]
pub enum UlogError {
    /// An I/O error occurred while reading.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A header was truncated or failed validation.
    #[error("corrupt record header: {0}")]
    CorruptHeader(HeaderFault),
    /// A length-prefixed field or the body itself ran past the available bytes.
    #[error("truncated record body: needed {needed} bytes, {available} available")]
    TruncatedBody {
        /// Bytes the read required.
        needed: usize,
        /// Bytes remaining in the buffer or stream.
        available: usize,
    },
    /// The body's command byte has no command table entry.
    #[error("unknown command code {code:#04x}")]
    UnknownCommand {
        /// The unrecognized command byte.
        code: u8,
    },
    /// A record's arguments do not have its command's payload shape.
    #[error("{command} record carries {shape:?} arguments")]
    ShapeMismatch {
        /// Name of the record's command.
        command: &'static str,
        /// Shape of the arguments it carried.
        shape: PayloadShape,
    },
    /// Body access was requested before any header was read, or after the end.
    #[error("no current record")]
    NoCurrentRecord,
    /// The directory has a sequence gap and the gap policy forbids it.
    #[error("{0}")]
    SequenceGap(SequenceGap),
    /// Two files in the directory carry the same sequence number.
    #[error("duplicate log sequence number {sequence}")]
    DuplicateSequence {
        /// The repeated sequence number.
        sequence: u64,
    },
    /// A `putlist` carried an odd number of arguments.
    #[error("putlist has {arg_count} arguments, expected an even count")]
    UnpairedPutlist {
        /// Number of arguments in the record.
        arg_count: usize,
    },
    /// The reader configuration is invalid.
    #[error("invalid reader config: {0}")]
    Config(#[from] ConfigError),
}

impl From<UnknownCommand> for UlogError {
    fn from(e: UnknownCommand) -> Self {
        Self::UnknownCommand { code: e.code }
    }
}

impl From<HeaderFault> for UlogError {
    fn from(fault: HeaderFault) -> Self {
        Self::CorruptHeader(fault)
    }
}

impl From<SequenceGap> for UlogError {
    fn from(gap: SequenceGap) -> Self {
        Self::SequenceGap(gap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_command_converts_with_code() {
        let err: UlogError = UnknownCommand { code: 0x30 }.into();
        assert!(matches!(err, UlogError::UnknownCommand { code: 0x30 }));
        assert_eq!(err.to_string(), "unknown command code 0x30");
    }

    #[test]
    fn header_fault_messages() {
        let err: UlogError = HeaderFault::BadMagic { found: 0x00 }.into();
        assert_eq!(err.to_string(), "corrupt record header: bad magic byte 0x00");
        let err: UlogError = HeaderFault::ShortRead { got: 3 }.into();
        assert_eq!(
            err.to_string(),
            "corrupt record header: short header read: got 3 of 17 bytes"
        );
    }

    #[test]
    fn gap_message_names_both_sides() {
        let gap = SequenceGap {
            previous: 2,
            found: 5,
        };
        assert_eq!(gap.to_string(), "sequence gap after 2: next file is 5");
    }
}
