//! Record data model: the fixed header and the decoded command arguments.

use crate::command::{Command, PayloadShape};
use crate::id::{MessageId, ServerId, Timestamp};

/// Byte that precedes every record header.
pub const MAGIC: u8 = 0xC9;

/// Size of the on-disk header in bytes, magic included.
///
/// `magic:u8, timestamp:u64, server_id:u16, message_id:u16, body_size:u32`,
/// all big-endian.
pub const HEADER_SIZE: usize = 17;

/// The fixed-size header that frames one log record.
///
/// # Examples
///
/// ```
/// use ulog_core::{MessageId, RecordHeader, ServerId, Timestamp};
///
/// let header = RecordHeader {
///     timestamp: Timestamp(1_300_000_000_000_000),
///     server_id: ServerId(1),
///     message_id: MessageId(7),
///     body_size: 24,
/// };
/// assert_eq!(header.timestamp.as_secs(), 1_300_000_000);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordHeader {
    /// When the operation was logged.
    pub timestamp: Timestamp,
    /// The node the operation originated on.
    pub server_id: ServerId,
    /// Replication dedup identifier, scoped to `server_id`.
    pub message_id: MessageId,
    /// Exact length of the body that follows the header.
    pub body_size: u32,
}

/// Positional arguments of a decoded command, one variant per [`PayloadShape`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandArgs {
    /// Key and value of a put-family command.
    KeyValue {
        /// The record key.
        key: Vec<u8>,
        /// The stored value.
        value: Vec<u8>,
    },
    /// Key of a removal.
    KeyOnly {
        /// The record key.
        key: Vec<u8>,
    },
    /// A named miscellaneous operation.
    Misc {
        /// Operation name, e.g. `putlist`.
        name: Vec<u8>,
        /// Arguments in wire order.
        args: Vec<Vec<u8>>,
    },
    /// Raw bytes the decoder does not interpret.
    Opaque {
        /// The body region between the command byte and the trailing byte.
        payload: Vec<u8>,
    },
}

impl CommandArgs {
    /// The shape this argument set was decoded with.
    pub fn shape(&self) -> PayloadShape {
        match self {
            Self::KeyValue { .. } => PayloadShape::KeyValue,
            Self::KeyOnly { .. } => PayloadShape::KeyOnly,
            Self::Misc { .. } => PayloadShape::Misc,
            Self::Opaque { .. } => PayloadShape::Opaque,
        }
    }

    /// The key for key-addressed shapes, `None` otherwise.
    pub fn key(&self) -> Option<&[u8]> {
        match self {
            Self::KeyValue { key, .. } | Self::KeyOnly { key } => Some(key),
            Self::Misc { .. } | Self::Opaque { .. } => None,
        }
    }
}

/// A fully decoded log record, ready for dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedRecord {
    /// The record's header.
    pub header: RecordHeader,
    /// The command selected by the body's command byte.
    pub command: Command,
    /// Decoded positional arguments.
    pub args: CommandArgs,
    /// The trailing byte of the body.
    pub expiration: u8,
}

impl DecodedRecord {
    /// The command name, e.g. `"put"`.
    pub fn name(&self) -> &'static str {
        self.command.name()
    }

    /// The payload shape of the command.
    pub fn shape(&self) -> PayloadShape {
        self.command.shape()
    }
}
