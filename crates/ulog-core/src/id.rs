//! Strongly-typed identifiers carried in every record header.

use std::fmt;

/// Microseconds since the Unix epoch at which the operation was logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The raw microsecond count.
    pub fn as_micros(self) -> u64 {
        self.0
    }

    /// Whole seconds since the epoch, truncating the sub-second part.
    pub fn as_secs(self) -> u64 {
        self.0 / 1_000_000
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies the server that originated a logged operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerId(pub u16);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for ServerId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Per-server message identifier used for replication deduplication.
///
/// Only meaningful together with the [`ServerId`] that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u16);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for MessageId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}
