//! Error types for the command table.

use thiserror::Error;

/// A command code with no entry in the command table.
///
/// Update logs only record mutations, so this usually means the stream
/// is misaligned or the log was produced by an incompatible server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("unknown command code {code:#04x}")]
pub struct UnknownCommand {
    /// The unrecognized command byte.
    pub code: u8,
}
