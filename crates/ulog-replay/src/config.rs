//! Reader configuration and validation.
//!
//! [`ReaderConfig`] is shared by file and directory readers. Call
//! [`validate()`](ReaderConfig::validate) before use; the `open` constructors
//! do so themselves.

use thiserror::Error;

// ── GapPolicy ─────────────────────────────────────────────────────

/// What a directory reader does when sequence numbers are not contiguous.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GapPolicy {
    /// Traverse the contiguous run from the lowest sequence number and
    /// report the gap through [`LogDirectory::gap()`](crate::LogDirectory::gap).
    #[default]
    Stop,
    /// Refuse to open a directory that has a gap.
    Fail,
}

// ── ReaderConfig ──────────────────────────────────────────────────

/// Configuration for [`LogFileReader`](crate::LogFileReader) and
/// [`LogDirectory`](crate::LogDirectory).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Log file extension, without the leading dot. Default: `"ulog"`.
    pub extension: String,
    /// Read buffer capacity per opened file, in bytes. Default: 64 KiB.
    pub buffer_capacity: usize,
    /// Largest body a header may declare before it is treated as corrupt.
    /// Default: 256 MiB.
    pub max_body_size: u32,
    /// Directory gap handling. Default: [`GapPolicy::Stop`].
    pub gap_policy: GapPolicy,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            extension: "ulog".to_string(),
            buffer_capacity: 64 * 1024,
            max_body_size: 256 * 1024 * 1024,
            gap_policy: GapPolicy::Stop,
        }
    }
}

impl ReaderConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extension.is_empty() {
            return Err(ConfigError::EmptyExtension);
        }
        if self.extension.starts_with('.') {
            return Err(ConfigError::DottedExtension {
                extension: self.extension.clone(),
            });
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::ZeroBufferCapacity);
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::ZeroMaxBodySize);
        }
        Ok(())
    }
}

// ── ConfigError ───────────────────────────────────────────────────

/// Errors detected by [`ReaderConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The log file extension is empty.
    #[error("log file extension is empty")]
    EmptyExtension,
    /// The extension was given with a leading dot.
    #[error("log file extension {extension:?} must not start with '.'")]
    DottedExtension {
        /// The configured extension.
        extension: String,
    },
    /// The read buffer capacity is zero.
    #[error("buffer capacity must be at least 1 byte")]
    ZeroBufferCapacity,
    /// The maximum body size is zero, which rejects every record.
    #[error("max body size must be at least 1 byte")]
    ZeroMaxBodySize,
}
