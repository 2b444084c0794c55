//! The [`RecordSource`] seam shared by file and directory readers.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ulog_core::{Command, DecodedRecord, RecordHeader};

use crate::codec::{command_code, decode_record};
use crate::config::ReaderConfig;
use crate::dir::{LogDirReader, LogDirectory};
use crate::error::UlogError;
use crate::reader::LogFileReader;

/// A forward-only stream of records with on-demand body access.
///
/// Implementors provide header iteration and body caching; command lookup
/// and full decoding are derived from those.
pub trait RecordSource {
    /// Advance to the next record. `Ok(None)` marks the end of the stream.
    fn next_header(&mut self) -> Result<Option<RecordHeader>, UlogError>;

    /// The header of the current record, if any.
    fn header(&self) -> Option<RecordHeader>;

    /// The current record's raw body, read once and cached.
    fn body(&mut self) -> Result<&[u8], UlogError>;

    /// Resolve the current record's command byte.
    fn command(&mut self) -> Result<Command, UlogError> {
        let code = command_code(self.body()?)?;
        Ok(Command::from_code(code)?)
    }

    /// Decode the current record.
    fn decode(&mut self) -> Result<DecodedRecord, UlogError> {
        let header = self.header().ok_or(UlogError::NoCurrentRecord)?;
        decode_record(header, self.body()?)
    }
}

impl<S: RecordSource + ?Sized> RecordSource for &mut S {
    fn next_header(&mut self) -> Result<Option<RecordHeader>, UlogError> {
        (**self).next_header()
    }

    fn header(&self) -> Option<RecordHeader> {
        (**self).header()
    }

    fn body(&mut self) -> Result<&[u8], UlogError> {
        (**self).body()
    }
}

/// Either a single log file or a directory of rotated log files.
pub enum LogSource {
    /// One file.
    File(LogFileReader<BufReader<File>>),
    /// A contiguous run of files from a directory.
    Dir(LogDirReader),
}

impl RecordSource for LogSource {
    fn next_header(&mut self) -> Result<Option<RecordHeader>, UlogError> {
        match self {
            Self::File(r) => r.next_header(),
            Self::Dir(r) => r.next_header(),
        }
    }

    fn header(&self) -> Option<RecordHeader> {
        match self {
            Self::File(r) => r.header(),
            Self::Dir(r) => RecordSource::header(r),
        }
    }

    fn body(&mut self) -> Result<&[u8], UlogError> {
        match self {
            Self::File(r) => r.body(),
            Self::Dir(r) => r.body(),
        }
    }
}

/// Open `path` as a directory run if it is a directory, otherwise as a file.
pub fn open_source(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<LogSource, UlogError> {
    let path = path.as_ref();
    if path.is_dir() {
        Ok(LogSource::Dir(LogDirectory::open(path, config)?.reader()))
    } else {
        Ok(LogSource::File(LogFileReader::open(path, config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulog_test_utils::fixtures::{write_log_dir, LogBuilder};

    fn count(source: &mut dyn RecordSource) -> usize {
        let mut n = 0;
        while source.next_header().unwrap().is_some() {
            n += 1;
        }
        n
    }

    #[test]
    fn open_source_picks_file_or_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_log_dir(
            dir.path(),
            &[
                (1, LogBuilder::new().put(1, b"a", b"1").into_bytes()),
                (2, LogBuilder::new().put(2, b"b", b"2").into_bytes()),
            ],
        );
        let config = ReaderConfig::default();

        let mut whole = open_source(dir.path(), &config).unwrap();
        assert!(matches!(whole, LogSource::Dir(_)));
        assert_eq!(count(&mut whole), 2);

        let mut single = open_source(dir.path().join("00000002.ulog"), &config).unwrap();
        assert!(matches!(single, LogSource::File(_)));
        assert_eq!(count(&mut single), 1);
    }

    #[test]
    fn trait_object_decode_uses_defaults() {
        let buf = LogBuilder::new().out(5, b"gone").into_bytes();
        let mut reader = LogFileReader::new(buf.as_slice());
        let source: &mut dyn RecordSource = &mut reader;
        assert!(matches!(source.decode(), Err(UlogError::NoCurrentRecord)));
        source.next_header().unwrap();
        assert_eq!(source.command().unwrap(), Command::Out);
        assert_eq!(source.decode().unwrap().name(), "out");
    }
}
