//! Single-file update-log reader.
//!
//! [`LogFileReader`] walks one file's records forward. Each call to
//! [`next_header`](LogFileReader::next_header) first skips the previous
//! record's body if nobody fetched it, then decodes the next header. The
//! body is read on demand and cached until the next header.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use ulog_core::{Command, DecodedRecord, RecordHeader, HEADER_SIZE};

use crate::codec::{decode_header, decode_record};
use crate::config::ReaderConfig;
use crate::error::{HeaderFault, UlogError};
use crate::source::RecordSource;

/// Reads records from one update-log stream.
///
/// Generic over `R: Read` so tests can use `&[u8]` and production
/// code can use `BufReader<File>`.
pub struct LogFileReader<R: Read> {
    reader: R,
    path: Option<PathBuf>,
    sequence: Option<u64>,
    max_body_size: u32,
    current: Option<RecordHeader>,
    body: Option<Vec<u8>>,
    position: u64,
    records_read: u64,
}

impl LogFileReader<BufReader<File>> {
    /// Open a log file on disk.
    pub fn open(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self, UlogError> {
        config.validate()?;
        Self::open_unchecked(path.as_ref(), None, config)
    }

    /// Open a file that belongs to a directory run. `config` is already validated.
    pub(crate) fn open_unchecked(
        path: &Path,
        sequence: Option<u64>,
        config: &ReaderConfig,
    ) -> Result<Self, UlogError> {
        let file = File::open(path)?;
        tracing::debug!(path = %path.display(), ?sequence, "opened log file");
        let buffered = BufReader::with_capacity(config.buffer_capacity, file);
        let mut reader = Self::with_config(buffered, config);
        reader.path = Some(path.to_path_buf());
        reader.sequence = sequence;
        Ok(reader)
    }
}

impl<R: Read> LogFileReader<R> {
    /// Wrap a stream using the default configuration.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &ReaderConfig::default())
    }

    /// Wrap a stream, taking the body size limit from `config`.
    pub fn with_config(reader: R, config: &ReaderConfig) -> Self {
        Self {
            reader,
            path: None,
            sequence: None,
            max_body_size: config.max_body_size,
            current: None,
            body: None,
            position: 0,
            records_read: 0,
        }
    }

    /// Advance to the next record and return its header.
    ///
    /// Returns `Ok(None)` at a clean end of stream. After an error the
    /// stream position is unreliable; callers should stop reading.
    pub fn next_header(&mut self) -> Result<Option<RecordHeader>, UlogError> {
        if let Some(previous) = self.current.take() {
            if self.body.take().is_none() {
                self.skip_body(previous.body_size)?;
            }
        }
        self.body = None;

        let header = match decode_header(&mut self.reader) {
            Ok(Some(header)) => header,
            Ok(None) => return Ok(None),
            Err(err) => {
                if let UlogError::CorruptHeader(fault) = &err {
                    tracing::warn!(
                        path = ?self.path,
                        offset = self.position,
                        %fault,
                        "corrupt record header"
                    );
                }
                return Err(err);
            }
        };

        if header.body_size > self.max_body_size {
            let fault = HeaderFault::OversizedBody {
                size: header.body_size,
                limit: self.max_body_size,
            };
            tracing::warn!(
                path = ?self.path,
                offset = self.position,
                %fault,
                "corrupt record header"
            );
            return Err(fault.into());
        }

        self.position += HEADER_SIZE as u64;
        self.records_read += 1;
        self.current = Some(header);
        Ok(Some(header))
    }

    /// The header of the current record, if one has been read.
    pub fn header(&self) -> Option<RecordHeader> {
        self.current
    }

    /// The current record's raw body.
    ///
    /// The first call reads it from the stream; later calls before the
    /// next [`next_header`](Self::next_header) return the cached bytes.
    pub fn body(&mut self) -> Result<&[u8], UlogError> {
        let header = self.current.ok_or(UlogError::NoCurrentRecord)?;
        let body = match self.body.take() {
            Some(body) => body,
            None => self.read_body(header.body_size)?,
        };
        Ok(self.body.insert(body).as_slice())
    }

    /// Resolve the current record's command byte without decoding its fields.
    pub fn command(&mut self) -> Result<Command, UlogError> {
        RecordSource::command(self)
    }

    /// Decode the current record.
    pub fn decode(&mut self) -> Result<DecodedRecord, UlogError> {
        let header = self.current.ok_or(UlogError::NoCurrentRecord)?;
        decode_record(header, self.body()?)
    }

    /// Path of the underlying file, when opened from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Sequence number of the file, when opened through a directory.
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    /// Bytes consumed from the stream so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of headers read so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Convert into an iterator over headers, skipping every body.
    pub fn headers(self) -> HeaderIter<R> {
        HeaderIter {
            reader: self,
            done: false,
        }
    }

    /// Convert into an iterator over fully decoded records.
    pub fn records(self) -> RecordIter<R> {
        RecordIter {
            reader: self,
            done: false,
        }
    }

    fn read_body(&mut self, size: u32) -> Result<Vec<u8>, UlogError> {
        let needed = size as usize;
        let mut body = Vec::with_capacity(needed.min(64 * 1024));
        let got = (&mut self.reader).take(u64::from(size)).read_to_end(&mut body)?;
        self.position += got as u64;
        if got < needed {
            // The bytes are gone; there is nothing left to skip.
            self.current = None;
            return Err(UlogError::TruncatedBody {
                needed,
                available: got,
            });
        }
        Ok(body)
    }

    fn skip_body(&mut self, size: u32) -> Result<(), UlogError> {
        let skipped = io::copy(&mut (&mut self.reader).take(u64::from(size)), &mut io::sink())?;
        self.position += skipped;
        if skipped < u64::from(size) {
            return Err(UlogError::TruncatedBody {
                needed: size as usize,
                available: skipped as usize,
            });
        }
        Ok(())
    }
}

impl<R: Read> RecordSource for LogFileReader<R> {
    fn next_header(&mut self) -> Result<Option<RecordHeader>, UlogError> {
        LogFileReader::next_header(self)
    }

    fn header(&self) -> Option<RecordHeader> {
        self.current
    }

    fn body(&mut self) -> Result<&[u8], UlogError> {
        LogFileReader::body(self)
    }
}

/// Iterator adapter over record headers. Fuses after the first error.
pub struct HeaderIter<R: Read> {
    reader: LogFileReader<R>,
    done: bool,
}

impl<R: Read> Iterator for HeaderIter<R> {
    type Item = Result<RecordHeader, UlogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_header() {
            Ok(Some(header)) => Some(Ok(header)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Iterator adapter over decoded records. Fuses after the first error.
pub struct RecordIter<R: Read> {
    reader: LogFileReader<R>,
    done: bool,
}

impl<R: Read> Iterator for RecordIter<R> {
    type Item = Result<DecodedRecord, UlogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.reader.next_header() {
            Ok(Some(_)) => self.reader.decode(),
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulog_core::{CommandArgs, Timestamp};
    use ulog_test_utils::fixtures::{self, LogBuilder};

    fn three_records() -> Vec<u8> {
        LogBuilder::new()
            .put(100, b"a", b"1")
            .out(200, b"b")
            .put_keep(300, b"c", b"3")
            .into_bytes()
    }

    #[test]
    fn headers_in_order() {
        let buf = three_records();
        let reader = LogFileReader::new(buf.as_slice());
        let stamps: Vec<u64> = reader
            .headers()
            .map(|h| h.unwrap().timestamp.0)
            .collect();
        assert_eq!(stamps, vec![100, 200, 300]);
    }

    #[test]
    fn unread_bodies_are_skipped() {
        let buf = three_records();
        let mut reader = LogFileReader::new(buf.as_slice());
        reader.next_header().unwrap().unwrap();
        reader.next_header().unwrap().unwrap();
        let third = reader.next_header().unwrap().unwrap();
        assert_eq!(third.timestamp, Timestamp(300));
        let record = reader.decode().unwrap();
        assert_eq!(
            record.args,
            CommandArgs::KeyValue {
                key: b"c".to_vec(),
                value: b"3".to_vec()
            }
        );
        assert!(reader.next_header().unwrap().is_none());
        assert_eq!(reader.records_read(), 3);
        assert_eq!(reader.position(), buf.len() as u64);
    }

    #[test]
    fn body_is_cached_until_next_header() {
        let buf = three_records();
        let mut reader = LogFileReader::new(buf.as_slice());
        reader.next_header().unwrap();
        let first = reader.body().unwrap().to_vec();
        let position = reader.position();
        let again = reader.body().unwrap().to_vec();
        assert_eq!(first, again);
        assert_eq!(reader.position(), position);
        assert_eq!(first, fixtures::kv_body(Command::Put, b"a", b"1"));

        // Decoding after a body fetch reuses the cache and the next header
        // does not skip a second time.
        assert_eq!(reader.command().unwrap(), Command::Put);
        let second = reader.next_header().unwrap().unwrap();
        assert_eq!(second.timestamp, Timestamp(200));
        assert_eq!(reader.command().unwrap(), Command::Out);
    }

    #[test]
    fn body_before_header_is_an_error() {
        let buf = three_records();
        let mut reader = LogFileReader::new(buf.as_slice());
        assert!(matches!(reader.body(), Err(UlogError::NoCurrentRecord)));
        assert!(matches!(reader.decode(), Err(UlogError::NoCurrentRecord)));
    }

    #[test]
    fn body_after_end_is_an_error() {
        let buf = LogBuilder::new().put(1, b"k", b"v").into_bytes();
        let mut reader = LogFileReader::new(buf.as_slice());
        reader.next_header().unwrap();
        assert!(reader.next_header().unwrap().is_none());
        assert!(matches!(reader.body(), Err(UlogError::NoCurrentRecord)));
    }

    #[test]
    fn truncated_body_is_reported() {
        let mut buf = three_records();
        buf.truncate(buf.len() - 2);
        let mut reader = LogFileReader::new(buf.as_slice());
        reader.next_header().unwrap();
        reader.next_header().unwrap();
        reader.next_header().unwrap();
        assert!(matches!(
            reader.body(),
            Err(UlogError::TruncatedBody { .. })
        ));
        // The partial body was consumed; the stream is at its end.
        assert!(reader.next_header().unwrap().is_none());
    }

    #[test]
    fn truncated_body_while_skipping_is_reported() {
        let mut buf = three_records();
        buf.truncate(buf.len() - 2);
        let mut reader = LogFileReader::new(buf.as_slice());
        for _ in 0..3 {
            reader.next_header().unwrap();
        }
        assert!(matches!(
            reader.next_header(),
            Err(UlogError::TruncatedBody { .. })
        ));
    }

    #[test]
    fn corrupt_magic_mid_stream() {
        let mut buf = three_records();
        let first_len = HEADER_SIZE + fixtures::kv_body(Command::Put, b"a", b"1").len();
        buf[first_len] = 0x00;
        let mut reader = LogFileReader::new(buf.as_slice());
        reader.next_header().unwrap().unwrap();
        assert!(matches!(
            reader.next_header(),
            Err(UlogError::CorruptHeader(HeaderFault::BadMagic { found: 0x00 }))
        ));
    }

    #[test]
    fn oversized_body_is_corrupt_header() {
        let buf = LogBuilder::new().put(1, b"k", &[7u8; 64]).into_bytes();
        let config = ReaderConfig {
            max_body_size: 16,
            ..Default::default()
        };
        let mut reader = LogFileReader::with_config(buf.as_slice(), &config);
        assert!(matches!(
            reader.next_header(),
            Err(UlogError::CorruptHeader(HeaderFault::OversizedBody { limit: 16, .. }))
        ));
    }

    #[test]
    fn record_iterator_decodes_and_fuses() {
        let mut buf = three_records();
        buf.extend_from_slice(&[0x00; 4]);
        let reader = LogFileReader::new(buf.as_slice());
        let results: Vec<_> = reader.records().collect();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().command, Command::Put);
        assert_eq!(results[1].as_ref().unwrap().command, Command::Out);
        assert_eq!(results[2].as_ref().unwrap().command, Command::PutKeep);
        assert!(matches!(
            results[3],
            Err(UlogError::CorruptHeader(HeaderFault::ShortRead { got: 4 }))
        ));
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let empty: &[u8] = &[];
        let reader = LogFileReader::new(empty);
        assert_eq!(reader.headers().count(), 0);
    }

    #[test]
    fn into_inner_returns_the_unread_tail() {
        let buf = three_records();
        let mut reader = LogFileReader::new(buf.as_slice());
        reader.next_header().unwrap().unwrap();
        reader.body().unwrap();
        let consumed = reader.position() as usize;
        let rest = reader.into_inner();
        assert_eq!(rest, &buf[consumed..]);
        let mut resumed = LogFileReader::new(rest);
        assert_eq!(resumed.next_header().unwrap().unwrap().timestamp, Timestamp(200));
    }

    #[test]
    fn open_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("00000001.ulog");
        std::fs::write(&path, three_records()).unwrap();

        let mut reader = LogFileReader::open(&path, &ReaderConfig::default()).unwrap();
        assert_eq!(reader.path(), Some(path.as_path()));
        assert_eq!(reader.sequence(), None);
        let mut count = 0;
        while reader.next_header().unwrap().is_some() {
            reader.decode().unwrap();
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn open_rejects_invalid_config() {
        let config = ReaderConfig {
            buffer_capacity: 0,
            ..Default::default()
        };
        let result = LogFileReader::open("does-not-matter.ulog", &config);
        assert!(matches!(result, Err(UlogError::Config(_))));
    }
}
