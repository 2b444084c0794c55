//! Rotated log directories.
//!
//! A log directory holds files named `<sequence>.<extension>`, e.g.
//! `00000001.ulog`. [`LogDirectory`] scans the directory once, orders the
//! files by numeric sequence, and exposes the contiguous run that starts at
//! the lowest number. A missing number ends the run: files past the gap are
//! never opened, so a stream with a hole is never presented as complete.
//!
//! [`LogDirReader`] stitches the run into one record stream, holding at most
//! one file open at a time.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::slice;
use std::vec;

use ulog_core::RecordHeader;

use crate::config::{GapPolicy, ReaderConfig};
use crate::error::{SequenceGap, UlogError};
use crate::reader::LogFileReader;
use crate::source::RecordSource;

/// A log file discovered in a directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFileEntry {
    /// Sequence number parsed from the file name.
    pub sequence: u64,
    /// Full path to the file.
    pub path: PathBuf,
}

/// The result of scanning a log directory.
#[derive(Debug)]
pub struct LogDirectory {
    path: PathBuf,
    config: ReaderConfig,
    entries: Vec<LogFileEntry>,
    run_len: usize,
    gap: Option<SequenceGap>,
}

impl LogDirectory {
    /// Scan `path` for log files.
    ///
    /// Fails on I/O errors, duplicate sequence numbers, an invalid config,
    /// or a sequence gap when the config's policy is [`GapPolicy::Fail`].
    pub fn open(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self, UlogError> {
        config.validate()?;
        let path = path.as_ref();
        let entries = scan(path, &config.extension)?;

        if let Some(pair) = entries.windows(2).find(|p| p[0].sequence == p[1].sequence) {
            return Err(UlogError::DuplicateSequence {
                sequence: pair[0].sequence,
            });
        }

        let (run_len, gap) = contiguous_run(&entries);
        if let Some(gap) = gap {
            tracing::warn!(
                dir = %path.display(),
                previous = gap.previous,
                found = gap.found,
                skipped_files = entries.len() - run_len,
                "log sequence gap; traversal stops before it"
            );
            if config.gap_policy == GapPolicy::Fail {
                return Err(gap.into());
            }
        }
        tracing::debug!(
            dir = %path.display(),
            files = entries.len(),
            run = run_len,
            "scanned log directory"
        );

        Ok(Self {
            path: path.to_path_buf(),
            config: config.clone(),
            entries,
            run_len,
            gap,
        })
    }

    /// The scanned directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every log file found, in sequence order, including files past a gap.
    pub fn entries(&self) -> &[LogFileEntry] {
        &self.entries
    }

    /// The contiguous run starting at the lowest sequence number.
    pub fn run(&self) -> &[LogFileEntry] {
        &self.entries[..self.run_len]
    }

    /// The first sequence gap, if the run does not cover every file.
    pub fn gap(&self) -> Option<SequenceGap> {
        self.gap
    }

    /// Lazily open each file of the run, in order.
    pub fn files(&self) -> LogFiles<'_> {
        LogFiles {
            entries: self.run().iter(),
            config: &self.config,
        }
    }

    /// A record stream spanning the whole run.
    #[doc(alias = "records")]
    pub fn reader(&self) -> LogDirReader {
        LogDirReader {
            pending: self.run().to_vec().into_iter(),
            config: self.config.clone(),
            current: None,
            gap: self.gap,
            files_opened: 0,
        }
    }
}

/// Iterator over opened files of a directory run.
///
/// Each file is opened only when the iterator reaches it and is closed when
/// the caller drops the yielded reader.
pub struct LogFiles<'a> {
    entries: slice::Iter<'a, LogFileEntry>,
    config: &'a ReaderConfig,
}

impl Iterator for LogFiles<'_> {
    type Item = Result<LogFileReader<BufReader<File>>, UlogError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(LogFileReader::open_unchecked(
            &entry.path,
            Some(entry.sequence),
            self.config,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

/// One record stream over a directory run.
///
/// At most one file is open at a time; it is released as soon as it is
/// exhausted, fails, or the reader is dropped. When a file fails to open
/// or decode, the error is returned and that file's remaining records are
/// abandoned; calling [`next_header`](Self::next_header) again continues
/// with the next file.
pub struct LogDirReader {
    pending: vec::IntoIter<LogFileEntry>,
    config: ReaderConfig,
    current: Option<LogFileReader<BufReader<File>>>,
    gap: Option<SequenceGap>,
    files_opened: usize,
}

impl LogDirReader {
    /// Advance to the next record across file boundaries.
    pub fn next_header(&mut self) -> Result<Option<RecordHeader>, UlogError> {
        loop {
            if self.current.is_none() {
                let Some(entry) = self.pending.next() else {
                    return Ok(None);
                };
                let reader =
                    LogFileReader::open_unchecked(&entry.path, Some(entry.sequence), &self.config)?;
                self.files_opened += 1;
                self.current = Some(reader);
            }
            let Some(reader) = self.current.as_mut() else {
                continue;
            };
            match reader.next_header() {
                Ok(Some(header)) => return Ok(Some(header)),
                Ok(None) => self.release(),
                Err(e) => {
                    self.release();
                    return Err(e);
                }
            }
        }
    }

    /// The header of the current record, if a file is active.
    pub fn header(&self) -> Option<RecordHeader> {
        self.current.as_ref().and_then(LogFileReader::header)
    }

    /// The current record's raw body, from whichever file is active.
    pub fn body(&mut self) -> Result<&[u8], UlogError> {
        self.current
            .as_mut()
            .ok_or(UlogError::NoCurrentRecord)?
            .body()
    }

    /// Path of the active file.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().and_then(LogFileReader::path)
    }

    /// Sequence number of the active file.
    pub fn current_sequence(&self) -> Option<u64> {
        self.current.as_ref().and_then(LogFileReader::sequence)
    }

    /// The gap that ended the run, if any.
    pub fn gap(&self) -> Option<SequenceGap> {
        self.gap
    }

    /// Number of files opened so far.
    pub fn files_opened(&self) -> usize {
        self.files_opened
    }

    fn release(&mut self) {
        if let Some(reader) = self.current.take() {
            tracing::debug!(
                path = ?reader.path(),
                records = reader.records_read(),
                "released log file"
            );
        }
    }
}

impl RecordSource for LogDirReader {
    fn next_header(&mut self) -> Result<Option<RecordHeader>, UlogError> {
        LogDirReader::next_header(self)
    }

    fn header(&self) -> Option<RecordHeader> {
        LogDirReader::header(self)
    }

    fn body(&mut self) -> Result<&[u8], UlogError> {
        LogDirReader::body(self)
    }
}

/// List log files in `dir`, sorted by sequence number.
fn scan(dir: &Path, extension: &str) -> Result<Vec<LogFileEntry>, UlogError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(sequence) = parse_sequence(name, extension) else {
            continue;
        };
        entries.push(LogFileEntry {
            sequence,
            path: entry.path(),
        });
    }
    entries.sort_by_key(|e| e.sequence);
    Ok(entries)
}

/// Parse `<digits>.<extension>` into its sequence number.
fn parse_sequence(name: &str, extension: &str) -> Option<u64> {
    let stem = name.strip_suffix(extension)?.strip_suffix('.')?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// Length of the contiguous prefix of sorted, duplicate-free entries, and
/// the gap that ends it.
fn contiguous_run(entries: &[LogFileEntry]) -> (usize, Option<SequenceGap>) {
    for (i, pair) in entries.windows(2).enumerate() {
        if pair[1].sequence > pair[0].sequence + 1 {
            let gap = SequenceGap {
                previous: pair[0].sequence,
                found: pair[1].sequence,
            };
            return (i + 1, Some(gap));
        }
    }
    (entries.len(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulog_core::Timestamp;
    use ulog_test_utils::fixtures::{write_log_dir, LogBuilder};

    fn one_put(ts: u64) -> Vec<u8> {
        LogBuilder::new().put(ts, b"k", b"v").into_bytes()
    }

    fn sequences(entries: &[LogFileEntry]) -> Vec<u64> {
        entries.iter().map(|e| e.sequence).collect()
    }

    #[test]
    fn parse_sequence_accepts_only_numeric_stems() {
        assert_eq!(parse_sequence("00000001.ulog", "ulog"), Some(1));
        assert_eq!(parse_sequence("42.ulog", "ulog"), Some(42));
        assert_eq!(parse_sequence(".ulog", "ulog"), None);
        assert_eq!(parse_sequence("abc.ulog", "ulog"), None);
        assert_eq!(parse_sequence("1.ulog.bak", "ulog"), None);
        assert_eq!(parse_sequence("1ulog", "ulog"), None);
        assert_eq!(parse_sequence("-1.ulog", "ulog"), None);
        assert_eq!(parse_sequence("+1.ulog", "ulog"), None);
        assert_eq!(parse_sequence("99999999999999999999999.ulog", "ulog"), None);
        assert_eq!(parse_sequence("7.log", "log"), Some(7));
    }

    #[test]
    fn gap_ends_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<_> = [0u64, 1, 2, 5, 6].iter().map(|&n| (n, one_put(n))).collect();
        write_log_dir(dir.path(), &files);

        let logs = LogDirectory::open(dir.path(), &ReaderConfig::default()).unwrap();
        assert_eq!(logs.path(), dir.path());
        assert_eq!(sequences(logs.entries()), vec![0, 1, 2, 5, 6]);
        assert_eq!(sequences(logs.run()), vec![0, 1, 2]);
        assert_eq!(
            logs.gap(),
            Some(SequenceGap {
                previous: 2,
                found: 5
            })
        );

        let opened: Vec<_> = logs
            .files()
            .map(|f| f.unwrap().sequence().unwrap())
            .collect();
        assert_eq!(opened, vec![0, 1, 2]);

        let mut reader = logs.reader();
        let mut stamps = Vec::new();
        while let Some(h) = reader.next_header().unwrap() {
            stamps.push(h.timestamp);
        }
        assert_eq!(stamps, vec![Timestamp(0), Timestamp(1), Timestamp(2)]);
        assert_eq!(reader.files_opened(), 3);
        assert_eq!(reader.gap(), logs.gap());
    }

    #[test]
    fn gap_policy_fail_refuses_to_open() {
        let dir = tempfile::tempdir().unwrap();
        write_log_dir(dir.path(), &[(1, one_put(1)), (3, one_put(3))]);
        let config = ReaderConfig {
            gap_policy: GapPolicy::Fail,
            ..Default::default()
        };
        let result = LogDirectory::open(dir.path(), &config);
        assert!(matches!(
            result,
            Err(UlogError::SequenceGap(SequenceGap {
                previous: 1,
                found: 3
            }))
        ));
    }

    #[test]
    fn numeric_not_lexical_order() {
        let dir = tempfile::tempdir().unwrap();
        for n in [8u64, 9, 10, 11] {
            std::fs::write(dir.path().join(format!("{n}.ulog")), one_put(n)).unwrap();
        }
        let logs = LogDirectory::open(dir.path(), &ReaderConfig::default()).unwrap();
        assert_eq!(sequences(logs.run()), vec![8, 9, 10, 11]);
        assert!(logs.gap().is_none());
    }

    #[test]
    fn run_starts_at_lowest_number() {
        let dir = tempfile::tempdir().unwrap();
        write_log_dir(dir.path(), &[(7, one_put(7)), (8, one_put(8))]);
        let logs = LogDirectory::open(dir.path(), &ReaderConfig::default()).unwrap();
        assert_eq!(sequences(logs.run()), vec![7, 8]);
    }

    #[test]
    fn unrelated_entries_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_log_dir(dir.path(), &[(1, one_put(1))]);
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        std::fs::write(dir.path().join("2.ulog.bak"), one_put(2)).unwrap();
        std::fs::create_dir(dir.path().join("2.ulog")).unwrap();

        let logs = LogDirectory::open(dir.path(), &ReaderConfig::default()).unwrap();
        assert_eq!(sequences(logs.entries()), vec![1]);
    }

    #[test]
    fn custom_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1.rlog"), one_put(1)).unwrap();
        std::fs::write(dir.path().join("2.ulog"), one_put(2)).unwrap();
        let config = ReaderConfig {
            extension: "rlog".into(),
            ..Default::default()
        };
        let logs = LogDirectory::open(dir.path(), &config).unwrap();
        assert_eq!(sequences(logs.entries()), vec![1]);
    }

    #[test]
    fn duplicate_sequence_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1.ulog"), one_put(1)).unwrap();
        std::fs::write(dir.path().join("01.ulog"), one_put(1)).unwrap();
        let result = LogDirectory::open(dir.path(), &ReaderConfig::default());
        assert!(matches!(
            result,
            Err(UlogError::DuplicateSequence { sequence: 1 })
        ));
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let logs = LogDirectory::open(dir.path(), &ReaderConfig::default()).unwrap();
        assert!(logs.entries().is_empty());
        assert!(logs.gap().is_none());
        assert!(logs.reader().next_header().unwrap().is_none());
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = LogDirectory::open(dir.path().join("nope"), &ReaderConfig::default());
        assert!(matches!(result, Err(UlogError::Io(_))));
    }

    #[test]
    fn empty_files_are_crossed() {
        let dir = tempfile::tempdir().unwrap();
        write_log_dir(
            dir.path(),
            &[(1, one_put(1)), (2, Vec::new()), (3, one_put(3))],
        );
        let logs = LogDirectory::open(dir.path(), &ReaderConfig::default()).unwrap();
        let mut reader = logs.reader();
        assert_eq!(reader.next_header().unwrap().unwrap().timestamp, Timestamp(1));
        assert_eq!(reader.current_sequence(), Some(1));
        assert_eq!(reader.next_header().unwrap().unwrap().timestamp, Timestamp(3));
        assert_eq!(reader.current_sequence(), Some(3));
        assert!(reader.next_header().unwrap().is_none());
        assert!(reader.current_path().is_none());
    }

    #[test]
    fn body_follows_active_file() {
        let dir = tempfile::tempdir().unwrap();
        write_log_dir(
            dir.path(),
            &[
                (1, LogBuilder::new().put(1, b"first", b"1").into_bytes()),
                (2, LogBuilder::new().out(2, b"second").into_bytes()),
            ],
        );
        let logs = LogDirectory::open(dir.path(), &ReaderConfig::default()).unwrap();
        let mut reader = logs.reader();
        assert!(matches!(reader.body(), Err(UlogError::NoCurrentRecord)));

        reader.next_header().unwrap();
        assert_eq!(reader.decode().unwrap().args.key(), Some(&b"first"[..]));
        reader.next_header().unwrap();
        assert_eq!(reader.decode().unwrap().args.key(), Some(&b"second"[..]));
        assert!(reader
            .current_path()
            .unwrap()
            .ends_with("00000002.ulog"));
    }

    #[test]
    fn corrupt_file_aborts_only_its_own_contribution() {
        let dir = tempfile::tempdir().unwrap();
        let mut broken = LogBuilder::new().put(20, b"a", b"1").into_bytes();
        broken.extend_from_slice(&[0x00; 17]);
        broken.extend_from_slice(&one_put(21));
        write_log_dir(dir.path(), &[(1, one_put(10)), (2, broken), (3, one_put(30))]);

        let logs = LogDirectory::open(dir.path(), &ReaderConfig::default()).unwrap();
        let mut reader = logs.reader();
        assert_eq!(reader.next_header().unwrap().unwrap().timestamp, Timestamp(10));
        assert_eq!(reader.next_header().unwrap().unwrap().timestamp, Timestamp(20));
        assert!(matches!(
            reader.next_header(),
            Err(UlogError::CorruptHeader(_))
        ));
        // The broken file was released; the caller chose to continue.
        assert!(reader.current_sequence().is_none());
        assert_eq!(reader.next_header().unwrap().unwrap().timestamp, Timestamp(30));
        assert!(reader.next_header().unwrap().is_none());
    }
}
