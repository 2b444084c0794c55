//! Read-only views over update logs.
//!
//! Every function here takes a [`RecordSource`] or a [`LogDirectory`] and
//! returns plain data. Row types implement `Display` with tab-separated
//! output for the command-line tool.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use ulog_core::{CommandArgs, MessageId, RecordHeader, ServerId, Timestamp, COMMANDS};
use ulog_replay::dispatch::PUTLIST;
use ulog_replay::{putlist_pairs, LogDirectory, LogFileReader, ReaderConfig, RecordSource, UlogError};

/// Default maximum width of the argument column in [`pretty_rows`].
pub const DEFAULT_PRETTY_WIDTH: usize = 120;

// ── First header ────────────────────────────────────────────────

/// Header of the first record in the file at `path`, or `None` if empty.
pub fn first_header(
    path: impl AsRef<Path>,
    config: &ReaderConfig,
) -> Result<Option<RecordHeader>, UlogError> {
    LogFileReader::open(path, config)?.next_header()
}

// ── Export ──────────────────────────────────────────────────────

/// One record in raw export form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRow {
    /// Record timestamp.
    pub timestamp: Timestamp,
    /// Originating server.
    pub server_id: ServerId,
    /// Message id on that server.
    pub message_id: MessageId,
    /// Command name.
    pub command: &'static str,
    /// The full body as space-separated uppercase hex pairs.
    pub body_hex: String,
}

impl fmt::Display for ExportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}:{}\t{}\t{}",
            self.timestamp, self.server_id, self.message_id, self.command, self.body_hex
        )
    }
}

/// Iterator returned by [`export_rows`]. Fused after the first error.
pub struct ExportRows<'a, S: ?Sized> {
    source: &'a mut S,
    done: bool,
}

/// Stream every record of `source` as an [`ExportRow`].
pub fn export_rows<S: RecordSource + ?Sized>(source: &mut S) -> ExportRows<'_, S> {
    ExportRows {
        source,
        done: false,
    }
}

impl<S: RecordSource + ?Sized> ExportRows<'_, S> {
    fn next_row(&mut self) -> Result<Option<ExportRow>, UlogError> {
        let Some(header) = self.source.next_header()? else {
            return Ok(None);
        };
        let command = self.source.command()?;
        Ok(Some(ExportRow {
            timestamp: header.timestamp,
            server_id: header.server_id,
            message_id: header.message_id,
            command: command.name(),
            body_hex: hex(self.source.body()?),
        }))
    }
}

impl<S: RecordSource + ?Sized> Iterator for ExportRows<'_, S> {
    type Item = Result<ExportRow, UlogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let row = self.next_row().transpose();
        if !matches!(row, Some(Ok(_))) {
            self.done = true;
        }
        row
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{b:02X}"));
    }
    out
}

// ── Pretty export ───────────────────────────────────────────────

/// One record with human-readable time and arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrettyRow {
    /// Record timestamp.
    pub timestamp: Timestamp,
    /// Local wall-clock time, whole seconds. `None` if out of range.
    pub time: Option<DateTime<Local>>,
    /// Originating server.
    pub server_id: ServerId,
    /// Message id on that server.
    pub message_id: MessageId,
    /// Command name.
    pub command: &'static str,
    /// Escaped, comma-separated arguments, truncated with `...`.
    pub args: String,
}

impl fmt::Display for PrettyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.time {
            Some(time) => write!(f, "{}", time.format("%Y-%m-%d %H:%M:%S"))?,
            None => write!(f, "{}", self.timestamp)?,
        }
        write!(
            f,
            "\t{}:{}\t{}\t{}",
            self.server_id, self.message_id, self.command, self.args
        )
    }
}

/// Iterator returned by [`pretty_rows`]. Fused after the first error.
pub struct PrettyRows<'a, S: ?Sized> {
    source: &'a mut S,
    max_len: usize,
    done: bool,
}

/// Stream every record of `source` as a [`PrettyRow`] whose argument
/// column is at most `max_len` bytes.
pub fn pretty_rows<S: RecordSource + ?Sized>(source: &mut S, max_len: usize) -> PrettyRows<'_, S> {
    PrettyRows {
        source,
        max_len,
        done: false,
    }
}

impl<S: RecordSource + ?Sized> PrettyRows<'_, S> {
    fn next_row(&mut self) -> Result<Option<PrettyRow>, UlogError> {
        if self.source.next_header()?.is_none() {
            return Ok(None);
        }
        let record = self.source.decode()?;
        let header = record.header;
        Ok(Some(PrettyRow {
            timestamp: header.timestamp,
            time: local_time(header.timestamp),
            server_id: header.server_id,
            message_id: header.message_id,
            command: record.name(),
            args: truncate(render_args(&record.args), self.max_len),
        }))
    }
}

impl<S: RecordSource + ?Sized> Iterator for PrettyRows<'_, S> {
    type Item = Result<PrettyRow, UlogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let row = self.next_row().transpose();
        if !matches!(row, Some(Ok(_))) {
            self.done = true;
        }
        row
    }
}

fn local_time(ts: Timestamp) -> Option<DateTime<Local>> {
    let secs = i64::try_from(ts.as_secs()).ok()?;
    DateTime::from_timestamp(secs, 0).map(|utc| utc.with_timezone(&Local))
}

fn quoted(bytes: &[u8]) -> String {
    format!("\"{}\"", bytes.escape_ascii())
}

fn render_args(args: &CommandArgs) -> String {
    match args {
        CommandArgs::KeyValue { key, value } => format!("{}, {}", quoted(key), quoted(value)),
        CommandArgs::KeyOnly { key } => quoted(key),
        CommandArgs::Misc { name, args } => {
            let list: Vec<String> = args.iter().map(|a| quoted(a)).collect();
            format!("{}, [{}]", quoted(name), list.join(", "))
        }
        CommandArgs::Opaque { payload } => quoted(payload),
    }
}

/// Cut `s` to `max_len` bytes, ending in `...` when shortened.
fn truncate(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        // Escaped output is ASCII, so any byte index is a char boundary.
        s.truncate(max_len.saturating_sub(3));
        s.push_str(&"..."[..max_len.min(3)]);
    }
    s
}

// ── Summary ─────────────────────────────────────────────────────

/// Per-command totals from [`command_summary`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandTotals {
    /// Number of records.
    pub calls: u64,
    /// Sum of their declared body sizes.
    pub bytes: u64,
}

/// Count records and body bytes per command.
///
/// Every table command appears in the result, in name order, including
/// those with no records. Bodies are never read.
pub fn command_summary<S: RecordSource + ?Sized>(
    source: &mut S,
) -> Result<IndexMap<&'static str, CommandTotals>, UlogError> {
    let mut summary: IndexMap<&'static str, CommandTotals> = COMMANDS
        .iter()
        .map(|c| (c.name(), CommandTotals::default()))
        .collect();
    summary.sort_keys();

    while let Some(header) = source.next_header()? {
        let command = source.command()?;
        let totals = summary.entry(command.name()).or_default();
        totals.calls += 1;
        totals.bytes += u64::from(header.body_size);
    }
    Ok(summary)
}

// ── Timestamp lookup ────────────────────────────────────────────

/// Where a timestamp falls within a directory run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimestampLocation {
    /// Inside this file.
    In(PathBuf),
    /// Earlier than the first record of this, the first file.
    Before(PathBuf),
    /// Inside or after this, the last file.
    AfterOrIn(PathBuf),
}

impl fmt::Display for TimestampLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In(p) => write!(f, "in {}", p.display()),
            Self::Before(p) => write!(f, "before {}", p.display()),
            Self::AfterOrIn(p) => write!(f, "after or in {}", p.display()),
        }
    }
}

/// Find the file of `dir`'s run that should contain `target`.
///
/// Files are judged by their first record only. Empty files are skipped;
/// `None` means the run has no records at all.
pub fn locate_timestamp(
    dir: &LogDirectory,
    target: Timestamp,
) -> Result<Option<TimestampLocation>, UlogError> {
    let mut previous: Option<&Path> = None;
    for (entry, first) in first_timestamps(dir) {
        let Some(first) = first? else {
            continue;
        };
        if first == target {
            return Ok(Some(TimestampLocation::In(entry.to_path_buf())));
        }
        if target < first {
            let location = match previous {
                Some(p) => TimestampLocation::In(p.to_path_buf()),
                None => TimestampLocation::Before(entry.to_path_buf()),
            };
            return Ok(Some(location));
        }
        previous = Some(entry);
    }
    Ok(previous.map(|p| TimestampLocation::AfterOrIn(p.to_path_buf())))
}

/// Files of `dir`'s run that end before `target`.
///
/// A file qualifies when the next non-empty file starts before `target`.
/// The walk stops at the first file starting at or after `target`, and the
/// last file walked is never included since its end is unknown.
pub fn files_before(dir: &LogDirectory, target: Timestamp) -> Result<Vec<PathBuf>, UlogError> {
    let mut before = Vec::new();
    let mut previous: Option<&Path> = None;
    for (entry, first) in first_timestamps(dir) {
        let Some(first) = first? else {
            continue;
        };
        if target <= first {
            break;
        }
        if let Some(p) = previous.replace(entry) {
            before.push(p.to_path_buf());
        }
    }
    Ok(before)
}

/// Each run file's path with the timestamp of its first record.
fn first_timestamps(
    dir: &LogDirectory,
) -> impl Iterator<Item = (&Path, Result<Option<Timestamp>, UlogError>)> + '_ {
    dir.run().iter().zip(dir.files()).map(|(entry, reader)| {
        let first = reader
            .and_then(|mut r| r.next_header())
            .map(|h| h.map(|h| h.timestamp));
        (entry.path.as_path(), first)
    })
}

// ── Key history ─────────────────────────────────────────────────

/// One operation touching a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// Record timestamp.
    pub timestamp: Timestamp,
    /// Command name, or `"putlist"` for a bulk update.
    pub command: &'static str,
    /// The value written, for commands that carry one.
    pub value: Option<Vec<u8>>,
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.timestamp, self.command)?;
        if let Some(value) = &self.value {
            write!(f, "\t{}", quoted(value))?;
        }
        Ok(())
    }
}

/// Every key/value, key-only, and `putlist` operation on `key`, in log order.
pub fn key_history<S: RecordSource + ?Sized>(
    source: &mut S,
    key: &[u8],
) -> Result<Vec<KeyEvent>, UlogError> {
    let mut events = Vec::new();
    while source.next_header()?.is_some() {
        let record = source.decode()?;
        let timestamp = record.header.timestamp;
        match &record.args {
            CommandArgs::KeyValue { key: k, value } if k.as_slice() == key => {
                events.push(KeyEvent {
                    timestamp,
                    command: record.name(),
                    value: Some(value.clone()),
                });
            }
            CommandArgs::KeyOnly { key: k } if k.as_slice() == key => {
                events.push(KeyEvent {
                    timestamp,
                    command: record.name(),
                    value: None,
                });
            }
            CommandArgs::Misc { name, args } if name.as_slice() == PUTLIST => {
                for (k, v) in putlist_pairs(args)? {
                    if k == key {
                        events.push(KeyEvent {
                            timestamp,
                            command: "putlist",
                            value: Some(v.to_vec()),
                        });
                    }
                }
            }
            _ => {}
        }
    }
    Ok(events)
}
