//! Replay of decoded records into a [`ReplayHandler`].
//!
//! [`replay`] pulls records from any [`RecordSource`] until it is exhausted,
//! the handler breaks, or a record fails to decode. Each record is fully
//! decoded and validated before the handler sees it, so a malformed record
//! is never partially applied.

use std::ops::ControlFlow;

use ulog_core::{Command, CommandArgs, DecodedRecord, ReplayHandler};

use crate::error::UlogError;
use crate::source::RecordSource;

/// Misc operation name for bulk key/value updates.
pub const PUTLIST: &[u8] = b"putlist";

/// Misc operation name for bulk reads; logged but never replayed.
pub const GETLIST: &[u8] = b"getlist";

/// Counters from a completed replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Records read from the source.
    pub records: u64,
    /// Records delivered to the handler.
    pub dispatched: u64,
    /// Records read but deliberately not delivered (`getlist`).
    pub skipped: u64,
    /// Whether the handler stopped the replay early.
    pub stopped: bool,
}

/// Replay every record in `source` into `handler`.
///
/// Returns the first error encountered; records before it have already
/// been applied, the failing record has not.
pub fn replay<S, H>(source: &mut S, handler: &mut H) -> Result<ReplayStats, UlogError>
where
    S: RecordSource + ?Sized,
    H: ReplayHandler + ?Sized,
{
    let mut stats = ReplayStats::default();
    while source.next_header()?.is_some() {
        let record = source.decode()?;
        stats.records += 1;
        match dispatch(&record, handler)? {
            Dispatch::Skipped => stats.skipped += 1,
            Dispatch::Delivered(ControlFlow::Continue(())) => stats.dispatched += 1,
            Dispatch::Delivered(ControlFlow::Break(())) => {
                stats.dispatched += 1;
                stats.stopped = true;
                tracing::debug!(
                    timestamp = record.header.timestamp.0,
                    "replay stopped by handler"
                );
                break;
            }
        }
    }
    Ok(stats)
}

/// Outcome of dispatching one record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// The handler was invoked and returned this flow.
    Delivered(ControlFlow<()>),
    /// The record is read-only and was not delivered.
    Skipped,
}

/// Deliver one decoded record to `handler`.
///
/// Fails without invoking the handler if the arguments do not match the
/// command's shape or a `putlist` has an unpaired key.
pub fn dispatch<H>(record: &DecodedRecord, handler: &mut H) -> Result<Dispatch, UlogError>
where
    H: ReplayHandler + ?Sized,
{
    let flow = match (record.command, &record.args) {
        (Command::Put, CommandArgs::KeyValue { key, value }) => handler.put(key, value),
        (Command::PutKeep, CommandArgs::KeyValue { key, value }) => handler.put_keep(key, value),
        (Command::PutCat, CommandArgs::KeyValue { key, value }) => handler.put_cat(key, value),
        (Command::PutNr, CommandArgs::KeyValue { key, value }) => handler.put_nr(key, value),
        (Command::Out, CommandArgs::KeyOnly { key }) => handler.out(key),
        (Command::PutShl, CommandArgs::Opaque { payload }) => handler.put_shl(payload),
        (Command::AddInt, CommandArgs::Opaque { payload }) => handler.add_int(payload),
        (Command::AddDouble, CommandArgs::Opaque { payload }) => handler.add_double(payload),
        (Command::Ext, CommandArgs::Opaque { payload }) => handler.ext(payload),
        (Command::Vanish, CommandArgs::Opaque { payload }) => handler.vanish(payload),
        (Command::Misc, CommandArgs::Misc { name, args }) => {
            if name.as_slice() == GETLIST {
                tracing::trace!(
                    timestamp = record.header.timestamp.0,
                    "skipping read-only getlist"
                );
                return Ok(Dispatch::Skipped);
            }
            if name.as_slice() == PUTLIST {
                let pairs = putlist_pairs(args)?;
                handler.misc_putlist(&pairs)
            } else {
                handler.misc(name, args)
            }
        }
        // Only reachable for hand-built records; the codec always decodes
        // with the command's own shape.
        (command, args) => return Err(shape_mismatch(command, args)),
    };
    Ok(Dispatch::Delivered(flow))
}

/// Pair up `putlist` arguments as `(args[2i], args[2i + 1])`.
///
/// An odd count is rejected rather than dropping the dangling key.
pub fn putlist_pairs(args: &[Vec<u8>]) -> Result<Vec<(&[u8], &[u8])>, UlogError> {
    if args.len() % 2 != 0 {
        return Err(UlogError::UnpairedPutlist {
            arg_count: args.len(),
        });
    }
    Ok(args
        .chunks_exact(2)
        .map(|pair| (pair[0].as_slice(), pair[1].as_slice()))
        .collect())
}

fn shape_mismatch(command: Command, args: &CommandArgs) -> UlogError {
    UlogError::ShapeMismatch {
        command: command.name(),
        shape: args.shape(),
    }
}
