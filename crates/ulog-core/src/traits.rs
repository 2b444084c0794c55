//! The replay target capability trait.

use std::ops::ControlFlow;

/// A destination for replayed update-log operations.
///
/// One method per command in the table, plus [`misc_putlist`](Self::misc_putlist)
/// for bulk key/value updates and [`misc`](Self::misc) for every other named
/// misc operation. Read-only misc operations (`getlist`) are never delivered.
///
/// Returning [`ControlFlow::Break`] stops the replay after the current record.
/// A handler that needs to report a failure should record it and break.
pub trait ReplayHandler {
    /// Store `value` under `key`, overwriting.
    fn put(&mut self, key: &[u8], value: &[u8]) -> ControlFlow<()>;

    /// Store `value` under `key` only if the key is absent.
    fn put_keep(&mut self, key: &[u8], value: &[u8]) -> ControlFlow<()>;

    /// Append `value` to the value stored under `key`.
    fn put_cat(&mut self, key: &[u8], value: &[u8]) -> ControlFlow<()>;

    /// Shift-append; the payload is delivered undecoded.
    fn put_shl(&mut self, payload: &[u8]) -> ControlFlow<()>;

    /// Store `value` under `key` without a response.
    fn put_nr(&mut self, key: &[u8], value: &[u8]) -> ControlFlow<()>;

    /// Remove `key`.
    fn out(&mut self, key: &[u8]) -> ControlFlow<()>;

    /// Integer increment; the payload is delivered undecoded.
    fn add_int(&mut self, payload: &[u8]) -> ControlFlow<()>;

    /// Float increment; the payload is delivered undecoded.
    fn add_double(&mut self, payload: &[u8]) -> ControlFlow<()>;

    /// Extension call; the payload is delivered undecoded.
    fn ext(&mut self, payload: &[u8]) -> ControlFlow<()>;

    /// Remove every record. The payload is normally empty.
    fn vanish(&mut self, payload: &[u8]) -> ControlFlow<()>;

    /// A misc operation other than `putlist` and `getlist`.
    fn misc(&mut self, name: &[u8], args: &[Vec<u8>]) -> ControlFlow<()>;

    /// A `putlist` misc operation, as `(key, value)` pairs in wire order.
    fn misc_putlist(&mut self, pairs: &[(&[u8], &[u8])]) -> ControlFlow<()>;
}
