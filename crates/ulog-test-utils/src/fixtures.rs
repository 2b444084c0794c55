//! Byte-level builders for update-log test data.
//!
//! These encode records independently of the decoder so tests exercise
//! the real wire layout rather than a round trip through shared code.

use std::fs;
use std::path::{Path, PathBuf};

use ulog_core::{Command, MAGIC};

/// Reserved byte written at offset 0 of every fixture body.
pub const RESERVED: u8 = 0xC8;

/// Encode a 17-byte record header.
pub fn encode_header(timestamp: u64, server_id: u16, message_id: u16, body_size: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(17);
    out.push(MAGIC);
    out.extend_from_slice(&timestamp.to_be_bytes());
    out.extend_from_slice(&server_id.to_be_bytes());
    out.extend_from_slice(&message_id.to_be_bytes());
    out.extend_from_slice(&body_size.to_be_bytes());
    out
}

fn len_u32(bytes: &[u8]) -> [u8; 4] {
    (bytes.len() as u32).to_be_bytes()
}

/// Body for a key/value command: both lengths, then key, then value.
pub fn kv_body(command: Command, key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut body = vec![RESERVED, command.code()];
    body.extend_from_slice(&len_u32(key));
    body.extend_from_slice(&len_u32(value));
    body.extend_from_slice(key);
    body.extend_from_slice(value);
    body.push(0);
    body
}

/// Body for a key-only command.
pub fn key_body(command: Command, key: &[u8]) -> Vec<u8> {
    let mut body = vec![RESERVED, command.code()];
    body.extend_from_slice(&len_u32(key));
    body.extend_from_slice(key);
    body.push(0);
    body
}

/// Body whose fields are carried verbatim.
pub fn opaque_body(command: Command, payload: &[u8]) -> Vec<u8> {
    let mut body = vec![RESERVED, command.code()];
    body.extend_from_slice(payload);
    body.push(0);
    body
}

/// Body for a misc operation with length-prefixed arguments.
pub fn misc_body(name: &[u8], args: &[&[u8]]) -> Vec<u8> {
    let mut body = vec![RESERVED, Command::Misc.code()];
    body.extend_from_slice(&len_u32(name));
    body.extend_from_slice(&(args.len() as u32).to_be_bytes());
    body.extend_from_slice(name);
    for arg in args {
        body.extend_from_slice(&len_u32(arg));
        body.extend_from_slice(arg);
    }
    body.push(0);
    body
}

/// Accumulates records into the bytes of one log file.
///
/// Every record is stamped with the builder's current server and message
/// ids; the message id increments after each record.
#[derive(Clone, Debug)]
pub struct LogBuilder {
    bytes: Vec<u8>,
    server_id: u16,
    message_id: u16,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            server_id: 1,
            message_id: 1,
        }
    }

    /// Use `server_id` and start message ids at `message_id` for later records.
    pub fn origin(mut self, server_id: u16, message_id: u16) -> Self {
        self.server_id = server_id;
        self.message_id = message_id;
        self
    }

    /// Append a record with an arbitrary body.
    pub fn raw(mut self, timestamp: u64, body: Vec<u8>) -> Self {
        let header = encode_header(
            timestamp,
            self.server_id,
            self.message_id,
            body.len() as u32,
        );
        self.bytes.extend_from_slice(&header);
        self.bytes.extend_from_slice(&body);
        self.message_id = self.message_id.wrapping_add(1);
        self
    }

    pub fn put(self, timestamp: u64, key: &[u8], value: &[u8]) -> Self {
        self.raw(timestamp, kv_body(Command::Put, key, value))
    }

    pub fn put_keep(self, timestamp: u64, key: &[u8], value: &[u8]) -> Self {
        self.raw(timestamp, kv_body(Command::PutKeep, key, value))
    }

    pub fn put_cat(self, timestamp: u64, key: &[u8], value: &[u8]) -> Self {
        self.raw(timestamp, kv_body(Command::PutCat, key, value))
    }

    pub fn put_nr(self, timestamp: u64, key: &[u8], value: &[u8]) -> Self {
        self.raw(timestamp, kv_body(Command::PutNr, key, value))
    }

    pub fn out(self, timestamp: u64, key: &[u8]) -> Self {
        self.raw(timestamp, key_body(Command::Out, key))
    }

    pub fn opaque(self, timestamp: u64, command: Command, payload: &[u8]) -> Self {
        self.raw(timestamp, opaque_body(command, payload))
    }

    pub fn misc(self, timestamp: u64, name: &[u8], args: &[&[u8]]) -> Self {
        self.raw(timestamp, misc_body(name, args))
    }

    pub fn putlist(self, timestamp: u64, pairs: &[(&[u8], &[u8])]) -> Self {
        let args: Vec<&[u8]> = pairs.iter().flat_map(|&(k, v)| [k, v]).collect();
        self.misc(timestamp, b"putlist", &args)
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Default for LogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// File name for sequence number `sequence` with the default extension.
pub fn log_file_name(sequence: u64) -> String {
    format!("{sequence:08}.ulog")
}

/// Write each `(sequence, bytes)` pair as a log file under `dir`.
///
/// Returns the written paths in argument order. Panics on I/O failure.
pub fn write_log_dir(dir: &Path, files: &[(u64, Vec<u8>)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(sequence, bytes)| {
            let path = dir.join(log_file_name(*sequence));
            fs::write(&path, bytes).unwrap();
            path
        })
        .collect()
}
