//! Binary decode for update-log records.
//!
//! All integers are big-endian. Strings are length-prefixed with a `u32`
//! length. A record is a 17-byte header followed by `body_size` bytes:
//!
//! ```text
//! header: [MAGIC 0xC9] [timestamp u64] [server_id u16] [message_id u16] [body_size u32]
//! body:   [reserved u8] [command u8] [shape-specific fields] [expiration u8]
//! ```
//!
//! Shape-specific fields:
//!
//! ```text
//! KeyValue: [ksiz u32] [vsiz u32] [key] [value]
//! KeyOnly:  [ksiz u32] [key]
//! Misc:     [nsiz u32] [argc u32] [name] ([asiz u32] [arg]) * argc
//! Opaque:   raw bytes up to the expiration byte
//! ```

use std::io::{self, Read, Write};

use ulog_core::{
    Command, CommandArgs, DecodedRecord, MessageId, PayloadShape, RecordHeader, ServerId,
    Timestamp, HEADER_SIZE, MAGIC,
};

use crate::error::{HeaderFault, UlogError};

/// Offset of the first shape-specific byte: past the reserved and command bytes.
pub const BODY_FIELDS_OFFSET: usize = 2;

/// Smallest well-formed body: reserved, command, and expiration bytes.
pub const MIN_BODY_SIZE: usize = 3;

// ── Stream helpers ──────────────────────────────────────────────

/// Fill `buf` from `r`, stopping early only at end of stream.
///
/// Returns the number of bytes read, which is less than `buf.len()` only
/// if the stream ended.
pub(crate) fn read_full(r: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// ── Header encode/decode ────────────────────────────────────────

/// Encode a record header, magic byte included.
pub fn encode_header(w: &mut dyn Write, header: &RecordHeader) -> Result<(), UlogError> {
    let mut buf = [0u8; HEADER_SIZE];
    buf[0] = MAGIC;
    buf[1..9].copy_from_slice(&header.timestamp.0.to_be_bytes());
    buf[9..11].copy_from_slice(&header.server_id.0.to_be_bytes());
    buf[11..13].copy_from_slice(&header.message_id.0.to_be_bytes());
    buf[13..17].copy_from_slice(&header.body_size.to_be_bytes());
    w.write_all(&buf)?;
    Ok(())
}

/// Decode a single record header.
///
/// Returns `Ok(None)` on clean end of stream (zero bytes available),
/// `Ok(Some(header))` on success, and
/// [`UlogError::CorruptHeader`] on a partial header or bad magic.
pub fn decode_header(r: &mut dyn Read) -> Result<Option<RecordHeader>, UlogError> {
    let mut buf = [0u8; HEADER_SIZE];
    let got = read_full(r, &mut buf)?;
    if got == 0 {
        return Ok(None);
    }
    if got < HEADER_SIZE {
        return Err(HeaderFault::ShortRead { got }.into());
    }
    if buf[0] != MAGIC {
        return Err(HeaderFault::BadMagic { found: buf[0] }.into());
    }

    let mut ts = [0u8; 8];
    ts.copy_from_slice(&buf[1..9]);
    let timestamp = u64::from_be_bytes(ts);
    let server_id = u16::from_be_bytes([buf[9], buf[10]]);
    let message_id = u16::from_be_bytes([buf[11], buf[12]]);
    let body_size = u32::from_be_bytes([buf[13], buf[14], buf[15], buf[16]]);

    Ok(Some(RecordHeader {
        timestamp: Timestamp(timestamp),
        server_id: ServerId(server_id),
        message_id: MessageId(message_id),
        body_size,
    }))
}

// ── Body cursor ─────────────────────────────────────────────────

/// A read position over the shape-specific region of a body.
///
/// The region excludes the trailing expiration byte, so no field can
/// overlap it.
#[derive(Debug)]
pub struct BodyCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BodyCursor<'a> {
    /// A cursor over `buf` starting at `pos`.
    pub fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    /// Current offset into the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Take the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], UlogError> {
        let available = self.remaining();
        if len > available {
            return Err(UlogError::TruncatedBody {
                needed: len,
                available,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read a big-endian `u32`.
    pub fn read_u32_be(&mut self) -> Result<u32, UlogError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a `u32` length followed by that many bytes.
    pub fn read_length_prefixed(&mut self) -> Result<&'a [u8], UlogError> {
        let len = self.read_u32_be()? as usize;
        self.read_bytes(len)
    }

    /// Everything from the cursor to the end of the buffer.
    pub fn rest(&mut self) -> &'a [u8] {
        let start = self.pos.min(self.buf.len());
        self.pos = self.buf.len();
        &self.buf[start..]
    }
}

// ── Body decode ─────────────────────────────────────────────────

/// The command byte of a raw body.
pub fn command_code(body: &[u8]) -> Result<u8, UlogError> {
    body.get(1).copied().ok_or(UlogError::TruncatedBody {
        needed: BODY_FIELDS_OFFSET,
        available: body.len(),
    })
}

/// Decode the shape-specific fields and expiration byte of a raw body.
///
/// `body` is the complete `body_size`-byte buffer; decoding starts past
/// the reserved and command bytes.
pub fn decode_body(body: &[u8], shape: PayloadShape) -> Result<(CommandArgs, u8), UlogError> {
    if body.len() < MIN_BODY_SIZE {
        return Err(UlogError::TruncatedBody {
            needed: MIN_BODY_SIZE,
            available: body.len(),
        });
    }
    let (fields, trailer) = body.split_at(body.len() - 1);
    let expiration = trailer[0];
    let mut cursor = BodyCursor::new(fields, BODY_FIELDS_OFFSET);

    let args = match shape {
        PayloadShape::KeyValue => {
            let ksiz = cursor.read_u32_be()? as usize;
            let vsiz = cursor.read_u32_be()? as usize;
            let key = cursor.read_bytes(ksiz)?.to_vec();
            let value = cursor.read_bytes(vsiz)?.to_vec();
            CommandArgs::KeyValue { key, value }
        }
        PayloadShape::KeyOnly => CommandArgs::KeyOnly {
            key: cursor.read_length_prefixed()?.to_vec(),
        },
        PayloadShape::Misc => {
            let nsiz = cursor.read_u32_be()? as usize;
            let argc = cursor.read_u32_be()? as usize;
            let name = cursor.read_bytes(nsiz)?.to_vec();
            // Every argument needs at least its 4-byte length prefix.
            let mut args = Vec::with_capacity(argc.min(cursor.remaining() / 4));
            for _ in 0..argc {
                args.push(cursor.read_length_prefixed()?.to_vec());
            }
            CommandArgs::Misc { name, args }
        }
        PayloadShape::Opaque => CommandArgs::Opaque {
            payload: cursor.rest().to_vec(),
        },
    };

    Ok((args, expiration))
}

/// Resolve the command byte and decode a complete record.
pub fn decode_record(header: RecordHeader, body: &[u8]) -> Result<DecodedRecord, UlogError> {
    let command = Command::from_code(command_code(body)?)?;
    let (args, expiration) = decode_body(body, command.shape())?;
    Ok(DecodedRecord {
        header,
        command,
        args,
        expiration,
    })
}
