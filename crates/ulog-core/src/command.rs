//! The command table: one-byte command codes mapped to names and payload shapes.
//!
//! Only mutating commands appear in an update log, so read-only and
//! administrative codes (get, iterinit, sync, stat, ...) have no entry
//! and decode as [`UnknownCommand`].

use std::fmt;

use crate::error::UnknownCommand;

/// How the middle region of a record body is laid out.
///
/// # Examples
///
/// ```
/// use ulog_core::{Command, PayloadShape};
///
/// assert_eq!(Command::Put.shape(), PayloadShape::KeyValue);
/// assert_eq!(Command::Out.shape(), PayloadShape::KeyOnly);
/// assert_eq!(Command::AddInt.shape(), PayloadShape::Opaque);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadShape {
    /// Two length-prefixed byte strings: key, then value.
    KeyValue,
    /// One length-prefixed byte string: the key.
    KeyOnly,
    /// A length-prefixed name, an argument count, then that many
    /// length-prefixed arguments.
    Misc,
    /// Everything between the cursor and the trailing byte, uninterpreted.
    Opaque,
}

/// A mutating command recorded in the update log.
///
/// The set is closed: every variant has exactly one command code and one
/// [`PayloadShape`], and replay handlers implement one method per variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    /// Store a value, overwriting any existing one.
    Put,
    /// Store a value only if the key is absent.
    PutKeep,
    /// Append to an existing value.
    PutCat,
    /// Append and shift the value left to a fixed width.
    PutShl,
    /// Store a value without waiting for a response.
    PutNr,
    /// Remove a key.
    Out,
    /// Add an integer to a stored counter.
    AddInt,
    /// Add a float to a stored counter.
    AddDouble,
    /// Invoke a server-side extension function.
    Ext,
    /// Remove every record.
    Vanish,
    /// A named miscellaneous operation with a variable argument list.
    Misc,
}

/// Every command in the table, in ascending code order.
pub const COMMANDS: [Command; 11] = [
    Command::Put,
    Command::PutKeep,
    Command::PutCat,
    Command::PutShl,
    Command::PutNr,
    Command::Out,
    Command::AddInt,
    Command::AddDouble,
    Command::Ext,
    Command::Vanish,
    Command::Misc,
];

impl Command {
    /// Look up a command by its wire code.
    ///
    /// # Examples
    ///
    /// ```
    /// use ulog_core::{Command, UnknownCommand};
    ///
    /// assert_eq!(Command::from_code(0x10), Ok(Command::Put));
    /// // 0x30 is `get`: read-only, never logged.
    /// assert_eq!(Command::from_code(0x30), Err(UnknownCommand { code: 0x30 }));
    /// ```
    pub fn from_code(code: u8) -> Result<Self, UnknownCommand> {
        let command = match code {
            0x10 => Self::Put,
            0x11 => Self::PutKeep,
            0x12 => Self::PutCat,
            0x13 => Self::PutShl,
            0x18 => Self::PutNr,
            0x20 => Self::Out,
            0x60 => Self::AddInt,
            0x61 => Self::AddDouble,
            0x68 => Self::Ext,
            0x72 => Self::Vanish,
            0x90 => Self::Misc,
            _ => return Err(UnknownCommand { code }),
        };
        Ok(command)
    }

    /// The wire code for this command.
    pub fn code(self) -> u8 {
        match self {
            Self::Put => 0x10,
            Self::PutKeep => 0x11,
            Self::PutCat => 0x12,
            Self::PutShl => 0x13,
            Self::PutNr => 0x18,
            Self::Out => 0x20,
            Self::AddInt => 0x60,
            Self::AddDouble => 0x61,
            Self::Ext => 0x68,
            Self::Vanish => 0x72,
            Self::Misc => 0x90,
        }
    }

    /// The command name as used by the store's own tooling.
    pub fn name(self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::PutKeep => "putkeep",
            Self::PutCat => "putcat",
            Self::PutShl => "putshl",
            Self::PutNr => "putnr",
            Self::Out => "out",
            Self::AddInt => "addint",
            Self::AddDouble => "adddouble",
            Self::Ext => "ext",
            Self::Vanish => "vanish",
            Self::Misc => "misc",
        }
    }

    /// The payload shape the body codec uses for this command.
    pub fn shape(self) -> PayloadShape {
        match self {
            Self::Put | Self::PutKeep | Self::PutCat | Self::PutNr => PayloadShape::KeyValue,
            Self::Out => PayloadShape::KeyOnly,
            Self::Misc => PayloadShape::Misc,
            Self::PutShl | Self::AddInt | Self::AddDouble | Self::Ext | Self::Vanish => {
                PayloadShape::Opaque
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Command {
    type Error = UnknownCommand;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

/// Resolve a command code to its `(name, shape)` table entry.
///
/// # Examples
///
/// ```
/// use ulog_core::{name_and_shape, PayloadShape};
///
/// assert_eq!(name_and_shape(0x90), Ok(("misc", PayloadShape::Misc)));
/// assert!(name_and_shape(0xa0).is_err());
/// ```
pub fn name_and_shape(code: u8) -> Result<(&'static str, PayloadShape), UnknownCommand> {
    let command = Command::from_code(code)?;
    Ok((command.name(), command.shape()))
}
