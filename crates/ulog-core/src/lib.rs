//! Core types and traits for decoding replication update logs.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the command table, the record data model, identifier newtypes, and
//! the [`ReplayHandler`] capability trait that replay targets implement.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod command;
pub mod error;
pub mod id;
pub mod record;
pub mod traits;

pub use command::{name_and_shape, Command, PayloadShape, COMMANDS};
pub use error::UnknownCommand;
pub use id::{MessageId, ServerId, Timestamp};
pub use record::{CommandArgs, DecodedRecord, RecordHeader, HEADER_SIZE, MAGIC};
pub use traits::ReplayHandler;
