//! Test utilities for ulog development.
//!
//! [`fixtures`] encodes log bytes and directories; [`RecordingHandler`]
//! is a [`ReplayHandler`] that records every call it receives.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::ops::ControlFlow;

use ulog_core::ReplayHandler;

/// One handler invocation, with owned copies of its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerCall {
    Put { key: Vec<u8>, value: Vec<u8> },
    PutKeep { key: Vec<u8>, value: Vec<u8> },
    PutCat { key: Vec<u8>, value: Vec<u8> },
    PutShl { payload: Vec<u8> },
    PutNr { key: Vec<u8>, value: Vec<u8> },
    Out { key: Vec<u8> },
    AddInt { payload: Vec<u8> },
    AddDouble { payload: Vec<u8> },
    Ext { payload: Vec<u8> },
    Vanish { payload: Vec<u8> },
    Misc { name: Vec<u8>, args: Vec<Vec<u8>> },
    MiscPutlist { pairs: Vec<(Vec<u8>, Vec<u8>)> },
}

impl HandlerCall {
    /// Key touched by this call, for single-key operations.
    pub fn key(&self) -> Option<&[u8]> {
        match self {
            Self::Put { key, .. }
            | Self::PutKeep { key, .. }
            | Self::PutCat { key, .. }
            | Self::PutNr { key, .. }
            | Self::Out { key } => Some(key.as_slice()),
            _ => None,
        }
    }
}

/// Mock implementation of [`ReplayHandler`].
///
/// Appends a [`HandlerCall`] per invocation. With
/// [`stopping_after`](RecordingHandler::stopping_after) it returns
/// `Break` once the given number of calls has been recorded.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    pub calls: Vec<HandlerCall>,
    stop_after: Option<usize>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Break after the `n`th recorded call.
    pub fn stopping_after(n: usize) -> Self {
        Self {
            calls: Vec::new(),
            stop_after: Some(n),
        }
    }

    fn record(&mut self, call: HandlerCall) -> ControlFlow<()> {
        self.calls.push(call);
        match self.stop_after {
            Some(n) if self.calls.len() >= n => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }
}

impl ReplayHandler for RecordingHandler {
    fn put(&mut self, key: &[u8], value: &[u8]) -> ControlFlow<()> {
        self.record(HandlerCall::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    fn put_keep(&mut self, key: &[u8], value: &[u8]) -> ControlFlow<()> {
        self.record(HandlerCall::PutKeep {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    fn put_cat(&mut self, key: &[u8], value: &[u8]) -> ControlFlow<()> {
        self.record(HandlerCall::PutCat {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    fn put_shl(&mut self, payload: &[u8]) -> ControlFlow<()> {
        self.record(HandlerCall::PutShl {
            payload: payload.to_vec(),
        })
    }

    fn put_nr(&mut self, key: &[u8], value: &[u8]) -> ControlFlow<()> {
        self.record(HandlerCall::PutNr {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    fn out(&mut self, key: &[u8]) -> ControlFlow<()> {
        self.record(HandlerCall::Out { key: key.to_vec() })
    }

    fn add_int(&mut self, payload: &[u8]) -> ControlFlow<()> {
        self.record(HandlerCall::AddInt {
            payload: payload.to_vec(),
        })
    }

    fn add_double(&mut self, payload: &[u8]) -> ControlFlow<()> {
        self.record(HandlerCall::AddDouble {
            payload: payload.to_vec(),
        })
    }

    fn ext(&mut self, payload: &[u8]) -> ControlFlow<()> {
        self.record(HandlerCall::Ext {
            payload: payload.to_vec(),
        })
    }

    fn vanish(&mut self, payload: &[u8]) -> ControlFlow<()> {
        self.record(HandlerCall::Vanish {
            payload: payload.to_vec(),
        })
    }

    fn misc(&mut self, name: &[u8], args: &[Vec<u8>]) -> ControlFlow<()> {
        self.record(HandlerCall::Misc {
            name: name.to_vec(),
            args: args.to_vec(),
        })
    }

    fn misc_putlist(&mut self, pairs: &[(&[u8], &[u8])]) -> ControlFlow<()> {
        self.record(HandlerCall::MiscPutlist {
            pairs: pairs.iter().map(|(k, v)| (k.to_vec(), v.to_vec())).collect(),
        })
    }
}
