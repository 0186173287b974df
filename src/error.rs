//! Error kinds for every layer of a session.
//!
//! Protocol-level failures carry a [`Status`] and leave the session running.
//! Transport-level failures end the session. [`DispatchError::status`] is the
//! only place where the two tiers are told apart.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::protocol::status::Status;

/// A request line that does not name a runnable command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?}")]
    Unknown(String),

    #[error("{command} expects {expected} argument(s), got {got}")]
    Arity {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("argument {0:?} is not an integer")]
    NotAnInteger(String),
}

impl CommandError {
    pub fn status(&self) -> Status {
        match self {
            CommandError::Unknown(_) => Status::InvalidCommand,
            CommandError::Arity { .. } | CommandError::NotAnInteger(_) => Status::InvalidArguments,
        }
    }
}

/// Failures raised by the served-directory operations.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("no such file: {0}")]
    NotFound(String),

    #[error("range {offset}+{size} outside file of {len} bytes")]
    BadOffset { offset: i64, size: i64, len: u64 },

    #[error("storage error: {0}")]
    Io(#[from] io::Error),
}

impl FileError {
    pub fn status(&self) -> Status {
        match self {
            FileError::NotFound(_) => Status::FileNotFound,
            FileError::BadOffset { .. } => Status::BadOffset,
            FileError::Io(_) => Status::InternalError,
        }
    }
}

/// Failures on the byte stream itself, in either direction.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    #[error("connection closed while writing")]
    WriteZero,

    #[error("no data received for {0:?}")]
    Timeout(Duration),

    #[error("buffered {len} bytes without a line terminator (limit {limit})")]
    Overflow { len: usize, limit: usize },

    #[error("request line is not ASCII")]
    NotAscii,
}

impl CodecError {
    /// Errors the client caused by sending garbage, as opposed to the link
    /// going away. These still get a status line before the session closes.
    pub fn status(&self) -> Option<Status> {
        match self {
            CodecError::Overflow { .. } | CodecError::NotAscii => Some(Status::BadRequest),
            _ => None,
        }
    }

    /// True when the peer has gone away (reset, broken pipe, short write).
    pub fn is_disconnect(&self) -> bool {
        match self {
            CodecError::WriteZero => true,
            CodecError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::WriteZero
            ),
            _ => false,
        }
    }
}

/// Everything that can go wrong while serving one request line.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Transport(#[from] CodecError),
}

impl DispatchError {
    /// Status to report for a recoverable failure. `None` means the
    /// transport is gone and nothing more can be sent.
    pub fn status(&self) -> Option<Status> {
        match self {
            DispatchError::Command(e) => Some(e.status()),
            DispatchError::File(e) => Some(e.status()),
            DispatchError::Transport(_) => None,
        }
    }
}
