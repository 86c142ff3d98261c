//! Error classification
//!
//! Every failure the engine reports reaches the host as a [`HuskError`]: a
//! numeric [`ErrorKind`] plus a handle to the error object, which the host
//! can query for the message and structured data.

use crate::stream::ForeignStreamError;
use husk_syntax::expand::ExpandError;
use std::io;
use thiserror::Error;

/// Errors returned by bridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Parsing, quoting, or reading the host stream failed
    #[error(transparent)]
    Syntax(#[from] husk_syntax::Error),

    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error("failed to encode syntax tree: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure categories exposed to the host; never zero
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io = 1,
    UnexpectedCommand = 2,
    UnsetParameter = 3,
    ExitStatus = 4,
    Lang = 5,
    Parse = 6,
    Quote = 7,
    Unknown = 8,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::Io,
        ErrorKind::UnexpectedCommand,
        ErrorKind::UnsetParameter,
        ErrorKind::ExitStatus,
        ErrorKind::Lang,
        ErrorKind::Parse,
        ErrorKind::Quote,
        ErrorKind::Unknown,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A tagged error as written to the host's out-pointer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuskError {
    pub kind: i32,
    /// Handle to the error object, or 0
    pub detail: u64,
}

/// Map an error to the category the host sees
pub fn classify(err: &BridgeError) -> ErrorKind {
    match err {
        BridgeError::Syntax(inner) | BridgeError::Expand(ExpandError::Syntax(inner)) => {
            classify_syntax(inner)
        }
        BridgeError::Expand(ExpandError::UnexpectedCommand { .. }) => ErrorKind::UnexpectedCommand,
        BridgeError::Expand(ExpandError::UnsetParameter { .. }) => ErrorKind::UnsetParameter,
        BridgeError::Expand(ExpandError::ExitStatus(_)) => ErrorKind::ExitStatus,
        _ => ErrorKind::Unknown,
    }
}

fn classify_syntax(err: &husk_syntax::Error) -> ErrorKind {
    match err {
        husk_syntax::Error::Io(_) => ErrorKind::Io,
        husk_syntax::Error::Parse(_) => ErrorKind::Parse,
        husk_syntax::Error::Lang(_) => ErrorKind::Lang,
        husk_syntax::Error::Quote(_) => ErrorKind::Quote,
    }
}

impl BridgeError {
    pub fn syntax(&self) -> Option<&husk_syntax::Error> {
        match self {
            BridgeError::Syntax(inner) | BridgeError::Expand(ExpandError::Syntax(inner)) => {
                Some(inner)
            }
            _ => None,
        }
    }

    pub fn io(&self) -> Option<&io::Error> {
        match self.syntax()? {
            husk_syntax::Error::Io(err) => Some(err),
            _ => None,
        }
    }

    /// The value a host read callback reported, if that's what failed
    pub fn foreign_detail(&self) -> Option<u64> {
        self.io()?
            .get_ref()?
            .downcast_ref::<ForeignStreamError>()
            .map(|err| err.detail)
    }

    pub fn exit_status(&self) -> Option<u8> {
        match self {
            BridgeError::Expand(ExpandError::ExitStatus(code)) => Some(*code),
            _ => None,
        }
    }
}
