//! Error types for the AT protocol.

use std::io;

use thiserror::Error;

use crate::return_code::ReturnCode;

/// Errors that can occur when exchanging AT commands with the modem.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The MAC layer rejected the command.
    #[error("MAC error: {0}")]
    Mac(ReturnCode),

    /// The AT command interpreter rejected the command.
    #[error("AT error: {0}")]
    At(ReturnCode),

    /// The transport reported a read failure before a status line arrived.
    #[error("transport read failed")]
    ReadFailed,

    /// The transport failed to write the command.
    #[error("transport write failed: {0}")]
    WriteFailed(#[source] io::Error),

    /// The encoded command does not fit the transport's command length.
    #[error("command too long: max {max} bytes, got {actual}")]
    CommandTooLong { max: usize, actual: usize },

    /// Invalid command name or argument.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A field marker was not present in a successful response.
    #[error("field {0} missing from response")]
    MissingField(String),

    /// Hex payload could not be decoded.
    #[error("invalid hex payload: {0}")]
    InvalidHex(String),

    /// The response carries more bytes than the caller allowed.
    #[error("buffer too small: capacity {capacity} bytes, response has {needed}")]
    BufferTooSmall { capacity: usize, needed: usize },

    /// A field value could not be parsed.
    #[error("failed to parse response: {0}")]
    ParseError(String),
}

impl ProtocolError {
    /// Map the error onto the modem's numeric return code table.
    pub fn return_code(&self) -> ReturnCode {
        match self {
            ProtocolError::Mac(code) | ProtocolError::At(code) => *code,
            ProtocolError::ReadFailed => ReturnCode::ReadFailed,
            ProtocolError::CommandTooLong { .. } => ReturnCode::ArgumentSizeMismatch,
            ProtocolError::InvalidCommand(_) => ReturnCode::ArgumentOutOfRange,
            ProtocolError::BufferTooSmall { .. } => ReturnCode::BufferSizeInsufficient,
            ProtocolError::WriteFailed(_)
            | ProtocolError::MissingField(_)
            | ProtocolError::InvalidHex(_)
            | ProtocolError::ParseError(_) => ReturnCode::GenericError,
        }
    }
}

/// Result type alias for AT protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
