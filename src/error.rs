//! Error handling

use std::{io, str::Utf8Error, string::FromUtf8Error};

use thiserror::Error;

/// Generic result type
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible WebSocket errors.
#[derive(Debug, Error)]
pub enum Error {
    /// WebSocket connection closed normally. This informs you of the close.
    /// It's not an error as such and nothing wrong happened.
    ///
    /// This is returned as soon as the close handshake is finished (we have
    /// both sent and received a close frame). When you receive this, it is
    /// safe to drop the underlying connection.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Trying to work with already closed connection.
    ///
    /// Trying to read or write after receiving `ConnectionClosed` causes
    /// this. As opposed to `ConnectionClosed`, this indicates your code
    /// tries to operate on the connection when it really shouldn't anymore.
    #[error("Connection already closed")]
    AlreadyClosed,

    /// Input-output error. These are generally errors with the underlying
    /// connection and you should probably consider them fatal.
    #[error("I/O Error: {0}")]
    Io(#[from] io::Error),

    /// Protocol violation.
    #[error("Protocol Error: {0}")]
    Protocol(#[from] ProtocolError),

    /// UTF-8 coding error.
    #[error("UTF-8 Error: {0}")]
    Utf8(String),

    /// Buffer capacity or declared payload size exhausted.
    #[error("Capacity Error: {0}")]
    Capacity(#[from] CapacityError),

    /// HTTP format error while building the upgrade response.
    #[error("HTTP format error: {0}")]
    HttpFormat(#[from] http::Error),

    /// Attack attempt detected.
    #[error("Detected attempted attack")]
    AttackAttempt,
}

impl From<Utf8Error> for Error {
    fn from(value: Utf8Error) -> Self {
        Error::Utf8(value.to_string())
    }
}
impl From<FromUtf8Error> for Error {
    fn from(value: FromUtf8Error) -> Self {
        Error::Utf8(value.to_string())
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(value: http::header::ToStrError) -> Self {
        Error::Utf8(value.to_string())
    }
}

impl From<httparse::Error> for Error {
    fn from(value: httparse::Error) -> Self {
        match value {
            httparse::Error::TooManyHeaders => Error::Capacity(CapacityError::TooManyHeaders),
            e => Error::Protocol(ProtocolError::HttparseError(e)),
        }
    }
}

/// Indicates the specific type/cause of a protocol error.
#[allow(missing_copy_implementations)]
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ProtocolError {
    /// Use of the wrong HTTP method (the WebSocket protocol requires the GET method be used).
    #[error("Invalid HTTP method (must be GET)")]
    InvalidHttpMethod,

    /// Wrong HTTP version used (the WebSocket protocol requires version 1.1 or higher).
    #[error("Unsupported HTTP version (must be at least HTTP/1.1)")]
    InvalidHttpVersion,

    /// Missing `Connection: upgrade` HTTP header.
    #[error("Missing 'Connection: upgrade' header")]
    MissingConnectionUpgradeHeader,

    /// Missing `Upgrade: websocket` HTTP header.
    #[error("Missing 'Upgrade: websocket' header")]
    MissingUpgradeHeader,

    /// Missing `Sec-WebSocket-Version: 13` HTTP header.
    #[error("Missing 'Sec-WebSocket-Version: 13' header")]
    MissingVersionHeader,

    /// Missing `Sec-WebSocket-Key` HTTP header.
    #[error("Missing 'Sec-WebSocket-Key' header")]
    MissingKeyHeader,

    /// The `Sec-WebSocket-Key` header is present but empty or not the
    /// Base64 form of a 16-byte nonce.
    #[error("Malformed 'Sec-WebSocket-Key' header")]
    InvalidKeyHeader,

    /// No more data while still performing handshake.
    #[error("Handshake incomplete")]
    IncompleteHandshake,

    /// Wrapper around a [`httparse::Error`] value.
    #[error("httparse error: {0}")]
    HttparseError(#[from] httparse::Error),

    /// Reserved bits in frame header are non-zero.
    #[error("Encountered frame with non-zero reserved bits")]
    NonZeroReservedBits,

    /// Encountered a reserved opcode value.
    #[error("Received reserved opcode: {0}")]
    ReservedOpCode(u8),

    /// Control frames must not be fragmented.
    #[error("Control frame must not be fragmented")]
    FragmentedControlFrame,

    /// Control frames must have a payload of 125 bytes or less.
    #[error("Control frame payload too large")]
    ControlFrameTooBig,

    /// The server must close the connection when an unmasked frame is received.
    #[error("Received unmasked frame from client")]
    UnmaskedFrameFromClient,

    /// Received a continue frame despite there being nothing to continue.
    #[error("Received continue frame without open fragmentation context")]
    UnexpectedContinue,

    /// Not allowed to send after having sent a closing frame.
    #[error("Sent after close handshake started")]
    SendAfterClose,

    /// Connection closed without performing the closing handshake.
    #[error("Connection closed without proper handshake")]
    ResetWithoutClosing,
}

/// Indicates the specific type/cause of a capacity error.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum CapacityError {
    /// Too many headers provided (see [`httparse::Error::TooManyHeaders`]).
    #[error("Too many headers received")]
    TooManyHeaders,

    /// Declared payload is bigger than the maximum allowed size.
    #[error("Payload too large: {size} > {max}")]
    MessageTooLarge {
        /// The size of the payload.
        size: usize,
        /// The maximum allowed payload size.
        max: usize,
    },
}
