use thiserror::Error;

/// Errors produced while decoding a binary wire message
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("message truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("unknown message type tag: {0}")]
    UnknownMessageType(u8),

    #[error("unknown ping status tag: {0}")]
    UnknownStatus(u8),

    #[error("field `{0}` is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
}

/// Errors produced while parsing a bus command string such as `flush_out()`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("malformed command: {0:?}")]
    Malformed(String),

    #[error("unknown command: {0}")]
    Unknown(String),
}

/// Errors raised when handing data across the pipeline boundary
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("pipeline channel closed")]
    PipelineClosed,

    #[error("event loop channel closed")]
    LoopClosed,

    #[error("transport channel closed")]
    TransportClosed,
}
