use std::io;
use thiserror::Error;

/// Failures produced while turning buffered bytes into a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    #[error("incomplete body: expected {expected} bytes, received {received}")]
    IncompleteBody { expected: usize, received: usize },
}

/// Main error type for the server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP parsing error: {0}")]
    Parse(#[from] ParseError),

    #[error("request head exceeds {limit} bytes")]
    HeaderTooLarge { limit: usize },

    #[error("declared body of {declared} bytes exceeds {limit} bytes")]
    BodyTooLarge { limit: usize, declared: usize },

    #[error("{0} deadline elapsed")]
    Timeout(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// Reasons a `/static/` request does not yield a file. Each one maps to a
/// fixed status and plain-text body rather than failing the connection.
#[derive(Error, Debug)]
pub enum StaticError {
    #[error("path is not valid percent-encoding")]
    Decode,

    #[error("path contains `..`")]
    Forbidden,

    #[error("file not found")]
    NotFound,

    #[error("failed to read file: {0}")]
    ReadFailure(io::Error),
}
