use std::io;

use thiserror::Error;

use crate::http::request::{Method, Version};
use crate::http::response::StatusCode;

/// Protocol and routing failures that are answered with an error page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HttpError {
    /// Malformed request line or header, invalid method/version combination,
    /// missing `Host` at HTTP/1.1, or a request target that is not a valid URI.
    #[error("bad request")]
    BadRequest,
    /// The target resolves outside the document root.
    #[error("forbidden")]
    Forbidden,
    /// The target resolves inside the document root but does not exist.
    #[error("not found")]
    NotFound,
    /// A syntactically valid method other than GET or HEAD.
    #[error("not implemented")]
    NotImplemented,
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::BadRequest => StatusCode::BadRequest,
            HttpError::Forbidden => StatusCode::Forbidden,
            HttpError::NotFound => StatusCode::NotFound,
            HttpError::NotImplemented => StatusCode::NotImplemented,
        }
    }
}

/// Everything that can stop the parser from producing a `Request`.
///
/// Apart from `NoDataFromClient`, every variant carries what was learned
/// about the request before it failed: the version decides the wire format
/// of the error response, the method whether its body is sent.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The peer closed the connection before sending anything. Not answered.
    #[error("client closed the connection without sending a request")]
    NoDataFromClient,

    /// `keep_alive` is set only when the whole request was read and it asked
    /// for a persistent connection; framing errors always close.
    #[error("{error} ({version})")]
    Rejected {
        error: HttpError,
        version: Version,
        method: Option<Method>,
        keep_alive: bool,
    },

    #[error("timed out waiting for request data ({version})")]
    Timeout {
        version: Version,
        method: Option<Method>,
    },

    #[error("i/o error while reading request: {source}")]
    Io {
        #[source]
        source: io::Error,
        version: Version,
        method: Option<Method>,
    },
}

/// Whether an I/O error means the peer went away mid-exchange.
pub fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}
