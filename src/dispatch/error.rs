use http::StatusCode;
use thiserror::Error;

use crate::contract::ContractSection;
use crate::types::{BoxError, Response};

/// Request-time short-circuits. None of these escape `dispatch`: each is
/// turned into a response with the status from `status()`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matches path '{path}'")]
    NotFound { path: String },
    #[error("method '{method}' not allowed on path '{path}'")]
    MethodNotAllowed {
        method: String,
        path: String,
        allow: String,
    },
    #[error("{section} contract rejected the request")]
    ContractViolation { section: ContractSection },
    #[error("request body could not be decoded as {content_type}: {reason}")]
    MalformedBody {
        content_type: &'static str,
        reason: String,
    },
    #[error("decorator #{index} failed: {source}")]
    Decorator {
        index: usize,
        #[source]
        source: BoxError,
    },
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),
    #[error("handler panicked: {0}")]
    HandlerPanic(String),
    #[error("response violates the declared response contract")]
    ResponseContract,
    #[error("request cancelled before the handler ran")]
    Cancelled,
    #[error("router is not sealed")]
    NotReady,
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Non-standard status used by proxies for a client that closed the
/// connection.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::ContractViolation { .. } | DispatchError::MalformedBody { .. } => {
                StatusCode::BAD_REQUEST
            }
            DispatchError::Cancelled => {
                StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::BAD_REQUEST)
            }
            DispatchError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::Decorator { .. }
            | DispatchError::Handler(_)
            | DispatchError::HandlerPanic(_)
            | DispatchError::ResponseContract => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    pub fn into_response(self) -> Response {
        super::response::from_error(&self)
    }
}
