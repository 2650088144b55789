//! Error types raised by the HTTP ledger client.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`HttpLedgerError`] failures.
pub type HttpResult<T> = Result<T, HttpLedgerError>;

/// Failures that can occur while talking to the ledger server.
#[derive(Debug, Error)]
pub enum HttpLedgerError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build ledger client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent or timed out.
    #[error("failed to send ledger request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status code.
    #[error("unexpected ledger response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response payload could not be parsed into the expected JSON shape.
    #[error("failed to decode ledger response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<HttpLedgerError> for StorageError {
    fn from(err: HttpLedgerError) -> Self {
        match err {
            HttpLedgerError::RequestStatus { path, status } if status == StatusCode::NOT_FOUND => {
                StorageError::NotFound(path)
            }
            HttpLedgerError::RequestStatus { path, status }
                if status == StatusCode::BAD_REQUEST || status == StatusCode::CONFLICT =>
            {
                StorageError::Rejected(format!("{path} answered {status}"))
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
