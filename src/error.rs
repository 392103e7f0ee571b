//! Error types.
//!
//! Two families live here and they never mix:
//!
//! - [`Error`] is for infrastructure: binding a port, registering a route,
//!   reading configuration, connecting to the database. It is returned from
//!   startup code and never reaches a client.
//! - [`HandlerError`] is what a dispatched handler fails with. It is either a
//!   [`HttpError`] (classified: status + reason, shown to the caller) or an
//!   [`anyhow::Error`] (unclassified: logged, replaced by a generic 500).

use std::fmt;

use crate::status::Status;

/// The error type returned by waypost's fallible setup operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid route `{path}`: {source}")]
    Route {
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("environment variable `{0}` is not set")]
    MissingEnv(&'static str),

    #[error("environment variable `{name}` has an invalid value `{value}`")]
    InvalidEnv { name: &'static str, value: String },

    #[error("loading .env: {0}")]
    Dotenv(#[from] dotenv::Error),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

/// A classified failure: a status code and a human-readable reason, meant to
/// be shown to the caller as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpError {
    status: Status,
    reason: String,
}

impl HttpError {
    /// A blank `reason` is replaced by the status's canonical phrase, so the
    /// reason is never empty.
    pub fn new(status: Status, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let reason = if reason.trim().is_empty() { status.reason().to_owned() } else { reason };
        Self { status, reason }
    }

    /// Builds an error from a raw code. Returns `None` unless `code` is a
    /// known 4xx or 5xx status.
    pub fn from_code(code: u16, reason: impl Into<String>) -> Option<Self> {
        Status::from_code(code)
            .filter(|s| s.is_error())
            .map(|s| Self::new(s, reason))
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::new(Status::BadRequest, reason)
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::new(Status::NotFound, reason)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(Status::MethodNotAllowed, Status::MethodNotAllowed.reason())
    }

    pub fn status(&self) -> Status { self.status }
    pub fn reason(&self) -> &str { &self.reason }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status.code(), self.reason)
    }
}

/// Everything a dispatched handler can fail with.
///
/// `?` converts both halves: an [`HttpError`] becomes `Classified`, an
/// [`anyhow::Error`] (typically produced by `.context(..)`) becomes
/// `Unclassified`.
#[derive(Debug)]
pub enum HandlerError {
    Classified(HttpError),
    Unclassified(anyhow::Error),
}

impl HandlerError {
    pub fn unclassified(err: impl Into<anyhow::Error>) -> Self {
        Self::Unclassified(err.into())
    }
}

impl From<HttpError> for HandlerError {
    fn from(e: HttpError) -> Self {
        Self::Classified(e)
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(e: anyhow::Error) -> Self {
        Self::Unclassified(e)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classified(e) => e.fmt(f),
            Self::Unclassified(e) => write!(f, "{e:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_reason_falls_back_to_canonical_phrase() {
        let err = HttpError::new(Status::NotFound, "  ");
        assert_eq!(err.reason(), "Not Found");
    }

    #[test]
    fn from_code_rejects_non_error_statuses() {
        assert!(HttpError::from_code(200, "fine").is_none());
        assert!(HttpError::from_code(499, "unknown").is_none());
        let err = HttpError::from_code(400, "Missing Title in request body").expect("4xx");
        assert_eq!(err.status(), Status::BadRequest);
    }

    #[test]
    fn question_mark_classifies() {
        fn classified() -> Result<(), HandlerError> {
            Err(HttpError::bad_request("nope"))?
        }
        fn unclassified() -> Result<(), HandlerError> {
            Err(anyhow::anyhow!("connection refused"))?
        }
        assert!(matches!(classified(), Err(HandlerError::Classified(_))));
        assert!(matches!(unclassified(), Err(HandlerError::Unclassified(_))));
    }
}
