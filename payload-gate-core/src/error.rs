//! Failure classification and the JSON error envelope.
//!
//! Every otherwise-unhandled failure in the pipeline ends up here: it is
//! classified as either client-originated (carrying an intended HTTP
//! status) or an unexpected server fault, and rendered into the
//! [`ErrorEnvelope`] returned to callers.

use http::StatusCode;
use serde::Serialize;

/// A type-erased error, as carried across service boundaries.
///
/// Matches `tower::BoxError` so stage errors flow through Tower stacks
/// without conversion.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error explicitly signaled by a handler or an earlier stage as
/// client-caused, carrying the HTTP status the response should use.
///
/// This is the only failure whose status survives mapping; everything else
/// is forced to 500.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ClientError {
    status: StatusCode,
    message: String,
}

impl ClientError {
    /// Create a new client error with an attached status.
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Get the attached HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Create a 401 Unauthorized error.
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Create a 403 Forbidden error.
    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Create a 404 Not Found error.
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Create a 409 Conflict error.
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

/// Errors raised by the compression stages themselves.
#[derive(Clone, Debug, thiserror::Error)]
pub enum GateError {
    /// Decompression of a sniffed-as-gzip body failed.
    #[error("decompression failed: {0}")]
    Decompress(String),

    /// Compression of an outgoing body failed.
    #[error("compression failed: {0}")]
    Compress(String),

    /// The body could not be buffered.
    #[error("failed to buffer body: {0}")]
    BodyCollect(String),

    /// The body exceeded the configured receive limit.
    #[error("request body exceeds maximum allowed size of {limit} bytes")]
    OverLimit { limit: usize },
}

/// The outcome of classifying an otherwise-unhandled failure.
#[derive(Debug)]
pub enum Failure {
    /// A client-caused failure; the attached status survives mapping and
    /// the failure is not treated as a server fault.
    Client {
        status: StatusCode,
        message: String,
    },
    /// Anything else: an unexpected server-side fault, mapped to 500.
    Server { error: BoxError },
}

impl Failure {
    /// Classify a type-erased error.
    ///
    /// An error that is (or wraps, anywhere in its source chain) a
    /// [`ClientError`] classifies as [`Failure::Client`]; everything else
    /// is a [`Failure::Server`].
    pub fn classify(error: BoxError) -> Self {
        let error = match error.downcast::<ClientError>() {
            Ok(client) => {
                return Failure::Client {
                    status: client.status,
                    message: client.message,
                };
            }
            Err(error) => error,
        };

        let mut source = error.source();
        while let Some(cause) = source {
            if let Some(client) = cause.downcast_ref::<ClientError>() {
                return Failure::Client {
                    status: client.status,
                    message: client.message.clone(),
                };
            }
            source = cause.source();
        }

        Failure::Server { error }
    }

    /// The HTTP status this failure maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Failure::Client { status, .. } => *status,
            Failure::Server { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The human-readable summary of this failure.
    pub fn message(&self) -> String {
        match self {
            Failure::Client { message, .. } => message.clone(),
            Failure::Server { error } => error.to_string(),
        }
    }

    /// Render the failure's source chain as a multi-line diagnostic trace.
    pub fn render_trace(&self) -> String {
        match self {
            Failure::Client { status, message } => format!("{status}: {message}"),
            Failure::Server { error } => {
                let mut lines = vec![error.to_string()];
                let mut source = error.source();
                while let Some(cause) = source {
                    lines.push(format!("caused by: {cause}"));
                    source = cause.source();
                }
                lines.join("\n")
            }
        }
    }
}

/// The structured error payload returned to callers on failure.
///
/// Serialized as JSON with fields `status` (int), `message` (string), and
/// an optional `stackTrace` (string) present only when the mapper was
/// configured to return diagnostic detail.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub message: String,
    #[serde(rename = "stackTrace", skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl ErrorEnvelope {
    /// Build the envelope for a classified failure.
    ///
    /// `diagnostics` controls only what is sent back to the caller; it has
    /// no effect on server-side logging.
    pub fn from_failure(failure: &Failure, diagnostics: bool) -> Self {
        Self {
            status: failure.status().as_u16(),
            message: failure.message(),
            stack_trace: diagnostics.then(|| failure.render_trace()),
        }
    }
}
