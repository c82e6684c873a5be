//! Error types for the interpretation client
//!
//! Every failure is scoped to the workflow or chat session that produced it.
//! `ApiError` is the taxonomy shared by all network-facing calls; the workflow
//! and chat layers wrap it with their own caller-visible guards.

use thiserror::Error;

/// Shown to the user in place of transport or decoding internals
pub const GENERIC_RETRY_MESSAGE: &str =
    "Something went wrong while contacting the service. Please try again.";

/// Coarse classification of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Network,
    Server,
    Parse,
    Cancelled,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Local pre-flight rejection; never reaches the network
    #[error("{0}")]
    Validation(String),

    /// No response was received
    #[error("Network error: {0}")]
    Network(String),

    /// A response arrived but the normalizer classified it as a failure
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Deliberate local abort
    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Network(_) => ErrorKind::Network,
            Self::Server { .. } => ErrorKind::Server,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Text safe to put in front of the user, or `None` when nothing should be shown.
    ///
    /// Validation and server messages are passed through verbatim. Network and
    /// parse failures collapse to a generic retry prompt.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Validation(reason) => Some(reason.clone()),
            Self::Server { message, .. } => Some(message.clone()),
            Self::Network(_) | Self::Parse(_) => Some(GENERIC_RETRY_MESSAGE.to_string()),
            Self::Cancelled => None,
        }
    }

    /// Log the error at the level its kind calls for
    pub(crate) fn log(&self, operation: &str) {
        match self {
            Self::Network(cause) => {
                tracing::error!(operation, cause = %cause, "Network failure")
            }
            Self::Parse(cause) => {
                tracing::error!(operation, cause = %cause, "Malformed response body")
            }
            Self::Server { status, message } => {
                tracing::warn!(operation, status, message = %message, "Server rejected request")
            }
            Self::Validation(reason) => {
                tracing::warn!(operation, reason = %reason, "Rejected before upload")
            }
            Self::Cancelled => tracing::info!(operation, "Request cancelled"),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Result alias for network-facing operations
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A submission is already outstanding
    #[error("A document is already being processed")]
    Busy,

    /// Complete or failed; a failure must be reset first
    #[error("Workflow has already finished")]
    Finished,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl WorkflowError {
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Api(e) => e.user_message(),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    /// The previous question has not been answered yet
    #[error("Still waiting for the previous answer")]
    Busy,

    #[error("Question is empty")]
    EmptyQuestion,

    #[error(transparent)]
    Api(#[from] ApiError),
}
