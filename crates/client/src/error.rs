use std::sync::Arc;

/// Shown when a failed submission carries no message of its own.
pub const GENERIC_SUBMIT_ERROR: &str = "Failed to submit report.";

/// Errors from talking to the Report Store.
///
/// `Clone` so one failed fetch can be handed to every reader waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[source] Arc<reqwest::Error>),

    /// The store answered with a non-2xx status. `message` is its `error`
    /// string when it sent one.
    #[error("Report store error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Request(Arc::new(err))
    }
}

impl ClientError {
    /// Text for the submission form's inline error.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } if !message.is_empty() => message.clone(),
            _ => GENERIC_SUBMIT_ERROR.to_string(),
        }
    }
}
