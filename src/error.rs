use thiserror::Error;

/// Classification of a failed prediction, models query or workflow call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection, DNS or timeout failure before any response arrived.
    Transport,
    /// The service answered with an error status and a structured message.
    ServerRejected,
    /// The response body could not be parsed into the expected shape.
    MalformedResponse,
    /// A workflow precondition was violated, e.g. a double submit.
    InvalidState,
    /// The image behind the URI could not be read for upload.
    ImageUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::ServerRejected => "server_rejected",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::ImageUnavailable => "image_unavailable",
        }
    }
}

/// Error surfaced to the caller and carried by `WorkflowState::Failed`.
///
/// `message` is always human-readable text suitable for display.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{message}")]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status of the response, when the service answered at all.
    pub status: Option<u16>,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn server_rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerRejected, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }

    pub fn image_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ImageUnavailable, message)
    }
}

impl From<reqwest::Error> for ErrorInfo {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let info = if err.is_decode() {
            ErrorInfo::malformed(format!("Could not decode response: {err}"))
        } else if err.is_timeout() {
            ErrorInfo::transport(format!("Request timed out: {err}"))
        } else {
            ErrorInfo::transport(format!("Service not reachable: {err}"))
        };
        match status {
            Some(status) => info.with_status(status),
            None => info,
        }
    }
}

/// Errors raised while building a client, before any request is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("base url cannot carry endpoint paths: {0}")]
    UnsupportedBaseUrl(String),

    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_the_message_only() {
        let err = ErrorInfo::server_rejected("model unavailable").with_status(500);
        assert_eq!(err.to_string(), "model unavailable");
        assert_eq!(err.kind, ErrorKind::ServerRejected);
        assert_eq!(err.status, Some(500));
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(ErrorKind::InvalidState.as_str(), "invalid_state");
        assert_eq!(ErrorKind::Transport.as_str(), "transport");
    }
}
