use thiserror::Error;

use crate::credentials::CredentialError;

/// Failure of a single call to the text-generation backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("transport failure: {0}")]
    Network(String),
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
    #[error("empty generation response")]
    EmptyResponse,
}

impl GenerationError {
    /// Network failures, rate limiting and server errors may succeed on a
    /// later attempt; client errors never do.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Network(_) => true,
            GenerationError::Status { status, .. } => *status == 429 || *status >= 500,
            GenerationError::EmptyResponse => false,
        }
    }
}

/// Why a placement attempt was aborted. The room is never modified when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("{message}")]
    Transport { status: Option<u16>, message: String },
    #[error("empty generation response")]
    EmptyResponse,
    #[error("no JSON object found in the model response")]
    Extraction,
    #[error("could not interpret the model response: {0}")]
    Parse(String),
    #[error("a placement request is already in progress")]
    Busy,
}

impl PlacementError {
    /// True when the backend rejected the credential, which callers answer by
    /// discarding the stored key and asking for a new one.
    pub fn is_auth_expiry(&self) -> bool {
        match self {
            PlacementError::Transport { status, message } => {
                matches!(status, Some(401 | 403))
                    || message.contains("API key")
                    || message.contains("401")
            }
            _ => false,
        }
    }

    /// Stable machine-readable error code.
    pub fn kind(&self) -> &'static str {
        match self {
            PlacementError::Credential(_) => "credential",
            PlacementError::Transport { .. } if self.is_auth_expiry() => "auth_expired",
            PlacementError::Transport { .. } => "transport",
            PlacementError::EmptyResponse => "empty_response",
            PlacementError::Extraction => "extraction",
            PlacementError::Parse(_) => "parse",
            PlacementError::Busy => "busy",
        }
    }
}

impl From<GenerationError> for PlacementError {
    fn from(value: GenerationError) -> Self {
        match value {
            GenerationError::Network(message) => PlacementError::Transport {
                status: None,
                message,
            },
            GenerationError::Status { status, message } => PlacementError::Transport {
                status: Some(status),
                message,
            },
            GenerationError::EmptyResponse => PlacementError::EmptyResponse,
        }
    }
}
