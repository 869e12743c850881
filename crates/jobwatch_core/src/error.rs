use thiserror::Error;

/// Why a start request did not produce a running job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    /// A required field was empty; nothing was sent.
    #[error("{0}")]
    InvalidInput(String),
    /// A job is already starting or running.
    #[error("a job is already running")]
    AlreadyRunning,
    /// The service answered the start request with a non-success status.
    #[error("{0}")]
    Rejected(String),
    /// The service could not be reached.
    #[error("{0}")]
    Unreachable(String),
    /// The job was stopped or reset before the service confirmed the start.
    #[error("job was stopped before the service confirmed the start")]
    Cancelled,
}

impl StartError {
    pub const GENERIC_REJECTION: &'static str = "Failed to start job";
    pub const GENERIC_UNREACHABLE: &'static str = "Cannot connect to job service. Is it running?";

    /// Builds a rejection, falling back to a generic message when the server
    /// sent no usable text.
    pub fn rejected(server_message: Option<String>) -> Self {
        match server_message {
            Some(text) if !text.trim().is_empty() => Self::Rejected(text),
            _ => Self::Rejected(Self::GENERIC_REJECTION.to_string()),
        }
    }

    pub fn unreachable() -> Self {
        Self::Unreachable(Self::GENERIC_UNREACHABLE.to_string())
    }
}
