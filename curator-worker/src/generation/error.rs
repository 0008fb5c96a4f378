#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation request timed out")]
    Timeout,

    #[error("could not reach generation backend: {0}")]
    Connection(String),

    #[error("generation backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("generation failed after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<GenerationError>,
    },
}

impl GenerationError {
    /// Worth retrying: timeouts, connection faults, rate limits and 5xx
    /// (including 529 "overloaded")
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Timeout | GenerationError::Connection(_) => true,
            GenerationError::Status { status, .. } => *status == 429 || *status >= 500,
            GenerationError::MalformedResponse(_) | GenerationError::RetriesExhausted { .. } => false,
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout
        } else if err.is_decode() {
            GenerationError::MalformedResponse(err.to_string())
        } else {
            GenerationError::Connection(err.to_string())
        }
    }
}
