use thiserror::Error;

/// Top-level error type for Kondate.
#[derive(Debug, Error)]
pub enum KondateError {
    /// Error from the text-generation service.
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from a chat platform (parsing or delivery).
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Ingredient store error.
    #[error("memory error: {0}")]
    Memory(String),

    /// The background handoff could not accept a job.
    #[error("handoff error: {0}")]
    Handoff(String),

    /// The inbound request did not pass signature verification.
    #[error("verification failed: {0}")]
    Verification(#[from] VerifyError),

    /// The inbound payload could not be understood.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why an inbound webhook was rejected at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// A required signature or timestamp header was absent.
    #[error("missing header {0}")]
    MissingHeader(&'static str),

    /// The declared timestamp was not an integer.
    #[error("malformed timestamp")]
    MalformedTimestamp,

    /// The recomputed signature did not match the declared one.
    #[error("signature mismatch")]
    SignatureMismatch,

    /// The declared timestamp is outside the freshness window.
    #[error("stale timestamp ({age_secs}s outside a {window_secs}s window)")]
    StaleTimestamp { age_secs: i64, window_secs: i64 },
}
