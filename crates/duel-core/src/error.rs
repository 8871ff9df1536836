//! Error types for the duel bridge

use thiserror::Error;

/// Result type for duel bridge operations
pub type Result<T> = std::result::Result<T, DuelError>;

/// Duel bridge error types
#[derive(Debug, Error)]
pub enum DuelError {
    /// Handle does not name a live session
    #[error("Invalid duel handle: {0}")]
    InvalidHandle(u64),

    /// Session was destroyed, or its engine is gone
    #[error("Duel session closed")]
    SessionClosed,

    /// Answer buffer was empty
    #[error("Empty answer buffer")]
    EmptyAnswer,

    /// Answer buffer exceeds the configured limit
    #[error("Answer too large: {len} bytes (max {max})")]
    AnswerTooLarge { len: usize, max: usize },

    /// Too many sessions or other bounded resource
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Engine refused to create a duel
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Answer bytes could not be decoded
    #[error("Malformed answer: {0}")]
    MalformedAnswer(String),

    /// Answer is well formed but does not fit the outstanding request
    #[error("Inapplicable answer: {0}")]
    InapplicableAnswer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DuelError {
    /// Negative status code for hosts that only see integers
    pub fn code(&self) -> i32 {
        match self {
            DuelError::InvalidHandle(_)
            | DuelError::SessionClosed
            | DuelError::EmptyAnswer
            | DuelError::AnswerTooLarge { .. } => error_codes::CONTRACT_VIOLATION,
            DuelError::ResourceExhausted(_) => error_codes::RESOURCE_EXHAUSTED,
            DuelError::EngineUnavailable(_) => error_codes::ENGINE_UNAVAILABLE,
            DuelError::MalformedAnswer(_) => error_codes::MALFORMED_ANSWER,
            DuelError::InapplicableAnswer(_) => error_codes::INAPPLICABLE_ANSWER,
            DuelError::Config(_) => error_codes::CONFIG,
        }
    }

    /// True for caller mistakes that leave all state untouched
    pub fn is_contract_violation(&self) -> bool {
        self.code() == error_codes::CONTRACT_VIOLATION
    }
}

impl From<serde_json::Error> for DuelError {
    fn from(err: serde_json::Error) -> Self {
        DuelError::Config(err.to_string())
    }
}

/// Status codes reported to hosts
pub mod error_codes {
    pub const CONTRACT_VIOLATION: i32 = -1;
    pub const RESOURCE_EXHAUSTED: i32 = -2;
    pub const ENGINE_UNAVAILABLE: i32 = -3;
    pub const MALFORMED_ANSWER: i32 = -4;
    pub const INAPPLICABLE_ANSWER: i32 = -5;
    pub const CONFIG: i32 = -6;
}
