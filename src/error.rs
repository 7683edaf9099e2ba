//! Error types for the Turnstile crate.

use thiserror::Error;

/// Main error type for Turnstile operations.
///
/// Admission refusal is not an error: `check()` reports it through the
/// returned decision. Errors here only arise from loading and validating
/// configuration, before any traffic is served.
#[derive(Error, Debug)]
pub enum TurnstileError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Turnstile operations.
pub type Result<T> = std::result::Result<T, TurnstileError>;
