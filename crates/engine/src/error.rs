//! Engine error types.
//!
//! The engine's recovery policy is local: a bad block never aborts
//! rendering of the page it sits on. The only hard failures are at the
//! wire boundary, when a persisted content document cannot be parsed
//! at all.

use thiserror::Error;

/// Errors raised at the persisted-content boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed page content")]
    MalformedContent(#[from] serde_json::Error),

    #[error("page content must be a JSON array of block instances")]
    NotAnArray,

    #[error("block instance must be a JSON object")]
    MalformedInstance,
}

/// Result type alias using EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
