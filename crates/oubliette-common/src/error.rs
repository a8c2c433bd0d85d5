//! Error types for the Oubliette core.

use thiserror::Error;

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Setup-time configuration errors (malformed tables, bad durations)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An entity lookup failed
    #[error("entity not found: {0}")]
    EntityNotFound(u64),

    /// A room lookup failed
    #[error("room not found: {0}")]
    RoomNotFound(u32),
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
