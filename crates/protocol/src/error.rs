//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Interaction mode code outside the known range.
    #[error("unknown interaction mode: {0}")]
    UnknownInteractionMode(u8),

    /// Orientation mode code outside the known range.
    #[error("unknown orientation mode: {0}")]
    UnknownOrientationMode(u8),

    /// Marker type code outside the known range.
    #[error("unknown marker type: {0}")]
    UnknownMarkerType(i32),

    /// Feedback event code outside the known range.
    #[error("unknown feedback event type: {0}")]
    UnknownFeedbackEvent(u8),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The feedback channel has no receiver anymore.
    #[error("feedback channel closed")]
    ChannelClosed,
}

/// Convenience result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
