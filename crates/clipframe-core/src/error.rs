//! Error types for the editing engine.
//!
//! Most live-input failures (bad ratio strings, degenerate geometry, calls on a
//! closed session) degrade to "no change" and never reach the caller. These types
//! are used where a caller can meaningfully react, such as opening a session on a
//! node that does not exist.

use thiserror::Error;

/// Errors raised while opening or driving an editing session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// The node handle does not refer to a live scene node.
    #[error("Scene node not found: {0}")]
    MissingNode(String),

    /// The frame has no content layer child to edit.
    #[error("Frame has no content layer")]
    MissingContent,

    /// Another session is already editing this frame.
    #[error("Frame is already being edited")]
    AlreadyEditing,

    /// The session was already closed.
    #[error("Editing session is closed")]
    SessionClosed,

    /// A gesture is already in progress; it must end before another starts.
    #[error("A gesture is already in progress")]
    GestureActive,
}

/// Errors from parsing an aspect ratio string such as `"16:9"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RatioError {
    /// The string is not of the form `W:H`.
    #[error("Invalid ratio: {0:?}")]
    Malformed(String),

    /// One of the components is zero, negative or not finite.
    #[error("Ratio components must be positive: {0:?}")]
    NonPositive(String),
}
