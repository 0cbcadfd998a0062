//! Session events.

use serde::{Deserialize, Serialize};

use crate::scene::LayoutBounds;

/// Events a session emits, queued until the host drains them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    /// The session is about to open; the target is still unchanged.
    BeforeStart,
    /// The preview is in place and the overlay is ready.
    Start,
    /// The frame moved or resized. `world` is the frame placement in world
    /// space, `window` the same after the viewport transform.
    UpdateEditorBounds {
        world: LayoutBounds,
        window: LayoutBounds,
    },
    /// The session closed and the target is visible again.
    End,
}

impl EditorEvent {
    /// Event name as hosts listen for it.
    pub fn name(&self) -> &'static str {
        match self {
            EditorEvent::BeforeStart => "beforeStart",
            EditorEvent::Start => "start",
            EditorEvent::UpdateEditorBounds { .. } => "updateEditorBounds",
            EditorEvent::End => "end",
        }
    }
}
