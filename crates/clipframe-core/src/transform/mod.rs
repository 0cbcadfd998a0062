//! Transform computations: rotation, resize, move and size presets.
//!
//! Each gesture step reads the preview pair (the live stand-in the user sees)
//! and writes the committed pair (the real frame and content). The session
//! re-syncs the preview from the committed pair after every step.
//!
//! # Coordinate System
//!
//! - Pointer positions and pivots are in world space
//! - Rotation angles are in degrees, positive = clockwise on screen
//! - Resize factors are relative to the frame box at gesture start
//!
//! # Content Preservation
//!
//! A frame resize moves the frame but must leave the content where it is on
//! screen. The content world transform is captured at gesture start and its
//! local transform is recovered after each step as
//! `inverse(frame_world') * content_world_0`. In scale mode a non-uniform
//! step over content that is not quarter-turn aligned resizes the frame box
//! instead, because the recovered transform would need skew.

mod movement;
mod preset;
mod resize;
mod rotation;

pub use movement::{axis_lock, drag_move, programmatic_move, MoveOutcome};
pub use preset::{apply_frame_size, ratio_size, resolve_size};
pub(crate) use preset::frame_extent;
pub use resize::{
    clamp_factors, drag_resize, lock_factors, resize_preserving_content, scale_factors,
    scale_keeps_child_rigid,
};
pub use rotation::{drag_rotate, rotation_angle, rotation_step};

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::scene::SceneHost;

/// A frame and its content layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePair<N> {
    pub frame: N,
    pub content: N,
}

/// Everything a gesture step reads and writes.
pub struct TransformContext<'a, S: SceneHost> {
    pub scene: &'a mut S,
    pub committed: NodePair<S::NodeId>,
    pub preview: NodePair<S::NodeId>,
    pub config: &'a EditorConfig,
}
