//! Gesture input and the per-drag snapshot.
//!
//! A drag is `start` -> any number of `drag` -> `end`. Everything a drag step
//! needs from the moment the pointer went down is captured once in a
//! [`GestureSnapshot`], so each step computes its result from the total pointer
//! delta rather than accumulating per-event increments.

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::handles::{Handle, HandleKind};

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: false,
        meta: false,
    };

    /// Keep the aspect ratio while resizing, or lock a move to one axis.
    #[inline]
    pub fn lock(self) -> bool {
        self.shift
    }

    /// Turn a resize handle into a rotation handle.
    #[inline]
    pub fn free_transform(self) -> bool {
        self.ctrl || self.meta
    }

    /// Resize about the frame center.
    #[inline]
    pub fn around_center(self) -> bool {
        self.alt
    }

    /// Rotate without snapping to the rotation gap.
    #[inline]
    pub fn free_rotation(self) -> bool {
        self.alt
    }
}

/// What a drag step does, after modifiers and config are applied to the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAction {
    Move,
    Rotate,
    Scale,
    RotateScale,
}

impl DragAction {
    /// Classify a drag on `handle`.
    ///
    /// Rotate handles always rotate. Resize handles rotate instead when the
    /// free-transform modifier is held or resizing is disabled.
    pub fn classify(handle: Handle, modifiers: Modifiers, config: &EditorConfig) -> Self {
        match handle.kind {
            HandleKind::Move => DragAction::Move,
            HandleKind::Rotate => DragAction::Rotate,
            HandleKind::ResizeRotate => DragAction::RotateScale,
            HandleKind::Resize => {
                if modifiers.free_transform() || !config.resizeable.is_enabled() {
                    DragAction::Rotate
                } else {
                    DragAction::Scale
                }
            }
        }
    }

    #[inline]
    pub fn rotates(self) -> bool {
        matches!(self, DragAction::Rotate | DragAction::RotateScale)
    }

    #[inline]
    pub fn scales(self) -> bool {
        matches!(self, DragAction::Scale | DragAction::RotateScale)
    }
}

/// Whether a resize keeps the aspect ratio.
pub fn ratio_locked(config: &EditorConfig, handle: Handle, modifiers: Modifiers, fixed_ratio: bool) -> bool {
    fixed_ratio || modifiers.lock() || config.lock_ratio.applies_to(handle.direction.is_edge())
}

/// State captured when a gesture starts.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSnapshot<N> {
    pub handle: Handle,
    /// Pointer position in world space.
    pub pointer: Point,
    /// Node the gesture acts on: the preview frame for resize kinds, the
    /// preview content otherwise.
    pub target: N,
    /// Target position in its parent space.
    pub target_origin: Point,
    /// Target box in its own box space.
    pub target_bounds: Rect,
    /// Preview content rotation in its parent space.
    pub content_rotation: f64,
    /// Pointer in the preview frame's box space.
    pub pointer_in_frame: Point,
    pub frame_world: Affine,
    /// Frame extent along each axis (`width * scale_x`, `height * scale_y`).
    pub frame_extent: Vec2,
    /// Committed content world transform, for resize kinds.
    pub content_world: Option<Affine>,
    /// Nodes under a live resize, for resize kinds.
    pub co_edited: Vec<N>,
}

/// Drag state machine: idle, or dragging with a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum DragState<N> {
    Idle,
    Dragging(GestureSnapshot<N>),
}

impl<N> Default for DragState<N> {
    fn default() -> Self {
        DragState::Idle
    }
}

impl<N> DragState<N> {
    #[inline]
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }

    pub fn snapshot(&self) -> Option<&GestureSnapshot<N>> {
        match self {
            DragState::Dragging(snapshot) => Some(snapshot),
            DragState::Idle => None,
        }
    }

    /// Leave the dragging state, returning the snapshot if there was one.
    pub fn take(&mut self) -> Option<GestureSnapshot<N>> {
        match std::mem::take(self) {
            DragState::Dragging(snapshot) => Some(snapshot),
            DragState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LockRatio, Resizeable};
    use crate::geometry::Direction;

    #[test]
    fn test_classify_handles() {
        let config = EditorConfig::default();
        let none = Modifiers::NONE;
        assert_eq!(DragAction::classify(Handle::body(), none, &config), DragAction::Move);
        assert_eq!(DragAction::classify(Handle::grip(), none, &config), DragAction::Rotate);
        assert_eq!(
            DragAction::classify(Handle::resize(Direction::Right), none, &config),
            DragAction::Scale
        );
        assert_eq!(
            DragAction::classify(Handle::resize_rotate(Direction::TopLeft), none, &config),
            DragAction::RotateScale
        );
    }

    #[test]
    fn test_free_transform_rotates_resize_handles() {
        let config = EditorConfig::default();
        for modifiers in [
            Modifiers {
                ctrl: true,
                ..Modifiers::NONE
            },
            Modifiers {
                meta: true,
                ..Modifiers::NONE
            },
        ] {
            assert_eq!(
                DragAction::classify(Handle::resize(Direction::BottomRight), modifiers, &config),
                DragAction::Rotate
            );
        }
    }

    #[test]
    fn test_resize_disabled_rotates() {
        let mut config = EditorConfig::default();
        config.resizeable = Resizeable::Off;
        assert_eq!(
            DragAction::classify(Handle::resize(Direction::Top), Modifiers::NONE, &config),
            DragAction::Rotate
        );
        config.resizeable = Resizeable::Zoom;
        assert_eq!(
            DragAction::classify(Handle::resize(Direction::Top), Modifiers::NONE, &config),
            DragAction::Scale
        );
    }

    #[test]
    fn test_ratio_locked() {
        let mut config = EditorConfig::default();
        let corner = Handle::resize(Direction::TopLeft);
        let edge = Handle::resize(Direction::Left);
        let shift = Modifiers {
            shift: true,
            ..Modifiers::NONE
        };

        assert!(!ratio_locked(&config, corner, Modifiers::NONE, false));
        assert!(ratio_locked(&config, corner, shift, false));
        assert!(ratio_locked(&config, edge, Modifiers::NONE, true));

        config.lock_ratio = LockRatio::Corner;
        assert!(ratio_locked(&config, corner, Modifiers::NONE, false));
        assert!(!ratio_locked(&config, edge, Modifiers::NONE, false));
    }

    #[test]
    fn test_drag_state_take() {
        let mut state: DragState<u32> = DragState::Idle;
        assert!(state.take().is_none());

        state = DragState::Dragging(GestureSnapshot {
            handle: Handle::body(),
            pointer: Point::ZERO,
            target: 1,
            target_origin: Point::ZERO,
            target_bounds: Rect::ZERO,
            content_rotation: 0.0,
            pointer_in_frame: Point::ZERO,
            frame_world: Affine::IDENTITY,
            frame_extent: Vec2::new(1.0, 1.0),
            content_world: None,
            co_edited: Vec::new(),
        });
        assert!(state.is_dragging());
        assert_eq!(state.snapshot().map(|s| s.target), Some(1));
        assert!(state.take().is_some());
        assert!(!state.is_dragging());
    }
}
