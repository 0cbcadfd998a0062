//! Rotation about the frame center.
//!
//! The pointer angle is measured in the frame's box space around its
//! center, so the frame's own rotation and flip do not leak into the result.
//!
//! # Algorithm
//!
//! ```text
//! angle = signed_angle(center, start_pointer, pointer)      (negated if content mirrored)
//! step  = normalize(start_rotation + angle - live_rotation)
//! step  = snap(step, gap) rounded to 2 decimals
//! ```
//!
//! Because `step` is measured against the live rotation, replaying the same
//! pointer position yields a zero step and changes nothing.

use kurbo::Point;

use super::TransformContext;
use crate::geometry::{gap_rotation, normalize_rotation, signed_angle, to_fixed};
use crate::gesture::{GestureSnapshot, Modifiers};
use crate::scene::{SceneHost, TransformAdapter, TransformSpace};

/// Pointer angle around `pivot` from `from` to `to`, in degrees.
///
/// Content mirrored on exactly one axis turns the other way on screen, so the
/// angle is negated for it. Degenerate vectors give zero.
pub fn rotation_angle(pivot: Point, from: Point, to: Point, flipped_one: bool) -> f64 {
    let angle = signed_angle(pivot, from, to).unwrap_or(0.0);
    if flipped_one {
        -angle
    } else {
        angle
    }
}

/// Rotation to apply for one drag step, or `None` if it rounds to zero.
///
/// `gap` snaps the resulting absolute rotation to its nearest multiple; pass 0
/// to rotate freely.
pub fn rotation_step(start_rotation: f64, angle: f64, live_rotation: f64, gap: f64) -> Option<f64> {
    let raw = normalize_rotation(start_rotation + angle - live_rotation);
    let step = to_fixed(normalize_rotation(gap_rotation(raw, gap, live_rotation)), 2);
    if step == 0.0 || !step.is_finite() {
        None
    } else {
        Some(step)
    }
}

/// Rotate the committed content for a drag to `pointer`.
///
/// Reads the committed pair, which the preview mirrors between steps.
///
/// Returns the applied step in the content's local space, or `None` when
/// nothing changed.
pub fn drag_rotate<S: SceneHost>(
    ctx: &mut TransformContext<'_, S>,
    snapshot: &GestureSnapshot<S::NodeId>,
    pointer: Point,
    modifiers: Modifiers,
) -> Option<f64> {
    let frame = ctx.committed.frame;
    let size = ctx.scene.size(frame);
    let center = Point::new(size.width / 2.0, size.height / 2.0);
    let current = ctx.scene.inner_point(frame, pointer)?;

    let live = ctx.scene.layout(ctx.committed.content);
    let angle = rotation_angle(center, snapshot.pointer_in_frame, current, live.flipped_one());
    let gap = if modifiers.free_rotation() {
        0.0
    } else {
        ctx.config.effective_rotate_gap()
    };
    let step = rotation_step(snapshot.content_rotation, angle, live.rotation, gap)?;

    let pivot = ctx.scene.world_point(frame, center);
    // A mirrored frame turns local rotation the other way in world space.
    let frame_world = ctx.scene.transform(frame, TransformSpace::World);
    let world_step = if frame_world.determinant() < 0.0 { -step } else { step };
    ctx.scene
        .rotate_about_world_point(ctx.committed.content, pivot, world_step)
        .then_some(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_angle_quarter_turn() {
        let pivot = Point::new(50.0, 50.0);
        let angle = rotation_angle(pivot, Point::new(100.0, 50.0), Point::new(50.0, 100.0), false);
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_angle_mirrored() {
        let pivot = Point::new(50.0, 50.0);
        let angle = rotation_angle(pivot, Point::new(100.0, 50.0), Point::new(50.0, 100.0), true);
        assert!((angle + 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_angle_degenerate() {
        let pivot = Point::new(50.0, 50.0);
        assert_eq!(rotation_angle(pivot, pivot, Point::new(60.0, 50.0), false), 0.0);
    }

    #[test]
    fn test_rotation_step_against_live() {
        assert_eq!(rotation_step(10.0, 30.0, 10.0, 0.0), Some(30.0));
        // Already at start + angle
        assert_eq!(rotation_step(10.0, 30.0, 40.0, 0.0), None);
        // Dragging back undoes the earlier step
        assert_eq!(rotation_step(10.0, 0.0, 40.0, 0.0), Some(-30.0));
    }

    #[test]
    fn test_rotation_step_rounds() {
        assert_eq!(rotation_step(0.0, 12.3456, 0.0, 0.0), Some(12.35));
        assert_eq!(rotation_step(0.0, 0.001, 0.0, 0.0), None);
    }

    #[test]
    fn test_rotation_step_snaps_to_gap() {
        // 0 + 50 snaps to 45
        assert_eq!(rotation_step(0.0, 50.0, 0.0, 45.0), Some(45.0));
        // 0 + 20 snaps to 0: no change
        assert_eq!(rotation_step(0.0, 20.0, 0.0, 45.0), None);
        // Snapping targets the absolute rotation: 10 + 40 = 50 -> 45
        assert_eq!(rotation_step(10.0, 40.0, 10.0, 45.0), Some(35.0));
    }

    #[test]
    fn test_rotation_step_wraps() {
        assert_eq!(rotation_step(170.0, 20.0, 170.0, 0.0), Some(20.0));
        assert_eq!(rotation_step(-170.0, -20.0, -170.0, 0.0), Some(-20.0));
    }
}
