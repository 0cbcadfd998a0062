//! Moving the content inside the frame.

use kurbo::{Point, Vec2};

use super::TransformContext;
use crate::config::{EditorConfig, Moveable, Resizeable};
use crate::geometry::EPSILON;
use crate::gesture::{GestureSnapshot, Modifiers};
use crate::scene::{SceneHost, TransformAdapter};

/// Result of a programmatic move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The content moved and the request is consumed.
    Moved,
    /// Consumed without moving.
    Consumed,
    /// Not handled; the host should pass it on.
    Propagate,
}

/// Keep only the dominant axis of `total` when `lock` is set.
pub fn axis_lock(total: Vec2, lock: bool) -> Vec2 {
    if !lock {
        total
    } else if total.x.abs() >= total.y.abs() {
        Vec2::new(total.x, 0.0)
    } else {
        Vec2::new(0.0, total.y)
    }
}

/// Move the committed content for a body drag to `pointer`.
///
/// The target position is always `start + total delta`, so repeating a
/// pointer position is a no-op.
pub fn drag_move<S: SceneHost>(
    ctx: &mut TransformContext<'_, S>,
    snapshot: &GestureSnapshot<S::NodeId>,
    pointer: Point,
    modifiers: Modifiers,
) -> bool {
    let content = ctx.preview.content;
    let total = axis_lock(pointer - snapshot.pointer, modifiers.lock());
    let Some(local_total) = ctx.scene.local_vector(content, total) else {
        return false;
    };
    let live = ctx.scene.layout(content);
    let step = snapshot.target_origin.to_vec2() + local_total - Vec2::new(live.x, live.y);
    if step.hypot() < EPSILON {
        return false;
    }
    let world = ctx.scene.world_vector(content, step);
    ctx.scene.translate_world(ctx.committed.content, world)
}

/// Handle a move that did not come from a body drag (arrow keys, API calls).
///
/// `delta` is in the frame's local space.
pub fn programmatic_move<S: SceneHost>(
    scene: &mut S,
    content: S::NodeId,
    delta: Vec2,
    config: &EditorConfig,
) -> MoveOutcome {
    if config.moveable == Moveable::Move {
        if !scene.contains(content) || !delta.x.is_finite() || !delta.y.is_finite() {
            return MoveOutcome::Consumed;
        }
        let mut layout = scene.layout(content);
        layout.x += delta.x;
        layout.y += delta.y;
        scene.set_layout(content, layout);
        MoveOutcome::Moved
    } else if config.resizeable == Resizeable::Zoom {
        MoveOutcome::Consumed
    } else {
        MoveOutcome::Propagate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{LayoutTransform, MemoryScene};
    use kurbo::Size;

    #[test]
    fn test_axis_lock() {
        let total = Vec2::new(12.0, -5.0);
        assert_eq!(axis_lock(total, false), total);
        assert_eq!(axis_lock(total, true), Vec2::new(12.0, 0.0));
        assert_eq!(axis_lock(Vec2::new(3.0, -8.0), true), Vec2::new(0.0, -8.0));
    }

    fn scene_with_content() -> (MemoryScene, crate::scene::NodeId) {
        let mut scene = MemoryScene::new();
        let frame = scene.add_node("frame", None, LayoutTransform::at(10.0, 10.0), Size::new(100.0, 100.0));
        let content = scene.add_node(
            "content",
            Some(frame),
            LayoutTransform::at(-5.0, -5.0),
            Size::new(120.0, 120.0),
        );
        (scene, content)
    }

    #[test]
    fn test_programmatic_move_policy() {
        let (mut scene, content) = scene_with_content();
        let mut config = EditorConfig::default();
        config.moveable = Moveable::Move;

        let outcome = programmatic_move(&mut scene, content, Vec2::new(3.0, 4.0), &config);
        assert_eq!(outcome, MoveOutcome::Moved);
        let layout = scene.layout(content);
        assert_eq!((layout.x, layout.y), (-2.0, -1.0));
    }

    #[test]
    fn test_programmatic_move_zoom_consumes() {
        let (mut scene, content) = scene_with_content();
        let mut config = EditorConfig::default();
        config.resizeable = Resizeable::Zoom;

        let outcome = programmatic_move(&mut scene, content, Vec2::new(3.0, 4.0), &config);
        assert_eq!(outcome, MoveOutcome::Consumed);
        assert_eq!(scene.layout(content).x, -5.0);
    }

    #[test]
    fn test_programmatic_move_propagates() {
        let (mut scene, content) = scene_with_content();
        let config = EditorConfig::default();
        let outcome = programmatic_move(&mut scene, content, Vec2::new(3.0, 4.0), &config);
        assert_eq!(outcome, MoveOutcome::Propagate);
        assert_eq!(scene.layout(content).x, -5.0);
    }
}
