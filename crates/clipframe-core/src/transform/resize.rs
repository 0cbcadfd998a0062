//! Frame resize with content preservation.
//!
//! # Algorithm
//!
//! 1. Project the total pointer delta onto the frame's box axes using the
//!    frame world transform captured at gesture start.
//! 2. Turn it into per-axis factors relative to the start box:
//!    `right = (dx + w) / w`, `left = (w - dx) / w`, and likewise for y.
//!    Resizing about the center doubles the delta.
//! 3. Apply the ratio lock and the minimum-extent clamp.
//! 4. Divide by the factor the frame already has relative to the start, and
//!    scale the frame by the remainder about the opposite anchor (or center).
//! 5. Recover the content local transform from its start world transform.

use kurbo::{Affine, Point, Rect, Size, Vec2};

use super::{NodePair, TransformContext};
use crate::config::EditSize;
use crate::geometry::{checked_inverse, Direction, EPSILON};
use crate::gesture::{ratio_locked, GestureSnapshot, Modifiers};
use crate::scene::{SceneHost, TransformAdapter, TransformSpace};

/// Per-axis factors for dragging `direction` by `delta` (box units) on a box of `size`.
///
/// Axes the handle does not move, and zero-length axes, keep a factor of 1.
pub fn scale_factors(direction: Direction, delta: Vec2, size: Size, around_center: bool) -> Vec2 {
    let delta = if around_center { delta * 2.0 } else { delta };
    let (width, height) = (size.width, size.height);

    let fx = if !direction.affects_x() || width.abs() < EPSILON {
        1.0
    } else if matches!(
        direction,
        Direction::TopRight | Direction::Right | Direction::BottomRight
    ) {
        (delta.x + width) / width
    } else {
        (width - delta.x) / width
    };

    let fy = if !direction.affects_y() || height.abs() < EPSILON {
        1.0
    } else if matches!(
        direction,
        Direction::BottomLeft | Direction::Bottom | Direction::BottomRight
    ) {
        (delta.y + height) / height
    } else {
        (height - delta.y) / height
    };

    Vec2::new(fx, fy)
}

/// Make both factors share one magnitude.
///
/// Edge handles drive from their own axis; corners follow whichever axis
/// changed more. Each axis keeps its own sign.
pub fn lock_factors(direction: Direction, factors: Vec2) -> Vec2 {
    let Vec2 { x, y } = factors;
    match direction {
        Direction::Top | Direction::Bottom => Vec2::new(y.abs(), y),
        Direction::Left | Direction::Right => Vec2::new(x, x.abs()),
        _ => {
            if (x - 1.0).abs() >= (y - 1.0).abs() {
                Vec2::new(x, x.abs().copysign(y))
            } else {
                Vec2::new(y.abs().copysign(x), y)
            }
        }
    }
}

/// Keep factors positive with at least one unit of extent on a box of `size`.
pub fn clamp_factors(factors: Vec2, size: Size) -> Vec2 {
    let clamp = |f: f64, extent: f64| {
        let extent = extent.abs();
        if extent < EPSILON {
            return f;
        }
        f.max(1.0 / extent)
    };
    Vec2::new(clamp(factors.x, size.width), clamp(factors.y, size.height))
}

/// Whether undoing a frame scale of `scale` on a child with local `rotation`
/// stays free of skew.
///
/// Uniform magnitudes commute with any rotation; unequal ones only with
/// quarter turns.
pub fn scale_keeps_child_rigid(scale: Vec2, rotation: f64) -> bool {
    if (scale.x.abs() - scale.y.abs()).abs() < EPSILON {
        return true;
    }
    let quarters = rotation / 90.0;
    (quarters - quarters.round()).abs() < EPSILON
}

/// Scale `pair.frame` about a world pivot and put the content back at
/// `content_world`.
///
/// In [`EditSize::Scale`] a non-uniform step over rotated content resizes the
/// frame box instead, since the content could not be put back without skew.
pub fn resize_preserving_content<S: SceneHost>(
    scene: &mut S,
    pair: NodePair<S::NodeId>,
    pivot: Point,
    scale: Vec2,
    edit_size: EditSize,
    content_world: Affine,
) -> bool {
    let resize = match edit_size {
        EditSize::Size => true,
        EditSize::Scale => !scale_keeps_child_rigid(scale, scene.layout(pair.content).rotation),
    };
    if !scene.scale_about_world_point(pair.frame, pivot, scale.x, scale.y, resize) {
        return false;
    }
    let Some(inverse) = checked_inverse(scene.transform(pair.frame, TransformSpace::World)) else {
        return false;
    };
    scene.set_transform(pair.content, inverse * content_world)
}

/// Resize the committed frame for a drag to `pointer`.
pub fn drag_resize<S: SceneHost>(
    ctx: &mut TransformContext<'_, S>,
    snapshot: &GestureSnapshot<S::NodeId>,
    pointer: Point,
    modifiers: Modifiers,
    fixed_ratio: bool,
) -> bool {
    let Some(content_world) = snapshot.content_world else {
        return false;
    };
    let Some(inverse) = checked_inverse(snapshot.frame_world) else {
        return false;
    };
    let delta = inverse * pointer - inverse * snapshot.pointer;
    let direction = snapshot.handle.direction;
    let around_center = ctx.config.around_center || modifiers.around_center();
    let start_size = snapshot.target_bounds.size();

    let mut factors = scale_factors(direction, delta, start_size, around_center);
    if !ctx.config.flipable {
        factors = clamp_factors(factors, start_size);
    }
    if ratio_locked(ctx.config, snapshot.handle, modifiers, fixed_ratio) {
        factors = lock_factors(direction, factors);
    }
    if factors.x.abs() < EPSILON || factors.y.abs() < EPSILON {
        return false;
    }

    let frame = ctx.committed.frame;
    let layout = ctx.scene.layout(frame);
    let size = ctx.scene.size(frame);
    let current = Vec2::new(size.width * layout.scale_x, size.height * layout.scale_y);
    if current.x.abs() < EPSILON || current.y.abs() < EPSILON {
        return false;
    }
    let scale = Vec2::new(
        snapshot.frame_extent.x * factors.x / current.x,
        snapshot.frame_extent.y * factors.y / current.y,
    );
    if (scale.x - 1.0).abs() < EPSILON && (scale.y - 1.0).abs() < EPSILON {
        return false;
    }

    let box_rect = Rect::from_origin_size(Point::ZERO, size);
    let anchor = if around_center {
        box_rect.center()
    } else {
        direction.opposite().point_on(box_rect)
    };
    let pivot = ctx.scene.world_point(frame, anchor);

    resize_preserving_content(
        ctx.scene,
        ctx.committed,
        pivot,
        scale,
        ctx.config.edit_size,
        content_world,
    )
}
