//! Aspect-ratio and explicit-size presets.
//!
//! Presets resize the frame about its center and keep the content where it
//! is, the same way a handle resize does.

use kurbo::{Size, Vec2};

use super::{resize_preserving_content, NodePair};
use crate::config::EditSize;
use crate::geometry::{fixed_eq, Ratio, EPSILON};
use crate::scene::{SceneHost, TransformAdapter, TransformSpace};

/// Frame size for a ratio preset.
///
/// Keeps the area of `original` while matching `ratio`, then scales down
/// uniformly until both dimensions fit inside `limit`.
pub fn ratio_size(original: Size, ratio: Ratio, limit: Size) -> Size {
    let value = ratio.value();
    let mut width = (original.width.abs() * original.height.abs() * value).sqrt();
    let mut height = width / value;

    if width > limit.width && width > 0.0 {
        let k = limit.width / width;
        width *= k;
        height *= k;
    }
    if height > limit.height && height > 0.0 {
        let k = limit.height / height;
        width *= k;
        height *= k;
    }
    Size::new(width, height)
}

/// Resolve a requested size against the current one.
///
/// With `lock`, the dimension that differs from `current` (compared at two
/// decimals) drives and the other follows the current ratio.
pub fn resolve_size(current: Size, requested: Size, lock: bool) -> Size {
    if !lock || current.width.abs() < EPSILON || current.height.abs() < EPSILON {
        return requested;
    }
    let ratio = current.width / current.height;
    if !fixed_eq(requested.width, current.width, 2) {
        Size::new(requested.width, requested.width / ratio)
    } else if !fixed_eq(requested.height, current.height, 2) {
        Size::new(requested.height * ratio, requested.height)
    } else {
        requested
    }
}

/// Displayed size of a frame in its parent space.
pub(crate) fn frame_extent<S: SceneHost>(scene: &S, frame: S::NodeId) -> Size {
    let layout = scene.layout(frame);
    let size = scene.size(frame);
    Size::new(size.width * layout.scale_x.abs(), size.height * layout.scale_y.abs())
}

/// Resize the frame to `target` (parent-space units) about its center,
/// keeping the content in place.
pub fn apply_frame_size<S: SceneHost>(
    scene: &mut S,
    pair: NodePair<S::NodeId>,
    target: Size,
    edit_size: EditSize,
) -> bool {
    if !(target.width > 0.0 && target.height > 0.0 && target.width.is_finite() && target.height.is_finite()) {
        return false;
    }
    let current = frame_extent(scene, pair.frame);
    if current.width < EPSILON || current.height < EPSILON {
        return false;
    }
    let scale = Vec2::new(target.width / current.width, target.height / current.height);
    let center = scene.size(pair.frame).to_rect().center();
    let pivot = scene.world_point(pair.frame, center);
    let content_world = scene.transform(pair.content, TransformSpace::World);
    resize_preserving_content(scene, pair, pivot, scale, edit_size, content_world)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn ratio_preset_fits_and_matches(
            width in 1.0f64..4000.0,
            height in 1.0f64..4000.0,
            rw in 1u32..32,
            rh in 1u32..32,
        ) {
            let original = Size::new(width, height);
            let ratio = Ratio { width: rw as f64, height: rh as f64 };
            let size = ratio_size(original, ratio, original);
            prop_assert!(size.width <= width * (1.0 + 1e-9));
            prop_assert!(size.height <= height * (1.0 + 1e-9));
            let expected = rw as f64 / rh as f64;
            prop_assert!((size.width / size.height - expected).abs() / expected < 1e-6);
        }
    }
}
