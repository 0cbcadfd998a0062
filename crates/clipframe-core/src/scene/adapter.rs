//! Transform and bounds operations derived from [`SceneHost`] primitives.

use kurbo::{Affine, Point, Rect, Vec2};

use super::{BoundsSpace, LayoutBounds, LayoutTransform, SceneHost, TransformSpace};
use crate::geometry::{checked_inverse, is_finite_affine, normalize_rotation};

/// Transform/bounds adapter over any [`SceneHost`].
///
/// Every mutating operation returns `false` and leaves the node untouched when
/// the input is degenerate (zero or non-finite factors, non-invertible
/// transforms, stale node handles).
pub trait TransformAdapter: SceneHost {
    /// The node's transform in local or world space.
    fn transform(&self, node: Self::NodeId, space: TransformSpace) -> Affine {
        let local = self.layout(node).to_affine();
        match space {
            TransformSpace::Local => local,
            TransformSpace::World => self.parent_world_transform(node) * local,
        }
    }

    /// World transform of the node's parent, identity for roots.
    fn parent_world_transform(&self, node: Self::NodeId) -> Affine {
        match self.parent(node) {
            Some(parent) => self.transform(parent, TransformSpace::World),
            None => Affine::IDENTITY,
        }
    }

    /// Replace the node's local transform, decomposing it against the current
    /// layout so mirrored nodes keep their flip axis.
    fn set_transform(&mut self, node: Self::NodeId, local: Affine) -> bool {
        if !self.contains(node) || !is_finite_affine(local) {
            return false;
        }
        let reference = self.layout(node);
        self.set_layout(node, LayoutTransform::from_affine_like(local, &reference));
        true
    }

    /// Axis-aligned bounds of the node's box.
    fn bounds(&self, node: Self::NodeId, space: BoundsSpace) -> Rect {
        let inner = self.size(node).to_rect();
        match space {
            BoundsSpace::Inner => inner,
            BoundsSpace::Local => self
                .transform(node, TransformSpace::Local)
                .transform_rect_bbox(inner),
            BoundsSpace::World => self
                .transform(node, TransformSpace::World)
                .transform_rect_bbox(inner),
        }
    }

    /// Box placement in local or world space. See [`LayoutBounds`].
    fn layout_bounds(&self, node: Self::NodeId, space: TransformSpace, unscale: bool) -> LayoutBounds {
        let reference = self.layout(node);
        LayoutBounds::from_transform(self.transform(node, space), self.size(node), &reference, unscale)
    }

    /// Map a point from the node's box space to world space.
    fn world_point(&self, node: Self::NodeId, inner: Point) -> Point {
        self.transform(node, TransformSpace::World) * inner
    }

    /// Map a world point into the node's box space.
    fn inner_point(&self, node: Self::NodeId, world: Point) -> Option<Point> {
        checked_inverse(self.transform(node, TransformSpace::World)).map(|inv| inv * world)
    }

    /// Map a world-space vector into the node's parent space (translation ignored).
    fn local_vector(&self, node: Self::NodeId, world: Vec2) -> Option<Vec2> {
        let inv = checked_inverse(self.parent_world_transform(node))?;
        Some((linear_part(inv) * world.to_point()).to_vec2())
    }

    /// Map a parent-space vector to world space (translation ignored).
    fn world_vector(&self, node: Self::NodeId, local: Vec2) -> Vec2 {
        (linear_part(self.parent_world_transform(node)) * local.to_point()).to_vec2()
    }

    /// Scale the node about a world-space pivot.
    ///
    /// With `resize` the box width/height change and the scale factors keep
    /// their magnitude (only their sign follows a negative factor), so children
    /// keep their absolute size. Without it the scale factors are multiplied and
    /// the box size is left alone.
    fn scale_about_world_point(
        &mut self,
        node: Self::NodeId,
        pivot: Point,
        scale_x: f64,
        scale_y: f64,
        resize: bool,
    ) -> bool {
        if !self.contains(node) {
            return false;
        }
        if !scale_x.is_finite() || !scale_y.is_finite() || scale_x == 0.0 || scale_y == 0.0 {
            return false;
        }
        let Some(origin) = self.inner_point(node, pivot) else {
            return false;
        };
        let current = self.layout(node);
        let local = current.to_affine();
        let reference = LayoutTransform {
            scale_x: current.scale_x * scale_x.signum(),
            scale_y: current.scale_y * scale_y.signum(),
            ..current
        };

        let next = if resize {
            let size = self.size(node);
            let shift = Vec2::new(origin.x * (1.0 - scale_x), origin.y * (1.0 - scale_y));
            let next = local
                * Affine::translate(shift)
                * Affine::scale_non_uniform(scale_x.signum(), scale_y.signum());
            self.set_size(
                node,
                kurbo::Size::new(size.width * scale_x.abs(), size.height * scale_y.abs()),
            );
            next
        } else {
            local
                * Affine::translate(origin.to_vec2())
                * Affine::scale_non_uniform(scale_x, scale_y)
                * Affine::translate(-origin.to_vec2())
        };

        self.set_layout(node, LayoutTransform::from_affine_like(next, &reference));
        true
    }

    /// Rotate the node by `degrees` about a world-space pivot.
    fn rotate_about_world_point(&mut self, node: Self::NodeId, pivot: Point, degrees: f64) -> bool {
        if !self.contains(node) || !degrees.is_finite() {
            return false;
        }
        let Some(parent_inv) = checked_inverse(self.parent_world_transform(node)) else {
            return false;
        };
        let world = self.transform(node, TransformSpace::World);
        let next_world = Affine::rotate_about(degrees.to_radians(), pivot) * world;
        let current = self.layout(node);
        let mut next = LayoutTransform::from_affine_like(parent_inv * next_world, &current);
        // Use the accumulated angle when it agrees with the decomposition, so
        // repeated steps do not pick up atan2 round-off.
        let expected = normalize_rotation(current.rotation + degrees);
        if (normalize_rotation(next.rotation - expected)).abs() < 1e-6 {
            next.rotation = expected;
        }
        self.set_layout(node, next);
        true
    }

    /// Move the node by a world-space delta.
    fn translate_world(&mut self, node: Self::NodeId, delta: Vec2) -> bool {
        if !self.contains(node) || !delta.x.is_finite() || !delta.y.is_finite() {
            return false;
        }
        let Some(local) = self.local_vector(node, delta) else {
            return false;
        };
        let mut layout = self.layout(node);
        layout.x += local.x;
        layout.y += local.y;
        self.set_layout(node, layout);
        true
    }
}

impl<S: SceneHost + ?Sized> TransformAdapter for S {}

/// The linear (non-translating) part of an affine.
#[inline]
fn linear_part(affine: Affine) -> Affine {
    let [a, b, c, d, _, _] = affine.as_coeffs();
    Affine::new([a, b, c, d, 0.0, 0.0])
}
