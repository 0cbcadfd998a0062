//! Host scene-graph capability and the transform/bounds adapter built on it.
//!
//! The engine never owns nodes. It talks to the host through [`SceneHost`], a
//! small set of primitives (parent lookup, local layout, size, visibility,
//! cloning and a layout lock), and derives every transform, bounds and pivot
//! operation from those in [`TransformAdapter`].
//!
//! # Coordinate Spaces
//!
//! - **Inner** (box) space: the node's own unrotated box, (0, 0) at its top-left.
//! - **Local** space: the parent's coordinate system.
//! - **World** space: the root coordinate system after composing all ancestors.
//!
//! [`MemoryScene`] is a self-contained implementation used by the wasm bindings
//! and by tests.

mod adapter;
mod memory;

pub use adapter::TransformAdapter;
pub use memory::{MemoryScene, NodeId};

use std::fmt;

use kurbo::{Affine, Size};
use serde::{Deserialize, Serialize};

use crate::geometry::{normalize_rotation, EPSILON};

/// Space a transform is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformSpace {
    Local,
    World,
}

/// Space an axis-aligned bounds rectangle is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsSpace {
    /// The node's own box, always `(0, 0, width, height)`.
    Inner,
    /// Bounding box of the node in its parent's space.
    Local,
    /// Bounding box of the node in world space.
    World,
}

/// Decomposed 2D transform: translation, rotation (degrees) and per-axis scale.
///
/// The matrix is `translate(x, y) * rotate(rotation) * scale(scale_x, scale_y)`.
/// Skew is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutTransform {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for LayoutTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl LayoutTransform {
    /// Identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// Compose the affine matrix.
    pub fn to_affine(&self) -> Affine {
        Affine::translate((self.x, self.y))
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// Decompose an affine, choosing the flip signs of `reference`.
    ///
    /// A matrix has two equivalent decompositions, `(r, sx, sy)` and
    /// `(r + 180, -sx, -sy)`. Picking the one whose horizontal scale sign matches
    /// the previous layout keeps rotation continuous for mirrored nodes.
    pub fn from_affine_like(affine: Affine, reference: &Self) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        let det = a * d - b * c;
        let mut scale_x = a.hypot(b);
        if scale_x < EPSILON {
            // Collapsed x axis: fall back to the y column for the orientation.
            let scale_y = c.hypot(d);
            let rotation = (-c).atan2(d).to_degrees();
            return Self {
                x: e,
                y: f,
                rotation: normalize_rotation(rotation),
                scale_x: 0.0,
                scale_y,
            };
        }
        let mut scale_y = det / scale_x;
        let mut rotation = b.atan2(a).to_degrees();
        if reference.scale_x < 0.0 {
            scale_x = -scale_x;
            scale_y = -scale_y;
            rotation += 180.0;
        }
        Self {
            x: e,
            y: f,
            rotation: normalize_rotation(rotation),
            scale_x,
            scale_y,
        }
    }

    #[inline]
    pub fn flipped_x(&self) -> bool {
        self.scale_x < 0.0
    }

    #[inline]
    pub fn flipped_y(&self) -> bool {
        self.scale_y < 0.0
    }

    /// Mirrored on exactly one axis.
    #[inline]
    pub fn flipped_one(&self) -> bool {
        self.scale_x * self.scale_y < 0.0
    }
}

/// A node's box described by its placement in some space: origin, box size,
/// rotation and scale.
///
/// With `unscale` set when querying, the scale is folded into the size and
/// only its sign is kept.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl LayoutBounds {
    /// Build from a box-to-space transform and the box size.
    pub fn from_transform(
        affine: Affine,
        size: Size,
        reference: &LayoutTransform,
        unscale: bool,
    ) -> Self {
        let layout = LayoutTransform::from_affine_like(affine, reference);
        let mut bounds = Self {
            x: layout.x,
            y: layout.y,
            width: size.width,
            height: size.height,
            rotation: layout.rotation,
            scale_x: layout.scale_x,
            scale_y: layout.scale_y,
        };
        if unscale {
            bounds.width *= layout.scale_x.abs();
            bounds.height *= layout.scale_y.abs();
            bounds.scale_x = if layout.scale_x < 0.0 { -1.0 } else { 1.0 };
            bounds.scale_y = if layout.scale_y < 0.0 { -1.0 } else { 1.0 };
        }
        bounds
    }

    /// The transform part of these bounds.
    pub fn layout(&self) -> LayoutTransform {
        LayoutTransform {
            x: self.x,
            y: self.y,
            rotation: self.rotation,
            scale_x: self.scale_x,
            scale_y: self.scale_y,
        }
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    pub fn flipped_x(&self) -> bool {
        self.scale_x < 0.0
    }

    #[inline]
    pub fn flipped_y(&self) -> bool {
        self.scale_y < 0.0
    }

    #[inline]
    pub fn flipped_one(&self) -> bool {
        self.scale_x * self.scale_y < 0.0
    }
}

/// Primitive operations a host scene graph provides to the editor.
///
/// Implementations must apply every mutation synchronously so that later queries
/// observe it. Calls with a stale node handle must be ignored (setters) or return
/// neutral values (getters); they must not panic.
pub trait SceneHost {
    /// Handle to a node in the host graph.
    type NodeId: Copy + Eq + fmt::Debug;

    /// Returns true if `node` refers to a live node.
    fn contains(&self, node: Self::NodeId) -> bool;

    fn parent(&self, node: Self::NodeId) -> Option<Self::NodeId>;

    /// Child nodes in paint order.
    fn children(&self, node: Self::NodeId) -> Vec<Self::NodeId>;

    /// The node's local layout relative to its parent.
    fn layout(&self, node: Self::NodeId) -> LayoutTransform;

    fn set_layout(&mut self, node: Self::NodeId, layout: LayoutTransform);

    /// Unscaled box size.
    fn size(&self, node: Self::NodeId) -> Size;

    fn set_size(&mut self, node: Self::NodeId, size: Size);

    fn is_visible(&self, node: Self::NodeId) -> bool;

    fn set_visible(&mut self, node: Self::NodeId, visible: bool);

    fn set_opacity(&mut self, node: Self::NodeId, opacity: f64);

    /// Whether an editing session holds `node`.
    fn is_editing(&self, node: Self::NodeId) -> bool;

    /// Mark or release `node` as held by an editing session. Clones do not
    /// inherit the mark.
    fn set_editing(&mut self, node: Self::NodeId, editing: bool);

    /// Deep-clone `node` and its subtree under `parent` (or as a root).
    fn clone_node(&mut self, node: Self::NodeId, parent: Option<Self::NodeId>) -> Self::NodeId;

    /// Remove `node` and its subtree.
    fn remove_node(&mut self, node: Self::NodeId);

    /// Suspend layout passes until the matching [`SceneHost::unlock_layout`].
    ///
    /// Locks nest; only the outermost unlock flushes.
    fn lock_layout(&mut self);

    fn unlock_layout(&mut self);

    /// World to window (screen) transform, such as a zoom layer.
    fn viewport_transform(&self) -> Affine {
        Affine::IDENTITY
    }
}
