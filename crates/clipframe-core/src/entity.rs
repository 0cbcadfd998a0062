//! The editable clip image.
//!
//! A clip image is a frame node with one content child. The entity holds the
//! image url and maps its `clip` value (where the image sits inside the frame)
//! onto the content node. Every setter applies immediately; there is no
//! deferred re-derivation.

use std::fmt;

use kurbo::{Affine, Point, Size};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EditorError;
use crate::scene::{LayoutTransform, SceneHost};
use crate::transform::NodePair;

/// Placement of the image inside its frame.
///
/// `x`/`y` is the top-left of the unrotated image box; `rotation` turns it
/// about its own center.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Clip {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

impl Clip {
    /// A clip filling a frame of `size`.
    pub fn fill(size: Size) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: size.width,
            height: size.height,
            rotation: 0.0,
        }
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height, self.rotation]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Content layout for this clip, keeping the given flip signs.
    pub fn to_layout(&self, flip_x: bool, flip_y: bool) -> LayoutTransform {
        let scale_x = if flip_x { -1.0 } else { 1.0 };
        let scale_y = if flip_y { -1.0 } else { 1.0 };
        let half = Point::new(self.width / 2.0, self.height / 2.0);
        let center = Point::new(self.x, self.y) + half.to_vec2();
        let turned = Affine::rotate(self.rotation.to_radians()) * Affine::scale_non_uniform(scale_x, scale_y);
        let origin = center - (turned * half).to_vec2();
        LayoutTransform {
            x: origin.x,
            y: origin.y,
            rotation: self.rotation,
            scale_x,
            scale_y,
        }
    }

    /// Read a clip back from a content layout and box size.
    pub fn from_layout(layout: &LayoutTransform, size: Size) -> Self {
        let center = layout.to_affine() * Point::new(size.width / 2.0, size.height / 2.0);
        let width = size.width * layout.scale_x.abs();
        let height = size.height * layout.scale_y.abs();
        Self {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
            rotation: layout.rotation,
        }
    }
}

/// An image clipped by an editable frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipImage<N> {
    frame: N,
    content: N,
    url: String,
}

impl<N: Copy + Eq + fmt::Debug> ClipImage<N> {
    /// Bind to an existing frame and its content child.
    pub fn attach<S: SceneHost<NodeId = N>>(scene: &S, frame: N, content: N) -> Result<Self, EditorError> {
        if !scene.contains(frame) {
            return Err(EditorError::MissingNode(format!("{:?}", frame)));
        }
        if !scene.contains(content) || scene.parent(content) != Some(frame) {
            return Err(EditorError::MissingContent);
        }
        Ok(Self {
            frame,
            content,
            url: String::new(),
        })
    }

    pub fn nodes(&self) -> NodePair<N> {
        NodePair {
            frame: self.frame,
            content: self.content,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Set the image url.
    ///
    /// Replacing one image with another resets the clip to fill the frame,
    /// since the old placement belongs to the old image. Clearing the url keeps
    /// the clip. Returns true if the clip was reset.
    pub fn apply_url<S: SceneHost<NodeId = N>>(&mut self, scene: &mut S, url: &str) -> bool {
        if self.url == url {
            return false;
        }
        let replaced = !self.url.is_empty() && !url.is_empty();
        self.url = url.to_string();
        if !replaced {
            return false;
        }
        let size = scene.size(self.frame);
        debug!("[entity] Url replaced, clip reset to {}x{}", size.width, size.height);
        self.apply_clip(scene, Clip::fill(size))
    }

    /// The image for `url` finished loading with `natural` size.
    ///
    /// A frame without a size yet takes the natural size and the clip fills
    /// it. Loads for a url that is no longer current are ignored.
    pub fn content_loaded<S: SceneHost<NodeId = N>>(&mut self, scene: &mut S, url: &str, natural: Size) -> bool {
        if url != self.url {
            debug!("[entity] Ignoring stale load for {}", url);
            return false;
        }
        let size = scene.size(self.frame);
        if size.width > 0.0 && size.height > 0.0 {
            return false;
        }
        if !(natural.width > 0.0 && natural.height > 0.0) {
            warn!("[entity] Image loaded with empty size {:?}", natural);
            return false;
        }
        scene.set_size(self.frame, natural);
        self.apply_clip(scene, Clip::fill(natural))
    }

    /// Place the content node for `clip`.
    pub fn apply_clip<S: SceneHost<NodeId = N>>(&self, scene: &mut S, clip: Clip) -> bool {
        if !clip.is_finite() || !scene.contains(self.content) {
            return false;
        }
        let current = scene.layout(self.content);
        scene.lock_layout();
        scene.set_size(self.content, Size::new(clip.width.abs(), clip.height.abs()));
        scene.set_layout(self.content, clip.to_layout(current.flipped_x(), current.flipped_y()));
        scene.unlock_layout();
        true
    }

    /// Current clip, read from the content node.
    pub fn clip<S: SceneHost<NodeId = N>>(&self, scene: &S) -> Clip {
        Clip::from_layout(&scene.layout(self.content), scene.size(self.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, NodeId};

    fn setup(frame_size: Size) -> (MemoryScene, ClipImage<NodeId>) {
        let mut scene = MemoryScene::new();
        let frame = scene.add_node("frame", None, LayoutTransform::at(50.0, 50.0), frame_size);
        let content = scene.add_node("content", Some(frame), LayoutTransform::new(), frame_size);
        let image = ClipImage::attach(&scene, frame, content).unwrap();
        (scene, image)
    }

    fn assert_clip_eq(a: Clip, b: Clip) {
        assert!((a.x - b.x).abs() < 1e-9, "{:?} != {:?}", a, b);
        assert!((a.y - b.y).abs() < 1e-9, "{:?} != {:?}", a, b);
        assert!((a.width - b.width).abs() < 1e-9, "{:?} != {:?}", a, b);
        assert!((a.height - b.height).abs() < 1e-9, "{:?} != {:?}", a, b);
        assert!((a.rotation - b.rotation).abs() < 1e-9, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_attach_requires_child() {
        let mut scene = MemoryScene::new();
        let frame = scene.add_node("frame", None, LayoutTransform::new(), Size::new(10.0, 10.0));
        let other = scene.add_node("other", None, LayoutTransform::new(), Size::new(10.0, 10.0));
        assert_eq!(
            ClipImage::attach(&scene, frame, other).unwrap_err(),
            EditorError::MissingContent
        );
        let gone = scene.add_node("gone", None, LayoutTransform::new(), Size::ZERO);
        scene.remove_node(gone);
        assert!(matches!(
            ClipImage::attach(&scene, gone, other),
            Err(EditorError::MissingNode(_))
        ));
    }

    #[test]
    fn test_clip_roundtrip_with_rotation() {
        let (mut scene, image) = setup(Size::new(200.0, 100.0));
        let clip = Clip {
            x: -20.0,
            y: 10.0,
            width: 240.0,
            height: 120.0,
            rotation: 30.0,
        };
        assert!(image.apply_clip(&mut scene, clip));
        assert_clip_eq(image.clip(&scene), clip);
    }

    #[test]
    fn test_clip_rotates_about_center() {
        let (mut scene, image) = setup(Size::new(100.0, 100.0));
        let clip = Clip {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 50.0,
            rotation: 90.0,
        };
        image.apply_clip(&mut scene, clip);
        let layout = scene.layout(image.nodes().content);
        // Center stays at (50, 25), so the turned origin lands at (75, -25)
        assert!((layout.x - 75.0).abs() < 1e-9);
        assert!((layout.y + 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_clip_keeps_content_flip() {
        let (mut scene, image) = setup(Size::new(100.0, 100.0));
        let content = image.nodes().content;
        let mut layout = scene.layout(content);
        layout.scale_x = -1.0;
        layout.x = 100.0;
        scene.set_layout(content, layout);

        let clip = Clip::fill(Size::new(100.0, 100.0));
        image.apply_clip(&mut scene, clip);
        assert_eq!(scene.layout(content).scale_x, -1.0);
        assert_clip_eq(image.clip(&scene), clip);
    }

    #[test]
    fn test_first_url_keeps_clip() {
        let (mut scene, mut image) = setup(Size::new(100.0, 100.0));
        let clip = Clip {
            x: -10.0,
            y: -10.0,
            width: 130.0,
            height: 130.0,
            rotation: 0.0,
        };
        image.apply_clip(&mut scene, clip);
        assert!(!image.apply_url(&mut scene, "a.png"));
        assert_clip_eq(image.clip(&scene), clip);
        // Same url again is a no-op
        assert!(!image.apply_url(&mut scene, "a.png"));
    }

    #[test]
    fn test_replacing_url_resets_clip() {
        let (mut scene, mut image) = setup(Size::new(100.0, 80.0));
        image.apply_url(&mut scene, "a.png");
        image.apply_clip(
            &mut scene,
            Clip {
                x: -10.0,
                y: -10.0,
                width: 130.0,
                height: 130.0,
                rotation: 15.0,
            },
        );
        assert!(image.apply_url(&mut scene, "b.png"));
        assert_clip_eq(image.clip(&scene), Clip::fill(Size::new(100.0, 80.0)));
    }

    #[test]
    fn test_clearing_url_keeps_clip() {
        let (mut scene, mut image) = setup(Size::new(100.0, 80.0));
        image.apply_url(&mut scene, "a.png");
        let clip = Clip {
            x: -10.0,
            y: -10.0,
            width: 130.0,
            height: 130.0,
            rotation: 15.0,
        };
        image.apply_clip(&mut scene, clip);
        assert!(!image.apply_url(&mut scene, ""));
        assert_eq!(image.url(), "");
        assert_clip_eq(image.clip(&scene), clip);
    }

    #[test]
    fn test_content_loaded_sizes_empty_frame() {
        let (mut scene, mut image) = setup(Size::ZERO);
        image.apply_url(&mut scene, "a.png");
        assert!(!image.content_loaded(&mut scene, "old.png", Size::new(640.0, 480.0)));
        assert!(image.content_loaded(&mut scene, "a.png", Size::new(640.0, 480.0)));
        assert_eq!(scene.size(image.nodes().frame), Size::new(640.0, 480.0));
        assert_clip_eq(image.clip(&scene), Clip::fill(Size::new(640.0, 480.0)));
    }

    #[test]
    fn test_content_loaded_keeps_sized_frame() {
        let (mut scene, mut image) = setup(Size::new(100.0, 100.0));
        image.apply_url(&mut scene, "a.png");
        assert!(!image.content_loaded(&mut scene, "a.png", Size::new(640.0, 480.0)));
        assert_eq!(scene.size(image.nodes().frame), Size::new(100.0, 100.0));
    }

    #[test]
    fn test_non_finite_clip_rejected() {
        let (mut scene, image) = setup(Size::new(100.0, 100.0));
        let clip = Clip {
            x: f64::NAN,
            ..Clip::fill(Size::new(10.0, 10.0))
        };
        assert!(!image.apply_clip(&mut scene, clip));
        assert_eq!(scene.size(image.nodes().content), Size::new(100.0, 100.0));
    }
}
