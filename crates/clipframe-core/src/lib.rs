//! Clipframe Core - Interactive crop editing engine
//!
//! This crate provides the editing engine behind Clipframe's image clipping
//! tool: a frame that clips an image, edited by dragging handles to resize
//! the frame, rotate or move the image inside it, and apply size presets.
//!
//! The engine works against any scene graph that implements
//! [`scene::SceneHost`]; [`scene::MemoryScene`] is the built-in one.

pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod geometry;
pub mod gesture;
pub mod handles;
pub mod scene;
pub mod session;
pub mod transform;

pub use config::{EditSize, EditorConfig, HandleStyle, LockRatio, Moveable, Resizeable};
pub use entity::{Clip, ClipImage};
pub use error::{EditorError, RatioError};
pub use event::EditorEvent;
pub use geometry::{Direction, Ratio, Side};
pub use gesture::Modifiers;
pub use handles::{ButtonCluster, Handle, HandleKind, HandleLayout};
pub use scene::{LayoutBounds, LayoutTransform, MemoryScene, NodeId, SceneHost, TransformAdapter};
pub use session::{Backup, EditSession, EditTarget};
pub use transform::{MoveOutcome, NodePair};

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Size};

    fn clip_image(scene: &mut MemoryScene) -> ClipImage<NodeId> {
        let frame = scene.add_node("frame", None, LayoutTransform::at(20.0, 20.0), Size::ZERO);
        let content = scene.add_node("content", Some(frame), LayoutTransform::new(), Size::ZERO);
        ClipImage::attach(scene, frame, content).unwrap()
    }

    #[test]
    fn test_edit_loaded_image() {
        let mut scene = MemoryScene::new();
        let mut image = clip_image(&mut scene);
        image.apply_url(&mut scene, "photo.jpg");
        assert!(image.content_loaded(&mut scene, "photo.jpg", Size::new(400.0, 300.0)));

        let mut session =
            EditSession::open(&mut scene, EditTarget::new(image.nodes()), EditorConfig::default()).unwrap();

        // Crop from the left edge
        session
            .start(&mut scene, Handle::resize(Direction::Left), Point::new(20.0, 170.0), Modifiers::NONE)
            .unwrap();
        assert!(session.drag(&mut scene, Point::new(120.0, 170.0), Modifiers::NONE));
        session.end();
        session.close(&mut scene);

        assert_eq!(scene.size(image.nodes().frame), Size::new(300.0, 300.0));
        let clip = image.clip(&scene);
        assert!((clip.x + 100.0).abs() < 1e-9);
        assert!((clip.width - 400.0).abs() < 1e-9);

        let names: Vec<_> = session.drain_events().iter().map(|e| e.name()).collect();
        assert_eq!(names, ["beforeStart", "start", "updateEditorBounds", "updateEditorBounds", "end"]);
    }

    #[test]
    fn test_reset_discards_edits() {
        let mut scene = MemoryScene::new();
        let mut image = clip_image(&mut scene);
        image.apply_url(&mut scene, "photo.jpg");
        image.content_loaded(&mut scene, "photo.jpg", Size::new(400.0, 300.0));
        let before = image.clip(&scene);

        let mut session =
            EditSession::open(&mut scene, EditTarget::new(image.nodes()), EditorConfig::default()).unwrap();
        session.apply_ratio(&mut scene, "1:1");
        assert_ne!(image.clip(&scene), before);
        session.reset(&mut scene);
        session.close(&mut scene);
        assert_eq!(image.clip(&scene), before);
    }
}
