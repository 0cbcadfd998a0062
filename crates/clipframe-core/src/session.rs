//! Editing session.
//!
//! A session owns the editing state for one frame: the value backup taken at
//! open, the preview pair and ghost nodes it adds to the scene, the overlay
//! layout and the current gesture. The scene itself stays with the host and is
//! passed into every call.
//!
//! # Lifecycle
//!
//! ```text
//! open -> (start -> drag* -> end | cancel)* -> close
//! ```
//!
//! `open` hides the target frame and shows a preview clone in its place;
//! `close` reverses that. After `close` every call is a logged no-op.
//!
//! # Scene Nodes
//!
//! - **Committed pair**: the target frame and content. Gestures write here.
//! - **Preview pair**: a root-level clone placed at the frame's world
//!   transform, re-synced from the committed pair after every change.
//! - **Ghost**: a half-transparent root clone of the content showing the whole
//!   image, including the parts the frame clips away.

use std::collections::VecDeque;
use std::fmt;

use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{EditorConfig, Moveable};
use crate::error::EditorError;
use crate::event::EditorEvent;
use crate::geometry::{fixed_eq, parse_ratio};
use crate::gesture::{DragAction, DragState, GestureSnapshot, Modifiers};
use crate::handles::{ButtonCluster, Handle, HandleKind, HandleLayout, LayoutInput};
use crate::scene::{
    BoundsSpace, LayoutBounds, LayoutTransform, SceneHost, TransformAdapter, TransformSpace,
};
use crate::transform::{
    apply_frame_size, drag_move, drag_resize, drag_rotate, frame_extent, programmatic_move,
    ratio_size, resolve_size, MoveOutcome, NodePair, TransformContext,
};

/// Opacity of the ghost image outside the frame.
const GHOST_OPACITY: f64 = 0.5;

/// The frame and content a session edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTarget<N> {
    pub frame: N,
    pub content: N,
    /// Hide the overlay.
    pub locked: bool,
    /// Always keep the frame aspect ratio while resizing.
    pub fixed_ratio: bool,
}

impl<N: Copy> EditTarget<N> {
    pub fn new(nodes: NodePair<N>) -> Self {
        Self {
            frame: nodes.frame,
            content: nodes.content,
            locked: false,
            fixed_ratio: false,
        }
    }

    #[inline]
    pub fn nodes(&self) -> NodePair<N> {
        NodePair {
            frame: self.frame,
            content: self.content,
        }
    }
}

/// Value copy of the target taken at open, restored by [`EditSession::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub frame_layout: LayoutTransform,
    pub frame_size: Size,
    pub content_layout: LayoutTransform,
    pub content_size: Size,
}

impl Backup {
    fn capture<S: SceneHost>(scene: &S, nodes: NodePair<S::NodeId>) -> Self {
        Self {
            frame_layout: scene.layout(nodes.frame),
            frame_size: scene.size(nodes.frame),
            content_layout: scene.layout(nodes.content),
            content_size: scene.size(nodes.content),
        }
    }

    fn restore<S: SceneHost>(&self, scene: &mut S, nodes: NodePair<S::NodeId>) {
        scene.set_layout(nodes.frame, self.frame_layout);
        scene.set_size(nodes.frame, self.frame_size);
        scene.set_layout(nodes.content, self.content_layout);
        scene.set_size(nodes.content, self.content_size);
    }

    /// Displayed frame size at open.
    pub fn frame_extent(&self) -> Size {
        Size::new(
            self.frame_size.width * self.frame_layout.scale_x.abs(),
            self.frame_size.height * self.frame_layout.scale_y.abs(),
        )
    }
}

/// An open editing session.
#[derive(Debug, Clone)]
pub struct EditSession<N> {
    config: EditorConfig,
    target: EditTarget<N>,
    preview: NodePair<N>,
    ghost: N,
    backup: Backup,
    layout: HandleLayout,
    buttons: ButtonCluster,
    content_bounds: LayoutBounds,
    drag: DragState<N>,
    events: VecDeque<EditorEvent>,
    closed: bool,
}

impl<N: Copy + Eq + fmt::Debug> EditSession<N> {
    /// Open a session on `target`.
    ///
    /// Emits `BeforeStart`, `Start` and a first `UpdateEditorBounds`.
    pub fn open<S: SceneHost<NodeId = N>>(
        scene: &mut S,
        target: EditTarget<N>,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        if !scene.contains(target.frame) {
            return Err(EditorError::MissingNode(format!("{:?}", target.frame)));
        }
        if scene.is_editing(target.frame) {
            warn!("[session] Frame {:?} is already being edited", target.frame);
            return Err(EditorError::AlreadyEditing);
        }
        let Some(index) = scene
            .children(target.frame)
            .iter()
            .position(|child| *child == target.content)
        else {
            return Err(EditorError::MissingContent);
        };

        let mut events = VecDeque::new();
        events.push_back(EditorEvent::BeforeStart);
        let backup = Backup::capture(scene, target.nodes());

        scene.lock_layout();
        let ghost = scene.clone_node(target.content, None);
        let preview_frame = scene.clone_node(target.frame, None);
        let Some(preview_content) = scene.children(preview_frame).get(index).copied() else {
            scene.remove_node(preview_frame);
            scene.remove_node(ghost);
            scene.unlock_layout();
            return Err(EditorError::MissingContent);
        };
        scene.set_visible(ghost, true);
        scene.set_opacity(ghost, GHOST_OPACITY);
        scene.set_visible(preview_frame, true);
        scene.set_visible(target.frame, false);
        scene.set_editing(target.frame, true);
        scene.unlock_layout();

        debug!("[session] Opened on frame {:?}", target.frame);
        events.push_back(EditorEvent::Start);

        let mut session = Self {
            layout: HandleLayout::new(&config),
            config,
            target,
            preview: NodePair {
                frame: preview_frame,
                content: preview_content,
            },
            ghost,
            backup,
            buttons: ButtonCluster::default(),
            content_bounds: LayoutBounds::default(),
            drag: DragState::Idle,
            events,
            closed: false,
        };
        session.update(scene);
        Ok(session)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn target(&self) -> &EditTarget<N> {
        &self.target
    }

    /// The preview pair standing in for the target.
    pub fn preview(&self) -> NodePair<N> {
        self.preview
    }

    pub fn ghost(&self) -> N {
        self.ghost
    }

    pub fn backup(&self) -> &Backup {
        &self.backup
    }

    /// Overlay layout from the last update.
    pub fn layout(&self) -> &HandleLayout {
        &self.layout
    }

    /// World placement of the whole image, for the outline drawn around it.
    pub fn content_bounds(&self) -> LayoutBounds {
        self.content_bounds
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// True while the frame body is being dragged.
    pub fn is_moving(&self) -> bool {
        self.drag
            .snapshot()
            .is_some_and(|s| s.handle.kind == HandleKind::Move)
    }

    /// Snapshot of the gesture in progress.
    pub fn gesture(&self) -> Option<&GestureSnapshot<N>> {
        self.drag.snapshot()
    }

    /// Nodes being resized by the current gesture.
    pub fn co_edited(&self) -> &[N] {
        match self.drag.snapshot() {
            Some(snapshot) => &snapshot.co_edited,
            None => &[],
        }
    }

    /// Take all queued events.
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.events.drain(..).collect()
    }

    /// Re-derive the preview, ghost and overlay from the committed pair and
    /// emit `UpdateEditorBounds`.
    pub fn update<S: SceneHost<NodeId = N>>(&mut self, scene: &mut S) {
        if self.closed {
            warn!("[session] update on closed session");
            return;
        }
        let frame = self.target.frame;
        let content = self.target.content;
        scene.lock_layout();

        let world = scene.layout_bounds(frame, TransformSpace::World, true);
        self.layout.update(
            &self.config,
            &LayoutInput {
                placement: world,
                locked: self.target.locked,
                buttons: self.buttons,
            },
        );

        let placed = scene.layout_bounds(frame, TransformSpace::World, false);
        scene.set_layout(self.preview.frame, placed.layout());
        scene.set_size(self.preview.frame, scene.size(frame));
        scene.set_layout(self.preview.content, scene.layout(content));
        scene.set_size(self.preview.content, scene.size(content));

        let ghost = scene.layout_bounds(self.preview.content, TransformSpace::World, false);
        scene.set_layout(self.ghost, ghost.layout());
        scene.set_size(self.ghost, ghost.size());
        self.content_bounds = scene.layout_bounds(self.preview.content, TransformSpace::World, true);

        let to_window = scene.viewport_transform() * scene.transform(frame, TransformSpace::World);
        let window = LayoutBounds::from_transform(to_window, scene.size(frame), &scene.layout(frame), true);

        scene.unlock_layout();
        self.events
            .push_back(EditorEvent::UpdateEditorBounds { world, window });
    }

    /// Set the host's button cluster and re-layout the overlay.
    pub fn set_buttons<S: SceneHost<NodeId = N>>(&mut self, scene: &mut S, buttons: ButtonCluster) {
        self.buttons = buttons;
        self.update(scene);
    }

    /// Begin a gesture on `handle` with the pointer at `pointer` (world space).
    pub fn start<S: SceneHost<NodeId = N>>(
        &mut self,
        scene: &mut S,
        handle: Handle,
        pointer: Point,
        _modifiers: Modifiers,
    ) -> Result<(), EditorError> {
        if self.closed {
            warn!("[session] start on closed session");
            return Err(EditorError::SessionClosed);
        }
        if self.drag.is_dragging() {
            warn!("[session] start while a gesture is active");
            return Err(EditorError::GestureActive);
        }

        let resize = handle.kind.includes_resize();
        let target = if resize {
            self.preview.frame
        } else {
            self.preview.content
        };
        let target_layout = scene.layout(target);
        let frame_layout = scene.layout(self.target.frame);
        let frame_size = scene.size(self.target.frame);

        let snapshot = GestureSnapshot {
            handle,
            pointer,
            target,
            target_origin: Point::new(target_layout.x, target_layout.y),
            target_bounds: scene.bounds(target, BoundsSpace::Inner),
            content_rotation: scene.layout(self.target.content).rotation,
            pointer_in_frame: scene
                .inner_point(self.preview.frame, pointer)
                .unwrap_or(pointer),
            frame_world: scene.transform(self.target.frame, TransformSpace::World),
            frame_extent: Vec2::new(
                frame_size.width * frame_layout.scale_x,
                frame_size.height * frame_layout.scale_y,
            ),
            content_world: resize.then(|| scene.transform(self.target.content, TransformSpace::World)),
            co_edited: if resize {
                vec![self.target.frame, self.target.content]
            } else {
                Vec::new()
            },
        };

        if handle.kind == HandleKind::Move {
            self.layout.set_opacity(0.0);
            self.layout.set_guidelines_visible(true);
        } else if handle.kind.includes_rotate() {
            self.layout.set_guidelines_visible(true);
        }

        debug!(
            "[session] Gesture start: {:?} {:?} at ({:.1}, {:.1})",
            handle.kind, handle.direction, pointer.x, pointer.y
        );
        self.drag = DragState::Dragging(snapshot);
        Ok(())
    }

    /// Continue the gesture with the pointer at `pointer`.
    ///
    /// Returns true if the target changed.
    pub fn drag<S: SceneHost<NodeId = N>>(&mut self, scene: &mut S, pointer: Point, modifiers: Modifiers) -> bool {
        if self.closed {
            warn!("[session] drag on closed session");
            return false;
        }
        let Some(snapshot) = self.drag.snapshot() else {
            debug!("[session] drag without a gesture");
            return false;
        };
        if !pointer.x.is_finite() || !pointer.y.is_finite() {
            return false;
        }

        let action = DragAction::classify(snapshot.handle, modifiers, &self.config);
        scene.lock_layout();
        let changed = {
            let mut ctx = TransformContext {
                scene: &mut *scene,
                committed: self.target.nodes(),
                preview: self.preview,
                config: &self.config,
            };
            match action {
                DragAction::Move => {
                    self.config.moveable != Moveable::Off && drag_move(&mut ctx, snapshot, pointer, modifiers)
                }
                DragAction::Rotate => drag_rotate(&mut ctx, snapshot, pointer, modifiers).is_some(),
                DragAction::Scale => drag_resize(&mut ctx, snapshot, pointer, modifiers, self.target.fixed_ratio),
                DragAction::RotateScale => {
                    let scaled = drag_resize(&mut ctx, snapshot, pointer, modifiers, self.target.fixed_ratio);
                    let rotated = drag_rotate(&mut ctx, snapshot, pointer, modifiers).is_some();
                    scaled || rotated
                }
            }
        };
        if changed {
            self.update(scene);
        }
        scene.unlock_layout();
        changed
    }

    /// Finish the gesture. Returns false if none was active.
    pub fn end(&mut self) -> bool {
        let Some(snapshot) = self.drag.take() else {
            return false;
        };
        self.layout.reset_transient();
        debug!("[session] Gesture end: {:?}", snapshot.handle.kind);
        true
    }

    /// Abort the gesture. Changes made so far are kept, as with [`EditSession::end`].
    pub fn cancel(&mut self) -> bool {
        self.end()
    }

    /// Move the content by `delta` (frame-local units) outside of a drag.
    pub fn move_by<S: SceneHost<NodeId = N>>(&mut self, scene: &mut S, delta: Vec2) -> MoveOutcome {
        if self.closed {
            warn!("[session] move on closed session");
            return MoveOutcome::Propagate;
        }
        scene.lock_layout();
        let outcome = programmatic_move(scene, self.target.content, delta, &self.config);
        if outcome == MoveOutcome::Moved {
            self.update(scene);
        }
        scene.unlock_layout();
        outcome
    }

    /// Restore the target to its state at open.
    pub fn reset<S: SceneHost<NodeId = N>>(&mut self, scene: &mut S) -> bool {
        if self.closed {
            warn!("[session] reset on closed session");
            return false;
        }
        self.end();
        scene.lock_layout();
        self.backup.restore(scene, self.target.nodes());
        self.update(scene);
        scene.unlock_layout();
        debug!("[session] Reset to backup");
        true
    }

    /// Resize the frame to an aspect ratio such as `"16:9"`.
    ///
    /// Malformed ratios are logged and ignored.
    pub fn apply_ratio<S: SceneHost<NodeId = N>>(&mut self, scene: &mut S, ratio: &str) -> bool {
        if self.closed {
            warn!("[session] ratio preset on closed session");
            return false;
        }
        let ratio = match parse_ratio(ratio) {
            Ok(ratio) => ratio,
            Err(e) => {
                warn!("[session] {}", e);
                return false;
            }
        };
        let original = self.backup.frame_extent();
        self.resize_frame(scene, ratio_size(original, ratio, original))
    }

    /// Resize the frame to an explicit size. Missing dimensions keep their
    /// current value; with `lock` the changed one drives the other.
    pub fn apply_size<S: SceneHost<NodeId = N>>(
        &mut self,
        scene: &mut S,
        width: Option<f64>,
        height: Option<f64>,
        lock: bool,
    ) -> bool {
        if self.closed {
            warn!("[session] size preset on closed session");
            return false;
        }
        let current = frame_extent(scene, self.target.frame);
        let requested = Size::new(width.unwrap_or(current.width), height.unwrap_or(current.height));
        let size = resolve_size(current, requested, lock);
        if fixed_eq(size.width, current.width, 2) && fixed_eq(size.height, current.height, 2) {
            return false;
        }
        self.resize_frame(scene, size)
    }

    fn resize_frame<S: SceneHost<NodeId = N>>(&mut self, scene: &mut S, size: Size) -> bool {
        scene.lock_layout();
        let resized = apply_frame_size(scene, self.target.nodes(), size, self.config.edit_size);
        if resized {
            debug!("[session] Frame resized to {:.2}x{:.2}", size.width, size.height);
            self.update(scene);
        }
        scene.unlock_layout();
        resized
    }

    /// End any gesture, show the target again and remove the preview nodes.
    pub fn close<S: SceneHost<NodeId = N>>(&mut self, scene: &mut S) {
        if self.closed {
            warn!("[session] close on closed session");
            return;
        }
        self.end();
        scene.lock_layout();
        scene.set_visible(self.target.frame, true);
        scene.set_editing(self.target.frame, false);
        scene.remove_node(self.preview.frame);
        scene.remove_node(self.ghost);
        scene.unlock_layout();
        self.closed = true;
        self.events.push_back(EditorEvent::End);
        debug!("[session] Closed");
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::geometry::{normalize_rotation, Direction};
    use crate::scene::{MemoryScene, NodeId};
    use proptest::prelude::*;

    fn nested_scene(
        parent_rotation: f64,
        parent_scale: f64,
        frame_rotation: f64,
        content_rotation: f64,
    ) -> (MemoryScene, EditTarget<NodeId>) {
        let mut scene = MemoryScene::new();
        let group = scene.add_node(
            "group",
            None,
            LayoutTransform {
                x: 30.0,
                y: -20.0,
                rotation: parent_rotation,
                scale_x: parent_scale,
                scale_y: parent_scale,
            },
            Size::new(800.0, 800.0),
        );
        let frame = scene.add_node(
            "frame",
            Some(group),
            LayoutTransform {
                rotation: frame_rotation,
                ..LayoutTransform::at(60.0, 40.0)
            },
            Size::new(200.0, 100.0),
        );
        let content = scene.add_node(
            "content",
            Some(frame),
            LayoutTransform {
                rotation: content_rotation,
                ..LayoutTransform::at(-30.0, -20.0)
            },
            Size::new(300.0, 180.0),
        );
        (scene, EditTarget::new(NodePair { frame, content }))
    }

    #[test]
    fn test_scale_mode_corner_drag_over_rotated_content() {
        let (mut scene, target) = nested_scene(0.0, 0.5, 0.0, -122.18);
        let config = EditorConfig {
            edit_size: crate::config::EditSize::Scale,
            ..EditorConfig::default()
        };
        let mut session = EditSession::open(&mut scene, target, config).unwrap();
        let before = scene.transform(target.content, TransformSpace::World);

        let pointer = scene.world_point(target.frame, Point::ZERO);
        session
            .start(&mut scene, Handle::resize(Direction::TopLeft), pointer, Modifiers::NONE)
            .unwrap();
        assert!(session.drag(&mut scene, pointer + Vec2::new(0.0, 2.617), Modifiers::NONE));
        session.end();

        let after = scene.transform(target.content, TransformSpace::World);
        for (a, b) in after.as_coeffs().iter().zip(before.as_coeffs().iter()) {
            assert!((a - b).abs() < 1e-6, "{:?} vs {:?}", after, before);
        }
        assert!(scene.size(target.frame).height < 100.0);
    }

    proptest! {
        #[test]
        fn resize_keeps_content_in_place(
            parent_rotation in -180.0f64..180.0,
            parent_scale in 0.5f64..2.0,
            frame_rotation in -180.0f64..180.0,
            content_rotation in -180.0f64..180.0,
            direction in 0usize..8,
            dx in -40.0f64..40.0,
            dy in -40.0f64..40.0,
            scale_mode in any::<bool>(),
        ) {
            let (mut scene, target) = nested_scene(parent_rotation, parent_scale, frame_rotation, content_rotation);
            let mut config = EditorConfig::default();
            if scale_mode {
                config.edit_size = crate::config::EditSize::Scale;
            }
            let mut session = EditSession::open(&mut scene, target, config).unwrap();
            let before = scene.transform(target.content, TransformSpace::World);

            let direction = Direction::from_index(direction);
            let anchor = direction.point_on(scene.size(target.frame).to_rect());
            let pointer = scene.world_point(target.frame, anchor);
            session.start(&mut scene, Handle::resize(direction), pointer, Modifiers::NONE).unwrap();
            session.drag(&mut scene, pointer + Vec2::new(dx, dy), Modifiers::NONE);
            session.end();

            let after = scene.transform(target.content, TransformSpace::World);
            for (a, b) in after.as_coeffs().iter().zip(before.as_coeffs().iter()) {
                prop_assert!((a - b).abs() < 1e-6, "{:?} vs {:?}", after, before);
            }
        }

        #[test]
        fn rotate_and_back_restores_rotation(
            frame_rotation in -180.0f64..180.0,
            content_rotation in -179.0f64..179.0,
            degrees in -170.0f64..170.0,
        ) {
            let (mut scene, target) = nested_scene(0.0, 1.0, frame_rotation, content_rotation);
            let mut session = EditSession::open(&mut scene, target, EditorConfig::default()).unwrap();
            let original = scene.layout(target.content).rotation;

            let center = Point::new(100.0, 50.0);
            let start = scene.world_point(target.frame, center + Vec2::new(80.0, 0.0));
            let r = degrees.to_radians();
            let turned = scene.world_point(
                target.frame,
                center + Vec2::new(80.0 * r.cos(), 80.0 * r.sin()),
            );

            session.start(&mut scene, Handle::grip(), start, Modifiers::NONE).unwrap();
            session.drag(&mut scene, turned, Modifiers::NONE);
            session.end();
            session.start(&mut scene, Handle::grip(), turned, Modifiers::NONE).unwrap();
            session.drag(&mut scene, start, Modifiers::NONE);
            session.end();

            let restored = scene.layout(target.content).rotation;
            prop_assert!(normalize_rotation(restored - original).abs() < 0.01);
        }
    }
}
