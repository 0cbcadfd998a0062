//! Clip editor WASM bindings.
//!
//! `JsClipEditor` owns an in-memory scene holding one clip image (a frame and
//! its content layer) and drives editing sessions on it. The host forwards
//! pointer events, draws the overlay from `layout()`, and paints the frame,
//! preview and ghost nodes from `nodes()`.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const editor = new JsClipEditor({ rotateGap: 15, lockRatio: "corner" });
//! editor.set_frame(100, 80, 0, 0, 0);
//! editor.set_url("photo.jpg");
//! editor.content_loaded("photo.jpg", img.naturalWidth, img.naturalHeight);
//!
//! editor.open();
//! editor.start_drag("resize", 4, e.clientX, e.clientY, e.shiftKey, e.altKey, e.ctrlKey, e.metaKey);
//! if (editor.drag(e.clientX, e.clientY, e.shiftKey, e.altKey, e.ctrlKey, e.metaKey)) {
//!   repaint(editor.layout());
//! }
//! editor.end_drag();
//! for (const event of editor.drain_events()) listeners.emit(event.type, event);
//! editor.close();
//! ```

use clipframe_core::{
    ButtonCluster, Clip, ClipImage, EditSession, EditTarget, EditorConfig, EditorError, LayoutTransform,
    MemoryScene, NodeId, SceneHost,
};
use kurbo::{Affine, Point, Size, Vec2};
use serde::Serialize;
use tracing::debug;
use wasm_bindgen::prelude::*;

use crate::types::{from_js_or_default, handle_from_parts, modifiers_from_flags, outcome_name, to_js};

/// Arena slots of the nodes the host paints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SceneNodes {
    frame: u32,
    content: u32,
    preview_frame: Option<u32>,
    preview_content: Option<u32>,
    ghost: Option<u32>,
}

/// Interactive editor for one clip image.
#[wasm_bindgen]
pub struct JsClipEditor {
    scene: MemoryScene,
    image: ClipImage<NodeId>,
    config: EditorConfig,
    session: Option<EditSession<NodeId>>,
    buttons: ButtonCluster,
    fixed_ratio: bool,
    locked: bool,
}

fn editor_error(e: EditorError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
impl JsClipEditor {
    /// Create an editor with an optional config object (camelCase keys,
    /// missing keys take their defaults).
    ///
    /// # Errors
    /// Returns error if the config cannot be deserialized
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsClipEditor, JsValue> {
        let config: EditorConfig = from_js_or_default(config, "editor config")?;
        let mut scene = MemoryScene::new();
        let frame = scene.add_node("frame", None, LayoutTransform::new(), Size::ZERO);
        let content = scene.add_node("content", Some(frame), LayoutTransform::new(), Size::ZERO);
        let image = ClipImage::attach(&scene, frame, content).map_err(editor_error)?;
        Ok(JsClipEditor {
            scene,
            image,
            config,
            session: None,
            buttons: ButtonCluster::default(),
            fixed_ratio: false,
            locked: false,
        })
    }

    /// Replace the config. Takes effect at the next `open`.
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        self.config = from_js_or_default(config, "editor config")?;
        Ok(())
    }

    /// Place the frame. A zero size is filled in when the image loads.
    pub fn set_frame(&mut self, x: f64, y: f64, width: f64, height: f64, rotation: f64) {
        let frame = self.image.nodes().frame;
        self.scene.set_layout(
            frame,
            LayoutTransform {
                x,
                y,
                rotation,
                ..LayoutTransform::new()
            },
        );
        self.scene.set_size(frame, Size::new(width.max(0.0), height.max(0.0)));
    }

    /// Keep the frame aspect ratio for every resize. Takes effect at the next `open`.
    pub fn set_fixed_ratio(&mut self, fixed: bool) {
        self.fixed_ratio = fixed;
    }

    /// Hide the overlay while editing. Takes effect at the next `open`.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Set the world-to-window zoom and pan.
    pub fn set_viewport(&mut self, scale: f64, x: f64, y: f64) {
        self.scene
            .set_viewport(Affine::translate((x, y)) * Affine::scale(scale));
        if let Some(session) = self.session.as_mut().filter(|s| !s.is_closed()) {
            session.update(&mut self.scene);
        }
    }

    /// Set the image url. Replacing an image resets its clip.
    pub fn set_url(&mut self, url: &str) -> bool {
        self.image.apply_url(&mut self.scene, url)
    }

    #[wasm_bindgen(getter)]
    pub fn url(&self) -> String {
        self.image.url().to_string()
    }

    /// Report that the image at `url` loaded with its natural size.
    pub fn content_loaded(&mut self, url: &str, width: f64, height: f64) -> bool {
        self.image.content_loaded(&mut self.scene, url, Size::new(width, height))
    }

    /// Current clip as `{ x, y, width, height, rotation }`.
    pub fn clip(&self) -> Result<JsValue, JsValue> {
        to_js(&self.image.clip(&self.scene))
    }

    /// Place the image inside the frame.
    ///
    /// # Errors
    /// Returns error if the clip cannot be deserialized
    pub fn set_clip(&mut self, clip: JsValue) -> Result<bool, JsValue> {
        let clip: Clip = from_js_or_default(clip, "clip")?;
        Ok(self.image.apply_clip(&mut self.scene, clip))
    }

    /// Open an editing session on the frame.
    ///
    /// # Errors
    /// Returns error if a session is already open or the scene is incomplete
    pub fn open(&mut self) -> Result<(), JsValue> {
        if self.live_session().is_some() {
            return Err(JsValue::from_str("Editing session is already open"));
        }
        let target = EditTarget {
            locked: self.locked,
            fixed_ratio: self.fixed_ratio,
            ..EditTarget::new(self.image.nodes())
        };
        let mut session = EditSession::open(&mut self.scene, target, self.config.clone()).map_err(editor_error)?;
        if self.buttons.count > 0 {
            session.set_buttons(&mut self.scene, self.buttons);
        }
        self.session = Some(session);
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn is_open(&self) -> bool {
        self.live_session().is_some()
    }

    /// Close the session, keeping its changes.
    ///
    /// Queued events, including the final `end`, stay readable through
    /// `drain_events` until the next `open`.
    pub fn close(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.close(&mut self.scene);
        }
    }

    /// Begin a drag on a handle. `kind` is one of `resize`, `rotate`,
    /// `resize-rotate` or `move`; `direction` counts clockwise from the
    /// top-left corner.
    ///
    /// # Errors
    /// Returns error for an unknown handle, or if no session is open or a drag
    /// is already active
    #[allow(clippy::too_many_arguments)]
    pub fn start_drag(
        &mut self,
        kind: &str,
        direction: u8,
        x: f64,
        y: f64,
        shift: bool,
        alt: bool,
        ctrl: bool,
        meta: bool,
    ) -> Result<(), JsValue> {
        let handle = handle_from_parts(kind, direction)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown handle: {} {}", kind, direction)))?;
        let session = self
            .session
            .as_mut()
            .filter(|s| !s.is_closed())
            .ok_or_else(|| editor_error(EditorError::SessionClosed))?;
        session
            .start(
                &mut self.scene,
                handle,
                Point::new(x, y),
                modifiers_from_flags(shift, alt, ctrl, meta),
            )
            .map_err(editor_error)
    }

    /// Continue the drag. Returns true if the frame or image changed.
    pub fn drag(&mut self, x: f64, y: f64, shift: bool, alt: bool, ctrl: bool, meta: bool) -> bool {
        match self.session.as_mut() {
            Some(session) => session.drag(
                &mut self.scene,
                Point::new(x, y),
                modifiers_from_flags(shift, alt, ctrl, meta),
            ),
            None => false,
        }
    }

    pub fn end_drag(&mut self) -> bool {
        self.session.as_mut().is_some_and(|s| s.end())
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.session.as_mut().is_some_and(|s| s.cancel())
    }

    #[wasm_bindgen(getter)]
    pub fn is_dragging(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_dragging())
    }

    /// Move the image by a frame-local delta (arrow keys).
    ///
    /// Returns `moved`, `consumed`, or `propagate` when the host should handle
    /// the key itself.
    pub fn move_by(&mut self, dx: f64, dy: f64) -> String {
        let outcome = match self.session.as_mut() {
            Some(session) => session.move_by(&mut self.scene, Vec2::new(dx, dy)),
            None => clipframe_core::MoveOutcome::Propagate,
        };
        outcome_name(outcome).to_string()
    }

    /// Undo every change made since `open`.
    pub fn reset(&mut self) -> bool {
        self.session.as_mut().is_some_and(|s| s.reset(&mut self.scene))
    }

    /// Resize the frame to an aspect ratio such as `"16:9"`.
    pub fn apply_ratio(&mut self, ratio: &str) -> bool {
        self.session
            .as_mut()
            .is_some_and(|s| s.apply_ratio(&mut self.scene, ratio))
    }

    /// Resize the frame to an explicit size; a missing side keeps its value.
    pub fn apply_size(&mut self, width: Option<f64>, height: Option<f64>, lock: bool) -> bool {
        self.session
            .as_mut()
            .is_some_and(|s| s.apply_size(&mut self.scene, width, height, lock))
    }

    /// Measure of the host's action buttons, used to place them and the
    /// rotation grip.
    pub fn set_buttons(&mut self, width: f64, height: f64, count: usize) {
        self.buttons = ButtonCluster {
            size: Size::new(width, height),
            count,
        };
        if let Some(session) = self.session.as_mut().filter(|s| !s.is_closed()) {
            session.set_buttons(&mut self.scene, self.buttons);
        }
    }

    /// Overlay layout of the open session, or `null`.
    pub fn layout(&self) -> Result<JsValue, JsValue> {
        match self.live_session() {
            Some(session) => to_js(session.layout()),
            None => Ok(JsValue::NULL),
        }
    }

    /// Node handles to paint, including the preview pair and ghost while a
    /// session is open.
    pub fn nodes(&self) -> Result<JsValue, JsValue> {
        let nodes = self.image.nodes();
        let session = self.live_session();
        to_js(&SceneNodes {
            frame: nodes.frame.slot(),
            content: nodes.content.slot(),
            preview_frame: session.map(|s| s.preview().frame.slot()),
            preview_content: session.map(|s| s.preview().content.slot()),
            ghost: session.map(|s| s.ghost().slot()),
        })
    }

    /// Local layout of the node in `slot` as `{ x, y, rotation, scaleX, scaleY }`.
    /// An empty slot reads as the identity layout.
    pub fn node_layout(&self, slot: u32) -> Result<JsValue, JsValue> {
        let layout = self
            .scene
            .node_at(slot)
            .map(|node| self.scene.layout(node))
            .unwrap_or_default();
        to_js(&layout)
    }

    /// Take every queued session event.
    pub fn drain_events(&mut self) -> Result<JsValue, JsValue> {
        let events = match self.session.as_mut() {
            Some(session) => session.drain_events(),
            None => Vec::new(),
        };
        if self.session.as_ref().is_some_and(|s| s.is_closed()) {
            debug!("[wasm] Dropping closed session");
            self.session = None;
        }
        to_js(&events)
    }

    /// Explicitly free WASM memory.
    ///
    /// This is optional - wasm-bindgen's finalizer will handle cleanup automatically.
    pub fn free(self) {
        // Dropping self releases the memory
    }
}

impl JsClipEditor {
    fn live_session(&self) -> Option<&EditSession<NodeId>> {
        self.session.as_ref().filter(|s| !s.is_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipframe_core::EditorEvent;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn loaded_editor(config: JsValue) -> JsClipEditor {
        let mut editor = JsClipEditor::new(config).unwrap();
        editor.set_frame(0.0, 0.0, 0.0, 0.0, 0.0);
        editor.set_url("photo.jpg");
        assert!(editor.content_loaded("photo.jpg", 400.0, 300.0));
        editor
    }

    fn events(editor: &mut JsClipEditor) -> Vec<EditorEvent> {
        serde_wasm_bindgen::from_value(editor.drain_events().unwrap()).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_new_with_default_config() {
        let editor = JsClipEditor::new(JsValue::UNDEFINED).unwrap();
        assert!(!editor.is_open());
        assert!(editor.layout().unwrap().is_null());
    }

    #[wasm_bindgen_test]
    fn test_new_with_invalid_config() {
        let invalid = serde_wasm_bindgen::to_value(&42).unwrap();
        assert!(JsClipEditor::new(invalid).is_err());
    }

    #[wasm_bindgen_test]
    fn test_session_lifecycle_events() {
        let mut editor = loaded_editor(JsValue::UNDEFINED);
        editor.open().unwrap();
        assert!(editor.open().is_err());
        assert!(editor.is_open());

        editor.start_drag("resize", 3, 400.0, 150.0, false, false, false, false).unwrap();
        assert!(editor.is_dragging());
        assert!(editor.drag(440.0, 150.0, false, false, false, false));
        assert!(editor.end_drag());
        editor.close();

        let names: Vec<_> = events(&mut editor).iter().map(|e| e.name()).collect();
        assert_eq!(names, ["beforeStart", "start", "updateEditorBounds", "updateEditorBounds", "end"]);
        assert!(!editor.is_open());

        let clip: Clip = serde_wasm_bindgen::from_value(editor.clip().unwrap()).unwrap();
        assert_eq!(clip.width, 400.0);
    }

    #[wasm_bindgen_test]
    fn test_start_drag_errors() {
        let mut editor = loaded_editor(JsValue::UNDEFINED);
        assert!(editor.start_drag("resize", 3, 0.0, 0.0, false, false, false, false).is_err());
        editor.open().unwrap();
        assert!(editor.start_drag("skew", 3, 0.0, 0.0, false, false, false, false).is_err());
        assert!(editor.start_drag("move", 0, 10.0, 10.0, false, false, false, false).is_ok());
        assert!(editor.start_drag("move", 0, 10.0, 10.0, false, false, false, false).is_err());
        assert!(editor.cancel_drag());
    }

    #[wasm_bindgen_test]
    fn test_ratio_preset_and_reset() {
        let mut editor = loaded_editor(JsValue::UNDEFINED);
        editor.open().unwrap();
        assert!(editor.apply_ratio("1:1"));
        assert!(!editor.apply_ratio("1-1"));
        assert!(editor.reset());
        editor.close();

        let clip: Clip = serde_wasm_bindgen::from_value(editor.clip().unwrap()).unwrap();
        assert_eq!(clip, Clip::fill(Size::new(400.0, 300.0)));
    }

    #[wasm_bindgen_test]
    fn test_move_by_respects_config() {
        #[derive(Serialize)]
        struct Config {
            moveable: &'static str,
        }
        let config = serde_wasm_bindgen::to_value(&Config { moveable: "move" }).unwrap();
        let mut editor = loaded_editor(config);
        assert_eq!(editor.move_by(5.0, 0.0), "propagate");
        editor.open().unwrap();
        assert_eq!(editor.move_by(5.0, 0.0), "moved");
    }

    #[wasm_bindgen_test]
    fn test_nodes_include_preview_while_open() {
        let mut editor = loaded_editor(JsValue::UNDEFINED);
        editor.open().unwrap();
        let nodes = editor.nodes().unwrap();
        let ghost = js_sys::Reflect::get(&nodes, &JsValue::from_str("ghost")).unwrap();
        assert!(ghost.as_f64().is_some());
        editor.close();
        editor.drain_events().unwrap();
        let nodes = editor.nodes().unwrap();
        let ghost = js_sys::Reflect::get(&nodes, &JsValue::from_str("ghost")).unwrap();
        assert!(ghost.is_null() || ghost.is_undefined());
    }

    #[wasm_bindgen_test]
    fn test_reopen_reuses_node_slots() {
        let ghost_slot = |editor: &JsClipEditor| {
            let nodes = editor.nodes().unwrap();
            js_sys::Reflect::get(&nodes, &JsValue::from_str("ghost"))
                .unwrap()
                .as_f64()
        };
        let mut editor = loaded_editor(JsValue::UNDEFINED);
        editor.open().unwrap();
        let first = ghost_slot(&editor);
        editor.close();
        editor.open().unwrap();
        assert_eq!(ghost_slot(&editor), first);

        let slot = first.unwrap() as u32;
        let layout: LayoutTransform = serde_wasm_bindgen::from_value(editor.node_layout(slot).unwrap()).unwrap();
        assert_eq!((layout.scale_x, layout.scale_y), (1.0, 1.0));
    }
}
