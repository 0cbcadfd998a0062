//! In-memory scene graph.
//!
//! An arena of nodes with parent/child links, a local layout, a box size and
//! visibility. Removed slots go on a free list and are reused with a bumped
//! generation, so stale handles never alias a newer node.

use kurbo::{Affine, Size};
use serde::{Deserialize, Serialize};

use super::{LayoutTransform, SceneHost};

/// Handle to a node in a [`MemoryScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    slot: u32,
    generation: u32,
}

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.slot as usize
    }

    /// Arena slot, unique among live nodes.
    #[inline]
    pub fn slot(self) -> u32 {
        self.slot
    }
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    layout: LayoutTransform,
    size: Size,
    visible: bool,
    opacity: f64,
    editing: bool,
    alive: bool,
}

/// Arena-backed scene graph.
#[derive(Debug, Clone)]
pub struct MemoryScene {
    nodes: Vec<Node>,
    free: Vec<u32>,
    viewport: Affine,
    lock_depth: u32,
    dirty: bool,
    layout_passes: u64,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            viewport: Affine::IDENTITY,
            lock_depth: 0,
            dirty: false,
            layout_passes: 0,
        }
    }
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under `parent` (or as a root) and return its handle.
    pub fn add_node(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        layout: LayoutTransform,
        size: Size,
    ) -> NodeId {
        let parent = parent.filter(|p| self.contains(*p));
        let mut node = Node {
            name: name.to_string(),
            generation: 0,
            parent,
            children: Vec::new(),
            layout,
            size,
            visible: true,
            opacity: 1.0,
            editing: false,
            alive: true,
        };
        let id = match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.nodes[slot as usize];
                node.generation = entry.generation.wrapping_add(1);
                *entry = node;
                NodeId {
                    slot,
                    generation: entry.generation,
                }
            }
            None => {
                let slot = self.nodes.len() as u32;
                self.nodes.push(node);
                NodeId { slot, generation: 0 }
            }
        };
        if let Some(p) = parent {
            self.nodes[p.index()].children.push(id);
        }
        self.touch();
        id
    }

    /// The live node in `slot`, if any.
    pub fn node_at(&self, slot: u32) -> Option<NodeId> {
        self.nodes
            .get(slot as usize)
            .filter(|n| n.alive)
            .map(|n| NodeId {
                slot,
                generation: n.generation,
            })
    }

    pub fn opacity(&self, node: NodeId) -> f64 {
        self.get(node).map_or(0.0, |n| n.opacity)
    }

    /// Set the world-to-window transform (zoom and pan of the host view).
    pub fn set_viewport(&mut self, viewport: Affine) {
        self.viewport = viewport;
    }

    /// Number of layout passes flushed so far.
    pub fn layout_passes(&self) -> u64 {
        self.layout_passes
    }

    pub fn is_layout_locked(&self) -> bool {
        self.lock_depth > 0
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots ever allocated, live or free.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    fn get(&self, node: NodeId) -> Option<&Node> {
        self.nodes
            .get(node.index())
            .filter(|n| n.alive && n.generation == node.generation)
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(node.index())
            .filter(|n| n.alive && n.generation == node.generation)
    }

    /// Record a mutation: flush immediately unless a layout lock is held.
    fn touch(&mut self) {
        if self.lock_depth > 0 {
            self.dirty = true;
        } else {
            self.layout_passes += 1;
        }
    }
}

impl SceneHost for MemoryScene {
    type NodeId = NodeId;

    fn contains(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn layout(&self, node: NodeId) -> LayoutTransform {
        self.get(node).map(|n| n.layout).unwrap_or_default()
    }

    fn set_layout(&mut self, node: NodeId, layout: LayoutTransform) {
        if let Some(n) = self.get_mut(node) {
            n.layout = layout;
            self.touch();
        }
    }

    fn size(&self, node: NodeId) -> Size {
        self.get(node).map_or(Size::ZERO, |n| n.size)
    }

    fn set_size(&mut self, node: NodeId, size: Size) {
        if let Some(n) = self.get_mut(node) {
            n.size = size;
            self.touch();
        }
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|n| n.visible)
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.get_mut(node) {
            n.visible = visible;
            self.touch();
        }
    }

    fn set_opacity(&mut self, node: NodeId, opacity: f64) {
        if let Some(n) = self.get_mut(node) {
            n.opacity = opacity.clamp(0.0, 1.0);
            self.touch();
        }
    }

    fn is_editing(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|n| n.editing)
    }

    fn set_editing(&mut self, node: NodeId, editing: bool) {
        if let Some(n) = self.get_mut(node) {
            n.editing = editing;
        }
    }

    fn clone_node(&mut self, node: NodeId, parent: Option<NodeId>) -> NodeId {
        let Some(source) = self.get(node).cloned() else {
            return node;
        };
        let id = self.add_node(&source.name, parent, source.layout, source.size);
        if let Some(n) = self.get_mut(id) {
            n.visible = source.visible;
            n.opacity = source.opacity;
        }
        for child in source.children {
            self.clone_node(child, Some(id));
        }
        id
    }

    fn remove_node(&mut self, node: NodeId) {
        let Some(n) = self.get(node) else {
            return;
        };
        let parent = n.parent;
        let children = n.children.clone();
        for child in children {
            self.remove_node(child);
        }
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|c| *c != node);
        }
        if let Some(n) = self.get_mut(node) {
            n.alive = false;
            n.children.clear();
            tracing::trace!("[scene] removed {} ({:?})", n.name, node);
        }
        self.free.push(node.slot);
        self.touch();
    }

    fn lock_layout(&mut self) {
        self.lock_depth += 1;
    }

    fn unlock_layout(&mut self) {
        if self.lock_depth == 0 {
            tracing::warn!("[scene] unlock_layout without matching lock");
            return;
        }
        self.lock_depth -= 1;
        if self.lock_depth == 0 && self.dirty {
            self.dirty = false;
            self.layout_passes += 1;
            tracing::trace!("[scene] layout pass {}", self.layout_passes);
        }
    }

    fn viewport_transform(&self) -> Affine {
        self.viewport
    }
}
