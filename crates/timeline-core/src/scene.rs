//! Arena of scene nodes making up the timeline canvas.
//!
//! The scene is a single group: it owns every node, addresses them by
//! [`NodeId`] and keeps a back-to-front z-order. Nodes are never removed;
//! the timeline only grows. Positions are scene px (timeline position at
//! scale 1), so a renderer draws node `x` at `x * scale + pan`.

use std::fmt;

/// Stable identifier of a node in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role of a node in the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Vertical grid line at a whole interval.
    TimeMarker,
    /// `m:ss` label under a grid line.
    TimeLabel,
    Playhead,
    /// Body of the selection rectangle.
    ClipMarker,
    /// Right-edge handle of the resize tool.
    ResizeHandle,
    /// Preview image for one second of video.
    Thumbnail { index: u32 },
}

impl NodeKind {
    /// Whether the node keeps a constant on-screen width under zoom.
    ///
    /// The selection and its handle, and thumbnails, stretch with the
    /// timeline instead.
    pub fn counter_scaled(self) -> bool {
        !matches!(
            self,
            NodeKind::ClipMarker | NodeKind::ResizeHandle | NodeKind::Thumbnail { .. }
        )
    }
}

/// One drawable element.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Local horizontal scale applied on top of the scene scale.
    pub scale_x: f64,
    pub visible: bool,
    /// Whether the node takes part in hit testing.
    pub listening: bool,
    /// Detail nodes are only shown when zoomed in far enough.
    pub detail: bool,
    pub text: Option<String>,
    /// Image URI of thumbnail nodes.
    pub source: Option<String>,
}

impl SceneNode {
    pub fn new(kind: NodeKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            kind,
            x,
            y,
            width,
            height,
            scale_x: 1.0,
            visible: true,
            listening: true,
            detail: false,
            text: None,
            source: None,
        }
    }

    /// Exclude the node from hit testing.
    pub fn passive(mut self) -> Self {
        self.listening = false;
        self
    }

    /// Tag the node as detail; it starts hidden.
    pub fn detail(mut self) -> Self {
        self.detail = true;
        self.visible = false;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_source(mut self, uri: impl Into<String>) -> Self {
        self.source = Some(uri.into());
        self
    }

    /// Right edge in scene px.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// The timeline group: node arena plus z-order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    /// Back to front.
    order: Vec<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node on top of everything else.
    pub fn add(&mut self, node: SceneNode) -> NodeId {
        let id = self.alloc(node);
        self.order.push(id);
        id
    }

    /// Add a node below everything else.
    pub fn add_to_bottom(&mut self, node: SceneNode) -> NodeId {
        let id = self.alloc(node);
        self.order.insert(0, id);
        id
    }

    fn alloc(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.index())
    }

    /// Position of `id` in the z-order (0 = bottom).
    pub fn z_index(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == id)
    }

    /// Move `id` to the top of the z-order.
    pub fn raise_to_top(&mut self, id: NodeId) {
        if let Some(pos) = self.z_index(id) {
            self.order.remove(pos);
            self.order.push(id);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in draw order (back to front).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> + '_ {
        self.order.iter().map(move |id| (*id, &self.nodes[id.index()]))
    }

    /// Mutable access to every node, in no particular order.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut SceneNode> + '_ {
        self.nodes.iter_mut()
    }

    /// Number of nodes matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&SceneNode) -> bool) -> usize {
        self.nodes.iter().filter(|node| predicate(node)).count()
    }
}

/// Transform tool bound to a target node.
///
/// Holds the target by id only; the scene owns both nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeTool {
    target: NodeId,
    handle: NodeId,
}

/// Width of the resize handle (scene px at scale 1).
pub const RESIZE_HANDLE_WIDTH_PX: f64 = 8.0;

impl ResizeTool {
    /// Create the handle node on top of `target`.
    pub fn attach(scene: &mut Scene, target: NodeId) -> Option<Self> {
        let node = scene.get(target)?;
        let handle = SceneNode::new(
            NodeKind::ResizeHandle,
            node.right(),
            node.y,
            RESIZE_HANDLE_WIDTH_PX,
            node.height,
        );
        let handle = scene.add(handle);
        Some(Self { target, handle })
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn handle(&self) -> NodeId {
        self.handle
    }

    /// Live bounding-box callback: the on-screen box is `box_width_px` wide
    /// at the current `scale`. Returns the target's new width in scene px.
    pub fn bound_box(&self, scene: &mut Scene, box_width_px: f64, scale: f64) -> Option<f64> {
        let width = (box_width_px / scale).max(0.0);
        scene.get_mut(self.target)?.width = width;
        self.sync(scene);
        Some(width)
    }

    /// Keep the handle glued to the target's right edge.
    pub fn sync(&self, scene: &mut Scene) {
        let Some(target) = scene.get(self.target) else {
            return;
        };
        let (right, y, height) = (target.right(), target.y, target.height);
        if let Some(handle) = scene.get_mut(self.handle) {
            handle.x = right;
            handle.y = y;
            handle.height = height;
        }
    }
}
