//! Playback position marker.

use clipline_timeline_model::viewport::TimelineViewport;

use crate::scene::{NodeId, NodeKind, Scene, SceneNode};

/// The red line showing the current playback position.
///
/// Independent of the selection: seeking never touches the clip marker.
#[derive(Debug, Clone)]
pub struct Playhead {
    node: NodeId,
    current_secs: f64,
}

impl Playhead {
    /// Add the playhead node to `scene` at `current_secs`.
    pub fn create(scene: &mut Scene, viewport: &TimelineViewport, current_secs: f64) -> Self {
        let mut node = SceneNode::new(
            NodeKind::Playhead,
            viewport.seconds_to_scene(current_secs),
            0.0,
            1.0,
            viewport.height_px(),
        )
        .passive();
        node.scale_x = viewport.counter_scale();

        Self {
            node: scene.add(node),
            current_secs,
        }
    }

    /// Move the playhead to `secs`. No clamping: callers pass valid times.
    pub fn seek(&mut self, scene: &mut Scene, viewport: &TimelineViewport, secs: f64) {
        if let Some(node) = scene.get_mut(self.node) {
            node.x = viewport.seconds_to_scene(secs);
        }
        self.current_secs = secs;
    }

    pub fn current_secs(&self) -> f64 {
        self.current_secs
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}
