//! Time grid: one line per interval with an `m:ss` label underneath.

use clipline_timeline_model::viewport::TimelineViewport;

use crate::scene::{NodeKind, Scene, SceneNode};

/// Height reserved for labels at the bottom of the widget.
pub const LABEL_HEIGHT_PX: f64 = 15.0;

/// Format whole seconds as `m:ss`.
pub fn format_timestamp(secs: f64) -> String {
    let minutes = (secs / 60.0).floor();
    let seconds = (secs - minutes * 60.0).round();
    format!("{minutes:.0}:{seconds:02.0}")
}

/// Add grid lines and labels for the whole timeline. Returns the number of
/// grid lines created.
pub fn build_time_grid(scene: &mut Scene, viewport: &TimelineViewport) -> usize {
    let interval = viewport.tuning().marker_interval_secs;
    let steps = (viewport.seconds_in_timeline() / interval).floor() as usize;
    let line_height = (viewport.height_px() - LABEL_HEIGHT_PX).max(0.0);

    for step in 0..=steps {
        let secs = step as f64 * interval;
        let x = viewport.seconds_to_scene(secs);

        let mut line = SceneNode::new(NodeKind::TimeMarker, x, 0.0, 1.0, line_height).passive();
        line.scale_x = viewport.counter_scale();
        scene.add(line);

        let mut label = SceneNode::new(
            NodeKind::TimeLabel,
            x,
            viewport.height_px() - LABEL_HEIGHT_PX,
            0.0,
            LABEL_HEIGHT_PX,
        )
        .passive()
        .detail()
        .with_text(format_timestamp(secs));
        label.scale_x = viewport.counter_scale();
        label.visible = viewport.detail_visible();
        scene.add(label);
    }

    steps + 1
}
