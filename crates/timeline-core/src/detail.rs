//! Zoom-dependent presentation: counter-scaling and detail visibility.

use clipline_timeline_model::viewport::TimelineViewport;

use crate::scene::Scene;

/// Outcome of a layout pass, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutPass {
    pub counter_scaled: usize,
    pub details_shown: usize,
}

/// Re-apply scale-dependent properties after the viewport scale changed.
///
/// Grid lines, labels and the playhead get a local x-scale of `1 / scale`
/// so they keep their on-screen width. Detail nodes are shown only above the
/// detail cutoff.
pub fn apply_scale_layout(scene: &mut Scene, viewport: &TimelineViewport) -> LayoutPass {
    let counter_scale = viewport.counter_scale();
    let show_details = viewport.detail_visible();
    let mut pass = LayoutPass::default();

    for node in scene.nodes_mut() {
        if node.kind.counter_scaled() {
            node.scale_x = counter_scale;
            pass.counter_scaled += 1;
        }
        if node.detail {
            node.visible = show_details;
            if show_details {
                pass.details_shown += 1;
            }
        }
    }

    tracing::trace!(
        scale = viewport.scale(),
        counter_scaled = pass.counter_scaled,
        details_shown = pass.details_shown,
        "Applied scale layout"
    );
    pass
}
