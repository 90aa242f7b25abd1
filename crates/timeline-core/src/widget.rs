//! The timeline widget facade.
//!
//! Owns the viewport, the scene and the drag state, and routes pointer,
//! wheel and resize events through them. Nothing here draws; a renderer
//! reads [`TimelineWidget::scene`] together with the viewport transform.

use std::collections::HashMap;
use std::path::Path;

use clipline_common::error::ClipResult;
use clipline_timeline_model::event::{PointerEvent, TimelineEvent, WheelEvent};
use clipline_timeline_model::selection::{SelectionRange, SelectionSink};
use clipline_timeline_model::viewport::{TimelineTuning, TimelineViewport};

use crate::detail::apply_scale_layout;
use crate::grid::build_time_grid;
use crate::marker::{transition, DragState, MarkerEffect, MarkerInput, MarkerSpan};
use crate::playhead::Playhead;
use crate::scene::{NodeId, NodeKind, ResizeTool, Scene, SceneNode};
use crate::thumbnails::{ThumbnailLoader, ThumbnailOutcome};

/// Vertical placement of the selection marker, as fractions of the height.
const CLIP_MARKER_TOP: f64 = 0.1;
const CLIP_MARKER_HEIGHT: f64 = 0.5;

/// Thumbnail height as a fraction of the widget height.
const THUMBNAIL_HEIGHT: f64 = 0.7;

/// Called with the new playback position on click-to-seek.
pub type SeekCallback = Box<dyn FnMut(f64)>;

/// Which thumbnails were applied and which failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThumbnailReport {
    pub loaded: Vec<u32>,
    pub failed: Vec<u32>,
}

#[derive(Debug)]
struct ClipMarker {
    node: NodeId,
    tool: ResizeTool,
}

#[derive(Debug)]
struct MountedScene {
    scene: Scene,
    playhead: Playhead,
    clip_marker: Option<ClipMarker>,
    thumbnails: HashMap<u32, NodeId>,
}

pub struct TimelineWidget {
    viewport: TimelineViewport,
    drag: DragState,
    on_seek: SeekCallback,
    mounted: Option<MountedScene>,
    loader: Option<ThumbnailLoader>,
}

impl TimelineWidget {
    /// Create a widget `width_px` x `height_px` showing `seconds_in_timeline`
    /// seconds of video. Call [`mount`](Self::mount) before sending events.
    pub fn new(
        width_px: f64,
        height_px: f64,
        seconds_in_timeline: f64,
        on_seek: impl FnMut(f64) + 'static,
    ) -> ClipResult<Self> {
        Self::with_tuning(
            width_px,
            height_px,
            seconds_in_timeline,
            TimelineTuning::default(),
            on_seek,
        )
    }

    pub fn with_tuning(
        width_px: f64,
        height_px: f64,
        seconds_in_timeline: f64,
        tuning: TimelineTuning,
        on_seek: impl FnMut(f64) + 'static,
    ) -> ClipResult<Self> {
        let viewport =
            TimelineViewport::with_tuning(width_px, height_px, seconds_in_timeline, tuning)?;
        Ok(Self {
            viewport,
            drag: DragState::Idle,
            on_seek: Box::new(on_seek),
            mounted: None,
            loader: None,
        })
    }

    pub fn with_thumbnail_loader(mut self, loader: ThumbnailLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Build the scene: time grid, labels and the playhead at 0.
    pub fn mount(&mut self) {
        if self.mounted.is_some() {
            tracing::warn!("Timeline already mounted");
            return;
        }

        let mut scene = Scene::new();
        let grid_lines = build_time_grid(&mut scene, &self.viewport);
        let playhead = Playhead::create(&mut scene, &self.viewport, 0.0);
        apply_scale_layout(&mut scene, &self.viewport);

        tracing::info!(
            width = self.viewport.width_px(),
            height = self.viewport.height_px(),
            seconds = self.viewport.seconds_in_timeline(),
            marker_gap = self.viewport.marker_gap(),
            grid_lines,
            "Timeline mounted"
        );

        self.mounted = Some(MountedScene {
            scene,
            playhead,
            clip_marker: None,
            thumbnails: HashMap::new(),
        });
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn scale(&self) -> f64 {
        self.viewport.scale()
    }

    pub fn marker_gap(&self) -> f64 {
        self.viewport.marker_gap()
    }

    pub fn viewport(&self) -> &TimelineViewport {
        &self.viewport
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.mounted.as_ref().map(|m| &m.scene)
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Playback position, or `None` before mount.
    pub fn current_time(&self) -> Option<f64> {
        self.mounted.as_ref().map(|m| m.playhead.current_secs())
    }

    /// Selection marker geometry in timeline-seconds.
    pub fn clip_marker_span(&self) -> Option<MarkerSpan> {
        let mounted = self.mounted.as_ref()?;
        let node = mounted.scene.get(mounted.clip_marker.as_ref()?.node)?;
        Some(MarkerSpan {
            start_secs: self.viewport.scene_to_seconds(node.x),
            width_secs: self.viewport.scene_to_seconds(node.width),
        })
    }

    /// The widget was resized by its container.
    pub fn resize(&mut self, width_px: f64, height_px: f64) -> ClipResult<()> {
        self.viewport.resize(width_px, height_px)?;

        let Some(mounted) = self.mounted.as_mut() else {
            tracing::debug!(width_px, height_px, "Resize before mount; scene untouched");
            return Ok(());
        };
        if let Some(node) = mounted.scene.get_mut(mounted.playhead.node()) {
            node.height = height_px;
        }
        Ok(())
    }

    /// Move the playhead without invoking the seek callback.
    pub fn update_current_time(&mut self, secs: f64) {
        match self.mounted.as_mut() {
            Some(mounted) => mounted.playhead.seek(&mut mounted.scene, &self.viewport, secs),
            None => tracing::debug!(secs, "Playhead update before mount ignored"),
        }
    }

    /// Reflect a selection edited elsewhere, creating the marker if needed.
    pub fn update_clip_marker(&mut self, start_secs: f64, duration_secs: f64) {
        let Some(mounted) = self.mounted.as_mut() else {
            tracing::debug!(start_secs, duration_secs, "Clip marker update before mount ignored");
            return;
        };
        let span = MarkerSpan {
            start_secs,
            width_secs: duration_secs.max(0.0),
        };
        ensure_clip_marker(mounted, &self.viewport, start_secs);
        place_clip_marker(mounted, &self.viewport, span);
    }

    /// Pointer-anchored zoom. Returns `true` if the scale changed.
    pub fn zoom(&mut self, event: &WheelEvent) -> bool {
        if !self.viewport.zoom(event.delta_y, event.x) {
            return false;
        }
        if let Some(mounted) = self.mounted.as_mut() {
            apply_scale_layout(&mut mounted.scene, &self.viewport);
        }
        tracing::trace!(
            scale = self.viewport.scale(),
            pan = self.viewport.pan_offset(),
            "Zoomed"
        );
        true
    }

    /// Drag the viewport. Returns the applied pan offset.
    pub fn pan_by(&mut self, dx: f64) -> f64 {
        self.viewport.pan_by(dx)
    }

    pub fn pointer_down(&mut self, event: &PointerEvent) {
        let pointer_secs = self.viewport.pixel_to_seconds(event.x);
        self.step(MarkerInput::Press {
            button: event.button,
            target: event.target,
            pointer_secs,
        });
    }

    pub fn pointer_move(&mut self, x: f64) {
        let pointer_secs = self.viewport.pixel_to_seconds(x);
        self.step(MarkerInput::Move { pointer_secs });
    }

    /// Finish a gesture. A committed selection is published to `sink`.
    pub fn pointer_up(&mut self, _event: &PointerEvent, sink: &mut dyn SelectionSink) {
        for range in self.step(MarkerInput::Release) {
            tracing::info!(
                start_secs = range.start_secs,
                end_secs = range.end_secs,
                "Selection committed"
            );
            sink.publish_selection(range);
        }
    }

    pub fn click(&mut self, event: &PointerEvent) {
        let pointer_secs = self.viewport.pixel_to_seconds(event.x);
        self.step(MarkerInput::Click {
            button: event.button,
            pointer_secs,
        });
    }

    /// Route a scripted or recorded event.
    pub fn dispatch(
        &mut self,
        event: &TimelineEvent,
        sink: &mut dyn SelectionSink,
    ) -> ClipResult<()> {
        match *event {
            TimelineEvent::PointerDown { button, x, target } => {
                self.pointer_down(&PointerEvent::new(button, x, target));
            }
            TimelineEvent::PointerUp { button, x, target } => {
                self.pointer_up(&PointerEvent::new(button, x, target), sink);
            }
            TimelineEvent::Click { button, x, target } => {
                self.click(&PointerEvent::new(button, x, target));
            }
            TimelineEvent::PointerMove { x } => self.pointer_move(x),
            TimelineEvent::Wheel { delta_y, x } => {
                self.zoom(&WheelEvent { delta_y, x });
            }
            TimelineEvent::Pan { dx } => {
                self.pan_by(dx);
            }
            TimelineEvent::Resize { width, height } => self.resize(width, height)?,
            TimelineEvent::Seek { time_secs } => self.update_current_time(time_secs),
        }
        Ok(())
    }

    /// Request thumbnails `[created_up_to, upto)` from `directory`.
    /// Returns the number of fetches started.
    pub fn populate_thumbnails(&mut self, directory: &Path, upto: u32) -> usize {
        if self.mounted.is_none() {
            tracing::debug!(upto, "Thumbnail population before mount ignored");
            return 0;
        }
        match self.loader.as_mut() {
            Some(loader) => loader.populate_up_to(directory, upto),
            None => {
                tracing::warn!(upto, "No thumbnail loader configured");
                0
            }
        }
    }

    /// Apply thumbnails that finished loading since the last call.
    pub fn apply_thumbnails(&mut self) -> ThumbnailReport {
        let outcomes = match self.loader.as_mut() {
            Some(loader) => loader.drain_ready(),
            None => return ThumbnailReport::default(),
        };
        self.apply_outcomes(outcomes)
    }

    /// Wait for every pending thumbnail and apply it.
    pub async fn settle_thumbnails(&mut self) -> ThumbnailReport {
        let outcomes = match self.loader.as_mut() {
            Some(loader) => loader.wait_idle().await,
            None => return ThumbnailReport::default(),
        };
        self.apply_outcomes(outcomes)
    }

    /// Index-to-node map of the thumbnails currently in the scene.
    pub fn thumbnail_nodes(&self) -> Option<&HashMap<u32, NodeId>> {
        self.mounted.as_ref().map(|m| &m.thumbnails)
    }

    fn step(&mut self, input: MarkerInput) -> Vec<SelectionRange> {
        let marker = self.clip_marker_span();
        let Some(mounted) = self.mounted.as_mut() else {
            tracing::debug!(?input, "Pointer input before mount ignored");
            return Vec::new();
        };

        let dead_zone = self.viewport.tuning().drag_dead_zone_secs;
        let (next, effects) = transition(self.drag, input, marker, dead_zone);
        if next != self.drag {
            tracing::trace!(from = ?self.drag, to = ?next, "Drag state changed");
        }
        self.drag = next;

        let mut commits = Vec::new();
        for effect in effects {
            match effect {
                MarkerEffect::CreateMarker { at_secs } => {
                    ensure_clip_marker(mounted, &self.viewport, at_secs);
                }
                MarkerEffect::Place(span) => place_clip_marker(mounted, &self.viewport, span),
                MarkerEffect::ResizeTo { pointer_secs } => {
                    resize_clip_marker(mounted, &self.viewport, pointer_secs);
                }
                MarkerEffect::Commit(range) => commits.push(range),
                MarkerEffect::Seek(secs) => {
                    mounted.playhead.seek(&mut mounted.scene, &self.viewport, secs);
                    (self.on_seek)(secs);
                }
            }
        }
        commits
    }

    fn apply_outcomes(&mut self, outcomes: Vec<ThumbnailOutcome>) -> ThumbnailReport {
        let mut report = ThumbnailReport::default();
        let Some(mounted) = self.mounted.as_mut() else {
            tracing::debug!(count = outcomes.len(), "Thumbnails arrived before mount");
            return report;
        };

        let gap = self.viewport.marker_gap();
        let height = self.viewport.height_px() * THUMBNAIL_HEIGHT;
        let visible = self.viewport.detail_visible();

        for outcome in outcomes {
            let image = match outcome.result {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(index = outcome.index, error = %e, "Thumbnail failed to load");
                    report.failed.push(outcome.index);
                    continue;
                }
            };

            let x = (f64::from(image.index) - 2.0) * gap;
            let mut node = SceneNode::new(
                NodeKind::Thumbnail { index: image.index },
                x,
                0.0,
                gap,
                height,
            )
            .passive()
            .detail()
            .with_source(image.uri);
            node.visible = visible;

            match mounted.thumbnails.get(&image.index) {
                Some(&id) => {
                    if let Some(existing) = mounted.scene.get_mut(id) {
                        *existing = node;
                    }
                }
                None => {
                    let id = mounted.scene.add_to_bottom(node);
                    mounted.thumbnails.insert(image.index, id);
                }
            }
            report.loaded.push(image.index);
        }

        report.loaded.sort_unstable();
        report.failed.sort_unstable();
        report
    }
}

impl std::fmt::Debug for TimelineWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineWidget")
            .field("viewport", &self.viewport)
            .field("drag", &self.drag)
            .field("mounted", &self.mounted.is_some())
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

fn ensure_clip_marker(mounted: &mut MountedScene, viewport: &TimelineViewport, at_secs: f64) {
    if mounted.clip_marker.is_some() {
        return;
    }

    let height = viewport.height_px();
    let node = SceneNode::new(
        NodeKind::ClipMarker,
        viewport.seconds_to_scene(at_secs),
        height * CLIP_MARKER_TOP,
        0.0,
        height * CLIP_MARKER_HEIGHT,
    );
    let node = mounted.scene.add(node);
    match ResizeTool::attach(&mut mounted.scene, node) {
        Some(tool) => mounted.clip_marker = Some(ClipMarker { node, tool }),
        None => tracing::warn!(%node, "Could not attach resize tool to clip marker"),
    }
}

fn place_clip_marker(mounted: &mut MountedScene, viewport: &TimelineViewport, span: MarkerSpan) {
    let Some(marker) = mounted.clip_marker.as_ref() else {
        return;
    };
    if let Some(node) = mounted.scene.get_mut(marker.node) {
        node.x = viewport.seconds_to_scene(span.start_secs);
        node.width = viewport.seconds_to_scene(span.width_secs);
    }
    marker.tool.sync(&mut mounted.scene);
}

fn resize_clip_marker(mounted: &mut MountedScene, viewport: &TimelineViewport, pointer_secs: f64) {
    let Some(marker) = mounted.clip_marker.as_ref() else {
        return;
    };
    let Some(start_px) = mounted.scene.get(marker.node).map(|node| node.x) else {
        return;
    };
    let box_width = viewport.seconds_to_pixel(pointer_secs) - viewport.screen_x(start_px);
    marker
        .tool
        .bound_box(&mut mounted.scene, box_width, viewport.scale());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipline_timeline_model::event::{HitTarget, PointerButton};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn widget() -> (TimelineWidget, Rc<RefCell<Vec<f64>>>) {
        let seeks = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&seeks);
        let mut widget = TimelineWidget::new(1000.0, 100.0, 100.0, move |t| {
            recorded.borrow_mut().push(t)
        })
        .unwrap();
        widget.mount();
        (widget, seeks)
    }

    #[test]
    fn test_mount_builds_grid_and_playhead() {
        let (widget, _) = widget();
        let scene = widget.scene().unwrap();
        assert_eq!(scene.count(|n| n.kind == NodeKind::TimeMarker), 101);
        assert_eq!(scene.count(|n| n.kind == NodeKind::Playhead), 1);
        assert_eq!(widget.current_time(), Some(0.0));
        assert_eq!(widget.marker_gap(), 10.0);
    }

    #[test]
    fn test_drag_commits_selection() {
        let (mut widget, seeks) = widget();
        let mut selection: Option<SelectionRange> = None;

        widget.pointer_down(&PointerEvent::primary(100.0));
        widget.pointer_move(300.0);
        widget.pointer_up(&PointerEvent::primary(300.0), &mut selection);
        widget.click(&PointerEvent::primary(300.0));

        assert_eq!(selection, Some(SelectionRange::new(10.0, 30.0)));
        assert!(seeks.borrow().is_empty());
        assert_eq!(widget.drag_state(), DragState::Idle);

        let span = widget.clip_marker_span().unwrap();
        assert_eq!(span.start_secs, 10.0);
        assert_eq!(span.width_secs, 20.0);
    }

    #[test]
    fn test_click_seeks_and_moves_playhead() {
        let (mut widget, seeks) = widget();
        let mut selection: Option<SelectionRange> = None;

        widget.pointer_down(&PointerEvent::primary(425.0));
        widget.pointer_up(&PointerEvent::primary(425.0), &mut selection);
        widget.click(&PointerEvent::primary(425.0));

        assert_eq!(*seeks.borrow(), vec![42.5]);
        assert_eq!(widget.current_time(), Some(42.5));
        assert!(selection.is_none());
    }

    #[test]
    fn test_tiny_drag_does_not_commit() {
        let (mut widget, seeks) = widget();
        let mut selection = Some(SelectionRange::new(1.0, 2.0));

        widget.pointer_down(&PointerEvent::primary(100.0));
        widget.pointer_move(100.5);
        widget.pointer_up(&PointerEvent::primary(100.5), &mut selection);

        assert_eq!(selection, Some(SelectionRange::new(1.0, 2.0)));
        assert_eq!(widget.clip_marker_span().unwrap().width_secs, 0.0);

        widget.click(&PointerEvent::primary(100.5));
        assert_eq!(seeks.borrow().len(), 1);
    }

    #[test]
    fn test_move_existing_marker() {
        let (mut widget, _) = widget();
        let mut selection: Option<SelectionRange> = None;
        widget.update_clip_marker(10.0, 5.0);

        let grab = PointerEvent::new(PointerButton::Primary, 120.0, HitTarget::ClipMarker);
        widget.pointer_down(&grab);
        widget.pointer_move(220.0);
        widget.pointer_up(&grab, &mut selection);

        assert_eq!(selection, Some(SelectionRange::new(20.0, 25.0)));
    }

    #[test]
    fn test_hover_after_release_keeps_committed_marker() {
        let (mut widget, seeks) = widget();
        let mut selection: Option<SelectionRange> = None;

        widget.pointer_down(&PointerEvent::primary(100.0));
        widget.pointer_move(300.0);
        widget.pointer_up(&PointerEvent::primary(300.0), &mut selection);
        widget.pointer_move(600.0);

        assert_eq!(selection, Some(SelectionRange::new(10.0, 30.0)));
        let span = widget.clip_marker_span().unwrap();
        assert_eq!(span.start_secs, 10.0);
        assert_eq!(span.end_secs(), 30.0);

        widget.click(&PointerEvent::primary(600.0));
        assert!(seeks.borrow().is_empty());
        assert_eq!(widget.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_hover_after_body_move_without_click() {
        let (mut widget, _) = widget();
        let mut selection: Option<SelectionRange> = None;
        widget.update_clip_marker(10.0, 5.0);

        let grab = PointerEvent::new(PointerButton::Primary, 120.0, HitTarget::ClipMarker);
        widget.pointer_down(&grab);
        widget.pointer_move(220.0);
        widget.pointer_up(&grab, &mut selection);
        widget.pointer_move(700.0);

        assert_eq!(selection, Some(SelectionRange::new(20.0, 25.0)));
        let span = widget.clip_marker_span().unwrap();
        assert_eq!(span.start_secs, 20.0);
        assert_eq!(span.end_secs(), 25.0);
        assert_eq!(widget.drag_state(), DragState::Released);
    }

    #[test]
    fn test_resize_marker_through_handle() {
        let (mut widget, _) = widget();
        let mut selection: Option<SelectionRange> = None;
        widget.update_clip_marker(10.0, 5.0);
        for _ in 0..3 {
            widget.zoom(&WheelEvent {
                delta_y: -1.0,
                x: Some(0.0),
            });
        }

        let handle = PointerEvent::new(PointerButton::Primary, 0.0, HitTarget::ResizeHandle);
        widget.pointer_down(&handle);
        let x = widget.viewport().seconds_to_pixel(30.0);
        widget.pointer_move(x);
        widget.pointer_up(&handle, &mut selection);

        let range = selection.unwrap();
        assert!((range.start_secs - 10.0).abs() < 1e-9);
        assert!((range.end_secs - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_events_before_mount_are_ignored() {
        let mut widget = TimelineWidget::new(1000.0, 100.0, 100.0, |_| {}).unwrap();
        let mut selection: Option<SelectionRange> = None;

        widget.pointer_down(&PointerEvent::primary(100.0));
        widget.pointer_move(300.0);
        widget.pointer_up(&PointerEvent::primary(300.0), &mut selection);
        widget.update_current_time(5.0);

        assert!(selection.is_none());
        assert!(widget.current_time().is_none());
        assert_eq!(widget.drag_state(), DragState::Idle);
        assert!(widget.resize(800.0, 90.0).is_ok());
    }

    #[test]
    fn test_zoom_toggles_label_visibility() {
        let (mut widget, _) = widget();
        let labels_visible = |w: &TimelineWidget| {
            w.scene()
                .unwrap()
                .count(|n| n.kind == NodeKind::TimeLabel && n.visible)
        };
        assert_eq!(labels_visible(&widget), 0);

        while widget.scale() <= 80.0 {
            assert!(widget.zoom(&WheelEvent {
                delta_y: -1.0,
                x: Some(500.0),
            }));
        }
        assert_eq!(labels_visible(&widget), 101);
    }

    #[test]
    fn test_dispatch_script() {
        let (mut widget, _) = widget();
        let mut selection: Option<SelectionRange> = None;
        let script = r#"
{"type":"pointer_down","button":"primary","x":500.0}
{"type":"pointer_move","x":700.0}
{"type":"pointer_up","button":"primary","x":700.0}
{"type":"click","button":"primary","x":700.0}
{"type":"seek","time_secs":12.0}
"#;
        for event in clipline_timeline_model::event::parse_events(script).unwrap() {
            widget.dispatch(&event, &mut selection).unwrap();
        }
        assert_eq!(selection, Some(SelectionRange::new(50.0, 70.0)));
        assert_eq!(widget.current_time(), Some(12.0));
    }
}
