//! Viewport transform for the timeline canvas.
//!
//! Three coordinate spaces are involved:
//! - **screen px:** pointer position relative to the widget's left edge
//! - **scene px:** timeline position at scale 1 (`seconds * marker_gap`)
//! - **timeline-seconds:** seconds of source video
//!
//! `screen = scene * scale + pan_offset`. Only the horizontal axis is
//! scaled; the vertical axis is fixed.

use clipline_common::config::TimelineDefaults;
use clipline_common::error::{ClipError, ClipResult};
use serde::{Deserialize, Serialize};

/// Multiplicative zoom step per wheel notch.
pub const ZOOM_SPEED: f64 = 1.1;

/// Pixels the timeline may be dragged past either end.
pub const SCROLL_LEEWAY_PX: f64 = 50.0;

/// Scale above which detail nodes become visible.
pub const DETAIL_CUTOFF_SCALE: f64 = 80.0;

/// Minimum drag distance (seconds) before a selection is drawn.
pub const DRAG_DEAD_ZONE_SECS: f64 = 0.1;

/// Tunable constants for zoom, pan and drag behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineTuning {
    pub zoom_speed: f64,
    pub scroll_leeway_px: f64,
    pub detail_cutoff_scale: f64,
    pub drag_dead_zone_secs: f64,
    /// Spacing of the time grid (seconds).
    pub marker_interval_secs: f64,
}

impl Default for TimelineTuning {
    fn default() -> Self {
        Self {
            zoom_speed: ZOOM_SPEED,
            scroll_leeway_px: SCROLL_LEEWAY_PX,
            detail_cutoff_scale: DETAIL_CUTOFF_SCALE,
            drag_dead_zone_secs: DRAG_DEAD_ZONE_SECS,
            marker_interval_secs: 1.0,
        }
    }
}

impl From<&TimelineDefaults> for TimelineTuning {
    fn from(defaults: &TimelineDefaults) -> Self {
        Self {
            zoom_speed: defaults.zoom_speed,
            scroll_leeway_px: defaults.scroll_leeway_px,
            detail_cutoff_scale: defaults.detail_cutoff_scale,
            drag_dead_zone_secs: defaults.drag_dead_zone_secs,
            marker_interval_secs: defaults.marker_interval_secs,
        }
    }
}

/// Zoom direction derived from a wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Scrolling up (negative delta) zooms in.
    pub fn from_wheel_delta(delta_y: f64) -> Self {
        if delta_y < 0.0 {
            Self::In
        } else {
            Self::Out
        }
    }
}

/// Scale and pan state of the timeline canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineViewport {
    width_px: f64,
    height_px: f64,
    seconds_in_timeline: f64,
    /// Pixels per second at scale 1. Fixed at construction.
    marker_gap_px: f64,
    scale: f64,
    pan_offset_px: f64,
    tuning: TimelineTuning,
}

impl TimelineViewport {
    /// Create a fully zoomed-out viewport with default tuning.
    pub fn new(width_px: f64, height_px: f64, seconds_in_timeline: f64) -> ClipResult<Self> {
        Self::with_tuning(
            width_px,
            height_px,
            seconds_in_timeline,
            TimelineTuning::default(),
        )
    }

    /// Create a fully zoomed-out viewport with explicit tuning.
    pub fn with_tuning(
        width_px: f64,
        height_px: f64,
        seconds_in_timeline: f64,
        tuning: TimelineTuning,
    ) -> ClipResult<Self> {
        check_positive("width", width_px)?;
        check_positive("height", height_px)?;
        check_positive("seconds in timeline", seconds_in_timeline)?;
        if !(tuning.zoom_speed.is_finite() && tuning.zoom_speed > 1.0) {
            return Err(ClipError::viewport(format!(
                "zoom speed must be greater than 1, got {}",
                tuning.zoom_speed
            )));
        }
        check_positive("time marker interval", tuning.marker_interval_secs)?;

        Ok(Self {
            width_px,
            height_px,
            seconds_in_timeline,
            marker_gap_px: width_px / seconds_in_timeline,
            scale: 1.0,
            pan_offset_px: 0.0,
            tuning,
        })
    }

    pub fn width_px(&self) -> f64 {
        self.width_px
    }

    pub fn height_px(&self) -> f64 {
        self.height_px
    }

    pub fn seconds_in_timeline(&self) -> f64 {
        self.seconds_in_timeline
    }

    /// Pixels per second at scale 1.
    pub fn marker_gap(&self) -> f64 {
        self.marker_gap_px
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pan_offset(&self) -> f64 {
        self.pan_offset_px
    }

    pub fn tuning(&self) -> &TimelineTuning {
        &self.tuning
    }

    /// Undo pan and scale: screen px -> scene px.
    pub fn scene_x(&self, pointer_px: f64) -> f64 {
        (pointer_px - self.pan_offset_px) / self.scale
    }

    /// Apply scale and pan: scene px -> screen px.
    pub fn screen_x(&self, scene_px: f64) -> f64 {
        scene_px * self.scale + self.pan_offset_px
    }

    /// Screen px -> timeline-seconds.
    pub fn pixel_to_seconds(&self, pointer_px: f64) -> f64 {
        self.scene_x(pointer_px) / self.marker_gap_px
    }

    /// Timeline-seconds -> screen px.
    pub fn seconds_to_pixel(&self, seconds: f64) -> f64 {
        self.screen_x(self.seconds_to_scene(seconds))
    }

    /// Timeline-seconds -> scene px.
    pub fn seconds_to_scene(&self, seconds: f64) -> f64 {
        seconds * self.marker_gap_px
    }

    /// Scene px -> timeline-seconds.
    pub fn scene_to_seconds(&self, scene_px: f64) -> f64 {
        scene_px / self.marker_gap_px
    }

    /// Handle a wheel event. Returns `true` if the scale changed.
    ///
    /// Aborts when the pointer position is unknown or when the new scale
    /// would be `<= 1`.
    pub fn zoom(&mut self, delta_y: f64, pointer_px: Option<f64>) -> bool {
        match pointer_px {
            Some(pointer_px) => {
                self.zoom_towards(ZoomDirection::from_wheel_delta(delta_y), pointer_px)
            }
            None => false,
        }
    }

    /// Zoom one step, keeping the timeline-second under `pointer_px` fixed
    /// on screen.
    pub fn zoom_towards(&mut self, direction: ZoomDirection, pointer_px: f64) -> bool {
        let old_scale = self.scale;
        let new_scale = match direction {
            ZoomDirection::In => old_scale * self.tuning.zoom_speed,
            ZoomDirection::Out => old_scale / self.tuning.zoom_speed,
        };

        if new_scale <= 1.0 {
            return false;
        }

        let pointer_scene = self.scene_x(pointer_px);
        self.scale = new_scale;
        self.pan_offset_px = pointer_px - pointer_scene * new_scale;
        true
    }

    /// Pan limits `(right_bound, left_bound)` at the current scale.
    pub fn pan_bounds(&self) -> (f64, f64) {
        let right_bound = -(self.seconds_in_timeline * self.marker_gap_px * self.scale)
            + self.width_px
            - self.tuning.scroll_leeway_px;
        (right_bound, self.tuning.scroll_leeway_px)
    }

    /// Clamp a candidate pan offset into the allowed range.
    ///
    /// The left bound wins when the bounds cross.
    pub fn clamp_pan(&self, x: f64) -> f64 {
        let (right_bound, left_bound) = self.pan_bounds();
        x.max(right_bound).min(left_bound)
    }

    /// Set the pan offset (clamped). Returns the applied offset.
    pub fn pan_to(&mut self, x: f64) -> f64 {
        self.pan_offset_px = self.clamp_pan(x);
        self.pan_offset_px
    }

    /// Drag the viewport by `dx` screen px (clamped). Returns the applied offset.
    pub fn pan_by(&mut self, dx: f64) -> f64 {
        self.pan_to(self.pan_offset_px + dx)
    }

    /// Update the widget dimensions. The pixels-per-second of the scene is
    /// left untouched.
    pub fn resize(&mut self, width_px: f64, height_px: f64) -> ClipResult<()> {
        check_positive("width", width_px)?;
        check_positive("height", height_px)?;
        self.width_px = width_px;
        self.height_px = height_px;
        Ok(())
    }

    /// Local x-scale for nodes that must keep a constant on-screen size.
    pub fn counter_scale(&self) -> f64 {
        1.0 / self.scale
    }

    /// Whether detail nodes are shown at the current scale.
    pub fn detail_visible(&self) -> bool {
        self.scale > self.tuning.detail_cutoff_scale
    }
}

fn check_positive(what: &str, value: f64) -> ClipResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ClipError::viewport(format!(
            "{what} must be a positive number, got {value}"
        )))
    }
}
