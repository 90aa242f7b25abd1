//! Clipline Timeline Core — the headless timeline widget
//!
//! Everything the timeline canvas does, minus the drawing:
//! - **Scene:** Arena of positioned nodes a renderer can draw as-is
//! - **Marker:** Pointer state machine that draws, moves and resizes the
//!   selection marker and commits it as a clip range
//! - **Playhead:** Current playback position
//! - **Detail:** Zoom-dependent counter-scaling and label visibility
//! - **Thumbnails:** Append-only, asynchronously populated preview strip
//!
//! Events are handled one at a time on the caller's thread. Thumbnail
//! fetches are the only asynchronous work; their results are applied back
//! on the caller's thread.

pub mod detail;
pub mod grid;
pub mod marker;
pub mod playhead;
pub mod scene;
pub mod thumbnails;
pub mod widget;

pub use marker::{DragState, MarkerSpan};
pub use playhead::Playhead;
pub use scene::{NodeId, NodeKind, Scene, SceneNode};
pub use thumbnails::{FsThumbnailSource, ThumbnailLoader, ThumbnailSource};
pub use widget::{ThumbnailReport, TimelineWidget};
