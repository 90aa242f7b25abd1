//! Clipline Timeline Model
//!
//! Defines the core data contracts shared by the timeline widget and the
//! encoding estimate graph:
//! - **Viewport:** Scale/pan state and the pixel <-> timeline-seconds transform
//! - **Events:** Pointer, click, wheel and pan events fed to the widget
//! - **Selection:** The committed clip range and the sink it is published to
//! - **Encoding:** Leaf encoding parameters, output formats, derived estimates
//! - **Units:** Decimal file-size and bitrate conversions
//!
//! Timeline-seconds are measured in seconds of source video and are
//! independent of the current zoom.

pub mod encoding;
pub mod event;
pub mod selection;
pub mod units;
pub mod viewport;

pub use encoding::*;
pub use event::*;
pub use selection::*;
pub use units::*;
pub use viewport::*;
