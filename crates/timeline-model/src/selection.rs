//! Committed clip selection and the sink it is published to.

use serde::{Deserialize, Serialize};

/// A `[start, end)` sub-interval of the source video, in timeline-seconds.
///
/// `start_secs <= end_secs` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSelectionRange")]
pub struct SelectionRange {
    pub start_secs: f64,
    pub end_secs: f64,
}

/// Wire form; endpoints are ordered on the way in.
#[derive(Deserialize)]
struct RawSelectionRange {
    start_secs: f64,
    end_secs: f64,
}

impl From<RawSelectionRange> for SelectionRange {
    fn from(raw: RawSelectionRange) -> Self {
        Self::new(raw.start_secs, raw.end_secs)
    }
}

impl SelectionRange {
    /// Create a range; the endpoints are swapped if given in reverse.
    pub fn new(start_secs: f64, end_secs: f64) -> Self {
        if end_secs < start_secs {
            Self {
                start_secs: end_secs,
                end_secs: start_secs,
            }
        } else {
            Self {
                start_secs,
                end_secs,
            }
        }
    }

    /// Range starting at `start_secs` and lasting `length_secs`.
    pub fn from_start(start_secs: f64, length_secs: f64) -> Self {
        Self::new(start_secs, start_secs + length_secs)
    }

    /// Length in source seconds (before any speed change).
    pub fn length_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    pub fn contains(&self, secs: f64) -> bool {
        secs >= self.start_secs && secs < self.end_secs
    }
}

/// Receiver of committed selections.
///
/// The timeline widget publishes through this trait; the settings side
/// (the encoding estimate graph) implements it.
pub trait SelectionSink {
    /// Replace the current selection.
    fn publish_selection(&mut self, range: SelectionRange);

    /// The currently published selection, if any.
    fn current_selection(&self) -> Option<SelectionRange>;
}

/// Trivial sink that only remembers the last commit.
impl SelectionSink for Option<SelectionRange> {
    fn publish_selection(&mut self, range: SelectionRange) {
        *self = Some(range);
    }

    fn current_selection(&self) -> Option<SelectionRange> {
        *self
    }
}
