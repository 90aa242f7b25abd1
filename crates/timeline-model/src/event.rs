//! Input events consumed by the timeline widget.
//!
//! Positions are screen px relative to the widget's left edge; the widget
//! converts them to timeline-seconds through its viewport. Event scripts are
//! stored as JSONL (one event per line, `#` comment lines allowed) so that
//! interactions can be replayed deterministically.

use serde::{Deserialize, Serialize};

/// Pointer button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    /// Usually the left button. The only button that edits the selection.
    Primary,
    /// Wheel button.
    Auxiliary,
    /// Usually the right button. Drags the viewport.
    Secondary,
}

impl PointerButton {
    /// Map a DOM-style button index (0 = primary, 1 = auxiliary, 2 = secondary).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Primary),
            1 => Some(Self::Auxiliary),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }

    pub fn is_primary(self) -> bool {
        self == Self::Primary
    }
}

/// What the pointer was over when the event fired, as reported by the
/// rendering surface's hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitTarget {
    /// Empty track or any non-listening node.
    #[default]
    Track,
    /// Body of the selection marker.
    ClipMarker,
    /// Right-edge resize handle of the selection marker.
    ResizeHandle,
}

/// A pointer press, move, release or click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub button: PointerButton,
    /// Pointer x in screen px.
    pub x: f64,
    pub target: HitTarget,
}

impl PointerEvent {
    pub fn new(button: PointerButton, x: f64, target: HitTarget) -> Self {
        Self { button, x, target }
    }

    /// Primary-button event over the empty track.
    pub fn primary(x: f64) -> Self {
        Self::new(PointerButton::Primary, x, HitTarget::Track)
    }
}

/// Scroll wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    /// Vertical scroll delta. Negative scrolls up.
    pub delta_y: f64,
    /// Pointer x in screen px, if the surface could resolve it.
    pub x: Option<f64>,
}

/// One step of a recorded or scripted widget interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineEvent {
    PointerDown {
        button: PointerButton,
        x: f64,
        #[serde(default)]
        target: HitTarget,
    },
    PointerMove {
        x: f64,
    },
    PointerUp {
        button: PointerButton,
        x: f64,
        #[serde(default)]
        target: HitTarget,
    },
    Click {
        button: PointerButton,
        x: f64,
        #[serde(default)]
        target: HitTarget,
    },
    Wheel {
        delta_y: f64,
        x: Option<f64>,
    },
    /// Viewport drag by `dx` screen px.
    Pan {
        dx: f64,
    },
    Resize {
        width: f64,
        height: f64,
    },
    /// External playhead update (e.g., from the video player).
    Seek {
        time_secs: f64,
    },
}

impl TimelineEvent {
    /// Press, release and click events as a [`PointerEvent`].
    pub fn as_pointer(&self) -> Option<PointerEvent> {
        match *self {
            TimelineEvent::PointerDown { button, x, target }
            | TimelineEvent::PointerUp { button, x, target }
            | TimelineEvent::Click { button, x, target } => {
                Some(PointerEvent::new(button, x, target))
            }
            _ => None,
        }
    }
}

/// Parse timeline events from JSONL content (one JSON object per line).
pub fn parse_events(jsonl: &str) -> Result<Vec<TimelineEvent>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_index_mapping() {
        assert_eq!(PointerButton::from_index(0), Some(PointerButton::Primary));
        assert_eq!(PointerButton::from_index(2), Some(PointerButton::Secondary));
        assert_eq!(PointerButton::from_index(7), None);
        assert!(PointerButton::Primary.is_primary());
        assert!(!PointerButton::Secondary.is_primary());
    }

    #[test]
    fn test_parse_script_with_comments() {
        let script = r#"
# drag a selection from 100px to 300px
{"type":"pointer_down","button":"primary","x":100.0}
{"type":"pointer_move","x":300.0}
{"type":"pointer_up","button":"primary","x":300.0}
{"type":"click","button":"primary","x":300.0,"target":"track"}
{"type":"wheel","delta_y":-1.0,"x":250.0}
{"type":"wheel","delta_y":-1.0,"x":null}
"#;
        let events = parse_events(script).unwrap();
        assert_eq!(events.len(), 6);
        assert_eq!(
            events[0],
            TimelineEvent::PointerDown {
                button: PointerButton::Primary,
                x: 100.0,
                target: HitTarget::Track,
            }
        );
        assert_eq!(
            events[5],
            TimelineEvent::Wheel {
                delta_y: -1.0,
                x: None
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_event() {
        assert!(parse_events(r#"{"type":"teleport","x":1.0}"#).is_err());
    }

    #[test]
    fn test_as_pointer() {
        let event = TimelineEvent::Click {
            button: PointerButton::Primary,
            x: 42.0,
            target: HitTarget::ClipMarker,
        };
        let pointer = event.as_pointer().unwrap();
        assert_eq!(pointer.target, HitTarget::ClipMarker);
        assert!(TimelineEvent::Pan { dx: 3.0 }.as_pointer().is_none());
    }
}
