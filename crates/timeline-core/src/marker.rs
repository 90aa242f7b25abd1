//! Selection marker state machine.
//!
//! ```text
//! Idle ──press on track──▶ Anchoring ──move past dead zone──▶ Dragging
//!   │                                                             │
//!   ├──press on marker──▶ MovingExisting ──release──┐          release
//!   ├──press on handle──▶ Resizing ─────────release─┴──────▶ Released
//!   │                                                             │
//!   └◀──────── click (no seek after an interaction) ◀─────────────┘
//! ```
//!
//! [`transition`] is a pure function of the current state, the input and
//! the marker geometry; it returns the next state and the effects the
//! widget must apply. All positions are timeline-seconds.

use clipline_timeline_model::event::{HitTarget, PointerButton};
use clipline_timeline_model::selection::SelectionRange;

/// Pointer interaction with the selection marker.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Pressed on the empty track; waiting to see whether this is a drag.
    Anchoring { anchor_secs: f64 },
    /// Drawing a new selection from `anchor_secs` to the pointer.
    Dragging { anchor_secs: f64 },
    /// Moving the marker body; `grab_offset_secs` is pointer minus marker start.
    MovingExisting { grab_offset_secs: f64 },
    /// Dragging the resize handle.
    Resizing,
    /// Gesture released after an interaction; pointer moves are ignored and
    /// the click that follows does not seek.
    Released,
}

impl DragState {
    /// Whether the marker was moved, resized or drawn. Suppresses the
    /// click-to-seek that ends the gesture.
    pub fn interacted(&self) -> bool {
        matches!(
            self,
            DragState::Dragging { .. }
                | DragState::MovingExisting { .. }
                | DragState::Resizing
                | DragState::Released
        )
    }
}

/// Geometry of the selection marker in timeline-seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerSpan {
    pub start_secs: f64,
    pub width_secs: f64,
}

impl MarkerSpan {
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.width_secs
    }
}

/// Input to the state machine, already converted to timeline-seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerInput {
    Press {
        button: PointerButton,
        target: HitTarget,
        pointer_secs: f64,
    },
    Move {
        pointer_secs: f64,
    },
    Release,
    Click {
        button: PointerButton,
        pointer_secs: f64,
    },
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerEffect {
    /// Create a zero-width marker at `at_secs` (only emitted when none exists).
    CreateMarker { at_secs: f64 },
    /// Set marker position and width.
    Place(MarkerSpan),
    /// Drag the resize handle to `pointer_secs`.
    ResizeTo { pointer_secs: f64 },
    /// Publish the marker as the clip range.
    Commit(SelectionRange),
    /// Move the playhead.
    Seek(f64),
}

/// Advance the state machine by one input.
pub fn transition(
    state: DragState,
    input: MarkerInput,
    marker: Option<MarkerSpan>,
    dead_zone_secs: f64,
) -> (DragState, Vec<MarkerEffect>) {
    match input {
        MarkerInput::Press {
            button,
            target,
            pointer_secs,
        } => {
            if !button.is_primary() {
                return (state, vec![]);
            }
            // A press always starts a new gesture, even if the click that
            // should have ended the previous one never arrived.
            match (target, marker) {
                (HitTarget::ClipMarker, Some(span)) => (
                    DragState::MovingExisting {
                        grab_offset_secs: pointer_secs - span.start_secs,
                    },
                    vec![],
                ),
                (HitTarget::ResizeHandle, Some(_)) => (DragState::Resizing, vec![]),
                _ => {
                    let effects = if marker.is_none() {
                        vec![MarkerEffect::CreateMarker {
                            at_secs: pointer_secs,
                        }]
                    } else {
                        vec![]
                    };
                    (
                        DragState::Anchoring {
                            anchor_secs: pointer_secs,
                        },
                        effects,
                    )
                }
            }
        }

        MarkerInput::Move { pointer_secs } => match state {
            DragState::Anchoring { anchor_secs } | DragState::Dragging { anchor_secs } => {
                let distance = (pointer_secs - anchor_secs).abs();
                if distance > dead_zone_secs {
                    (
                        DragState::Dragging { anchor_secs },
                        vec![MarkerEffect::Place(MarkerSpan {
                            start_secs: anchor_secs.min(pointer_secs),
                            width_secs: distance,
                        })],
                    )
                } else {
                    (state, vec![])
                }
            }
            DragState::MovingExisting { grab_offset_secs } => match marker {
                Some(span) => (
                    state,
                    vec![MarkerEffect::Place(MarkerSpan {
                        start_secs: pointer_secs - grab_offset_secs,
                        width_secs: span.width_secs,
                    })],
                ),
                None => (DragState::Idle, vec![]),
            },
            DragState::Resizing => (state, vec![MarkerEffect::ResizeTo { pointer_secs }]),
            DragState::Idle | DragState::Released => (state, vec![]),
        },

        MarkerInput::Release if state == DragState::Released => (state, vec![]),
        MarkerInput::Release if state.interacted() => {
            let effects = match marker {
                Some(span) if span.width_secs > 0.0 => vec![MarkerEffect::Commit(
                    SelectionRange::from_start(span.start_secs, span.width_secs),
                )],
                _ => vec![],
            };
            (DragState::Released, effects)
        }
        MarkerInput::Release => (DragState::Idle, vec![]),

        MarkerInput::Click {
            button,
            pointer_secs,
        } => {
            if state.interacted() || !button.is_primary() {
                (DragState::Idle, vec![])
            } else {
                (DragState::Idle, vec![MarkerEffect::Seek(pointer_secs)])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DEAD_ZONE: f64 = 0.1;

    fn press(target: HitTarget, pointer_secs: f64) -> MarkerInput {
        MarkerInput::Press {
            button: PointerButton::Primary,
            target,
            pointer_secs,
        }
    }

    fn click(pointer_secs: f64) -> MarkerInput {
        MarkerInput::Click {
            button: PointerButton::Primary,
            pointer_secs,
        }
    }

    #[test]
    fn test_press_on_track_creates_marker_once() {
        let (state, effects) = transition(DragState::Idle, press(HitTarget::Track, 4.0), None, DEAD_ZONE);
        assert_eq!(state, DragState::Anchoring { anchor_secs: 4.0 });
        assert_eq!(effects, vec![MarkerEffect::CreateMarker { at_secs: 4.0 }]);

        let existing = Some(MarkerSpan {
            start_secs: 1.0,
            width_secs: 2.0,
        });
        let (_, effects) = transition(DragState::Idle, press(HitTarget::Track, 4.0), existing, DEAD_ZONE);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_non_primary_press_is_ignored() {
        let input = MarkerInput::Press {
            button: PointerButton::Secondary,
            target: HitTarget::Track,
            pointer_secs: 3.0,
        };
        let (state, effects) = transition(DragState::Idle, input, None, DEAD_ZONE);
        assert_eq!(state, DragState::Idle);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_drag_backwards_places_from_pointer() {
        let state = DragState::Anchoring { anchor_secs: 10.0 };
        let (state, effects) = transition(
            state,
            MarkerInput::Move { pointer_secs: 6.0 },
            Some(MarkerSpan {
                start_secs: 0.0,
                width_secs: 0.0,
            }),
            DEAD_ZONE,
        );
        assert_eq!(state, DragState::Dragging { anchor_secs: 10.0 });
        assert_eq!(
            effects,
            vec![MarkerEffect::Place(MarkerSpan {
                start_secs: 6.0,
                width_secs: 4.0
            })]
        );
    }

    #[test]
    fn test_release_after_drag_commits_and_click_does_not_seek() {
        let span = Some(MarkerSpan {
            start_secs: 2.0,
            width_secs: 8.0,
        });
        let dragging = DragState::Dragging { anchor_secs: 2.0 };
        let (state, effects) = transition(dragging, MarkerInput::Release, span, DEAD_ZONE);
        assert_eq!(state, DragState::Released);
        assert_eq!(
            effects,
            vec![MarkerEffect::Commit(SelectionRange::new(2.0, 10.0))]
        );

        let (state, effects) = transition(state, click(10.0), span, DEAD_ZONE);
        assert_eq!(state, DragState::Idle);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_moves_after_release_are_ignored() {
        let span = Some(MarkerSpan {
            start_secs: 4.0,
            width_secs: 3.0,
        });
        for active in [
            DragState::Dragging { anchor_secs: 4.0 },
            DragState::MovingExisting { grab_offset_secs: 1.0 },
            DragState::Resizing,
        ] {
            let (state, _) = transition(active, MarkerInput::Release, span, DEAD_ZONE);
            let (state, effects) =
                transition(state, MarkerInput::Move { pointer_secs: 60.0 }, span, DEAD_ZONE);
            assert_eq!(state, DragState::Released);
            assert!(effects.is_empty());
        }
    }

    #[test]
    fn test_press_after_release_starts_new_gesture() {
        let span = Some(MarkerSpan {
            start_secs: 4.0,
            width_secs: 3.0,
        });
        let (state, _) = transition(
            DragState::Released,
            press(HitTarget::ClipMarker, 5.0),
            span,
            DEAD_ZONE,
        );
        assert_eq!(state, DragState::MovingExisting { grab_offset_secs: 1.0 });
    }

    #[test]
    fn test_release_with_zero_width_discards() {
        let span = Some(MarkerSpan {
            start_secs: 2.0,
            width_secs: 0.0,
        });
        let (_, effects) = transition(DragState::Resizing, MarkerInput::Release, span, DEAD_ZONE);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_plain_click_seeks() {
        let (state, _) = transition(DragState::Idle, press(HitTarget::Track, 7.5), None, DEAD_ZONE);
        let (state, effects) = transition(state, MarkerInput::Release, None, DEAD_ZONE);
        assert_eq!(state, DragState::Idle);
        assert!(effects.is_empty());

        let (state, effects) = transition(state, click(7.5), None, DEAD_ZONE);
        assert_eq!(state, DragState::Idle);
        assert_eq!(effects, vec![MarkerEffect::Seek(7.5)]);
    }

    #[test]
    fn test_secondary_click_never_seeks() {
        let input = MarkerInput::Click {
            button: PointerButton::Secondary,
            pointer_secs: 3.0,
        };
        let (_, effects) = transition(DragState::Idle, input, None, DEAD_ZONE);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_move_existing_keeps_grab_offset() {
        let span = Some(MarkerSpan {
            start_secs: 4.0,
            width_secs: 3.0,
        });
        let (state, _) = transition(DragState::Idle, press(HitTarget::ClipMarker, 5.0), span, DEAD_ZONE);
        assert_eq!(state, DragState::MovingExisting { grab_offset_secs: 1.0 });

        let (state, effects) = transition(state, MarkerInput::Move { pointer_secs: 9.0 }, span, DEAD_ZONE);
        assert!(state.interacted());
        assert_eq!(
            effects,
            vec![MarkerEffect::Place(MarkerSpan {
                start_secs: 8.0,
                width_secs: 3.0
            })]
        );
    }

    #[test]
    fn test_press_on_handle_resizes() {
        let span = Some(MarkerSpan {
            start_secs: 4.0,
            width_secs: 3.0,
        });
        let (state, _) = transition(DragState::Idle, press(HitTarget::ResizeHandle, 7.0), span, DEAD_ZONE);
        assert_eq!(state, DragState::Resizing);
        let (_, effects) = transition(state, MarkerInput::Move { pointer_secs: 9.5 }, span, DEAD_ZONE);
        assert_eq!(effects, vec![MarkerEffect::ResizeTo { pointer_secs: 9.5 }]);
    }

    #[test]
    fn test_press_on_marker_without_marker_anchors() {
        let (state, effects) = transition(DragState::Idle, press(HitTarget::ClipMarker, 5.0), None, DEAD_ZONE);
        assert_eq!(state, DragState::Anchoring { anchor_secs: 5.0 });
        assert_eq!(effects, vec![MarkerEffect::CreateMarker { at_secs: 5.0 }]);
    }

    proptest! {
        #[test]
        fn prop_dead_zone_leaves_geometry_unchanged(
            anchor in 0.0f64..500.0,
            offset in -0.099f64..0.099,
        ) {
            let state = DragState::Anchoring { anchor_secs: anchor };
            let (next, effects) = transition(
                state,
                MarkerInput::Move { pointer_secs: anchor + offset },
                None,
                DEAD_ZONE,
            );
            prop_assert_eq!(next, state);
            prop_assert!(effects.is_empty());
        }
    }
}
