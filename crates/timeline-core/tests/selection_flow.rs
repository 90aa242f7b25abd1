use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use clipline_timeline_core::{DragState, NodeKind, TimelineWidget};
use clipline_timeline_model::event::{parse_events, PointerEvent, WheelEvent};
use clipline_timeline_model::selection::SelectionRange;

fn load_script(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("scripts")
        .join(name);
    std::fs::read_to_string(path).expect("fixture script should be readable")
}

fn mounted_widget() -> (TimelineWidget, Rc<RefCell<Vec<f64>>>) {
    let seeks = Rc::new(RefCell::new(Vec::new()));
    let recorded = Rc::clone(&seeks);
    let mut widget =
        TimelineWidget::new(1000.0, 100.0, 100.0, move |t| recorded.borrow_mut().push(t))
            .expect("valid dimensions");
    widget.mount();
    (widget, seeks)
}

#[test]
fn replayed_script_selects_and_seeks() {
    let events = parse_events(&load_script("select-and-zoom.jsonl")).expect("script should parse");
    let (mut widget, seeks) = mounted_widget();
    let mut selection: Option<SelectionRange> = None;

    for event in &events {
        widget.dispatch(event, &mut selection).unwrap();
    }

    // Two zoom steps around x = 0; the wheel event without a pointer aborts.
    assert!((widget.scale() - 1.21).abs() < 1e-12);
    assert_eq!(widget.viewport().pan_offset(), 0.0);

    let range = selection.expect("drag should commit");
    assert!((range.start_secs - 10.0).abs() < 1e-9);
    assert!((range.end_secs - 30.0).abs() < 1e-9);

    let seeks = seeks.borrow();
    assert_eq!(seeks.len(), 1);
    assert!((seeks[0] - 50.0).abs() < 1e-9);
    assert_eq!(widget.drag_state(), DragState::Idle);
}

#[test]
fn redrawing_replaces_previous_selection() {
    let (mut widget, _) = mounted_widget();
    let mut selection: Option<SelectionRange> = None;

    for (from, to) in [(100.0, 300.0), (800.0, 450.0)] {
        widget.pointer_down(&PointerEvent::primary(from));
        widget.pointer_move(to);
        widget.pointer_up(&PointerEvent::primary(to), &mut selection);
        widget.click(&PointerEvent::primary(to));
    }

    assert_eq!(selection, Some(SelectionRange::new(45.0, 80.0)));
    let scene = widget.scene().unwrap();
    assert_eq!(scene.count(|n| n.kind == NodeKind::ClipMarker), 1);
    assert_eq!(scene.count(|n| n.kind == NodeKind::ResizeHandle), 1);
}

#[test]
fn zoom_keeps_second_under_pointer() {
    let (mut widget, _) = mounted_widget();
    let before = widget.viewport().pixel_to_seconds(640.0);

    for _ in 0..10 {
        widget.zoom(&WheelEvent {
            delta_y: -120.0,
            x: Some(640.0),
        });
    }
    let after = widget.viewport().pixel_to_seconds(640.0);
    assert!((before - after).abs() < 1e-9);

    // Zooming back out stops at the minimum scale.
    for _ in 0..20 {
        widget.zoom(&WheelEvent {
            delta_y: 120.0,
            x: Some(640.0),
        });
    }
    assert!(widget.scale() > 1.0);
    assert!(widget.scale() < 1.1 + 1e-9);
}

#[test]
fn pan_is_clamped_to_leeway() {
    let (mut widget, _) = mounted_widget();
    assert_eq!(widget.pan_by(500.0), 50.0);
    assert_eq!(widget.pan_by(-5000.0), -50.0);
}
