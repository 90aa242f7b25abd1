//! Replay a scripted timeline interaction.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clipline_common::config::AppConfig;
use clipline_estimate::{EncodingGraph, Node};
use clipline_timeline_core::TimelineWidget;
use clipline_timeline_model::event::parse_events;
use clipline_timeline_model::viewport::TimelineTuning;
use serde_json::json;

pub fn run(
    script: PathBuf,
    seconds: f64,
    width: f64,
    height: f64,
    name: String,
    json: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&script)
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    let events = parse_events(&content)
        .with_context(|| format!("Failed to parse script {}", script.display()))?;

    let mut graph = EncodingGraph::from_defaults(&config.encoding)?;
    graph.set_full_duration(seconds);
    graph.set_clip_name(name);
    graph.subscribe(Node::EstimatedSize, |estimate| {
        tracing::debug!(
            duration_secs = estimate.duration_secs,
            size = %estimate.estimated_size(),
            "Estimate changed"
        );
    });

    let seeks = Rc::new(RefCell::new(Vec::new()));
    let recorded = Rc::clone(&seeks);
    let mut widget = TimelineWidget::with_tuning(
        width,
        height,
        seconds,
        TimelineTuning::from(&config.timeline),
        move |secs| recorded.borrow_mut().push(secs),
    )?;
    widget.mount();

    for (line, event) in events.iter().enumerate() {
        widget
            .dispatch(event, &mut graph)
            .with_context(|| format!("Event {} ({event:?}) failed", line + 1))?;
    }

    let selection = graph.selection();
    let estimate = graph.estimate();
    let seeks = seeks.borrow();

    if json {
        let report = json!({
            "events": events.len(),
            "scale": widget.scale(),
            "pan_offset_px": widget.viewport().pan_offset(),
            "marker_gap_px": widget.marker_gap(),
            "playhead_secs": widget.current_time(),
            "seeks": *seeks,
            "selection": selection,
            "estimate": estimate,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Replayed {} event(s) from {}", events.len(), script.display());
    println!(
        "  Viewport: scale {:.3}, pan {:.1}px, {:.2}px/s",
        widget.scale(),
        widget.viewport().pan_offset(),
        widget.marker_gap()
    );
    println!(
        "  Playhead: {:.2}s ({} seek(s))",
        widget.current_time().unwrap_or_default(),
        seeks.len()
    );
    match selection {
        Some(range) => println!(
            "  Selection: {:.2}s - {:.2}s ({:.2}s)",
            range.start_secs,
            range.end_secs,
            range.length_secs()
        ),
        None => println!("  Selection: none"),
    }
    println!(
        "  Estimate: {:.2}s at {:.0} kbps -> {}",
        estimate.duration_secs,
        estimate.final_bitrate_kbps,
        estimate.estimated_size()
    );
    if !estimate.is_valid() {
        println!("  Issues: {}", estimate.describe_errors());
    }

    Ok(())
}
