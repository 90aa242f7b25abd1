//! Load a thumbnail strip from disk.

use std::path::PathBuf;
use std::sync::Arc;

use clipline_common::config::AppConfig;
use clipline_timeline_core::{FsThumbnailSource, ThumbnailLoader, TimelineWidget};
use clipline_timeline_model::viewport::TimelineTuning;

pub async fn run(
    dir: Option<PathBuf>,
    upto: u32,
    seconds: f64,
    width: f64,
    height: f64,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let dir = dir.unwrap_or_else(|| config.thumbnails.cache_dir.clone());
    if !dir.is_dir() {
        anyhow::bail!("Thumbnail directory not found: {}", dir.display());
    }

    let source = Arc::new(FsThumbnailSource::from_config(&config.thumbnails));
    let loader = ThumbnailLoader::on_current_runtime(source)?;
    let mut widget = TimelineWidget::with_tuning(
        width,
        height,
        seconds,
        TimelineTuning::from(&config.timeline),
        |_| {},
    )?
    .with_thumbnail_loader(loader);
    widget.mount();

    let requested = widget.populate_thumbnails(&dir, upto);
    let report = widget.settle_thumbnails().await;

    println!(
        "Thumbnails from {} (*.{})",
        dir.display(),
        config.thumbnails.extension
    );
    println!("  Requested: {requested}");
    println!("  Loaded: {}", format_indices(&report.loaded));
    println!("  Missing: {}", format_indices(&report.failed));

    Ok(())
}

fn format_indices(indices: &[u32]) -> String {
    if indices.is_empty() {
        return "none".to_string();
    }
    indices
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
