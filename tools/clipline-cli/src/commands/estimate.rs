//! Estimate duration, bitrate and output size for a clip.

use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use clipline_common::config::AppConfig;
use clipline_estimate::EncodingGraph;
use clipline_timeline_model::encoding::{ClipRequest, DerivedEstimate, EncodingParameters};
use clipline_timeline_model::selection::SelectionRange;
use clipline_timeline_model::units::FileSize;
use serde::Serialize;

#[derive(Debug, Args)]
pub struct EstimateArgs {
    /// Length of the source video (seconds)
    #[arg(long)]
    pub duration: f64,

    /// Clip start (seconds); requires --end
    #[arg(long, requires = "end")]
    pub start: Option<f64>,

    /// Clip end (seconds); requires --start
    #[arg(long, requires = "start")]
    pub end: Option<f64>,

    /// Output file name, without extension
    #[arg(short, long)]
    pub name: Option<String>,

    /// Target file size (MB)
    #[arg(long)]
    pub max_size: Option<f64>,

    /// Output framerate
    #[arg(long)]
    pub framerate: Option<f64>,

    /// Playback speed multiplier
    #[arg(long)]
    pub speed: Option<f64>,

    /// Drop the audio track
    #[arg(long)]
    pub mute: bool,

    /// Fixed video bitrate (kbps); turns off the size-derived bitrate
    #[arg(long)]
    pub bitrate: Option<f64>,

    /// Audio bitrate (kbps)
    #[arg(long)]
    pub audio_bitrate: Option<f64>,

    /// Output height (px)
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Output format: mp4, webm or gif
    #[arg(long)]
    pub format: Option<String>,

    /// Source video; prints the export request when the clip is valid
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Directory the clip is written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct EstimateReport<'a> {
    parameters: &'a EncodingParameters,
    selection: Option<SelectionRange>,
    estimate: &'a DerivedEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    request: Option<ClipRequest>,
}

pub fn run(args: EstimateArgs, config: &AppConfig) -> anyhow::Result<()> {
    let mut graph = EncodingGraph::from_defaults(&config.encoding)?;
    graph.set_full_duration(args.duration);

    match (args.start, args.end) {
        (Some(start), Some(end)) => {
            if end < start {
                bail!("Clip end ({end}s) is before its start ({start}s)");
            }
            graph.set_selection(Some(SelectionRange::new(start, end)));
        }
        (None, None) => {}
        _ => bail!("--start and --end must be given together"),
    }

    if let Some(name) = args.name {
        graph.set_clip_name(name);
    }
    if let Some(mb) = args.max_size {
        graph.set_max_file_size_mb(mb);
    }
    if let Some(fps) = args.framerate {
        graph.set_framerate(fps);
    }
    if let Some(speed) = args.speed {
        graph.set_speed(speed);
    }
    if args.mute {
        graph.set_mute_audio(true);
    }
    if let Some(kbps) = args.bitrate {
        graph.set_bitrate_lock(false);
        graph.set_user_bitrate_kbps(kbps);
    }
    if let Some(kbps) = args.audio_bitrate {
        graph.set_audio_bitrate_kbps(kbps);
    }
    if let Some(height) = args.resolution {
        graph.set_resolution(height);
    }
    if let Some(format) = args.format {
        graph.apply(clipline_estimate::ParameterUpdate::Format(format))?;
    }

    let request = match &args.source {
        Some(source) => match graph.export_request(source, &args.output_dir) {
            Ok(request) => Some(request),
            Err(e) => {
                tracing::warn!(error = %e, "Clip cannot be exported");
                None
            }
        },
        None => None,
    };

    if args.json {
        let report = EstimateReport {
            parameters: graph.parameters(),
            selection: graph.selection(),
            estimate: graph.estimate(),
            request,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let params = graph.parameters();
    let estimate = graph.estimate();

    println!("Clip: {}", display_name(&params.clip_name));
    match graph.selection() {
        Some(range) => println!(
            "  Selection: {:.2}s - {:.2}s",
            range.start_secs, range.end_secs
        ),
        None => println!("  Selection: whole video"),
    }
    println!(
        "  Format: {} ({}, {}p @ {}fps, {}x speed)",
        params.format.name, params.format.preset, params.resolution, params.framerate, params.speed
    );
    println!();

    println!("Estimate:");
    println!("  Duration: {:.2}s", estimate.duration_secs);
    println!(
        "  Audio bitrate: {:.0} kbps",
        estimate.calculated_audio_bitrate_kbps
    );
    println!(
        "  Video bitrate: {:.0} kbps{}",
        estimate.final_bitrate_kbps,
        if params.bitrate_lock {
            " (from target size)"
        } else {
            ""
        }
    );
    println!(
        "  Target size: {}",
        FileSize::from_megabytes(params.max_file_size_mb)
    );
    println!("  Estimated size: {}", estimate.estimated_size());

    if estimate.is_valid() {
        println!("\nClip is valid.");
    } else {
        println!("\nValidation issues:");
        for error in &estimate.validation_errors {
            println!("  - {error}");
        }
    }

    if let Some(request) = request {
        println!();
        println!("Export request:");
        println!("  From: {}", request.from.display());
        println!("  To: {}", request.to.display());
        println!(
            "  Video: {:.0} kbps @ {}fps",
            request.video_bitrate_kbps,
            request.effective_framerate()
        );
        println!(
            "  Audio: {}",
            if request.mute {
                "muted".to_string()
            } else {
                format!("{:.0} kbps", request.audio_bitrate_kbps)
            }
        );
    }

    Ok(())
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "(unnamed)"
    } else {
        name
    }
}
