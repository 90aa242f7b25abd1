//! Clipline CLI — clip size estimates and headless timeline tooling.
//!
//! Usage:
//!   clipline estimate [OPTIONS]          Estimate bitrate and output size
//!   clipline replay <SCRIPT> [OPTIONS]   Replay timeline events from JSONL
//!   clipline thumbnails [DIR] --upto N   Load a thumbnail strip
//!   clipline config                      Show the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clipline_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "clipline",
    about = "Cut clips that fit a target file size",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute duration, bitrates and estimated size for a clip
    Estimate(commands::estimate::EstimateArgs),

    /// Replay a JSONL script of timeline events
    Replay {
        /// Path to the event script
        script: PathBuf,

        /// Length of the source video (seconds)
        #[arg(long)]
        seconds: f64,

        /// Widget width (px)
        #[arg(long, default_value = "1000")]
        width: f64,

        /// Widget height (px)
        #[arg(long, default_value = "100")]
        height: f64,

        /// Clip name used for the estimate
        #[arg(short, long, default_value = "clip")]
        name: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load thumbnails `1..upto` from a directory
    Thumbnails {
        /// Directory containing `<index>.<ext>` images [default: thumbnail cache dir]
        dir: Option<PathBuf>,

        /// Exclusive upper thumbnail index
        #[arg(long)]
        upto: u32,

        /// Length of the source video (seconds)
        #[arg(long, default_value = "60")]
        seconds: f64,

        /// Widget width (px)
        #[arg(long, default_value = "1000")]
        width: f64,

        /// Widget height (px)
        #[arg(long, default_value = "100")]
        height: f64,
    },

    /// Show the effective configuration
    Config {
        /// Only print the config file location
        #[arg(long)]
        path: bool,

        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    clipline_common::logging::init_logging(&logging)?;

    match cli.command {
        Commands::Estimate(args) => commands::estimate::run(args, &config),
        Commands::Replay {
            script,
            seconds,
            width,
            height,
            name,
            json,
        } => commands::replay::run(script, seconds, width, height, name, json, &config),
        Commands::Thumbnails {
            dir,
            upto,
            seconds,
            width,
            height,
        } => commands::thumbnails::run(dir, upto, seconds, width, height, &config).await,
        Commands::Config { path, save } => commands::config::run(&config, path, save),
    }
}
