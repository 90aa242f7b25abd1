//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Thumbnail strip settings.
    pub thumbnails: ThumbnailConfig,

    /// Timeline interaction tuning.
    pub timeline: TimelineDefaults,

    /// Default encoding parameters for a fresh clip.
    pub encoding: EncodingDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Where timeline thumbnails live and how they are named.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Root of the thumbnail cache (one sub-directory per source video).
    pub cache_dir: PathBuf,

    /// File extension of generated thumbnails, without the dot.
    pub extension: String,
}

/// Tuning for zoom, pan and drag behavior of the timeline widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineDefaults {
    /// Multiplicative zoom step per wheel notch.
    pub zoom_speed: f64,

    /// How far (px) the timeline may be dragged past either end.
    pub scroll_leeway_px: f64,

    /// Scale above which detail nodes (labels, thumbnails) become visible.
    pub detail_cutoff_scale: f64,

    /// Minimum pointer travel (seconds) before a drag creates a selection.
    pub drag_dead_zone_secs: f64,

    /// Spacing of time grid markers (seconds).
    pub marker_interval_secs: f64,
}

/// Default encoding parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingDefaults {
    /// Target file size in megabytes.
    pub max_file_size_mb: f64,

    /// Output framerate.
    pub framerate: f64,

    /// Playback speed multiplier.
    pub speed: f64,

    /// Drop the audio track.
    pub mute_audio: bool,

    /// Video bitrate used when the bitrate lock is off (kbps).
    pub user_bitrate_kbps: f64,

    /// Derive the video bitrate from the target size.
    pub bitrate_lock: bool,

    /// Audio bitrate (kbps).
    pub audio_bitrate_kbps: f64,

    /// Output height in pixels.
    pub resolution: u32,

    /// Output format name (e.g., "mp4", "webm", "gif").
    pub format: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "clipline=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir().join("thumbnails"),
            extension: "bmp".to_string(),
        }
    }
}

impl Default for TimelineDefaults {
    fn default() -> Self {
        Self {
            zoom_speed: 1.1,
            scroll_leeway_px: 50.0,
            detail_cutoff_scale: 80.0,
            drag_dead_zone_secs: 0.1,
            marker_interval_secs: 1.0,
        }
    }
}

impl Default for EncodingDefaults {
    fn default() -> Self {
        Self {
            max_file_size_mb: 8.0,
            framerate: 24.0,
            speed: 1.0,
            mute_audio: false,
            user_bitrate_kbps: 1.0,
            bitrate_lock: true,
            audio_bitrate_kbps: 64.0,
            resolution: 720,
            format: "mp4".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("clipline").join("config.json")
}

/// Default cache directory.
fn default_cache_dir() -> PathBuf {
    let base = std::env::var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".cache")
        });
    base.join("clipline")
}
