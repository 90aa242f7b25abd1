//! Encoding parameters, output formats and the derived size estimate.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use clipline_common::config::EncodingDefaults;
use clipline_common::error::{ClipError, ClipResult};
use serde::{Deserialize, Serialize};

use crate::units::FileSize;

/// Something an output container/codec cannot do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Limitation {
    /// Bitrate flags are ignored by the encoder.
    NoBitrate,
    /// The container carries no audio.
    NoAudio,
}

/// Output container/codec choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormat {
    pub name: String,
    pub extension: String,
    /// Encoder speed preset.
    pub preset: String,
    #[serde(default)]
    pub limitations: Vec<Limitation>,
}

impl OutputFormat {
    pub fn mp4() -> Self {
        Self {
            name: "mp4".to_string(),
            extension: "mp4".to_string(),
            preset: "ultrafast".to_string(),
            limitations: vec![],
        }
    }

    pub fn webm() -> Self {
        Self {
            name: "webm".to_string(),
            extension: "webm".to_string(),
            preset: "realtime".to_string(),
            limitations: vec![],
        }
    }

    pub fn gif() -> Self {
        Self {
            name: "gif".to_string(),
            extension: "gif".to_string(),
            preset: "ultrafast".to_string(),
            limitations: vec![Limitation::NoBitrate, Limitation::NoAudio],
        }
    }

    /// All built-in formats.
    pub fn presets() -> Vec<OutputFormat> {
        vec![Self::mp4(), Self::webm(), Self::gif()]
    }

    /// Look up a built-in format by name (case-insensitive).
    pub fn by_name(name: &str) -> Option<OutputFormat> {
        Self::presets()
            .into_iter()
            .find(|format| format.name.eq_ignore_ascii_case(name))
    }

    pub fn has_limitation(&self, limitation: Limitation) -> bool {
        self.limitations.contains(&limitation)
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::mp4()
    }
}

/// Leaf settings the user edits in the settings panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingParameters {
    /// Output file stem. Must not be empty.
    pub clip_name: String,
    /// Target output size in megabytes.
    pub max_file_size_mb: f64,
    pub framerate: f64,
    pub speed: f64,
    pub mute_audio: bool,
    /// Video bitrate used when the bitrate lock is off (kbps).
    pub user_bitrate_kbps: f64,
    /// Derive the video bitrate from the target size.
    pub bitrate_lock: bool,
    pub audio_bitrate_kbps: f64,
    /// Output height in pixels.
    pub resolution: u32,
    pub format: OutputFormat,
}

impl Default for EncodingParameters {
    fn default() -> Self {
        Self {
            clip_name: String::new(),
            max_file_size_mb: 8.0,
            framerate: 24.0,
            speed: 1.0,
            mute_audio: false,
            user_bitrate_kbps: 1.0,
            bitrate_lock: true,
            audio_bitrate_kbps: 64.0,
            resolution: 720,
            format: OutputFormat::mp4(),
        }
    }
}

impl EncodingParameters {
    /// Build parameters from configured defaults. Fails on an unknown format.
    pub fn from_defaults(defaults: &EncodingDefaults) -> ClipResult<Self> {
        let format = OutputFormat::by_name(&defaults.format).ok_or_else(|| {
            ClipError::config(format!("unknown output format '{}'", defaults.format))
        })?;

        Ok(Self {
            clip_name: String::new(),
            max_file_size_mb: defaults.max_file_size_mb,
            framerate: defaults.framerate,
            speed: defaults.speed,
            mute_audio: defaults.mute_audio,
            user_bitrate_kbps: defaults.user_bitrate_kbps,
            bitrate_lock: defaults.bitrate_lock,
            audio_bitrate_kbps: defaults.audio_bitrate_kbps,
            resolution: defaults.resolution,
            format,
        })
    }
}

/// Advisory validation problems that gate export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValidationError {
    InvalidDuration,
    InvalidFramerate,
    InvalidSpeed,
    InvalidVideoBitrate,
    InvalidClipName,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ValidationError::InvalidDuration => "clip duration must be positive",
            ValidationError::InvalidFramerate => "framerate must be positive",
            ValidationError::InvalidSpeed => "speed must be positive",
            ValidationError::InvalidVideoBitrate => "video bitrate must be finite and above 1 kbps",
            ValidationError::InvalidClipName => "clip name must not be empty",
        };
        f.write_str(text)
    }
}

/// Values derived from [`EncodingParameters`] and the selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedEstimate {
    pub duration_secs: f64,
    pub calculated_audio_bitrate_kbps: f64,
    pub calculated_video_bitrate_kbps: f64,
    pub final_bitrate_kbps: f64,
    pub estimated_size_bytes: f64,
    pub validation_errors: BTreeSet<ValidationError>,
}

impl Default for DerivedEstimate {
    fn default() -> Self {
        Self {
            duration_secs: 0.0,
            calculated_audio_bitrate_kbps: 0.0,
            calculated_video_bitrate_kbps: 0.0,
            final_bitrate_kbps: 0.0,
            estimated_size_bytes: 0.0,
            validation_errors: BTreeSet::new(),
        }
    }
}

impl DerivedEstimate {
    pub fn estimated_size(&self) -> FileSize {
        FileSize::from_bytes(self.estimated_size_bytes)
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }

    /// Human-readable list of validation errors.
    pub fn describe_errors(&self) -> String {
        self.validation_errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Everything the external transcoder needs to cut one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRequest {
    pub from: PathBuf,
    pub to: PathBuf,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub video_bitrate_kbps: f64,
    pub audio_bitrate_kbps: f64,
    pub framerate: f64,
    pub speed: f64,
    pub resolution: u32,
    pub mute: bool,
    pub format: String,
    pub preset: String,
}

impl ClipRequest {
    /// Framerate handed to the encoder: scaled down with the speed when the
    /// clip is slowed.
    pub fn effective_framerate(&self) -> f64 {
        if self.speed < 1.0 {
            self.framerate * self.speed
        } else {
            self.framerate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_lookup() {
        assert_eq!(OutputFormat::by_name("MP4"), Some(OutputFormat::mp4()));
        let gif = OutputFormat::by_name("gif").unwrap();
        assert!(gif.has_limitation(Limitation::NoAudio));
        assert!(OutputFormat::by_name("avi").is_none());
    }

    #[test]
    fn test_parameters_from_defaults() {
        let params = EncodingParameters::from_defaults(&EncodingDefaults::default()).unwrap();
        assert_eq!(params, EncodingParameters::default());

        let bad = EncodingDefaults {
            format: "avi".to_string(),
            ..Default::default()
        };
        assert!(EncodingParameters::from_defaults(&bad).is_err());
    }

    #[test]
    fn test_effective_framerate() {
        let mut request = ClipRequest {
            from: PathBuf::from("in.mp4"),
            to: PathBuf::from("out.mp4"),
            start: Some(0.0),
            end: Some(4.0),
            video_bitrate_kbps: 1000.0,
            audio_bitrate_kbps: 64.0,
            framerate: 30.0,
            speed: 0.5,
            resolution: 720,
            mute: false,
            format: "mp4".to_string(),
            preset: "ultrafast".to_string(),
        };
        assert_eq!(request.effective_framerate(), 15.0);
        request.speed = 2.0;
        assert_eq!(request.effective_framerate(), 30.0);
    }

    #[test]
    fn test_validation_errors_are_ordered() {
        let estimate = DerivedEstimate {
            validation_errors: [
                ValidationError::InvalidClipName,
                ValidationError::InvalidSpeed,
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        };
        assert!(!estimate.is_valid());
        assert_eq!(
            estimate.describe_errors(),
            "speed must be positive; clip name must not be empty"
        );
    }
}
