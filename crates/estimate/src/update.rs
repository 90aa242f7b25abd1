//! Generic leaf updates, for settings panels and scripted input.

use clipline_timeline_model::selection::SelectionRange;
use serde::{Deserialize, Serialize};

/// A write to one leaf of the encoding graph.
///
/// Serialized as `{"parameter": "speed", "value": 2.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "parameter", content = "value", rename_all = "snake_case")]
pub enum ParameterUpdate {
    ClipName(String),
    MaxFileSizeMb(f64),
    Framerate(f64),
    Speed(f64),
    MuteAudio(bool),
    UserBitrateKbps(f64),
    BitrateLock(bool),
    AudioBitrateKbps(f64),
    Resolution(u32),
    /// Output format by name (`mp4`, `webm`, `gif`).
    Format(String),
    Selection(Option<SelectionRange>),
    FullDurationSecs(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_wire_format() {
        let update: ParameterUpdate =
            serde_json::from_str(r#"{"parameter":"max_file_size_mb","value":25.0}"#).unwrap();
        assert_eq!(update, ParameterUpdate::MaxFileSizeMb(25.0));

        let update: ParameterUpdate = serde_json::from_str(
            r#"{"parameter":"selection","value":{"start_secs":1.0,"end_secs":3.5}}"#,
        )
        .unwrap();
        assert_eq!(
            update,
            ParameterUpdate::Selection(Some(SelectionRange::new(1.0, 3.5)))
        );

        let json = serde_json::to_string(&ParameterUpdate::MuteAudio(true)).unwrap();
        assert_eq!(json, r#"{"parameter":"mute_audio","value":true}"#);
    }

    #[test]
    fn test_reversed_selection_update_is_ordered() {
        let update: ParameterUpdate = serde_json::from_str(
            r#"{"parameter":"selection","value":{"start_secs":8.0,"end_secs":2.0}}"#,
        )
        .unwrap();
        assert_eq!(
            update,
            ParameterUpdate::Selection(Some(SelectionRange::new(2.0, 8.0)))
        );
    }
}
