//! The encoding-parameter graph.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use clipline_common::config::EncodingDefaults;
use clipline_common::error::{ClipError, ClipResult};
use clipline_timeline_model::encoding::{
    ClipRequest, DerivedEstimate, EncodingParameters, Limitation, OutputFormat, ValidationError,
};
use clipline_timeline_model::selection::{SelectionRange, SelectionSink};
use clipline_timeline_model::units::FileSize;
use serde::{Deserialize, Serialize};

use crate::reactive::DependencyGraph;
use crate::update::ParameterUpdate;

/// Every value in the graph, leaves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    ClipName,
    MaxFileSize,
    Framerate,
    Speed,
    MuteAudio,
    UserBitrate,
    BitrateLock,
    AudioBitrate,
    Resolution,
    Format,
    Selection,
    FullDuration,

    Duration,
    CalculatedAudioBitrate,
    CalculatedVideoBitrate,
    FinalBitrate,
    EstimatedSize,
    ValidationErrors,
}

impl Node {
    pub const LEAVES: [Node; 12] = [
        Node::ClipName,
        Node::MaxFileSize,
        Node::Framerate,
        Node::Speed,
        Node::MuteAudio,
        Node::UserBitrate,
        Node::BitrateLock,
        Node::AudioBitrate,
        Node::Resolution,
        Node::Format,
        Node::Selection,
        Node::FullDuration,
    ];

    pub fn is_leaf(self) -> bool {
        Self::LEAVES.contains(&self)
    }
}

fn declare_dependencies() -> ClipResult<DependencyGraph<Node>> {
    let mut graph = DependencyGraph::new();
    for leaf in Node::LEAVES {
        graph.add_source(leaf)?;
    }

    graph.add_derived(
        Node::Duration,
        &[Node::Selection, Node::Speed, Node::FullDuration],
    )?;
    graph.add_derived(
        Node::CalculatedAudioBitrate,
        &[Node::MuteAudio, Node::AudioBitrate],
    )?;
    graph.add_derived(
        Node::CalculatedVideoBitrate,
        &[
            Node::MaxFileSize,
            Node::Duration,
            Node::CalculatedAudioBitrate,
        ],
    )?;
    graph.add_derived(
        Node::FinalBitrate,
        &[
            Node::BitrateLock,
            Node::CalculatedVideoBitrate,
            Node::UserBitrate,
        ],
    )?;
    graph.add_derived(
        Node::EstimatedSize,
        &[
            Node::Duration,
            Node::FinalBitrate,
            Node::CalculatedAudioBitrate,
        ],
    )?;
    graph.add_derived(
        Node::ValidationErrors,
        &[
            Node::ClipName,
            Node::Duration,
            Node::Framerate,
            Node::Speed,
            Node::FinalBitrate,
        ],
    )?;
    Ok(graph)
}

/// Output duration in seconds: the selection stretched by the speed, or the
/// whole video when nothing is selected.
pub fn duration_secs(selection: Option<SelectionRange>, speed: f64, full_duration_secs: f64) -> f64 {
    match selection {
        Some(range) => (range.length_secs() / speed).max(0.0),
        None => full_duration_secs,
    }
}

/// Video bitrate that fills `max_file_size_mb` over `duration_secs`.
pub fn video_bitrate_kbps(max_file_size_mb: f64, duration_secs: f64, audio_kbps: f64) -> f64 {
    if duration_secs <= 0.0 {
        return 0.0;
    }
    FileSize::from_megabytes(max_file_size_mb).to_kilobits() / duration_secs - audio_kbps
}

pub fn estimated_size_bytes(final_kbps: f64, audio_kbps: f64, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 {
        return 0.0;
    }
    FileSize::from_kilobits(final_kbps + audio_kbps).bytes() * duration_secs
}

pub fn validate(
    clip_name: &str,
    duration_secs: f64,
    framerate: f64,
    speed: f64,
    final_kbps: f64,
) -> BTreeSet<ValidationError> {
    let mut errors = BTreeSet::new();
    if clip_name.is_empty() {
        errors.insert(ValidationError::InvalidClipName);
    }
    if duration_secs <= 0.0 {
        errors.insert(ValidationError::InvalidDuration);
    }
    if framerate <= 0.0 {
        errors.insert(ValidationError::InvalidFramerate);
    }
    if speed <= 0.0 {
        errors.insert(ValidationError::InvalidSpeed);
    }
    if !final_kbps.is_finite() || final_kbps <= 1.0 {
        errors.insert(ValidationError::InvalidVideoBitrate);
    }
    errors
}

/// Handle returned by [`EncodingGraph::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    node: Node,
    callback: Box<dyn FnMut(&DerivedEstimate)>,
}

/// Leaf encoding parameters plus everything derived from them.
pub struct EncodingGraph {
    params: EncodingParameters,
    selection: Option<SelectionRange>,
    full_duration_secs: f64,
    estimate: DerivedEstimate,
    dependencies: DependencyGraph<Node>,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
}

impl EncodingGraph {
    /// Graph with default parameters, no selection and a zero-length video.
    pub fn new() -> ClipResult<Self> {
        Self::with_parameters(EncodingParameters::default())
    }

    pub fn from_defaults(defaults: &EncodingDefaults) -> ClipResult<Self> {
        Self::with_parameters(EncodingParameters::from_defaults(defaults)?)
    }

    pub fn with_parameters(params: EncodingParameters) -> ClipResult<Self> {
        let mut graph = Self {
            params,
            selection: None,
            full_duration_secs: 0.0,
            estimate: DerivedEstimate::default(),
            dependencies: declare_dependencies()?,
            subscribers: Vec::new(),
            next_subscription: 0,
        };
        for node in graph.dependencies.derived_order().to_vec() {
            graph.recompute(node);
        }
        Ok(graph)
    }

    pub fn parameters(&self) -> &EncodingParameters {
        &self.params
    }

    pub fn estimate(&self) -> &DerivedEstimate {
        &self.estimate
    }

    pub fn selection(&self) -> Option<SelectionRange> {
        self.selection
    }

    pub fn full_duration_secs(&self) -> f64 {
        self.full_duration_secs
    }

    /// Current value of any node as JSON.
    pub fn value(&self, node: Node) -> ClipResult<serde_json::Value> {
        let p = &self.params;
        let e = &self.estimate;
        let value = match node {
            Node::ClipName => serde_json::to_value(&p.clip_name)?,
            Node::MaxFileSize => serde_json::to_value(p.max_file_size_mb)?,
            Node::Framerate => serde_json::to_value(p.framerate)?,
            Node::Speed => serde_json::to_value(p.speed)?,
            Node::MuteAudio => serde_json::to_value(p.mute_audio)?,
            Node::UserBitrate => serde_json::to_value(p.user_bitrate_kbps)?,
            Node::BitrateLock => serde_json::to_value(p.bitrate_lock)?,
            Node::AudioBitrate => serde_json::to_value(p.audio_bitrate_kbps)?,
            Node::Resolution => serde_json::to_value(p.resolution)?,
            Node::Format => serde_json::to_value(&p.format)?,
            Node::Selection => serde_json::to_value(self.selection)?,
            Node::FullDuration => serde_json::to_value(self.full_duration_secs)?,
            Node::Duration => serde_json::to_value(e.duration_secs)?,
            Node::CalculatedAudioBitrate => serde_json::to_value(e.calculated_audio_bitrate_kbps)?,
            Node::CalculatedVideoBitrate => serde_json::to_value(e.calculated_video_bitrate_kbps)?,
            Node::FinalBitrate => serde_json::to_value(e.final_bitrate_kbps)?,
            Node::EstimatedSize => serde_json::to_value(e.estimated_size_bytes)?,
            Node::ValidationErrors => serde_json::to_value(&e.validation_errors)?,
        };
        Ok(value)
    }

    /// Call `callback` with the full estimate whenever `node` changes.
    /// Notifications are sent after recomputation has finished.
    pub fn subscribe(
        &mut self,
        node: Node,
        callback: impl FnMut(&DerivedEstimate) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(Subscriber {
            id,
            node,
            callback: Box::new(callback),
        });
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn set_clip_name(&mut self, name: impl Into<String>) {
        self.write(Node::ClipName, name.into(), |g| &mut g.params.clip_name);
    }

    pub fn set_max_file_size_mb(&mut self, megabytes: f64) {
        self.write(Node::MaxFileSize, megabytes, |g| &mut g.params.max_file_size_mb);
    }

    pub fn set_framerate(&mut self, framerate: f64) {
        self.write(Node::Framerate, framerate, |g| &mut g.params.framerate);
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.write(Node::Speed, speed, |g| &mut g.params.speed);
    }

    pub fn set_mute_audio(&mut self, mute: bool) {
        self.write(Node::MuteAudio, mute, |g| &mut g.params.mute_audio);
    }

    pub fn set_user_bitrate_kbps(&mut self, kbps: f64) {
        self.write(Node::UserBitrate, kbps, |g| &mut g.params.user_bitrate_kbps);
    }

    pub fn set_bitrate_lock(&mut self, locked: bool) {
        self.write(Node::BitrateLock, locked, |g| &mut g.params.bitrate_lock);
    }

    pub fn set_audio_bitrate_kbps(&mut self, kbps: f64) {
        self.write(Node::AudioBitrate, kbps, |g| &mut g.params.audio_bitrate_kbps);
    }

    pub fn set_resolution(&mut self, height_px: u32) {
        self.write(Node::Resolution, height_px, |g| &mut g.params.resolution);
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.write(Node::Format, format, |g| &mut g.params.format);
    }

    pub fn set_selection(&mut self, selection: Option<SelectionRange>) {
        self.write(Node::Selection, selection, |g| &mut g.selection);
    }

    pub fn set_full_duration(&mut self, secs: f64) {
        self.write(Node::FullDuration, secs, |g| &mut g.full_duration_secs);
    }

    /// Apply a generic leaf update.
    pub fn apply(&mut self, update: ParameterUpdate) -> ClipResult<()> {
        match update {
            ParameterUpdate::ClipName(name) => self.set_clip_name(name),
            ParameterUpdate::MaxFileSizeMb(mb) => self.set_max_file_size_mb(mb),
            ParameterUpdate::Framerate(fps) => self.set_framerate(fps),
            ParameterUpdate::Speed(speed) => self.set_speed(speed),
            ParameterUpdate::MuteAudio(mute) => self.set_mute_audio(mute),
            ParameterUpdate::UserBitrateKbps(kbps) => self.set_user_bitrate_kbps(kbps),
            ParameterUpdate::BitrateLock(locked) => self.set_bitrate_lock(locked),
            ParameterUpdate::AudioBitrateKbps(kbps) => self.set_audio_bitrate_kbps(kbps),
            ParameterUpdate::Resolution(height) => self.set_resolution(height),
            ParameterUpdate::Format(name) => {
                let format = OutputFormat::by_name(&name)
                    .ok_or_else(|| ClipError::config(format!("unknown output format '{name}'")))?;
                self.set_format(format);
            }
            ParameterUpdate::Selection(selection) => self.set_selection(selection),
            ParameterUpdate::FullDurationSecs(secs) => self.set_full_duration(secs),
        }
        Ok(())
    }

    /// Assemble the transcoder request for the current state.
    ///
    /// Fails with a validation error while any validation error is present.
    pub fn export_request(&self, source: &Path, output_dir: &Path) -> ClipResult<ClipRequest> {
        if !self.estimate.is_valid() {
            return Err(ClipError::validation(self.estimate.describe_errors()));
        }

        let format = &self.params.format;
        let to = output_dir.join(format!("{}.{}", self.params.clip_name, format.extension));
        let mute = self.params.mute_audio || format.has_limitation(Limitation::NoAudio);

        Ok(ClipRequest {
            from: source.to_path_buf(),
            to,
            start: self.selection.map(|range| range.start_secs),
            end: self.selection.map(|range| range.end_secs),
            video_bitrate_kbps: self.estimate.final_bitrate_kbps,
            audio_bitrate_kbps: if mute {
                0.0
            } else {
                self.estimate.calculated_audio_bitrate_kbps
            },
            framerate: self.params.framerate,
            speed: self.params.speed,
            resolution: self.params.resolution,
            mute,
            format: format.name.clone(),
            preset: format.preset.clone(),
        })
    }

    fn write<T: PartialEq>(&mut self, leaf: Node, value: T, slot: fn(&mut Self) -> &mut T) {
        let target = slot(self);
        if *target == value {
            return;
        }
        *target = value;

        let mut changed = vec![leaf];
        for node in self.dependencies.affected_by(leaf) {
            if self.recompute(node) {
                changed.push(node);
            }
        }
        tracing::debug!(?leaf, ?changed, "Encoding graph updated");
        self.notify(&changed);
    }

    /// Recompute one derived node. Returns whether its value changed.
    fn recompute(&mut self, node: Node) -> bool {
        let p = &self.params;
        let e = &self.estimate;
        match node {
            Node::Duration => {
                let value = duration_secs(self.selection, p.speed, self.full_duration_secs);
                replace_f64(&mut self.estimate.duration_secs, value)
            }
            Node::CalculatedAudioBitrate => {
                let value = if p.mute_audio {
                    0.0
                } else {
                    p.audio_bitrate_kbps
                };
                replace_f64(&mut self.estimate.calculated_audio_bitrate_kbps, value)
            }
            Node::CalculatedVideoBitrate => {
                let value = video_bitrate_kbps(
                    p.max_file_size_mb,
                    e.duration_secs,
                    e.calculated_audio_bitrate_kbps,
                );
                replace_f64(&mut self.estimate.calculated_video_bitrate_kbps, value)
            }
            Node::FinalBitrate => {
                let value = if p.bitrate_lock {
                    e.calculated_video_bitrate_kbps
                } else {
                    p.user_bitrate_kbps
                };
                replace_f64(&mut self.estimate.final_bitrate_kbps, value)
            }
            Node::EstimatedSize => {
                let value = estimated_size_bytes(
                    e.final_bitrate_kbps,
                    e.calculated_audio_bitrate_kbps,
                    e.duration_secs,
                );
                replace_f64(&mut self.estimate.estimated_size_bytes, value)
            }
            Node::ValidationErrors => {
                let value = validate(
                    &p.clip_name,
                    e.duration_secs,
                    p.framerate,
                    p.speed,
                    e.final_bitrate_kbps,
                );
                if value == e.validation_errors {
                    false
                } else {
                    self.estimate.validation_errors = value;
                    true
                }
            }
            _ => false,
        }
    }

    fn notify(&mut self, changed: &[Node]) {
        let estimate = &self.estimate;
        for subscriber in self
            .subscribers
            .iter_mut()
            .filter(|s| changed.contains(&s.node))
        {
            (subscriber.callback)(estimate);
        }
    }
}

fn replace_f64(slot: &mut f64, value: f64) -> bool {
    let unchanged = *slot == value || (slot.is_nan() && value.is_nan());
    *slot = value;
    !unchanged
}

impl SelectionSink for EncodingGraph {
    fn publish_selection(&mut self, range: SelectionRange) {
        self.set_selection(Some(range));
    }

    fn current_selection(&self) -> Option<SelectionRange> {
        self.selection
    }
}

impl fmt::Debug for EncodingGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodingGraph")
            .field("params", &self.params)
            .field("selection", &self.selection)
            .field("full_duration_secs", &self.full_duration_secs)
            .field("estimate", &self.estimate)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
