//! Caption generation settings: speaker-track normalization, rechunking
//! limits, speaker labels, and the output container.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::span::Speaker;

/// Everything needed to turn aligned speech into a subtitle file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Diarization normalization.
    pub track: TrackConfig,

    /// Cue packing and display rules.
    pub rechunk: RechunkConfig,

    /// Output container.
    pub format: SubtitleFormat,

    /// Also write a `.vtt` next to an `.srt` output.
    pub companion_vtt: bool,
}

/// Speaker-track normalization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Same-speaker turns separated by at most this gap (seconds) are merged.
    pub merge_gap_secs: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            merge_gap_secs: 0.02,
        }
    }
}

/// When a cue shows its speaker label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerPrefixMode {
    /// Every cue.
    Always,
    /// First cue of each speaker turn.
    #[default]
    OnChange,
    /// Never.
    Never,
}

impl FromStr for SpeakerPrefixMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "always" => Ok(Self::Always),
            "on_change" => Ok(Self::OnChange),
            "never" => Ok(Self::Never),
            other => Err(format!(
                "Unknown prefix mode: {other}. Use: always, on-change, never"
            )),
        }
    }
}

/// Cue packing limits and readability heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RechunkConfig {
    /// Maximum cue duration (seconds).
    pub max_cue_duration: f64,

    /// Cues shorter than this (seconds) are extended or merged.
    pub min_cue_duration: f64,

    /// Maximum characters of caption text per cue, prefix excluded.
    pub max_cue_chars: usize,

    /// Maximum characters per display line.
    pub max_line_chars: usize,

    /// Maximum display lines per cue.
    pub max_lines_per_cue: usize,

    /// Maximum words per display line.
    pub max_words_per_line: Option<usize>,

    /// Reading-speed cap in characters per second.
    pub max_chars_per_sec: Option<f64>,

    /// A pause this long after sentence punctuation prefers a split.
    pub soft_pause_secs: Option<f64>,

    /// A pause this long prefers a split regardless of punctuation.
    pub hard_pause_secs: Option<f64>,

    /// Pause-driven splits wait until the cue holds this many characters.
    pub min_phrase_chars: usize,

    /// A punctuation split is skipped if the next phrase has fewer words.
    pub min_phrase_words: usize,

    /// Same-speaker silence (seconds) that starts a new turn.
    pub long_pause_retag_secs: Option<f64>,

    /// Mark cues cut at a pause mid-sentence with a trailing ellipsis.
    pub ellipsis_on_pause: bool,

    /// Label template; `{speaker}` is replaced by the display name.
    pub speaker_prefix_format: Option<String>,

    pub speaker_prefix_mode: SpeakerPrefixMode,

    /// Diarization label to display name, e.g. `SPEAKER_00` to `Dave`.
    pub speaker_names: BTreeMap<String, String>,
}

impl Default for RechunkConfig {
    fn default() -> Self {
        Self {
            max_cue_duration: 6.5,
            min_cue_duration: 1.5,
            max_cue_chars: 84,
            max_line_chars: 42,
            max_lines_per_cue: 2,
            max_words_per_line: Some(8),
            max_chars_per_sec: Some(15.0),
            soft_pause_secs: Some(0.35),
            hard_pause_secs: Some(0.60),
            min_phrase_chars: 12,
            min_phrase_words: 3,
            long_pause_retag_secs: Some(10.0),
            ellipsis_on_pause: true,
            speaker_prefix_format: Some("{speaker}: ".to_string()),
            speaker_prefix_mode: SpeakerPrefixMode::OnChange,
            speaker_names: BTreeMap::new(),
        }
    }
}

impl RechunkConfig {
    /// Only the hard limits: duration, characters, lines, and speaker
    /// continuity. Pause, reading-speed, and ellipsis heuristics are off.
    pub fn strict() -> Self {
        Self::default().without_heuristics()
    }

    /// Keep the hard limits and labels of `self`, drop the heuristics.
    pub fn without_heuristics(self) -> Self {
        Self {
            max_words_per_line: None,
            max_chars_per_sec: None,
            soft_pause_secs: None,
            hard_pause_secs: None,
            min_phrase_chars: 0,
            min_phrase_words: 0,
            long_pause_retag_secs: None,
            ellipsis_on_pause: false,
            ..self
        }
    }

    /// Check that the limits describe a satisfiable packing.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_cue_duration.is_finite() && self.max_cue_duration > 0.0) {
            return Err(format!(
                "max_cue_duration must be positive, got {}",
                self.max_cue_duration
            ));
        }
        if !(self.min_cue_duration.is_finite() && self.min_cue_duration >= 0.0) {
            return Err(format!(
                "min_cue_duration must be non-negative, got {}",
                self.min_cue_duration
            ));
        }
        if self.min_cue_duration > self.max_cue_duration {
            return Err(format!(
                "min_cue_duration ({}) exceeds max_cue_duration ({})",
                self.min_cue_duration, self.max_cue_duration
            ));
        }
        if self.max_cue_chars == 0 || self.max_line_chars == 0 || self.max_lines_per_cue == 0 {
            return Err("character and line limits must be at least 1".to_string());
        }
        if self.max_words_per_line == Some(0) {
            return Err("max_words_per_line must be at least 1".to_string());
        }
        if let Some(cps) = self.max_chars_per_sec {
            if !(cps.is_finite() && cps > 0.0) {
                return Err(format!("max_chars_per_sec must be positive, got {cps}"));
            }
        }
        Ok(())
    }

    /// Display name for a diarization label.
    pub fn display_name<'a>(&'a self, speaker_id: &'a str) -> &'a str {
        self.speaker_names
            .get(speaker_id)
            .map(String::as_str)
            .unwrap_or(speaker_id)
    }

    /// Rendered label for a speaker, ignoring the prefix mode.
    ///
    /// Unknown speakers never get a label.
    pub fn render_prefix(&self, speaker: &Speaker) -> Option<String> {
        let template = self.speaker_prefix_format.as_deref()?;
        let id = speaker.id()?;
        Some(template.replace("{speaker}", self.display_name(id)))
    }
}

/// Subtitle container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    /// SubRip: `HH:MM:SS,mmm`.
    #[default]
    Srt,
    /// WebVTT: `WEBVTT` header, `HH:MM:SS.mmm`.
    Vtt,
}

impl SubtitleFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("srt") => Some(Self::Srt),
            Some("vtt") => Some(Self::Vtt),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
        }
    }
}

impl FromStr for SubtitleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" | "webvtt" => Ok(Self::Vtt),
            other => Err(format!("Unknown subtitle format: {other}. Use: srt, vtt")),
        }
    }
}
