//! Time spans and the payload-carrying intervals built on top of them.
//!
//! All times are seconds from the start of the audio. A [`TimeSpan`] can only
//! be built through validating constructors, so every span in the pipeline
//! satisfies `0 <= start <= end` with finite bounds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A closed time range in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpan")]
pub struct TimeSpan {
    start: f64,
    end: f64,
}

#[derive(Deserialize)]
struct RawSpan {
    start: f64,
    end: f64,
}

impl TryFrom<RawSpan> for TimeSpan {
    type Error = SpanError;

    fn try_from(raw: RawSpan) -> Result<Self, Self::Error> {
        TimeSpan::new(raw.start, raw.end)
    }
}

/// Reasons a pair of timestamps cannot form a [`TimeSpan`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpanError {
    #[error("timestamps must be finite (start={start}, end={end})")]
    NotFinite { start: f64, end: f64 },

    #[error("timestamps must be non-negative (start={start}, end={end})")]
    Negative { start: f64, end: f64 },

    #[error("start {start} is after end {end}")]
    Inverted { start: f64, end: f64 },
}

impl TimeSpan {
    /// Build a span, rejecting NaN/infinite, negative, or inverted bounds.
    pub fn new(start: f64, end: f64) -> Result<Self, SpanError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(SpanError::NotFinite { start, end });
        }
        if start < 0.0 || end < 0.0 {
            return Err(SpanError::Negative { start, end });
        }
        if start > end {
            return Err(SpanError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a span from two instants in either order.
    ///
    /// Negative or non-finite values collapse to `0.0`.
    pub fn ordered(a: f64, b: f64) -> Self {
        let a = if a.is_finite() { a.max(0.0) } else { 0.0 };
        let b = if b.is_finite() { b.max(0.0) } else { 0.0 };
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// A zero-length span at `t`.
    pub fn instant(t: f64) -> Self {
        Self::ordered(t, t)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Length of the intersection with `other` (0 when disjoint or touching).
    pub fn overlap(&self, other: &TimeSpan) -> f64 {
        (self.end.min(other.end) - self.start.max(other.start)).max(0.0)
    }

    /// Whether `t` lies within `[start, end]`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn hull(&self, other: &TimeSpan) -> TimeSpan {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Same start, new end. An end before the start collapses to zero length.
    pub fn with_end(&self, end: f64) -> TimeSpan {
        Self::ordered(self.start, end.max(self.start))
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}, {:.3}]", self.start, self.end)
    }
}

/// Speaker attribution for a span of speech.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// A label produced by diarization, e.g. `SPEAKER_00`.
    Known(String),
    /// No diarization turn covers the span.
    Unknown,
}

impl Speaker {
    pub fn known(id: impl Into<String>) -> Self {
        Self::Known(id.into())
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Speaker::Known(id) => Some(id),
            Speaker::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Speaker::Unknown)
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Known(id) => f.write_str(id),
            Speaker::Unknown => f.write_str("unknown"),
        }
    }
}

/// One diarization turn: a span attributed to a speaker label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerInterval {
    #[serde(flatten)]
    pub span: TimeSpan,
    pub speaker: String,
}

impl SpeakerInterval {
    pub fn new(span: TimeSpan, speaker: impl Into<String>) -> Self {
        Self {
            span,
            speaker: speaker.into(),
        }
    }
}

/// A word or short phrase from the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptUnit {
    #[serde(flatten)]
    pub span: TimeSpan,
    pub text: String,
}

impl TranscriptUnit {
    pub fn new(span: TimeSpan, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }
}

/// A transcript unit with exactly one speaker attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicSpan {
    pub span: TimeSpan,
    pub text: String,
    pub speaker: Speaker,
}

impl AtomicSpan {
    pub fn new(span: TimeSpan, text: impl Into<String>, speaker: Speaker) -> Self {
        Self {
            span,
            text: text.into(),
            speaker,
        }
    }
}

/// One displayed caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Display time range.
    pub span: TimeSpan,

    /// Text of the contained spans joined by single spaces.
    pub text: String,

    /// Speaker shared by every contained span.
    pub speaker: Speaker,

    /// `text` wrapped into display lines.
    pub lines: Vec<String>,

    /// Rendered speaker label shown before the lines, if any.
    pub prefix: Option<String>,

    /// First cue of a speaker turn (speaker change or long silence).
    pub new_turn: bool,

    /// Speech continues after a pause; rendered with a trailing ellipsis.
    pub continues: bool,

    /// A single span that alone exceeds the configured limits.
    pub oversized: bool,
}

impl Cue {
    /// Text as it should appear on screen: prefix, wrapped lines, ellipsis.
    pub fn display_text(&self) -> String {
        let mut out = String::new();
        if let Some(prefix) = &self.prefix {
            out.push_str(prefix);
        }
        out.push_str(&self.lines.join("\n"));
        if self.continues {
            out.push_str(" …");
        }
        out
    }
}

/// Caption length in characters (not bytes).
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
