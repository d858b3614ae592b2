//! Speaker-track normalization.
//!
//! Diarization models emit turns that arrive unsorted, overlap during
//! simultaneous speech, and fragment one speaker's turn into many pieces.
//! [`SpeakerTrackBuilder`] turns that into a [`SpeakerTimeline`]: sorted,
//! non-overlapping, with adjacent same-speaker turns merged.
//!
//! # Overlap policy
//!
//! Most recent speaker wins. The timeline is cut at every turn boundary, and
//! each resulting region belongs to the covering turn with the latest start.
//! When two turns start at the same instant, the one listed later in the
//! input wins. A speaker whose turn encloses a shorter, later turn resumes
//! once that turn ends.

use std::collections::BTreeSet;

use diacap_caption_model::settings::TrackConfig;
use diacap_caption_model::span::{Speaker, SpeakerInterval, TimeSpan};

/// Sorted, non-overlapping speaker turns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeakerTimeline {
    turns: Vec<SpeakerInterval>,
}

impl SpeakerTimeline {
    /// A timeline with no turns; every instant resolves to [`Speaker::Unknown`].
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[SpeakerInterval] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Distinct speaker labels, sorted.
    pub fn speakers(&self) -> BTreeSet<&str> {
        self.turns.iter().map(|t| t.speaker.as_str()).collect()
    }

    /// Turns interleaved with explicit [`Speaker::Unknown`] gaps.
    pub fn segments(&self) -> Vec<(TimeSpan, Speaker)> {
        let mut out = Vec::with_capacity(self.turns.len() * 2);
        let mut cursor: Option<f64> = None;
        for turn in &self.turns {
            if let Some(prev_end) = cursor {
                if turn.span.start() > prev_end {
                    out.push((
                        TimeSpan::ordered(prev_end, turn.span.start()),
                        Speaker::Unknown,
                    ));
                }
            }
            out.push((turn.span, Speaker::known(turn.speaker.clone())));
            cursor = Some(turn.span.end());
        }
        out
    }

    /// Speaker at instant `t`, treating turns as half-open `[start, end)`
    /// except the last, which also covers its end.
    pub fn speaker_at(&self, t: f64) -> Speaker {
        let idx = self.turns.partition_point(|turn| turn.span.start() <= t);
        if idx == 0 {
            return Speaker::Unknown;
        }
        let turn = &self.turns[idx - 1];
        let is_last = idx == self.turns.len();
        if t < turn.span.end() || (is_last && t == turn.span.end()) {
            Speaker::known(turn.speaker.clone())
        } else {
            Speaker::Unknown
        }
    }
}

/// Counters collected while normalizing a diarization result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackStats {
    /// Turns received.
    pub input_turns: usize,
    /// Turns that started before their predecessor in the input.
    pub out_of_order: usize,
    /// Zero-length turns discarded.
    pub empty_turns: usize,
    /// Regions claimed by more than one speaker.
    pub contested_regions: usize,
}

/// Builds a [`SpeakerTimeline`] from raw diarization turns.
#[derive(Debug, Clone)]
pub struct SpeakerTrackBuilder {
    merge_gap_secs: f64,
}

impl Default for SpeakerTrackBuilder {
    fn default() -> Self {
        Self::new(&TrackConfig::default())
    }
}

impl SpeakerTrackBuilder {
    pub fn new(config: &TrackConfig) -> Self {
        Self {
            merge_gap_secs: config.merge_gap_secs.max(0.0),
        }
    }

    /// Normalize raw turns into a timeline.
    pub fn build(&self, raw: &[SpeakerInterval]) -> SpeakerTimeline {
        self.build_with_stats(raw).0
    }

    /// Normalize raw turns and report what had to be repaired.
    pub fn build_with_stats(&self, raw: &[SpeakerInterval]) -> (SpeakerTimeline, TrackStats) {
        let mut stats = TrackStats {
            input_turns: raw.len(),
            out_of_order: raw
                .windows(2)
                .filter(|pair| pair[1].span.start() < pair[0].span.start())
                .count(),
            ..TrackStats::default()
        };

        let mut sorted: Vec<&SpeakerInterval> = raw
            .iter()
            .filter(|turn| {
                let keep = !turn.span.is_empty();
                if !keep {
                    stats.empty_turns += 1;
                }
                keep
            })
            .collect();
        // Stable: equal starts keep input order, so the later one wins below.
        sorted.sort_by(|a, b| a.span.start().total_cmp(&b.span.start()));

        let mut boundaries: Vec<f64> = sorted
            .iter()
            .flat_map(|turn| [turn.span.start(), turn.span.end()])
            .collect();
        boundaries.sort_by(f64::total_cmp);
        boundaries.dedup();

        let mut turns: Vec<SpeakerInterval> = Vec::new();
        let mut active: Vec<usize> = Vec::new();
        let mut next = 0;

        for region in boundaries.windows(2) {
            let (from, to) = (region[0], region[1]);

            while next < sorted.len() && sorted[next].span.start() <= from {
                active.push(next);
                next += 1;
            }
            active.retain(|&i| sorted[i].span.end() > from);

            // Later rank means later (or equal, later-listed) start.
            let Some(&owner) = active.iter().max() else {
                continue;
            };
            let speaker = &sorted[owner].speaker;
            if active.iter().any(|&i| sorted[i].speaker != *speaker) {
                stats.contested_regions += 1;
            }

            match turns.last_mut() {
                Some(last)
                    if last.speaker == *speaker
                        && from - last.span.end() <= self.merge_gap_secs =>
                {
                    last.span = last.span.with_end(to);
                }
                _ => turns.push(SpeakerInterval::new(
                    TimeSpan::ordered(from, to),
                    speaker.clone(),
                )),
            }
        }

        tracing::debug!(
            input_turns = stats.input_turns,
            output_turns = turns.len(),
            out_of_order = stats.out_of_order,
            contested_regions = stats.contested_regions,
            "Normalized speaker track"
        );

        (SpeakerTimeline { turns }, stats)
    }
}
