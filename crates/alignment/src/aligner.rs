//! Transcript/speaker alignment.
//!
//! Walks the transcript and the speaker timeline together (a two-pointer
//! interval intersection) and attaches exactly one speaker to every
//! transcript unit. Units are never split: a word is not spoken by two
//! people, so a unit that straddles a speaker change goes whole to the turn
//! covering its midpoint.

use diacap_caption_model::span::{AtomicSpan, Speaker, SpeakerInterval, TranscriptUnit};

use crate::speaker_track::SpeakerTimeline;

/// Result of aligning a transcript with a speaker timeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    /// One span per transcript unit, ordered by start time.
    pub spans: Vec<AtomicSpan>,

    /// Spans no diarization turn overlaps.
    pub unknown_spans: usize,

    /// Units that started before their predecessor in the input.
    pub reordered_units: usize,

    /// Units overlapping more than one speaker, resolved by midpoint.
    pub straddling_units: usize,
}

/// Attach a speaker to every transcript unit.
pub fn align(transcript: &[TranscriptUnit], timeline: &SpeakerTimeline) -> Alignment {
    let reordered_units = transcript
        .windows(2)
        .filter(|pair| pair[1].span.start() < pair[0].span.start())
        .count();

    let mut units: Vec<&TranscriptUnit> = transcript.iter().collect();
    units.sort_by(|a, b| a.span.start().total_cmp(&b.span.start()));

    let turns = timeline.turns();
    let mut alignment = Alignment {
        spans: Vec::with_capacity(units.len()),
        reordered_units,
        ..Alignment::default()
    };

    let mut first = 0;
    for unit in units {
        // Turns ending before this unit cannot touch any later unit either.
        while first < turns.len() && turns[first].span.end() < unit.span.start() {
            first += 1;
        }

        let speaker = if unit.span.is_empty() {
            timeline.speaker_at(unit.span.start())
        } else {
            let overlapping: Vec<&SpeakerInterval> = turns[first..]
                .iter()
                .take_while(|turn| turn.span.start() <= unit.span.end())
                .filter(|turn| turn.span.overlap(&unit.span) > 0.0)
                .collect();
            let turn = match overlapping.as_slice() {
                [] => None,
                [only] => Some(*only),
                [head, rest @ ..] if rest.iter().all(|t| t.speaker == head.speaker) => Some(*head),
                _ => {
                    alignment.straddling_units += 1;
                    pick_by_midpoint(unit, &overlapping)
                }
            };
            turn.map_or(Speaker::Unknown, |turn| Speaker::known(turn.speaker.clone()))
        };

        if speaker.is_unknown() {
            alignment.unknown_spans += 1;
        }
        alignment
            .spans
            .push(AtomicSpan::new(unit.span, unit.text.clone(), speaker));
    }

    tracing::debug!(
        spans = alignment.spans.len(),
        unknown = alignment.unknown_spans,
        straddling = alignment.straddling_units,
        reordered = alignment.reordered_units,
        "Aligned transcript with speaker timeline"
    );

    alignment
}

/// Units straddling a speaker change go to the turn covering the midpoint.
/// A midpoint inside a diarization gap falls back to the largest overlap.
fn pick_by_midpoint<'a>(
    unit: &TranscriptUnit,
    overlapping: &[&'a SpeakerInterval],
) -> Option<&'a SpeakerInterval> {
    resolve_covering(unit, overlapping, unit.span.midpoint()).or_else(|| {
        overlapping.iter().copied().fold(None, |best, turn| match best {
            Some(b) if b.span.overlap(&unit.span) >= turn.span.overlap(&unit.span) => Some(b),
            _ => Some(turn),
        })
    })
}

/// Among turns containing `t`, prefer the latest one starting no later than
/// the unit itself; otherwise the earliest.
fn resolve_covering<'a>(
    unit: &TranscriptUnit,
    candidates: &[&'a SpeakerInterval],
    t: f64,
) -> Option<&'a SpeakerInterval> {
    let covering = candidates.iter().copied().filter(|turn| turn.span.contains(t));
    let (started, later): (Vec<_>, Vec<_>) =
        covering.partition(|turn| turn.span.start() <= unit.span.start());

    started
        .into_iter()
        .max_by(|a, b| a.span.start().total_cmp(&b.span.start()))
        .or_else(|| {
            later
                .into_iter()
                .min_by(|a, b| a.span.start().total_cmp(&b.span.start()))
        })
}
