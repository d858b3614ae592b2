//! Cue rechunking: the "spans-to-captions" packer.
//!
//! # Algorithm
//!
//! 1. **Pack** spans greedily. A span joins the open cue while the speaker is
//!    unchanged and the grown cue stays within the duration, character, line,
//!    and reading-speed limits. Otherwise the cue closes and the span opens
//!    the next one.
//! 2. **Prefer** closing at natural pauses once the cue is long enough: a
//!    hard pause, or a soft pause after sentence punctuation. Abbreviations,
//!    numbers, and a too-short following phrase veto the split.
//! 3. **Clamp** a cue ending after its successor starts (overlapping
//!    transcript units) to that start.
//! 4. **Extend** cues shorter than the minimum toward the next cue, merging
//!    with it when still short, the speaker matches, and limits allow.
//!
//! A span that alone breaks the limits is emitted as its own cue with
//! `oversized` set. Nothing is dropped or truncated.

use diacap_caption_model::settings::{RechunkConfig, SpeakerPrefixMode};
use diacap_caption_model::span::{char_len, AtomicSpan, Cue, Speaker, TimeSpan};

use crate::text::{ends_sentence, is_bad_split_token};
use crate::wrap::{wrap, wrap_lenient, WrapLimits};

/// Slack for accumulated floating-point error in duration comparisons.
const EPSILON: f64 = 1e-9;

/// Cues plus counters describing the post-passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rechunked {
    pub cues: Vec<Cue>,

    /// Zero-based indices of cues flagged `oversized`.
    pub oversized: Vec<usize>,

    /// Cues whose end was pulled back to the next cue's start.
    pub trimmed_overlaps: usize,

    /// Short cues lengthened toward `min_cue_duration`.
    pub extended_cues: usize,

    /// Short cues merged into their successor.
    pub merged_short_cues: usize,
}

/// Packs atomic spans into display cues.
#[derive(Debug, Clone)]
pub struct Rechunker {
    config: RechunkConfig,
    limits: WrapLimits,
}

impl Default for Rechunker {
    fn default() -> Self {
        Self::new(RechunkConfig::default())
    }
}

/// Rechunk `spans` with `config`.
pub fn rechunk(spans: &[AtomicSpan], config: &RechunkConfig) -> Vec<Cue> {
    Rechunker::new(config.clone()).rechunk(spans)
}

/// A cue under construction.
#[derive(Debug, Clone)]
struct Draft {
    span: TimeSpan,
    words: Vec<String>,
    speaker: Speaker,
    new_turn: bool,
    continues: bool,
}

impl Draft {
    fn open(span: &AtomicSpan, new_turn: bool) -> Self {
        Self {
            span: span.span,
            words: span.text.split_whitespace().map(str::to_string).collect(),
            speaker: span.speaker.clone(),
            new_turn,
            continues: false,
        }
    }

    fn push(&mut self, span: &AtomicSpan) {
        self.span = self.span.hull(&span.span);
        self.words
            .extend(span.text.split_whitespace().map(str::to_string));
    }

    fn absorb(&mut self, next: Draft) {
        self.span = self.span.hull(&next.span);
        self.words.extend(next.words);
        self.continues = next.continues;
    }

    fn word_refs(&self) -> Vec<&str> {
        self.words.iter().map(String::as_str).collect()
    }

    fn with_words<'a>(&'a self, text: &'a str) -> Vec<&'a str> {
        let mut words = self.word_refs();
        words.extend(text.split_whitespace());
        words
    }

    fn chars(&self) -> usize {
        joined_len(&self.word_refs())
    }

    fn ends_sentence(&self) -> bool {
        self.words.last().is_some_and(|w| ends_sentence(w))
    }
}

/// Length of `words` joined by single spaces.
fn joined_len(words: &[&str]) -> usize {
    words.iter().map(|w| char_len(w)).sum::<usize>() + words.len().saturating_sub(1)
}

impl Rechunker {
    pub fn new(config: RechunkConfig) -> Self {
        let limits = WrapLimits::from_config(&config);
        Self { config, limits }
    }

    pub fn config(&self) -> &RechunkConfig {
        &self.config
    }

    /// Pack spans into cues.
    pub fn rechunk(&self, spans: &[AtomicSpan]) -> Vec<Cue> {
        self.rechunk_with_stats(spans).cues
    }

    /// Pack spans into cues and report what the post-passes changed.
    pub fn rechunk_with_stats(&self, spans: &[AtomicSpan]) -> Rechunked {
        let mut ordered: Vec<&AtomicSpan> = spans.iter().collect();
        ordered.sort_by(|a, b| a.span.start().total_cmp(&b.span.start()));

        let mut drafts = self.pack(&ordered);
        let trimmed_overlaps = clamp_overlaps(&mut drafts);
        let (extended_cues, merged_short_cues) = self.enforce_min_duration(&mut drafts);
        let mut result = Rechunked {
            trimmed_overlaps,
            extended_cues,
            merged_short_cues,
            ..Rechunked::default()
        };

        for (index, draft) in drafts.into_iter().enumerate() {
            let cue = self.finish(draft);
            if cue.oversized {
                tracing::warn!(
                    cue = index + 1,
                    duration_secs = cue.span.duration(),
                    chars = char_len(&cue.text),
                    "Cue exceeds configured limits"
                );
                result.oversized.push(index);
            }
            result.cues.push(cue);
        }

        tracing::debug!(
            spans = spans.len(),
            cues = result.cues.len(),
            oversized = result.oversized.len(),
            trimmed = result.trimmed_overlaps,
            extended = result.extended_cues,
            merged = result.merged_short_cues,
            "Rechunked spans into cues"
        );

        result
    }

    fn pack(&self, ordered: &[&AtomicSpan]) -> Vec<Draft> {
        let Some((&first, rest)) = ordered.split_first() else {
            return Vec::new();
        };

        let mut drafts = Vec::new();
        let mut current = Draft::open(first, true);
        let mut last = first;

        for (i, &span) in rest.iter().enumerate() {
            let gap = span.span.start() - last.span.end();
            let same_speaker = span.speaker == current.speaker;
            let retag = same_speaker
                && self
                    .config
                    .long_pause_retag_secs
                    .is_some_and(|secs| gap >= secs);

            let force = !same_speaker || retag || !self.can_grow(&current, span);
            // `rest[i]` is `ordered[i + 1]`, so the phrase starting at `span`
            // is `ordered[i + 1..]`.
            let split =
                force || self.prefers_split(&current, last, gap, &ordered[i + 1..]);

            if split {
                current.continues = self.config.ellipsis_on_pause
                    && same_speaker
                    && !retag
                    && self.config.soft_pause_secs.is_some_and(|s| gap >= s)
                    && !current.ends_sentence();
                let next = Draft::open(span, !same_speaker || retag);
                drafts.push(std::mem::replace(&mut current, next));
            } else {
                current.push(span);
            }
            last = span;
        }

        drafts.push(current);
        drafts
    }

    /// Whether `span` can join `draft` without breaking a hard limit.
    fn can_grow(&self, draft: &Draft, span: &AtomicSpan) -> bool {
        let grown = draft.span.hull(&span.span);
        let words = draft.with_words(&span.text);
        self.fit_lines(&words, &grown).is_some() && self.reading_speed_ok(&words, &grown)
    }

    /// Whether to close `draft` at a natural pause before the next span.
    fn prefers_split(
        &self,
        draft: &Draft,
        last: &AtomicSpan,
        gap: f64,
        upcoming: &[&AtomicSpan],
    ) -> bool {
        let hard = self.config.hard_pause_secs.is_some_and(|h| gap >= h);
        let mut soft = self.config.soft_pause_secs.is_some_and(|s| gap >= s)
            && ends_sentence(&last.text);
        if !hard && !soft {
            return false;
        }
        if is_bad_split_token(&last.text) {
            return false;
        }
        if soft && !hard {
            let (chars, words) = self.phrase_len(upcoming);
            if chars < self.config.min_phrase_chars || words < self.config.min_phrase_words {
                soft = false;
            }
        }
        (hard || soft)
            && draft.span.duration() + EPSILON >= self.config.min_cue_duration
            && draft.chars() >= self.config.min_phrase_chars
    }

    /// Characters and words of the phrase opening `upcoming`, up to the next
    /// soft pause or speaker change. Stops counting once both minimums are met.
    fn phrase_len(&self, upcoming: &[&AtomicSpan]) -> (usize, usize) {
        let Some((&head, tail)) = upcoming.split_first() else {
            return (0, 0);
        };
        let pause = self.config.soft_pause_secs.unwrap_or(f64::INFINITY);

        let mut words: Vec<&str> = head.text.split_whitespace().collect();
        let mut prev = head;
        for &span in tail {
            if joined_len(&words) >= self.config.min_phrase_chars
                && words.len() >= self.config.min_phrase_words
            {
                break;
            }
            if span.speaker != head.speaker || span.span.start() - prev.span.end() >= pause {
                break;
            }
            words.extend(span.text.split_whitespace());
            prev = span;
        }
        (joined_len(&words), words.len())
    }

    /// Wrapped lines if `words` over `span` respects the duration, character,
    /// and line limits.
    fn fit_lines(&self, words: &[&str], span: &TimeSpan) -> Option<Vec<String>> {
        if span.duration() > self.config.max_cue_duration + EPSILON {
            return None;
        }
        if joined_len(words) > self.config.max_cue_chars {
            return None;
        }
        wrap(words, &self.limits)
    }

    fn reading_speed_ok(&self, words: &[&str], span: &TimeSpan) -> bool {
        self.config.max_chars_per_sec.map_or(true, |cps| {
            let duration = span.duration();
            duration <= 0.0 || joined_len(words) as f64 / duration <= cps
        })
    }

    fn enforce_min_duration(&self, drafts: &mut Vec<Draft>) -> (usize, usize) {
        let min = self.config.min_cue_duration;
        let (mut extended, mut merged) = (0, 0);
        let mut i = 0;

        while i < drafts.len() {
            if drafts[i].span.duration() + EPSILON >= min {
                i += 1;
                continue;
            }

            // The last cue ends with its speech.
            let bound = drafts
                .get(i + 1)
                .map_or(drafts[i].span.end(), |next| next.span.start());
            let target = (drafts[i].span.start() + min).min(bound);
            if target > drafts[i].span.end() {
                drafts[i].span = drafts[i].span.with_end(target);
                extended += 1;
            }

            let still_short = drafts[i].span.duration() + EPSILON < min;
            if still_short && i + 1 < drafts.len() && self.can_merge(&drafts[i], &drafts[i + 1]) {
                let next = drafts.remove(i + 1);
                drafts[i].absorb(next);
                merged += 1;
                continue;
            }
            i += 1;
        }

        (extended, merged)
    }

    /// Never across a speaker change or a retagged turn.
    fn can_merge(&self, draft: &Draft, next: &Draft) -> bool {
        if draft.speaker != next.speaker || next.new_turn {
            return false;
        }
        let merged_span = draft.span.hull(&next.span);
        let mut words = draft.word_refs();
        words.extend(next.words.iter().map(String::as_str));
        self.fit_lines(&words, &merged_span).is_some()
            && self.reading_speed_ok(&words, &merged_span)
    }

    fn finish(&self, draft: Draft) -> Cue {
        let words = draft.word_refs();
        let fitted = self.fit_lines(&words, &draft.span);
        let oversized = fitted.is_none();
        let lines = fitted.unwrap_or_else(|| wrap_lenient(&words, &self.limits));

        let prefix = match self.config.speaker_prefix_mode {
            SpeakerPrefixMode::Always => self.config.render_prefix(&draft.speaker),
            SpeakerPrefixMode::OnChange if draft.new_turn => {
                self.config.render_prefix(&draft.speaker)
            }
            _ => None,
        };

        Cue {
            span: draft.span,
            text: draft.words.join(" "),
            speaker: draft.speaker,
            lines,
            prefix,
            new_turn: draft.new_turn,
            continues: draft.continues,
            oversized,
        }
    }
}

/// Pull each cue's end back to its successor's start. Returns how many moved.
fn clamp_overlaps(drafts: &mut [Draft]) -> usize {
    let mut trimmed = 0;
    for i in 1..drafts.len() {
        let next_start = drafts[i].span.start();
        let previous = &mut drafts[i - 1];
        if previous.span.end() > next_start {
            previous.span = previous.span.with_end(next_start);
            trimmed += 1;
        }
    }
    trimmed
}
