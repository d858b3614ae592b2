use diacap_alignment::{align, Rechunker, SpeakerTrackBuilder};
use diacap_caption_model::settings::RechunkConfig;
use diacap_caption_model::span::{
    char_len, AtomicSpan, Cue, SpeakerInterval, TimeSpan, TranscriptUnit,
};
use proptest::prelude::*;

const WORDS: &[&str] = &[
    "a", "we", "the", "okay", "right.", "Dr.", "3.5%", "really?", "meeting,", "extraordinarily",
    "so", "plan",
];

fn word() -> impl Strategy<Value = String> {
    prop::sample::select(WORDS).prop_map(str::to_string)
}

/// Units in any order, possibly overlapping or zero-length.
fn transcript() -> impl Strategy<Value = Vec<TranscriptUnit>> {
    prop::collection::vec((0.0f64..30.0, 0.0f64..3.0, word()), 1..40).prop_map(|raw| {
        raw.into_iter()
            .map(|(start, len, text)| {
                TranscriptUnit::new(TimeSpan::new(start, start + len).unwrap(), text)
            })
            .collect()
    })
}

/// Back-to-back units separated by non-negative gaps.
fn ordered_transcript() -> impl Strategy<Value = Vec<TranscriptUnit>> {
    prop::collection::vec((0.0f64..1.5, 0.0f64..2.0, word()), 1..40).prop_map(|raw| {
        let mut cursor = 0.0;
        raw.into_iter()
            .map(|(gap, len, text)| {
                let start = cursor + gap;
                cursor = start + len;
                TranscriptUnit::new(TimeSpan::new(start, cursor).unwrap(), text)
            })
            .collect()
    })
}

fn diarization() -> impl Strategy<Value = Vec<SpeakerInterval>> {
    prop::collection::vec((0.0f64..30.0, 0.0f64..8.0, 0usize..3), 0..12).prop_map(|raw| {
        raw.into_iter()
            .map(|(start, len, speaker)| {
                SpeakerInterval::new(
                    TimeSpan::new(start, start + len).unwrap(),
                    format!("S{speaker}"),
                )
            })
            .collect()
    })
}

fn aligned(transcript: &[TranscriptUnit], diarization: &[SpeakerInterval]) -> Vec<AtomicSpan> {
    let timeline = SpeakerTrackBuilder::default().build(diarization);
    align(transcript, &timeline).spans
}

/// Every cue ordered, non-overlapping, and within limits unless flagged.
fn assert_well_formed(cues: &[Cue], config: &RechunkConfig) {
    for pair in cues.windows(2) {
        assert!(pair[0].span.end() <= pair[1].span.start(), "cues overlap: {pair:?}");
    }
    for cue in cues.iter().filter(|c| !c.oversized) {
        assert!(cue.span.duration() <= config.max_cue_duration + 1e-9);
        assert!(char_len(&cue.text) <= config.max_cue_chars);
        assert!(cue.lines.len() <= config.max_lines_per_cue);
        assert!(cue.lines.iter().all(|line| char_len(line) <= config.max_line_chars));
    }
}

proptest! {
    #[test]
    fn timeline_is_ordered_and_disjoint(raw in diarization()) {
        let timeline = SpeakerTrackBuilder::default().build(&raw);
        for pair in timeline.turns().windows(2) {
            prop_assert!(pair[0].span.end() <= pair[1].span.start());
            prop_assert!(!pair[0].span.is_empty());
        }
    }

    #[test]
    fn every_unit_is_attributed_once(units in transcript(), raw in diarization()) {
        let spans = aligned(&units, &raw);
        prop_assert_eq!(spans.len(), units.len());

        let mut expected: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
        let mut actual: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        expected.sort_unstable();
        actual.sort_unstable();
        prop_assert_eq!(expected, actual);

        // Each unit keeps its own time range.
        let mut expected: Vec<(f64, f64, &str)> = units
            .iter()
            .map(|u| (u.span.start(), u.span.end(), u.text.as_str()))
            .collect();
        let mut actual: Vec<(f64, f64, &str)> = spans
            .iter()
            .map(|s| (s.span.start(), s.span.end(), s.text.as_str()))
            .collect();
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        actual.sort_by(|a, b| a.partial_cmp(b).unwrap());
        prop_assert_eq!(expected, actual);

        for pair in spans.windows(2) {
            prop_assert!(pair[0].span.start() <= pair[1].span.start());
        }
    }

    #[test]
    fn cues_never_mix_speakers(units in transcript(), raw in diarization()) {
        let spans = aligned(&units, &raw);
        let cues = Rechunker::default().rechunk(&spans);

        // Walk spans and cue words in lockstep.
        let mut cue_words = cues.iter().flat_map(|cue| {
            cue.text.split_whitespace().map(move |w| (w, &cue.speaker))
        });
        for span in &spans {
            for word in span.text.split_whitespace() {
                let (cue_word, speaker) = cue_words.next().expect("cue text ran out");
                prop_assert_eq!(cue_word, word);
                prop_assert_eq!(speaker, &span.speaker);
            }
        }
        prop_assert!(cue_words.next().is_none());
    }

    #[test]
    fn cues_respect_limits(units in transcript(), raw in diarization()) {
        let config = RechunkConfig::default();
        let cues = Rechunker::new(config.clone()).rechunk(&aligned(&units, &raw));
        assert_well_formed(&cues, &config);

        let strict = RechunkConfig { max_cue_duration: 3.0, ..RechunkConfig::strict() };
        let cues = Rechunker::new(strict.clone()).rechunk(&aligned(&units, &raw));
        assert_well_formed(&cues, &strict);
    }

    #[test]
    fn rechunking_cues_is_idempotent(units in ordered_transcript(), raw in diarization()) {
        let rechunker = Rechunker::new(RechunkConfig::strict());
        let first = rechunker.rechunk(&aligned(&units, &raw));

        let as_spans: Vec<AtomicSpan> = first
            .iter()
            .map(|cue| AtomicSpan::new(cue.span, cue.text.clone(), cue.speaker.clone()))
            .collect();
        let second = rechunker.rechunk(&as_spans);

        prop_assert_eq!(first, second);
    }
}
