use diacap_alignment::{align, CaptionPipeline, Rechunker, SpeakerTrackBuilder};
use diacap_caption_model::settings::{CaptionConfig, RechunkConfig};
use diacap_caption_model::span::{Cue, Speaker, SpeakerInterval, TimeSpan, TranscriptUnit};

fn unit(start: f64, end: f64, text: &str) -> TranscriptUnit {
    TranscriptUnit::new(TimeSpan::new(start, end).unwrap(), text)
}

fn turn(start: f64, end: f64, speaker: &str) -> SpeakerInterval {
    SpeakerInterval::new(TimeSpan::new(start, end).unwrap(), speaker)
}

/// Hard limits only, and no minimum duration, so cue spans match the words.
fn exact_config() -> CaptionConfig {
    CaptionConfig {
        rechunk: RechunkConfig {
            min_cue_duration: 0.0,
            ..RechunkConfig::strict()
        },
        ..CaptionConfig::default()
    }
}

fn run(
    transcript: &[TranscriptUnit],
    diarization: &[SpeakerInterval],
    config: &CaptionConfig,
) -> Vec<Cue> {
    CaptionPipeline::new(config)
        .expect("config should be valid")
        .run(transcript, diarization)
        .expect("pipeline should succeed")
        .cues
}

#[test]
fn scenario_a_single_speaker_single_cue() {
    for config in [exact_config(), CaptionConfig::default()] {
        let cues = run(
            &[unit(0.0, 0.5, "Hi"), unit(0.5, 1.2, "there")],
            &[turn(0.0, 1.2, "S1")],
            &config,
        );

        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].speaker, Speaker::known("S1"));
        assert_eq!(cues[0].text, "Hi there");
        assert_eq!(cues[0].span, TimeSpan::new(0.0, 1.2).unwrap());
    }
}

#[test]
fn scenario_b_speaker_change_forces_split() {
    for config in [exact_config(), CaptionConfig::default()] {
        let cues = run(
            &[unit(0.0, 1.0, "Hello"), unit(1.0, 2.0, "world")],
            &[turn(0.0, 1.0, "S1"), turn(1.0, 2.0, "S2")],
            &config,
        );

        let summary: Vec<(String, &str, f64, f64)> = cues
            .iter()
            .map(|c| (c.speaker.to_string(), c.text.as_str(), c.span.start(), c.span.end()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("S1".to_string(), "Hello", 0.0, 1.0),
                ("S2".to_string(), "world", 1.0, 2.0),
            ]
        );
    }
}

#[test]
fn scenario_c_boundary_word_is_not_split() {
    let timeline =
        SpeakerTrackBuilder::default().build(&[turn(0.0, 1.0, "S1"), turn(1.0, 2.0, "S2")]);
    let alignment = align(&[unit(0.9, 1.1, "boundary")], &timeline);

    assert_eq!(alignment.spans.len(), 1);
    assert_eq!(alignment.spans[0].speaker, Speaker::known("S1"));
    assert_eq!(alignment.spans[0].span, TimeSpan::new(0.9, 1.1).unwrap());
    assert_eq!(alignment.spans[0].text, "boundary");
}

#[test]
fn scenario_d_long_run_splits_by_duration() {
    let mut config = exact_config();
    config.rechunk.max_cue_duration = 3.0;

    let transcript: Vec<TranscriptUnit> = (0..14)
        .map(|i| unit(i as f64 * 0.5, (i + 1) as f64 * 0.5, "word"))
        .collect();
    let cues = run(&transcript, &[turn(0.0, 7.0, "S1")], &config);

    assert_eq!(cues.len(), 3);
    for cue in &cues {
        assert!(cue.span.duration() <= 3.0);
        assert!(!cue.oversized);
    }
    for pair in cues.windows(2) {
        assert!(pair[0].span.end() <= pair[1].span.start());
    }
    assert_eq!(cues.first().unwrap().span.start(), 0.0);
    assert_eq!(cues.last().unwrap().span.end(), 7.0);
    let words: usize = cues.iter().map(|c| c.text.split_whitespace().count()).sum();
    assert_eq!(words, 14);
}

#[test]
fn overlapping_diarization_resolves_to_latest_speaker() {
    // S2 interjects inside a long S1 turn; S1 resumes afterwards.
    let cues = run(
        &[
            unit(0.0, 1.0, "So"),
            unit(2.1, 2.8, "right"),
            unit(4.0, 5.0, "anyway"),
        ],
        &[turn(0.0, 6.0, "S1"), turn(2.0, 3.0, "S2")],
        &exact_config(),
    );

    let speakers: Vec<String> = cues.iter().map(|c| c.speaker.to_string()).collect();
    assert_eq!(speakers, vec!["S1", "S2", "S1"]);
}

#[test]
fn default_rules_label_turns_and_mark_pauses() {
    let words = [
        (0.0, 0.4, "We"),
        (0.4, 0.8, "went"),
        (0.8, 1.2, "to"),
        (1.2, 1.6, "the"),
        (1.6, 2.0, "store"),
        (2.8, 3.2, "and"),
        (3.2, 3.6, "bought"),
        (3.6, 4.0, "some"),
        (4.0, 4.4, "bread."),
        (4.6, 5.0, "Really?"),
    ];
    let transcript: Vec<TranscriptUnit> =
        words.iter().map(|&(s, e, t)| unit(s, e, t)).collect();
    let diarization = [turn(0.0, 4.5, "SPEAKER_00"), turn(4.5, 5.0, "SPEAKER_01")];

    let mut config = CaptionConfig::default();
    config
        .rechunk
        .speaker_names
        .insert("SPEAKER_00".to_string(), "Dave".to_string());

    let cues = run(&transcript, &diarization, &config);
    let rendered: Vec<String> = cues.iter().map(Cue::display_text).collect();
    assert_eq!(
        rendered,
        vec![
            "Dave: We went to the store …",
            "and bought some bread.",
            "SPEAKER_01: Really?",
        ]
    );
    // Nothing follows the last cue, so it keeps the word's own timing.
    assert_eq!(cues[2].span, TimeSpan::new(4.6, 5.0).unwrap());
}

#[test]
fn rechunker_alone_matches_free_function() {
    let timeline = SpeakerTrackBuilder::default().build(&[turn(0.0, 3.0, "S1")]);
    let spans = align(&[unit(0.0, 1.0, "one"), unit(1.0, 2.5, "two")], &timeline).spans;
    let config = RechunkConfig::default();

    assert_eq!(
        Rechunker::new(config.clone()).rechunk(&spans),
        diacap_alignment::rechunk(&spans, &config)
    );
}
