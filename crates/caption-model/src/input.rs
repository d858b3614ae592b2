//! Loading diarization and transcript JSON.
//!
//! Both inputs are produced by external models, so every record is checked
//! field by field and errors name the file and the JSON location of the bad
//! value (`[3].end`, `segments[1].words[0].start`).

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::span::{SpeakerInterval, TimeSpan, TranscriptUnit};

/// How the transcript timings were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptGranularity {
    /// A flat list of `{start, end, text}` records.
    Flat,
    /// Word timings from a Whisper-style `segments[].words[]` document.
    Word,
    /// Segment timings from a Whisper-style document without word timings.
    Segment,
}

/// A parsed transcript.
#[derive(Debug, Clone)]
pub struct TranscriptDocument {
    /// Units in file order.
    pub units: Vec<TranscriptUnit>,

    pub granularity: TranscriptGranularity,

    /// Whisper words dropped because they carried no timestamps.
    pub skipped_words: usize,

    /// Units dropped because their text was empty or whitespace.
    pub blank_units: usize,
}

/// Read and parse a diarization file.
pub fn load_diarization(path: impl AsRef<Path>) -> Result<Vec<SpeakerInterval>, InputError> {
    let path = path.as_ref();
    let content = read_input(path)?;
    parse_diarization(&content, path)
}

/// Read and parse a transcript file.
pub fn load_transcript(path: impl AsRef<Path>) -> Result<TranscriptDocument, InputError> {
    let path = path.as_ref();
    let content = read_input(path)?;
    parse_transcript(&content, path)
}

/// Parse a JSON array of `{start, end, speaker}` records.
///
/// `path` is only used for error messages.
pub fn parse_diarization(json: &str, path: &Path) -> Result<Vec<SpeakerInterval>, InputError> {
    let root = parse_json(json, path)?;
    let records = root
        .as_array()
        .ok_or_else(|| malformed(path, "$", "expected an array of speaker turns"))?;

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let at = format!("[{i}]");
            let span = span_field(record, path, &at)?;
            let speaker = string_field(record, "speaker", path, &at)?;
            Ok(SpeakerInterval::new(span, speaker.trim()))
        })
        .collect()
}

/// Parse a transcript: either a flat array of `{start, end, text}` records
/// or a Whisper-style `{segments: [...]}` document.
pub fn parse_transcript(json: &str, path: &Path) -> Result<TranscriptDocument, InputError> {
    let root = parse_json(json, path)?;

    if let Some(records) = root.as_array() {
        let mut units = Units::default();
        for (i, record) in records.iter().enumerate() {
            let at = format!("[{i}]");
            let span = span_field(record, path, &at)?;
            let text = match record.get("text") {
                Some(_) => string_field(record, "text", path, &at)?,
                None => string_field(record, "word", path, &at)?,
            };
            units.push(span, &text);
        }
        return Ok(units.into_document(TranscriptGranularity::Flat, 0));
    }

    let segments = root
        .get("segments")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            malformed(
                path,
                "$",
                "expected an array of transcript units or an object with `segments`",
            )
        })?;

    let mut words_found = Units::default();
    let mut skipped_words = 0;
    for (i, segment) in segments.iter().enumerate() {
        let Some(words) = segment.get("words").and_then(Value::as_array) else {
            continue;
        };
        for (j, word) in words.iter().enumerate() {
            let at = format!("segments[{i}].words[{j}]");
            let timed = ["start", "end", "word"]
                .iter()
                .all(|key| word.get(*key).is_some_and(|v| !v.is_null()));
            if !timed {
                skipped_words += 1;
                continue;
            }
            let span = span_field(word, path, &at)?;
            let text = string_field(word, "word", path, &at)?;
            words_found.push(span, &text);
        }
    }

    if !words_found.units.is_empty() {
        return Ok(words_found.into_document(TranscriptGranularity::Word, skipped_words));
    }

    let mut units = Units::default();
    for (i, segment) in segments.iter().enumerate() {
        let at = format!("segments[{i}]");
        let span = span_field(segment, path, &at)?;
        let text = string_field(segment, "text", path, &at)?;
        units.push(span, &text);
    }
    Ok(units.into_document(TranscriptGranularity::Segment, skipped_words))
}

/// Trimmed units, with blank text counted instead of kept.
#[derive(Default)]
struct Units {
    units: Vec<TranscriptUnit>,
    blank: usize,
}

impl Units {
    fn push(&mut self, span: TimeSpan, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            self.blank += 1;
        } else {
            self.units.push(TranscriptUnit::new(span, text));
        }
    }

    fn into_document(
        self,
        granularity: TranscriptGranularity,
        skipped_words: usize,
    ) -> TranscriptDocument {
        TranscriptDocument {
            units: self.units,
            granularity,
            skipped_words,
            blank_units: self.blank,
        }
    }
}

/// Serialize speaker turns as a compact JSON array.
pub fn serialize_diarization(turns: &[SpeakerInterval]) -> Result<String, serde_json::Error> {
    serde_json::to_string(turns)
}

fn read_input(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|e| InputError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_json(json: &str, path: &Path) -> Result<Value, InputError> {
    serde_json::from_str(json).map_err(|e| InputError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn span_field(record: &Value, path: &Path, at: &str) -> Result<TimeSpan, InputError> {
    if !record.is_object() {
        return Err(malformed(path, at, "expected an object"));
    }
    let start = number_field(record, "start", path, at)?;
    let end = number_field(record, "end", path, at)?;
    TimeSpan::new(start, end).map_err(|e| malformed(path, at, e.to_string()))
}

fn number_field(record: &Value, field: &str, path: &Path, at: &str) -> Result<f64, InputError> {
    let location = format!("{at}.{field}");
    match record.get(field) {
        Some(value) => value
            .as_f64()
            .ok_or_else(|| malformed(path, &location, format!("expected a number, got {value}"))),
        None => Err(malformed(path, &location, "missing required field")),
    }
}

fn string_field(
    record: &Value,
    field: &str,
    path: &Path,
    at: &str,
) -> Result<String, InputError> {
    let location = format!("{at}.{field}");
    match record.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(value) => Err(malformed(
            path,
            &location,
            format!("expected a string, got {value}"),
        )),
        None => Err(malformed(path, &location, "missing required field")),
    }
}

fn malformed(path: &Path, location: &str, message: impl Into<String>) -> InputError {
    InputError::MalformedInput {
        path: path.to_path_buf(),
        location: location.to_string(),
        message: message.into(),
    }
}

/// Errors raised while loading pipeline inputs.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Malformed input in {path} at {location}: {message}")]
    MalformedInput {
        path: PathBuf,
        location: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("talk.json")
    }

    #[test]
    fn test_parse_diarization_records() {
        let turns = parse_diarization(
            r#"[{"start":0.0,"end":1.5,"speaker":"SPEAKER_00"},{"start":1.5,"end":3,"speaker":"SPEAKER_01"}]"#,
            path(),
        )
        .unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].speaker, "SPEAKER_01");
        assert_eq!(turns[1].span.end(), 3.0);
    }

    #[test]
    fn test_parse_diarization_reports_location() {
        let err = parse_diarization(
            r#"[{"start":0.0,"end":1.0,"speaker":"S1"},{"start":2.0,"speaker":"S2"}]"#,
            path(),
        )
        .unwrap_err();
        match err {
            InputError::MalformedInput {
                location, message, ..
            } => {
                assert_eq!(location, "[1].end");
                assert_eq!(message, "missing required field");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_diarization_rejects_inverted_span() {
        let err = parse_diarization(r#"[{"start":3.0,"end":1.0,"speaker":"S1"}]"#, path())
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("talk.json"));
        assert!(text.contains("[0]"));
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(
            parse_diarization("not json", path()),
            Err(InputError::Parse { .. })
        ));
        assert!(matches!(
            parse_transcript(r#"{"text":"hi"}"#, path()),
            Err(InputError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_parse_flat_transcript() {
        let doc = parse_transcript(
            r#"[{"start":0.0,"end":0.5,"text":" Hi"},{"start":0.5,"end":1.2,"text":"there "}]"#,
            path(),
        )
        .unwrap();
        assert_eq!(doc.granularity, TranscriptGranularity::Flat);
        assert_eq!(doc.units[0].text, "Hi");
        assert_eq!(doc.units[1].text, "there");
    }

    #[test]
    fn test_parse_flat_transcript_wrong_type() {
        let err = parse_transcript(r#"[{"start":0.0,"end":"1","text":"Hi"}]"#, path())
            .unwrap_err();
        match err {
            InputError::MalformedInput { location, .. } => assert_eq!(location, "[0].end"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_whisper_words() {
        let doc = parse_transcript(
            r#"{"segments":[
                {"start":0.0,"end":2.0,"text":" Hello world","words":[
                    {"start":0.0,"end":0.8,"word":" Hello"},
                    {"word":" um"},
                    {"start":1.0,"end":2.0,"word":" world"}
                ]}
            ]}"#,
            path(),
        )
        .unwrap();
        assert_eq!(doc.granularity, TranscriptGranularity::Word);
        assert_eq!(doc.skipped_words, 1);
        let texts: Vec<_> = doc.units.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "world"]);
    }

    #[test]
    fn test_blank_units_are_dropped_and_counted() {
        let doc = parse_transcript(
            r#"[{"start":0.0,"end":1.0,"text":"Hi there friend"},{"start":3.0,"end":4.0,"text":" "}]"#,
            path(),
        )
        .unwrap();
        assert_eq!(doc.units.len(), 1);
        assert_eq!(doc.blank_units, 1);

        let doc = parse_transcript(
            r#"{"segments":[{"start":0.0,"end":2.0,"text":" Hi","words":[
                {"start":0.0,"end":0.5,"word":" Hi"},
                {"start":0.5,"end":0.9,"word":"  "}
            ]}]}"#,
            path(),
        )
        .unwrap();
        assert_eq!(doc.granularity, TranscriptGranularity::Word);
        assert_eq!(doc.units.len(), 1);
        assert_eq!(doc.blank_units, 1);
    }

    #[test]
    fn test_parse_whisper_segment_fallback() {
        let doc = parse_transcript(
            r#"{"segments":[
                {"start":0.0,"end":2.0,"text":" Hello world."},
                {"start":2.5,"end":4.0,"text":" Second line"}
            ]}"#,
            path(),
        )
        .unwrap();
        assert_eq!(doc.granularity, TranscriptGranularity::Segment);
        assert_eq!(doc.units.len(), 2);
        assert_eq!(doc.units[0].text, "Hello world.");
    }

    #[test]
    fn test_serialize_diarization_is_compact() {
        let turns = vec![SpeakerInterval::new(
            TimeSpan::new(0.0, 1.5).unwrap(),
            "SPEAKER_00",
        )];
        assert_eq!(
            serialize_diarization(&turns).unwrap(),
            r#"[{"start":0.0,"end":1.5,"speaker":"SPEAKER_00"}]"#
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_transcript("/nonexistent/diacap/transcript.json").unwrap_err();
        assert!(matches!(err, InputError::Io { .. }));
    }
}
