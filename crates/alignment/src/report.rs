//! Recoverable anomalies collected while building cues.

use std::fmt;

use serde::Serialize;

/// Summary of a pipeline run, written next to the subtitles on request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    pub transcript_units: usize,
    pub speaker_turns_in: usize,
    pub speaker_turns_out: usize,

    /// Distinct diarization labels after normalization.
    pub speakers: Vec<String>,

    pub out_of_order_turns: usize,
    pub out_of_order_units: usize,
    pub contested_regions: usize,
    pub straddling_units: usize,
    pub unknown_speaker_spans: usize,

    pub cue_count: usize,

    /// 1-based indices of cues exceeding the configured limits.
    pub oversized_cues: Vec<usize>,

    pub trimmed_overlaps: usize,
    pub extended_cues: usize,
    pub merged_short_cues: usize,
}

/// A non-fatal condition worth surfacing to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    OutOfOrderTurns(usize),
    OutOfOrderUnits(usize),
    UnknownSpeakerCoverage(usize),
    OversizedCues(Vec<usize>),
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::OutOfOrderTurns(n) => {
                write!(f, "{n} diarization turn(s) out of order; sorted by start")
            }
            Anomaly::OutOfOrderUnits(n) => {
                write!(f, "{n} transcript unit(s) out of order; sorted by start")
            }
            Anomaly::UnknownSpeakerCoverage(n) => {
                write!(f, "{n} transcript unit(s) not covered by any speaker")
            }
            Anomaly::OversizedCues(indices) => {
                let list: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
                write!(
                    f,
                    "{} cue(s) exceed the configured limits: #{}",
                    indices.len(),
                    list.join(", #")
                )
            }
        }
    }
}

impl PipelineReport {
    /// Conditions the user should hear about, in pipeline order.
    pub fn anomalies(&self) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        if self.out_of_order_turns > 0 {
            anomalies.push(Anomaly::OutOfOrderTurns(self.out_of_order_turns));
        }
        if self.out_of_order_units > 0 {
            anomalies.push(Anomaly::OutOfOrderUnits(self.out_of_order_units));
        }
        if self.unknown_speaker_spans > 0 {
            anomalies.push(Anomaly::UnknownSpeakerCoverage(self.unknown_speaker_spans));
        }
        if !self.oversized_cues.is_empty() {
            anomalies.push(Anomaly::OversizedCues(self.oversized_cues.clone()));
        }
        anomalies
    }

    pub fn is_clean(&self) -> bool {
        self.anomalies().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_report_has_no_anomalies() {
        let report = PipelineReport {
            transcript_units: 4,
            cue_count: 2,
            ..PipelineReport::default()
        };
        assert!(report.is_clean());
    }

    #[test]
    fn test_anomalies_in_pipeline_order() {
        let report = PipelineReport {
            out_of_order_units: 2,
            unknown_speaker_spans: 1,
            oversized_cues: vec![3, 7],
            ..PipelineReport::default()
        };
        let messages: Vec<String> = report.anomalies().iter().map(|a| a.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "2 transcript unit(s) out of order; sorted by start",
                "1 transcript unit(s) not covered by any speaker",
                "2 cue(s) exceed the configured limits: #3, #7",
            ]
        );
    }

    #[test]
    fn test_report_serializes_counts() {
        let report = PipelineReport {
            speakers: vec!["S1".to_string()],
            oversized_cues: vec![1],
            ..PipelineReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["speakers"][0], "S1");
        assert_eq!(json["oversized_cues"][0], 1);
        assert_eq!(json["cue_count"], 0);
    }
}
