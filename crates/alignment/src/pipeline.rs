//! Chains the stages: speaker track → alignment → rechunking.

use diacap_caption_model::settings::CaptionConfig;
use diacap_caption_model::span::{AtomicSpan, Cue, SpeakerInterval, TranscriptUnit};

use crate::aligner::align;
use crate::rechunk::Rechunker;
use crate::report::PipelineReport;
use crate::speaker_track::{SpeakerTimeline, SpeakerTrackBuilder};

/// Fatal conditions for a pipeline run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("Transcript contains no timed units")]
    EmptyTranscript,

    #[error("Invalid caption configuration: {message}")]
    InvalidConfig { message: String },
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub timeline: SpeakerTimeline,
    pub spans: Vec<AtomicSpan>,
    pub cues: Vec<Cue>,
    pub report: PipelineReport,
}

/// Turns a transcript and a diarization result into cues.
#[derive(Debug, Clone)]
pub struct CaptionPipeline {
    track: SpeakerTrackBuilder,
    rechunker: Rechunker,
}

impl CaptionPipeline {
    /// Validates the rechunk limits up front.
    pub fn new(config: &CaptionConfig) -> Result<Self, PipelineError> {
        config
            .rechunk
            .validate()
            .map_err(|message| PipelineError::InvalidConfig { message })?;
        if !(config.track.merge_gap_secs.is_finite() && config.track.merge_gap_secs >= 0.0) {
            return Err(PipelineError::InvalidConfig {
                message: format!(
                    "merge_gap_secs must be non-negative, got {}",
                    config.track.merge_gap_secs
                ),
            });
        }

        Ok(Self {
            track: SpeakerTrackBuilder::new(&config.track),
            rechunker: Rechunker::new(config.rechunk.clone()),
        })
    }

    pub fn run(
        &self,
        transcript: &[TranscriptUnit],
        diarization: &[SpeakerInterval],
    ) -> Result<PipelineOutput, PipelineError> {
        if transcript.is_empty() {
            return Err(PipelineError::EmptyTranscript);
        }

        let (timeline, track_stats) = self.track.build_with_stats(diarization);
        let alignment = align(transcript, &timeline);
        let rechunked = self.rechunker.rechunk_with_stats(&alignment.spans);

        let report = PipelineReport {
            transcript_units: transcript.len(),
            speaker_turns_in: track_stats.input_turns,
            speaker_turns_out: timeline.len(),
            speakers: timeline.speakers().into_iter().map(str::to_string).collect(),
            out_of_order_turns: track_stats.out_of_order,
            out_of_order_units: alignment.reordered_units,
            contested_regions: track_stats.contested_regions,
            straddling_units: alignment.straddling_units,
            unknown_speaker_spans: alignment.unknown_spans,
            cue_count: rechunked.cues.len(),
            oversized_cues: rechunked.oversized.iter().map(|i| i + 1).collect(),
            trimmed_overlaps: rechunked.trimmed_overlaps,
            extended_cues: rechunked.extended_cues,
            merged_short_cues: rechunked.merged_short_cues,
        };

        for anomaly in report.anomalies() {
            tracing::warn!("{anomaly}");
        }
        tracing::info!(
            units = report.transcript_units,
            speakers = report.speakers.len(),
            cues = report.cue_count,
            "Caption pipeline complete"
        );

        Ok(PipelineOutput {
            timeline,
            spans: alignment.spans,
            cues: rechunked.cues,
            report,
        })
    }
}
