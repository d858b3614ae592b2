//! diacap Alignment — from two timelines to captions
//!
//! Merges a transcript and a diarization result into speaker-attributed cues:
//! - **Speaker Track:** Normalize overlapping, unsorted diarization turns
//! - **Aligner:** Attach exactly one speaker to every transcript unit
//! - **Rechunker:** Pack aligned spans into readable, bounded cues
//!
//! This crate is pure computation: no I/O, no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod aligner;
pub mod pipeline;
pub mod rechunk;
pub mod report;
pub mod speaker_track;
pub mod text;
pub mod wrap;

pub use aligner::{align, Alignment};
pub use pipeline::{CaptionPipeline, PipelineError, PipelineOutput};
pub use rechunk::{rechunk, Rechunked, Rechunker};
pub use report::{Anomaly, PipelineReport};
pub use speaker_track::{SpeakerTimeline, SpeakerTrackBuilder, TrackStats};
