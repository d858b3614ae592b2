//! diacap Subtitles
//!
//! The I/O edges of the pipeline:
//! - **Format:** render cues as SRT or WebVTT and write them to disk
//! - **Diarize:** run an external diarization model on audio or video

pub mod diarize;
pub mod format;

pub use diarize::{diarize, DiarizeOptions, DiarizeOutcome};
pub use format::{format_cues, format_timestamp, save_subtitles};
