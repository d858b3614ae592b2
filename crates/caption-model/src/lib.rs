//! diacap Caption Model
//!
//! Defines the data contracts shared by every pipeline stage:
//! - **Spans:** time ranges, speaker turns, transcript units, atomic spans, cues
//! - **Input:** validated loading of diarization and transcript JSON
//! - **Settings:** track normalization, rechunking limits, output container
//!
//! All times are seconds from the start of the audio.

pub mod input;
pub mod settings;
pub mod span;

pub use input::*;
pub use settings::*;
pub use span::*;
