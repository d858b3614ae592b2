//! Subtitle rendering in SRT and WebVTT formats.

use std::path::{Path, PathBuf};

use diacap_caption_model::{Cue, SubtitleFormat};
use diacap_common::error::DiacapResult;

/// Render cues in the given container. Indices are 1-based and sequential.
/// Cues without caption text are left out; a blank payload would end the
/// block early.
pub fn format_cues(cues: &[Cue], format: SubtitleFormat) -> String {
    let mut output = match format {
        SubtitleFormat::Srt => String::new(),
        SubtitleFormat::Vtt => String::from("WEBVTT\n\n"),
    };

    let blocks = cues.iter().filter(|cue| !cue.text.trim().is_empty());
    for (i, cue) in blocks.enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_timestamp(cue.span.start(), format),
            format_timestamp(cue.span.end(), format),
        ));
        output.push_str(&cue.display_text());
        output.push_str("\n\n");
    }

    output
}

/// Format seconds as `HH:MM:SS,mmm` (SRT) or `HH:MM:SS.mmm` (WebVTT).
pub fn format_timestamp(secs: f64, format: SubtitleFormat) -> String {
    let total_ms = round_to_millis(secs);
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    let separator = match format {
        SubtitleFormat::Srt => ',',
        SubtitleFormat::Vtt => '.',
    };
    format!("{hours:02}:{minutes:02}:{seconds:02}{separator}{millis:03}")
}

/// Half-up to the millisecond, from the microsecond-rounded value so that
/// `1.0005` (stored as `1.000499999…`) still rounds up.
fn round_to_millis(secs: f64) -> u64 {
    let micros = (secs.max(0.0) * 1_000_000.0).round() as u64;
    (micros + 500) / 1000
}

/// Write subtitles to `path`, plus a `.vtt` companion next to it when
/// `companion_vtt` is set and `format` is SRT. Returns the paths written.
pub fn save_subtitles(
    cues: &[Cue],
    path: &Path,
    format: SubtitleFormat,
    companion_vtt: bool,
) -> DiacapResult<Vec<PathBuf>> {
    let mut written = Vec::new();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, format_cues(cues, format))?;
    written.push(path.to_path_buf());

    if companion_vtt && format == SubtitleFormat::Srt {
        let companion = path.with_extension(SubtitleFormat::Vtt.extension());
        std::fs::write(&companion, format_cues(cues, SubtitleFormat::Vtt))?;
        written.push(companion);
    }

    tracing::info!(
        cues = cues.len(),
        format = format.extension(),
        path = %path.display(),
        "Subtitles written"
    );

    Ok(written)
}
