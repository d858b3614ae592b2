//! Validate a transcript and speaker turns without writing subtitles.

use std::path::PathBuf;

use diacap_alignment::{CaptionPipeline, SpeakerTrackBuilder};
use diacap_caption_model::{load_diarization, load_transcript, CaptionConfig};

pub fn run(transcript: PathBuf, speakers: PathBuf, config: CaptionConfig) -> anyhow::Result<()> {
    println!("Validating transcript: {}", transcript.display());
    let document = load_transcript(&transcript)
        .map_err(|e| anyhow::anyhow!("Failed to load transcript: {e}"))?;
    println!("  Units: {}", document.units.len());
    println!("  Timings: {:?}", document.granularity);
    if document.skipped_words > 0 {
        println!("  Words without timestamps: {}", document.skipped_words);
    }
    if document.blank_units > 0 {
        println!("  Blank units dropped: {}", document.blank_units);
    }
    if let (Some(first), Some(last)) = (document.units.first(), document.units.last()) {
        println!(
            "  Range: {:.3}s - {:.3}s",
            first.span.start(),
            last.span.end()
        );
    }

    println!("Validating speaker turns: {}", speakers.display());
    let turns = load_diarization(&speakers)
        .map_err(|e| anyhow::anyhow!("Failed to load speaker turns: {e}"))?;
    let (timeline, stats) = SpeakerTrackBuilder::new(&config.track).build_with_stats(&turns);
    println!("  Turns: {} ({} after normalization)", stats.input_turns, timeline.len());
    println!(
        "  Speakers: {}",
        timeline.speakers().into_iter().collect::<Vec<_>>().join(", ")
    );
    if stats.empty_turns > 0 {
        println!("  Zero-length turns dropped: {}", stats.empty_turns);
    }
    if stats.contested_regions > 0 {
        println!("  Overlapping regions: {}", stats.contested_regions);
    }

    let pipeline = CaptionPipeline::new(&config)?;
    let output = pipeline.run(&document.units, &turns)?;
    let anomalies = output.report.anomalies();

    println!("  Cues: {}", output.report.cue_count);
    if anomalies.is_empty() {
        println!("\nInputs are valid.");
    } else {
        println!("\nValidation issues:");
        for anomaly in &anomalies {
            println!("  - {anomaly}");
        }
        println!(
            "\n{} issue(s) found. Subtitles can still be generated.",
            anomalies.len()
        );
    }

    Ok(())
}
