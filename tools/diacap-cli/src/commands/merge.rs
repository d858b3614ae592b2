//! Merge a transcript and speaker turns into subtitles.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use diacap_alignment::{CaptionPipeline, PipelineReport};
use diacap_caption_model::{
    load_diarization, load_transcript, CaptionConfig, SpeakerPrefixMode, SubtitleFormat,
    TranscriptGranularity,
};
use diacap_subtitles::save_subtitles;
use serde::Serialize;

/// Command-line arguments for `merge`. `None` keeps the configured value.
#[derive(Debug, Default)]
pub struct MergeArgs {
    pub transcript: PathBuf,
    pub speakers: PathBuf,
    pub output: PathBuf,
    pub format: Option<String>,
    pub companion_vtt: bool,
    pub report: Option<PathBuf>,
    pub strict: bool,
    pub max_duration: Option<f64>,
    pub min_duration: Option<f64>,
    pub max_chars: Option<usize>,
    pub max_line_chars: Option<usize>,
    pub max_lines: Option<usize>,
    pub prefix: Option<String>,
    pub prefix_mode: Option<String>,
    pub speaker_names: Vec<String>,
}

#[derive(Serialize)]
struct MergeReport<'a> {
    generated_at: DateTime<Utc>,
    transcript: &'a Path,
    speakers: &'a Path,
    outputs: &'a [PathBuf],
    granularity: TranscriptGranularity,
    skipped_words: usize,
    blank_units: usize,
    #[serde(flatten)]
    pipeline: &'a PipelineReport,
}

pub fn run(args: MergeArgs, config: CaptionConfig) -> anyhow::Result<()> {
    println!(
        "Merging {} with {}",
        args.transcript.display(),
        args.speakers.display()
    );

    let config = apply_overrides(config, &args)?;
    let format = resolve_format(args.format.as_deref(), &args.output, config.format)?;

    let transcript = load_transcript(&args.transcript)
        .map_err(|e| anyhow::anyhow!("Failed to load transcript: {e}"))?;
    let diarization = load_diarization(&args.speakers)
        .map_err(|e| anyhow::anyhow!("Failed to load speaker turns: {e}"))?;

    println!(
        "  Transcript: {} units ({:?} timings)",
        transcript.units.len(),
        transcript.granularity
    );
    if transcript.skipped_words > 0 {
        println!(
            "  Skipped {} word(s) without timestamps",
            transcript.skipped_words
        );
    }
    if transcript.blank_units > 0 {
        println!("  Dropped {} blank unit(s)", transcript.blank_units);
    }
    println!("  Speaker turns: {}", diarization.len());

    let pipeline = CaptionPipeline::new(&config)?;
    let output = pipeline.run(&transcript.units, &diarization)?;

    let written = save_subtitles(&output.cues, &args.output, format, config.companion_vtt)?;

    let report = &output.report;
    println!(
        "  Speakers: {}",
        if report.speakers.is_empty() {
            "none".to_string()
        } else {
            report.speakers.join(", ")
        }
    );
    println!("  Cues: {}", report.cue_count);
    for anomaly in report.anomalies() {
        println!("  Warning: {anomaly}");
    }

    if let Some(report_path) = &args.report {
        let merge_report = MergeReport {
            generated_at: Utc::now(),
            transcript: &args.transcript,
            speakers: &args.speakers,
            outputs: &written,
            granularity: transcript.granularity,
            skipped_words: transcript.skipped_words,
            blank_units: transcript.blank_units,
            pipeline: report,
        };
        std::fs::write(report_path, serde_json::to_string_pretty(&merge_report)?)?;
        println!("  Report: {}", report_path.display());
    }

    for path in &written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Layer command-line flags over the configured caption settings.
fn apply_overrides(mut config: CaptionConfig, args: &MergeArgs) -> anyhow::Result<CaptionConfig> {
    if args.strict {
        config.rechunk = config.rechunk.without_heuristics();
    }

    let rechunk = &mut config.rechunk;
    if let Some(secs) = args.max_duration {
        rechunk.max_cue_duration = secs;
    }
    if let Some(secs) = args.min_duration {
        rechunk.min_cue_duration = secs;
    }
    if let Some(chars) = args.max_chars {
        rechunk.max_cue_chars = chars;
    }
    if let Some(chars) = args.max_line_chars {
        rechunk.max_line_chars = chars;
    }
    if let Some(lines) = args.max_lines {
        rechunk.max_lines_per_cue = lines;
    }
    if let Some(prefix) = &args.prefix {
        // Shells pass "\n" literally.
        rechunk.speaker_prefix_format = Some(prefix.replace("\\n", "\n"));
    }
    if let Some(mode) = &args.prefix_mode {
        rechunk.speaker_prefix_mode = mode
            .parse::<SpeakerPrefixMode>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    for entry in &args.speaker_names {
        let (id, name) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid --speaker-name {entry:?}. Use: ID=NAME"))?;
        rechunk
            .speaker_names
            .insert(id.trim().to_string(), name.trim().to_string());
    }

    config.companion_vtt |= args.companion_vtt;
    Ok(config)
}

/// `--format` wins, then the output extension, then the configured format.
fn resolve_format(
    explicit: Option<&str>,
    output: &Path,
    configured: SubtitleFormat,
) -> anyhow::Result<SubtitleFormat> {
    match explicit {
        Some(name) => name.parse().map_err(|e: String| anyhow::anyhow!(e)),
        None => Ok(SubtitleFormat::from_path(output).unwrap_or(configured)),
    }
}
