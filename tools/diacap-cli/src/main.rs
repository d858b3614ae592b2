//! diacap CLI — Speaker-attributed subtitles from diarization and transcripts.
//!
//! Usage:
//!   diacap diarize <MEDIA>                          Run speaker diarization
//!   diacap merge <TRANSCRIPT> <SPEAKERS> <OUTPUT>   Build SRT/WebVTT subtitles
//!   diacap validate <TRANSCRIPT> <SPEAKERS>         Check inputs without writing

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use diacap_common::config::{AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "diacap",
    about = "Speaker-attributed subtitles from diarization and transcripts",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: $XDG_CONFIG_HOME/diacap/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run speaker diarization on an audio or video file
    Diarize {
        /// Audio or video file (.mov, .mp4, .avi, .mkv are converted to WAV)
        input: PathBuf,

        /// Output file (default: <input>.spk.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Inference device: auto|cpu|mps
        #[arg(long)]
        device: Option<String>,

        /// Diarization command with {input} and {device} placeholders
        #[arg(long)]
        command: Option<String>,
    },

    /// Merge a transcript and speaker turns into subtitles
    Merge {
        /// Transcript JSON (flat list or Whisper output with word timings)
        transcript: PathBuf,

        /// Speaker turns JSON ([{start, end, speaker}])
        speakers: PathBuf,

        /// Subtitle file to write
        output: PathBuf,

        /// Output format: srt|vtt (default: from the output extension)
        #[arg(long)]
        format: Option<String>,

        /// Also write a .vtt next to an .srt output
        #[arg(long)]
        companion_vtt: bool,

        /// Write a JSON report of counts and anomalies
        #[arg(long)]
        report: Option<PathBuf>,

        /// Only enforce hard limits (no pause, reading-speed, or ellipsis rules)
        #[arg(long)]
        strict: bool,

        /// Maximum cue duration (seconds)
        #[arg(long)]
        max_duration: Option<f64>,

        /// Minimum cue duration (seconds)
        #[arg(long)]
        min_duration: Option<f64>,

        /// Maximum characters per cue
        #[arg(long)]
        max_chars: Option<usize>,

        /// Maximum characters per line
        #[arg(long)]
        max_line_chars: Option<usize>,

        /// Maximum lines per cue
        #[arg(long)]
        max_lines: Option<usize>,

        /// Speaker label template, e.g. ">> {speaker}\n"
        #[arg(long)]
        prefix: Option<String>,

        /// When to show the speaker label: always|on-change|never
        #[arg(long)]
        prefix_mode: Option<String>,

        /// Display name for a speaker label (repeatable)
        #[arg(long = "speaker-name", value_name = "ID=NAME")]
        speaker_names: Vec<String>,
    },

    /// Parse inputs and print a summary without writing subtitles
    Validate {
        /// Transcript JSON
        transcript: PathBuf,

        /// Speaker turns JSON
        speakers: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_error) = match &cli.config {
        Some(path) => (AppConfig::load_from(path)?, None),
        None => AppConfig::load(),
    };

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    diacap_common::logging::init_logging(&LoggingConfig {
        level,
        json: cli.log_json || config.logging.json,
        file: config.logging.file.clone(),
    });
    if let Some(e) = config_error {
        tracing::warn!("Ignoring config file: {e}");
    }

    match cli.command {
        Commands::Diarize {
            input,
            output,
            device,
            command,
        } => commands::diarize::run(input, output, device, command, config.diarization).await,
        Commands::Merge {
            transcript,
            speakers,
            output,
            format,
            companion_vtt,
            report,
            strict,
            max_duration,
            min_duration,
            max_chars,
            max_line_chars,
            max_lines,
            prefix,
            prefix_mode,
            speaker_names,
        } => commands::merge::run(
            commands::merge::MergeArgs {
                transcript,
                speakers,
                output,
                format,
                companion_vtt,
                report,
                strict,
                max_duration,
                min_duration,
                max_chars,
                max_line_chars,
                max_lines,
                prefix,
                prefix_mode,
                speaker_names,
            },
            config.captions,
        ),
        Commands::Validate {
            transcript,
            speakers,
        } => commands::validate::run(transcript, speakers, config.captions),
    }
}
