//! External speaker diarization.
//!
//! The model itself runs out of process: a configured command receives the
//! audio path and prints speaker turns as JSON on stdout. Video inputs are
//! first converted to 16 kHz mono WAV with `ffmpeg`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use diacap_caption_model::{parse_diarization, serialize_diarization, SpeakerInterval};
use diacap_common::config::{DiarizationConfig, Device};
use diacap_common::error::{DiacapError, DiacapResult};
use serde_json::Value;
use tokio::process::Command;

/// Container extensions that need audio extraction first.
pub const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "avi", "mkv"];

/// Label recorded for turns the diarization command left unlabeled.
pub const MISSING_LABEL: &str = "SPK?";

/// How to run one diarization.
#[derive(Debug, Clone, Default)]
pub struct DiarizeOptions {
    /// Program and arguments with `{input}`/`{device}` placeholders.
    pub command: Vec<String>,
    pub device: Device,
    /// Defaults to `<input stem>.spk.json` next to the input.
    pub output: Option<PathBuf>,
}

impl DiarizeOptions {
    pub fn from_config(config: &DiarizationConfig) -> Self {
        Self {
            command: config.command.clone(),
            device: config.device,
            output: None,
        }
    }
}

/// Result of a diarization run.
#[derive(Debug, Clone)]
pub struct DiarizeOutcome {
    /// Where the turns were written.
    pub output: PathBuf,
    /// The audio file handed to the command.
    pub audio: PathBuf,
    pub turns: Vec<SpeakerInterval>,
    pub elapsed: Duration,
}

/// Run diarization on `input` and write the turns as JSON.
pub async fn diarize(input: &Path, options: &DiarizeOptions) -> DiacapResult<DiarizeOutcome> {
    if !input.exists() {
        return Err(DiacapError::file_not_found(input));
    }
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input));

    let start = Instant::now();
    let audio = if is_video(input) {
        extract_audio(input).await?
    } else {
        input.to_path_buf()
    };

    let (program, args) = expand_command(&options.command, &audio, options.device)?;
    if !command_exists(&program).await {
        return Err(DiacapError::diarization(format!(
            "Diarization command not found: {program}"
        )));
    }

    tracing::info!(
        program = %program,
        device = %options.device,
        audio = %audio.display(),
        "Running diarization"
    );
    let result = Command::new(&program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| DiacapError::diarization(format!("Failed to start {program}: {e}")))?;

    if !result.status.success() {
        return Err(DiacapError::diarization(format!(
            "{program} exited with {}: {}",
            result.status,
            String::from_utf8_lossy(&result.stderr).trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&result.stdout);
    let turns = parse_turns(&stdout, Path::new(&program))?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&output, serialize_diarization(&turns)?).await?;

    let elapsed = start.elapsed();
    tracing::info!(
        segments = turns.len(),
        elapsed_secs = elapsed.as_secs_f64(),
        output = %output.display(),
        "Diarization complete"
    );

    Ok(DiarizeOutcome {
        output,
        audio,
        turns,
        elapsed,
    })
}

/// Whether the file needs audio extraction before diarization.
pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// `talk.mp4` → `talk.spk.json`.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("spk.json")
}

/// Substitute placeholders and split into program and arguments.
pub fn expand_command(
    template: &[String],
    audio: &Path,
    device: Device,
) -> DiacapResult<(String, Vec<String>)> {
    let audio = audio.to_string_lossy();
    let device = device.to_string();
    let mut parts = template
        .iter()
        .map(|part| part.replace("{input}", &audio).replace("{device}", &device));

    let program = parts.next().filter(|p| !p.trim().is_empty()).ok_or_else(|| {
        DiacapError::config(
            "No diarization command configured; set diarization.command or pass --command",
        )
    })?;
    Ok((program, parts.collect()))
}

/// Parse the command's stdout, labeling unlabeled turns [`MISSING_LABEL`].
pub fn parse_turns(stdout: &str, source: &Path) -> DiacapResult<Vec<SpeakerInterval>> {
    let mut value: Value = serde_json::from_str(stdout.trim()).map_err(|e| {
        DiacapError::diarization(format!(
            "{} did not print a JSON array of turns: {e}",
            source.display()
        ))
    })?;

    if let Value::Array(records) = &mut value {
        for record in records.iter_mut().filter_map(Value::as_object_mut) {
            let labeled = record
                .get("speaker")
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !labeled {
                record.insert("speaker".to_string(), Value::from(MISSING_LABEL));
            }
        }
    }

    Ok(parse_diarization(&value.to_string(), source)?)
}

/// Convert a video to 16 kHz mono PCM WAV next to it. An existing WAV is reused.
pub async fn extract_audio(input: &Path) -> DiacapResult<PathBuf> {
    let wav = input.with_extension("wav");
    if wav.exists() {
        tracing::info!(path = %wav.display(), "Using existing audio");
        return Ok(wav);
    }
    if !command_exists("ffmpeg").await {
        return Err(DiacapError::diarization(
            "ffmpeg not found. Please install ffmpeg and ensure it is on your PATH",
        ));
    }

    tracing::info!(from = %input.display(), to = %wav.display(), "Extracting audio");
    let result = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(input)
        .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
        .arg(&wav)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| DiacapError::diarization(format!("Failed to start ffmpeg: {e}")))?;

    if !result.status.success() {
        return Err(DiacapError::diarization(format!(
            "ffmpeg failed to convert {} to WAV: {}",
            input.display(),
            String::from_utf8_lossy(&result.stderr).trim()
        )));
    }
    Ok(wav)
}

/// Whether `binary` resolves on `PATH` (or is an existing executable path).
pub async fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg("command -v \"$1\" >/dev/null 2>&1")
        .arg("sh")
        .arg(binary)
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}
