//! Error types shared across diacap crates.

use std::path::PathBuf;

use diacap_alignment::PipelineError;
use diacap_caption_model::InputError;

/// Top-level error type for diacap operations.
#[derive(Debug, thiserror::Error)]
pub enum DiacapError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Diarization error: {message}")]
    Diarization { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using DiacapError.
pub type DiacapResult<T> = Result<T, DiacapError>;

impl DiacapError {
    pub fn diarization(msg: impl Into<String>) -> Self {
        Self::Diarization {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_cause() {
        assert_eq!(
            DiacapError::file_not_found("talk.mp4").to_string(),
            "File not found: talk.mp4"
        );
        assert_eq!(
            DiacapError::diarization("ffmpeg exited with 1").to_string(),
            "Diarization error: ffmpeg exited with 1"
        );
    }

    #[test]
    fn test_pipeline_errors_convert() {
        let err: DiacapError = PipelineError::EmptyTranscript.into();
        assert!(matches!(err, DiacapError::Pipeline(_)));
        assert_eq!(err.to_string(), "Transcript contains no timed units");
    }
}
