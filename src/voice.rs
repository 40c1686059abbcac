//! Speech-to-text boundary.
//!
//! Transcription itself happens outside this crate; callers plug in any
//! engine by implementing [`Transcriber`].

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a [`Transcriber`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranscriptionError {
    #[error("no audio to transcribe")]
    EmptyAudio,
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("transcription engine failed: {0}")]
    Engine(String),
}

/// Turns recorded audio into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, TranscriptionError>;
}
