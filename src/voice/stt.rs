//! Speech-to-text (STT) processing
//!
//! Turns captured WAV audio into a normalized utterance for the command
//! interpreter, or a typed recognition failure the bot can report.

use std::time::Duration;

use thiserror::Error;

use crate::{Error as CrateError, Result};

/// Request timeout for transcription calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Why a voice-capture event produced no usable utterance
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// Audio carried no recognizable speech
    #[error("could not understand the audio")]
    Unintelligible,

    /// The recognition service rejected or failed the request
    #[error("speech recognition service error: {0}")]
    ServiceUnavailable(String),

    /// The recognition service did not answer in time
    #[error("speech recognition timed out")]
    Timeout,
}

/// Response from OpenAI Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Response from Deepgram transcription API
#[derive(serde::Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(serde::Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(serde::Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(serde::Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

/// STT provider backend
#[derive(Clone, Copy, Debug)]
enum SttProvider {
    Whisper,
    Deepgram,
}

/// Transcribes speech to normalized utterances
pub struct Transcriber {
    client: reqwest::Client,
    api_key: String,
    model: String,
    provider: SttProvider,
}

impl Transcriber {
    /// Create a transcriber backed by `OpenAI` Whisper
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn whisper(api_key: String, model: String) -> Result<Self> {
        Self::build(api_key, model, SttProvider::Whisper, "OpenAI API key")
    }

    /// Create a transcriber backed by Deepgram
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn deepgram(api_key: String, model: String) -> Result<Self> {
        Self::build(api_key, model, SttProvider::Deepgram, "Deepgram API key")
    }

    fn build(
        api_key: String,
        model: String,
        provider: SttProvider,
        key_name: &str,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(CrateError::Config(format!(
                "{key_name} required for speech recognition"
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            provider,
        })
    }

    /// Transcribe WAV audio into a normalized (lowercased, trimmed)
    /// utterance
    ///
    /// # Errors
    ///
    /// [`RecognitionError::Unintelligible`] when no speech was recognized,
    /// [`RecognitionError::Timeout`] when the service didn't answer,
    /// [`RecognitionError::ServiceUnavailable`] for everything else.
    pub async fn recognize(&self, audio: &[u8]) -> std::result::Result<String, RecognitionError> {
        let transcript = match self.provider {
            SttProvider::Whisper => self.transcribe_whisper(audio).await?,
            SttProvider::Deepgram => self.transcribe_deepgram(audio).await?,
        };

        let utterance = normalize(&transcript);
        if utterance.is_empty() {
            return Err(RecognitionError::Unintelligible);
        }

        tracing::info!(utterance = %utterance, "transcription complete");
        Ok(utterance)
    }

    /// Transcribe using OpenAI Whisper
    async fn transcribe_whisper(&self, audio: &[u8]) -> std::result::Result<String, RecognitionError> {
        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| RecognitionError::ServiceUnavailable(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(REQUEST_TIMEOUT)
            .multipart(form)
            .send()
            .await
            .map_err(request_failure)?;

        let body = check_status(response).await?;
        let result: WhisperResponse = serde_json::from_slice(&body)
            .map_err(|e| RecognitionError::ServiceUnavailable(e.to_string()))?;

        Ok(result.text)
    }

    /// Transcribe using Deepgram
    async fn transcribe_deepgram(&self, audio: &[u8]) -> std::result::Result<String, RecognitionError> {
        tracing::debug!(audio_bytes = audio.len(), "starting Deepgram transcription");

        let url = format!(
            "https://api.deepgram.com/v1/listen?model={}&punctuate=true",
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .timeout(REQUEST_TIMEOUT)
            .body(audio.to_vec())
            .send()
            .await
            .map_err(request_failure)?;

        let body = check_status(response).await?;
        let result: DeepgramResponse = serde_json::from_slice(&body)
            .map_err(|e| RecognitionError::ServiceUnavailable(e.to_string()))?;

        Ok(result
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.clone())
            .unwrap_or_default())
    }
}

/// Normalize a raw transcript into an utterance
#[must_use]
pub fn normalize(transcript: &str) -> String {
    transcript.trim().to_lowercase()
}

fn request_failure(err: reqwest::Error) -> RecognitionError {
    if err.is_timeout() {
        tracing::warn!("transcription request timed out");
        RecognitionError::Timeout
    } else {
        tracing::error!(error = %err, "transcription request failed");
        RecognitionError::ServiceUnavailable(err.to_string())
    }
}

async fn check_status(
    response: reqwest::Response,
) -> std::result::Result<Vec<u8>, RecognitionError> {
    let status = response.status();
    tracing::debug!(status = %status, "received transcription response");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, "transcription API error");
        return Err(RecognitionError::ServiceUnavailable(format!(
            "{status}: {body}"
        )));
    }

    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(request_failure)
}
