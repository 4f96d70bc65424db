//! Voice input
//!
//! Microphone capture and speech-to-text for the listen-once flow.
//! Everything downstream of the recognized utterance lives in `command`
//! and `moderation`.

mod capture;
mod stt;

pub use capture::{AudioCapture, SAMPLE_RATE, record_window, samples_to_wav};
pub use stt::{RecognitionError, Transcriber, normalize};
