//! Configuration management for the Warden bot

pub mod file;

use std::time::Duration;

use crate::voice::Transcriber;
use crate::{Error, Result};

/// Default text command prefix
pub const DEFAULT_PREFIX: &str = "!";

/// Default wake word stripped from utterances
pub const DEFAULT_WAKE_WORD: &str = "hey bot";

/// Default listening window for the listen-once flow
pub const DEFAULT_LISTEN_SECS: u64 = 5;

/// Default delay between mass-action mutation calls
pub const DEFAULT_PACING_MS: u64 = 200;

/// Warden bot configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,

    /// Text command prefix
    pub command_prefix: String,

    /// Wake word stripped from the front of utterances
    pub wake_word: String,

    /// Voice/STT configuration
    pub voice: VoiceConfig,

    /// Moderation dispatch configuration
    pub moderation: ModerationConfig,
}

/// STT provider backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttBackend {
    Whisper,
    Deepgram,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable the listen-once microphone flow
    pub enabled: bool,

    /// Which STT service transcribes captured audio
    pub backend: SttBackend,

    /// STT model identifier
    pub model: String,

    /// Listening window for the listen-once flow
    pub listen_window: Duration,

    /// OpenAI API key (Whisper backend)
    pub openai_api_key: String,

    /// Deepgram API key
    pub deepgram_api_key: String,
}

impl VoiceConfig {
    /// Build the transcriber for the configured backend
    ///
    /// # Errors
    ///
    /// Returns error if the backend's API key is missing
    pub fn transcriber(&self) -> Result<Transcriber> {
        match self.backend {
            SttBackend::Whisper => {
                Transcriber::whisper(self.openai_api_key.clone(), self.model.clone())
            }
            SttBackend::Deepgram => {
                Transcriber::deepgram(self.deepgram_api_key.clone(), self.model.clone())
            }
        }
    }
}

/// Moderation dispatch configuration
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Delay between successive mass-action mutation calls
    pub pacing: Duration,
}

impl Config {
    /// Load configuration from the TOML file overlaid with environment
    /// variables (environment wins)
    ///
    /// # Errors
    ///
    /// Returns error if the Discord token is missing or the STT provider
    /// name is unknown
    pub fn load() -> Result<Self> {
        let file = file::load_config_file();

        let discord_token = env_var("DISCORD_TOKEN")
            .or(file.api_keys.discord)
            .ok_or_else(|| {
                Error::Config(
                    "DISCORD_TOKEN not set (environment or api_keys.discord in config.toml)"
                        .to_string(),
                )
            })?;

        let command_prefix = env_var("WARDEN_PREFIX")
            .or(file.bot.prefix)
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let wake_word = env_var("WARDEN_WAKE_WORD")
            .or(file.bot.wake_word)
            .unwrap_or_else(|| DEFAULT_WAKE_WORD.to_string())
            .to_lowercase();

        let backend = match env_var("WARDEN_STT_PROVIDER")
            .or(file.voice.provider)
            .as_deref()
        {
            None | Some("whisper") => SttBackend::Whisper,
            Some("deepgram") => SttBackend::Deepgram,
            Some(other) => {
                return Err(Error::Config(format!("unknown STT provider '{other}'")));
            }
        };

        let model = env_var("WARDEN_STT_MODEL")
            .or(file.voice.model)
            .unwrap_or_else(|| match backend {
                SttBackend::Whisper => "whisper-1".to_string(),
                SttBackend::Deepgram => "nova-2".to_string(),
            });

        let listen_secs = env_var("WARDEN_LISTEN_SECS")
            .and_then(|v| v.parse().ok())
            .or(file.voice.listen_secs)
            .unwrap_or(DEFAULT_LISTEN_SECS);

        let enabled = env_var("WARDEN_DISABLE_VOICE").is_none()
            && file.voice.enabled.unwrap_or(true);

        let pacing_ms = env_var("WARDEN_PACING_MS")
            .and_then(|v| v.parse().ok())
            .or(file.moderation.pacing_ms)
            .unwrap_or(DEFAULT_PACING_MS);

        Ok(Self {
            discord_token,
            command_prefix,
            wake_word,
            voice: VoiceConfig {
                enabled,
                backend,
                model,
                listen_window: Duration::from_secs(listen_secs),
                openai_api_key: env_var("OPENAI_API_KEY")
                    .or(file.api_keys.openai)
                    .unwrap_or_default(),
                deepgram_api_key: env_var("DEEPGRAM_API_KEY")
                    .or(file.api_keys.deepgram)
                    .unwrap_or_default(),
            },
            moderation: ModerationConfig {
                pacing: Duration::from_millis(pacing_ms),
            },
        })
    }
}

/// Read a non-empty environment variable
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
