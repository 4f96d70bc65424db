//! TOML configuration file loading
//!
//! Supports `~/.config/warden/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of
//! defaults, and environment variables win over the file.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct WardenConfigFile {
    /// Bot behavior
    #[serde(default)]
    pub bot: BotFileConfig,

    /// Voice/STT configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Moderation dispatch configuration
    #[serde(default)]
    pub moderation: ModerationFileConfig,
}

/// Bot-level configuration
#[derive(Debug, Default, Deserialize)]
pub struct BotFileConfig {
    /// Text command prefix (e.g. "!")
    pub prefix: Option<String>,

    /// Wake word stripped from the front of utterances
    pub wake_word: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable the listen-once microphone flow
    pub enabled: Option<bool>,

    /// STT provider ("whisper" or "deepgram")
    pub provider: Option<String>,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub model: Option<String>,

    /// Listening window in seconds
    pub listen_secs: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub discord: Option<String>,
    pub openai: Option<String>,
    pub deepgram: Option<String>,
}

/// Moderation dispatch configuration
#[derive(Debug, Default, Deserialize)]
pub struct ModerationFileConfig {
    /// Delay between mass-action mutation calls, in milliseconds
    pub pacing_ms: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `WardenConfigFile::default()` if the file doesn't exist or
/// can't be parsed.
#[must_use]
pub fn load_config_file() -> WardenConfigFile {
    let Some(path) = config_file_path() else {
        return WardenConfigFile::default();
    };

    if !path.exists() {
        return WardenConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                WardenConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            WardenConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/warden/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("warden").join("config.toml"))
}
