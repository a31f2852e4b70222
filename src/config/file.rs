//! TOML configuration file loading
//!
//! Supports `~/.config/vocal-assistant/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct AssistantConfigFile {
    /// Completion endpoint configuration
    #[serde(default)]
    pub completion: CompletionFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Completion endpoint configuration
#[derive(Debug, Default, Deserialize)]
pub struct CompletionFileConfig {
    /// Base URL (e.g. `https://api.openai.com/`)
    pub base_url: Option<String>,

    /// Route appended to the base URL (e.g. `v1/completions`)
    pub route: Option<String>,

    /// Model identifier (e.g. "gpt-3.5-turbo-instruct")
    pub model: Option<String>,

    /// Upper bound on generated tokens
    pub max_tokens: Option<u32>,

    /// Optional request timeout in seconds (unset means the HTTP default)
    pub timeout_secs: Option<u64>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable microphone input and speaker output
    pub enabled: Option<bool>,

    /// Base URL of the STT/TTS API
    pub base_url: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,

    /// Recognition language (ISO-639-1, e.g. "fr")
    pub language: Option<String>,

    /// Text shown when the microphone opens
    pub listen_prompt: Option<String>,

    /// Longest listening window in seconds
    pub max_listen_secs: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `AssistantConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> AssistantConfigFile {
    let Some(path) = config_file_path() else {
        return AssistantConfigFile::default();
    };

    load_config_file_from(&path)
}

/// Load the TOML config file from an explicit path
///
/// Same fallback rules as [`load_config_file`].
pub fn load_config_file_from(path: &Path) -> AssistantConfigFile {
    if !path.exists() {
        return AssistantConfigFile::default();
    }

    match std::fs::read_to_string(path) {
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
                AssistantConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            AssistantConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/vocal-assistant/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("vocal-assistant").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config_file_from(Path::new("/nonexistent/vocal/config.toml"));
        assert!(config.completion.model.is_none());
        assert!(config.api_keys.openai.is_none());
    }

    #[test]
    fn partial_file_is_an_overlay() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[completion]\nmax_tokens = 256\n\n[voice]\nlanguage = \"en\"\n"
        )
        .unwrap();

        let config = load_config_file_from(file.path());
        assert_eq!(config.completion.max_tokens, Some(256));
        assert!(config.completion.model.is_none());
        assert_eq!(config.voice.language.as_deref(), Some("en"));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[completion\nmax_tokens = ").unwrap();

        let config = load_config_file_from(file.path());
        assert!(config.completion.max_tokens.is_none());
    }
}
