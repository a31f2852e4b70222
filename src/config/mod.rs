//! Configuration management for the vocal assistant

pub mod file;

use std::time::Duration;

use secrecy::SecretString;

use crate::completion::{DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_ROUTE};
use self::file::AssistantConfigFile;

/// Default STT/TTS API base URL
pub const DEFAULT_SPEECH_URL: &str = "https://api.openai.com";

/// Prompt shown while the microphone is open
pub const DEFAULT_LISTEN_PROMPT: &str = "Parlez maintenant...";

/// Vocal assistant configuration
#[derive(Debug)]
pub struct Config {
    /// Completion endpoint configuration
    pub completion: CompletionConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Bearer token for the completion and speech APIs
    pub api_key: Option<SecretString>,
}

/// Completion endpoint configuration
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Base URL of the completion service
    pub base_url: String,

    /// Route of the completion operation, relative to `base_url`
    pub route: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Upper bound on generated tokens sent with every request
    pub max_tokens: u32,

    /// Request timeout; `None` keeps the HTTP client's default
    pub timeout: Option<Duration>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            route: DEFAULT_ROUTE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: None,
        }
    }
}

impl CompletionConfig {
    /// Full URL of the completion operation
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.route.trim_start_matches('/')
        )
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable microphone input and speaker output
    pub enabled: bool,

    /// Base URL of the STT/TTS API
    pub base_url: String,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// Recognition and synthesis language
    pub language: String,

    /// Text shown when the microphone opens
    pub listen_prompt: String,

    /// Longest listening window for one question
    pub max_listen: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_SPEECH_URL.to_string(),
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            language: "fr".to_string(),
            listen_prompt: DEFAULT_LISTEN_PROMPT.to_string(),
            max_listen: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// `disable_voice` forces the terminal adapters regardless of the file.
    #[must_use]
    pub fn load_with_options(disable_voice: bool) -> Self {
        let file = file::load_config_file();
        let config = Self::resolve(file, |key| std::env::var(key).ok(), disable_voice);

        if disable_voice {
            tracing::info!("voice explicitly disabled via --no-voice");
        }
        if config.api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY not set - completion requests will be unavailable");
        }

        config
    }

    /// Merge sources with priority: env var → config file → default
    pub fn resolve<F>(file: AssistantConfigFile, env: F, disable_voice: bool) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let completion_defaults = CompletionConfig::default();
        let completion = CompletionConfig {
            base_url: env("VOCAL_COMPLETION_URL")
                .or(file.completion.base_url)
                .unwrap_or(completion_defaults.base_url),
            route: env("VOCAL_COMPLETION_ROUTE")
                .or(file.completion.route)
                .unwrap_or(completion_defaults.route),
            model: env("VOCAL_MODEL")
                .or(file.completion.model)
                .unwrap_or(completion_defaults.model),
            max_tokens: env("VOCAL_MAX_TOKENS")
                .and_then(|s| s.parse().ok())
                .or(file.completion.max_tokens)
                .unwrap_or(completion_defaults.max_tokens),
            timeout: file.completion.timeout_secs.map(Duration::from_secs),
        };

        let voice_defaults = VoiceConfig::default();
        let voice = VoiceConfig {
            enabled: !disable_voice && file.voice.enabled.unwrap_or(voice_defaults.enabled),
            base_url: env("VOCAL_SPEECH_URL")
                .or(file.voice.base_url)
                .unwrap_or(voice_defaults.base_url),
            stt_model: env("VOCAL_STT_MODEL")
                .or(file.voice.stt_model)
                .unwrap_or(voice_defaults.stt_model),
            tts_model: env("VOCAL_TTS_MODEL")
                .or(file.voice.tts_model)
                .unwrap_or(voice_defaults.tts_model),
            tts_voice: env("VOCAL_TTS_VOICE")
                .or(file.voice.tts_voice)
                .unwrap_or(voice_defaults.tts_voice),
            tts_speed: file.voice.tts_speed.unwrap_or(voice_defaults.tts_speed),
            language: env("VOCAL_LANGUAGE")
                .or(file.voice.language)
                .unwrap_or(voice_defaults.language),
            listen_prompt: file
                .voice
                .listen_prompt
                .unwrap_or(voice_defaults.listen_prompt),
            max_listen: file
                .voice
                .max_listen_secs
                .map_or(voice_defaults.max_listen, Duration::from_secs),
        };

        let api_key = env("OPENAI_API_KEY")
            .or(file.api_keys.openai)
            .filter(|key| !key.is_empty())
            .map(SecretString::from);

        Self {
            completion,
            voice,
            api_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_completion_contract() {
        let config = Config::resolve(AssistantConfigFile::default(), env_from(&[]), false);

        assert_eq!(config.completion.model, "gpt-3.5-turbo-instruct");
        assert_eq!(config.completion.max_tokens, 700);
        assert_eq!(
            config.completion.endpoint(),
            "https://api.openai.com/v1/completions"
        );
        assert!(config.completion.timeout.is_none());
        assert_eq!(config.voice.language, "fr");
        assert_eq!(config.voice.listen_prompt, "Parlez maintenant...");
        assert!(config.voice.enabled);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn env_overrides_file() {
        let mut file = AssistantConfigFile::default();
        file.completion.model = Some("from-file".to_string());
        file.completion.max_tokens = Some(42);
        file.api_keys.openai = Some("file-key".to_string());

        let config = Config::resolve(
            file,
            env_from(&[("VOCAL_MODEL", "from-env"), ("OPENAI_API_KEY", "env-key")]),
            false,
        );

        assert_eq!(config.completion.model, "from-env");
        assert_eq!(config.completion.max_tokens, 42);
        assert_eq!(
            config.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("env-key".to_string())
        );
    }

    #[test]
    fn empty_key_is_treated_as_missing() {
        let config = Config::resolve(
            AssistantConfigFile::default(),
            env_from(&[("OPENAI_API_KEY", "")]),
            false,
        );
        assert!(config.api_key.is_none());
    }

    #[test]
    fn unparsable_max_tokens_falls_back() {
        let config = Config::resolve(
            AssistantConfigFile::default(),
            env_from(&[("VOCAL_MAX_TOKENS", "lots")]),
            false,
        );
        assert_eq!(config.completion.max_tokens, 700);
    }

    #[test]
    fn disable_voice_wins_over_file() {
        let mut file = AssistantConfigFile::default();
        file.voice.enabled = Some(true);

        let config = Config::resolve(file, env_from(&[]), true);
        assert!(!config.voice.enabled);
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let completion = CompletionConfig {
            base_url: "http://127.0.0.1:8080/".to_string(),
            route: "/v1/completions".to_string(),
            ..CompletionConfig::default()
        };
        assert_eq!(completion.endpoint(), "http://127.0.0.1:8080/v1/completions");
    }
}
