//! Global configuration types for Colloquy.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! completion endpoint, typewriter cadence, and voice-loop tuning. All
//! fields have sensible defaults so a missing or partial file still works.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Top-level configuration, loaded from `{data_dir}/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GlobalConfig {
    /// Opaque owner identity used to scope sessions when no --owner flag
    /// is given.
    #[serde(default)]
    pub owner_key: Option<String>,

    #[serde(default)]
    pub endpoint: EndpointConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub voice: VoiceConfig,
}

/// Completion endpoint settings.
///
/// The streaming/multimodal and text-only variants live at different paths
/// on the same host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the multimodal, event-stream variant.
    #[serde(default = "default_stream_path")]
    pub stream_path: String,

    /// Path of the text-only, JSON variant.
    #[serde(default = "default_text_path")]
    pub text_path: String,

    /// Optional bearer token sent as `Authorization: Bearer ...`.
    /// Never serialized back out.
    #[serde(default, skip_serializing)]
    pub bearer_token: Option<SecretString>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8084".to_string()
}

fn default_stream_path() -> String {
    "/v1/chat/completions".to_string()
}

fn default_text_path() -> String {
    "/v2/chat/completions".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            stream_path: default_stream_path(),
            text_path: default_text_path(),
            bearer_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Typewriter reveal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Interval between revealed characters, in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_tick_ms() -> u64 {
    50
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

/// Voice conversation loop tuning.
///
/// These are presentation tuning values, not invariants: the threshold is a
/// normalized 0..1 amplitude, the window is how long the level must stay
/// below it before a non-empty transcript is dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f32,

    #[serde(default = "default_silence_window_ms")]
    pub silence_window_ms: u64,

    /// Capacity of the rolling waveform level buffer.
    #[serde(default = "default_waveform_samples")]
    pub waveform_samples: usize,
}

fn default_silence_threshold() -> f32 {
    0.1
}

fn default_silence_window_ms() -> u64 {
    1500
}

fn default_waveform_samples() -> usize {
    40
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            silence_threshold: default_silence_threshold(),
            silence_window_ms: default_silence_window_ms(),
            waveform_samples: default_waveform_samples(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.endpoint.stream_path, "/v1/chat/completions");
        assert_eq!(config.endpoint.text_path, "/v2/chat/completions");
        assert_eq!(config.render.tick_ms, 50);
        assert_eq!(config.voice.silence_window_ms, 1500);
        assert_eq!(config.voice.waveform_samples, 40);
        assert!(config.owner_key.is_none());
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.endpoint.base_url, "http://127.0.0.1:8084");
        assert_eq!(config.endpoint.timeout_secs, 300);
    }

    #[test]
    fn test_deserialize_partial_section() {
        let config: GlobalConfig = toml::from_str(
            r#"
owner_key = "user@example.com"

[endpoint]
base_url = "https://llm.internal"

[voice]
silence_window_ms = 2000
"#,
        )
        .unwrap();
        assert_eq!(config.owner_key.as_deref(), Some("user@example.com"));
        assert_eq!(config.endpoint.base_url, "https://llm.internal");
        // Untouched fields keep their defaults.
        assert_eq!(config.endpoint.stream_path, "/v1/chat/completions");
        assert_eq!(config.voice.silence_window_ms, 2000);
        assert!((config.voice.silence_threshold - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bearer_token_never_serialized() {
        let mut config = GlobalConfig::default();
        config.endpoint.bearer_token = Some(SecretString::from("top-secret"));
        let out = toml::to_string(&config).unwrap();
        assert!(!out.contains("top-secret"));
        assert!(!out.contains("bearer_token"));
    }
}
