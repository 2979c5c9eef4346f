use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::normalize::NormalizerConfig;

const SETTINGS_FILE: &str = "settings.toml";

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
const MODEL_ENV: &str = "ROOM_DESIGNER_MODEL";
const ENDPOINT_ENV: &str = "ROOM_DESIGNER_ENDPOINT";
const TEMPERATURE_ENV: &str = "ROOM_DESIGNER_TEMPERATURE";
const MAX_TOKENS_ENV: &str = "ROOM_DESIGNER_MAX_TOKENS";

/// Bounded retry at the client boundary. One attempt means no retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 500,
        }
    }
}

/// Backend and sampling parameters. Part-heavy procedural replies need a
/// larger token budget than terse model-backed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.5,
            max_output_tokens: 8192,
            timeout_secs: 60,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub generation: GenerationConfig,
    pub normalizer: NormalizerConfig,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {name}: {value}")]
    Env { name: &'static str, value: String },
}

/// Default location of the settings file in the user's config directory.
pub fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "room-designer", "room-designer")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
}

/// Loads settings from `path`, or from the default location when it exists,
/// then applies environment overrides.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => default_settings_path().filter(|path| path.exists()),
    };

    let mut settings = match path {
        Some(path) => {
            debug!(path = %path.display(), "loading settings");
            let text = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&text).map_err(|source| SettingsError::Parse { path, source })?
        }
        None => Settings::default(),
    };

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok())?;
    Ok(settings)
}

/// Applies `ROOM_DESIGNER_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<(), SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    let generation = &mut settings.generation;
    if let Some(model) = lookup(MODEL_ENV) {
        generation.model = model;
    }
    if let Some(endpoint) = lookup(ENDPOINT_ENV) {
        generation.endpoint = endpoint;
    }
    if let Some(value) = lookup(TEMPERATURE_ENV) {
        generation.temperature = value.trim().parse().map_err(|_| SettingsError::Env {
            name: TEMPERATURE_ENV,
            value,
        })?;
    }
    if let Some(value) = lookup(MAX_TOKENS_ENV) {
        generation.max_output_tokens = value.trim().parse().map_err(|_| SettingsError::Env {
            name: MAX_TOKENS_ENV,
            value,
        })?;
    }
    Ok(())
}

/// API key supplied through the environment, if any.
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{Settings, SettingsError, apply_env_overrides, load_settings};
    use crate::normalize::TypePolicy;

    #[test]
    fn defaults_match_the_backend_contract() {
        let settings = Settings::default();
        assert_eq!(settings.generation.model, "gemini-2.0-flash");
        assert!((settings.generation.temperature - 0.5).abs() < 1e-6);
        assert_eq!(settings.generation.max_output_tokens, 8192);
        assert_eq!(settings.generation.retry.max_attempts, 1);
        assert_eq!(settings.normalizer.type_policy, TypePolicy::Label);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[generation]
temperature = 0.2
max_output_tokens = 2048

[generation.retry]
max_attempts = 3

[normalizer]
type_policy = "closed_set"
"#,
        )
        .expect("settings should parse");

        assert!((settings.generation.temperature - 0.2).abs() < 1e-6);
        assert_eq!(settings.generation.max_output_tokens, 2048);
        assert_eq!(settings.generation.model, "gemini-2.0-flash");
        assert_eq!(settings.generation.retry.max_attempts, 3);
        assert_eq!(settings.generation.retry.base_delay_ms, 500);
        assert_eq!(settings.normalizer.type_policy, TypePolicy::ClosedSet);
    }

    #[test]
    fn environment_overrides_apply() {
        let env = HashMap::from([
            ("ROOM_DESIGNER_MODEL", "gemini-test"),
            ("ROOM_DESIGNER_MAX_TOKENS", "512"),
        ]);
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |name| env.get(name).map(|v| v.to_string()))
            .expect("overrides should apply");
        assert_eq!(settings.generation.model, "gemini-test");
        assert_eq!(settings.generation.max_output_tokens, 512);
    }

    #[test]
    fn invalid_environment_values_are_reported() {
        let mut settings = Settings::default();
        let error = apply_env_overrides(&mut settings, |name| {
            (name == "ROOM_DESIGNER_TEMPERATURE").then(|| "warm".to_string())
        })
        .expect_err("non-numeric temperature should fail");
        assert!(matches!(error, SettingsError::Env { value, .. } if value == "warm"));
    }

    #[test]
    fn explicit_settings_file_is_loaded() {
        let path = std::env::temp_dir().join("room_ai_settings_test.toml");
        std::fs::write(&path, "[generation]\nmodel = \"from-file\"\n")
            .expect("should write settings file");

        let settings = load_settings(Some(path.as_path())).expect("settings should load");
        let _ = std::fs::remove_file(&path);

        if std::env::var("ROOM_DESIGNER_MODEL").is_err() {
            assert_eq!(settings.generation.model, "from-file");
        }
    }

    #[test]
    fn missing_settings_file_is_a_read_error() {
        let path = std::env::temp_dir().join("room_ai_settings_missing.toml");
        let error = load_settings(Some(path.as_path())).expect_err("missing file should fail");
        assert!(matches!(error, SettingsError::Read { .. }));
    }
}
