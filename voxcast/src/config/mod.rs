//! Configuration management for voxcast.
//!
//! Settings are layered from:
//! 1. Default values
//! 2. Config file (`~/.voxcast/config.toml`, or an explicit path)
//! 3. Environment variables (`GROQ_API_KEY`, `DEEPGRAM_API_KEY`, ...)

mod schema;

pub use schema::{Config, ConfigIssue, IssueLevel, OutputSettings, PodcastSettings};

use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// Missing required field.
    #[error("missing required config: {0}")]
    MissingField(String),
    /// Invalid value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Environment variable overriding the output path.
pub const OUTPUT_ENV: &str = "VOXCAST_OUTPUT";

/// Treat empty or whitespace-only variables as unset.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".voxcast")
}

/// Get the default config file path.
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from a specific path.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub async fn load_config_from(path: &Path) -> ConfigResult<Config> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = toml::from_str(&content)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Load the layered configuration: defaults, then the file at `path` (or
/// the default path), then environment variables.
///
/// The result is not validated; call [`Config::ensure_valid`] before use.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed.
pub async fn load(path: Option<&Path>) -> ConfigResult<Config> {
    let config = match path {
        Some(path) => load_config_from(path).await?,
        None => load_config_from(&config_path()).await?,
    };
    Ok(config.with_env())
}

/// Save configuration to a specific path.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub async fn save_config_to(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = toml::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), "saved config file");

    Ok(())
}

/// Create a default config file at `path` unless one already exists.
///
/// Returns whether a file was created.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub async fn init_config(path: &Path) -> ConfigResult<bool> {
    if path.exists() {
        debug!(path = %path.display(), "config file already exists");
        return Ok(false);
    }
    save_config_to(&Config::default(), path).await?;
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_paths() {
        let cfg_dir = default_config_dir();
        assert!(cfg_dir.ends_with(".voxcast"));

        let cfg_path = config_path();
        assert!(cfg_path.ends_with("config.toml"));
    }

    #[test]
    fn test_blank_env_values_are_unset() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(String::new())), None);
        assert_eq!(non_blank(Some("  \t".to_owned())), None);
        assert_eq!(non_blank(Some("gsk".to_owned())).as_deref(), Some("gsk"));
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = assert_fs::TempDir::new().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml"))
            .await
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child("config.toml");
        file.write_str(
            r#"
[groq]
api_key = "gsk-file"

[podcast]
script_model = "llama-3.3-70b-versatile"
synthesis_concurrency = 3

[output]
path = "show.wav"
format = "wav"
"#,
        )
        .unwrap();

        let config = load_config_from(file.path()).await.unwrap();
        assert_eq!(config.groq.api_key, "gsk-file");
        assert_eq!(config.podcast.script_model, "llama-3.3-70b-versatile");
        assert_eq!(config.podcast.synthesis_concurrency, 3);
        assert_eq!(config.podcast.answer_model, "llama3-8b-8192");
        assert_eq!(config.output.path, PathBuf::from("show.wav"));
        assert_eq!(config.output.format, crate::audio::OutputFormat::Wav);
    }

    #[tokio::test]
    async fn test_bad_toml_is_parse_error() {
        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child("config.toml");
        file.write_str("[groq\napi_key = ").unwrap();

        let err = load_config_from(file.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[tokio::test]
    async fn test_init_writes_once() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(init_config(&path).await.unwrap());
        assert!(!init_config(&path).await.unwrap());

        let config = load_config_from(&path).await.unwrap();
        assert_eq!(config, Config::default());
    }
}
