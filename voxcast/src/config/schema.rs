//! Configuration schema definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::audio::{DEFAULT_BITRATE_KBPS, OutputFormat};
use crate::llms::{DEFAULT_TEMPERATURE, GroqConfig};
use crate::speech::DeepgramConfig;
use crate::voices::{FEMALE_VOICES, VoicePools};

use super::{ConfigError, ConfigResult, OUTPUT_ENV, non_blank};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Groq completion endpoint.
    #[serde(default)]
    pub groq: GroqConfig,

    /// Deepgram speech endpoint.
    #[serde(default)]
    pub deepgram: DeepgramConfig,

    /// Model and pipeline settings.
    #[serde(default)]
    pub podcast: PodcastSettings,

    /// Where and how the podcast is written.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Model and pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodcastSettings {
    /// Model answering single queries.
    pub answer_model: String,
    /// Model writing podcast scripts.
    pub script_model: String,
    /// Sampling temperature for both models.
    pub temperature: f32,
    /// Voice used to speak single answers.
    pub answer_voice: String,
    /// Accept scripts wrapped in prose by cutting out the outermost braces.
    pub lenient_parsing: bool,
    /// Speakers synthesized at once.
    pub synthesis_concurrency: usize,
    /// Voice pools per gender.
    pub voices: VoicePools,
}

fn default_answer_model() -> String {
    "llama3-8b-8192".to_owned()
}

fn default_script_model() -> String {
    "llama3-70b-8192".to_owned()
}

impl Default for PodcastSettings {
    fn default() -> Self {
        Self {
            answer_model: default_answer_model(),
            script_model: default_script_model(),
            temperature: DEFAULT_TEMPERATURE,
            answer_voice: FEMALE_VOICES[0].to_owned(),
            lenient_parsing: false,
            synthesis_concurrency: 1,
            voices: VoicePools::default(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// File the podcast is exported to.
    pub path: PathBuf,
    /// Export container.
    pub format: OutputFormat,
    /// MP3 bit rate in kbps.
    pub bitrate_kbps: u32,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("generated_podcast.mp3"),
            format: OutputFormat::Mp3,
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
        }
    }
}

impl Config {
    /// Merge environment variables into the configuration.
    ///
    /// Empty variables are treated as unset. `VOXCAST_OUTPUT` also selects
    /// the output format when its extension is recognized.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Merge variables found by `lookup` into the configuration.
    #[must_use]
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| non_blank(lookup(name));
        self.groq.apply_env(&lookup);
        self.deepgram.apply_env(&lookup);

        if let Some(path) = lookup(OUTPUT_ENV) {
            let path = PathBuf::from(path);
            if let Some(format) = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(OutputFormat::from_extension)
            {
                self.output.format = format;
            }
            self.output.path = path;
        }

        self
    }

    /// Validate the configuration and return any issues found.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.groq.api_key.trim().is_empty() {
            issues.push(ConfigIssue::missing(
                "groq.api_key",
                format!("Set {} or groq.api_key", GroqConfig::API_KEY_ENV),
            ));
        }
        if self.deepgram.api_key.trim().is_empty() {
            issues.push(ConfigIssue::missing(
                "deepgram.api_key",
                format!("Set {} or deepgram.api_key", DeepgramConfig::API_KEY_ENV),
            ));
        }

        if !(0.0..=2.0).contains(&self.podcast.temperature) {
            issues.push(ConfigIssue::error(
                "podcast.temperature",
                "Temperature must be between 0 and 2",
            ));
        }
        if self.podcast.synthesis_concurrency == 0 {
            issues.push(ConfigIssue::error(
                "podcast.synthesis_concurrency",
                "Concurrency must be at least 1",
            ));
        }
        if self.podcast.voices.male.is_empty() || self.podcast.voices.female.is_empty() {
            issues.push(ConfigIssue::warning(
                "podcast.voices",
                "A voice pool is empty; speakers of that gender cannot be voiced",
            ));
        }

        if self.output.format == OutputFormat::Mp3
            && !crate::audio::is_supported_bitrate(self.output.bitrate_kbps)
        {
            issues.push(ConfigIssue::error(
                "output.bitrate_kbps",
                format!("{} kbps is not a valid MP3 bit rate", self.output.bitrate_kbps),
            ));
        }
        if let Some(ext) = self.output.path.extension().and_then(|e| e.to_str())
            && OutputFormat::from_extension(ext).is_some_and(|f| f != self.output.format)
        {
            issues.push(ConfigIssue::warning(
                "output.path",
                format!(
                    "Extension .{ext} does not match format {}",
                    self.output.format.extension()
                ),
            ));
        }

        issues
    }

    /// Check if the configuration is valid (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|issue| issue.level == IssueLevel::Warning)
    }

    /// Fail on the first error-level issue.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] for a missing credential and
    /// [`ConfigError::InvalidValue`] for anything else.
    pub fn ensure_valid(&self) -> ConfigResult<()> {
        match self
            .validate()
            .into_iter()
            .find(|issue| issue.level != IssueLevel::Warning)
        {
            None => Ok(()),
            Some(issue) if issue.level == IssueLevel::Missing => {
                Err(ConfigError::MissingField(format!("{} ({})", issue.path, issue.message)))
            }
            Some(issue) => Err(ConfigError::InvalidValue(issue.to_string())),
        }
    }
}

/// Configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    /// Issue severity level.
    pub level: IssueLevel,
    /// Configuration path (e.g., "groq.api_key").
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ConfigIssue {
    /// Create a missing-field issue.
    #[must_use]
    pub fn missing(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueLevel::Missing, path, message)
    }

    /// Create an error-level issue.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueLevel::Error, path, message)
    }

    /// Create a warning-level issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueLevel::Warning, path, message)
    }

    fn new(level: IssueLevel, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            IssueLevel::Missing => "MISSING",
            IssueLevel::Error => "ERROR",
            IssueLevel::Warning => "WARN",
        };
        write!(f, "[{}] {}: {}", prefix, self.path, self.message)
    }
}

/// Severity level for configuration issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// A required value such as an API key is absent.
    Missing,
    /// A value is present but unusable.
    Error,
    /// Suspicious but workable.
    Warning,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn keyed() -> Config {
        Config {
            groq: GroqConfig::new("gsk-test"),
            deepgram: DeepgramConfig::new("dg-test"),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.podcast.answer_model, "llama3-8b-8192");
        assert_eq!(config.podcast.script_model, "llama3-70b-8192");
        assert!((config.podcast.temperature - 0.4).abs() < f32::EPSILON);
        assert_eq!(config.podcast.answer_voice, "aura-stella-en");
        assert!(!config.podcast.lenient_parsing);
        assert_eq!(config.podcast.synthesis_concurrency, 1);
        assert_eq!(config.output.path, PathBuf::from("generated_podcast.mp3"));
        assert_eq!(config.output.bitrate_kbps, 128);
    }

    #[test]
    fn test_config_serialization() {
        let config = keyed();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(toml::from_str::<Config>("[llm]\nmodel = \"x\"\n").is_err());
    }

    #[test]
    fn test_missing_keys_fail_fast() {
        let config = Config::default();
        assert!(!config.is_valid());
        let err = config.ensure_valid().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f.starts_with("groq.api_key")));

        let mut config = keyed();
        config.deepgram.api_key = "   ".into();
        let err = config.ensure_valid().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f.starts_with("deepgram.api_key")));
    }

    #[test]
    fn test_keyed_config_is_valid() {
        let config = keyed();
        assert!(config.validate().is_empty());
        assert!(config.ensure_valid().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = keyed();
        config.podcast.synthesis_concurrency = 0;
        assert!(matches!(
            config.ensure_valid().unwrap_err(),
            ConfigError::InvalidValue(_)
        ));

        let mut config = keyed();
        config.podcast.temperature = 3.5;
        assert!(!config.is_valid());
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_env_keys_overlay_file_values() {
        let mut file = Config::default();
        file.groq.api_key = "gsk-file".into();
        file.deepgram.api_key = "dg-file".into();

        let config = file.with_env_from(vars(&[
            ("GROQ_API_KEY", "gsk-env"),
            ("DEEPGRAM_API_KEY", "dg-env"),
            ("DEEPGRAM_BASE_URL", "http://localhost:9000/v1"),
        ]));

        assert_eq!(config.groq.api_key, "gsk-env");
        assert_eq!(config.deepgram.api_key, "dg-env");
        assert_eq!(config.groq.base_url, GroqConfig::DEFAULT_BASE_URL);
        assert_eq!(config.deepgram.base_url, "http://localhost:9000/v1");
    }

    #[test]
    fn test_empty_env_values_are_unset() {
        let config = keyed().with_env_from(vars(&[
            ("GROQ_API_KEY", ""),
            ("DEEPGRAM_API_KEY", "   "),
            ("VOXCAST_OUTPUT", ""),
        ]));

        assert_eq!(config.groq.api_key, "gsk-test");
        assert_eq!(config.deepgram.api_key, "dg-test");
        assert_eq!(config.output, OutputSettings::default());
    }

    #[test]
    fn test_output_env_sets_path_and_format() {
        let config = keyed().with_env_from(vars(&[("VOXCAST_OUTPUT", "out/show.WAV")]));
        assert_eq!(config.output.path, PathBuf::from("out/show.WAV"));
        assert_eq!(config.output.format, OutputFormat::Wav);

        // Unknown extensions keep the configured format.
        let mut file = keyed();
        file.output.format = OutputFormat::Wav;
        let config = file.with_env_from(vars(&[("VOXCAST_OUTPUT", "show.ogg")]));
        assert_eq!(config.output.path, PathBuf::from("show.ogg"));
        assert_eq!(config.output.format, OutputFormat::Wav);
    }

    #[test]
    fn test_extension_mismatch_is_warning() {
        let mut config = keyed();
        config.output.path = PathBuf::from("show.wav");
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].level, IssueLevel::Warning);
        assert!(config.is_valid());
    }
}
