//! Configuration management for MathGenius
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::curriculum::GradeLevel;
use crate::error::{MathGeniusError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Main configuration structure for MathGenius
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider configuration
    pub provider: ProviderConfig,
    /// Tutoring behaviour
    #[serde(default)]
    pub tutor: TutorConfig,
}

/// Provider configuration
///
/// Specifies which AI provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// Gemini configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
}

fn default_provider_type() -> String {
    "gemini".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            gemini: GeminiConfig::default(),
        }
    }
}

/// Gemini provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Model identifier
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API base URL; tests point this at a mock server
    #[serde(default = "default_gemini_api_base")]
    pub api_base: String,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// API key; usually supplied through `GEMINI_API_KEY` or `API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_gemini_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_seconds() -> u64 {
    120
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            api_base: default_gemini_api_base(),
            timeout_seconds: default_timeout_seconds(),
            api_key: None,
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// How math markup is shown in the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MathOutputMode {
    /// LaTeX mapped to Unicode symbols
    #[default]
    Unicode,
    /// LaTeX converted to MathML markup
    #[value(name = "mathml")]
    MathMl,
    /// Delimited LaTeX shown as-is
    Raw,
}

impl FromStr for MathOutputMode {
    type Err = MathGeniusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unicode" => Ok(Self::Unicode),
            "mathml" => Ok(Self::MathMl),
            "raw" => Ok(Self::Raw),
            other => Err(MathGeniusError::Config(format!(
                "Invalid math output mode: {}. Must be one of: unicode, mathml, raw",
                other
            ))),
        }
    }
}

impl std::fmt::Display for MathOutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unicode => write!(f, "unicode"),
            Self::MathMl => write!(f, "mathml"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

/// Tutoring behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorConfig {
    /// Grade selected when a session starts
    #[serde(default = "default_grade")]
    pub default_grade: u8,

    /// Math rendering in the terminal
    #[serde(default)]
    pub math_output: MathOutputMode,

    /// Largest file accepted as an attachment (bytes)
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,

    /// Per-operation sampling temperatures
    #[serde(default)]
    pub sampling: SamplingSettings,
}

fn default_grade() -> u8 {
    6
}

fn default_max_attachment_bytes() -> u64 {
    20 * 1024 * 1024
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            default_grade: default_grade(),
            math_output: MathOutputMode::default(),
            max_attachment_bytes: default_max_attachment_bytes(),
            sampling: SamplingSettings::default(),
        }
    }
}

impl TutorConfig {
    /// Default grade as a `GradeLevel`
    ///
    /// # Errors
    ///
    /// Returns error if `default_grade` is outside 6–9
    pub fn grade(&self) -> Result<GradeLevel> {
        GradeLevel::from_number(self.default_grade)
    }
}

/// Sampling temperatures for the three gateway operations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingSettings {
    /// Temperature for tutoring replies
    #[serde(default = "default_tutoring_temperature")]
    pub tutoring_temperature: f32,

    /// Temperature for practice problem generation
    #[serde(default = "default_practice_temperature")]
    pub practice_temperature: f32,

    /// Temperature for answer checking
    #[serde(default = "default_checking_temperature")]
    pub checking_temperature: f32,
}

fn default_tutoring_temperature() -> f32 {
    0.6
}

fn default_practice_temperature() -> f32 {
    0.8
}

fn default_checking_temperature() -> f32 {
    0.5
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            tutoring_temperature: default_tutoring_temperature(),
            practice_temperature: default_practice_temperature(),
            checking_temperature: default_checking_temperature(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            provider: ProviderConfig::default(),
            tutor: TutorConfig::default(),
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MathGeniusError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MathGeniusError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("MATHGENIUS_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(model) = std::env::var("MATHGENIUS_MODEL") {
            self.provider.gemini.model = model;
        }

        if let Ok(api_base) = std::env::var("MATHGENIUS_API_BASE") {
            self.provider.gemini.api_base = api_base;
        }

        if let Ok(timeout) = std::env::var("MATHGENIUS_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.provider.gemini.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid MATHGENIUS_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(grade) = std::env::var("MATHGENIUS_DEFAULT_GRADE") {
            if let Ok(value) = grade.parse() {
                self.tutor.default_grade = value;
            } else {
                tracing::warn!("Invalid MATHGENIUS_DEFAULT_GRADE: {}", grade);
            }
        }

        if let Ok(mode) = std::env::var("MATHGENIUS_MATH_OUTPUT") {
            match mode.parse() {
                Ok(value) => self.tutor.math_output = value,
                Err(e) => tracing::warn!("{}, keeping {}", e, self.tutor.math_output),
            }
        }

        let api_key = ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty());
        if let Some(key) = api_key {
            self.provider.gemini.api_key = Some(key);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(model) = &cli.model {
            tracing::debug!("Using model override: {}", model);
            self.provider.gemini.model = model.clone();
        }
    }

    /// Validate the configuration
    ///
    /// A missing API key is not checked here; it surfaces as a failed call.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(
                MathGeniusError::Config("Provider type cannot be empty".to_string()).into(),
            );
        }

        let valid_providers = ["gemini"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(MathGeniusError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.provider.gemini.model.trim().is_empty() {
            return Err(MathGeniusError::Config("Model cannot be empty".to_string()).into());
        }

        let api_base = &self.provider.gemini.api_base;
        match url::Url::parse(api_base) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(MathGeniusError::Config(format!(
                    "api_base must use http or https, got {}",
                    parsed.scheme()
                ))
                .into());
            }
            Err(e) => {
                return Err(MathGeniusError::Config(format!(
                    "Invalid api_base {}: {}",
                    api_base, e
                ))
                .into());
            }
        }

        if self.provider.gemini.timeout_seconds == 0 {
            return Err(MathGeniusError::Config(
                "timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        let sampling = &self.tutor.sampling;
        for (name, value) in [
            ("tutoring_temperature", sampling.tutoring_temperature),
            ("practice_temperature", sampling.practice_temperature),
            ("checking_temperature", sampling.checking_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(MathGeniusError::Config(format!(
                    "sampling.{} must be between 0.0 and 2.0",
                    name
                ))
                .into());
            }
        }

        if self.tutor.grade().is_err() {
            return Err(MathGeniusError::Config(format!(
                "default_grade must be between 6 and 9, got {}",
                self.tutor.default_grade
            ))
            .into());
        }

        if self.tutor.max_attachment_bytes == 0 {
            return Err(MathGeniusError::Config(
                "max_attachment_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
