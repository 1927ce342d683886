//! TOML settings for the `respace` binary.
//!
//! ```toml
//! [normalizer]
//! passes = ["line-endings", "hyphen-wrap", "horizontal-whitespace"]
//! protected_words = ["a", "A", "I"]
//! keep_numeric_separators = true
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Every key is optional; missing keys fall back to [`NormalizerConfig::default`].

use std::path::Path;

use miette::Diagnostic;
use respace_types::Pass;
use serde::Deserialize;
use thiserror::Error;

use crate::analyzer::{NormalizerConfig, PassList};

/// Errors from loading or applying a settings file.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(respace::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(respace::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("unknown normalization pass: \"{name}\"")]
    #[diagnostic(
        code(respace::config::unknown_pass),
        help(
            "Known passes are: line-endings, hyphen-wrap, intra-word-space, \
             hyphen-spacing, punctuation-spacing, horizontal-whitespace."
        )
    )]
    UnknownPass { name: String },
}

/// Result alias for settings operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Normalizer options.
    pub normalizer: NormalizerSettings,
    /// Log output options.
    pub logging: LoggingSettings,
}

/// `[normalizer]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NormalizerSettings {
    /// Pass names to enable. All passes when absent.
    pub passes: Option<Vec<String>>,
    /// Single-letter words the intra-word pass must not merge.
    pub protected_words: Option<Vec<char>>,
    /// Keep `3.14` intact instead of spacing it as `3. 14`.
    pub keep_numeric_separators: Option<bool>,
}

/// `[logging]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parse from TOML text.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Build the normalizer configuration these settings describe.
    pub fn normalizer_config(&self) -> ConfigResult<NormalizerConfig> {
        let mut config = NormalizerConfig::default();
        let settings = &self.normalizer;

        if let Some(names) = &settings.passes {
            config.passes = names
                .iter()
                .map(|name| {
                    name.parse::<Pass>()
                        .map_err(|e| ConfigError::UnknownPass { name: e.name })
                })
                .collect::<ConfigResult<PassList>>()?;
        }
        if let Some(words) = &settings.protected_words {
            config.protected_words = words.iter().copied().collect();
        }
        if let Some(keep) = settings.keep_numeric_separators {
            config.keep_numeric_separators = keep;
        }

        Ok(config)
    }
}
