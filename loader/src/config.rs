//! Mixer configuration.
//!
//! A project declares one or more mixers, each an ordered list of input
//! patterns merged into one output file.
//!
//! # Example YAML
//!
//! ```yaml
//! mixers:
//!   - name: app
//!     input:
//!       - prisma/base.prisma
//!       - prisma/features/*.prisma
//!     output: prisma/schema.prisma
//!     datasource: last
//! ```

use std::path::{Path, PathBuf};

use schema_mixer_core::{DatasourceSelection, MergeOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File names looked up, in order, when no explicit config path is given.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "schema-mixer.yml",
    "schema-mixer.yaml",
    "schema-mixer.json",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("unknown mixer `{0}`")]
    UnknownMixer(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// One merge job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixerConfig {
    /// Label used in logs and for `--mixer` selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Ordered glob patterns, directories or file paths.
    pub input: Vec<String>,
    /// Destination of the rendered schema.
    pub output: String,
    /// Which usable data-source declaration wins.
    #[serde(default)]
    pub datasource: DatasourceSelection,
}

impl MixerConfig {
    /// Returns the mixer name, or its output path when unnamed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use schema_mixer_loader::MixerConfig;
    /// let mixer: MixerConfig =
    ///     serde_yaml::from_str("input: [a.prisma]\noutput: out.prisma").unwrap();
    /// assert_eq!(mixer.label(), "out.prisma");
    /// ```
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.output)
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            datasource_selection: self.datasource,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixerFile {
    pub mixers: Vec<MixerConfig>,
}

impl MixerFile {
    /// Loads and validates a configuration file. Files ending in `.json`
    /// are read as JSON, everything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, a
    /// [`ConfigError::Yaml`] or [`ConfigError::Json`] parse error, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
        let config: Self = if is_json {
            serde_json::from_str(&text)?
        } else {
            serde_yaml::from_str(&text)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Returns the first default config file present in `root`.
    pub fn find_default(root: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }

    /// Returns the mixers whose label is in `names`, in config order. An
    /// empty `names` selects every mixer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownMixer`] for the first name that matches
    /// no mixer.
    pub fn select(&self, names: &[String]) -> Result<Vec<&MixerConfig>> {
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.mixers.iter().any(|m| m.label() == name.as_str()))
        {
            return Err(ConfigError::UnknownMixer(unknown.clone()));
        }
        Ok(self
            .mixers
            .iter()
            .filter(|m| names.is_empty() || names.iter().any(|n| n == m.label()))
            .collect())
    }

    /// Checks that there is at least one mixer and that each has inputs and
    /// an output.
    ///
    /// # Examples
    ///
    /// ```
    /// # use schema_mixer_loader::MixerFile;
    /// let config: MixerFile =
    ///     serde_yaml::from_str("mixers:\n  - input: []\n    output: schema.prisma\n").unwrap();
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.mixers.is_empty() {
            return Err(ConfigError::Invalid("no mixers defined".to_string()));
        }
        for (index, mixer) in self.mixers.iter().enumerate() {
            if mixer.output.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "mixer #{} has an empty output path",
                    index + 1
                )));
            }
            if mixer.input.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "mixer `{}` has no inputs",
                    mixer.label()
                )));
            }
        }
        Ok(())
    }
}
