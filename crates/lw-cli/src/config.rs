//! Configuration loading and management.

use std::path::{Path, PathBuf};

use chrono::Datelike;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use lw_core::SubsystemKind;
use serde::{Deserialize, Serialize};

/// A user-defined extraction rule appended to the built-in cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomMetric {
    /// Series name in the output.
    pub name: String,
    /// Literal line fragment with `XXX` where the number appears.
    pub template: String,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Anchor year for year-less timestamps. Defaults to the current year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// External kernel log converter, invoked as `<normalizer> <raw path>`.
    pub normalizer: PathBuf,

    /// Annotation rule file. Relative paths resolve against the working
    /// directory.
    pub rules_path: PathBuf,

    /// File name of the full merge, written into the input root.
    pub merged_output: String,

    /// File name of the annotated log, written into the input root.
    pub annotated_output: String,

    /// Subsystem kinds fed to the metric pipeline.
    pub metric_kinds: Vec<SubsystemKind>,

    /// Extra cascade rules.
    #[serde(default)]
    pub custom_metrics: Vec<CustomMetric>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            year: None,
            normalizer: PathBuf::from("ktime_convert"),
            rules_path: PathBuf::from("log_filters.txt"),
            merged_output: "merged_full.log".to_string(),
            annotated_output: "merged_annotated.log".to_string(),
            metric_kinds: vec![
                SubsystemKind::Kernel,
                SubsystemKind::Main,
                SubsystemKind::Sys,
            ],
            custom_metrics: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (LW_*)
        figment = figment.merge(Env::prefixed("LW_"));

        figment.extract()
    }

    /// The configured anchor year, or the current local year.
    pub fn year_or_current(&self) -> i32 {
        self.year.unwrap_or_else(|| chrono::Local::now().year())
    }
}

/// Returns the platform-specific config directory for lw.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("lw"))
}
