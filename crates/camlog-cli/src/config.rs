//! Configuration loading and management.

use std::path::{Path, PathBuf};

use camlog_core::MergeOptions;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Sessions up to this many bytes are merged in memory.
    pub size_threshold: u64,
    /// Fractional-second digits other logs are padded to.
    pub fractional_digits: usize,
    /// Regex for duplicate diagnostics dropped from other logs.
    pub duplicate_pattern: String,
    /// Output file name used inside the input directory.
    pub output_name: String,
}

impl Default for Config {
    fn default() -> Self {
        let options = MergeOptions::default();
        Self {
            size_threshold: options.size_threshold,
            fractional_digits: options.fractional_digits,
            duplicate_pattern: options.duplicate_pattern,
            output_name: "out.txt".to_string(),
        }
    }
}

impl Config {
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

        // Load from environment variables (CAMLOG_*)
        figment = figment.merge(Env::prefixed("CAMLOG_"));

        figment.extract()
    }

    /// Engine options carried by this configuration.
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            size_threshold: self.size_threshold,
            fractional_digits: self.fractional_digits,
            duplicate_pattern: self.duplicate_pattern.clone(),
        }
    }

    /// Output path for `input` when none is given explicitly.
    pub fn default_output(&self, input: &Path) -> PathBuf {
        input.join(&self.output_name)
    }
}

/// Returns the platform-specific config directory for camlog.
///
/// On Linux: `~/.config/camlog`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("camlog"))
}
