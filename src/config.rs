//! Configuration file handling.
//!
//! This module provides loading and saving of actscan configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/actscan/config.toml`
//! - macOS: `~/Library/Application Support/actscan/config.toml`
//! - Windows: `%APPDATA%\actscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! default_format = "table"
//! parallel = true
//! packages_file = "/etc/actscan/compromised.json"
//! fixtures_dir = "testdata"
//!
//! [ignore]
//! actions = ["actions/*", "my-org/internal-action"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration.
///
/// Every field has a default, so a partial file (or none at all) is valid.
///
/// # Example
///
/// ```no_run
/// use actscan::Config;
///
/// let config = Config::load().unwrap();
/// println!("Default format: {}", config.default_format);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,

    /// JSON file replacing the built-in vulnerable-package table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages_file: Option<PathBuf>,

    /// Directory of `<owner>/<repo>` action checkouts used instead of
    /// fetching from GitHub.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixtures_dir: Option<PathBuf>,

    /// Whether the actions of a workflow are fetched and scanned concurrently.
    ///
    /// Default: true
    pub parallel: bool,

    /// Actions to skip.
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// `owner/repo` names of actions that are never fetched.
    ///
    /// Supports glob patterns (e.g., "actions/*", "*/setup-*").
    pub actions: Vec<String>,
}

impl IgnoreConfig {
    /// Check if an action (`owner/repo`) should be skipped.
    pub fn should_ignore_action(&self, slug: &str) -> bool {
        self.actions.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, slug)
            } else {
                pattern == slug
            }
        })
    }
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    let first = parts[0];
    if !remaining.starts_with(first) {
        return false;
    }
    remaining = &remaining[first.len()..];

    let last = parts[parts.len() - 1];
    if remaining.len() < last.len() || !remaining.ends_with(last) {
        return false;
    }
    remaining = &remaining[..remaining.len() - last.len()];

    for part in &parts[1..parts.len() - 1] {
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }

    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_format: "table".to_string(),
            packages_file: None,
            fixtures_dir: None,
            parallel: true,
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from an explicit path, with the same fallback as
    /// [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use actscan::Config;
    ///
    /// let mut config = Config::default();
    /// config.parallel = false;
    /// config.save()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// ```
    /// use actscan::Config;
    ///
    /// assert!(Config::config_path().ends_with("actscan/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("actscan")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match_exact() {
        assert!(glob_match("actions/checkout", "actions/checkout"));
        assert!(!glob_match("actions/checkout", "actions/cache"));
    }

    #[test]
    fn test_glob_match_owner_wildcard() {
        assert!(glob_match("actions/*", "actions/checkout"));
        assert!(glob_match("actions/*", "actions/setup-node"));
        assert!(!glob_match("actions/*", "github/codeql-action"));
    }

    #[test]
    fn test_glob_match_middle() {
        assert!(glob_match("*/setup-*", "actions/setup-node"));
        assert!(glob_match("*/setup-*", "pnpm/setup-"));
        assert!(!glob_match("*/setup-*", "actions/checkout"));
    }

    #[test]
    fn test_glob_match_overlapping_affixes() {
        assert!(!glob_match("ab*ba", "aba"));
        assert!(glob_match("ab*ba", "abba"));
    }

    #[test]
    fn test_should_ignore_action() {
        let ignore = IgnoreConfig {
            actions: vec!["actions/*".to_string(), "my-org/deploy".to_string()],
        };

        assert!(ignore.should_ignore_action("actions/checkout"));
        assert!(ignore.should_ignore_action("my-org/deploy"));
        assert!(!ignore.should_ignore_action("my-org/build"));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.default_format, "table");
        assert!(config.parallel);
        assert!(config.packages_file.is_none());
        assert!(config.ignore.actions.is_empty());
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "parallel = false\n[ignore]\nactions = [\"actions/*\"]\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.parallel);
        assert_eq!(config.default_format, "table");
        assert!(config.ignore.should_ignore_action("actions/cache"));
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/actscan.toml")).unwrap();
        assert!(config.parallel);
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "parallel = \"sometimes\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_default_config_round_trips() {
        let text = Config::generate_default_config();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.default_format, "table");
    }
}
