//! Layered configuration.
//!
//! Settings are merged with figment, lowest priority first:
//!
//! 1. built-in defaults ([`Config::default`])
//! 2. a TOML file: `--config PATH`, or `config.toml` in the platform config
//!    directory (e.g. `~/.config/xattrsum/config.toml`) if it exists
//! 3. environment variables prefixed `XATTRSUM_` (e.g. `XATTRSUM_MAX_AGE_DAYS=30`)
//! 4. command-line flags, applied by the caller
//!
//! ```toml
//! max_age_days = 90
//! algorithm = "blake3"
//! ignore_patterns = ["*.tmp", ".cache/"]
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::scanner::{HashAlgorithm, WalkerConfig, DEFAULT_CHUNK_SIZE};
use crate::store::AttributeKeys;

/// Default staleness window in days.
pub const DEFAULT_MAX_AGE_DAYS: u32 = 180;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "XATTRSUM_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Files verified longer ago than this are due again.
    pub max_age_days: u32,
    /// Digest algorithm; also selects the attribute names.
    pub algorithm: HashAlgorithm,
    /// Read size for hashing, in bytes.
    pub chunk_size: usize,
    /// Attribute namespace, usually `user`.
    pub attribute_namespace: String,
    /// Follow symbolic links while scanning.
    pub follow_symlinks: bool,
    /// Skip names starting with a dot.
    pub skip_hidden: bool,
    /// Gitignore-style patterns excluded from scans.
    pub ignore_patterns: Vec<String>,
    /// Draw a progress bar on stderr.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            algorithm: HashAlgorithm::Sha1,
            chunk_size: DEFAULT_CHUNK_SIZE,
            attribute_namespace: "user".to_string(),
            follow_symlinks: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            progress: true,
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed, a value has the wrong
    /// type, or an explicit file is missing.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(figment::Error::from(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(default) = Self::default_path().filter(|p| p.is_file()) {
                    log::debug!("Using config file {}", default.display());
                    figment = figment.merge(Toml::file(default));
                }
            }
        }

        figment.merge(Env::prefixed(ENV_PREFIX)).extract()
    }

    /// Platform-specific default config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "xattrsum").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Attribute names for the configured namespace and algorithm.
    #[must_use]
    pub fn attribute_keys(&self) -> AttributeKeys {
        AttributeKeys::new(&self.attribute_namespace, self.algorithm)
    }

    /// Scanner settings.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(
            self.follow_symlinks,
            self.skip_hidden,
            self.ignore_patterns.clone(),
        )
    }
}
