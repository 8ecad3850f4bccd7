//! Storage configuration.
//!
//! Loaded from TOML with a precedence system:
//! - Bundled defaults (include_str! from coffer.toml)
//! - User overrides (~/.config/coffer/coffer.toml, then ./coffer.toml)
//!
//! All keys live under a `[storage]` table:
//!
//! ```toml
//! [storage]
//! root = "/var/lib/coffer"
//! mask = "https://cdn.example/files"
//! allow_duplicates = false
//! ```

use coffer_error::{CofferError, CofferResult, ConfigError};
use config::{Config, File, FileFormat};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Settings for a [`FileStore`](crate::FileStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_", into)]
pub struct StorageConfig {
    /// Directory holding the physical files
    #[serde(default = "default_root")]
    root: PathBuf,

    /// URL prefix that record ids are appended to
    #[serde(default = "default_mask")]
    mask: String,

    /// Create a new record even when the same content already exists at the
    /// same logical path
    #[serde(default)]
    allow_duplicates: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_mask() -> String {
    "/files".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            mask: default_mask(),
            allow_duplicates: false,
        }
    }
}

/// File layout wrapping the `[storage]` table.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    storage: StorageConfig,
}

impl StorageConfig {
    /// Create a configuration for a root directory and URL mask.
    pub fn new(root: impl Into<PathBuf>, mask: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            mask: mask.into(),
            allow_duplicates: false,
        }
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> CofferResult<Self> {
        debug!("Loading configuration from file");

        let builder = Config::builder().add_source(File::from(path.as_ref()));
        Self::build(builder)
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override earlier):
    /// 1. Bundled defaults (coffer.toml shipped with the library)
    /// 2. User config in home directory (~/.config/coffer/coffer.toml)
    /// 3. User config in current directory (./coffer.toml)
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> CofferResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../coffer.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/coffer/coffer.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("coffer").required(false));

        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> CofferResult<Self> {
        let file: ConfigFile = builder
            .build()
            .map_err(|e| {
                CofferError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                CofferError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;
        Ok(file.storage)
    }
}
