//! Hub configuration.
//!
//! ```rust
//! use logrelay::config::HubConfig;
//!
//! let config = HubConfig::from_toml_str(
//!     r#"
//!     default_level = "error warn"
//!     submit_url = "https://logs.example.com/ingest"
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.default_level.to_string(), "error warn");
//! assert_eq!(config.batch_size, 10);
//! ```

use serde::{Deserialize, Serialize};

use crate::level::LevelSpec;

/// The batch size used when neither the hub nor a batch reporter sets one.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Settings shared by everything attached to a hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HubConfig {
    /// The levels reporters subscribe to when their own config does not name any.
    #[serde(alias = "defaultLevel")]
    pub default_level: LevelSpec,

    /// Where submissions go unless a reporter overrides it.
    #[serde(alias = "submitUrl")]
    pub submit_url: Option<String>,

    /// The batch size of batch reporters that do not set their own.
    #[serde(alias = "batchSize")]
    pub batch_size: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            default_level: LevelSpec::Wildcard,
            submit_url: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl HubConfig {
    /// Parses a configuration from TOML, missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

/// Errors that can occur when loading a [`HubConfig`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read `{path}`")]
    Read {
        /// The file that was requested.
        path: std::path::PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The text is not a valid configuration.
    #[error("invalid configuration")]
    Parse(#[from] toml::de::Error),
}
