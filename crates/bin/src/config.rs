//! Run configuration: an optional JSON file overlaid by command-line flags.

use abode::{DataPaths, FitPolicy, LoaderConfig, ModelConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading a configuration file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration
    #[error("Invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything a fit or predict run needs besides the market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RunConfig {
    /// Directory holding the dataset files (default: `data`)
    pub(crate) data_dir: Option<PathBuf>,

    /// Loader filters
    pub(crate) loader: LoaderConfig,

    /// Model settings
    pub(crate) model: ModelConfig,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub(crate) struct Overrides {
    pub(crate) data_dir: Option<PathBuf>,
    pub(crate) state: Option<String>,
    pub(crate) seed: Option<u64>,
    pub(crate) strict: bool,
}

impl RunConfig {
    /// Read `path` if given, otherwise start from defaults.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply command-line overrides.
    pub(crate) fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(dir) = overrides.data_dir {
            self.data_dir = Some(dir);
        }
        if let Some(state) = overrides.state {
            self.loader.state = state;
        }
        if let Some(seed) = overrides.seed {
            self.model.search.seed = seed;
        }
        if overrides.strict {
            self.model.policy = FitPolicy::Strict;
        }
        self
    }

    /// Dataset file locations.
    pub(crate) fn paths(&self) -> DataPaths {
        self.data_dir
            .as_deref()
            .map_or_else(DataPaths::default, DataPaths::in_dir)
    }
}
