//! Configuration Loader
//!
//! Resolves a [`QueryConfig`] from defaults, the first configuration file
//! found, and `DOCKET_*` environment variables, in increasing precedence.

use crate::config::QueryConfig;
use crate::error::{DocketError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration loader that handles multiple sources with precedence
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    base_config: QueryConfig,
    /// Files that must exist and parse if given
    explicit_paths: Vec<PathBuf>,
    /// Files tried in order when no explicit path is given
    search_paths: Vec<PathBuf>,
    load_from_env: bool,
    validate: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_config: QueryConfig::default(),
            explicit_paths: Vec::new(),
            search_paths: Self::default_config_paths(),
            load_from_env: true,
            validate: true,
        }
    }

    #[must_use]
    pub fn with_base_config(mut self, config: QueryConfig) -> Self {
        self.base_config = config;
        self
    }

    /// Require a configuration file; the default search paths are skipped
    #[must_use]
    pub fn add_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.explicit_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Replace the optional search paths
    #[must_use]
    pub fn with_search_paths<P: AsRef<Path>>(mut self, paths: Vec<P>) -> Self {
        self.search_paths = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        self
    }

    #[must_use]
    pub const fn with_env_loading(mut self, enabled: bool) -> Self {
        self.load_from_env = enabled;
        self
    }

    #[must_use]
    pub const fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    /// Load configuration from all sources
    ///
    /// # Errors
    /// Returns an error if an explicit file is missing or malformed, an
    /// environment variable is unparsable, or the result fails validation
    pub fn load(&self) -> Result<QueryConfig> {
        let mut config = self.base_config.clone();
        debug!("Starting configuration loading");

        if self.explicit_paths.is_empty() {
            if let Some(found) = self.search_paths.iter().find(|p| p.exists()) {
                match QueryConfig::from_file(found) {
                    Ok(file_config) => {
                        config = file_config;
                        info!("Loaded configuration from {}", found.display());
                    }
                    Err(e) => {
                        warn!("Ignoring configuration at {}: {}", found.display(), e);
                    }
                }
            } else {
                debug!("No configuration file found, using defaults");
            }
        } else {
            for path in &self.explicit_paths {
                if !path.exists() {
                    return Err(DocketError::configuration(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }
                config = QueryConfig::from_file(path)?;
                info!("Loaded configuration from {}", path.display());
            }
        }

        if self.load_from_env {
            config.apply_env()?;
            debug!("Applied environment overrides");
        }

        if self.validate {
            config.validate()?;
        }

        Ok(config)
    }

    /// Files tried when no explicit path is given
    #[must_use]
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("docket.yaml"),
            PathBuf::from("docket.yml"),
            PathBuf::from("docket.json"),
        ];
        if let Some(dir) = Self::user_config_dir() {
            paths.push(dir.join("config.yaml"));
            paths.push(dir.join("config.json"));
        }
        paths
    }

    /// `$HOME/.config/docket`, if `HOME` is set
    #[must_use]
    pub fn user_config_dir() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join("docket"))
    }

    /// Write the default configuration as a starting point
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        QueryConfig::default().to_file(path)?;
        info!("Created sample configuration file: {}", path.display());
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from the default locations and the environment
///
/// # Errors
/// Returns an error if configuration cannot be loaded
pub fn load_config() -> Result<QueryConfig> {
    ConfigLoader::new().load()
}
