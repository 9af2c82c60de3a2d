use crate::error::{CliError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PATH_CONFIG_FILE: &str = "params-path.conf";

/// Finds the AlphaFold parameter directory: a custom location persisted in the user
/// config directory, else the OS data directory.
#[derive(Debug)]
pub struct ParamsLocator {
    params_path: PathBuf,
}

impl ParamsLocator {
    pub fn new() -> Result<Self> {
        let path = Self::determine_params_path()?;
        debug!("ParamsLocator initialized with path: {:?}", &path);
        Ok(Self { params_path: path })
    }

    pub fn with_custom_path(path: PathBuf) -> Self {
        Self { params_path: path }
    }

    pub fn get_params_path(&self) -> &Path {
        &self.params_path
    }

    /// Returns `preferred` when given, otherwise the located directory. Fails when the
    /// chosen directory does not exist.
    pub fn resolve(&self, preferred: Option<&Path>) -> Result<PathBuf> {
        let path = preferred.unwrap_or(&self.params_path);
        if !path.is_dir() {
            return Err(CliError::Params(format!(
                "AlphaFold parameter directory does not exist: {:?}.\nHint: Pass --params-dir or run 'cyclobind params set-path <DIR>'.",
                path
            )));
        }
        Ok(path.to_path_buf())
    }

    pub fn set_custom_path(path: &Path) -> Result<()> {
        let config_path = Self::get_path_config_file()?;
        Self::write_path_config(&config_path, path)
    }

    pub fn reset_path() -> Result<()> {
        if let Ok(config_path) = Self::get_path_config_file() {
            if config_path.exists() {
                fs::remove_file(config_path)?;
            }
        }
        Ok(())
    }

    fn write_path_config(config_path: &Path, path: &Path) -> Result<()> {
        let value = path.to_str().ok_or_else(|| {
            CliError::Params(format!("Path is not valid UTF-8: {:?}", path))
        })?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_path, value).map_err(CliError::from)
    }

    fn read_path_config(config_path: &Path) -> Result<Option<PathBuf>> {
        if !config_path.exists() {
            return Ok(None);
        }
        let custom_path_str = fs::read_to_string(config_path)?.trim().to_string();
        if custom_path_str.is_empty() {
            warn!("Custom params path file is empty, falling back to default path.");
            return Ok(None);
        }
        Ok(Some(PathBuf::from(custom_path_str)))
    }

    fn determine_params_path() -> Result<PathBuf> {
        match Self::get_path_config_file() {
            Ok(config_path) => match Self::read_path_config(&config_path)? {
                Some(path) => Ok(path),
                None => Self::get_default_params_path(),
            },
            Err(_) => Self::get_default_params_path(),
        }
    }

    fn get_path_config_file() -> Result<PathBuf> {
        ProjectDirs::from("edu", "caltech", "cyclobind")
            .map(|dirs| dirs.config_dir().join(PATH_CONFIG_FILE))
            .ok_or_else(|| {
                CliError::Params("Could not determine config directory path.".to_string())
            })
    }

    fn get_default_params_path() -> Result<PathBuf> {
        ProjectDirs::from("edu", "caltech", "cyclobind")
            .map(|dirs| dirs.data_dir().join("params"))
            .ok_or_else(|| {
                CliError::Params("Could not determine default data directory path.".to_string())
            })
    }
}
