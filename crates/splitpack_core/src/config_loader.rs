use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use splitpack_filesystem::search::find_ancestor_file;
use splitpack_filesystem::FileSystemRef;

pub type ConfigLoaderRef = Arc<ConfigLoader>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Unable to locate {filename} config file from {}", search_path.display())]
  NotFound {
    filename: String,
    search_path: PathBuf,
  },

  #[error("Failed to read {}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Error parsing {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("Invalid value for {key}: {reason}")]
  InvalidValue { key: String, reason: String },
}

/// Loads JSON configuration from the nearest ancestor of the search path
#[derive(Debug)]
pub struct ConfigLoader {
  pub fs: FileSystemRef,
  pub project_root: PathBuf,
  pub search_path: PathBuf,
}

#[derive(Debug, PartialEq)]
pub struct ConfigFile<T> {
  pub contents: T,
  pub path: PathBuf,
  pub raw: String,
}

impl ConfigLoader {
  fn find(&self, filename: &str) -> Option<PathBuf> {
    find_ancestor_file(
      &*self.fs,
      &[filename],
      &self.search_path,
      &self.project_root,
    )
  }

  fn read(&self, path: &Path) -> Result<String, ConfigError> {
    self
      .fs
      .read_to_string(path)
      .map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
      })
  }

  pub fn load_json_config<Config: DeserializeOwned>(
    &self,
    filename: &str,
  ) -> Result<ConfigFile<Config>, ConfigError> {
    let path = self.find(filename).ok_or_else(|| ConfigError::NotFound {
      filename: filename.to_string(),
      search_path: self.search_path.clone(),
    })?;

    let raw = self.read(&path)?;
    let contents = serde_json::from_str::<Config>(&raw).map_err(|source| ConfigError::Parse {
      path: path.clone(),
      source,
    })?;

    Ok(ConfigFile {
      contents,
      path,
      raw,
    })
  }

  pub fn load_package_json<Config: DeserializeOwned>(
    &self,
  ) -> Result<ConfigFile<Config>, ConfigError> {
    self.load_json_config::<Config>("package.json")
  }

  /// Reads one top level key of the nearest package.json.
  ///
  /// Returns `None` when there is no package.json or it does not have the key.
  pub fn load_package_json_key<Config: DeserializeOwned>(
    &self,
    key: &str,
  ) -> Result<Option<ConfigFile<Config>>, ConfigError> {
    let Some(path) = self.find("package.json") else {
      return Ok(None);
    };

    let raw = self.read(&path)?;
    let parse_error = |source| ConfigError::Parse {
      path: path.clone(),
      source,
    };

    let mut package_json = serde_json::from_str::<serde_json::Value>(&raw).map_err(parse_error)?;
    let Some(value) = package_json.get_mut(key).map(serde_json::Value::take) else {
      return Ok(None);
    };

    let contents = serde_json::from_value::<Config>(value).map_err(parse_error)?;

    Ok(Some(ConfigFile {
      contents,
      path,
      raw,
    }))
  }
}
