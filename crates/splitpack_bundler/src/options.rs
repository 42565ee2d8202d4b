use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;
use splitpack_core::config_loader::{ConfigError, ConfigLoader};

/// The package.json key holding [`BundlerOptions`]
pub const BUNDLER_CONFIG_KEY: &str = "@splitpack/bundler-default";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundlerOptions {
  /// Assets are only extracted into a shared bundle when more than this many bundles hold them
  pub min_bundles: usize,

  /// Minimum size in bytes of a shared bundle
  pub min_bundle_size: u64,

  /// Maximum number of bundles loaded in parallel by a bundle group
  pub max_parallel_requests: usize,
}

impl Default for BundlerOptions {
  fn default() -> Self {
    Self {
      min_bundles: 1,
      min_bundle_size: 30000,
      max_parallel_requests: 5,
    }
  }
}

impl BundlerOptions {
  /// Reads the options from the nearest package.json, falling back to the defaults when there is
  /// no package.json or it does not configure the bundler
  pub fn load(config_loader: &ConfigLoader) -> anyhow::Result<Self> {
    let options = config_loader
      .load_package_json_key::<BundlerOptions>(BUNDLER_CONFIG_KEY)
      .with_context(|| format!("Failed to load {BUNDLER_CONFIG_KEY} options"))?
      .map(|config| config.contents)
      .unwrap_or_default();

    options.validate()?;

    Ok(options)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.max_parallel_requests == 0 {
      return Err(ConfigError::InvalidValue {
        key: format!("{BUNDLER_CONFIG_KEY}.maxParallelRequests"),
        reason: String::from("a bundle group must be able to load at least one bundle"),
      });
    }

    Ok(())
  }
}
