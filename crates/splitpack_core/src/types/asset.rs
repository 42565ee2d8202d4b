use std::hash::Hash;
use std::hash::Hasher;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::environment::Environment;
use super::file_type::FileType;
use crate::hash::IdentifierHasher;

pub type AssetId = String;

pub fn create_asset_id(file_path: &Path, env: &Environment, file_type: &FileType) -> AssetId {
  let mut hasher = IdentifierHasher::default();

  file_path.hash(&mut hasher);
  env.id().hash(&mut hasher);
  file_type.hash(&mut hasher);

  format!("{:016x}", hasher.finish())
}

/// A transformed unit of source content
///
/// Assets are produced by the transformation stage and never change while bundling. Bundles only
/// ever hold references to them.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
  pub id: AssetId,

  pub file_path: PathBuf,

  pub file_type: FileType,

  /// The environment the asset runs in
  pub env: Arc<Environment>,

  /// Size of the transformed output in bytes
  pub size: u64,

  /// Isolated assets never share a bundle with anything else, e.g. inline scripts that are
  /// executed in their own scope
  pub is_isolated: bool,
}

impl Asset {
  pub fn new(file_path: PathBuf, env: Arc<Environment>, size: u64) -> Self {
    let file_type = file_path
      .extension()
      .map(|ext| FileType::from_extension(&ext.to_string_lossy()))
      .unwrap_or_default();

    Self {
      id: create_asset_id(&file_path, &env, &file_type),
      file_path,
      file_type,
      env,
      size,
      is_isolated: false,
    }
  }
}
