use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::asset::AssetId;
use super::dependency::DependencyId;
use super::environment::Environment;
use super::file_type::FileType;
use super::target::Target;
use crate::hash::hash_string;

pub type BundleId = String;

pub fn create_bundle_id(id_base: &str, target: &Target) -> BundleId {
  hash_string(format!(
    "bundle:{}{}",
    id_base,
    target.dist_dir.display()
  ))
}

pub fn create_bundle_group_id(entry_asset_id: &str, target: &Target) -> String {
  hash_string(format!("bundle_group:{}{}", target.name, entry_asset_id))
}

/// An output artifact holding assets of a single type
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
  pub id: BundleId,

  /// The type of every asset in the bundle
  #[serde(rename = "type")]
  pub bundle_type: FileType,

  pub env: Arc<Environment>,

  pub target: Target,

  /// The asset executed when the bundle loads. Async bundles have none
  pub entry_asset_id: Option<AssetId>,

  /// Whether the bundle is loaded directly by the page rather than by a runtime loader
  pub is_entry: bool,
}

/// The set of bundles that load together to satisfy one entry or async dependency
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleGroup {
  pub id: String,

  pub target: Target,

  /// The first asset the originating dependency resolved to
  pub entry_asset_id: AssetId,

  /// The dependency that created the group
  pub dependency_id: DependencyId,
}
