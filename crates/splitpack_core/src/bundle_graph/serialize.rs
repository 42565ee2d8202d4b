use serde::Deserialize;
use serde::Serialize;

use super::bundle_graph::BundleGraph;
use crate::types::{AssetId, Bundle, BundleGroup, BundleId, DependencyId};

/// A stable, self-contained description of the bundling result for downstream packaging
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleGraphSnapshot {
  pub bundles: Vec<BundleSnapshot>,
  pub bundle_groups: Vec<BundleGroupSnapshot>,
  pub references: Vec<AssetReferenceSnapshot>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSnapshot {
  #[serde(flatten)]
  pub bundle: Bundle,

  /// Ids of every asset in the bundle, sorted
  pub assets: Vec<AssetId>,

  pub root_assets: Vec<AssetId>,

  /// Sum of the sizes of the assets in the bundle
  pub size: u64,

  pub bundle_groups: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleGroupSnapshot {
  #[serde(flatten)]
  pub bundle_group: BundleGroup,

  pub bundles: Vec<BundleId>,

  /// Bundles that load the group at runtime. Empty for entry groups.
  pub parent_bundles: Vec<BundleId>,
}

/// A dependency whose resolved asset lives in another bundle and must be loaded at runtime
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetReferenceSnapshot {
  pub dependency_id: DependencyId,
  pub asset_id: AssetId,
  pub bundles: Vec<BundleId>,
}

impl BundleGraph {
  pub fn snapshot(&self) -> BundleGraphSnapshot {
    let bundle_id = |node_id: &usize| self.get_bundle(node_id).map(|bundle| bundle.id.clone());
    let asset_id = |node_id: &usize| self.get_asset(node_id).map(|asset| asset.id.clone());

    let bundles = self
      .bundles()
      .iter()
      .filter_map(|node_id| {
        let bundle = self.get_bundle(node_id)?;
        let mut assets = self
          .get_bundle_assets(node_id)
          .iter()
          .filter_map(asset_id)
          .collect::<Vec<_>>();
        assets.sort();

        Some(BundleSnapshot {
          bundle: bundle.clone(),
          assets,
          root_assets: self
            .get_bundle_root_assets(node_id)
            .iter()
            .filter_map(asset_id)
            .collect(),
          size: self.get_bundle_size(node_id),
          bundle_groups: self
            .get_bundle_groups_containing_bundle(node_id)
            .iter()
            .filter_map(|bundle_group| self.get_bundle_group(bundle_group))
            .map(|bundle_group| bundle_group.id.clone())
            .collect(),
        })
      })
      .collect();

    let bundle_groups = self
      .bundle_groups()
      .iter()
      .filter_map(|node_id| {
        Some(BundleGroupSnapshot {
          bundle_group: self.get_bundle_group(node_id)?.clone(),
          bundles: self
            .get_bundles_in_bundle_group(node_id)
            .iter()
            .filter_map(bundle_id)
            .collect(),
          parent_bundles: self
            .get_parent_bundles(node_id)
            .iter()
            .filter_map(bundle_id)
            .collect(),
        })
      })
      .collect();

    let mut references = Vec::new();
    for (node_id, _) in self.nodes().enumerate() {
      let Some(dependency) = self.get_dependency(&node_id) else {
        continue;
      };

      for asset in self.get_referenced_assets(&node_id) {
        let Some(referenced_asset_id) = asset_id(&asset) else {
          continue;
        };

        references.push(AssetReferenceSnapshot {
          dependency_id: dependency.id.clone(),
          asset_id: referenced_asset_id,
          bundles: self
            .find_bundles_with_asset(&asset)
            .iter()
            .filter_map(bundle_id)
            .collect(),
        });
      }
    }

    BundleGraphSnapshot {
      bundles,
      bundle_groups,
      references,
    }
  }

  /// Pretty-printed JSON form of [`BundleGraph::snapshot`]
  pub fn to_json(&self) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&self.snapshot())
  }
}
