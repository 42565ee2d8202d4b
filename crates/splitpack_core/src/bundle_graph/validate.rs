use super::bundle_graph::BundleGraph;
use crate::error::BundleGraphError;

impl BundleGraph {
  /// Checks the structural invariants every finished bundle graph upholds:
  ///
  /// - every asset in a bundle has the bundle's type
  /// - every bundle belongs to at least one bundle group
  /// - every root asset of a bundle is also held by it
  /// - when `max_parallel_requests` is given, no bundle group loads more bundles than that
  ///
  /// Returns the first violation found.
  pub fn validate(&self, max_parallel_requests: Option<usize>) -> Result<(), BundleGraphError> {
    for bundle_node_id in self.bundles() {
      let bundle = self.expect_bundle(&bundle_node_id)?;

      for asset_node_id in self.get_bundle_assets(&bundle_node_id) {
        let asset = self.expect_asset(&asset_node_id)?;
        if asset.file_type != bundle.bundle_type {
          return Err(BundleGraphError::MixedBundleTypes {
            bundle_id: bundle.id.clone(),
            bundle_type: bundle.bundle_type.clone(),
            asset_id: asset.id.clone(),
            asset_type: asset.file_type.clone(),
          });
        }
      }

      if self
        .get_bundle_groups_containing_bundle(&bundle_node_id)
        .is_empty()
      {
        return Err(BundleGraphError::OrphanBundle {
          bundle_id: bundle.id.clone(),
        });
      }

      for root_asset in self.get_bundle_root_assets(&bundle_node_id) {
        if !self.bundle_has_asset(&bundle_node_id, &root_asset) {
          return Err(BundleGraphError::DetachedRootAsset {
            bundle_id: bundle.id.clone(),
            asset_id: self.expect_asset(&root_asset)?.id.clone(),
          });
        }
      }
    }

    let Some(max_parallel_requests) = max_parallel_requests else {
      return Ok(());
    };

    for bundle_group_node_id in self.bundle_groups() {
      let bundle_count = self
        .get_bundles_in_bundle_group(&bundle_group_node_id)
        .len();

      if bundle_count > max_parallel_requests {
        return Err(BundleGraphError::ParallelRequestLimitExceeded {
          bundle_group_id: self.expect_bundle_group(&bundle_group_node_id)?.id.clone(),
          bundle_count,
          max_parallel_requests,
        });
      }
    }

    Ok(())
  }
}
