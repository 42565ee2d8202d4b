use std::collections::HashSet;

use petgraph::Direction;

use super::bundle_graph::{BundleGraph, BundleGraphEdgeType};
use crate::asset_graph::NodeId;

impl BundleGraph {
  /// Whether `asset` is already loaded by the time `bundle` runs, whichever way `bundle` is
  /// reached.
  ///
  /// Every chain of bundles that loads `bundle` must pass through a bundle holding the asset
  /// before it reaches a group loaded from the root. Bundles in entry groups therefore never
  /// qualify.
  pub fn is_asset_in_ancestor_bundles(&self, bundle: &NodeId, asset: &NodeId) -> bool {
    let mut visited = HashSet::from([*bundle]);
    let mut stack = vec![*bundle];

    // Walks upwards through bundles that lack the asset. Reaching the root that way is a load
    // path that never provides it.
    while let Some(current) = stack.pop() {
      let bundle_groups = self.get_bundle_groups_containing_bundle(&current);
      if bundle_groups.is_empty() {
        return false;
      }

      for bundle_group in bundle_groups {
        let loaders =
          self.neighbors(&bundle_group, Direction::Incoming, BundleGraphEdgeType::Bundle);
        let loaded_from_root = loaders.iter().any(|loader| self.get_bundle(loader).is_none());
        if loaders.is_empty() || loaded_from_root {
          return false;
        }

        for loader in loaders {
          if self.bundle_has_asset(&loader, asset) || !visited.insert(loader) {
            continue;
          }

          stack.push(loader);
        }
      }
    }

    true
  }
}
