use std::collections::HashSet;

use petgraph::Direction;

use super::bundle_graph::{BundleGraph, BundleGraphEdgeType};
use crate::asset_graph::NodeId;
use crate::error::BundleGraphError;
use crate::types::FileType;

impl BundleGraph {
  /// Places a single asset in a bundle and makes it one of the bundle's root assets.
  ///
  /// Adding an asset the bundle already holds is a no-op.
  pub fn add_asset_to_bundle(
    &mut self,
    asset: &NodeId,
    bundle: &NodeId,
  ) -> Result<(), BundleGraphError> {
    self.expect_asset(asset)?;
    self.expect_bundle(bundle)?;

    self.add_edge(bundle, asset, BundleGraphEdgeType::Null)?;
    self.add_edge(bundle, asset, BundleGraphEdgeType::Contains)?;

    Ok(())
  }

  /// Places `asset` and the synchronous same-type sub-graph below it in `bundle`.
  ///
  /// The walk stops at split point dependencies, isolated assets and assets of another type.
  /// When `source_bundles` is not empty, sub-assets are only pulled in while one of those
  /// bundles still holds them. Sub-assets the source bundles no longer carry are already
  /// provided by an ancestor.
  pub fn add_asset_graph_to_bundle(
    &mut self,
    asset: &NodeId,
    bundle: &NodeId,
    source_bundles: &[NodeId],
  ) -> Result<(), BundleGraphError> {
    let bundle_type = self.expect_bundle(bundle)?.bundle_type.clone();
    self.add_asset_to_bundle(asset, bundle)?;

    let mut visited = HashSet::from([*asset]);
    let mut stack = vec![*asset];

    while let Some(current) = stack.pop() {
      for child in self.get_sync_children(&current, &bundle_type) {
        if !visited.insert(child) {
          continue;
        }

        let held_by_source = source_bundles.is_empty()
          || source_bundles
            .iter()
            .any(|source| self.bundle_has_asset(source, &child));

        if !held_by_source {
          continue;
        }

        self.add_edge(bundle, &child, BundleGraphEdgeType::Contains)?;
        stack.push(child);
      }
    }

    Ok(())
  }

  /// Removes `asset` from `bundle` together with every sub-asset that is only reachable through
  /// it.
  ///
  /// Sub-assets that another root of the bundle still reaches without passing through `asset`
  /// stay. The assets remain in the graph and in every other bundle.
  pub fn remove_asset_graph_from_bundle(
    &mut self,
    asset: &NodeId,
    bundle: &NodeId,
  ) -> Result<(), BundleGraphError> {
    self.expect_asset(asset)?;
    let bundle_type = self.expect_bundle(bundle)?.bundle_type.clone();

    if !self.bundle_has_asset(bundle, asset) {
      return Ok(());
    }

    let removed_sub_graph = self.reachable_in_bundle(bundle, &bundle_type, &[*asset], None);

    self.remove_edge(bundle, asset, BundleGraphEdgeType::Contains)?;
    self.remove_edge(bundle, asset, BundleGraphEdgeType::Null)?;

    let remaining_roots = self.get_bundle_root_assets(bundle);
    let retained = self.reachable_in_bundle(bundle, &bundle_type, &remaining_roots, Some(asset));

    for sub_asset in removed_sub_graph {
      if sub_asset == *asset || retained.contains(&sub_asset) {
        continue;
      }

      self.remove_edge(bundle, &sub_asset, BundleGraphEdgeType::Contains)?;
    }

    Ok(())
  }

  pub fn bundle_has_asset(&self, bundle: &NodeId, asset: &NodeId) -> bool {
    self.has_edge(bundle, asset, BundleGraphEdgeType::Contains)
  }

  /// Every asset held by the bundle
  pub fn get_bundle_assets(&self, bundle: &NodeId) -> Vec<NodeId> {
    if self.get_bundle(bundle).is_none() {
      return Vec::new();
    }

    self.neighbors(bundle, Direction::Outgoing, BundleGraphEdgeType::Contains)
  }

  /// The assets the bundle was seeded with: its entry asset and explicitly placed assets
  pub fn get_bundle_root_assets(&self, bundle: &NodeId) -> Vec<NodeId> {
    if self.get_bundle(bundle).is_none() {
      return Vec::new();
    }

    self
      .neighbors(bundle, Direction::Outgoing, BundleGraphEdgeType::Null)
      .into_iter()
      .filter(|node_id| self.get_asset(node_id).is_some())
      .collect()
  }

  /// Every bundle holding the asset. The order is deterministic for a given sequence of
  /// graph mutations.
  pub fn find_bundles_with_asset(&self, asset: &NodeId) -> Vec<NodeId> {
    if self.get_asset(asset).is_none() {
      return Vec::new();
    }

    self
      .neighbors(asset, Direction::Incoming, BundleGraphEdgeType::Contains)
      .into_iter()
      .filter(|node_id| self.get_bundle(node_id).is_some())
      .collect()
  }

  /// Size in bytes of `asset` plus the synchronous same-type sub-graph below it.
  ///
  /// Sub-assets only count while one of `bundles` holds them. Every asset is counted once.
  pub fn get_total_size(&self, asset: &NodeId, bundles: &[NodeId]) -> u64 {
    let Some(root) = self.get_asset(asset) else {
      return 0;
    };

    let mut size = root.size;
    let mut visited = HashSet::from([*asset]);
    let mut stack = vec![*asset];

    while let Some(current) = stack.pop() {
      for child in self.get_sync_children(&current, &root.file_type) {
        if !visited.insert(child) {
          continue;
        }

        let held = bundles.is_empty()
          || bundles
            .iter()
            .any(|bundle| self.bundle_has_asset(bundle, &child));
        if !held {
          continue;
        }

        if let Some(child_asset) = self.get_asset(&child) {
          size += child_asset.size;
        }
        stack.push(child);
      }
    }

    size
  }

  /// Sum of the sizes of the assets held by the bundle
  pub fn get_bundle_size(&self, bundle: &NodeId) -> u64 {
    self
      .get_bundle_assets(bundle)
      .iter()
      .filter_map(|asset| self.get_asset(asset))
      .map(|asset| asset.size)
      .sum()
  }

  /// Assets that load synchronously with `asset` inside a bundle of `bundle_type`
  pub(super) fn get_sync_children(&self, asset: &NodeId, bundle_type: &FileType) -> Vec<NodeId> {
    let mut children = Vec::new();

    for dependency in self.get_asset_dependencies(asset) {
      let is_split_point = self
        .get_dependency(&dependency)
        .is_some_and(|dependency| dependency.is_split_point());
      if is_split_point {
        continue;
      }

      for child in self.get_dependency_assets(&dependency) {
        let stays_in_bundle = self
          .get_asset(&child)
          .is_some_and(|child| !child.is_isolated && child.file_type == *bundle_type);

        if stays_in_bundle {
          children.push(child);
        }
      }
    }

    children
  }

  /// Assets of `bundle` reachable from `roots` through synchronous edges between members,
  /// never entering `excluded`
  fn reachable_in_bundle(
    &self,
    bundle: &NodeId,
    bundle_type: &FileType,
    roots: &[NodeId],
    excluded: Option<&NodeId>,
  ) -> HashSet<NodeId> {
    let mut reachable = HashSet::new();
    let mut stack = roots
      .iter()
      .filter(|root| Some(*root) != excluded)
      .copied()
      .collect::<Vec<_>>();

    while let Some(current) = stack.pop() {
      if !reachable.insert(current) {
        continue;
      }

      for child in self.get_sync_children(&current, bundle_type) {
        if Some(&child) != excluded
          && !reachable.contains(&child)
          && self.bundle_has_asset(bundle, &child)
        {
          stack.push(child);
        }
      }
    }

    reachable
  }
}
