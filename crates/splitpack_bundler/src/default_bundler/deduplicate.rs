use splitpack_core::asset_graph::NodeId;
use splitpack_core::bundle_graph::{BundleGraph, TraversalAction, TraversalEvent};
use splitpack_core::error::BundleGraphError;
use tracing::debug;
use tracing::instrument;

use crate::decisions::{DecisionKind, DecisionLog, Phase};

/// Removes assets from bundles whose every ancestor path already loads them.
///
/// Bundles are visited children first, so a child is deduplicated against the full contents of
/// its ancestors. Bundles in isolated environments such as workers cannot share the ancestors'
/// module registry and are left alone.
#[instrument(level = "debug", skip_all)]
pub(super) fn deduplicate_bundles(
  bundle_graph: &mut BundleGraph,
  decisions: &mut DecisionLog,
) -> Result<(), BundleGraphError> {
  let mut removed = 0;

  bundle_graph.traverse_bundles(|bundle_graph, event| {
    if let TraversalEvent::Exit(bundle) = event {
      removed += deduplicate_bundle(bundle_graph, bundle, decisions)?;
    }

    Ok::<_, BundleGraphError>(TraversalAction::Continue)
  })?;

  debug!(removed, "Removed duplicated assets");

  Ok(())
}

fn deduplicate_bundle(
  bundle_graph: &mut BundleGraph,
  bundle: NodeId,
  decisions: &mut DecisionLog,
) -> Result<usize, BundleGraphError> {
  let Some(bundle_node) = bundle_graph.get_bundle(&bundle) else {
    return Ok(0);
  };
  let bundle_id = bundle_node.id.clone();

  if bundle_node.env.is_isolated() {
    debug!(bundle_id = %bundle_id, "Skipping deduplication of isolated bundle");
    decisions.push(
      Phase::Deduplication,
      DecisionKind::DeduplicationSkipped { bundle_id },
    );
    return Ok(0);
  }

  let mut removed = 0;

  // Membership changes while assets are removed, so walk a snapshot and skip anything that has
  // already gone with an earlier sub-graph
  for member in bundle_graph.get_bundle_assets(&bundle) {
    if !bundle_graph.bundle_has_asset(&bundle, &member) {
      continue;
    }

    for dependency in bundle_graph.get_asset_dependencies(&member) {
      for asset in bundle_graph.get_dependency_assets(&dependency) {
        if !bundle_graph.bundle_has_asset(&bundle, &asset)
          || !bundle_graph.is_asset_in_ancestor_bundles(&bundle, &asset)
        {
          continue;
        }

        bundle_graph.remove_asset_graph_from_bundle(&asset, &bundle)?;
        removed += 1;

        if let Some(asset) = bundle_graph.get_asset(&asset) {
          debug!(
            asset_id = %asset.id,
            bundle_id = %bundle_id,
            "Removed asset already loaded by ancestor bundles"
          );
          decisions.push(
            Phase::Deduplication,
            DecisionKind::DuplicateRemoved {
              asset_id: asset.id.clone(),
              bundle_id: bundle_id.clone(),
            },
          );
        }
      }
    }
  }

  Ok(removed)
}
