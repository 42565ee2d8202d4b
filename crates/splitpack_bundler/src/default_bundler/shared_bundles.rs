use std::collections::BTreeMap;

use indexmap::IndexSet;
use itertools::Itertools;
use splitpack_core::asset_graph::NodeId;
use splitpack_core::bundle_graph::{
  BundleGraph, CreateBundleOptions, TraversalAction, TraversalEvent,
};
use splitpack_core::error::BundleGraphError;
use splitpack_core::hash::hash_string;
use tracing::debug;
use tracing::instrument;

use crate::decisions::{DecisionKind, DecisionLog, Phase, RejectionReason};
use crate::options::BundlerOptions;

/// Assets held by exactly the same set of bundles
#[derive(Debug)]
struct Candidate {
  assets: Vec<NodeId>,
  /// Sorted by bundle id
  source_bundles: Vec<NodeId>,
  size: u64,
}

/// Moves assets duplicated across non-entry bundles into shared bundles.
///
/// Candidates are keyed by the sorted ids of the bundles holding them and processed largest
/// first. A candidate is skipped when it is smaller than `min_bundle_size` or when one of the
/// affected bundle groups already loads `max_parallel_requests` bundles.
#[instrument(level = "debug", skip_all)]
pub(super) fn create_shared_bundles(
  bundle_graph: &mut BundleGraph,
  options: &BundlerOptions,
  decisions: &mut DecisionLog,
) -> Result<(), BundleGraphError> {
  let candidates = find_candidates(bundle_graph, options);

  let mut sorted_candidates = Vec::with_capacity(candidates.len());
  for (key, candidate) in candidates {
    decisions.push(
      Phase::SharedBundles,
      DecisionKind::CandidateFound {
        key: key.clone(),
        assets: candidate.assets.len(),
        size: candidate.size,
      },
    );

    if candidate.size < options.min_bundle_size {
      decisions.push(
        Phase::SharedBundles,
        DecisionKind::CandidateRejected {
          key,
          reason: RejectionReason::BelowMinimumSize {
            size: candidate.size,
            min_bundle_size: options.min_bundle_size,
          },
        },
      );
      continue;
    }

    sorted_candidates.push((key, candidate));
  }

  sorted_candidates.sort_by(|(_, a), (_, b)| b.size.cmp(&a.size));

  let mut created = 0;
  for (key, candidate) in sorted_candidates {
    let bundle_groups = candidate
      .source_bundles
      .iter()
      .flat_map(|bundle| bundle_graph.get_bundle_groups_containing_bundle(bundle))
      .collect::<IndexSet<_>>();

    let full_bundle_group = bundle_groups.iter().find_map(|bundle_group| {
      let bundle_count = bundle_graph.get_bundles_in_bundle_group(bundle_group).len();
      (bundle_count >= options.max_parallel_requests).then_some((bundle_group, bundle_count))
    });

    if let Some((bundle_group, bundle_count)) = full_bundle_group {
      let bundle_group_id = bundle_graph
        .get_bundle_group(bundle_group)
        .map(|bundle_group| bundle_group.id.clone())
        .unwrap_or_default();

      debug!(
        key = %key,
        bundle_group_id = %bundle_group_id,
        bundle_count,
        "Skipping shared bundle that would exceed the parallel request limit"
      );

      decisions.push(
        Phase::SharedBundles,
        DecisionKind::CandidateRejected {
          key,
          reason: RejectionReason::ParallelRequestLimit {
            bundle_group_id,
            bundle_count,
            max_parallel_requests: options.max_parallel_requests,
          },
        },
      );
      continue;
    }

    let Some(first_bundle) = candidate
      .source_bundles
      .first()
      .and_then(|bundle| bundle_graph.get_bundle(bundle))
      .cloned()
    else {
      continue;
    };

    let shared_bundle = bundle_graph.create_bundle(CreateBundleOptions {
      entry_asset: None,
      id: Some(hash_string(key.clone())),
      bundle_type: Some(first_bundle.bundle_type),
      env: Some(first_bundle.env),
      is_entry: false,
      target: first_bundle.target,
    })?;

    for asset in &candidate.assets {
      bundle_graph.add_asset_graph_to_bundle(asset, &shared_bundle, &candidate.source_bundles)?;

      for source_bundle in &candidate.source_bundles {
        bundle_graph.remove_asset_graph_from_bundle(asset, source_bundle)?;
      }
    }

    for bundle_group in &bundle_groups {
      bundle_graph.add_bundle_to_bundle_group(&shared_bundle, bundle_group)?;
    }

    let bundle_id = bundle_graph
      .get_bundle(&shared_bundle)
      .map(|bundle| bundle.id.clone())
      .unwrap_or_default();
    let size = bundle_graph.get_bundle_size(&shared_bundle);

    debug!(
      bundle_id = %bundle_id,
      key = %key,
      assets = bundle_graph.get_bundle_assets(&shared_bundle).len(),
      size,
      "Created shared bundle"
    );

    decisions.push(
      Phase::SharedBundles,
      DecisionKind::SharedBundleCreated {
        bundle_id,
        source_bundle_ids: key.split(':').map(String::from).collect(),
        bundle_group_ids: bundle_groups
          .iter()
          .filter_map(|bundle_group| bundle_graph.get_bundle_group(bundle_group))
          .map(|bundle_group| bundle_group.id.clone())
          .collect(),
        size: candidate.size,
      },
    );

    created += 1;
  }

  debug!(created, "Finished shared bundle extraction");

  Ok(())
}

/// Groups every asset held by more than `min_bundles` non-entry bundles by that set of bundles.
///
/// Once an asset joins a candidate its sub-graph is skipped, since it moves together with it.
fn find_candidates(
  bundle_graph: &BundleGraph,
  options: &BundlerOptions,
) -> BTreeMap<String, Candidate> {
  let mut candidates: BTreeMap<String, Candidate> = BTreeMap::new();

  bundle_graph.traverse_contents(|event| {
    let TraversalEvent::Enter(node_id) = event else {
      return TraversalAction::Continue;
    };

    let Some(asset) = bundle_graph.get_asset(&node_id) else {
      return TraversalAction::Continue;
    };

    // Isolated environments cannot load shared bundles
    if asset.env.is_isolated() {
      return TraversalAction::Continue;
    }

    let containing_bundles = bundle_graph
      .find_bundles_with_asset(&node_id)
      .into_iter()
      .filter_map(|bundle_node_id| {
        bundle_graph
          .get_bundle(&bundle_node_id)
          .filter(|bundle| !bundle.is_entry)
          .map(|bundle| (bundle.id.clone(), bundle_node_id))
      })
      .sorted()
      .collect::<Vec<_>>();

    if containing_bundles.len() <= options.min_bundles {
      return TraversalAction::Continue;
    }

    let key = containing_bundles.iter().map(|(id, _)| id).join(":");
    let source_bundles = containing_bundles
      .into_iter()
      .map(|(_, bundle_node_id)| bundle_node_id)
      .collect::<Vec<_>>();
    let size = bundle_graph.get_total_size(&node_id, &source_bundles);

    let candidate = candidates.entry(key).or_insert_with(|| Candidate {
      assets: Vec::new(),
      source_bundles,
      size: 0,
    });
    candidate.assets.push(node_id);
    candidate.size += size;

    TraversalAction::SkipChildren
  });

  candidates
}
