#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use splitpack_bundler::{Bundler, BundlerOptions, DecisionKind, DecisionLog, DefaultBundler};
use splitpack_core::asset_graph::{AssetGraph, NodeId};
use splitpack_core::bundle_graph::BundleGraph;
use splitpack_test_fixtures::{generate_asset_graph, GraphConfig};

/// Bundle node id to the sorted asset node ids it holds
pub type Membership = BTreeMap<NodeId, Vec<NodeId>>;

/// Synthetic applications of a few shapes and sizes
pub fn synthetic_graphs() -> Vec<AssetGraph> {
  let mut configs = (1..=4)
    .map(|seed| GraphConfig {
      seed,
      ..GraphConfig::default()
    })
    .collect::<Vec<_>>();

  configs.push(GraphConfig {
    num_entries: 3,
    num_assets: 300,
    num_deps: 1200,
    lazy_ratio: 0.5,
    css_ratio: 0.2,
    route_ratio: 0.15,
    seed: 7,
  });

  configs.into_iter().map(generate_asset_graph).collect()
}

pub fn membership(bundle_graph: &BundleGraph) -> Membership {
  bundle_graph
    .bundles()
    .into_iter()
    .map(|bundle| {
      let mut assets = bundle_graph.get_bundle_assets(&bundle);
      assets.sort();
      (bundle, assets)
    })
    .collect()
}

pub fn bundle_group_sizes(bundle_graph: &BundleGraph) -> BTreeMap<NodeId, usize> {
  bundle_graph
    .bundle_groups()
    .into_iter()
    .map(|bundle_group| {
      let count = bundle_graph
        .get_bundles_in_bundle_group(&bundle_group)
        .len();
      (bundle_group, count)
    })
    .collect()
}

/// The state after creating bundles, before any optimization
pub struct Bundled {
  pub bundler: DefaultBundler,
  pub bundle_graph: BundleGraph,
  pub membership: Membership,
  pub bundle_group_sizes: BTreeMap<NodeId, usize>,
}

impl Bundled {
  pub fn new(asset_graph: &AssetGraph, options: BundlerOptions) -> Self {
    let bundler = DefaultBundler::new(options);
    let mut bundle_graph = BundleGraph::from_asset_graph(asset_graph);
    bundler.bundle(&mut bundle_graph).unwrap();

    Self {
      membership: membership(&bundle_graph),
      bundle_group_sizes: bundle_group_sizes(&bundle_graph),
      bundler,
      bundle_graph,
    }
  }

  pub fn optimize(mut self) -> (BundleGraph, Membership, BTreeMap<NodeId, usize>, DecisionLog) {
    self.bundler.optimize(&mut self.bundle_graph).unwrap();

    (
      self.bundle_graph,
      self.membership,
      self.bundle_group_sizes,
      self.bundler.decisions(),
    )
  }
}

/// Whether `asset` is available when `bundle` runs, whichever way `bundle` is reached.
///
/// A bundle group provides the asset when any of its bundles holds it. Otherwise every bundle
/// that loads the group must be reached with the asset available, and groups loaded from the
/// root never are.
pub fn is_loaded_with(bundle_graph: &BundleGraph, bundle: NodeId, asset: NodeId) -> bool {
  let root_bundle_groups = bundle_graph
    .get_root_bundle_groups()
    .into_iter()
    .collect::<HashSet<_>>();
  let mut visited = HashSet::from([bundle]);
  let mut queue = VecDeque::from([bundle]);

  while let Some(current) = queue.pop_front() {
    let bundle_groups = bundle_graph.get_bundle_groups_containing_bundle(&current);
    if bundle_groups.is_empty() {
      return bundle_graph.bundle_has_asset(&current, &asset);
    }

    for bundle_group in bundle_groups {
      let loaded_in_parallel = bundle_graph
        .get_bundles_in_bundle_group(&bundle_group)
        .iter()
        .any(|sibling| bundle_graph.bundle_has_asset(sibling, &asset));

      if loaded_in_parallel {
        continue;
      }

      let parents = bundle_graph.get_parent_bundles(&bundle_group);
      if parents.is_empty() || root_bundle_groups.contains(&bundle_group) {
        return false;
      }

      for parent in parents {
        if visited.insert(parent) {
          queue.push_back(parent);
        }
      }
    }
  }

  true
}

/// Every asset reachable from `entry_dependency` through the dependency graph
pub fn reachable_assets(bundle_graph: &BundleGraph, entry_dependency: NodeId) -> BTreeSet<NodeId> {
  let mut reachable = BTreeSet::new();
  let mut stack = bundle_graph.get_dependency_assets(&entry_dependency);

  while let Some(asset) = stack.pop() {
    if !reachable.insert(asset) {
      continue;
    }

    for dependency in bundle_graph.get_asset_dependencies(&asset) {
      stack.extend(bundle_graph.get_dependency_assets(&dependency));
    }
  }

  reachable
}

/// Every bundle loaded by the groups of `entry_dependency` or by the groups they load
pub fn reachable_bundles(bundle_graph: &BundleGraph, entry_dependency: NodeId) -> BTreeSet<NodeId> {
  let mut reachable = BTreeSet::new();
  let mut visited = HashSet::new();
  let mut queue = VecDeque::from(bundle_graph.get_dependency_bundle_groups(&entry_dependency));

  while let Some(bundle_group) = queue.pop_front() {
    if !visited.insert(bundle_group) {
      continue;
    }

    for bundle in bundle_graph.get_bundles_in_bundle_group(&bundle_group) {
      if reachable.insert(bundle) {
        queue.extend(bundle_graph.get_child_bundle_groups(&bundle));
      }
    }
  }

  reachable
}

pub fn shared_bundles_created(decisions: &DecisionLog) -> Vec<&DecisionKind> {
  decisions
    .decisions
    .iter()
    .map(|decision| &decision.kind)
    .filter(|kind| matches!(kind, DecisionKind::SharedBundleCreated { .. }))
    .collect()
}

pub fn bundle_with_asset(bundle_graph: &BundleGraph, asset: NodeId) -> NodeId {
  let bundles = bundle_graph.find_bundles_with_asset(&asset);
  assert_eq!(bundles.len(), 1, "expected asset to be in exactly one bundle");
  bundles[0]
}
