use std::collections::HashSet;

use anyhow::anyhow;
use anyhow::Context;
use indexmap::IndexMap;
use splitpack_core::asset_graph::NodeId;
use splitpack_core::bundle_graph::{BundleGraph, BundleGraphNode, CreateBundleOptions};
use splitpack_core::types::{FileType, Target};
use tracing::debug;
use tracing::instrument;

use crate::Bundler;

/// Places everything reachable from an entry in one bundle per type.
///
/// Async dependencies do not split the graph. Used for library builds, and as a baseline when
/// comparing the output of other bundlers.
#[derive(Debug, Default)]
pub struct MonolithicBundler;

impl Bundler for MonolithicBundler {
  #[instrument(level = "debug", skip_all)]
  fn bundle(&self, bundle_graph: &mut BundleGraph) -> anyhow::Result<()> {
    let entry_dependencies = bundle_graph
      .nodes()
      .enumerate()
      .filter_map(|(node_id, node)| match node {
        BundleGraphNode::Dependency(dependency) if dependency.is_entry => Some(node_id),
        _ => None,
      })
      .collect::<Vec<_>>();

    for entry_dependency in entry_dependencies {
      bundle_entry(bundle_graph, entry_dependency).with_context(|| {
        let specifier = bundle_graph
          .get_dependency(&entry_dependency)
          .map(|dependency| dependency.specifier.clone())
          .unwrap_or_default();
        format!("Failed to bundle entry {specifier}")
      })?;
    }

    Ok(())
  }
}

fn bundle_entry(bundle_graph: &mut BundleGraph, entry_dependency: NodeId) -> anyhow::Result<()> {
  let target: Target = bundle_graph
    .get_dependency(&entry_dependency)
    .and_then(|dependency| dependency.target.as_deref().cloned())
    .unwrap_or_default();

  let entry_assets = bundle_graph.get_dependency_assets(&entry_dependency);
  if entry_assets.is_empty() {
    return Err(anyhow!("entry dependency did not resolve to an asset"));
  }

  let bundle_group = bundle_graph.create_bundle_group(&entry_dependency, target.clone(), None)?;
  let mut bundles_by_type: IndexMap<FileType, NodeId> = IndexMap::new();
  let mut visited = HashSet::new();
  let mut stack = entry_assets.into_iter().rev().collect::<Vec<_>>();

  while let Some(asset) = stack.pop() {
    if !visited.insert(asset) {
      continue;
    }

    let Some(file_type) = bundle_graph
      .get_asset(&asset)
      .map(|asset| asset.file_type.clone())
    else {
      continue;
    };

    let bundle = match bundles_by_type.get(&file_type) {
      Some(bundle) => *bundle,
      None => {
        let bundle = bundle_graph.create_bundle(CreateBundleOptions {
          entry_asset: Some(asset),
          is_entry: true,
          target: target.clone(),
          ..CreateBundleOptions::default()
        })?;
        bundle_graph.add_bundle_to_bundle_group(&bundle, &bundle_group)?;
        bundles_by_type.insert(file_type.clone(), bundle);
        bundle
      }
    };

    if !bundle_graph.bundle_has_asset(&bundle, &asset) {
      bundle_graph.add_asset_graph_to_bundle(&asset, &bundle, &[])?;
    }

    for dependency in bundle_graph.get_asset_dependencies(&asset) {
      for child in bundle_graph.get_dependency_assets(&dependency).into_iter().rev() {
        let crosses_bundles = bundle_graph
          .get_asset(&child)
          .is_some_and(|child| child.file_type != file_type);

        if crosses_bundles {
          bundle_graph.create_asset_reference(&dependency, &child)?;
        }

        stack.push(child);
      }
    }
  }

  debug!(
    entry_dependency,
    bundles = bundles_by_type.len(),
    "Bundled entry"
  );

  Ok(())
}
