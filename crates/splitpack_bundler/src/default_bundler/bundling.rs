use std::collections::HashMap;
use std::collections::HashSet;

use indexmap::IndexMap;
use splitpack_core::asset_graph::NodeId;
use splitpack_core::bundle_graph::{BundleGraph, BundleGraphNode, CreateBundleOptions};
use splitpack_core::error::BundleGraphError;
use splitpack_core::types::{Dependency, FileType, Target};
use tracing::debug;
use tracing::instrument;

use crate::decisions::{DecisionKind, DecisionLog, Phase};

/// Where the current path of the dependency graph is being bundled into
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct BundlingContext {
  bundle_group: NodeId,
  /// The entry or async dependency that created `bundle_group`
  bundle_group_dependency: NodeId,
  /// The node the current node was reached from
  parent_node: NodeId,
}

/// Creates bundle groups and bundles for every split point and type boundary of the graph.
///
/// Bundles only hold their root assets afterwards. See [`populate_bundles`].
#[instrument(level = "debug", skip_all)]
pub(super) fn create_bundles(
  bundle_graph: &mut BundleGraph,
  decisions: &mut DecisionLog,
) -> Result<(), BundleGraphError> {
  let mut pass = BundlingPass {
    bundles_by_type: HashMap::new(),
    seen_bundle_groups: HashSet::new(),
    seen_bundles: HashSet::new(),
    decisions,
  };

  bundle_graph.traverse(|bundle_graph, node_id, context: Option<&Option<BundlingContext>>| {
    pass.visit(bundle_graph, node_id, context.and_then(Option::as_ref))
  })?;

  debug!(
    bundles = pass.seen_bundles.len(),
    bundle_groups = pass.seen_bundle_groups.len(),
    "Created bundles"
  );

  Ok(())
}

/// Adds the synchronous same-type sub-graph below every root asset to its bundle
#[instrument(level = "debug", skip_all)]
pub(super) fn populate_bundles(bundle_graph: &mut BundleGraph) -> Result<(), BundleGraphError> {
  for bundle in bundle_graph.bundles() {
    for root_asset in bundle_graph.get_bundle_root_assets(&bundle) {
      bundle_graph.add_asset_graph_to_bundle(&root_asset, &bundle, &[])?;
    }

    if let Some(bundle_node) = bundle_graph.get_bundle(&bundle) {
      debug!(
        bundle_id = %bundle_node.id,
        bundle_type = %bundle_node.bundle_type,
        assets = bundle_graph.get_bundle_assets(&bundle).len(),
        size = bundle_graph.get_bundle_size(&bundle),
        "Populated bundle"
      );
    }
  }

  Ok(())
}

struct BundlingPass<'a> {
  /// The bundle of each type in a bundle group
  bundles_by_type: HashMap<NodeId, IndexMap<FileType, NodeId>>,
  seen_bundle_groups: HashSet<NodeId>,
  seen_bundles: HashSet<NodeId>,
  decisions: &'a mut DecisionLog,
}

impl BundlingPass<'_> {
  fn visit(
    &mut self,
    bundle_graph: &mut BundleGraph,
    node_id: NodeId,
    context: Option<&BundlingContext>,
  ) -> Result<Option<BundlingContext>, BundleGraphError> {
    let dependency = match bundle_graph.get_node(&node_id) {
      Some(BundleGraphNode::Dependency(dependency)) => dependency.clone(),
      _ => {
        return Ok(context.map(|context| BundlingContext {
          parent_node: node_id,
          ..context.clone()
        }))
      }
    };

    let parent_bundle = context.and_then(|context| self.parent_bundle(bundle_graph, context));

    if dependency.is_split_point() {
      return self.visit_split_point(bundle_graph, node_id, &dependency, context, parent_bundle);
    }

    let Some(context) = context else {
      return Err(BundleGraphError::MissingBundleGroupContext {
        dependency_id: dependency.id.clone(),
        specifier: dependency.specifier.clone(),
      });
    };

    let parent_type = bundle_graph
      .get_asset(&context.parent_node)
      .map(|asset| asset.file_type.clone());

    for asset_node_id in bundle_graph.get_dependency_assets(&node_id) {
      let Some(asset) = bundle_graph.get_asset(&asset_node_id).cloned() else {
        continue;
      };

      if asset.is_isolated {
        let target = bundle_group_target(bundle_graph, &context.bundle_group)?;
        let bundle_group =
          self.create_bundle_group(bundle_graph, node_id, target.clone(), parent_bundle)?;
        self.create_bundle(
          bundle_graph,
          bundle_group,
          CreateBundleOptions {
            entry_asset: Some(asset_node_id),
            target,
            ..CreateBundleOptions::default()
          },
        )?;
        self.create_reference(bundle_graph, node_id, asset_node_id)?;
        continue;
      }

      if parent_type.as_ref() == Some(&asset.file_type) {
        continue;
      }

      let existing_bundle = self
        .bundles_by_type
        .get(&context.bundle_group)
        .and_then(|bundles| bundles.get(&asset.file_type))
        .copied();

      let bundle = match existing_bundle {
        Some(bundle) => bundle,
        None => {
          let is_entry = bundle_graph
            .get_dependency(&context.bundle_group_dependency)
            .is_some_and(|dependency| dependency.is_entry);
          let target = bundle_group_target(bundle_graph, &context.bundle_group)?;

          let bundle = self.create_bundle(
            bundle_graph,
            context.bundle_group,
            CreateBundleOptions {
              entry_asset: Some(asset_node_id),
              is_entry,
              target,
              ..CreateBundleOptions::default()
            },
          )?;

          self
            .bundles_by_type
            .entry(context.bundle_group)
            .or_default()
            .insert(asset.file_type.clone(), bundle);

          bundle
        }
      };

      self.place_asset(bundle_graph, asset_node_id, bundle)?;
      self.create_reference(bundle_graph, node_id, asset_node_id)?;
    }

    Ok(Some(BundlingContext {
      parent_node: node_id,
      ..context.clone()
    }))
  }

  /// Entry and async dependencies start a bundle group with one bundle per resolved asset
  fn visit_split_point(
    &mut self,
    bundle_graph: &mut BundleGraph,
    node_id: NodeId,
    dependency: &Dependency,
    context: Option<&BundlingContext>,
    parent_bundle: Option<NodeId>,
  ) -> Result<Option<BundlingContext>, BundleGraphError> {
    let assets = bundle_graph.get_dependency_assets(&node_id);
    if assets.is_empty() {
      debug!(
        dependency_id = %dependency.id,
        specifier = %dependency.specifier,
        "Skipping split point without resolved assets"
      );
      return Ok(context.cloned());
    }

    let target = match (dependency.target.as_deref(), context) {
      (Some(target), _) => target.clone(),
      (None, Some(context)) => bundle_group_target(bundle_graph, &context.bundle_group)?,
      (None, None) => {
        return Err(BundleGraphError::MissingTarget {
          dependency_id: dependency.id.clone(),
          specifier: dependency.specifier.clone(),
        })
      }
    };

    let bundle_group =
      self.create_bundle_group(bundle_graph, node_id, target.clone(), parent_bundle)?;
    let loads_without_entry = dependency.is_async() && !dependency.is_url();

    for asset_node_id in assets {
      let Some(asset) = bundle_graph.get_asset(&asset_node_id).cloned() else {
        continue;
      };

      let bundle = self.create_bundle(
        bundle_graph,
        bundle_group,
        CreateBundleOptions {
          entry_asset: (!loads_without_entry).then_some(asset_node_id),
          id: Some(asset.id.clone()),
          bundle_type: Some(asset.file_type.clone()),
          env: Some(asset.env.clone()),
          is_entry: !asset.is_isolated && dependency.is_entry,
          target: target.clone(),
        },
      )?;

      if dependency.is_async() {
        self.place_asset(bundle_graph, asset_node_id, bundle)?;
        self.create_reference(bundle_graph, node_id, asset_node_id)?;
      }

      self
        .bundles_by_type
        .entry(bundle_group)
        .or_default()
        .insert(asset.file_type.clone(), bundle);
    }

    Ok(Some(BundlingContext {
      bundle_group,
      bundle_group_dependency: node_id,
      parent_node: node_id,
    }))
  }

  /// The bundle of the current group that holds the asset the path came from
  fn parent_bundle(&self, bundle_graph: &BundleGraph, context: &BundlingContext) -> Option<NodeId> {
    let parent_asset = bundle_graph.get_asset(&context.parent_node)?;

    self
      .bundles_by_type
      .get(&context.bundle_group)?
      .get(&parent_asset.file_type)
      .copied()
  }

  fn create_bundle_group(
    &mut self,
    bundle_graph: &mut BundleGraph,
    dependency: NodeId,
    target: Target,
    parent_bundle: Option<NodeId>,
  ) -> Result<NodeId, BundleGraphError> {
    let bundle_group =
      bundle_graph.create_bundle_group(&dependency, target, parent_bundle.as_ref())?;

    if self.seen_bundle_groups.insert(bundle_group) {
      if let (Some(group), Some(dependency)) = (
        bundle_graph.get_bundle_group(&bundle_group),
        bundle_graph.get_dependency(&dependency),
      ) {
        debug!(
          bundle_group_id = %group.id,
          specifier = %dependency.specifier,
          "Created bundle group"
        );

        self.decisions.push(
          Phase::Bundling,
          DecisionKind::BundleGroupCreated {
            bundle_group_id: group.id.clone(),
            dependency_id: dependency.id.clone(),
            target: group.target.name.clone(),
          },
        );
      }
    }

    Ok(bundle_group)
  }

  /// Creates a bundle and attaches it to `bundle_group`
  fn create_bundle(
    &mut self,
    bundle_graph: &mut BundleGraph,
    bundle_group: NodeId,
    options: CreateBundleOptions,
  ) -> Result<NodeId, BundleGraphError> {
    let entry_asset = options.entry_asset;
    let bundle = bundle_graph.create_bundle(options)?;
    bundle_graph.add_bundle_to_bundle_group(&bundle, &bundle_group)?;

    if !self.seen_bundles.insert(bundle) {
      return Ok(bundle);
    }

    if let Some(bundle_node) = bundle_graph.get_bundle(&bundle) {
      self.decisions.push(
        Phase::Bundling,
        DecisionKind::BundleCreated {
          bundle_id: bundle_node.id.clone(),
          bundle_type: bundle_node.bundle_type.clone(),
          is_entry: bundle_node.is_entry,
        },
      );
    }

    if let Some(entry_asset) = entry_asset {
      self.record_placement(bundle_graph, entry_asset, bundle);
    }

    Ok(bundle)
  }

  fn place_asset(
    &mut self,
    bundle_graph: &mut BundleGraph,
    asset: NodeId,
    bundle: NodeId,
  ) -> Result<(), BundleGraphError> {
    if bundle_graph.bundle_has_asset(&bundle, &asset) {
      return Ok(());
    }

    bundle_graph.add_asset_to_bundle(&asset, &bundle)?;
    self.record_placement(bundle_graph, asset, bundle);

    Ok(())
  }

  fn record_placement(&mut self, bundle_graph: &BundleGraph, asset: NodeId, bundle: NodeId) {
    if let (Some(asset), Some(bundle)) = (
      bundle_graph.get_asset(&asset),
      bundle_graph.get_bundle(&bundle),
    ) {
      self.decisions.push(
        Phase::Bundling,
        DecisionKind::AssetPlaced {
          asset_id: asset.id.clone(),
          bundle_id: bundle.id.clone(),
        },
      );
    }
  }

  fn create_reference(
    &mut self,
    bundle_graph: &mut BundleGraph,
    dependency: NodeId,
    asset: NodeId,
  ) -> Result<(), BundleGraphError> {
    if bundle_graph.get_referenced_assets(&dependency).contains(&asset) {
      return Ok(());
    }

    bundle_graph.create_asset_reference(&dependency, &asset)?;

    if let (Some(dependency), Some(asset)) = (
      bundle_graph.get_dependency(&dependency),
      bundle_graph.get_asset(&asset),
    ) {
      self.decisions.push(
        Phase::Bundling,
        DecisionKind::ReferenceCreated {
          dependency_id: dependency.id.clone(),
          asset_id: asset.id.clone(),
        },
      );
    }

    Ok(())
  }
}

fn bundle_group_target(
  bundle_graph: &BundleGraph,
  bundle_group: &NodeId,
) -> Result<Target, BundleGraphError> {
  bundle_graph
    .get_bundle_group(bundle_group)
    .map(|bundle_group| bundle_group.target.clone())
    .ok_or(BundleGraphError::UnexpectedNode {
      node_id: *bundle_group,
      expected: "a bundle group",
    })
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;
  use std::sync::Arc;

  use pretty_assertions::assert_eq;
  use splitpack_core::asset_graph::AssetGraph;
  use splitpack_core::types::{Asset, DependencyBuilder, Environment};
  use splitpack_test_fixtures::AssetGraphBuilder;

  use super::*;

  fn bundle(asset_graph: &AssetGraph) -> (BundleGraph, DecisionLog) {
    let mut bundle_graph = BundleGraph::from_asset_graph(asset_graph);
    let mut decisions = DecisionLog::default();

    create_bundles(&mut bundle_graph, &mut decisions).unwrap();
    populate_bundles(&mut bundle_graph).unwrap();

    (bundle_graph, decisions)
  }

  fn bundle_with_entry(bundle_graph: &BundleGraph, asset: NodeId) -> NodeId {
    let asset_id = &bundle_graph.get_asset(&asset).unwrap().id;

    bundle_graph
      .bundles()
      .into_iter()
      .find(|bundle| {
        bundle_graph.get_bundle(bundle).unwrap().entry_asset_id.as_ref() == Some(asset_id)
      })
      .unwrap()
  }

  fn sorted(mut nodes: Vec<NodeId>) -> Vec<NodeId> {
    nodes.sort();
    nodes
  }

  #[test]
  fn test_entry_bundle_holds_the_sync_same_type_graph() {
    let mut builder = AssetGraphBuilder::new();
    let index = builder.entry("index.js", 10);
    let a = builder.asset("a.js", 10);
    let b = builder.asset("b.js", 10);
    builder.import(index, a);
    builder.import(a, b);

    let (bundle_graph, decisions) = bundle(&builder.build());

    let bundles = bundle_graph.bundles();
    assert_eq!(bundles.len(), 1);
    assert!(bundle_graph.get_bundle(&bundles[0]).unwrap().is_entry);
    assert_eq!(
      sorted(bundle_graph.get_bundle_assets(&bundles[0])),
      sorted(vec![index, a, b])
    );
    assert_eq!(bundle_graph.get_bundle_root_assets(&bundles[0]), vec![index]);
    assert_eq!(decisions.in_phase(Phase::Bundling).count(), 3);
  }

  #[test]
  fn test_type_boundary_creates_a_parallel_bundle_in_the_same_group() {
    let mut builder = AssetGraphBuilder::new();
    let index = builder.entry("index.js", 10);
    let styles = builder.asset("styles.css", 10);
    let theme = builder.asset("theme.css", 10);
    let styles_dep = builder.import(index, styles);
    builder.import(styles, theme);

    let (bundle_graph, _) = bundle(&builder.build());

    let entry_bundle = bundle_with_entry(&bundle_graph, index);
    let css_bundle = bundle_with_entry(&bundle_graph, styles);
    let css = bundle_graph.get_bundle(&css_bundle).unwrap();

    assert_eq!(css.bundle_type, FileType::Css);
    assert!(css.is_entry);
    assert_eq!(
      bundle_graph.get_bundle_groups_containing_bundle(&css_bundle),
      bundle_graph.get_bundle_groups_containing_bundle(&entry_bundle)
    );
    assert_eq!(
      sorted(bundle_graph.get_bundle_assets(&css_bundle)),
      sorted(vec![styles, theme])
    );
    assert!(!bundle_graph.bundle_has_asset(&entry_bundle, &styles));
    assert_eq!(bundle_graph.get_referenced_assets(&styles_dep), vec![styles]);
  }

  #[test]
  fn test_type_bundles_are_shared_within_a_group() {
    let mut builder = AssetGraphBuilder::new();
    let index = builder.entry("index.js", 10);
    let a = builder.asset("a.js", 10);
    let first = builder.asset("first.css", 10);
    let second = builder.asset("second.css", 10);
    builder.import(index, a);
    builder.import(index, first);
    builder.import(a, second);

    let (bundle_graph, _) = bundle(&builder.build());

    let css_bundle = bundle_with_entry(&bundle_graph, second);

    assert_eq!(bundle_graph.bundles().len(), 2);
    assert_eq!(
      sorted(bundle_graph.get_bundle_root_assets(&css_bundle)),
      sorted(vec![first, second])
    );
  }

  #[test]
  fn test_async_dependency_creates_a_child_bundle_group() {
    let mut builder = AssetGraphBuilder::new();
    let index = builder.entry("index.js", 10);
    let lazy = builder.asset("lazy.js", 10);
    let util = builder.asset("util.js", 10);
    let lazy_dep = builder.import_lazy(index, lazy);
    builder.import(lazy, util);

    let (bundle_graph, decisions) = bundle(&builder.build());

    let entry_bundle = bundle_with_entry(&bundle_graph, index);
    let lazy_group = bundle_graph.get_dependency_bundle_groups(&lazy_dep)[0];
    let lazy_bundle = bundle_graph.get_bundles_in_bundle_group(&lazy_group)[0];
    let lazy_bundle_node = bundle_graph.get_bundle(&lazy_bundle).unwrap();

    assert_eq!(lazy_bundle_node.entry_asset_id, None);
    assert!(!lazy_bundle_node.is_entry);
    assert_eq!(bundle_graph.get_parent_bundles(&lazy_group), vec![entry_bundle]);
    assert_eq!(
      sorted(bundle_graph.get_bundle_assets(&lazy_bundle)),
      sorted(vec![lazy, util])
    );
    assert_eq!(bundle_graph.get_referenced_assets(&lazy_dep), vec![lazy]);
    assert!(decisions.decisions.iter().any(|decision| matches!(
      &decision.kind,
      DecisionKind::ReferenceCreated { asset_id, .. }
        if *asset_id == bundle_graph.get_asset(&lazy).unwrap().id
    )));
  }

  /// index.js => a.js, a.css
  ///              a.js -> util.js
  ///              a.css -> theme.css
  #[test]
  fn test_split_point_resolving_to_several_types_gets_a_bundle_per_type() {
    let mut builder = AssetGraphBuilder::new();
    let index = builder.entry("index.js", 10);
    let a_js = builder.asset("a.js", 10);
    let a_css = builder.asset("a.css", 10);
    let util = builder.asset("util.js", 10);
    let theme = builder.asset("theme.css", 10);
    let lazy_dep = builder.dependency(
      index,
      &[a_js, a_css],
      splitpack_core::types::Priority::Lazy,
      splitpack_core::types::SpecifierType::Esm,
    );
    builder.import(a_js, util);
    builder.import(a_css, theme);

    let (bundle_graph, _) = bundle(&builder.build());

    let bundle_groups = bundle_graph.get_dependency_bundle_groups(&lazy_dep);
    assert_eq!(bundle_groups.len(), 1);

    let bundles = bundle_graph.get_bundles_in_bundle_group(&bundle_groups[0]);
    let bundle_types = bundles
      .iter()
      .map(|bundle| bundle_graph.get_bundle(bundle).unwrap().bundle_type.clone())
      .collect::<Vec<_>>();
    assert_eq!(bundle_types, vec![FileType::Js, FileType::Css]);

    assert_eq!(
      sorted(bundle_graph.get_bundle_assets(&bundles[0])),
      sorted(vec![a_js, util])
    );
    assert_eq!(
      sorted(bundle_graph.get_bundle_assets(&bundles[1])),
      sorted(vec![a_css, theme])
    );
    for asset in [a_js, a_css, util, theme] {
      assert_eq!(bundle_graph.find_bundles_with_asset(&asset).len(), 1);
    }
    assert_eq!(
      bundle_graph.get_parent_bundles(&bundle_groups[0]),
      vec![bundle_with_entry(&bundle_graph, index)]
    );
    assert_eq!(
      sorted(bundle_graph.get_referenced_assets(&lazy_dep)),
      sorted(vec![a_js, a_css])
    );
  }

  /// index.js -> x.js, y.css
  #[test]
  fn test_sync_dependency_resolving_to_several_types_splits_at_the_type_boundary() {
    let mut builder = AssetGraphBuilder::new();
    let index = builder.entry("index.js", 10);
    let x_js = builder.asset("x.js", 10);
    let y_css = builder.asset("y.css", 10);
    let dependency = builder.dependency(
      index,
      &[x_js, y_css],
      splitpack_core::types::Priority::Sync,
      splitpack_core::types::SpecifierType::Esm,
    );

    let (bundle_graph, _) = bundle(&builder.build());

    let entry_bundle = bundle_with_entry(&bundle_graph, index);
    let css_bundle = bundle_with_entry(&bundle_graph, y_css);
    let bundle_group = bundle_graph.get_bundle_groups_containing_bundle(&entry_bundle)[0];

    assert_eq!(
      bundle_graph.get_bundles_in_bundle_group(&bundle_group),
      vec![entry_bundle, css_bundle]
    );
    assert_eq!(
      bundle_graph.get_bundle(&css_bundle).unwrap().bundle_type,
      FileType::Css
    );
    assert_eq!(
      sorted(bundle_graph.get_bundle_assets(&entry_bundle)),
      sorted(vec![index, x_js])
    );
    assert_eq!(bundle_graph.get_bundle_assets(&css_bundle), vec![y_css]);
    assert_eq!(bundle_graph.find_bundles_with_asset(&x_js), vec![entry_bundle]);
    assert_eq!(bundle_graph.get_referenced_assets(&dependency), vec![y_css]);
  }

  /// index.js -> styles.css
  /// index.js => lazy.js -> styles.css
  #[test]
  fn test_type_bundles_with_the_same_entry_asset_are_reused_across_groups() {
    let mut builder = AssetGraphBuilder::new();
    let index = builder.entry("index.js", 10);
    let styles = builder.asset("styles.css", 10);
    let lazy = builder.asset("lazy.js", 10);
    builder.import(index, styles);
    let lazy_dep = builder.import_lazy(index, lazy);
    builder.import(lazy, styles);

    let (bundle_graph, _) = bundle(&builder.build());

    let entry_bundle = bundle_with_entry(&bundle_graph, index);
    let css_bundle = bundle_with_entry(&bundle_graph, styles);
    let entry_group = bundle_graph.get_bundle_groups_containing_bundle(&entry_bundle)[0];
    let lazy_group = bundle_graph.get_dependency_bundle_groups(&lazy_dep)[0];

    assert_eq!(bundle_graph.bundles().len(), 3);
    assert_eq!(bundle_graph.find_bundles_with_asset(&styles), vec![css_bundle]);
    assert_eq!(
      sorted(bundle_graph.get_bundle_groups_containing_bundle(&css_bundle)),
      sorted(vec![entry_group, lazy_group])
    );
  }

  #[test]
  fn test_url_dependencies_keep_their_entry_asset() {
    let mut builder = AssetGraphBuilder::new();
    let index = builder.entry("index.js", 10);
    let lazy = builder.asset("lazy.js", 10);
    builder.dependency(
      index,
      &[lazy],
      splitpack_core::types::Priority::Lazy,
      splitpack_core::types::SpecifierType::Url,
    );

    let (bundle_graph, _) = bundle(&builder.build());

    bundle_with_entry(&bundle_graph, lazy);
  }

  #[test]
  fn test_isolated_asset_gets_its_own_group() {
    let mut builder = AssetGraphBuilder::new();
    let index = builder.entry("index.js", 10);
    let inline = builder.isolated_asset("inline.js", 10);
    let inline_dep = builder.import(index, inline);

    let (bundle_graph, _) = bundle(&builder.build());

    let entry_bundle = bundle_with_entry(&bundle_graph, index);
    let inline_bundle = bundle_with_entry(&bundle_graph, inline);
    let inline_group = bundle_graph.get_bundle_groups_containing_bundle(&inline_bundle)[0];

    assert!(!bundle_graph.get_bundle(&inline_bundle).unwrap().is_entry);
    assert!(!bundle_graph.bundle_has_asset(&entry_bundle, &inline));
    assert_eq!(bundle_graph.get_parent_bundles(&inline_group), vec![entry_bundle]);
    assert_eq!(bundle_graph.get_referenced_assets(&inline_dep), vec![inline]);
  }

  #[test]
  fn test_entry_dependencies_to_isolated_assets_are_not_entries() {
    let mut builder = AssetGraphBuilder::new();
    let index = builder.entry("index.js", 10);
    let mut graph = builder.build();
    let mut inline = Asset::new(
      PathBuf::from("inline.js"),
      Arc::new(Environment::default()),
      10,
    );
    inline.is_isolated = true;
    let inline = graph.add_asset(Arc::new(inline));
    let entry_dep = graph.get_outgoing_neighbors(&graph.root_node())[0];
    graph.add_edge(&entry_dep, &inline);

    let (bundle_graph, _) = bundle(&graph);

    assert!(bundle_graph
      .get_bundle(&bundle_with_entry(&bundle_graph, index))
      .unwrap()
      .is_entry);
    assert!(!bundle_graph
      .get_bundle(&bundle_with_entry(&bundle_graph, inline))
      .unwrap()
      .is_entry);
  }

  #[test]
  fn test_shared_lazy_asset_gets_one_group() {
    let mut builder = AssetGraphBuilder::new();
    let index = builder.entry("index.js", 10);
    let a = builder.asset("a.js", 10);
    let lazy = builder.asset("lazy.js", 10);
    builder.import(index, a);
    let first = builder.import_lazy(index, lazy);
    let second = builder.import_lazy(a, lazy);

    let (bundle_graph, decisions) = bundle(&builder.build());

    assert_eq!(
      bundle_graph.get_dependency_bundle_groups(&first),
      bundle_graph.get_dependency_bundle_groups(&second)
    );
    assert_eq!(bundle_graph.bundle_groups().len(), 2);
    assert_eq!(
      decisions
        .decisions
        .iter()
        .filter(|decision| matches!(decision.kind, DecisionKind::BundleGroupCreated { .. }))
        .count(),
      2
    );
  }

  #[test]
  fn test_dependency_without_bundle_group_is_an_error() {
    let mut graph = AssetGraph::new();
    let root = graph.root_node();
    let dependency = graph.add_dependency(
      DependencyBuilder::default()
        .specifier(String::from("./orphan.js"))
        .build(),
    );
    let asset = graph.add_asset(Arc::new(Asset::new(
      PathBuf::from("orphan.js"),
      Arc::new(Environment::default()),
      10,
    )));
    graph.add_edge(&root, &dependency);
    graph.add_edge(&dependency, &asset);

    let mut bundle_graph = BundleGraph::from_asset_graph(&graph);
    let error = create_bundles(&mut bundle_graph, &mut DecisionLog::default()).unwrap_err();

    assert!(matches!(
      error,
      BundleGraphError::MissingBundleGroupContext { specifier, .. } if specifier == "./orphan.js"
    ));
  }

  #[test]
  fn test_unresolved_split_points_are_skipped() {
    let mut builder = AssetGraphBuilder::new();
    let index = builder.entry("index.js", 10);
    let unresolved = builder.dependency(
      index,
      &[],
      splitpack_core::types::Priority::Lazy,
      splitpack_core::types::SpecifierType::Esm,
    );

    let (bundle_graph, _) = bundle(&builder.build());

    assert_eq!(bundle_graph.bundles().len(), 1);
    assert!(bundle_graph
      .get_dependency_bundle_groups(&unresolved)
      .is_empty());
  }

  #[test]
  fn test_group_target_is_inherited() {
    let target = Target {
      name: String::from("modern"),
      ..Target::default()
    };

    let mut builder = AssetGraphBuilder::new();
    let index = builder.entry_with_target("index.js", 10, target.clone());
    let lazy = builder.asset("lazy.js", 10);
    let lazy_dep = builder.import_lazy(index, lazy);

    let (bundle_graph, _) = bundle(&builder.build());

    let lazy_group = bundle_graph.get_dependency_bundle_groups(&lazy_dep)[0];
    assert_eq!(bundle_graph.get_bundle_group(&lazy_group).unwrap().target, target);
  }
}
