use std::collections::HashMap;
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::debug;

use crate::asset_graph::{AssetGraph, AssetGraphNode, NodeId};
use crate::error::BundleGraphError;
use crate::types::{
  create_bundle_group_id, create_bundle_id, Asset, Bundle, BundleGroup, Dependency, Environment,
  FileType, Target,
};

/// Edge types in the bundle graph
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum BundleGraphEdgeType {
  /// Dependency graph structure (root -> dependency, asset -> dependency, dependency -> asset),
  /// dependency -> bundle group, and bundle -> root asset of the bundle
  #[default]
  Null = 1,
  /// bundle -> every asset held by the bundle
  Contains = 2,
  /// root -> entry bundle group, bundle group -> bundle, bundle -> bundle group it loads
  Bundle = 3,
  /// dependency -> asset it resolves to, when that asset is loaded from another bundle
  References = 4,
}

#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum BundleGraphNode {
  Root,
  Asset(Arc<Asset>),
  Dependency(Arc<Dependency>),
  BundleGroup(BundleGroup),
  Bundle(Bundle),
}

/// Options for [`BundleGraph::create_bundle`]
///
/// Either `entry_asset` or all of `id`, `bundle_type` and `env` must be provided. Values that
/// are missing are taken from the entry asset.
#[derive(Clone, Debug, Default)]
pub struct CreateBundleOptions {
  pub entry_asset: Option<NodeId>,
  pub id: Option<String>,
  pub bundle_type: Option<FileType>,
  pub env: Option<Arc<Environment>>,
  pub is_entry: bool,
  pub target: Target,
}

/// The output of bundling: the dependency graph plus bundles, bundle groups and the relations
/// between them
///
/// Asset and dependency nodes keep the node ids they had in the [`AssetGraph`] the bundle graph
/// was created from.
#[derive(Clone, Debug)]
pub struct BundleGraph {
  pub graph: StableDiGraph<NodeId, BundleGraphEdgeType>,
  nodes: Vec<BundleGraphNode>,
  node_id_to_node_index: HashMap<NodeId, NodeIndex>,
  content_key_to_node_id: HashMap<String, NodeId>,
  root_node_id: NodeId,
}

impl Default for BundleGraph {
  fn default() -> Self {
    Self::new()
  }
}

impl BundleGraph {
  pub fn new() -> Self {
    let mut graph = StableDiGraph::new();
    let mut node_id_to_node_index = HashMap::new();
    let root_node_id = 0;
    node_id_to_node_index.insert(root_node_id, graph.add_node(root_node_id));

    Self {
      graph,
      nodes: vec![BundleGraphNode::Root],
      node_id_to_node_index,
      content_key_to_node_id: HashMap::from([(String::from("@@root"), root_node_id)]),
      root_node_id,
    }
  }

  /// Copies every node and edge of the asset graph, preserving node ids
  pub fn from_asset_graph(asset_graph: &AssetGraph) -> Self {
    let mut bundle_graph = BundleGraph::new();

    for node in asset_graph.nodes() {
      match node {
        AssetGraphNode::Root => {}
        AssetGraphNode::Asset(asset) => {
          bundle_graph.add_node(asset.id.clone(), BundleGraphNode::Asset(asset.clone()));
        }
        AssetGraphNode::Dependency(dependency) => {
          bundle_graph.add_node(
            dependency.id.clone(),
            BundleGraphNode::Dependency(dependency.clone()),
          );
        }
      }
    }

    for (from, to) in asset_graph.edges() {
      if let (Some(from), Some(to)) = (
        bundle_graph.node_id_to_node_index.get(&from).copied(),
        bundle_graph.node_id_to_node_index.get(&to).copied(),
      ) {
        bundle_graph
          .graph
          .add_edge(from, to, BundleGraphEdgeType::Null);
      }
    }

    debug!(
      nodes = bundle_graph.nodes.len(),
      edges = bundle_graph.graph.edge_count(),
      "Created bundle graph from asset graph"
    );

    bundle_graph
  }

  pub fn root_node(&self) -> NodeId {
    self.root_node_id
  }

  pub fn nodes(&self) -> impl Iterator<Item = &BundleGraphNode> {
    self.nodes.iter()
  }

  pub fn get_node(&self, idx: &NodeId) -> Option<&BundleGraphNode> {
    self.nodes.get(*idx)
  }

  pub fn get_node_id_by_content_key(&self, content_key: &str) -> Option<&NodeId> {
    self.content_key_to_node_id.get(content_key)
  }

  pub fn get_asset(&self, idx: &NodeId) -> Option<&Arc<Asset>> {
    let BundleGraphNode::Asset(asset) = self.get_node(idx)? else {
      return None;
    };
    Some(asset)
  }

  pub fn get_dependency(&self, idx: &NodeId) -> Option<&Arc<Dependency>> {
    let BundleGraphNode::Dependency(dependency) = self.get_node(idx)? else {
      return None;
    };
    Some(dependency)
  }

  pub fn get_bundle(&self, idx: &NodeId) -> Option<&Bundle> {
    let BundleGraphNode::Bundle(bundle) = self.get_node(idx)? else {
      return None;
    };
    Some(bundle)
  }

  pub fn get_bundle_group(&self, idx: &NodeId) -> Option<&BundleGroup> {
    let BundleGraphNode::BundleGroup(bundle_group) = self.get_node(idx)? else {
      return None;
    };
    Some(bundle_group)
  }

  /// Every bundle, in creation order
  pub fn bundles(&self) -> Vec<NodeId> {
    self
      .nodes
      .iter()
      .enumerate()
      .filter(|(_, node)| matches!(node, BundleGraphNode::Bundle(_)))
      .map(|(node_id, _)| node_id)
      .collect()
  }

  /// Every bundle group, in creation order
  pub fn bundle_groups(&self) -> Vec<NodeId> {
    self
      .nodes
      .iter()
      .enumerate()
      .filter(|(_, node)| matches!(node, BundleGraphNode::BundleGroup(_)))
      .map(|(node_id, _)| node_id)
      .collect()
  }

  pub(super) fn expect_asset(&self, idx: &NodeId) -> Result<&Arc<Asset>, BundleGraphError> {
    self.get_asset(idx).ok_or_else(|| self.unexpected(idx, "an asset"))
  }

  pub(super) fn expect_dependency(
    &self,
    idx: &NodeId,
  ) -> Result<&Arc<Dependency>, BundleGraphError> {
    self
      .get_dependency(idx)
      .ok_or_else(|| self.unexpected(idx, "a dependency"))
  }

  pub(super) fn expect_bundle(&self, idx: &NodeId) -> Result<&Bundle, BundleGraphError> {
    self.get_bundle(idx).ok_or_else(|| self.unexpected(idx, "a bundle"))
  }

  pub(super) fn expect_bundle_group(&self, idx: &NodeId) -> Result<&BundleGroup, BundleGraphError> {
    self
      .get_bundle_group(idx)
      .ok_or_else(|| self.unexpected(idx, "a bundle group"))
  }

  fn unexpected(&self, idx: &NodeId, expected: &'static str) -> BundleGraphError {
    if self.nodes.get(*idx).is_none() {
      BundleGraphError::MissingNode(*idx)
    } else {
      BundleGraphError::UnexpectedNode {
        node_id: *idx,
        expected,
      }
    }
  }

  fn add_node(&mut self, content_key: String, node: BundleGraphNode) -> NodeId {
    if let Some(existing_node_id) = self.content_key_to_node_id.get(&content_key) {
      return *existing_node_id;
    }

    let node_id = self.nodes.len();
    self.nodes.push(node);
    self.content_key_to_node_id.insert(content_key, node_id);

    let node_index = self.graph.add_node(node_id);
    self.node_id_to_node_index.insert(node_id, node_index);

    node_id
  }

  fn node_index(&self, idx: &NodeId) -> Result<NodeIndex, BundleGraphError> {
    self
      .node_id_to_node_index
      .get(idx)
      .copied()
      .ok_or(BundleGraphError::MissingNode(*idx))
  }

  pub fn has_edge(&self, from: &NodeId, to: &NodeId, edge_type: BundleGraphEdgeType) -> bool {
    let (Ok(from), Ok(to)) = (self.node_index(from), self.node_index(to)) else {
      return false;
    };

    self
      .graph
      .edges_connecting(from, to)
      .any(|edge| *edge.weight() == edge_type)
  }

  /// Adds an edge unless one of the same type already connects the nodes.
  ///
  /// Returns whether the edge was added.
  pub(super) fn add_edge(
    &mut self,
    from: &NodeId,
    to: &NodeId,
    edge_type: BundleGraphEdgeType,
  ) -> Result<bool, BundleGraphError> {
    if self.has_edge(from, to, edge_type) {
      return Ok(false);
    }

    let from = self.node_index(from)?;
    let to = self.node_index(to)?;
    self.graph.add_edge(from, to, edge_type);

    Ok(true)
  }

  /// Returns whether an edge was removed
  pub(super) fn remove_edge(
    &mut self,
    from: &NodeId,
    to: &NodeId,
    edge_type: BundleGraphEdgeType,
  ) -> Result<bool, BundleGraphError> {
    let from = self.node_index(from)?;
    let to = self.node_index(to)?;

    let edge = self
      .graph
      .edges_connecting(from, to)
      .find(|edge| *edge.weight() == edge_type)
      .map(|edge| edge.id());

    Ok(match edge {
      Some(edge) => self.graph.remove_edge(edge).is_some(),
      None => false,
    })
  }

  /// Neighbours connected by edges of `edge_type`, ordered by edge index.
  ///
  /// Removed edges free their index for reuse, so only edges that are never removed are
  /// guaranteed to come back in insertion order. Dependency and bundle group edges never are.
  pub(super) fn neighbors(
    &self,
    idx: &NodeId,
    direction: Direction,
    edge_type: BundleGraphEdgeType,
  ) -> Vec<NodeId> {
    let Ok(node_index) = self.node_index(idx) else {
      return Vec::new();
    };

    let mut edges = self
      .graph
      .edges_directed(node_index, direction)
      .filter(|edge| *edge.weight() == edge_type)
      .map(|edge| {
        let other = match direction {
          Direction::Outgoing => edge.target(),
          Direction::Incoming => edge.source(),
        };
        (edge.id().index(), self.graph[other])
      })
      .collect::<Vec<_>>();

    edges.sort_by_key(|(edge_index, _)| *edge_index);
    edges.into_iter().map(|(_, node_id)| node_id).collect()
  }

  /// Every asset the dependency resolves to, in resolution order
  pub fn get_dependency_assets(&self, dependency: &NodeId) -> Vec<NodeId> {
    if self.get_dependency(dependency).is_none() {
      return Vec::new();
    }

    self
      .neighbors(dependency, Direction::Outgoing, BundleGraphEdgeType::Null)
      .into_iter()
      .filter(|node_id| self.get_asset(node_id).is_some())
      .collect()
  }

  /// Every dependency declared by the asset, in declaration order
  pub fn get_asset_dependencies(&self, asset: &NodeId) -> Vec<NodeId> {
    if self.get_asset(asset).is_none() {
      return Vec::new();
    }

    self
      .neighbors(asset, Direction::Outgoing, BundleGraphEdgeType::Null)
      .into_iter()
      .filter(|node_id| self.get_dependency(node_id).is_some())
      .collect()
  }

  /// Creates the bundle group that loads the assets `dependency` resolves to.
  ///
  /// Groups are keyed by their first resolved asset and target, so two dependencies onto the
  /// same asset share one group. Groups without a parent bundle are loaded from the root.
  pub fn create_bundle_group(
    &mut self,
    dependency: &NodeId,
    target: Target,
    parent_bundle: Option<&NodeId>,
  ) -> Result<NodeId, BundleGraphError> {
    let dependency_node = self.expect_dependency(dependency)?.clone();
    if let Some(parent_bundle) = parent_bundle {
      self.expect_bundle(parent_bundle)?;
    }

    let entry_asset_id = self
      .get_dependency_assets(dependency)
      .first()
      .and_then(|asset| self.get_asset(asset))
      .map(|asset| asset.id.clone())
      .ok_or_else(|| BundleGraphError::UnresolvedDependency {
        dependency_id: dependency_node.id.clone(),
        specifier: dependency_node.specifier.clone(),
      })?;

    let id = create_bundle_group_id(&entry_asset_id, &target);
    let bundle_group_node_id = self.add_node(
      format!("bundle_group:{id}"),
      BundleGraphNode::BundleGroup(BundleGroup {
        id,
        target,
        entry_asset_id,
        dependency_id: dependency_node.id.clone(),
      }),
    );

    self.add_edge(
      dependency,
      &bundle_group_node_id,
      BundleGraphEdgeType::Null,
    )?;

    let parent = parent_bundle.copied().unwrap_or(self.root_node_id);
    self.add_edge(&parent, &bundle_group_node_id, BundleGraphEdgeType::Bundle)?;

    Ok(bundle_group_node_id)
  }

  /// Creates a bundle, or returns the existing bundle with the same id and target
  pub fn create_bundle(&mut self, options: CreateBundleOptions) -> Result<NodeId, BundleGraphError> {
    let entry_asset = match &options.entry_asset {
      Some(entry_asset) => Some(self.expect_asset(entry_asset)?.clone()),
      None => None,
    };

    let id_base = options
      .id
      .or_else(|| entry_asset.as_ref().map(|asset| asset.id.clone()))
      .ok_or(BundleGraphError::IncompleteBundleOptions)?;
    let bundle_type = options
      .bundle_type
      .or_else(|| entry_asset.as_ref().map(|asset| asset.file_type.clone()))
      .ok_or(BundleGraphError::IncompleteBundleOptions)?;
    let env = options
      .env
      .or_else(|| entry_asset.as_ref().map(|asset| asset.env.clone()))
      .ok_or(BundleGraphError::IncompleteBundleOptions)?;

    let id = create_bundle_id(&id_base, &options.target);
    let bundle_node_id = self.add_node(
      format!("bundle:{id}"),
      BundleGraphNode::Bundle(Bundle {
        id,
        bundle_type,
        env,
        target: options.target,
        entry_asset_id: entry_asset.as_ref().map(|asset| asset.id.clone()),
        is_entry: options.is_entry,
      }),
    );

    if let Some(entry_asset) = &options.entry_asset {
      self.add_asset_to_bundle(entry_asset, &bundle_node_id)?;
    }

    Ok(bundle_node_id)
  }

  pub fn add_bundle_to_bundle_group(
    &mut self,
    bundle: &NodeId,
    bundle_group: &NodeId,
  ) -> Result<(), BundleGraphError> {
    self.expect_bundle(bundle)?;
    self.expect_bundle_group(bundle_group)?;
    self.add_edge(bundle_group, bundle, BundleGraphEdgeType::Bundle)?;
    Ok(())
  }

  pub fn get_bundle_groups_containing_bundle(&self, bundle: &NodeId) -> Vec<NodeId> {
    self
      .neighbors(bundle, Direction::Incoming, BundleGraphEdgeType::Bundle)
      .into_iter()
      .filter(|node_id| self.get_bundle_group(node_id).is_some())
      .collect()
  }

  pub fn get_bundles_in_bundle_group(&self, bundle_group: &NodeId) -> Vec<NodeId> {
    if self.get_bundle_group(bundle_group).is_none() {
      return Vec::new();
    }

    self.neighbors(bundle_group, Direction::Outgoing, BundleGraphEdgeType::Bundle)
  }

  /// Groups loaded directly by the root rather than by another bundle
  pub fn get_root_bundle_groups(&self) -> Vec<NodeId> {
    self.neighbors(
      &self.root_node_id,
      Direction::Outgoing,
      BundleGraphEdgeType::Bundle,
    )
  }

  /// The bundles that load `bundle_group`
  pub fn get_parent_bundles(&self, bundle_group: &NodeId) -> Vec<NodeId> {
    self
      .neighbors(bundle_group, Direction::Incoming, BundleGraphEdgeType::Bundle)
      .into_iter()
      .filter(|node_id| self.get_bundle(node_id).is_some())
      .collect()
  }

  /// The bundle groups `bundle` loads
  pub fn get_child_bundle_groups(&self, bundle: &NodeId) -> Vec<NodeId> {
    if self.get_bundle(bundle).is_none() {
      return Vec::new();
    }

    self.neighbors(bundle, Direction::Outgoing, BundleGraphEdgeType::Bundle)
  }

  /// The bundle groups created for a split point dependency
  pub fn get_dependency_bundle_groups(&self, dependency: &NodeId) -> Vec<NodeId> {
    self
      .neighbors(dependency, Direction::Outgoing, BundleGraphEdgeType::Null)
      .into_iter()
      .filter(|node_id| self.get_bundle_group(node_id).is_some())
      .collect()
  }

  /// Records that `dependency` loads `asset` from another bundle
  pub fn create_asset_reference(
    &mut self,
    dependency: &NodeId,
    asset: &NodeId,
  ) -> Result<(), BundleGraphError> {
    self.expect_dependency(dependency)?;
    self.expect_asset(asset)?;
    self.add_edge(dependency, asset, BundleGraphEdgeType::References)?;
    Ok(())
  }

  pub fn get_referenced_assets(&self, dependency: &NodeId) -> Vec<NodeId> {
    self.neighbors(
      dependency,
      Direction::Outgoing,
      BundleGraphEdgeType::References,
    )
  }

  /// The bundles a runtime loader fetches to satisfy `dependency`
  pub fn get_referenced_bundles(&self, dependency: &NodeId) -> Vec<NodeId> {
    let mut bundles = Vec::new();
    for asset in self.get_referenced_assets(dependency) {
      for bundle in self.find_bundles_with_asset(&asset) {
        if !bundles.contains(&bundle) {
          bundles.push(bundle);
        }
      }
    }
    bundles
  }
}
