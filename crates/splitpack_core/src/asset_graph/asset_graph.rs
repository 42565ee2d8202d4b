use std::collections::HashMap;
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::visit::IntoEdgeReferences;
use petgraph::Direction;

use crate::types::Asset;
use crate::types::Dependency;

#[derive(Clone, Debug, PartialEq)]
pub enum AssetGraphNode {
  Root,
  Asset(Arc<Asset>),
  Dependency(Arc<Dependency>),
}

pub type NodeId = usize;

/// The resolved dependency graph handed to the bundler
///
/// Edges run root -> entry dependency, asset -> dependency and dependency -> resolved asset.
/// Children are always returned in the order their edges were added, which is the order the
/// dependencies were declared in the source.
#[derive(Clone, Debug)]
pub struct AssetGraph {
  pub graph: StableDiGraph<NodeId, ()>,
  nodes: Vec<AssetGraphNode>,
  content_key_to_node_id: HashMap<String, NodeId>,
  node_id_to_node_index: HashMap<NodeId, NodeIndex>,
  root_node_id: NodeId,
}

impl Default for AssetGraph {
  fn default() -> Self {
    Self::new()
  }
}

impl AssetGraph {
  pub fn new() -> Self {
    let mut graph = StableDiGraph::new();

    let mut node_id_to_node_index = HashMap::new();
    let nodes = vec![AssetGraphNode::Root];
    let root_node_id = 0;

    node_id_to_node_index.insert(root_node_id, graph.add_node(root_node_id));

    AssetGraph {
      graph,
      content_key_to_node_id: HashMap::from([(String::from("@@root"), root_node_id)]),
      node_id_to_node_index,
      nodes,
      root_node_id,
    }
  }

  /// Edges as `(from, to)` pairs, in insertion order
  pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
    let mut edges = self
      .graph
      .edge_references()
      .map(|edge| {
        (
          edge.id().index(),
          self.graph[edge.source()],
          self.graph[edge.target()],
        )
      })
      .collect::<Vec<_>>();

    edges.sort_by_key(|(index, _, _)| *index);
    edges.into_iter().map(|(_, from, to)| (from, to)).collect()
  }

  pub fn nodes(&self) -> impl Iterator<Item = &AssetGraphNode> {
    self.nodes.iter()
  }

  pub fn root_node(&self) -> NodeId {
    self.root_node_id
  }

  pub fn get_node(&self, idx: &NodeId) -> Option<&AssetGraphNode> {
    self.nodes.get(*idx)
  }

  pub fn get_node_id_by_content_key(&self, content_key: &str) -> Option<&NodeId> {
    self.content_key_to_node_id.get(content_key)
  }

  fn add_node(&mut self, content_key: String, node: AssetGraphNode) -> NodeId {
    if let Some(existing_node_id) = self.content_key_to_node_id.get(&content_key) {
      self.nodes[*existing_node_id] = node;
      return *existing_node_id;
    }

    let node_id = self.nodes.len();
    self.nodes.push(node);
    self.content_key_to_node_id.insert(content_key, node_id);

    let node_index = self.graph.add_node(node_id);
    self.node_id_to_node_index.insert(node_id, node_index);

    node_id
  }

  /// Adding an asset with an id that already exists replaces the existing node
  pub fn add_asset(&mut self, asset: Arc<Asset>) -> NodeId {
    self.add_node(asset.id.clone(), AssetGraphNode::Asset(asset))
  }

  pub fn get_asset(&self, idx: &NodeId) -> Option<&Arc<Asset>> {
    let AssetGraphNode::Asset(asset) = self.get_node(idx)? else {
      return None;
    };
    Some(asset)
  }

  pub fn add_dependency(&mut self, dependency: Dependency) -> NodeId {
    self.add_node(
      dependency.id.clone(),
      AssetGraphNode::Dependency(Arc::new(dependency)),
    )
  }

  /// Adds a dependency and connects it to the root of the graph
  pub fn add_entry_dependency(&mut self, dependency: Dependency) -> NodeId {
    let root_node_id = self.root_node_id;
    let dependency_id = self.add_dependency(dependency);
    self.add_edge(&root_node_id, &dependency_id);
    dependency_id
  }

  pub fn get_dependency(&self, idx: &NodeId) -> Option<&Arc<Dependency>> {
    let AssetGraphNode::Dependency(dependency) = self.get_node(idx)? else {
      return None;
    };
    Some(dependency)
  }

  pub fn has_edge(&self, from_idx: &NodeId, to_idx: &NodeId) -> bool {
    match (
      self.node_id_to_node_index.get(from_idx),
      self.node_id_to_node_index.get(to_idx),
    ) {
      (Some(from), Some(to)) => self.graph.contains_edge(*from, *to),
      _ => false,
    }
  }

  /// Connects two nodes. Duplicate edges and unknown nodes are ignored.
  ///
  /// Linking a dependency to an isolated asset marks the dependency as isolated.
  pub fn add_edge(&mut self, from_idx: &NodeId, to_idx: &NodeId) {
    let (Some(from), Some(to)) = (
      self.node_id_to_node_index.get(from_idx).copied(),
      self.node_id_to_node_index.get(to_idx).copied(),
    ) else {
      return;
    };

    if self.graph.contains_edge(from, to) {
      return;
    }

    let resolves_to_isolated = self
      .get_asset(to_idx)
      .is_some_and(|asset| asset.is_isolated || asset.env.is_isolated());

    if resolves_to_isolated {
      if let Some(AssetGraphNode::Dependency(dependency)) = self.nodes.get_mut(*from_idx) {
        Arc::make_mut(dependency).is_isolated = true;
      }
    }

    self.graph.add_edge(from, to, ());
  }

  /// Outgoing neighbours in the order the edges were added
  pub fn get_outgoing_neighbors(&self, node_id: &NodeId) -> Vec<NodeId> {
    let Some(node_index) = self.node_id_to_node_index.get(node_id) else {
      return Vec::new();
    };

    let mut edges = self
      .graph
      .edges_directed(*node_index, Direction::Outgoing)
      .map(|edge| (edge.id().index(), self.graph[edge.target()]))
      .collect::<Vec<_>>();

    edges.sort_by_key(|(index, _)| *index);
    edges.into_iter().map(|(_, node_id)| node_id).collect()
  }

  /// Every asset a dependency resolves to, in resolution order
  pub fn get_dependency_assets(&self, dep_node_id: &NodeId) -> Vec<NodeId> {
    if self.get_dependency(dep_node_id).is_none() {
      return Vec::new();
    }

    self
      .get_outgoing_neighbors(dep_node_id)
      .into_iter()
      .filter(|node_id| self.get_asset(node_id).is_some())
      .collect()
  }
}

impl PartialEq for AssetGraph {
  fn eq(&self, other: &Self) -> bool {
    self.nodes == other.nodes && self.edges() == other.edges()
  }
}
