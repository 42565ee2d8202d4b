use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use splitpack_core::asset_graph::{AssetGraph, NodeId};
use splitpack_core::types::{
  Asset, Dependency, DependencyBuilder, Environment, EnvironmentContext, Priority, SpecifierType,
  Target,
};

/// Builds asset graphs by file name, the way a resolver would have produced them
///
/// ```
/// use splitpack_test_fixtures::AssetGraphBuilder;
///
/// let mut builder = AssetGraphBuilder::new();
/// let index = builder.entry("index.js", 100);
/// let lazy = builder.asset("lazy.js", 100);
/// builder.import_lazy(index, lazy);
///
/// let graph = builder.build();
/// assert_eq!(graph.get_asset(&lazy).unwrap().size, 100);
/// ```
#[derive(Debug, Default)]
pub struct AssetGraphBuilder {
  graph: AssetGraph,
  nodes_by_path: HashMap<String, NodeId>,
}

impl AssetGraphBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds an entry asset for the default target
  pub fn entry(&mut self, file_path: &str, size: u64) -> NodeId {
    self.entry_with_target(file_path, size, Target::default())
  }

  /// Adds an entry asset that runs in the environment of `target`
  pub fn entry_with_target(&mut self, file_path: &str, size: u64, target: Target) -> NodeId {
    let env = target.env.clone();
    let dependency = self
      .graph
      .add_entry_dependency(Dependency::entry(file_path.to_string(), target));
    let asset = self.asset_in(file_path, size, env);
    self.graph.add_edge(&dependency, &asset);
    asset
  }

  pub fn asset(&mut self, file_path: &str, size: u64) -> NodeId {
    self.asset_in(file_path, size, Arc::new(Environment::default()))
  }

  pub fn asset_in(&mut self, file_path: &str, size: u64, env: Arc<Environment>) -> NodeId {
    self.add_asset(Asset::new(PathBuf::from(file_path), env, size))
  }

  /// Adds an asset that runs in a web worker
  pub fn worker(&mut self, file_path: &str, size: u64) -> NodeId {
    self.asset_in(
      file_path,
      size,
      Arc::new(Environment::new(EnvironmentContext::WebWorker)),
    )
  }

  /// Adds an asset flagged as isolated, such as an inline script
  pub fn isolated_asset(&mut self, file_path: &str, size: u64) -> NodeId {
    let mut asset = Asset::new(PathBuf::from(file_path), Arc::new(Environment::default()), size);
    asset.is_isolated = true;
    self.add_asset(asset)
  }

  fn add_asset(&mut self, asset: Asset) -> NodeId {
    let file_path = asset.file_path.display().to_string();
    let node_id = self.graph.add_asset(Arc::new(asset));
    self.nodes_by_path.insert(file_path, node_id);
    node_id
  }

  pub fn import(&mut self, from: NodeId, to: NodeId) -> NodeId {
    self.dependency(from, &[to], Priority::Sync, SpecifierType::Esm)
  }

  pub fn import_lazy(&mut self, from: NodeId, to: NodeId) -> NodeId {
    self.dependency(from, &[to], Priority::Lazy, SpecifierType::Esm)
  }

  /// A synchronous reference by location, e.g. `new URL('./image.png', import.meta.url)`
  pub fn import_url(&mut self, from: NodeId, to: NodeId) -> NodeId {
    self.dependency(from, &[to], Priority::Sync, SpecifierType::Url)
  }

  /// Adds a dependency from `from` that resolves to every asset in `to`
  pub fn dependency(
    &mut self,
    from: NodeId,
    to: &[NodeId],
    priority: Priority,
    specifier_type: SpecifierType,
  ) -> NodeId {
    let (source_asset_id, env) = match self.graph.get_asset(&from) {
      Some(asset) => (Some(asset.id.clone()), asset.env.clone()),
      None => (None, Arc::new(Environment::default())),
    };

    let specifier = to
      .iter()
      .filter_map(|node_id| self.graph.get_asset(node_id))
      .map(|asset| format!("./{}", asset.file_path.display()))
      .collect::<Vec<_>>()
      .join(",");

    let mut builder = DependencyBuilder::default()
      .specifier(specifier)
      .specifier_type(specifier_type)
      .priority(priority)
      .env(env);
    if let Some(source_asset_id) = source_asset_id {
      builder = builder.source_asset_id(source_asset_id);
    }

    let dependency = self.graph.add_dependency(builder.build());
    self.graph.add_edge(&from, &dependency);
    for asset in to {
      self.graph.add_edge(&dependency, asset);
    }

    dependency
  }

  /// Node id of the asset added with `file_path`
  pub fn node(&self, file_path: &str) -> Option<NodeId> {
    self.nodes_by_path.get(file_path).copied()
  }

  pub fn graph(&self) -> &AssetGraph {
    &self.graph
  }

  pub fn build(self) -> AssetGraph {
    self.graph
  }
}
