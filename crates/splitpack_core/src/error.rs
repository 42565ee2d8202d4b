use crate::asset_graph::NodeId;
use crate::types::FileType;

/// Internal consistency faults in the asset or bundle graph
///
/// These signal a defect in whoever produced the graph, never a recoverable user error.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BundleGraphError {
  #[error("Node {0} does not exist in the graph")]
  MissingNode(NodeId),

  #[error("Expected node {node_id} to be {expected}")]
  UnexpectedNode {
    node_id: NodeId,
    expected: &'static str,
  },

  #[error("Dependency {dependency_id} ({specifier}) was reached without a bundle group. Every non-entry dependency must be reachable through an entry or async dependency")]
  MissingBundleGroupContext {
    dependency_id: String,
    specifier: String,
  },

  #[error("Dependency {dependency_id} ({specifier}) has no target and is not inside a bundle group")]
  MissingTarget {
    dependency_id: String,
    specifier: String,
  },

  #[error("Dependency {dependency_id} ({specifier}) does not resolve to any asset")]
  UnresolvedDependency {
    dependency_id: String,
    specifier: String,
  },

  #[error("A bundle needs either an entry asset or an explicit id, type and environment")]
  IncompleteBundleOptions,

  #[error("Bundle {bundle_id} of type {bundle_type} contains asset {asset_id} of type {asset_type}")]
  MixedBundleTypes {
    bundle_id: String,
    bundle_type: FileType,
    asset_id: String,
    asset_type: FileType,
  },

  #[error("Bundle {bundle_id} does not belong to any bundle group")]
  OrphanBundle { bundle_id: String },

  #[error("Bundle group {bundle_group_id} loads {bundle_count} bundles, more than the limit of {max_parallel_requests}")]
  ParallelRequestLimitExceeded {
    bundle_group_id: String,
    bundle_count: usize,
    max_parallel_requests: usize,
  },

  #[error("Bundle {bundle_id} starts from asset {asset_id} which it does not contain")]
  DetachedRootAsset { bundle_id: String, asset_id: String },
}
