use serde::Serialize;
use splitpack_core::types::FileType;

/// The bundler pass a decision was made in
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
  Bundling,
  Deduplication,
  SharedBundles,
}

/// Why a shared bundle candidate was not extracted
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RejectionReason {
  #[serde(rename_all = "camelCase")]
  BelowMinimumSize { size: u64, min_bundle_size: u64 },

  #[serde(rename_all = "camelCase")]
  ParallelRequestLimit {
    bundle_group_id: String,
    bundle_count: usize,
    max_parallel_requests: usize,
  },
}

/// Typed decision event.
///
/// Identifiers are the stable ids of assets, dependencies and bundles rather than node ids, so
/// logs from different runs can be compared.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DecisionKind {
  #[serde(rename_all = "camelCase")]
  BundleGroupCreated {
    bundle_group_id: String,
    dependency_id: String,
    target: String,
  },

  #[serde(rename_all = "camelCase")]
  BundleCreated {
    bundle_id: String,
    bundle_type: FileType,
    is_entry: bool,
  },

  /// An asset was placed in a bundle as one of its root assets
  #[serde(rename_all = "camelCase")]
  AssetPlaced { asset_id: String, bundle_id: String },

  #[serde(rename_all = "camelCase")]
  ReferenceCreated {
    dependency_id: String,
    asset_id: String,
  },

  /// The asset is already loaded by every ancestor path of the bundle
  #[serde(rename_all = "camelCase")]
  DuplicateRemoved { asset_id: String, bundle_id: String },

  /// Bundles in isolated environments cannot rely on their ancestors
  #[serde(rename_all = "camelCase")]
  DeduplicationSkipped { bundle_id: String },

  #[serde(rename_all = "camelCase")]
  CandidateFound {
    key: String,
    assets: usize,
    size: u64,
  },

  #[serde(rename_all = "camelCase")]
  CandidateRejected {
    key: String,
    reason: RejectionReason,
  },

  #[serde(rename_all = "camelCase")]
  SharedBundleCreated {
    bundle_id: String,
    source_bundle_ids: Vec<String>,
    bundle_group_ids: Vec<String>,
    size: u64,
  },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Decision {
  /// Monotonically increasing sequence number assigned by the log
  pub seq: u64,

  pub phase: Phase,

  pub kind: DecisionKind,
}

/// A collection of decisions captured during a bundler run.
///
/// This is intended for debugging and visualization and should not be used for correctness.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct DecisionLog {
  #[serde(skip)]
  next_seq: u64,
  pub decisions: Vec<Decision>,
}

impl DecisionLog {
  pub fn push(&mut self, phase: Phase, kind: DecisionKind) {
    let seq = self.next_seq;
    self.next_seq += 1;

    self.decisions.push(Decision { seq, phase, kind });
  }

  pub fn is_empty(&self) -> bool {
    self.decisions.is_empty()
  }

  pub fn len(&self) -> usize {
    self.decisions.len()
  }

  /// Decisions made in `phase`, in the order they were made
  pub fn in_phase(&self, phase: Phase) -> impl Iterator<Item = &Decision> {
    self
      .decisions
      .iter()
      .filter(move |decision| decision.phase == phase)
  }

  pub fn to_json(&self) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&self.decisions)
  }
}
