use anyhow::Context;
use parking_lot::Mutex;
use splitpack_core::bundle_graph::BundleGraph;
use splitpack_core::config_loader::ConfigLoader;
use tracing::instrument;

use self::bundling::{create_bundles, populate_bundles};
use self::deduplicate::deduplicate_bundles;
use self::shared_bundles::create_shared_bundles;
use crate::decisions::DecisionLog;
use crate::options::BundlerOptions;
use crate::Bundler;

mod bundling;
mod deduplicate;
mod shared_bundles;

/// Splits the graph at entries, async dependencies and type boundaries.
///
/// Optimization then removes assets that every ancestor path already loads, and moves assets
/// duplicated across sibling bundles into shared bundles when they are large enough and the
/// affected bundle groups can afford another request.
#[derive(Debug, Default)]
pub struct DefaultBundler {
  options: BundlerOptions,
  decisions: Mutex<DecisionLog>,
}

impl DefaultBundler {
  pub fn new(options: BundlerOptions) -> Self {
    Self {
      options,
      decisions: Mutex::new(DecisionLog::default()),
    }
  }

  pub fn from_config(config_loader: &ConfigLoader) -> anyhow::Result<Self> {
    let options = BundlerOptions::load(config_loader)?;
    Ok(Self::new(options))
  }

  pub fn options(&self) -> &BundlerOptions {
    &self.options
  }

  /// Decisions recorded since the last call to [`Bundler::bundle`]
  pub fn decisions(&self) -> DecisionLog {
    self.decisions.lock().clone()
  }
}

impl Bundler for DefaultBundler {
  #[instrument(level = "debug", skip_all)]
  fn bundle(&self, bundle_graph: &mut BundleGraph) -> anyhow::Result<()> {
    let mut decisions = self.decisions.lock();
    *decisions = DecisionLog::default();

    create_bundles(bundle_graph, &mut decisions)
      .context("Failed to create bundles for split points")?;
    populate_bundles(bundle_graph).context("Failed to populate bundles")?;

    Ok(())
  }

  #[instrument(level = "debug", skip_all)]
  fn optimize(&self, bundle_graph: &mut BundleGraph) -> anyhow::Result<()> {
    let mut decisions = self.decisions.lock();

    deduplicate_bundles(bundle_graph, &mut decisions)
      .context("Failed to remove duplicated assets")?;
    create_shared_bundles(bundle_graph, &self.options, &mut decisions)
      .context("Failed to create shared bundles")?;

    #[cfg(debug_assertions)]
    bundle_graph
      .validate(None)
      .context("Optimization produced an invalid bundle graph")?;

    Ok(())
  }
}
