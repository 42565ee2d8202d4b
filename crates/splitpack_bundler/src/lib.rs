use anyhow::Context;
use splitpack_core::asset_graph::AssetGraph;
use splitpack_core::bundle_graph::BundleGraph;
use tracing::debug;
use tracing::instrument;

pub use self::decisions::*;
pub use self::default_bundler::DefaultBundler;
pub use self::monolithic_bundler::MonolithicBundler;
pub use self::options::*;

mod decisions;
mod default_bundler;
mod monolithic_bundler;
mod options;

/// Bundler algorithms assign the assets of a bundle graph to bundles.
///
/// Implementations are expected to mutate the provided `BundleGraph` to:
/// - create bundle groups for entries and split points
/// - create bundles and place assets in them
/// - record asset references for assets loaded from another bundle
pub trait Bundler {
  fn bundle(&self, bundle_graph: &mut BundleGraph) -> anyhow::Result<()>;

  /// Rearranges the bundles created by [`Bundler::bundle`]
  fn optimize(&self, _bundle_graph: &mut BundleGraph) -> anyhow::Result<()> {
    Ok(())
  }
}

/// Runs `bundler` over a copy of the asset graph and returns the finished bundle graph
#[instrument(level = "info", skip_all)]
pub fn bundle_asset_graph(
  bundler: &dyn Bundler,
  asset_graph: &AssetGraph,
) -> anyhow::Result<BundleGraph> {
  let mut bundle_graph = BundleGraph::from_asset_graph(asset_graph);

  bundler
    .bundle(&mut bundle_graph)
    .context("Failed to create bundles")?;
  bundler
    .optimize(&mut bundle_graph)
    .context("Failed to optimize bundles")?;

  debug!(
    bundles = bundle_graph.bundles().len(),
    bundle_groups = bundle_graph.bundle_groups().len(),
    "Finished bundling"
  );

  Ok(bundle_graph)
}
