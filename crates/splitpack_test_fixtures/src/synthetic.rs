use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use splitpack_core::asset_graph::{AssetGraph, NodeId};

use crate::AssetGraphBuilder;

/// Parameters controlling the synthetic graph shape.
///
/// The generated graph is layered to resemble an application:
///
/// - entries
/// - routes, loaded lazily from entries
/// - components, imported synchronously from routes
/// - shared utilities, imported by many components
/// - stylesheets imported by some components, which crosses a type boundary
///
/// Extra edges are then added until `num_deps` is reached.
#[derive(Clone, Copy, Debug)]
pub struct GraphConfig {
  pub num_entries: usize,
  pub num_assets: usize,
  pub num_deps: usize,
  /// Fraction of entry to route imports that are lazy
  pub lazy_ratio: f64,
  /// Fraction of assets that are stylesheets
  pub css_ratio: f64,
  /// Fraction of non-entry assets that are routes
  pub route_ratio: f64,
  pub seed: u64,
}

impl Default for GraphConfig {
  fn default() -> Self {
    Self {
      num_entries: 2,
      num_assets: 100,
      num_deps: 400,
      lazy_ratio: 0.8,
      css_ratio: 0.1,
      route_ratio: 0.1,
      seed: 42,
    }
  }
}

fn random_size(rng: &mut StdRng) -> u64 {
  rng.gen_range(200..40_000)
}

/// Generates a deterministic synthetic asset graph for `config`
pub fn generate_asset_graph(config: GraphConfig) -> AssetGraph {
  let mut rng = StdRng::seed_from_u64(config.seed);
  let mut builder = AssetGraphBuilder::new();

  let num_entries = config.num_entries.clamp(1, config.num_assets.max(1));
  let remaining = config.num_assets.saturating_sub(num_entries);
  let num_css = ((remaining as f64) * config.css_ratio).round() as usize;
  let remaining_js = remaining.saturating_sub(num_css);
  let num_routes = (((remaining_js as f64) * config.route_ratio).round() as usize).max(1);
  let num_utils = ((remaining_js as f64) * 0.15).round().max(1.0) as usize;
  let num_components = remaining_js.saturating_sub(num_routes + num_utils).max(1);

  let entries = (0..num_entries)
    .map(|i| {
      let size = random_size(&mut rng);
      builder.entry(&format!("entry-{i}.js"), size)
    })
    .collect::<Vec<_>>();
  let mut add_layer = |builder: &mut AssetGraphBuilder, kind: &str, ext: &str, count: usize| {
    (0..count)
      .map(|i| {
        let size = random_size(&mut rng);
        builder.asset(&format!("{kind}-{i}.{ext}"), size)
      })
      .collect::<Vec<NodeId>>()
  };
  let routes = add_layer(&mut builder, "route", "js", num_routes);
  let components = add_layer(&mut builder, "component", "js", num_components);
  let utils = add_layer(&mut builder, "util", "js", num_utils);
  let styles = add_layer(&mut builder, "styles", "css", num_css);

  let mut dep_count = 0;

  for entry in &entries {
    let chosen = routes
      .choose_multiple(&mut rng, routes.len().min(5))
      .copied()
      .collect::<Vec<_>>();
    for route in chosen {
      if rng.gen_bool(config.lazy_ratio.clamp(0.0, 1.0)) {
        builder.import_lazy(*entry, route);
      } else {
        builder.import(*entry, route);
      }
      dep_count += 1;
    }
  }

  for route in &routes {
    let chosen = components
      .choose_multiple(&mut rng, components.len().min(20))
      .copied()
      .collect::<Vec<_>>();
    for component in chosen {
      builder.import(*route, component);
      dep_count += 1;
    }
  }

  for component in &components {
    let chosen = utils
      .choose_multiple(&mut rng, utils.len().min(3))
      .copied()
      .collect::<Vec<_>>();
    for util in chosen {
      builder.import(*component, util);
      dep_count += 1;
    }
  }

  if !styles.is_empty() {
    let importing = ((components.len() as f64) * 0.1).round() as usize;
    let importing = components
      .choose_multiple(&mut rng, importing.clamp(1, components.len()))
      .copied()
      .collect::<Vec<_>>();
    for component in importing {
      let style = styles[rng.gen_range(0..styles.len())];
      builder.import(component, style);
      dep_count += 1;
    }
  }

  let mut attempts = 0;
  while dep_count < config.num_deps && attempts < config.num_deps.saturating_mul(2) {
    attempts += 1;
    let roll = rng.gen::<f64>();

    let (from, to, lazy) = if roll < 0.6 {
      (
        components[rng.gen_range(0..components.len())],
        components[rng.gen_range(0..components.len())],
        false,
      )
    } else if roll < 0.75 {
      (
        routes[rng.gen_range(0..routes.len())],
        routes[rng.gen_range(0..routes.len())],
        true,
      )
    } else {
      (
        components[rng.gen_range(0..components.len())],
        utils[rng.gen_range(0..utils.len())],
        false,
      )
    };

    if from == to {
      continue;
    }

    if lazy {
      builder.import_lazy(from, to);
    } else {
      builder.import(from, to);
    }
    dep_count += 1;
  }

  builder.build()
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn test_generation_is_deterministic() {
    let config = GraphConfig::default();

    assert_eq!(generate_asset_graph(config), generate_asset_graph(config));
  }

  #[test]
  fn test_generates_the_requested_assets() {
    let graph = generate_asset_graph(GraphConfig {
      num_entries: 3,
      num_assets: 50,
      ..GraphConfig::default()
    });

    let assets = graph
      .nodes()
      .filter(|node| matches!(node, splitpack_core::asset_graph::AssetGraphNode::Asset(_)))
      .count();

    assert_eq!(assets, 50);
  }
}
