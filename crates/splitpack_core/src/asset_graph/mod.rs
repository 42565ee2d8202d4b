#[allow(clippy::module_inception)]
mod asset_graph;

pub use self::asset_graph::*;
