pub mod asset_graph;
pub mod bundle_graph;
pub mod config_loader;
pub mod error;
pub mod hash;
pub mod types;
