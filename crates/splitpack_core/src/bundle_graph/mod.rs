#[allow(clippy::module_inception)]
mod bundle_graph;

mod ancestry;
mod contents;
mod dot;
mod serialize;
mod traversal;
mod validate;

pub use self::bundle_graph::*;
pub use self::serialize::*;
pub use self::traversal::{TraversalAction, TraversalEvent};
