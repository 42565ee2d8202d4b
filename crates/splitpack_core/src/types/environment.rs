use std::hash::Hash;
use std::hash::Hasher;

use serde::Deserialize;
use serde::Serialize;

use crate::hash::IdentifierHasher;

/// The environment the built code will run in
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
  /// The environment the output should run in
  pub context: EnvironmentContext,

  /// Treats the target as a library that would be published to npm and consumed by another tool
  pub is_library: bool,

  /// Whether the output should be minified
  pub should_optimize: bool,
}

impl Environment {
  pub fn new(context: EnvironmentContext) -> Self {
    Self {
      context,
      ..Environment::default()
    }
  }

  /// Code in an isolated environment cannot see anything loaded by the bundle that spawned it.
  ///
  /// Workers and worklets run in their own global scope, so assets loaded by ancestor bundles
  /// on the main thread are not available to them.
  pub fn is_isolated(&self) -> bool {
    self.context.is_worker() || self.context.is_worklet()
  }

  pub fn id(&self) -> String {
    let mut hasher = IdentifierHasher::default();
    self.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
  }
}

/// The environment the output should run in
///
/// This informs Splitpack which environment-specific APIs are available.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvironmentContext {
  #[default]
  Browser,
  ElectronMain,
  ElectronRenderer,
  Node,
  ServiceWorker,
  WebWorker,
  Worklet,
}

impl EnvironmentContext {
  pub fn is_node(&self) -> bool {
    use EnvironmentContext::*;
    matches!(self, Node | ElectronMain | ElectronRenderer)
  }

  pub fn is_browser(&self) -> bool {
    use EnvironmentContext::*;
    matches!(
      self,
      Browser | WebWorker | ServiceWorker | Worklet | ElectronRenderer
    )
  }

  pub fn is_worker(&self) -> bool {
    use EnvironmentContext::*;
    matches!(self, WebWorker | ServiceWorker)
  }

  pub fn is_worklet(&self) -> bool {
    matches!(self, EnvironmentContext::Worklet)
  }
}
