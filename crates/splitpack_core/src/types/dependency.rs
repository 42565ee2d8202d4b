use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use derive_builder::Builder;
use serde::Deserialize;
use serde::Serialize;

use super::asset::AssetId;
use super::environment::Environment;
use super::target::Target;
use crate::hash::IdentifierHasher;

pub type DependencyId = String;

pub fn create_dependency_id(
  source_asset_id: Option<&AssetId>,
  specifier: &str,
  environment_id: &str,
  target: Option<&Target>,
  specifier_type: &SpecifierType,
  priority: &Priority,
) -> DependencyId {
  let mut hasher = IdentifierHasher::default();

  source_asset_id.hash(&mut hasher);
  specifier.hash(&mut hasher);
  environment_id.hash(&mut hasher);
  target.hash(&mut hasher);
  specifier_type.hash(&mut hasher);
  priority.hash(&mut hasher);

  format!("{:016x}", hasher.finish())
}

/// A dependency denotes a connection between an asset, or the build root, and the assets it
/// resolves to
#[derive(Hash, PartialEq, Eq, Clone, Debug, Default, Builder, Deserialize, Serialize)]
#[builder(build_fn(skip), pattern = "owned", setter(strip_option))]
#[serde(rename_all = "camelCase")]
// Dependencies are created through DependencyBuilder::build() so that the id is always set
#[non_exhaustive]
pub struct Dependency {
  #[builder(setter(skip))]
  pub id: DependencyId,

  /// The environment of the dependency
  pub env: Arc<Environment>,

  /// Whether this dependency is an entry point of the build
  pub is_entry: bool,

  /// Set when the resolved asset is isolated, either by itself or through its environment
  pub is_isolated: bool,

  /// Determines when the dependency should be loaded
  pub priority: Priority,

  /// The id of the asset with this dependency
  pub source_asset_id: Option<AssetId>,

  /// The import or export specifier that connects two assets together
  pub specifier: String,

  /// How the specifier should be interpreted
  pub specifier_type: SpecifierType,

  /// The target associated with an entry, if any
  pub target: Option<Box<Target>>,
}

impl DependencyBuilder {
  pub fn build(self) -> Dependency {
    let specifier = self.specifier.unwrap_or_default();
    let env = self.env.unwrap_or_default();
    let specifier_type = self.specifier_type.unwrap_or_default();
    let priority = self.priority.unwrap_or_default();
    let source_asset_id = self.source_asset_id.flatten();
    let target = self.target.flatten();

    let id = create_dependency_id(
      source_asset_id.as_ref(),
      &specifier,
      &env.id(),
      target.as_deref(),
      &specifier_type,
      &priority,
    );

    Dependency {
      id,
      env,
      is_entry: self.is_entry.unwrap_or_default(),
      is_isolated: self.is_isolated.unwrap_or_default(),
      priority,
      source_asset_id,
      specifier,
      specifier_type,
      target,
    }
  }
}

impl Dependency {
  /// Creates the dependency from the build root onto an entry file
  pub fn entry(entry: String, target: Target) -> Dependency {
    DependencyBuilder::default()
      .env(target.env.clone())
      .is_entry(true)
      .specifier(entry)
      .specifier_type(SpecifierType::Url)
      .priority(Priority::Sync)
      .target(Box::new(target))
      .build()
  }

  /// Dynamic imports are loaded on demand and split into their own bundle group
  pub fn is_async(&self) -> bool {
    self.priority == Priority::Lazy
  }

  /// The resolved asset is referenced by its location only, e.g. `new URL('./img.png')`
  pub fn is_url(&self) -> bool {
    self.specifier_type == SpecifierType::Url
  }

  /// Entry and async dependencies start a new bundle group
  pub fn is_split_point(&self) -> bool {
    self.is_entry || self.is_async()
  }
}

/// Determines when a dependency should load
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  /// Resolves the dependency synchronously, placing the resolved asset in the same bundle as the
  /// parent or another bundle that is already on the page
  #[default]
  Sync,
  /// Places the dependency in a separate bundle that is loaded later
  Lazy,
}

/// The type of the import specifier
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecifierType {
  /// An ES Module specifier
  #[default]
  Esm,
  /// A CommonJS specifier
  CommonJs,
  /// A URL that works as in a browser
  Url,
}
