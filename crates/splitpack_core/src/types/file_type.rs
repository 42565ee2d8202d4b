use std::fmt;
use std::hash::Hash;

use serde::Deserialize;
use serde::Serialize;

/// Represents an asset type by its extension
///
/// Bundles are homogeneous in their file type, so this is also the type of a bundle.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileType {
  Css,
  Html,
  #[default]
  Js,
  Json,
  Png,
  Svg,
  Wasm,
  Other(String),
}

impl Serialize for FileType {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    self.extension().serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for FileType {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let ext: String = Deserialize::deserialize(deserializer)?;
    Ok(Self::from_extension(&ext))
  }
}

impl FileType {
  pub fn extension(&self) -> &str {
    match self {
      FileType::Css => "css",
      FileType::Html => "html",
      FileType::Js => "js",
      FileType::Json => "json",
      FileType::Png => "png",
      FileType::Svg => "svg",
      FileType::Wasm => "wasm",
      FileType::Other(extension) => extension.as_str(),
    }
  }

  /// Maps an extension onto the bundle type it is emitted as. JSX and TypeScript emit JavaScript.
  pub fn from_extension(ext: &str) -> Self {
    match ext {
      "css" => FileType::Css,
      "htm" | "html" => FileType::Html,
      "cjs" | "js" | "jsx" | "mjs" | "ts" | "tsx" => FileType::Js,
      "json" => FileType::Json,
      "png" => FileType::Png,
      "svg" => FileType::Svg,
      "wasm" => FileType::Wasm,
      ext => FileType::Other(ext.to_string()),
    }
  }
}

impl fmt::Display for FileType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.extension())
  }
}
