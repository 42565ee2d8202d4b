use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use splitpack_filesystem::{in_memory_file_system::InMemoryFileSystem, FileSystemRef};

pub use self::asset_graph_builder::AssetGraphBuilder;
pub use self::synthetic::{generate_asset_graph, GraphConfig};

// Re-export indoc for convenience in tests
pub use indoc::indoc;

mod asset_graph_builder;
mod synthetic;

/// A project directory backed by an in-memory file-system
#[derive(Clone)]
pub struct TestFixture {
  pub fs: FileSystemRef,
  pub in_memory_fs: Arc<InMemoryFileSystem>,
  pub dirname: PathBuf,
}

impl TestFixture {
  pub fn with_dirname(dirname: PathBuf) -> Self {
    let in_memory_fs = Arc::new(InMemoryFileSystem::default());
    in_memory_fs.set_current_working_directory(&dirname);

    Self {
      fs: in_memory_fs.clone(),
      in_memory_fs,
      dirname,
    }
  }

  fn resolve(&self, path: &str) -> PathBuf {
    if Path::new(path).is_absolute() {
      PathBuf::from(path)
    } else {
      self.dirname.join(path)
    }
  }

  pub fn write_files(&self, files: HashMap<&str, &str>) -> &Self {
    for (path, content) in files {
      self.write_file(path, content);
    }
    self
  }

  /// Writes a file relative to the fixture directory, unless `path` is absolute
  pub fn write_file(&self, path: &str, content: &str) -> &Self {
    self
      .in_memory_fs
      .write_file(&self.resolve(path), content.to_string());
    self
  }

  pub fn file(self, path: &str, content: &str) -> Self {
    self.write_file(path, content);
    self
  }

  pub fn file_exists(&self, path: &Path) -> bool {
    self.fs.is_file(path)
  }
}

/// Creates an in-memory project with the given files and returns its `FileSystemRef`.
///
/// Contents wrapped in braces are passed through `indoc!`.
#[macro_export]
macro_rules! test_fixture {
    ($dirname:expr, $($path:literal => {$content:literal}),* $(,)?) => {{
        let fixture = $crate::TestFixture::with_dirname($dirname);
        $(
            fixture.write_file($path, $crate::indoc!($content));
        )*
        fixture.fs
    }};

    ($dirname:expr, $($path:literal => $content:expr),* $(,)?) => {{
        let fixture = $crate::TestFixture::with_dirname($dirname);
        $(
            fixture.write_file($path, &$content);
        )*
        fixture.fs
    }};
}
