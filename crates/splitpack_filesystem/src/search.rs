use std::path::Path;
use std::path::PathBuf;

use crate::FileSystem;

/// Walks up from `from` looking for the first directory that contains one of `filenames`.
///
/// The search never climbs above `root`.
pub fn find_ancestor_file<P: AsRef<Path>>(
  fs: &dyn FileSystem,
  filenames: &[&str],
  from: P,
  root: P,
) -> Option<PathBuf> {
  let from = from.as_ref();
  let root = root.as_ref();
  let start = if fs.is_file(from) {
    from.parent()?
  } else {
    from
  };

  for dir in start.ancestors() {
    for filename in filenames {
      let candidate = dir.join(filename);
      if fs.is_file(&candidate) {
        return Some(candidate);
      }
    }

    if dir == root {
      break;
    }
  }

  None
}
