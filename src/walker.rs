use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::Result;

/// Recursively enumerates the Python source files of a project.
///
/// Hidden files and gitignored paths are skipped. The result is sorted so
/// file processing order (and therefore the name index's last-write-wins
/// outcome) is deterministic.
pub struct SourceWalker;

impl SourceWalker {
    pub fn new() -> Self {
        Self
    }

    pub fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if path.is_file() && Self::is_python(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    pub fn is_python(path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some("py")
    }
}

impl Default for SourceWalker {
    fn default() -> Self {
        Self::new()
    }
}
