use anyhow::Result;
use rayon::prelude::*;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Enumerates candidate Python source files under a directory.
///
/// Names on the ignore list prune whole subtrees; the result is sorted so
/// every downstream stage sees a deterministic order.
pub struct FileScanner {
    ignores: Vec<String>,
}

impl FileScanner {
    pub fn new(ignores: Vec<String>) -> Self {
        Self { ignores }
    }

    pub fn scan_directory(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let entries: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !self.is_ignored(entry.file_name()))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.into_path())
            .collect();

        let mut files: Vec<PathBuf> = entries
            .into_par_iter()
            .filter(|path| is_python_source(path))
            .collect();
        files.sort();
        Ok(files)
    }

    fn is_ignored(&self, name: &OsStr) -> bool {
        name.to_str()
            .map_or(false, |name| self.ignores.iter().any(|ignore| ignore == name))
    }
}

fn is_python_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(OsStr::to_str) else {
        return false;
    };
    // .#foo.py is an emacs lock file, not source
    name.ends_with(".py") && !name.starts_with(".#")
}
