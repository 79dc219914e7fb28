//! In-memory mock filesystem for testing the host collector without a real `/proc`.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use crate::collector::traits::FileSystem;

/// In-memory filesystem.
///
/// Paths can be marked unreadable to simulate permission-denied entries under `/proc`.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
    denied: HashSet<PathBuf>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a file. Parent directories are created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Adds `/proc/[pid]/stat` under the given proc root.
    pub fn add_process(&mut self, proc_root: impl AsRef<Path>, pid: u32, stat: &str) {
        let base = proc_root.as_ref().join(pid.to_string());
        self.add_dir(&base);
        self.add_file(base.join("stat"), stat);
    }

    /// Removes a process directory and everything below it.
    pub fn remove_process(&mut self, proc_root: impl AsRef<Path>, pid: u32) {
        let base = proc_root.as_ref().join(pid.to_string());
        self.files.retain(|p, _| !p.starts_with(&base));
        self.directories.retain(|p| !p.starts_with(&base));
    }

    /// Makes reads of `path` fail with `PermissionDenied`.
    pub fn deny(&mut self, path: impl AsRef<Path>) {
        self.denied.insert(path.as_ref().to_path_buf());
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if self.denied.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {:?}", path),
            ));
        }
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let children = self
            .files
            .keys()
            .chain(self.directories.iter())
            .filter(|p| p.parent().is_some_and(|parent| parent == path))
            .cloned()
            .collect::<HashSet<_>>();

        Ok(children.into_iter().collect())
    }
}
