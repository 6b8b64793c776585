//! Per-folder import counts and the common base folder of an import set.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Counts imported files per source folder.
///
/// The common ancestor of all tracked folders is the base path used for
/// structure-preserving output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderAggregator {
    folders: BTreeMap<PathBuf, usize>,
}

fn folder_of(file: &Path) -> PathBuf {
    file.parent().map(Path::to_path_buf).unwrap_or_default()
}

impl FolderAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an imported file. Returns the new count of its folder.
    pub fn add(&mut self, file: &Path) -> usize {
        let count = self.folders.entry(folder_of(file)).or_insert(0);
        *count += 1;
        *count
    }

    /// Records `count` files imported from `folder` at once, as a directory
    /// import does. The folder itself then bounds the base path. An empty
    /// import leaves the aggregator unchanged.
    pub fn add_folder(&mut self, folder: &Path, count: usize) -> usize {
        if count == 0 {
            return self.count(folder);
        }
        let total = self.folders.entry(folder.to_path_buf()).or_insert(0);
        *total += count;
        *total
    }

    pub fn add_all<'a>(&mut self, files: impl IntoIterator<Item = &'a Path>) {
        for file in files {
            self.add(file);
        }
    }

    /// Forgets a removed file. Returns the remaining count of its folder;
    /// the folder entry disappears when it reaches zero.
    pub fn remove(&mut self, file: &Path) -> usize {
        let folder = folder_of(file);
        let Some(count) = self.folders.get_mut(&folder) else {
            return 0;
        };

        *count = count.saturating_sub(1);
        let remaining = *count;
        if remaining == 0 {
            self.folders.remove(&folder);
        }
        remaining
    }

    pub fn count(&self, folder: &Path) -> usize {
        self.folders.get(folder).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn total_files(&self) -> usize {
        self.folders.values().sum()
    }

    pub fn folders(&self) -> impl Iterator<Item = (&Path, usize)> {
        self.folders.iter().map(|(p, c)| (p.as_path(), *c))
    }

    pub fn clear(&mut self) {
        self.folders.clear();
    }

    /// Longest common ancestor of every tracked folder.
    pub fn base_path(&self) -> Option<PathBuf> {
        let mut folders = self.folders.keys();
        let first = folders.next()?;
        let mut common: Vec<Component<'_>> = first.components().collect();

        for folder in folders {
            let shared = common
                .iter()
                .zip(folder.components())
                .take_while(|(a, b)| *a == b)
                .count();
            common.truncate(shared);
        }

        if common.is_empty() {
            return None;
        }
        Some(common.iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove() {
        let mut folders = FolderAggregator::new();
        assert_eq!(folders.add(Path::new("/a/b/1.jpg")), 1);
        assert_eq!(folders.add(Path::new("/a/b/2.jpg")), 2);
        assert_eq!(folders.add(Path::new("/a/c/3.png")), 1);

        assert_eq!(folders.len(), 2);
        assert_eq!(folders.total_files(), 3);
        assert_eq!(folders.count(Path::new("/a/b")), 2);

        assert_eq!(folders.remove(Path::new("/a/b/1.jpg")), 1);
        assert_eq!(folders.remove(Path::new("/a/c/3.png")), 0);
        assert_eq!(folders.count(Path::new("/a/c")), 0);
        assert_eq!(folders.len(), 1);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut folders = FolderAggregator::new();
        assert_eq!(folders.remove(Path::new("/nowhere/x.png")), 0);
        assert!(folders.is_empty());
    }

    #[test]
    fn test_base_path() {
        let mut folders = FolderAggregator::new();
        assert_eq!(folders.base_path(), None);

        folders.add(Path::new("/a/b/c/d/img.png"));
        assert_eq!(folders.base_path(), Some(PathBuf::from("/a/b/c/d")));

        folders.add(Path::new("/a/b/e/img.png"));
        assert_eq!(folders.base_path(), Some(PathBuf::from("/a/b")));

        folders.add(Path::new("/a/bc/img.png"));
        assert_eq!(folders.base_path(), Some(PathBuf::from("/a")));
    }

    #[test]
    fn test_add_folder_bounds_base_path() {
        let mut folders = FolderAggregator::new();
        folders.add_folder(Path::new("/photos"), 2);
        folders.add(Path::new("/photos/2024/trip/a.jpg"));
        assert_eq!(folders.count(Path::new("/photos")), 2);
        assert_eq!(folders.base_path(), Some(PathBuf::from("/photos")));
    }

    #[test]
    fn test_add_empty_folder_is_ignored() {
        let mut folders = FolderAggregator::new();
        assert_eq!(folders.add_folder(Path::new("/empty"), 0), 0);
        assert!(folders.is_empty());
        assert_eq!(folders.base_path(), None);

        folders.add(Path::new("/photos/trip/a.jpg"));
        assert_eq!(folders.add_folder(Path::new("/"), 0), 0);
        assert_eq!(folders.len(), 1);
        assert_eq!(folders.base_path(), Some(PathBuf::from("/photos/trip")));
    }

    #[test]
    fn test_base_path_tracks_removal() {
        let mut folders = FolderAggregator::new();
        folders.add_all([Path::new("/x/y/1.jpg"), Path::new("/x/z/2.jpg")]);
        assert_eq!(folders.base_path(), Some(PathBuf::from("/x")));

        folders.remove(Path::new("/x/z/2.jpg"));
        assert_eq!(folders.base_path(), Some(PathBuf::from("/x/y")));
    }
}
