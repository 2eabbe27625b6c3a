//! Lazy depth-first tree walking
//!
//! [`TreeWalker`] yields every file and directory beneath a root in pre-order:
//! a directory is yielded first and its contents follow before the next
//! sibling. Entries are produced in the order the OS lists them. Nothing is
//! sorted, so two walks of the same unchanged directory agree, but two
//! filesystems may not.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs::{self, ReadDir};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use crate::{Error, NormalizedPath, Result};

/// File names excluded from every walk, at any depth.
///
/// A skipped directory is not descended into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipList {
    names: BTreeSet<String>,
}

impl SkipList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &OsStr) -> bool {
        name.to_str().is_some_and(|n| self.names.contains(n))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One file or directory encountered during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the tree root, forward-slash separated
    pub relative: NormalizedPath,
    /// True for real directories; symlinks are never treated as directories
    pub is_dir: bool,
}

/// Walk every entry below `root`, skipping the names in `skip`.
pub fn walk(root: impl Into<PathBuf>, skip: &SkipList) -> TreeWalker {
    TreeWalker::new(root, skip.clone())
}

/// Explicit-stack, lazy, pre-order directory iterator.
///
/// An unreadable directory produces a single [`Error::Unreadable`] item, after
/// which the iterator is exhausted. Partial walks are not resumed.
#[derive(Debug)]
pub struct TreeWalker {
    root: PathBuf,
    skip: SkipList,
    stack: Vec<(PathBuf, ReadDir)>,
    /// Directory to open on the next call; deferred so `skip_subtree` can
    /// cancel descent into the directory just yielded.
    pending: Option<PathBuf>,
    last_was_dir: bool,
    done: bool,
}

impl TreeWalker {
    pub fn new(root: impl Into<PathBuf>, skip: SkipList) -> Self {
        let root = root.into();
        Self {
            pending: Some(root.clone()),
            root,
            skip,
            stack: Vec::new(),
            last_was_dir: false,
            done: false,
        }
    }

    /// Walk the contents of `start`, reporting relative paths against `root`.
    ///
    /// `start` itself is not yielded.
    pub fn subtree(root: impl Into<PathBuf>, start: impl Into<PathBuf>, skip: SkipList) -> Self {
        Self {
            root: root.into(),
            skip,
            stack: Vec::new(),
            pending: Some(start.into()),
            last_was_dir: false,
            done: false,
        }
    }

    /// The immediate entries of `start`, without recursion, with relative
    /// paths computed against `root`.
    pub fn children(root: &Path, start: &Path, skip: &SkipList) -> Result<Vec<PathEntry>> {
        let mut walker = Self::subtree(root, start, skip.clone());
        let mut entries = Vec::new();
        while let Some(entry) = walker.next() {
            let entry = entry?;
            if entry.is_dir {
                walker.skip_subtree();
            }
            entries.push(entry);
        }
        Ok(entries)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Do not descend into the directory most recently yielded.
    ///
    /// Has no effect if the last entry was a file.
    pub fn skip_subtree(&mut self) {
        if self.last_was_dir {
            self.pending = None;
        }
    }

    fn fail(&mut self, path: PathBuf, source: std::io::Error) -> Option<Result<PathEntry>> {
        self.done = true;
        self.stack.clear();
        self.pending = None;
        Some(Err(Error::unreadable(path, source)))
    }
}

impl Iterator for TreeWalker {
    type Item = Result<PathEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            self.last_was_dir = false;
            if let Some(dir) = self.pending.take() {
                match fs::read_dir(&dir) {
                    Ok(listing) => self.stack.push((dir, listing)),
                    Err(e) => return self.fail(dir, e),
                }
            }

            let Some((dir, listing)) = self.stack.last_mut() else {
                self.done = true;
                return None;
            };

            let dirent = match listing.next() {
                None => {
                    self.stack.pop();
                    continue;
                }
                Some(Err(e)) => {
                    let dir = dir.clone();
                    return self.fail(dir, e);
                }
                Some(Ok(dirent)) => dirent,
            };

            if self.skip.contains(&dirent.file_name()) {
                continue;
            }

            let path = dirent.path();
            let file_type = match dirent.file_type() {
                Ok(file_type) => file_type,
                Err(e) => return self.fail(path, e),
            };
            let is_dir = file_type.is_dir();
            let relative = NormalizedPath::relative(&self.root, &path)
                .unwrap_or_else(|| NormalizedPath::new(&path));

            if is_dir {
                self.pending = Some(path.clone());
            }
            self.last_was_dir = is_dir;

            return Some(Ok(PathEntry {
                path,
                relative,
                is_dir,
            }));
        }
    }
}

impl FusedIterator for TreeWalker {}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("wp-admin/css")).unwrap();
        fs::write(dir.path().join("wp-admin/css/admin.css"), "a").unwrap();
        fs::write(dir.path().join("index.php"), "<?php").unwrap();
        fs::write(dir.path().join("wp-config.php"), "secret").unwrap();
        dir
    }

    #[test]
    fn directories_precede_their_contents() {
        let dir = tree();
        let rels: Vec<String> = walk(dir.path(), &SkipList::default())
            .map(|e| e.unwrap().relative.to_string())
            .collect();

        let pos = |p: &str| rels.iter().position(|r| r == p).unwrap();
        assert!(pos("wp-admin") < pos("wp-admin/css"));
        assert!(pos("wp-admin/css") < pos("wp-admin/css/admin.css"));
        assert_eq!(rels.len(), 5);
    }

    #[test]
    fn skip_list_drops_names() {
        let dir = tree();
        let skip = SkipList::new(["wp-config.php"]);
        let rels: Vec<String> = walk(dir.path(), &skip)
            .map(|e| e.unwrap().relative.to_string())
            .collect();
        assert!(!rels.contains(&"wp-config.php".to_string()));
        assert!(rels.contains(&"index.php".to_string()));
    }

    #[test]
    fn skip_subtree_prunes_descent() {
        let dir = tree();
        let mut walker = walk(dir.path(), &SkipList::default());
        let mut seen = Vec::new();
        while let Some(entry) = walker.next() {
            let entry = entry.unwrap();
            if entry.relative.as_str() == "wp-admin" {
                walker.skip_subtree();
            }
            seen.push(entry.relative.to_string());
        }
        assert!(seen.contains(&"wp-admin".to_string()));
        assert!(!seen.iter().any(|p| p.starts_with("wp-admin/")));
    }

    #[test]
    fn missing_root_is_unreadable_then_fused() {
        let dir = tempfile::tempdir().unwrap();
        let mut walker = walk(dir.path().join("absent"), &SkipList::default());
        assert!(matches!(walker.next(), Some(Err(Error::Unreadable { .. }))));
        assert!(walker.next().is_none());
    }

    #[test]
    fn subtree_reports_paths_relative_to_root() {
        let dir = tree();
        let rels: Vec<String> = TreeWalker::subtree(
            dir.path(),
            dir.path().join("wp-admin"),
            SkipList::default(),
        )
        .map(|e| e.unwrap().relative.to_string())
        .collect();
        assert_eq!(rels.len(), 2);
        assert!(rels.contains(&"wp-admin/css/admin.css".to_string()));
    }

    #[test]
    fn children_do_not_recurse() {
        let dir = tree();
        let entries = TreeWalker::children(dir.path(), dir.path(), &SkipList::default()).unwrap();
        assert_eq!(entries.len(), 3);
    }
}
