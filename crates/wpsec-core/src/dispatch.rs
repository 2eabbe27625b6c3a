//! Sequential or per-subtree parallel tree visiting
//!
//! With one worker the tree is walked in a single pass. With more, the
//! immediate children of the start directory are visited on the calling
//! thread and every child directory is queued for a pool of scoped worker
//! threads, each of which walks its subtree independently.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use parking_lot::Mutex;
use wpsec_fs::{PathEntry, SkipList, TreeWalker};

use crate::{Error, Result};

/// What the walk should do after visiting a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visit {
    Continue,
    /// Do not descend into this directory
    SkipSubtree,
}

/// Visit every entry below `start` (relative paths against `root`).
///
/// The first unreadable directory aborts the walk, and with it every worker.
pub(crate) fn visit_tree<F>(root: &Path, start: &Path, skip: &SkipList, workers: usize, visit: F) -> Result<()>
where
    F: Fn(&PathEntry) -> Visit + Sync,
{
    if workers <= 1 {
        return walk_subtree(root, start, skip, &visit, &AtomicBool::new(false));
    }

    let (sender, receiver) = crossbeam_channel::unbounded::<PathBuf>();
    for entry in TreeWalker::children(root, start, skip).map_err(Error::from_walk)? {
        if visit(&entry) == Visit::Continue && entry.is_dir && sender.send(entry.path).is_err() {
            break;
        }
    }
    drop(sender);

    let stop = AtomicBool::new(false);
    let failure: Mutex<Option<Error>> = Mutex::new(None);

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let receiver = receiver.clone();
                let (visit, stop, failure) = (&visit, &stop, &failure);
                scope.spawn(move || {
                    while let Ok(dir) = receiver.recv() {
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                        if let Err(e) = walk_subtree(root, &dir, skip, visit, stop) {
                            stop.store(true, Ordering::Relaxed);
                            set_failure(failure, e);
                            break;
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            if handle.join().is_err() {
                stop.store(true, Ordering::Relaxed);
                set_failure(&failure, Error::WorkerPanicked);
            }
        }
    });

    match failure.into_inner() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Keep only the first failure.
fn set_failure(slot: &Mutex<Option<Error>>, error: Error) {
    let mut slot = slot.lock();
    if slot.is_none() {
        *slot = Some(error);
    }
}

fn walk_subtree<F>(root: &Path, start: &Path, skip: &SkipList, visit: &F, stop: &AtomicBool) -> Result<()>
where
    F: Fn(&PathEntry) -> Visit,
{
    let mut walker = TreeWalker::subtree(root, start, skip.clone());
    while let Some(entry) = walker.next() {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let entry = entry.map_err(Error::from_walk)?;
        if visit(&entry) == Visit::SkipSubtree {
            walker.skip_subtree();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    fn tree(root: &Path) {
        for dir in ["a/x", "b/y", "c"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        for file in ["a/x/1.php", "b/y/2.php", "c/3.php", "top.php"] {
            fs::write(root.join(file), file).unwrap();
        }
    }

    fn collect(root: &Path, workers: usize) -> HashSet<String> {
        let seen = Mutex::new(HashSet::new());
        visit_tree(root, root, &SkipList::default(), workers, |entry| {
            seen.lock().insert(entry.relative.to_string());
            Visit::Continue
        })
        .unwrap();
        seen.into_inner()
    }

    #[test]
    fn parallel_visit_sees_the_same_entries() {
        let dir = tempfile::tempdir().unwrap();
        tree(dir.path());

        let sequential = collect(dir.path(), 1);
        let parallel = collect(dir.path(), 4);

        assert_eq!(sequential.len(), 9);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn skip_subtree_applies_to_top_level_in_parallel() {
        let dir = tempfile::tempdir().unwrap();
        tree(dir.path());
        let seen = Mutex::new(Vec::new());

        visit_tree(dir.path(), dir.path(), &SkipList::default(), 3, |entry| {
            seen.lock().push(entry.relative.to_string());
            if entry.relative.as_str() == "a" {
                Visit::SkipSubtree
            } else {
                Visit::Continue
            }
        })
        .unwrap();

        let seen = seen.into_inner();
        assert!(seen.contains(&"a".to_string()));
        assert!(!seen.iter().any(|p| p.starts_with("a/")));
    }

    #[test]
    fn missing_start_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        for workers in [1, 4] {
            let result = visit_tree(
                dir.path(),
                &dir.path().join("absent"),
                &SkipList::default(),
                workers,
                |_| Visit::Continue,
            );
            assert!(matches!(result, Err(Error::UnreadableDirectory { .. })));
        }
    }
}
