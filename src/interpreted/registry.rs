//! One notifier per logical root.

use std::sync::Arc;

use dashmap::DashMap;

use super::InterpretedNotifier;
use super::container::TreeShared;
use crate::artifact::ArtifactContainer;

/// Caches the notifier of every logical root of one interpreted tree.
///
/// Entries are keyed by the root's artifact path, created on first use and
/// kept for the lifetime of the tree.
#[derive(Default)]
pub struct NotifierRegistry {
    notifiers: DashMap<String, Arc<InterpretedNotifier>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or create the notifier for `root`.
    ///
    /// Creation happens under the map's shard lock, so concurrent first
    /// calls for one root still agree on a single instance.
    pub(crate) fn notifier_for(
        &self,
        shared: &Arc<TreeShared>,
        root: &Arc<dyn ArtifactContainer>,
    ) -> Arc<InterpretedNotifier> {
        let entry = self
            .notifiers
            .entry(root.path().to_string())
            .or_insert_with(|| {
                crate::debug_event!("registry", "created", "notifier for root {}", root.path());
                InterpretedNotifier::new(Arc::downgrade(shared), Arc::clone(root))
            });
        Arc::clone(entry.value())
    }

    /// The notifier for the root at `root_path`, if one was created.
    pub fn get(&self, root_path: &str) -> Option<Arc<InterpretedNotifier>> {
        self.notifiers.get(root_path).map(|n| Arc::clone(n.value()))
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Artifact paths of every root with a notifier, sorted.
    pub fn roots(&self) -> Vec<String> {
        let mut roots: Vec<String> = self.notifiers.iter().map(|e| e.key().clone()).collect();
        roots.sort();
        roots
    }
}

#[cfg(test)]
mod tests {
    use crate::artifact::memory::MemoryArtifactTree;
    use crate::interpreted::{ExplicitRoots, InterpretedTree};
    use std::sync::Arc;

    #[test]
    fn test_notifiers_are_cached_per_root() {
        let artifacts = MemoryArtifactTree::with_containers(["/a/b/c/d/e", "/a/b/n", "/x"]);
        let tree = InterpretedTree::new(
            artifacts.root(),
            Arc::new(ExplicitRoots::new(["/a/b", "/a/b/c/d"])),
        );

        let from_root = tree.container("/a/b").unwrap().adapt_notifier();
        let from_child = tree.container("/a/b/c").unwrap().adapt_notifier();
        let from_sibling = tree.container("/a/b/n").unwrap().adapt_notifier();
        let nested = tree.container("/a/b/c/d/e").unwrap().adapt_notifier();
        let outer = tree.container("/x").unwrap().adapt_notifier();

        assert!(Arc::ptr_eq(&from_root, &from_child));
        assert!(Arc::ptr_eq(&from_root, &from_sibling));
        assert!(!Arc::ptr_eq(&from_root, &nested));
        assert_eq!(nested.root_path(), "/a/b/c/d");
        assert_eq!(outer.root_path(), "/");

        assert_eq!(tree.registry().len(), 3);
        assert_eq!(tree.registry().roots(), vec!["/", "/a/b", "/a/b/c/d"]);
        assert!(Arc::ptr_eq(&tree.registry().get("/a/b").unwrap(), &from_root));
        assert!(tree.registry().get("/a").is_none());
    }

    #[test]
    fn test_concurrent_first_access_yields_one_notifier() {
        let artifacts = MemoryArtifactTree::with_containers(["/r/p0", "/r/p1", "/r/p2", "/r/p3"]);
        let tree = InterpretedTree::new(artifacts.root(), Arc::new(ExplicitRoots::new(["/r"])));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tree = tree.clone();
                std::thread::spawn(move || {
                    tree.container(&format!("/r/p{}", i % 4))
                        .unwrap()
                        .adapt_notifier()
                })
            })
            .collect();
        let notifiers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(notifiers.iter().all(|n| Arc::ptr_eq(n, &notifiers[0])));
        assert_eq!(tree.registry().len(), 1);
    }
}
