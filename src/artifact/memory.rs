//! In-memory artifact tree.
//!
//! Entries live in an ordered table keyed by absolute path. Changes are
//! announced explicitly through [`MemoryArtifactNotifier::fire`], which makes
//! this tree the natural backing for offline translation and for tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::{
    ArtifactContainer, ArtifactEntry, ArtifactError, ArtifactListener, ArtifactNotification,
    ArtifactNotifier, ArtifactResult, Registrations,
};
use crate::paths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Container,
    File,
}

struct TreeInner {
    entries: RwLock<BTreeMap<String, Kind>>,
    notifier: Arc<MemoryArtifactNotifier>,
}

impl TreeInner {
    fn kind(&self, path: &str) -> Option<Kind> {
        if path == paths::ROOT {
            return Some(Kind::Container);
        }
        self.entries.read().get(path).copied()
    }
}

/// An artifact tree held entirely in memory.
#[derive(Clone)]
pub struct MemoryArtifactTree {
    inner: Arc<TreeInner>,
}

impl Default for MemoryArtifactTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryArtifactTree {
    /// Create a tree holding only the root container.
    pub fn new() -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<TreeInner>| TreeInner {
            entries: RwLock::new(BTreeMap::new()),
            notifier: Arc::new(MemoryArtifactNotifier {
                tree: weak.clone(),
                registrations: Registrations::new(),
            }),
        });
        Self { inner }
    }

    /// Build a tree from container paths; missing parents are created.
    pub fn with_containers<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tree = Self::new();
        for path in paths {
            tree.add_container(path.as_ref());
        }
        tree
    }

    /// Add a container at `path`, creating missing parents.
    pub fn add_container(&self, path: &str) {
        self.insert(path, Kind::Container);
    }

    /// Add a file at `path`, creating missing parent containers.
    pub fn add_file(&self, path: &str) {
        self.insert(path, Kind::File);
    }

    fn insert(&self, path: &str, kind: Kind) {
        let path = paths::normalize(path);
        if path == paths::ROOT {
            return;
        }
        let mut entries = self.inner.entries.write();
        for prefix in paths::proper_prefixes(&path) {
            entries.entry(prefix).or_insert(Kind::Container);
        }
        entries.insert(path, kind);
    }

    /// Remove the entry at `path` and everything below it.
    ///
    /// Returns `false` when nothing was there.
    pub fn remove(&self, path: &str) -> bool {
        let path = paths::normalize(path);
        let mut entries = self.inner.entries.write();
        let before = entries.len();
        entries.retain(|p, _| !paths::is_within(&path, p));
        entries.len() != before
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner.kind(&paths::normalize(path)).is_some()
    }

    pub fn root(&self) -> Arc<dyn ArtifactContainer> {
        Arc::new(MemoryContainer {
            inner: Arc::clone(&self.inner),
            path: paths::ROOT.to_string(),
        })
    }

    /// Container at an absolute path, if one exists there.
    pub fn container(&self, path: &str) -> Option<Arc<dyn ArtifactContainer>> {
        super::container_at(&self.root(), path)
    }

    pub fn notifier(&self) -> Arc<MemoryArtifactNotifier> {
        Arc::clone(&self.inner.notifier)
    }
}

#[derive(Clone)]
struct MemoryContainer {
    inner: Arc<TreeInner>,
    path: String,
}

impl std::fmt::Debug for MemoryContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MemoryContainer").field(&self.path).finish()
    }
}

impl ArtifactContainer for MemoryContainer {
    fn path(&self) -> &str {
        &self.path
    }

    fn name(&self) -> &str {
        paths::name(&self.path)
    }

    fn is_root(&self) -> bool {
        self.path == paths::ROOT
    }

    fn enclosing_container(&self) -> Option<Arc<dyn ArtifactContainer>> {
        let parent = paths::parent(&self.path)?;
        Some(Arc::new(MemoryContainer {
            inner: Arc::clone(&self.inner),
            path: parent,
        }))
    }

    fn entry(&self, path: &str) -> Option<Arc<dyn ArtifactEntry>> {
        let full = paths::join(&self.path, path);
        if full == paths::ROOT {
            return None;
        }
        self.inner.kind(&full)?;
        Some(Arc::new(MemoryEntry {
            inner: Arc::clone(&self.inner),
            path: full,
        }))
    }

    fn entry_in_enclosing_container(&self) -> Option<Arc<dyn ArtifactEntry>> {
        if self.is_root() {
            return None;
        }
        Some(Arc::new(MemoryEntry {
            inner: Arc::clone(&self.inner),
            path: self.path.clone(),
        }))
    }

    fn root(&self) -> Arc<dyn ArtifactContainer> {
        Arc::new(MemoryContainer {
            inner: Arc::clone(&self.inner),
            path: paths::ROOT.to_string(),
        })
    }

    fn artifact_notifier(&self) -> Arc<dyn ArtifactNotifier> {
        Arc::clone(&self.inner.notifier) as Arc<dyn ArtifactNotifier>
    }
}

struct MemoryEntry {
    inner: Arc<TreeInner>,
    path: String,
}

impl std::fmt::Debug for MemoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MemoryEntry").field(&self.path).finish()
    }
}

impl ArtifactEntry for MemoryEntry {
    fn path(&self) -> &str {
        &self.path
    }

    fn name(&self) -> &str {
        paths::name(&self.path)
    }

    fn enclosing_container(&self) -> Arc<dyn ArtifactContainer> {
        Arc::new(MemoryContainer {
            inner: Arc::clone(&self.inner),
            path: paths::parent(&self.path).unwrap_or_else(|| paths::ROOT.to_string()),
        })
    }

    fn convert_to_container(&self) -> Option<Arc<dyn ArtifactContainer>> {
        match self.inner.kind(&self.path)? {
            Kind::Container => Some(Arc::new(MemoryContainer {
                inner: Arc::clone(&self.inner),
                path: self.path.clone(),
            })),
            Kind::File => None,
        }
    }
}

/// Notifier for a [`MemoryArtifactTree`]; changes are injected by the owner.
pub struct MemoryArtifactNotifier {
    tree: Weak<TreeInner>,
    registrations: Registrations,
}

impl MemoryArtifactNotifier {
    /// Announce a change triple of absolute artifact paths.
    ///
    /// Each registered listener receives the paths its targets cover.
    /// Returns the number of listeners called.
    pub fn fire<A, R, M>(&self, added: A, removed: R, modified: M) -> ArtifactResult<usize>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        let inner = self.tree.upgrade().ok_or(ArtifactError::Closed)?;
        let root: Arc<dyn ArtifactContainer> = Arc::new(MemoryContainer {
            inner,
            path: paths::ROOT.to_string(),
        });
        let added: BTreeSet<String> = added.into_iter().map(|p| p.as_ref().to_string()).collect();
        let removed: BTreeSet<String> = removed.into_iter().map(|p| p.as_ref().to_string()).collect();
        let modified: BTreeSet<String> =
            modified.into_iter().map(|p| p.as_ref().to_string()).collect();

        crate::debug_event!(
            "memory-artifact",
            "fire",
            "+{} -{} ~{}",
            added.len(),
            removed.len(),
            modified.len()
        );
        Ok(self
            .registrations
            .dispatch(&root, &added, &removed, &modified))
    }

    /// Announce modifications only.
    pub fn fire_modified<M>(&self, modified: M) -> ArtifactResult<usize>
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        self.fire(Vec::<String>::new(), Vec::<String>::new(), modified)
    }

    /// Number of distinct listeners registered.
    pub fn listener_count(&self) -> usize {
        self.registrations.len()
    }

    /// Every registered path, with its `!` marker restored.
    pub fn registered_paths(&self) -> BTreeSet<String> {
        self.registrations
            .targets()
            .into_iter()
            .map(|t| {
                if t.recursive {
                    t.path
                } else {
                    format!("{}{}", paths::NON_RECURSIVE_MARKER, t.path)
                }
            })
            .collect()
    }
}

impl ArtifactNotifier for MemoryArtifactNotifier {
    fn register_for_notifications(
        &self,
        targets: &ArtifactNotification,
        listener: Arc<dyn ArtifactListener>,
    ) -> ArtifactResult<bool> {
        if !targets.container().is_root() {
            return Err(ArtifactError::ForeignContainer {
                path: targets.container().path().to_string(),
            });
        }
        Ok(self.registrations.add(listener, targets.paths()))
    }

    fn remove_listener(&self, listener: &Arc<dyn ArtifactListener>) -> bool {
        self.registrations.remove(listener)
    }
}
