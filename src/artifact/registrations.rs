//! Listener bookkeeping shared by artifact notifier implementations.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{ArtifactContainer, ArtifactListener, ArtifactNotification};
use crate::paths;

/// One watched path, recursive unless registered with a leading `!`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchTarget {
    pub path: String,
    pub recursive: bool,
}

impl WatchTarget {
    /// Parse a registration path, honouring the `!` marker.
    pub fn parse(raw: &str) -> Self {
        let (non_recursive, path) = paths::split_marker(raw);
        Self {
            path: paths::normalize(path),
            recursive: !non_recursive,
        }
    }

    /// Whether a change at `path` is reported to this target.
    ///
    /// Non-recursive targets cover the path itself and its direct children.
    pub fn covers(&self, path: &str) -> bool {
        if self.recursive {
            paths::is_within(&self.path, path)
        } else {
            path == self.path || paths::parent(path).as_deref() == Some(self.path.as_str())
        }
    }
}

struct Registration {
    listener: Arc<dyn ArtifactListener>,
    targets: BTreeSet<WatchTarget>,
}

/// Listener table keyed by listener identity.
#[derive(Default)]
pub struct Registrations {
    entries: RwLock<Vec<Registration>>,
}

impl Registrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `listener` for `targets`; returns `true` if anything was new.
    pub fn add<'a>(
        &self,
        listener: Arc<dyn ArtifactListener>,
        targets: impl IntoIterator<Item = &'a String>,
    ) -> bool {
        let parsed: BTreeSet<WatchTarget> = targets.into_iter().map(|t| WatchTarget::parse(t)).collect();
        let mut entries = self.entries.write();

        if let Some(existing) = entries
            .iter_mut()
            .find(|r| Arc::ptr_eq(&r.listener, &listener))
        {
            let before = existing.targets.len();
            existing.targets.extend(parsed);
            return existing.targets.len() != before;
        }

        entries.push(Registration {
            listener,
            targets: parsed,
        });
        true
    }

    pub fn remove(&self, listener: &Arc<dyn ArtifactListener>) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|r| !Arc::ptr_eq(&r.listener, listener));
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// All targets currently registered, across listeners.
    pub fn targets(&self) -> BTreeSet<WatchTarget> {
        self.entries
            .read()
            .iter()
            .flat_map(|r| r.targets.iter().cloned())
            .collect()
    }

    /// Deliver a raw change triple to every listener whose targets match.
    ///
    /// Each listener only sees the paths its own targets cover, and is not
    /// called at all when none match. Listeners run outside the table lock.
    /// Returns the number of listeners called.
    pub fn dispatch(
        &self,
        root: &Arc<dyn ArtifactContainer>,
        added: &BTreeSet<String>,
        removed: &BTreeSet<String>,
        modified: &BTreeSet<String>,
    ) -> usize {
        let deliveries: Vec<_> = {
            let entries = self.entries.read();
            entries
                .iter()
                .filter_map(|r| {
                    let filter = |set: &BTreeSet<String>| -> BTreeSet<String> {
                        set.iter()
                            .filter(|p| r.targets.iter().any(|t| t.covers(p)))
                            .cloned()
                            .collect()
                    };
                    let (a, rm, m) = (filter(added), filter(removed), filter(modified));
                    if a.is_empty() && rm.is_empty() && m.is_empty() {
                        None
                    } else {
                        Some((Arc::clone(&r.listener), a, rm, m))
                    }
                })
                .collect()
        };

        let count = deliveries.len();
        for (listener, a, rm, m) in deliveries {
            listener.notify_entry_change(
                &ArtifactNotification::new(Arc::clone(root), a),
                &ArtifactNotification::new(Arc::clone(root), rm),
                &ArtifactNotification::new(Arc::clone(root), m),
            );
        }
        count
    }
}
