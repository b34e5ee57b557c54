//! The notifier bound to one logical root.

use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use super::container::TreeShared;
use super::{
    InterpretedContainer, Notification, NotificationListener, NotifyError, NotifyResult,
    PathTranslator,
};
use crate::artifact::{ArtifactContainer, ArtifactListener, ArtifactNotification};
use crate::paths;

/// What has been handed to the artifact notifier so far.
#[derive(Default)]
struct Underlying {
    registered: bool,
    forwarded: BTreeSet<String>,
}

/// The listener handed to the artifact notifier.
///
/// Only a weak link back: the notifier's root container already keeps the
/// artifact tree, and with it this handle, alive.
struct DispatchHandle {
    notifier: Weak<InterpretedNotifier>,
}

impl ArtifactListener for DispatchHandle {
    fn notify_entry_change(
        &self,
        added: &ArtifactNotification,
        removed: &ArtifactNotification,
        modified: &ArtifactNotification,
    ) {
        if let Some(notifier) = self.notifier.upgrade() {
            notifier.deliver(added, removed, modified);
        }
    }
}

/// Delivers root-relative change notifications for one logical root.
///
/// Obtained through [`InterpretedContainer::adapt_notifier`]. The notifier
/// holds a single registration with the artifact notifier and fans each
/// translated change out to all of its listeners. Dropping the notifier
/// withdraws that registration.
pub struct InterpretedNotifier {
    tree: Weak<TreeShared>,
    root: Arc<dyn ArtifactContainer>,
    dispatch: Arc<dyn ArtifactListener>,
    listeners: RwLock<Vec<Arc<dyn NotificationListener>>>,
    underlying: Mutex<Underlying>,
}

impl InterpretedNotifier {
    pub(crate) fn new(tree: Weak<TreeShared>, root: Arc<dyn ArtifactContainer>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            tree,
            root,
            dispatch: Arc::new(DispatchHandle {
                notifier: this.clone(),
            }),
            listeners: RwLock::new(Vec::new()),
            underlying: Mutex::new(Underlying::default()),
        })
    }

    /// Absolute artifact path of the root this notifier is bound to.
    pub fn root_path(&self) -> &str {
        self.root.path()
    }

    /// The interpreted container of the bound root.
    pub fn root(&self) -> NotifyResult<InterpretedContainer> {
        let tree = self.tree.upgrade().ok_or(NotifyError::Detached)?;
        Ok(InterpretedContainer::for_root(tree, Arc::clone(&self.root)))
    }

    /// Register `listener` for the root-relative paths in `targets`.
    ///
    /// `targets.container()` may be any container under this notifier's
    /// root; a container under another root is rejected with
    /// [`NotifyError::ScopeMismatch`] before anything changes. A leading `!`
    /// on a path asks for a non-recursive watch.
    ///
    /// Returns `true` if the listener was newly added.
    pub fn register_for_notifications(
        &self,
        targets: &Notification,
        listener: Arc<dyn NotificationListener>,
    ) -> NotifyResult<bool> {
        let tree = self.tree.upgrade().ok_or(NotifyError::Detached)?;
        self.check_scope(&tree, targets.container())?;
        for path in targets.paths() {
            let (_, bare) = paths::split_marker(path);
            if !bare.starts_with(paths::SEPARATOR) {
                return Err(NotifyError::InvalidPath {
                    path: path.clone(),
                    reason: "paths must be absolute within the root".to_string(),
                });
            }
        }

        let translator = PathTranslator::new(&self.root, tree.helper.as_ref());
        let artifact_paths: BTreeSet<String> = targets
            .paths()
            .iter()
            .map(|p| translator.to_artifact(p))
            .collect();

        let mut underlying = self.underlying.lock();
        let fresh: BTreeSet<String> = artifact_paths
            .difference(&underlying.forwarded)
            .cloned()
            .collect();

        if !underlying.registered || !fresh.is_empty() {
            let request = ArtifactNotification::new(self.root.root(), fresh.iter().cloned());
            self.root
                .artifact_notifier()
                .register_for_notifications(&request, Arc::clone(&self.dispatch))?;

            crate::debug_event!(
                "notifier",
                "forwarded",
                "{fresh:?} for root {}",
                self.root_path()
            );
            underlying.registered = true;
            underlying.forwarded.extend(fresh);
        }

        let mut listeners = self.listeners.write();
        if listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return Ok(false);
        }
        listeners.push(listener);
        Ok(true)
    }

    /// Remove a listener. The artifact-level registration stays in place.
    pub fn remove_listener(&self, listener: &Arc<dyn NotificationListener>) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Artifact paths handed to the artifact notifier so far.
    pub fn forwarded_paths(&self) -> BTreeSet<String> {
        self.underlying.lock().forwarded.clone()
    }

    fn check_scope(&self, tree: &Arc<TreeShared>, container: &InterpretedContainer) -> NotifyResult<()> {
        if !Arc::ptr_eq(tree, &container.shared) || container.root_path() != self.root_path() {
            return Err(NotifyError::ScopeMismatch {
                expected: self.root_path().to_string(),
                found: container.root_path().to_string(),
            });
        }
        Ok(())
    }

    /// Translate a raw triple and hand it to every listener.
    fn deliver(
        &self,
        added: &ArtifactNotification,
        removed: &ArtifactNotification,
        modified: &ArtifactNotification,
    ) {
        let Some(tree) = self.tree.upgrade() else {
            crate::debug_event!("notifier", "dropped", "tree gone for root {}", self.root_path());
            return;
        };

        let translator = PathTranslator::new(&self.root, tree.helper.as_ref());
        let added = translator.translate_set(added.paths());
        let removed = translator.translate_set(removed.paths());
        let modified = translator.translate_set(modified.paths());
        if added.is_empty() && removed.is_empty() && modified.is_empty() {
            return;
        }

        let root = InterpretedContainer::for_root(tree, Arc::clone(&self.root));
        let added = Notification::new(root.clone(), added);
        let removed = Notification::new(root.clone(), removed);
        let modified = Notification::new(root, modified);

        // Snapshot so listeners may register further listeners while called
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        crate::debug_event!(
            "notifier",
            "dispatch",
            "+{:?} -{:?} ~{:?} to {} listeners under {}",
            added.paths(),
            removed.paths(),
            modified.paths(),
            listeners.len(),
            self.root_path()
        );
        for listener in listeners {
            listener.notify_entry_change(&added, &removed, &modified);
        }
    }
}

impl Drop for InterpretedNotifier {
    fn drop(&mut self) {
        if self.underlying.get_mut().registered {
            self.root.artifact_notifier().remove_listener(&self.dispatch);
        }
    }
}
