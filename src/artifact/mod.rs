//! The artifact layer: physical container trees and their change notifiers.
//!
//! An artifact tree mirrors the storage it is backed by (a directory, an
//! in-memory table of entries). Paths here are absolute within the artifact
//! tree. The interpreted layer in [`crate::interpreted`] re-roots these
//! paths; nothing in this module knows about virtual roots.
//!
//! # Architecture
//!
//! ```text
//! ArtifactContainer (root) ── artifact_notifier() ──> ArtifactNotifier
//!        |                                                 |
//!   entry(path)                                 Registrations (listener -> targets)
//!        |                                                 |
//!   ArtifactEntry ── convert_to_container()       ArtifactListener::notify_entry_change
//! ```

mod debouncer;
mod error;
pub mod fs;
pub mod memory;
mod registrations;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub use debouncer::{ChangeKind, Debouncer};
pub use error::{ArtifactError, ArtifactResult};
pub use registrations::{Registrations, WatchTarget};

use crate::paths;

/// A node in the artifact tree that may hold further entries.
pub trait ArtifactContainer: Send + Sync + fmt::Debug {
    /// Absolute path within the artifact tree; `/` for the root.
    fn path(&self) -> &str;

    /// Last path segment; empty for the root.
    fn name(&self) -> &str;

    /// Whether this container is the root of its artifact tree.
    fn is_root(&self) -> bool;

    /// Parent container, `None` for the root.
    fn enclosing_container(&self) -> Option<Arc<dyn ArtifactContainer>>;

    /// Look up an entry below this container. A leading `/` is ignored:
    /// the path is always relative to this container.
    fn entry(&self, path: &str) -> Option<Arc<dyn ArtifactEntry>>;

    /// The entry representing this container inside its parent.
    fn entry_in_enclosing_container(&self) -> Option<Arc<dyn ArtifactEntry>>;

    /// Root container of the tree this container belongs to.
    fn root(&self) -> Arc<dyn ArtifactContainer>;

    /// Notifier delivering changes for the whole tree.
    fn artifact_notifier(&self) -> Arc<dyn ArtifactNotifier>;
}

/// A single named entry in the artifact tree.
pub trait ArtifactEntry: Send + Sync + fmt::Debug {
    fn path(&self) -> &str;

    fn name(&self) -> &str;

    fn enclosing_container(&self) -> Arc<dyn ArtifactContainer>;

    /// View this entry as a container, if it is one.
    fn convert_to_container(&self) -> Option<Arc<dyn ArtifactContainer>>;
}

/// Callback receiving raw change sets from an [`ArtifactNotifier`].
pub trait ArtifactListener: Send + Sync {
    fn notify_entry_change(
        &self,
        added: &ArtifactNotification,
        removed: &ArtifactNotification,
        modified: &ArtifactNotification,
    );
}

/// Source of change notifications for one artifact tree.
pub trait ArtifactNotifier: Send + Sync {
    /// Register `listener` for the paths in `targets`.
    ///
    /// Registering the same listener again extends its watched paths.
    /// Returns `true` when the listener or any path was newly added.
    fn register_for_notifications(
        &self,
        targets: &ArtifactNotification,
        listener: Arc<dyn ArtifactListener>,
    ) -> ArtifactResult<bool>;

    /// Drop every registration held by `listener`.
    fn remove_listener(&self, listener: &Arc<dyn ArtifactListener>) -> bool;
}

/// A set of artifact paths scoped to a container.
#[derive(Clone)]
pub struct ArtifactNotification {
    container: Arc<dyn ArtifactContainer>,
    paths: BTreeSet<String>,
}

impl ArtifactNotification {
    pub fn new<I, S>(container: Arc<dyn ArtifactContainer>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            container,
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// A notification carrying no paths.
    pub fn empty(container: Arc<dyn ArtifactContainer>) -> Self {
        Self {
            container,
            paths: BTreeSet::new(),
        }
    }

    pub fn container(&self) -> &Arc<dyn ArtifactContainer> {
        &self.container
    }

    pub fn paths(&self) -> &BTreeSet<String> {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl fmt::Debug for ArtifactNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactNotification")
            .field("container", &self.container.path())
            .field("paths", &self.paths)
            .finish()
    }
}

/// Resolve the container at `path` below `container`.
///
/// `/` resolves to `container` itself.
pub fn container_at(
    container: &Arc<dyn ArtifactContainer>,
    path: &str,
) -> Option<Arc<dyn ArtifactContainer>> {
    if paths::normalize(path) == paths::ROOT {
        return Some(Arc::clone(container));
    }
    container.entry(path)?.convert_to_container()
}
