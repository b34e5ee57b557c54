//! Notifications and listeners exposed to interpreted-layer consumers.

use std::collections::BTreeSet;
use std::fmt;

use super::InterpretedContainer;

/// A set of paths relative to the logical root of `container`.
#[derive(Clone)]
pub struct Notification {
    container: InterpretedContainer,
    paths: BTreeSet<String>,
}

impl Notification {
    pub fn new<I, S>(container: InterpretedContainer, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            container,
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn container(&self) -> &InterpretedContainer {
        &self.container
    }

    pub fn paths(&self) -> &BTreeSet<String> {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("root", &self.container.root_path())
            .field("container", &self.container.path())
            .field("paths", &self.paths)
            .finish()
    }
}

/// Receives translated change triples.
///
/// Called synchronously on the thread that delivered the artifact-level
/// change; a slow listener holds up every later listener.
pub trait NotificationListener: Send + Sync {
    fn notify_entry_change(&self, added: &Notification, removed: &Notification, modified: &Notification);
}

impl<F> NotificationListener for F
where
    F: Fn(&Notification, &Notification, &Notification) + Send + Sync,
{
    fn notify_entry_change(&self, added: &Notification, removed: &Notification, modified: &Notification) {
        self(added, removed, modified)
    }
}
