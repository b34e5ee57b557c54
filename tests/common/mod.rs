//! Hand-built test doubles for the artifact layer.
//!
//! `FakeTree` is a fixed set of containers whose notifier records every
//! registration call and delivers scripted change triples to every
//! registered listener without filtering.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use adaptable_notify::artifact::{
    ArtifactContainer, ArtifactEntry, ArtifactError, ArtifactListener, ArtifactNotification,
    ArtifactNotifier, ArtifactResult,
};
use adaptable_notify::interpreted::{Notification, NotificationListener};
use adaptable_notify::paths;
use parking_lot::Mutex;

/// One call to `register_for_notifications`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationCall {
    pub container: String,
    pub paths: BTreeSet<String>,
}

#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<RegistrationCall>>,
    listeners: Mutex<Vec<Arc<dyn ArtifactListener>>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn calls(&self) -> Vec<RegistrationCall> {
        self.calls.lock().clone()
    }

    pub fn distinct_listeners(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Make every following registration fail until reset.
    pub fn fail_registrations(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl ArtifactNotifier for RecordingNotifier {
    fn register_for_notifications(
        &self,
        targets: &ArtifactNotification,
        listener: Arc<dyn ArtifactListener>,
    ) -> ArtifactResult<bool> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ArtifactError::WatchFailed {
                path: "/".into(),
                reason: "scripted failure".to_string(),
            });
        }
        self.calls.lock().push(RegistrationCall {
            container: targets.container().path().to_string(),
            paths: targets.paths().clone(),
        });
        let mut listeners = self.listeners.lock();
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
        Ok(true)
    }

    fn remove_listener(&self, listener: &Arc<dyn ArtifactListener>) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        before != listeners.len()
    }
}

struct FakeInner {
    containers: BTreeSet<String>,
    notifier: Arc<RecordingNotifier>,
}

/// A fixed artifact tree made of containers only.
#[derive(Clone)]
pub struct FakeTree {
    inner: Arc<FakeInner>,
}

impl FakeTree {
    /// Containers at `paths` plus all of their parents.
    pub fn new(paths_in: &[&str]) -> Self {
        let mut containers = BTreeSet::new();
        for path in paths_in {
            let path = paths::normalize(path);
            containers.extend(paths::proper_prefixes(&path));
            containers.insert(path);
        }
        Self {
            inner: Arc::new(FakeInner {
                containers,
                notifier: Arc::new(RecordingNotifier::default()),
            }),
        }
    }

    pub fn root(&self) -> Arc<dyn ArtifactContainer> {
        self.node("/")
    }

    fn node(&self, path: &str) -> Arc<dyn ArtifactContainer> {
        Arc::new(FakeContainer {
            inner: Arc::clone(&self.inner),
            path: path.to_string(),
        })
    }

    pub fn notifier(&self) -> Arc<RecordingNotifier> {
        Arc::clone(&self.inner.notifier)
    }

    /// Deliver a raw triple to every listener registered so far.
    pub fn fire(&self, added: &[&str], removed: &[&str], modified: &[&str]) {
        let root = self.root();
        let listeners: Vec<_> = self.inner.notifier.listeners.lock().clone();
        for listener in listeners {
            listener.notify_entry_change(
                &ArtifactNotification::new(Arc::clone(&root), added.iter().copied()),
                &ArtifactNotification::new(Arc::clone(&root), removed.iter().copied()),
                &ArtifactNotification::new(Arc::clone(&root), modified.iter().copied()),
            );
        }
    }

    pub fn fire_modified(&self, modified: &[&str]) {
        self.fire(&[], &[], modified);
    }
}

struct FakeContainer {
    inner: Arc<FakeInner>,
    path: String,
}

impl fmt::Debug for FakeContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FakeContainer({})", self.path)
    }
}

impl ArtifactContainer for FakeContainer {
    fn path(&self) -> &str {
        &self.path
    }

    fn name(&self) -> &str {
        paths::name(&self.path)
    }

    fn is_root(&self) -> bool {
        self.path == "/"
    }

    fn enclosing_container(&self) -> Option<Arc<dyn ArtifactContainer>> {
        let parent = paths::parent(&self.path)?;
        Some(Arc::new(FakeContainer {
            inner: Arc::clone(&self.inner),
            path: parent,
        }))
    }

    fn entry(&self, path: &str) -> Option<Arc<dyn ArtifactEntry>> {
        let full = paths::join(&self.path, path);
        if !self.inner.containers.contains(&full) {
            return None;
        }
        Some(Arc::new(FakeEntry {
            inner: Arc::clone(&self.inner),
            path: full,
        }))
    }

    fn entry_in_enclosing_container(&self) -> Option<Arc<dyn ArtifactEntry>> {
        if self.is_root() {
            return None;
        }
        Some(Arc::new(FakeEntry {
            inner: Arc::clone(&self.inner),
            path: self.path.clone(),
        }))
    }

    fn root(&self) -> Arc<dyn ArtifactContainer> {
        Arc::new(FakeContainer {
            inner: Arc::clone(&self.inner),
            path: "/".to_string(),
        })
    }

    fn artifact_notifier(&self) -> Arc<dyn ArtifactNotifier> {
        Arc::clone(&self.inner.notifier) as Arc<dyn ArtifactNotifier>
    }
}

struct FakeEntry {
    inner: Arc<FakeInner>,
    path: String,
}

impl fmt::Debug for FakeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FakeEntry({})", self.path)
    }
}

impl ArtifactEntry for FakeEntry {
    fn path(&self) -> &str {
        &self.path
    }

    fn name(&self) -> &str {
        paths::name(&self.path)
    }

    fn enclosing_container(&self) -> Arc<dyn ArtifactContainer> {
        Arc::new(FakeContainer {
            inner: Arc::clone(&self.inner),
            path: paths::parent(&self.path).unwrap_or_else(|| "/".to_string()),
        })
    }

    fn convert_to_container(&self) -> Option<Arc<dyn ArtifactContainer>> {
        Some(Arc::new(FakeContainer {
            inner: Arc::clone(&self.inner),
            path: self.path.clone(),
        }))
    }
}

/// One delivered triple, flattened for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub root: String,
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub modified: BTreeSet<String>,
}

/// Listener that keeps every triple it receives.
#[derive(Default)]
pub struct Recorder {
    deliveries: Mutex<Vec<Delivery>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    /// The single delivery received; panics on zero or several.
    pub fn only(&self) -> Delivery {
        let deliveries = self.deliveries();
        assert_eq!(deliveries.len(), 1, "expected exactly one delivery: {deliveries:?}");
        deliveries[0].clone()
    }
}

impl NotificationListener for Recorder {
    fn notify_entry_change(&self, added: &Notification, removed: &Notification, modified: &Notification) {
        assert!(added.container().is_root());
        self.deliveries.lock().push(Delivery {
            root: added.container().root_path().to_string(),
            added: added.paths().clone(),
            removed: removed.paths().clone(),
            modified: modified.paths().clone(),
        });
    }
}

pub fn set(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|p| p.to_string()).collect()
}
