//! Directory-backed artifact tree.
//!
//! Containers map to directories below a base directory, entries to any
//! file-system object. Change notifications come from a single
//! `notify::RecommendedWatcher` on the base directory, started on the first
//! registration. Raw events are debounced on a dispatcher thread and
//! delivered as change triples to the registered listeners.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, select};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use parking_lot::Mutex;

use super::{
    ArtifactContainer, ArtifactEntry, ArtifactError, ArtifactListener, ArtifactNotification,
    ArtifactNotifier, ArtifactResult, ChangeKind, Debouncer, Registrations,
};
use crate::config::WatchConfig;
use crate::paths;

struct FsInner {
    base: PathBuf,
    notifier: Arc<FsArtifactNotifier>,
}

/// An artifact tree over a directory on disk.
#[derive(Clone)]
pub struct FsArtifactTree {
    inner: Arc<FsInner>,
}

impl FsArtifactTree {
    /// Open the directory at `base` as an artifact tree.
    pub fn open(base: impl AsRef<Path>, config: &WatchConfig) -> ArtifactResult<Self> {
        let base = base.as_ref().canonicalize()?;
        if !base.is_dir() {
            return Err(ArtifactError::NotAContainer {
                path: base.display().to_string(),
            });
        }

        let config = config.clone();
        let inner = Arc::new_cyclic(|weak: &Weak<FsInner>| FsInner {
            base: base.clone(),
            notifier: Arc::new(FsArtifactNotifier {
                tree: weak.clone(),
                base: base.clone(),
                config,
                registrations: Arc::new(Registrations::new()),
                state: Mutex::new(None),
                stopped: AtomicBool::new(false),
            }),
        });
        Ok(Self { inner })
    }

    pub fn base(&self) -> &Path {
        &self.inner.base
    }

    pub fn root(&self) -> Arc<dyn ArtifactContainer> {
        Arc::new(FsContainer {
            inner: Arc::clone(&self.inner),
            path: paths::ROOT.to_string(),
        })
    }

    pub fn container(&self, path: &str) -> Option<Arc<dyn ArtifactContainer>> {
        super::container_at(&self.root(), path)
    }

    pub fn notifier(&self) -> Arc<FsArtifactNotifier> {
        Arc::clone(&self.inner.notifier)
    }

    /// Stop watching for good. Registrations are kept but no further events
    /// arrive, and later registrations fail with [`ArtifactError::Closed`].
    pub fn stop(&self) {
        self.inner.notifier.stop();
    }
}

fn disk_path(base: &Path, artifact_path: &str) -> PathBuf {
    paths::segments(artifact_path).fold(base.to_path_buf(), |acc, s| acc.join(s))
}

/// Map a path reported by the watcher back into the artifact tree.
fn artifact_path(base: &Path, disk: &Path) -> Option<String> {
    let rel = disk.strip_prefix(base).ok()?;
    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    Some(paths::normalize(&joined))
}

#[derive(Clone)]
struct FsContainer {
    inner: Arc<FsInner>,
    path: String,
}

impl std::fmt::Debug for FsContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsContainer")
            .field("base", &self.inner.base)
            .field("path", &self.path)
            .finish()
    }
}

impl ArtifactContainer for FsContainer {
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
        Some(Arc::new(FsContainer {
            inner: Arc::clone(&self.inner),
            path: paths::parent(&self.path)?,
        }))
    }

    fn entry(&self, path: &str) -> Option<Arc<dyn ArtifactEntry>> {
        let full = paths::join(&self.path, path);
        if full == paths::ROOT {
            return None;
        }
        // symlink_metadata so dangling links still show up as entries
        std::fs::symlink_metadata(disk_path(&self.inner.base, &full)).ok()?;
        Some(Arc::new(FsEntry {
            inner: Arc::clone(&self.inner),
            path: full,
        }))
    }

    fn entry_in_enclosing_container(&self) -> Option<Arc<dyn ArtifactEntry>> {
        if self.is_root() {
            return None;
        }
        Some(Arc::new(FsEntry {
            inner: Arc::clone(&self.inner),
            path: self.path.clone(),
        }))
    }

    fn root(&self) -> Arc<dyn ArtifactContainer> {
        Arc::new(FsContainer {
            inner: Arc::clone(&self.inner),
            path: paths::ROOT.to_string(),
        })
    }

    fn artifact_notifier(&self) -> Arc<dyn ArtifactNotifier> {
        Arc::clone(&self.inner.notifier) as Arc<dyn ArtifactNotifier>
    }
}

struct FsEntry {
    inner: Arc<FsInner>,
    path: String,
}

impl std::fmt::Debug for FsEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FsEntry").field(&self.path).finish()
    }
}

impl ArtifactEntry for FsEntry {
    fn path(&self) -> &str {
        &self.path
    }

    fn name(&self) -> &str {
        paths::name(&self.path)
    }

    fn enclosing_container(&self) -> Arc<dyn ArtifactContainer> {
        Arc::new(FsContainer {
            inner: Arc::clone(&self.inner),
            path: paths::parent(&self.path).unwrap_or_else(|| paths::ROOT.to_string()),
        })
    }

    fn convert_to_container(&self) -> Option<Arc<dyn ArtifactContainer>> {
        if disk_path(&self.inner.base, &self.path).is_dir() {
            Some(Arc::new(FsContainer {
                inner: Arc::clone(&self.inner),
                path: self.path.clone(),
            }))
        } else {
            None
        }
    }
}

struct WatchState {
    _watcher: notify::RecommendedWatcher,
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

/// Notifier for an [`FsArtifactTree`].
pub struct FsArtifactNotifier {
    tree: Weak<FsInner>,
    base: PathBuf,
    config: WatchConfig,
    registrations: Arc<Registrations>,
    state: Mutex<Option<WatchState>>,
    stopped: AtomicBool,
}

impl FsArtifactNotifier {
    pub fn is_watching(&self) -> bool {
        self.state.lock().is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.registrations.len()
    }

    fn ensure_started(&self) -> ArtifactResult<()> {
        let mut state = self.state.lock();
        if self.stopped.load(Ordering::SeqCst) {
            return Err(ArtifactError::Closed);
        }
        if state.is_some() {
            return Ok(());
        }

        let (event_tx, event_rx) = crossbeam_channel::unbounded::<notify::Result<Event>>();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let mut watcher = notify::recommended_watcher(move |res| {
            // Receiver gone means the dispatcher has shut down
            let _ = event_tx.send(res);
        })?;
        watcher.watch(&self.base, RecursiveMode::Recursive)?;

        let dispatcher = Dispatcher {
            tree: self.tree.clone(),
            base: self.base.clone(),
            registrations: Arc::clone(&self.registrations),
            debouncer: Debouncer::new(self.config.debounce_ms),
            tick: Duration::from_millis(self.config.tick_ms.max(1)),
        };
        let thread = std::thread::Builder::new()
            .name("artifact-fs-dispatch".to_string())
            .spawn(move || dispatcher.run(event_rx, stop_rx))?;

        crate::log_event!("fs-artifact", "watching", "{}", self.base.display());
        *state = Some(WatchState {
            _watcher: watcher,
            stop_tx,
            thread: Some(thread),
        });
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let Some(mut state) = self.state.lock().take() else {
            return;
        };
        let _ = state.stop_tx.send(());
        if let Some(handle) = state.thread.take() {
            if handle.thread().id() != std::thread::current().id() {
                let _ = handle.join();
            }
        }
        crate::log_event!("fs-artifact", "stopped", "{}", self.base.display());
    }
}

impl Drop for FsArtifactNotifier {
    fn drop(&mut self) {
        self.stop();
    }
}

impl ArtifactNotifier for FsArtifactNotifier {
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
        self.ensure_started()?;
        Ok(self.registrations.add(listener, targets.paths()))
    }

    fn remove_listener(&self, listener: &Arc<dyn ArtifactListener>) -> bool {
        self.registrations.remove(listener)
    }
}

struct Dispatcher {
    tree: Weak<FsInner>,
    base: PathBuf,
    registrations: Arc<Registrations>,
    debouncer: Debouncer,
    tick: Duration,
}

impl Dispatcher {
    fn run(mut self, events: Receiver<notify::Result<Event>>, stop: Receiver<()>) {
        loop {
            select! {
                recv(events) -> msg => match msg {
                    Ok(Ok(event)) => self.record(event),
                    Ok(Err(e)) => tracing::error!("[fs-artifact] watch error: {e}"),
                    Err(_) => break,
                },
                recv(stop) -> _ => break,
                default(self.tick) => {},
            }
            if self.debouncer.has_pending() && !self.flush() {
                break;
            }
        }
        crate::debug_event!("fs-artifact", "dispatcher exited");
    }

    fn record(&mut self, event: Event) {
        let kinds: Vec<(PathBuf, ChangeKind)> = match event.kind {
            EventKind::Create(_) => tag(event.paths, ChangeKind::Added),
            EventKind::Remove(_) => tag(event.paths, ChangeKind::Removed),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                tag(event.paths, ChangeKind::Removed)
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                tag(event.paths, ChangeKind::Added)
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let mut paths = event.paths.into_iter();
                let mut out = Vec::new();
                if let Some(from) = paths.next() {
                    out.push((from, ChangeKind::Removed));
                }
                out.extend(paths.map(|p| (p, ChangeKind::Added)));
                out
            }
            EventKind::Modify(_) => tag(event.paths, ChangeKind::Modified),
            _ => Vec::new(),
        };

        for (disk, kind) in kinds {
            if let Some(path) = artifact_path(&self.base, &disk) {
                self.debouncer.record(path, kind);
            }
        }
    }

    /// Deliver every quiet change. Returns `false` once the tree is gone.
    fn flush(&mut self) -> bool {
        let ready = self.debouncer.take_ready();
        if ready.is_empty() {
            return true;
        }
        let Some(inner) = self.tree.upgrade() else {
            return false;
        };
        let root: Arc<dyn ArtifactContainer> = Arc::new(FsContainer {
            inner,
            path: paths::ROOT.to_string(),
        });

        let mut added = BTreeSet::new();
        let mut removed = BTreeSet::new();
        let mut modified = BTreeSet::new();
        for (path, kind) in ready {
            match kind {
                ChangeKind::Added => added.insert(path),
                ChangeKind::Removed => removed.insert(path),
                ChangeKind::Modified => modified.insert(path),
            };
        }

        let called = self
            .registrations
            .dispatch(&root, &added, &removed, &modified);
        crate::debug_event!(
            "fs-artifact",
            "dispatched",
            "+{} -{} ~{} to {called} listeners",
            added.len(),
            removed.len(),
            modified.len()
        );
        true
    }
}

fn tag(paths: Vec<PathBuf>, kind: ChangeKind) -> Vec<(PathBuf, ChangeKind)> {
    paths.into_iter().map(|p| (p, kind)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_path_mapping() {
        let base = Path::new("/srv/apps");
        assert_eq!(
            artifact_path(base, Path::new("/srv/apps/a/b")),
            Some("/a/b".to_string())
        );
        assert_eq!(artifact_path(base, Path::new("/srv/apps")), Some("/".to_string()));
        assert_eq!(artifact_path(base, Path::new("/srv/other")), None);
        assert_eq!(disk_path(base, "/a/b"), PathBuf::from("/srv/apps/a/b"));
    }

    #[test]
    fn test_fs_tree_navigation() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        std::fs::write(dir.path().join("a/file.txt"), "x").unwrap();

        let tree = FsArtifactTree::open(dir.path(), &WatchConfig::default()).unwrap();
        let b = tree.container("/a/b").unwrap();
        assert_eq!(b.name(), "b");
        assert_eq!(b.enclosing_container().unwrap().path(), "/a");
        assert!(tree.container("/a/file.txt").is_none());
        assert!(tree.root().entry("/a/file.txt").is_some());
        assert!(tree.root().entry("/missing").is_none());
        assert!(!tree.notifier().is_watching());
    }

    struct Ignore;

    impl ArtifactListener for Ignore {
        fn notify_entry_change(
            &self,
            _: &ArtifactNotification,
            _: &ArtifactNotification,
            _: &ArtifactNotification,
        ) {
        }
    }

    #[test]
    fn test_dropped_tree_releases_watcher() {
        use crate::interpreted::{InterpretedTree, Notification, PatternRoots};

        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("shop.war/WEB-INF")).unwrap();

        let artifacts = FsArtifactTree::open(dir.path(), &WatchConfig::default()).unwrap();
        let tree = InterpretedTree::new(
            artifacts.root(),
            Arc::new(PatternRoots::new(["*.war"]).unwrap()),
        );
        let war = tree.container("/shop.war").unwrap();
        war.adapt_notifier()
            .register_for_notifications(
                &Notification::new(war.clone(), ["/"]),
                Arc::new(|_: &Notification, _: &Notification, _: &Notification| {}),
            )
            .unwrap();
        assert!(artifacts.notifier().is_watching());
        assert_eq!(artifacts.notifier().listener_count(), 1);

        let inner = Arc::downgrade(&artifacts.inner);
        let notifier = Arc::downgrade(&artifacts.inner.notifier);
        drop(war);
        drop(tree);
        drop(artifacts);

        assert!(inner.upgrade().is_none());
        assert!(notifier.upgrade().is_none());
    }

    #[test]
    fn test_register_after_stop_is_closed() {
        let dir = TempDir::new().unwrap();
        let tree = FsArtifactTree::open(dir.path(), &WatchConfig::default()).unwrap();
        let listener: Arc<dyn ArtifactListener> = Arc::new(Ignore);
        let request = ArtifactNotification::new(tree.root(), ["/"]);

        assert!(tree.notifier().register_for_notifications(&request, Arc::clone(&listener)).unwrap());
        tree.stop();
        assert!(!tree.notifier().is_watching());

        let err = tree
            .notifier()
            .register_for_notifications(&request, listener)
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Closed));
        assert!(!tree.notifier().is_watching());
    }
}
