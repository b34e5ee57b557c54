//! Re-rooted change notifications over interpreted artifact trees.
//!
//! An artifact tree (a directory, an in-memory table) reports raw changes
//! with absolute paths. An interpreted tree splits it into logical roots,
//! such as archive-like directories, and gives each root one notifier that
//! reports changes relative to that root.
//!
//! ```
//! use std::sync::Arc;
//! use adaptable_notify::artifact::memory::MemoryArtifactTree;
//! use adaptable_notify::interpreted::{ExplicitRoots, InterpretedTree, Notification};
//!
//! let artifacts = MemoryArtifactTree::with_containers(["/a/b/n"]);
//! let tree = InterpretedTree::new(artifacts.root(), Arc::new(ExplicitRoots::new(["/a/b"])));
//! let root = tree.container("/a/b").unwrap();
//!
//! let notifier = root.adapt_notifier();
//! notifier
//!     .register_for_notifications(
//!         &Notification::new(root.clone(), ["/"]),
//!         Arc::new(|_: &Notification, _: &Notification, modified: &Notification| {
//!             assert!(modified.paths().contains("/n"));
//!         }),
//!     )
//!     .unwrap();
//!
//! artifacts.notifier().fire_modified(["/a/b/n"]).unwrap();
//! ```

pub mod artifact;
pub mod cli;
pub mod config;
pub mod interpreted;
pub mod logging;
pub mod paths;

pub use config::Settings;
pub use interpreted::{
    InterpretedContainer, InterpretedNotifier, InterpretedTree, Notification,
    NotificationListener, NotifyError, StructureHelper,
};
