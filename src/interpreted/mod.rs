//! The interpreted layer: logical trees carved out of an artifact tree.
//!
//! A [`StructureHelper`] decides which artifact containers start a new
//! logical root (an archive-like directory such as `shop.war`). Every
//! interpreted container sees paths relative to its nearest such root, and
//! change notifications from the artifact layer are re-rooted to match.
//!
//! # Architecture
//!
//! ```text
//! InterpretedContainer ── adapt_notifier() ──> NotifierRegistry (root path -> notifier)
//!        |                                              |
//!   resolve_root()                            InterpretedNotifier
//!                                               |            ^
//!                       register (root-relative -> artifact)  | notify_entry_change
//!                                               v            |
//!                                          ArtifactNotifier --+
//!                                               |
//!                           PathTranslator (strip prefix, collapse nested roots)
//!                                               v
//!                                     NotificationListener(s)
//! ```

mod container;
mod error;
mod notification;
mod notifier;
mod registry;
mod root;
pub mod structure;
mod translate;

pub use container::{InterpretedContainer, InterpretedTree};
pub use error::{NotifyError, NotifyResult};
pub use notification::{Notification, NotificationListener};
pub use notifier::InterpretedNotifier;
pub use registry::NotifierRegistry;
pub use root::resolve_root;
pub use structure::{ExplicitRoots, PatternRoots, StructureHelper, StructureHelpers};
pub use translate::PathTranslator;
