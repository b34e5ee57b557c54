//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod init;
pub mod translate;
pub mod watch;

use anyhow::Context;
use serde::Serialize;

use super::args::RootArgs;
use crate::config::{Settings, StructureConfig};
use crate::interpreted::{Notification, StructureHelpers};

/// One translated change triple as printed by the CLI.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChangeRecord {
    /// Artifact path of the logical root the paths are relative to
    pub root: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

impl ChangeRecord {
    pub fn from_triple(added: &Notification, removed: &Notification, modified: &Notification) -> Self {
        Self {
            root: added.container().root_path().to_string(),
            added: added.paths().iter().cloned().collect(),
            removed: removed.paths().iter().cloned().collect(),
            modified: modified.paths().iter().cloned().collect(),
        }
    }
}

/// Structure helpers from settings, with CLI roots layered on top.
///
/// Patterns given on the command line replace the configured ones; explicit
/// roots are added to the configured ones.
pub fn structure_helpers(settings: &Settings, args: &RootArgs) -> anyhow::Result<StructureHelpers> {
    let mut config: StructureConfig = settings.structure.clone();
    if !args.root_patterns.is_empty() {
        config.root_patterns = args.root_patterns.clone();
    }
    config.root_paths.extend(args.roots.iter().cloned());

    StructureHelpers::from_config(&config).context("invalid root pattern")
}
