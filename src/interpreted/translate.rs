//! Path translation between a logical root and its artifact tree.
//!
//! Registration paths travel down (root-relative to artifact-absolute),
//! change paths travel up (artifact-absolute to root-relative). Going up,
//! any change below a nested root is reported as a change to the nested
//! root's mount point, so a logical root never sees another root's content.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::StructureHelper;
use crate::artifact::{self, ArtifactContainer};
use crate::paths;

/// Translates paths for one logical root.
pub struct PathTranslator<'a> {
    root: &'a Arc<dyn ArtifactContainer>,
    helper: &'a dyn StructureHelper,
}

impl<'a> PathTranslator<'a> {
    /// `root` is the artifact container the logical root sits on.
    pub fn new(root: &'a Arc<dyn ArtifactContainer>, helper: &'a dyn StructureHelper) -> Self {
        Self { root, helper }
    }

    /// Map a root-relative registration path to the artifact path.
    ///
    /// The `!` marker stays in front: `!/c` under `/a/b` becomes `!/a/b/c`.
    pub fn to_artifact(&self, path: &str) -> String {
        let (non_recursive, path) = paths::split_marker(path);
        let full = paths::join(self.root.path(), path);
        if non_recursive {
            format!("{}{full}", paths::NON_RECURSIVE_MARKER)
        } else {
            full
        }
    }

    /// Map a raw artifact change path to the root-relative path reported to
    /// listeners, or `None` when the change lies outside this root.
    pub fn to_interpreted(&self, raw: &str) -> Option<String> {
        // Markers describe registrations; a delivered path never carries one
        let (_, raw) = paths::split_marker(raw);
        let relative = paths::relativize(self.root.path(), &paths::normalize(raw))?;
        Some(self.collapse(relative))
    }

    /// Translate a whole path set, merging paths that meet at the same
    /// logical path.
    pub fn translate_set(&self, raw: &BTreeSet<String>) -> BTreeSet<String> {
        raw.iter().filter_map(|p| self.to_interpreted(p)).collect()
    }

    /// Cut `relative` back to the first nested root it passes through.
    fn collapse(&self, relative: String) -> String {
        let prefixes = paths::proper_prefixes(&relative);
        for (idx, prefix) in prefixes.iter().enumerate() {
            let boundary = match artifact::container_at(self.root, prefix) {
                Some(container) => self.helper.is_root(container.as_ref()),
                // Gone from the tree (removed along with its content), so
                // ask whether the next step down is still inside this root
                None => {
                    let next = prefixes.get(idx + 1).unwrap_or(&relative);
                    !self.helper.is_valid(self.root.as_ref(), next)
                }
            };
            if boundary {
                return prefix.clone();
            }
        }
        relative
    }
}
