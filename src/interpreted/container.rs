//! Interpreted containers and the tree that owns their shared state.

use std::fmt;
use std::sync::Arc;

use super::{InterpretedNotifier, NotifierRegistry, StructureHelper, resolve_root};
use crate::artifact::{self, ArtifactContainer};
use crate::paths;

/// State shared by every container of one interpreted tree.
pub(crate) struct TreeShared {
    pub(crate) artifact_root: Arc<dyn ArtifactContainer>,
    pub(crate) helper: Arc<dyn StructureHelper>,
    pub(crate) registry: NotifierRegistry,
}

/// Entry point to an interpreted view over an artifact tree.
#[derive(Clone)]
pub struct InterpretedTree {
    shared: Arc<TreeShared>,
}

impl InterpretedTree {
    /// Interpret the artifact tree containing `artifact` with `helper`.
    pub fn new(artifact: Arc<dyn ArtifactContainer>, helper: Arc<dyn StructureHelper>) -> Self {
        Self {
            shared: Arc::new(TreeShared {
                artifact_root: artifact.root(),
                helper,
                registry: NotifierRegistry::new(),
            }),
        }
    }

    /// The container over the artifact root.
    pub fn root(&self) -> InterpretedContainer {
        let root = Arc::clone(&self.shared.artifact_root);
        InterpretedContainer {
            shared: Arc::clone(&self.shared),
            artifact: Arc::clone(&root),
            root,
        }
    }

    /// The container at an absolute artifact path, whatever root it falls under.
    pub fn container(&self, artifact_path: &str) -> Option<InterpretedContainer> {
        let artifact = artifact::container_at(&self.shared.artifact_root, artifact_path)?;
        Some(self.wrap(artifact))
    }

    /// Interpret an artifact container of this tree.
    pub fn wrap(&self, artifact: Arc<dyn ArtifactContainer>) -> InterpretedContainer {
        InterpretedContainer::new(Arc::clone(&self.shared), artifact)
    }

    pub fn registry(&self) -> &NotifierRegistry {
        &self.shared.registry
    }
}

/// A container seen through the interpreted tree.
///
/// Cheap to clone. Its path is relative to its logical root.
#[derive(Clone)]
pub struct InterpretedContainer {
    pub(crate) shared: Arc<TreeShared>,
    artifact: Arc<dyn ArtifactContainer>,
    root: Arc<dyn ArtifactContainer>,
}

impl InterpretedContainer {
    pub(crate) fn new(shared: Arc<TreeShared>, artifact: Arc<dyn ArtifactContainer>) -> Self {
        let root = resolve_root(&artifact, shared.helper.as_ref());
        Self {
            shared,
            artifact,
            root,
        }
    }

    /// Container for a logical root whose artifact container is known.
    pub(crate) fn for_root(shared: Arc<TreeShared>, root: Arc<dyn ArtifactContainer>) -> Self {
        Self {
            shared,
            artifact: Arc::clone(&root),
            root,
        }
    }

    /// Path relative to the logical root; `/` for the root itself.
    pub fn path(&self) -> String {
        paths::relativize(self.root.path(), self.artifact.path())
            .unwrap_or_else(|| paths::ROOT.to_string())
    }

    pub fn name(&self) -> &str {
        self.artifact.name()
    }

    /// Whether this container is a logical root.
    pub fn is_root(&self) -> bool {
        self.artifact.path() == self.root.path()
    }

    /// Absolute artifact path of this container's logical root.
    pub fn root_path(&self) -> &str {
        self.root.path()
    }

    pub fn root(&self) -> InterpretedContainer {
        Self::for_root(Arc::clone(&self.shared), Arc::clone(&self.root))
    }

    /// Parent container. A nested root's parent lives in the enclosing root.
    pub fn enclosing_container(&self) -> Option<InterpretedContainer> {
        let parent = self.artifact.enclosing_container()?;
        Some(Self::new(Arc::clone(&self.shared), parent))
    }

    /// Container at `path` within this container's logical root.
    ///
    /// A path starting with `/` is root-relative, any other path is relative
    /// to this container. Paths that descend into a nested root resolve to
    /// nothing; the nested root's mount point itself resolves to that root.
    pub fn container(&self, path: &str) -> Option<InterpretedContainer> {
        let path = if path.starts_with(paths::SEPARATOR) {
            paths::normalize(path)
        } else {
            paths::join(&self.path(), path)
        };
        if !self.shared.helper.is_valid(self.root.as_ref(), &path) {
            return None;
        }
        let artifact = artifact::container_at(&self.root, &path)?;
        Some(Self::new(Arc::clone(&self.shared), artifact))
    }

    pub fn artifact(&self) -> &Arc<dyn ArtifactContainer> {
        &self.artifact
    }

    pub fn root_artifact(&self) -> &Arc<dyn ArtifactContainer> {
        &self.root
    }

    /// The notifier for this container's logical root.
    ///
    /// Every container under the same root gets the same instance.
    pub fn adapt_notifier(&self) -> Arc<InterpretedNotifier> {
        self.shared.registry.notifier_for(&self.shared, &self.root)
    }

    /// Whether both containers come from the same interpreted tree.
    pub fn same_tree(&self, other: &InterpretedContainer) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for InterpretedContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpretedContainer")
            .field("root", &self.root.path())
            .field("path", &self.path())
            .finish()
    }
}
