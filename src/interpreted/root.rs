//! Root resolution: the logical root enclosing an artifact container.

use std::sync::Arc;

use super::StructureHelper;
use crate::artifact::ArtifactContainer;

/// Find the logical root for `container`.
///
/// Walks from `container` towards the artifact root and returns the first
/// container the helper flags as a root; a flagged container is its own
/// root. Without any flagged container the artifact root is the answer.
pub fn resolve_root(
    container: &Arc<dyn ArtifactContainer>,
    helper: &dyn StructureHelper,
) -> Arc<dyn ArtifactContainer> {
    let mut current = Arc::clone(container);
    loop {
        if current.is_root() || helper.is_root(current.as_ref()) {
            return current;
        }
        match current.enclosing_container() {
            Some(parent) => current = parent,
            None => return current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::memory::MemoryArtifactTree;
    use crate::interpreted::ExplicitRoots;

    fn root_of(tree: &MemoryArtifactTree, helper: &ExplicitRoots, path: &str) -> String {
        let container = tree.container(path).unwrap();
        resolve_root(&container, helper).path().to_string()
    }

    #[test]
    fn test_resolves_innermost_flagged_root() {
        let tree = MemoryArtifactTree::with_containers(["/a/b/c/d/e", "/a/b/n"]);
        let helper = ExplicitRoots::new(["/a/b", "/a/b/c/d"]);

        assert_eq!(root_of(&tree, &helper, "/a/b"), "/a/b");
        assert_eq!(root_of(&tree, &helper, "/a/b/n"), "/a/b");
        assert_eq!(root_of(&tree, &helper, "/a/b/c"), "/a/b");
        assert_eq!(root_of(&tree, &helper, "/a/b/c/d"), "/a/b/c/d");
        assert_eq!(root_of(&tree, &helper, "/a/b/c/d/e"), "/a/b/c/d");
    }

    #[test]
    fn test_falls_back_to_artifact_root() {
        let tree = MemoryArtifactTree::with_containers(["/a/b"]);
        let helper = ExplicitRoots::default();

        assert_eq!(root_of(&tree, &helper, "/a/b"), "/");
        assert_eq!(root_of(&tree, &helper, "/a"), "/");
        assert_eq!(root_of(&tree, &helper, "/"), "/");
    }
}
