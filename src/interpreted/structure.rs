//! Structure helpers: which artifact containers start a new logical root.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::artifact::ArtifactContainer;
use crate::config::StructureConfig;
use crate::paths;

/// Decides where logical roots begin inside an artifact tree.
///
/// Implementations must be pure: the same container and path always give
/// the same answer. Helpers are shared across threads and never mutated.
pub trait StructureHelper: Send + Sync {
    /// Whether `container` starts a new logical root.
    fn is_root(&self, container: &dyn ArtifactContainer) -> bool;

    /// Whether `path` (relative to `container`) can be reached from
    /// `container` without passing through a nested root.
    ///
    /// Reaching a nested root's own mount point is valid; reaching anything
    /// below it is not.
    fn is_valid(&self, container: &dyn ArtifactContainer, path: &str) -> bool;
}

/// Roots named by absolute artifact path.
#[derive(Debug, Clone, Default)]
pub struct ExplicitRoots {
    roots: BTreeSet<String>,
}

impl ExplicitRoots {
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            roots: roots
                .into_iter()
                .map(|r| paths::normalize(r.as_ref()))
                .collect(),
        }
    }

    pub fn roots(&self) -> &BTreeSet<String> {
        &self.roots
    }
}

impl StructureHelper for ExplicitRoots {
    fn is_root(&self, container: &dyn ArtifactContainer) -> bool {
        self.roots.contains(container.path())
    }

    fn is_valid(&self, container: &dyn ArtifactContainer, path: &str) -> bool {
        let base = container.path();
        let full = paths::join(base, path);
        !self.roots.iter().any(|root| {
            root != base
                && paths::is_within(base, root)
                && root != &full
                && paths::is_within(root, &full)
        })
    }
}

/// Roots recognised by container name, e.g. `*.war`.
#[derive(Debug, Clone, Default)]
pub struct PatternRoots {
    patterns: Vec<glob::Pattern>,
}

impl PatternRoots {
    pub fn new<I, S>(patterns: I) -> Result<Self, glob::PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| glob::Pattern::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    fn matches(&self, name: &str) -> bool {
        !name.is_empty() && self.patterns.iter().any(|p| p.matches(name))
    }
}

impl StructureHelper for PatternRoots {
    fn is_root(&self, container: &dyn ArtifactContainer) -> bool {
        !container.is_root() && self.matches(container.name())
    }

    fn is_valid(&self, _container: &dyn ArtifactContainer, path: &str) -> bool {
        let segments: Vec<&str> = paths::segments(path).collect();
        let Some((_, intermediate)) = segments.split_last() else {
            return true;
        };
        !intermediate.iter().any(|s| self.matches(s))
    }
}

/// Several helpers combined: a root if any says so, valid only if all agree.
#[derive(Clone, Default)]
pub struct StructureHelpers {
    helpers: Vec<Arc<dyn StructureHelper>>,
}

impl StructureHelpers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, helper: impl StructureHelper + 'static) -> Self {
        self.helpers.push(Arc::new(helper));
        self
    }

    /// Helpers described by the `[structure]` settings section.
    pub fn from_config(config: &StructureConfig) -> Result<Self, glob::PatternError> {
        let mut helpers = Self::new();
        if !config.root_patterns.is_empty() {
            helpers = helpers.with(PatternRoots::new(&config.root_patterns)?);
        }
        if !config.root_paths.is_empty() {
            helpers = helpers.with(ExplicitRoots::new(&config.root_paths));
        }
        Ok(helpers)
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }
}

impl StructureHelper for StructureHelpers {
    fn is_root(&self, container: &dyn ArtifactContainer) -> bool {
        self.helpers.iter().any(|h| h.is_root(container))
    }

    fn is_valid(&self, container: &dyn ArtifactContainer, path: &str) -> bool {
        self.helpers.iter().all(|h| h.is_valid(container, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::memory::MemoryArtifactTree;

    #[test]
    fn test_explicit_roots() {
        let tree = MemoryArtifactTree::with_containers(["/a/b/c/d/e"]);
        let helper = ExplicitRoots::new(["/a/b", "/a/b/c/d/"]);
        let b = tree.container("/a/b").unwrap();

        assert!(helper.is_root(b.as_ref()));
        assert!(helper.is_root(tree.container("/a/b/c/d").unwrap().as_ref()));
        assert!(!helper.is_root(tree.container("/a/b/c").unwrap().as_ref()));

        assert!(helper.is_valid(b.as_ref(), "/c"));
        // The mount point itself is reachable, its content is not
        assert!(helper.is_valid(b.as_ref(), "/c/d"));
        assert!(!helper.is_valid(b.as_ref(), "/c/d/e"));
        // The container's own root does not block traversal
        assert!(helper.is_valid(tree.root().as_ref(), "/a/b"));
        assert!(!helper.is_valid(tree.root().as_ref(), "/a/b/c"));
    }

    #[test]
    fn test_pattern_roots() {
        let tree = MemoryArtifactTree::with_containers(["/apps/shop.war/WEB-INF/lib/util.jar/x"]);
        let helper = PatternRoots::new(["*.war", "*.jar"]).unwrap();

        let war = tree.container("/apps/shop.war").unwrap();
        assert!(helper.is_root(war.as_ref()));
        assert!(!helper.is_root(tree.container("/apps").unwrap().as_ref()));
        assert!(!helper.is_root(tree.root().as_ref()));

        assert!(helper.is_valid(war.as_ref(), "/WEB-INF/lib/util.jar"));
        assert!(!helper.is_valid(war.as_ref(), "/WEB-INF/lib/util.jar/x"));
        assert!(helper.is_valid(war.as_ref(), "/"));
    }

    #[test]
    fn test_pattern_roots_rejects_bad_glob() {
        assert!(PatternRoots::new(["[unclosed"]).is_err());
    }

    #[test]
    fn test_combined_helpers() {
        let tree = MemoryArtifactTree::with_containers(["/a/lib.jar", "/a/special/x"]);
        let helpers = StructureHelpers::new()
            .with(PatternRoots::new(["*.jar"]).unwrap())
            .with(ExplicitRoots::new(["/a/special"]));

        assert!(helpers.is_root(tree.container("/a/lib.jar").unwrap().as_ref()));
        assert!(helpers.is_root(tree.container("/a/special").unwrap().as_ref()));
        assert!(!helpers.is_root(tree.container("/a").unwrap().as_ref()));
        assert!(!helpers.is_valid(tree.root().as_ref(), "/a/special/x"));
        assert!(helpers.is_valid(tree.root().as_ref(), "/a/special"));
    }

    #[test]
    fn test_helpers_from_config() {
        let config = StructureConfig {
            root_patterns: vec!["*.war".to_string()],
            root_paths: vec!["/fixed".to_string()],
        };
        let helpers = StructureHelpers::from_config(&config).unwrap();
        assert_eq!(helpers.len(), 2);

        let empty = StructureConfig {
            root_patterns: Vec::new(),
            root_paths: Vec::new(),
        };
        assert!(StructureHelpers::from_config(&empty).unwrap().is_empty());
    }
}
