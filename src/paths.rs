//! Helpers for the `/`-separated path convention shared by both layers.
//!
//! Every path is absolute within its tree: `/` is the root itself, `/a/b`
//! names the entry `b` inside `a`. A leading `!` marks a non-recursive
//! registration and is never part of an entry's own path.

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// The path of a root container.
pub const ROOT: &str = "/";

/// Prefix marking a non-recursive registration.
pub const NON_RECURSIVE_MARKER: char = '!';

/// Split a leading `!` off a registration path.
///
/// Returns `(true, rest)` when the marker was present.
pub fn split_marker(path: &str) -> (bool, &str) {
    match path.strip_prefix(NON_RECURSIVE_MARKER) {
        Some(rest) => (true, rest),
        None => (false, path),
    }
}

/// Normalize a path to the absolute form: leading `/`, no trailing `/`,
/// no empty segments.
pub fn normalize(path: &str) -> String {
    let segments: Vec<&str> = segments(path).collect();
    if segments.is_empty() {
        return ROOT.to_string();
    }
    let mut out = String::with_capacity(path.len() + 1);
    for segment in segments {
        out.push(SEPARATOR);
        out.push_str(segment);
    }
    out
}

/// Iterate over the non-empty segments of a path.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}

/// Join a child path below `base`. Both are treated as absolute paths.
pub fn join(base: &str, child: &str) -> String {
    if base == ROOT {
        return normalize(child);
    }
    let child = normalize(child);
    if child == ROOT {
        normalize(base)
    } else {
        format!("{}{child}", normalize(base))
    }
}

/// Parent path of `path`, or `None` for the root.
pub fn parent(path: &str) -> Option<String> {
    let path = normalize(path);
    if path == ROOT {
        return None;
    }
    match path.rfind(SEPARATOR) {
        Some(0) => Some(ROOT.to_string()),
        Some(idx) => Some(path[..idx].to_string()),
        None => None,
    }
}

/// Last segment of `path`; the root is named by an empty string.
pub fn name(path: &str) -> &str {
    path.rsplit(SEPARATOR).find(|s| !s.is_empty()).unwrap_or("")
}

/// Strip `root` off `path`, yielding the root-relative form.
///
/// `path == root` yields `/`. Paths outside `root` yield `None`; a sibling
/// that only shares a name prefix (`/a/bc` under `/a/b`) is outside.
pub fn relativize(root: &str, path: &str) -> Option<String> {
    if root == ROOT {
        return Some(normalize(path));
    }
    if path == root {
        return Some(ROOT.to_string());
    }
    let rest = path.strip_prefix(root)?;
    if rest.starts_with(SEPARATOR) {
        Some(normalize(rest))
    } else {
        None
    }
}

/// Proper prefixes of `path`, shortest first (`/a/b/c` → `/a`, `/a/b`).
pub fn proper_prefixes(path: &str) -> Vec<String> {
    let segments: Vec<&str> = segments(path).collect();
    let mut prefixes = Vec::with_capacity(segments.len().saturating_sub(1));
    let mut current = String::new();
    for segment in segments.iter().take(segments.len().saturating_sub(1)) {
        current.push(SEPARATOR);
        current.push_str(segment);
        prefixes.push(current.clone());
    }
    prefixes
}

/// Whether `path` is `ancestor` itself or lies below it.
pub fn is_within(ancestor: &str, path: &str) -> bool {
    relativize(ancestor, path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("a/b/"), "/a/b");
        assert_eq!(normalize("//a//b"), "/a/b");
    }

    #[test]
    fn test_join_and_parent() {
        assert_eq!(join("/", "/c"), "/c");
        assert_eq!(join("/a/b", "/c"), "/a/b/c");
        assert_eq!(join("/a/b", "/"), "/a/b");
        assert_eq!(parent("/a/b"), Some("/a".to_string()));
        assert_eq!(parent("/a"), Some("/".to_string()));
        assert_eq!(parent("/"), None);
        assert_eq!(name("/a/b"), "b");
        assert_eq!(name("/"), "");
    }

    #[test]
    fn test_relativize() {
        assert_eq!(relativize("/a/b", "/a/b"), Some("/".to_string()));
        assert_eq!(relativize("/a/b", "/a/b/c/d"), Some("/c/d".to_string()));
        assert_eq!(relativize("/", "/a"), Some("/a".to_string()));
        assert_eq!(relativize("/a/b", "/a/bc"), None);
        assert_eq!(relativize("/a/b", "/x"), None);
    }

    #[test]
    fn test_proper_prefixes() {
        assert_eq!(proper_prefixes("/c/d/e"), vec!["/c", "/c/d"]);
        assert!(proper_prefixes("/c").is_empty());
        assert!(proper_prefixes("/").is_empty());
    }

    #[test]
    fn test_split_marker() {
        assert_eq!(split_marker("!/c"), (true, "/c"));
        assert_eq!(split_marker("/c"), (false, "/c"));
    }
}
