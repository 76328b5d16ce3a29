//! Canonical repository paths.
//!
//! A [`RepoPath`] is the identity of a file for the whole analysis: relative to the
//! repository root, `/`-separated, with `.` and `..` collapsed. Two spellings of the
//! same file always produce the same `RepoPath`.

use fence_protocol::ordering::canonical_cmp;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Component, Path};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoPath(String);

impl RepoPath {
    /// Normalize a repo-relative path. Returns `None` for the root itself and for
    /// paths whose `..` segments climb above the root.
    pub fn new(raw: &str) -> Option<Self> {
        normalize(raw).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory part, `""` for files at the repository root.
    #[must_use]
    pub fn parent(&self) -> &str {
        self.0.rsplit_once('/').map_or("", |(dir, _)| dir)
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, name)| name)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Lexically resolve `relative` against this path's directory.
    pub fn sibling(&self, relative: &str) -> Option<RepoPath> {
        join(self.parent(), relative)
    }

    /// Resolve `relative` with this path taken as a directory.
    pub fn child(&self, relative: &str) -> Option<RepoPath> {
        join(&self.0, relative)
    }

    /// Remainder of `self` below directory `dir`, if `self` lies inside it.
    pub fn strip_dir(&self, dir: &RepoPath) -> Option<&str> {
        self.0
            .strip_prefix(dir.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
    }

    #[must_use]
    pub fn is_inside(&self, dir: &RepoPath) -> bool {
        self.strip_dir(dir).is_some()
    }
}

impl Ord for RepoPath {
    fn cmp(&self, other: &Self) -> Ordering {
        canonical_cmp(&self.0, &other.0)
    }
}

impl PartialOrd for RepoPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepoPath {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        RepoPath::new(&raw).ok_or(raw)
    }
}

impl From<RepoPath> for String {
    fn from(path: RepoPath) -> Self {
        path.0
    }
}

/// Map an absolute filesystem path to its repository identity.
///
/// Purely lexical: symlinks are not followed, the path need not exist.
pub fn canonicalize(root: &Path, absolute: &Path) -> Option<RepoPath> {
    let relative = absolute.strip_prefix(root).ok()?;
    let mut segments: Vec<String> = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => segments.push(name.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                segments.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    RepoPath::new(&segments.join("/"))
}

/// Join a directory (`""` for the root) and a relative path, collapsing dot segments.
pub fn join(dir: &str, relative: &str) -> Option<RepoPath> {
    if dir.is_empty() {
        RepoPath::new(relative)
    } else {
        RepoPath::new(&format!("{dir}/{relative}"))
    }
}

fn normalize(raw: &str) -> Option<String> {
    let raw = raw.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn path(raw: &str) -> RepoPath {
        RepoPath::new(raw).unwrap()
    }

    #[test]
    fn collapses_dot_segments_and_backslashes() {
        assert_eq!(path("./packages/a/./src/../src/x.ts").as_str(), "packages/a/src/x.ts");
        assert_eq!(path("packages\\a\\src\\x.ts").as_str(), "packages/a/src/x.ts");
        assert_eq!(path("packages//a/").as_str(), "packages/a");
    }

    #[test]
    fn rejects_escape_and_root() {
        assert!(RepoPath::new("../outside.ts").is_none());
        assert!(RepoPath::new("a/../../b").is_none());
        assert!(RepoPath::new(".").is_none());
        assert!(RepoPath::new("").is_none());
    }

    #[test]
    fn canonicalizes_absolute_paths() {
        let root = PathBuf::from("/repo");
        assert_eq!(
            canonicalize(&root, Path::new("/repo/packages/a/src/./x.ts")),
            Some(path("packages/a/src/x.ts"))
        );
        assert_eq!(canonicalize(&root, Path::new("/elsewhere/x.ts")), None);
        assert_eq!(canonicalize(&root, Path::new("/repo")), None);
    }

    #[test]
    fn sibling_and_child_resolution() {
        let file = path("packages/b/src/use.ts");
        assert_eq!(file.parent(), "packages/b/src");
        assert_eq!(file.file_name(), "use.ts");
        assert_eq!(
            file.sibling("../../a/src/internal"),
            Some(path("packages/a/src/internal"))
        );
        assert_eq!(file.sibling("../../../../../x"), None);
        assert_eq!(path("packages/a").child("src/index.ts"), Some(path("packages/a/src/index.ts")));
        assert_eq!(path("root.ts").parent(), "");
    }

    #[test]
    fn strip_dir_requires_segment_boundary() {
        let dir = path("packages/a");
        assert_eq!(path("packages/a/src/x.ts").strip_dir(&dir), Some("src/x.ts"));
        assert_eq!(path("packages/ab/src/x.ts").strip_dir(&dir), None);
        assert_eq!(path("packages/a").strip_dir(&dir), None);
    }
}
