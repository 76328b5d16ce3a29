//! Frozen module resolution.
//!
//! Only two specifier shapes are resolved: relative (`./x`, `../x`) and
//! package-scoped (`@scope/name[/subpath]`). The candidate order is fixed and no
//! `tsconfig` paths, `exports` maps or `node_modules` lookups take part.

use fence_workspace::{Package, RepoPath, WorkspaceIndex};
use serde::{Deserialize, Serialize};

/// Suffixes tried, in order, after the specifier itself
const CANDIDATE_SUFFIXES: &[&str] = &[".ts", ".tsx", "/index.ts", "/index.tsx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// Relative specifier resolved to an existing file
    Relative,
    /// Package-scoped specifier resolved to a file of a workspace package
    Workspace,
    /// Outside the analyzed workspace
    External,
    /// Targets a reserved segment of a package
    Forbidden,
    /// No candidate file exists
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub path: Option<RepoPath>,
    pub kind: ResolutionKind,
}

impl ResolvedTarget {
    fn found(path: RepoPath, kind: ResolutionKind) -> Self {
        Self {
            path: Some(path),
            kind,
        }
    }

    fn bare(kind: ResolutionKind) -> Self {
        Self { path: None, kind }
    }

    /// Resolved to a file the analysis knows about
    pub fn is_local(&self) -> bool {
        matches!(self.kind, ResolutionKind::Relative | ResolutionKind::Workspace)
    }
}

pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Resolve `specifier` as written in `from`.
///
/// Total: every input maps to exactly one [`ResolutionKind`].
pub fn resolve(from: &RepoPath, specifier: &str, index: &WorkspaceIndex<'_>) -> ResolvedTarget {
    if is_relative_specifier(specifier) {
        resolve_relative(from, specifier, index)
    } else if specifier.starts_with('@') {
        resolve_scoped(specifier, index)
    } else {
        ResolvedTarget::bare(ResolutionKind::External)
    }
}

fn resolve_relative(from: &RepoPath, specifier: &str, index: &WorkspaceIndex<'_>) -> ResolvedTarget {
    let Some(hit) = from
        .sibling(specifier)
        .and_then(|base| find_candidate(base.as_str(), index))
    else {
        return ResolvedTarget::bare(ResolutionKind::Unresolved);
    };

    let owner = index.package_of(from).map(|pkg| pkg.name.as_str());
    let forbidden = index
        .packages()
        .iter()
        .filter(|pkg| Some(pkg.name.as_str()) != owner)
        .any(|pkg| index.is_private_to(pkg, &hit));

    let kind = if forbidden {
        ResolutionKind::Forbidden
    } else {
        ResolutionKind::Relative
    };
    log::trace!("{from}: '{specifier}' -> {hit} ({kind:?})");
    ResolvedTarget::found(hit, kind)
}

fn resolve_scoped(specifier: &str, index: &WorkspaceIndex<'_>) -> ResolvedTarget {
    let mut parts = specifier.splitn(3, '/');
    let (Some(scope), Some(name)) = (parts.next(), parts.next()) else {
        return ResolvedTarget::bare(ResolutionKind::External);
    };
    let subpath = parts.next().filter(|rest| !rest.is_empty());

    let package_name = format!("{scope}/{name}");
    let Some(package) = index.package(&package_name) else {
        return ResolvedTarget::bare(ResolutionKind::External);
    };

    match subpath {
        None => match &package.entry {
            Some(entry) => ResolvedTarget::found(entry.clone(), ResolutionKind::Workspace),
            None => ResolvedTarget::bare(ResolutionKind::Unresolved),
        },
        Some(subpath) if targets_reserved(subpath, index) => {
            ResolvedTarget::bare(ResolutionKind::Forbidden)
        }
        Some(subpath) => resolve_subpath(package, subpath, index),
    }
}

/// `<source dir>/<reserved>/<more>`: the reserved name is a directory, not a file stem
fn targets_reserved(subpath: &str, index: &WorkspaceIndex<'_>) -> bool {
    let mut segments = subpath.split('/');
    segments.next() == Some(index.source_dir_name())
        && segments.next().is_some_and(|segment| index.is_reserved(segment))
        && segments.next().is_some_and(|rest| !rest.is_empty())
}

fn resolve_subpath(package: &Package, subpath: &str, index: &WorkspaceIndex<'_>) -> ResolvedTarget {
    package
        .root_dir
        .child(subpath)
        // `@s/a/../b` must not leave the package
        .filter(|base| base.is_inside(&package.root_dir))
        .and_then(|base| find_candidate(base.as_str(), index))
        .map_or_else(
            || ResolvedTarget::bare(ResolutionKind::Unresolved),
            |hit| ResolvedTarget::found(hit, ResolutionKind::Workspace),
        )
}

fn find_candidate(base: &str, index: &WorkspaceIndex<'_>) -> Option<RepoPath> {
    std::iter::once(String::new())
        .chain(CANDIDATE_SUFFIXES.iter().map(|s| s.to_string()))
        .filter_map(|suffix| RepoPath::new(&format!("{base}{suffix}")))
        .find(|candidate| index.exists(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fence_workspace::{SourceTree, WorkspaceOptions};
    use pretty_assertions::assert_eq;

    fn path(raw: &str) -> RepoPath {
        RepoPath::new(raw).unwrap()
    }

    fn fixture() -> SourceTree {
        SourceTree::from_files(
            "test",
            [
                ("packages/a/package.json", r#"{"name":"@s/a"}"#),
                ("packages/a/src/index.ts", "export * from './pub';"),
                ("packages/a/src/pub.ts", ""),
                ("packages/a/src/internal.ts", ""),
                ("packages/a/src/internal/deep.ts", ""),
                ("packages/a/src/widgets/index.tsx", ""),
                ("packages/b/package.json", r#"{"name":"@s/b"}"#),
                ("packages/b/src/use.ts", ""),
                ("packages/b/src/impl/x.ts", ""),
                ("packages/c/package.json", r#"{"name":"@s/c"}"#),
            ]
            .into_iter()
            .map(|(p, c)| (p, Some(c))),
        )
    }

    fn check(from: &str, specifier: &str) -> ResolvedTarget {
        let tree = fixture();
        let index = WorkspaceIndex::discover(&tree, &WorkspaceOptions::default()).unwrap();
        resolve(&path(from), specifier, &index)
    }

    #[test]
    fn relative_candidates_in_fixed_order() {
        assert_eq!(
            check("packages/a/src/index.ts", "./pub"),
            ResolvedTarget::found(path("packages/a/src/pub.ts"), ResolutionKind::Relative)
        );
        assert_eq!(
            check("packages/a/src/index.ts", "./widgets"),
            ResolvedTarget::found(path("packages/a/src/widgets/index.tsx"), ResolutionKind::Relative)
        );
        // `internal.ts` wins over `internal/index.ts` candidates
        assert_eq!(
            check("packages/a/src/index.ts", "./internal"),
            ResolvedTarget::found(path("packages/a/src/internal.ts"), ResolutionKind::Relative)
        );
        assert_eq!(
            check("packages/a/src/index.ts", "./missing"),
            ResolvedTarget::bare(ResolutionKind::Unresolved)
        );
        assert_eq!(
            check("packages/a/src/index.ts", "../../../../escape"),
            ResolvedTarget::bare(ResolutionKind::Unresolved)
        );
    }

    #[test]
    fn relative_into_reserved_segment_of_other_package_is_forbidden() {
        assert_eq!(
            check("packages/b/src/use.ts", "../../a/src/internal/deep"),
            ResolvedTarget::found(path("packages/a/src/internal/deep.ts"), ResolutionKind::Forbidden)
        );
        // own package's reserved files are fine
        assert_eq!(
            check("packages/b/src/use.ts", "./impl/x"),
            ResolvedTarget::found(path("packages/b/src/impl/x.ts"), ResolutionKind::Relative)
        );
        // a file named like a reserved segment is not under one
        assert_eq!(
            check("packages/b/src/use.ts", "../../a/src/internal"),
            ResolvedTarget::found(path("packages/a/src/internal.ts"), ResolutionKind::Relative)
        );
    }

    #[test]
    fn scoped_specifiers() {
        assert_eq!(
            check("packages/b/src/use.ts", "@s/a"),
            ResolvedTarget::found(path("packages/a/src/index.ts"), ResolutionKind::Workspace)
        );
        assert_eq!(
            check("packages/b/src/use.ts", "@s/a/src/pub"),
            ResolvedTarget::found(path("packages/a/src/pub.ts"), ResolutionKind::Workspace)
        );
        assert_eq!(
            check("packages/b/src/use.ts", "@s/a/src/internal/deep"),
            ResolvedTarget::bare(ResolutionKind::Forbidden)
        );
        assert_eq!(
            check("packages/b/src/use.ts", "@s/a/src/nope"),
            ResolvedTarget::bare(ResolutionKind::Unresolved)
        );
        assert_eq!(
            check("packages/b/src/use.ts", "@s/c"),
            ResolvedTarget::bare(ResolutionKind::Unresolved)
        );
        assert_eq!(
            check("packages/b/src/use.ts", "@s/a/../b/src/use"),
            ResolvedTarget::bare(ResolutionKind::Unresolved)
        );
        assert_eq!(
            check("packages/b/src/use.ts", "@other/pkg"),
            ResolvedTarget::bare(ResolutionKind::External)
        );
        assert_eq!(
            check("packages/b/src/use.ts", "@"),
            ResolvedTarget::bare(ResolutionKind::External)
        );
    }

    #[test]
    fn scoped_file_named_like_reserved_segment_resolves() {
        assert_eq!(
            check("packages/b/src/use.ts", "@s/a/src/internal"),
            ResolvedTarget::found(path("packages/a/src/internal.ts"), ResolutionKind::Workspace)
        );
        assert_eq!(
            check("packages/b/src/use.ts", "@s/a/src/internal/deep"),
            ResolvedTarget::bare(ResolutionKind::Forbidden)
        );
    }

    #[test]
    fn bare_specifiers_are_external() {
        assert_eq!(
            check("packages/b/src/use.ts", "react"),
            ResolvedTarget::bare(ResolutionKind::External)
        );
        assert_eq!(
            check("packages/b/src/use.ts", "node:fs"),
            ResolvedTarget::bare(ResolutionKind::External)
        );
    }
}
