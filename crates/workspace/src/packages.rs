use crate::error::{Result, WorkspaceError};
use crate::paths::RepoPath;
use crate::tree::{SourceTree, MANIFEST_FILE_NAME};
use fence_protocol::ordering::canonical_cmp;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_SOURCE_DIR: &str = "src";
pub const DEFAULT_RESERVED_SEGMENTS: &[&str] = &["internal", "private", "impl"];
pub const DEFAULT_WORKSPACE_GLOB: &str = "packages/*";
const ENTRY_CANDIDATES: &[&str] = &["index.ts", "index.tsx"];

/// How packages are discovered and which paths are private
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceOptions {
    /// Name of the per-package source directory
    pub source_dir: String,
    /// Path segments that mark a file as private to its package
    pub reserved_segments: Vec<String>,
    /// Package directory globs; `None` reads the root `package.json`
    pub workspaces: Option<Vec<String>>,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            source_dir: DEFAULT_SOURCE_DIR.to_string(),
            reserved_segments: DEFAULT_RESERVED_SEGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            workspaces: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub root_dir: RepoPath,
    pub src_dir: RepoPath,
    /// `src/index.ts` or `src/index.tsx`, when present
    pub entry: Option<RepoPath>,
}

/// Package registry of one source tree.
///
/// Built once per revision and passed by reference to every stage that needs to
/// answer "which package owns this file" or "is this path private".
#[derive(Debug)]
pub struct WorkspaceIndex<'t> {
    tree: &'t SourceTree,
    packages: Vec<Package>,
    by_name: BTreeMap<String, usize>,
    source_dir: String,
    reserved: BTreeSet<String>,
}

impl<'t> WorkspaceIndex<'t> {
    /// Discover the packages of `tree`.
    ///
    /// A package is a directory matched by the workspace globs that contains a
    /// `package.json`. Patterns starting with `!` exclude directories.
    pub fn discover(tree: &'t SourceTree, options: &WorkspaceOptions) -> Result<Self> {
        let patterns = match &options.workspaces {
            Some(patterns) => patterns.clone(),
            None => manifest_workspaces(tree)
                .unwrap_or_else(|| vec![DEFAULT_WORKSPACE_GLOB.to_string()]),
        };
        let (include, exclude) = compile_globs(&patterns)?;

        let mut candidates: Vec<(String, RepoPath)> = Vec::new();
        for path in tree.files() {
            if path.file_name() != MANIFEST_FILE_NAME {
                continue;
            }
            let dir = path.parent();
            if dir.is_empty() || !include.is_match(dir) || exclude.is_match(dir) {
                continue;
            }
            let Some(root_dir) = RepoPath::new(dir) else {
                continue;
            };
            let name = tree
                .read(path)
                .and_then(manifest_name)
                .unwrap_or_else(|| root_dir.file_name().to_string());
            candidates.push((name, root_dir));
        }

        let mut packages: Vec<Package> = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        for (name, root_dir) in candidates {
            if !seen.insert(name.clone()) {
                log::warn!("Duplicate package name '{name}' at {root_dir}; keeping the first");
                continue;
            }
            let Some(src_dir) = root_dir.child(&options.source_dir) else {
                continue;
            };
            let entry = ENTRY_CANDIDATES
                .iter()
                .filter_map(|candidate| src_dir.child(candidate))
                .find(|candidate| tree.contains(candidate));
            packages.push(Package {
                name,
                root_dir,
                src_dir,
                entry,
            });
        }
        packages.sort_by(|a, b| canonical_cmp(&a.name, &b.name));

        let by_name = packages
            .iter()
            .enumerate()
            .map(|(idx, pkg)| (pkg.name.clone(), idx))
            .collect();

        log::debug!("Discovered {} packages in {}", packages.len(), tree.label());
        Ok(Self {
            tree,
            packages,
            by_name,
            source_dir: options.source_dir.clone(),
            reserved: options.reserved_segments.iter().cloned().collect(),
        })
    }

    pub fn tree(&self) -> &'t SourceTree {
        self.tree
    }

    /// Packages sorted by name
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.by_name.get(name).map(|idx| &self.packages[*idx])
    }

    /// Innermost package whose root contains `path`
    pub fn package_of(&self, path: &RepoPath) -> Option<&Package> {
        self.packages
            .iter()
            .filter(|pkg| path.is_inside(&pkg.root_dir))
            .max_by_key(|pkg| pkg.root_dir.as_str().len())
    }

    pub fn exists(&self, path: &RepoPath) -> bool {
        self.tree.contains(path)
    }

    /// Per-package source directory name (`src` by default)
    pub fn source_dir_name(&self) -> &str {
        &self.source_dir
    }

    pub fn is_reserved(&self, segment: &str) -> bool {
        self.reserved.contains(segment)
    }

    /// Whether any segment of a `/`-separated remainder is reserved
    pub fn has_reserved_segment(&self, remainder: &str) -> bool {
        remainder.split('/').any(|segment| self.is_reserved(segment))
    }

    /// `path` lies in `package`'s source dir under a reserved segment
    pub fn is_private_to(&self, package: &Package, path: &RepoPath) -> bool {
        path.strip_dir(&package.src_dir)
            .is_some_and(|rest| self.has_reserved_segment(rest))
    }
}

fn compile_globs(patterns: &[String]) -> Result<(GlobSet, GlobSet)> {
    let mut include = GlobSetBuilder::new();
    let mut exclude = GlobSetBuilder::new();
    for raw in patterns {
        let (target, pattern) = match raw.trim().strip_prefix('!') {
            Some(negated) => (&mut exclude, negated),
            None => (&mut include, raw.trim()),
        };
        let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| WorkspaceError::InvalidGlob {
                pattern: raw.clone(),
                message: e.to_string(),
            })?;
        target.add(glob);
    }

    let build = |builder: GlobSetBuilder| {
        builder.build().map_err(|e| WorkspaceError::InvalidGlob {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })
    };
    Ok((build(include)?, build(exclude)?))
}

/// `workspaces` of the root `package.json`: an array or `{ "packages": [..] }`
fn manifest_workspaces(tree: &SourceTree) -> Option<Vec<String>> {
    let root = RepoPath::new(MANIFEST_FILE_NAME)?;
    let manifest: serde_json::Value = serde_json::from_str(tree.read(&root)?).ok()?;
    let workspaces = manifest.get("workspaces")?;
    let list = match workspaces {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => map.get("packages")?.as_array()?,
        _ => return None,
    };
    let patterns: Vec<String> = list
        .iter()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect();
    (!patterns.is_empty()).then_some(patterns)
}

fn manifest_name(content: &str) -> Option<String> {
    let manifest: serde_json::Value = serde_json::from_str(content).ok()?;
    manifest
        .get("name")?
        .as_str()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
