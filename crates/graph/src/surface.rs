use crate::resolver::resolve;
use fence_imports::ReexportNames;
use fence_workspace::{ModuleTable, Package, RepoPath, WorkspaceIndex};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Files of `package` reachable from its entry through re-exports only.
///
/// Files under a reserved segment are neither members nor traversed. Files that
/// could not be read or parsed stay members but contribute no further edges.
pub fn compute_public_surface(
    package: &Package,
    modules: &ModuleTable,
    index: &WorkspaceIndex<'_>,
) -> BTreeSet<RepoPath> {
    let mut surface = BTreeSet::new();
    let Some(entry) = &package.entry else {
        return surface;
    };
    if index.is_private_to(package, entry) {
        return surface;
    }

    let mut queue = VecDeque::new();
    surface.insert(entry.clone());
    queue.push_back(entry.clone());

    while let Some(file) = queue.pop_front() {
        let Some(imports) = modules.imports(&file) else {
            continue;
        };
        for reexport in &imports.reexports {
            let Some(target) = resolve(&file, &reexport.specifier, index).path else {
                continue;
            };
            if !target.is_inside(&package.src_dir) || index.is_private_to(package, &target) {
                continue;
            }
            if surface.insert(target.clone()) {
                queue.push_back(target);
            }
        }
    }

    surface
}

/// Public surfaces of every package in a workspace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicSurfaceMap {
    surfaces: BTreeMap<String, BTreeSet<RepoPath>>,
}

impl PublicSurfaceMap {
    pub fn get(&self, package: &str) -> Option<&BTreeSet<RepoPath>> {
        self.surfaces.get(package)
    }

    pub fn is_public(&self, package: &str, path: &RepoPath) -> bool {
        self.surfaces
            .get(package)
            .is_some_and(|surface| surface.contains(path))
    }

    /// `(package, surface)` pairs sorted by package name
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<RepoPath>)> {
        self.surfaces.iter()
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

pub fn compute_public_surfaces(index: &WorkspaceIndex<'_>, modules: &ModuleTable) -> PublicSurfaceMap {
    let surfaces = index
        .packages()
        .iter()
        .map(|package| {
            let surface = compute_public_surface(package, modules, index);
            log::debug!("{}: {} public files", package.name, surface.len());
            (package.name.clone(), surface)
        })
        .collect();
    PublicSurfaceMap { surfaces }
}

/// Names a package publishes, each mapped to the surface file that provides it.
///
/// Walks `export *` edges from the entry. A file reached that way passes on its
/// own declarations (except `default`) and the names it re-exports by name. A
/// named re-export contributes only the names it lists, attributed to the file
/// holding the statement; the target's other declarations stay unpublished.
/// Nearer files shadow farther ones.
pub fn public_exports(
    package: &Package,
    surface: &BTreeSet<RepoPath>,
    modules: &ModuleTable,
    index: &WorkspaceIndex<'_>,
) -> BTreeMap<String, RepoPath> {
    let mut names: BTreeMap<String, RepoPath> = BTreeMap::new();
    let Some(entry) = package.entry.as_ref().filter(|entry| surface.contains(*entry)) else {
        return names;
    };

    let mut visited = BTreeSet::from([entry.clone()]);
    let mut queue = VecDeque::from([entry.clone()]);
    while let Some(file) = queue.pop_front() {
        let Some(imports) = modules.imports(&file) else {
            continue;
        };
        let is_entry = &file == entry;

        let declared = imports
            .exports
            .iter()
            .filter(|name| is_entry || name.as_str() != "default")
            .cloned();
        let reexported = imports
            .reexports
            .iter()
            .flat_map(|reexport| reexport.exported_names());
        for name in declared.chain(reexported) {
            names.entry(name).or_insert_with(|| file.clone());
        }

        for reexport in &imports.reexports {
            if !matches!(reexport.names, ReexportNames::All) {
                continue;
            }
            let Some(target) = resolve(&file, &reexport.specifier, index).path else {
                continue;
            };
            if surface.contains(&target) && visited.insert(target.clone()) {
                queue.push_back(target);
            }
        }
    }
    names
}
