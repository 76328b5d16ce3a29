use crate::error::Result;
use fence_graph::{build_graph, compute_public_surfaces, GraphResult, PublicSurfaceMap};
use fence_workspace::{ModuleTable, SourceTree, WorkspaceIndex, WorkspaceOptions};

/// Everything derived from one revision's source tree
pub struct Revision<'t> {
    pub index: WorkspaceIndex<'t>,
    pub modules: ModuleTable,
    pub surfaces: PublicSurfaceMap,
}

impl<'t> Revision<'t> {
    /// Discover packages, parse every source file and compute public surfaces
    pub fn load(tree: &'t SourceTree, options: &WorkspaceOptions) -> Result<Self> {
        let index = WorkspaceIndex::discover(tree, options)?;
        let modules = ModuleTable::parse_all(tree);
        let surfaces = compute_public_surfaces(&index, &modules);
        log::info!(
            "Loaded {}: {} packages, {} modules",
            tree.label(),
            index.packages().len(),
            modules.len()
        );
        Ok(Self {
            index,
            modules,
            surfaces,
        })
    }

    pub fn tree(&self) -> &'t SourceTree {
        self.index.tree()
    }

    pub fn graph(&self) -> GraphResult {
        build_graph(&self.index, &self.modules, &self.surfaces)
    }
}
