use crate::resolver::{resolve, ResolutionKind};
use crate::surface::PublicSurfaceMap;
use crate::types::{EdgeKind, GraphEdge, ModuleGraph};
use fence_workspace::{ModuleEntry, ModuleTable, RepoPath, WorkspaceIndex};
use serde::{Deserialize, Serialize};

/// Resolution outcomes seen while building the graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub modules: usize,
    pub edges: usize,
    pub external: usize,
    pub unresolved: usize,
    /// Package-scoped specifiers rejected without a target file
    pub forbidden: usize,
    /// Source files that could not be read or parsed
    pub unparsed: usize,
}

pub struct GraphResult {
    pub graph: ModuleGraph,
    pub stats: GraphStats,
}

/// Build the whole-repository module graph.
///
/// Nodes are all source files of `modules`. `ValueImport` and `Reexport` edges are
/// added for specifiers that resolve to a known file; `PublicSurface` edges link
/// each public file to its package entry.
pub fn build_graph(
    index: &WorkspaceIndex<'_>,
    modules: &ModuleTable,
    surfaces: &PublicSurfaceMap,
) -> GraphResult {
    let mut graph = ModuleGraph::with_nodes(modules.iter().map(|(path, _)| path));
    let mut stats = GraphStats {
        modules: graph.node_count(),
        ..GraphStats::default()
    };

    // Phase 1: dependency edges
    for (from, entry) in modules.iter() {
        let ModuleEntry::Parsed(imports) = entry else {
            stats.unparsed += 1;
            continue;
        };

        let value = imports
            .value_imports
            .iter()
            .map(|import| (EdgeKind::ValueImport, import.specifier.as_str()));
        let reexports = imports
            .reexports
            .iter()
            .map(|reexport| (EdgeKind::Reexport, reexport.specifier.as_str()));

        for (kind, specifier) in value.chain(reexports) {
            let target = resolve(from, specifier, index);
            match (target.kind, target.path) {
                (ResolutionKind::External, _) => stats.external += 1,
                (ResolutionKind::Unresolved, _) => stats.unresolved += 1,
                (_, None) => stats.forbidden += 1,
                (_, Some(to)) => {
                    add_edge(&mut graph, from, &to, kind, Some(specifier));
                }
            }
        }
    }

    // Phase 2: public surface bookkeeping
    for (package, surface) in surfaces.iter() {
        let Some(entry) = index.package(package).and_then(|pkg| pkg.entry.as_ref()) else {
            continue;
        };
        for file in surface.iter().filter(|file| *file != entry) {
            add_edge(&mut graph, file, entry, EdgeKind::PublicSurface, None);
        }
    }

    stats.edges = graph.edge_count();
    log::info!(
        "Built module graph: {} nodes, {} edges ({} external, {} unresolved)",
        stats.modules,
        stats.edges,
        stats.external,
        stats.unresolved
    );

    GraphResult { graph, stats }
}

fn add_edge(graph: &mut ModuleGraph, from: &RepoPath, to: &RepoPath, kind: EdgeKind, specifier: Option<&str>) {
    let (Some(from_idx), Some(to_idx)) = (graph.find_node(from), graph.find_node(to)) else {
        log::debug!("{from}: {to} is not a source module; no edge");
        return;
    };
    let edge = GraphEdge {
        kind,
        specifier: specifier.map(str::to_string),
    };
    graph.add_edge(from_idx, to_idx, edge);
}
