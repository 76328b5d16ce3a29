use fence_workspace::RepoPath;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of dependency between two modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// A imports B (value or side-effect import)
    ValueImport,

    /// A re-exports from B
    Reexport,

    /// A is public and B is its package entry
    PublicSurface,
}

impl EdgeKind {
    /// Edges that take part in cycle detection
    pub fn is_dependency(self) -> bool {
        matches!(self, Self::ValueImport | Self::Reexport)
    }
}

/// Edge in the module graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub kind: EdgeKind,

    /// Specifier as written; `None` for bookkeeping edges
    pub specifier: Option<String>,
}

/// Whole-repository module graph.
///
/// Nodes are source files inserted in canonical order, so a node's index is its
/// rank in that order. Parallel edges are allowed.
pub struct ModuleGraph {
    /// Directed multigraph (module -> module)
    pub graph: DiGraph<RepoPath, GraphEdge>,

    /// Path -> NodeIndex mapping for fast lookup
    pub node_index: BTreeMap<RepoPath, NodeIndex>,
}

impl ModuleGraph {
    /// Create a graph whose nodes are `paths` in canonical order
    pub fn with_nodes<'a>(paths: impl IntoIterator<Item = &'a RepoPath>) -> Self {
        let mut sorted: Vec<&RepoPath> = paths.into_iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut graph = DiGraph::new();
        let mut node_index = BTreeMap::new();
        for path in sorted {
            let idx = graph.add_node(path.clone());
            node_index.insert(path.clone(), idx);
        }
        Self { graph, node_index }
    }

    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: GraphEdge) {
        self.graph.add_edge(from, to, edge);
    }

    pub fn find_node(&self, path: &RepoPath) -> Option<NodeIndex> {
        self.node_index.get(path).copied()
    }

    pub fn path(&self, idx: NodeIndex) -> Option<&RepoPath> {
        self.graph.node_weight(idx)
    }

    /// Nodes in canonical order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &RepoPath)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx).map(|path| (idx, path)))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
