use crate::error::{GraphError, Result};
use crate::types::{EdgeKind, ModuleGraph};
use fence_workspace::RepoPath;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, BTreeSet};

impl ModuleGraph {
    /// Targets of outgoing import/re-export edges, by node index, without duplicates
    pub fn dependencies(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let targets: BTreeSet<NodeIndex> = self
            .graph
            .edges(node)
            .filter(|e| e.weight().kind.is_dependency())
            .map(|e| e.target())
            .collect();
        targets.into_iter().collect()
    }

    /// Outgoing edges of `path` as `(target, kind)`, ordered by target then kind
    pub fn outgoing(&self, path: &RepoPath) -> Result<Vec<(&RepoPath, EdgeKind)>> {
        let node = self
            .find_node(path)
            .ok_or_else(|| GraphError::NodeNotFound(path.to_string()))?;

        let mut edges: Vec<(NodeIndex, EdgeKind)> = self
            .graph
            .edges(node)
            .map(|e| (e.target(), e.weight().kind))
            .collect();
        edges.sort();
        edges.dedup();

        edges
            .into_iter()
            .map(|(target, kind)| {
                self.path(target)
                    .map(|p| (p, kind))
                    .ok_or_else(|| GraphError::NodeNotFound(format!("{target:?}")))
            })
            .collect()
    }

    /// First dependency of `path` (in canonical order) that is a member of `component`
    pub fn successor_within(&self, path: &RepoPath, component: &[RepoPath]) -> Result<Option<&RepoPath>> {
        let node = self
            .find_node(path)
            .ok_or_else(|| GraphError::NodeNotFound(path.to_string()))?;

        let members: BTreeSet<&RepoPath> = component.iter().collect();
        Ok(self
            .dependencies(node)
            .into_iter()
            .filter_map(|idx| self.path(idx))
            .find(|target| *target != path && members.contains(target)))
    }

    /// Number of edges of each kind
    pub fn edge_counts(&self) -> BTreeMap<EdgeKind, usize> {
        let mut counts = BTreeMap::new();
        for edge in self.graph.edge_references() {
            *counts.entry(edge.weight().kind).or_insert(0) += 1;
        }
        counts
    }
}
