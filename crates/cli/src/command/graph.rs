use crate::config::FenceConfig;
use anyhow::{Context, Result};
use fence_engine::Revision;
use fence_graph::{detect_cycles, EdgeKind, GraphStats};
use fence_workspace::{GitCli, RepoPath, SourceTree, VersionControl};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Module graph of one revision, as printed by `fence graph`
#[derive(Debug, Serialize)]
pub struct GraphSummary {
    pub revision: String,
    pub nodes: Vec<RepoPath>,
    pub edges: BTreeMap<EdgeKind, usize>,
    pub stats: GraphStats,
    pub cycles: Vec<Vec<RepoPath>>,
}

pub fn run(root: &Path, rev: Option<&str>, config: Option<&Path>) -> Result<GraphSummary> {
    let config = FenceConfig::load(root, config)?;
    let tree = match rev {
        Some(rev) => GitCli::new(root)
            .snapshot(rev)
            .with_context(|| format!("Failed to read revision {rev}"))?,
        None => SourceTree::from_working_tree(root)
            .with_context(|| format!("Failed to scan {}", root.display()))?,
    };

    let revision = Revision::load(&tree, &config.workspace_options())
        .context("Failed to discover workspace packages")?;
    let result = revision.graph();
    let cycles = detect_cycles(&result.graph);

    Ok(GraphSummary {
        revision: tree.label().to_string(),
        nodes: result.graph.nodes().map(|(_, path)| path.clone()).collect(),
        edges: result.graph.edge_counts(),
        stats: result.stats,
        cycles,
    })
}
