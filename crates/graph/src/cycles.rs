use crate::types::ModuleGraph;
use fence_workspace::RepoPath;
use petgraph::graph::NodeIndex;

/// Strongly connected components of two or more modules.
///
/// Tarjan's index/lowlink algorithm with an explicit work stack, over
/// `ValueImport` and `Reexport` edges only. Members are ordered by node index
/// (canonical path order) and components by their first member.
pub fn detect_cycles(graph: &ModuleGraph) -> Vec<Vec<RepoPath>> {
    let n = graph.node_count();
    let adjacency: Vec<Vec<usize>> = (0..n)
        .map(|v| {
            graph
                .dependencies(NodeIndex::new(v))
                .into_iter()
                .map(NodeIndex::index)
                .filter(|w| *w != v)
                .collect()
        })
        .collect();

    let mut index: Vec<Option<usize>> = vec![None; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_index = 0usize;
    let mut components: Vec<Vec<usize>> = Vec::new();

    for root in 0..n {
        if index[root].is_some() {
            continue;
        }

        index[root] = Some(next_index);
        lowlink[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;

        // (node, position of the next neighbour to visit)
        let mut work: Vec<(usize, usize)> = vec![(root, 0)];
        while let Some(frame) = work.last_mut() {
            let v = frame.0;
            if let Some(&w) = adjacency[v].get(frame.1) {
                frame.1 += 1;
                match index[w] {
                    None => {
                        index[w] = Some(next_index);
                        lowlink[w] = next_index;
                        next_index += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        work.push((w, 0));
                    }
                    Some(w_index) if on_stack[w] => {
                        lowlink[v] = lowlink[v].min(w_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }

            if index[v] == Some(lowlink[v]) {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                if component.len() >= 2 {
                    component.sort_unstable();
                    components.push(component);
                }
            }
        }
    }

    components.sort_by_key(|component| component[0]);
    let cycles: Vec<Vec<RepoPath>> = components
        .into_iter()
        .map(|component| {
            component
                .into_iter()
                .filter_map(|idx| graph.path(NodeIndex::new(idx)).cloned())
                .collect()
        })
        .collect();

    if !cycles.is_empty() {
        log::debug!("Found {} import cycles", cycles.len());
    }
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeKind, GraphEdge};
    use pretty_assertions::assert_eq;

    fn graph(nodes: &[&str], edges: &[(usize, usize, EdgeKind)]) -> ModuleGraph {
        let paths: Vec<RepoPath> = nodes.iter().map(|p| RepoPath::new(p).unwrap()).collect();
        let mut graph = ModuleGraph::with_nodes(&paths);
        for (from, to, kind) in edges {
            let from = graph.find_node(&paths[*from]).unwrap();
            let to = graph.find_node(&paths[*to]).unwrap();
            graph.add_edge(
                from,
                to,
                GraphEdge {
                    kind: *kind,
                    specifier: None,
                },
            );
        }
        graph
    }

    fn names(cycles: &[Vec<RepoPath>]) -> Vec<Vec<&str>> {
        cycles
            .iter()
            .map(|c| c.iter().map(|p| p.as_str()).collect())
            .collect()
    }

    #[test]
    fn self_loops_and_bookkeeping_edges_are_not_cycles() {
        let g = graph(
            &["a.ts", "b.ts"],
            &[
                (0, 0, EdgeKind::ValueImport),
                (0, 1, EdgeKind::ValueImport),
                (1, 0, EdgeKind::PublicSurface),
            ],
        );
        assert!(detect_cycles(&g).is_empty());
    }

    #[test]
    fn components_sorted_by_first_member() {
        let g = graph(
            &["z1.ts", "z2.ts", "a1.ts", "a2.ts", "m.ts"],
            &[
                (0, 1, EdgeKind::ValueImport),
                (1, 0, EdgeKind::Reexport),
                (2, 3, EdgeKind::ValueImport),
                (3, 2, EdgeKind::ValueImport),
                (4, 2, EdgeKind::ValueImport),
            ],
        );
        assert_eq!(
            names(&detect_cycles(&g)),
            vec![vec!["a1.ts", "a2.ts"], vec!["z1.ts", "z2.ts"]]
        );
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let nodes: Vec<String> = (0..20_000).map(|i| format!("m{i:05}.ts")).collect();
        let refs: Vec<&str> = nodes.iter().map(String::as_str).collect();
        let mut edges: Vec<(usize, usize, EdgeKind)> =
            (0..nodes.len() - 1).map(|i| (i, i + 1, EdgeKind::ValueImport)).collect();
        edges.push((nodes.len() - 1, 0, EdgeKind::ValueImport));

        let cycles = detect_cycles(&graph(&refs, &edges));
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 20_000);
    }
}
