use std::collections::HashMap;

use crate::config::LayoutMode;
use crate::ir::{GraphDocument, NodeId};

use super::error::{LayoutError, Result};

/// Index-based view of a graph's edges, built once per layout.
///
/// Nodes are addressed by their position in `GraphDocument::nodes`; neighbour
/// lists keep edge order and drop repeated entries.
#[derive(Debug, Clone)]
pub(crate) struct Adjacency {
    pub(crate) ids: Vec<NodeId>,
    pub(crate) index: HashMap<NodeId, usize>,
    pub(crate) edges: Vec<(usize, usize)>,
    pub(crate) children: Vec<Vec<usize>>,
    pub(crate) parents: Vec<Vec<usize>>,
}

impl Adjacency {
    pub(crate) fn build(graph: &GraphDocument) -> Result<Self> {
        let mut index: HashMap<NodeId, usize> = HashMap::with_capacity(graph.nodes.len());
        for (idx, node) in graph.nodes.iter().enumerate() {
            if index.contains_key(&node.id) {
                tracing::warn!(node = %node.id, "duplicate node id; edges bind to the first occurrence");
                continue;
            }
            index.insert(node.id.clone(), idx);
        }

        let lookup = |edge: usize, id: &NodeId| -> Result<usize> {
            index.get(id).copied().ok_or_else(|| LayoutError::Reference {
                edge,
                node: id.clone(),
            })
        };

        let node_count = graph.nodes.len();
        let mut edges = Vec::with_capacity(graph.edges.len());
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); node_count];
        let mut parents: Vec<Vec<usize>> = vec![Vec::new(); node_count];
        for (edge_idx, edge) in graph.edges.iter().enumerate() {
            let source = lookup(edge_idx, &edge.source)?;
            let target = lookup(edge_idx, &edge.target)?;
            edges.push((source, target));
            if !children[source].contains(&target) {
                children[source].push(target);
            }
            if !parents[target].contains(&source) {
                parents[target].push(source);
            }
        }

        Ok(Self {
            ids: graph.nodes.iter().map(|node| node.id.clone()).collect(),
            index,
            edges,
            children,
            parents,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    /// Children followed by parents, without repeats.
    pub(crate) fn undirected_neighbours(&self, node: usize) -> Vec<usize> {
        let mut out = self.children[node].clone();
        for &parent in &self.parents[node] {
            if !out.contains(&parent) {
                out.push(parent);
            }
        }
        out
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Fresh,
    OnPath,
    Done,
}

/// Number of distinct nodes reachable from each node, itself included.
///
/// With `reject_cycles` set, reaching a node that is still on the current
/// traversal path fails with [`LayoutError::CyclicGraph`].
pub(crate) fn descendant_counts(adjacency: &Adjacency, reject_cycles: bool) -> Result<Vec<usize>> {
    let node_count = adjacency.len();
    let mut counts = Vec::with_capacity(node_count);
    let mut state = vec![Visit::Fresh; node_count];
    let mut touched: Vec<usize> = Vec::new();

    for start in 0..node_count {
        for &node in &touched {
            state[node] = Visit::Fresh;
        }
        touched.clear();

        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        state[start] = Visit::OnPath;
        touched.push(start);

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            let Some(&child) = adjacency.children[node].get(next) else {
                state[node] = Visit::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;
            match state[child] {
                Visit::Fresh => {
                    state[child] = Visit::OnPath;
                    touched.push(child);
                    stack.push((child, 0));
                }
                Visit::OnPath if reject_cycles => {
                    return Err(LayoutError::CyclicGraph {
                        node: adjacency.ids[child].clone(),
                    });
                }
                Visit::OnPath | Visit::Done => {}
            }
        }

        counts.push(touched.len());
    }

    Ok(counts)
}

/// Level key in hierarchical mode. Unanchored nodes sort above every span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SpanKey {
    Width(usize),
    Unanchored,
}

/// Nodes bucketed into levels, level 0 at the bottom.
#[derive(Debug, Clone, Default)]
pub(super) struct Levels {
    pub(super) levels: Vec<Vec<usize>>,
    /// Number of levels used to scale the vertical axis.
    pub(super) height: usize,
}

impl Levels {
    /// Node indices in level order, input order inside a level.
    pub(super) fn iter_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.levels.iter().flat_map(|level| level.iter().copied())
    }
}

pub(super) fn group_levels(graph: &GraphDocument, mode: LayoutMode, counts: &[usize]) -> Levels {
    if graph.nodes.is_empty() {
        return Levels::default();
    }
    match mode {
        LayoutMode::Hierarchical => {
            let keys: Vec<SpanKey> = graph
                .nodes
                .iter()
                .map(|node| match node.first_anchor() {
                    Some(span) => SpanKey::Width(span.width()),
                    None => SpanKey::Unanchored,
                })
                .collect();
            let mut distinct = keys.clone();
            distinct.sort();
            distinct.dedup();
            let levels: Vec<Vec<usize>> = distinct
                .iter()
                .map(|key| {
                    keys.iter()
                        .enumerate()
                        .filter(|(_, k)| *k == key)
                        .map(|(idx, _)| idx)
                        .collect()
                })
                .collect();
            Levels {
                height: levels.len(),
                levels,
            }
        }
        LayoutMode::Tree => {
            let height = counts.iter().copied().max().unwrap_or(0);
            let mut levels: Vec<Vec<usize>> = vec![Vec::new(); height];
            for (idx, &count) in counts.iter().enumerate() {
                levels[count.saturating_sub(1)].push(idx);
            }
            Levels { levels, height }
        }
        LayoutMode::Flat => Levels {
            levels: vec![(0..graph.nodes.len()).collect()],
            height: 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Span;

    fn chain() -> GraphDocument {
        let mut graph = GraphDocument::new();
        graph.add_node("a", "a", &[Span::new(0, 3)]);
        graph.add_node("b", "b", &[Span::new(0, 2)]);
        graph.add_node("c", "c", &[Span::new(0, 1)]);
        graph.add_node("d", "d", &[]);
        graph.add_edge("a", "b", "ARG1");
        graph.add_edge("b", "c", "ARG1");
        graph.add_edge("a", "c", "ARG2");
        graph
    }

    #[test]
    fn counts_include_the_node_itself() {
        let graph = chain();
        let adjacency = Adjacency::build(&graph).unwrap();
        let counts = descendant_counts(&adjacency, true).unwrap();
        assert_eq!(counts, vec![3, 2, 1, 1]);
    }

    #[test]
    fn cycle_is_rejected_only_when_asked() {
        let mut graph = GraphDocument::new();
        graph.add_node("A", "A", &[]);
        graph.add_node("B", "B", &[]);
        graph.add_edge("A", "B", "x");
        graph.add_edge("B", "A", "y");
        let adjacency = Adjacency::build(&graph).unwrap();
        assert!(matches!(
            descendant_counts(&adjacency, true),
            Err(LayoutError::CyclicGraph { .. })
        ));
        assert_eq!(descendant_counts(&adjacency, false).unwrap(), vec![2, 2]);
    }

    #[test]
    fn unknown_endpoint_is_a_reference_error() {
        let mut graph = chain();
        graph.add_edge("a", "zz", "ARG3");
        let err = Adjacency::build(&graph).unwrap_err();
        assert_eq!(
            err,
            LayoutError::Reference {
                edge: 3,
                node: NodeId::from("zz"),
            }
        );
    }

    #[test]
    fn hierarchical_levels_sort_by_span_width_then_unanchored() {
        let graph = chain();
        let levels = group_levels(&graph, LayoutMode::Hierarchical, &[3, 2, 1, 1]);
        assert_eq!(levels.levels, vec![vec![2], vec![1], vec![0], vec![3]]);
        assert_eq!(levels.height, 4);
    }

    #[test]
    fn tree_levels_keep_empty_slots() {
        let mut graph = GraphDocument::new();
        graph.add_node("r", "r", &[Span::new(0, 1)]);
        graph.add_node("x", "x", &[Span::new(1, 2)]);
        graph.add_node("y", "y", &[Span::new(2, 3)]);
        graph.add_edge("r", "x", "");
        graph.add_edge("r", "y", "");
        let adjacency = Adjacency::build(&graph).unwrap();
        let counts = descendant_counts(&adjacency, true).unwrap();
        let levels = group_levels(&graph, LayoutMode::Tree, &counts);
        assert_eq!(levels.levels, vec![vec![1, 2], vec![], vec![0]]);
        assert_eq!(levels.height, 3);
    }
}
