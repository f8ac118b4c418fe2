//! Structural checks on a single graph: longest paths, connectivity,
//! cyclicity and crossing-free ("planar") token order.

use std::collections::VecDeque;

use serde::Serialize;

use crate::ir::{GraphDocument, NodeId, Span};
use crate::layout::ranking::{Adjacency, descendant_counts};
use crate::layout::{LayoutError, Result};

/// Longest paths, source first.
///
/// Directed: every maximal-length directed path, one per end node; fails on
/// a directed cycle. Undirected: the longest shortest paths between any two
/// nodes, with reversed duplicates removed.
pub fn longest_paths(graph: &GraphDocument, directed: bool) -> Result<Vec<Vec<NodeId>>> {
    let adjacency = Adjacency::build(graph)?;
    if adjacency.edges.is_empty() {
        return Ok(Vec::new());
    }
    let paths = if directed {
        directed_longest(&adjacency)?
    } else {
        undirected_longest(&adjacency)
    };
    Ok(paths
        .into_iter()
        .map(|path| path.into_iter().map(|idx| adjacency.ids[idx].clone()).collect())
        .collect())
}

fn directed_longest(adjacency: &Adjacency) -> Result<Vec<Vec<usize>>> {
    let order = topological_order(adjacency)?;
    let node_count = adjacency.len();
    let mut dist = vec![0usize; node_count];
    let mut prev: Vec<Option<usize>> = vec![None; node_count];
    for &node in &order {
        for &child in &adjacency.children[node] {
            if dist[node] + 1 > dist[child] {
                dist[child] = dist[node] + 1;
                prev[child] = Some(node);
            }
        }
    }

    let longest = dist.iter().copied().max().unwrap_or(0);
    if longest == 0 {
        return Ok(Vec::new());
    }
    Ok((0..node_count)
        .filter(|&node| dist[node] == longest)
        .map(|end| trace_back(end, &prev))
        .collect())
}

/// Kahn's algorithm; the first node left over names the cycle.
fn topological_order(adjacency: &Adjacency) -> Result<Vec<usize>> {
    let node_count = adjacency.len();
    let mut indegree: Vec<usize> = adjacency.parents.iter().map(Vec::len).collect();
    let mut ready: VecDeque<usize> = (0..node_count).filter(|&n| indegree[n] == 0).collect();
    let mut order = Vec::with_capacity(node_count);
    while let Some(node) = ready.pop_front() {
        order.push(node);
        for &child in &adjacency.children[node] {
            indegree[child] -= 1;
            if indegree[child] == 0 {
                ready.push_back(child);
            }
        }
    }
    if order.len() < node_count {
        let stuck = (0..node_count).find(|&n| indegree[n] > 0).unwrap_or(0);
        return Err(LayoutError::CyclicGraph {
            node: adjacency.ids[stuck].clone(),
        });
    }
    Ok(order)
}

fn undirected_longest(adjacency: &Adjacency) -> Vec<Vec<usize>> {
    let mut best = 0usize;
    let mut paths: Vec<Vec<usize>> = Vec::new();
    for start in 0..adjacency.len() {
        let (dist, prev) = breadth_first(adjacency, start);
        let farthest = dist.iter().filter_map(|d| *d).max().unwrap_or(0);
        if farthest == 0 || farthest < best {
            continue;
        }
        if farthest > best {
            best = farthest;
            paths.clear();
        }
        for end in 0..adjacency.len() {
            if dist[end] != Some(farthest) {
                continue;
            }
            let path = trace_back(end, &prev);
            let mut reversed = path.clone();
            reversed.reverse();
            if !paths.contains(&path) && !paths.contains(&reversed) {
                paths.push(path);
            }
        }
    }
    paths
}

fn breadth_first(adjacency: &Adjacency, start: usize) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
    let mut dist: Vec<Option<usize>> = vec![None; adjacency.len()];
    let mut prev: Vec<Option<usize>> = vec![None; adjacency.len()];
    let mut queue = VecDeque::from([start]);
    dist[start] = Some(0);
    while let Some(node) = queue.pop_front() {
        let next = dist[node].unwrap_or(0) + 1;
        for neighbour in adjacency.undirected_neighbours(node) {
            if dist[neighbour].is_none() {
                dist[neighbour] = Some(next);
                prev[neighbour] = Some(node);
                queue.push_back(neighbour);
            }
        }
    }
    (dist, prev)
}

fn trace_back(end: usize, prev: &[Option<usize>]) -> Vec<usize> {
    let mut path = vec![end];
    let mut cursor = end;
    while let Some(before) = prev[cursor] {
        path.push(before);
        cursor = before;
    }
    path.reverse();
    path
}

/// Weak connectivity. Graphs with at most one node are connected.
pub fn is_connected(graph: &GraphDocument) -> Result<bool> {
    let adjacency = Adjacency::build(graph)?;
    if adjacency.len() <= 1 {
        return Ok(true);
    }
    let (dist, _) = breadth_first(&adjacency, 0);
    Ok(dist.iter().all(Option::is_some))
}

/// Directed: any directed cycle. Undirected: self-loops count, parallel
/// edges between the same two nodes do not.
pub fn is_cyclic(graph: &GraphDocument, directed: bool) -> Result<bool> {
    let adjacency = Adjacency::build(graph)?;
    if directed {
        return match descendant_counts(&adjacency, true) {
            Ok(_) => Ok(false),
            Err(LayoutError::CyclicGraph { .. }) => Ok(true),
            Err(err) => Err(err),
        };
    }

    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for &(source, target) in &adjacency.edges {
        if source == target {
            return Ok(true);
        }
        let pair = (source.min(target), source.max(target));
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
    }

    let mut root: Vec<usize> = (0..adjacency.len()).collect();
    fn find(root: &mut [usize], mut node: usize) -> usize {
        while root[node] != node {
            root[node] = root[root[node]];
            node = root[node];
        }
        node
    }
    for (a, b) in pairs {
        let (ra, rb) = (find(&mut root, a), find(&mut root, b));
        if ra == rb {
            return Ok(true);
        }
        root[ra] = rb;
    }
    Ok(false)
}

/// True when no two edges cross once every node sits on the token line at
/// its first anchor. Edges touching unanchored nodes are ignored.
pub fn is_planar(graph: &GraphDocument) -> Result<bool> {
    let adjacency = Adjacency::build(graph)?;
    let position: Vec<Option<usize>> = graph
        .nodes
        .iter()
        .map(|node| node.first_anchor().map(|span| span.from))
        .collect();
    let arcs: Vec<(usize, usize)> = adjacency
        .edges
        .iter()
        .filter_map(|&(s, t)| match (position[s], position[t]) {
            (Some(a), Some(b)) => Some((a.min(b), a.max(b))),
            _ => None,
        })
        .collect();
    let crossing = arcs.iter().any(|&(lo, hi)| {
        arcs.iter()
            .any(|&(other_lo, other_hi)| lo < other_lo && other_lo < hi && hi < other_hi)
    });
    Ok(!crossing)
}

/// Indices of edges whose source or target is not a node of the graph.
pub fn dangling_edges(graph: &GraphDocument) -> Vec<usize> {
    graph
        .edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| graph.node(&edge.source).is_none() || graph.node(&edge.target).is_none())
        .map(|(idx, _)| idx)
        .collect()
}

/// Surface text of the tokens inside `span`.
pub fn token_span_text(graph: &GraphDocument, span: Span) -> String {
    let mut tokens: Vec<_> = graph
        .tokens
        .iter()
        .filter(|token| token.index >= span.from && token.index < span.end)
        .collect();
    tokens.sort_by_key(|token| token.index);
    tokens
        .iter()
        .map(|token| token.form.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphReport {
    pub id: Option<String>,
    pub nodes: usize,
    pub edges: usize,
    pub tokens: usize,
    pub connected: bool,
    pub directed_cyclic: bool,
    pub undirected_cyclic: bool,
    pub planar: bool,
    /// Edge count of the longest directed path; absent for cyclic graphs.
    pub longest_path_length: Option<usize>,
    pub longest_paths: Vec<Vec<NodeId>>,
}

pub fn analyze(graph: &GraphDocument) -> Result<GraphReport> {
    let directed_cyclic = is_cyclic(graph, true)?;
    let longest_paths = if directed_cyclic {
        Vec::new()
    } else {
        longest_paths(graph, true)?
    };
    let longest_path_length = if directed_cyclic {
        None
    } else {
        Some(longest_paths.first().map_or(0, |path| path.len().saturating_sub(1)))
    };
    Ok(GraphReport {
        id: graph.id.clone(),
        nodes: graph.nodes.len(),
        edges: graph.edges.len(),
        tokens: graph.tokens.len(),
        connected: is_connected(graph)?,
        directed_cyclic,
        undirected_cyclic: is_cyclic(graph, false)?,
        planar: is_planar(graph)?,
        longest_path_length,
        longest_paths,
    })
}
