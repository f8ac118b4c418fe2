use std::collections::{BTreeMap, BTreeSet};

use crate::ir::GraphDocument;

use super::columns::Columns;
use super::ranking::{Adjacency, Levels};

/// Final level of every node after column collisions are resolved.
#[derive(Debug, Clone, Default)]
pub(super) struct Placement {
    pub(super) level: Vec<usize>,
    /// Nodes per final level, in the order they settled.
    pub(super) rows: Vec<Vec<usize>>,
    /// Token index -> the node that draws the edge down to that token.
    pub(super) lowest: BTreeMap<usize, usize>,
    pub(super) evictions: usize,
}

/// Walks the levels bottom-up and gives every column on a level to at most
/// one node.
///
/// On a collision the node with strictly fewer descendants keeps the slot and
/// the other one moves to the next level; ties keep the current occupant.
/// Nodes therefore only ever move up, and every non-empty level settles at
/// least one node, so the walk terminates.
///
/// When `keep_token_edges_clear` is set, an unanchored node sharing the column
/// of its first parent, where that parent is the column's lowest node, waits
/// until the parent has settled strictly below it.
pub(super) fn resolve_overlaps(
    graph: &GraphDocument,
    adjacency: &Adjacency,
    levels: &Levels,
    columns: &Columns,
    counts: &[usize],
    keep_token_edges_clear: bool,
) -> Placement {
    let node_count = graph.nodes.len();
    let mut settled: Vec<Option<usize>> = vec![None; node_count];
    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut carried: Vec<usize> = Vec::new();
    let mut remaining = node_count;
    let mut evictions = 0usize;

    let must_wait = |idx: usize, current: usize, settled: &[Option<usize>]| -> bool {
        if !keep_token_edges_clear || graph.nodes[idx].is_anchored() {
            return false;
        }
        let Some(column) = columns.column[idx] else {
            return false;
        };
        let Some(&parent) = adjacency.parents[idx].first() else {
            return false;
        };
        if columns.column[parent] != Some(column) || columns.lowest.get(&column) != Some(&parent)
        {
            return false;
        }
        !matches!(settled[parent], Some(level) if level < current)
    };

    let mut current = 0usize;
    while remaining > 0 {
        let mut queue: Vec<usize> = levels.levels.get(current).cloned().unwrap_or_default();
        queue.append(&mut carried);

        let mut occupied: BTreeMap<usize, usize> = BTreeMap::new();
        let mut row: Vec<usize> = Vec::new();
        for idx in queue {
            if must_wait(idx, current, &settled) {
                carried.push(idx);
                continue;
            }
            let Some(column) = columns.column[idx] else {
                row.push(idx);
                continue;
            };
            match occupied.get(&column).copied() {
                None => {
                    occupied.insert(column, idx);
                    row.push(idx);
                }
                Some(occupant) if counts[idx] < counts[occupant] => {
                    tracing::trace!(
                        level = current,
                        column,
                        evicted = %adjacency.ids[occupant],
                        by = %adjacency.ids[idx],
                        "column collision"
                    );
                    occupied.insert(column, idx);
                    row.retain(|&other| other != occupant);
                    row.push(idx);
                    carried.push(occupant);
                    evictions += 1;
                }
                Some(_) => carried.push(idx),
            }
        }

        for &idx in &row {
            settled[idx] = Some(current);
        }
        remaining -= row.len();
        rows.push(row);
        current += 1;
    }

    let lowest = settled_lowest(graph, columns, &rows, keep_token_edges_clear);
    Placement {
        level: settled.into_iter().map(|level| level.unwrap_or(0)).collect(),
        rows,
        lowest,
        evictions,
    }
}

/// The first node, bottom row first, occupying each anchored token column.
///
/// With `by_column` set, any node sitting in the column counts, so the token
/// edge never passes through another node. Otherwise (flat rows, where
/// columns are ranks) the key is the node's own anchor start.
fn settled_lowest(
    graph: &GraphDocument,
    columns: &Columns,
    rows: &[Vec<usize>],
    by_column: bool,
) -> BTreeMap<usize, usize> {
    let anchored: BTreeSet<usize> = graph
        .nodes
        .iter()
        .filter_map(|node| node.first_anchor().map(|span| span.from))
        .collect();
    let mut lowest = BTreeMap::new();
    for &idx in rows.iter().flatten() {
        let key = if by_column {
            columns.column[idx].filter(|column| anchored.contains(column))
        } else {
            graph.nodes[idx].first_anchor().map(|span| span.from)
        };
        if let Some(key) = key {
            lowest.entry(key).or_insert(idx);
        }
    }
    lowest
}
