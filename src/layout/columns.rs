use std::collections::BTreeMap;

use crate::config::LayoutMode;
use crate::ir::GraphDocument;

use super::ranking::{Adjacency, Levels};

/// Horizontal slot of every node plus the lowest-node registry.
#[derive(Debug, Clone, Default)]
pub(super) struct Columns {
    pub(super) column: Vec<Option<usize>>,
    /// Token index -> first anchored node (in level order) starting there,
    /// before collisions move anything.
    pub(super) lowest: BTreeMap<usize, usize>,
}

impl Columns {
    pub(super) fn unresolved(&self) -> impl Iterator<Item = usize> + '_ {
        self.column
            .iter()
            .enumerate()
            .filter(|(_, column)| column.is_none())
            .map(|(idx, _)| idx)
    }
}

pub(super) fn assign_columns(
    graph: &GraphDocument,
    adjacency: &Adjacency,
    levels: &Levels,
    mode: LayoutMode,
) -> Columns {
    let mut column: Vec<Option<usize>> = graph
        .nodes
        .iter()
        .map(|node| node.first_anchor().map(|span| span.from))
        .collect();

    let mut lowest = BTreeMap::new();
    for idx in levels.iter_nodes() {
        if let Some(from) = graph.nodes[idx].first_anchor().map(|span| span.from) {
            lowest.entry(from).or_insert(idx);
        }
    }

    let order: Vec<usize> = levels
        .iter_nodes()
        .filter(|&idx| column[idx].is_none())
        .collect();
    // Children first; a parent is only consulted by childless nodes until
    // nothing else moves, then by everyone still unresolved.
    inherit_until_stable(&order, adjacency, &mut column, false);
    inherit_until_stable(&order, adjacency, &mut column, true);

    let mut columns = Columns { column, lowest };
    for idx in columns.unresolved() {
        tracing::warn!(node = %adjacency.ids[idx], "no column could be inferred for node");
    }

    if mode == LayoutMode::Flat {
        columns.column = flat_ranks(&columns.column);
    }
    columns
}

fn inherit_until_stable(
    order: &[usize],
    adjacency: &Adjacency,
    column: &mut [Option<usize>],
    parent_fallback: bool,
) {
    loop {
        let mut changed = false;
        for &idx in order {
            if column[idx].is_some() {
                continue;
            }
            let children = &adjacency.children[idx];
            let mut inherited = inherit_from_children(children, column);
            if inherited.is_none() && (children.is_empty() || parent_fallback) {
                inherited = adjacency.parents[idx]
                    .first()
                    .and_then(|&parent| column[parent]);
            }
            if inherited.is_some() {
                column[idx] = inherited;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// Single child: its column. Several: the lower median of the resolved ones.
fn inherit_from_children(children: &[usize], column: &[Option<usize>]) -> Option<usize> {
    match children {
        [] => None,
        [only] => column[*only],
        _ => {
            let mut resolved: Vec<usize> = children.iter().filter_map(|&c| column[c]).collect();
            if resolved.is_empty() {
                return None;
            }
            resolved.sort_unstable();
            Some(resolved[resolved.len() / 2])
        }
    }
}

/// Flat rows are ordered by token column; ties keep input order and
/// unresolved nodes go last.
fn flat_ranks(column: &[Option<usize>]) -> Vec<Option<usize>> {
    let mut order: Vec<usize> = (0..column.len()).collect();
    order.sort_by_key(|&idx| (column[idx].unwrap_or(usize::MAX), idx));
    let mut ranks = vec![None; column.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        ranks[idx] = Some(rank);
    }
    ranks
}
