//! Layout engine for token-anchored semantic graphs.
//!
//! [`compute_layout`] runs a fixed pipeline: level classification and
//! grouping (`ranking`), column assignment (`columns`), collision resolution
//! (`overlap`), pixel coordinates (`position`) and edge routing (`routing`).
//! Every stage reads the previous stage's output and the input graph is
//! never modified, so the same graph and mode always give the same document.

mod columns;
mod error;
mod overlap;
mod position;
pub(crate) mod ranking;
mod routing;
pub(crate) mod types;

pub use error::{LayoutError, Result};
pub use routing::{CurveDirection, control_point};
pub use types::*;

use crate::config::{LayoutConfig, LayoutMode};
use crate::ir::GraphDocument;

use columns::assign_columns;
use overlap::resolve_overlaps;
use position::{Frame, extent, materialize};
use ranking::{Adjacency, descendant_counts, group_levels};
use routing::{link_tokens, route_edges};

pub fn compute_layout(
    graph: &GraphDocument,
    mode: LayoutMode,
    config: &LayoutConfig,
) -> Result<LayoutDocument> {
    let adjacency = Adjacency::build(graph)?;
    let counts = descendant_counts(&adjacency, mode == LayoutMode::Tree)?;
    let levels = group_levels(graph, mode, &counts);
    let columns = assign_columns(graph, &adjacency, &levels, mode);
    let placement = resolve_overlaps(
        graph,
        &adjacency,
        &levels,
        &columns,
        &counts,
        mode != LayoutMode::Flat,
    );

    let occupied = placement
        .rows
        .iter()
        .rposition(|row| !row.is_empty())
        .map_or(0, |top| top + 1);
    let frame = Frame::new(config, levels.height.max(occupied));
    tracing::debug!(
        %mode,
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        base_levels = levels.height,
        levels = frame.level_count,
        evictions = placement.evictions,
        "layout levels resolved"
    );

    let (nodes, slot) =
        materialize(graph, &columns, &placement, &frame, config.max_missing_tokens)?;
    let mut edges = route_edges(graph, &adjacency, &nodes, &slot, config);
    let token_edges = link_tokens(&placement.lowest, &nodes, &slot, edges.len(), config);
    edges.extend(token_edges);

    let (width, height) = extent(&nodes, config, &frame);
    Ok(LayoutDocument {
        mode,
        level_count: frame.level_count,
        width,
        height,
        nodes,
        edges,
    })
}
