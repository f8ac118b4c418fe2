use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::ir::GraphDocument;

use super::ranking::Adjacency;
use super::types::{EdgeKind, NodeKind, PositionedEdge, PositionedNode};

/// Side an edge bulges towards, relative to its direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveDirection {
    Straight,
    VerticalLeft,
    VerticalRight,
    HorizontalLeft,
    HorizontalRight,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Curve {
    direction: CurveDirection,
    degree: f32,
}

impl Curve {
    const STRAIGHT: Curve = Curve {
        direction: CurveDirection::Straight,
        degree: 0.0,
    };

    fn new(direction: CurveDirection, degree: f32) -> Self {
        Self { direction, degree }
    }
}

/// Quadratic control point for an edge from `source` to `target`.
///
/// Vertical curves bend by `degree` times the vertical distance, but never
/// further than one column (minus the configured inset) from the target.
/// Horizontal curves bend by `degree` times the horizontal distance.
pub fn control_point(
    source: &PositionedNode,
    target: &PositionedNode,
    direction: CurveDirection,
    degree: f32,
    config: &LayoutConfig,
) -> (f32, f32) {
    let sx = source.x.or(target.x).unwrap_or(0.0);
    let tx = target.x.or(source.x).unwrap_or(0.0);
    let (sy, ty) = (source.y, target.y);
    let reach = config.column_width() - config.curve_clamp_inset;
    let mid_x = (sx + tx) / 2.0;
    let mid_y = (sy + ty) / 2.0;

    match direction {
        CurveDirection::VerticalLeft => {
            let bent = tx - (sy - ty) * degree;
            let x = if sy < ty {
                bent.min(tx + reach)
            } else {
                bent.max(tx - reach)
            };
            (x, mid_y)
        }
        CurveDirection::VerticalRight => {
            let bent = tx + (sy - ty) * degree;
            let x = if sy < ty {
                bent.max(tx - reach)
            } else {
                bent.min(tx + reach)
            };
            (x, mid_y)
        }
        CurveDirection::HorizontalLeft => (mid_x, ty + (sx - tx) * degree),
        CurveDirection::HorizontalRight => (mid_x, ty - (sx - tx) * degree),
        CurveDirection::Straight => (mid_x, mid_y),
    }
}

struct Router<'a> {
    graph: &'a GraphDocument,
    adjacency: &'a Adjacency,
    nodes: &'a [PositionedNode],
    slot: &'a [usize],
    config: &'a LayoutConfig,
}

impl Router<'_> {
    fn node(&self, idx: usize) -> &PositionedNode {
        &self.nodes[self.slot[idx]]
    }

    /// Another edge over the same (source, target) pair with a different label.
    fn duplicate_of(&self, edge: usize) -> Option<usize> {
        let pair = self.adjacency.edges[edge];
        let label = &self.graph.edges[edge].label;
        (0..self.adjacency.edges.len()).find(|&other| {
            other != edge
                && self.adjacency.edges[other] == pair
                && &self.graph.edges[other].label != label
        })
    }

    fn curve_for(&self, edge: usize) -> Curve {
        let (source_idx, target_idx) = self.adjacency.edges[edge];
        let source = self.node(source_idx);
        let target = self.node(target_idx);

        let (Some(source_col), Some(target_col)) = (source.column, target.column) else {
            return self.general(edge);
        };
        if source.level == target.level {
            self.same_row(source_col, target_col, source, target)
        } else if source_col == target_col {
            self.same_column(edge, source_col)
        } else {
            self.general(edge)
        }
    }

    fn same_row(
        &self,
        source_col: usize,
        target_col: usize,
        source: &PositionedNode,
        target: &PositionedNode,
    ) -> Curve {
        if source_col.abs_diff(target_col) <= 1 {
            return Curve::STRAIGHT;
        }
        let direction = if source.x < target.x {
            CurveDirection::HorizontalRight
        } else {
            CurveDirection::HorizontalLeft
        };
        Curve::new(direction, self.config.same_row_degree)
    }

    fn same_column(&self, edge: usize, column: usize) -> Curve {
        let (source_idx, target_idx) = self.adjacency.edges[edge];
        let source_level = self.node(source_idx).level.unwrap_or(0);
        let target_level = self.node(target_idx).level.unwrap_or(0);

        if source_level.abs_diff(target_level) == 1 {
            return match self.duplicate_of(edge) {
                Some(other) => {
                    let direction = if self.graph.edges[edge].label <= self.graph.edges[other].label {
                        CurveDirection::VerticalRight
                    } else {
                        CurveDirection::VerticalLeft
                    };
                    Curve::new(direction, self.config.default_degree)
                }
                None => Curve::STRAIGHT,
            };
        }

        let (low, high) = (source_level.min(target_level), source_level.max(target_level));
        let blocked = self.nodes.iter().any(|node| {
            node.kind == NodeKind::Node
                && node.column == Some(column)
                && node.level.is_some_and(|level| level > low && level < high)
        });
        if !blocked {
            return Curve::STRAIGHT;
        }

        // Bend away from the left neighbour column when another outgoing edge
        // of the source already heads there.
        let left_taken = column.checked_sub(1).is_some_and(|left| {
            self.adjacency.children[source_idx]
                .iter()
                .filter(|&&child| child != target_idx)
                .any(|&child| self.node(child).column == Some(left))
        });
        let direction = if left_taken {
            CurveDirection::VerticalLeft
        } else {
            CurveDirection::VerticalRight
        };
        Curve::new(direction, self.config.detour_degree)
    }

    fn general(&self, edge: usize) -> Curve {
        match self.duplicate_of(edge) {
            Some(other) if self.graph.edges[edge].label <= self.graph.edges[other].label => {
                Curve::new(CurveDirection::VerticalRight, self.config.default_degree)
            }
            _ => Curve::STRAIGHT,
        }
    }
}

/// One positioned edge per input edge, ids following input order.
pub(super) fn route_edges(
    graph: &GraphDocument,
    adjacency: &Adjacency,
    nodes: &[PositionedNode],
    slot: &[usize],
    config: &LayoutConfig,
) -> Vec<PositionedEdge> {
    let router = Router {
        graph,
        adjacency,
        nodes,
        slot,
        config,
    };
    graph
        .edges
        .iter()
        .enumerate()
        .map(|(edge_idx, edge)| {
            let (source_idx, target_idx) = adjacency.edges[edge_idx];
            let source = router.node(source_idx);
            let target = router.node(target_idx);
            let curve = router.curve_for(edge_idx);
            let (cx, cy) = control_point(source, target, curve.direction, curve.degree, config);
            PositionedEdge {
                id: edge_idx,
                source: source.clone(),
                target: target.clone(),
                label: edge.label.clone(),
                cx,
                cy,
                kind: EdgeKind::Link,
            }
        })
        .collect()
}

/// Straight edges from each column's lowest node down to its token.
pub(super) fn link_tokens(
    lowest: &BTreeMap<usize, usize>,
    nodes: &[PositionedNode],
    slot: &[usize],
    first_id: usize,
    config: &LayoutConfig,
) -> Vec<PositionedEdge> {
    let tokens: BTreeMap<usize, &PositionedNode> = nodes
        .iter()
        .filter(|node| node.kind == NodeKind::Token)
        .filter_map(|node| node.column.map(|index| (index, node)))
        .collect();

    let mut edges = Vec::with_capacity(lowest.len());
    for (&index, &node_idx) in lowest {
        let Some(token) = tokens.get(&index) else {
            continue;
        };
        let source = &nodes[slot[node_idx]];
        let (cx, cy) = control_point(source, token, CurveDirection::Straight, 0.0, config);
        edges.push(PositionedEdge {
            id: first_id + edges.len(),
            source: source.clone(),
            target: (*token).clone(),
            label: String::new(),
            cx,
            cy,
            kind: EdgeKind::TokenLink,
        });
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutMode;
    use crate::ir::Span;
    use crate::layout::{LayoutDocument, compute_layout};

    fn lay_out(graph: &GraphDocument, mode: LayoutMode) -> LayoutDocument {
        compute_layout(graph, mode, &LayoutConfig::default()).unwrap()
    }

    fn cp(doc: &LayoutDocument, label: &str) -> (f32, f32) {
        let edge = doc
            .links()
            .find(|edge| edge.label == label)
            .unwrap_or_else(|| panic!("no edge labelled {label}"));
        (edge.cx, edge.cy)
    }

    fn close(actual: (f32, f32), expected: (f32, f32)) -> bool {
        (actual.0 - expected.0).abs() < 1e-3 && (actual.1 - expected.1).abs() < 1e-3
    }

    fn at(x: f32, y: f32) -> PositionedNode {
        PositionedNode {
            id: "n".to_string(),
            x: Some(x),
            y,
            label: String::new(),
            kind: NodeKind::Node,
            level: Some(0),
            column: Some(0),
            anchors: vec![Span::new(0, 1)],
        }
    }

    #[test]
    fn straight_control_point_is_the_midpoint() {
        let config = LayoutConfig::default();
        let cp = control_point(&at(0.0, 0.0), &at(130.0, 200.0), CurveDirection::Straight, 0.0, &config);
        assert_eq!(cp, (65.0, 100.0));
    }

    #[test]
    fn vertical_curves_bend_to_opposite_sides() {
        let config = LayoutConfig::default();
        let source = at(130.0, 0.0);
        let target = at(130.0, 200.0);
        let right = control_point(&source, &target, CurveDirection::VerticalRight, 0.2, &config);
        let left = control_point(&source, &target, CurveDirection::VerticalLeft, 0.2, &config);
        assert_eq!(right, (90.0, 100.0));
        assert_eq!(left, (170.0, 100.0));
    }

    #[test]
    fn vertical_curves_are_clamped_to_one_column() {
        let config = LayoutConfig::default();
        let source = at(0.0, 0.0);
        let target = at(0.0, 1000.0);
        let (x, _) = control_point(&source, &target, CurveDirection::VerticalLeft, 0.4, &config);
        // 130 - 25
        assert_eq!(x, 105.0);
        let (x, _) = control_point(&target, &source, CurveDirection::VerticalRight, 0.4, &config);
        assert_eq!(x, 105.0);
    }

    #[test]
    fn horizontal_curves_offset_by_horizontal_distance() {
        let config = LayoutConfig::default();
        let source = at(0.0, 40.0);
        let target = at(260.0, 40.0);
        let cp = control_point(&source, &target, CurveDirection::HorizontalRight, 0.25, &config);
        assert_eq!(cp, (130.0, 105.0));
    }

    #[test]
    fn missing_x_falls_back_to_the_other_end() {
        let config = LayoutConfig::default();
        let mut source = at(0.0, 0.0);
        source.x = None;
        let target = at(260.0, 100.0);
        let cp = control_point(&source, &target, CurveDirection::Straight, 0.0, &config);
        assert_eq!(cp, (260.0, 50.0));
    }

    #[test]
    fn same_row_edges_arc_unless_adjacent() {
        let mut graph = GraphDocument::new();
        graph.push_tokens("a b c d");
        graph.add_node("a", "a", &[Span::new(0, 1)]);
        graph.add_node("b", "b", &[Span::new(1, 2)]);
        graph.add_node("d", "d", &[Span::new(3, 4)]);
        graph.add_edge("a", "d", "rightwards");
        graph.add_edge("d", "a", "leftwards");
        graph.add_edge("a", "b", "adjacent");

        let doc = lay_out(&graph, LayoutMode::Hierarchical);
        // One level: y = 40; a at x 0, d at x 390.
        assert_eq!(cp(&doc, "adjacent"), (65.0, 40.0));
        // 40 + 390 * 0.25 on either side of travel.
        assert_eq!(cp(&doc, "rightwards"), (195.0, 137.5));
        assert_eq!(cp(&doc, "leftwards"), (195.0, 137.5));
    }

    #[test]
    fn stacked_column_edges_detour_around_the_middle_node() {
        let mut graph = GraphDocument::new();
        graph.push_tokens("x y z");
        graph.add_node("top", "top", &[Span::new(0, 3)]);
        graph.add_node("mid", "mid", &[Span::new(0, 2)]);
        graph.add_node("bottom", "bottom", &[Span::new(0, 1)]);
        graph.add_edge("top", "bottom", "skip");
        graph.add_edge("top", "mid", "step");

        let doc = lay_out(&graph, LayoutMode::Hierarchical);
        let top_y = 280.0 - 2.0 * (280.0 / 3.0);
        // (top_y - 280) * 0.4, bending right of a downward edge.
        assert!(close(cp(&doc, "skip"), (-74.666_67, (top_y + 280.0) / 2.0)));
        let mid_y = 280.0 - 280.0 / 3.0;
        assert!(close(cp(&doc, "step"), (0.0, (top_y + mid_y) / 2.0)));
    }

    #[test]
    fn detour_flips_when_a_sibling_edge_uses_the_left_column() {
        let mut graph = GraphDocument::new();
        graph.push_tokens("w x y z");
        graph.add_node("top", "top", &[Span::new(1, 4)]);
        graph.add_node("mid", "mid", &[Span::new(1, 3)]);
        graph.add_node("bottom", "bottom", &[Span::new(1, 2)]);
        graph.add_node("side", "side", &[Span::new(0, 1)]);
        graph.add_edge("top", "bottom", "skip");
        graph.add_edge("top", "side", "aside");

        let doc = lay_out(&graph, LayoutMode::Hierarchical);
        let (cx, _) = cp(&doc, "skip");
        // 130 + 74.67, still inside the 105 px clamp.
        assert!((cx - 204.666_67).abs() < 1e-3, "cx = {cx}");
        let aside = doc.links().find(|edge| edge.label == "aside").unwrap();
        assert_eq!(aside.cx, (aside.source.x.unwrap() + aside.target.x.unwrap()) / 2.0);
    }

    #[test]
    fn diagonal_duplicates_curve_only_the_smaller_label() {
        let mut graph = GraphDocument::new();
        graph.push_tokens("big dog");
        graph.add_node("X", "X", &[Span::new(0, 2)]);
        graph.add_node("Y", "Y", &[Span::new(1, 2)]);
        graph.add_edge("X", "Y", "b");
        graph.add_edge("X", "Y", "a");

        let doc = lay_out(&graph, LayoutMode::Hierarchical);
        // X at (0, 80), Y at (130, 160).
        assert_eq!(cp(&doc, "b"), (65.0, 120.0));
        assert_eq!(cp(&doc, "a"), (114.0, 120.0));
    }

    #[test]
    fn unresolved_columns_fall_back_to_the_general_rule() {
        let mut graph = GraphDocument::new();
        graph.add_node("P", "want-01", &[]);
        graph.add_node("Q", "boy", &[]);
        graph.add_edge("P", "Q", "a");
        graph.add_edge("P", "Q", "b");

        let doc = lay_out(&graph, LayoutMode::Tree);
        assert!(doc.node("P").unwrap().x.is_none());
        // P at level 1 (y 80), Q at level 0 (y 160); both x default to 0.
        assert_eq!(cp(&doc, "a"), (-16.0, 120.0));
        assert_eq!(cp(&doc, "b"), (0.0, 120.0));
    }
}
