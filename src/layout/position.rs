use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::config::LayoutConfig;
use crate::ir::{GraphDocument, Span, Token};

use super::columns::Columns;
use super::error::{LayoutError, Result};
use super::overlap::Placement;
use super::types::{NodeKind, PositionedNode};

/// Vertical frame shared by every node of one layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Frame {
    pub(super) level_count: usize,
    pub(super) total_height: f32,
    pub(super) column_width: f32,
    pub(super) token_row_y: f32,
}

impl Frame {
    pub(super) fn new(config: &LayoutConfig, level_count: usize) -> Self {
        let levels = level_count as f32;
        let total_height = if level_count == 0 {
            0.0
        } else {
            levels * config.node_height + (levels - 1.0) * config.inter_level_spacing
        };
        Self {
            level_count,
            total_height,
            column_width: config.column_width(),
            token_row_y: total_height + config.token_level_spacing,
        }
    }

    pub(super) fn column_x(&self, column: usize) -> f32 {
        column as f32 * self.column_width
    }

    pub(super) fn level_y(&self, level: usize) -> f32 {
        if self.level_count == 0 {
            return 0.0;
        }
        self.total_height - level as f32 * (self.total_height / self.level_count as f32)
    }
}

/// Positioned graph nodes (row by row, bottom level first) followed by the
/// token row. The second value maps a node index to its slot in the list.
pub(super) fn materialize(
    graph: &GraphDocument,
    columns: &Columns,
    placement: &Placement,
    frame: &Frame,
    max_missing_tokens: usize,
) -> Result<(Vec<PositionedNode>, Vec<usize>)> {
    let tokens = token_row(graph, max_missing_tokens)?;
    let mut nodes = Vec::with_capacity(graph.nodes.len() + graph.tokens.len());
    let mut slot = vec![0usize; graph.nodes.len()];

    for (level, row) in placement.rows.iter().enumerate() {
        for &idx in row {
            let node = &graph.nodes[idx];
            let column = columns.column[idx];
            slot[idx] = nodes.len();
            nodes.push(PositionedNode {
                id: node.id.to_string(),
                x: column.map(|c| frame.column_x(c)),
                y: frame.level_y(level),
                label: node.label.clone(),
                kind: NodeKind::Node,
                level: Some(level),
                column,
                anchors: node.anchors.clone(),
            });
        }
    }

    for token in tokens {
        nodes.push(PositionedNode {
            id: token.index.to_string(),
            x: Some(frame.column_x(token.index)),
            y: frame.token_row_y,
            label: token.form.clone(),
            kind: NodeKind::Token,
            level: None,
            column: Some(token.index),
            anchors: vec![Span::new(token.index, token.index + 1)],
        });
    }

    Ok((nodes, slot))
}

/// The graph's tokens by index, with placeholders for indices that some
/// anchor covers but the token list lacks. At most `max_missing` placeholders
/// are created; zero-width anchors still get a token at their start.
pub(super) fn token_row(graph: &GraphDocument, max_missing: usize) -> Result<Vec<Token>> {
    let mut row: BTreeMap<usize, Token> = BTreeMap::new();
    for token in &graph.tokens {
        row.entry(token.index).or_insert_with(|| token.clone());
    }

    let mut created = 0usize;
    for node in &graph.nodes {
        for span in &node.anchors {
            let end = span.end.max(span.from.saturating_add(1));
            let mut missing = 0usize;
            for index in span.from..end {
                let Entry::Vacant(slot) = row.entry(index) else {
                    continue;
                };
                if created == max_missing {
                    return Err(LayoutError::MissingTokens {
                        node: node.id.clone(),
                        from: span.from,
                        end: span.end,
                        limit: max_missing,
                    });
                }
                slot.insert(Token {
                    index,
                    form: String::new(),
                });
                created += 1;
                missing += 1;
            }
            if missing > 0 {
                tracing::warn!(
                    node = %node.id,
                    from = span.from,
                    end = span.end,
                    missing,
                    "anchor covers missing tokens"
                );
            }
        }
    }
    Ok(row.into_values().collect())
}

/// Canvas extent: right edge of the widest column and bottom of the token row.
pub(super) fn extent(nodes: &[PositionedNode], config: &LayoutConfig, frame: &Frame) -> (f32, f32) {
    let width = nodes
        .iter()
        .filter_map(|node| node.x)
        .fold(None, |acc: Option<f32>, x| Some(acc.map_or(x, |m| m.max(x))))
        .map_or(0.0, |max_x| max_x + config.node_width);
    let height = if nodes.is_empty() {
        0.0
    } else {
        frame.token_row_y + config.node_height
    };
    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_matches_reference_spacing() {
        let config = LayoutConfig::default();
        let frame = Frame::new(&config, 3);
        // 3 * 40 + 2 * 80
        assert_eq!(frame.total_height, 280.0);
        assert_eq!(frame.token_row_y, 420.0);
        assert_eq!(frame.level_y(0), 280.0);
        assert!((frame.level_y(2) - 280.0 / 3.0).abs() < 1e-3);
        assert_eq!(frame.column_x(2), 260.0);
    }

    #[test]
    fn empty_frame_is_flat() {
        let frame = Frame::new(&LayoutConfig::default(), 0);
        assert_eq!(frame.total_height, 0.0);
        assert_eq!(frame.level_y(0), 0.0);
        assert_eq!(frame.token_row_y, 140.0);
    }

    #[test]
    fn token_row_fills_gaps_from_anchors() {
        let mut graph = GraphDocument::new();
        graph.push_tokens("Dogs bark");
        graph.add_node("n", "n", &[Span::new(1, 4)]);
        let row = token_row(&graph, 16).unwrap();
        let indices: Vec<usize> = row.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(row[1].form, "bark");
        assert_eq!(row[3].form, "");
    }

    #[test]
    fn placeholder_tokens_are_capped() {
        let mut graph = GraphDocument::new();
        graph.push_tokens("a b");
        graph.add_node("wide", "wide", &[Span::new(0, 4_000_000_000)]);
        let err = token_row(&graph, 1024).unwrap_err();
        assert_eq!(
            err,
            LayoutError::MissingTokens {
                node: "wide".into(),
                from: 0,
                end: 4_000_000_000,
                limit: 1024,
            }
        );
        assert!(token_row(&graph, 0).unwrap_err().to_string().contains("`wide`"));
    }

    #[test]
    fn anchor_at_the_last_index_does_not_overflow() {
        let mut graph = GraphDocument::new();
        graph.add_node("edge", "edge", &[Span::new(usize::MAX, usize::MAX)]);
        graph.add_node("empty", "empty", &[Span::new(3, 3)]);
        let row = token_row(&graph, 16).unwrap();
        let indices: Vec<usize> = row.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![3]);
    }
}
