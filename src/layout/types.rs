use serde::Serialize;

use crate::config::LayoutMode;
use crate::ir::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Node,
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    Link,
    TokenLink,
}

/// A graph node or token with its final coordinates.
///
/// `x` and `column` are `None` for nodes whose column could not be
/// inferred from anchors or neighbours. Tokens have no `level`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub id: String,
    pub x: Option<f32>,
    pub y: f32,
    pub label: String,
    pub kind: NodeKind,
    pub level: Option<usize>,
    pub column: Option<usize>,
    pub anchors: Vec<Span>,
}

/// An edge drawn as a quadratic curve through the control point `(cx, cy)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedEdge {
    pub id: usize,
    pub source: PositionedNode,
    pub target: PositionedNode,
    pub label: String,
    pub cx: f32,
    pub cy: f32,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    pub mode: LayoutMode,
    pub level_count: usize,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<PositionedEdge>,
}

impl LayoutDocument {
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes
            .iter()
            .find(|node| node.kind == NodeKind::Node && node.id == id)
    }

    pub fn token(&self, index: usize) -> Option<&PositionedNode> {
        let id = index.to_string();
        self.nodes
            .iter()
            .find(|node| node.kind == NodeKind::Token && node.id == id)
    }

    pub fn links(&self) -> impl Iterator<Item = &PositionedEdge> {
        self.edges.iter().filter(|edge| edge.kind == EdgeKind::Link)
    }

    pub fn token_links(&self) -> impl Iterator<Item = &PositionedEdge> {
        self.edges
            .iter()
            .filter(|edge| edge.kind == EdgeKind::TokenLink)
    }
}
