use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a graph node.
///
/// Graph banks disagree on whether ids are numbers or strings, so both are
/// accepted on input and normalised to their decimal/string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Str(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(value) => NodeId(value.to_string()),
            RawId::Str(value) => NodeId(value),
        })
    }
}

/// Token-index range `[from, end)` covered by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub from: usize,
    pub end: usize,
}

impl Span {
    pub fn new(from: usize, end: usize) -> Self {
        Self { from, end }
    }

    pub fn width(&self) -> usize {
        self.end.saturating_sub(self.from)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub label: String,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub anchors: Vec<Span>,
}

impl Node {
    pub fn first_anchor(&self) -> Option<Span> {
        self.anchors.first().copied()
    }

    pub fn is_anchored(&self) -> bool {
        !self.anchors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub index: usize,
    #[serde(default)]
    pub form: String,
}

/// A sentence graph as exchanged with the outside world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_id"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub tops: Vec<NodeId>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub nodes: Vec<Node>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub edges: Vec<Edge>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub tokens: Vec<Token>,
}

impl GraphDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: impl Into<NodeId>, label: &str, anchors: &[Span]) {
        self.nodes.push(Node {
            id: id.into(),
            label: label.to_string(),
            anchors: anchors.to_vec(),
        });
    }

    pub fn add_edge(&mut self, source: impl Into<NodeId>, target: impl Into<NodeId>, label: &str) {
        self.edges.push(Edge {
            source: source.into(),
            target: target.into(),
            label: label.to_string(),
        });
    }

    /// Appends one token per whitespace-separated word of `sentence`.
    pub fn push_tokens(&mut self, sentence: &str) {
        for word in sentence.split_whitespace() {
            let index = self.tokens.len();
            self.tokens.push(Token {
                index,
                form: word.to_string(),
            });
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == id)
    }
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<NodeId>::deserialize(deserializer)?.map(|id| id.0))
}
