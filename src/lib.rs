pub mod analysis;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dataset;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, LayoutMode};
pub use ir::{Edge, GraphDocument, Node, NodeId, Span, Token};
pub use layout::{LayoutDocument, LayoutError, compute_layout};

/// Parses a graph document and returns its layout as JSON.
pub fn layout_json(input: &str, mode: LayoutMode, config: &LayoutConfig) -> anyhow::Result<String> {
    let graph = parser::parse_graph(input)?;
    let layout = compute_layout(&graph, mode, config)?;
    Ok(serde_json::to_string(&layout)?)
}
