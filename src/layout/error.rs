use crate::ir::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// An edge names a node id that is not part of the graph.
    #[error("edge {edge} references unknown node `{node}`")]
    Reference { edge: usize, node: NodeId },

    #[error("graph contains a directed cycle through node `{node}`")]
    CyclicGraph { node: NodeId },

    /// Anchors point at more absent tokens than the config allows filling in.
    #[error("anchor [{from}, {end}) of node `{node}` needs more than {limit} placeholder tokens")]
    MissingTokens {
        node: NodeId,
        from: usize,
        end: usize,
        limit: usize,
    },
}

pub type Result<T> = std::result::Result<T, LayoutError>;
