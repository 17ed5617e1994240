/// Referential-integrity failures found while building a simulation from a graph snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphValidationError {
    #[error("node at index {index} has an empty id")]
    EmptyNodeId { index: usize },

    #[error("duplicate node id: {node_id}")]
    DuplicateNodeId { node_id: String },

    #[error("edge {edge_index} references a missing node: {node_id}")]
    MissingNode { edge_index: usize, node_id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    GraphValidation(#[from] GraphValidationError),

    #[error("unknown node id: {node_id}")]
    UnknownNode { node_id: String },

    #[error("all {node_count} nodes share a single position")]
    DegenerateGeometry { node_count: usize },

    #[error("invalid configuration JSON: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
