//! Error types for graph mutation and loading.
//!
//! "No equivalent node" and "operation does not apply here" are kept as
//! separate variants so callers can tell a miss from a refusal.

use crate::graph::{NodeNum, PositionInSequence, SeqNum};

/// Result alias used throughout the graph API.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors returned by [`crate::graph::Graph`] operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// No node in the graph is reoriented-equivalent to the given position.
    #[error("no node matches the given position")]
    NotFound,

    /// The operation cannot apply to this kind of location.
    ///
    /// Erasing one of the last two keyframes, splitting at a node, and
    /// erasing the only remaining sequence all end up here.
    #[error("operation not applicable: {0}")]
    NotApplicable(&'static str),

    /// A sequence number does not name a sequence in the graph.
    #[error("sequence {0} out of range")]
    SequenceOutOfRange(SeqNum),

    /// A node number does not name a node in the graph.
    #[error("node {0} out of range")]
    NodeOutOfRange(NodeNum),

    /// A keyframe index is past the end of its sequence.
    #[error("position {0} out of range")]
    PositionOutOfRange(PositionInSequence),

    /// Corrupt input handed to the load constructor.
    #[error("malformed graph data: {0}")]
    Malformed(String),
}

impl GraphError {
    /// Whether the caller can simply carry on (the graph is unchanged).
    #[inline]
    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::NotFound | Self::NotApplicable(_))
    }
}

/// Position cardinality errors, raised when decoding flat joint lists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("expected {expected} joint coordinates, got {got}")]
    WrongJointCount { expected: usize, got: usize },

    #[error("joint coordinate {index} is not finite")]
    NonFinite { index: usize },
}

impl From<PositionError> for GraphError {
    fn from(e: PositionError) -> Self {
        GraphError::Malformed(e.to_string())
    }
}
