use super::ids::{PosNum, ReorientedNode, SegmentNum};
use crate::skeleton::Position;
use serde::{Deserialize, Serialize};

/// A deduplicated position with free-text description lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub position: Position,
    #[serde(default)]
    pub description: Vec<String>,
}

impl Node {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            description: Vec::new(),
        }
    }
}

/// A keyframed transition. Always holds at least two positions once stored
/// in a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(default)]
    pub description: Vec<String>,
    pub positions: Vec<Position>,
    /// Whether the transition may also be played from back to front.
    #[serde(default)]
    pub bidirectional: bool,
}

impl Sequence {
    pub fn new(description: impl Into<String>, positions: Vec<Position>) -> Self {
        Self {
            description: vec![description.into()],
            positions,
            bidirectional: false,
        }
    }

    pub fn with_bidirectional(self, bidirectional: bool) -> Self {
        Self {
            bidirectional,
            ..self
        }
    }

    /// First description line, if any.
    pub fn title(&self) -> Option<&str> {
        self.description.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn last_pos(&self) -> PosNum {
        PosNum(self.positions.len().saturating_sub(1))
    }

    pub fn segment_count(&self) -> usize {
        self.positions.len().saturating_sub(1)
    }

    pub fn segments(&self) -> impl Iterator<Item = SegmentNum> {
        (0..self.segment_count()).map(SegmentNum)
    }

    pub fn is_endpoint(&self, pos: PosNum) -> bool {
        pos.0 == 0 || pos == self.last_pos()
    }
}

/// A stored sequence together with its resolved endpoint nodes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Edge {
    pub from: ReorientedNode,
    pub to: ReorientedNode,
    pub sequence: Sequence,
}
