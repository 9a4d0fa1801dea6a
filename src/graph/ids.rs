//! Index newtypes and the location types built from them.
//!
//! `NodeNum` and `SeqNum` can only be minted by the graph; outside this
//! module they are opaque handles. Keyframe and segment indices are plain
//! offsets with `next`/`prev` stepping.

use crate::reorientation::Reorientation;
use std::fmt;

macro_rules! graph_index {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub(in crate::graph) fn new(index: usize) -> Self {
                Self(index as u32)
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

graph_index!(
    /// Handle to a node (a deduplicated position).
    NodeNum,
    "n"
);
graph_index!(
    /// Handle to a sequence (an edge between two nodes).
    SeqNum,
    "s"
);

/// Index of a keyframe within a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PosNum(pub usize);

impl PosNum {
    pub const FIRST: PosNum = PosNum(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    #[inline]
    pub fn next(self) -> PosNum {
        PosNum(self.0 + 1)
    }

    #[inline]
    pub fn prev(self) -> Option<PosNum> {
        self.0.checked_sub(1).map(PosNum)
    }
}

/// Index of the gap between keyframes `n` and `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentNum(pub usize);

impl SegmentNum {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    #[inline]
    pub fn next(self) -> SegmentNum {
        SegmentNum(self.0 + 1)
    }

    #[inline]
    pub fn prev(self) -> Option<SegmentNum> {
        self.0.checked_sub(1).map(SegmentNum)
    }

    /// Keyframe at the start of this segment.
    #[inline]
    pub fn from_pos(self) -> PosNum {
        PosNum(self.0)
    }

    /// Keyframe at the end of this segment.
    #[inline]
    pub fn to_pos(self) -> PosNum {
        PosNum(self.0 + 1)
    }
}

/// A node seen through a reorientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReorientedNode {
    pub node: NodeNum,
    pub reorientation: Reorientation,
}

/// Any graph location seen through a reorientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reoriented<T> {
    pub value: T,
    pub reorientation: Reorientation,
}

impl<T> Reoriented<T> {
    pub fn new(value: T, reorientation: Reorientation) -> Self {
        Self {
            value,
            reorientation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionInSequence {
    pub sequence: SeqNum,
    pub position: PosNum,
}

impl PositionInSequence {
    pub fn new(sequence: SeqNum, position: PosNum) -> Self {
        Self { sequence, position }
    }
}

impl fmt::Display for PositionInSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.sequence, self.position.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentInSequence {
    pub sequence: SeqNum,
    pub segment: SegmentNum,
}

impl SegmentInSequence {
    pub fn new(sequence: SeqNum, segment: SegmentNum) -> Self {
        Self { sequence, segment }
    }

    pub fn from_pos(self) -> PositionInSequence {
        PositionInSequence::new(self.sequence, self.segment.from_pos())
    }

    pub fn to_pos(self) -> PositionInSequence {
        PositionInSequence::new(self.sequence, self.segment.to_pos())
    }
}

/// A point partway along a segment; `how_far` is in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub segment: SegmentInSequence,
    pub how_far: f32,
}

impl Location {
    pub fn new(segment: SegmentInSequence, how_far: f32) -> Self {
        Self {
            segment,
            how_far: how_far.clamp(0.0, 1.0),
        }
    }

    /// The location of keyframe `pis` in a sequence whose last keyframe is `last`.
    ///
    /// Interior and first keyframes start their following segment; the last
    /// keyframe ends the final segment.
    pub fn on_keyframe(pis: PositionInSequence, last: PosNum) -> Self {
        if pis.position < last {
            Self::new(
                SegmentInSequence::new(pis.sequence, SegmentNum(pis.position.0)),
                0.0,
            )
        } else {
            Self::new(
                SegmentInSequence::new(pis.sequence, SegmentNum(last.0.saturating_sub(1))),
                1.0,
            )
        }
    }

    /// The keyframe this location sits exactly on, if any.
    pub fn keyframe(&self) -> Option<PositionInSequence> {
        if self.how_far == 0.0 {
            Some(self.segment.from_pos())
        } else if self.how_far == 1.0 {
            Some(self.segment.to_pos())
        } else {
            None
        }
    }

    /// The keyframe this location sits on or is nearest to.
    pub fn nearest_pos(&self) -> PositionInSequence {
        if self.how_far < 0.5 {
            self.segment.from_pos()
        } else {
            self.segment.to_pos()
        }
    }
}

pub type ReorientedLocation = Reoriented<Location>;
