//! Integrity checks for the node/edge relation.
//!
//! [`Graph::check_consistency`] is always available; the debug hook used
//! after each mutation compiles to nothing in release builds.

use super::{Graph, NodeNum, SeqNum};

/// Which end of a sequence an inconsistency concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEnd {
    From,
    To,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inconsistency {
    TooFewKeyframes {
        sequence: SeqNum,
        len: usize,
    },
    DanglingNode {
        sequence: SeqNum,
        end: EdgeEnd,
        node: NodeNum,
    },
    /// The endpoint keyframe is not the node seen through the recorded reorientation.
    EndpointMismatch {
        sequence: SeqNum,
        end: EdgeEnd,
        distance_squared_sum: f32,
    },
}

impl Graph {
    pub fn check_consistency(&self) -> Vec<Inconsistency> {
        let mut problems = Vec::new();

        for (i, edge) in self.edges.iter().enumerate() {
            let sequence = SeqNum::new(i);
            let positions = &edge.sequence.positions;
            let (Some(first), Some(last)) = (positions.first(), positions.last()) else {
                problems.push(Inconsistency::TooFewKeyframes { sequence, len: 0 });
                continue;
            };
            if positions.len() < 2 {
                problems.push(Inconsistency::TooFewKeyframes {
                    sequence,
                    len: positions.len(),
                });
            }

            for (end, rn, keyframe) in [
                (EdgeEnd::From, &edge.from, first),
                (EdgeEnd::To, &edge.to, last),
            ] {
                let Some(node) = self.nodes.get(rn.node.index()) else {
                    problems.push(Inconsistency::DanglingNode {
                        sequence,
                        end,
                        node: rn.node,
                    });
                    continue;
                };
                let seen = rn.reorientation.apply(&node.position);
                if !self.tolerance.basically_same(&seen, keyframe) {
                    problems.push(Inconsistency::EndpointMismatch {
                        sequence,
                        end,
                        distance_squared_sum: seen.distance_squared_sum(keyframe),
                    });
                }
            }
        }

        problems
    }
}

#[allow(unused_variables)]
pub(super) fn debug_check_graph(graph: &Graph) {
    #[cfg(debug_assertions)]
    {
        let problems = graph.check_consistency();
        debug_assert!(problems.is_empty(), "Graph is inconsistent: {:?}", problems);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Sequence;
    use crate::skeleton::{Joint, Player, PlayerJoint};
    use crate::skeleton_constants::reaching_pair;

    #[test]
    fn test_detects_tampered_endpoint() {
        let a = reaching_pair();
        let knee = PlayerJoint::new(Player::Second, Joint::RightKnee);
        let mut b = a;
        b[knee].y += 0.4;
        let mut g = Graph::default();
        let s = g.insert_sequence(Sequence::new("ab", vec![a, b])).unwrap();
        assert!(g.check_consistency().is_empty());

        // Bypass `replace` so nothing re-resolves the end.
        g.edges[s.index()].sequence.positions[1][knee].y += 0.5;
        let problems = g.check_consistency();
        assert_eq!(problems.len(), 1, "problems: {:?}", problems);
        assert!(matches!(
            problems[0],
            Inconsistency::EndpointMismatch {
                end: EdgeEnd::To,
                ..
            }
        ));
    }
}
