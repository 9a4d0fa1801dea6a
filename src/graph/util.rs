//! Navigation helpers over a [`Graph`].

use super::{
    Graph, NodeNum, PositionInSequence, Reoriented, ReorientedLocation, ReorientedNode, SeqNum,
};
use crate::error::{GraphError, GraphResult};
use crate::skeleton::Position;
use std::collections::BTreeSet;

/// A sequence traversed in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Step {
    pub sequence: SeqNum,
    pub reverse: bool,
}

impl Step {
    pub fn forward(sequence: SeqNum) -> Self {
        Self {
            sequence,
            reverse: false,
        }
    }

    pub fn backward(sequence: SeqNum) -> Self {
        Self {
            sequence,
            reverse: true,
        }
    }
}

impl Graph {
    /// Sequences ending at `n`.
    pub fn in_sequences(&self, n: NodeNum) -> Vec<SeqNum> {
        self.seqnums()
            .filter(|&s| self.edges[s.index()].to.node == n)
            .collect()
    }

    /// Sequences starting at `n`.
    pub fn out_sequences(&self, n: NodeNum) -> Vec<SeqNum> {
        self.seqnums()
            .filter(|&s| self.edges[s.index()].from.node == n)
            .collect()
    }

    /// Ways of arriving at `n`, including bidirectional sequences played backwards.
    pub fn in_steps(&self, n: NodeNum) -> Vec<Step> {
        let mut steps = Vec::new();
        for s in self.seqnums() {
            let e = &self.edges[s.index()];
            if e.to.node == n {
                steps.push(Step::forward(s));
            }
            if e.sequence.bidirectional && e.from.node == n {
                steps.push(Step::backward(s));
            }
        }
        steps
    }

    /// Ways of leaving `n`, including bidirectional sequences played backwards.
    pub fn out_steps(&self, n: NodeNum) -> Vec<Step> {
        let mut steps = Vec::new();
        for s in self.seqnums() {
            let e = &self.edges[s.index()];
            if e.from.node == n {
                steps.push(Step::forward(s));
            }
            if e.sequence.bidirectional && e.to.node == n {
                steps.push(Step::backward(s));
            }
        }
        steps
    }

    pub fn step_from(&self, step: Step) -> GraphResult<ReorientedNode> {
        if step.reverse {
            self.to(step.sequence)
        } else {
            self.from(step.sequence)
        }
    }

    pub fn step_to(&self, step: Step) -> GraphResult<ReorientedNode> {
        if step.reverse {
            self.from(step.sequence)
        } else {
            self.to(step.sequence)
        }
    }

    /// Whether some sequence joins `a` and `b`, in either direction.
    pub fn connected(&self, a: NodeNum, b: NodeNum) -> bool {
        self.edges.iter().any(|e| {
            (e.from.node == a && e.to.node == b) || (e.from.node == b && e.to.node == a)
        })
    }

    /// `nodes` plus everything within `depth` sequences of them.
    pub fn nodes_around(&self, nodes: &BTreeSet<NodeNum>, depth: usize) -> BTreeSet<NodeNum> {
        let mut around = nodes.clone();
        for _ in 0..depth {
            let frontier: Vec<NodeNum> = self
                .edges
                .iter()
                .filter_map(|e| {
                    match (around.contains(&e.from.node), around.contains(&e.to.node)) {
                        (true, false) => Some(e.to.node),
                        (false, true) => Some(e.from.node),
                        _ => None,
                    }
                })
                .collect();
            if frontier.is_empty() {
                break;
            }
            around.extend(frontier);
        }
        around
    }

    pub fn next_pos(&self, pis: PositionInSequence) -> Option<PositionInSequence> {
        let seq = self.sequence(pis.sequence).ok()?;
        (pis.position < seq.last_pos())
            .then(|| PositionInSequence::new(pis.sequence, pis.position.next()))
    }

    pub fn prev_pos(&self, pis: PositionInSequence) -> Option<PositionInSequence> {
        pis.position
            .prev()
            .map(|p| PositionInSequence::new(pis.sequence, p))
    }

    /// Some keyframe denoting `n`: the start of a sequence leaving it, or
    /// failing that the end of one arriving.
    pub fn node_as_posinseq(&self, n: NodeNum) -> Option<PositionInSequence> {
        self.seqnums()
            .find(|&s| self.edges[s.index()].from.node == n)
            .map(|s| PositionInSequence::new(s, super::PosNum::FIRST))
            .or_else(|| {
                self.seqnums()
                    .find(|&s| self.edges[s.index()].to.node == n)
                    .map(|s| PositionInSequence::new(s, self[s].last_pos()))
            })
    }

    /// Enter `s` at the end where `rn` sits.
    ///
    /// The returned reorientation maps the sequence's stored keyframes into
    /// `rn`'s frame; the step is backwards if `rn` is at the sequence's end.
    /// A loop sequence is entered at its start.
    pub fn enter(&self, rn: &ReorientedNode, s: SeqNum) -> GraphResult<Reoriented<Step>> {
        let e = self.edge(s)?;
        if e.from.node == rn.node {
            Ok(Reoriented::new(
                Step::forward(s),
                e.from.reorientation.inverse().compose(&rn.reorientation),
            ))
        } else if e.to.node == rn.node {
            Ok(Reoriented::new(
                Step::backward(s),
                e.to.reorientation.inverse().compose(&rn.reorientation),
            ))
        } else {
            Err(GraphError::NotApplicable("node is not an end of the sequence"))
        }
    }

    /// Frames for playing `s` from `rn`, and the node it arrives at.
    ///
    /// Each segment contributes `frames_per_pos` interpolated frames; the
    /// arriving keyframe itself is left out so consecutive calls chain.
    pub fn follow(
        &self,
        rn: &ReorientedNode,
        s: SeqNum,
        frames_per_pos: usize,
    ) -> GraphResult<(Vec<Position>, ReorientedNode)> {
        let entered = self.enter(rn, s)?;
        let r = entered.reorientation;
        let e = &self.edges[s.index()];
        let frames = frames_per_pos.max(1);

        let mut keyframes: Vec<Position> = e.sequence.positions.iter().map(|p| r.apply(p)).collect();
        if entered.value.reverse {
            keyframes.reverse();
        }

        let mut out = Vec::with_capacity(e.sequence.segment_count() * frames);
        for pair in keyframes.windows(2) {
            for f in 0..frames {
                out.push(Position::between(&pair[0], &pair[1], f as f32 / frames as f32));
            }
        }

        let arrival = if entered.value.reverse { e.from } else { e.to };
        Ok((
            out,
            ReorientedNode {
                node: arrival.node,
                reorientation: arrival.reorientation.compose(&r),
            },
        ))
    }

    /// The interpolated position at a reoriented location.
    pub fn position_at(&self, loc: &ReorientedLocation) -> GraphResult<Position> {
        let seg = loc.value.segment;
        let a = self.position(seg.from_pos())?;
        let b = self.position(seg.to_pos())?;
        Ok(loc
            .reorientation
            .apply(&Position::between(a, b, loc.value.how_far)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Location, PosNum, SegmentInSequence, SegmentNum, Sequence};
    use crate::reorientation::Reorientation;
    use crate::skeleton::{Joint, Player, PlayerJoint};
    use crate::skeleton_constants::reaching_pair;
    use glam::Vec3;

    fn lifted(p: &Position, joint: Joint) -> Position {
        let mut q = *p;
        q[PlayerJoint::new(Player::Second, joint)].y += 0.4;
        q
    }

    /// a -> b (three keyframes), b -> c (bidirectional), and an unconnected d -> e.
    fn small_graph() -> (Graph, [SeqNum; 3]) {
        let a = reaching_pair();
        let b = lifted(&a, Joint::RightKnee);
        let c = lifted(&a, Joint::LeftKnee);
        let d = lifted(&a, Joint::LeftElbow);
        let e = lifted(&a, Joint::RightElbow);
        let mut g = Graph::default();
        let ab = g
            .insert_sequence(Sequence::new("ab", vec![a, Position::between(&a, &b, 0.5), b]))
            .unwrap();
        let bc = g
            .insert_sequence(Sequence::new("bc", vec![b, c]).with_bidirectional(true))
            .unwrap();
        let de = g.insert_sequence(Sequence::new("de", vec![d, e])).unwrap();
        (g, [ab, bc, de])
    }

    #[test]
    fn test_steps_honor_bidirectional() {
        let (g, [ab, bc, _]) = small_graph();
        let b = g.to(ab).unwrap().node;
        let c = g.to(bc).unwrap().node;

        assert_eq!(g.in_sequences(b), vec![ab]);
        assert_eq!(g.out_sequences(b), vec![bc]);
        assert_eq!(g.out_steps(c), vec![Step::backward(bc)]);
        assert_eq!(g.in_steps(b), vec![Step::forward(ab), Step::backward(bc)]);
        assert_eq!(g.step_to(Step::backward(bc)).unwrap().node, b);
    }

    #[test]
    fn test_nodes_around_expands_by_depth() {
        let (g, [ab, bc, de]) = small_graph();
        let a = g.from(ab).unwrap().node;
        let b = g.to(ab).unwrap().node;
        let c = g.to(bc).unwrap().node;

        assert!(g.connected(b, a));
        assert!(!g.connected(a, c));

        let start = BTreeSet::from([a]);
        assert_eq!(g.nodes_around(&start, 0), start);
        assert_eq!(g.nodes_around(&start, 1), BTreeSet::from([a, b]));
        let far = g.nodes_around(&start, 10);
        assert_eq!(far, BTreeSet::from([a, b, c]));
        assert!(!far.contains(&g.from(de).unwrap().node));
    }

    #[test]
    fn test_next_prev_and_node_lookup() {
        let (g, [ab, bc, _]) = small_graph();
        let mid = PositionInSequence::new(ab, PosNum(1));
        assert_eq!(g.next_pos(mid), Some(PositionInSequence::new(ab, PosNum(2))));
        assert_eq!(g.prev_pos(mid), Some(PositionInSequence::new(ab, PosNum(0))));
        assert_eq!(g.next_pos(PositionInSequence::new(ab, PosNum(2))), None);
        assert_eq!(g.prev_pos(PositionInSequence::new(ab, PosNum(0))), None);

        let c = g.to(bc).unwrap().node;
        assert_eq!(g.node_as_posinseq(c), Some(PositionInSequence::new(bc, PosNum(1))));
        assert_eq!(g.node_at(mid), None);
    }

    #[test]
    fn test_follow_forward_and_back() {
        let (g, [ab, _, _]) = small_graph();
        let tol = *g.tolerance();
        let view = Reorientation::new(Vec3::new(1.0, 0.0, 3.0), 0.4).with_mirror(true);

        let start = g.from(ab).unwrap();
        let start = ReorientedNode {
            node: start.node,
            reorientation: start.reorientation.compose(&view),
        };
        let (frames, arrival) = g.follow(&start, ab, 4).unwrap();
        assert_eq!(frames.len(), 8);
        assert!(tol.basically_same(&frames[0], &g.node_position(&start).unwrap()));
        assert_eq!(arrival.node, g.to(ab).unwrap().node);
        assert!(tol.basically_same(
            &g.node_position(&arrival).unwrap(),
            &view.apply(&g[ab].positions[2])
        ));

        let (back, home) = g.follow(&arrival, ab, 2).unwrap();
        assert_eq!(back.len(), 4);
        assert!(tol.basically_same(&back[0], &g.node_position(&arrival).unwrap()));
        assert_eq!(home.node, start.node);
        assert!(tol.basically_same(
            &g.node_position(&home).unwrap(),
            &g.node_position(&start).unwrap()
        ));
    }

    #[test]
    fn test_enter_unrelated_sequence_is_not_applicable() {
        let (g, [ab, _, de]) = small_graph();
        let a = g.from(ab).unwrap();
        assert!(matches!(g.enter(&a, de), Err(GraphError::NotApplicable(_))));
    }

    #[test]
    fn test_position_at_interpolates_and_reorients() {
        let (g, [ab, _, _]) = small_graph();
        let r = Reorientation::new(Vec3::new(0.0, 0.0, 1.0), 1.0);
        let loc = Reoriented::new(
            Location::new(SegmentInSequence::new(ab, SegmentNum(1)), 0.5),
            r,
        );
        let expected = r.apply(&Position::between(
            &g[ab].positions[1],
            &g[ab].positions[2],
            0.5,
        ));
        assert_eq!(g.position_at(&loc).unwrap(), expected);
    }
}
