//! Interactive editing session over one graph.
//!
//! The session owns the graph, the viewer's location in it, and an undo
//! stack of whole-graph snapshots. Every edit pushes a snapshot first and
//! pops it again if the edit fails, so a refused edit leaves nothing behind.

use crate::camera::WorldToScreen;
use crate::config::EngineConfig;
use crate::error::{GraphError, GraphResult};
use crate::graph::{
    Graph, Location, Node, PosNum, PositionInSequence, Reoriented, ReorientedLocation,
    ReorientedNode, SegmentInSequence, SegmentNum, SeqNum, Sequence,
};
use crate::reorientation::Reorientation;
use crate::skeleton::{PlayerJoint, Position};
use crate::spring::relax_repeatedly;
use crate::viables::{determine_all_viables, determine_viables, nearest_on_viables, AllViables};
use glam::{Vec2, Vec3};

pub struct EditorSession {
    graph: Graph,
    location: ReorientedLocation,
    undo_stack: Vec<(Graph, ReorientedLocation)>,
    config: EngineConfig,
    /// In edit mode every joint can be dragged along viables.
    pub edit_mode: bool,
}

impl EditorSession {
    /// Start at the first keyframe of the first sequence.
    pub fn new(graph: Graph, config: EngineConfig) -> GraphResult<Self> {
        let Some(s) = graph.seqnums().next() else {
            log::warn!("Cannot start editing an empty graph");
            return Err(GraphError::NotApplicable("graph has no sequences"));
        };
        log::info!(
            "Started editing {} nodes and {} sequences",
            graph.node_count(),
            graph.sequence_count()
        );
        Ok(Self {
            graph,
            location: Reoriented::new(
                Location::new(SegmentInSequence::new(s, SegmentNum(0)), 0.0),
                Reorientation::IDENTITY,
            ),
            undo_stack: Vec::new(),
            config,
            edit_mode: false,
        })
    }

    /// Load a graph with the session's tolerance and start editing it.
    pub fn from_parts(
        nodes: Vec<Node>,
        sequences: Vec<Sequence>,
        config: EngineConfig,
    ) -> GraphResult<Self> {
        let graph = Graph::from_parts(nodes, sequences, config.tolerance)?;
        Self::new(graph, config)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn location(&self) -> &ReorientedLocation {
        &self.location
    }

    pub fn set_location(&mut self, location: ReorientedLocation) -> GraphResult<()> {
        self.graph.position_at(&location)?;
        self.location = location;
        Ok(())
    }

    pub fn current_position(&self) -> GraphResult<Position> {
        self.graph.position_at(&self.location)
    }

    /// The keyframe the location sits exactly on, if any.
    pub fn current_keyframe(&self) -> Option<PositionInSequence> {
        self.location.value.keyframe()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    fn push_undo(&mut self) {
        self.undo_stack.push((self.graph.clone(), self.location));
    }

    /// Restore the state before the last edit. Returns false if there is none.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some((graph, location)) => {
                self.graph = graph;
                self.location = location;
                log::info!("Undo ({} left)", self.undo_stack.len());
                true
            }
            None => false,
        }
    }

    fn with_undo<T>(&mut self, edit: impl FnOnce(&mut Self) -> GraphResult<T>) -> GraphResult<T> {
        self.push_undo();
        let result = edit(self);
        if let Err(e) = &result {
            log::warn!("Edit refused: {}", e);
            if let Some((graph, location)) = self.undo_stack.pop() {
                self.graph = graph;
                self.location = location;
            }
        }
        result
    }

    fn last_pos(&self, s: SeqNum) -> GraphResult<PosNum> {
        Ok(self.graph.sequence(s)?.last_pos())
    }

    fn move_to_keyframe(&mut self, pis: PositionInSequence, reorientation: Reorientation) -> GraphResult<()> {
        let last = self.last_pos(pis.sequence)?;
        self.location = Reoriented::new(Location::on_keyframe(pis, last), reorientation);
        Ok(())
    }

    /// Move onto the nearest keyframe and return it.
    pub fn snap_to_keyframe(&mut self) -> GraphResult<PositionInSequence> {
        let pis = self.location.value.nearest_pos();
        self.move_to_keyframe(pis, self.location.reorientation)?;
        Ok(pis)
    }

    /// Store `viewed` (as seen through the location's reorientation) at `pis`.
    fn replace_viewed(&mut self, pis: PositionInSequence, viewed: &Position, local: bool) -> GraphResult<()> {
        let stored = self.location.reorientation.inverse().apply(viewed);
        self.graph.replace(pis, &stored, local)
    }

    /// Replace the current keyframe with `p`, given in view coordinates.
    pub fn replace(&mut self, p: &Position, local: bool) -> GraphResult<()> {
        self.with_undo(|ed| {
            let pis = ed.snap_to_keyframe()?;
            ed.replace_viewed(pis, p, local)
        })
    }

    /// Put `joint` at `target` and let the rest of the body follow.
    ///
    /// Dragging a node keyframe moves the node for every sequence touching it.
    pub fn drag_joint(&mut self, joint: PlayerJoint, target: Vec3) -> GraphResult<()> {
        self.with_undo(|ed| {
            let pis = ed.snap_to_keyframe()?;
            let mut p = ed.current_position()?;
            p[joint] = target;
            let p = relax_repeatedly(&p, Some(joint), ed.config.relax.passes_after_drag);
            ed.replace_viewed(pis, &p, false)
        })
    }

    /// Split the current segment with a new relaxed keyframe and move onto it.
    pub fn insert_keyframe(&mut self) -> GraphResult<PositionInSequence> {
        self.with_undo(|ed| {
            let pis = ed.graph.insert_keyframe(ed.location.value)?;
            let p = relax_repeatedly(
                ed.graph.position(pis)?,
                None,
                ed.config.relax.passes_after_insert,
            );
            ed.graph.replace(pis, &p, false)?;
            ed.move_to_keyframe(pis, ed.location.reorientation)?;
            Ok(pis)
        })
    }

    pub fn delete_keyframe(&mut self) -> GraphResult<()> {
        self.with_undo(|ed| {
            let pis = ed.location.value.nearest_pos();
            let pos = ed.graph.erase(pis)?;
            ed.move_to_keyframe(PositionInSequence::new(pis.sequence, pos), ed.location.reorientation)
        })
    }

    /// Cut the current sequence at the current keyframe; returns the new second half.
    pub fn branch(&mut self) -> GraphResult<SeqNum> {
        self.with_undo(|ed| {
            let pis = ed.snap_to_keyframe()?;
            let tail = ed.graph.split_at(pis)?;
            ed.move_to_keyframe(pis, ed.location.reorientation)?;
            Ok(tail)
        })
    }

    fn reorient_current(&mut self, r: Reorientation) -> GraphResult<()> {
        self.with_undo(|ed| {
            let pis = ed.snap_to_keyframe()?;
            let p = r.apply(&ed.current_position()?);
            ed.replace_viewed(pis, &p, true)
        })
    }

    /// Exchange the players' roles in the current keyframe only.
    pub fn swap_players(&mut self) -> GraphResult<()> {
        self.reorient_current(Reorientation::SWAP_PLAYERS)
    }

    /// Mirror the current keyframe only.
    pub fn mirror_position(&mut self) -> GraphResult<()> {
        self.reorient_current(Reorientation::MIRROR)
    }

    /// Mirror what is shown without touching the graph.
    pub fn mirror_view(&mut self) {
        self.location.reorientation = self.location.reorientation.compose(&Reorientation::MIRROR);
    }

    /// Step to the next keyframe, continuing into a sequence leaving the
    /// arrival node at the end of the current one.
    pub fn advance(&mut self) -> GraphResult<()> {
        let seg = self.location.value.segment;
        let s = seg.sequence;
        let last = self.last_pos(s)?;
        let next = match self.location.value.keyframe() {
            Some(pis) => pis.position.next(),
            None => seg.segment.to_pos(),
        };
        if next <= last {
            return self.move_to_keyframe(PositionInSequence::new(s, next), self.location.reorientation);
        }

        let node = self.reoriented_end(self.graph.to(s)?);
        let outs = self.graph.out_sequences(node.node);
        let Some(&s2) = outs.iter().find(|&&o| o != s).or(outs.first()) else {
            return Err(GraphError::NotApplicable("no sequence leaves this node"));
        };
        let r = self.graph.from(s2)?.reorientation.inverse().compose(&node.reorientation);
        self.move_to_keyframe(PositionInSequence::new(s2, PosNum::FIRST.next()), r)
    }

    /// Step to the previous keyframe, continuing into a sequence arriving at
    /// the departure node at the start of the current one.
    pub fn retreat(&mut self) -> GraphResult<()> {
        let seg = self.location.value.segment;
        let s = seg.sequence;
        let prev = match self.location.value.keyframe() {
            Some(pis) => pis.position.prev(),
            None => Some(seg.segment.from_pos()),
        };
        if let Some(prev) = prev {
            return self.move_to_keyframe(PositionInSequence::new(s, prev), self.location.reorientation);
        }

        let node = self.reoriented_end(self.graph.from(s)?);
        let ins = self.graph.in_sequences(node.node);
        let Some(&s2) = ins.iter().find(|&&i| i != s).or(ins.first()) else {
            return Err(GraphError::NotApplicable("no sequence arrives at this node"));
        };
        let r = self.graph.to(s2)?.reorientation.inverse().compose(&node.reorientation);
        let before_last = self.last_pos(s2)?.prev().unwrap_or(PosNum::FIRST);
        self.move_to_keyframe(PositionInSequence::new(s2, before_last), r)
    }

    /// An end of the current sequence, seen the way the location sees it.
    fn reoriented_end(&self, end: ReorientedNode) -> ReorientedNode {
        ReorientedNode {
            node: end.node,
            reorientation: end.reorientation.compose(&self.location.reorientation),
        }
    }

    pub fn viables(&self, camera: &dyn WorldToScreen) -> AllViables {
        determine_all_viables(
            &self.graph,
            &self.location,
            self.edit_mode,
            camera,
            &self.config.viables,
        )
    }

    /// Move along `joint`'s viables to the point drawn closest to `cursor`.
    pub fn drag_along(
        &mut self,
        joint: PlayerJoint,
        cursor: Vec2,
        camera: &dyn WorldToScreen,
    ) -> GraphResult<ReorientedLocation> {
        let viables = determine_viables(
            &self.graph,
            joint,
            &self.location,
            self.edit_mode,
            camera,
            &self.config.viables,
        );
        let (location, _) = nearest_on_viables(&self.graph, &viables, joint, cursor, camera)
            .ok_or(GraphError::NotApplicable("joint has nowhere to go"))?;
        self.location = location;
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{Joint, Player};
    use crate::skeleton_constants::standing_pair;

    fn hand() -> PlayerJoint {
        PlayerJoint::new(Player::First, Joint::LeftHand)
    }

    fn reached(dx: f32) -> Position {
        let mut p = standing_pair();
        p[hand()].x += dx;
        p
    }

    fn close(a: &Position, b: &Position) -> bool {
        a.distance_squared_sum(b) < 1e-4
    }

    /// Two sequences chained through the node at `reached(0.6)`.
    fn chain() -> (EditorSession, SeqNum, SeqNum) {
        let mut g = Graph::default();
        let s0 = g
            .insert_sequence(Sequence::new("reach", vec![reached(0.0), reached(0.3), reached(0.6)]))
            .unwrap();
        let s1 = g
            .insert_sequence(Sequence::new("reach further", vec![reached(0.6), reached(0.9), reached(1.2)]))
            .unwrap();
        (EditorSession::new(g, EngineConfig::default()).unwrap(), s0, s1)
    }

    fn at(ed: &mut EditorSession, s: SeqNum, pos: usize) {
        let last = ed.graph().sequence(s).unwrap().last_pos();
        ed.set_location(Reoriented::new(
            Location::on_keyframe(PositionInSequence::new(s, PosNum(pos)), last),
            Reorientation::IDENTITY,
        ))
        .unwrap();
    }

    #[test]
    fn test_empty_graph_refused() {
        let result = EditorSession::new(Graph::default(), EngineConfig::default());
        assert!(matches!(result, Err(GraphError::NotApplicable(_))));
    }

    #[test]
    fn test_drag_node_propagates_and_undoes() {
        let (mut ed, s0, s1) = chain();
        at(&mut ed, s0, 2);
        let head = PlayerJoint::new(Player::Second, Joint::Head);
        let before = ed.current_position().unwrap();
        let target = before[head] + Vec3::new(0.0, 0.1, 0.05);

        ed.drag_joint(head, target).unwrap();
        let now = ed.current_position().unwrap();
        assert!(now[head].distance(target) < 1e-3, "head at {:?}", now[head]);

        let first_of_next = ed.graph().position(PositionInSequence::new(s1, PosNum::FIRST)).unwrap();
        assert!(
            first_of_next[head].distance(target) < 1e-3,
            "next sequence starts with head at {:?}",
            first_of_next[head]
        );
        assert_eq!(ed.undo_depth(), 1);

        assert!(ed.undo());
        assert_eq!(ed.current_position().unwrap(), before);
        assert!(!ed.undo());
    }

    #[test]
    fn test_failed_delete_leaves_no_snapshot() {
        let mut g = Graph::default();
        g.insert_sequence(Sequence::new("short", vec![reached(0.0), reached(0.5)]))
            .unwrap();
        let mut ed = EditorSession::new(g, EngineConfig::default()).unwrap();
        let result = ed.delete_keyframe();
        assert!(matches!(result, Err(GraphError::NotApplicable(_))));
        assert_eq!(ed.undo_depth(), 0);
        assert_eq!(ed.graph().sequence_count(), 1);
    }

    #[test]
    fn test_insert_then_delete_keyframe() {
        let (mut ed, s0, _) = chain();
        ed.set_location(Reoriented::new(
            Location::new(SegmentInSequence::new(s0, SegmentNum(0)), 0.5),
            Reorientation::IDENTITY,
        ))
        .unwrap();

        let pis = ed.insert_keyframe().unwrap();
        assert_eq!(pis, PositionInSequence::new(s0, PosNum(1)));
        assert_eq!(ed.graph().sequence(s0).unwrap().len(), 4);
        assert_eq!(ed.current_keyframe(), Some(pis));

        ed.delete_keyframe().unwrap();
        assert_eq!(ed.graph().sequence(s0).unwrap().len(), 3);
        assert_eq!(ed.undo_depth(), 2);
    }

    #[test]
    fn test_branch_keeps_view() {
        let (mut ed, s0, _) = chain();
        at(&mut ed, s0, 1);
        let before = ed.current_position().unwrap();

        ed.branch().unwrap();
        assert_eq!(ed.graph().sequence_count(), 3);
        assert_eq!(ed.graph().sequence(s0).unwrap().len(), 2);
        assert!(close(&ed.current_position().unwrap(), &before));
        assert_eq!(ed.current_keyframe(), Some(PositionInSequence::new(s0, PosNum(1))));
    }

    #[test]
    fn test_branch_at_node_refused() {
        let (mut ed, s0, _) = chain();
        at(&mut ed, s0, 0);
        assert!(matches!(ed.branch(), Err(GraphError::NotApplicable(_))));
        assert_eq!(ed.graph().sequence_count(), 2);
    }

    #[test]
    fn test_swap_and_mirror_position() {
        let (mut ed, s0, _) = chain();
        at(&mut ed, s0, 1);
        let before = ed.current_position().unwrap();

        ed.swap_players().unwrap();
        let swapped = Reorientation::SWAP_PLAYERS.apply(&before);
        assert!(close(&ed.current_position().unwrap(), &swapped));

        ed.mirror_position().unwrap();
        let mirrored = Reorientation::MIRROR.apply(&swapped);
        assert!(close(&ed.current_position().unwrap(), &mirrored));
        assert_eq!(ed.undo_depth(), 2);
    }

    #[test]
    fn test_mirror_view_leaves_graph() {
        let (mut ed, s0, _) = chain();
        at(&mut ed, s0, 1);
        let before = ed.current_position().unwrap();
        let stored = *ed.graph().position(PositionInSequence::new(s0, PosNum(1))).unwrap();

        ed.mirror_view();
        assert!(close(&ed.current_position().unwrap(), &Reorientation::MIRROR.apply(&before)));
        assert_eq!(*ed.graph().position(PositionInSequence::new(s0, PosNum(1))).unwrap(), stored);
        assert_eq!(ed.undo_depth(), 0);
    }

    #[test]
    fn test_advance_and_retreat_cross_nodes() {
        let (mut ed, s0, s1) = chain();
        assert_eq!(ed.current_keyframe(), Some(PositionInSequence::new(s0, PosNum(0))));

        ed.advance().unwrap();
        ed.advance().unwrap();
        assert_eq!(ed.current_keyframe(), Some(PositionInSequence::new(s0, PosNum(2))));

        ed.advance().unwrap();
        assert_eq!(ed.current_keyframe(), Some(PositionInSequence::new(s1, PosNum(1))));
        assert!(close(&ed.current_position().unwrap(), &reached(0.9)));

        ed.retreat().unwrap();
        ed.retreat().unwrap();
        assert_eq!(ed.current_keyframe(), Some(PositionInSequence::new(s0, PosNum(1))));
        assert!(close(&ed.current_position().unwrap(), &reached(0.3)));

        ed.retreat().unwrap();
        let stuck = *ed.location();
        assert!(matches!(ed.retreat(), Err(GraphError::NotApplicable(_))));
        assert_eq!(*ed.location(), stuck);
    }

    #[test]
    fn test_advance_from_mid_segment() {
        let (mut ed, s0, _) = chain();
        ed.set_location(Reoriented::new(
            Location::new(SegmentInSequence::new(s0, SegmentNum(1)), 0.4),
            Reorientation::IDENTITY,
        ))
        .unwrap();
        ed.advance().unwrap();
        assert_eq!(ed.current_keyframe(), Some(PositionInSequence::new(s0, PosNum(2))));
    }

    #[test]
    fn test_drag_along_follows_cursor() {
        let (mut ed, s0, _) = chain();
        at(&mut ed, s0, 0);
        let camera = |v: Vec3| Vec2::new(v.x, v.z);
        let goal = reached(0.3)[hand()];

        ed.drag_along(hand(), Vec2::new(goal.x, goal.z), &camera).unwrap();
        let now = ed.current_position().unwrap();
        assert!((now[hand()].x - goal.x).abs() < 1e-3, "hand at {:?}", now[hand()]);
        assert_eq!(ed.undo_depth(), 0);
    }

    #[test]
    fn test_set_location_out_of_range() {
        let (mut ed, s0, _) = chain();
        let bad = Reoriented::new(
            Location::new(SegmentInSequence::new(s0, SegmentNum(5)), 0.0),
            Reorientation::IDENTITY,
        );
        assert!(ed.set_location(bad).is_err());
    }
}
