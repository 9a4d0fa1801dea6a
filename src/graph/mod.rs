//! Graph store: deduplicated nodes connected by keyframed sequences.
//!
//! Each stored sequence remembers, for both of its ends, which node it
//! starts or ends at and the reorientation that maps the node's stored
//! position onto the sequence's endpoint keyframe. Every mutating call
//! keeps that relation intact. Node and sequence numbers handed out before
//! a mutation may be stale afterwards.

mod checks;
mod ids;
mod index;
mod sequence;
mod util;

pub use checks::{EdgeEnd, Inconsistency};
pub use ids::*;
pub use sequence::{Node, Sequence};
pub use util::Step;

use crate::error::{GraphError, GraphResult};
use crate::reorientation::{is_reoriented, ReorientTolerance, Reorientation};
use crate::skeleton::Position;
use index::NodeIndex;
use sequence::Edge;
use std::ops::Index;

#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: NodeIndex,
    tolerance: ReorientTolerance,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(ReorientTolerance::default())
    }
}

impl Index<NodeNum> for Graph {
    type Output = Node;

    fn index(&self, n: NodeNum) -> &Node {
        &self.nodes[n.index()]
    }
}

impl Index<SeqNum> for Graph {
    type Output = Sequence;

    fn index(&self, s: SeqNum) -> &Sequence {
        &self.edges[s.index()].sequence
    }
}

impl Index<PositionInSequence> for Graph {
    type Output = Position;

    fn index(&self, pis: PositionInSequence) -> &Position {
        &self[pis.sequence].positions[pis.position.index()]
    }
}

fn validate_sequence(seq: &Sequence) -> GraphResult<()> {
    if seq.positions.len() < 2 {
        return Err(GraphError::NotApplicable(
            "a sequence needs at least two keyframes",
        ));
    }
    if let Some(i) = seq.positions.iter().position(|p| !p.is_finite()) {
        return Err(GraphError::Malformed(format!(
            "keyframe {} has non-finite coordinates",
            i
        )));
    }
    Ok(())
}

impl Graph {
    pub fn new(tolerance: ReorientTolerance) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            index: NodeIndex::new(tolerance.head_distance_delta),
            tolerance,
        }
    }

    /// Build a graph from loaded data.
    ///
    /// Nodes are taken as given. Sequence endpoints are resolved against
    /// them (and against each other) rather than trusted, so the
    /// node/edge relation holds on return.
    pub fn from_parts(
        nodes: Vec<Node>,
        sequences: Vec<Sequence>,
        tolerance: ReorientTolerance,
    ) -> GraphResult<Self> {
        let mut graph = Graph::new(tolerance);

        for (i, node) in nodes.into_iter().enumerate() {
            if !node.position.is_finite() {
                return Err(GraphError::Malformed(format!(
                    "node {} has non-finite coordinates",
                    i
                )));
            }
            graph.push_node(node);
        }

        for (i, seq) in sequences.into_iter().enumerate() {
            let edge = graph.make_edge(seq).map_err(|e| match e {
                GraphError::Malformed(reason) => {
                    GraphError::Malformed(format!("sequence {}: {}", i, reason))
                }
                other => GraphError::Malformed(format!("sequence {}: {}", i, other)),
            })?;
            graph.edges.push(edge);
        }

        log::info!(
            "Loaded {} nodes and {} edges",
            graph.nodes.len(),
            graph.edges.len()
        );
        checks::debug_check_graph(&graph);
        Ok(graph)
    }

    /// Nodes and sequences, for handing to a persistence layer.
    pub fn to_parts(&self) -> (Vec<Node>, Vec<Sequence>) {
        (
            self.nodes.clone(),
            self.edges.iter().map(|e| e.sequence.clone()).collect(),
        )
    }

    // --- queries ---

    pub fn tolerance(&self) -> &ReorientTolerance {
        &self.tolerance
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn sequence_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodenums(&self) -> impl Iterator<Item = NodeNum> {
        (0..self.nodes.len()).map(NodeNum::new)
    }

    pub fn seqnums(&self) -> impl Iterator<Item = SeqNum> {
        (0..self.edges.len()).map(SeqNum::new)
    }

    fn edge(&self, s: SeqNum) -> GraphResult<&Edge> {
        self.edges
            .get(s.index())
            .ok_or(GraphError::SequenceOutOfRange(s))
    }

    fn edge_mut(&mut self, s: SeqNum) -> GraphResult<&mut Edge> {
        self.edges
            .get_mut(s.index())
            .ok_or(GraphError::SequenceOutOfRange(s))
    }

    pub fn node(&self, n: NodeNum) -> GraphResult<&Node> {
        self.nodes
            .get(n.index())
            .ok_or(GraphError::NodeOutOfRange(n))
    }

    pub fn sequence(&self, s: SeqNum) -> GraphResult<&Sequence> {
        self.edge(s).map(|e| &e.sequence)
    }

    pub fn position(&self, pis: PositionInSequence) -> GraphResult<&Position> {
        self.sequence(pis.sequence)?
            .positions
            .get(pis.position.index())
            .ok_or(GraphError::PositionOutOfRange(pis))
    }

    /// Node and reorientation at the start of `s`.
    pub fn from(&self, s: SeqNum) -> GraphResult<ReorientedNode> {
        self.edge(s).map(|e| e.from)
    }

    /// Node and reorientation at the end of `s`.
    pub fn to(&self, s: SeqNum) -> GraphResult<ReorientedNode> {
        self.edge(s).map(|e| e.to)
    }

    /// The node's stored position seen through its reorientation.
    pub fn node_position(&self, rn: &ReorientedNode) -> GraphResult<Position> {
        Ok(rn.reorientation.apply(&self.node(rn.node)?.position))
    }

    /// The node a keyframe denotes, if it is the first or last of its sequence.
    pub fn node_at(&self, pis: PositionInSequence) -> Option<ReorientedNode> {
        let edge = self.edge(pis.sequence).ok()?;
        if pis.position == PosNum::FIRST {
            Some(edge.from)
        } else if pis.position == edge.sequence.last_pos() {
            Some(edge.to)
        } else {
            None
        }
    }

    /// A node reoriented-equivalent to `p`, scanning in node order.
    pub fn find_node(&self, p: &Position) -> GraphResult<ReorientedNode> {
        self.index
            .candidates(p)
            .into_iter()
            .find_map(|n| {
                is_reoriented(&self.nodes[n.index()].position, p, &self.tolerance).map(
                    |reorientation| ReorientedNode {
                        node: n,
                        reorientation,
                    },
                )
            })
            .ok_or(GraphError::NotFound)
    }

    // --- mutation ---

    fn push_node(&mut self, node: Node) -> NodeNum {
        let n = NodeNum::new(self.nodes.len());
        self.index.push(n, &node.position);
        self.nodes.push(node);
        n
    }

    /// Resolve `p` to an existing equivalent node, or store it as a new one.
    ///
    /// New nodes keep `p` as their position, reached by the identity.
    pub fn find_or_add_node(&mut self, p: &Position) -> ReorientedNode {
        if let Ok(rn) = self.find_node(p) {
            return rn;
        }
        let node = self.push_node(Node::new(*p));
        log::debug!("Added node {}", node);
        ReorientedNode {
            node,
            reorientation: Reorientation::IDENTITY,
        }
    }

    fn make_edge(&mut self, sequence: Sequence) -> GraphResult<Edge> {
        validate_sequence(&sequence)?;
        let (Some(first), Some(last)) = (sequence.positions.first(), sequence.positions.last())
        else {
            return Err(GraphError::NotApplicable(
                "a sequence needs at least two keyframes",
            ));
        };
        let (first, last) = (*first, *last);
        Ok(Edge {
            from: self.find_or_add_node(&first),
            to: self.find_or_add_node(&last),
            sequence,
        })
    }

    pub fn insert_sequence(&mut self, sequence: Sequence) -> GraphResult<SeqNum> {
        let edge = self.make_edge(sequence)?;
        let s = SeqNum::new(self.edges.len());
        log::info!(
            "Inserted sequence {} from {} to {}",
            s,
            edge.from.node,
            edge.to.node
        );
        self.edges.push(edge);
        checks::debug_check_graph(self);
        Ok(s)
    }

    /// Replace a whole sequence, re-resolving both of its ends.
    pub fn replace_sequence(&mut self, s: SeqNum, sequence: Sequence) -> GraphResult<()> {
        self.edge(s)?;
        let edge = self.make_edge(sequence)?;
        self.edges[s.index()] = edge;
        log::info!("Replaced sequence {}", s);
        checks::debug_check_graph(self);
        Ok(())
    }

    /// Remove a sequence. Later sequence numbers shift down by one.
    pub fn erase_sequence(&mut self, s: SeqNum) -> GraphResult<()> {
        self.edge(s)?;
        if self.edges.len() == 1 {
            log::warn!("Refusing to erase the only sequence");
            return Err(GraphError::NotApplicable("cannot erase the only sequence"));
        }
        self.edges.remove(s.index());
        log::info!("Erased sequence {}", s);
        Ok(())
    }

    pub fn set_node_description(&mut self, n: NodeNum, description: Vec<String>) -> GraphResult<()> {
        let node = self
            .nodes
            .get_mut(n.index())
            .ok_or(GraphError::NodeOutOfRange(n))?;
        node.description = description;
        Ok(())
    }

    pub fn set_sequence_description(
        &mut self,
        s: SeqNum,
        description: Vec<String>,
    ) -> GraphResult<()> {
        self.edge_mut(s)?.sequence.description = description;
        Ok(())
    }

    /// Re-resolve an endpoint after its keyframe changed in place.
    fn changed(&mut self, pis: PositionInSequence) {
        let Ok(edge) = self.edge(pis.sequence) else {
            return;
        };
        let last = edge.sequence.last_pos();

        if pis.position == PosNum::FIRST {
            let (old, p) = (edge.from.node, edge.sequence.positions[0]);
            let from = self.find_or_add_node(&p);
            if from.node != old {
                log::info!("Start of {} is now node {}", pis.sequence, from.node);
            }
            self.edges[pis.sequence.index()].from = from;
        } else if pis.position == last {
            let (old, p) = (edge.to.node, edge.sequence.positions[last.index()]);
            let to = self.find_or_add_node(&p);
            if to.node != old {
                log::info!("End of {} is now node {}", pis.sequence, to.node);
            }
            self.edges[pis.sequence.index()].to = to;
        }
    }

    /// Fold `n` into another node it has become equivalent to, if any.
    ///
    /// The lower-numbered node survives, so lookups keep resolving to it.
    fn merge_duplicate(&mut self, n: NodeNum) {
        let p = self.nodes[n.index()].position;
        let Some((m, r)) = self
            .index
            .candidates(&p)
            .into_iter()
            .filter(|&m| m != n)
            .find_map(|m| {
                is_reoriented(&self.nodes[m.index()].position, &p, &self.tolerance).map(|r| (m, r))
            })
        else {
            return;
        };

        // `gone`'s position is `via` applied to `keep`'s.
        let (keep, gone, via) = if m < n { (m, n, r) } else { (n, m, r.inverse()) };
        let keep_pos = self.nodes[keep.index()].position;
        for e in self.edges.iter_mut() {
            if e.from.node == gone {
                e.from = ReorientedNode {
                    node: keep,
                    reorientation: via.compose(&e.from.reorientation),
                };
                if let Some(first) = e.sequence.positions.first_mut() {
                    *first = e.from.reorientation.apply(&keep_pos);
                }
            }
            if e.to.node == gone {
                e.to = ReorientedNode {
                    node: keep,
                    reorientation: via.compose(&e.to.reorientation),
                };
                if let Some(last) = e.sequence.positions.last_mut() {
                    *last = e.to.reorientation.apply(&keep_pos);
                }
            }
        }

        if self.nodes[keep.index()].description.is_empty() {
            self.nodes[keep.index()].description =
                std::mem::take(&mut self.nodes[gone.index()].description);
        }
        self.remove_node(gone);
        log::info!("Merged node {} into {}", gone, keep);
    }

    /// Drop an unreferenced node; later node numbers shift down by one.
    fn remove_node(&mut self, gone: NodeNum) {
        self.nodes.remove(gone.index());
        for e in self.edges.iter_mut() {
            for end in [&mut e.from, &mut e.to] {
                if end.node > gone {
                    end.node = NodeNum::new(end.node.index() - 1);
                }
            }
        }
        self.index = NodeIndex::new(self.tolerance.head_distance_delta);
        for (i, node) in self.nodes.iter().enumerate() {
            self.index.push(NodeNum::new(i), &node.position);
        }
    }

    /// Overwrite one keyframe.
    ///
    /// For an endpoint keyframe, `local == false` moves the node itself and
    /// rewrites the matching endpoint of every sequence touching it.
    /// `local == true` instead detaches this sequence's end and resolves it
    /// afresh, leaving the old node and its other sequences alone. A moved
    /// node that lands on another node is merged into it.
    pub fn replace(&mut self, pis: PositionInSequence, p: &Position, local: bool) -> GraphResult<()> {
        if !p.is_finite() {
            log::warn!("Refusing non-finite replacement for {}", pis);
            return Err(GraphError::Malformed(format!(
                "replacement for {} has non-finite coordinates",
                pis
            )));
        }
        let slot = self
            .edge_mut(pis.sequence)?
            .sequence
            .positions
            .get_mut(pis.position.index())
            .ok_or(GraphError::PositionOutOfRange(pis))?;
        *slot = *p;

        match self.node_at(pis) {
            Some(rn) if !local => {
                let stored = rn.reorientation.inverse().apply(p);
                self.nodes[rn.node.index()].position = stored;
                self.index.update(rn.node, &stored);

                for e in self.edges.iter_mut() {
                    if e.from.node == rn.node {
                        if let Some(first) = e.sequence.positions.first_mut() {
                            *first = e.from.reorientation.apply(&stored);
                        }
                    }
                    if e.to.node == rn.node {
                        if let Some(last) = e.sequence.positions.last_mut() {
                            *last = e.to.reorientation.apply(&stored);
                        }
                    }
                }
                self.merge_duplicate(rn.node);
            }
            _ => self.changed(pis),
        }

        log::info!("Replaced position {}", pis);
        checks::debug_check_graph(self);
        Ok(())
    }

    /// Remove one keyframe and return the index now occupying its slot
    /// (clamped to the new last keyframe).
    pub fn erase(&mut self, pis: PositionInSequence) -> GraphResult<PosNum> {
        let positions = &mut self.edge_mut(pis.sequence)?.sequence.positions;
        let len = positions.len();
        if pis.position.index() >= len {
            return Err(GraphError::PositionOutOfRange(pis));
        }
        if len <= 2 {
            log::warn!("Cannot erase either of the last two keyframes of {}", pis.sequence);
            return Err(GraphError::NotApplicable(
                "a sequence keeps at least two keyframes",
            ));
        }
        positions.remove(pis.position.index());

        let pos = PosNum(pis.position.index().min(len - 2));
        self.changed(PositionInSequence::new(pis.sequence, pos));

        log::info!("Erased position {}", pis);
        checks::debug_check_graph(self);
        Ok(pos)
    }

    /// Insert a copy of a keyframe right after it; returns the copy.
    pub fn duplicate_keyframe(&mut self, pis: PositionInSequence) -> GraphResult<PositionInSequence> {
        let positions = &mut self.edge_mut(pis.sequence)?.sequence.positions;
        let p = *positions
            .get(pis.position.index())
            .ok_or(GraphError::PositionOutOfRange(pis))?;
        positions.insert(pis.position.index() + 1, p);
        log::info!("Duplicated position {}", pis);
        Ok(PositionInSequence::new(pis.sequence, pis.position.next()))
    }

    /// Insert a keyframe interpolated at `loc`; returns the new keyframe.
    pub fn insert_keyframe(&mut self, loc: Location) -> GraphResult<PositionInSequence> {
        let seg = loc.segment;
        let positions = &mut self.edge_mut(seg.sequence)?.sequence.positions;
        let (Some(a), Some(b)) = (
            positions.get(seg.segment.from_pos().index()),
            positions.get(seg.segment.to_pos().index()),
        ) else {
            return Err(GraphError::PositionOutOfRange(seg.to_pos()));
        };
        let p = Position::between(a, b, loc.how_far);
        positions.insert(seg.segment.to_pos().index(), p);
        log::info!("Inserted keyframe at {}", seg.to_pos());
        Ok(seg.to_pos())
    }

    /// Cut a sequence in two at an interior keyframe.
    ///
    /// The first half keeps `pis.sequence`; the second half is appended
    /// and its number returned. The cut keyframe becomes a node.
    pub fn split_at(&mut self, pis: PositionInSequence) -> GraphResult<SeqNum> {
        let seq = self.sequence(pis.sequence)?;
        let cut = pis.position.index();
        if cut >= seq.len() {
            return Err(GraphError::PositionOutOfRange(pis));
        }
        if seq.is_endpoint(pis.position) {
            log::warn!("Cannot split {} at a node", pis.sequence);
            return Err(GraphError::NotApplicable("cannot split at a node"));
        }

        let mut head = seq.clone();
        let mut tail = seq.clone();
        head.positions.truncate(cut + 1);
        tail.positions.drain(..cut);

        self.replace_sequence(pis.sequence, head)?;
        let s = self.insert_sequence(tail)?;
        log::info!("Split {} at {}", pis.sequence, pis);
        Ok(s)
    }
}
