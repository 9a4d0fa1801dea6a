//! Viable-transition search.
//!
//! For one joint, walks outwards from the current location along the
//! current sequence and, at sequence ends, into every other sequence
//! touching the node reached. The result lists, per sequence, the keyframe
//! range a user can drag that joint along on screen without the path
//! stalling or crossing itself.

use crate::camera::WorldToScreen;
use crate::graph::{
    Graph, Location, PosNum, Reoriented, ReorientedLocation, ReorientedNode, SegmentInSequence,
    SegmentNum, SeqNum,
};
use crate::math::LineSegment;
use crate::reorientation::Reorientation;
use crate::skeleton::PlayerJoint;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::ops::Index;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViableParams {
    /// Squared 3D distance below which the next keyframe counts as no movement.
    pub min_step_3d_sq: f32,
    /// Squared screen distance below which the next keyframe counts as no movement.
    pub min_step_screen_sq: f32,
    /// Joints whose paths add up to less screen length than this get nothing.
    pub min_total_screen_length: f32,
    /// Sequences entered beyond the starting one, counted along the walk.
    pub max_hops: usize,
}

impl Default for ViableParams {
    fn default() -> Self {
        Self {
            min_step_3d_sq: 0.003,
            min_step_screen_sq: 0.0001,
            min_total_screen_length: 0.3,
            max_hops: 3,
        }
    }
}

/// The navigable keyframe range of one sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Viable {
    pub sequence: SeqNum,
    /// Maps the sequence's stored keyframes into the frame of the search's start.
    pub reorientation: Reorientation,
    /// Half-open keyframe range; never empty.
    pub begin: PosNum,
    pub end: PosNum,
    pub screen_length: f32,
    /// Sequences entered to get here; 0 for the starting sequence.
    pub depth: usize,
    pub begin_point: Vec3,
    pub end_point: Vec3,
    pub begin_xy: Vec2,
    pub end_xy: Vec2,
}

impl Viable {
    fn starting_at(
        graph: &Graph,
        sequence: SeqNum,
        reorientation: Reorientation,
        pos: PosNum,
        depth: usize,
        joint: PlayerJoint,
        camera: &dyn WorldToScreen,
    ) -> Option<Viable> {
        let keyframe = graph.sequence(sequence).ok()?.positions.get(pos.index())?;
        let point = reorientation.apply_joint(keyframe, joint);
        let xy = camera.world_to_screen(point);
        Some(Viable {
            sequence,
            reorientation,
            begin: pos,
            end: pos.next(),
            screen_length: 0.0,
            depth,
            begin_point: point,
            end_point: point,
            begin_xy: xy,
            end_xy: xy,
        })
    }

    /// Segments lying entirely inside the range.
    pub fn segments(&self) -> impl Iterator<Item = SegmentInSequence> + '_ {
        (self.begin.index()..self.end.index().saturating_sub(1))
            .map(|i| SegmentInSequence::new(self.sequence, SegmentNum(i)))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViablesForJoint {
    pub total_screen_length: f32,
    pub viables: BTreeMap<SeqNum, Viable>,
}

impl ViablesForJoint {
    pub fn is_empty(&self) -> bool {
        self.viables.is_empty()
    }

    pub fn get(&self, s: SeqNum) -> Option<&Viable> {
        self.viables.get(&s)
    }
}

/// Search results for every player joint.
#[derive(Debug, Clone, PartialEq)]
pub struct AllViables {
    per_joint: Vec<ViablesForJoint>,
}

/// No joint has anywhere to go.
impl Default for AllViables {
    fn default() -> Self {
        Self {
            per_joint: vec![ViablesForJoint::default(); PlayerJoint::COUNT],
        }
    }
}

impl AllViables {
    pub fn iter(&self) -> impl Iterator<Item = (PlayerJoint, &ViablesForJoint)> {
        PlayerJoint::ALL.into_iter().zip(self.per_joint.iter())
    }

    /// Joints that currently have somewhere to go.
    pub fn navigable_joints(&self) -> impl Iterator<Item = PlayerJoint> + '_ {
        self.iter().filter(|(_, v)| !v.is_empty()).map(|(j, _)| j)
    }
}

impl Index<PlayerJoint> for AllViables {
    type Output = ViablesForJoint;

    fn index(&self, j: PlayerJoint) -> &ViablesForJoint {
        &self.per_joint[j.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

struct Search<'a> {
    graph: &'a Graph,
    joint: PlayerJoint,
    camera: &'a dyn WorldToScreen,
    params: &'a ViableParams,
    accepted: Vec<LineSegment>,
    found: BTreeMap<SeqNum, Viable>,
    queue: VecDeque<(Viable, Direction)>,
}

impl Search<'_> {
    /// Extend `via` keyframe by keyframe. Returns whether the walk reached
    /// the sequence's end in that direction.
    fn walk(&mut self, via: &mut Viable, direction: Direction) -> bool {
        let graph = self.graph;
        let Ok(sequence) = graph.sequence(via.sequence) else {
            return false;
        };
        let positions = &sequence.positions;

        let (mut last_point, mut last_xy) = match direction {
            Direction::Forward => (via.end_point, via.end_xy),
            Direction::Backward => (via.begin_point, via.begin_xy),
        };

        loop {
            let next = match direction {
                Direction::Forward => (via.end.index() < positions.len()).then_some(via.end),
                Direction::Backward => via.begin.prev(),
            };
            let Some(next) = next else {
                return true;
            };

            let point = via
                .reorientation
                .apply_joint(&positions[next.index()], self.joint);
            if point.distance_squared(last_point) < self.params.min_step_3d_sq {
                return false;
            }
            let xy = self.camera.world_to_screen(point);
            if xy.distance_squared(last_xy) < self.params.min_step_screen_sq {
                return false;
            }
            let step = LineSegment::new(last_xy, xy);
            if self.accepted.iter().any(|s| s.intersects(&step)) {
                return false;
            }

            self.accepted.push(step);
            via.screen_length += step.length();
            match direction {
                Direction::Forward => {
                    via.end = via.end.next();
                    via.end_point = point;
                    via.end_xy = xy;
                }
                Direction::Backward => {
                    via.begin = next;
                    via.begin_point = point;
                    via.begin_xy = xy;
                }
            }
            last_point = point;
            last_xy = xy;
        }
    }

    /// The node at the end `via` just reached, in the search's frame.
    fn reached_node(&self, via: &Viable, direction: Direction) -> Option<ReorientedNode> {
        let end = match direction {
            Direction::Forward => self.graph.to(via.sequence),
            Direction::Backward => self.graph.from(via.sequence),
        }
        .ok()?;
        Some(ReorientedNode {
            node: end.node,
            reorientation: end.reorientation.compose(&via.reorientation),
        })
    }

    /// Queue every unvisited sequence touching `rn`.
    fn fan_out(&mut self, rn: ReorientedNode, depth: usize) {
        if depth >= self.params.max_hops {
            return;
        }
        let graph = self.graph;

        for s in graph.seqnums() {
            if self.found.contains_key(&s) {
                continue;
            }
            let Ok(entered) = graph.enter(&rn, s) else {
                continue;
            };
            let (pos, direction) = if entered.value.reverse {
                (graph[s].last_pos(), Direction::Backward)
            } else {
                (PosNum::FIRST, Direction::Forward)
            };
            let Some(via) = Viable::starting_at(
                graph,
                s,
                entered.reorientation,
                pos,
                depth + 1,
                self.joint,
                self.camera,
            ) else {
                continue;
            };
            self.found.insert(s, via.clone());
            self.queue.push_back((via, direction));
        }
    }

    fn follow_up(&mut self, via: &Viable, direction: Direction) {
        if let Some(rn) = self.reached_node(via, direction) {
            self.fan_out(rn, via.depth);
        }
    }

    fn run(mut self, start: Viable) -> ViablesForJoint {
        let mut start = start;
        self.found.insert(start.sequence, start.clone());

        let forward = self.walk(&mut start, Direction::Forward);
        let backward = self.walk(&mut start, Direction::Backward);
        if forward {
            self.follow_up(&start, Direction::Forward);
        }
        if backward {
            self.follow_up(&start, Direction::Backward);
        }
        self.found.insert(start.sequence, start);

        while let Some((mut via, direction)) = self.queue.pop_front() {
            if self.walk(&mut via, direction) {
                self.follow_up(&via, direction);
            }
            self.found.insert(via.sequence, via);
        }

        let total_screen_length: f32 = self.found.values().map(|v| v.screen_length).sum();
        log::debug!(
            "Viables for {}: {} sequences, screen length {:.3}",
            self.joint,
            self.found.len(),
            total_screen_length
        );

        if total_screen_length < self.params.min_total_screen_length {
            return ViablesForJoint::default();
        }
        ViablesForJoint {
            total_screen_length,
            viables: self.found,
        }
    }
}

/// Where `joint` can be dragged from `location`.
///
/// Outside edit mode, joints that are not draggable get nothing.
pub fn determine_viables(
    graph: &Graph,
    joint: PlayerJoint,
    location: &ReorientedLocation,
    edit_mode: bool,
    camera: &dyn WorldToScreen,
    params: &ViableParams,
) -> ViablesForJoint {
    if !edit_mode && !joint.joint.draggable() {
        return ViablesForJoint::default();
    }

    let segment = location.value.segment;
    let Some(start) = Viable::starting_at(
        graph,
        segment.sequence,
        location.reorientation,
        segment.segment.from_pos(),
        0,
        joint,
        camera,
    ) else {
        return ViablesForJoint::default();
    };

    Search {
        graph,
        joint,
        camera,
        params,
        accepted: Vec::new(),
        found: BTreeMap::new(),
        queue: VecDeque::new(),
    }
    .run(start)
}

pub fn determine_all_viables(
    graph: &Graph,
    location: &ReorientedLocation,
    edit_mode: bool,
    camera: &dyn WorldToScreen,
    params: &ViableParams,
) -> AllViables {
    AllViables {
        per_joint: PlayerJoint::ALL
            .iter()
            .map(|&j| determine_viables(graph, j, location, edit_mode, camera, params))
            .collect(),
    }
}

/// The point along `joint`'s viable paths drawn closest to `cursor`.
///
/// Returns the location (in the search's frame) and its squared screen
/// distance from the cursor.
pub fn nearest_on_viables(
    graph: &Graph,
    viables: &ViablesForJoint,
    joint: PlayerJoint,
    cursor: Vec2,
    camera: &dyn WorldToScreen,
) -> Option<(ReorientedLocation, f32)> {
    let mut best: Option<(ReorientedLocation, f32)> = None;

    for via in viables.viables.values() {
        let Ok(sequence) = graph.sequence(via.sequence) else {
            continue;
        };
        let screen = |pos: PosNum| {
            sequence
                .positions
                .get(pos.index())
                .map(|p| camera.world_to_screen(via.reorientation.apply_joint(p, joint)))
        };

        for segment in via.segments() {
            let (Some(a), Some(b)) = (
                screen(segment.segment.from_pos()),
                screen(segment.segment.to_pos()),
            ) else {
                continue;
            };
            let line = LineSegment::new(a, b);
            let t = line.closest_fraction(cursor);
            let d = line.point_at(t).distance_squared(cursor);
            if best.as_ref().map_or(true, |(_, bd)| d < *bd) {
                best = Some((
                    Reoriented::new(Location::new(segment, t), via.reorientation),
                    d,
                ));
            }
        }
    }

    best
}
