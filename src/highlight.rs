//! Render-ready data for a renderer to upload as-is.
//!
//! Joints are drawn as spheres, limbs as capsules, and viable paths as
//! line lists. Colors are linear RGBA.

use crate::graph::Graph;
use crate::skeleton::{visible_limbs, Player, PlayerJoint, Position};
use crate::viables::{AllViables, ViablesForJoint};
use glam::Vec3;
use static_assertions::const_assert_eq;

pub type Color = [f32; 4];

pub const PLAYER_COLORS: [Color; Player::COUNT] = [[0.8, 0.1, 0.1, 1.0], [0.1, 0.2, 0.8, 1.0]];
pub const HIGHLIGHT_COLOR: Color = [1.0, 1.0, 0.0, 1.0];
pub const PATH_COLOR: Color = [1.0, 1.0, 1.0, 0.6];

/// Brightness of joints that cannot be dragged right now.
const DIM_FACTOR: f32 = 0.5;

pub fn dimmed(c: Color) -> Color {
    [c[0] * DIM_FACTOR, c[1] * DIM_FACTOR, c[2] * DIM_FACTOR, c[3]]
}

/// One joint sphere.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct JointMarker {
    pub center: [f32; 3],
    pub radius: f32,
    pub color: Color,
}

/// One limb capsule between two joints.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LimbInstance {
    pub start: [f32; 3],
    pub radius: f32,
    pub end: [f32; 3],
    /// Extra radius at the midpoint; zero for straight limbs.
    pub midpoint_radius: f32,
    pub color: Color,
}

/// Line-list vertex; consecutive pairs form one path segment.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PathVertex {
    pub position: [f32; 3],
    pub color: Color,
}

const_assert_eq!(std::mem::size_of::<JointMarker>(), 32);
const_assert_eq!(std::mem::size_of::<LimbInstance>(), 48);
const_assert_eq!(std::mem::size_of::<PathVertex>(), 28);

/// A marker per joint: highlighted under the cursor, player-colored when
/// navigable, dimmed otherwise.
pub fn joint_markers(
    p: &Position,
    viables: &AllViables,
    highlighted: Option<PlayerJoint>,
) -> Vec<JointMarker> {
    PlayerJoint::ALL
        .iter()
        .map(|&pj| {
            let base = PLAYER_COLORS[pj.player.index()];
            let color = if highlighted == Some(pj) {
                HIGHLIGHT_COLOR
            } else if viables[pj].is_empty() {
                dimmed(base)
            } else {
                base
            };
            JointMarker {
                center: p[pj].to_array(),
                radius: pj.joint.radius(),
                color,
            }
        })
        .collect()
}

pub fn limb_instances(p: &Position) -> Vec<LimbInstance> {
    Player::ALL
        .iter()
        .flat_map(|&player| {
            visible_limbs().map(move |limb| {
                let [a, b] = limb.ends.map(|j| PlayerJoint::new(player, j));
                LimbInstance {
                    start: p[a].to_array(),
                    radius: a.joint.radius().min(b.joint.radius()),
                    end: p[b].to_array(),
                    midpoint_radius: limb.midpoint_radius.unwrap_or(0.0),
                    color: PLAYER_COLORS[player.index()],
                }
            })
        })
        .collect()
}

/// Line list tracing where `joint` travels along each viable.
pub fn path_vertices(
    graph: &Graph,
    viables: &ViablesForJoint,
    joint: PlayerJoint,
    color: Color,
) -> Vec<PathVertex> {
    let vertex = |v: Vec3| PathVertex {
        position: v.to_array(),
        color,
    };

    let mut out = Vec::new();
    for via in viables.viables.values() {
        for seg in via.segments() {
            let (Ok(a), Ok(b)) = (graph.position(seg.from_pos()), graph.position(seg.to_pos())) else {
                continue;
            };
            out.push(vertex(via.reorientation.apply_joint(a, joint)));
            out.push(vertex(via.reorientation.apply_joint(b, joint)));
        }
    }
    out
}
