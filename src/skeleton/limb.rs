use super::joint::Joint;
use Joint::*;

/// A rigid connection between two joints of the same player.
#[derive(Debug, Clone, Copy)]
pub struct Limb {
    pub ends: [Joint; 2],
    /// Rest length in meters
    pub length: f32,
    /// Radius of the bulge drawn at the limb's midpoint, if any
    pub midpoint_radius: Option<f32>,
    /// Whether a renderer draws this limb as a segment
    pub visible: bool,
}

impl Limb {
    /// The end that is not `j`, or `None` if `j` is not on this limb.
    #[inline]
    pub fn other_end(&self, j: Joint) -> Option<Joint> {
        match self.ends {
            [a, b] if a == j => Some(b),
            [a, b] if b == j => Some(a),
            _ => None,
        }
    }
}

const fn limb(
    a: Joint,
    b: Joint,
    length: f32,
    midpoint_radius: Option<f32>,
    visible: bool,
) -> Limb {
    Limb {
        ends: [a, b],
        length,
        midpoint_radius,
        visible,
    }
}

pub const LIMB_COUNT: usize = 28;

/// Limb table, shared by both players.
pub const LIMBS: [Limb; LIMB_COUNT] = [
    // left leg
    limb(LeftToe, LeftHeel, 0.23, None, true),
    limb(LeftToe, LeftAnkle, 0.18, None, false),
    limb(LeftHeel, LeftAnkle, 0.09, None, false),
    limb(LeftAnkle, LeftKnee, 0.43, Some(0.055), true),
    limb(LeftKnee, LeftHip, 0.43, Some(0.085), true),
    limb(LeftHip, Core, 0.27, None, false),
    // left arm
    limb(Core, LeftShoulder, 0.37, None, false),
    limb(LeftShoulder, LeftElbow, 0.29, None, true),
    limb(LeftElbow, LeftWrist, 0.26, Some(0.03), true),
    limb(LeftWrist, LeftHand, 0.08, None, true),
    limb(LeftHand, LeftFingers, 0.08, None, true),
    limb(LeftWrist, LeftFingers, 0.14, None, false),
    // right leg
    limb(RightToe, RightHeel, 0.23, None, true),
    limb(RightToe, RightAnkle, 0.18, None, false),
    limb(RightHeel, RightAnkle, 0.09, None, false),
    limb(RightAnkle, RightKnee, 0.43, Some(0.055), true),
    limb(RightKnee, RightHip, 0.43, Some(0.085), true),
    limb(RightHip, Core, 0.27, None, false),
    // right arm
    limb(Core, RightShoulder, 0.37, None, false),
    limb(RightShoulder, RightElbow, 0.29, None, true),
    limb(RightElbow, RightWrist, 0.27, Some(0.03), true),
    limb(RightWrist, RightHand, 0.08, None, true),
    limb(RightHand, RightFingers, 0.08, None, true),
    limb(RightWrist, RightFingers, 0.14, None, false),
    // torso and head
    limb(LeftHip, RightHip, 0.23, None, false),
    limb(LeftShoulder, Neck, 0.175, None, false),
    limb(RightShoulder, Neck, 0.175, None, false),
    limb(Neck, Head, 0.165, Some(0.05), true),
];

/// Limbs drawn by a renderer.
pub fn visible_limbs() -> impl Iterator<Item = &'static Limb> {
    let limbs: &'static [Limb; LIMB_COUNT] = &LIMBS;
    limbs.iter().filter(|l| l.visible)
}
