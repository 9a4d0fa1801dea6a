//! Reference pose constants.
//!
//! A relaxed standing stance for one player, facing +Z with the left side
//! at +X. Limb lengths agree with the limb table to within a few
//! millimeters, and every joint clears the floor by its radius.

use crate::skeleton::{Joint, Player, PlayerJoint, Position};
use glam::Vec3;

/// Distance from the origin to each player's stance along Z.
pub const STANCE_GAP: f32 = 0.45;

/// Standing pose for a single player, indexed by [`Joint::index`].
pub const STANDING: [Vec3; Joint::COUNT] = [
    Vec3::new(0.107, 0.025, 0.167),  // LeftToe
    Vec3::new(-0.107, 0.025, 0.167), // RightToe
    Vec3::new(0.094, 0.03, -0.062),  // LeftHeel
    Vec3::new(-0.094, 0.03, -0.062), // RightHeel
    Vec3::new(0.161, 0.04, -0.004),  // LeftAnkle
    Vec3::new(-0.161, 0.04, -0.004), // RightAnkle
    Vec3::new(0.116, 0.465, 0.047),  // LeftKnee
    Vec3::new(-0.116, 0.465, 0.047), // RightKnee
    Vec3::new(0.115, 0.885, -0.046), // LeftHip
    Vec3::new(-0.115, 0.885, -0.046),
    Vec3::new(0.175, 1.405, -0.009), // LeftShoulder
    Vec3::new(-0.175, 1.405, -0.009),
    Vec3::new(0.214, 1.118, 0.008), // LeftElbow
    Vec3::new(-0.214, 1.118, 0.008),
    Vec3::new(0.235, 0.855, 0.035), // LeftWrist
    Vec3::new(-0.235, 0.855, 0.035),
    Vec3::new(0.265, 0.783, 0.019), // LeftHand
    Vec3::new(-0.265, 0.783, 0.019),
    Vec3::new(0.238, 0.716, 0.054), // LeftFingers
    Vec3::new(-0.238, 0.716, 0.054),
    Vec3::new(0.0, 1.092, 0.083),  // Core
    Vec3::new(0.0, 1.411, -0.002), // Neck
    Vec3::new(0.0, 1.575, 0.019),  // Head
];

/// Both players standing face to face, heads on the Z axis.
///
/// The first player stands at -Z facing +Z; the second is the same stance
/// turned half a revolution and stands at +Z.
pub fn standing_pair() -> Position {
    Position::from_fn(|PlayerJoint { player, joint }| {
        let v = STANDING[joint.index()];
        match player {
            Player::First => Vec3::new(v.x, v.y, v.z - STANCE_GAP),
            Player::Second => Vec3::new(-v.x, v.y, STANCE_GAP - v.z),
        }
    })
}

/// The standing pair with the first player's left arm reaching out and up.
///
/// Unlike [`standing_pair`], this pose is not symmetric under mirroring or
/// swapping players, so each reorientation of it is distinguishable.
#[cfg(test)]
pub fn reaching_pair() -> Position {
    let mut p = standing_pair();
    for joint in [Joint::LeftWrist, Joint::LeftHand, Joint::LeftFingers] {
        p[PlayerJoint::new(Player::First, joint)] += Vec3::new(0.15, 0.3, 0.1);
    }
    p
}
