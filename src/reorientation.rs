//! Reorientation algebra.
//!
//! A [`Reorientation`] rotates about the vertical axis, translates, and then
//! optionally mirrors (negates x) and relabels the players. Mirroring also
//! relabels left and right so that a mirrored position stays anatomically
//! valid. Reorientations form a group under [`Reorientation::compose`];
//! `compose` and `inverse` are the only places that reason about how the
//! mirror flag interacts with angle and offset signs.

use crate::math::HorizontalExt;
use crate::skeleton::{Joint, Player, PlayerJoint, Position};
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Reorientation {
    pub offset: Vec3,
    /// Rotation about +Y in radians, applied before the offset.
    pub angle: f32,
    pub mirror: bool,
    pub swap_players: bool,
}

impl Reorientation {
    pub const IDENTITY: Reorientation = Reorientation {
        offset: Vec3::ZERO,
        angle: 0.0,
        mirror: false,
        swap_players: false,
    };

    pub const MIRROR: Reorientation = Reorientation {
        mirror: true,
        ..Self::IDENTITY
    };

    pub const SWAP_PLAYERS: Reorientation = Reorientation {
        swap_players: true,
        ..Self::IDENTITY
    };

    pub fn new(offset: Vec3, angle: f32) -> Self {
        Self {
            offset,
            angle,
            ..Self::IDENTITY
        }
    }

    pub fn with_mirror(self, mirror: bool) -> Self {
        Self { mirror, ..self }
    }

    pub fn with_swap_players(self, swap_players: bool) -> Self {
        Self {
            swap_players,
            ..self
        }
    }

    #[inline]
    fn mirror_sign(&self) -> f32 {
        if self.mirror {
            -1.0
        } else {
            1.0
        }
    }

    #[inline]
    fn mirror_point(&self, v: Vec3) -> Vec3 {
        if self.mirror {
            v.mirrored_x()
        } else {
            v
        }
    }

    /// Transform a single world point. Labels are not involved.
    #[inline]
    pub fn apply_point(&self, v: Vec3) -> Vec3 {
        self.mirror_point(v.yrot(self.angle) + self.offset)
    }

    /// The transformed position's point for `pj`, without building the whole position.
    #[inline]
    pub fn apply_joint(&self, p: &Position, pj: PlayerJoint) -> Vec3 {
        self.apply_point(p[pj.relabeled(self.mirror, self.swap_players)])
    }

    pub fn apply(&self, p: &Position) -> Position {
        Position::from_fn(|pj| self.apply_joint(p, pj))
    }

    /// `self` followed by `then`.
    pub fn compose(&self, then: &Reorientation) -> Reorientation {
        let s = self.mirror_sign();
        Reorientation {
            offset: self.offset.yrot(s * then.angle) + self.mirror_point(then.offset),
            angle: self.angle + s * then.angle,
            mirror: self.mirror ^ then.mirror,
            swap_players: self.swap_players ^ then.swap_players,
        }
    }

    pub fn inverse(&self) -> Reorientation {
        Reorientation {
            offset: -self.mirror_point(self.offset.yrot(-self.angle)),
            angle: -self.mirror_sign() * self.angle,
            ..*self
        }
    }
}

/// Tolerances for deciding that two positions are the same.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorientTolerance {
    /// Upper bound on the sum of squared joint distances, in m².
    pub max_distance_squared_sum: f32,
    /// Largest head-to-head distance mismatch still worth a full comparison, in m.
    pub head_distance_delta: f32,
}

impl Default for ReorientTolerance {
    fn default() -> Self {
        Self::from_budget(0.03)
    }
}

impl ReorientTolerance {
    /// Tolerance whose head shortcut never rejects a pair within `budget`.
    ///
    /// Two heads off by `d0` and `d1` with `d0² + d1² < budget` change the
    /// head-to-head distance by at most `sqrt(2 * budget)`.
    pub fn from_budget(budget: f32) -> Self {
        Self {
            max_distance_squared_sum: budget,
            head_distance_delta: (2.0 * budget).sqrt(),
        }
    }

    #[inline]
    pub fn basically_same(&self, a: &Position, b: &Position) -> bool {
        a.distance_squared_sum(b) < self.max_distance_squared_sum
    }
}

/// (mirror, swap_players) combinations tried by [`is_reoriented`], in order.
const HYPOTHESES: [(bool, bool); 4] = [
    (false, false),
    (true, false),
    (false, true),
    (true, true),
];

/// Find `r` with `r.apply(a) ≈ b`.
///
/// Yaw is solved from the head-to-head vectors and translation from the
/// first player's head, for each combination of mirror and player swap.
pub fn is_reoriented(
    a: &Position,
    b: &Position,
    tol: &ReorientTolerance,
) -> Option<Reorientation> {
    let head_gap = (a.head_to_head().length() - b.head_to_head().length()).abs();
    if head_gap > tol.head_distance_delta {
        return None;
    }

    let head = PlayerJoint::new(Player::First, Joint::Head);
    let b_heading = b.head_to_head().heading();

    HYPOTHESES.iter().find_map(|&(mirror, swap_players)| {
        let flags = Reorientation::IDENTITY
            .with_mirror(mirror)
            .with_swap_players(swap_players);
        let flipped = flags.apply(a);

        let angle = b_heading - flipped.head_to_head().heading();
        let aligned = Reorientation::new(b[head] - flipped[head].yrot(angle), angle);

        tol.basically_same(&aligned.apply(&flipped), b)
            .then(|| flags.compose(&aligned))
    })
}

/// Pick a distinguished member of `p`'s equivalence class.
///
/// The head-to-head axis is turned onto +Z and the heads are centered
/// horizontally on the origin. With `with_mirror`, the result is also
/// mirrored if that makes the mean lateral coordinate non-negative.
pub fn canonical_reorientation(p: &Position, with_mirror: bool) -> Reorientation {
    let h0 = p[PlayerJoint::new(Player::First, Joint::Head)];
    let h1 = p[PlayerJoint::new(Player::Second, Joint::Head)];

    let angle = -(h1 - h0).heading();
    let mut center = (h0 + h1) * 0.5;
    center.y = 0.0;

    let r = Reorientation::new(-center.yrot(angle), angle);
    if !with_mirror {
        return r;
    }

    let lateral: f32 = r.apply(p).iter().map(|v| v.x).sum();
    if lateral < 0.0 {
        r.compose(&Reorientation::MIRROR)
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton_constants::reaching_pair;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f32::consts::PI;

    const EPS: f32 = 1e-6;

    fn random_reorientation(rng: &mut StdRng) -> Reorientation {
        Reorientation {
            offset: Vec3::new(
                rng.random_range(-2.0..2.0),
                rng.random_range(-0.2..0.2),
                rng.random_range(-2.0..2.0),
            ),
            angle: rng.random_range(-PI..PI),
            mirror: rng.random(),
            swap_players: rng.random(),
        }
    }

    fn flagged(rng: &mut StdRng, mirror: bool, swap_players: bool) -> Reorientation {
        random_reorientation(rng)
            .with_mirror(mirror)
            .with_swap_players(swap_players)
    }

    fn assert_same(a: &Position, b: &Position, what: &str) {
        let d = a.distance_squared_sum(b);
        assert!(d < EPS, "{}: distance squared sum {}", what, d);
    }

    #[test]
    fn test_identity_is_noop() {
        let p = reaching_pair();
        assert_same(&Reorientation::IDENTITY.apply(&p), &p, "identity");
    }

    #[test]
    fn test_mirror_relabels_sides() {
        let p = reaching_pair();
        let m = Reorientation::MIRROR.apply(&p);
        let left = PlayerJoint::new(Player::First, Joint::LeftHand);
        let right = PlayerJoint::new(Player::First, Joint::RightHand);
        assert_eq!(m[right], p[left].mirrored_x());
        assert_eq!(m[left], p[right].mirrored_x());
    }

    #[test]
    fn test_swap_exchanges_players() {
        let p = reaching_pair();
        let s = Reorientation::SWAP_PLAYERS.apply(&p);
        for joint in Joint::ALL {
            assert_eq!(
                s[PlayerJoint::new(Player::First, joint)],
                p[PlayerJoint::new(Player::Second, joint)]
            );
        }
    }

    #[test]
    fn test_compose_matches_sequential_application_all_flags() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let p = reaching_pair();
        for bits in 0..16u8 {
            for _ in 0..8 {
                let a = flagged(&mut rng, bits & 1 != 0, bits & 2 != 0);
                let b = flagged(&mut rng, bits & 4 != 0, bits & 8 != 0);
                let sequential = b.apply(&a.apply(&p));
                let composed = a.compose(&b).apply(&p);
                assert_same(&composed, &sequential, &format!("flags {:04b}", bits));
            }
        }
    }

    #[test]
    fn test_inverse_cancels_all_flags() {
        let mut rng = StdRng::seed_from_u64(11);
        let p = reaching_pair();
        for bits in 0..4u8 {
            for _ in 0..16 {
                let a = flagged(&mut rng, bits & 1 != 0, bits & 2 != 0);
                let inv = a.inverse();
                assert_same(&a.compose(&inv).apply(&p), &p, "a then inverse");
                assert_same(&inv.compose(&a).apply(&p), &p, "inverse then a");
                assert_eq!(inv.mirror, a.mirror);
                assert_eq!(inv.swap_players, a.swap_players);
            }
        }
    }

    #[test]
    fn test_compose_is_associative() {
        let mut rng = StdRng::seed_from_u64(42);
        let p = reaching_pair();
        for _ in 0..64 {
            let a = random_reorientation(&mut rng);
            let b = random_reorientation(&mut rng);
            let c = random_reorientation(&mut rng);
            let left = a.compose(&b).compose(&c).apply(&p);
            let right = a.compose(&b.compose(&c)).apply(&p);
            assert_same(&left, &right, "associativity");
        }
    }

    #[test]
    fn test_is_reoriented_recovers_transform() {
        let mut rng = StdRng::seed_from_u64(3);
        let tol = ReorientTolerance::default();
        let a = reaching_pair();
        for _ in 0..64 {
            let r = random_reorientation(&mut rng);
            let b = r.apply(&a);
            let found = is_reoriented(&a, &b, &tol).expect("reoriented copy should match");
            assert_eq!(found.mirror, r.mirror);
            assert_eq!(found.swap_players, r.swap_players);
            assert_same(&found.apply(&a), &b, "recovered transform");
        }
    }

    #[test]
    fn test_equivalence_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(99);
        let tol = ReorientTolerance::default();
        let a = reaching_pair();
        for _ in 0..64 {
            let b = random_reorientation(&mut rng).apply(&a);
            let forward = is_reoriented(&a, &b, &tol).expect("forward match");
            let backward = is_reoriented(&b, &a, &tol).expect("backward match");
            assert_same(
                &backward.apply(&b),
                &forward.inverse().apply(&b),
                "backward equals inverse of forward",
            );
        }
    }

    #[test]
    fn test_is_reoriented_rejects_different_pose() {
        let tol = ReorientTolerance::default();
        let a = reaching_pair();
        let mut b = a;
        b[PlayerJoint::new(Player::Second, Joint::RightKnee)].y += 0.4;
        assert_eq!(is_reoriented(&a, &b, &tol), None);
    }

    #[test]
    fn test_head_distance_shortcut() {
        let tol = ReorientTolerance::default();
        let a = reaching_pair();
        let mut b = a;
        b[PlayerJoint::new(Player::Second, Joint::Head)].z += 1.0;
        assert_eq!(is_reoriented(&a, &b, &tol), None);
    }

    #[test]
    fn test_canonical_aligns_heads() {
        let mut rng = StdRng::seed_from_u64(5);
        let p = reaching_pair();
        for _ in 0..16 {
            let q = Reorientation::new(
                Vec3::new(rng.random_range(-3.0..3.0), 0.0, rng.random_range(-3.0..3.0)),
                rng.random_range(-PI..PI),
            )
            .apply(&p);
            let c = canonical_reorientation(&q, false).apply(&q);
            let h0 = c[PlayerJoint::new(Player::First, Joint::Head)];
            let h1 = c[PlayerJoint::new(Player::Second, Joint::Head)];
            assert!(h0.x.abs() < 1e-4 && h1.x.abs() < 1e-4, "heads off axis: {} {}", h0, h1);
            assert!(h1.z > 0.0 && (h0.z + h1.z).abs() < 1e-4, "heads not centered: {} {}", h0, h1);
        }
    }

    #[test]
    fn test_canonical_form_is_class_invariant() {
        let mut rng = StdRng::seed_from_u64(8);
        let p = reaching_pair();
        let expected = canonical_reorientation(&p, true).apply(&p);
        for _ in 0..32 {
            let r = random_reorientation(&mut rng).with_swap_players(false);
            let q = r.apply(&p);
            let got = canonical_reorientation(&q, true).apply(&q);
            assert!(
                got.distance_squared_sum(&expected) < 1e-4,
                "canonical forms differ by {}",
                got.distance_squared_sum(&expected)
            );
        }
    }
}
