use super::joint::{Joint, Player, PlayerJoint};
use crate::error::PositionError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A full two-player configuration: one point per player joint.
///
/// Serialized as a flat, player-major list of 46 `[x, y, z]` triples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f32; 3]>", into = "Vec<[f32; 3]>")]
pub struct Position {
    coords: [[Vec3; Joint::COUNT]; Player::COUNT],
}

impl Default for Position {
    fn default() -> Self {
        Self {
            coords: [[Vec3::ZERO; Joint::COUNT]; Player::COUNT],
        }
    }
}

impl Index<PlayerJoint> for Position {
    type Output = Vec3;

    #[inline]
    fn index(&self, pj: PlayerJoint) -> &Vec3 {
        &self.coords[pj.player.index()][pj.joint.index()]
    }
}

impl IndexMut<PlayerJoint> for Position {
    #[inline]
    fn index_mut(&mut self, pj: PlayerJoint) -> &mut Vec3 {
        &mut self.coords[pj.player.index()][pj.joint.index()]
    }
}

impl Position {
    pub fn new(coords: [[Vec3; Joint::COUNT]; Player::COUNT]) -> Self {
        Self { coords }
    }

    /// Build from a flat player-major slice of exactly 46 points.
    pub fn from_flat(points: &[Vec3]) -> Result<Self, PositionError> {
        if points.len() != PlayerJoint::COUNT {
            return Err(PositionError::WrongJointCount {
                expected: PlayerJoint::COUNT,
                got: points.len(),
            });
        }
        if let Some(index) = points.iter().position(|v| !v.is_finite()) {
            return Err(PositionError::NonFinite { index });
        }
        let mut p = Position::default();
        for (pj, v) in PlayerJoint::ALL.iter().zip(points) {
            p[*pj] = *v;
        }
        Ok(p)
    }

    /// Build by evaluating `f` for each player joint.
    pub fn from_fn(mut f: impl FnMut(PlayerJoint) -> Vec3) -> Self {
        let mut p = Position::default();
        for pj in PlayerJoint::ALL {
            p[pj] = f(pj);
        }
        p
    }

    pub fn player(&self, player: Player) -> &[Vec3; Joint::COUNT] {
        &self.coords[player.index()]
    }

    /// Points in player-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Vec3> {
        self.coords.iter().flatten()
    }

    pub fn is_finite(&self) -> bool {
        self.iter().all(|v| v.is_finite())
    }

    /// Vector from the first player's head to the second player's head.
    #[inline]
    pub fn head_to_head(&self) -> Vec3 {
        self[PlayerJoint::new(Player::Second, Joint::Head)]
            - self[PlayerJoint::new(Player::First, Joint::Head)]
    }

    /// Sum of squared point-to-point distances.
    pub fn distance_squared_sum(&self, other: &Position) -> f32 {
        crate::math::sum_distance_squared(self.iter(), other.iter())
    }

    /// Linear interpolation between two positions.
    pub fn between(a: &Position, b: &Position, t: f32) -> Position {
        Position::from_fn(|pj| a[pj].lerp(b[pj], t))
    }

    pub fn translated(&self, offset: Vec3) -> Position {
        Position::from_fn(|pj| self[pj] + offset)
    }
}

impl TryFrom<Vec<[f32; 3]>> for Position {
    type Error = PositionError;

    fn try_from(raw: Vec<[f32; 3]>) -> Result<Self, Self::Error> {
        let points: Vec<Vec3> = raw.into_iter().map(Vec3::from_array).collect();
        Position::from_flat(&points)
    }
}

impl From<Position> for Vec<[f32; 3]> {
    fn from(p: Position) -> Self {
        p.iter().map(|v| v.to_array()).collect()
    }
}
