//! Spring relaxation of limb lengths.
//!
//! A cheap heuristic, not a solver: each call does a single sweep that
//! nudges joints towards their limbs' rest lengths and lifts them off the
//! floor. Callers that want convergence call it repeatedly.

use crate::skeleton::{Player, PlayerJoint, Position, LIMBS};
use serde::{Deserialize, Serialize};

/// Largest displacement a single limb may apply to a joint in one sweep.
const MAX_FORCE: f32 = 0.3;

/// Forces at or below this magnitude are ignored.
const FORCE_THRESHOLD: f32 = 0.001;

/// Relaxation settings used by interactive edits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaxParams {
    /// Sweeps run after a joint is dragged.
    pub passes_after_drag: usize,
    /// Sweeps run after a keyframe is interpolated into a segment.
    pub passes_after_insert: usize,
}

impl Default for RelaxParams {
    fn default() -> Self {
        Self {
            passes_after_drag: 6,
            passes_after_insert: 30,
        }
    }
}

/// Displacement for a limb whose rest length exceeds its current length by `overshoot`.
#[inline]
fn spring_force(overshoot: f32) -> f32 {
    (overshoot / 3.0 + overshoot * overshoot * overshoot).clamp(-MAX_FORCE, MAX_FORCE)
}

/// One relaxation sweep.
///
/// Every limb contribution is computed from `p` itself, so the result does
/// not depend on limb order. `fixed`, if given, is returned untouched.
/// Coincident limb ends contribute nothing.
pub fn relax(p: &Position, fixed: Option<PlayerJoint>) -> Position {
    let mut r = *p;

    for player in Player::ALL {
        for limb in LIMBS.iter() {
            let [a, b] = limb.ends.map(|j| PlayerJoint::new(player, j));
            let force = spring_force(limb.length - p[a].distance(p[b]));
            if force.abs() <= FORCE_THRESHOLD {
                continue;
            }

            if fixed != Some(a) {
                r[a] -= (p[b] - p[a]).normalize_or_zero() * force;
            }
            if fixed != Some(b) {
                r[b] -= (p[a] - p[b]).normalize_or_zero() * force;
            }
        }
    }

    for pj in PlayerJoint::ALL {
        if fixed != Some(pj) {
            r[pj].y = r[pj].y.max(pj.joint.radius());
        }
    }

    r
}

/// Apply [`relax`] `passes` times.
pub fn relax_repeatedly(p: &Position, fixed: Option<PlayerJoint>, passes: usize) -> Position {
    (0..passes).fold(*p, |acc, _| relax(&acc, fixed))
}

/// Largest absolute difference between any limb's length and its rest length.
pub fn max_limb_error(p: &Position) -> f32 {
    Player::ALL
        .iter()
        .flat_map(|&player| {
            LIMBS.iter().map(move |limb| {
                let [a, b] = limb.ends.map(|j| PlayerJoint::new(player, j));
                (p[a].distance(p[b]) - limb.length).abs()
            })
        })
        .fold(0.0, f32::max)
}
