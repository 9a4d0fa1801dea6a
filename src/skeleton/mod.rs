//! Skeleton model: joints, limbs and the two-player `Position`.

pub mod joint;
pub mod limb;
pub mod position;

pub use joint::*;
pub use limb::*;
pub use position::*;

static_assertions::const_assert_eq!(PlayerJoint::COUNT, 46);
static_assertions::const_assert_eq!(JOINT_DEFS.len(), Joint::COUNT);
