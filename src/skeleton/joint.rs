use serde::{Deserialize, Serialize};

/// One of the 23 body landmarks tracked per player.
///
/// Left/right pairs are adjacent (left first), followed by the three
/// centre-line joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Joint {
    LeftToe = 0,
    RightToe = 1,
    LeftHeel = 2,
    RightHeel = 3,
    LeftAnkle = 4,
    RightAnkle = 5,
    LeftKnee = 6,
    RightKnee = 7,
    LeftHip = 8,
    RightHip = 9,
    LeftShoulder = 10,
    RightShoulder = 11,
    LeftElbow = 12,
    RightElbow = 13,
    LeftWrist = 14,
    RightWrist = 15,
    LeftHand = 16,
    RightHand = 17,
    LeftFingers = 18,
    RightFingers = 19,
    Core = 20,
    Neck = 21,
    Head = 22,
}

impl Joint {
    /// Total number of joints per player
    pub const COUNT: usize = 23;

    /// Index of the first centre-line joint; everything before it is paired.
    const FIRST_CENTRE: usize = Joint::Core as usize;

    pub const ALL: [Joint; Self::COUNT] = [
        Joint::LeftToe,
        Joint::RightToe,
        Joint::LeftHeel,
        Joint::RightHeel,
        Joint::LeftAnkle,
        Joint::RightAnkle,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHand,
        Joint::RightHand,
        Joint::LeftFingers,
        Joint::RightFingers,
        Joint::Core,
        Joint::Neck,
        Joint::Head,
    ];

    /// Convert to array index
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The same landmark on the other side of the body.
    #[inline]
    pub const fn mirror(self) -> Joint {
        let i = self.index();
        if i < Self::FIRST_CENTRE {
            Self::ALL[i ^ 1]
        } else {
            self
        }
    }

    #[inline]
    pub const fn def(self) -> JointDef {
        JOINT_DEFS[self.index()]
    }

    #[inline]
    pub const fn radius(self) -> f32 {
        self.def().radius
    }

    #[inline]
    pub const fn draggable(self) -> bool {
        self.def().draggable
    }
}

/// Static per-joint metadata
#[derive(Debug, Clone, Copy)]
pub struct JointDef {
    /// Collision and rendering radius in meters; also the floor clearance.
    pub radius: f32,
    /// Whether the user may grab this joint to navigate or edit.
    pub draggable: bool,
}

const fn def(radius: f32, draggable: bool) -> JointDef {
    JointDef { radius, draggable }
}

/// Joint metadata, indexed by [`Joint::index`].
pub const JOINT_DEFS: [JointDef; Joint::COUNT] = [
    def(0.025, false), // toes
    def(0.025, false),
    def(0.03, false), // heels
    def(0.03, false),
    def(0.03, true), // ankles
    def(0.03, true),
    def(0.05, true), // knees
    def(0.05, true),
    def(0.10, true), // hips
    def(0.10, true),
    def(0.08, true), // shoulders
    def(0.08, true),
    def(0.045, true), // elbows
    def(0.045, true),
    def(0.02, false), // wrists
    def(0.02, false),
    def(0.02, true), // hands
    def(0.02, true),
    def(0.02, false), // fingers
    def(0.02, false),
    def(0.1, false),  // core
    def(0.04, false), // neck
    def(0.11, true),  // head
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Player {
    First = 0,
    Second = 1,
}

impl Player {
    pub const COUNT: usize = 2;
    pub const ALL: [Player; Self::COUNT] = [Player::First, Player::Second];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }
}

/// A joint of a specific player; the key into per-player-per-joint data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerJoint {
    pub player: Player,
    pub joint: Joint,
}

const fn all_player_joints() -> [PlayerJoint; PlayerJoint::COUNT] {
    let mut out = [PlayerJoint {
        player: Player::First,
        joint: Joint::LeftToe,
    }; PlayerJoint::COUNT];
    let mut p = 0;
    while p < Player::COUNT {
        let mut j = 0;
        while j < Joint::COUNT {
            out[p * Joint::COUNT + j] = PlayerJoint {
                player: Player::ALL[p],
                joint: Joint::ALL[j],
            };
            j += 1;
        }
        p += 1;
    }
    out
}

impl PlayerJoint {
    pub const COUNT: usize = Player::COUNT * Joint::COUNT;

    /// Every player joint, player-major.
    pub const ALL: [PlayerJoint; Self::COUNT] = all_player_joints();

    pub const fn new(player: Player, joint: Joint) -> Self {
        Self { player, joint }
    }

    /// Flat index in [0, 46), matching the order of [`PlayerJoint::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self.player.index() * Joint::COUNT + self.joint.index()
    }

    /// Where this joint's data comes from under a mirror and/or player swap.
    #[inline]
    pub const fn relabeled(self, mirror: bool, swap_players: bool) -> PlayerJoint {
        PlayerJoint {
            player: if swap_players {
                self.player.opponent()
            } else {
                self.player
            },
            joint: if mirror { self.joint.mirror() } else { self.joint },
        }
    }
}

impl std::fmt::Display for PlayerJoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {:?}", self.player, self.joint)
    }
}
