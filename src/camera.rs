use glam::{Mat4, Quat, Vec2, Vec3, Vec4Swizzles};
use serde::{Deserialize, Serialize};

/// Projects world points into normalized device coordinates (x and y in [-1, 1]
/// for points inside the view).
///
/// The viable search only ever needs this one mapping, so tests can pass a
/// plain closure.
pub trait WorldToScreen {
    fn world_to_screen(&self, v: Vec3) -> Vec2;
}

impl<F: Fn(Vec3) -> Vec2> WorldToScreen for F {
    fn world_to_screen(&self, v: Vec3) -> Vec2 {
        self(v)
    }
}

/// Elevation limits as dot product of camera direction with world up
const MIN_UP_DOT: f32 = 0.05; // Camera must be at least slightly above target
const MAX_UP_DOT: f32 = 0.98; // Don't allow looking straight down

const MIN_DISTANCE: f32 = 0.5;

/// Default point to orbit: between the players, around hip height.
pub const CAMERA_TARGET: Vec3 = Vec3::new(0.0, 0.5, 0.0);

/// The camera orbits around a target point. Its position is determined
/// by rotating a "back" vector (0, 0, distance) by the orientation quaternion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub target: Vec3,
    /// Quaternion representing camera's orbital rotation
    pub orientation: Quat,
    /// Distance from target point
    pub distance: f32,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Viewport width over height
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        // yaw=0.7, pitch=-0.25 (negative pitch = camera above target)
        let yaw_quat = Quat::from_rotation_y(0.7);
        let pitch_quat = Quat::from_rotation_x(-0.25);

        Self {
            target: CAMERA_TARGET,
            orientation: (yaw_quat * pitch_quat).normalize(),
            distance: 4.0,
            fov_y: std::f32::consts::FRAC_PI_2,
            aspect: 1.0,
        }
    }
}

impl Camera {
    pub fn new(target: Vec3, orientation: Quat, distance: f32) -> Self {
        Self {
            target,
            orientation,
            distance: distance.max(MIN_DISTANCE),
            ..Self::default()
        }
    }

    /// Camera looking at `target` from horizontal angle `azimuth` and
    /// elevation `elevation` (both radians).
    pub fn from_spherical(target: Vec3, azimuth: f32, elevation: f32, distance: f32) -> Self {
        let orientation =
            (Quat::from_rotation_y(azimuth) * Quat::from_rotation_x(-elevation)).normalize();
        Self::new(target, orientation, distance)
    }

    /// Compute new camera with rotation applied
    ///
    /// Returns a new Camera with the rotation applied, or the original
    /// camera if the rotation would exceed elevation limits.
    pub fn with_rotation(self, axis: Vec3, angle: f32) -> Camera {
        let axis = axis.normalize_or_zero();
        if axis.length_squared() < 0.5 {
            return self;
        }

        let delta = Quat::from_axis_angle(axis, angle);
        let new_orientation = (delta * self.orientation).normalize();

        let up_dot = (new_orientation * Vec3::Z).y;
        if (MIN_UP_DOT..=MAX_UP_DOT).contains(&up_dot) {
            return Camera {
                orientation: new_orientation,
                ..self
            };
        }

        // Outside the limits, only accept rotations heading back into them.
        let old_up_dot = (self.orientation * Vec3::Z).y;
        let moving_to_valid = (old_up_dot < MIN_UP_DOT && up_dot > old_up_dot)
            || (old_up_dot > MAX_UP_DOT && up_dot < old_up_dot);

        if moving_to_valid {
            Camera {
                orientation: new_orientation,
                ..self
            }
        } else {
            self
        }
    }

    pub fn with_zoom(self, delta: f32) -> Camera {
        Camera {
            distance: (self.distance + delta).max(MIN_DISTANCE),
            ..self
        }
    }

    pub fn with_target(self, target: Vec3) -> Camera {
        Camera { target, ..self }
    }

    pub fn with_viewport(self, width: f32, height: f32) -> Camera {
        if width <= 0.0 || height <= 0.0 {
            return self;
        }
        Camera {
            aspect: width / height,
            ..self
        }
    }

    pub fn eye_position(&self) -> Vec3 {
        self.target + self.orientation * Vec3::new(0.0, 0.0, self.distance)
    }

    /// Heading of the eye around the target, as a reorientation angle.
    pub fn horizontal_rotation(&self) -> f32 {
        let back = self.orientation * Vec3::Z;
        back.x.atan2(back.z)
    }

    /// Compute camera's local right axis
    ///
    /// This is the axis to rotate around for up/down elevation changes.
    pub fn right_axis(&self) -> Vec3 {
        let forward = (self.target - self.eye_position()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        // X axis if degenerate (looking straight up/down)
        if right.length_squared() < 0.5 {
            Vec3::X
        } else {
            right
        }
    }

    /// Uses world up so orbiting never rolls the view.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, 0.1, self.distance + 6.0)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl WorldToScreen for Camera {
    fn world_to_screen(&self, v: Vec3) -> Vec2 {
        let clip = self.view_projection() * v.extend(1.0);
        let w = if clip.w.abs() < 1e-6 { 1e-6 } else { clip.w };
        clip.xy() / w
    }
}
