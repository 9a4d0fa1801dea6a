//! GrappleMap core
//!
//! A graph of two-player grappling positions joined by animated transitions,
//! with position deduplication up to rotation, translation, mirroring and
//! player swap, and the search that decides where a dragged joint can go.
//!
//! Rendering, persistence and input handling live outside this crate; they
//! talk to it through [`graph::Graph`], [`editor::EditorSession`] and the
//! render-ready buffers in [`highlight`].

pub mod camera;
pub mod config;
pub mod editor;
pub mod error;
pub mod graph;
pub mod highlight;
pub mod math;
pub mod metadata;
pub mod reorientation;
pub mod skeleton;
pub mod skeleton_constants;
pub mod spring;
pub mod viables;

pub use camera::{Camera, WorldToScreen};
pub use config::EngineConfig;
pub use editor::EditorSession;
pub use error::{GraphError, GraphResult, PositionError};
pub use glam::{Vec2, Vec3};
pub use graph::Graph;
pub use reorientation::{ReorientTolerance, Reorientation};
pub use skeleton::{Joint, Player, PlayerJoint, Position};

/// Route `log` output to the browser console on wasm32; elsewhere only the
/// level is set and the host installs its own logger.
pub fn init_logging(level: log::Level) {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            console_error_panic_hook::set_once();
            console_log::init_with_level(level).ok();
        } else {
            log::set_max_level(level.to_level_filter());
        }
    }
}
