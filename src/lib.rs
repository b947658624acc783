//! Swordfall - a top-down sword-and-bullets action game
//!
//! Core modules:
//! - `sim`: Actor state machines, collision dispatch, mission script, game loop
//! - `renderer`: Camera and backend-agnostic draw lists
//! - `audio`: Sound/music cue mixing
//! - `settings`: Tuning and preferences loaded from JSON

pub mod audio;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta fed into the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Canvas dimensions
    pub const CANVAS_WIDTH: f32 = 1920.0;
    pub const CANVAS_HEIGHT: f32 = 1080.0;

    /// 10 pixels per 30 cm
    pub const PIXEL_PER_METER: f32 = 10.0 / 0.3;

    /// Projectiles despawn this far (pixels) from where they spawned
    pub const PROJECTILE_RANGE: f32 = CANVAS_WIDTH * 3.0;
}

/// Convert km/h into pixels per second
#[inline]
pub const fn kmph_to_pps(kmph: f32) -> f32 {
    kmph * 1000.0 / 3600.0 * consts::PIXEL_PER_METER
}

/// Normalize `v`, or return `fallback` for a zero-length vector
#[inline]
pub fn unit_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let len = v.length();
    if len > 0.0 { v / len } else { fallback }
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (1.0 - t) * a + t * b
}

/// Angle (radians) of the vector pointing from `from` to `to`
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
