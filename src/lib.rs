//! Black hole effects - suction fields, swirl particles and gravitational lensing
//!
//! Core modules:
//! - `sim`: Deterministic field physics and swirl particles (no rendering)
//! - `renderer`: Per-frame zone batching and the lensing compositor
//! - `content`: Data-driven bullet/ability/block descriptors built on the core
//! - `platform`: Browser/native platform abstraction
//! - `settings`: Persisted rendering preferences

pub mod color;
pub mod content;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use color::Color;
pub use error::{Error, Result};
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Engine-facing constants
pub mod consts {
    /// Host simulation rate. All times in this crate are in ticks.
    pub const TICKS_PER_SECOND: f32 = 60.0;

    /// Projectiles slower than this are static/beam types and never pulled
    pub const MIN_BULLET_SPEED: f32 = 0.01;

    /// Field defaults
    pub const DEFAULT_DAMAGE_RADIUS: f32 = 6.0;
    pub const DEFAULT_SUCTION_RADIUS: f32 = 160.0;
    pub const DEFAULT_FORCE: f32 = 10.0;
    pub const DEFAULT_SCALED_FORCE: f32 = 800.0;
    pub const DEFAULT_BULLET_FORCE: f32 = 0.1;
    pub const DEFAULT_SCALED_BULLET_FORCE: f32 = 1.0;
    pub const DEFAULT_BULLET_DAMAGE: f32 = 10.0;

    /// Zones the lensing shaders are built for before the first rebuild
    pub const INITIAL_ZONE_CAPACITY: usize = 32;
    /// Simplified mode glow extends to this multiple of the horizon radius
    pub const SIMPLIFIED_GLOW_SCALE: f32 = 4.0;

    /// Host draw layers the compositor hooks into
    pub mod layer {
        pub const BACKGROUND: f32 = -60.0;
        pub const EFFECT: f32 = 110.0;
        pub const MAX: f32 = 200.0;
        /// Scene capture starts here
        pub const BEGIN: f32 = BACKGROUND - 0.1;
        /// Capture ends and zones are composited here
        pub const END: f32 = MAX - 5.0;
        /// Swirls draw just above the bloom-affected effect layer
        pub const SWIRL: f32 = EFFECT + 0.005;
    }
}

/// Vector of length `len` pointing at `angle_deg` (0° = +x, counter-clockwise)
#[inline]
pub fn trns(angle_deg: f32, len: f32) -> Vec2 {
    polar_to_cartesian(len, angle_deg.to_radians())
}

/// Rotate a vector by `angle_deg` degrees
#[inline]
pub fn rotate_deg(v: Vec2, angle_deg: f32) -> Vec2 {
    Vec2::from_angle(angle_deg.to_radians()).rotate(v)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Axis-aligned query box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Square box of side `2 * half_extent` centered on `center`
    pub fn around(center: Vec2, half_extent: f32) -> Self {
        let half = Vec2::splat(half_extent);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// A box with a non-positive extent contains nothing
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        !self.is_empty()
            && p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
    }
}

/// Strict distance check, `dst(a, b) < radius`
#[inline]
pub fn within(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}
