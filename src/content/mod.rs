//! Data-driven black hole content
//!
//! Descriptors are plain serde structs a host can load from JSON content
//! files. Unset radii use `-1` and are resolved by each descriptor's
//! `init()`, which must run once before use.

pub mod ability;
pub mod block;
pub mod bullet;

pub use ability::{AbilityOwner, AbilityState, BlackHoleAbility};
pub use block::{BuildingView, DrawBlackHole};
pub use bullet::{BlackHoleBullet, BulletState};

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::renderer::BlackHoleBatch;
use crate::sim::{EntityId, ParentLookup, SwirlEffect, SwirlPool, SwirlSpawn};

/// Optional star drawn over a black hole
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarConfig {
    /// Disabled when not positive
    pub width: f32,
    /// `width / 2` when negative
    pub height: f32,
    /// Degrees
    pub angle: f32,
    /// Center color, owner color if unset
    pub color_in: Option<Color>,
    /// Tip color, owner color if unset
    pub color_out: Option<Color>,
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            width: -1.0,
            height: -1.0,
            angle: 0.0,
            color_in: None,
            color_out: None,
        }
    }
}

impl StarConfig {
    pub fn enabled(&self) -> bool {
        self.width > 0.0
    }

    fn init(&mut self) {
        if self.enabled() && self.height < 0.0 {
            self.height = self.width / 2.0;
        }
    }

    /// Register the star, scaled by `scale`
    pub fn draw(&self, batch: &mut BlackHoleBatch, pos: Vec2, scale: f32, owner_color: Color) {
        if !self.enabled() {
            return;
        }
        batch.add_star(
            pos,
            self.width * scale,
            self.height * scale,
            self.angle,
            self.color_in.unwrap_or(owner_color),
            self.color_out.unwrap_or(owner_color),
        );
    }
}

/// Swirl spawning shared by bullets and abilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwirlEmitter {
    /// Ticks between bursts, no swirls when not positive
    pub interval: f32,
    /// Swirls per burst
    pub count: usize,
    pub counter_clockwise: bool,
    /// `None` disables swirls
    pub effect: Option<Arc<SwirlEffect>>,
}

impl Default for SwirlEmitter {
    fn default() -> Self {
        Self {
            interval: 3.0,
            count: 4,
            counter_clockwise: false,
            effect: Some(Arc::new(SwirlEffect::default().with_color(Color::BLACK))),
        }
    }
}

impl SwirlEmitter {
    pub fn enabled(&self) -> bool {
        self.interval > 0.0 && self.count > 0 && self.effect.is_some()
    }

    /// Lifetime of the configured swirl, 0 without one
    pub fn lifetime(&self) -> f32 {
        self.effect.as_ref().map_or(0.0, |e| e.lifetime)
    }

    /// Spawn one burst falling into `pos` from `radius`
    pub fn burst<L: ParentLookup + ?Sized>(
        &self,
        pool: &mut SwirlPool,
        pos: Vec2,
        radius: f32,
        color: Color,
        parent: Option<EntityId>,
        lookup: &L,
    ) -> usize {
        let Some(effect) = &self.effect else {
            return 0;
        };
        let radius = if self.counter_clockwise { -radius } else { radius };
        let spawn = SwirlSpawn {
            pos,
            radius,
            color,
            parent,
        };
        (0..self.count)
            .filter(|_| pool.spawn(effect, spawn, lookup).is_some())
            .count()
    }
}

/// Reject NaN and infinite tunables
fn check_finite(kind: &'static str, fields: &[(&str, f32)]) -> Result<()> {
    for (name, value) in fields {
        if !value.is_finite() {
            return Err(Error::InvalidContent {
                kind,
                reason: format!("{name} is {value}"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::NoParents;

    #[test]
    fn test_star_height_defaults_to_half_width() {
        let mut star = StarConfig {
            width: 12.0,
            ..StarConfig::default()
        };
        star.init();
        assert_eq!(star.height, 6.0);

        let mut off = StarConfig::default();
        off.init();
        assert_eq!(off.height, -1.0);
    }

    #[test]
    fn test_disabled_star_not_drawn() {
        let mut batch = BlackHoleBatch::new();
        StarConfig::default().draw(&mut batch, Vec2::ZERO, 1.0, Color::WHITE);
        assert!(batch.stars.is_empty());
    }

    #[test]
    fn test_counter_clockwise_burst() {
        let emitter = SwirlEmitter {
            counter_clockwise: true,
            ..SwirlEmitter::default()
        };
        let mut pool = SwirlPool::new(16);
        let n = emitter.burst(&mut pool, Vec2::ZERO, 100.0, Color::WHITE, None, &NoParents);
        assert_eq!(n, 4);
        assert!(pool.iter().all(|p| p.rotation_delta() < 0.0));
    }

    #[test]
    fn test_burst_respects_pool_cap() {
        let mut pool = SwirlPool::new(3);
        let n = SwirlEmitter::default().burst(&mut pool, Vec2::ZERO, 50.0, Color::WHITE, None, &NoParents);
        assert_eq!(n, 3);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(check_finite("test", &[("a", 1.0)]).is_ok());
        assert!(matches!(
            check_finite("test", &[("a", f32::NAN)]),
            Err(Error::InvalidContent { kind: "test", .. })
        ));
    }
}
