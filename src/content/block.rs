//! Block drawer that renders a black hole on a building

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{StarConfig, check_finite};
use crate::color::Color;
use crate::error::Result;
use crate::renderer::BlackHoleBatch;
use crate::sim::Team;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawBlackHole {
    /// Offset from the building center
    pub x: f32,
    pub y: f32,
    /// Horizon radius
    pub size: f32,
    /// Lensing radius
    pub edge: f32,
    /// Building team color if unset
    pub color: Option<Color>,
    pub star: StarConfig,
    /// Scale everything by the building's warmup
    pub warmup: bool,
}

impl Default for DrawBlackHole {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            size: 0.0,
            edge: 0.0,
            color: None,
            star: StarConfig::default(),
            warmup: true,
        }
    }
}

/// What the drawer reads from a building
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingView {
    pub pos: Vec2,
    pub team: Team,
    /// 0-1
    pub warmup: f32,
}

impl DrawBlackHole {
    pub fn new(size: f32, edge: f32) -> Self {
        Self {
            size,
            edge,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut drawer: Self = serde_json::from_str(json)?;
        drawer.load()?;
        Ok(drawer)
    }

    pub fn load(&mut self) -> Result<()> {
        check_finite(
            "black hole drawer",
            &[("size", self.size), ("edge", self.edge)],
        )?;
        self.star.init();
        Ok(())
    }

    pub fn draw(&self, build: &BuildingView, batch: &mut BlackHoleBatch) {
        let scale = if self.warmup { build.warmup } else { 1.0 };
        let pos = build.pos + Vec2::new(self.x, self.y);
        let color = self.color.unwrap_or_else(|| build.team.color());

        batch.add_zone(pos, self.size * scale, self.edge * scale, color);
        self.star.draw(batch, pos, scale, color);
    }
}
