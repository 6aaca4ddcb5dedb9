//! Black hole projectile
//!
//! A slow bullet that grows in, pulls everything hostile around it, sheds
//! swirls and shrinks out at the end of its life.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{StarConfig, SwirlEmitter, check_finite};
use crate::color::Color;
use crate::consts::{TICKS_PER_SECOND, layer};
use crate::error::{Error, Result};
use crate::renderer::BlackHoleBatch;
use crate::sim::{
    EntityId, FieldHost, FieldParams, ForceField, ForceFieldRequest, Interp, Interval,
    ParentLookup, SwirlPool, Team, curve,
};

/// Ticks between field applications
const FIELD_PERIOD: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackHoleBullet {
    pub speed: f32,
    /// Area damage per field application
    pub damage: f32,
    /// Ticks
    pub lifetime: f32,
    /// Drawn horizon, damage radius if negative
    pub horizon_radius: f32,
    /// Drawn lensing range, suction radius if negative
    pub lensing_radius: f32,
    #[serde(flatten)]
    pub field: FieldParams,
    /// Owner team color if unset
    pub color: Option<Color>,
    pub grow_time: f32,
    /// Swirl lifetime if negative
    pub shrink_time: f32,
    pub star: StarConfig,
    pub swirl: SwirlEmitter,
    pub layer: f32,
}

impl Default for BlackHoleBullet {
    fn default() -> Self {
        Self {
            speed: 1.0,
            damage: 1.0,
            lifetime: 300.0,
            horizon_radius: -1.0,
            lensing_radius: -1.0,
            field: FieldParams::default(),
            color: None,
            grow_time: 10.0,
            shrink_time: -1.0,
            star: StarConfig::default(),
            swirl: SwirlEmitter::default(),
            layer: layer::END + 0.01,
        }
    }
}

/// Per-bullet runtime state
#[derive(Debug, Clone, PartialEq)]
pub struct BulletState {
    pub id: EntityId,
    pub team: Team,
    /// Kept in sync by the host
    pub pos: Vec2,
    /// Ticks alive
    pub time: f32,
    field_timer: Interval,
    swirl_timer: Interval,
}

impl BulletState {
    pub fn new(id: EntityId, team: Team, pos: Vec2) -> Self {
        Self {
            id,
            team,
            pos,
            time: 0.0,
            field_timer: Interval::new(),
            swirl_timer: Interval::new(),
        }
    }
}

impl BlackHoleBullet {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut bullet: Self = serde_json::from_str(json)?;
        bullet.init()?;
        Ok(bullet)
    }

    /// Resolve defaults that depend on other fields
    pub fn init(&mut self) -> Result<()> {
        check_finite(
            "black hole bullet",
            &[
                ("lifetime", self.lifetime),
                ("damage_radius", self.field.damage_radius),
                ("suction_radius", self.field.suction_radius),
                ("grow_time", self.grow_time),
            ],
        )?;
        if self.lifetime <= 0.0 {
            return Err(Error::InvalidContent {
                kind: "black hole bullet",
                reason: format!("lifetime must be positive, got {}", self.lifetime),
            });
        }

        if self.lensing_radius < 0.0 {
            self.lensing_radius = self.field.suction_radius;
        }
        if self.shrink_time < 0.0 {
            self.shrink_time = self.swirl.lifetime();
        }
        if self.horizon_radius < 0.0 {
            self.horizon_radius = self.field.damage_radius;
        }
        self.star.init();
        Ok(())
    }

    /// Culling size for the bullet's draw
    pub fn draw_size(&self) -> f32 {
        self.lensing_radius * 2.0
    }

    /// Culling size for its swirls
    pub fn swirl_clip(&self) -> f32 {
        match &self.swirl.effect {
            Some(effect) if effect.max_dst <= 0.0 => {
                effect.clip_size(self.field.suction_radius * 2.0)
            }
            Some(effect) => effect.clip_size(0.0),
            None => 0.0,
        }
    }

    /// Damage per second from the field
    pub fn damage_per_second(&self) -> f32 {
        self.damage / FIELD_PERIOD * TICKS_PER_SECOND
    }

    /// Grow/shrink scale at `time`
    pub fn fout(&self, time: f32) -> f32 {
        Interp::SineOut.apply(
            curve(time, 0.0, self.grow_time)
                - curve(time, self.lifetime - self.shrink_time, self.lifetime),
        )
    }

    fn color_for(&self, team: Team) -> Color {
        self.color.unwrap_or_else(|| team.color())
    }

    /// Advance one step; true once the bullet has reached its lifetime
    pub fn update<H>(
        &self,
        state: &mut BulletState,
        host: &mut H,
        field: &mut ForceField,
        swirls: &mut SwirlPool,
        delta: f32,
    ) -> bool
    where
        H: FieldHost + ParentLookup + ?Sized,
    {
        state.time = (state.time + delta).min(self.lifetime);

        if state.field_timer.tick(delta, FIELD_PERIOD) {
            let req =
                ForceFieldRequest::new(state.team, Some(state.id), state.pos, self.damage, &self.field)
                    .scaled(self.fout(state.time));
            field.apply(host, &req);
        }

        self.update_swirls(state, swirls, &*host, delta);
        state.time >= self.lifetime
    }

    /// Spawn swirl bursts until the swirls would outlive the bullet
    pub fn update_swirls<L: ParentLookup + ?Sized>(
        &self,
        state: &mut BulletState,
        swirls: &mut SwirlPool,
        lookup: &L,
        delta: f32,
    ) -> usize {
        if !self.swirl.enabled() || state.time > self.lifetime - self.swirl.lifetime() {
            return 0;
        }
        if !state.swirl_timer.tick(delta, self.swirl.interval) {
            return 0;
        }
        self.swirl.burst(
            swirls,
            state.pos,
            self.field.suction_radius * self.fout(state.time),
            self.color_for(state.team),
            Some(state.id),
            lookup,
        )
    }

    /// Register this frame's zone and star
    pub fn draw(&self, state: &BulletState, batch: &mut BlackHoleBatch) {
        let fout = self.fout(state.time);
        let color = self.color_for(state.team);
        batch.add_zone(
            state.pos,
            self.horizon_radius * fout,
            self.lensing_radius * fout,
            color,
        );
        self.star.draw(batch, state.pos, fout, color);
    }
}
