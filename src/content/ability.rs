//! Black hole unit ability
//!
//! A field carried by a unit at a fixed offset from its center. The offset
//! turns with the unit.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{SwirlEmitter, check_finite};
use crate::color::Color;
use crate::error::Result;
use crate::renderer::BlackHoleBatch;
use crate::rotate_deg;
use crate::sim::{
    EntityId, FieldHost, FieldParams, ForceField, ForceFieldRequest, Interval, ParentLookup,
    SwirlPool, Team,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackHoleAbility {
    /// Offset from the unit, +y is the unit's facing
    pub x: f32,
    pub y: f32,
    /// Ticks between field applications
    pub reload: f32,
    pub horizon_radius: f32,
    /// Suction radius if negative
    pub lensing_radius: f32,
    /// Horizon radius if negative
    pub damage_radius: f32,
    pub suction_radius: f32,
    pub repel: bool,
    pub force: f32,
    pub scaled_force: f32,
    pub bullet_force: f32,
    pub scaled_bullet_force: f32,
    pub damage: f32,
    pub bullet_damage: f32,
    /// Owner team color if unset
    pub color: Option<Color>,
    pub swirl: SwirlEmitter,
}

impl Default for BlackHoleAbility {
    fn default() -> Self {
        let field = FieldParams::default();
        Self {
            x: 0.0,
            y: 0.0,
            reload: 2.0,
            horizon_radius: 6.0,
            lensing_radius: -1.0,
            damage_radius: -1.0,
            suction_radius: field.suction_radius,
            repel: field.repel,
            force: field.force,
            scaled_force: field.scaled_force,
            bullet_force: field.bullet_force,
            scaled_bullet_force: field.scaled_bullet_force,
            damage: 30.0,
            bullet_damage: field.bullet_damage,
            color: None,
            swirl: SwirlEmitter::default(),
        }
    }
}

/// What the ability needs to know about its unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbilityOwner {
    pub id: EntityId,
    pub team: Team,
    pub pos: Vec2,
    /// Degrees, 90 is facing +y
    pub rotation: f32,
}

/// Per-unit timers
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AbilityState {
    suction_timer: Interval,
    effect_timer: Interval,
}

impl AbilityState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlackHoleAbility {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut ability: Self = serde_json::from_str(json)?;
        ability.init()?;
        Ok(ability)
    }

    pub fn init(&mut self) -> Result<()> {
        check_finite(
            "black hole ability",
            &[
                ("x", self.x),
                ("y", self.y),
                ("reload", self.reload),
                ("horizon_radius", self.horizon_radius),
                ("suction_radius", self.suction_radius),
            ],
        )?;
        if self.damage_radius < 0.0 {
            self.damage_radius = self.horizon_radius;
        }
        if self.lensing_radius < 0.0 {
            self.lensing_radius = self.suction_radius;
        }
        Ok(())
    }

    pub fn field_params(&self) -> FieldParams {
        FieldParams {
            damage_radius: self.damage_radius,
            suction_radius: self.suction_radius,
            repel: self.repel,
            force: self.force,
            scaled_force: self.scaled_force,
            bullet_force: self.bullet_force,
            scaled_bullet_force: self.scaled_bullet_force,
            bullet_damage: self.bullet_damage,
        }
    }

    /// World position of the field for `owner`
    pub fn center(&self, owner: &AbilityOwner) -> Vec2 {
        owner.pos + rotate_deg(Vec2::new(self.x, self.y), owner.rotation - 90.0)
    }

    fn color_for(&self, team: Team) -> Color {
        self.color.unwrap_or_else(|| team.color())
    }

    pub fn update<H>(
        &self,
        state: &mut AbilityState,
        owner: &AbilityOwner,
        host: &mut H,
        field: &mut ForceField,
        swirls: &mut SwirlPool,
        delta: f32,
    ) where
        H: FieldHost + ParentLookup + ?Sized,
    {
        let center = self.center(owner);

        if state.suction_timer.tick(delta, self.reload) {
            let req = ForceFieldRequest::new(
                owner.team,
                Some(owner.id),
                center,
                self.damage,
                &self.field_params(),
            );
            field.apply(host, &req);
        }

        if self.swirl.enabled() && state.effect_timer.tick(delta, self.swirl.interval) {
            self.swirl.burst(
                swirls,
                center,
                self.suction_radius,
                self.color_for(owner.team),
                Some(owner.id),
                &*host,
            );
        }
    }

    pub fn draw(&self, owner: &AbilityOwner, batch: &mut BlackHoleBatch) {
        batch.add_zone(
            self.center(owner),
            self.horizon_radius,
            self.lensing_radius,
            self.color_for(owner.team),
        );
    }
}
