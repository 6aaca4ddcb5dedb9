//! Host capabilities the field and particles rely on
//!
//! The host owns every entity. Queries copy what the field needs into
//! caller-owned scratch vectors, and all effects go back through explicit
//! calls, so no host collection is mutated while it is being iterated.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::immunity::{BulletCategory, BulletTypeId, Capabilities, UnitCategory, UnitTypeId};
use crate::Aabb;
use crate::color::Color;

/// Faction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Team(pub u8);

impl Team {
    pub const DERELICT: Team = Team(0);
    pub const SHARDED: Team = Team(1);
    pub const CRUX: Team = Team(2);

    /// Default rim and swirl color for content without its own color
    pub fn color(self) -> Color {
        match self {
            Team::DERELICT => Color::rgb(0.3, 0.3, 0.3),
            Team::SHARDED => Color::from_rgba8888(0xffd37fff),
            Team::CRUX => Color::from_rgba8888(0xf25555ff),
            _ => Color::rgb(0.6, 0.2, 0.8),
        }
    }
}

/// Host entity handle. Never owns the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Snapshot of a unit returned by a range query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSample {
    pub id: EntityId,
    pub team: Team,
    pub pos: Vec2,
    pub type_id: UnitTypeId,
    pub category: UnitCategory,
    pub capabilities: Capabilities,
    /// Internal/non-physical helper unit
    pub internal: bool,
    pub hittable: bool,
}

/// Snapshot of a projectile returned by a range query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulletSample {
    pub id: EntityId,
    pub team: Team,
    pub pos: Vec2,
    pub type_id: BulletTypeId,
    pub category: BulletCategory,
    pub capabilities: Capabilities,
    /// Intrinsic speed of the bullet type
    pub speed: f32,
    /// Bullet type can be damaged/absorbed
    pub hittable: bool,
    /// Remaining damage the bullet carries (its health)
    pub health: f32,
    /// Simulated by a remote peer
    pub remote: bool,
}

/// World access needed to apply a force field
pub trait FieldHost {
    /// Damage units and buildings of teams other than `team` within `radius`
    fn damage_area(&mut self, team: Team, center: Vec2, radius: f32, damage: f32);

    /// Units not on `team` whose position lies inside `bounds`
    fn enemy_units_in(&self, team: Team, bounds: Aabb, out: &mut Vec<UnitSample>);

    /// Every bullet whose position lies inside `bounds`
    fn bullets_in(&self, bounds: Aabb, out: &mut Vec<BulletSample>);

    /// Network-synchronised velocity impulse on a unit
    fn impulse_unit(&mut self, id: EntityId, impulse: Vec2);

    /// Add directly to a bullet's velocity
    fn push_bullet(&mut self, id: EntityId, delta_vel: Vec2);

    /// Move a bullet by `delta` this tick
    fn move_bullet(&mut self, id: EntityId, delta: Vec2);

    /// Overwrite a bullet's remaining damage
    fn set_bullet_health(&mut self, id: EntityId, health: f32);

    /// Remove a bullet. Hosts defer the structural removal.
    fn remove_bullet(&mut self, id: EntityId);
}

/// Position and optional rotation (degrees) of a followed entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParentTransform {
    pub pos: Vec2,
    /// `None` for entities without a facing
    pub rotation: Option<f32>,
}

/// Resolves parent handles for particles that follow an entity
pub trait ParentLookup {
    /// `None` once the entity is gone
    fn parent_transform(&self, id: EntityId) -> Option<ParentTransform>;
}

/// Nothing is ever found; for particles without parents
pub struct NoParents;

impl ParentLookup for NoParents {
    fn parent_transform(&self, _id: EntityId) -> Option<ParentTransform> {
        None
    }
}
