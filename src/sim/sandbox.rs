//! In-memory reference host
//!
//! A minimal world that implements the host traits. The demo binary drives
//! it, and the field/particle tests use it as their fake world.

use glam::Vec2;

use super::host::{
    BulletSample, EntityId, FieldHost, ParentLookup, ParentTransform, Team, UnitSample,
};
use super::immunity::{BulletCategory, BulletTypeId, Capabilities, UnitCategory, UnitTypeId};
use crate::{Aabb, within};

/// Sandbox unit
#[derive(Debug, Clone)]
pub struct SandboxUnit {
    pub id: EntityId,
    pub team: Team,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Facing in degrees
    pub rotation: f32,
    pub mass: f32,
    pub health: f32,
    pub type_id: UnitTypeId,
    pub category: UnitCategory,
    pub capabilities: Capabilities,
    pub internal: bool,
    pub hittable: bool,
}

impl SandboxUnit {
    pub fn new(team: Team, pos: Vec2) -> Self {
        Self {
            id: EntityId(0),
            team,
            pos,
            vel: Vec2::ZERO,
            rotation: 90.0,
            mass: 1.0,
            health: 100.0,
            type_id: UnitTypeId(0),
            category: UnitCategory::Mech,
            capabilities: Capabilities::empty(),
            internal: false,
            hittable: true,
        }
    }

    fn sample(&self) -> UnitSample {
        UnitSample {
            id: self.id,
            team: self.team,
            pos: self.pos,
            type_id: self.type_id,
            category: self.category,
            capabilities: self.capabilities,
            internal: self.internal,
            hittable: self.hittable,
        }
    }
}

/// Sandbox projectile
#[derive(Debug, Clone)]
pub struct SandboxBullet {
    pub id: EntityId,
    pub team: Team,
    pub pos: Vec2,
    pub vel: Vec2,
    pub type_id: BulletTypeId,
    pub category: BulletCategory,
    pub capabilities: Capabilities,
    /// Type speed, independent of the current velocity
    pub speed: f32,
    pub hittable: bool,
    pub health: f32,
    pub remote: bool,
}

impl SandboxBullet {
    pub fn new(team: Team, pos: Vec2) -> Self {
        Self {
            id: EntityId(0),
            team,
            pos,
            vel: Vec2::ZERO,
            type_id: BulletTypeId(0),
            category: BulletCategory::Basic,
            capabilities: Capabilities::empty(),
            speed: 2.5,
            hittable: true,
            health: 20.0,
            remote: false,
        }
    }

    fn sample(&self) -> BulletSample {
        BulletSample {
            id: self.id,
            team: self.team,
            pos: self.pos,
            type_id: self.type_id,
            category: self.category,
            capabilities: self.capabilities,
            speed: self.speed,
            hittable: self.hittable,
            health: self.health,
            remote: self.remote,
        }
    }
}

/// Units, bullets and a log of every impulse applied
#[derive(Debug, Default)]
pub struct SandboxWorld {
    pub units: Vec<SandboxUnit>,
    pub bullets: Vec<SandboxBullet>,
    /// Every `impulse_unit` call in order
    pub impulses: Vec<(EntityId, Vec2)>,
    pending_removals: Vec<EntityId>,
    next_id: u64,
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self {
            next_id: 100,
            ..Default::default()
        }
    }

    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_unit(&mut self, mut unit: SandboxUnit) -> EntityId {
        unit.id = self.next_entity_id();
        let id = unit.id;
        self.units.push(unit);
        id
    }

    pub fn add_bullet(&mut self, mut bullet: SandboxBullet) -> EntityId {
        bullet.id = self.next_entity_id();
        let id = bullet.id;
        self.bullets.push(bullet);
        id
    }

    pub fn unit(&self, id: EntityId) -> Option<&SandboxUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut SandboxUnit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn bullet(&self, id: EntityId) -> Option<&SandboxBullet> {
        self.bullets.iter().find(|b| b.id == id)
    }

    fn bullet_mut(&mut self, id: EntityId) -> Option<&mut SandboxBullet> {
        self.bullets.iter_mut().find(|b| b.id == id)
    }

    pub fn remove_unit(&mut self, id: EntityId) {
        self.units.retain(|u| u.id != id);
    }

    /// Sum of every impulse a unit received
    pub fn impulse_total(&self, id: EntityId) -> Vec2 {
        self.impulses
            .iter()
            .filter(|(target, _)| *target == id)
            .map(|(_, impulse)| *impulse)
            .sum()
    }

    /// Apply deferred bullet removals
    pub fn flush_removals(&mut self) {
        if self.pending_removals.is_empty() {
            return;
        }
        let removed = std::mem::take(&mut self.pending_removals);
        self.bullets.retain(|b| !removed.contains(&b.id));
        log::debug!("sandbox removed {} bullets", removed.len());
    }

    /// Integrate positions and drop dead units
    pub fn step(&mut self, delta: f32) {
        self.flush_removals();
        for unit in &mut self.units {
            unit.pos += unit.vel * delta;
        }
        for bullet in &mut self.bullets {
            bullet.pos += bullet.vel * delta;
        }
        self.units.retain(|u| u.health > 0.0);
    }
}

impl FieldHost for SandboxWorld {
    fn damage_area(&mut self, team: Team, center: Vec2, radius: f32, damage: f32) {
        for unit in &mut self.units {
            if unit.team != team && within(unit.pos, center, radius) {
                unit.health -= damage;
            }
        }
    }

    fn enemy_units_in(&self, team: Team, bounds: Aabb, out: &mut Vec<UnitSample>) {
        out.extend(
            self.units
                .iter()
                .filter(|u| u.team != team && bounds.contains(u.pos))
                .map(SandboxUnit::sample),
        );
    }

    fn bullets_in(&self, bounds: Aabb, out: &mut Vec<BulletSample>) {
        out.extend(
            self.bullets
                .iter()
                .filter(|b| bounds.contains(b.pos))
                .map(SandboxBullet::sample),
        );
    }

    fn impulse_unit(&mut self, id: EntityId, impulse: Vec2) {
        self.impulses.push((id, impulse));
        if let Some(unit) = self.unit_mut(id) {
            unit.vel += impulse / unit.mass;
        }
    }

    fn push_bullet(&mut self, id: EntityId, delta_vel: Vec2) {
        if let Some(bullet) = self.bullet_mut(id) {
            bullet.vel += delta_vel;
        }
    }

    fn move_bullet(&mut self, id: EntityId, delta: Vec2) {
        if let Some(bullet) = self.bullet_mut(id) {
            bullet.pos += delta;
        }
    }

    fn set_bullet_health(&mut self, id: EntityId, health: f32) {
        if let Some(bullet) = self.bullet_mut(id) {
            bullet.health = health;
        }
    }

    fn remove_bullet(&mut self, id: EntityId) {
        if !self.pending_removals.contains(&id) {
            self.pending_removals.push(id);
        }
    }
}

impl ParentLookup for SandboxWorld {
    fn parent_transform(&self, id: EntityId) -> Option<ParentTransform> {
        if let Some(unit) = self.unit(id) {
            return Some(ParentTransform {
                pos: unit.pos,
                rotation: Some(unit.rotation),
            });
        }
        self.bullet(id).map(|b| ParentTransform {
            pos: b.pos,
            rotation: Some(b.vel.y.atan2(b.vel.x).to_degrees()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut world = SandboxWorld::new();
        let a = world.add_unit(SandboxUnit::new(Team::CRUX, Vec2::ZERO));
        let b = world.add_bullet(SandboxBullet::new(Team::CRUX, Vec2::ZERO));
        assert_ne!(a, b);
    }

    #[test]
    fn test_impulse_scales_by_mass() {
        let mut world = SandboxWorld::new();
        let mut heavy = SandboxUnit::new(Team::CRUX, Vec2::ZERO);
        heavy.mass = 4.0;
        let id = world.add_unit(heavy);
        world.impulse_unit(id, Vec2::new(8.0, 0.0));
        assert_eq!(world.unit(id).unwrap().vel, Vec2::new(2.0, 0.0));
        assert_eq!(world.impulse_total(id), Vec2::new(8.0, 0.0));
    }

    #[test]
    fn test_step_removes_dead_units() {
        let mut world = SandboxWorld::new();
        let id = world.add_unit(SandboxUnit::new(Team::CRUX, Vec2::ZERO));
        world.damage_area(Team::SHARDED, Vec2::ZERO, 5.0, 200.0);
        world.step(1.0);
        assert!(world.unit(id).is_none());
        assert!(world.parent_transform(id).is_none());
    }
}
