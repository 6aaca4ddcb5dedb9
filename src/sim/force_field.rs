//! Black hole suction/repulsion field
//!
//! Applied once per owner tick. Each call runs a fresh box query around the
//! center, refines it by exact distance, and pushes every eligible hostile
//! unit and projectile toward (or away from) the center. Units receive a
//! network impulse; projectiles get their velocity integrated directly and
//! can be worn down or absorbed inside the damage radius.

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::host::{BulletSample, EntityId, FieldHost, Team, UnitSample};
use super::immunity::ImmunityRegistry;
use crate::consts::*;
use crate::{Aabb, within};

/// Tunable field parameters shared by every black hole source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldParams {
    /// Radius where units and bullets are damaged
    pub damage_radius: f32,
    /// Radius where units and bullets are pulled
    pub suction_radius: f32,
    /// Push away instead of pulling in
    pub repel: bool,
    /// Base force on units
    pub force: f32,
    /// Extra unit force, fully added at the center and none at the edge
    pub scaled_force: f32,
    /// Base force on bullets
    pub bullet_force: f32,
    /// Extra bullet force, fully added at the center
    pub scaled_bullet_force: f32,
    /// Damage dealt to bullets inside the damage radius
    pub bullet_damage: f32,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            damage_radius: DEFAULT_DAMAGE_RADIUS,
            suction_radius: DEFAULT_SUCTION_RADIUS,
            repel: false,
            force: DEFAULT_FORCE,
            scaled_force: DEFAULT_SCALED_FORCE,
            bullet_force: DEFAULT_BULLET_FORCE,
            scaled_bullet_force: DEFAULT_SCALED_BULLET_FORCE,
            bullet_damage: DEFAULT_BULLET_DAMAGE,
        }
    }
}

/// One field application
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceFieldRequest {
    /// Owner's team; only other teams are affected
    pub team: Team,
    /// Owning entity, never affected by its own field
    pub source: Option<EntityId>,
    /// Absolute center (source position + offset)
    pub center: Vec2,
    pub damage_radius: f32,
    pub suction_radius: f32,
    /// Area damage to units and buildings
    pub damage: f32,
    pub bullet_damage: f32,
    pub repel: bool,
    pub force: f32,
    pub scaled_force: f32,
    pub bullet_force: f32,
    pub scaled_bullet_force: f32,
}

impl ForceFieldRequest {
    pub fn new(
        team: Team,
        source: Option<EntityId>,
        center: Vec2,
        damage: f32,
        params: &FieldParams,
    ) -> Self {
        Self {
            team,
            source,
            center,
            damage_radius: params.damage_radius,
            suction_radius: params.suction_radius,
            damage,
            bullet_damage: params.bullet_damage,
            repel: params.repel,
            force: params.force,
            scaled_force: params.scaled_force,
            bullet_force: params.bullet_force,
            scaled_bullet_force: params.scaled_bullet_force,
        }
    }

    /// Scale both radii (grow/shrink animation)
    pub fn scaled(mut self, scale: f32) -> Self {
        self.damage_radius *= scale;
        self.suction_radius *= scale;
        self
    }

    fn is_source(&self, id: EntityId) -> bool {
        self.source == Some(id)
    }
}

/// Impulse on something at `pos` from a field centered at `center`
///
/// Magnitude is `force + (1 - d / radius) * scaled_force`, directed at the
/// center, or exactly opposite when `repel` is set. A point sitting on the
/// center is pushed along +x.
pub fn field_impulse(
    center: Vec2,
    pos: Vec2,
    radius: f32,
    force: f32,
    scaled_force: f32,
    repel: bool,
) -> Vec2 {
    let offset = center - pos;
    let dst = offset.length();
    let magnitude = force + (1.0 - dst / radius) * scaled_force;
    let dir = offset.try_normalize().unwrap_or(Vec2::X);
    let impulse = dir * magnitude;
    if repel { -impulse } else { impulse }
}

/// Applies fields against a host
///
/// Owns the query scratch buffers so repeated calls do not allocate once
/// they have warmed up.
pub struct ForceField {
    immunity: Arc<ImmunityRegistry>,
    units: Vec<UnitSample>,
    bullets: Vec<BulletSample>,
}

impl Default for ForceField {
    fn default() -> Self {
        Self::new(ImmunityRegistry::shared())
    }
}

impl ForceField {
    pub fn new(immunity: Arc<ImmunityRegistry>) -> Self {
        Self {
            immunity,
            units: Vec::new(),
            bullets: Vec::new(),
        }
    }

    pub fn immunity(&self) -> &ImmunityRegistry {
        &self.immunity
    }

    /// Apply one field tick
    pub fn apply<H: FieldHost + ?Sized>(&mut self, host: &mut H, req: &ForceFieldRequest) {
        let center = req.center;

        if req.damage > 0.0 {
            host.damage_area(req.team, center, req.damage_radius, req.damage);
        }

        let radius = req.suction_radius;
        let bounds = Aabb::around(center, radius);
        if bounds.is_empty() {
            return;
        }

        self.units.clear();
        host.enemy_units_in(req.team, bounds, &mut self.units);
        let mut pulled_units = 0usize;
        for unit in &self.units {
            if unit.team == req.team
                || unit.internal
                || !unit.hittable
                || req.is_source(unit.id)
                || self
                    .immunity
                    .is_unit_immune(unit.category, unit.capabilities, unit.type_id)
                || !within(unit.pos, center, radius)
            {
                continue;
            }

            let impulse = field_impulse(
                center,
                unit.pos,
                radius,
                req.force,
                req.scaled_force,
                req.repel,
            );
            host.impulse_unit(unit.id, impulse);
            pulled_units += 1;
        }

        self.bullets.clear();
        host.bullets_in(bounds, &mut self.bullets);
        let mut pulled_bullets = 0usize;
        let mut absorbed = 0usize;
        for bullet in &self.bullets {
            if bullet.team == req.team
                || req.is_source(bullet.id)
                || bullet.speed <= MIN_BULLET_SPEED
                || self.immunity.is_bullet_immune(
                    bullet.category,
                    bullet.capabilities,
                    bullet.type_id,
                )
                || !within(bullet.pos, center, radius)
            {
                continue;
            }

            let impulse = field_impulse(
                center,
                bullet.pos,
                radius,
                req.bullet_force,
                req.scaled_bullet_force,
                req.repel,
            );
            host.push_bullet(bullet.id, impulse);
            // Keep remotely simulated bullets visually in step this tick
            let pos = if bullet.remote {
                host.move_bullet(bullet.id, impulse);
                bullet.pos + impulse
            } else {
                bullet.pos
            };
            pulled_bullets += 1;

            if req.bullet_damage > 0.0
                && bullet.hittable
                && within(pos, center, req.damage_radius)
            {
                let remaining = bullet.health - req.bullet_damage;
                if remaining <= 0.0 {
                    host.remove_bullet(bullet.id);
                    absorbed += 1;
                } else {
                    host.set_bullet_health(bullet.id, remaining);
                }
            }
        }

        log::trace!(
            "field at ({:.1}, {:.1}) r={:.1}: {} units, {} bullets, {} absorbed",
            center.x,
            center.y,
            radius,
            pulled_units,
            pulled_bullets,
            absorbed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::immunity::{BulletCategory, Capabilities, UnitCategory, UnitTypeId};
    use crate::sim::sandbox::{SandboxBullet, SandboxUnit, SandboxWorld};
    use proptest::prelude::*;

    const HOLE: Team = Team::SHARDED;
    const ENEMY: Team = Team::CRUX;

    fn scenario_params() -> FieldParams {
        FieldParams {
            damage_radius: 6.0,
            suction_radius: 160.0,
            repel: false,
            force: 10.0,
            scaled_force: 800.0,
            ..FieldParams::default()
        }
    }

    fn field() -> ForceField {
        ForceField::new(Arc::new(ImmunityRegistry::with_defaults()))
    }

    fn request(damage: f32, params: &FieldParams) -> ForceFieldRequest {
        ForceFieldRequest::new(HOLE, Some(EntityId(1)), Vec2::ZERO, damage, params)
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut world = SandboxWorld::new();
        let mid = world.add_unit(SandboxUnit::new(ENEMY, Vec2::new(80.0, 0.0)));
        let far = world.add_unit(SandboxUnit::new(ENEMY, Vec2::new(200.0, 0.0)));
        let close = world.add_unit(SandboxUnit::new(ENEMY, Vec2::new(0.0, 4.0)));

        let params = scenario_params();
        field().apply(&mut world, &request(30.0, &params));

        let impulse = world.impulse_total(mid);
        assert!((impulse.length() - 410.0).abs() < 1e-3);
        assert!(impulse.x < 0.0, "pulled toward the center");
        assert_eq!(world.impulse_total(far), Vec2::ZERO);

        assert_eq!(world.unit(close).unwrap().health, 100.0 - 30.0);
        assert_eq!(world.unit(mid).unwrap().health, 100.0);
    }

    #[test]
    fn test_repel_is_antiparallel() {
        let pos = Vec2::new(30.0, -40.0);
        let pull = field_impulse(Vec2::ZERO, pos, 160.0, 10.0, 800.0, false);
        let push = field_impulse(Vec2::ZERO, pos, 160.0, 10.0, 800.0, true);
        assert_eq!(pull, -push);
    }

    #[test]
    fn test_same_team_and_source_untouched() {
        let mut world = SandboxWorld::new();
        let ally = world.add_unit(SandboxUnit::new(HOLE, Vec2::new(20.0, 0.0)));
        let owner = world.add_unit(SandboxUnit::new(ENEMY, Vec2::new(10.0, 0.0)));
        let ally_bullet = world.add_bullet(SandboxBullet::new(HOLE, Vec2::new(0.0, 20.0)));

        let params = scenario_params();
        let req = ForceFieldRequest::new(HOLE, Some(owner), Vec2::ZERO, 0.0, &params);
        field().apply(&mut world, &req);

        assert_eq!(world.impulse_total(ally), Vec2::ZERO);
        assert_eq!(world.impulse_total(owner), Vec2::ZERO);
        assert_eq!(world.bullet(ally_bullet).unwrap().vel, Vec2::ZERO);
    }

    #[test]
    fn test_static_bullets_never_pulled() {
        let mut world = SandboxWorld::new();
        let mut beam = SandboxBullet::new(ENEMY, Vec2::new(1.0, 0.0));
        beam.speed = 0.0;
        let beam = world.add_bullet(beam);
        let mut slow = SandboxBullet::new(ENEMY, Vec2::new(1.0, 0.0));
        slow.speed = 0.005;
        let slow = world.add_bullet(slow);

        field().apply(&mut world, &request(0.0, &scenario_params()));
        assert_eq!(world.bullet(beam).unwrap().vel, Vec2::ZERO);
        assert_eq!(world.bullet(slow).unwrap().vel, Vec2::ZERO);
    }

    #[test]
    fn test_immune_and_internal_units_skipped() {
        let mut world = SandboxWorld::new();
        let mut turret = SandboxUnit::new(ENEMY, Vec2::new(50.0, 0.0));
        turret.capabilities = Capabilities::BLOCK_UNIT;
        let turret = world.add_unit(turret);
        let mut helper = SandboxUnit::new(ENEMY, Vec2::new(50.0, 0.0));
        helper.internal = true;
        let helper = world.add_unit(helper);
        let mut boss = SandboxUnit::new(ENEMY, Vec2::new(50.0, 0.0));
        boss.type_id = UnitTypeId(99);
        let boss = world.add_unit(boss);

        let mut registry = ImmunityRegistry::with_defaults();
        registry.units.add_type(UnitTypeId(99));
        ForceField::new(Arc::new(registry)).apply(&mut world, &request(0.0, &scenario_params()));

        assert_eq!(world.impulse_total(turret), Vec2::ZERO);
        assert_eq!(world.impulse_total(helper), Vec2::ZERO);
        assert_eq!(world.impulse_total(boss), Vec2::ZERO);
    }

    #[test]
    fn test_immune_bullet_category_skipped() {
        let mut world = SandboxWorld::new();
        let mut laser = SandboxBullet::new(ENEMY, Vec2::new(10.0, 0.0));
        laser.category = BulletCategory::Laser;
        let laser = world.add_bullet(laser);

        field().apply(&mut world, &request(0.0, &scenario_params()));
        assert_eq!(world.bullet(laser).unwrap().vel, Vec2::ZERO);
    }

    #[test]
    fn test_bullets_worn_down_then_absorbed() {
        let mut world = SandboxWorld::new();
        let mut tough = SandboxBullet::new(ENEMY, Vec2::new(2.0, 0.0));
        tough.health = 25.0;
        let tough = world.add_bullet(tough);
        let mut weak = SandboxBullet::new(ENEMY, Vec2::new(-2.0, 0.0));
        weak.health = 10.0;
        let weak = world.add_bullet(weak);
        let outside = world.add_bullet(SandboxBullet::new(ENEMY, Vec2::new(50.0, 0.0)));

        let params = scenario_params();
        field().apply(&mut world, &request(0.0, &params));

        assert_eq!(world.bullet(tough).unwrap().health, 15.0);
        assert_eq!(world.bullet(outside).unwrap().health, 20.0);
        // Removal is deferred until the host flushes
        assert!(world.bullet(weak).is_some());
        world.flush_removals();
        assert!(world.bullet(weak).is_none());
    }

    #[test]
    fn test_remote_bullets_nudged() {
        let mut world = SandboxWorld::new();
        let mut remote = SandboxBullet::new(ENEMY, Vec2::new(80.0, 0.0));
        remote.remote = true;
        let remote = world.add_bullet(remote);
        let local = world.add_bullet(SandboxBullet::new(ENEMY, Vec2::new(80.0, 0.0)));

        let params = FieldParams {
            bullet_force: 0.1,
            scaled_bullet_force: 1.0,
            ..scenario_params()
        };
        field().apply(&mut world, &request(0.0, &params));

        let expected = 0.1 + 0.5 * 1.0;
        let r = world.bullet(remote).unwrap();
        assert!((r.vel.x + expected).abs() < 1e-5);
        assert!((r.pos.x - (80.0 - expected)).abs() < 1e-4);
        assert_eq!(world.bullet(local).unwrap().pos.x, 80.0);
    }

    #[test]
    fn test_remote_bullet_damaged_after_nudge() {
        let mut world = SandboxWorld::new();
        let mut remote = SandboxBullet::new(ENEMY, Vec2::new(6.3, 0.0));
        remote.remote = true;
        let remote = world.add_bullet(remote);
        let local = world.add_bullet(SandboxBullet::new(ENEMY, Vec2::new(6.3, 0.0)));

        field().apply(&mut world, &request(0.0, &scenario_params()));

        // Nudged from 6.3 to about 5.2, inside the damage radius
        let r = world.bullet(remote).unwrap();
        assert!(r.pos.x < 6.0);
        assert_eq!(r.health, 10.0);
        assert_eq!(world.bullet(local).unwrap().health, 20.0);
    }

    #[test]
    fn test_non_positive_radius_is_noop() {
        let mut world = SandboxWorld::new();
        let unit = world.add_unit(SandboxUnit::new(ENEMY, Vec2::ZERO));
        let params = FieldParams {
            suction_radius: 0.0,
            ..scenario_params()
        };
        field().apply(&mut world, &request(0.0, &params));
        let params = FieldParams {
            suction_radius: -10.0,
            ..scenario_params()
        };
        field().apply(&mut world, &request(0.0, &params));
        assert_eq!(world.impulse_total(unit), Vec2::ZERO);
    }

    #[test]
    fn test_unit_category_immunity() {
        let mut world = SandboxWorld::new();
        let mut ship = SandboxUnit::new(ENEMY, Vec2::new(30.0, 0.0));
        ship.category = UnitCategory::Naval;
        let ship = world.add_unit(ship);

        let mut registry = ImmunityRegistry::empty();
        registry.units.add_category(UnitCategory::Naval);
        ForceField::new(Arc::new(registry)).apply(&mut world, &request(0.0, &scenario_params()));
        assert_eq!(world.impulse_total(ship), Vec2::ZERO);
    }

    proptest! {
        #[test]
        fn prop_impulse_law(d in 0.01f32..159.99, force in 0.0f32..50.0, scaled in 0.0f32..1000.0) {
            let pos = Vec2::new(d, 0.0);
            let m = field_impulse(Vec2::ZERO, pos, 160.0, force, scaled, false).length();
            let expected = force + (1.0 - d / 160.0) * scaled;
            prop_assert!((m - expected).abs() <= 1e-3 * expected.max(1.0));
        }

        #[test]
        fn prop_impulse_decreases_with_distance(a in 0.01f32..159.0, gap in 0.01f32..0.99) {
            let b = a + gap;
            let near = field_impulse(Vec2::ZERO, Vec2::new(a, 0.0), 160.0, 10.0, 800.0, false);
            let far = field_impulse(Vec2::ZERO, Vec2::new(b, 0.0), 160.0, 10.0, 800.0, false);
            prop_assert!(near.length() >= far.length());
        }
    }
}
