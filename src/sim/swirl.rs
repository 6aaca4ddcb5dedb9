//! Swirl particles
//!
//! A particle with a trail that falls into its center. The signed spawn
//! radius doubles as the spin direction: positive swirls clockwise, negative
//! counter-clockwise.
//!
//! Lifecycle: spawned -> animating (trail grows along the spiral, then
//! shortens) -> expired, at which point the pool recycles it. A particle may
//! follow a parent entity through a [`ParentLookup`] handle; it never owns
//! that entity and stops following once the lookup comes back empty.

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::host::{EntityId, ParentLookup};
use super::interp::Interp;
use super::random::{random_seed, random_seed_max};
use super::trail::Trail;
use crate::color::Color;
use crate::consts::layer;
use crate::{rotate_deg, trns};

/// Swirl effect configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwirlEffect {
    /// Ticks from spawn to removal
    pub lifetime: f32,
    /// How many points long the trail is
    pub length: usize,
    /// Trail radius
    pub width: f32,
    /// Degrees the particle revolves around the center, drawn from this range
    pub min_rot: f32,
    pub max_rot: f32,
    /// When both are >= 0 the fall distance is drawn from this range;
    /// otherwise the absolute spawn radius is used
    pub min_dst: f32,
    pub max_dst: f32,
    /// Color at spawn, spawn color if unset
    pub color_from: Option<Color>,
    /// Color at the end, spawn color if unset
    pub color_to: Option<Color>,
    /// Radial falloff easing
    pub fallterp: Interp,
    /// Angular progression easing
    pub spinterp: Interp,
    /// Non-zero forces the spin direction by its sign
    pub spin_direction_override: f32,
    pub follow_parent: bool,
    pub rot_with_parent: bool,
    /// Host draw layer
    pub layer: f32,
}

impl Default for SwirlEffect {
    fn default() -> Self {
        Self {
            lifetime: 90.0,
            length: 8,
            width: 3.0,
            min_rot: 120.0,
            max_rot: 480.0,
            min_dst: -1.0,
            max_dst: -1.0,
            color_from: None,
            color_to: None,
            fallterp: Interp::Pow2Out,
            spinterp: Interp::Pow3Out,
            spin_direction_override: 0.0,
            follow_parent: true,
            rot_with_parent: true,
            // Black does not survive bloom, so sit just above it
            layer: layer::SWIRL,
        }
    }
}

impl SwirlEffect {
    pub fn new(lifetime: f32, length: usize, width: f32, min_rot: f32, max_rot: f32) -> Self {
        Self {
            lifetime,
            length,
            width,
            min_rot,
            max_rot,
            ..Self::default()
        }
    }

    /// Fixed starting color
    pub fn with_color(mut self, color: Color) -> Self {
        self.color_from = Some(color);
        self
    }

    /// Draw fall distance from `[min, max]`
    pub fn with_distance(mut self, min: f32, max: f32) -> Self {
        self.min_dst = min;
        self.max_dst = max;
        self
    }

    pub fn with_interps(mut self, fallterp: Interp, spinterp: Interp) -> Self {
        self.fallterp = fallterp;
        self.spinterp = spinterp;
        self
    }

    /// Whether the fall distance comes from the spawn radius
    pub fn uses_spawn_radius(&self) -> bool {
        self.min_dst < 0.0 || self.max_dst < 0.0
    }

    /// Bounding size a host should cull with
    pub fn clip_size(&self, fallback: f32) -> f32 {
        fallback.max(self.max_dst * 2.0)
    }

    fn spin_direction(&self, radius: f32) -> f32 {
        let sign_source = if self.spin_direction_override != 0.0 {
            self.spin_direction_override
        } else {
            radius
        };
        if sign_source < 0.0 { -1.0 } else { 1.0 }
    }
}

/// Spawn request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwirlSpawn {
    pub pos: Vec2,
    /// Signed radius, sign picks the spin direction
    pub radius: f32,
    pub color: Color,
    pub parent: Option<EntityId>,
}

/// How the trail should be drawn this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailStyle {
    pub color: Color,
    pub width: f32,
}

/// Non-owning link to the followed entity
#[derive(Debug, Clone, Copy, PartialEq)]
struct ParentLink {
    id: EntityId,
    offset: Vec2,
    /// Cancels the parent's spawn-time rotation
    offset_rot: f32,
    rotates: bool,
}

/// One live swirl
#[derive(Debug, Clone)]
pub struct SwirlParticle {
    id: u64,
    effect: Arc<SwirlEffect>,
    pos: Vec2,
    radius: f32,
    color: Color,
    time: f32,
    lifetime: f32,
    base_rot: f32,
    add_rot: f32,
    distance: f32,
    parent: Option<ParentLink>,
    trail: Trail,
    style: TrailStyle,
}

impl SwirlParticle {
    /// Spawn a particle; `id` seeds all of its random values
    pub fn new<L: ParentLookup + ?Sized>(
        id: u64,
        effect: Arc<SwirlEffect>,
        spawn: &SwirlSpawn,
        trail_length: usize,
        lookup: &L,
    ) -> Self {
        let mut particle = Self {
            id,
            effect,
            pos: spawn.pos,
            radius: spawn.radius,
            color: spawn.color,
            time: 0.0,
            lifetime: 0.0,
            base_rot: 0.0,
            add_rot: 0.0,
            distance: 0.0,
            parent: None,
            trail: Trail::new(trail_length),
            style: TrailStyle {
                color: spawn.color,
                width: 0.0,
            },
        };
        particle.init(id, spawn, trail_length, lookup);
        particle
    }

    /// Reinitialise a recycled particle, keeping its trail buffer
    fn respawn<L: ParentLookup + ?Sized>(
        &mut self,
        id: u64,
        effect: Arc<SwirlEffect>,
        spawn: &SwirlSpawn,
        trail_length: usize,
        lookup: &L,
    ) {
        self.effect = effect;
        self.init(id, spawn, trail_length, lookup);
    }

    fn init<L: ParentLookup + ?Sized>(
        &mut self,
        id: u64,
        spawn: &SwirlSpawn,
        trail_length: usize,
        lookup: &L,
    ) {
        let effect = &self.effect;
        self.id = id;
        self.pos = spawn.pos;
        self.radius = spawn.radius;
        self.color = spawn.color;
        self.time = 0.0;
        self.lifetime = effect.lifetime;
        self.trail.reset(trail_length);
        self.style = TrailStyle {
            color: spawn.color,
            width: 0.0,
        };

        self.distance = if effect.uses_spawn_radius() {
            spawn.radius.abs()
        } else {
            random_seed(id, effect.min_dst, effect.max_dst)
        };
        self.base_rot = random_seed_max(id.wrapping_add(1), 360.0);
        self.add_rot = random_seed(id.wrapping_add(2), effect.min_rot, effect.max_rot)
            * effect.spin_direction(spawn.radius);

        self.parent = None;
        if effect.follow_parent {
            if let Some(parent_id) = spawn.parent {
                if let Some(t) = lookup.parent_transform(parent_id) {
                    let rotation = t.rotation.filter(|_| effect.rot_with_parent);
                    self.parent = Some(ParentLink {
                        id: parent_id,
                        offset: spawn.pos - t.pos,
                        offset_rot: rotation.map_or(0.0, |r| -r),
                        rotates: rotation.is_some(),
                    });
                }
            }
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn effect(&self) -> &SwirlEffect {
        &self.effect
    }

    /// Current center of the spiral
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    /// Fall distance (seeded or taken from the spawn radius)
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Signed total revolution in degrees
    pub fn rotation_delta(&self) -> f32 {
        self.add_rot
    }

    pub fn base_rotation(&self) -> f32 {
        self.base_rot
    }

    pub fn is_following(&self) -> bool {
        self.parent.is_some()
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    /// Style computed by the last [`Self::step_trail`]
    pub fn style(&self) -> TrailStyle {
        self.style
    }

    /// Ticks spent growing the trail; the last `length` ticks shorten it
    ///
    /// Uses the configured length so trail quality never shifts the timing.
    fn active_time(&self) -> f32 {
        self.lifetime - self.effect.length as f32
    }

    /// Follow the parent and advance time; true once expired
    pub fn update<L: ParentLookup + ?Sized>(&mut self, delta: f32, lookup: &L) -> bool {
        if let Some(link) = self.parent {
            match lookup.parent_transform(link.id) {
                Some(t) => {
                    self.pos = match t.rotation {
                        Some(rotation) if link.rotates => {
                            t.pos + rotate_deg(link.offset, rotation + link.offset_rot)
                        }
                        _ => t.pos + link.offset,
                    };
                }
                None => self.parent = None,
            }
        }

        self.time = (self.time + delta).min(self.lifetime);
        self.time >= self.lifetime
    }

    /// Advance the trail one render step and compute its style
    ///
    /// A paused host keeps drawing the trail as it is.
    pub fn step_trail(&mut self, paused: bool) -> TrailStyle {
        let active = self.active_time();
        let progress = if active > 0.0 { self.time / active } else { 1.0 };
        let l = progress.clamp(0.0, 1.0);
        let effect = &self.effect;

        let color = if effect.color_from.is_some() || effect.color_to.is_some() {
            let from = effect.color_from.unwrap_or(self.color);
            let to = effect.color_to.unwrap_or(self.color);
            from.lerp(to, l)
        } else {
            self.color
        };
        let width = l * effect.width;

        if !paused {
            let f = 1.0 - progress;
            if f > 0.0 {
                let angle = self.base_rot + self.add_rot * effect.spinterp.apply(f);
                let dst = (self.distance * effect.fallterp.apply(f)).max(0.0);
                self.trail.update(self.pos + trns(angle, dst));
            } else {
                self.trail.shorten();
            }
        }

        self.style = TrailStyle { color, width };
        self.style
    }
}

/// Free-list backed particle pool
///
/// Expired particles move to the free list and are reinitialised on the next
/// spawn, so steady-state swirling does not allocate.
#[derive(Debug)]
pub struct SwirlPool {
    live: Vec<SwirlParticle>,
    free: Vec<SwirlParticle>,
    max_particles: usize,
    trail_scale: f32,
    next_id: u64,
}

impl SwirlPool {
    pub fn new(max_particles: usize) -> Self {
        Self {
            live: Vec::with_capacity(max_particles.min(1024)),
            free: Vec::new(),
            max_particles,
            trail_scale: 1.0,
            next_id: 1,
        }
    }

    /// Pool sized and scaled from the user's preferences
    pub fn from_settings(settings: &crate::Settings) -> Self {
        let mut pool = Self::new(settings.max_particles());
        pool.trail_scale = settings.quality.trail_quality();
        pool
    }

    pub fn set_max_particles(&mut self, max: usize) {
        self.max_particles = max;
    }

    pub fn set_trail_scale(&mut self, scale: f32) {
        self.trail_scale = scale.max(0.0);
    }

    fn trail_length(&self, configured: usize) -> usize {
        if configured == 0 {
            return 0;
        }
        ((configured as f32 * self.trail_scale).round() as usize).clamp(1, configured)
    }

    /// Spawn one swirl; `None` when the pool is at its cap
    pub fn spawn<L: ParentLookup + ?Sized>(
        &mut self,
        effect: &Arc<SwirlEffect>,
        spawn: SwirlSpawn,
        lookup: &L,
    ) -> Option<u64> {
        if self.live.len() >= self.max_particles {
            log::debug!("swirl pool full ({}), spawn skipped", self.max_particles);
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        let length = self.trail_length(effect.length);

        let particle = match self.free.pop() {
            Some(mut recycled) => {
                recycled.respawn(id, Arc::clone(effect), &spawn, length, lookup);
                recycled
            }
            None => SwirlParticle::new(id, Arc::clone(effect), &spawn, length, lookup),
        };
        self.live.push(particle);
        Some(id)
    }

    /// Update every particle and recycle the expired ones
    pub fn update<L: ParentLookup + ?Sized>(&mut self, delta: f32, lookup: &L) {
        let mut i = 0;
        while i < self.live.len() {
            if self.live[i].update(delta, lookup) {
                let expired = self.live.swap_remove(i);
                self.free.push(expired);
            } else {
                i += 1;
            }
        }
    }

    /// Render step for every trail
    pub fn step_trails(&mut self, paused: bool) {
        for particle in &mut self.live {
            particle.step_trail(paused);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SwirlParticle> {
        self.live.iter()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Recycled particles waiting for reuse
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Recycle everything
    pub fn clear(&mut self) {
        self.free.append(&mut self.live);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::host::{NoParents, Team};
    use crate::sim::sandbox::{SandboxUnit, SandboxWorld};

    fn spawn_at(pos: Vec2, radius: f32) -> SwirlSpawn {
        SwirlSpawn {
            pos,
            radius,
            color: Color::BLACK,
            parent: None,
        }
    }

    fn effect() -> Arc<SwirlEffect> {
        Arc::new(SwirlEffect::default())
    }

    #[test]
    fn test_same_id_same_trajectory() {
        let fx = Arc::new(SwirlEffect::default().with_distance(64.0, 64.0));
        let s = spawn_at(Vec2::new(3.0, 4.0), 160.0);
        let mut a = SwirlParticle::new(42, fx.clone(), &s, 8, &NoParents);
        let mut b = SwirlParticle::new(42, fx, &s, 8, &NoParents);

        assert_eq!(a.distance(), 64.0);
        for _ in 0..30 {
            a.update(1.0, &NoParents);
            b.update(1.0, &NoParents);
            a.step_trail(false);
            b.step_trail(false);
        }
        let pa: Vec<Vec2> = a.trail().points().collect();
        let pb: Vec<Vec2> = b.trail().points().collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_spawn_radius_used_without_range() {
        let p = SwirlParticle::new(7, effect(), &spawn_at(Vec2::ZERO, -120.0), 8, &NoParents);
        assert_eq!(p.distance(), 120.0);
    }

    #[test]
    fn test_radius_sign_sets_direction() {
        let cw = SwirlParticle::new(7, effect(), &spawn_at(Vec2::ZERO, 100.0), 8, &NoParents);
        let ccw = SwirlParticle::new(7, effect(), &spawn_at(Vec2::ZERO, -100.0), 8, &NoParents);
        assert!(cw.rotation_delta() > 0.0);
        assert_eq!(cw.rotation_delta(), -ccw.rotation_delta());
        assert!((120.0..480.0).contains(&cw.rotation_delta()));

        let forced = Arc::new(SwirlEffect {
            spin_direction_override: -1.0,
            ..SwirlEffect::default()
        });
        let p = SwirlParticle::new(7, forced, &spawn_at(Vec2::ZERO, 100.0), 8, &NoParents);
        assert!(p.rotation_delta() < 0.0);
    }

    #[test]
    fn test_lifetime_reached_exactly() {
        let mut p = SwirlParticle::new(1, effect(), &spawn_at(Vec2::ZERO, 50.0), 8, &NoParents);
        let mut steps = 0;
        while !p.update(7.0, &NoParents) {
            steps += 1;
            assert!(p.time() < p.lifetime());
        }
        assert_eq!(p.time(), 90.0);
        assert_eq!(steps, 12);
    }

    #[test]
    fn test_trail_grows_then_empties() {
        let fx = Arc::new(SwirlEffect {
            lifetime: 20.0,
            length: 4,
            ..SwirlEffect::default()
        });
        let mut p = SwirlParticle::new(3, fx, &spawn_at(Vec2::ZERO, 80.0), 4, &NoParents);

        let mut max_len = 0;
        let mut expired = false;
        while !expired {
            expired = p.update(1.0, &NoParents);
            p.step_trail(false);
            max_len = max_len.max(p.trail().len());
        }
        assert_eq!(max_len, 4);
        assert!(p.trail().is_empty());
    }

    #[test]
    fn test_trail_heads_stay_within_distance() {
        let mut p = SwirlParticle::new(11, effect(), &spawn_at(Vec2::new(10.0, 10.0), 100.0), 8, &NoParents);
        for _ in 0..60 {
            p.update(1.0, &NoParents);
            p.step_trail(false);
            let head = p.trail().head().unwrap();
            assert!(head.distance(p.pos()) <= 100.0 + 1e-3);
        }
    }

    #[test]
    fn test_paused_trail_does_not_advance() {
        let mut p = SwirlParticle::new(5, effect(), &spawn_at(Vec2::ZERO, 60.0), 8, &NoParents);
        p.update(1.0, &NoParents);
        p.step_trail(true);
        assert!(p.trail().is_empty());
        p.step_trail(false);
        assert_eq!(p.trail().len(), 1);
    }

    #[test]
    fn test_fading_color_and_width() {
        let fx = Arc::new(SwirlEffect {
            lifetime: 18.0,
            length: 8,
            color_to: Some(Color::WHITE),
            ..SwirlEffect::default()
        });
        let mut p = SwirlParticle::new(5, fx, &spawn_at(Vec2::ZERO, 60.0), 8, &NoParents);
        p.update(5.0, &NoParents);
        let style = p.step_trail(false);
        assert!((style.color.r - 0.5).abs() < 1e-5);
        assert!((style.width - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_follows_parent_with_rotation() {
        let mut world = SandboxWorld::new();
        let mut unit = SandboxUnit::new(Team::SHARDED, Vec2::ZERO);
        unit.rotation = 90.0;
        let unit = world.add_unit(unit);

        let spawn = SwirlSpawn {
            parent: Some(unit),
            ..spawn_at(Vec2::new(10.0, 0.0), 50.0)
        };
        let mut p = SwirlParticle::new(1, effect(), &spawn, 8, &world);
        assert!(p.is_following());

        {
            let u = world.unit_mut(unit).unwrap();
            u.pos = Vec2::new(5.0, 5.0);
            u.rotation = 180.0;
        }
        p.update(1.0, &world);
        assert!((p.pos() - Vec2::new(5.0, 15.0)).length() < 1e-4);
    }

    #[test]
    fn test_follows_parent_without_rotation() {
        let mut world = SandboxWorld::new();
        let unit = world.add_unit(SandboxUnit::new(Team::SHARDED, Vec2::ZERO));
        let fx = Arc::new(SwirlEffect {
            rot_with_parent: false,
            ..SwirlEffect::default()
        });
        let spawn = SwirlSpawn {
            parent: Some(unit),
            ..spawn_at(Vec2::new(10.0, 0.0), 50.0)
        };
        let mut p = SwirlParticle::new(1, fx, &spawn, 8, &world);
        let u = world.unit_mut(unit).unwrap();
        u.pos = Vec2::new(-4.0, 2.0);
        u.rotation = 10.0;
        p.update(1.0, &world);
        assert_eq!(p.pos(), Vec2::new(6.0, 2.0));
    }

    #[test]
    fn test_missing_parent_stops_following() {
        let mut world = SandboxWorld::new();
        let unit = world.add_unit(SandboxUnit::new(Team::SHARDED, Vec2::ZERO));
        let spawn = SwirlSpawn {
            parent: Some(unit),
            ..spawn_at(Vec2::new(10.0, 0.0), 50.0)
        };
        let mut p = SwirlParticle::new(1, effect(), &spawn, 8, &world);
        world.remove_unit(unit);

        assert!(!p.update(1.0, &world));
        assert!(!p.is_following());
        assert_eq!(p.pos(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_pool_recycles_and_caps() {
        let fx = Arc::new(SwirlEffect {
            lifetime: 10.0,
            length: 2,
            ..SwirlEffect::default()
        });
        let mut pool = SwirlPool::new(2);
        let s = spawn_at(Vec2::ZERO, 40.0);
        assert!(pool.spawn(&fx, s, &NoParents).is_some());
        assert!(pool.spawn(&fx, s, &NoParents).is_some());
        assert!(pool.spawn(&fx, s, &NoParents).is_none());

        pool.update(10.0, &NoParents);
        assert!(pool.is_empty());
        assert_eq!(pool.free_len(), 2);

        let id = pool.spawn(&fx, s, &NoParents).unwrap();
        assert_eq!(pool.free_len(), 1);
        let p = pool.iter().next().unwrap();
        assert_eq!(p.id(), id);
        assert_eq!(p.time(), 0.0);
        assert!(p.trail().is_empty());
    }

    #[test]
    fn test_pool_trail_scale() {
        let mut pool = SwirlPool::new(4);
        pool.set_trail_scale(0.5);
        pool.spawn(&effect(), spawn_at(Vec2::ZERO, 40.0), &NoParents);
        assert_eq!(pool.iter().next().unwrap().trail().length(), 4);
    }

    #[test]
    fn test_trail_scale_keeps_fade_timing() {
        let fx = Arc::new(SwirlEffect {
            lifetime: 18.0,
            length: 8,
            color_to: Some(Color::WHITE),
            ..SwirlEffect::default()
        });
        let mut pool = SwirlPool::new(4);
        pool.set_trail_scale(0.5);
        pool.spawn(&fx, spawn_at(Vec2::ZERO, 60.0), &NoParents);
        pool.update(5.0, &NoParents);
        pool.step_trails(false);

        let p = pool.iter().next().unwrap();
        assert_eq!(p.trail().length(), 4);
        assert!((p.style().width - 1.5).abs() < 1e-5);
        assert!((p.style().color.r - 0.5).abs() < 1e-5);
    }
}
