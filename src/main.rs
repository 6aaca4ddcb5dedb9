//! Black hole demo
//!
//! Headless run against the sandbox host and the recording backend: applies
//! a field, flies a black hole bullet for its whole life and composites each
//! frame in both rendering modes, logging what happened.
//!
//! Usage: `blackhole-demo [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec2;

    use blackhole_fx::content::{AbilityOwner, AbilityState, BlackHoleAbility, BlackHoleBullet, BulletState};
    use blackhole_fx::renderer::shapes;
    use blackhole_fx::renderer::{LensingBackend, LensingCompositor, RecordingBackend};
    use blackhole_fx::sim::{
        FieldParams, ForceField, ForceFieldRequest, SandboxBullet, SandboxUnit, SandboxWorld,
        SwirlPool, Team,
    };
    use blackhole_fx::{Result, Settings, consts};

    const BULLET_JSON: &str = r#"{
        "lifetime": 240,
        "damage": 2,
        "suction_radius": 120,
        "color": {"r": 0.55, "g": 0.2, "b": 0.95, "a": 1},
        "star": {"width": 14}
    }"#;

    pub fn run() -> Result<()> {
        let settings = match std::env::args().nth(1) {
            Some(path) => Settings::load_from(std::path::Path::new(&path))?,
            None => Settings::default(),
        };
        log::info!(
            "quality {}, advanced rendering {}",
            settings.quality.as_str(),
            settings.advanced_rendering
        );

        pull_scenario();
        bullet_lifetime(&settings)?;
        Ok(())
    }

    /// One field application with known numbers
    fn pull_scenario() {
        let mut world = SandboxWorld::new();
        let mid = world.add_unit(SandboxUnit::new(Team::CRUX, Vec2::new(80.0, 0.0)));
        let far = world.add_unit(SandboxUnit::new(Team::CRUX, Vec2::new(200.0, 0.0)));
        let near = world.add_unit(SandboxUnit::new(Team::CRUX, Vec2::new(0.0, 3.0)));

        let mut field = ForceField::default();
        let req = ForceFieldRequest::new(Team::SHARDED, None, Vec2::ZERO, 30.0, &FieldParams::default());
        field.apply(&mut world, &req);

        for (name, id) in [("mid", mid), ("far", far), ("near", near)] {
            let impulse = world.impulse_total(id);
            let health = world.unit(id).map_or(0.0, |u| u.health);
            log::info!(
                "{name}: impulse {:.1} toward {:?}, health {health}",
                impulse.length(),
                impulse.normalize_or_zero()
            );
        }
    }

    /// A bullet and a unit ability running side by side until the bullet dies
    fn bullet_lifetime(settings: &Settings) -> Result<()> {
        let bullet = BlackHoleBullet::from_json(BULLET_JSON)?;
        let mut ability = BlackHoleAbility {
            y: 12.0,
            ..BlackHoleAbility::default()
        };
        ability.init()?;

        let mut world = SandboxWorld::new();
        for i in 0..8 {
            let pos = Vec2::from_angle(i as f32 * 0.8) * (40.0 + i as f32 * 15.0);
            world.add_unit(SandboxUnit::new(Team::CRUX, pos));
        }
        let mut incoming = SandboxBullet::new(Team::CRUX, Vec2::new(60.0, -30.0));
        incoming.vel = Vec2::new(-1.5, 0.0);
        world.add_bullet(incoming);

        let mut hole = SandboxBullet::new(Team::SHARDED, Vec2::new(-100.0, 0.0));
        hole.vel = Vec2::new(bullet.speed, 0.0);
        hole.speed = bullet.speed;
        let hole_id = world.add_bullet(hole);
        let carrier_id = world.add_unit(SandboxUnit::new(Team::SHARDED, Vec2::new(0.0, -150.0)));

        let mut field = ForceField::default();
        let mut swirls = SwirlPool::from_settings(settings);
        let mut backend = RecordingBackend::new(1280, 720);
        let mut compositor = LensingCompositor::new(settings.advanced_rendering, &mut backend);

        let mut state = BulletState::new(hole_id, Team::SHARDED, Vec2::new(-100.0, 0.0));
        let mut ability_state = AbilityState::new();
        let mut trail_vertices = Vec::new();
        let mut frame = 0u32;

        loop {
            if let Some(pos) = world.bullet(hole_id).map(|b| b.pos) {
                state.pos = pos;
            }
            let carrier = world.unit(carrier_id).map(|u| AbilityOwner {
                id: u.id,
                team: u.team,
                pos: u.pos,
                rotation: u.rotation,
            });

            let expired = bullet.update(&mut state, &mut world, &mut field, &mut swirls, 1.0);
            if let Some(owner) = &carrier {
                ability.update(&mut ability_state, owner, &mut world, &mut field, &mut swirls, 1.0);
            }
            swirls.update(1.0, &world);
            world.step(1.0);

            // Flip modes halfway through to exercise the toggle
            if frame == 120 {
                let advanced = !compositor.is_advanced();
                compositor.set_advanced(advanced, &mut backend);
            }

            compositor.begin_frame(&mut backend);
            bullet.draw(&state, compositor.batch_mut());
            if let Some(owner) = &carrier {
                ability.draw(owner, compositor.batch_mut());
            }
            swirls.step_trails(false);
            trail_vertices.clear();
            shapes::swirl_trails(&mut trail_vertices, &swirls);
            if !trail_vertices.is_empty() {
                backend.draw_triangles(&trail_vertices);
            }
            let stats = compositor.end_frame(&mut backend);

            if frame % 60 == 0 {
                log::info!(
                    "t={:.0} scale {:.2}: {:?} {} zones, {} stars, {} swirls, {} enemies",
                    state.time,
                    bullet.fout(state.time),
                    stats.mode,
                    stats.zones,
                    stats.stars,
                    swirls.len(),
                    world.units.iter().filter(|u| u.team != Team::SHARDED).count()
                );
            }
            frame += 1;
            if expired {
                break;
            }
        }

        log::info!(
            "bullet expired after {frame} frames ({:.1}s), {} backend calls",
            frame as f32 / consts::TICKS_PER_SECOND,
            backend.calls.len()
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    blackhole_fx::platform::init_logging();
    if let Err(e) = demo::run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
