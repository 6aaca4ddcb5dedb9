//! Deterministic simulation module
//!
//! Field physics and swirl particle state. This module must stay pure:
//! - Host state is reached only through the traits in `host`
//! - Seeded RNG only (same id, same values)
//! - No rendering or platform dependencies

pub mod force_field;
pub mod host;
pub mod immunity;
pub mod interp;
pub mod random;
pub mod sandbox;
pub mod swirl;
pub mod timer;
pub mod trail;

pub use force_field::{FieldParams, ForceField, ForceFieldRequest, field_impulse};
pub use host::{
    BulletSample, EntityId, FieldHost, NoParents, ParentLookup, ParentTransform, Team, UnitSample,
};
pub use immunity::{
    BulletCategory, BulletTypeId, Capabilities, ImmunityRegistry, ImmunitySet, UnitCategory,
    UnitTypeId,
};
pub use interp::{Interp, curve};
pub use random::random_seed;
pub use sandbox::{SandboxBullet, SandboxUnit, SandboxWorld};
pub use swirl::{SwirlEffect, SwirlParticle, SwirlPool, SwirlSpawn, TrailStyle};
pub use timer::Interval;
pub use trail::Trail;
