//! Suction immunity
//!
//! Three independent checks, OR-combined: declared category, capability
//! flags, and specific registered type. The registry is configured once at
//! startup and only read afterwards.

use std::sync::{Arc, OnceLock};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Host-assigned unit type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitTypeId(pub u32);

/// Host-assigned bullet type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BulletTypeId(pub u32);

/// Declared kind of a unit type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitCategory {
    Mech,
    Legs,
    Naval,
    Flying,
    Payload,
    Tank,
    Custom(u16),
}

/// Declared kind of a bullet type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulletCategory {
    Basic,
    Artillery,
    Missile,
    Flak,
    Continuous,
    Laser,
    Sap,
    Shrapnel,
    Lightning,
    BlackHole,
    Custom(u16),
}

bitflags! {
    /// Structural capabilities an entity exposes
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[repr(transparent)]
    pub struct Capabilities: u32 {
        /// Unit standing in for a building (turret control unit)
        const BLOCK_UNIT = 1 << 0;
        /// Tethered to a building, moves with it
        const TETHERED = 1 << 1;
        /// Currently carried as payload
        const PAYLOAD = 1 << 2;
        /// Anchored in place by the host
        const ANCHORED = 1 << 3;
        /// Projectile drawn as a continuous beam
        const BEAM = 1 << 4;
    }
}

/// One immunity list: category, capability and exact-type checks
#[derive(Debug, Clone, PartialEq)]
pub struct ImmunitySet<C, T> {
    categories: Vec<C>,
    capabilities: Capabilities,
    types: Vec<T>,
}

impl<C, T> Default for ImmunitySet<C, T> {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            capabilities: Capabilities::empty(),
            types: Vec::new(),
        }
    }
}

impl<C: PartialEq, T: PartialEq> ImmunitySet<C, T> {
    pub fn add_category(&mut self, category: C) -> &mut Self {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
        self
    }

    pub fn add_capability(&mut self, capability: Capabilities) -> &mut Self {
        self.capabilities |= capability;
        self
    }

    pub fn add_type(&mut self, type_id: T) -> &mut Self {
        if !self.types.contains(&type_id) {
            self.types.push(type_id);
        }
        self
    }

    #[inline]
    pub fn by_category(&self, category: &C) -> bool {
        self.categories.contains(category)
    }

    #[inline]
    pub fn by_capability(&self, capabilities: Capabilities) -> bool {
        self.capabilities.intersects(capabilities)
    }

    #[inline]
    pub fn by_type(&self, type_id: &T) -> bool {
        self.types.contains(type_id)
    }

    pub fn is_immune(&self, category: &C, capabilities: Capabilities, type_id: &T) -> bool {
        self.by_category(category) || self.by_capability(capabilities) || self.by_type(type_id)
    }
}

static SHARED: OnceLock<Arc<ImmunityRegistry>> = OnceLock::new();

/// Unit and bullet immunity lists
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImmunityRegistry {
    pub units: ImmunitySet<UnitCategory, UnitTypeId>,
    pub bullets: ImmunitySet<BulletCategory, BulletTypeId>,
}

impl ImmunityRegistry {
    /// No immunities at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Beams, sap, shrapnel and building-control units are immune
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry
            .bullets
            .add_category(BulletCategory::Continuous)
            .add_category(BulletCategory::Laser)
            .add_category(BulletCategory::Sap)
            .add_category(BulletCategory::Shrapnel);
        registry.units.add_capability(Capabilities::BLOCK_UNIT);
        registry
    }

    pub fn is_unit_immune(
        &self,
        category: UnitCategory,
        capabilities: Capabilities,
        type_id: UnitTypeId,
    ) -> bool {
        self.units.is_immune(&category, capabilities, &type_id)
    }

    pub fn is_bullet_immune(
        &self,
        category: BulletCategory,
        capabilities: Capabilities,
        type_id: BulletTypeId,
    ) -> bool {
        self.bullets.is_immune(&category, capabilities, &type_id)
    }

    /// Make this the process-wide registry
    ///
    /// Only the first install wins; later calls hand the registry back.
    pub fn install(self) -> Result<(), Self> {
        let registry = Arc::new(self);
        match SHARED.set(registry) {
            Ok(()) => {
                log::info!("Suction immunity registry installed");
                Ok(())
            }
            Err(rejected) => Err(Arc::unwrap_or_clone(rejected)),
        }
    }

    /// The process-wide registry, defaults if none was installed
    pub fn shared() -> Arc<ImmunityRegistry> {
        SHARED
            .get_or_init(|| Arc::new(Self::with_defaults()))
            .clone()
    }
}
