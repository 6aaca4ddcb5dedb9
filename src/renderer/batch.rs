//! Per-frame zone and star batches
//!
//! Draw callbacks append into these during the frame; the compositor drains
//! them once per frame. Slots past the live count are kept and overwritten
//! on the next frame instead of being freed.

use glam::Vec2;

use crate::color::Color;

/// Index-pooled list with a live count
#[derive(Debug, Clone, Default)]
pub struct FrameBatch<T> {
    items: Vec<T>,
    live: usize,
}

impl<T: Default> FrameBatch<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            live: 0,
        }
    }

    /// Next free slot, growing the pool only when every slot is in use
    fn next_slot(&mut self) -> &mut T {
        if self.items.len() <= self.live {
            self.items.push(T::default());
        }
        let slot = &mut self.items[self.live];
        self.live += 1;
        slot
    }
}

impl<T> FrameBatch<T> {
    /// Items registered this frame
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Slots allocated so far, live or not
    pub fn pooled(&self) -> usize {
        self.items.len()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.live]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Reset the live count, keeping every slot
    pub fn clear(&mut self) {
        self.live = 0;
    }
}

/// One black hole registered for this frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LensingZone {
    pub pos: Vec2,
    /// Event horizon, fully black inside
    pub in_radius: f32,
    /// End of the lensing range
    pub out_radius: f32,
    /// RGBA8888, alpha always 0xff
    pub color: u32,
}

impl LensingZone {
    pub fn color(&self) -> Color {
        Color::from_rgba8888(self.color)
    }
}

/// Four point star drawn over the zones
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StarDecoration {
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Degrees
    pub angle_offset: f32,
    /// RGBA8888 center color
    pub in_color: u32,
    /// RGBA8888 tip color
    pub out_color: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ZoneBatch(FrameBatch<LensingZone>);

impl ZoneBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone; dropped when `in_radius > out_radius` or `out_radius <= 0`
    pub fn add_zone(&mut self, pos: Vec2, in_radius: f32, out_radius: f32, color: Color) {
        // Also rejects NaN radii
        if !(in_radius <= out_radius && out_radius > 0.0) {
            return;
        }
        let slot = self.0.next_slot();
        slot.pos = pos;
        slot.in_radius = in_radius;
        slot.out_radius = out_radius;
        slot.color = color.with_alpha(1.0).to_rgba8888();
    }
}

impl std::ops::Deref for ZoneBatch {
    type Target = FrameBatch<LensingZone>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for ZoneBatch {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct StarBatch(FrameBatch<StarDecoration>);

impl StarBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a star; dropped when either dimension is not positive
    pub fn add_star(
        &mut self,
        pos: Vec2,
        width: f32,
        height: f32,
        angle_offset: f32,
        in_color: Color,
        out_color: Color,
    ) {
        if !(width > 0.0 && height > 0.0) {
            return;
        }
        let slot = self.0.next_slot();
        slot.pos = pos;
        slot.width = width;
        slot.height = height;
        slot.angle_offset = angle_offset;
        slot.in_color = in_color.to_rgba8888();
        slot.out_color = out_color.to_rgba8888();
    }

    /// Upright star
    pub fn add_upright_star(
        &mut self,
        pos: Vec2,
        width: f32,
        height: f32,
        in_color: Color,
        out_color: Color,
    ) {
        self.add_star(pos, width, height, 0.0, in_color, out_color);
    }
}

impl std::ops::Deref for StarBatch {
    type Target = FrameBatch<StarDecoration>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for StarBatch {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Everything draw callbacks register in one frame
///
/// Owned by the compositor and lent to draw callbacks with
/// [`crate::renderer::LensingCompositor::batch_mut`].
#[derive(Debug, Clone, Default)]
pub struct BlackHoleBatch {
    pub zones: ZoneBatch,
    pub stars: StarBatch,
}

impl BlackHoleBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_zone(&mut self, pos: Vec2, in_radius: f32, out_radius: f32, color: Color) {
        self.zones.add_zone(pos, in_radius, out_radius, color);
    }

    pub fn add_star(
        &mut self,
        pos: Vec2,
        width: f32,
        height: f32,
        angle_offset: f32,
        in_color: Color,
        out_color: Color,
    ) {
        self.stars
            .add_star(pos, width, height, angle_offset, in_color, out_color);
    }

    pub fn clear(&mut self) {
        self.zones.clear();
        self.stars.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_degenerate_zones_dropped() {
        let mut batch = ZoneBatch::new();
        batch.add_zone(Vec2::ZERO, 10.0, 5.0, Color::WHITE);
        batch.add_zone(Vec2::ZERO, 0.0, 0.0, Color::WHITE);
        batch.add_zone(Vec2::ZERO, -2.0, -1.0, Color::WHITE);
        batch.add_zone(Vec2::ZERO, f32::NAN, 5.0, Color::WHITE);
        assert!(batch.is_empty());

        batch.add_zone(Vec2::ZERO, 5.0, 5.0, Color::WHITE);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_zone_alpha_forced_opaque() {
        let mut batch = ZoneBatch::new();
        batch.add_zone(Vec2::ONE, 2.0, 8.0, Color::rgba(1.0, 0.0, 0.0, 0.2));
        let zone = batch.iter().next().unwrap();
        assert_eq!(zone.color, 0xff0000ff);
        assert_eq!(zone.color().a, 1.0);
    }

    #[test]
    fn test_degenerate_stars_dropped() {
        let mut batch = StarBatch::new();
        batch.add_upright_star(Vec2::ZERO, 0.0, 4.0, Color::WHITE, Color::CLEAR);
        batch.add_upright_star(Vec2::ZERO, 4.0, -1.0, Color::WHITE, Color::CLEAR);
        assert!(batch.is_empty());
        batch.add_upright_star(Vec2::ZERO, 4.0, 2.0, Color::WHITE, Color::CLEAR);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.iter().next().unwrap().angle_offset, 0.0);
    }

    #[test]
    fn test_slots_reused_across_frames() {
        let mut batch = BlackHoleBatch::new();
        for i in 0..3 {
            batch.add_zone(Vec2::splat(i as f32), 1.0, 2.0, Color::WHITE);
        }
        batch.clear();
        assert_eq!(batch.zones.len(), 0);
        assert_eq!(batch.zones.pooled(), 3);

        batch.add_zone(Vec2::new(9.0, 9.0), 1.0, 2.0, Color::BLACK);
        assert_eq!(batch.zones.pooled(), 3);
        assert_eq!(batch.zones.as_slice()[0].pos, Vec2::new(9.0, 9.0));
    }

    proptest! {
        #[test]
        fn prop_zone_count_matches_valid_inputs(
            radii in proptest::collection::vec((-50.0f32..50.0, -50.0f32..50.0), 0..40)
        ) {
            let mut batch = ZoneBatch::new();
            let mut expected = 0;
            for (inner, outer) in radii {
                if inner <= outer && outer > 0.0 {
                    expected += 1;
                }
                batch.add_zone(Vec2::ZERO, inner, outer, Color::WHITE);
            }
            prop_assert_eq!(batch.len(), expected);
            prop_assert!(batch.iter().all(|z| z.in_radius <= z.out_radius && z.out_radius > 0.0));
        }
    }
}
