//! Lensing compositor
//!
//! Drains the frame's [`BlackHoleBatch`] into one composited image. Two
//! modes:
//!
//! - advanced: the scene is captured into an offscreen buffer at
//!   [`layer::BEGIN`]; at [`layer::END`] the zones are packed into flat
//!   `vec4` arrays, a lensing pass distorts the captured scene and a rim pass
//!   draws the colored glow over it.
//! - simplified: a black disc per zone, then a light ring fading out from
//!   its edge, drawn at [`layer::MAX`] with plain triangles.
//!
//! The compositor never touches a graphics API directly. Everything goes
//! through a [`LensingBackend`], so the same frame logic drives wgpu and the
//! recording backend used by tests.

use super::batch::{BlackHoleBatch, LensingZone};
use super::shapes;
use super::vertex::{Vertex, colors};
use crate::consts::{INITIAL_ZONE_CAPACITY, SIMPLIFIED_GLOW_SCALE, layer};

/// Fullscreen shader passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderPass {
    /// Samples the captured scene and bends it around each zone
    Lensing,
    /// Colored glow at each zone's horizon
    Rim,
}

/// Graphics operations the compositor needs
///
/// The offscreen capture buffer and zone uniforms are owned by the backend
/// but only ever driven from the compositor.
pub trait LensingBackend {
    /// Allocate the offscreen capture buffer
    fn create_capture(&mut self);
    /// Free the offscreen capture buffer
    fn release_capture(&mut self);
    fn resize_capture(&mut self, width: u32, height: u32);
    /// Redirect scene drawing into the capture buffer
    fn begin_capture(&mut self);
    fn end_capture(&mut self);
    /// Empty the capture buffer
    fn clear_capture(&mut self);

    /// Current viewport in pixels
    fn viewport_size(&self) -> (u32, u32);

    /// Zones the shaders can take in one upload
    fn zone_capacity(&self) -> usize;
    /// Recompile the shaders and reallocate uniforms for `capacity` zones
    fn rebuild_shaders(&mut self, capacity: usize);
    /// `zones` is `[x, y, in_radius, out_radius]` and `colors` is RGBA, one
    /// entry per zone
    fn upload_zones(&mut self, zones: &[[f32; 4]], colors: &[[f32; 4]]);
    /// Draw the capture buffer to the screen through `pass`
    fn blit(&mut self, pass: ShaderPass);

    fn draw_triangles(&mut self, vertices: &[Vertex]);

    /// Whether a bloom post effect is running
    fn bloom_active(&self) -> bool {
        false
    }
    fn bloom_capture(&mut self) {}
    fn bloom_render(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    Advanced,
    Simplified,
}

/// What one [`LensingCompositor::end_frame`] call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeStats {
    pub mode: CompositeMode,
    pub zones: usize,
    pub stars: usize,
    /// Shader capacity after a rebuild this frame
    pub rebuilt: Option<usize>,
}

/// Per-frame black hole compositor
#[derive(Debug)]
pub struct LensingCompositor {
    batch: BlackHoleBatch,
    advanced: bool,
    capture_alive: bool,
    capturing: bool,
    zone_data: Vec<[f32; 4]>,
    zone_colors: Vec<[f32; 4]>,
    vertices: Vec<Vertex>,
}

impl LensingCompositor {
    /// Create the compositor, allocating the capture buffer in advanced mode
    pub fn new<B: LensingBackend + ?Sized>(advanced: bool, backend: &mut B) -> Self {
        let mut compositor = Self {
            batch: BlackHoleBatch::new(),
            advanced: false,
            capture_alive: false,
            capturing: false,
            zone_data: Vec::with_capacity(INITIAL_ZONE_CAPACITY),
            zone_colors: Vec::with_capacity(INITIAL_ZONE_CAPACITY),
            vertices: Vec::new(),
        };
        compositor.set_advanced(advanced, backend);
        compositor
    }

    pub fn is_advanced(&self) -> bool {
        self.advanced
    }

    /// Whether the offscreen buffer is currently allocated
    pub fn has_capture(&self) -> bool {
        self.capture_alive
    }

    pub fn batch(&self) -> &BlackHoleBatch {
        &self.batch
    }

    /// Lent to draw callbacks so they can register zones and stars
    pub fn batch_mut(&mut self) -> &mut BlackHoleBatch {
        &mut self.batch
    }

    /// Layer [`Self::end_frame`] must run on for the current mode
    pub fn end_layer(&self) -> f32 {
        if self.advanced { layer::END } else { layer::MAX }
    }

    /// Switch modes; safe between any two frames
    pub fn set_advanced<B: LensingBackend + ?Sized>(&mut self, advanced: bool, backend: &mut B) {
        if advanced {
            if !self.capture_alive {
                backend.create_capture();
                self.capture_alive = true;
            }
        } else {
            if self.capturing {
                backend.end_capture();
                self.capturing = false;
            }
            if self.capture_alive {
                backend.release_capture();
                self.capture_alive = false;
            }
        }
        if self.advanced != advanced {
            log::info!(
                "black hole rendering: {}",
                if advanced { "advanced" } else { "simplified" }
            );
        }
        self.advanced = advanced;
    }

    /// Hook for [`layer::BEGIN`]: start capturing the scene
    pub fn begin_frame<B: LensingBackend + ?Sized>(&mut self, backend: &mut B) {
        if !self.advanced || self.capturing {
            return;
        }
        if !self.capture_alive {
            backend.create_capture();
            self.capture_alive = true;
        }
        let (width, height) = backend.viewport_size();
        backend.resize_capture(width, height);
        backend.begin_capture();
        self.capturing = true;
    }

    /// Hook for [`Self::end_layer`]: composite everything registered this
    /// frame and reset the batch
    pub fn end_frame<B: LensingBackend + ?Sized>(&mut self, backend: &mut B) -> CompositeStats {
        let zones = self.batch.zones.len();
        let stars = self.batch.stars.len();

        let stats = if self.advanced && self.capturing {
            let rebuilt = self.advanced_draw(backend);
            CompositeStats {
                mode: CompositeMode::Advanced,
                zones,
                stars,
                rebuilt,
            }
        } else {
            if self.advanced {
                log::debug!("end_frame without a capture, drawing simplified");
            }
            self.simplified_draw(backend);
            CompositeStats {
                mode: CompositeMode::Simplified,
                zones,
                stars,
                rebuilt: None,
            }
        };

        self.batch.clear();
        log::trace!("composited {zones} zones, {stars} stars");
        stats
    }

    fn advanced_draw<B: LensingBackend + ?Sized>(&mut self, backend: &mut B) -> Option<usize> {
        backend.end_capture();
        self.capturing = false;

        let count = self.batch.zones.len();
        let mut rebuilt = None;
        if count > backend.zone_capacity() {
            let capacity = count.next_power_of_two().max(INITIAL_ZONE_CAPACITY);
            log::info!("rebuilding lensing shaders for {capacity} zones");
            backend.rebuild_shaders(capacity);
            rebuilt = Some(backend.zone_capacity());
        }

        let limit = backend.zone_capacity();
        if count > limit {
            log::warn!("{count} black holes exceed the shader limit of {limit}");
        }
        self.pack_zones(limit);
        backend.upload_zones(&self.zone_data, &self.zone_colors);

        backend.blit(ShaderPass::Lensing);
        backend.clear_capture();

        if backend.bloom_active() {
            backend.bloom_capture();
            backend.blit(ShaderPass::Rim);
            self.draw_stars(backend);
            backend.bloom_render();
        } else {
            backend.blit(ShaderPass::Rim);
            self.draw_stars(backend);
        }
        rebuilt
    }

    fn simplified_draw<B: LensingBackend + ?Sized>(&mut self, backend: &mut B) {
        // Horizons stay out of bloom, black would be washed out
        self.vertices.clear();
        for zone in self.batch.zones.iter() {
            shapes::circle(
                &mut self.vertices,
                zone.pos,
                zone.in_radius,
                colors::HORIZON,
                shapes::circle_vertices(zone.in_radius),
            );
        }
        if !self.vertices.is_empty() {
            backend.draw_triangles(&self.vertices);
        }

        let bloom = backend.bloom_active();
        if bloom {
            backend.bloom_capture();
        }
        self.vertices.clear();
        for zone in self.batch.zones.iter() {
            simplified_glow(&mut self.vertices, zone);
        }
        if !self.vertices.is_empty() {
            backend.draw_triangles(&self.vertices);
        }
        self.draw_stars(backend);
        if bloom {
            backend.bloom_render();
        }
    }

    fn draw_stars<B: LensingBackend + ?Sized>(&mut self, backend: &mut B) {
        self.vertices.clear();
        for star in self.batch.stars.iter() {
            shapes::star(&mut self.vertices, star);
        }
        if !self.vertices.is_empty() {
            backend.draw_triangles(&self.vertices);
        }
    }

    /// Fill the flat uniform arrays from at most `limit` zones
    fn pack_zones(&mut self, limit: usize) {
        self.zone_data.clear();
        self.zone_colors.clear();
        for zone in self.batch.zones.iter().take(limit) {
            self.zone_data
                .push([zone.pos.x, zone.pos.y, zone.in_radius, zone.out_radius]);
            self.zone_colors.push(zone.color().to_array());
        }
    }

    /// Packed zone data from the last advanced frame
    pub fn packed_zones(&self) -> (&[[f32; 4]], &[[f32; 4]]) {
        (&self.zone_data, &self.zone_colors)
    }
}

fn simplified_glow(out: &mut Vec<Vertex>, zone: &LensingZone) {
    let radius = zone.in_radius * SIMPLIFIED_GLOW_SCALE;
    let color = zone.color();
    shapes::ring_gradient(
        out,
        zone.pos,
        zone.in_radius,
        radius,
        color,
        color.with_alpha(0.0),
        shapes::circle_vertices(radius),
    );
}
