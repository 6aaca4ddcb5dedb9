//! Headless backend that records every call
//!
//! Used by the demo binary and tests to observe what the compositor asks of
//! the graphics layer without a GPU.

use super::compositor::{LensingBackend, ShaderPass};
use super::vertex::Vertex;
use crate::consts::INITIAL_ZONE_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateCapture,
    ReleaseCapture,
    ResizeCapture(u32, u32),
    BeginCapture,
    EndCapture,
    ClearCapture,
    RebuildShaders(usize),
    /// Number of zones uploaded
    UploadZones(usize),
    Blit(ShaderPass),
    /// Number of vertices drawn
    DrawTriangles(usize),
    BloomCapture,
    BloomRender,
}

#[derive(Debug)]
pub struct RecordingBackend {
    pub calls: Vec<Call>,
    pub viewport: (u32, u32),
    pub capacity: usize,
    /// Whether a bloom stage is reported as active
    pub bloom: bool,
    pub live_captures: usize,
    pub capturing: bool,
    pub uploaded_zones: Vec<[f32; 4]>,
    pub uploaded_colors: Vec<[f32; 4]>,
    /// Every `draw_triangles` payload in order
    pub triangles: Vec<Vec<Vertex>>,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            calls: Vec::new(),
            viewport: (width, height),
            capacity: INITIAL_ZONE_CAPACITY,
            bloom: false,
            live_captures: 0,
            capturing: false,
            uploaded_zones: Vec::new(),
            uploaded_colors: Vec::new(),
            triangles: Vec::new(),
        }
    }

    /// Drain the call log
    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn last_triangle_count(&self) -> usize {
        self.triangles.last().map_or(0, Vec::len)
    }
}

impl LensingBackend for RecordingBackend {
    fn create_capture(&mut self) {
        self.live_captures += 1;
        self.calls.push(Call::CreateCapture);
    }

    fn release_capture(&mut self) {
        self.live_captures = self.live_captures.saturating_sub(1);
        self.calls.push(Call::ReleaseCapture);
    }

    fn resize_capture(&mut self, width: u32, height: u32) {
        self.calls.push(Call::ResizeCapture(width, height));
    }

    fn begin_capture(&mut self) {
        self.capturing = true;
        self.calls.push(Call::BeginCapture);
    }

    fn end_capture(&mut self) {
        self.capturing = false;
        self.calls.push(Call::EndCapture);
    }

    fn clear_capture(&mut self) {
        self.calls.push(Call::ClearCapture);
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    fn zone_capacity(&self) -> usize {
        self.capacity
    }

    fn rebuild_shaders(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.calls.push(Call::RebuildShaders(capacity));
    }

    fn upload_zones(&mut self, zones: &[[f32; 4]], colors: &[[f32; 4]]) {
        self.uploaded_zones = zones.to_vec();
        self.uploaded_colors = colors.to_vec();
        self.calls.push(Call::UploadZones(zones.len()));
    }

    fn blit(&mut self, pass: ShaderPass) {
        self.calls.push(Call::Blit(pass));
    }

    fn draw_triangles(&mut self, vertices: &[Vertex]) {
        self.triangles.push(vertices.to_vec());
        self.calls.push(Call::DrawTriangles(vertices.len()));
    }

    fn bloom_active(&self) -> bool {
        self.bloom
    }

    fn bloom_capture(&mut self) {
        self.calls.push(Call::BloomCapture);
    }

    fn bloom_render(&mut self) {
        self.calls.push(Call::BloomRender);
    }
}
