//! wgpu lensing backend
//!
//! Owns the offscreen capture texture, the zone uniform arrays and three
//! pipelines: lensing and rim (fullscreen triangles) plus a triangle fill
//! pipeline for the simplified path and stars.
//!
//! The zone arrays are plain uniforms so the backend runs on WebGL2. Their
//! length is baked into the WGSL, so growing them means recompiling.
//!
//! Everything for a frame, the host's scene included, is recorded into one
//! command encoder so the capture clear, the scene and the lensing blit
//! reach the queue in that order. Frame protocol for the host:
//! 1. [`GpuLensing::begin_frame`] (or [`GpuLensing::begin_surface_frame`])
//! 2. compositor `begin_frame`
//! 3. draw the scene through [`GpuLensing::scene_pass`] or
//!    [`GpuLensing::scene_encoder`]
//! 4. compositor `end_frame`
//! 5. [`GpuLensing::finish_frame`]

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;

use super::compositor::{LensingBackend, ShaderPass};
use super::vertex::Vertex;
use crate::consts::INITIAL_ZONE_CAPACITY;

const LENSING_WGSL: &str = include_str!("lensing.wgsl");
const RIM_WGSL: &str = include_str!("rim.wgsl");
const FILL_WGSL: &str = include_str!("fill.wgsl");
const ZONE_STRIDE: usize = std::mem::size_of::<[f32; 4]>();

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2], // offset 0
    camera: [f32; 2],     // offset 8
    zoom: f32,            // offset 16
    zone_count: u32,      // offset 20
    _pad: [u32; 2],       // pad to 32 bytes
}

/// Offscreen scene buffer
struct CaptureTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
    size: (u32, u32),
}

/// Zone uniforms sized for one capacity
struct ZoneUniforms {
    zones: wgpu::Buffer,
    colors: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct Pipelines {
    lensing: wgpu::RenderPipeline,
    rim: wgpu::RenderPipeline,
    fill: wgpu::RenderPipeline,
}

/// Layouts the pipelines are built against
struct Layouts<'a> {
    /// Scene texture + zone uniforms
    lensing: &'a wgpu::PipelineLayout,
    /// Globals only, so fill draws never need the capture
    fill: &'a wgpu::PipelineLayout,
}

struct Frame {
    encoder: wgpu::CommandEncoder,
    target: wgpu::TextureView,
}

pub struct GpuLensing {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,
    size: (u32, u32),
    camera: Vec2,
    zoom: f32,

    sampler: wgpu::Sampler,
    scene_layout: wgpu::BindGroupLayout,
    zone_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    fill_layout: wgpu::PipelineLayout,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,

    capacity: usize,
    max_capacity: usize,
    zone_count: u32,
    uniforms: ZoneUniforms,
    pipelines: Pipelines,

    capture: Option<CaptureTarget>,
    capturing: bool,
    frame: Option<Frame>,
}

impl GpuLensing {
    /// Request a device from `adapter` and build the backend
    pub async fn request(
        adapter: &wgpu::Adapter,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> crate::Result<Self> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("blackhole-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;
        Ok(Self::new(device, queue, format, width, height))
    }

    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let max_capacity =
            (device.limits().max_uniform_buffer_binding_size as usize / ZONE_STRIDE).max(1);
        let capacity = INITIAL_ZONE_CAPACITY.min(max_capacity);
        log::info!("lensing backend: {format:?}, zone limit {max_capacity}");

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("scene_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let uniform_entry = |binding: u32, visibility: wgpu::ShaderStages| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let zone_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("zone_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
                uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_bind_group_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lensing_pipeline_layout"),
            bind_group_layouts: &[&scene_layout, &zone_layout],
            immediate_size: 0,
        });
        let fill_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fill_pipeline_layout"),
            bind_group_layouts: &[&globals_layout],
            immediate_size: 0,
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lensing_globals"),
            contents: bytemuck::bytes_of(&Globals {
                resolution: [width as f32, height as f32],
                camera: [0.0, 0.0],
                zoom: 1.0,
                zone_count: 0,
                _pad: [0; 2],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let uniforms = create_zone_uniforms(&device, &zone_layout, &globals_buffer, capacity);
        let layouts = Layouts {
            lensing: &pipeline_layout,
            fill: &fill_layout,
        };
        let pipelines = create_pipelines(&device, &layouts, format, capacity);

        Self {
            device,
            queue,
            format,
            size: (width.max(1), height.max(1)),
            camera: Vec2::ZERO,
            zoom: 1.0,
            sampler,
            scene_layout,
            zone_layout,
            pipeline_layout,
            fill_layout,
            globals_buffer,
            globals_bind_group,
            capacity,
            max_capacity,
            zone_count: 0,
            uniforms,
            pipelines,
            capture: None,
            capturing: false,
            frame: None,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Viewport resize; the capture follows on the next frame
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.size = (width, height);
        }
    }

    /// World position at the screen center and world-to-pixel scale
    pub fn set_camera(&mut self, center: Vec2, zoom: f32) {
        self.camera = center;
        self.zoom = zoom.max(f32::EPSILON);
    }

    /// Start recording a frame that ends up in `target`
    pub fn begin_frame(&mut self, target: wgpu::TextureView) {
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lensing_encoder"),
            });
        self.frame = Some(Frame { encoder, target });
        self.write_globals();
    }

    /// Acquire the next surface texture and start a frame on it
    ///
    /// The returned texture must be presented after [`Self::finish_frame`].
    pub fn begin_surface_frame(
        &mut self,
        surface: &wgpu::Surface<'_>,
    ) -> crate::Result<wgpu::SurfaceTexture> {
        let output = surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.begin_frame(view);
        Ok(output)
    }

    /// Frame encoder and the view the scene belongs in right now
    ///
    /// The view is the capture while the compositor is capturing, the frame
    /// target otherwise. `None` outside `begin_frame`/`finish_frame`.
    pub fn scene_encoder(&mut self) -> Option<(&mut wgpu::CommandEncoder, &wgpu::TextureView)> {
        let frame = self.frame.as_mut()?;
        let view = match &self.capture {
            Some(capture) if self.capturing => &capture.view,
            _ => &frame.target,
        };
        Some((&mut frame.encoder, view))
    }

    /// Render pass over the current scene view, keeping what is already there
    pub fn scene_pass(&mut self) -> Option<wgpu::RenderPass<'_>> {
        let (encoder, view) = self.scene_encoder()?;
        Some(Self::run_pass(encoder, view, "scene_pass", wgpu::LoadOp::Load))
    }

    /// Whether the offscreen capture texture is allocated
    pub fn has_capture(&self) -> bool {
        self.capture.is_some()
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Submit everything recorded since [`Self::begin_frame`]
    pub fn finish_frame(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.queue.submit(std::iter::once(frame.encoder.finish()));
        }
    }

    fn write_globals(&self) {
        let globals = Globals {
            resolution: [self.size.0 as f32, self.size.1 as f32],
            camera: self.camera.to_array(),
            zoom: self.zoom,
            zone_count: self.zone_count,
            _pad: [0; 2],
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
    }

    fn create_capture_target(&self, size: (u32, u32)) -> CaptureTarget {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("scene_capture"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &self.scene_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        CaptureTarget {
            texture,
            view,
            bind_group,
            size,
        }
    }

    /// Render pass over `view`, cleared or loaded
    fn run_pass<'a>(
        encoder: &'a mut wgpu::CommandEncoder,
        view: &'a wgpu::TextureView,
        label: &'static str,
        load: wgpu::LoadOp<wgpu::Color>,
    ) -> wgpu::RenderPass<'a> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

impl LensingBackend for GpuLensing {
    fn create_capture(&mut self) {
        if self.capture.is_none() {
            self.capture = Some(self.create_capture_target(self.size));
            log::debug!("scene capture created at {:?}", self.size);
        }
    }

    fn release_capture(&mut self) {
        self.capturing = false;
        if let Some(capture) = self.capture.take() {
            capture.texture.destroy();
            log::debug!("scene capture released");
        }
    }

    fn resize_capture(&mut self, width: u32, height: u32) {
        let size = (width.max(1), height.max(1));
        if self.capture.as_ref().is_some_and(|c| c.size != size) {
            if let Some(old) = self.capture.take() {
                old.texture.destroy();
            }
            self.capture = Some(self.create_capture_target(size));
        }
    }

    fn begin_capture(&mut self) {
        self.capturing = self.capture.is_some();
        if let (Some(capture), Some(frame)) = (&self.capture, &mut self.frame) {
            Self::run_pass(
                &mut frame.encoder,
                &capture.view,
                "capture_clear",
                wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            );
        }
    }

    fn end_capture(&mut self) {
        self.capturing = false;
    }

    fn clear_capture(&mut self) {
        if let (Some(capture), Some(frame)) = (&self.capture, &mut self.frame) {
            Self::run_pass(
                &mut frame.encoder,
                &capture.view,
                "capture_clear",
                wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            );
        }
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.size
    }

    fn zone_capacity(&self) -> usize {
        self.capacity
    }

    fn rebuild_shaders(&mut self, capacity: usize) {
        let capacity = capacity.clamp(1, self.max_capacity);
        if capacity == self.capacity {
            return;
        }
        self.uniforms = create_zone_uniforms(
            &self.device,
            &self.zone_layout,
            &self.globals_buffer,
            capacity,
        );
        let layouts = Layouts {
            lensing: &self.pipeline_layout,
            fill: &self.fill_layout,
        };
        self.pipelines = create_pipelines(&self.device, &layouts, self.format, capacity);
        self.capacity = capacity;
    }

    fn upload_zones(&mut self, zones: &[[f32; 4]], colors: &[[f32; 4]]) {
        let n = zones.len().min(colors.len()).min(self.capacity);
        self.zone_count = n as u32;
        if n > 0 {
            self.queue
                .write_buffer(&self.uniforms.zones, 0, bytemuck::cast_slice(&zones[..n]));
            self.queue
                .write_buffer(&self.uniforms.colors, 0, bytemuck::cast_slice(&colors[..n]));
        }
        self.write_globals();
    }

    fn blit(&mut self, pass: ShaderPass) {
        let (Some(capture), Some(frame)) = (&self.capture, &mut self.frame) else {
            log::debug!("blit {pass:?} skipped, no capture or frame");
            return;
        };
        let pipeline = match pass {
            ShaderPass::Lensing => &self.pipelines.lensing,
            ShaderPass::Rim => &self.pipelines.rim,
        };
        let mut render_pass = Self::run_pass(
            &mut frame.encoder,
            &frame.target,
            "lensing_blit",
            wgpu::LoadOp::Load,
        );
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &capture.bind_group, &[]);
        render_pass.set_bind_group(1, &self.uniforms.bind_group, &[]);
        render_pass.draw(0..3, 0..1); // Fullscreen triangle
    }

    fn draw_triangles(&mut self, vertices: &[Vertex]) {
        if vertices.is_empty() {
            return;
        }
        let Some(frame) = &mut self.frame else {
            return;
        };

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("fill_vertices"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let mut render_pass = Self::run_pass(
            &mut frame.encoder,
            &frame.target,
            "fill_pass",
            wgpu::LoadOp::Load,
        );
        render_pass.set_pipeline(&self.pipelines.fill);
        render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        render_pass.draw(0..vertices.len() as u32, 0..1);
    }
}

fn create_zone_uniforms(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    globals: &wgpu::Buffer,
    capacity: usize,
) -> ZoneUniforms {
    let size = (capacity * ZONE_STRIDE) as u64;
    let buffer = |label: &'static str| {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    };
    let zones = buffer("zone_data");
    let colors = buffer("zone_colors");

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("zone_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: globals.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: zones.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: colors.as_entire_binding(),
            },
        ],
    });

    ZoneUniforms {
        zones,
        colors,
        bind_group,
    }
}

/// WGSL source with the zone array length baked in
pub fn shader_source(template: &str, capacity: usize) -> String {
    template.replace("{{MAX_ZONES}}", &capacity.to_string())
}

fn create_pipelines(
    device: &wgpu::Device,
    layouts: &Layouts<'_>,
    format: wgpu::TextureFormat,
    capacity: usize,
) -> Pipelines {
    let module = |label: &'static str, template: &str| {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(shader_source(template, capacity).into()),
        })
    };
    let lensing = module("lensing_shader", LENSING_WGSL);
    let rim = module("rim_shader", RIM_WGSL);
    let fill = module("fill_shader", FILL_WGSL);

    let pipeline = |label: &'static str,
                    layout: &wgpu::PipelineLayout,
                    shader: &wgpu::ShaderModule,
                    buffers: &[wgpu::VertexBufferLayout<'static>],
                    blend: Option<wgpu::BlendState>| {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    };

    log::debug!("lensing pipelines built for {capacity} zones");
    Pipelines {
        lensing: pipeline("lensing_pipeline", layouts.lensing, &lensing, &[], None),
        rim: pipeline(
            "rim_pipeline",
            layouts.lensing,
            &rim,
            &[],
            Some(wgpu::BlendState::ALPHA_BLENDING),
        ),
        fill: pipeline(
            "fill_pipeline",
            layouts.fill,
            &fill,
            &[Vertex::desc()],
            Some(wgpu::BlendState::ALPHA_BLENDING),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_baked_into_every_shader() {
        for template in [LENSING_WGSL, RIM_WGSL] {
            let src = shader_source(template, 64);
            assert!(src.contains("const MAX_ZONES: u32 = 64u;"));
            assert!(!src.contains("{{"));
        }
    }

    #[test]
    fn test_globals_layout() {
        assert_eq!(std::mem::size_of::<Globals>(), 32);
    }

    #[cfg(not(target_arch = "wasm32"))]
    mod device {
        use glam::Vec2;

        use crate::color::Color;
        use crate::consts::INITIAL_ZONE_CAPACITY;
        use crate::renderer::{CompositeMode, GpuLensing, LensingBackend, LensingCompositor};

        const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

        fn backend() -> GpuLensing {
            let (device, queue) = wgpu::Device::noop(&wgpu::DeviceDescriptor::default());
            GpuLensing::new(device, queue, FORMAT, 64, 48)
        }

        fn target(gpu: &GpuLensing) -> wgpu::TextureView {
            gpu.device()
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("test_target"),
                    size: wgpu::Extent3d {
                        width: 64,
                        height: 48,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        }

        fn add_zones(c: &mut LensingCompositor, n: usize) {
            for i in 0..n {
                c.batch_mut()
                    .add_zone(Vec2::new(i as f32, 0.0), 3.0, 12.0, Color::WHITE);
            }
        }

        #[test]
        fn test_scene_recorded_between_capture_and_lensing() {
            let mut gpu = backend();
            let mut c = LensingCompositor::new(true, &mut gpu);
            assert!(gpu.scene_encoder().is_none());

            let view = target(&gpu);
            gpu.begin_frame(view);
            c.begin_frame(&mut gpu);
            assert!(gpu.is_capturing());
            {
                let pass = gpu.scene_pass();
                assert!(pass.is_some());
            }

            add_zones(&mut c, 2);
            c.batch_mut()
                .add_star(Vec2::ZERO, 6.0, 3.0, 0.0, Color::WHITE, Color::CLEAR);
            let stats = c.end_frame(&mut gpu);
            assert_eq!(stats.mode, CompositeMode::Advanced);
            assert!(!gpu.is_capturing());

            gpu.finish_frame();
            assert!(gpu.scene_encoder().is_none());
        }

        #[test]
        fn test_simplified_frames_leave_capture_released() {
            let mut gpu = backend();
            let mut c = LensingCompositor::new(true, &mut gpu);
            assert!(gpu.has_capture());

            c.set_advanced(false, &mut gpu);
            assert!(!gpu.has_capture());

            for _ in 0..2 {
                let view = target(&gpu);
                gpu.begin_frame(view);
                c.begin_frame(&mut gpu);
                add_zones(&mut c, 3);
                c.batch_mut()
                    .add_star(Vec2::ZERO, 6.0, 3.0, 0.0, Color::WHITE, Color::CLEAR);
                let stats = c.end_frame(&mut gpu);
                gpu.finish_frame();
                assert_eq!(stats.mode, CompositeMode::Simplified);
                assert!(!gpu.has_capture());
            }

            c.set_advanced(true, &mut gpu);
            assert!(gpu.has_capture());
            assert_eq!(c.has_capture(), gpu.has_capture());
        }

        #[test]
        fn test_overflow_rebuilds_pipelines() {
            let mut gpu = backend();
            let mut c = LensingCompositor::new(true, &mut gpu);
            let view = target(&gpu);
            gpu.begin_frame(view);
            c.begin_frame(&mut gpu);
            add_zones(&mut c, INITIAL_ZONE_CAPACITY + 8);
            let stats = c.end_frame(&mut gpu);
            gpu.finish_frame();

            assert_eq!(stats.rebuilt, Some(INITIAL_ZONE_CAPACITY * 2));
            assert_eq!(gpu.zone_capacity(), INITIAL_ZONE_CAPACITY * 2);
            assert_eq!(gpu.zone_count as usize, INITIAL_ZONE_CAPACITY + 8);
        }
    }
}
