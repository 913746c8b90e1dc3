use crate::constants::{
    CLEAR_RGBA, LINE_VERTEX_CAPACITY, MARKER_RINGS, MARKER_SLICES, MSAA_SAMPLES,
    TRIANGLE_VERTEX_CAPACITY,
};
use crate::dom;
use globe_core::{GlobeConfig, GlobeScene, LoadError, QualityTier, RenderBackend, Viewport};
use web_sys as web;

mod helpers;
pub mod mesh;

use helpers::{create_msaa_target, make_scene_pipeline, VertexBuffer};
use mesh::{Globals, SceneBatches};

const GLOBE_WGSL: &str = include_str!("../shaders/globe.wgsl");

// ===================== WebGPU state =====================

pub struct GpuBackend {
    container: web::HtmlElement,
    canvas: web::HtmlCanvasElement,
    attached: bool,
    disposed: bool,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    // MSAA per tier, when the surface format supports it
    antialias: [bool; 2],
    msaa_supported: bool,
    sample_count: u32,
    msaa_view: Option<wgpu::TextureView>,

    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    line_pipeline: wgpu::RenderPipeline,
    triangle_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,

    lines: VertexBuffer,
    triangles: VertexBuffer,
    batches: SceneBatches,
}

#[inline]
fn tier_index(tier: QualityTier) -> usize {
    match tier {
        QualityTier::Full => 0,
        QualityTier::Constrained => 1,
    }
}

impl GpuBackend {
    /// Acquire adapter, device and surface for a fresh, still detached canvas.
    pub async fn load(
        container: web::HtmlElement,
        config: &GlobeConfig,
        tier: QualityTier,
    ) -> Result<Self, LoadError> {
        let document = dom::window_document()
            .ok_or_else(|| LoadError::Unsupported("no document".into()))?;
        let canvas =
            dom::create_canvas(&document).map_err(|e| LoadError::Surface(format!("{:#}", e)))?;
        let settings = config.tier(tier);

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| LoadError::Surface(e.to_string()))?;
        let power_preference = if settings.low_power {
            wgpu::PowerPreference::LowPower
        } else {
            wgpu::PowerPreference::HighPerformance
        };
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(LoadError::NoAdapter)?;
        let info = adapter.get_info();
        log::info!("[loader] adapter {:?} via {:?}", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("globe_device"),
                    required_features: wgpu::Features::empty(),
                    // lowest common limits so the WebGL2 fallback qualifies too
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await
            .map_err(|e| LoadError::Device(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Rgba8Unorm
                )
            })
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| LoadError::Unsupported("surface reports no formats".into()))?;
        let alpha_mode = if caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            caps.alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: 1,
            height: 1,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let msaa_supported = adapter
            .get_texture_format_features(format)
            .flags
            .sample_count_supported(MSAA_SAMPLES);
        let antialias = [config.full.antialias, config.constrained.antialias];
        let sample_count = if antialias[tier_index(tier)] && msaa_supported {
            MSAA_SAMPLES
        } else {
            1
        };

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("globe_shader"),
            source: wgpu::ShaderSource::Wgsl(GLOBE_WGSL.into()),
        });
        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globe_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("globe_pl"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globe_uniforms"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globe_bg"),
            layout: &bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let (line_pipeline, triangle_pipeline) =
            build_pipelines(&device, &pipeline_layout, &shader, format, sample_count);
        let lines = VertexBuffer::new(&device, "line_vertices", LINE_VERTEX_CAPACITY);
        let triangles = VertexBuffer::new(&device, "triangle_vertices", TRIANGLE_VERTEX_CAPACITY);

        log::info!(
            "[loader] surface ready: {:?}, {:?} alpha, {}x MSAA",
            format,
            alpha_mode,
            sample_count
        );

        Ok(Self {
            container,
            canvas,
            attached: false,
            disposed: false,
            surface,
            device,
            queue,
            config: surface_config,
            antialias,
            msaa_supported,
            sample_count,
            msaa_view: None,
            shader,
            pipeline_layout,
            line_pipeline,
            triangle_pipeline,
            uniform_buffer,
            bind_group,
            lines,
            triangles,
            batches: SceneBatches::default(),
        })
    }

    fn rebuild_msaa_target(&mut self) {
        self.msaa_view = (self.sample_count > 1).then(|| {
            create_msaa_target(
                &self.device,
                self.config.width,
                self.config.height,
                self.config.format,
                self.sample_count,
            )
        });
    }
}

fn build_pipelines(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    sample_count: u32,
) -> (wgpu::RenderPipeline, wgpu::RenderPipeline) {
    let lines = make_scene_pipeline(
        device,
        layout,
        shader,
        "line_pipeline",
        wgpu::PrimitiveTopology::LineList,
        "fs_unlit",
        format,
        sample_count,
    );
    let triangles = make_scene_pipeline(
        device,
        layout,
        shader,
        "marker_pipeline",
        wgpu::PrimitiveTopology::TriangleList,
        "fs_lit",
        format,
        sample_count,
    );
    (lines, triangles)
}

impl RenderBackend for GpuBackend {
    fn attach(&mut self) -> anyhow::Result<()> {
        if !self.attached {
            self.container
                .append_child(&self.canvas)
                .map_err(dom::js_error)?;
            self.attached = true;
        }
        Ok(())
    }

    fn detach(&mut self) {
        if self.attached {
            self.canvas.remove();
            self.attached = false;
        }
    }

    fn hide_container(&mut self) {
        dom::hide(&self.container);
    }

    fn resize(&mut self, viewport: Viewport, tier: QualityTier) -> anyhow::Result<()> {
        let px = viewport
            .size_px()
            .min(self.device.limits().max_texture_dimension_2d);
        dom::size_canvas(&self.canvas, px, viewport);

        let sample_count = if self.antialias[tier_index(tier)] && self.msaa_supported {
            MSAA_SAMPLES
        } else {
            1
        };
        if sample_count != self.sample_count {
            self.sample_count = sample_count;
            let (lines, triangles) = build_pipelines(
                &self.device,
                &self.pipeline_layout,
                &self.shader,
                self.config.format,
                sample_count,
            );
            self.line_pipeline = lines;
            self.triangle_pipeline = triangles;
        }
        self.config.width = px;
        self.config.height = px;
        self.surface.configure(&self.device, &self.config);
        self.rebuild_msaa_target();
        log::debug!("[render] surface {}x{} ({}x MSAA)", px, px, self.sample_count);
        Ok(())
    }

    fn render(&mut self, scene: &GlobeScene) -> anyhow::Result<()> {
        self.batches
            .rebuild(scene.graph(), MARKER_RINGS, MARKER_SLICES);
        let globals = Globals::new(
            scene.camera().view_projection(),
            scene.group_matrix(),
            scene.graph().lights(),
        );
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&globals));
        self.lines
            .upload(&self.device, &self.queue, &self.batches.lines);
        self.triangles
            .upload(&self.device, &self.queue, &self.batches.triangles);

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("[render] surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => return Err(anyhow::anyhow!("acquire frame: {}", e)),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let [r, g, b, a] = CLEAR_RGBA;
        let (target, resolve_target, store) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(&view), wgpu::StoreOp::Discard),
            None => (&view, None, wgpu::StoreOp::Store),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("globe_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("globe_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.bind_group, &[]);
            // wireframe and arcs first, markers over them
            self.lines.draw(&mut pass, &self.line_pipeline);
            self.triangles.draw(&mut pass, &self.triangle_pipeline);
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.batches.clear();
        self.lines.destroy();
        self.triangles.destroy();
        self.uniform_buffer.destroy();
        self.msaa_view = None;
        self.device.destroy();
        log::debug!("[render] GPU resources released");
    }
}
