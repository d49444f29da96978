//! wgpu backend implementation
//!
//! Draws are buffered during a frame and replayed in `end_frame`. Render
//! pipelines are created lazily, one per (program, vertex layouts, topology)
//! combination seen, and cached for the lifetime of the program. Uniform
//! snapshots taken by `use_program` are packed into a single per-frame buffer
//! and selected with dynamic offsets, so every draw sees the values that were
//! current when it was issued.
//!
//! Buffer uploads are not snapshotted. `upload_buffer` writes to the queue
//! straight away and the write lands before the frame's render pass, so every
//! draw of a frame reads the last data uploaded to its buffers during that
//! frame. A buffer destroyed after a draw was issued (for example by
//! `DynamicMesh::new_mesh`) makes that draw be skipped with a warning. Flush a
//! mesh once per frame, before its first draw, to get what was drawn.

use crate::backend::traits::*;
use crate::backend::types::*;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::ops::Range;
use std::sync::Arc;

const COPY_ALIGNMENT: u64 = wgpu::COPY_BUFFER_ALIGNMENT;

fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// Buffered render command
#[derive(Clone)]
enum RenderCommand {
    UseProgram {
        program: ProgramHandle,
        uniform_offset: Option<u32>,
    },
    Draw {
        input: VertexInput,
        topology: PrimitiveTopology,
        range: DrawRange,
    },
}

/// Frame being recorded between begin_frame and end_frame
struct PendingFrame {
    clear_color: [f32; 4],
    commands: Vec<RenderCommand>,
    uniforms: Vec<u8>,
    current_program: Option<ProgramHandle>,
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    label: Option<String>,
    usage: BufferUsage,
    capacity: u64,
    len: u64,
}

struct Program {
    module: wgpu::ShaderModule,
    label: Option<String>,
    uniform_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_size: u64,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramHandle,
    layouts: Vec<VertexBufferLayout>,
    topology: PrimitiveTopology,
}

/// wgpu backend implementation
pub struct WgpuBackend {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    #[allow(dead_code)]
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    current_texture: Option<wgpu::SurfaceTexture>,

    // Resource storage
    buffers: HashMap<u64, GpuBuffer>,
    programs: HashMap<u64, Program>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    // Handle counters
    next_buffer_id: u64,
    next_program_id: u64,

    // Per-frame uniform snapshots
    uniform_alignment: u64,
    uniform_buffer: Option<wgpu::Buffer>,
    uniform_capacity: u64,
    uniform_bind_groups: HashMap<ProgramHandle, wgpu::BindGroup>,

    frame: Option<PendingFrame>,
}

impl WgpuBackend {
    fn convert_buffer_usage(usage: BufferUsage) -> wgpu::BufferUsages {
        let mut result = wgpu::BufferUsages::empty();
        if usage.contains(BufferUsage::COPY_DST) {
            result |= wgpu::BufferUsages::COPY_DST;
        }
        if usage.contains(BufferUsage::INDEX) {
            result |= wgpu::BufferUsages::INDEX;
        }
        if usage.contains(BufferUsage::VERTEX) {
            result |= wgpu::BufferUsages::VERTEX;
        }
        if usage.contains(BufferUsage::UNIFORM) {
            result |= wgpu::BufferUsages::UNIFORM;
        }
        result
    }

    fn convert_vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
        match format {
            VertexFormat::Float32 => wgpu::VertexFormat::Float32,
            VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
            VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
            VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
            VertexFormat::Sint32 => wgpu::VertexFormat::Sint32,
            VertexFormat::Sint32x2 => wgpu::VertexFormat::Sint32x2,
            VertexFormat::Sint32x3 => wgpu::VertexFormat::Sint32x3,
            VertexFormat::Sint32x4 => wgpu::VertexFormat::Sint32x4,
        }
    }

    fn convert_topology(topology: PrimitiveTopology) -> wgpu::PrimitiveTopology {
        match topology {
            PrimitiveTopology::PointList => wgpu::PrimitiveTopology::PointList,
            PrimitiveTopology::LineList => wgpu::PrimitiveTopology::LineList,
            PrimitiveTopology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            PrimitiveTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }

    /// Clamp to device limits while maintaining aspect ratio
    fn clamp_surface_size(&self, width: u32, height: u32) -> (u32, u32) {
        let max_size = self.device.limits().max_texture_dimension_2d;
        if width > max_size || height > max_size {
            let scale = (max_size as f32 / width as f32).min(max_size as f32 / height as f32);
            (
                ((width as f32 * scale) as u32).max(1),
                ((height as f32 * scale) as u32).max(1),
            )
        } else {
            (width.max(1), height.max(1))
        }
    }
}

impl WgpuBackend {
    /// Create the backend for a window, blocking on adapter and device requests
    pub fn new(window: Arc<winit::window::Window>, vsync: bool) -> BackendResult<Self> {
        pollster::block_on(Self::new_async(window, vsync))
    }

    pub async fn new_async(window: Arc<winit::window::Window>, vsync: bool) -> BackendResult<Self> {
        let backends = wgpu::util::backend_bits_from_env().unwrap_or(wgpu::Backends::all());
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| BackendError::SurfaceCreationFailed(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| BackendError::InitializationFailed("No suitable adapter found".into()))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Selected GPU: {} ({:?} backend)",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Mesh Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|e| BackendError::DeviceCreationFailed(e.to_string()))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| {
                BackendError::SurfaceCreationFailed("Surface reports no formats".into())
            })?;

        let present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let uniform_alignment = device.limits().min_uniform_buffer_offset_alignment as u64;

        let mut backend = Self {
            instance,
            surface,
            adapter,
            device,
            queue,
            surface_config,
            current_texture: None,
            buffers: HashMap::new(),
            programs: HashMap::new(),
            pipelines: HashMap::new(),
            next_buffer_id: 1,
            next_program_id: 1,
            uniform_alignment,
            uniform_buffer: None,
            uniform_capacity: 0,
            uniform_bind_groups: HashMap::new(),
            frame: None,
        };
        let (width, height) =
            backend.clamp_surface_size(backend.surface_config.width, backend.surface_config.height);
        backend.surface_config.width = width;
        backend.surface_config.height = height;
        backend.surface.configure(&backend.device, &backend.surface_config);

        Ok(backend)
    }

    fn allocate(&self, label: Option<&str>, size: u64, usage: BufferUsage) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label,
            size: align_up(size.max(COPY_ALIGNMENT), COPY_ALIGNMENT),
            usage: Self::convert_buffer_usage(usage),
            mapped_at_creation: false,
        })
    }

    fn check_buffer(&self, buffer: BufferHandle, usage: BufferUsage) -> BackendResult<()> {
        let buf = self
            .buffers
            .get(&buffer.0)
            .ok_or(BackendError::UnknownBuffer(buffer))?;
        if !buf.usage.contains(usage) {
            return Err(BackendError::InvalidUsage { buffer, usage });
        }
        Ok(())
    }

    fn push_draw(
        &mut self,
        input: &VertexInput,
        topology: PrimitiveTopology,
        range: DrawRange,
    ) -> BackendResult<()> {
        for &buffer in &input.buffers {
            self.check_buffer(buffer, BufferUsage::VERTEX)?;
        }
        if let DrawRange::Indices(_) = range {
            let index_buffer = input.index_buffer.ok_or(BackendError::MissingIndexBuffer)?;
            self.check_buffer(index_buffer, BufferUsage::INDEX)?;
        }
        let frame = self.frame.as_mut().ok_or(BackendError::NoActiveFrame)?;
        if frame.current_program.is_none() {
            return Err(BackendError::NoProgramBound);
        }
        frame.commands.push(RenderCommand::Draw {
            input: input.clone(),
            topology,
            range,
        });
        Ok(())
    }

    /// Make sure the uniform buffer can hold `size` bytes, dropping bind
    /// groups that point at a replaced buffer.
    fn ensure_uniform_capacity(&mut self, size: u64) {
        if size <= self.uniform_capacity && self.uniform_buffer.is_some() {
            return;
        }
        let capacity = align_up(size.max(self.uniform_alignment), self.uniform_alignment)
            .next_power_of_two();
        log::debug!("Growing frame uniform buffer to {} bytes", capacity);
        self.uniform_buffer = Some(self.allocate(
            Some("Frame Uniforms"),
            capacity,
            BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        ));
        self.uniform_capacity = capacity;
        self.uniform_bind_groups.clear();
    }

    fn ensure_bind_group(&mut self, program: ProgramHandle) {
        if self.uniform_bind_groups.contains_key(&program) {
            return;
        }
        let Some(prog) = self.programs.get(&program.0) else {
            return;
        };
        let (Some(layout), Some(buffer)) = (&prog.uniform_layout, &self.uniform_buffer) else {
            return;
        };
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: prog.label.as_deref(),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(prog.uniform_size),
                }),
            }],
        });
        self.uniform_bind_groups.insert(program, bind_group);
    }

    fn ensure_pipeline(&mut self, key: &PipelineKey) -> BackendResult<()> {
        if self.pipelines.contains_key(key) {
            return Ok(());
        }
        let program = self
            .programs
            .get(&key.program.0)
            .ok_or(BackendError::UnknownProgram(key.program))?;

        // Build vertex buffer layouts with proper lifetimes
        let vertex_attrs: Vec<Vec<wgpu::VertexAttribute>> = key
            .layouts
            .iter()
            .map(|layout| {
                layout
                    .attributes
                    .iter()
                    .map(|a| wgpu::VertexAttribute {
                        format: Self::convert_vertex_format(a.format),
                        offset: a.offset,
                        shader_location: a.location,
                    })
                    .collect()
            })
            .collect();

        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = key
            .layouts
            .iter()
            .zip(vertex_attrs.iter())
            .map(|(layout, attrs)| wgpu::VertexBufferLayout {
                array_stride: layout.array_stride,
                step_mode: match layout.step_mode {
                    VertexStepMode::Vertex => wgpu::VertexStepMode::Vertex,
                    VertexStepMode::Instance => wgpu::VertexStepMode::Instance,
                },
                attributes: attrs,
            })
            .collect();

        let strip_index_format = match key.topology {
            PrimitiveTopology::LineStrip | PrimitiveTopology::TriangleStrip => {
                Some(wgpu::IndexFormat::Uint32)
            }
            _ => None,
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: program.label.as_deref(),
                layout: Some(&program.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &program.module,
                    entry_point: "vs_main",
                    buffers: &vertex_buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.module,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: Self::convert_topology(key.topology),
                    strip_index_format,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(BackendError::PipelineCreationFailed(error.to_string()));
        }

        log::debug!(
            "Created pipeline for program {:?} ({} vertex buffers, {:?})",
            key.program,
            key.layouts.len(),
            key.topology
        );
        self.pipelines.insert(key.clone(), pipeline);
        Ok(())
    }

    /// A draw can only be encoded when every buffer it reads holds data
    fn draw_is_ready(&self, input: &VertexInput, range: &DrawRange) -> bool {
        let has_data = |handle: &BufferHandle| {
            self.buffers.get(&handle.0).is_some_and(|b| b.len > 0)
        };
        let (empty_range, needs_index) = match range {
            DrawRange::Vertices(r) => (r.is_empty(), false),
            DrawRange::Indices(r) => (r.is_empty(), true),
        };
        if empty_range {
            return false;
        }
        let released = |handle: &BufferHandle| !self.buffers.contains_key(&handle.0);
        if input.buffers.iter().any(released)
            || (needs_index && input.index_buffer.as_ref().is_some_and(released))
        {
            log::warn!("Skipping draw: a buffer was destroyed before the frame was submitted");
            return false;
        }
        if !input.buffers.iter().all(has_data) {
            log::debug!("Skipping draw: a vertex buffer has not been uploaded");
            return false;
        }
        if needs_index && !input.index_buffer.as_ref().is_some_and(has_data) {
            log::debug!("Skipping indexed draw: the index buffer has not been uploaded");
            return false;
        }
        true
    }
}

impl GraphicsBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            let (width, height) = self.clamp_surface_size(width, height);
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.device, &self.surface_config);
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> BackendResult<FrameContext> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.surface_config);
                return Err(BackendError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(BackendError::OutOfMemory),
            Err(e) => return Err(BackendError::AcquireImageFailed(e.to_string())),
        };

        self.current_texture = Some(output);
        self.frame = Some(PendingFrame {
            clear_color,
            commands: Vec::new(),
            uniforms: Vec::new(),
            current_program: None,
        });

        Ok(FrameContext {
            width: self.surface_config.width,
            height: self.surface_config.height,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        let Some(mut frame) = self.frame.take() else {
            return Ok(());
        };
        let Some(texture) = self.current_texture.take() else {
            return Ok(());
        };

        // Upload this frame's uniform snapshots
        if !frame.uniforms.is_empty() {
            frame
                .uniforms
                .resize(align_up(frame.uniforms.len() as u64, COPY_ALIGNMENT) as usize, 0);
            self.ensure_uniform_capacity(frame.uniforms.len() as u64);
            if let Some(buffer) = &self.uniform_buffer {
                self.queue.write_buffer(buffer, 0, &frame.uniforms);
            }
        }

        // Resolve pipelines and bind groups before encoding
        let mut keys: Vec<Option<PipelineKey>> = Vec::with_capacity(frame.commands.len());
        let mut program = None;
        for cmd in &frame.commands {
            match cmd {
                RenderCommand::UseProgram { program: p, uniform_offset } => {
                    program = Some(*p);
                    if uniform_offset.is_some() {
                        self.ensure_bind_group(*p);
                    }
                    keys.push(None);
                }
                RenderCommand::Draw { input, topology, .. } => {
                    let Some(program) = program else {
                        keys.push(None);
                        continue;
                    };
                    let key = PipelineKey {
                        program,
                        layouts: input.layouts.clone(),
                        topology: *topology,
                    };
                    match self.ensure_pipeline(&key) {
                        Ok(()) => keys.push(Some(key)),
                        Err(e) => {
                            log::error!("{}", e);
                            keys.push(None);
                        }
                    }
                }
            }
        }

        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let [r, g, b, a] = frame.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mesh Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut bound: Option<(ProgramHandle, Option<u32>)> = None;
            for (cmd, key) in frame.commands.iter().zip(keys.iter()) {
                match cmd {
                    RenderCommand::UseProgram { program, uniform_offset } => {
                        bound = Some((*program, *uniform_offset));
                    }
                    RenderCommand::Draw { input, range, .. } => {
                        let (Some(key), Some((program, uniform_offset))) = (key, bound) else {
                            continue;
                        };
                        if !self.draw_is_ready(input, range) {
                            continue;
                        }
                        let Some(pipeline) = self.pipelines.get(key) else {
                            continue;
                        };
                        render_pass.set_pipeline(pipeline);
                        if let Some(offset) = uniform_offset {
                            if let Some(bind_group) = self.uniform_bind_groups.get(&program) {
                                render_pass.set_bind_group(0, bind_group, &[offset]);
                            }
                        }
                        for (slot, handle) in input.buffers.iter().enumerate() {
                            if let Some(buf) = self.buffers.get(&handle.0) {
                                render_pass.set_vertex_buffer(slot as u32, buf.buffer.slice(0..buf.len));
                            }
                        }
                        match range {
                            DrawRange::Vertices(vertices) => {
                                render_pass.draw(vertices.clone(), 0..1);
                            }
                            DrawRange::Indices(indices) => {
                                let Some(buf) = input
                                    .index_buffer
                                    .and_then(|handle| self.buffers.get(&handle.0))
                                else {
                                    continue;
                                };
                                render_pass.set_index_buffer(
                                    buf.buffer.slice(0..buf.len),
                                    wgpu::IndexFormat::Uint32,
                                );
                                render_pass.draw_indexed(indices.clone(), 0, 0..1);
                            }
                        }
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        texture.present();
        Ok(())
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        let buffer = self.allocate(desc.label.as_deref(), desc.size, desc.usage);
        let capacity = buffer.size();

        let id = self.next_buffer_id;
        self.next_buffer_id += 1;
        self.buffers.insert(
            id,
            GpuBuffer {
                buffer,
                label: desc.label.clone(),
                usage: desc.usage,
                capacity,
                len: 0,
            },
        );

        Ok(BufferHandle(id))
    }

    fn upload_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> BackendResult<()> {
        let (grow, label, usage) = {
            let buf = self
                .buffers
                .get(&buffer.0)
                .ok_or(BackendError::UnknownBuffer(buffer))?;
            (
                data.len() as u64 > buf.capacity,
                buf.label.clone(),
                buf.usage,
            )
        };

        if grow {
            log::trace!("Reallocating buffer {:?} for {} bytes", label, data.len());
            let replacement = self.allocate(label.as_deref(), data.len() as u64, usage);
            if let Some(buf) = self.buffers.get_mut(&buffer.0) {
                buf.capacity = replacement.size();
                buf.buffer.destroy();
                buf.buffer = replacement;
            }
        }

        let Some(buf) = self.buffers.get_mut(&buffer.0) else {
            return Err(BackendError::UnknownBuffer(buffer));
        };
        buf.len = data.len() as u64;
        if data.is_empty() {
            return Ok(());
        }
        if data.len() as u64 % COPY_ALIGNMENT == 0 {
            self.queue.write_buffer(&buf.buffer, 0, data);
        } else {
            let mut padded = data.to_vec();
            padded.resize(align_up(data.len() as u64, COPY_ALIGNMENT) as usize, 0);
            self.queue.write_buffer(&buf.buffer, 0, &padded);
        }
        Ok(())
    }

    fn buffer_size(&self, buffer: BufferHandle) -> Option<u64> {
        self.buffers.get(&buffer.0).map(|b| b.len)
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buf) = self.buffers.remove(&buffer.0) {
            buf.buffer.destroy();
        }
    }

    fn create_program(&mut self, desc: &ProgramDescriptor) -> BackendResult<ProgramHandle> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: desc.label.as_deref(),
                source: wgpu::ShaderSource::Wgsl(desc.source.as_str().into()),
            });

        let uniform_layout = NonZeroU64::new(desc.uniform_size).map(|size| {
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: desc.label.as_deref(),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: true,
                            min_binding_size: Some(size),
                        },
                        count: None,
                    }],
                })
        });

        let layouts: Vec<&wgpu::BindGroupLayout> = uniform_layout.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: desc.label.as_deref(),
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(BackendError::PipelineCreationFailed(error.to_string()));
        }

        let id = self.next_program_id;
        self.next_program_id += 1;
        self.programs.insert(
            id,
            Program {
                module,
                label: desc.label.clone(),
                uniform_layout,
                pipeline_layout,
                uniform_size: desc.uniform_size,
            },
        );

        Ok(ProgramHandle(id))
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program.0);
        self.pipelines.retain(|key, _| key.program != program);
        self.uniform_bind_groups.remove(&program);
    }

    fn use_program(&mut self, program: ProgramHandle, uniforms: &[u8]) -> BackendResult<()> {
        let uniform_size = self
            .programs
            .get(&program.0)
            .ok_or(BackendError::UnknownProgram(program))?
            .uniform_size;
        let alignment = self.uniform_alignment;
        let frame = self.frame.as_mut().ok_or(BackendError::NoActiveFrame)?;

        let uniform_offset = if uniform_size > 0 {
            let offset = align_up(frame.uniforms.len() as u64, alignment) as usize;
            frame.uniforms.resize(offset, 0);
            let take = uniforms.len().min(uniform_size as usize);
            frame.uniforms.extend_from_slice(&uniforms[..take]);
            frame.uniforms.resize(offset + uniform_size as usize, 0);
            Some(offset as u32)
        } else {
            None
        };

        frame.current_program = Some(program);
        frame.commands.push(RenderCommand::UseProgram {
            program,
            uniform_offset,
        });
        Ok(())
    }

    fn draw(
        &mut self,
        input: &VertexInput,
        topology: PrimitiveTopology,
        vertices: Range<u32>,
    ) -> BackendResult<()> {
        self.push_draw(input, topology, DrawRange::Vertices(vertices))
    }

    fn draw_indexed(
        &mut self,
        input: &VertexInput,
        topology: PrimitiveTopology,
        indices: Range<u32>,
    ) -> BackendResult<()> {
        self.push_draw(input, topology, DrawRange::Indices(indices))
    }
}
