//! GPU program lifecycle for one visualiser layer.
//!
//! A `GpuCanvas` owns a pipeline, a CPU-side copy of its uniform block, one
//! vertex buffer per attribute and the layer texture it draws into. Compile and
//! link failures are logged and recorded, never returned: a canvas without a
//! linked program only clears its layer.

use std::collections::BTreeMap;
use std::ops::Range;

use tracing::{debug, error, warn};
use wgpu::util::DeviceExt;

use super::shader::{reflect_program, validate_wgsl, ProgramLayout, UniformInfo};
use super::surface::{LayoutSize, Surface};
use super::{GpuDevice, LayerTexture, RenderError, Result, LAYER_FORMAT};
use crate::audio::AudioAnalysisMetadata;

/// Result of compiling one shader stage
pub struct CompiledShader {
    label: String,
    stage: naga::ShaderStage,
    module: Option<wgpu::ShaderModule>,
    ir: Option<naga::Module>,
    info_log: String,
}

impl CompiledShader {
    pub fn compile_status(&self) -> bool {
        self.module.is_some()
    }

    /// Compiler diagnostics (empty on success)
    pub fn info_log(&self) -> &str {
        &self.info_log
    }

    pub fn stage(&self) -> naga::ShaderStage {
        self.stage
    }
}

/// Fixed-function state of a program
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub topology: wgpu::PrimitiveTopology,
    pub blend: Option<wgpu::BlendState>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            topology: wgpu::PrimitiveTopology::TriangleList,
            blend: None,
        }
    }
}

/// Expected update frequency of an attribute buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Written once
    Static,
    /// Rewritten in place when the length is unchanged
    Dynamic,
}

/// One non-indexed draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub vertices: Range<u32>,
    pub instances: Range<u32>,
}

impl DrawCall {
    pub fn new(vertices: Range<u32>) -> Self {
        Self {
            vertices,
            instances: 0..1,
        }
    }

    pub fn instanced(vertices: Range<u32>, instances: Range<u32>) -> Self {
        Self {
            vertices,
            instances,
        }
    }
}

struct AttributeBuffer {
    buffer: wgpu::Buffer,
    usage: BufferUsage,
    byte_len: u64,
}

struct Program {
    pipeline: wgpu::RenderPipeline,
    layout: ProgramLayout,
    /// (buffer, bind group) when the program has a uniform block
    uniforms: Option<(wgpu::Buffer, wgpu::BindGroup)>,
    /// Staged uniform block, flushed before every draw
    uniform_data: Vec<u8>,
    /// Vertex buffers keyed by shader location
    attributes: BTreeMap<u32, AttributeBuffer>,
}

/// GPU drawing context of one layer
pub struct GpuCanvas {
    gpu: GpuDevice,
    label: String,
    surface: Surface,
    layer: LayerTexture,
    viewport: (u32, u32),
    clear_color: wgpu::Color,
    program: Option<Program>,
    program_info_log: String,
}

impl GpuCanvas {
    pub fn new(
        gpu: GpuDevice,
        label: &str,
        layout: LayoutSize,
        metadata: AudioAnalysisMetadata,
    ) -> Self {
        let surface = Surface::new(layout, metadata);
        let layer = LayerTexture::new(&gpu.device, label, surface.size());
        let viewport = surface.size();

        Self {
            gpu,
            label: label.to_string(),
            surface,
            layer,
            viewport,
            clear_color: wgpu::Color::TRANSPARENT,
            program: None,
            program_info_log: String::new(),
        }
    }

    pub fn gpu(&self) -> &GpuDevice {
        &self.gpu
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn layer(&self) -> &LayerTexture {
        &self.layer
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    /// Resize the surface, then the viewport and layer texture. Returns true if
    /// the pixel size changed.
    pub fn resize(&mut self, size: Option<(u32, u32)>) -> bool {
        let changed = self.surface.resize(size);
        self.viewport = self.surface.size();
        if self.layer.size() != self.viewport {
            self.layer = LayerTexture::new(&self.gpu.device, &self.label, self.viewport);
        }
        changed
    }

    /// Validate and create a shader module. Failures are logged and recorded.
    pub fn compile_shader(
        &self,
        stage: naga::ShaderStage,
        label: &str,
        source: &str,
    ) -> CompiledShader {
        let mut compiled = CompiledShader {
            label: label.to_string(),
            stage,
            module: None,
            ir: None,
            info_log: String::new(),
        };

        let ir = match validate_wgsl(source) {
            Ok(ir) => ir,
            Err(log) => {
                error!("Error compiling {:?} shader {}: {}", stage, label, log);
                compiled.info_log = log;
                return compiled;
            }
        };

        if !ir.entry_points.iter().any(|ep| ep.stage == stage) {
            let log = format!("no {:?} entry point", stage);
            error!("Error compiling {:?} shader {}: {}", stage, label, log);
            compiled.info_log = log;
            return compiled;
        }

        let device = &self.gpu.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            let log = err.to_string();
            error!("Error compiling {:?} shader {}: {}", stage, label, log);
            compiled.info_log = log;
            return compiled;
        }

        debug!("Compiled {:?} shader {}", stage, label);
        compiled.module = Some(module);
        compiled.ir = Some(ir);
        compiled
    }

    /// Build the pipeline and cache attribute and uniform locations.
    ///
    /// Returns the link status. On failure the previous program is dropped.
    pub fn link_program(
        &mut self,
        vertex: &CompiledShader,
        fragment: &CompiledShader,
        options: &PipelineOptions,
    ) -> bool {
        self.program = None;
        self.program_info_log.clear();

        let (Some(vs_module), Some(vs_ir), Some(fs_module), Some(fs_ir)) = (
            &vertex.module,
            &vertex.ir,
            &fragment.module,
            &fragment.ir,
        ) else {
            self.program_info_log = format!(
                "cannot link {} with {}: shader not compiled",
                vertex.label, fragment.label
            );
            error!("Error linking program {}: {}", self.label, self.program_info_log);
            return false;
        };

        let layout = reflect_program(vs_ir, fs_ir);
        let device = &self.gpu.device;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let attributes: Vec<_> = layout
            .sorted_attributes()
            .into_iter()
            .map(|(_, info)| info)
            .collect();
        let vertex_attributes: Vec<[wgpu::VertexAttribute; 1]> = attributes
            .iter()
            .map(|info| {
                [wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: info.location,
                    format: float_format(info.components),
                }]
            })
            .collect();
        let buffer_layouts: Vec<wgpu::VertexBufferLayout> = attributes
            .iter()
            .zip(&vertex_attributes)
            .map(|(info, attribute)| wgpu::VertexBufferLayout {
                array_stride: (info.components as usize * std::mem::size_of::<f32>())
                    as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attribute,
            })
            .collect();

        let uniform_size = layout.uniform_block_size.div_ceil(16) * 16;
        let bind_group_layout = (uniform_size > 0).then(|| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            })
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> =
            bind_group_layout.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(self.label.as_str()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: vs_module,
                entry_point: Some("vs_main"),
                buffers: &buffer_layouts,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: fs_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: LAYER_FORMAT,
                    blend: options.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: options.topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let uniforms = bind_group_layout.as_ref().map(|bind_group_layout| {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Uniform Buffer"),
                size: uniform_size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Uniform Bind Group"),
                layout: bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            (buffer, bind_group)
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            self.program_info_log = err.to_string();
            error!("Error linking program {}: {}", self.label, self.program_info_log);
            return false;
        }

        debug!(
            "Linked program {}: {} attributes, {} uniforms, {} byte block",
            self.label,
            layout.attributes.len(),
            layout.uniforms.len(),
            uniform_size
        );

        self.program = Some(Program {
            pipeline,
            layout,
            uniforms,
            uniform_data: vec![0; uniform_size as usize],
            attributes: BTreeMap::new(),
        });
        true
    }

    pub fn link_status(&self) -> bool {
        self.program.is_some()
    }

    pub fn program_info_log(&self) -> &str {
        &self.program_info_log
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.program
            .as_ref()
            .and_then(|p| p.layout.attributes.get(name))
            .map(|info| info.location)
    }

    pub fn uniform_location(&self, name: &str) -> Option<UniformInfo> {
        self.program
            .as_ref()
            .and_then(|p| p.layout.uniforms.get(name))
            .copied()
    }

    /// Upload `data` as the vertex buffer of attribute `name` (`item_size` floats per vertex)
    pub fn upload_float_attribute(
        &mut self,
        data: &[f32],
        usage: BufferUsage,
        name: &str,
        item_size: u32,
    ) -> Result<()> {
        let Some(program) = self.program.as_mut() else {
            debug!("{}: no linked program, skipping attribute {}", self.label, name);
            return Ok(());
        };

        let info = program
            .layout
            .attributes
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::UnknownAttribute(name.to_string()))?;
        if info.components != item_size {
            return Err(RenderError::AttributeSize {
                name: name.to_string(),
                expected: info.components,
                actual: item_size,
            });
        }

        let bytes: &[u8] = bytemuck::cast_slice(data);
        if let Some(existing) = program.attributes.get(&info.location) {
            if existing.usage == BufferUsage::Dynamic && existing.byte_len == bytes.len() as u64 {
                self.gpu.queue.write_buffer(&existing.buffer, 0, bytes);
                return Ok(());
            }
        }

        let buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(name),
                contents: bytes,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        program.attributes.insert(
            info.location,
            AttributeBuffer {
                buffer,
                usage,
                byte_len: bytes.len() as u64,
            },
        );
        Ok(())
    }

    /// Stage a scalar or vector uniform. Unknown names are ignored with a warning.
    pub fn set_uniform(&mut self, name: &str, values: &[f32]) {
        let Some((program, info)) = self.uniform_slot(name) else {
            return;
        };
        let bytes: &[u8] = bytemuck::cast_slice(values);
        let len = bytes.len().min(info.size as usize);
        let offset = info.offset as usize;
        program.uniform_data[offset..offset + len].copy_from_slice(&bytes[..len]);
    }

    /// Stage an array uniform, `components` floats per element.
    ///
    /// Elements beyond the declared array length are dropped.
    pub fn set_uniform_array(&mut self, name: &str, values: &[f32], components: usize) {
        let Some((program, info)) = self.uniform_slot(name) else {
            return;
        };
        let stride = if info.stride > 0 {
            info.stride as usize
        } else {
            info.size as usize
        };
        let element_len = (components * std::mem::size_of::<f32>()).min(stride);

        for (i, element) in values
            .chunks(components.max(1))
            .take(info.count as usize)
            .enumerate()
        {
            let bytes: &[u8] = bytemuck::cast_slice(element);
            let len = bytes.len().min(element_len);
            let offset = info.offset as usize + i * stride;
            program.uniform_data[offset..offset + len].copy_from_slice(&bytes[..len]);
        }
    }

    /// Read back the staged floats of a uniform
    pub fn uniform_values(&self, name: &str) -> Option<Vec<f32>> {
        let program = self.program.as_ref()?;
        let info = program.layout.uniforms.get(name)?;
        let start = info.offset as usize;
        let bytes = &program.uniform_data[start..start + info.size as usize];
        Some(
            bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        )
    }

    fn uniform_slot(&mut self, name: &str) -> Option<(&mut Program, UniformInfo)> {
        let program = self.program.as_mut()?;
        match program.layout.uniforms.get(name).copied() {
            Some(info) => Some((program, info)),
            None => {
                warn!("{}: unknown uniform {}", self.label, name);
                None
            }
        }
    }

    /// Clear the layer, then issue `calls` with the linked program
    pub fn draw(&mut self, calls: &[DrawCall]) {
        let device = &self.gpu.device;
        let queue = &self.gpu.queue;

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Layer Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(self.label.as_str()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.layer.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(program) = &self.program {
                let missing: Vec<&str> = program
                    .layout
                    .sorted_attributes()
                    .into_iter()
                    .filter(|(_, info)| !program.attributes.contains_key(&info.location))
                    .map(|(name, _)| name)
                    .collect();

                if missing.is_empty() {
                    let (width, height) = self.viewport;
                    render_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
                    render_pass.set_pipeline(&program.pipeline);
                    if let Some((buffer, bind_group)) = &program.uniforms {
                        queue.write_buffer(buffer, 0, &program.uniform_data);
                        render_pass.set_bind_group(0, bind_group, &[]);
                    }
                    for (slot, attribute) in program.attributes.values().enumerate() {
                        render_pass.set_vertex_buffer(slot as u32, attribute.buffer.slice(..));
                    }
                    for call in calls {
                        render_pass.draw(call.vertices.clone(), call.instances.clone());
                    }
                } else {
                    warn!("{}: attributes without buffers: {:?}", self.label, missing);
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn float_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}
