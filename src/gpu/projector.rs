//! Star renderer: one additive, camera-facing sprite per particle.
//!
//! Positions and velocities are read straight from the state store, so no
//! vertex buffers are involved. The color of each star comes from the change
//! between the committed velocity and the one before it.

use crate::camera::{Camera, CameraUniform, Viewport};
use crate::params::ParamBlock;
use crate::shaders;

use super::kernel::Field;
use super::state_store::ParticleStateStore;

/// Vertices per star sprite (two triangles).
const QUAD_VERTICES: u32 = 6;

/// GPU resources for drawing the particle grid.
pub struct RenderProjector {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    /// Indexed by the store's front slot.
    bind_groups: [wgpu::BindGroup; 2],
    particle_count: u32,
}

impl RenderProjector {
    pub fn new(
        device: &wgpu::Device,
        store: &ParticleStateStore,
        params: &ParamBlock,
        params_buffer: &wgpu::Buffer,
        target_format: wgpu::TextureFormat,
        particle_count: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Star Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::projector_shader(params).into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniform Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Star Bind Group Layout"),
            entries: &[
                uniform_entry(0),
                uniform_entry(1),
                texture_entry(2),
                texture_entry(3),
                texture_entry(4),
            ],
        });

        let position = store.field(Field::Position);
        let velocity = store.field(Field::Velocity);
        let bind_groups = [0usize, 1].map(|front| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("Star Bind Group {}", front)),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: camera_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: params_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&position.slot(front).view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&velocity.slot(front).view),
                    },
                    // The back slot still holds the velocity before the last step.
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(
                            &velocity.slot(1 - front).view,
                        ),
                    },
                ],
            })
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Star Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let additive = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Star Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState {
                        color: additive,
                        alpha: additive,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            camera_buffer,
            bind_groups,
            particle_count,
        }
    }

    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &Camera, viewport: Viewport) {
        let uniform = camera.uniform(viewport);
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Clear `target` to black and draw every star on top.
    ///
    /// `front` must be the store's current front slot.
    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView, front: usize) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Star Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_groups[front], &[]);
        pass.draw(0..QUAD_VERTICES, 0..self.particle_count);
    }

    pub fn destroy(&self) {
        self.camera_buffer.destroy();
    }
}
