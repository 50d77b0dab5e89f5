//! Motion-blur compositing.
//!
//! Every frame the freshly rendered scene is blended with the previous
//! composite and the result is kept for the next frame:
//!
//! ```text
//! saved' = opacity * mix(scene, saved, mix_ratio)
//! ```
//!
//! The composite is then copied onto the output target. With the default
//! ratio of 0.5 a star that stops moving fades out geometrically behind its
//! new position.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::config::MotionBlurParams;
use crate::ping_pong::PingPong;
use crate::shaders;

use super::RenderTexture;

/// Format of the scene and history textures.
pub const SCENE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct BlendUniform {
    mix_ratio: f32,
    opacity: f32,
    _pad: [f32; 2],
}

impl BlendUniform {
    fn new(mix_ratio: f32) -> Self {
        Self {
            mix_ratio,
            opacity: 1.0,
            _pad: [0.0; 2],
        }
    }
}

/// Scene target, saved frames and the two fullscreen passes.
pub struct MotionBlurCompositor {
    width: u32,
    height: u32,
    mix_ratio: f32,
    scene: RenderTexture,
    history: PingPong<RenderTexture>,
    blend_layout: wgpu::BindGroupLayout,
    blend_pipeline: wgpu::RenderPipeline,
    /// Indexed by the history front slot.
    blend_bind_groups: [wgpu::BindGroup; 2],
    blit_layout: wgpu::BindGroupLayout,
    blit_pipeline: wgpu::RenderPipeline,
    /// Indexed by the history slot being shown.
    blit_bind_groups: [wgpu::BindGroup; 2],
    params_buffer: wgpu::Buffer,
}

impl MotionBlurCompositor {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        target_format: wgpu::TextureFormat,
        settings: &MotionBlurParams,
    ) -> Self {
        let mix_ratio = settings.effective_mix_ratio();
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Blend Params Buffer"),
            contents: bytemuck::bytes_of(&BlendUniform::new(mix_ratio)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let blend_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blend Bind Group Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blit Bind Group Layout"),
            entries: &[texture_entry(0)],
        });

        let blend_pipeline = fullscreen_pipeline(
            device,
            "Blend",
            &shaders::blend_shader(),
            &blend_layout,
            SCENE_FORMAT,
        );
        let blit_pipeline = fullscreen_pipeline(
            device,
            "Blit",
            &shaders::blit_shader(),
            &blit_layout,
            target_format,
        );

        let (scene, history) = create_targets(device, width, height);
        let blend_bind_groups =
            create_blend_bind_groups(device, &blend_layout, &scene, &history, &params_buffer);
        let blit_bind_groups = create_blit_bind_groups(device, &blit_layout, &history);

        Self {
            width: width.max(1),
            height: height.max(1),
            mix_ratio,
            scene,
            history,
            blend_layout,
            blend_pipeline,
            blend_bind_groups,
            blit_layout,
            blit_pipeline,
            blit_bind_groups,
            params_buffer,
        }
    }

    /// Recreate the scene and history textures. The trail restarts from black.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if (width, height) == (self.width, self.height) {
            return;
        }

        self.destroy_targets();
        let (scene, history) = create_targets(device, width, height);
        self.blend_bind_groups = create_blend_bind_groups(
            device,
            &self.blend_layout,
            &scene,
            &history,
            &self.params_buffer,
        );
        self.blit_bind_groups = create_blit_bind_groups(device, &self.blit_layout, &history);
        self.scene = scene;
        self.history = history;
        self.width = width;
        self.height = height;
    }

    /// Change the weight of the saved frame. Clamped to `[0, 1]`.
    pub fn set_mix_ratio(&mut self, queue: &wgpu::Queue, mix_ratio: f32) {
        self.mix_ratio = mix_ratio.clamp(0.0, 1.0);
        queue.write_buffer(
            &self.params_buffer,
            0,
            bytemuck::bytes_of(&BlendUniform::new(self.mix_ratio)),
        );
    }

    pub fn mix_ratio(&self) -> f32 {
        self.mix_ratio
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Render target for the current frame's scene.
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.scene.view
    }

    /// Clear the scene target, for frames with nothing to draw.
    pub fn clear_scene(&self, encoder: &mut wgpu::CommandEncoder, color: wgpu::Color) {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.scene.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }

    /// Blend the scene into the history and copy the result to `target`.
    pub fn composite(&mut self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let front = self.history.front_index();
        let back = 1 - front;

        fullscreen_pass(
            encoder,
            "Blend Pass",
            &self.history.back().view,
            &self.blend_pipeline,
            &self.blend_bind_groups[front],
        );
        fullscreen_pass(
            encoder,
            "Blit Pass",
            target,
            &self.blit_pipeline,
            &self.blit_bind_groups[back],
        );

        self.history.swap();
    }

    fn destroy_targets(&self) {
        self.scene.texture.destroy();
        for slot in self.history.iter() {
            slot.texture.destroy();
        }
    }
}

impl Drop for MotionBlurCompositor {
    fn drop(&mut self) {
        self.destroy_targets();
        self.params_buffer.destroy();
    }
}

fn create_targets(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (RenderTexture, PingPong<RenderTexture>) {
    let scene = RenderTexture::new(device, "Scene Texture", width, height, SCENE_FORMAT);
    let history = PingPong::new(
        RenderTexture::new(device, "Saved Frame A", width, height, SCENE_FORMAT),
        RenderTexture::new(device, "Saved Frame B", width, height, SCENE_FORMAT),
    );
    (scene, history)
}

fn create_blend_bind_groups(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    scene: &RenderTexture,
    history: &PingPong<RenderTexture>,
    params_buffer: &wgpu::Buffer,
) -> [wgpu::BindGroup; 2] {
    [0usize, 1].map(|front| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Blend Bind Group {}", front)),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&scene.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&history.slot(front).view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        })
    })
}

fn create_blit_bind_groups(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    history: &PingPong<RenderTexture>,
) -> [wgpu::BindGroup; 2] {
    [0usize, 1].map(|slot| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Blit Bind Group {}", slot)),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&history.slot(slot).view),
            }],
        })
    })
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    name: &str,
    source: &str,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{} Shader", name)),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{} Pipeline Layout", name)),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{} Pipeline", name)),
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
                format,
                blend: None,
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
        multiview: None,
        cache: None,
    })
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
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
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}
