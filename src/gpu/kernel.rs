//! Grid kernels and their dependency scheduling.
//!
//! A kernel reads any number of particle fields and writes exactly one. Each
//! input is either the *committed* value of a field (the front slot, result of
//! the previous step) or its *fresh* value (the back slot, written earlier in
//! the current step by another kernel). [`schedule`] orders kernels so every
//! fresh input is produced before it is read, and rejects graphs that would
//! read and write the same texture in one dispatch.

use std::fmt;

use crate::params::ParamBlock;

use super::state_store::ParticleStateStore;

/// Storage format of every particle field.
pub const GRID_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
/// Kernel workgroups are `WORKGROUP_SIZE x WORKGROUP_SIZE` cells.
pub const WORKGROUP_SIZE: u32 = 8;

/// A particle field stored in the state store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Position,
    Velocity,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::Position, Field::Velocity];

    pub fn name(self) -> &'static str {
        match self {
            Field::Position => "position",
            Field::Velocity => "velocity",
        }
    }
}

/// Which slot of a field a kernel reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Value committed by the previous step.
    Committed,
    /// Value produced earlier in the current step.
    Fresh,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelInput {
    pub field: Field,
    pub stage: Stage,
}

impl KernelInput {
    /// Name of the texture binding in the generated WGSL.
    pub fn binding_name(&self) -> String {
        match self.stage {
            Stage::Committed => self.field.name().to_string(),
            Stage::Fresh => format!("{}_next", self.field.name()),
        }
    }
}

/// Declarative description of one kernel.
///
/// The body runs once per grid cell with `cell: vec2<i32>`, `index: u32` and
/// `dims: vec2<u32>` in scope and must assign `result: vec4<f32>`.
#[derive(Clone, Debug)]
pub struct KernelSpec {
    pub name: &'static str,
    pub output: Field,
    pub inputs: Vec<KernelInput>,
    pub helpers: String,
    pub body: String,
}

impl KernelSpec {
    pub fn new(name: &'static str, output: Field) -> Self {
        Self {
            name,
            output,
            inputs: Vec::new(),
            helpers: String::new(),
            body: String::new(),
        }
    }

    pub fn reads(mut self, field: Field, stage: Stage) -> Self {
        self.inputs.push(KernelInput { field, stage });
        self
    }

    pub fn helpers(mut self, code: impl Into<String>) -> Self {
        self.helpers = code.into();
        self
    }

    pub fn body(mut self, code: impl Into<String>) -> Self {
        self.body = code.into();
        self
    }

    /// Fields whose fresh value this kernel consumes.
    fn fresh_dependencies(&self) -> impl Iterator<Item = Field> + '_ {
        self.inputs
            .iter()
            .filter(|input| input.stage == Stage::Fresh)
            .map(|input| input.field)
    }

    /// Complete compute shader for this kernel.
    pub fn to_wgsl(&self, params: &ParamBlock) -> String {
        let params_struct = params.to_wgsl_struct("Params");

        let input_bindings: String = self
            .inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                format!(
                    "@group(0) @binding({})\nvar {}: texture_2d<f32>;\n",
                    i + 1,
                    input.binding_name()
                )
            })
            .collect();
        let output_binding = self.inputs.len() + 1;
        let helpers = &self.helpers;
        let body = &self.body;

        format!(
            r#"{params_struct}

@group(0) @binding(0)
var<uniform> params: Params;

{input_bindings}
@group(0) @binding({output_binding})
var output: texture_storage_2d<rgba32float, write>;

{helpers}

@compute @workgroup_size({WORKGROUP_SIZE}, {WORKGROUP_SIZE})
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let dims = textureDimensions(output);
    if global_id.x >= dims.x || global_id.y >= dims.y {{
        return;
    }}

    let cell = vec2<i32>(global_id.xy);
    let index = global_id.y * dims.x + global_id.x;
    var result = vec4<f32>(0.0);

{body}

    textureStore(output, cell, result);
}}
"#
        )
    }
}

/// Reasons a kernel set cannot be scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelGraphError {
    /// More than one kernel writes the field.
    DuplicateProducer(Field),
    /// No kernel writes the field, so its slots would fall out of step.
    MissingProducer(Field),
    /// The kernel reads the fresh slot of the field it writes.
    SelfAlias(&'static str),
    /// Fresh reads form a cycle between these kernels.
    Cycle(Vec<&'static str>),
}

impl fmt::Display for KernelGraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelGraphError::DuplicateProducer(field) => {
                write!(f, "field '{}' is written by more than one kernel", field.name())
            }
            KernelGraphError::MissingProducer(field) => {
                write!(f, "no kernel writes field '{}'", field.name())
            }
            KernelGraphError::SelfAlias(name) => write!(
                f,
                "kernel '{}' reads the texture it writes in the same dispatch",
                name
            ),
            KernelGraphError::Cycle(names) => {
                write!(f, "kernels {} depend on each other's fresh output", names.join(", "))
            }
        }
    }
}

impl std::error::Error for KernelGraphError {}

/// Order kernels so each runs after the producers of its fresh inputs.
///
/// Kernels without mutual dependencies keep their relative input order.
pub fn schedule(kernels: Vec<KernelSpec>) -> Result<Vec<KernelSpec>, KernelGraphError> {
    for field in Field::ALL {
        match kernels.iter().filter(|k| k.output == field).count() {
            0 => return Err(KernelGraphError::MissingProducer(field)),
            1 => {}
            _ => return Err(KernelGraphError::DuplicateProducer(field)),
        }
    }

    if let Some(kernel) = kernels
        .iter()
        .find(|k| k.fresh_dependencies().any(|field| field == k.output))
    {
        return Err(KernelGraphError::SelfAlias(kernel.name));
    }

    let mut pending = kernels;
    let mut ordered: Vec<KernelSpec> = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let ready = pending.iter().position(|kernel| {
            kernel
                .fresh_dependencies()
                .all(|field| ordered.iter().any(|done| done.output == field))
        });

        match ready {
            Some(i) => ordered.push(pending.remove(i)),
            None => {
                return Err(KernelGraphError::Cycle(
                    pending.iter().map(|k| k.name).collect(),
                ))
            }
        }
    }

    Ok(ordered)
}

/// A compiled kernel with one bind group per ping-pong parity.
pub struct GridKernel {
    name: &'static str,
    pipeline: wgpu::ComputePipeline,
    bind_groups: [wgpu::BindGroup; 2],
    workgroups: u32,
}

impl GridKernel {
    pub fn new(
        device: &wgpu::Device,
        spec: &KernelSpec,
        params: &ParamBlock,
        params_buffer: &wgpu::Buffer,
        store: &ParticleStateStore,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(spec.name),
            source: wgpu::ShaderSource::Wgsl(spec.to_wgsl(params).into()),
        });

        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        for i in 0..spec.inputs.len() {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: (i + 1) as u32,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }
        let output_binding = (spec.inputs.len() + 1) as u32;
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: output_binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: GRID_FORMAT,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} Bind Group Layout", spec.name)),
            entries: &entries,
        });

        // Parity p: committed reads come from slot p, fresh reads and the
        // output go to slot 1 - p.
        let bind_groups = [0usize, 1].map(|parity| {
            let mut entries = vec![wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }];
            for (i, input) in spec.inputs.iter().enumerate() {
                let slot = match input.stage {
                    Stage::Committed => parity,
                    Stage::Fresh => 1 - parity,
                };
                entries.push(wgpu::BindGroupEntry {
                    binding: (i + 1) as u32,
                    resource: wgpu::BindingResource::TextureView(
                        &store.field(input.field).slot(slot).view,
                    ),
                });
            }
            entries.push(wgpu::BindGroupEntry {
                binding: output_binding,
                resource: wgpu::BindingResource::TextureView(
                    &store.field(spec.output).slot(1 - parity).view,
                ),
            });

            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{} Bind Group {}", spec.name, parity)),
                layout: &layout,
                entries: &entries,
            })
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", spec.name)),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(spec.name),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            name: spec.name,
            pipeline,
            bind_groups,
            workgroups: store.side().div_ceil(WORKGROUP_SIZE),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Record one dispatch over the whole grid in its own compute pass.
    pub fn dispatch(&self, encoder: &mut wgpu::CommandEncoder, parity: usize) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(self.name),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_groups[parity], &[]);
        pass.dispatch_workgroups(self.workgroups, self.workgroups, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn velocity() -> KernelSpec {
        KernelSpec::new("velocity", Field::Velocity)
            .reads(Field::Position, Stage::Committed)
            .reads(Field::Velocity, Stage::Committed)
    }

    fn position() -> KernelSpec {
        KernelSpec::new("position", Field::Position)
            .reads(Field::Position, Stage::Committed)
            .reads(Field::Velocity, Stage::Fresh)
    }

    fn names(kernels: &[KernelSpec]) -> Vec<&'static str> {
        kernels.iter().map(|k| k.name).collect()
    }

    #[test]
    fn test_fresh_reads_run_after_producer() {
        let ordered = schedule(vec![position(), velocity()]).unwrap();
        assert_eq!(names(&ordered), ["velocity", "position"]);

        let ordered = schedule(vec![velocity(), position()]).unwrap();
        assert_eq!(names(&ordered), ["velocity", "position"]);
    }

    #[test]
    fn test_self_alias_rejected() {
        let bad = KernelSpec::new("velocity", Field::Velocity).reads(Field::Velocity, Stage::Fresh);
        assert_eq!(
            schedule(vec![bad, position()]).unwrap_err(),
            KernelGraphError::SelfAlias("velocity")
        );
    }

    #[test]
    fn test_missing_and_duplicate_producers() {
        assert_eq!(
            schedule(vec![velocity()]).unwrap_err(),
            KernelGraphError::MissingProducer(Field::Position)
        );
        assert_eq!(
            schedule(vec![velocity(), velocity(), position()]).unwrap_err(),
            KernelGraphError::DuplicateProducer(Field::Velocity)
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let v = KernelSpec::new("v", Field::Velocity).reads(Field::Position, Stage::Fresh);
        let p = KernelSpec::new("p", Field::Position).reads(Field::Velocity, Stage::Fresh);
        assert_eq!(
            schedule(vec![v, p]).unwrap_err(),
            KernelGraphError::Cycle(vec!["v", "p"])
        );
    }

    #[test]
    fn test_binding_names() {
        let spec = position();
        assert_eq!(spec.inputs[0].binding_name(), "position");
        assert_eq!(spec.inputs[1].binding_name(), "velocity_next");

        let wgsl = spec.body("result = vec4<f32>(1.0);").to_wgsl(&ParamBlock::new());
        assert!(wgsl.contains("@group(0) @binding(2)\nvar velocity_next: texture_2d<f32>;"));
        assert!(wgsl.contains("@group(0) @binding(3)\nvar output: texture_storage_2d<rgba32float, write>;"));
    }
}
