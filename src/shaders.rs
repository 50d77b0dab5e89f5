//! WGSL sources for the galaxy kernels, the star renderer and the compositor.
//!
//! Kernel bodies are plugged into the template of
//! [`KernelSpec::to_wgsl`](crate::gpu::kernel::KernelSpec::to_wgsl); the
//! render shader gets the same `Params` struct so both stages agree on the
//! uniform layout.

use crate::gpu::kernel::{Field, KernelSpec, Stage};
use crate::params::ParamBlock;

/// Functions shared by the galaxy kernels.
///
/// Forces are softened by `SOFTENING` so no division ever reaches zero, and
/// the total acceleration is clamped to `MAX_ACCELERATION`.
const FORCE_HELPERS: &str = r#"
const SOFTENING: f32 = 0.5;
const INTERACTION_SAMPLES: u32 = 16u;
const MAX_ACCELERATION: f32 = 1.0e6;

fn hash(value: u32) -> u32 {
    let state = value * 747796405u + 2891336453u;
    let word = ((state >> ((state >> 28u) + 4u)) ^ state) * 277803737u;
    return (word >> 22u) ^ word;
}

fn cell_of(i: u32, side: u32) -> vec2<i32> {
    return vec2<i32>(i32(i % side), i32(i / side));
}

fn attractor_pull(p: vec3<f32>) -> vec3<f32> {
    return -p / (dot(p, p) + SOFTENING * SOFTENING);
}

fn softened_pull(self_pos: vec3<f32>, other_pos: vec3<f32>) -> vec3<f32> {
    let d = other_pos - self_pos;
    let r2 = dot(d, d) + SOFTENING * SOFTENING;
    return d * inverseSqrt(r2 * r2 * r2);
}

// Mean pull of a fixed, hashed subset of the other stars.
fn sampled_interaction(p: vec3<f32>, index: u32, side: u32) -> vec3<f32> {
    let count = u32(params.particle_count);
    if count < 3u {
        return vec3<f32>(0.0);
    }

    var sum = vec3<f32>(0.0);
    var seed = index;
    for (var k = 0u; k < INTERACTION_SAMPLES; k = k + 1u) {
        seed = hash(seed + k);
        let other = 1u + seed % (count - 1u);
        if other == index {
            continue;
        }
        let q = textureLoad(position, cell_of(other, side), 0).xyz;
        sum += softened_pull(p, q);
    }
    return sum / f32(INTERACTION_SAMPLES);
}

fn clamp_length(v: vec3<f32>, max_length: f32) -> vec3<f32> {
    let len2 = dot(v, v);
    if len2 > max_length * max_length {
        return v * (max_length * inverseSqrt(len2));
    }
    return v;
}
"#;

/// Velocity update: committed position and velocity in, fresh velocity out.
pub fn velocity_kernel() -> KernelSpec {
    KernelSpec::new("Velocity Update", Field::Velocity)
        .reads(Field::Position, Stage::Committed)
        .reads(Field::Velocity, Stage::Committed)
        .helpers(FORCE_HELPERS)
        .body(
            r#"    if index == 0u {
        result = vec4<f32>(0.0);
    } else {
        let p = textureLoad(position, cell, 0).xyz;
        let v = textureLoad(velocity, cell, 0).xyz;

        var acceleration = attractor_pull(p) * params.black_hole_force;
        acceleration += sampled_interaction(p, index, dims.x) * params.interaction_rate;
        acceleration = clamp_length(acceleration * params.gravity, MAX_ACCELERATION);

        result = vec4<f32>(v + acceleration * params.time_step, 0.0);
    }"#,
        )
}

/// Position update: explicit Euler with the velocity of this step.
pub fn position_kernel() -> KernelSpec {
    KernelSpec::new("Position Update", Field::Position)
        .reads(Field::Position, Stage::Committed)
        .reads(Field::Velocity, Stage::Fresh)
        .body(
            r#"    if index == 0u {
        result = vec4<f32>(0.0);
    } else {
        let p = textureLoad(position, cell, 0);
        let v = textureLoad(velocity_next, cell, 0).xyz;
        result = vec4<f32>(p.xyz + v * params.time_step, p.w);
    }"#,
        )
}

/// Both galaxy kernels, in no particular order.
pub fn galaxy_kernels() -> Vec<KernelSpec> {
    vec![position_kernel(), velocity_kernel()]
}

/// Instanced star sprites, one quad per particle.
pub fn projector_shader(params: &ParamBlock) -> String {
    let params_struct = params.to_wgsl_struct("Params");

    format!(
        r#"{params_struct}

struct Camera {{
    view_proj: mat4x4<f32>,
    viewport: vec2<f32>,
    camera_constant: f32,
    star_size: f32,
}};

@group(0) @binding(0)
var<uniform> camera: Camera;
@group(0) @binding(1)
var<uniform> params: Params;
@group(0) @binding(2)
var position: texture_2d<f32>;
@group(0) @binding(3)
var velocity: texture_2d<f32>;
@group(0) @binding(4)
var velocity_previous: texture_2d<f32>;

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
}};

fn star_color(heat: f32) -> vec3<f32> {{
    let cool = vec3<f32>(0.35, 0.55, 1.0);
    let warm = vec3<f32>(1.0, 0.55, 0.2);
    let hot = vec3<f32>(1.0, 0.95, 0.85);
    if heat < 0.5 {{
        return mix(cool, warm, heat * 2.0);
    }}
    return mix(warm, hot, heat * 2.0 - 1.0);
}}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @builtin(instance_index) instance_index: u32,
) -> VertexOutput {{
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let quad_pos = quad_vertices[vertex_index];

    let side = textureDimensions(position).x;
    let cell = vec2<i32>(i32(instance_index % side), i32(instance_index / side));
    let p = textureLoad(position, cell, 0).xyz;

    // Acceleration proxy: velocity change over the last step.
    let dv = textureLoad(velocity, cell, 0).xyz - textureLoad(velocity_previous, cell, 0).xyz;
    var acceleration: f32 = 0.0;
    if params.time_step > 0.0 {{
        acceleration = length(dv) / params.time_step;
    }}
    let heat = clamp(acceleration / max(params.max_acceleration_color, 1e-6), 0.0, 1.0);

    var clip_pos = camera.view_proj * vec4<f32>(p, 1.0);
    // Half-size in pixels, converted to clip space (NDC spans 2 / viewport per pixel).
    let half_size_px = clamp(camera.star_size * camera.camera_constant / max(clip_pos.w, 1e-4), 0.5, 32.0);
    clip_pos.x += quad_pos.x * half_size_px * 2.0 / camera.viewport.x * clip_pos.w;
    clip_pos.y += quad_pos.y * half_size_px * 2.0 / camera.viewport.y * clip_pos.w;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.color = star_color(heat) * params.luminosity;
    out.uv = quad_pos;
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let dist = length(in.uv);
    if dist > 1.0 {{
        discard;
    }}
    let falloff = 1.0 - smoothstep(0.0, 1.0, dist);
    return vec4<f32>(in.color * falloff, falloff);
}}
"#
    )
}

const FULLSCREEN_VERTEX: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );

    var out: VertexOutput;
    out.clip_position = vec4<f32>(positions[vertex_index], 0.0, 1.0);
    return out;
}
"#;

/// `opacity * mix(scene, saved, mix_ratio)`, per pixel.
pub fn blend_shader() -> String {
    format!(
        r#"{FULLSCREEN_VERTEX}
struct BlendParams {{
    mix_ratio: f32,
    opacity: f32,
    pad0: f32,
    pad1: f32,
}};

@group(0) @binding(0)
var scene: texture_2d<f32>;
@group(0) @binding(1)
var saved: texture_2d<f32>;
@group(0) @binding(2)
var<uniform> blend_params: BlendParams;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let pixel = vec2<i32>(in.clip_position.xy);
    let fresh = textureLoad(scene, pixel, 0);
    let previous = textureLoad(saved, pixel, 0);
    return blend_params.opacity * mix(fresh, previous, blend_params.mix_ratio);
}}
"#
    )
}

/// Plain copy of a texture onto the output surface.
pub fn blit_shader() -> String {
    format!(
        r#"{FULLSCREEN_VERTEX}
@group(0) @binding(0)
var frame: texture_2d<f32>;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    return textureLoad(frame, vec2<i32>(in.clip_position.xy), 0);
}}
"#
    )
}
