//! Parse and validate every generated WGSL shader with naga.
//!
//! These run without a GPU, so shader regressions show up even on machines
//! where the headless pipeline tests are skipped.

use galaxy_gpu::config::LiveParams;
use galaxy_gpu::gpu::kernel::schedule;
use galaxy_gpu::params::ParamBlock;
use galaxy_gpu::shaders;
use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};

fn validate(name: &str, source: &str) -> naga::Module {
    let module = match wgsl::parse_str(source) {
        Ok(module) => module,
        Err(e) => panic!("{} failed to parse:\n{}", name, e.emit_to_string(source)),
    };
    if let Err(e) = Validator::new(ValidationFlags::all(), Capabilities::all()).validate(&module) {
        panic!("{} failed validation: {:?}\n{}", name, e, source);
    }
    module
}

fn params() -> ParamBlock {
    ParamBlock::from_live(&LiveParams::default(), 1000)
}

fn entry_points(module: &naga::Module) -> Vec<(naga::ShaderStage, String)> {
    module
        .entry_points
        .iter()
        .map(|ep| (ep.stage, ep.name.clone()))
        .collect()
}

#[test]
fn test_galaxy_kernels_validate() {
    let params = params();
    for kernel in schedule(shaders::galaxy_kernels()).unwrap() {
        let module = validate(kernel.name, &kernel.to_wgsl(&params));
        assert_eq!(
            entry_points(&module),
            [(naga::ShaderStage::Compute, "main".to_string())]
        );
    }
}

#[test]
fn test_kernel_bindings_are_contiguous() {
    let params = params();
    for kernel in shaders::galaxy_kernels() {
        let module = validate(kernel.name, &kernel.to_wgsl(&params));
        let mut bindings: Vec<u32> = module
            .global_variables
            .iter()
            .filter_map(|(_, var)| var.binding.as_ref())
            .map(|b| {
                assert_eq!(b.group, 0);
                b.binding
            })
            .collect();
        bindings.sort_unstable();
        let expected: Vec<u32> = (0..=kernel.inputs.len() as u32 + 1).collect();
        assert_eq!(bindings, expected, "{}", kernel.name);
    }
}

#[test]
fn test_projector_shader_validates() {
    let source = shaders::projector_shader(&params());
    let module = validate("projector", &source);
    let stages: Vec<_> = entry_points(&module).into_iter().map(|(s, _)| s).collect();
    assert!(stages.contains(&naga::ShaderStage::Vertex));
    assert!(stages.contains(&naga::ShaderStage::Fragment));
}

#[test]
fn test_compositor_shaders_validate() {
    validate("blend", &shaders::blend_shader());
    validate("blit", &shaders::blit_shader());
}

#[test]
fn test_shaders_follow_param_layout() {
    // A block with an extra trailing uniform must still produce valid code.
    let mut params = params();
    params.set("spare", 0.0);
    for kernel in shaders::galaxy_kernels() {
        validate(kernel.name, &kernel.to_wgsl(&params));
    }
    validate("projector", &shaders::projector_shader(&params));
}
