//! Benchmarks for galaxy generation and shader generation.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use galaxy_gpu::config::{GalaxyParams, LiveParams};
use galaxy_gpu::galaxy;
use galaxy_gpu::gpu::kernel::schedule;
use galaxy_gpu::params::ParamBlock;
use galaxy_gpu::shaders;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("galaxy_generate");
    group.sample_size(20);

    for count in [1_000u32, 100_000, 1_000_000] {
        let params = GalaxyParams {
            particle_count: count,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(count), &params, |b, params| {
            b.iter(|| black_box(galaxy::generate(params, 42)))
        });
    }

    group.finish();
}

fn bench_shader_generation(c: &mut Criterion) {
    let params = ParamBlock::from_live(&LiveParams::default(), 100_000);
    let mut group = c.benchmark_group("shader_gen");

    group.bench_function("schedule_kernels", |b| {
        b.iter(|| black_box(schedule(shaders::galaxy_kernels())))
    });

    group.bench_function("kernel_wgsl", |b| {
        let kernels = shaders::galaxy_kernels();
        b.iter(|| {
            for kernel in &kernels {
                black_box(kernel.to_wgsl(&params));
            }
        })
    });

    group.bench_function("projector_wgsl", |b| {
        b.iter(|| black_box(shaders::projector_shader(&params)))
    });

    group.bench_function("param_bytes", |b| b.iter(|| black_box(params.to_bytes())));

    group.finish();
}

criterion_group!(benches, bench_generate, bench_shader_generation);
criterion_main!(benches);
