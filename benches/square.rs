use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use oclgpu::{Arg, Const, DeviceSelector, DeviceType, HostArg, Platform, Program};
use rand::Rng;

const SQUARE: &str = r#"
__kernel void square(__global const float* in, const unsigned int count, __global float* out) {
    int i = get_global_id(0);
    if (i < count) out[i] = in[i] * in[i];
}
"#;

fn device_available() -> bool {
    Platform::all()
        .ok()
        .and_then(|platforms| platforms.into_iter().next())
        .and_then(|platform| platform.devices(DeviceType::All).ok())
        .map_or(false, |devices| !devices.is_empty())
}

fn bench_square(c: &mut Criterion) {
    if !device_available() {
        eprintln!("OpenCL недоступен, бенчмарк пропущен");
        return;
    }
    let selector = DeviceSelector::from_env().unwrap_or_default();
    let mut rng = rand::thread_rng();

    let mut group = c.benchmark_group("square");
    for length in [1 << 10, 1 << 16, 1 << 20] {
        let input: Vec<f32> = (0..length).map(|_| rng.gen_range(0.0..1.0)).collect();

        group.bench_with_input(BenchmarkId::new("oneshot", length), &input, |b, input| {
            b.iter(|| {
                oclgpu::execute(
                    SQUARE,
                    "square",
                    &selector,
                    &[HostArg::from(input), HostArg::from(input.len() as u32)],
                )
                .unwrap()
            })
        });

        let program = Program::new(SQUARE, "square", &selector).unwrap();
        let buffer = program.buffer_from_f32_slice(&input).unwrap();
        let out = program.empty_f32(length).unwrap();
        group.bench_function(BenchmarkId::new("program", length), |b| {
            b.iter(|| {
                program
                    .execute(
                        &[length],
                        &[Arg::from(&buffer), Arg::from(Const::new(length)), Arg::from(&out)],
                    )
                    .unwrap();
                black_box(out.read_f32_vec().unwrap())
            })
        });

        group.bench_with_input(BenchmarkId::new("cpu", length), &input, |b, input| {
            b.iter(|| black_box(input.iter().map(|x| x * x).collect::<Vec<f32>>()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_square);
criterion_main!(benches);
