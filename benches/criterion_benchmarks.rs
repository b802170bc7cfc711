use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use deltafuzz::synth::{
    BasePattern, MixStrategy, generate_original_sized, mix_with, mutate_global, mutate_local,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

const SIZES: [usize; 3] = [64 * 1024, 1024 * 1024, 4 * 1024 * 1024];

fn bench_base_patterns(c: &mut Criterion) {
    let mut g = c.benchmark_group("base_pattern_mb_s");
    let size = 1024 * 1024;
    g.throughput(Throughput::Bytes(size as u64));
    for (name, pattern) in [
        ("constant", BasePattern::Constant(0)),
        ("ramp", BasePattern::Ramp),
        ("periodic", BasePattern::Periodic { period: 3000 }),
        ("random", BasePattern::Random),
    ] {
        let mut rng = StdRng::seed_from_u64(1);
        g.bench_function(name, |b| {
            b.iter(|| black_box(pattern.render(&mut rng, size)));
        });
    }
    g.finish();
}

fn bench_mix(c: &mut Criterion) {
    let mut g = c.benchmark_group("mix_strategy");
    let size = 1024 * 1024;
    let a = BasePattern::Ramp.render(&mut StdRng::seed_from_u64(2), size);
    let b_buf = BasePattern::Random.render(&mut StdRng::seed_from_u64(3), size);
    g.throughput(Throughput::Bytes(size as u64));
    for (name, strategy) in [
        ("splice", MixStrategy::Splice { at: size / 3 }),
        (
            "window_swap",
            MixStrategy::WindowSwap {
                start: size / 4,
                end: size / 2,
            },
        ),
        ("xor", MixStrategy::Xor),
        ("interleave", MixStrategy::Interleave { log_max: 12 }),
    ] {
        let mut rng = StdRng::seed_from_u64(4);
        g.bench_function(name, |b| {
            b.iter(|| {
                let out = mix_with(&mut rng, strategy, a.clone(), black_box(&b_buf)).unwrap();
                black_box(out);
            });
        });
    }
    g.finish();
}

fn bench_original_generation(c: &mut Criterion) {
    let mut g = c.benchmark_group("generate_original");
    for size in SIZES {
        let mut rng = StdRng::seed_from_u64(5);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| black_box(generate_original_sized(&mut rng, size)));
        });
    }
    g.finish();
}

fn bench_mutations(c: &mut Criterion) {
    let mut g = c.benchmark_group("mutations");
    for size in SIZES {
        let original = generate_original_sized(&mut StdRng::seed_from_u64(6), size);
        let mut rng = StdRng::seed_from_u64(7);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::new("global", size), &size, |b, _| {
            b.iter(|| black_box(mutate_global(&mut rng, original.clone())));
        });
        g.bench_with_input(BenchmarkId::new("local", size), &size, |b, _| {
            b.iter(|| black_box(mutate_local(&mut rng, original.clone())));
        });
    }
    g.finish();
}

criterion_group!(
    benches,
    bench_base_patterns,
    bench_mix,
    bench_original_generation,
    bench_mutations
);
criterion_main!(benches);
