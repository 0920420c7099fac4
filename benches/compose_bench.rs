//! Character composition benchmarks
//!
//! Measures the encoder alone (embedding lookup, convolutions, highway,
//! projection) over batches of pre-encoded words.
//!
//! Run with: cargo bench --bench compose_bench
//! With parallel: cargo bench --bench compose_bench --features parallel

use charembed::model::{init::ParamInit, CharacterConvolutionEncoder};
use charembed::{CharCode, EmbedderConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;

fn bench_config() -> EmbedderConfig {
    EmbedderConfig::new(&[(1, 32), (2, 32), (3, 64), (4, 128), (5, 256)], 16, 256, 2)
}

/// Deterministic rows with a spread of word lengths
fn create_test_codes(words: usize, max_char_len: usize) -> Array2<CharCode> {
    Array2::from_shape_fn((words, max_char_len), |(i, j)| {
        let len = 3 + i % 12;
        if j < len {
            (1 + (i * 31 + j * 7) % 255) as CharCode
        } else {
            0
        }
    })
}

fn bench_compose_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose_batch");
    let config = bench_config();
    let encoder = CharacterConvolutionEncoder::new(&config, &mut ParamInit::seeded(0)).unwrap();

    for words in [1, 32, 256, 1024] {
        let codes = create_test_codes(words, config.max_char_len);
        group.throughput(Throughput::Elements(words as u64));
        group.bench_with_input(BenchmarkId::from_parameter(words), &codes, |b, codes| {
            b.iter(|| black_box(encoder.compose(codes.view()).unwrap()))
        });
    }

    group.finish();
}

fn bench_compose_max_char_len(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose_max_char_len");

    for max_char_len in [8, 16, 32, 50] {
        let config = bench_config().with_max_char_len(max_char_len);
        let encoder = CharacterConvolutionEncoder::new(&config, &mut ParamInit::seeded(0)).unwrap();
        let codes = create_test_codes(256, max_char_len);

        group.bench_with_input(BenchmarkId::from_parameter(max_char_len), &codes, |b, codes| {
            b.iter(|| black_box(encoder.compose(codes.view()).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compose_batch, bench_compose_max_char_len);
criterion_main!(benches);
