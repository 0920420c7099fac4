//! End-to-end embedder benchmarks
//!
//! Token ids in, word vectors out: table gather, special-token masks and
//! composition together.
//!
//! Run with: cargo bench --bench embed_bench

use charembed::{CharacterTokenEmbedder, Dictionary, EmbedderConfig, EmbedderInput, Vocabulary};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;

fn create_dictionary(size: usize) -> Dictionary {
    Dictionary::from_words((0..size).map(|i| format!("word{}x{}", i, "y".repeat(i % 9))))
}

fn bench_embed_tokens(c: &mut Criterion) {
    let mut group = c.benchmark_group("embed_tokens");
    let config = EmbedderConfig::new(&[(1, 32), (2, 32), (3, 64), (4, 128)], 16, 256, 2);
    let dict = create_dictionary(10_000);
    let vocab_size = dict.len();
    let embedder = CharacterTokenEmbedder::new(dict, &config).unwrap();

    for (batch, seq) in [(1, 16), (8, 64), (32, 128)] {
        // every 13th position is eos, every 17th pad
        let ids = Array2::from_shape_fn((batch, seq), |(b, s)| {
            let k = b * seq + s;
            if k % 17 == 0 {
                0
            } else if k % 13 == 0 {
                1
            } else {
                (3 + (k * 7919) % (vocab_size - 3)) as u32
            }
        });

        group.throughput(Throughput::Elements((batch * seq) as u64));
        group.bench_with_input(
            BenchmarkId::new("batch_x_seq", format!("{}x{}", batch, seq)),
            &ids,
            |b, ids| b.iter(|| black_box(embedder.embed(EmbedderInput::Tokens(ids.view())).unwrap())),
        );
    }

    group.finish();
}

fn bench_set_vocab(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_vocab");
    let config = EmbedderConfig::new(&[(1, 8), (2, 8)], 8, 16, 0);
    let embedder = CharacterTokenEmbedder::new(Dictionary::new(), &config).unwrap();

    for size in [1_000, 50_000] {
        let dict = create_dictionary(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &dict, |b, dict| {
            b.iter(|| black_box(embedder.set_vocab(dict.clone(), 50).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_embed_tokens, bench_set_vocab);
criterion_main!(benches);
