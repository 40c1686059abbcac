use canonical::{normalize_number_words, segment, SegmentConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn bench_segment(c: &mut Criterion) {
    let config = SegmentConfig::default();
    let mut group = c.benchmark_group("segment");

    for clauses in [1usize, 8, 64].iter() {
        let text = vec!["two cheeseburgers no pickles"; *clauses].join(" also ");
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_function(format!("clauses_{clauses}"), |b| {
            b.iter(|| {
                let normalized = normalize_number_words(black_box(&text));
                segment(black_box(&normalized), black_box(&config))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_segment);
criterion_main!(benches);
