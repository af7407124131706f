#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput};
use wirepack::Layout;
use wirepack_benchmark::{Order, sample_order};

#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

const FILL_COUNTS: [usize; 3] = [0, 16, 1024];

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for fills in FILL_COUNTS {
        let order = sample_order(fills);
        let size = wirepack::serialized_size(&order).unwrap();
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("serialize", fills), &order, |b, order| {
            b.iter(|| wirepack::serialize(black_box(order)).unwrap());
        });

        let mut out = vec![0; size];
        group.bench_with_input(BenchmarkId::new("serialize_to", fills), &order, |b, order| {
            b.iter(|| wirepack::serialize_to(black_box(order), &mut out).unwrap());
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for fills in FILL_COUNTS {
        let bytes = wirepack::serialize(&sample_order(fills)).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("deserialize", fills), &bytes, |b, bytes| {
            b.iter(|| wirepack::deserialize::<Order>(black_box(bytes)).unwrap());
        });

        let mut order = sample_order(0);
        group.bench_with_input(
            BenchmarkId::new("deserialize_into", fills),
            &bytes,
            |b, bytes| {
                b.iter(|| wirepack::deserialize_into(black_box(bytes), &mut order).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_partial(c: &mut Criterion) {
    let mut group = c.benchmark_group("partial");
    let bytes = wirepack::serialize(&sample_order(1024)).unwrap();

    // fixed offset, no walking
    group.bench_function("leading_fixed_field", |b| {
        b.iter(|| wirepack::get_field::<Order, f64>(black_box(&bytes), "price").unwrap());
    });

    group.bench_function("compatible_field", |b| {
        b.iter(|| {
            wirepack::get_field::<Order, String>(black_box(&bytes), "venue").unwrap()
        });
    });

    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    c.bench_function("cached_layout", |b| {
        b.iter(|| Layout::of::<Order>().unwrap());
    });
}

criterion::criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_partial,
    bench_layout
);
criterion::criterion_main!(benches);
