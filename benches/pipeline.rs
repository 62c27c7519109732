//! Whole-stream throughput through the multi-threaded contexts.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use turbosqueeze::{Compressor, Decompressor, BLOCK_SZ};

const STREAM_SIZE: usize = 16 * BLOCK_SZ; // 4 MiB

fn bench_pipeline(c: &mut Criterion) {
    let data = turbosqueeze::lorem::generate(0xF00D, STREAM_SIZE);

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.sample_size(20);

    for workers in [1usize, 2, 4] {
        let comp = Compressor::with_workers(workers, false).unwrap();
        group.bench_with_input(
            BenchmarkId::new("compress", workers),
            &data,
            |b, data| b.iter(|| comp.compress_buffer(data, true, 0).unwrap()),
        );
    }

    let comp = Compressor::with_workers(2, false).unwrap();
    let packed = comp.compress_buffer(&data, true, 0).unwrap();
    for workers in [1usize, 2, 4] {
        let dec = Decompressor::with_workers(workers, false).unwrap();
        group.bench_with_input(
            BenchmarkId::new("decompress", workers),
            &packed,
            |b, packed| b.iter(|| dec.decompress_buffer(packed).unwrap()),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
