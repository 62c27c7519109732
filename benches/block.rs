//! Single-block encode/decode throughput.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use turbosqueeze::block::{decode_block, Encoder, BLOCK_SZ, DECODE_PAD, OUTPUT_SZ};

fn corpus() -> Vec<u8> {
    turbosqueeze::lorem::generate(0xBEEF, BLOCK_SZ)
}

fn bench_encode(c: &mut Criterion) {
    let data = corpus();
    let mut group = c.benchmark_group("encode_block");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for level in [0u8, 1, 2, 6] {
        for ext in [false, true] {
            let mut enc = Encoder::with_level(level).unwrap();
            let mut out = vec![0u8; OUTPUT_SZ];
            group.bench_with_input(
                BenchmarkId::from_parameter(format!("level{}_ext{}", level, ext as u8)),
                &data,
                |b, data| b.iter(|| enc.encode_block(data, &mut out, ext)),
            );
        }
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let data = corpus();
    let mut group = c.benchmark_group("decode_block");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for ext in [false, true] {
        let mut enc = Encoder::new();
        let mut comp = vec![0u8; OUTPUT_SZ];
        let n = enc.encode_block(&data, &mut comp, ext);
        let comp = comp[..n].to_vec();
        let mut out = vec![0u8; BLOCK_SZ + DECODE_PAD];
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("ext{}", ext as u8)),
            &comp,
            |b, comp| b.iter(|| decode_block(comp, &mut out, ext)),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
