//! Performance benchmarks for rsws-deflate.
//!
//! Run with: `cargo bench`

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use rsws_deflate::protocol::mask::{apply_mask, apply_mask_fast};
use rsws_deflate::{
    ContextConfig, DeflateConfig, Deflater, FlateDeflater, Frame, FrameStage, MessageDecompressor,
    OpCode, PerMessageDeflate, Role,
};

/// JSON-ish text, the typical permessage-deflate workload.
fn text_payload(size: usize) -> Vec<u8> {
    let record = br#"{"event":"trade","symbol":"ETH-USD","price":3187.42,"qty":0.25},"#;
    record.iter().copied().cycle().take(size).collect()
}

// =============================================================================
// Compression Benchmarks
// =============================================================================

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");

    for (name, size) in [("1kb", 1024), ("64kb", 64 * 1024), ("1mb", 1024 * 1024)] {
        let payload = text_payload(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(format!("takeover_{}", name), |b| {
            let mut deflater = FlateDeflater::new(ContextConfig::default());
            b.iter(|| deflater.compress(black_box(&payload), true).unwrap())
        });

        group.bench_function(format!("no_takeover_{}", name), |b| {
            let mut deflater =
                FlateDeflater::new(ContextConfig::default().no_context_takeover(true));
            b.iter(|| deflater.compress(black_box(&payload), true).unwrap())
        });
    }

    group.finish();
}

// =============================================================================
// Decompression Benchmarks
// =============================================================================

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");
    let config = ContextConfig::default().no_context_takeover(true);

    for (name, size) in [("1kb", 1024), ("64kb", 64 * 1024), ("1mb", 1024 * 1024)] {
        let compressed = FlateDeflater::new(config)
            .compress(&text_payload(size), true)
            .unwrap();
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(name, |b| {
            let mut stage = MessageDecompressor::new(config, false);
            b.iter(|| {
                let frame = Frame::new(true, OpCode::Binary, compressed.clone()).with_rsv1(true);
                stage.process(black_box(frame)).unwrap()
            })
        });
    }

    group.finish();
}

// =============================================================================
// Pipeline Benchmarks
// =============================================================================

fn bench_fragmented_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let payload = text_payload(64 * 1024);
    let chunks: Vec<Vec<u8>> = payload.chunks(4096).map(<[u8]>::to_vec).collect();
    group.throughput(Throughput::Bytes(payload.len() as u64));

    group.bench_function("fragmented_64kb_roundtrip", |b| {
        let config = DeflateConfig::default();
        let mut client = PerMessageDeflate::new(Role::Client, &config);
        let mut server = PerMessageDeflate::new(Role::Server, &config);
        let last = chunks.len() - 1;

        b.iter(|| {
            let mut sent = None;
            for (i, chunk) in chunks.iter().enumerate() {
                let frame = if i == 0 {
                    Frame::new(false, OpCode::Text, chunk.clone())
                } else {
                    Frame::continuation(i == last, chunk.clone())
                };
                sent = client.encode(frame).unwrap();
            }
            sent.map(|frame| server.decode(frame).unwrap())
        })
    });

    group.finish();
}

// =============================================================================
// Masking Benchmarks
// =============================================================================

fn bench_masking(c: &mut Criterion) {
    let mut group = c.benchmark_group("masking");
    let mask = [0x37, 0xfa, 0x21, 0x3d];

    for size in [64usize, 1024, 64 * 1024] {
        let mut data = vec![0xABu8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(format!("scalar_{}", size), |b| {
            b.iter(|| apply_mask(black_box(&mut data), mask))
        });

        group.bench_function(format!("fast_{}", size), |b| {
            b.iter(|| apply_mask_fast(black_box(&mut data), mask))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compress,
    bench_decompress,
    bench_fragmented_pipeline,
    bench_masking
);
criterion_main!(benches);
