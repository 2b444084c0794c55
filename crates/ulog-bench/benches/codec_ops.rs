//! Criterion micro-benchmarks for the header and body codecs.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use ulog_bench::{mixed_workload, BASE_TIMESTAMP};
use ulog_core::{Command, PayloadShape};
use ulog_replay::codec::{decode_body, decode_header};
use ulog_replay::LogFileReader;
use ulog_test_utils::fixtures;

/// Benchmark: decode one 17-byte header.
fn bench_decode_header(c: &mut Criterion) {
    let bytes = fixtures::encode_header(BASE_TIMESTAMP, 1, 7, 128);

    c.bench_function("codec_decode_header", |b| {
        b.iter(|| {
            let mut cursor = bytes.as_slice();
            let header = decode_header(&mut cursor).unwrap().unwrap();
            black_box(header);
        });
    });
}

/// Benchmark: decode a put body with a 16-byte key and 256-byte value.
fn bench_decode_kv_body(c: &mut Criterion) {
    let body = fixtures::kv_body(Command::Put, &[b'k'; 16], &[0xAB; 256]);

    c.bench_function("codec_decode_kv_body", |b| {
        b.iter(|| {
            let decoded = decode_body(&body, PayloadShape::KeyValue).unwrap();
            black_box(decoded);
        });
    });
}

/// Benchmark: decode a putlist body with 32 arguments.
fn bench_decode_misc_body(c: &mut Criterion) {
    let args: Vec<Vec<u8>> = (0..32).map(|i| format!("arg-{i:04}").into_bytes()).collect();
    let refs: Vec<&[u8]> = args.iter().map(Vec::as_slice).collect();
    let body = fixtures::misc_body(b"putlist", &refs);

    c.bench_function("codec_decode_misc_body", |b| {
        b.iter(|| {
            let decoded = decode_body(&body, PayloadShape::Misc).unwrap();
            black_box(decoded);
        });
    });
}

/// Benchmark: walk 10K headers, skipping every body.
fn bench_file_headers_10k(c: &mut Criterion) {
    let log = mixed_workload(42, 10_000, BASE_TIMESTAMP);

    c.bench_function("file_headers_10k", |b| {
        b.iter(|| {
            let n = LogFileReader::new(log.as_slice())
                .headers()
                .map(Result::unwrap)
                .count();
            black_box(n);
        });
    });
}

/// Benchmark: fully decode 10K records.
fn bench_file_records_10k(c: &mut Criterion) {
    let log = mixed_workload(42, 10_000, BASE_TIMESTAMP);

    c.bench_function("file_records_10k", |b| {
        b.iter(|| {
            for record in LogFileReader::new(log.as_slice()).records() {
                black_box(record.unwrap());
            }
        });
    });
}

criterion_group!(
    benches,
    bench_decode_header,
    bench_decode_kv_body,
    bench_decode_misc_body,
    bench_file_headers_10k,
    bench_file_records_10k
);
criterion_main!(benches);
