//! Criterion benchmarks for directory traversal and replay.

use std::hint::black_box;
use std::ops::ControlFlow;

use criterion::{criterion_group, criterion_main, Criterion};
use ulog_bench::write_workload_dir;
use ulog_core::ReplayHandler;
use ulog_replay::{replay, LogDirectory, ReaderConfig};

/// Counts calls and bytes without storing anything.
#[derive(Default)]
struct CountingHandler {
    calls: u64,
    bytes: u64,
}

impl CountingHandler {
    fn see(&mut self, n: usize) -> ControlFlow<()> {
        self.calls += 1;
        self.bytes += n as u64;
        ControlFlow::Continue(())
    }
}

impl ReplayHandler for CountingHandler {
    fn put(&mut self, key: &[u8], value: &[u8]) -> ControlFlow<()> {
        self.see(key.len() + value.len())
    }
    fn put_keep(&mut self, key: &[u8], value: &[u8]) -> ControlFlow<()> {
        self.see(key.len() + value.len())
    }
    fn put_cat(&mut self, key: &[u8], value: &[u8]) -> ControlFlow<()> {
        self.see(key.len() + value.len())
    }
    fn put_shl(&mut self, payload: &[u8]) -> ControlFlow<()> {
        self.see(payload.len())
    }
    fn put_nr(&mut self, key: &[u8], value: &[u8]) -> ControlFlow<()> {
        self.see(key.len() + value.len())
    }
    fn out(&mut self, key: &[u8]) -> ControlFlow<()> {
        self.see(key.len())
    }
    fn add_int(&mut self, payload: &[u8]) -> ControlFlow<()> {
        self.see(payload.len())
    }
    fn add_double(&mut self, payload: &[u8]) -> ControlFlow<()> {
        self.see(payload.len())
    }
    fn ext(&mut self, payload: &[u8]) -> ControlFlow<()> {
        self.see(payload.len())
    }
    fn vanish(&mut self, payload: &[u8]) -> ControlFlow<()> {
        self.see(payload.len())
    }
    fn misc(&mut self, name: &[u8], args: &[Vec<u8>]) -> ControlFlow<()> {
        self.see(name.len() + args.iter().map(Vec::len).sum::<usize>())
    }
    fn misc_putlist(&mut self, pairs: &[(&[u8], &[u8])]) -> ControlFlow<()> {
        self.see(pairs.iter().map(|(k, v)| k.len() + v.len()).sum())
    }
}

/// Benchmark: scan an 8-file directory and replay 8K records.
fn bench_replay_directory_8x1k(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    write_workload_dir(dir.path(), 42, 8, 1_000);
    let config = ReaderConfig::default();

    c.bench_function("replay_directory_8x1k", |b| {
        b.iter(|| {
            let logs = LogDirectory::open(dir.path(), &config).unwrap();
            let mut handler = CountingHandler::default();
            let stats = replay(&mut logs.reader(), &mut handler).unwrap();
            black_box((stats, handler.calls, handler.bytes));
        });
    });
}

/// Benchmark: scan a 256-file directory without reading any file.
fn bench_scan_directory_256(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    write_workload_dir(dir.path(), 7, 256, 1);
    let config = ReaderConfig::default();

    c.bench_function("scan_directory_256", |b| {
        b.iter(|| {
            let logs = LogDirectory::open(dir.path(), &config).unwrap();
            black_box(logs.run().len());
        });
    });
}

criterion_group!(
    benches,
    bench_replay_directory_8x1k,
    bench_scan_directory_256
);
criterion_main!(benches);
