//! Synthetic update-log workloads for benchmarking.
//!
//! - [`mixed_workload`]: one file's worth of records with a realistic
//!   command mix, generated from a seed
//! - [`write_workload_dir`]: the same, split across rotated files on disk

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use ulog_core::Command;
use ulog_test_utils::fixtures::{write_log_dir, LogBuilder};

/// Timestamp of the first generated record, in microseconds.
pub const BASE_TIMESTAMP: u64 = 1_500_000_000_000_000;

/// Distinct keys drawn from by the generator.
pub const KEY_SPACE: u32 = 1_000;

/// Generate `n` records starting at `first_ts`, one millisecond apart.
///
/// The mix is roughly 60% put, 10% each putkeep, putcat and out, 5%
/// putlist, and 5% addint. Values are 8 to 255 random bytes.
pub fn mixed_workload(seed: u64, n: usize, first_ts: u64) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut log = LogBuilder::new();
    for i in 0..n {
        let ts = first_ts + i as u64 * 1_000;
        let key = random_key(&mut rng);
        let value = random_value(&mut rng);
        log = match rng.random_range(0..100u32) {
            0..60 => log.put(ts, &key, &value),
            60..70 => log.put_keep(ts, &key, &value),
            70..80 => log.put_cat(ts, &key, &value),
            80..90 => log.out(ts, &key),
            90..95 => {
                let other_key = random_key(&mut rng);
                let other_value = random_value(&mut rng);
                log.putlist(
                    ts,
                    &[
                        (key.as_slice(), value.as_slice()),
                        (other_key.as_slice(), other_value.as_slice()),
                    ],
                )
            }
            _ => log.opaque(ts, Command::AddInt, &rng.random::<[u8; 4]>()),
        };
    }
    log.into_bytes()
}

/// Write `files` rotated log files of `per_file` records each into `dir`.
///
/// Sequence numbers start at 1 and timestamps continue across files.
pub fn write_workload_dir(dir: &Path, seed: u64, files: u64, per_file: usize) -> Vec<PathBuf> {
    let logs: Vec<(u64, Vec<u8>)> = (0..files)
        .map(|f| {
            let first_ts = BASE_TIMESTAMP + f * per_file as u64 * 1_000;
            (f + 1, mixed_workload(seed ^ f, per_file, first_ts))
        })
        .collect();
    write_log_dir(dir, &logs)
}

fn random_key(rng: &mut ChaCha8Rng) -> Vec<u8> {
    format!("key:{:04}", rng.random_range(0..KEY_SPACE)).into_bytes()
}

fn random_value(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let len = rng.random_range(8..256usize);
    let mut value = vec![0u8; len];
    rng.fill(value.as_mut_slice());
    value
}
