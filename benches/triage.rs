//! Performance benchmarks for cloudsec-monitor
//!
//! Run with: cargo bench

use cloudsec_monitor::{DualSink, KeywordSet, SinkEntry};
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_keyword_match(c: &mut Criterion) {
    let set = KeywordSet::default();
    let miss = "Jan 12 10:15:01 host CRON[2211]: (root) CMD (run-parts /etc/cron.hourly)";
    let hit = "Jan 12 10:15:03 host sshd[2301]: Failed password for invalid user admin";
    let long_miss = "a".repeat(4096);

    c.bench_function("KeywordSet::matches miss", |b| {
        b.iter(|| set.matches(miss));
    });

    c.bench_function("KeywordSet::matches hit", |b| {
        b.iter(|| set.matches(hit));
    });

    c.bench_function("KeywordSet::matches 4KiB miss", |b| {
        b.iter(|| set.matches(&long_miss));
    });
}

fn bench_entry_format(c: &mut Criterion) {
    c.bench_function("SinkEntry format", |b| {
        b.iter(|| SinkEntry::tagged("auth", "session opened for user root").to_string());
    });
}

fn bench_append(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let sink = DualSink::new(dir.path().join("full.log"), dir.path().join("alert.log"));

    c.bench_function("DualSink::append_full", |b| {
        b.to_async(&rt)
            .iter(|| async { sink.append_full("syslog", "kernel: eth0 link up").await.unwrap() });
    });
}

criterion_group!(benches, bench_keyword_match, bench_entry_format, bench_append);
criterion_main!(benches);
