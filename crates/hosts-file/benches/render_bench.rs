//! Managed block renderer benchmark
//!
//! Measures `render` over typical hosts files and table sizes.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hostsync_core::domain::DomainRules;
use hostsync_core::table::{HostSnapshot, HostTable};
use hostsync_hosts_file::block::{BEGIN_MARKER, END_MARKER, render};

fn snapshot(containers: usize) -> HostSnapshot {
    let mut table = HostTable::new(DomainRules::new("", ".docker"));
    for i in 0..containers {
        let id = format!("{i:064x}");
        let name = format!("service-{i}");
        let project = format!("project-{}", i % 7);
        table.upsert(
            &id,
            "bridge",
            &format!("172.17.{}.{}", i / 250, i % 250 + 2),
            [Some(name.as_str()), Some(project.as_str())],
        );
        if i % 3 == 0 {
            table.upsert(
                &id,
                "backend",
                &format!("10.10.{}.{}", i / 250, i % 250 + 2),
                [Some(name.as_str())],
            );
        }
    }
    table.snapshot()
}

fn existing_file(foreign_lines: usize, with_block: bool) -> Vec<String> {
    let mut lines: Vec<String> = (0..foreign_lines)
        .map(|i| format!("192.168.{}.{} host-{i}.lan", i / 250, i % 250))
        .collect();
    if with_block {
        lines.push(BEGIN_MARKER.to_owned());
        lines.extend((0..50).map(|i| format!("172.17.0.{i}\tstale-{i}.docker")));
        lines.push(END_MARKER.to_owned());
    }
    lines
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for containers in [1usize, 10, 100, 1000] {
        let snap = snapshot(containers);
        let existing = existing_file(20, true);
        group.throughput(Throughput::Elements(containers as u64));
        group.bench_with_input(
            BenchmarkId::new("replace_block", containers),
            &snap,
            |b, snap| b.iter(|| render(black_box(&existing), black_box(snap))),
        );
    }

    let snap = snapshot(50);
    let fresh = existing_file(20, false);
    group.throughput(Throughput::Elements(50));
    group.bench_function("append_block", |b| {
        b.iter(|| render(black_box(&fresh), black_box(&snap)))
    });

    let large = existing_file(5000, true);
    group.bench_function("large_foreign_file", |b| {
        b.iter(|| render(black_box(&large), black_box(&snap)))
    });

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
