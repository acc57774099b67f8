//! Criterion benchmarks for the ingestion hot path.
//!
//! Every batch advances every registered signal, so cost grows with the number of
//! registered signals and the window length, not with the batch size.
//!
//! Run with: cargo bench --bench ingest

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use remote_plot::data::{AxisSpec, Batch, Ingestor, Registry, RingBuffer, SignalSpec};
use std::num::NonZeroUsize;

fn registry_with(axes: i32, signals_per_axis: i32, samples: i64) -> Registry {
    let mut registry = Registry::default();
    for axis in 0..axes {
        registry.add_axis(AxisSpec {
            id: axis,
            samples,
            title: format!("Axis {axis}"),
            x_label: String::new(),
            y_label: String::new(),
        });
        for s in 0..signals_per_axis {
            let _ = registry.add_signal(SignalSpec {
                axis_id: axis,
                signal_id: axis * 100 + s,
                name: String::new(),
                color: None,
            });
        }
    }
    registry
}

/// Full batches (every signal present) against growing registries.
fn ingest_full_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest_full_batch");

    for (axes, per_axis) in [(1, 3), (2, 3), (8, 8)] {
        let mut registry = registry_with(axes, per_axis, 300);
        let batch: Batch = registry.signals().map(|s| (s.id, 1.0)).collect();
        let mut ingestor = Ingestor::new();
        let signals = registry.signal_count();

        group.throughput(Throughput::Elements(signals as u64));
        group.bench_with_input(BenchmarkId::new("signals", signals), &batch, |b, batch| {
            b.iter(|| ingestor.apply(&mut registry, black_box(batch)));
        });
    }

    group.finish();
}

/// Sparse batches: one signal updated, the rest flat-line.
fn ingest_sparse_batches(c: &mut Criterion) {
    let mut registry = registry_with(8, 8, 300);
    let batch: Batch = [(0, 2.5)].into_iter().collect();
    let mut ingestor = Ingestor::new();

    c.bench_function("ingest_sparse_batch_64_signals", |b| {
        b.iter(|| ingestor.apply(&mut registry, black_box(&batch)));
    });
}

fn ring_buffer_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");

    for capacity in [100usize, 300, 1000] {
        let Some(cap) = NonZeroUsize::new(capacity) else {
            continue;
        };
        let mut buffer = RingBuffer::new(cap);
        group.bench_with_input(BenchmarkId::new("advance", capacity), &capacity, |b, _| {
            b.iter(|| buffer.advance(black_box(Some(1.0))));
        });

        group.bench_with_input(BenchmarkId::new("snapshot", capacity), &capacity, |b, _| {
            b.iter(|| black_box(buffer.snapshot()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    ingest_full_batches,
    ingest_sparse_batches,
    ring_buffer_advance
);
criterion_main!(benches);
