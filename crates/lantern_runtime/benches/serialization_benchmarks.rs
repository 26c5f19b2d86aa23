//! Benchmarks for save game encoding (MessagePack).
//!
//! Run with: `cargo bench --package lantern_runtime`

use std::fmt::Write as _;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use lantern_language::load_str;
use lantern_runtime::{from_bytes, to_bytes};
use lantern_storage::{RuntimeState, initialize_state};

// =============================================================================
// Helper Functions
// =============================================================================

/// Builds the starting state of a game with `rooms` rooms, each holding
/// two objects, plus a variable and a timer per room.
fn create_state(rooms: usize) -> RuntimeState {
    let mut src = String::from("define game <Bench>\n  start <room0>\nend define\n");
    for i in 0..rooms {
        let _ = write!(
            src,
            "define room <room{i}>\n  description <Room number {i}.>\n  east <room{next}>\n  \
             define object <coin{i}>\n    take\n    properties <value={i}>\n  end define\n  \
             define object <rock{i}>\n    invisible\n  end define\nend define\n\
             define variable <score{i}>\n  type numeric\n  value <{i}>\nend define\n\
             define timer <tick{i}>\n  interval <{i}>\n  action msg <tick>\nend define\n",
            next = (i + 1) % rooms,
        );
    }
    let model = load_str(&src).unwrap();
    initialize_state(&model)
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_to_bytes(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    for rooms in [1, 16, 128] {
        let state = create_state(rooms);
        group.throughput(Throughput::Elements(rooms as u64));
        group.bench_with_input(BenchmarkId::new("to_bytes", rooms), &state, |b, state| {
            b.iter(|| to_bytes(black_box(state)).unwrap());
        });
    }

    group.finish();
}

fn bench_from_bytes(c: &mut Criterion) {
    let mut group = c.benchmark_group("deserialize");

    for rooms in [1, 16, 128] {
        let bytes = to_bytes(&create_state(rooms)).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("from_bytes", rooms), &bytes, |b, bytes| {
            b.iter(|| from_bytes(black_box(bytes)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_to_bytes, bench_from_bytes);
criterion_main!(benches);
