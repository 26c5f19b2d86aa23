//! Benchmarks for the Lantern engine layer.
//!
//! Run with: `cargo bench --package lantern_engine`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use lantern_engine::{BufferHost, Engine, match_command};
use lantern_foundation::EngineConfig;
use lantern_language::load_str;

// =============================================================================
// Helper Functions
// =============================================================================

/// Builds a game with `rooms` rooms in a north-south corridor, each with a
/// few objects.
fn corridor_game(rooms: usize) -> String {
    let mut text = String::from("define game <Bench>\n  start <room0>\nend define\n\n");
    for i in 0..rooms {
        text.push_str(&format!("define room <room{i}>\n"));
        if i + 1 < rooms {
            text.push_str(&format!("  north <room{}>\n", i + 1));
        }
        if i > 0 {
            text.push_str(&format!("  south <room{}>\n", i - 1));
        }
        for j in 0..3 {
            text.push_str(&format!(
                "  define object <thing{i}_{j}>\n    alias <thing {j}>\n    take\n  end define\n"
            ));
        }
        text.push_str("end define\n\n");
    }
    text.push_str("define variable <score>\n  type numeric\n  value <7>\nend define\n");
    text
}

fn started_engine(rooms: usize) -> Engine<BufferHost> {
    let model = load_str(&corridor_game(rooms)).unwrap();
    let config = EngineConfig::default().with_echo_commands(false);
    let mut engine = Engine::new(model, config, BufferHost::new());
    engine.start();
    engine.host_mut().take_output();
    engine
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_command");

    group.bench_function("literal", |b| {
        b.iter(|| black_box(match_command(black_box("inventory"), "inventory")));
    });
    group.bench_function("two_captures", |b| {
        b.iter(|| {
            black_box(match_command(
                black_box("use the small brass key on the heavy oak door"),
                "use #@first# on #@second#",
            ))
        });
    });
    group.bench_function("no_match", |b| {
        b.iter(|| {
            black_box(match_command(
                black_box("give the small brass key to the guard"),
                "use #@first# on #@second#",
            ))
        });
    });

    group.finish();
}

fn bench_substitution(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval_string");
    let mut engine = started_engine(2);

    group.bench_function("plain", |b| {
        b.iter(|| black_box(engine.eval_string(black_box("Nothing to substitute here."))));
    });
    group.bench_function("variables", |b| {
        b.iter(|| {
            black_box(engine.eval_string(black_box(
                "Score %score% in #quest.currentroom# near #thing0_1:alias#.",
            )))
        });
    });
    group.bench_function("functions", |b| {
        b.iter(|| black_box(engine.eval_string(black_box("$ucase(#quest.currentroom#)$"))));
    });

    group.finish();
}

fn bench_turns(c: &mut Criterion) {
    let mut group = c.benchmark_group("turn");

    for rooms in [4usize, 32, 128] {
        group.throughput(Throughput::Elements(2));
        group.bench_with_input(BenchmarkId::new("walk", rooms), &rooms, |b, &rooms| {
            let mut engine = started_engine(rooms);
            b.iter(|| {
                engine.run_command("north");
                engine.run_command("south");
                black_box(engine.host_mut().take_output());
            });
        });
    }

    group.bench_function("take_and_drop", |b| {
        let mut engine = started_engine(4);
        b.iter(|| {
            engine.run_command("take thing 1");
            engine.run_command("drop thing 1");
            black_box(engine.host_mut().take_output());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_matching, bench_substitution, bench_turns);

criterion_main!(benches);
