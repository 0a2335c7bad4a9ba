//! Benchmarks for duration extraction and memoized analysis
//!
//! Run with: cargo bench

use chessmirror::{extract_duration, AnalysisEngine, Game, GameCollection, Player, Selector};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

const PGN: &str = r#"[Event "Live Chess"]
[Site "Chess.com"]
[Date "2024.01.01"]
[White "alice"]
[Black "bob"]
[Result "1-0"]
[UTCDate "2024.01.01"]
[UTCTime "10:00:00"]
[StartTime "10:00:00"]
[EndDate "2024.01.01"]
[EndTime "10:05:30"]
[Termination "alice won by checkmate"]

1. e4 {[%clk 0:02:59.9]} 1... e5 {[%clk 0:02:58.1]} 2. Qh5 Nc6 3. Bc4 Nf6 4. Qxf7# 1-0
"#;

fn create_games(count: usize) -> GameCollection {
    GameCollection::from_games((0..count).map(|i| {
        let time_class = if i % 3 == 0 { "rapid" } else { "blitz" };
        Game::new(
            format!("https://www.chess.com/game/live/{}", i),
            i as i64 * 600,
            Player::new("alice", 1500 + (i % 50) as i64, "win"),
            Player::new("bob", 1500, "checkmated"),
        )
        .time_class(time_class)
        .pgn(PGN)
    }))
}

fn bench_duration(c: &mut Criterion) {
    c.bench_function("extract_duration", |b| {
        b.iter(|| extract_duration(black_box(PGN)))
    });
}

fn bench_analysis(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("analysis");

    for size in [100, 1000, 10000] {
        let games = create_games(size);
        let blitz = Selector::exact("blitz");
        let chess = Selector::exact("chess");

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("uncached_{}", size), |b| {
            b.iter(|| {
                let engine = AnalysisEngine::new();
                runtime.block_on(engine.analyze(black_box(&games), "alice", &blitz, &chess))
            })
        });

        let engine = AnalysisEngine::new();
        runtime.block_on(engine.analyze(&games, "alice", &blitz, &chess));

        group.bench_function(format!("cached_{}", size), |b| {
            b.iter(|| runtime.block_on(engine.analyze(black_box(&games), "alice", &blitz, &chess)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_duration, bench_analysis);
criterion_main!(benches);
