//! Benchmarks for NNUE evaluation.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;

use chess_nnue::board::{Color, Position};
use chess_nnue::nnue::{predict, Accumulator, Evaluator, Kernel, Network, RawNetwork};

fn random_network() -> Arc<Network> {
    let mut rng = StdRng::seed_from_u64(1);
    let mut raw = RawNetwork::zeroed();
    for w in raw.feature_weights.iter_mut() {
        *w = rng.gen_range(-0.25..=0.25);
    }
    for b in raw.feature_bias.iter_mut() {
        *b = rng.gen_range(-0.5..=0.5);
    }
    for w in raw.output_weights.iter_mut() {
        *w = rng.gen_range(-0.5..=0.5);
    }
    Arc::new(raw.quantize(1))
}

const MIDDLEGAME: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";

fn bench_refresh(c: &mut Criterion) {
    let net = random_network();
    let mut group = c.benchmark_group("refresh");
    for (name, fen) in [
        ("startpos", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        ("endgame", "8/5k2/3p4/8/4P3/8/5K2/8 w - - 0 1"),
    ] {
        let pos = Position::from_fen(fen);
        group.bench_function(name, |b| {
            b.iter(|| Accumulator::refreshed(&net, black_box(&pos), Color::White))
        });
    }
    group.finish();
}

fn bench_incremental(c: &mut Criterion) {
    let net = random_network();
    let mut group = c.benchmark_group("incremental");
    let mut pos = Position::from_fen(MIDDLEGAME);
    let moves = pos.generate_moves();
    let mut eval = Evaluator::new(Arc::clone(&net));
    eval.set_position(&pos);

    group.bench_function("make_unmake_all", |b| {
        b.iter(|| {
            for &mv in moves.iter() {
                let info = eval.make_move(&mut pos, mv);
                black_box(eval.evaluate(&pos));
                eval.unmake_move(&mut pos, mv, info);
            }
        })
    });
    group.bench_function("refresh_all", |b| {
        b.iter(|| {
            for &mv in moves.iter() {
                let (info, _) = pos.make_move(mv);
                black_box(predict(&net, &pos));
                pos.unmake_move(mv, info);
            }
        })
    });
    group.finish();
}

fn bench_output(c: &mut Criterion) {
    let net = random_network();
    let pos = Position::from_fen(MIDDLEGAME);
    let own = Accumulator::refreshed(&net, &pos, Color::White);
    let opp = Accumulator::refreshed(&net, &pos, Color::Black);

    let mut group = c.benchmark_group("output");
    for kernel in Kernel::available() {
        group.bench_with_input(BenchmarkId::from_parameter(kernel), &kernel, |b, &kernel| {
            b.iter(|| net.output(black_box(&own), black_box(&opp), kernel))
        });
    }
    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let net = random_network();
    let pos = Position::from_fen(MIDDLEGAME);
    c.bench_function("predict", |b| b.iter(|| predict(&net, black_box(&pos))));
}

criterion_group!(
    benches,
    bench_refresh,
    bench_incremental,
    bench_output,
    bench_predict
);
criterion_main!(benches);
