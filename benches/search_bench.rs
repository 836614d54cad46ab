use criterion::{black_box, criterion_group, criterion_main, Criterion};
use xiangqi_core::{
    generate_all_legal_moves, Board, Color, Evaluator, SearchConfig, SearchEngine,
    TaperedEvaluator,
};

fn opening_board() -> Board {
    let mut board = Board::new();
    board.setup_initial_position();
    board
}

fn bench_movegen(c: &mut Criterion) {
    let mut board = opening_board();
    c.bench_function("legal_moves_opening", |b| {
        b.iter(|| black_box(generate_all_legal_moves(&mut board, Color::Red)))
    });
}

fn bench_eval(c: &mut Criterion) {
    let board = opening_board();
    let eval = TaperedEvaluator::new(0);
    c.bench_function("evaluate_opening", |b| {
        b.iter(|| black_box(eval.evaluate(&board, Color::Red)))
    });
}

fn bench_search(c: &mut Criterion) {
    let mut board = opening_board();
    let mut engine = SearchEngine::new();
    let config = SearchConfig {
        depth: 4,
        quiescence_depth: 3,
        randomness: 0,
        time_budget_ms: 60_000,
    };
    c.bench_function("search_opening_depth_4", |b| {
        b.iter(|| black_box(engine.find_best_move(&mut board, Color::Red, &config)))
    });
}

criterion_group!(benches, bench_movegen, bench_eval, bench_search);
criterion_main!(benches);
