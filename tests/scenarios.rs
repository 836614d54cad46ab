//! Concrete rule and search scenarios pinned to exact expectations.

use xiangqi_core::{
    game_status, generate_all_legal_moves, in_check, is_square_attacked, Board, Color, Evaluator,
    GameStatus, Move, Piece, PieceKind, SearchConfig, SearchEngine, TaperedEvaluator,
};

fn piece(kind: PieceKind, color: Color) -> Option<Piece> {
    Some(Piece::new(kind, color))
}

#[test]
fn opening_position_has_exactly_44_red_moves() {
    let mut board = Board::new();
    board.setup_initial_position();

    let moves = generate_all_legal_moves(&mut board, Color::Red);
    assert_eq!(moves.len(), 44);
    assert!(!in_check(&board, Color::Red));

    let eval = TaperedEvaluator::new(0);
    assert_eq!(eval.evaluate(&board, Color::Red), 0);
}

#[test]
fn central_cannon_opening_does_not_check() {
    let mut board = Board::new();
    board.setup_initial_position();

    // Red's middle-cannon opening.
    board.make_move(&Move::new(7, 1, 7, 4));
    assert!(!is_square_attacked(&board, 0, 4, Color::Red));
    assert!(!in_check(&board, Color::Black));
    // The pressure is on the central pawn, not the king.
    assert!(is_square_attacked(&board, 3, 4, Color::Red));
}

#[test]
fn horse_leg_block_scenario() {
    let mut board = Board::new();
    board.set(9, 1, piece(PieceKind::Horse, Color::Red));
    board.set(8, 1, piece(PieceKind::Pawn, Color::Red));

    let mut list = xiangqi_core::engine::move_list::MoveList::new();
    xiangqi_core::generate_piece_moves(&board, 9, 1, &mut list);
    let targets: Vec<(usize, usize)> = list.iter().map(|mv| mv.to()).collect();

    assert!(!targets.contains(&(7, 0)));
    assert!(!targets.contains(&(7, 2)));
    assert!(targets.contains(&(8, 3)));
}

#[test]
fn cannon_screen_scenario() {
    let mut board = Board::new();
    board.set(7, 1, piece(PieceKind::Cannon, Color::Red));
    board.set(0, 1, piece(PieceKind::Rook, Color::Black));

    assert!(!is_square_attacked(&board, 0, 1, Color::Red));

    board.set(4, 1, piece(PieceKind::Pawn, Color::Red));
    assert!(is_square_attacked(&board, 0, 1, Color::Red));

    let moves = generate_all_legal_moves(&mut board, Color::Red);
    assert!(moves
        .iter()
        .any(|mv| mv.from() == (7, 1) && mv.to() == (0, 1)));
}

#[test]
fn kings_facing_restricts_the_blocker() {
    let mut board = Board::new();
    board.set(9, 4, piece(PieceKind::King, Color::Red));
    board.set(0, 4, piece(PieceKind::King, Color::Black));
    board.set(4, 4, piece(PieceKind::Pawn, Color::Red));

    let moves = generate_all_legal_moves(&mut board, Color::Red);
    // The pawn may only advance along the shared file; sidesteps would
    // leave the generals facing.
    for mv in &moves {
        if mv.from() == (4, 4) {
            assert_eq!(mv.to(), (3, 4));
        }
    }
    // The king itself may step off the shared file.
    assert!(moves.iter().any(|mv| mv.from() == (9, 4) && mv.to() == (9, 3)));
    assert!(moves.iter().any(|mv| mv.from() == (9, 4) && mv.to() == (9, 5)));
}

#[test]
fn search_finds_the_rook_mate_in_one() {
    let mut board = Board::new();
    board.set(9, 3, piece(PieceKind::King, Color::Red));
    board.set(1, 0, piece(PieceKind::Rook, Color::Red));
    board.set(2, 4, piece(PieceKind::Pawn, Color::Red));
    board.set(0, 4, piece(PieceKind::King, Color::Black));

    let config = SearchConfig {
        depth: 4,
        quiescence_depth: 3,
        randomness: 0,
        time_budget_ms: 30_000,
    };
    let mut engine = SearchEngine::new();
    let mv = engine
        .find_best_move(&mut board, Color::Red, &config)
        .expect("red has moves");

    // The winning move is Rook (1,0) -> (0,0): check on the back rank,
    // (0,3) is sealed by the facing rule, (0,5) by the rook itself and
    // (1,4) by the crossed pawn.
    board.make_move(&mv);
    assert!(in_check(&board, Color::Black));
    assert_eq!(game_status(&mut board, Color::Black), GameStatus::Won(Color::Red));
}

#[test]
fn repeated_runs_agree_without_randomness() {
    let config = SearchConfig {
        depth: 4,
        quiescence_depth: 3,
        randomness: 0,
        time_budget_ms: 30_000,
    };

    let mut picks = Vec::new();
    for _ in 0..3 {
        let mut board = Board::new();
        board.setup_initial_position();
        let mut engine = SearchEngine::new();
        picks.push(
            engine
                .find_best_move(&mut board, Color::Red, &config)
                .unwrap(),
        );
    }
    assert!(picks[1].same_squares(&picks[0]));
    assert!(picks[2].same_squares(&picks[0]));
}
