//! Xiangqi rules and search core.
//!
//! The crate covers everything between a board and a chosen move: the
//! grid representation with incremental Zobrist hashing, the legal-move
//! generator with targeted attack detection, game rules, a tapered
//! evaluation, and an iterative-deepening PVS engine with transposition
//! table, null-move pruning, late-move reductions and quiescence. The
//! `dark` module carries the 4x8 hidden-information variant with its
//! expectimax search. Transport, persistence, matchmaking and rendering
//! live elsewhere; they talk to this crate through [`Board`], the
//! serialized cell matrix and [`SearchEngine::find_best_move`].

pub mod dark;
pub mod engine;
pub mod logic;

pub use engine::config::{Difficulty, SearchConfig};
pub use engine::eval::TaperedEvaluator;
pub use engine::search::{AbortHandle, SearchEngine};
pub use engine::{Evaluator, Move, SearchStats};
pub use logic::board::{Board, BoardCells, BoardError, Color, MoveRecord, Piece, PieceKind};
pub use logic::game::GameState;
pub use logic::movegen::{
    generate_all_legal_moves, generate_piece_moves, is_square_attacked, kings_facing,
};
pub use logic::rules::{game_status, in_check, GameStatus, MoveError};

pub use dark::{DarkAction, DarkBoard, DarkCell, DarkConfig, DarkDifficulty, DarkEngine, DarkStatus};
