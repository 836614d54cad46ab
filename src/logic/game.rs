use crate::engine::Move;
use crate::logic::board::{Board, Color, MoveRecord, Piece};
use crate::logic::movegen::generate_all_legal_moves;
use crate::logic::rules::{game_status, validate_move, GameStatus, MoveError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub mv: Move,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub color: Color,
    /// Position hash after the move, used for repetition detection.
    pub hash: u32,
}

/// Full game bookkeeping on top of the core: turn order, status,
/// history and the three-fold repetition rule. The search core never
/// sees this layer; the server and UI drive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub turn: Color,
    pub status: GameStatus,
    pub last_move: Option<Move>,
    pub history: Vec<HistoryRecord>,
    start_hash: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    #[must_use]
    pub fn new() -> Self {
        let mut board = Board::new();
        board.setup_initial_position();
        let start_hash = board.hash();
        Self {
            board,
            turn: Color::Red,
            status: GameStatus::Playing,
            last_move: None,
            history: Vec::new(),
            start_hash,
        }
    }

    pub fn make_move(
        &mut self,
        from: (usize, usize),
        to: (usize, usize),
    ) -> Result<(), MoveError> {
        if self.status != GameStatus::Playing {
            return Err(MoveError::NotYourTurn);
        }

        validate_move(&self.board, from, to, self.turn)?;

        let piece = self
            .board
            .get(from.0, from.1)
            .ok_or(MoveError::NoPieceAtSource)?;
        let only_move = generate_all_legal_moves(&mut self.board, self.turn).len() == 1;

        let mv = Move::new(from.0 as u8, from.1 as u8, to.0 as u8, to.1 as u8);
        let record = self.board.make_move(&mv);

        // A position may not be recreated a third time, unless it is
        // forced. The hash carries the side to move, so only true
        // repetitions count.
        let occurrences = self
            .history
            .iter()
            .filter(|r| r.hash == self.board.hash())
            .count()
            + usize::from(self.board.hash() == self.start_hash);
        if occurrences >= 2 && !only_move {
            self.board.unmake(&record);
            return Err(MoveError::RepetitionForbidden);
        }

        self.history.push(HistoryRecord {
            mv,
            piece,
            captured: record.captured,
            color: self.turn,
            hash: self.board.hash(),
        });
        self.turn = self.turn.opposite();
        self.last_move = Some(mv);
        self.status = game_status(&mut self.board, self.turn);
        Ok(())
    }

    /// Take back the last move. Returns false on an empty history.
    pub fn undo_move(&mut self) -> bool {
        let Some(record) = self.history.pop() else {
            return false;
        };
        self.board.unmake(&MoveRecord {
            mv: record.mv,
            captured: record.captured,
        });
        self.turn = record.color;
        self.last_move = self.history.last().map(|r| r.mv);
        self.status = GameStatus::Playing;
        true
    }
}
