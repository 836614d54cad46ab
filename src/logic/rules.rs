use crate::logic::board::{crossed_river, in_palace, Board, Color, PieceKind};
use crate::logic::movegen::{has_legal_move, is_square_attacked, kings_facing};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveError {
    #[error("coordinates are off the board")]
    OutOfBounds,
    #[error("no piece on the source square")]
    NoPieceAtSource,
    #[error("piece belongs to the other side")]
    NotYourTurn,
    #[error("piece cannot move that way")]
    InvalidMovePattern,
    #[error("path is blocked")]
    BlockedPath,
    #[error("target square holds a friendly piece")]
    TargetOccupiedByFriendly,
    #[error("king or advisor may not leave the palace")]
    PalaceRestriction,
    #[error("elephant may not cross the river")]
    RiverRestriction,
    #[error("move would leave own king attacked or the kings facing")]
    SelfCheck,
    #[error("move repeats a position for the third time")]
    RepetitionForbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    /// In Xiangqi a side with no legal move loses, mated or stalemated.
    Won(Color),
}

/// Whether `color`'s king is currently attacked.
pub fn in_check(board: &Board, color: Color) -> bool {
    match board.find_king(color) {
        Some((row, col)) => is_square_attacked(board, row, col, color.opposite()),
        None => false,
    }
}

/// Terminal detection for the side about to move.
pub fn game_status(board: &mut Board, side_to_move: Color) -> GameStatus {
    if has_legal_move(board, side_to_move) {
        GameStatus::Playing
    } else {
        GameStatus::Won(side_to_move.opposite())
    }
}

/// Validate a single untrusted move: geometry and piece rules first,
/// then self-check and kings-facing on a scratch copy.
pub fn validate_move(
    board: &Board,
    from: (usize, usize),
    to: (usize, usize),
    turn: Color,
) -> Result<(), MoveError> {
    validate_piece_logic(board, from, to, turn)?;

    let mut scratch = board.clone();
    let mv = crate::engine::Move::new(from.0 as u8, from.1 as u8, to.0 as u8, to.1 as u8);
    scratch.make_move(&mv);

    if in_check(&scratch, turn) || kings_facing(&scratch) {
        return Err(MoveError::SelfCheck);
    }
    Ok(())
}

fn validate_piece_logic(
    board: &Board,
    from: (usize, usize),
    to: (usize, usize),
    turn: Color,
) -> Result<(), MoveError> {
    use crate::logic::board::{COLS, ROWS};
    if from.0 >= ROWS || from.1 >= COLS || to.0 >= ROWS || to.1 >= COLS {
        return Err(MoveError::OutOfBounds);
    }

    let piece = board
        .get(from.0, from.1)
        .ok_or(MoveError::NoPieceAtSource)?;
    if piece.color != turn {
        return Err(MoveError::NotYourTurn);
    }
    if from == to {
        return Err(MoveError::InvalidMovePattern);
    }
    if let Some(target) = board.get(to.0, to.1) {
        if target.color == piece.color {
            return Err(MoveError::TargetOccupiedByFriendly);
        }
    }

    let d_row = to.0.abs_diff(from.0);
    let d_col = to.1.abs_diff(from.1);

    match piece.kind {
        PieceKind::King => {
            if d_row + d_col != 1 {
                return Err(MoveError::InvalidMovePattern);
            }
            if !in_palace(piece.color, to.0, to.1) {
                return Err(MoveError::PalaceRestriction);
            }
        }
        PieceKind::Advisor => {
            if d_row != 1 || d_col != 1 {
                return Err(MoveError::InvalidMovePattern);
            }
            if !in_palace(piece.color, to.0, to.1) {
                return Err(MoveError::PalaceRestriction);
            }
        }
        PieceKind::Elephant => {
            if d_row != 2 || d_col != 2 {
                return Err(MoveError::InvalidMovePattern);
            }
            if crossed_river(piece.color, to.0) {
                return Err(MoveError::RiverRestriction);
            }
            let eye = (usize::midpoint(from.0, to.0), usize::midpoint(from.1, to.1));
            if board.get(eye.0, eye.1).is_some() {
                return Err(MoveError::BlockedPath);
            }
        }
        PieceKind::Horse => {
            if !((d_row == 2 && d_col == 1) || (d_row == 1 && d_col == 2)) {
                return Err(MoveError::InvalidMovePattern);
            }
            let leg = if d_row == 2 {
                (usize::midpoint(from.0, to.0), from.1)
            } else {
                (from.0, usize::midpoint(from.1, to.1))
            };
            if board.get(leg.0, leg.1).is_some() {
                return Err(MoveError::BlockedPath);
            }
        }
        PieceKind::Rook => {
            if d_row != 0 && d_col != 0 {
                return Err(MoveError::InvalidMovePattern);
            }
            if pieces_between(board, from, to) > 0 {
                return Err(MoveError::BlockedPath);
            }
        }
        PieceKind::Cannon => {
            if d_row != 0 && d_col != 0 {
                return Err(MoveError::InvalidMovePattern);
            }
            let screens = pieces_between(board, from, to);
            if board.get(to.0, to.1).is_some() {
                if screens != 1 {
                    return Err(MoveError::BlockedPath);
                }
            } else if screens > 0 {
                return Err(MoveError::BlockedPath);
            }
        }
        PieceKind::Pawn => {
            if d_row + d_col != 1 {
                return Err(MoveError::InvalidMovePattern);
            }
            let backward = match piece.color {
                Color::Red => to.0 > from.0,
                Color::Black => to.0 < from.0,
            };
            if backward {
                return Err(MoveError::InvalidMovePattern);
            }
            if d_col == 1 && !crossed_river(piece.color, from.0) {
                return Err(MoveError::InvalidMovePattern);
            }
        }
    }
    Ok(())
}

fn pieces_between(board: &Board, from: (usize, usize), to: (usize, usize)) -> usize {
    let mut count = 0;
    if from.0 == to.0 {
        let (lo, hi) = (from.1.min(to.1), from.1.max(to.1));
        for col in lo + 1..hi {
            if board.get(from.0, col).is_some() {
                count += 1;
            }
        }
    } else {
        let (lo, hi) = (from.0.min(to.0), from.0.max(to.0));
        for row in lo + 1..hi {
            if board.get(row, from.1).is_some() {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::board::Piece;

    #[test]
    fn opening_position_is_quiet() {
        let mut board = Board::new();
        board.setup_initial_position();
        assert!(!in_check(&board, Color::Red));
        assert!(!in_check(&board, Color::Black));
        assert_eq!(game_status(&mut board, Color::Red), GameStatus::Playing);
    }

    #[test]
    fn cornered_king_with_no_moves_loses() {
        let mut board = Board::new();
        board.set(0, 4, Some(Piece::new(PieceKind::King, Color::Black)));
        board.set(9, 3, Some(Piece::new(PieceKind::King, Color::Red)));
        board.set(1, 0, Some(Piece::new(PieceKind::Rook, Color::Red)));
        board.set(0, 0, Some(Piece::new(PieceKind::Rook, Color::Red)));
        board.set(2, 4, Some(Piece::new(PieceKind::Pawn, Color::Red)));

        // Rook on row 0 checks; row 1 rook and the pawn cover every
        // escape, the red king guards column 3 by the facing rule.
        assert!(in_check(&board, Color::Black));
        assert_eq!(
            game_status(&mut board, Color::Black),
            GameStatus::Won(Color::Red)
        );
    }

    #[test]
    fn stalemate_counts_as_a_loss() {
        let mut board = Board::new();
        // Black king boxed in without being in check: one rook sweeps
        // row 1, the other covers (0, 4) from down the file.
        board.set(0, 3, Some(Piece::new(PieceKind::King, Color::Black)));
        board.set(9, 4, Some(Piece::new(PieceKind::King, Color::Red)));
        board.set(5, 4, Some(Piece::new(PieceKind::Rook, Color::Red)));
        board.set(1, 8, Some(Piece::new(PieceKind::Rook, Color::Red)));

        assert!(!in_check(&board, Color::Black));
        assert_eq!(
            game_status(&mut board, Color::Black),
            GameStatus::Won(Color::Red)
        );
    }

    #[test]
    fn validate_rejects_rule_violations() {
        let mut board = Board::new();
        board.setup_initial_position();

        // Blocked horse (its leg is the elephant's square).
        assert_eq!(
            validate_move(&board, (9, 1), (8, 3), Color::Red),
            Err(MoveError::BlockedPath)
        );
        // Horse around the blocked leg is fine.
        assert!(validate_move(&board, (9, 1), (7, 2), Color::Red).is_ok());
        // Advisor stays in the palace.
        assert_eq!(
            validate_move(&board, (9, 3), (8, 2), Color::Red),
            Err(MoveError::PalaceRestriction)
        );
        // Moving Black's piece on Red's turn.
        assert_eq!(
            validate_move(&board, (3, 0), (4, 0), Color::Red),
            Err(MoveError::NotYourTurn)
        );
        // Cannon cannot slide past its screen to an empty square.
        assert_eq!(
            validate_move(&board, (7, 1), (1, 1), Color::Red),
            Err(MoveError::BlockedPath)
        );
        // Its opening capture over that screen is fine, as is a slide.
        assert!(validate_move(&board, (7, 1), (0, 1), Color::Red).is_ok());
        assert!(validate_move(&board, (7, 1), (7, 4), Color::Red).is_ok());
    }

    #[test]
    fn validate_rejects_self_check() {
        let mut board = Board::new();
        board.set(9, 4, Some(Piece::new(PieceKind::King, Color::Red)));
        board.set(0, 4, Some(Piece::new(PieceKind::King, Color::Black)));
        board.set(5, 4, Some(Piece::new(PieceKind::Rook, Color::Red)));

        // Sliding the blocking rook off the file exposes the facing kings.
        assert_eq!(
            validate_move(&board, (5, 4), (5, 0), Color::Red),
            Err(MoveError::SelfCheck)
        );
        // Along the file it keeps the block.
        assert!(validate_move(&board, (5, 4), (4, 4), Color::Red).is_ok());
    }
}
