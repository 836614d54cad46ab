use crate::engine::move_list::MoveList;
use crate::engine::Move;
use crate::logic::board::{crossed_river, in_palace, Board, Color, PieceKind, COLS, ROWS};

const ORTHOGONAL: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONAL: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const HORSE_JUMPS: [(isize, isize); 8] = [
    (-2, -1),
    (-2, 1),
    (2, -1),
    (2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
];
const ELEPHANT_JUMPS: [(isize, isize); 4] = [(-2, -2), (-2, 2), (2, -2), (2, 2)];

fn offset(row: usize, col: usize, dr: isize, dc: isize) -> Option<(usize, usize)> {
    let r = row as isize + dr;
    let c = col as isize + dc;
    if (0..ROWS as isize).contains(&r) && (0..COLS as isize).contains(&c) {
        Some((r as usize, c as usize))
    } else {
        None
    }
}

/// The leg a horse jump pivots on: the orthogonal neighbour along the
/// long axis. `(±2, ±1)` pivots on `(±1, 0)`, `(±1, ±2)` on `(0, ±1)`.
fn horse_leg(row: usize, col: usize, dr: isize, dc: isize) -> Option<(usize, usize)> {
    if dr.abs() == 2 {
        offset(row, col, dr / 2, 0)
    } else {
        offset(row, col, 0, dc / 2)
    }
}

fn push_if_not_own(
    board: &Board,
    color: Color,
    from: (usize, usize),
    to: (usize, usize),
    out: &mut MoveList,
) {
    if let Some(target) = board.get(to.0, to.1) {
        if target.color == color {
            return;
        }
    }
    out.push(Move::new(
        from.0 as u8,
        from.1 as u8,
        to.0 as u8,
        to.1 as u8,
    ));
}

/// Pseudo-legal moves for the piece on `(row, col)`, appended to `out`.
/// No self-check or kings-facing filtering happens here.
pub fn generate_piece_moves(board: &Board, row: usize, col: usize, out: &mut MoveList) {
    let Some(piece) = board.get(row, col) else {
        return;
    };
    let color = piece.color;
    let from = (row, col);

    match piece.kind {
        PieceKind::King => {
            for (dr, dc) in ORTHOGONAL {
                if let Some(to) = offset(row, col, dr, dc) {
                    if in_palace(color, to.0, to.1) {
                        push_if_not_own(board, color, from, to, out);
                    }
                }
            }
        }
        PieceKind::Advisor => {
            for (dr, dc) in DIAGONAL {
                if let Some(to) = offset(row, col, dr, dc) {
                    if in_palace(color, to.0, to.1) {
                        push_if_not_own(board, color, from, to, out);
                    }
                }
            }
        }
        PieceKind::Elephant => {
            for (dr, dc) in ELEPHANT_JUMPS {
                let Some(to) = offset(row, col, dr, dc) else {
                    continue;
                };
                if crossed_river(color, to.0) {
                    continue;
                }
                let Some(eye) = offset(row, col, dr / 2, dc / 2) else {
                    continue;
                };
                if board.get(eye.0, eye.1).is_none() {
                    push_if_not_own(board, color, from, to, out);
                }
            }
        }
        PieceKind::Horse => {
            for (dr, dc) in HORSE_JUMPS {
                let Some(to) = offset(row, col, dr, dc) else {
                    continue;
                };
                let Some(leg) = horse_leg(row, col, dr, dc) else {
                    continue;
                };
                if board.get(leg.0, leg.1).is_none() {
                    push_if_not_own(board, color, from, to, out);
                }
            }
        }
        PieceKind::Rook => {
            for (dr, dc) in ORTHOGONAL {
                let mut cursor = offset(row, col, dr, dc);
                while let Some(to) = cursor {
                    match board.get(to.0, to.1) {
                        None => {
                            out.push(Move::new(row as u8, col as u8, to.0 as u8, to.1 as u8));
                            cursor = offset(to.0, to.1, dr, dc);
                        }
                        Some(target) => {
                            if target.color != color {
                                out.push(Move::new(row as u8, col as u8, to.0 as u8, to.1 as u8));
                            }
                            break;
                        }
                    }
                }
            }
        }
        PieceKind::Cannon => {
            for (dr, dc) in ORTHOGONAL {
                let mut screen = false;
                let mut cursor = offset(row, col, dr, dc);
                while let Some(to) = cursor {
                    match board.get(to.0, to.1) {
                        None => {
                            if !screen {
                                out.push(Move::new(row as u8, col as u8, to.0 as u8, to.1 as u8));
                            }
                            cursor = offset(to.0, to.1, dr, dc);
                        }
                        Some(target) => {
                            if screen {
                                if target.color != color {
                                    out.push(Move::new(
                                        row as u8, col as u8, to.0 as u8, to.1 as u8,
                                    ));
                                }
                                break;
                            }
                            screen = true;
                            cursor = offset(to.0, to.1, dr, dc);
                        }
                    }
                }
            }
        }
        PieceKind::Pawn => {
            if let Some(to) = offset(row, col, color.forward(), 0) {
                push_if_not_own(board, color, from, to, out);
            }
            if crossed_river(color, row) {
                for dc in [-1, 1] {
                    if let Some(to) = offset(row, col, 0, dc) {
                        push_if_not_own(board, color, from, to, out);
                    }
                }
            }
        }
    }
}

/// All pseudo-legal moves for one side, scanned row-major so equal-score
/// ordering downstream stays lexicographic by origin.
pub fn generate_side_moves(board: &Board, color: Color, out: &mut MoveList) {
    for row in 0..ROWS {
        for col in 0..COLS {
            if let Some(piece) = board.get(row, col) {
                if piece.color == color {
                    generate_piece_moves(board, row, col, out);
                }
            }
        }
    }
}

/// Targeted attack test: probes exactly the squares an attack on
/// `(row, col)` could originate from, instead of enumerating every
/// opponent move.
pub fn is_square_attacked(board: &Board, row: usize, col: usize, by: Color) -> bool {
    // Sliding attacks and the flying-general file. Walk each ray; the
    // first piece met can be a rook (any ray) or the enemy king (file
    // only), the second a cannon behind its screen.
    for (dr, dc) in ORTHOGONAL {
        let mut seen = 0;
        let mut cursor = offset(row, col, dr, dc);
        while let Some((r, c)) = cursor {
            if let Some(piece) = board.get(r, c) {
                seen += 1;
                if seen == 1 {
                    if piece.color == by
                        && (piece.kind == PieceKind::Rook
                            || (piece.kind == PieceKind::King && dc == 0))
                    {
                        return true;
                    }
                } else {
                    if piece.color == by && piece.kind == PieceKind::Cannon {
                        return true;
                    }
                    break;
                }
            }
            cursor = offset(r, c, dr, dc);
        }
    }

    // Horse origins: for each jump shape, the square a horse would have
    // to stand on, gated by that horse's own leg.
    for (dr, dc) in HORSE_JUMPS {
        let Some((hr, hc)) = offset(row, col, -dr, -dc) else {
            continue;
        };
        let Some(piece) = board.get(hr, hc) else {
            continue;
        };
        if piece.color != by || piece.kind != PieceKind::Horse {
            continue;
        }
        if let Some(leg) = horse_leg(hr, hc, dr, dc) {
            if board.get(leg.0, leg.1).is_none() {
                return true;
            }
        }
    }

    // Pawns: one square behind their forward step, plus sideways once
    // across the river.
    if let Some((pr, pc)) = offset(row, col, -by.forward(), 0) {
        if board.get(pr, pc) == Some(crate::logic::board::Piece::new(PieceKind::Pawn, by)) {
            return true;
        }
    }
    for dc in [-1, 1] {
        if let Some((pr, pc)) = offset(row, col, 0, dc) {
            if board.get(pr, pc) == Some(crate::logic::board::Piece::new(PieceKind::Pawn, by))
                && crossed_river(by, pr)
            {
                return true;
            }
        }
    }

    false
}

/// Whether the two kings share a column with nothing between them.
pub fn kings_facing(board: &Board) -> bool {
    let (Some((rr, rc)), Some((br, bc))) =
        (board.find_king(Color::Red), board.find_king(Color::Black))
    else {
        return false;
    };
    if rc != bc {
        return false;
    }
    let (lo, hi) = (br.min(rr), br.max(rr));
    for r in lo + 1..hi {
        if board.get(r, rc).is_some() {
            return false;
        }
    }
    true
}

/// A pseudo-legal move is legal when, once made, the mover's king is not
/// attacked and the kings do not face.
pub fn is_legal(board: &mut Board, mv: &Move, color: Color) -> bool {
    let record = board.make_move(mv);
    let safe = match board.find_king(color) {
        Some((kr, kc)) => !is_square_attacked(board, kr, kc, color.opposite()),
        None => true,
    };
    let legal = safe && !kings_facing(board);
    board.unmake(&record);
    legal
}

pub fn generate_all_legal_moves(board: &mut Board, color: Color) -> Vec<Move> {
    let mut pseudo = MoveList::new();
    generate_side_moves(board, color, &mut pseudo);

    let mut legal = Vec::with_capacity(pseudo.len());
    for mv in pseudo.iter() {
        if is_legal(board, mv, color) {
            legal.push(*mv);
        }
    }
    legal
}

/// Early-exit variant for terminal detection.
pub fn has_legal_move(board: &mut Board, color: Color) -> bool {
    let mut pseudo = MoveList::new();
    generate_side_moves(board, color, &mut pseudo);
    pseudo.iter().any(|mv| is_legal(board, mv, color))
}
