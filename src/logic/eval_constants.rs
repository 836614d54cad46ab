use crate::logic::board::{Color, PieceKind};

// Piece values
pub const VAL_KING: i32 = 10000;
pub const VAL_ROOK: i32 = 900;
pub const VAL_CANNON: i32 = 450;
pub const VAL_HORSE: i32 = 450;
pub const VAL_ELEPHANT: i32 = 200;
pub const VAL_ADVISOR: i32 = 200;
pub const VAL_PAWN: i32 = 100;

pub const fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::King => VAL_KING,
        PieceKind::Rook => VAL_ROOK,
        PieceKind::Cannon => VAL_CANNON,
        PieceKind::Horse => VAL_HORSE,
        PieceKind::Elephant => VAL_ELEPHANT,
        PieceKind::Advisor => VAL_ADVISOR,
        PieceKind::Pawn => VAL_PAWN,
    }
}

// Game-phase weights. The phase scalar runs 0 (bare endgame) to 256
// (full middlegame): min(256, current * 256 / TOTAL_PHASE) over every
// piece on the board.
pub const TOTAL_PHASE: i32 = 28;

pub const fn phase_weight(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::King | PieceKind::Pawn => 0,
        PieceKind::Advisor | PieceKind::Elephant => 1,
        PieceKind::Rook => 5,
        PieceKind::Horse | PieceKind::Cannon => 3,
    }
}

// Piece-square tables, Red-oriented: row 9 is Red's back rank, row 0 the
// enemy back rank. Black mirrors vertically with `9 - row`. One
// middlegame and one endgame table per kind; the evaluator blends them
// by the phase scalar.

#[rustfmt::skip]
const PST_PAWN_MG: [[i32; 9]; 10] = [
    [ 10,  14,  18,  22,  24,  22,  18,  14,  10],
    [ 24,  32,  42,  54,  60,  54,  42,  32,  24],
    [ 28,  36,  48,  58,  64,  58,  48,  36,  28],
    [ 22,  28,  34,  44,  48,  44,  34,  28,  22],
    [ 14,  18,  22,  30,  34,  30,  22,  18,  14],
    [  8,   8,  10,  12,  14,  12,  10,   8,   8],
    [  0,   0,   2,   0,   6,   0,   2,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
];

#[rustfmt::skip]
const PST_PAWN_EG: [[i32; 9]; 10] = [
    [  8,  10,  12,  14,  16,  14,  12,  10,   8],
    [ 40,  48,  56,  64,  70,  64,  56,  48,  40],
    [ 44,  52,  60,  70,  76,  70,  60,  52,  44],
    [ 36,  44,  52,  60,  66,  60,  52,  44,  36],
    [ 24,  30,  36,  42,  48,  42,  36,  30,  24],
    [ 14,  16,  18,  22,  24,  22,  18,  16,  14],
    [  4,   4,   6,   8,  10,   8,   6,   4,   4],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
];

#[rustfmt::skip]
const PST_HORSE_MG: [[i32; 9]; 10] = [
    [  2,   6,   8,   8,   6,   8,   8,   6,   2],
    [  4,  10,  16,  14,  12,  14,  16,  10,   4],
    [  8,  16,  20,  22,  18,  22,  20,  16,   8],
    [  8,  18,  24,  28,  26,  28,  24,  18,   8],
    [  6,  16,  22,  26,  24,  26,  22,  16,   6],
    [  4,  12,  18,  20,  18,  20,  18,  12,   4],
    [  2,   8,  12,  14,  12,  14,  12,   8,   2],
    [  0,   4,   8,  10,   8,  10,   8,   4,   0],
    [ -4,   2,   4,   4,   2,   4,   4,   2,  -4],
    [ -8,  -4,   0,   0,  -2,   0,   0,  -4,  -8],
];

#[rustfmt::skip]
const PST_HORSE_EG: [[i32; 9]; 10] = [
    [  2,   4,   6,   6,   6,   6,   6,   4,   2],
    [  4,   8,  12,  12,  12,  12,  12,   8,   4],
    [  6,  12,  16,  18,  16,  18,  16,  12,   6],
    [  6,  14,  18,  22,  20,  22,  18,  14,   6],
    [  6,  12,  18,  20,  20,  20,  18,  12,   6],
    [  4,  10,  14,  16,  16,  16,  14,  10,   4],
    [  2,   6,  10,  12,  10,  12,  10,   6,   2],
    [  0,   4,   6,   8,   6,   8,   6,   4,   0],
    [ -2,   2,   4,   4,   2,   4,   4,   2,  -2],
    [ -6,  -2,   0,   2,   0,   2,   0,  -2,  -6],
];

#[rustfmt::skip]
const PST_ROOK_MG: [[i32; 9]; 10] = [
    [ 14,  16,  14,  18,  20,  18,  14,  16,  14],
    [ 16,  20,  18,  24,  26,  24,  18,  20,  16],
    [ 12,  16,  14,  18,  18,  18,  14,  16,  12],
    [ 12,  14,  12,  16,  16,  16,  12,  14,  12],
    [  8,  12,  10,  14,  14,  14,  10,  12,   8],
    [  6,  10,   8,  12,  12,  12,   8,  10,   6],
    [  4,   8,   6,   8,   8,   8,   6,   8,   4],
    [  2,   6,   4,   6,   6,   6,   4,   6,   2],
    [  2,   6,   4,   8,   8,   8,   4,   6,   2],
    [ -2,   6,   4,   6,   0,   6,   4,   6,  -2],
];

#[rustfmt::skip]
const PST_ROOK_EG: [[i32; 9]; 10] = [
    [ 10,  12,  12,  14,  14,  14,  12,  12,  10],
    [ 12,  14,  14,  16,  16,  16,  14,  14,  12],
    [ 10,  12,  12,  14,  14,  14,  12,  12,  10],
    [ 10,  12,  12,  14,  14,  14,  12,  12,  10],
    [  8,  10,  10,  12,  12,  12,  10,  10,   8],
    [  8,  10,  10,  12,  12,  12,  10,  10,   8],
    [  6,   8,   8,  10,  10,  10,   8,   8,   6],
    [  6,   8,   8,  10,  10,  10,   8,   8,   6],
    [  4,   8,   8,  10,  10,  10,   8,   8,   4],
    [  4,   6,   6,   8,   8,   8,   6,   6,   4],
];

#[rustfmt::skip]
const PST_CANNON_MG: [[i32; 9]; 10] = [
    [  6,   6,   4,   8,  10,   8,   4,   6,   6],
    [  4,   4,   2,   6,   8,   6,   2,   4,   4],
    [  2,   2,   0,   6,  10,   6,   0,   2,   2],
    [  0,   2,   2,   4,   6,   4,   2,   2,   0],
    [  0,   0,   2,   4,   6,   4,   2,   0,   0],
    [ -2,   0,   2,   2,   4,   2,   2,   0,  -2],
    [  0,   2,   4,   4,   6,   4,   4,   2,   0],
    [  2,   4,   6,  10,  12,  10,   6,   4,   2],
    [  0,   2,   4,   6,   6,   6,   4,   2,   0],
    [  0,   0,   2,   6,   6,   6,   2,   0,   0],
];

#[rustfmt::skip]
const PST_CANNON_EG: [[i32; 9]; 10] = [
    [  4,   4,   2,   6,   8,   6,   2,   4,   4],
    [  2,   2,   2,   4,   6,   4,   2,   2,   2],
    [  2,   2,   0,   4,   6,   4,   0,   2,   2],
    [  0,   2,   2,   2,   4,   2,   2,   2,   0],
    [  0,   0,   2,   2,   4,   2,   2,   0,   0],
    [  0,   0,   0,   2,   2,   2,   0,   0,   0],
    [  0,   0,   2,   2,   4,   2,   2,   0,   0],
    [  0,   2,   4,   6,   8,   6,   4,   2,   0],
    [  0,   2,   2,   4,   4,   4,   2,   2,   0],
    [  0,   0,   2,   4,   4,   4,   2,   0,   0],
];

#[rustfmt::skip]
const PST_KING_MG: [[i32; 9]; 10] = [
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0, -12, -16, -12,   0,   0,   0],
    [  0,   0,   0,  -6,  -8,  -6,   0,   0,   0],
    [  0,   0,   0,   2,   6,   2,   0,   0,   0],
];

#[rustfmt::skip]
const PST_KING_EG: [[i32; 9]; 10] = [
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   4,   8,   4,   0,   0,   0],
    [  0,   0,   0,   6,  10,   6,   0,   0,   0],
    [  0,   0,   0,   0,   4,   0,   0,   0,   0],
];

#[rustfmt::skip]
const PST_ADVISOR_MG: [[i32; 9]; 10] = [
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   2,   0,   2,   0,   0,   0],
    [  0,   0,   0,   0,   8,   0,   0,   0,   0],
    [  0,   0,   0,   4,   0,   4,   0,   0,   0],
];

#[rustfmt::skip]
const PST_ADVISOR_EG: [[i32; 9]; 10] = [
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   3,   0,   3,   0,   0,   0],
    [  0,   0,   0,   0,  10,   0,   0,   0,   0],
    [  0,   0,   0,   5,   0,   5,   0,   0,   0],
];

#[rustfmt::skip]
const PST_ELEPHANT_MG: [[i32; 9]; 10] = [
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   2,   0,   0,   0,   2,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  2,   0,   0,   0,   8,   0,   0,   0,   2],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   6,   0,   0,   0,   6,   0,   0],
];

#[rustfmt::skip]
const PST_ELEPHANT_EG: [[i32; 9]; 10] = [
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   3,   0,   0,   0,   3,   0,   0],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  3,   0,   0,   0,  10,   0,   0,   0,   3],
    [  0,   0,   0,   0,   0,   0,   0,   0,   0],
    [  0,   0,   6,   0,   0,   0,   6,   0,   0],
];

const fn pst_pair(kind: PieceKind) -> (&'static [[i32; 9]; 10], &'static [[i32; 9]; 10]) {
    match kind {
        PieceKind::King => (&PST_KING_MG, &PST_KING_EG),
        PieceKind::Advisor => (&PST_ADVISOR_MG, &PST_ADVISOR_EG),
        PieceKind::Elephant => (&PST_ELEPHANT_MG, &PST_ELEPHANT_EG),
        PieceKind::Rook => (&PST_ROOK_MG, &PST_ROOK_EG),
        PieceKind::Horse => (&PST_HORSE_MG, &PST_HORSE_EG),
        PieceKind::Cannon => (&PST_CANNON_MG, &PST_CANNON_EG),
        PieceKind::Pawn => (&PST_PAWN_MG, &PST_PAWN_EG),
    }
}

/// Phase-blended square bonus, from the given side's perspective.
pub fn tapered_pst(kind: PieceKind, color: Color, row: usize, col: usize, phase: i32) -> i32 {
    let r = match color {
        Color::Red => row,
        Color::Black => 9 - row,
    };
    let (mg_table, eg_table) = pst_pair(kind);
    let mg = mg_table[r][col];
    let eg = eg_table[r][col];
    (mg * phase + eg * (256 - phase)) >> 8
}
