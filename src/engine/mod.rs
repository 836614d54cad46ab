use crate::logic::board::{Board, Color};
use serde::{Deserialize, Serialize};

pub mod config;
pub mod eval;
pub mod move_list;
pub mod search;
pub mod tt;
pub mod zobrist;

/// A move between two squares. `score` is transient ordering metadata
/// assigned during generation; it never identifies the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Move {
    pub from_row: u8,
    pub from_col: u8,
    pub to_row: u8,
    pub to_col: u8,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub score: i32,
}

fn is_zero(score: &i32) -> bool {
    *score == 0
}

impl Move {
    #[must_use]
    pub const fn new(from_row: u8, from_col: u8, to_row: u8, to_col: u8) -> Self {
        Self {
            from_row,
            from_col,
            to_row,
            to_col,
            score: 0,
        }
    }

    /// Square-level identity, ignoring the ordering score.
    #[must_use]
    pub const fn same_squares(&self, other: &Self) -> bool {
        self.from_row == other.from_row
            && self.from_col == other.from_col
            && self.to_row == other.to_row
            && self.to_col == other.to_col
    }

    pub const fn from(&self) -> (usize, usize) {
        (self.from_row as usize, self.from_col as usize)
    }

    pub const fn to(&self) -> (usize, usize) {
        (self.to_row as usize, self.to_col as usize)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SearchStats {
    pub depth: u8,
    pub nodes: u64,
    pub time_ms: u64,
}

pub trait Evaluator {
    /// Score from `perspective`'s point of view; positive favours it.
    fn evaluate(&self, board: &Board, perspective: Color) -> i32;
}
