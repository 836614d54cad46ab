use crate::logic::board::{Color, PieceKind, COLS, ROWS};
use std::sync::OnceLock;

const NUM_KINDS: usize = 7;
const NUM_COLORS: usize = 2;
const TABLE_SIZE: usize = NUM_KINDS * NUM_COLORS * ROWS * COLS;

/// Fixed seed so every process derives the identical key table.
const KEY_SEED: u32 = 123_456_789;

pub struct ZobristKeys {
    piece_keys: [u32; TABLE_SIZE],
    pub side_key: u32,
}

// Mulberry32: tiny deterministic generator with good enough distribution
// for hashing keys, fully reproducible across builds and processes.
struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut z = self.state;
        z = (z ^ (z >> 15)).wrapping_mul(z | 1);
        z ^= z.wrapping_add((z ^ (z >> 7)).wrapping_mul(z | 61));
        z ^ (z >> 14)
    }
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = Mulberry32::new(KEY_SEED);
        let mut piece_keys = [0u32; TABLE_SIZE];
        for key in &mut piece_keys {
            *key = rng.next();
        }
        let side_key = rng.next();

        Self {
            piece_keys,
            side_key,
        }
    }

    /// Process-wide immutable key table.
    pub fn get() -> &'static Self {
        static INSTANCE: OnceLock<ZobristKeys> = OnceLock::new();
        INSTANCE.get_or_init(ZobristKeys::new)
    }

    pub fn piece_key(&self, kind: PieceKind, color: Color, row: usize, col: usize) -> u32 {
        let idx = ((kind.index() * NUM_COLORS + color.index()) * ROWS + row) * COLS + col;
        debug_assert!(idx < TABLE_SIZE);
        self.piece_keys.get(idx).copied().unwrap_or(0)
    }
}
