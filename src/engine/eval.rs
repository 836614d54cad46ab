use crate::engine::Evaluator;
use crate::logic::board::{crossed_river, Board, Color, PieceKind, COLS, ROWS};
use crate::logic::eval_constants::{phase_weight, piece_value, tapered_pst, TOTAL_PHASE};
use crate::logic::rules::in_check;
use rand::Rng;

const CHECK_BONUS: i32 = 200;
const TROPISM_REACH: i32 = 14;

// Positions of one side's long-range pieces, gathered in a single grid
// pass. Fixed capacity keeps evaluation off the heap; pathological test
// boards simply stop being tracked past the cap.
const TRACK_CAP: usize = 8;
const PAWN_CAP: usize = 16;

struct Tracked<const N: usize> {
    at: [(usize, usize); N],
    len: usize,
}

impl<const N: usize> Default for Tracked<N> {
    fn default() -> Self {
        Self {
            at: [(0, 0); N],
            len: 0,
        }
    }
}

impl<const N: usize> Tracked<N> {
    fn push(&mut self, pos: (usize, usize)) {
        if let Some(slot) = self.at.get_mut(self.len) {
            *slot = pos;
            self.len += 1;
        }
    }

    fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.at.iter().copied().take(self.len)
    }
}

struct Squad {
    material: i32,
    pst: i32,
    advisors: i32,
    elephants: i32,
    has_heavy: bool,
    rooks: Tracked<TRACK_CAP>,
    cannons: Tracked<TRACK_CAP>,
    horses: Tracked<TRACK_CAP>,
    pawns: Tracked<PAWN_CAP>,
}

fn collect(board: &Board, side: Color, phase: i32) -> Squad {
    let mut squad = Squad {
        material: 0,
        pst: 0,
        advisors: 0,
        elephants: 0,
        has_heavy: false,
        rooks: Tracked::default(),
        cannons: Tracked::default(),
        horses: Tracked::default(),
        pawns: Tracked::default(),
    };
    for row in 0..ROWS {
        for col in 0..COLS {
            let Some(piece) = board.get(row, col) else {
                continue;
            };
            if piece.color != side {
                continue;
            }
            squad.material += piece_value(piece.kind);
            squad.pst += tapered_pst(piece.kind, side, row, col, phase);
            match piece.kind {
                PieceKind::Advisor => squad.advisors += 1,
                PieceKind::Elephant => squad.elephants += 1,
                PieceKind::Rook => {
                    squad.has_heavy = true;
                    squad.rooks.push((row, col));
                }
                PieceKind::Cannon => {
                    squad.has_heavy = true;
                    squad.cannons.push((row, col));
                }
                PieceKind::Horse => squad.horses.push((row, col)),
                PieceKind::Pawn => squad.pawns.push((row, col)),
                PieceKind::King => {}
            }
        }
    }
    squad
}

/// Phase scalar: 256 at full material, 0 once the weighted piece count
/// runs dry.
pub fn game_phase(board: &Board) -> i32 {
    let mut current = 0;
    for row in 0..ROWS {
        for col in 0..COLS {
            if let Some(piece) = board.get(row, col) {
                current += phase_weight(piece.kind);
            }
        }
    }
    (current * 256 / TOTAL_PHASE).min(256)
}

/// Tapered material + positional evaluation, side-relative: the final
/// score is `score(perspective) - score(opponent)`.
pub struct TaperedEvaluator {
    pub randomness: i32,
}

impl TaperedEvaluator {
    #[must_use]
    pub const fn new(randomness: i32) -> Self {
        Self { randomness }
    }

    fn side_score(&self, board: &Board, side: Color, phase: i32, own: &Squad, enemy: &Squad) -> i32 {
        let mut score = own.material + own.pst;

        // King safety: defenders matter most while heavy pieces remain,
        // so the whole term is phase-scaled.
        let mut safety = own.advisors * 20 + own.elephants * 12;
        if own.advisors >= 2 {
            safety += 25;
        }
        if own.elephants >= 2 {
            safety += 15;
        }
        if enemy.has_heavy {
            if own.advisors == 0 {
                safety -= 40;
            }
            if own.elephants == 0 {
                safety -= 25;
            }
        }
        score += safety * phase / 256;

        // Activity past the river.
        score += own
            .rooks
            .iter()
            .filter(|&(r, _)| crossed_river(side, r))
            .count() as i32
            * 30;
        score += own
            .horses
            .iter()
            .filter(|&(r, _)| crossed_river(side, r))
            .count() as i32
            * 20;
        score += own
            .cannons
            .iter()
            .filter(|&(r, _)| crossed_river(side, r))
            .count() as i32
            * 15;

        // Tropism of the attacking pieces toward the enemy king.
        if let Some((kr, kc)) = board.find_king(side.opposite()) {
            for (r, c) in own
                .rooks
                .iter()
                .chain(own.cannons.iter())
                .chain(own.horses.iter())
            {
                let dist = (r.abs_diff(kr) + c.abs_diff(kc)) as i32;
                score += (TROPISM_REACH - dist).max(0) * 2;
            }
        }

        // Connected pawns: same row, adjacent files.
        for i in 0..own.pawns.len {
            let (ar, ac) = own.pawns.at[i];
            for j in i + 1..own.pawns.len {
                let (br, bc) = own.pawns.at[j];
                if ar == br && ac.abs_diff(bc) == 1 {
                    score += 15;
                }
            }
        }

        // Rooks on files free of their own pawns.
        for (_, rc) in own.rooks.iter() {
            if !own.pawns.iter().any(|(_, pc)| pc == rc) {
                score += 20;
            }
        }

        // Cannons want crowded boards and nearby screens.
        let total = board.piece_count() as i32;
        for (cr, cc) in own.cannons.iter() {
            let mut screens = 0;
            for col in 0..COLS {
                if col != cc && board.get(cr, col).is_some() {
                    screens += 1;
                }
            }
            for row in 0..ROWS {
                if row != cr && board.get(row, cc).is_some() {
                    screens += 1;
                }
            }
            score += (total - 16) * 2 + screens.min(4) * 5;
        }

        // Horse freedom: each occupied orthogonal neighbour blocks a leg.
        for (hr, hc) in own.horses.iter() {
            let mut blocked = 0;
            for (dr, dc) in [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)] {
                let (nr, nc) = (hr as isize + dr, hc as isize + dc);
                if (0..ROWS as isize).contains(&nr)
                    && (0..COLS as isize).contains(&nc)
                    && board.get(nr as usize, nc as usize).is_some()
                {
                    blocked += 1;
                }
            }
            score += 12 - blocked * 8;
        }

        // Exposure along the king's file, looking toward the enemy camp.
        if let Some((kr, kc)) = board.find_king(side) {
            let step = side.forward();
            let mut row = kr as isize + step;
            let mut seen = 0;
            while (0..ROWS as isize).contains(&row) {
                if let Some(piece) = board.get(row as usize, kc) {
                    seen += 1;
                    if seen == 1 {
                        if piece.color != side && piece.kind == PieceKind::Rook {
                            score -= 40;
                        }
                    } else {
                        if piece.color != side && piece.kind == PieceKind::Cannon {
                            score -= 35;
                        }
                        break;
                    }
                }
                row += step;
            }
        }

        score
    }
}

impl Evaluator for TaperedEvaluator {
    fn evaluate(&self, board: &Board, perspective: Color) -> i32 {
        let phase = game_phase(board);
        let own = collect(board, perspective, phase);
        let enemy = collect(board, perspective.opposite(), phase);

        let mut score = self.side_score(board, perspective, phase, &own, &enemy)
            - self.side_score(board, perspective.opposite(), phase, &enemy, &own);

        if in_check(board, perspective.opposite()) {
            score += CHECK_BONUS;
        }
        if in_check(board, perspective) {
            score -= CHECK_BONUS;
        }

        if self.randomness > 0 {
            score += rand::thread_rng().gen_range(-self.randomness..=self.randomness);
        }
        score
    }
}
