use crate::dark::board::{DarkAction, DarkBoard, DARK_COLS, DARK_ROWS, DARK_SQUARES, DRAW_LIMIT};
use crate::logic::board::{Color, Piece, PieceKind};
use rand::Rng;
use serde::{Deserialize, Serialize};

const INFINITY: i32 = 1_000_000;
const WIN: i32 = 100_000;
const DELTA_MARGIN: i32 = 200;

const SCORE_CAPTURE_BASE: i32 = 1_000_000;
const SCORE_ESCAPE: i32 = 800_000;
const SCORE_KILLER_PRIMARY: i32 = 600_000;
const SCORE_KILLER_SECONDARY: i32 = 599_999;

const MAX_PLY: usize = 32;

/// Material weights for the hidden-information game. Cannons rate high
/// because they ignore the rank order; pawns carry the king threat.
const fn dark_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::King => 5000,
        PieceKind::Advisor => 2000,
        PieceKind::Elephant => 1000,
        PieceKind::Rook => 800,
        PieceKind::Horse => 600,
        PieceKind::Cannon => 1500,
        PieceKind::Pawn => 300,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DarkConfig {
    pub depth: u8,
    pub quiescence_depth: u8,
    /// When set, flip nodes draw this many Monte-Carlo samples from the
    /// hidden pool instead of enumerating every identity.
    pub mc_samples: Option<u32>,
}

impl Default for DarkConfig {
    fn default() -> Self {
        DarkDifficulty::Medium.config()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DarkDifficulty {
    Beginner,
    Easy,
    Medium,
    Hard,
}

impl DarkDifficulty {
    #[must_use]
    pub const fn config(self) -> DarkConfig {
        match self {
            Self::Beginner => DarkConfig {
                depth: 2,
                quiescence_depth: 2,
                mc_samples: None,
            },
            Self::Easy => DarkConfig {
                depth: 3,
                quiescence_depth: 2,
                mc_samples: None,
            },
            Self::Medium => DarkConfig {
                depth: 4,
                quiescence_depth: 3,
                mc_samples: None,
            },
            Self::Hard => DarkConfig {
                depth: 5,
                quiescence_depth: 3,
                mc_samples: Some(24),
            },
        }
    }
}

/// Alpha-beta negamax over move actions with expectimax flip nodes:
/// each flip averages the search value over the identities the hidden
/// pool could still supply, weighted by their remaining counts.
pub struct DarkEngine {
    killers: [[Option<DarkAction>; 2]; MAX_PLY],
    move_history: [[i32; DARK_SQUARES]; DARK_SQUARES],
    flip_history: [i32; DARK_SQUARES],
    nodes: u64,
}

impl Default for DarkEngine {
    fn default() -> Self {
        Self::new()
    }
}

const fn square(row: usize, col: usize) -> usize {
    row * DARK_COLS + col
}

impl DarkEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            killers: [[None; 2]; MAX_PLY],
            move_history: [[0; DARK_SQUARES]; DARK_SQUARES],
            flip_history: [0; DARK_SQUARES],
            nodes: 0,
        }
    }

    #[must_use]
    pub const fn nodes_searched(&self) -> u64 {
        self.nodes
    }

    /// Pick an action for `side`, or `None` when it has no actions. The
    /// RNG feeds Monte-Carlo flip sampling; with `mc_samples` unset the
    /// search is deterministic and the RNG untouched.
    pub fn find_best_action<R: Rng>(
        &mut self,
        board: &mut DarkBoard,
        side: Color,
        config: &DarkConfig,
        rng: &mut R,
    ) -> Option<DarkAction> {
        self.killers = [[None; 2]; MAX_PLY];
        self.move_history = [[0; DARK_SQUARES]; DARK_SQUARES];
        self.flip_history = [0; DARK_SQUARES];
        self.nodes = 0;

        let mut actions = board.legal_actions(side);
        if actions.is_empty() {
            return None;
        }
        if actions.len() == 1 {
            return actions.pop();
        }
        self.order_actions(board, side, &mut actions, 0);

        let depth = i32::from(config.depth);
        let mut alpha = -INFINITY;
        let mut best = None;
        for action in &actions {
            let value = self.action_value(
                board,
                side,
                action,
                depth - 1,
                1,
                alpha,
                INFINITY,
                config,
                rng,
            );
            if value > alpha {
                alpha = value;
                best = Some(*action);
            }
        }
        tracing::debug!(nodes = self.nodes, "dark search finished");
        best.or_else(|| actions.first().copied())
    }

    #[allow(clippy::too_many_arguments)]
    fn action_value<R: Rng>(
        &mut self,
        board: &mut DarkBoard,
        side: Color,
        action: &DarkAction,
        depth: i32,
        ply: usize,
        alpha: i32,
        beta: i32,
        config: &DarkConfig,
        rng: &mut R,
    ) -> i32 {
        match *action {
            DarkAction::Move { .. } => {
                let undo = board.apply(action);
                let value =
                    -self.negamax(board, side.opposite(), depth, ply, -beta, -alpha, config, rng);
                board.undo(&undo);
                value
            }
            DarkAction::Flip { row, col } => {
                self.flip_value(board, side, row, col, depth, ply, config, rng)
            }
        }
    }

    /// Chance node: the flipped cell could be any identity left in the
    /// hidden pool. Each outcome substitutes the identity, evaluates
    /// the revealed position, and the results are averaged by their
    /// remaining counts. The average cannot be cut the way a max can,
    /// and recursing through every outcome multiplies the branching by
    /// the pool size, so flip children stay at evaluation depth.
    #[allow(clippy::too_many_arguments)]
    fn flip_value<R: Rng>(
        &mut self,
        board: &mut DarkBoard,
        side: Color,
        row: usize,
        col: usize,
        _depth: i32,
        _ply: usize,
        config: &DarkConfig,
        rng: &mut R,
    ) -> i32 {
        let (pool, total) = board.hidden_pool();
        if total == 0 {
            return 0;
        }

        if let Some(samples) = config.mc_samples {
            // Monte-Carlo: draw identities with replacement, weighted
            // by their remaining counts.
            let mut sum: i64 = 0;
            for _ in 0..samples {
                let mut pick = rng.gen_range(0..total);
                let mut piece = None;
                'outer: for color in [Color::Red, Color::Black] {
                    for kind in KINDS {
                        let count = pool[color.index()][kind.index()];
                        if pick < count {
                            piece = Some(Piece::new(kind, color));
                            break 'outer;
                        }
                        pick -= count;
                    }
                }
                let Some(piece) = piece else { break };
                sum += i64::from(self.flip_outcome(board, side, row, col, piece));
            }
            (sum / i64::from(samples)) as i32
        } else {
            let mut weighted: i64 = 0;
            for color in [Color::Red, Color::Black] {
                for kind in KINDS {
                    let count = pool[color.index()][kind.index()];
                    if count == 0 {
                        continue;
                    }
                    let value =
                        self.flip_outcome(board, side, row, col, Piece::new(kind, color));
                    weighted += i64::from(count) * i64::from(value);
                }
            }
            (weighted / i64::from(total)) as i32
        }
    }

    fn flip_outcome(
        &mut self,
        board: &mut DarkBoard,
        side: Color,
        row: usize,
        col: usize,
        piece: Piece,
    ) -> i32 {
        self.nodes += 1;
        let (original, prev_quiet) = board.flip_as(row, col, piece);
        let value = self.evaluate(board, side);
        board.undo_flip_as(row, col, original, prev_quiet);
        value
    }

    #[allow(clippy::too_many_arguments)]
    fn negamax<R: Rng>(
        &mut self,
        board: &mut DarkBoard,
        side: Color,
        depth: i32,
        ply: usize,
        mut alpha: i32,
        beta: i32,
        config: &DarkConfig,
        rng: &mut R,
    ) -> i32 {
        self.nodes += 1;

        if board.piece_count(side.opposite()) == 0 {
            return WIN - ply as i32;
        }
        if board.quiet_actions >= DRAW_LIMIT {
            return 0;
        }

        let mut actions = board.legal_actions(side);
        if actions.is_empty() {
            return -(WIN - ply as i32);
        }
        if depth <= 0 {
            return self.quiescence(board, side, alpha, beta, config.quiescence_depth);
        }

        self.order_actions(board, side, &mut actions, ply);

        let mut best = -INFINITY;
        for action in &actions {
            let value = self.action_value(
                board,
                side,
                action,
                depth - 1,
                ply + 1,
                alpha,
                beta,
                config,
                rng,
            );
            if value > best {
                best = value;
            }
            if value > alpha {
                alpha = value;
            }
            if alpha >= beta {
                self.remember_cutoff(board, action, ply, depth);
                break;
            }
        }
        best
    }

    fn quiescence(
        &mut self,
        board: &mut DarkBoard,
        side: Color,
        mut alpha: i32,
        beta: i32,
        qdepth: u8,
    ) -> i32 {
        self.nodes += 1;

        let stand_pat = self.evaluate(board, side);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }
        if qdepth == 0 {
            return alpha;
        }

        // Captures only, strongest victims first.
        let mut captures: Vec<(DarkAction, i32, i32)> = board
            .legal_actions(side)
            .into_iter()
            .filter_map(|action| {
                let DarkAction::Move { from, to } = action else {
                    return None;
                };
                let victim = board.get(to.0, to.1)?;
                let attacker = board
                    .get(from.0, from.1)
                    .map_or(0, |c| dark_value(c.piece.kind));
                let victim_value = dark_value(victim.piece.kind);
                Some((action, victim_value, victim_value * 10 - attacker))
            })
            .collect();
        captures.sort_by(|a, b| b.2.cmp(&a.2));

        for (action, victim_value, _) in captures {
            if stand_pat + victim_value + DELTA_MARGIN <= alpha {
                continue;
            }
            let undo = board.apply(&action);
            let score = -self.quiescence(board, side.opposite(), -beta, -alpha, qdepth - 1);
            board.undo(&undo);
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }
        alpha
    }

    /// Material with hidden cells valued at the pool expectation, plus
    /// a hanging-piece term for revealed pieces under threat.
    fn evaluate(&self, board: &DarkBoard, side: Color) -> i32 {
        let (pool, _) = board.hidden_pool();

        let mut hidden_sum: i64 = 0;
        for color in [Color::Red, Color::Black] {
            let sign = if color == side { 1 } else { -1 };
            for kind in KINDS {
                let count = pool[color.index()][kind.index()];
                hidden_sum += i64::from(sign) * i64::from(count) * i64::from(dark_value(kind));
            }
        }

        let mut score = hidden_sum as i32;
        for row in 0..DARK_ROWS {
            for col in 0..DARK_COLS {
                let Some(cell) = board.get(row, col) else {
                    continue;
                };
                if !cell.revealed {
                    continue;
                }
                let sign = if cell.piece.color == side { 1 } else { -1 };
                score += sign * dark_value(cell.piece.kind);
                if board.is_threatened(row, col) {
                    score -= sign * dark_value(cell.piece.kind) / 4;
                }
            }
        }
        score
    }

    fn order_actions(
        &self,
        board: &DarkBoard,
        side: Color,
        actions: &mut [DarkAction],
        ply: usize,
    ) {
        let killers = self.killers[ply.min(MAX_PLY - 1)];
        let mut scored: Vec<(i32, DarkAction)> = actions
            .iter()
            .map(|action| (self.score_action(board, side, action, &killers), *action))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        for (slot, (_, action)) in actions.iter_mut().zip(scored) {
            *slot = action;
        }
    }

    fn score_action(
        &self,
        board: &DarkBoard,
        side: Color,
        action: &DarkAction,
        killers: &[Option<DarkAction>; 2],
    ) -> i32 {
        match *action {
            DarkAction::Move { from, to } => {
                if let Some(victim) = board.get(to.0, to.1) {
                    let attacker = board
                        .get(from.0, from.1)
                        .map_or(0, |c| dark_value(c.piece.kind));
                    return SCORE_CAPTURE_BASE + dark_value(victim.piece.kind) - attacker;
                }
                if board.is_threatened(from.0, from.1) && !board.is_threatened(to.0, to.1) {
                    return SCORE_ESCAPE;
                }
                if killers[0] == Some(*action) {
                    return SCORE_KILLER_PRIMARY;
                }
                if killers[1] == Some(*action) {
                    return SCORE_KILLER_SECONDARY;
                }
                self.move_history[square(from.0, from.1)][square(to.0, to.1)]
            }
            DarkAction::Flip { row, col } => {
                // Safer flips first: fewer revealed enemies nearby.
                let exposure = board.adjacent_enemies(row, col, side) as i32;
                self.flip_history[square(row, col)] + (4 - exposure) * 4
            }
        }
    }

    fn remember_cutoff(&mut self, board: &DarkBoard, action: &DarkAction, ply: usize, depth: i32) {
        match *action {
            DarkAction::Move { from, to } => {
                if board.get(to.0, to.1).is_some() {
                    return;
                }
                let slot = &mut self.killers[ply.min(MAX_PLY - 1)];
                if slot[0] != Some(*action) {
                    slot[1] = slot[0];
                    slot[0] = Some(*action);
                }
                self.move_history[square(from.0, from.1)][square(to.0, to.1)] += depth * depth;
            }
            DarkAction::Flip { row, col } => {
                self.flip_history[square(row, col)] += depth * depth;
            }
        }
    }
}

const KINDS: [PieceKind; 7] = [
    PieceKind::King,
    PieceKind::Advisor,
    PieceKind::Elephant,
    PieceKind::Rook,
    PieceKind::Horse,
    PieceKind::Cannon,
    PieceKind::Pawn,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dark::board::DarkCell;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn revealed(kind: PieceKind, color: Color) -> Option<DarkCell> {
        Some(DarkCell {
            piece: Piece::new(kind, color),
            revealed: true,
        })
    }

    fn hidden(kind: PieceKind, color: Color) -> Option<DarkCell> {
        Some(DarkCell {
            piece: Piece::new(kind, color),
            revealed: false,
        })
    }

    #[test]
    fn takes_the_free_capture() {
        let mut board = DarkBoard::empty();
        board.set(1, 1, revealed(PieceKind::Rook, Color::Red));
        board.set(1, 2, revealed(PieceKind::Horse, Color::Black));
        board.set(3, 7, revealed(PieceKind::King, Color::Black));
        board.set(0, 0, revealed(PieceKind::King, Color::Red));

        let mut engine = DarkEngine::new();
        let mut rng = StdRng::seed_from_u64(1);
        let action = engine
            .find_best_action(&mut board, Color::Red, &DarkDifficulty::Medium.config(), &mut rng)
            .unwrap();
        assert_eq!(
            action,
            DarkAction::Move {
                from: (1, 1),
                to: (1, 2)
            }
        );
    }

    #[test]
    fn search_restores_the_board() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut board = DarkBoard::new_shuffled(&mut rng);
        let before = board.clone();

        let mut engine = DarkEngine::new();
        let action = engine.find_best_action(
            &mut board,
            Color::Red,
            &DarkDifficulty::Easy.config(),
            &mut rng,
        );
        assert!(action.is_some());
        assert_eq!(board, before);
    }

    #[test]
    fn no_actions_returns_none() {
        let mut board = DarkBoard::empty();
        board.set(0, 0, revealed(PieceKind::King, Color::Black));

        let mut engine = DarkEngine::new();
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(
            engine.find_best_action(
                &mut board,
                Color::Red,
                &DarkDifficulty::Beginner.config(),
                &mut rng
            ),
            None
        );
    }

    #[test]
    fn lone_flip_is_returned_directly() {
        let mut board = DarkBoard::empty();
        board.set(2, 2, hidden(PieceKind::Pawn, Color::Black));

        let mut engine = DarkEngine::new();
        let mut rng = StdRng::seed_from_u64(9);
        let action = engine.find_best_action(
            &mut board,
            Color::Red,
            &DarkDifficulty::Medium.config(),
            &mut rng,
        );
        assert_eq!(action, Some(DarkAction::Flip { row: 2, col: 2 }));
        assert_eq!(engine.nodes_searched(), 0);
    }

    #[test]
    fn avoids_feeding_the_stronger_piece() {
        // A red horse next to a revealed black rook should step away,
        // not stay adjacent to it.
        let mut board = DarkBoard::empty();
        board.set(1, 1, revealed(PieceKind::Horse, Color::Red));
        board.set(1, 0, revealed(PieceKind::Rook, Color::Black));
        board.set(0, 0, revealed(PieceKind::King, Color::Red));
        board.set(3, 7, revealed(PieceKind::King, Color::Black));

        let mut engine = DarkEngine::new();
        let mut rng = StdRng::seed_from_u64(11);
        let action = engine
            .find_best_action(&mut board, Color::Red, &DarkDifficulty::Medium.config(), &mut rng)
            .unwrap();
        if let DarkAction::Move { from, to } = action {
            if from == (1, 1) {
                assert_ne!(to, (1, 0), "horse cannot capture a rook");
            }
        }
    }

    #[test]
    fn monte_carlo_flip_sampling_still_answers() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut board = DarkBoard::new_shuffled(&mut rng);

        let mut engine = DarkEngine::new();
        let config = DarkConfig {
            depth: 3,
            quiescence_depth: 2,
            mc_samples: Some(8),
        };
        let action = engine.find_best_action(&mut board, Color::Red, &config, &mut rng);
        assert!(action.is_some());
    }
}
