use crate::engine::config::SearchConfig;
use crate::engine::eval::TaperedEvaluator;
use crate::engine::move_list::MoveList;
use crate::engine::tt::{TranspositionTable, TtFlag};
use crate::engine::{Evaluator, Move, SearchStats};
use crate::logic::board::{Board, Color, SQUARES};
use crate::logic::eval_constants::{piece_value, VAL_KING, VAL_ROOK};
use crate::logic::movegen::{
    generate_all_legal_moves, generate_side_moves, is_square_attacked, kings_facing,
};
use crate::logic::rules::in_check;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const INFINITY: i32 = 200_000;
const MAX_PLY: usize = 64;
const TIME_CHECK_INTERVAL: u64 = 4096;
const ASPIRATION_WINDOW: i32 = 50;
const ASPIRATION_SCORE_CAP: i32 = 9000;
// Null move is unsound once material thins out; zugzwang takes over.
const NULL_MOVE_MIN_PIECES: u32 = 10;
const FUTILITY_MARGINS: [i32; 4] = [0, 200, 450, 700];
const HISTORY_CAP: i32 = 500_000;
const DELTA_MARGIN: i32 = 200;

const SCORE_TT_MOVE: i32 = 2_000_000;
const SCORE_CAPTURE_BASE: i32 = 1_000_000;
const SCORE_KILLER_PRIMARY: i32 = 900_000;
const SCORE_KILLER_SECONDARY: i32 = 899_999;

/// Cloneable cancellation handle. The periodic node-count poll observes
/// it, so a caller on another thread can stop a running search.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Iterative-deepening principal-variation search over the Xiangqi
/// core. One instance owns one transposition table; killer and history
/// heuristics reset per invocation, the table persists and ages.
pub struct SearchEngine {
    evaluator: TaperedEvaluator,
    tt: TranspositionTable,
    killers: [[Option<Move>; 2]; MAX_PLY],
    history: Box<[[[i32; SQUARES]; SQUARES]]>,
    nodes: u64,
    start: Instant,
    budget: Duration,
    aborted: bool,
    abort_flag: Arc<AtomicBool>,
    max_depth: u8,
    qdepth: u8,
    last_depth: u8,
    last_time_ms: u64,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            evaluator: TaperedEvaluator::new(0),
            tt: TranspositionTable::new(),
            killers: [[None; 2]; MAX_PLY],
            history: vec![[[0; SQUARES]; SQUARES]; 2].into_boxed_slice(),
            nodes: 0,
            start: Instant::now(),
            budget: Duration::ZERO,
            aborted: false,
            abort_flag: Arc::default(),
            max_depth: 0,
            qdepth: 0,
            last_depth: 0,
            last_time_ms: 0,
        }
    }

    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle(self.abort_flag.clone())
    }

    #[must_use]
    pub const fn nodes_searched(&self) -> u64 {
        self.nodes
    }

    #[must_use]
    pub const fn last_iteration_depth(&self) -> u8 {
        self.last_depth
    }

    #[must_use]
    pub const fn stats(&self) -> SearchStats {
        SearchStats {
            depth: self.last_depth,
            nodes: self.nodes,
            time_ms: self.last_time_ms,
        }
    }

    /// Pick a move for `side`. The board is mutated only through
    /// make/unmake pairs and is bit-identical on return. Returns `None`
    /// only when the side has no legal move.
    pub fn find_best_move(
        &mut self,
        board: &mut Board,
        side: Color,
        config: &SearchConfig,
    ) -> Option<Move> {
        self.nodes = 0;
        self.aborted = false;
        self.abort_flag.store(false, Ordering::Relaxed);
        self.killers = [[None; 2]; MAX_PLY];
        for table in self.history.iter_mut() {
            for row in table.iter_mut() {
                row.fill(0);
            }
        }
        self.tt.new_search();
        self.start = Instant::now();
        self.budget = Duration::from_millis(config.time_budget_ms);
        self.max_depth = config.depth;
        self.qdepth = config.quiescence_depth;
        self.last_depth = 0;

        let root_moves = generate_all_legal_moves(board, side);
        if root_moves.is_empty() {
            return None;
        }
        if root_moves.len() == 1 {
            // Forced move: answer without searching.
            return root_moves.first().copied();
        }

        let mut best: Option<Move> = None;
        let mut prev_score: Option<i32> = None;

        for depth in 1..=self.max_depth {
            let (mut alpha, mut beta) = (-INFINITY, INFINITY);
            if depth >= 4 {
                if let Some(prev) = prev_score {
                    if prev.abs() < ASPIRATION_SCORE_CAP {
                        alpha = prev - ASPIRATION_WINDOW;
                        beta = prev + ASPIRATION_WINDOW;
                    }
                }
            }

            let mut iter_best = None;
            let mut score = self.search_root(board, side, depth, alpha, beta, best, &mut iter_best);
            if self.aborted {
                break;
            }
            if score <= alpha || score >= beta {
                // Aspiration failed; redo the iteration with full bounds.
                iter_best = None;
                score =
                    self.search_root(board, side, depth, -INFINITY, INFINITY, best, &mut iter_best);
                if self.aborted {
                    break;
                }
            }

            if let Some(mv) = iter_best {
                best = Some(mv);
                prev_score = Some(score);
                self.last_depth = depth;
                tracing::debug!(depth, score, nodes = self.nodes, "iteration complete");
            }

            // Starting another iteration this late rarely finishes it.
            if self.start.elapsed() >= self.budget * 6 / 10 {
                break;
            }
        }

        let mut chosen = best.or_else(|| root_moves.first().copied());
        if config.randomness > 0 {
            chosen = self
                .jittered_choice(board, side, &root_moves, config)
                .or(chosen);
        }

        self.last_time_ms = self.start.elapsed().as_millis() as u64;
        tracing::debug!(
            depth = self.last_depth,
            nodes = self.nodes,
            time_ms = self.last_time_ms,
            "search finished"
        );
        chosen
    }

    fn search_root(
        &mut self,
        board: &mut Board,
        side: Color,
        depth: u8,
        mut alpha: i32,
        beta: i32,
        prior_best: Option<Move>,
        out_best: &mut Option<Move>,
    ) -> i32 {
        let tt_move = prior_best.or_else(|| self.tt.best_move(board.hash()));
        let mut moves = generate_all_legal_moves(board, side);
        for mv in &mut moves {
            mv.score = self.order_score(board, side, mv, tt_move, 0);
        }
        moves.sort_by(|a, b| b.score.cmp(&a.score));

        let mut best_score = -INFINITY;
        let mut searched = 0usize;

        for mv in &moves {
            let record = board.make_move(mv);
            let value = if searched == 0 {
                self.negamax(board, side.opposite(), i32::from(depth) - 1, 1, -beta, -alpha, true)
            } else {
                let mut probe = self.negamax(
                    board,
                    side.opposite(),
                    i32::from(depth) - 1,
                    1,
                    -alpha - 1,
                    -alpha,
                    true,
                );
                if let Some(v) = probe {
                    if -v > alpha && -v < beta {
                        probe = self.negamax(
                            board,
                            side.opposite(),
                            i32::from(depth) - 1,
                            1,
                            -beta,
                            -alpha,
                            true,
                        );
                    }
                }
                probe
            };
            board.unmake(&record);

            let Some(v) = value else {
                // Timed out mid-iteration; the caller discards it.
                return 0;
            };
            let score = -v;
            searched += 1;

            if score > best_score {
                best_score = score;
                *out_best = Some(*mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }
        best_score
    }

    #[allow(clippy::too_many_lines)]
    fn negamax(
        &mut self,
        board: &mut Board,
        side: Color,
        depth: i32,
        ply: usize,
        mut alpha: i32,
        beta: i32,
        allow_null: bool,
    ) -> Option<i32> {
        self.nodes += 1;
        if self.nodes % TIME_CHECK_INTERVAL == 0 {
            self.poll_stop();
        }
        if self.aborted {
            return None;
        }

        let hash = board.hash();
        let mut tt_move = None;
        if let Some(entry) = self.tt.probe(hash) {
            tt_move = entry.best_move;
            if i32::from(entry.depth) >= depth {
                match entry.flag {
                    TtFlag::Exact => return Some(entry.score),
                    TtFlag::Lower if entry.score >= beta => return Some(entry.score),
                    TtFlag::Upper if entry.score <= alpha => return Some(entry.score),
                    _ => {}
                }
            }
        }

        let checked = in_check(board, side);
        let mut depth = depth;
        if checked && ply < self.max_depth as usize + 6 {
            depth += 1;
        }

        if depth <= 0 {
            return Some(self.quiescence(board, side, alpha, beta, self.qdepth));
        }

        if allow_null && !checked && depth >= 3 && board.piece_count() > NULL_MOVE_MIN_PIECES {
            let r = if depth > 6 { 3 } else { 2 };
            board.make_null_move();
            let probe = self.negamax(
                board,
                side.opposite(),
                depth - 1 - r,
                ply + 1,
                -beta,
                -beta + 1,
                false,
            );
            board.make_null_move();
            match probe {
                None => return None,
                Some(v) => {
                    if -v >= beta {
                        return Some(beta);
                    }
                }
            }
        }

        let mut moves = MoveList::new();
        generate_side_moves(board, side, &mut moves);
        for mv in moves.iter_mut() {
            mv.score = self.order_score(board, side, mv, tt_move, ply);
        }
        moves.sort_by_score_desc();

        let static_eval = if depth <= 3 && !checked {
            self.evaluator.evaluate(board, side)
        } else {
            0
        };

        let mut best_score = -INFINITY;
        let mut best_move: Option<Move> = None;
        let mut flag = TtFlag::Upper;
        let mut searched = 0usize;

        for mv in moves.as_slice() {
            let is_capture = board.get(mv.to_row as usize, mv.to_col as usize).is_some();

            // Futility: a quiet move this far below alpha will not save
            // the node at shallow depth. Never skipped before the first
            // legal move has been searched, so an empty node is always
            // recognised as terminal rather than as a fail-low.
            if !checked && depth <= 3 && !is_capture && searched > 0 {
                let margin = FUTILITY_MARGINS
                    .get(depth as usize)
                    .copied()
                    .unwrap_or(i32::MAX);
                if static_eval + margin <= alpha {
                    continue;
                }
            }

            let record = board.make_move(mv);
            let king_safe = match board.find_king(side) {
                Some((kr, kc)) => !is_square_attacked(board, kr, kc, side.opposite()),
                None => true,
            };
            if !king_safe || kings_facing(board) {
                board.unmake(&record);
                continue;
            }
            let gives_check = in_check(board, side.opposite());

            let mut reduction = 0;
            if depth >= 3 && searched >= 3 && !is_capture && !checked && !gives_check {
                reduction = if searched >= 6 { 2 } else { 1 };
            }

            let value = if searched == 0 {
                self.negamax(board, side.opposite(), depth - 1, ply + 1, -beta, -alpha, true)
            } else {
                let mut probe = self.negamax(
                    board,
                    side.opposite(),
                    depth - 1 - reduction,
                    ply + 1,
                    -alpha - 1,
                    -alpha,
                    true,
                );
                if let Some(v) = probe {
                    if -v > alpha && reduction > 0 {
                        // Fail-high under reduction: verify at full depth.
                        probe = self.negamax(
                            board,
                            side.opposite(),
                            depth - 1,
                            ply + 1,
                            -alpha - 1,
                            -alpha,
                            true,
                        );
                    }
                }
                if let Some(v) = probe {
                    if -v > alpha && -v < beta {
                        probe = self.negamax(
                            board,
                            side.opposite(),
                            depth - 1,
                            ply + 1,
                            -beta,
                            -alpha,
                            true,
                        );
                    }
                }
                probe
            };
            board.unmake(&record);

            let Some(v) = value else {
                return None;
            };
            let score = -v;
            searched += 1;

            if score > best_score {
                best_score = score;
                best_move = Some(*mv);
            }
            if score > alpha {
                alpha = score;
                flag = TtFlag::Exact;
            }
            if alpha >= beta {
                if !is_capture {
                    self.remember_cutoff(side, mv, ply, depth);
                }
                flag = TtFlag::Lower;
                break;
            }
        }

        if searched == 0 {
            // No legal move: losing, mated or stalemated, and losing
            // sooner is worse.
            return Some(-VAL_KING - depth);
        }

        self.tt.store(
            hash,
            u8::try_from(depth).unwrap_or(u8::MAX),
            best_score,
            flag,
            best_move,
        );
        Some(best_score)
    }

    fn quiescence(&mut self, board: &mut Board, side: Color, mut alpha: i32, beta: i32, qdepth: u8) -> i32 {
        self.nodes += 1;
        if self.nodes % TIME_CHECK_INTERVAL == 0 {
            self.poll_stop();
        }
        if self.aborted {
            return alpha;
        }

        // A checked side gets no stand-pat and no pruning shortcut: the
        // node is only as good as its best evasion, and no evasion at
        // all is mate regardless of what the static score says.
        let checked = in_check(board, side);
        if checked {
            let mut moves = MoveList::new();
            generate_side_moves(board, side, &mut moves);

            let mut any_legal = false;
            for mv in moves.as_slice() {
                let record = board.make_move(mv);
                let king_safe = match board.find_king(side) {
                    Some((kr, kc)) => !is_square_attacked(board, kr, kc, side.opposite()),
                    None => true,
                };
                if !king_safe || kings_facing(board) {
                    board.unmake(&record);
                    continue;
                }
                any_legal = true;
                let score = -self.quiescence(
                    board,
                    side.opposite(),
                    -beta,
                    -alpha,
                    qdepth.saturating_sub(1),
                );
                board.unmake(&record);
                if score >= beta {
                    return beta;
                }
                if score > alpha {
                    alpha = score;
                }
            }
            if !any_legal {
                return -VAL_KING;
            }
            return alpha;
        }

        let stand_pat = self.evaluator.evaluate(board, side);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat + VAL_ROOK + DELTA_MARGIN < alpha {
            return alpha;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }
        if qdepth == 0 {
            return alpha;
        }

        let mut moves = MoveList::new();
        generate_side_moves(board, side, &mut moves);

        let mut captures = MoveList::new();
        for mv in moves.as_slice() {
            if let Some(victim) = board.get(mv.to_row as usize, mv.to_col as usize) {
                let mut scored = *mv;
                scored.score = piece_value(victim.kind);
                captures.push(scored);
            }
        }
        captures.sort_by_score_desc();

        for mv in captures.as_slice() {
            // Per-move delta: only victims that could lift alpha.
            if stand_pat + mv.score + DELTA_MARGIN <= alpha {
                continue;
            }
            let record = board.make_move(mv);
            let king_safe = match board.find_king(side) {
                Some((kr, kc)) => !is_square_attacked(board, kr, kc, side.opposite()),
                None => true,
            };
            if !king_safe || kings_facing(board) {
                board.unmake(&record);
                continue;
            }
            let score = -self.quiescence(board, side.opposite(), -beta, -alpha, qdepth - 1);
            board.unmake(&record);
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }
        alpha
    }

    fn order_score(
        &self,
        board: &Board,
        side: Color,
        mv: &Move,
        tt_move: Option<Move>,
        ply: usize,
    ) -> i32 {
        if tt_move.is_some_and(|tm| tm.same_squares(mv)) {
            return SCORE_TT_MOVE;
        }
        if let Some(victim) = board.get(mv.to_row as usize, mv.to_col as usize) {
            let attacker = board
                .get(mv.from_row as usize, mv.from_col as usize)
                .map_or(0, |p| piece_value(p.kind));
            return SCORE_CAPTURE_BASE + piece_value(victim.kind) * 10 - attacker;
        }
        let killers = &self.killers[ply.min(MAX_PLY - 1)];
        if killers[0].is_some_and(|k| k.same_squares(mv)) {
            return SCORE_KILLER_PRIMARY;
        }
        if killers[1].is_some_and(|k| k.same_squares(mv)) {
            return SCORE_KILLER_SECONDARY;
        }
        let from = mv.from_row as usize * 9 + mv.from_col as usize;
        let to = mv.to_row as usize * 9 + mv.to_col as usize;
        self.history[side.index()][from][to].min(HISTORY_CAP)
    }

    fn remember_cutoff(&mut self, side: Color, mv: &Move, ply: usize, depth: i32) {
        let slot = &mut self.killers[ply.min(MAX_PLY - 1)];
        if !slot[0].is_some_and(|k| k.same_squares(mv)) {
            slot[1] = slot[0];
            slot[0] = Some(*mv);
        }
        let from = mv.from_row as usize * 9 + mv.from_col as usize;
        let to = mv.to_row as usize * 9 + mv.to_col as usize;
        let entry = &mut self.history[side.index()][from][to];
        *entry = entry.saturating_add(depth * depth).min(HISTORY_CAP);
    }

    /// Beginner/easy flavour: re-score the root moves one ply deep with
    /// uniform noise and take the perturbed best.
    fn jittered_choice(
        &mut self,
        board: &mut Board,
        side: Color,
        root_moves: &[Move],
        config: &SearchConfig,
    ) -> Option<Move> {
        let mut rng = rand::thread_rng();
        let mut best: Option<(Move, i32)> = None;
        for mv in root_moves {
            let record = board.make_move(mv);
            let value = self.negamax(board, side.opposite(), 0, 1, -INFINITY, INFINITY, false);
            board.unmake(&record);
            let Some(v) = value else {
                break;
            };
            let noisy = -v + rng.gen_range(-config.randomness..=config.randomness);
            if best.map_or(true, |(_, s)| noisy > s) {
                best = Some((*mv, noisy));
            }
        }
        best.map(|(mv, _)| mv)
    }

    fn poll_stop(&mut self) {
        if self.abort_flag.load(Ordering::Relaxed) || self.start.elapsed() >= self.budget {
            self.aborted = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::Difficulty;
    use crate::logic::board::{Piece, PieceKind};
    use crate::logic::rules::{game_status, GameStatus};

    fn quick_config(depth: u8) -> SearchConfig {
        SearchConfig {
            depth,
            quiescence_depth: 3,
            randomness: 0,
            time_budget_ms: 30_000,
        }
    }

    #[test]
    fn search_leaves_the_board_untouched() {
        let mut board = Board::new();
        board.setup_initial_position();
        let before = board.clone();

        let mut engine = SearchEngine::new();
        let mv = engine.find_best_move(&mut board, Color::Red, &quick_config(3));
        assert!(mv.is_some());
        assert_eq!(board, before);
    }

    #[test]
    fn forced_move_is_returned_without_search() {
        let mut board = Board::new();
        board.set(9, 4, Some(Piece::new(PieceKind::King, Color::Red)));
        board.set(0, 4, Some(Piece::new(PieceKind::King, Color::Black)));
        board.set(5, 4, Some(Piece::new(PieceKind::Pawn, Color::Black)));
        board.set(8, 0, Some(Piece::new(PieceKind::Rook, Color::Black)));
        board.set(0, 3, Some(Piece::new(PieceKind::Rook, Color::Black)));
        board.set(0, 5, Some(Piece::new(PieceKind::Rook, Color::Black)));
        board.set(0, 8, Some(Piece::new(PieceKind::Pawn, Color::Red)));

        // The king is boxed in; only the far pawn can step sideways.
        let mut engine = SearchEngine::new();
        let mv = engine
            .find_best_move(&mut board, Color::Red, &quick_config(5))
            .unwrap();
        assert_eq!(mv.from(), (0, 8));
        assert_eq!(mv.to(), (0, 7));
        assert_eq!(engine.nodes_searched(), 0);
    }

    #[test]
    fn deterministic_without_randomness() {
        let mut board = Board::new();
        board.setup_initial_position();
        let mut engine = SearchEngine::new();
        let first = engine
            .find_best_move(&mut board, Color::Red, &quick_config(4))
            .unwrap();

        let mut fresh = SearchEngine::new();
        let second = fresh
            .find_best_move(&mut board, Color::Red, &quick_config(4))
            .unwrap();
        assert!(first.same_squares(&second));
    }

    #[test]
    fn finds_a_hanging_rook() {
        let mut board = Board::new();
        board.set(9, 4, Some(Piece::new(PieceKind::King, Color::Red)));
        board.set(0, 3, Some(Piece::new(PieceKind::King, Color::Black)));
        board.set(5, 0, Some(Piece::new(PieceKind::Rook, Color::Red)));
        board.set(5, 8, Some(Piece::new(PieceKind::Rook, Color::Black)));

        let mut engine = SearchEngine::new();
        let mv = engine
            .find_best_move(&mut board, Color::Red, &quick_config(3))
            .unwrap();
        assert_eq!(mv.to(), (5, 8), "expected the free rook capture");
    }

    #[test]
    fn zero_budget_still_produces_a_move() {
        let mut board = Board::new();
        board.setup_initial_position();
        let config = SearchConfig {
            depth: 8,
            quiescence_depth: 4,
            randomness: 0,
            time_budget_ms: 0,
        };
        let mut engine = SearchEngine::new();
        assert!(engine.find_best_move(&mut board, Color::Red, &config).is_some());
    }

    #[test]
    fn no_legal_moves_returns_none() {
        let mut board = Board::new();
        board.set(0, 4, Some(Piece::new(PieceKind::King, Color::Black)));
        board.set(9, 3, Some(Piece::new(PieceKind::King, Color::Red)));
        board.set(1, 0, Some(Piece::new(PieceKind::Rook, Color::Red)));
        board.set(0, 0, Some(Piece::new(PieceKind::Rook, Color::Red)));
        board.set(2, 4, Some(Piece::new(PieceKind::Pawn, Color::Red)));

        assert_eq!(
            game_status(&mut board, Color::Black),
            GameStatus::Won(Color::Red)
        );
        let mut engine = SearchEngine::new();
        assert_eq!(
            engine.find_best_move(&mut board, Color::Black, &quick_config(3)),
            None
        );
    }

    #[test]
    fn beginner_randomness_still_moves() {
        let mut board = Board::new();
        board.setup_initial_position();
        let mut engine = SearchEngine::new();
        let config = Difficulty::Beginner.config();
        assert!(engine
            .find_best_move(&mut board, Color::Red, &config)
            .is_some());
        // The perturbed pick must still be legal.
        let legal = generate_all_legal_moves(&mut board, Color::Red);
        let mv = engine
            .find_best_move(&mut board, Color::Red, &config)
            .unwrap();
        assert!(legal.iter().any(|m| m.same_squares(&mv)));
    }
}
