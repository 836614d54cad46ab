use crate::logic::board::{Color, Piece, PieceKind};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DARK_ROWS: usize = 4;
pub const DARK_COLS: usize = 8;
pub const DARK_SQUARES: usize = DARK_ROWS * DARK_COLS;

/// Actions without a capture before the game is drawn.
pub const DRAW_LIMIT: u32 = 50;

/// Per-side inventory: the half set of a Xiangqi box.
const INVENTORY: [(PieceKind, usize); 7] = [
    (PieceKind::King, 1),
    (PieceKind::Advisor, 2),
    (PieceKind::Elephant, 2),
    (PieceKind::Rook, 2),
    (PieceKind::Horse, 2),
    (PieceKind::Cannon, 2),
    (PieceKind::Pawn, 5),
];

const ORTHOGONAL: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Capture precedence, 1 strongest. The king-pawn cycle is the one
/// exception: pawns take kings, kings may not take pawns.
pub const fn capture_rank(kind: PieceKind) -> u8 {
    match kind {
        PieceKind::King => 1,
        PieceKind::Advisor => 2,
        PieceKind::Elephant => 3,
        PieceKind::Rook => 4,
        PieceKind::Horse => 5,
        PieceKind::Cannon => 6,
        PieceKind::Pawn => 7,
    }
}

/// Rank-order capture test for non-cannon attackers.
pub const fn can_capture(attacker: PieceKind, victim: PieceKind) -> bool {
    match (attacker, victim) {
        (PieceKind::Pawn, PieceKind::King) => true,
        (PieceKind::King, PieceKind::Pawn) => false,
        _ => capture_rank(attacker) <= capture_rank(victim),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DarkCell {
    pub piece: Piece,
    pub revealed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DarkAction {
    Flip {
        row: usize,
        col: usize,
    },
    Move {
        from: (usize, usize),
        to: (usize, usize),
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DarkStatus {
    Playing,
    Won(Color),
    Draw,
}

/// Undo record for [`DarkBoard::apply`].
#[derive(Debug, Clone, Copy)]
pub struct DarkUndo {
    action: DarkAction,
    captured: Option<DarkCell>,
    prev_quiet: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DarkBoard {
    grid: [[Option<DarkCell>; DARK_COLS]; DARK_ROWS],
    pub quiet_actions: u32,
}

impl DarkBoard {
    /// Empty board, for tests and custom setups.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            grid: [[None; DARK_COLS]; DARK_ROWS],
            quiet_actions: 0,
        }
    }

    /// The full 32-piece inventory dealt face-down in random order.
    #[must_use]
    pub fn new_shuffled<R: Rng>(rng: &mut R) -> Self {
        let mut pieces = Vec::with_capacity(DARK_SQUARES);
        for color in [Color::Red, Color::Black] {
            for (kind, count) in INVENTORY {
                for _ in 0..count {
                    pieces.push(Piece::new(kind, color));
                }
            }
        }
        pieces.shuffle(rng);

        let mut board = Self::empty();
        for (i, piece) in pieces.into_iter().enumerate() {
            board.grid[i / DARK_COLS][i % DARK_COLS] = Some(DarkCell {
                piece,
                revealed: false,
            });
        }
        board
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<DarkCell> {
        if row < DARK_ROWS && col < DARK_COLS {
            self.grid[row][col]
        } else {
            None
        }
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Option<DarkCell>) {
        if row < DARK_ROWS && col < DARK_COLS {
            self.grid[row][col] = cell;
        }
    }

    /// Pieces still on the board for one side, face-down ones included.
    #[must_use]
    pub fn piece_count(&self, color: Color) -> usize {
        self.grid
            .iter()
            .flatten()
            .flatten()
            .filter(|cell| cell.piece.color == color)
            .count()
    }

    /// Remaining face-down identities: per (side, kind) counts plus the
    /// total. This is public knowledge in banqi.
    #[must_use]
    pub fn hidden_pool(&self) -> ([[u32; 7]; 2], u32) {
        let mut pool = [[0u32; 7]; 2];
        let mut total = 0;
        for cell in self.grid.iter().flatten().flatten() {
            if !cell.revealed {
                pool[cell.piece.color.index()][cell.piece.kind.index()] += 1;
                total += 1;
            }
        }
        (pool, total)
    }

    /// Every action available to `side`: flips of face-down cells plus
    /// moves and captures of its revealed pieces. Cannons capture only
    /// by jumping exactly one screen; the screen may be face-down, the
    /// victim must be revealed.
    #[must_use]
    pub fn legal_actions(&self, side: Color) -> Vec<DarkAction> {
        let mut actions = Vec::with_capacity(32);
        for row in 0..DARK_ROWS {
            for col in 0..DARK_COLS {
                let Some(cell) = self.grid[row][col] else {
                    continue;
                };
                if !cell.revealed {
                    actions.push(DarkAction::Flip { row, col });
                    continue;
                }
                if cell.piece.color != side {
                    continue;
                }

                for (dr, dc) in ORTHOGONAL {
                    let (nr, nc) = (row as isize + dr, col as isize + dc);
                    if !(0..DARK_ROWS as isize).contains(&nr)
                        || !(0..DARK_COLS as isize).contains(&nc)
                    {
                        continue;
                    }
                    let (nr, nc) = (nr as usize, nc as usize);
                    match self.grid[nr][nc] {
                        None => actions.push(DarkAction::Move {
                            from: (row, col),
                            to: (nr, nc),
                        }),
                        Some(target) => {
                            if cell.piece.kind != PieceKind::Cannon
                                && target.revealed
                                && target.piece.color != side
                                && can_capture(cell.piece.kind, target.piece.kind)
                            {
                                actions.push(DarkAction::Move {
                                    from: (row, col),
                                    to: (nr, nc),
                                });
                            }
                        }
                    }
                }

                if cell.piece.kind == PieceKind::Cannon {
                    self.cannon_jumps(row, col, side, &mut actions);
                }
            }
        }
        actions
    }

    fn cannon_jumps(&self, row: usize, col: usize, side: Color, actions: &mut Vec<DarkAction>) {
        for (dr, dc) in ORTHOGONAL {
            let mut screen_seen = false;
            let (mut r, mut c) = (row as isize + dr, col as isize + dc);
            while (0..DARK_ROWS as isize).contains(&r) && (0..DARK_COLS as isize).contains(&c) {
                if let Some(target) = self.grid[r as usize][c as usize] {
                    if !screen_seen {
                        screen_seen = true;
                    } else {
                        if target.revealed && target.piece.color != side {
                            actions.push(DarkAction::Move {
                                from: (row, col),
                                to: (r as usize, c as usize),
                            });
                        }
                        break;
                    }
                }
                r += dr;
                c += dc;
            }
        }
    }

    pub fn apply(&mut self, action: &DarkAction) -> DarkUndo {
        let prev_quiet = self.quiet_actions;
        let captured = match *action {
            DarkAction::Flip { row, col } => {
                if let Some(cell) = &mut self.grid[row][col] {
                    cell.revealed = true;
                }
                self.quiet_actions += 1;
                None
            }
            DarkAction::Move { from, to } => {
                let moved = self.grid[from.0][from.1].take();
                let captured = self.grid[to.0][to.1];
                self.grid[to.0][to.1] = moved;
                self.quiet_actions = if captured.is_some() {
                    0
                } else {
                    self.quiet_actions + 1
                };
                captured
            }
        };
        DarkUndo {
            action: *action,
            captured,
            prev_quiet,
        }
    }

    pub fn undo(&mut self, undo: &DarkUndo) {
        match undo.action {
            DarkAction::Flip { row, col } => {
                if let Some(cell) = &mut self.grid[row][col] {
                    cell.revealed = false;
                }
            }
            DarkAction::Move { from, to } => {
                let moved = self.grid[to.0][to.1].take();
                self.grid[from.0][from.1] = moved;
                self.grid[to.0][to.1] = undo.captured;
            }
        }
        self.quiet_actions = undo.prev_quiet;
    }

    /// Substitute a face-down cell with an assumed identity, revealed.
    /// The expectimax search tries each identity in turn and restores
    /// with [`DarkBoard::undo_flip_as`].
    pub fn flip_as(&mut self, row: usize, col: usize, piece: Piece) -> (Option<DarkCell>, u32) {
        let original = self.grid[row][col];
        let prev_quiet = self.quiet_actions;
        self.grid[row][col] = Some(DarkCell {
            piece,
            revealed: true,
        });
        self.quiet_actions += 1;
        (original, prev_quiet)
    }

    pub fn undo_flip_as(&mut self, row: usize, col: usize, original: Option<DarkCell>, prev_quiet: u32) {
        self.grid[row][col] = original;
        self.quiet_actions = prev_quiet;
    }

    #[must_use]
    pub fn status(&self, side_to_move: Color) -> DarkStatus {
        if self.piece_count(side_to_move.opposite()) == 0 {
            return DarkStatus::Won(side_to_move);
        }
        if self.quiet_actions >= DRAW_LIMIT {
            return DarkStatus::Draw;
        }
        if self.legal_actions(side_to_move).is_empty() {
            return DarkStatus::Won(side_to_move.opposite());
        }
        DarkStatus::Playing
    }

    /// Whether the revealed piece on `(row, col)` could be captured by
    /// the other side right now.
    #[must_use]
    pub fn is_threatened(&self, row: usize, col: usize) -> bool {
        let Some(cell) = self.get(row, col) else {
            return false;
        };
        let enemy = cell.piece.color.opposite();

        for (dr, dc) in ORTHOGONAL {
            let (nr, nc) = (row as isize + dr, col as isize + dc);
            if !(0..DARK_ROWS as isize).contains(&nr) || !(0..DARK_COLS as isize).contains(&nc) {
                continue;
            }
            if let Some(neighbour) = self.grid[nr as usize][nc as usize] {
                if neighbour.revealed
                    && neighbour.piece.color == enemy
                    && neighbour.piece.kind != PieceKind::Cannon
                    && can_capture(neighbour.piece.kind, cell.piece.kind)
                {
                    return true;
                }
            }
        }

        // Cannon shots: exactly one screen between the cannon and here.
        for (dr, dc) in ORTHOGONAL {
            let mut screen_seen = false;
            let (mut r, mut c) = (row as isize + dr, col as isize + dc);
            while (0..DARK_ROWS as isize).contains(&r) && (0..DARK_COLS as isize).contains(&c) {
                if let Some(piece) = self.grid[r as usize][c as usize] {
                    if !screen_seen {
                        screen_seen = true;
                    } else {
                        if piece.revealed
                            && piece.piece.color == enemy
                            && piece.piece.kind == PieceKind::Cannon
                        {
                            return true;
                        }
                        break;
                    }
                }
                r += dr;
                c += dc;
            }
        }
        false
    }

    /// Adjacent enemy revealed pieces, used to order flips by safety.
    #[must_use]
    pub fn adjacent_enemies(&self, row: usize, col: usize, side: Color) -> usize {
        let mut count = 0;
        for (dr, dc) in ORTHOGONAL {
            let (nr, nc) = (row as isize + dr, col as isize + dc);
            if (0..DARK_ROWS as isize).contains(&nr) && (0..DARK_COLS as isize).contains(&nc) {
                if let Some(cell) = self.grid[nr as usize][nc as usize] {
                    if cell.revealed && cell.piece.color != side {
                        count += 1;
                    }
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn shuffle_deals_the_full_inventory_face_down() {
        let mut rng = StdRng::seed_from_u64(7);
        let board = DarkBoard::new_shuffled(&mut rng);
        assert_eq!(board.piece_count(Color::Red), 16);
        assert_eq!(board.piece_count(Color::Black), 16);
        let (_, hidden_total) = board.hidden_pool();
        assert_eq!(hidden_total, 32);
    }

    #[test]
    fn rank_order_has_the_pawn_king_cycle() {
        assert!(can_capture(PieceKind::Pawn, PieceKind::King));
        assert!(!can_capture(PieceKind::King, PieceKind::Pawn));
        assert!(can_capture(PieceKind::King, PieceKind::Advisor));
        assert!(can_capture(PieceKind::Rook, PieceKind::Horse));
        assert!(!can_capture(PieceKind::Horse, PieceKind::Rook));
        assert!(can_capture(PieceKind::Pawn, PieceKind::Pawn));
    }

    #[test]
    fn non_cannon_capture_requires_revealed_adjacent_enemy() {
        let mut board = DarkBoard::empty();
        board.set(1, 1, revealed(PieceKind::Rook, Color::Red));
        board.set(1, 2, hidden(PieceKind::Pawn, Color::Black));

        let actions = board.legal_actions(Color::Red);
        // The face-down neighbour can be flipped but not captured.
        assert!(actions.contains(&DarkAction::Flip { row: 1, col: 2 }));
        assert!(!actions.contains(&DarkAction::Move {
            from: (1, 1),
            to: (1, 2)
        }));

        board.set(1, 2, revealed(PieceKind::Pawn, Color::Black));
        let actions = board.legal_actions(Color::Red);
        assert!(actions.contains(&DarkAction::Move {
            from: (1, 1),
            to: (1, 2)
        }));
    }

    #[test]
    fn cannon_captures_only_over_one_screen() {
        let mut board = DarkBoard::empty();
        board.set(0, 0, revealed(PieceKind::Cannon, Color::Red));
        board.set(0, 3, hidden(PieceKind::Elephant, Color::Red));
        board.set(0, 5, revealed(PieceKind::King, Color::Black));

        let actions = board.legal_actions(Color::Red);
        assert!(actions.contains(&DarkAction::Move {
            from: (0, 0),
            to: (0, 5)
        }));
        // Sliding to the empty neighbour stays available; adjacent
        // captures never are for a cannon.
        assert!(actions.contains(&DarkAction::Move {
            from: (0, 0),
            to: (1, 0)
        }));

        // A second piece on the lane blocks the shot.
        board.set(0, 1, revealed(PieceKind::Pawn, Color::Black));
        let actions = board.legal_actions(Color::Red);
        assert!(!actions.contains(&DarkAction::Move {
            from: (0, 0),
            to: (0, 1)
        }));
        assert!(!actions.contains(&DarkAction::Move {
            from: (0, 0),
            to: (0, 5)
        }));
        // With (0,1) as the screen, the next piece along is face-down,
        // so that lane yields nothing at all.
        assert!(!actions.contains(&DarkAction::Move {
            from: (0, 0),
            to: (0, 3)
        }));
    }

    #[test]
    fn cannon_jump_over_hidden_screen_hits_revealed_target() {
        let mut board = DarkBoard::empty();
        board.set(2, 1, revealed(PieceKind::Cannon, Color::Red));
        board.set(2, 4, hidden(PieceKind::Pawn, Color::Black));
        board.set(2, 6, revealed(PieceKind::Rook, Color::Black));

        let actions = board.legal_actions(Color::Red);
        assert!(actions.contains(&DarkAction::Move {
            from: (2, 1),
            to: (2, 6)
        }));
    }

    #[test]
    fn apply_and_undo_roundtrip() {
        let mut board = DarkBoard::empty();
        board.set(1, 1, revealed(PieceKind::Rook, Color::Red));
        board.set(1, 2, revealed(PieceKind::Pawn, Color::Black));
        board.set(3, 3, hidden(PieceKind::King, Color::Black));
        board.quiet_actions = 7;
        let before = board.clone();

        let capture = DarkAction::Move {
            from: (1, 1),
            to: (1, 2),
        };
        let undo = board.apply(&capture);
        assert_eq!(board.quiet_actions, 0);
        assert_eq!(board.piece_count(Color::Black), 1);
        board.undo(&undo);
        assert_eq!(board, before);

        let flip = DarkAction::Flip { row: 3, col: 3 };
        let undo = board.apply(&flip);
        assert!(board.get(3, 3).unwrap().revealed);
        assert_eq!(board.quiet_actions, 8);
        board.undo(&undo);
        assert_eq!(board, before);
    }

    #[test]
    fn fifty_quiet_actions_draw_the_game() {
        let mut board = DarkBoard::empty();
        board.set(0, 0, revealed(PieceKind::King, Color::Red));
        board.set(3, 7, revealed(PieceKind::King, Color::Black));
        board.quiet_actions = DRAW_LIMIT;
        assert_eq!(board.status(Color::Red), DarkStatus::Draw);

        board.quiet_actions = DRAW_LIMIT - 1;
        assert_eq!(board.status(Color::Red), DarkStatus::Playing);
    }

    #[test]
    fn side_without_pieces_loses() {
        let mut board = DarkBoard::empty();
        board.set(0, 0, revealed(PieceKind::Pawn, Color::Red));
        assert_eq!(board.status(Color::Red), DarkStatus::Won(Color::Red));
    }

    #[test]
    fn threat_detection_sees_rank_and_cannons() {
        let mut board = DarkBoard::empty();
        board.set(1, 1, revealed(PieceKind::Horse, Color::Red));
        board.set(1, 2, revealed(PieceKind::Rook, Color::Black));
        assert!(board.is_threatened(1, 1));
        // The horse does not threaten the stronger rook back.
        assert!(!board.is_threatened(1, 2));

        let mut board = DarkBoard::empty();
        board.set(2, 0, revealed(PieceKind::King, Color::Red));
        board.set(2, 3, hidden(PieceKind::Pawn, Color::Red));
        board.set(2, 5, revealed(PieceKind::Cannon, Color::Black));
        assert!(board.is_threatened(2, 0));
    }
}
