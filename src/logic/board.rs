use crate::engine::zobrist::ZobristKeys;
use crate::engine::Move;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ROWS: usize = 10;
pub const COLS: usize = 9;
pub const SQUARES: usize = ROWS * COLS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Red => Self::Black,
            Self::Black => Self::Red,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Black => 1,
        }
    }

    /// Row delta of a forward step. Red marches toward row 0.
    pub const fn forward(self) -> isize {
        match self {
            Self::Red => -1,
            Self::Black => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    King = 0,
    Advisor = 1,
    Elephant = 2,
    Rook = 3,
    Horse = 4,
    Cannon = 5,
    Pawn = 6,
}

impl PieceKind {
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }
}

/// The 3x3 palace: columns 3-5, rows 7-9 for Red, rows 0-2 for Black.
pub const fn in_palace(color: Color, row: usize, col: usize) -> bool {
    if col < 3 || col > 5 || row >= ROWS {
        return false;
    }
    match color {
        Color::Red => row >= 7,
        Color::Black => row <= 2,
    }
}

/// Whether a piece of `color` standing on `row` is past the river.
pub const fn crossed_river(color: Color, row: usize) -> bool {
    match color {
        Color::Red => row <= 4,
        Color::Black => row >= 5,
    }
}

/// Record returned by [`Board::make_move`]; [`Board::unmake`] consumes it
/// to restore the position exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub mv: Move,
    pub captured: Option<Piece>,
}

/// The serialized board shape: a 10x9 row-major matrix of optional
/// pieces. This is the wire and persistence format.
pub type BoardCells = [[Option<Piece>; COLS]; ROWS];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("side {0:?} has more than one king")]
    DuplicateKing(Color),
    #[error("invalid board text: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoardCells", into = "BoardCells")]
pub struct Board {
    grid: [Option<Piece>; SQUARES],
    hash: u32,
    piece_count: u32,
    king_pos: [Option<(usize, usize)>; 2],
    // Tracks whether an odd number of ply boundaries have been applied,
    // so the hash can be re-derived from the grid alone.
    side_parity: bool,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty board. Populate it with [`Board::setup_initial_position`],
    /// [`Board::set`], or deserialization.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: [None; SQUARES],
            hash: 0,
            piece_count: 0,
            king_pos: [None; 2],
            side_parity: false,
        }
    }

    const fn idx(row: usize, col: usize) -> usize {
        row * COLS + col
    }

    pub fn clear(&mut self) {
        self.grid = [None; SQUARES];
        self.hash = 0;
        self.piece_count = 0;
        self.king_pos = [None; 2];
        self.side_parity = false;
    }

    /// Standard Xiangqi starting layout: row 0 is Black's back rank,
    /// row 9 Red's.
    pub fn setup_initial_position(&mut self) {
        self.clear();

        let back_rank = [
            PieceKind::Rook,
            PieceKind::Horse,
            PieceKind::Elephant,
            PieceKind::Advisor,
            PieceKind::King,
            PieceKind::Advisor,
            PieceKind::Elephant,
            PieceKind::Horse,
            PieceKind::Rook,
        ];

        for (col, &kind) in back_rank.iter().enumerate() {
            self.set(0, col, Some(Piece::new(kind, Color::Black)));
            self.set(9, col, Some(Piece::new(kind, Color::Red)));
        }
        for col in [1, 7] {
            self.set(2, col, Some(Piece::new(PieceKind::Cannon, Color::Black)));
            self.set(7, col, Some(Piece::new(PieceKind::Cannon, Color::Red)));
        }
        for col in (0..COLS).step_by(2) {
            self.set(3, col, Some(Piece::new(PieceKind::Pawn, Color::Black)));
            self.set(6, col, Some(Piece::new(PieceKind::Pawn, Color::Red)));
        }

        debug_assert_eq!(self.hash, self.recompute_hash());
    }

    /// Out-of-bounds coordinates read as empty, never as an error.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<Piece> {
        if row < ROWS && col < COLS {
            self.grid[Self::idx(row, col)]
        } else {
            None
        }
    }

    /// Place or remove a piece, keeping hash, count and king cache in step.
    pub fn set(&mut self, row: usize, col: usize, piece: Option<Piece>) {
        debug_assert!(row < ROWS && col < COLS);
        if row >= ROWS || col >= COLS {
            return;
        }
        let keys = ZobristKeys::get();
        let idx = Self::idx(row, col);

        if let Some(old) = self.grid[idx] {
            self.hash ^= keys.piece_key(old.kind, old.color, row, col);
            self.piece_count -= 1;
            if old.kind == PieceKind::King {
                self.king_pos[old.color.index()] = None;
            }
        }
        if let Some(new) = piece {
            self.hash ^= keys.piece_key(new.kind, new.color, row, col);
            self.piece_count += 1;
            if new.kind == PieceKind::King {
                self.king_pos[new.color.index()] = Some((row, col));
            }
        }
        self.grid[idx] = piece;
    }

    /// Apply a move, returning the record needed to take it back. The
    /// move must come from the legal-move generator; the hash is checked
    /// against a full recomputation in debug builds.
    pub fn make_move(&mut self, mv: &Move) -> MoveRecord {
        let keys = ZobristKeys::get();
        let (fr, fc) = (mv.from_row as usize, mv.from_col as usize);
        let (tr, tc) = (mv.to_row as usize, mv.to_col as usize);

        let Some(piece) = self.grid[Self::idx(fr, fc)] else {
            debug_assert!(false, "make_move from an empty square");
            return MoveRecord {
                mv: *mv,
                captured: None,
            };
        };

        self.grid[Self::idx(fr, fc)] = None;
        self.hash ^= keys.piece_key(piece.kind, piece.color, fr, fc);

        let captured = self.grid[Self::idx(tr, tc)];
        if let Some(cap) = captured {
            self.hash ^= keys.piece_key(cap.kind, cap.color, tr, tc);
            self.piece_count -= 1;
            if cap.kind == PieceKind::King {
                self.king_pos[cap.color.index()] = None;
            }
        }

        self.grid[Self::idx(tr, tc)] = Some(piece);
        self.hash ^= keys.piece_key(piece.kind, piece.color, tr, tc);
        if piece.kind == PieceKind::King {
            self.king_pos[piece.color.index()] = Some((tr, tc));
        }

        self.hash ^= keys.side_key;
        self.side_parity = !self.side_parity;

        debug_assert_eq!(self.hash, self.recompute_hash());
        MoveRecord {
            mv: *mv,
            captured,
        }
    }

    /// Exact inverse of [`Board::make_move`].
    pub fn unmake(&mut self, record: &MoveRecord) {
        let keys = ZobristKeys::get();
        let mv = &record.mv;
        let (fr, fc) = (mv.from_row as usize, mv.from_col as usize);
        let (tr, tc) = (mv.to_row as usize, mv.to_col as usize);

        self.hash ^= keys.side_key;
        self.side_parity = !self.side_parity;

        let Some(piece) = self.grid[Self::idx(tr, tc)] else {
            debug_assert!(false, "unmake with no piece on the target square");
            return;
        };

        self.grid[Self::idx(tr, tc)] = None;
        self.hash ^= keys.piece_key(piece.kind, piece.color, tr, tc);

        self.grid[Self::idx(fr, fc)] = Some(piece);
        self.hash ^= keys.piece_key(piece.kind, piece.color, fr, fc);
        if piece.kind == PieceKind::King {
            self.king_pos[piece.color.index()] = Some((fr, fc));
        }

        if let Some(cap) = record.captured {
            self.grid[Self::idx(tr, tc)] = Some(cap);
            self.hash ^= keys.piece_key(cap.kind, cap.color, tr, tc);
            self.piece_count += 1;
            if cap.kind == PieceKind::King {
                self.king_pos[cap.color.index()] = Some((tr, tc));
            }
        }

        debug_assert_eq!(self.hash, self.recompute_hash());
    }

    /// Toggle the side-to-move key without touching any piece. Used by
    /// null-move search; call twice to restore.
    pub fn make_null_move(&mut self) {
        self.hash ^= ZobristKeys::get().side_key;
        self.side_parity = !self.side_parity;
    }

    #[must_use]
    pub fn find_king(&self, color: Color) -> Option<(usize, usize)> {
        self.king_pos[color.index()]
    }

    /// Positions and pieces of one side, scanned row-major. Callers must
    /// not hold the result across a mutation.
    #[must_use]
    pub fn pieces_of(&self, color: Color) -> Vec<((usize, usize), Piece)> {
        let mut out = Vec::with_capacity(16);
        for row in 0..ROWS {
            for col in 0..COLS {
                if let Some(piece) = self.grid[Self::idx(row, col)] {
                    if piece.color == color {
                        out.push(((row, col), piece));
                    }
                }
            }
        }
        out
    }

    #[must_use]
    pub const fn hash(&self) -> u32 {
        self.hash
    }

    #[must_use]
    pub const fn piece_count(&self) -> u32 {
        self.piece_count
    }

    /// Full hash re-derivation from the grid. The incremental hash must
    /// always agree with this.
    #[must_use]
    pub fn recompute_hash(&self) -> u32 {
        let keys = ZobristKeys::get();
        let mut hash = 0;
        for row in 0..ROWS {
            for col in 0..COLS {
                if let Some(piece) = self.grid[Self::idx(row, col)] {
                    hash ^= keys.piece_key(piece.kind, piece.color, row, col);
                }
            }
        }
        if self.side_parity {
            hash ^= keys.side_key;
        }
        hash
    }

    #[must_use]
    pub fn to_cells(&self) -> BoardCells {
        let mut cells: BoardCells = [[None; COLS]; ROWS];
        for row in 0..ROWS {
            for col in 0..COLS {
                cells[row][col] = self.grid[Self::idx(row, col)];
            }
        }
        cells
    }

    /// Rebuild a board from the cell matrix, recomputing hash and
    /// metadata. Rejects matrices with two kings of one side; nothing is
    /// modified on failure.
    pub fn from_cells(cells: &BoardCells) -> Result<Self, BoardError> {
        let mut kings = [0u32; 2];
        for row in cells.iter() {
            for cell in row.iter().flatten() {
                if cell.kind == PieceKind::King {
                    kings[cell.color.index()] += 1;
                }
            }
        }
        if kings[Color::Red.index()] > 1 {
            return Err(BoardError::DuplicateKing(Color::Red));
        }
        if kings[Color::Black.index()] > 1 {
            return Err(BoardError::DuplicateKing(Color::Black));
        }

        let mut board = Self::new();
        for (row, cols) in cells.iter().enumerate() {
            for (col, cell) in cols.iter().enumerate() {
                if cell.is_some() {
                    board.set(row, col, *cell);
                }
            }
        }
        Ok(board)
    }

    /// Replace this board with a deserialized matrix, leaving it
    /// untouched if validation fails.
    pub fn load_cells(&mut self, cells: &BoardCells) -> Result<(), BoardError> {
        let loaded = Self::from_cells(cells)?;
        *self = loaded;
        Ok(())
    }
}

impl From<Board> for BoardCells {
    fn from(board: Board) -> Self {
        board.to_cells()
    }
}

impl TryFrom<BoardCells> for Board {
    type Error = BoardError;

    fn try_from(cells: BoardCells) -> Result<Self, Self::Error> {
        Self::from_cells(&cells)
    }
}

// FEN support, in the common Xiangqi dialect: rows listed from row 0,
// uppercase for Red, `w`/`b` turn field.
impl Board {
    pub fn to_fen(&self, turn: Color) -> String {
        let mut fen = String::new();
        for row in 0..ROWS {
            let mut empty = 0;
            for col in 0..COLS {
                if let Some(piece) = self.get(row, col) {
                    if empty > 0 {
                        fen.push_str(&empty.to_string());
                        empty = 0;
                    }
                    let ch = match piece.kind {
                        PieceKind::King => 'k',
                        PieceKind::Advisor => 'a',
                        PieceKind::Elephant => 'b',
                        PieceKind::Horse => 'n',
                        PieceKind::Rook => 'r',
                        PieceKind::Cannon => 'c',
                        PieceKind::Pawn => 'p',
                    };
                    fen.push(if piece.color == Color::Red {
                        ch.to_ascii_uppercase()
                    } else {
                        ch
                    });
                } else {
                    empty += 1;
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if row + 1 < ROWS {
                fen.push('/');
            }
        }
        fen.push(' ');
        fen.push(if turn == Color::Red { 'w' } else { 'b' });
        fen
    }

    pub fn from_fen(fen: &str) -> Result<(Self, Color), BoardError> {
        let mut parts = fen.split_whitespace();
        let placement = parts
            .next()
            .ok_or_else(|| BoardError::Parse("missing placement field".into()))?;
        let turn_field = parts
            .next()
            .ok_or_else(|| BoardError::Parse("missing turn field".into()))?;

        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != ROWS {
            return Err(BoardError::Parse(format!(
                "expected {ROWS} rows, found {}",
                rows.len()
            )));
        }

        let mut cells: BoardCells = [[None; COLS]; ROWS];
        for (row, row_text) in rows.iter().enumerate() {
            let mut col = 0;
            for ch in row_text.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    col += skip as usize;
                    continue;
                }
                if col >= COLS {
                    return Err(BoardError::Parse(format!("row {row} is too long")));
                }
                let color = if ch.is_ascii_uppercase() {
                    Color::Red
                } else {
                    Color::Black
                };
                let kind = match ch.to_ascii_lowercase() {
                    'k' => PieceKind::King,
                    'a' => PieceKind::Advisor,
                    'b' => PieceKind::Elephant,
                    'n' => PieceKind::Horse,
                    'r' => PieceKind::Rook,
                    'c' => PieceKind::Cannon,
                    'p' => PieceKind::Pawn,
                    other => {
                        return Err(BoardError::Parse(format!("invalid piece char '{other}'")))
                    }
                };
                cells[row][col] = Some(Piece::new(kind, color));
                col += 1;
            }
            if col != COLS {
                return Err(BoardError::Parse(format!(
                    "row {row} has length {col}, expected {COLS}"
                )));
            }
        }

        let turn = match turn_field {
            "w" | "r" => Color::Red,
            "b" => Color::Black,
            other => return Err(BoardError::Parse(format!("invalid turn field '{other}'"))),
        };

        let mut board = Self::from_cells(&cells)?;
        if turn == Color::Black {
            board.make_null_move();
        }
        Ok((board, turn))
    }
}
