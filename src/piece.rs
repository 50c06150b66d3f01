//! Active falling piece logic

use crate::tetromino::{PieceKind, PIECE_CELLS, ROTATION_STATES};

/// A board coordinate, row 0 at the top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

/// A piece: its type, rotation state and translation on the board
///
/// The piece never checks the board itself. Moves and rotations are applied
/// unconditionally and the session controller reverts them when the result
/// does not fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    rotation: usize,
    row_offset: i32,
    col_offset: i32,
}

impl Piece {
    /// Create a new piece at its spawn offset
    pub fn new(kind: PieceKind) -> Self {
        let mut piece = Self {
            kind,
            rotation: 0,
            row_offset: 0,
            col_offset: 0,
        };
        let (rows, cols) = kind.spawn_offset();
        piece.move_by(rows, cols);
        piece
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Piece id, written into the board on lock and used as colour index
    pub fn id(&self) -> u8 {
        self.kind.id()
    }

    #[allow(dead_code)]
    pub fn rotation(&self) -> usize {
        self.rotation
    }

    /// Current (row, col) translation
    pub fn offset(&self) -> (i32, i32) {
        (self.row_offset, self.col_offset)
    }

    /// Translate by the given number of rows and columns
    pub fn move_by(&mut self, rows: i32, cols: i32) {
        self.row_offset += rows;
        self.col_offset += cols;
    }

    /// Advance to the next rotation state (clockwise)
    pub fn rotate(&mut self) {
        self.rotation = (self.rotation + 1) % ROTATION_STATES;
    }

    /// Step back to the previous rotation state
    pub fn undo_rotate(&mut self) {
        self.rotation = (self.rotation + ROTATION_STATES - 1) % ROTATION_STATES;
    }

    /// Absolute positions of all 4 cells, derived fresh from the shape table
    pub fn cell_positions(&self) -> [Position; PIECE_CELLS] {
        let shape = *self.kind.shape(self.rotation);
        shape.map(|(row, col)| Position::new(row + self.row_offset, col + self.col_offset))
    }
}
