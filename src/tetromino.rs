//! Tetromino definitions and shapes
//!
//! Every piece type has four rotation states of four cells each. Cells are
//! `(row, col)` offsets with row growing downward; stepping through the
//! states 0 → 1 → 2 → 3 turns the piece 90° clockwise about a pivot that is
//! baked into the offsets.

use thiserror::Error;

/// Occupancy value of an empty board cell
pub const EMPTY: u8 = 0;

/// Number of rotation states per piece
pub const ROTATION_STATES: usize = 4;

/// Number of cells in every piece
pub const PIECE_CELLS: usize = 4;

/// One rotation state: four `(row, col)` offsets
pub type Shape = [(i32, i32); PIECE_CELLS];

/// The 7 tetromino types
///
/// The discriminant is the piece id: it is written into the board when a
/// piece locks and doubles as the colour index when drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PieceKind {
    L = 1,
    J = 2,
    I = 3,
    O = 4,
    S = 5,
    T = 6,
    Z = 7,
}

/// Shape table indexed by `PieceKind::index()`, then rotation state
static SHAPES: [[Shape; ROTATION_STATES]; 7] = [
    // L
    [
        [(0, 2), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (2, 1), (2, 2)],
        [(1, 0), (1, 1), (1, 2), (2, 0)],
        [(0, 0), (0, 1), (1, 1), (2, 1)],
    ],
    // J
    [
        [(0, 0), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (0, 2), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 2)],
        [(0, 1), (1, 1), (2, 0), (2, 1)],
    ],
    // I
    [
        [(1, 0), (1, 1), (1, 2), (1, 3)],
        [(0, 2), (1, 2), (2, 2), (3, 2)],
        [(2, 0), (2, 1), (2, 2), (2, 3)],
        [(0, 1), (1, 1), (2, 1), (3, 1)],
    ],
    // O doesn't rotate
    [
        [(0, 0), (0, 1), (1, 0), (1, 1)],
        [(0, 0), (0, 1), (1, 0), (1, 1)],
        [(0, 0), (0, 1), (1, 0), (1, 1)],
        [(0, 0), (0, 1), (1, 0), (1, 1)],
    ],
    // S
    [
        [(0, 1), (0, 2), (1, 0), (1, 1)],
        [(0, 1), (1, 1), (1, 2), (2, 2)],
        [(1, 1), (1, 2), (2, 0), (2, 1)],
        [(0, 0), (1, 0), (1, 1), (2, 1)],
    ],
    // T
    [
        [(0, 1), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (1, 2), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 1)],
        [(0, 1), (1, 0), (1, 1), (2, 1)],
    ],
    // Z
    [
        [(0, 0), (0, 1), (1, 1), (1, 2)],
        [(0, 2), (1, 1), (1, 2), (2, 1)],
        [(1, 0), (1, 1), (2, 1), (2, 2)],
        [(0, 1), (1, 0), (1, 1), (2, 0)],
    ],
];

impl PieceKind {
    /// Get all tetromino types in id order (used to fill the bag)
    pub const fn all() -> [PieceKind; 7] {
        [
            PieceKind::L,
            PieceKind::J,
            PieceKind::I,
            PieceKind::O,
            PieceKind::S,
            PieceKind::T,
            PieceKind::Z,
        ]
    }

    /// Piece id, also the occupancy value and colour index
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Look up a piece type from its id
    pub fn from_id(id: u8) -> Option<PieceKind> {
        Self::all().into_iter().find(|kind| kind.id() == id)
    }

    /// Position in the shape table
    const fn index(self) -> usize {
        self as usize - 1
    }

    /// Get the cell offsets for a rotation state
    ///
    /// `rotation` is taken modulo 4.
    pub fn shape(self, rotation: usize) -> &'static Shape {
        &SHAPES[self.index()][rotation % ROTATION_STATES]
    }

    /// Spawn offset (rows, cols) that centres the piece over a
    /// default-width board
    pub const fn spawn_offset(self) -> (i32, i32) {
        match self {
            PieceKind::I => (-1, 3),
            PieceKind::O => (0, 4),
            _ => (0, 3),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PieceKind::L => "L",
            PieceKind::J => "J",
            PieceKind::I => "I",
            PieceKind::O => "O",
            PieceKind::S => "S",
            PieceKind::T => "T",
            PieceKind::Z => "Z",
        }
    }
}

/// A malformed entry in the shape table
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("piece {kind} rotation {rotation} repeats cell {cell:?}")]
    DuplicateCell {
        kind: &'static str,
        rotation: usize,
        cell: (i32, i32),
    },
    #[error("piece {kind} id {id} does not map back to itself")]
    IdMismatch { kind: &'static str, id: u8 },
    #[error("the O piece must be identical in every rotation state")]
    AsymmetricO,
}

/// Check the shape table once at startup
pub fn validate_catalog() -> Result<(), CatalogError> {
    for kind in PieceKind::all() {
        if kind.id() == EMPTY || PieceKind::from_id(kind.id()) != Some(kind) {
            return Err(CatalogError::IdMismatch {
                kind: kind.name(),
                id: kind.id(),
            });
        }

        for rotation in 0..ROTATION_STATES {
            let shape = kind.shape(rotation);
            for (i, cell) in shape.iter().enumerate() {
                if shape[i + 1..].contains(cell) {
                    return Err(CatalogError::DuplicateCell {
                        kind: kind.name(),
                        rotation,
                        cell: *cell,
                    });
                }
            }
        }
    }

    let o = PieceKind::O.shape(0);
    if (1..ROTATION_STATES).any(|rotation| PieceKind::O.shape(rotation) != o) {
        return Err(CatalogError::AsymmetricO);
    }

    Ok(())
}
