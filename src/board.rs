//! Game board representation and row clearing

use crate::tetromino::EMPTY;
use std::fmt;

/// Standard board dimensions
pub const DEFAULT_ROWS: usize = 20;
pub const DEFAULT_COLUMNS: usize = 10;
/// Terminal columns used to draw one cell
pub const DEFAULT_CELL_SIZE: u16 = 2;

/// The game board
///
/// Each cell holds an occupancy value: `0` is empty, anything else is the id
/// of the piece that locked there. Dimensions are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    columns: usize,
    cell_size: u16,
    /// Grid stored as [row][col], row 0 is the top
    cells: Vec<Vec<u8>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLUMNS, DEFAULT_CELL_SIZE)
    }
}

impl Board {
    /// Create a new empty board
    pub fn new(rows: usize, columns: usize, cell_size: u16) -> Self {
        let mut board = Self {
            rows,
            columns,
            cell_size,
            cells: Vec::new(),
        };
        board.initialize();
        board
    }

    /// Reset every cell to empty
    pub fn initialize(&mut self) {
        self.cells = vec![vec![EMPTY; self.columns]; self.rows];
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cell_size(&self) -> u16 {
        self.cell_size
    }

    /// True if (row, col) lies outside `[0, rows) x [0, columns)`
    ///
    /// Must be checked before [`Board::is_cell_empty`] for any coordinate
    /// that may be off the board.
    pub fn is_cell_out_of_bounds(&self, row: i32, col: i32) -> bool {
        !(row >= 0 && (row as usize) < self.rows && col >= 0 && (col as usize) < self.columns)
    }

    /// True if the cell holds no locked piece
    ///
    /// # Panics
    ///
    /// Panics if (row, col) is out of bounds.
    pub fn is_cell_empty(&self, row: i32, col: i32) -> bool {
        self.cells[row as usize][col as usize] == EMPTY
    }

    /// Occupancy value of an in-bounds cell
    #[allow(dead_code)]
    pub fn cell(&self, row: usize, col: usize) -> u8 {
        self.cells[row][col]
    }

    /// Write an occupancy value, used when locking a piece
    ///
    /// # Panics
    ///
    /// Panics if (row, col) is out of bounds.
    pub fn set_cell(&mut self, row: i32, col: i32, value: u8) {
        self.cells[row as usize][col as usize] = value;
    }

    /// All occupied cells as (row, col, value)
    pub fn occupied_cells(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|&(_, &value)| value != EMPTY)
                .map(move |(col, &value)| (row, col, value))
        })
    }

    /// Clear full rows and drop everything above them
    ///
    /// Walks the rows bottom-up once. Full rows are zeroed and counted; any
    /// other row is shifted down by the number of full rows seen below it.
    /// Returns the number of rows cleared.
    pub fn check_full_rows(&mut self) -> usize {
        let mut completed = 0;

        for row in (0..self.rows).rev() {
            if self.is_row_full(row) {
                self.clear_row(row);
                completed += 1;
            } else if completed > 0 {
                self.move_row_down(row, completed);
            }
        }

        completed
    }

    /// Check if the board is completely empty
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.occupied_cells().next().is_none()
    }

    fn is_row_full(&self, row: usize) -> bool {
        self.cells[row].iter().all(|&value| value != EMPTY)
    }

    fn clear_row(&mut self, row: usize) {
        self.cells[row].fill(EMPTY);
    }

    fn move_row_down(&mut self, row: usize, count: usize) {
        let moved = std::mem::replace(&mut self.cells[row], vec![EMPTY; self.columns]);
        self.cells[row + count] = moved;
    }
}

/// Text dump of the occupancy grid, one line per row
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: Vec<String> = row.iter().map(|value| value.to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
