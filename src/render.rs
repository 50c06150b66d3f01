//! Drawing interface between the game and whatever shows it

/// Where a cell belongs on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// The playfield: locked cells and the falling piece
    Board,
    /// The next-piece preview
    Next,
}

/// One unit cell to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCell {
    pub region: Region,
    pub row: i32,
    pub col: i32,
    /// Occupancy value / piece id, indexes the palette
    pub color_index: u8,
}

/// A surface that can draw unit cells
pub trait Canvas {
    fn draw_cell(&mut self, cell: DrawCell);
}

impl Canvas for Vec<DrawCell> {
    fn draw_cell(&mut self, cell: DrawCell) {
        self.push(cell);
    }
}
