//! Scoring

/// Score tracking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Score {
    /// Current score
    pub points: u32,
    /// Total lines cleared
    pub lines: u32,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points for clearing `lines` rows with a single lock
    pub fn clear_points(lines: usize) -> u32 {
        match lines {
            1 => 100,
            2 => 300,
            3 => 500,
            4 => 1000,
            _ => 0,
        }
    }

    /// Add score for a line clear, returns the points awarded
    pub fn add_clear(&mut self, lines: usize) -> u32 {
        let points = Self::clear_points(lines);
        self.points += points;
        self.lines += lines as u32;
        points
    }

    /// Add score for one soft drop step
    pub fn add_soft_drop(&mut self) {
        self.points += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
