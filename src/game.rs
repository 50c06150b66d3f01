//! Core game state and logic
//!
//! The session runs one frame at a time. Every timed action (gravity, the
//! shared left/right move, soft drop, rotation) has its own cooldown and
//! fires when more than its delay has passed since it last fired. Moves are
//! applied first and undone if the piece no longer fits.

use crate::audio::{Sfx, SoundSink};
use crate::bag::Bag;
use crate::board::Board;
use crate::input::{Action, InputSource};
use crate::piece::Piece;
use crate::render::{Canvas, DrawCell, Region};
use crate::score::Score;
use std::time::Duration;

/// Cooldowns for each class of timed action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub gravity: Duration,
    pub horizontal: Duration,
    pub vertical: Duration,
    pub rotation: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            gravity: Duration::from_millis(300),
            horizontal: Duration::from_millis(100),
            vertical: Duration::from_millis(50),
            rotation: Duration::from_millis(200),
        }
    }
}

/// Game state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Playing,
    Paused,
    GameOver,
}

/// The main game struct
pub struct Game {
    /// The game board
    pub board: Board,
    /// Current falling piece
    current: Piece,
    /// Piece shown in the preview, next to fall
    next: Piece,
    /// Piece bag randomizer
    bag: Bag,
    /// Score tracking
    pub score: Score,
    state: GameState,
    timings: Timings,
    last_horizontal_move: Duration,
    last_vertical_move: Duration,
    last_rotation: Duration,
    last_drop: Duration,
}

impl Game {
    /// Create a new game with a random piece sequence
    pub fn new(board: Board, timings: Timings) -> Self {
        Self::with_seed(board, timings, rand::random())
    }

    /// Create a new game with a fixed piece sequence
    pub fn with_seed(board: Board, timings: Timings, seed: u64) -> Self {
        let mut bag = Bag::with_seed(seed);
        let current = Piece::new(bag.next());
        let next = Piece::new(bag.next());

        Self {
            board,
            current,
            next,
            bag,
            score: Score::new(),
            state: GameState::Playing,
            timings,
            last_horizontal_move: Duration::ZERO,
            last_vertical_move: Duration::ZERO,
            last_rotation: Duration::ZERO,
            last_drop: Duration::ZERO,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    #[allow(dead_code)]
    pub fn current_piece(&self) -> &Piece {
        &self.current
    }

    #[allow(dead_code)]
    pub fn next_piece(&self) -> &Piece {
        &self.next
    }

    /// Run one frame
    ///
    /// `now` is the time since the session started.
    pub fn update(&mut self, now: Duration, input: &impl InputSource, sound: &mut impl SoundSink) {
        if self.state == GameState::Playing && self.due(now, self.last_drop, self.timings.gravity) {
            self.move_down(sound);
            self.last_drop = now;
        }

        self.handle_input(now, input, sound);
    }

    fn handle_input(&mut self, now: Duration, input: &impl InputSource, sound: &mut impl SoundSink) {
        if self.state == GameState::GameOver {
            if input.any_pressed() {
                self.reset();
            }
            return;
        }

        if input.was_pressed(Action::Pause) {
            self.toggle_pause();
        }
        if self.state != GameState::Playing {
            return;
        }

        if input.is_held(Action::MoveLeft)
            && self.due(now, self.last_horizontal_move, self.timings.horizontal)
        {
            self.move_left();
            self.last_horizontal_move = now;
        }
        if input.is_held(Action::MoveRight)
            && self.due(now, self.last_horizontal_move, self.timings.horizontal)
        {
            self.move_right();
            self.last_horizontal_move = now;
        }
        if input.is_held(Action::SoftDrop)
            && self.due(now, self.last_vertical_move, self.timings.vertical)
        {
            self.soft_drop(sound);
            self.last_vertical_move = now;
            if self.state != GameState::Playing {
                return;
            }
        }
        if input.is_held(Action::Rotate) && self.due(now, self.last_rotation, self.timings.rotation)
        {
            self.rotate(sound);
            self.last_rotation = now;
        }
    }

    /// Has strictly more than `delay` passed since `last`
    fn due(&self, now: Duration, last: Duration, delay: Duration) -> bool {
        now.saturating_sub(last) > delay
    }

    /// Flip between playing and paused; no effect once the game is over
    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            GameState::Playing => GameState::Paused,
            GameState::Paused => GameState::Playing,
            GameState::GameOver => GameState::GameOver,
        };
        tracing::debug!("Pause toggled, state={:?}", self.state);
    }

    /// Start over with an empty board, zero score and a fresh bag
    pub fn reset(&mut self) {
        self.board.initialize();
        self.bag.refill();
        self.current = Piece::new(self.bag.next());
        self.next = Piece::new(self.bag.next());
        self.score.reset();
        self.state = GameState::Playing;
        tracing::info!("Game reset");
    }

    /// Does the piece lie inside the board on empty cells only
    fn fits(&self, piece: &Piece) -> bool {
        piece.cell_positions().iter().all(|p| {
            !self.board.is_cell_out_of_bounds(p.row, p.col) && self.board.is_cell_empty(p.row, p.col)
        })
    }

    fn move_left(&mut self) {
        self.current.move_by(0, -1);
        if !self.fits(&self.current) {
            self.current.move_by(0, 1);
        }
    }

    fn move_right(&mut self) {
        self.current.move_by(0, 1);
        if !self.fits(&self.current) {
            self.current.move_by(0, -1);
        }
    }

    /// Step the piece down one row, locking it if it can't go further
    ///
    /// Returns true if the piece moved.
    fn move_down(&mut self, sound: &mut impl SoundSink) -> bool {
        self.current.move_by(1, 0);
        if self.fits(&self.current) {
            return true;
        }

        self.current.move_by(-1, 0);
        self.lock_piece(sound);
        false
    }

    fn soft_drop(&mut self, sound: &mut impl SoundSink) {
        if self.move_down(sound) {
            self.score.add_soft_drop();
        }
    }

    fn rotate(&mut self, sound: &mut impl SoundSink) {
        self.current.rotate();
        if self.fits(&self.current) {
            sound.play(Sfx::Rotate);
        } else {
            self.current.undo_rotate();
        }
    }

    /// Write the current piece into the board, clear rows and bring in the
    /// next piece
    fn lock_piece(&mut self, sound: &mut impl SoundSink) {
        let id = self.current.id();
        for cell in self.current.cell_positions() {
            self.board.set_cell(cell.row, cell.col, id);
        }
        tracing::debug!(
            "Locked {} at {:?}",
            self.current.kind().name(),
            self.current.offset()
        );

        let cleared = self.board.check_full_rows();
        if cleared > 0 {
            let points = self.score.add_clear(cleared);
            tracing::debug!("Cleared {} rows for {} points", cleared, points);
            sound.play(Sfx::Clear);
        }

        // Check for top out
        if !self.fits(&self.next) {
            self.state = GameState::GameOver;
            tracing::info!(
                "Game over, score={} lines={}",
                self.score.points,
                self.score.lines
            );
            return;
        }

        let next = Piece::new(self.bag.next());
        self.current = std::mem::replace(&mut self.next, next);
    }

    /// Hand every visible cell to the canvas
    pub fn draw(&self, canvas: &mut impl Canvas) {
        for (row, col, value) in self.board.occupied_cells() {
            canvas.draw_cell(DrawCell {
                region: Region::Board,
                row: row as i32,
                col: col as i32,
                color_index: value,
            });
        }

        for (region, piece) in [(Region::Board, &self.current), (Region::Next, &self.next)] {
            for cell in piece.cell_positions() {
                canvas.draw_cell(DrawCell {
                    region,
                    row: cell.row,
                    col: cell.col,
                    color_index: piece.id(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputHandler;
    use crate::tetromino::PieceKind;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    /// Input that reports a fixed set of keys
    #[derive(Default)]
    struct Script {
        held: Vec<Action>,
        pressed: Vec<Action>,
        any: bool,
    }

    impl Script {
        fn holding(actions: &[Action]) -> Self {
            Self {
                held: actions.to_vec(),
                ..Default::default()
            }
        }

        fn pressing(action: Action) -> Self {
            Self {
                held: vec![action],
                pressed: vec![action],
                any: true,
            }
        }
    }

    impl InputSource for Script {
        fn is_held(&self, action: Action) -> bool {
            self.held.contains(&action)
        }

        fn was_pressed(&self, action: Action) -> bool {
            self.pressed.contains(&action)
        }

        fn any_pressed(&self) -> bool {
            self.any
        }
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn game() -> Game {
        Game::with_seed(Board::default(), Timings::default(), 11)
    }

    fn game_with(kind: PieceKind) -> Game {
        let mut game = game();
        game.current = Piece::new(kind);
        game
    }

    /// Drop the current piece until it locks
    fn drop_piece(game: &mut Game, sound: &mut Vec<Sfx>) {
        while game.move_down(sound) {}
    }

    fn fill_row_except(board: &mut Board, row: i32, gap: &[i32]) {
        for col in 0..board.columns() as i32 {
            if !gap.contains(&col) {
                board.set_cell(row, col, PieceKind::Z.id());
            }
        }
    }

    #[test]
    fn test_gravity_waits_for_delay() {
        let mut game = game();
        let mut sound = Vec::new();
        let idle = Script::default();
        let start = game.current_piece().offset();

        game.update(ms(300), &idle, &mut sound);
        assert_eq!(game.current_piece().offset(), start);

        game.update(ms(301), &idle, &mut sound);
        assert_eq!(game.current_piece().offset(), (start.0 + 1, start.1));

        game.update(ms(500), &idle, &mut sound);
        assert_eq!(game.current_piece().offset(), (start.0 + 1, start.1));
    }

    #[test]
    fn test_move_left_at_wall_is_reverted() {
        let mut game = game_with(PieceKind::O);
        let mut sound = Vec::new();
        let left = Script::holding(&[Action::MoveLeft]);

        // O spawns at column 4; four allowed moves reach the wall
        for step in 1..=4 {
            game.update(ms(101 * step), &left, &mut sound);
        }
        let at_wall = game.current_piece().offset();
        assert_eq!(at_wall.1, 0);

        game.update(ms(101 * 5), &left, &mut sound);
        assert_eq!(game.current_piece().offset().1, at_wall.1);
    }

    #[test]
    fn test_move_right_blocked_by_locked_cell() {
        let mut game = game_with(PieceKind::O);
        // O occupies rows 0-1, columns 4-5
        game.board.set_cell(1, 6, PieceKind::L.id());
        game.move_right();
        assert_eq!(game.current_piece().offset(), (0, 4));
        game.move_left();
        assert_eq!(game.current_piece().offset(), (0, 3));
    }

    #[test]
    fn test_horizontal_cooldown_is_shared() {
        let mut game = game_with(PieceKind::T);
        let mut sound = Vec::new();
        let both = Script::holding(&[Action::MoveLeft, Action::MoveRight]);

        game.update(ms(150), &both, &mut sound);
        // Left fired, right was still cooling down
        assert_eq!(game.current_piece().offset(), (0, 2));

        game.update(ms(200), &both, &mut sound);
        assert_eq!(game.current_piece().offset(), (0, 2));
    }

    #[test]
    fn test_soft_drop_scores_each_step() {
        let mut game = game();
        let mut sound = Vec::new();
        let down = Script::holding(&[Action::SoftDrop]);
        let start = game.current_piece().offset();

        game.update(ms(51), &down, &mut sound);
        game.update(ms(80), &down, &mut sound);
        game.update(ms(102), &down, &mut sound);

        assert_eq!(game.score.points, 2);
        assert_eq!(game.current_piece().offset().0, start.0 + 2);
    }

    #[test]
    fn test_soft_drop_into_lock_scores_nothing() {
        let mut game = game_with(PieceKind::O);
        let mut sound = Vec::new();
        game.current.move_by(18, 0);
        assert!(game.fits(&game.current));

        game.soft_drop(&mut sound);
        assert_eq!(game.score.points, 0);
        assert_eq!(game.board.occupied_cells().count(), 4);
    }

    #[test]
    fn test_lock_writes_piece_cells() {
        let mut game = game_with(PieceKind::T);
        let mut sound = Vec::new();
        let next_kind = game.next_piece().kind();

        drop_piece(&mut game, &mut sound);

        let locked: Vec<_> = game.board.occupied_cells().collect();
        assert_eq!(locked.len(), 4);
        assert!(locked.iter().all(|&(_, _, id)| id == PieceKind::T.id()));
        let mut expected = Piece::new(PieceKind::T);
        expected.move_by(18, 0);
        for cell in expected.cell_positions() {
            assert_eq!(game.board.cell(cell.row as usize, cell.col as usize), PieceKind::T.id());
        }

        // The preview piece is promoted at its spawn offset
        assert_eq!(game.current_piece().kind(), next_kind);
        assert_eq!(game.current_piece().offset(), next_kind.spawn_offset());
        assert!(sound.is_empty());
    }

    #[test]
    fn test_line_clear_scoring() {
        for (lines, points) in [(1, 100), (2, 300), (3, 500), (4, 1000)] {
            let mut game = game_with(PieceKind::I);
            let mut sound = Vec::new();
            for row in (20 - lines)..20 {
                fill_row_except(&mut game.board, row, &[5]);
            }
            // Stand the I up in column 5
            game.current.move_by(2, 0);
            game.rotate(&mut sound);
            assert_eq!(sound, vec![Sfx::Rotate]);

            drop_piece(&mut game, &mut sound);

            assert_eq!(game.score.points, points, "{} lines", lines);
            assert_eq!(game.score.lines, lines as u32);
            assert_eq!(sound, vec![Sfx::Rotate, Sfx::Clear]);
            // What's left of the I sits in column 5 at the bottom
            let leftover: Vec<_> = game.board.occupied_cells().collect();
            assert_eq!(leftover.len(), 4 - lines as usize);
            assert!(leftover.iter().all(|&(row, col, _)| col == 5 && row >= 16 + lines as usize));
        }
    }

    #[test]
    fn test_rotation_blocked_is_undone() {
        // A flat I at spawn would poke above the board when turned
        let mut game = game_with(PieceKind::I);
        let mut sound = Vec::new();
        let before = game.current_piece().clone();

        game.rotate(&mut sound);

        assert_eq!(game.current_piece(), &before);
        assert!(sound.is_empty());
    }

    #[test]
    fn test_rotation_cooldown() {
        let mut game = game_with(PieceKind::T);
        let mut sound = Vec::new();
        let up = Script::holding(&[Action::Rotate]);

        game.update(ms(201), &up, &mut sound);
        game.update(ms(300), &up, &mut sound);
        assert_eq!(game.current_piece().rotation(), 1);

        game.update(ms(402), &up, &mut sound);
        assert_eq!(game.current_piece().rotation(), 2);
        assert_eq!(sound, vec![Sfx::Rotate, Sfx::Rotate]);
    }

    #[test]
    fn test_pause_freezes_gravity_and_moves() {
        let mut game = game();
        let mut sound = Vec::new();
        let start = game.current_piece().offset();

        game.update(ms(10), &Script::pressing(Action::Pause), &mut sound);
        assert_eq!(game.state(), GameState::Paused);

        let left = Script::holding(&[Action::MoveLeft, Action::SoftDrop]);
        game.update(ms(1000), &left, &mut sound);
        assert_eq!(game.current_piece().offset(), start);
        assert_eq!(game.score.points, 0);

        game.update(ms(1010), &Script::pressing(Action::Pause), &mut sound);
        assert_eq!(game.state(), GameState::Playing);
        game.update(ms(1011), &Script::default(), &mut sound);
        assert_eq!(game.current_piece().offset(), (start.0 + 1, start.1));
    }

    #[test]
    fn test_blocked_spawn_ends_game() {
        let mut game = game_with(PieceKind::O);
        let mut sound = Vec::new();
        game.current.move_by(18, 0);
        // Clutter the spawn rows without completing them
        for row in 0..2 {
            for col in 3..7 {
                game.board.set_cell(row, col, PieceKind::S.id());
            }
        }

        game.update(ms(301), &Script::default(), &mut sound);
        assert_eq!(game.state(), GameState::GameOver);

        // Gravity, moves and pause do nothing now
        let board = game.board.clone();
        game.update(ms(2000), &Script::holding(&[Action::MoveLeft, Action::SoftDrop]), &mut sound);
        assert_eq!(game.board, board);
        game.toggle_pause();
        assert_eq!(game.state(), GameState::GameOver);
    }

    #[test]
    fn test_any_key_restarts_after_game_over() {
        let mut game = game();
        let mut sound = Vec::new();
        game.score.add_clear(2);
        game.board.set_cell(5, 5, 1);
        game.state = GameState::GameOver;

        game.update(ms(10), &Script::default(), &mut sound);
        assert_eq!(game.state(), GameState::GameOver);

        let any = Script {
            any: true,
            ..Default::default()
        };
        game.update(ms(20), &any, &mut sound);
        assert_eq!(game.state(), GameState::Playing);
        assert!(game.board.is_empty());
        assert_eq!(game.score, Score::new());
        assert!(game.fits(game.current_piece()));
    }

    #[test]
    fn test_key_held_into_game_over_does_not_restart() {
        let mut game = game_with(PieceKind::O);
        let mut sound = Vec::new();
        let mut input = InputHandler::new();
        game.current.move_by(18, 0);
        for row in 0..2 {
            for col in 3..7 {
                game.board.set_cell(row, col, PieceKind::S.id());
            }
        }

        let down = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
        input.handle_key(down);
        game.update(ms(100), &input, &mut sound);
        assert_eq!(game.state(), GameState::GameOver);
        input.end_frame();
        input.suppress_held();

        // The terminal keeps repeating the held key as presses
        input.handle_key(down);
        game.update(ms(150), &input, &mut sound);
        assert_eq!(game.state(), GameState::GameOver);
        input.end_frame();

        input.handle_key(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE));
        game.update(ms(200), &input, &mut sound);
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn test_pieces_come_from_the_bag() {
        let mut game = game();
        let mut sound = Vec::new();
        let mut drawn = vec![game.current_piece().kind(), game.next_piece().kind()];

        // Five locks draw the rest of the first bag
        for _ in 0..5 {
            game.board.initialize();
            drop_piece(&mut game, &mut sound);
            assert_eq!(game.state(), GameState::Playing);
            drawn.push(game.next_piece().kind());
        }

        let unique: std::collections::HashSet<_> = drawn.iter().collect();
        assert_eq!(unique.len(), 7);
    }

    #[test]
    fn test_draw_hands_over_all_cells() {
        let mut game = game();
        game.board.set_cell(19, 0, PieceKind::J.id());
        let mut canvas: Vec<DrawCell> = Vec::new();

        game.draw(&mut canvas);

        assert_eq!(canvas.len(), 9);
        assert_eq!(
            canvas[0],
            DrawCell {
                region: Region::Board,
                row: 19,
                col: 0,
                color_index: PieceKind::J.id(),
            }
        );
        let next: Vec<_> = canvas.iter().filter(|c| c.region == Region::Next).collect();
        assert_eq!(next.len(), 4);
        assert!(next.iter().all(|c| c.color_index == game.next_piece().id()));
    }
}
