//! BLOCKTRIS - falling blocks in the terminal
//!
//! Seven pieces, one board, clear the rows before they reach the top.

mod audio;
mod bag;
mod board;
mod game;
mod input;
mod piece;
mod render;
mod score;
mod settings;
mod tetromino;
mod ui;

use anyhow::Context;
use audio::AudioManager;
use crossterm::{
    event::{self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use game::{Game, GameState};
use input::InputHandler;
use ratatui::{backend::CrosstermBackend, Terminal};
use settings::Settings;
use std::{
    io::{self, stdout},
    path::PathBuf,
    time::Instant,
};

/// Get the blocktris temp directory, creating it if needed
fn blocktris_temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("blocktris");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn main() -> anyhow::Result<()> {
    // Generate session ID for this instance
    let session_id: u32 = rand::random();

    let log_dir = blocktris_temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    // Setup tracing to log file
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("blocktris=debug".parse()?),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "BLOCKTRIS starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    tetromino::validate_catalog().context("piece catalog is inconsistent")?;

    let settings = Settings::load();
    // First run: write the defaults out so they can be edited
    if Settings::settings_path().is_some_and(|path| !path.exists()) {
        if let Err(e) = settings.save() {
            tracing::warn!("Could not save default settings: {}", e);
        }
    }

    // Initialize audio (optional - game works without audio)
    let mut audio = AudioManager::new();
    if let Some(a) = audio.as_mut() {
        a.set_music_volume(settings.audio.music_volume as f32 / 100.0);
        a.set_sfx_volume(settings.audio.sfx_volume as f32 / 100.0);
        a.play_music();
    }

    // Setup terminal
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    // Release events make held keys far more accurate where the terminal supports them
    let enhanced_keys = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced_keys {
        execute!(
            stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run app and capture result
    let result = run_app(&mut terminal, &settings, &mut audio);

    // Restore terminal
    if enhanced_keys {
        execute!(stdout(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let game = result?;
    tracing::info!(
        "Session over, score={} lines={}",
        game.score.points,
        game.score.lines
    );
    println!("\nThanks for playing BLOCKTRIS!");
    println!("Final Score: {} | Lines: {}", game.score.points, game.score.lines);

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: &Settings,
    audio: &mut Option<AudioManager>,
) -> io::Result<Game> {
    let board = settings.board.build();
    let timings = settings.gameplay.timings();
    let mut game = match settings.gameplay.seed {
        Some(seed) => Game::with_seed(board, timings, seed),
        None => Game::new(board, timings),
    };
    let mut input = InputHandler::from_settings(settings);
    let frame_duration = settings.gameplay.frame_duration();
    let start = Instant::now();
    let mut last_state = game.state();

    loop {
        let frame_start = Instant::now();

        // Render
        terminal.draw(|frame| ui::render_game(frame, &game, settings))?;

        // Drain input until the frame budget is spent
        while let Some(remaining) = frame_duration.checked_sub(frame_start.elapsed()) {
            if !event::poll(remaining)? {
                break;
            }
            if let Event::Key(key) = event::read()? {
                input.handle_key(key);
            }
        }

        if input.quit_requested() {
            return Ok(game);
        }

        game.update(start.elapsed(), &input, audio);
        input.end_frame();

        let state = game.state();
        if state != last_state {
            input.suppress_held();
            if let Some(a) = audio.as_mut() {
                match state {
                    GameState::Paused => a.pause_music(),
                    GameState::Playing => a.resume_music(),
                    GameState::GameOver => {}
                }
            }
            last_state = state;
        }
    }
}
