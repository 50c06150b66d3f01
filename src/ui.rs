//! Terminal UI rendering with ratatui

use crate::game::{Game, GameState};
use crate::render::{Canvas, DrawCell, Region};
use crate::score::Score;
use crate::settings::Settings;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const CELL_GLYPH: char = '█';

/// Width of the score / next column
const SIDE_WIDTH: u16 = 14;
/// Height of the score box
const SCORE_HEIGHT: u16 = 6;
/// Height of the next piece box
const NEXT_HEIGHT: u16 = 6;

/// Cell colours indexed by occupancy value; 0 is the empty-cell colour
const PALETTE: [Color; 8] = [
    Color::Rgb(26, 31, 40),
    Color::Rgb(47, 230, 23),
    Color::Rgb(232, 18, 18),
    Color::Rgb(226, 116, 17),
    Color::Rgb(237, 234, 4),
    Color::Rgb(166, 0, 247),
    Color::Rgb(21, 204, 209),
    Color::Rgb(13, 64, 216),
];

/// Colour for an occupancy value or piece id
pub fn cell_color(index: u8) -> Color {
    PALETTE.get(index as usize).copied().unwrap_or(Color::White)
}

/// Everything the game drew this frame, laid out as grids
#[derive(Debug)]
struct CellBuffer {
    board: Vec<Vec<u8>>,
    next: Vec<DrawCell>,
}

impl CellBuffer {
    fn new(rows: usize, columns: usize) -> Self {
        Self {
            board: vec![vec![0; columns]; rows],
            next: Vec::with_capacity(4),
        }
    }
}

impl Canvas for CellBuffer {
    fn draw_cell(&mut self, cell: DrawCell) {
        match cell.region {
            Region::Board => {
                if cell.row < 0 || cell.col < 0 {
                    return;
                }
                if let Some(slot) = self
                    .board
                    .get_mut(cell.row as usize)
                    .and_then(|row| row.get_mut(cell.col as usize))
                {
                    *slot = cell.color_index;
                }
            }
            Region::Next => self.next.push(cell),
        }
    }
}

/// Render the whole game screen
pub fn render_game(frame: &mut Frame, game: &Game, settings: &Settings) {
    let area = frame.area();
    let board = &game.board;
    let cell_width = board.cell_size().max(1);

    let board_width = grid_extent(board.columns(), cell_width);
    let board_height = grid_extent(board.rows(), 1);
    let side_width = SIDE_WIDTH.max(grid_extent(4, cell_width));
    let game_area = center_rect(area, board_width.saturating_add(side_width), board_height);

    // Create main layout: board | score + next
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(board_width), Constraint::Length(side_width)])
        .split(game_area);

    let mut cells = CellBuffer::new(board.rows(), board.columns());
    game.draw(&mut cells);

    render_board(frame, main_layout[0], &cells, cell_width);

    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(SCORE_HEIGHT),
            Constraint::Length(NEXT_HEIGHT),
            Constraint::Min(0),
        ])
        .split(main_layout[1]);

    render_stats(frame, right_layout[0], &game.score);
    render_next(frame, right_layout[1], &cells.next, cell_width);

    // Overlays
    match game.state() {
        GameState::Paused => {
            render_overlay(frame, area, "PAUSED", &pause_hint(&settings.keys.pause));
        }
        GameState::GameOver => render_overlay(frame, area, "GAME OVER", "Press any key"),
        GameState::Playing => {}
    }
}

/// Terminal cells spanned by `count` grid cells plus a border on each side
fn grid_extent(count: usize, cell_width: u16) -> u16 {
    u16::try_from(count)
        .unwrap_or(u16::MAX)
        .saturating_mul(cell_width)
        .saturating_add(2)
}

fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn cell_span(index: u8, cell_width: u16) -> Span<'static> {
    let glyph: String = std::iter::repeat(CELL_GLYPH).take(cell_width as usize).collect();
    Span::styled(glyph, Style::default().fg(cell_color(index)))
}

/// Render the game board
fn render_board(frame: &mut Frame, area: Rect, cells: &CellBuffer, cell_width: u16) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = cells
        .board
        .iter()
        .map(|row| {
            Line::from(
                row.iter()
                    .map(|&value| cell_span(value, cell_width))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Lines for the preview piece, shifted to its own bounding box
fn preview_lines(cells: &[DrawCell], cell_width: u16) -> Vec<Line<'static>> {
    let (Some(min_row), Some(max_row)) = (
        cells.iter().map(|c| c.row).min(),
        cells.iter().map(|c| c.row).max(),
    ) else {
        return Vec::new();
    };
    let min_col = cells.iter().map(|c| c.col).min().unwrap_or(0);
    let max_col = cells.iter().map(|c| c.col).max().unwrap_or(0);
    let blank: String = " ".repeat(cell_width as usize);

    (min_row..=max_row)
        .map(|row| {
            let spans: Vec<Span> = (min_col..=max_col)
                .map(|col| {
                    match cells.iter().find(|c| c.row == row && c.col == col) {
                        Some(cell) => cell_span(cell.color_index, cell_width),
                        None => Span::raw(blank.clone()),
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// Render the next piece box
fn render_next(frame: &mut Frame, area: Rect, cells: &[DrawCell], cell_width: u16) {
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::raw("")];
    lines.extend(preview_lines(cells, cell_width));
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, score: &Score) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(Span::styled("SCORE", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", score.points),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::from(Span::styled("LINES", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", score.lines),
            Style::default().fg(Color::Green),
        )),
    ];

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// How to leave the pause screen with the configured keys
fn pause_hint(keys: &[String]) -> String {
    if keys.is_empty() {
        "Paused".to_string()
    } else {
        format!("Press {} to resume", keys.join("/"))
    }
}

/// Render an overlay (for pause/game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let text_width = u16::try_from(subtitle.chars().count()).unwrap_or(u16::MAX);
    let popup_width = text_width.saturating_add(4).max(24);
    let popup_height = 5u16;
    let popup_area = center_rect(area, popup_width, popup_height);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(title.to_string(), Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle.to_string(), Style::default().fg(Color::Gray)),
    ];

    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}
