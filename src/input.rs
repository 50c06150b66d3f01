//! Input handling
//!
//! The game asks two questions per frame: is an action's key held, and was
//! it pressed this frame. Terminals don't reliably report key releases, so a
//! key counts as held until its release arrives or until no repeat has been
//! seen for `KEY_TIMEOUT`.

use crate::settings::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode};
use std::time::{Duration, Instant};

/// Time after which we consider a key "released" if no repeat received
const KEY_TIMEOUT: Duration = Duration::from_millis(100);

const ACTION_COUNT: usize = 5;

/// Logical actions the game understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    Pause,
}

impl Action {
    #[allow(dead_code)]
    pub const ALL: [Action; ACTION_COUNT] = [
        Action::MoveLeft,
        Action::MoveRight,
        Action::SoftDrop,
        Action::Rotate,
        Action::Pause,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

/// Per-frame view of the player's input
pub trait InputSource {
    /// Is a key bound to `action` currently down
    fn is_held(&self, action: Action) -> bool;
    /// Was a key bound to `action` pressed during this frame
    fn was_pressed(&self, action: Action) -> bool;
    /// Was any key at all pressed during this frame
    fn any_pressed(&self) -> bool;
}

/// Key bindings configuration - supports multiple keys per action
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub soft_drop: Vec<KeyCode>,
    pub rotate: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
}

impl KeyBindings {
    /// Parse a key string into KeyCode
    fn parse_key(s: &str) -> Option<KeyCode> {
        let key = match s.to_lowercase().as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "esc" | "escape" => KeyCode::Esc,
            "shift" => KeyCode::Modifier(ModifierKeyCode::LeftShift),
            "ctrl" | "control" => KeyCode::Modifier(ModifierKeyCode::LeftControl),
            "alt" => KeyCode::Modifier(ModifierKeyCode::LeftAlt),
            s => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }

    /// Parse a list of key strings into KeyCodes, skipping unknown names
    fn parse_keys(keys: &[String]) -> Vec<KeyCode> {
        keys.iter()
            .filter_map(|s| {
                let key = Self::parse_key(s);
                if key.is_none() {
                    tracing::warn!("Ignoring unknown key binding '{}'", s);
                }
                key
            })
            .collect()
    }

    /// Create keybindings from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            move_left: Self::parse_keys(&settings.keys.move_left),
            move_right: Self::parse_keys(&settings.keys.move_right),
            soft_drop: Self::parse_keys(&settings.keys.soft_drop),
            rotate: Self::parse_keys(&settings.keys.rotate),
            pause: Self::parse_keys(&settings.keys.pause),
            quit: Self::parse_keys(&settings.keys.quit),
        }
    }

    /// Which action a key is bound to, if any
    fn action_for(&self, code: KeyCode) -> Option<Action> {
        if self.move_left.contains(&code) {
            Some(Action::MoveLeft)
        } else if self.move_right.contains(&code) {
            Some(Action::MoveRight)
        } else if self.soft_drop.contains(&code) {
            Some(Action::SoftDrop)
        } else if self.rotate.contains(&code) {
            Some(Action::Rotate)
        } else if self.pause.contains(&code) {
            Some(Action::Pause)
        } else {
            None
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_left: vec![KeyCode::Left],
            move_right: vec![KeyCode::Right],
            soft_drop: vec![KeyCode::Down],
            rotate: vec![KeyCode::Up],
            pause: vec![KeyCode::Char('p'), KeyCode::Esc],
            quit: vec![KeyCode::Char('q')],
        }
    }
}

/// Terminal input handler
pub struct InputHandler {
    bindings: KeyBindings,
    /// Last time each action's key was seen down
    held: [Option<Instant>; ACTION_COUNT],
    /// Held keys that must be released before they act again
    suppressed: [bool; ACTION_COUNT],
    /// Unbound key currently down, so its repeats are not fresh presses
    other_held: Option<(KeyCode, Instant)>,
    /// Fresh presses this frame
    pressed: [bool; ACTION_COUNT],
    any_pressed: bool,
    quit: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::with_bindings(KeyBindings::default())
    }

    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            held: [None; ACTION_COUNT],
            suppressed: [false; ACTION_COUNT],
            other_held: None,
            pressed: [false; ACTION_COUNT],
            any_pressed: false,
            quit: false,
        }
    }

    /// Create input handler from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_bindings(KeyBindings::from_settings(settings))
    }

    /// Feed one crossterm key event
    pub fn handle_key(&mut self, key: KeyEvent) {
        self.handle_key_at(key, Instant::now());
    }

    fn handle_key_at(&mut self, key: KeyEvent, now: Instant) {
        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => self.key_down(key, now),
            KeyEventKind::Release => self.key_up(key),
        }
    }

    fn key_down(&mut self, key: KeyEvent, now: Instant) {
        // Handle Ctrl+C for quit
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        let code = normalize_key(key.code);
        if self.bindings.quit.contains(&code) {
            self.quit = true;
            return;
        }

        let Some(action) = self.bindings.action_for(code) else {
            let repeat = self.other_held.is_some_and(|(held, _)| held == code);
            if !repeat && key.kind == KeyEventKind::Press {
                self.any_pressed = true;
            }
            self.other_held = Some((code, now));
            return;
        };

        let slot = &mut self.held[action.index()];
        // Terminals without release events report repeats as presses; a
        // held key refreshes its slot without counting as a new press
        if slot.is_none() && key.kind == KeyEventKind::Press {
            self.pressed[action.index()] = true;
            self.any_pressed = true;
        }
        *slot = Some(now);
    }

    fn key_up(&mut self, key: KeyEvent) {
        let code = normalize_key(key.code);
        if let Some(action) = self.bindings.action_for(code) {
            self.held[action.index()] = None;
            self.suppressed[action.index()] = false;
        } else if self.other_held.is_some_and(|(held, _)| held == code) {
            self.other_held = None;
        }
    }

    /// Forget this frame's presses and release keys that stopped repeating
    pub fn end_frame(&mut self) {
        self.end_frame_at(Instant::now());
    }

    fn end_frame_at(&mut self, now: Instant) {
        self.pressed = [false; ACTION_COUNT];
        self.any_pressed = false;
        let expired = |seen: Instant| now.duration_since(seen) > KEY_TIMEOUT;
        for (slot, suppressed) in self.held.iter_mut().zip(&mut self.suppressed) {
            if slot.is_some_and(expired) {
                *slot = None;
                *suppressed = false;
            }
        }
        if self.other_held.is_some_and(|(_, seen)| expired(seen)) {
            self.other_held = None;
        }
    }

    /// Keys down right now stop counting as held until they are released
    ///
    /// Called when the game changes state, so a key held through a pause,
    /// game over or restart neither keeps acting nor registers as a press.
    pub fn suppress_held(&mut self) {
        for (slot, suppressed) in self.held.iter().zip(&mut self.suppressed) {
            *suppressed = slot.is_some();
        }
        self.pressed = [false; ACTION_COUNT];
        self.any_pressed = false;
    }

    /// Did the player ask to leave
    pub fn quit_requested(&self) -> bool {
        self.quit
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for InputHandler {
    fn is_held(&self, action: Action) -> bool {
        self.held[action.index()].is_some() && !self.suppressed[action.index()]
    }

    fn was_pressed(&self, action: Action) -> bool {
        self.pressed[action.index()]
    }

    fn any_pressed(&self) -> bool {
        self.any_pressed
    }
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn event(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_press_is_held_and_pressed() {
        let mut input = InputHandler::new();
        let now = Instant::now();
        input.handle_key_at(event(KeyCode::Left, KeyEventKind::Press), now);

        assert!(input.is_held(Action::MoveLeft));
        assert!(input.was_pressed(Action::MoveLeft));
        assert!(input.any_pressed());
        assert!(!input.is_held(Action::MoveRight));
    }

    #[test]
    fn test_press_lasts_one_frame() {
        let mut input = InputHandler::new();
        let now = Instant::now();
        input.handle_key_at(event(KeyCode::Char('p'), KeyEventKind::Press), now);
        input.end_frame_at(now);

        assert!(!input.was_pressed(Action::Pause));
        assert!(!input.any_pressed());
        assert!(input.is_held(Action::Pause));
    }

    #[test]
    fn test_held_key_times_out() {
        let mut input = InputHandler::new();
        let now = Instant::now();
        input.handle_key_at(event(KeyCode::Down, KeyEventKind::Press), now);
        input.end_frame_at(now + KEY_TIMEOUT * 2);

        assert!(!input.is_held(Action::SoftDrop));
    }

    #[test]
    fn test_repeat_keeps_key_held_without_new_press() {
        let mut input = InputHandler::new();
        let now = Instant::now();
        input.handle_key_at(event(KeyCode::Up, KeyEventKind::Press), now);
        input.end_frame_at(now);

        let later = now + KEY_TIMEOUT / 2;
        input.handle_key_at(event(KeyCode::Up, KeyEventKind::Press), later);
        assert!(input.is_held(Action::Rotate));
        assert!(!input.was_pressed(Action::Rotate));

        input.end_frame_at(later + KEY_TIMEOUT / 2);
        assert!(input.is_held(Action::Rotate));
    }

    #[test]
    fn test_release_event() {
        let mut input = InputHandler::new();
        let now = Instant::now();
        input.handle_key_at(event(KeyCode::Right, KeyEventKind::Press), now);
        input.handle_key_at(event(KeyCode::Right, KeyEventKind::Release), now);

        assert!(!input.is_held(Action::MoveRight));
    }

    #[test]
    fn test_unbound_key_is_any_key() {
        let mut input = InputHandler::new();
        input.handle_key_at(event(KeyCode::Char('k'), KeyEventKind::Press), Instant::now());

        assert!(input.any_pressed());
        assert!(Action::ALL.iter().all(|&a| !input.is_held(a)));
    }

    #[test]
    fn test_repeat_after_state_change_is_not_a_press() {
        let mut input = InputHandler::new();
        let now = Instant::now();
        input.handle_key_at(event(KeyCode::Down, KeyEventKind::Press), now);
        input.end_frame_at(now);
        input.suppress_held();

        // Terminals without release events send repeats as presses
        let repeat = now + KEY_TIMEOUT / 2;
        input.handle_key_at(event(KeyCode::Down, KeyEventKind::Press), repeat);
        assert!(!input.was_pressed(Action::SoftDrop));
        assert!(!input.any_pressed());
        assert!(!input.is_held(Action::SoftDrop));

        // Once released it acts again
        input.handle_key_at(event(KeyCode::Down, KeyEventKind::Release), repeat);
        input.end_frame_at(repeat);
        input.handle_key_at(event(KeyCode::Down, KeyEventKind::Press), repeat);
        assert!(input.was_pressed(Action::SoftDrop));
        assert!(input.is_held(Action::SoftDrop));
    }

    #[test]
    fn test_suppressed_key_recovers_after_timeout() {
        let mut input = InputHandler::new();
        let now = Instant::now();
        input.handle_key_at(event(KeyCode::Char('p'), KeyEventKind::Press), now);
        input.end_frame_at(now);
        input.suppress_held();
        assert!(!input.is_held(Action::Pause));

        let later = now + KEY_TIMEOUT * 2;
        input.end_frame_at(later);
        input.handle_key_at(event(KeyCode::Char('p'), KeyEventKind::Press), later);
        assert!(input.was_pressed(Action::Pause));
    }

    #[test]
    fn test_unbound_repeat_is_not_any_key() {
        let mut input = InputHandler::new();
        let now = Instant::now();
        input.handle_key_at(event(KeyCode::Char('k'), KeyEventKind::Press), now);
        input.end_frame_at(now);

        input.handle_key_at(event(KeyCode::Char('k'), KeyEventKind::Press), now + KEY_TIMEOUT / 2);
        assert!(!input.any_pressed());

        input.handle_key_at(event(KeyCode::Char('j'), KeyEventKind::Press), now + KEY_TIMEOUT / 2);
        assert!(input.any_pressed());
    }

    #[test]
    fn test_quit_keys() {
        let mut input = InputHandler::new();
        input.handle_key_at(event(KeyCode::Char('Q'), KeyEventKind::Press), Instant::now());
        assert!(input.quit_requested());

        let mut input = InputHandler::new();
        let mut ctrl_c = event(KeyCode::Char('c'), KeyEventKind::Press);
        ctrl_c.modifiers = KeyModifiers::CONTROL;
        input.handle_key_at(ctrl_c, Instant::now());
        assert!(input.quit_requested());
        assert!(!input.any_pressed());
    }

    #[test]
    fn test_bindings_from_settings() {
        let mut settings = Settings::default();
        settings.keys.rotate = vec!["x".to_string(), "Up".to_string(), "bogus".to_string()];
        let bindings = KeyBindings::from_settings(&settings);

        assert_eq!(bindings.rotate, vec![KeyCode::Char('x'), KeyCode::Up]);
        assert_eq!(bindings.action_for(KeyCode::Char('x')), Some(Action::Rotate));
    }
}
