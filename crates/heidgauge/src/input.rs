//! Discrete operator events and where they come from.

use std::collections::VecDeque;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::{trace, warn};

use crate::{Error, Result};

fn input_error(e: std::io::Error) -> Error {
    Error::Input(e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Record the current readings into the next target slot.
    Capture,
    /// Delete the most recent capture.
    Undo,
    /// End the session now.
    Quit,
}

/// A source of operator events.
///
/// `poll_event` is the controller's only suspension point: it waits at most
/// `timeout` and returns `None` if nothing arrived in that window.
pub trait InputSource {
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<InputEvent>>;

    /// Whether an event is ready right now, without waiting.
    fn is_pending(&mut self) -> Result<bool>;
}

/// Keyboard input from the controlling terminal.
///
/// Raw mode is held for the lifetime of the value so single key presses are
/// delivered without waiting for a newline.
pub struct TerminalInput {
    _private: (),
}

impl TerminalInput {
    pub fn new() -> Result<Self> {
        enable_raw_mode().map_err(input_error)?;
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("failed to restore terminal mode: {e}");
        }
    }
}

impl InputSource for TerminalInput {
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<InputEvent>> {
        if !event::poll(timeout).map_err(input_error)? {
            return Ok(None);
        }
        match event::read().map_err(input_error)? {
            Event::Key(key) => {
                let mapped = map_key(key);
                trace!(?key, ?mapped, "key");
                Ok(mapped)
            }
            _ => Ok(None),
        }
    }

    fn is_pending(&mut self) -> Result<bool> {
        event::poll(Duration::ZERO).map_err(input_error)
    }
}

/// Space or enter captures, `d` deletes, `q`/Esc/Ctrl-C quits.
pub fn map_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputEvent::Quit)
        }
        KeyCode::Char(' ') | KeyCode::Enter => Some(InputEvent::Capture),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(InputEvent::Undo),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(InputEvent::Quit),
        _ => None,
    }
}

/// Replays a fixed sequence of polls.
///
/// Each entry is the outcome of one poll: `None` is a quiet interval. Once
/// the script runs out every poll answers `Quit`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    polls: VecDeque<Option<InputEvent>>,
}

impl ScriptedInput {
    pub fn new(polls: impl IntoIterator<Item = Option<InputEvent>>) -> Self {
        Self {
            polls: polls.into_iter().collect(),
        }
    }

    /// Every event arrives on its own poll, with no quiet intervals.
    pub fn events(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self::new(events.into_iter().map(Some))
    }

    pub fn remaining(&self) -> usize {
        self.polls.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll_event(&mut self, _timeout: Duration) -> Result<Option<InputEvent>> {
        Ok(self.polls.pop_front().unwrap_or(Some(InputEvent::Quit)))
    }

    fn is_pending(&mut self) -> Result<bool> {
        Ok(!matches!(self.polls.front(), Some(None)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(map_key(press(KeyCode::Char(' '))), Some(InputEvent::Capture));
        assert_eq!(map_key(press(KeyCode::Enter)), Some(InputEvent::Capture));
        assert_eq!(map_key(press(KeyCode::Char('d'))), Some(InputEvent::Undo));
        assert_eq!(map_key(press(KeyCode::Char('q'))), Some(InputEvent::Quit));
        assert_eq!(map_key(press(KeyCode::Esc)), Some(InputEvent::Quit));
        assert_eq!(map_key(press(KeyCode::Char('x'))), None);
        assert_eq!(map_key(press(KeyCode::Up)), None);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(key), Some(InputEvent::Quit));
        assert_eq!(map_key(press(KeyCode::Char('c'))), None);
    }

    #[test]
    fn test_release_is_ignored() {
        let mut key = press(KeyCode::Enter);
        key.kind = KeyEventKind::Release;
        assert_eq!(map_key(key), None);
    }

    #[test]
    fn test_scripted_input() {
        let mut input = ScriptedInput::new([None, Some(InputEvent::Capture)]);
        assert!(!input.is_pending().unwrap());
        assert_eq!(input.poll_event(Duration::ZERO).unwrap(), None);
        assert!(input.is_pending().unwrap());
        assert_eq!(
            input.poll_event(Duration::ZERO).unwrap(),
            Some(InputEvent::Capture)
        );
        assert_eq!(input.remaining(), 0);
        assert_eq!(
            input.poll_event(Duration::ZERO).unwrap(),
            Some(InputEvent::Quit)
        );
    }
}
