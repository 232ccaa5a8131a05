//! Keyboard and mouse handling for the TUI.
//!
//! This module translates terminal events into navigation requests. The
//! navigator itself rejects requests while a transition is running.

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use crate::app::{App, AppState, Button};

use super::render::button_areas;

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.state = AppState::Quitting;
            return true;
        }
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Left | KeyCode::Char('h') => app.go_prev(),
        KeyCode::Right | KeyCode::Char('l') => app.go_next(),
        KeyCode::Char('r') => app.go_random(),
        _ => {}
    }
    false
}

/// Which footer button, if any, sits under a screen cell
pub fn button_at(frame_area: Rect, column: u16, row: u16) -> Option<Button> {
    button_areas(frame_area)
        .into_iter()
        .find(|(_, rect)| rect.contains(Position::new(column, row)))
        .map(|(button, _)| button)
}

/// Handle mouse input. A left-button drag is a swipe; a press and release
/// without enough travel over a footer button is a click.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent, frame_area: Rect) {
    if !matches!(app.state, AppState::Normal) {
        return;
    }

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.swipe_start(mouse.column),
        MouseEventKind::Up(MouseButton::Left) => {
            if app.swipe_end(mouse.column) {
                return;
            }
            if let Some(button) = button_at(frame_area, mouse.column, mouse.row) {
                if app.is_enabled(button) {
                    app.press(button);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_at() {
        let area = Rect::new(0, 0, 80, 24);
        let buttons = button_areas(area);

        for (button, rect) in buttons {
            assert_eq!(button_at(area, rect.x + 1, rect.y + 1), Some(button));
        }
        assert_eq!(button_at(area, 0, 0), None);
        assert_eq!(button_at(area, buttons[0].1.x, 5), None);
    }
}
