use super::*;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

impl App {
    pub(super) fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char('c') = key.code {
                if self.is_finished() {
                    self.request_quit();
                } else {
                    self.request_kill();
                }
            }
            return;
        }

        match key.code {
            KeyCode::Char('k') => self.request_kill(),
            KeyCode::Char('q') => self.request_quit(),
            KeyCode::Char('c') => self.request_clear(),
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::PageUp => self.move_cursor(-self.page_rows()),
            KeyCode::PageDown => self.move_cursor(self.page_rows()),
            KeyCode::Home | KeyCode::Char('g') => self.jump_to(0),
            KeyCode::End | KeyCode::Char('G') => self.jump_to_bottom(),
            _ => {}
        }
    }
}
