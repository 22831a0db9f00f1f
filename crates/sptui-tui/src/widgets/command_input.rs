//! CommandInput: wraps tui-input for the `:` command line.

use ratatui::crossterm::event::{Event, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_INPUT_BG, C_INPUT_FG, C_MODE_INPUT};

const PROMPT: &str = ": ";

#[derive(Default)]
pub struct CommandInput {
    input: Input,
}

impl CommandInput {
    pub fn clear(&mut self) {
        self.input = Input::default();
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    /// Return the typed text and reset the line.
    pub fn take(&mut self) -> String {
        let text = self.input.value().to_string();
        self.clear();
        text
    }

    /// Editing keys (characters, backspace, cursor movement).
    pub fn handle_key(&mut self, key: KeyEvent) {
        self.input.handle_event(&Event::Key(key));
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let prompt_w = PROMPT.len();
        let scroll = self
            .input
            .visual_scroll((area.width as usize).saturating_sub(prompt_w + 1));
        let value: String = self.input.value().chars().skip(scroll).collect();

        let line = Line::from(vec![
            Span::styled(PROMPT, Style::default().fg(C_MODE_INPUT)),
            Span::styled(value, Style::default().fg(C_INPUT_FG)),
        ]);
        frame.render_widget(
            Paragraph::new(line).style(Style::default().bg(C_INPUT_BG)),
            area,
        );

        let cursor_x = area.x + (prompt_w + self.input.visual_cursor().saturating_sub(scroll)) as u16;
        frame.set_cursor_position((cursor_x.min(area.x + area.width.saturating_sub(1)), area.y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_and_backspace() {
        let mut input = CommandInput::default();
        for c in "pausx".chars() {
            input.handle_key(key(KeyCode::Char(c)));
        }
        input.handle_key(key(KeyCode::Backspace));
        input.handle_key(key(KeyCode::Char('e')));
        assert_eq!(input.text(), "pause");
        assert_eq!(input.take(), "pause");
        assert_eq!(input.text(), "");
    }
}
