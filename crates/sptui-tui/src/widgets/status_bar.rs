//! Status bar: mode label plus the keybindings for the current view.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::navigation::{Depth, TextMode};
use crate::theme::{C_MODE_ERROR, C_MODE_INPUT, C_MODE_NORMAL, C_MUTED};

fn mode_label(mode: TextMode, depth: Depth) -> (&'static str, ratatui::style::Color) {
    match (mode, depth) {
        (TextMode::Input, _) => ("COMMAND", C_MODE_INPUT),
        (TextMode::Error, _) => ("ERROR", C_MODE_ERROR),
        (TextMode::None, Depth::Top) => ("BROWSE", C_MODE_NORMAL),
        (TextMode::None, Depth::TrackList) => ("TRACKS", C_MODE_NORMAL),
    }
}

fn key_hints(mode: TextMode, depth: Depth) -> &'static str {
    match (mode, depth) {
        (TextMode::Input, _) => " play | pause | next | prev   Enter run  Esc cancel",
        (TextMode::Error, _) => " Enter dismiss",
        (TextMode::None, Depth::Top) => {
            " ↑↓/jk select  ←→/hl tabs  Enter open  : command  q quit"
        }
        (TextMode::None, Depth::TrackList) => " ↑↓/jk select  Enter play  Esc back  : command",
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: TextMode, depth: Depth) {
    let (label, color) = mode_label(mode, depth);
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", label),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(key_hints(mode, depth), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
