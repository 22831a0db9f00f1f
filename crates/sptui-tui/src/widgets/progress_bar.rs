//! Smooth Unicode progress bar for the now-playing pane.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MUTED, C_PAUSED, C_PLAYING, C_SECONDARY};

const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// Render `percent` (0.0..=1.0) as a bar flanked by elapsed/total labels.
pub fn draw_progress(
    frame: &mut Frame,
    area: Rect,
    percent: f64,
    elapsed_ms: u64,
    duration_ms: u64,
    playing: bool,
) {
    if area.width < 4 || area.height == 0 {
        return;
    }

    let left_label = fmt_ms(elapsed_ms);
    let right_label = fmt_ms(duration_ms);
    let label_w = (left_label.len() + right_label.len() + 2) as u16;
    let bar_w = area.width.saturating_sub(label_w).max(4) as usize;

    let bar_color = if playing { C_PLAYING } else { C_PAUSED };
    let spans = vec![
        Span::styled(format!("{} ", left_label), Style::default().fg(C_SECONDARY)),
        Span::styled(bar_cells(percent, bar_w), Style::default().fg(bar_color)),
        Span::styled(format!(" {}", right_label), Style::default().fg(C_MUTED)),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Eighth-block fill of `width` cells.
fn bar_cells(percent: f64, width: usize) -> String {
    let eighths = (percent.clamp(0.0, 1.0) * width as f64 * 8.0) as usize;
    let full_blocks = eighths / 8;
    let partial = eighths % 8;

    let mut bar = String::with_capacity(width * 3);
    for _ in 0..full_blocks.min(width) {
        bar.push('█');
    }
    if full_blocks < width {
        bar.push(BLOCKS[partial]);
        for _ in (full_blocks + 1)..width {
            bar.push(' ');
        }
    }
    bar
}

fn fmt_ms(ms: u64) -> String {
    let s = ms / 1000;
    let h = s / 3600;
    let m = (s % 3600) / 60;
    let s = s % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_is_always_width_cells() {
        for p in [0.0, 0.33, 0.5, 0.999, 1.0, 1.5] {
            assert_eq!(bar_cells(p, 20).chars().count(), 20);
        }
        assert_eq!(bar_cells(1.0, 4), "████");
        assert_eq!(bar_cells(0.5, 4), "██  ");
    }

    #[test]
    fn time_labels() {
        assert_eq!(fmt_ms(0), "0:00");
        assert_eq!(fmt_ms(61_500), "1:01");
        assert_eq!(fmt_ms(3_725_000), "1:02:05");
    }
}
