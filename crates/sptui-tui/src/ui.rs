//! Rendering. Reads [`RootState`]; the only mutation is scroll-window
//! bookkeeping for the visible lists.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};
use sptui_proto::catalog::CatalogKind;

use crate::navigation::{Depth, TextMode};
use crate::state::RootState;
use crate::theme::{
    style_default, style_error, style_muted, style_secondary, style_selected, style_tab_active,
    C_ACCENT, C_BADGE_PENDING, C_PAUSED, C_PLAYING, C_SEPARATOR,
};
use crate::ticker::TITLE_WIDTH;
use crate::widgets::pane_chrome::{pane_chrome, Badge};
use crate::widgets::progress_bar::draw_progress;
use crate::widgets::status_bar::draw_keys_bar;

const NOW_PLAYING_H: u16 = 4;

pub fn draw(frame: &mut Frame, state: &mut RootState) {
    let area = frame.area();
    if !state.is_authorized() {
        draw_login(frame, area, state);
        return;
    }

    // ── Layout: tabs | body | now playing | text line | keys ─────────────────
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(NOW_PLAYING_H),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    draw_tabs(frame, rows[0], state);
    match state.depth() {
        Depth::Top => draw_collection(frame, rows[1], state),
        Depth::TrackList => draw_tracklist(frame, rows[1], state),
    }
    draw_now_playing(frame, rows[2], state);
    draw_text_line(frame, rows[3], state);
    draw_keys_bar(frame, rows[4], state.text_mode(), state.depth());
}

fn draw_login(frame: &mut Frame, area: Rect, state: &RootState) {
    let mut lines = vec![
        Line::from(Span::styled("sptui", style_tab_active())),
        Line::from(""),
    ];
    match (state.auth_error(), state.login_url()) {
        (Some(error), _) => {
            lines.push(Line::from(Span::styled(
                format!("Login failed: {}", error),
                style_error(),
            )));
        }
        (None, Some(url)) => {
            lines.push(Line::from(Span::styled(
                "Authorize in your browser. If it did not open, visit:",
                style_default(),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(url.to_string(), style_secondary())));
        }
        (None, None) => {
            lines.push(Line::from(Span::styled("Signing in…", style_default())));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("q quit", style_muted())));

    let block = pane_chrome("login", true, None);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn tab_title(kind: CatalogKind) -> &'static str {
    match kind {
        CatalogKind::Playlist => "Playlists",
        CatalogKind::Album => "Albums",
        CatalogKind::Podcast => "Podcasts",
    }
}

fn draw_tabs(frame: &mut Frame, area: Rect, state: &RootState) {
    let titles: Vec<Line> = CatalogKind::ALL
        .iter()
        .map(|&kind| {
            let tab = state.tab(kind);
            let count = if tab.is_loaded() {
                format!(" {}/{}", tab.len(), tab.total())
            } else {
                String::new()
            };
            Line::from(format!("{}{}", tab_title(kind), count))
        })
        .collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(C_SEPARATOR)),
        )
        .select(state.active_tab().index())
        .style(style_secondary())
        .highlight_style(style_tab_active());
    frame.render_widget(tabs, area);
}

fn draw_collection(frame: &mut Frame, area: Rect, state: &mut RootState) {
    let kind = state.active_tab();
    let tab = state.tab_mut(kind);
    let badge = tab.is_fetching().then_some(Badge {
        text: "LOADING",
        color: C_BADGE_PENDING,
    });
    let block = pane_chrome(tab_title(kind), true, badge);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if !tab.is_loaded() {
        frame.render_widget(Paragraph::new(Span::styled("  Loading…", style_muted())), inner);
        return;
    }
    if tab.len() == 0 {
        frame.render_widget(Paragraph::new(Span::styled("  nothing saved", style_muted())), inner);
        return;
    }

    let (rows, selected) = tab.visible_rows(inner.height as usize);
    frame.render_widget(list_of(rows, selected), inner);
}

fn draw_tracklist(frame: &mut Frame, area: Rect, state: &mut RootState) {
    let Some(selection) = state.nav_mut().selection_mut() else {
        return;
    };
    let title = selection.title();
    let loading = selection.is_loading();
    let badge = loading.then_some(Badge {
        text: "LOADING",
        color: C_BADGE_PENDING,
    });
    let block = pane_chrome(&title, true, badge);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if loading {
        frame.render_widget(Paragraph::new(Span::styled("  Loading…", style_muted())), inner);
        return;
    }

    let height = inner.height as usize;
    let tracks = selection.tracks();
    tracks.ensure_visible(height);
    let cursor = tracks.selected;
    let visible = tracks.visible_items(height);
    let selected = visible.iter().position(|(i, _)| *i == cursor);
    let rows = visible.into_iter().map(|(_, t)| t.name.clone()).collect();
    frame.render_widget(list_of(rows, selected), inner);
}

fn list_of(rows: Vec<String>, selected: Option<usize>) -> List<'static> {
    let items: Vec<ListItem> = rows
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            if Some(i) == selected {
                ListItem::new(Line::from(Span::styled(format!("▸ {}", name), style_selected())))
            } else {
                ListItem::new(Line::from(Span::styled(format!("  {}", name), style_default())))
            }
        })
        .collect();
    List::new(items)
}

fn draw_now_playing(frame: &mut Frame, area: Rect, state: &RootState) {
    let ticker = state.ticker();
    let block = pane_chrome("now playing", false, None);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(playback) = ticker.playback() else {
        frame.render_widget(
            Paragraph::new(Span::styled("  nothing playing", style_muted())),
            inner,
        );
        return;
    };

    let (icon, color) = if playback.is_playing {
        ("▶", C_PLAYING)
    } else {
        ("⏸", C_PAUSED)
    };
    let title = ticker.title_view().unwrap_or_default();
    let title_line = Line::from(vec![
        Span::styled(format!(" {} ", icon), Style::default().fg(color)),
        Span::styled(title, Style::default().fg(C_ACCENT)),
    ]);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);
    frame.render_widget(Paragraph::new(title_line), parts[0]);

    let bar_area = Rect {
        x: parts[1].x + 1,
        width: parts[1].width.saturating_sub(2).min(TITLE_WIDTH as u16 + 16),
        ..parts[1]
    };
    draw_progress(
        frame,
        bar_area,
        playback.percent_complete(),
        playback.elapsed_ms,
        playback.duration_ms(),
        playback.is_playing,
    );
}

fn draw_text_line(frame: &mut Frame, area: Rect, state: &RootState) {
    match state.text_mode() {
        TextMode::Input => state.input().draw(frame, area),
        TextMode::Error => {
            let text = format!("E: {}", state.nav().error().unwrap_or_default());
            frame.render_widget(Paragraph::new(Span::styled(text, style_error())), area);
        }
        TextMode::None => {}
    }
}
