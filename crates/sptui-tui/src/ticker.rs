//! Playback progress and the scrolling title.
//!
//! Every "now playing" snapshot mints a new [`Generation`]. Tick timers are
//! never cancelled: each carries the generation it was scheduled under and a
//! tick whose generation is not the current one is ignored. Replacing the
//! snapshot is therefore enough to silence every timer scheduled before it.

use std::time::Duration;

use sptui_proto::catalog::{NowPlaying, PlayingItem};
use tracing::debug;
use unicode_width::UnicodeWidthChar;

use crate::command::Command;

/// Interval between progress ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
/// Marquee step while the title is moving.
pub const MARQUEE_STEP: Duration = Duration::from_millis(100);
/// Marquee hold at the start position (first show and after each wrap).
pub const MARQUEE_PAUSE: Duration = Duration::from_millis(2000);
/// Widest the title column gets in the now-playing pane.
pub const TITLE_WIDTH: usize = 44;
/// Columns of the now-playing pane taken by borders and the play icon.
const TITLE_CHROME: usize = 5;

const MARQUEE_GAP: &str = "    ";

/// Identifies the snapshot a timer was scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Generation(u64);

/// Playback state derived from one snapshot.
#[derive(Debug, Clone)]
pub struct Playback {
    pub item: PlayingItem,
    pub elapsed_ms: u64,
    pub is_playing: bool,
    pub generation: Generation,
}

impl Playback {
    pub fn duration_ms(&self) -> u64 {
        self.item.duration_ms
    }

    pub fn percent_complete(&self) -> f64 {
        (self.elapsed_ms as f64 / self.duration_ms() as f64).min(1.0)
    }

    /// Fraction of the track covered by one progress tick.
    pub fn per_tick_delta(&self) -> f64 {
        TICK_INTERVAL.as_millis() as f64 / self.duration_ms() as f64
    }

    fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms()
    }
}

/// Rotating view of a title that does not fit its column budget.
#[derive(Debug, Clone)]
pub struct TitleMarquee {
    chars: Vec<char>,
    offset: usize,
}

impl TitleMarquee {
    /// `None` when `title` fits in `width` columns and needs no scrolling.
    pub fn for_title(title: &str, width: usize) -> Option<Self> {
        if display_width(title) <= width {
            return None;
        }
        Some(Self {
            chars: title.chars().chain(MARQUEE_GAP.chars()).collect(),
            offset: 0,
        })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Rotate by one character. Returns the delay before the next step.
    pub fn advance(&mut self) -> Duration {
        self.offset = (self.offset + 1) % self.chars.len();
        if self.offset == 0 {
            MARQUEE_PAUSE
        } else {
            MARQUEE_STEP
        }
    }

    /// The rotated text, cut to at most `width` columns.
    pub fn view(&self, width: usize) -> String {
        let mut out = String::new();
        let mut used = 0;
        for &c in self.chars.iter().cycle().skip(self.offset).take(self.chars.len()) {
            let w = c.width().unwrap_or(0);
            if used + w > width {
                break;
            }
            used += w;
            out.push(c);
        }
        out
    }
}

fn display_width(s: &str) -> usize {
    s.chars().map(|c| c.width().unwrap_or(0)).sum()
}

#[derive(Debug)]
pub struct PlaybackTicker {
    current: Option<Playback>,
    marquee: Option<TitleMarquee>,
    /// A marquee tick of the current generation is scheduled.
    marquee_scheduled: bool,
    title_width: usize,
    last_generation: u64,
}

impl Default for PlaybackTicker {
    fn default() -> Self {
        Self {
            current: None,
            marquee: None,
            marquee_scheduled: false,
            title_width: TITLE_WIDTH,
            last_generation: 0,
        }
    }
}

impl PlaybackTicker {
    pub fn playback(&self) -> Option<&Playback> {
        self.current.as_ref()
    }

    pub fn generation(&self) -> Option<Generation> {
        self.current.as_ref().map(|p| p.generation)
    }

    /// Title as it should be shown right now.
    pub fn title_view(&self) -> Option<String> {
        let playback = self.current.as_ref()?;
        Some(match &self.marquee {
            Some(m) => m.view(self.title_width),
            None => playback.item.title(),
        })
    }

    pub fn title_width(&self) -> usize {
        self.title_width
    }

    /// Fit the title to a terminal `cols` wide. Starts the marquee when the
    /// title stops fitting; a title that fits again stops at its next tick.
    pub fn set_terminal_width(&mut self, cols: u16) -> Option<Command> {
        self.title_width = (cols as usize).saturating_sub(TITLE_CHROME).min(TITLE_WIDTH);
        let playback = self.current.as_ref()?;
        let generation = playback.generation;
        match TitleMarquee::for_title(&playback.item.title(), self.title_width) {
            None => {
                self.marquee = None;
                None
            }
            // The scheduled tick keeps driving the rotation.
            Some(_) if self.marquee.is_some() => None,
            Some(marquee) => {
                self.marquee = Some(marquee);
                if self.marquee_scheduled {
                    return None;
                }
                self.marquee_scheduled = true;
                Some(Command::MarqueeTick {
                    generation,
                    after: MARQUEE_PAUSE,
                })
            }
        }
    }

    fn mint(&mut self) -> Generation {
        self.last_generation += 1;
        Generation(self.last_generation)
    }

    /// Replace playback state with a fresh snapshot and schedule its timers.
    pub fn apply_snapshot(&mut self, snapshot: Option<NowPlaying>) -> Option<Command> {
        let generation = self.mint();
        let playing = snapshot.and_then(|s| {
            let item = s.item?;
            Some((item, s.progress_ms, s.is_playing))
        });

        let Some((item, progress_ms, is_playing)) = playing.filter(|(item, ..)| item.duration_ms > 0)
        else {
            debug!("nothing playing");
            self.current = None;
            self.marquee = None;
            self.marquee_scheduled = false;
            return None;
        };

        self.marquee = TitleMarquee::for_title(&item.title(), self.title_width);
        self.marquee_scheduled = self.marquee.is_some();
        self.current = Some(Playback {
            item,
            elapsed_ms: progress_ms,
            is_playing,
            generation,
        });

        let mut commands = vec![Command::ProgressTick {
            generation,
            after: TICK_INTERVAL,
        }];
        if self.marquee.is_some() {
            commands.push(Command::MarqueeTick {
                generation,
                after: MARQUEE_PAUSE,
            });
        }
        Some(Command::batch(commands))
    }

    /// Advance progress by one tick. At the end of the track the snapshot is
    /// re-fetched instead of scheduling another tick.
    pub fn progress_tick(&mut self, generation: Generation) -> Option<Command> {
        let playback = self.current.as_mut().filter(|p| p.generation == generation)?;

        if playback.is_playing {
            let step = TICK_INTERVAL.as_millis() as u64;
            playback.elapsed_ms = (playback.elapsed_ms + step).min(playback.duration_ms());
            if playback.is_finished() {
                debug!("track reached its end, re-fetching now playing");
                return Some(Command::FetchNowPlaying {
                    delay: Duration::ZERO,
                });
            }
        }
        Some(Command::ProgressTick {
            generation,
            after: TICK_INTERVAL,
        })
    }

    pub fn marquee_tick(&mut self, generation: Generation) -> Option<Command> {
        if self.generation() != Some(generation) {
            return None;
        }
        let Some(marquee) = self.marquee.as_mut() else {
            self.marquee_scheduled = false;
            return None;
        };
        let after = marquee.advance();
        Some(Command::MarqueeTick { generation, after })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str, progress_ms: u64, duration_ms: u64, is_playing: bool) -> NowPlaying {
        NowPlaying {
            item: Some(PlayingItem {
                name: name.to_string(),
                uri: "spotify:track:1".to_string(),
                by: None,
                duration_ms,
            }),
            progress_ms,
            is_playing,
        }
    }

    #[test]
    fn snapshot_schedules_first_tick() {
        let mut ticker = PlaybackTicker::default();
        let cmd = ticker.apply_snapshot(Some(snapshot("Song", 0, 200_000, true)));
        let g = ticker.generation().unwrap();
        assert_eq!(
            cmd,
            Some(Command::ProgressTick {
                generation: g,
                after: TICK_INTERVAL
            })
        );
    }

    #[test]
    fn two_hundred_ticks_finish_a_200s_track_exactly_once() {
        let mut ticker = PlaybackTicker::default();
        ticker.apply_snapshot(Some(snapshot("Song", 0, 200_000, true)));
        let g = ticker.generation().unwrap();
        assert_eq!(ticker.playback().unwrap().per_tick_delta(), 0.005);

        let mut refetches = 0;
        for i in 1..=200 {
            match ticker.progress_tick(g) {
                Some(Command::FetchNowPlaying { .. }) => {
                    assert_eq!(i, 200, "re-fetch issued early at tick {}", i);
                    refetches += 1;
                }
                Some(Command::ProgressTick { generation, .. }) => assert_eq!(generation, g),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(refetches, 1);
        assert_eq!(ticker.playback().unwrap().percent_complete(), 1.0);
    }

    #[test]
    fn stale_ticks_change_nothing() {
        let mut ticker = PlaybackTicker::default();
        ticker.apply_snapshot(Some(snapshot("Old", 0, 10_000, true)));
        let old = ticker.generation().unwrap();
        ticker.apply_snapshot(Some(snapshot("New", 5_000, 10_000, true)));

        assert_eq!(ticker.progress_tick(old), None);
        assert_eq!(ticker.marquee_tick(old), None);
        assert_eq!(ticker.playback().unwrap().elapsed_ms, 5_000);
    }

    #[test]
    fn paused_track_keeps_ticking_without_advancing() {
        let mut ticker = PlaybackTicker::default();
        ticker.apply_snapshot(Some(snapshot("Song", 3_000, 10_000, false)));
        let g = ticker.generation().unwrap();
        assert!(matches!(
            ticker.progress_tick(g),
            Some(Command::ProgressTick { .. })
        ));
        assert_eq!(ticker.playback().unwrap().elapsed_ms, 3_000);
    }

    #[test]
    fn nothing_playing_clears_state_and_invalidates_ticks() {
        let mut ticker = PlaybackTicker::default();
        ticker.apply_snapshot(Some(snapshot("Song", 0, 10_000, true)));
        let g = ticker.generation().unwrap();
        assert_eq!(
            ticker.apply_snapshot(Some(NowPlaying {
                item: None,
                progress_ms: 0,
                is_playing: false
            })),
            None
        );
        assert!(ticker.playback().is_none());
        assert_eq!(ticker.progress_tick(g), None);
        assert_eq!(ticker.apply_snapshot(None), None);
    }

    #[test]
    fn long_title_starts_marquee_after_pause() {
        let title = "A".repeat(60);
        let mut ticker = PlaybackTicker::default();
        let cmd = ticker.apply_snapshot(Some(snapshot(&title, 0, 10_000, true)));
        let g = ticker.generation().unwrap();
        let Some(Command::Batch(cmds)) = cmd else {
            panic!("expected batch, got {:?}", cmd);
        };
        assert!(cmds.contains(&Command::MarqueeTick {
            generation: g,
            after: MARQUEE_PAUSE
        }));
        assert_eq!(
            ticker.marquee_tick(g),
            Some(Command::MarqueeTick {
                generation: g,
                after: MARQUEE_STEP
            })
        );
    }

    #[test]
    fn short_title_has_no_marquee() {
        let mut ticker = PlaybackTicker::default();
        ticker.apply_snapshot(Some(snapshot("Short", 0, 10_000, true)));
        let g = ticker.generation().unwrap();
        assert_eq!(ticker.marquee_tick(g), None);
        assert_eq!(ticker.title_view().unwrap(), "Short");
    }

    #[test]
    fn marquee_wraps_with_long_pause() {
        let mut marquee = TitleMarquee::for_title("abcdef", 3).unwrap();
        // "abcdef" + 4 spaces = 10 positions.
        for _ in 0..9 {
            assert_eq!(marquee.advance(), MARQUEE_STEP);
        }
        assert_eq!(marquee.advance(), MARQUEE_PAUSE);
        assert_eq!(marquee.offset(), 0);
    }

    #[test]
    fn marquee_view_rotates() {
        let mut marquee = TitleMarquee::for_title("abcdef", 4).unwrap();
        assert_eq!(marquee.view(4), "abcd");
        marquee.advance();
        marquee.advance();
        marquee.advance();
        assert_eq!(marquee.view(4), "def ");
        for _ in 0..4 {
            marquee.advance();
        }
        assert_eq!(marquee.view(4), "   a");
    }

    #[test]
    fn narrow_terminal_starts_marquee_once() {
        let mut ticker = PlaybackTicker::default();
        ticker.apply_snapshot(Some(snapshot(&"B".repeat(30), 0, 10_000, true)));
        let g = ticker.generation().unwrap();
        assert_eq!(ticker.marquee_tick(g), None, "30 columns fit in 44");

        assert_eq!(
            ticker.set_terminal_width(25),
            Some(Command::MarqueeTick {
                generation: g,
                after: MARQUEE_PAUSE
            })
        );
        assert_eq!(ticker.title_width(), 20);
        assert_eq!(ticker.set_terminal_width(24), None, "already scheduled");
        assert_eq!(ticker.title_view().unwrap().chars().count(), 19);
    }

    #[test]
    fn widening_stops_marquee_at_next_tick() {
        let mut ticker = PlaybackTicker::default();
        ticker.set_terminal_width(25);
        ticker.apply_snapshot(Some(snapshot(&"B".repeat(30), 0, 10_000, true)));
        let g = ticker.generation().unwrap();

        assert_eq!(ticker.set_terminal_width(120), None);
        assert_eq!(ticker.title_width(), TITLE_WIDTH);
        assert_eq!(ticker.marquee_tick(g), None);
        assert_eq!(ticker.title_view().unwrap(), "B".repeat(30));

        // The chain ended, so narrowing again restarts it.
        assert!(matches!(
            ticker.set_terminal_width(25),
            Some(Command::MarqueeTick { .. })
        ));
    }
}
