//! App: terminal setup, the event loop and teardown.
//!
//! Architecture:
//! - `RootState` owns all application state; `update` is the only mutator.
//! - A `tokio::mpsc` channel carries `Message`s in from the keyboard reader
//!   and from command tasks.
//! - The loop draws a frame, awaits the next message, applies it and runs the
//!   returned command through the `Dispatcher`.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::command::{Command, Dispatcher, LoginContext};
use crate::message::Message;
use crate::state::RootState;
use crate::ui;

const CHANNEL_CAPACITY: usize = 1024;
/// Messages applied per wake-up before the next redraw.
const MAX_DRAIN: usize = 256;
/// How often the terminal reader checks whether the app has quit.
const READER_POLL: Duration = Duration::from_millis(100);

pub struct App {
    state: RootState,
    login: LoginContext,
}

impl App {
    pub fn new(login: LoginContext) -> Self {
        Self {
            state: RootState::new(),
            login,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let stop = Arc::new(AtomicBool::new(false));
        let result = self.event_loop(&mut terminal, stop.clone()).await;
        stop.store(true, Ordering::Relaxed);

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        stop: Arc<AtomicBool>,
    ) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Message>(CHANNEL_CAPACITY);
        let dispatcher = Dispatcher::new(tx.clone(), self.login.clone());

        if let Ok(size) = terminal.size() {
            self.state.update(Message::Resize(size.width, size.height));
        }

        // ── Background task: keyboard/resize events ───────────────────────────
        // Polls with a timeout so the task sees `stop` without waiting for
        // another terminal event.
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            match event::poll(READER_POLL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(_) => break,
            }
            let message = match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => Message::Key(key),
                Ok(Event::Resize(w, h)) => Message::Resize(w, h),
                Ok(_) => continue,
                Err(_) => break,
            };
            if event_tx.blocking_send(message).is_err() {
                break;
            }
        });
        drop(tx);

        if dispatcher.run(self.state.init(), self.state.client()) {
            return Ok(());
        }

        // ── Main loop ─────────────────────────────────────────────────────────
        loop {
            terminal.draw(|f| ui::draw(f, &mut self.state))?;

            let Some(msg) = rx.recv().await else {
                info!("message channel closed");
                break;
            };
            if self.apply(&dispatcher, msg) {
                break;
            }

            let mut drained = 0usize;
            let mut quit = false;
            while drained < MAX_DRAIN {
                let Ok(next) = rx.try_recv() else {
                    break;
                };
                drained += 1;
                if self.apply(&dispatcher, next) {
                    quit = true;
                    break;
                }
            }
            if quit {
                break;
            }
        }

        info!("quitting");
        Ok(())
    }

    /// Apply one message and start its command. Returns true on quit.
    fn apply(&mut self, dispatcher: &Dispatcher, msg: Message) -> bool {
        match self.state.update(msg) {
            Some(Command::Quit) => true,
            Some(command) => dispatcher.run(command, self.state.client()),
            None => false,
        }
    }
}
