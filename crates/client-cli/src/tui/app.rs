//! Main TUI application: event loop and key handling

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::mpsc;

use crate::events::AppEvent;
use crate::shell::{self, Effect, Outcome, Overlay, Services, Shell};

use super::views;

const STORAGE_POLL: Duration = Duration::from_secs(1);

/// Which catalog list has the cursor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    Movies,
    Sessions,
}

/// Main TUI application state
pub struct App {
    pub(super) shell: Shell,
    services: Services,
    runtime: Handle,
    /// Application events published by any component
    events: broadcast::Receiver<AppEvent>,
    /// Results of background work
    outcome_tx: mpsc::UnboundedSender<Outcome>,
    outcome_rx: mpsc::UnboundedReceiver<Outcome>,
    pub(super) focus: Focus,
    pub(super) movie_idx: usize,
    pub(super) session_idx: usize,
    last_storage_poll: Instant,
    should_quit: bool,
}

impl App {
    /// Must be created inside a tokio runtime
    pub fn new(services: Services) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let events = services.api.events().subscribe();
        Self {
            shell: Shell::new(services.settings.clone()),
            services,
            runtime: Handle::current(),
            events,
            outcome_tx,
            outcome_rx,
            focus: Focus::Sessions,
            movie_idx: 0,
            session_idx: 0,
            last_storage_poll: Instant::now(),
            should_quit: false,
        }
    }

    /// Run the TUI main loop
    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let effects = self.shell.start();
        self.dispatch(effects);

        let result = self.event_loop(&mut terminal);

        // Restore terminal even if the loop failed
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        while !self.should_quit {
            self.process_pending();

            terminal.draw(|f| views::draw(self, f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }
        }
        Ok(())
    }

    /// Run effects on background tasks; results come back over the channel
    fn dispatch(&self, effects: Vec<Effect>) {
        for effect in effects {
            tracing::debug!("dispatch {:?}", effect);
            let services = self.services.clone();
            let tx = self.outcome_tx.clone();
            self.runtime.spawn(async move {
                if let Some(outcome) = shell::perform(&services, effect).await {
                    let _ = tx.send(outcome);
                }
            });
        }
    }

    /// Drain events and finished work, watch the credential file, expire the toast
    fn process_pending(&mut self) {
        let now = Instant::now();

        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    let effects = self.shell.apply_event(event, now);
                    self.dispatch(effects);
                }
                Err(TryRecvError::Lagged(n)) => {
                    tracing::warn!("Event bus lagged, {} events dropped", n);
                }
                Err(_) => break,
            }
        }

        while let Ok(outcome) = self.outcome_rx.try_recv() {
            let effects = self.shell.apply_outcome(outcome);
            self.dispatch(effects);
        }

        if now.duration_since(self.last_storage_poll) >= STORAGE_POLL {
            self.last_storage_poll = now;
            if self.services.api.store().poll_external_change() {
                self.services.api.events().publish(AppEvent::StorageChanged);
            }
        }

        self.shell.tick(now);
        self.clamp_cursors();
    }

    fn clamp_cursors(&mut self) {
        self.movie_idx = self.movie_idx.min(self.shell.movies.len().saturating_sub(1));
        self.session_idx = self
            .session_idx
            .min(self.shell.visible_sessions().len().saturating_sub(1));
    }

    pub(super) fn server(&self) -> &str {
        self.services.api.base_url()
    }

    fn publish(&self, event: AppEvent) {
        self.services.api.events().publish(event);
    }

    /// Handle keyboard input; the topmost overlay gets the key first
    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.shell.modals.top() {
            Some(Overlay::Login) => self.handle_login_key(code, modifiers),
            Some(Overlay::Booking) => self.handle_booking_key(code),
            Some(Overlay::Admin) => self.handle_admin_key(code),
            Some(Overlay::Profile) => self.handle_profile_key(code),
            None => self.handle_catalog_key(code),
        }
    }

    fn handle_catalog_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Movies => Focus::Sessions,
                    Focus::Sessions => Focus::Movies,
                };
            }
            KeyCode::Up => match self.focus {
                Focus::Movies => self.movie_idx = self.movie_idx.saturating_sub(1),
                Focus::Sessions => self.session_idx = self.session_idx.saturating_sub(1),
            },
            KeyCode::Down => match self.focus {
                Focus::Movies => self.movie_idx += 1,
                Focus::Sessions => self.session_idx += 1,
            },
            KeyCode::Enter if self.focus == Focus::Sessions => {
                if let Some(showtime) = self.shell.visible_sessions().get(self.session_idx).cloned() {
                    let effects = self.shell.request_booking(&showtime);
                    self.dispatch(effects);
                }
            }
            KeyCode::Char('l') => {
                if self.shell.user.is_some() {
                    let effects = self.shell.logout();
                    self.dispatch(effects);
                } else {
                    self.publish(AppEvent::OpenLogin);
                }
            }
            KeyCode::Char('p') => self.publish(AppEvent::OpenProfile),
            KeyCode::Char('a') => self.publish(AppEvent::OpenAdmin),
            KeyCode::Char('r') => {
                let effects = self.shell.refresh();
                self.dispatch(effects);
            }
            KeyCode::Esc => self.shell.dismiss_error(),
            _ => {}
        }
        self.clamp_cursors();
    }

    fn handle_login_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            if code == KeyCode::Char('t') && !self.shell.login.submitting {
                self.shell.login.toggle_mode();
            }
            return;
        }

        match code {
            KeyCode::Esc => {
                self.shell.close_top();
                return;
            }
            KeyCode::Enter => {
                let effects = self.shell.submit_login();
                self.dispatch(effects);
                return;
            }
            _ => {}
        }

        let form = &mut self.shell.login;
        match code {
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Backspace if !form.submitting => form.backspace(),
            KeyCode::Char(c) if !form.submitting => form.input(c),
            _ => {}
        }
    }

    fn handle_booking_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.shell.close_top();
                return;
            }
            KeyCode::Enter => {
                let effects = self.shell.submit_booking();
                self.dispatch(effects);
                return;
            }
            _ => {}
        }

        let Some(draft) = self.shell.booking.as_mut() else {
            return;
        };
        if draft.submitting {
            return;
        }
        match code {
            KeyCode::Up => draft.move_cursor(-1, 0),
            KeyCode::Down => draft.move_cursor(1, 0),
            KeyCode::Left => draft.move_cursor(0, -1),
            KeyCode::Right => draft.move_cursor(0, 1),
            KeyCode::Char('c') => {
                draft.selection.clear();
                draft.error = None;
            }
            KeyCode::Char(' ') => match draft.toggle_at_cursor() {
                Ok(_) => draft.error = None,
                Err(e) => draft.error = Some(e.to_string()),
            },
            _ => {}
        }
    }

    fn handle_admin_key(&mut self, code: KeyCode) {
        let tab = self.shell.admin.tab;
        let effects = match code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.shell.close_top();
                Vec::new()
            }
            KeyCode::Right | KeyCode::Tab => self.shell.select_admin_tab(tab.next()),
            KeyCode::Left | KeyCode::BackTab => self.shell.select_admin_tab(tab.prev()),
            KeyCode::Char('r') => self.shell.select_admin_tab(tab),
            _ => Vec::new(),
        };
        self.dispatch(effects);
    }

    fn handle_profile_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => self.shell.close_top(),
            KeyCode::Char('r') => {
                let effects = self.shell.open_profile();
                self.dispatch(effects);
            }
            _ => {}
        }
    }
}
