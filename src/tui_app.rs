//! The interactive terminal application: Search, Watchlist and Session
//! views over one event loop, driven by 100 ms polls so the debounce and
//! health timers make progress while the user is idle.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::execute;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState, Tabs, Wrap};
use ratatui::{Frame, Terminal};
use std::io;
use std::time::Duration;
use tracing::info;

use crate::api_client::ApiClient;
use crate::config::Config;
use crate::health::{HealthMonitor, HealthStatus};
use crate::logging::LogRingBuffer;
use crate::models::{SearchPatch, SearchParams, WatchKind};
use crate::notes::Notes;
use crate::search_controller::{split_query_input, SearchController, SearchState};
use crate::session::{AuthState, SessionManager};
use crate::table_display::summary_line;
use crate::watchlist::WatchlistStore;
use crate::widgets::{SearchInput, SearchInputAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Search,
    Watchlist,
    Session,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Search => View::Watchlist,
            View::Watchlist => View::Session,
            View::Session => View::Search,
        }
    }

    fn index(&self) -> usize {
        match self {
            View::Search => 0,
            View::Watchlist => 1,
            View::Session => 2,
        }
    }
}

pub struct TuiApp {
    config: Config,
    client: ApiClient,
    controller: SearchController,
    watchlist: WatchlistStore,
    session: SessionManager,
    health: HealthMonitor,
    notes: Notes,
    logs: LogRingBuffer,

    view: View,
    query_input: SearchInput,
    filter_input: SearchInput,
    filter_active: bool,
    note_input: SearchInput,
    note_active: bool,
    result_selected: usize,
    watch_selected: usize,
    status_message: Option<String>,
    clipboard: Option<arboard::Clipboard>,
    should_quit: bool,
}

impl TuiApp {
    pub fn new(
        config: Config,
        client: ApiClient,
        watchlist: WatchlistStore,
        session: SessionManager,
        notes: Notes,
        logs: LogRingBuffer,
    ) -> Self {
        let params = SearchParams {
            platform: config.platform(),
            sort: config.sort(),
            limit: config.behavior.page_size,
            ..Default::default()
        };
        let controller = SearchController::new(
            config.behavior.debounce_ms,
            config.behavior.cache_ttl_secs,
        )
        .with_params(params);
        let health = HealthMonitor::new(config.behavior.health_poll_secs);

        Self {
            config,
            client,
            controller,
            watchlist,
            session,
            health,
            notes,
            logs,
            view: View::Search,
            query_input: SearchInput::new("Search posts, #hashtags"),
            filter_input: SearchInput::new("Filter"),
            filter_active: false,
            note_input: SearchInput::new("New note"),
            note_active: false,
            result_selected: 0,
            watch_selected: 0,
            status_message: None,
            clipboard: None,
            should_quit: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        while !self.should_quit {
            self.controller.tick(&self.client);
            self.health.tick(&self.client);
            self.clamp_selections();

            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }
        // A pending debounce must not fire into a dismantled UI.
        self.controller.reset();
        Ok(())
    }

    fn clamp_selections(&mut self) {
        let results = self.result_count();
        if results == 0 {
            self.result_selected = 0;
        } else if self.result_selected >= results {
            self.result_selected = results - 1;
        }
        let watched = self.watch_matches().len();
        if watched == 0 {
            self.watch_selected = 0;
        } else if self.watch_selected >= watched {
            self.watch_selected = watched - 1;
        }
    }

    fn result_count(&self) -> usize {
        match self.controller.state() {
            SearchState::Results(resp) => resp.hits.len(),
            _ => 0,
        }
    }

    fn watch_matches(&self) -> Vec<crate::watchlist::WatchMatch> {
        self.watchlist.filter(self.filter_input.value())
    }

    // --- key handling ---

    fn handle_key(&mut self, key: KeyEvent) {
        self.status_message = None;

        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            self.should_quit = true;
            return;
        }
        if key.code == KeyCode::Tab && !self.note_active && !self.filter_active {
            self.view = self.view.next();
            return;
        }

        match self.view {
            View::Search => self.handle_search_key(key),
            View::Watchlist => self.handle_watchlist_key(key),
            View::Session => self.handle_session_key(key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match self.query_input.handle_key(key) {
            SearchInputAction::Edited(value) => {
                self.controller.patch(split_query_input(&value));
            }
            SearchInputAction::Submit(value) => {
                self.controller.patch(split_query_input(&value));
                self.controller.submit();
            }
            SearchInputAction::Consumed => {}
            SearchInputAction::PassThrough => match key.code {
                KeyCode::Up => {
                    self.result_selected = self.result_selected.saturating_sub(1);
                }
                KeyCode::Down => {
                    if self.result_selected + 1 < self.result_count() {
                        self.result_selected += 1;
                    }
                }
                KeyCode::F(2) => {
                    let platform = self.controller.params().platform.next();
                    self.controller.patch(SearchPatch {
                        platform: Some(platform),
                        ..Default::default()
                    });
                }
                KeyCode::F(3) => {
                    let sort = self.controller.params().sort.next();
                    self.controller.patch(SearchPatch {
                        sort: Some(sort),
                        ..Default::default()
                    });
                }
                KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.watch_selected_hit();
                }
                KeyCode::Char('y') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.yank_selected_permalink();
                }
                _ => {}
            },
        }
    }

    fn handle_watchlist_key(&mut self, key: KeyEvent) {
        if self.filter_active {
            match self.filter_input.handle_key(key) {
                SearchInputAction::Submit(_) => self.filter_active = false,
                SearchInputAction::PassThrough if key.code == KeyCode::Esc => {
                    self.filter_active = false;
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('/') => self.filter_active = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.watch_selected = self.watch_selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.watch_selected + 1 < self.watch_matches().len() {
                    self.watch_selected += 1;
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                // Remove through the match list so a filtered view still
                // deletes the right underlying entry.
                let matches = self.watch_matches();
                if let Some(m) = matches.get(self.watch_selected) {
                    match self.watchlist.remove(m.index) {
                        Ok(Some(removed)) => {
                            self.status_message = Some(format!("removed {}", removed));
                        }
                        Ok(None) => {}
                        Err(e) => {
                            self.status_message = Some(format!("could not save watchlist: {}", e));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_session_key(&mut self, key: KeyEvent) {
        if self.note_active {
            match self.note_input.handle_key(key) {
                SearchInputAction::Submit(text) => {
                    self.note_active = false;
                    if !text.trim().is_empty() {
                        if let Err(e) = self.notes.append_line(text.trim()) {
                            self.status_message = Some(format!("could not save note: {}", e));
                        }
                    }
                    self.note_input = SearchInput::new("New note");
                }
                SearchInputAction::PassThrough if key.code == KeyCode::Esc => {
                    self.note_active = false;
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('o') => {
                self.session.sign_out(&mut self.client);
                self.status_message = Some("signed out".to_string());
            }
            KeyCode::Char('r') => {
                self.session.bootstrap(&mut self.client, None);
                self.status_message = Some("session refreshed".to_string());
            }
            KeyCode::Char('n') => self.note_active = true,
            _ => {}
        }
    }

    fn watch_selected_hit(&mut self) {
        let value = match self.controller.state() {
            SearchState::Results(resp) => resp
                .hits
                .get(self.result_selected)
                .map(|hit| hit.watch_value().to_string()),
            _ => None,
        };
        if let Some(value) = value {
            match self.watchlist.add(WatchKind::User, &value) {
                Ok(item) => {
                    info!(target: "watchlist", "now watching {}", item);
                    self.status_message = Some(format!("watching @{}", value));
                }
                Err(e) => {
                    self.status_message = Some(format!("could not save watchlist: {}", e));
                }
            }
        }
    }

    fn yank_selected_permalink(&mut self) {
        let permalink = match self.controller.state() {
            SearchState::Results(resp) => resp
                .hits
                .get(self.result_selected)
                .map(|hit| hit.permalink.clone()),
            _ => None,
        };
        let Some(permalink) = permalink else { return };

        if self.clipboard.is_none() {
            self.clipboard = arboard::Clipboard::new().ok();
        }
        match self.clipboard.as_mut() {
            Some(clipboard) => match clipboard.set_text(permalink.clone()) {
                Ok(()) => self.status_message = Some(format!("yanked {}", permalink)),
                Err(e) => self.status_message = Some(format!("clipboard error: {}", e)),
            },
            None => {
                self.status_message = Some("clipboard unavailable".to_string());
            }
        }
    }

    // --- rendering ---

    fn draw(&mut self, frame: &mut Frame) {
        let log_tail_height = if self.config.display.show_log_tail { 2 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(log_tail_height),
            ])
            .split(frame.area());

        let tabs = Tabs::new(vec!["Search", "Watchlist", "Session"])
            .select(self.view.index())
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, chunks[0]);

        match self.view {
            View::Search => self.draw_search(frame, chunks[1]),
            View::Watchlist => self.draw_watchlist(frame, chunks[1]),
            View::Session => self.draw_session(frame, chunks[1]),
        }

        self.draw_status_bar(frame, chunks[2]);
        if log_tail_height > 0 {
            self.draw_log_tail(frame, chunks[3]);
        }
    }

    fn draw_search(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(3),
            ])
            .split(area);

        self.query_input
            .render(frame, chunks[0], self.controller.is_settling());

        let params = self.controller.params();
        let stats = self.controller.cache_stats();
        let params_line = Line::from(vec![
            Span::styled("platform ", Style::default().fg(Color::DarkGray)),
            Span::raw(params.platform.as_str()),
            Span::styled("  sort ", Style::default().fg(Color::DarkGray)),
            Span::raw(params.sort.label()),
            Span::styled("  limit ", Style::default().fg(Color::DarkGray)),
            Span::raw(params.limit.to_string()),
            Span::styled("  cache ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{} entries", stats.entries)),
            Span::styled("  [F2] platform  [F3] sort", Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(params_line), chunks[1]);

        match self.controller.state().clone() {
            SearchState::Idle => self.draw_notice(
                frame,
                chunks[2],
                "Start a search",
                "Type posts, #hashtags or @creators, then press Enter.",
                Color::DarkGray,
            ),
            SearchState::Loading => self.draw_skeleton(frame, chunks[2]),
            SearchState::RateLimited => self.draw_notice(
                frame,
                chunks[2],
                "Rate limit reached",
                "The backend is throttling searches. Wait a moment and try again.",
                Color::Red,
            ),
            SearchState::Failed(message) => {
                self.draw_notice(frame, chunks[2], "Search failed", &message, Color::Red)
            }
            SearchState::NoResults => self.draw_notice(
                frame,
                chunks[2],
                "No results",
                "Nothing matched this search. Loosen the filters and retry.",
                Color::Yellow,
            ),
            SearchState::Results(response) => {
                let header = Row::new(
                    ["author", "posted", "likes", "trend", "caption"]
                        .iter()
                        .map(|h| Cell::from(*h)),
                )
                .style(Style::default().add_modifier(Modifier::BOLD));

                let rows: Vec<Row> = response
                    .hits
                    .iter()
                    .map(|hit| {
                        Row::new(vec![
                            hit.username.clone().unwrap_or_else(|| "-".into()),
                            hit.posted_at.chars().take(10).collect(),
                            hit.like_count.map(|n| n.to_string()).unwrap_or_else(|| "-".into()),
                            hit.score_trend
                                .map(|s| format!("{:.1}", s))
                                .unwrap_or_else(|| "-".into()),
                            hit.caption
                                .as_deref()
                                .unwrap_or("")
                                .split_whitespace()
                                .collect::<Vec<_>>()
                                .join(" "),
                        ])
                    })
                    .collect();

                let table = Table::new(
                    rows,
                    [
                        Constraint::Length(16),
                        Constraint::Length(10),
                        Constraint::Length(8),
                        Constraint::Length(6),
                        Constraint::Min(20),
                    ],
                )
                .header(header)
                .row_highlight_style(Style::default().bg(Color::DarkGray))
                .block(
                    Block::default()
                        .borders(Borders::TOP)
                        .title(format!(
                            " {}  [Ctrl+W] watch  [Ctrl+Y] yank ",
                            summary_line(&response)
                        )),
                );

                let mut state = TableState::default();
                state.select(Some(self.result_selected));
                frame.render_stateful_widget(table, chunks[2], &mut state);
            }
        }
    }

    fn draw_skeleton(&self, frame: &mut Frame, area: Rect) {
        let rows = self.config.display.skeleton_rows.min(area.height as usize);
        let lines: Vec<Line> = (0..rows)
            .map(|_| {
                Line::from(Span::styled(
                    "░░░░░░░░░░░░  ░░░░░░░░  ░░░░  ░░░░░░░░░░░░░░░░░░░░░░░░",
                    Style::default().fg(Color::DarkGray),
                ))
            })
            .collect();
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::TOP).title(" searching... ")),
            area,
        );
    }

    fn draw_notice(&self, frame: &mut Frame, area: Rect, title: &str, body: &str, color: Color) {
        let text = vec![
            Line::from(Span::styled(
                title.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(body.to_string()),
        ];
        frame.render_widget(
            Paragraph::new(text)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::TOP)),
            area,
        );
    }

    fn draw_watchlist(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        self.filter_input.render(frame, chunks[0], false);

        let matches = self.watch_matches();
        let items: Vec<ListItem> = matches
            .iter()
            .map(|m| {
                ListItem::new(format!(
                    "{}  (since {})",
                    m.item,
                    m.item.created_at.format("%Y-%m-%d")
                ))
            })
            .collect();

        let title = format!(
            " {} watched  [/] filter  [d] remove ",
            self.watchlist.len()
        );
        let list = List::new(items)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .block(Block::default().borders(Borders::TOP).title(title));

        let mut state = ListState::default();
        state.select(if matches.is_empty() {
            None
        } else {
            Some(self.watch_selected)
        });
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_session(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);

        let mut lines = Vec::new();
        match self.session.state() {
            AuthState::Unauthenticated { error } => {
                lines.push(Line::from(Span::styled(
                    "Not signed in",
                    Style::default().fg(Color::Yellow),
                )));
                if let Some(error) = error {
                    lines.push(Line::from(Span::styled(
                        error.clone(),
                        Style::default().fg(Color::Red),
                    )));
                }
                lines.push(Line::from("Sign in with: trends-cli --login you@example.com"));
            }
            AuthState::Resolving => {
                lines.push(Line::from("Resolving session..."));
            }
            AuthState::Authenticated(session) => {
                let user = &session.user;
                lines.push(Line::from(Span::styled(
                    format!("{} <{}>", user.name.as_deref().unwrap_or("(no name)"), user.email),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(format!(
                    "role {}  active {}  member since {}",
                    user.role,
                    user.is_active,
                    user.created_at.format("%Y-%m-%d")
                )));
                lines.push(Line::from("[o] sign out  [r] refresh  [n] add note"));
            }
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Notes",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for line in self.notes.text().lines().rev().take(8).collect::<Vec<_>>().into_iter().rev() {
            lines.push(Line::from(format!("  {}", line)));
        }

        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::TOP).title(" session ")),
            chunks[0],
        );

        if self.note_active {
            self.note_input.render(frame, chunks[1], false);
        }
    }

    fn draw_status_bar(&self, frame: &mut Frame, area: Rect) {
        let health_color = match self.health.status() {
            HealthStatus::Healthy => Color::Green,
            HealthStatus::Down => Color::Red,
            HealthStatus::Checking => Color::DarkGray,
        };
        let auth = match self.session.state() {
            AuthState::Authenticated(session) => session.user.email.clone(),
            AuthState::Resolving => "resolving...".to_string(),
            AuthState::Unauthenticated { .. } => "anonymous".to_string(),
        };

        let mut spans = vec![
            Span::styled(
                format!(" {} ", self.health.status().label()),
                Style::default().fg(Color::Black).bg(health_color),
            ),
            Span::raw(" "),
            Span::raw(auth),
        ];
        if let Some(message) = &self.status_message {
            spans.push(Span::raw("  |  "));
            spans.push(Span::styled(
                message.clone(),
                Style::default().fg(Color::Cyan),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_log_tail(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .logs
            .recent(area.height as usize)
            .into_iter()
            .map(|entry| {
                Line::from(Span::styled(
                    entry.format_for_display(),
                    Style::default().fg(Color::DarkGray),
                ))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }
}
