use anyhow::Result;
use chrono::Utc;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use rand::thread_rng;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use std::cell::RefCell;
use std::io::stdout;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

use crate::auth::{self, AuthSession, ListenerId, User};
use crate::config::Config;
use crate::error::{AppError, AuthError, ScrapeError, UploadError};
use crate::listings::{self, ListingFilter, ListingView};
use crate::mock;
use crate::models::{JobListing, RemotePreference, Resume, ResumeAnalysis, SearchParams};
use crate::prefs::PreferencesStore;
use crate::resume::{self, ResumeStore};
use crate::scrape::{self, JobBoardScraper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Search,
    Results,
    Resumes,
    Settings,
}

impl Tab {
    const ALL: [Tab; 5] = [Tab::Dashboard, Tab::Search, Tab::Results, Tab::Resumes, Tab::Settings];

    fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Search => "Job Search",
            Tab::Results => "Results",
            Tab::Resumes => "Resumes",
            Tab::Settings => "Settings",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// What a worker thread reports back to the event loop.
pub enum AppEvent {
    SearchFinished(Result<Vec<JobListing>, ScrapeError>),
    UploadProgress(u8),
    UploadFinished(Result<Resume, UploadError>),
    AuthFinished(Result<User, AuthError>),
}

#[derive(Debug, Clone, PartialEq)]
enum PromptKind {
    Role,
    Location,
    ResumePath,
    Blacklist,
    LoginEmail,
    LoginPassword { email: String },
    SignupEmail,
    SignupPassword { email: String },
    SignupConfirm { email: String, password: String },
    PlatformName,
    PlatformUrl { name: String },
    PlatformTopic { name: String, url: String },
}

impl PromptKind {
    fn label(&self) -> &'static str {
        match self {
            PromptKind::Role => "Role",
            PromptKind::Location => "Location (blank for any)",
            PromptKind::ResumePath => "Path to resume PDF",
            PromptKind::Blacklist => "Company to blacklist",
            PromptKind::LoginEmail | PromptKind::SignupEmail => "Email",
            PromptKind::LoginPassword { .. } | PromptKind::SignupPassword { .. } => "Password",
            PromptKind::SignupConfirm { .. } => "Confirm password",
            PromptKind::PlatformName => "Platform name",
            PromptKind::PlatformUrl { .. } => "Platform URL",
            PromptKind::PlatformTopic { .. } => "Topic",
        }
    }

    fn is_secret(&self) -> bool {
        matches!(
            self,
            PromptKind::LoginPassword { .. } | PromptKind::SignupPassword { .. } | PromptKind::SignupConfirm { .. }
        )
    }
}

struct Prompt {
    kind: PromptKind,
    buffer: String,
    error: Option<String>,
}

struct Palette {
    bg: Color,
    fg: Color,
    accent: Color,
    muted: Color,
    highlight: Color,
}

impl Palette {
    fn for_mode(dark: bool) -> Self {
        if dark {
            Palette {
                bg: Color::Rgb(15, 23, 42),
                fg: Color::Rgb(226, 232, 240),
                accent: Color::Rgb(56, 189, 248),
                muted: Color::Rgb(100, 116, 139),
                highlight: Color::Rgb(30, 41, 59),
            }
        } else {
            Palette {
                bg: Color::Rgb(248, 250, 252),
                fg: Color::Rgb(15, 23, 42),
                accent: Color::Rgb(14, 165, 233),
                muted: Color::Rgb(100, 116, 139),
                highlight: Color::Rgb(226, 232, 240),
            }
        }
    }
}

pub struct App {
    config: Config,
    prefs: PreferencesStore,
    session: AuthSession,
    session_listener: ListenerId,
    signed_in_as: Rc<RefCell<Option<String>>>,
    /// Prompt to reopen if the in-flight sign-in or sign-up fails.
    pending_auth: Option<PromptKind>,
    tab: Tab,
    show_sidebar: bool,
    search: SearchParams,
    platform_cursor: usize,
    live: bool,
    searching: bool,
    view: ListingView,
    filter: ListingFilter,
    page: usize,
    selected: usize,
    show_details: bool,
    resumes: ResumeStore,
    resume_cursor: usize,
    analysis: Option<ResumeAnalysis>,
    analysis_for: Option<String>,
    upload_progress: Option<u8>,
    prompt: Option<Prompt>,
    banner: Option<String>,
    status: Option<String>,
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl App {
    pub fn new(config: Config, prefs: PreferencesStore, mut session: AuthSession) -> Self {
        let signed_in_as = Rc::new(RefCell::new(None));
        let sink = signed_in_as.clone();
        let session_listener = session.subscribe(move |user| *sink.borrow_mut() = user.map(|u| u.email.clone()));

        let (tx, rx) = mpsc::channel();
        Self {
            config,
            prefs,
            session,
            session_listener,
            signed_in_as,
            pending_auth: None,
            tab: Tab::Dashboard,
            show_sidebar: true,
            search: SearchParams::default(),
            platform_cursor: 0,
            live: false,
            searching: false,
            view: ListingView::default(),
            filter: ListingFilter::All,
            page: 1,
            selected: 0,
            show_details: false,
            resumes: ResumeStore::new(),
            resume_cursor: 0,
            analysis: None,
            analysis_for: None,
            upload_progress: None,
            prompt: None,
            banner: None,
            status: None,
            tx,
            rx,
        }
    }

    fn visible(&self) -> Vec<JobListing> {
        self.view.filtered(self.filter)
    }

    fn current_page(&self) -> (Vec<JobListing>, usize, usize) {
        let visible = self.visible();
        let page = listings::page(&visible, self.page, self.config.per_page);
        (page.items.to_vec(), page.number, page.total_pages)
    }

    fn selected_listing(&self) -> Option<JobListing> {
        let (items, _, _) = self.current_page();
        items.get(self.selected).cloned()
    }

    fn show_error(&mut self, err: AppError) {
        self.banner = Some(err.user_message());
    }

    /// Keeps the page and row inside the current results after listings disappear.
    fn clamp_selection(&mut self) {
        let (items, number, _) = self.current_page();
        self.page = number;
        self.selected = self.selected.min(items.len().saturating_sub(1));
    }

    /// Kicks off a search on a worker thread. A result that arrives later
    /// replaces whatever is on screen.
    fn start_search(&mut self) {
        if let Err(e) = self.search.validate() {
            self.status = Some(e.to_string());
            return;
        }
        if self.live && !self.search.is_enabled(scrape::PLATFORM) {
            self.status = Some(format!("Live search only covers {}; enable it first", scrape::PLATFORM));
            return;
        }

        self.searching = true;
        self.banner = None;
        let tx = self.tx.clone();
        let params = self.search.clone();
        let config = self.config.clone();
        let live = self.live;
        info!(role = %params.role, live, "search started");

        thread::spawn(move || {
            let result = if live {
                JobBoardScraper::new(&config)
                    .and_then(|s| s.fetch_listings(&params.role, params.location.as_deref()))
            } else {
                thread::sleep(config.simulated_delay);
                Ok(mock::generate_listings(&params, config.mock_count, &mut thread_rng()))
            };
            let _ = tx.send(AppEvent::SearchFinished(result));
        });
    }

    fn start_upload(&mut self, path: PathBuf) {
        self.upload_progress = Some(0);
        self.analysis = None;
        let tx = self.tx.clone();
        let delay = self.config.upload_step_delay;
        thread::spawn(move || {
            let progress_tx = tx.clone();
            let result = resume::upload(&path, delay, |p| {
                let _ = progress_tx.send(AppEvent::UploadProgress(p));
            });
            let _ = tx.send(AppEvent::UploadFinished(result));
        });
    }

    /// Runs the identity call on a worker thread; `retry` is reopened on failure.
    fn start_auth(&mut self, retry: PromptKind, email: String, password: String, sign_up: bool) {
        let provider = self.session.provider();
        let tx = self.tx.clone();
        self.pending_auth = Some(retry);
        self.status = Some(if sign_up { "Creating account..." } else { "Signing in..." }.to_string());
        info!(sign_up, "authentication started");

        thread::spawn(move || {
            let result = if sign_up {
                provider.sign_up(&email, &password)
            } else {
                provider.sign_in(&email, &password)
            };
            let _ = tx.send(AppEvent::AuthFinished(result));
        });
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SearchFinished(Ok(results)) => {
                self.searching = false;
                self.view.replace(results);
                let hidden = self.view.apply_preferences(self.prefs.get());
                self.page = 1;
                self.selected = 0;
                self.tab = Tab::Results;
                self.status = Some(format!(
                    "{} jobs found for \"{}\"{}",
                    self.view.all().len(),
                    self.search.role,
                    if hidden > 0 { format!(" ({} hidden by preferences)", hidden) } else { String::new() }
                ));
            }
            AppEvent::SearchFinished(Err(e)) => {
                self.searching = false;
                self.show_error(e.into());
            }
            AppEvent::UploadProgress(p) => self.upload_progress = Some(p),
            AppEvent::UploadFinished(Ok(resume)) => {
                self.upload_progress = None;
                self.analysis = Some(resume::analyze(&resume, &mut thread_rng()));
                self.analysis_for = Some(self.resumes.add(resume));
                self.resume_cursor = self.resumes.list().len().saturating_sub(1);
                if let Some(latest) = self.resumes.latest() {
                    self.status = Some(format!("Uploaded {}", latest.name));
                }
            }
            AppEvent::UploadFinished(Err(e)) => {
                self.upload_progress = None;
                self.show_error(e.into());
            }
            AppEvent::AuthFinished(Ok(user)) => {
                self.pending_auth = None;
                self.status = Some(format!("Signed in as {}", user.email));
                self.session.establish(user);
            }
            AppEvent::AuthFinished(Err(e)) => {
                self.status = None;
                let message = AppError::from(e).user_message();
                match self.pending_auth.take() {
                    Some(kind) => self.reprompt(kind, message),
                    None => self.banner = Some(message),
                }
            }
        }
    }

    pub fn drain_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Returns false when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return true;
        }

        if self.show_details {
            match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.show_details = false,
                KeyCode::Char('a') => {
                    if let Some(listing) = self.selected_listing() {
                        self.view.mark_applied(&listing.id);
                        self.show_details = false;
                    }
                }
                _ => {}
            }
            return true;
        }

        match key.code {
            KeyCode::Char('q') => return false,
            KeyCode::Esc => {
                self.banner = None;
                self.status = None;
            }
            KeyCode::Tab => self.tab = self.tab.next(),
            KeyCode::BackTab => self.tab = self.tab.prev(),
            KeyCode::Char('b') => self.show_sidebar = !self.show_sidebar,
            KeyCode::Char('d') => match self.prefs.toggle_dark_mode() {
                Ok(_) => {}
                Err(e) => self.show_error(e.into()),
            },
            _ => match self.tab {
                Tab::Dashboard => {}
                Tab::Search => self.handle_search_key(key),
                Tab::Results => self.handle_results_key(key),
                Tab::Resumes => self.handle_resumes_key(key),
                Tab::Settings => self.handle_settings_key(key),
            },
        }
        true
    }

    fn open_prompt(&mut self, kind: PromptKind) {
        let buffer = match kind {
            PromptKind::Role => self.search.role.clone(),
            PromptKind::Location => self.search.location.clone().unwrap_or_default(),
            _ => String::new(),
        };
        self.prompt = Some(Prompt { kind, buffer, error: None });
    }

    /// Reopens a form step with its error shown inside the prompt.
    fn reprompt(&mut self, kind: PromptKind, message: String) {
        self.open_prompt(kind);
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.error = Some(message);
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else { return };
        match key.code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Backspace => {
                prompt.buffer.pop();
            }
            KeyCode::Char(c) => prompt.buffer.push(c),
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    self.submit_prompt(prompt.kind, prompt.buffer);
                }
            }
            _ => {}
        }
    }

    fn submit_prompt(&mut self, kind: PromptKind, value: String) {
        match kind {
            PromptKind::Role => self.search.role = value.trim().to_string(),
            PromptKind::Location => {
                let value = value.trim();
                self.search.location = (!value.is_empty()).then(|| value.to_string());
            }
            PromptKind::ResumePath => {
                let path = PathBuf::from(value.trim());
                self.start_upload(path);
            }
            PromptKind::Blacklist => match self.prefs.blacklist_company(&value) {
                Ok(true) => {
                    let hidden = self.view.apply_preferences(self.prefs.get());
                    self.clamp_selection();
                    self.status = Some(format!("Blacklisted {} ({} listings hidden)", value.trim(), hidden));
                }
                Ok(false) => {}
                Err(e) => self.show_error(e.into()),
            },
            PromptKind::LoginEmail => match auth::validate_email(&value) {
                Ok(()) => self.open_prompt(PromptKind::LoginPassword { email: value.trim().to_string() }),
                Err(e) => self.reprompt(PromptKind::LoginEmail, AppError::from(e).user_message()),
            },
            PromptKind::LoginPassword { email } => match auth::validate_sign_in(&email, &value) {
                Ok(()) => self.start_auth(PromptKind::LoginPassword { email: email.clone() }, email, value, false),
                Err(e) => self.reprompt(PromptKind::LoginPassword { email }, AppError::from(e).user_message()),
            },
            PromptKind::SignupEmail => match auth::validate_email(&value) {
                Ok(()) => self.open_prompt(PromptKind::SignupPassword { email: value.trim().to_string() }),
                Err(e) => self.reprompt(PromptKind::SignupEmail, AppError::from(e).user_message()),
            },
            PromptKind::SignupPassword { email } => self.open_prompt(PromptKind::SignupConfirm { email, password: value }),
            PromptKind::SignupConfirm { email, password } => match auth::validate_sign_up(&email, &password, &value) {
                Ok(()) => self.start_auth(PromptKind::SignupEmail, email, password, true),
                Err(e) => self.reprompt(PromptKind::SignupPassword { email }, AppError::from(e).user_message()),
            },
            PromptKind::PlatformName => self.open_prompt(PromptKind::PlatformUrl { name: value.trim().to_string() }),
            PromptKind::PlatformUrl { name } => self.open_prompt(PromptKind::PlatformTopic {
                name,
                url: value.trim().to_string(),
            }),
            PromptKind::PlatformTopic { name, url } => match self.search.add_platform(&name, &url, &value) {
                Ok(platform) => {
                    let message = format!("Added platform {}", platform.name);
                    self.status = Some(message);
                }
                Err(e) => self.reprompt(PromptKind::PlatformName, e.to_string()),
            },
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') => self.open_prompt(PromptKind::Role),
            KeyCode::Char('o') => self.open_prompt(PromptKind::Location),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.platform_cursor + 1 < self.search.platforms.len() {
                    self.platform_cursor += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.platform_cursor = self.platform_cursor.saturating_sub(1),
            KeyCode::Char(' ') => {
                if let Some(id) = self.search.platforms.get(self.platform_cursor).map(|p| p.id.clone()) {
                    self.search.toggle_platform(&id);
                }
            }
            KeyCode::Char('+') => self.open_prompt(PromptKind::PlatformName),
            KeyCode::Char('-') => {
                let id = self.search.platforms.get(self.platform_cursor).map(|p| p.id.clone());
                if let Some(removed) = id.and_then(|id| self.search.remove_platform(&id)) {
                    self.status = Some(format!("Removed platform {}", removed.name));
                    self.platform_cursor = self.platform_cursor.min(self.search.platforms.len().saturating_sub(1));
                }
            }
            KeyCode::Char('v') => self.live = !self.live,
            KeyCode::Char('s') => match self.prefs.save_search(self.search.clone()) {
                Ok(true) => self.status = Some(format!("Saved search \"{}\"", self.search.label())),
                Ok(false) => self.status = Some("Search already saved".to_string()),
                Err(e) => self.show_error(e.into()),
            },
            KeyCode::Enter => self.start_search(),
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        let (items, number, total) = self.current_page();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < items.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Char('n') if number < total => {
                self.page = number + 1;
                self.selected = 0;
            }
            KeyCode::Char('p') if number > 1 => {
                self.page = number - 1;
                self.selected = 0;
            }
            KeyCode::Char('f') => {
                self.filter = self.filter.next();
                self.page = 1;
                self.selected = 0;
            }
            KeyCode::Char(' ') => {
                if let Some(listing) = items.get(self.selected) {
                    self.view.toggle_saved(&listing.id);
                }
            }
            KeyCode::Char('a') => {
                if let Some(listing) = items.get(self.selected) {
                    self.view.mark_applied(&listing.id);
                }
            }
            KeyCode::Enter if !items.is_empty() => self.show_details = true,
            _ => {}
        }
    }

    fn handle_resumes_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('u') if self.upload_progress.is_none() => self.open_prompt(PromptKind::ResumePath),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.resume_cursor + 1 < self.resumes.list().len() {
                    self.resume_cursor += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.resume_cursor = self.resume_cursor.saturating_sub(1),
            KeyCode::Char('a') => {
                if let Some(resume) = self.resumes.list().get(self.resume_cursor) {
                    self.analysis = Some(resume::analyze(resume, &mut thread_rng()));
                    self.analysis_for = Some(resume.id.clone());
                }
            }
            KeyCode::Char('x') => {
                let id = self.resumes.list().get(self.resume_cursor).map(|r| r.id.clone());
                if let Some(removed) = id.and_then(|id| self.resumes.remove(&id)) {
                    if self.analysis_for.as_deref() == Some(removed.id.as_str()) {
                        self.analysis = None;
                        self.analysis_for = None;
                    }
                    self.resume_cursor = self.resume_cursor.min(self.resumes.list().len().saturating_sub(1));
                }
            }
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        let result = match key.code {
            KeyCode::Char('i') => {
                let current = self.prefs.get().ai_settings.clone();
                self.prefs.set_ai_settings(current.provider.next(), current.api_key)
            }
            KeyCode::Char('m') => {
                let next = match self.prefs.get().application_preferences.remote_preference {
                    RemotePreference::Any => RemotePreference::Remote,
                    RemotePreference::Remote => RemotePreference::Hybrid,
                    RemotePreference::Hybrid => RemotePreference::Any,
                };
                let result = self.prefs.set_remote_preference(next);
                if result.is_ok() {
                    self.view.apply_preferences(self.prefs.get());
                    self.clamp_selection();
                }
                result
            }
            KeyCode::Char('A') => {
                let on = !self.prefs.get().auto_apply_enabled;
                self.prefs.set_auto_apply(on)
            }
            KeyCode::Char('x') => {
                self.open_prompt(PromptKind::Blacklist);
                Ok(())
            }
            KeyCode::Char('L') if self.pending_auth.is_none() => {
                self.open_prompt(PromptKind::LoginEmail);
                Ok(())
            }
            KeyCode::Char('U') if self.pending_auth.is_none() => {
                self.open_prompt(PromptKind::SignupEmail);
                Ok(())
            }
            KeyCode::Char('O') => {
                self.session.sign_out();
                Ok(())
            }
            KeyCode::Char('R') => self.prefs.reset(),
            _ => Ok(()),
        };
        if let Err(e) = result {
            self.show_error(e.into());
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.session.unsubscribe(self.session_listener);
    }
}

pub fn run_dashboard(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.drain_events();
        terminal.draw(|frame| draw(frame, app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            debug!(?key.code, "key");
            if !app.handle_key(key) {
                break;
            }
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, app: &App) {
    let palette = Palette::for_mode(app.prefs.get().dark_mode);
    let base = Style::default().bg(palette.bg).fg(palette.fg);
    frame.render_widget(Block::default().style(base), frame.area());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(if app.banner.is_some() { 3 } else { 0 }),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, app, &palette, rows[0]);

    if let Some(banner) = &app.banner {
        let widget = Paragraph::new(format!("{}  (Esc to dismiss)", banner))
            .style(Style::default().fg(Color::White).bg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title(" Error "))
            .wrap(Wrap { trim: true });
        frame.render_widget(widget, rows[1]);
    }

    let body = if app.show_sidebar {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(24), Constraint::Min(0)])
            .split(rows[2]);
        draw_sidebar(frame, app, &palette, cols[0]);
        cols[1]
    } else {
        rows[2]
    };

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(body);

    let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.title())).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(app.tab.index())
        .highlight_style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, main[0]);

    match app.tab {
        Tab::Dashboard => draw_dashboard(frame, &palette, main[1]),
        Tab::Search => draw_search(frame, app, &palette, main[1]),
        Tab::Results => draw_results(frame, app, &palette, main[1]),
        Tab::Resumes => draw_resumes(frame, app, &palette, main[1]),
        Tab::Settings => draw_settings(frame, app, &palette, main[1]),
    }

    let help = match app.tab {
        Tab::Dashboard => " Tab:switch  b:sidebar  d:theme  q:quit",
        Tab::Search => " r:role  o:location  j/k+space:platforms  +/-:add/remove platform  v:live  s:save  Enter:search",
        Tab::Results => " j/k:move  space:save  a:applied  f:filter  n/p:page  Enter:details  q:quit",
        Tab::Resumes => " u:upload  j/k:select  a:analyze  x:remove  q:quit",
        Tab::Settings => " i:AI provider  m:remote  A:auto-apply  x:blacklist  L:login  U:sign up  O:logout  R:reset",
    };
    let footer = app.status.as_deref().map(|s| format!(" {}  |{}", s, help)).unwrap_or_else(|| help.to_string());
    frame.render_widget(Paragraph::new(footer).style(Style::default().fg(palette.muted)), rows[3]);

    if app.show_details {
        if let Some(listing) = app.selected_listing() {
            draw_details(frame, &listing, &palette);
        }
    }
    if let Some(prompt) = &app.prompt {
        draw_prompt(frame, prompt, &palette);
    }
}

fn draw_header(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let unread = mock::notifications().iter().filter(|n| n.unread).count();
    let user = app
        .signed_in_as
        .borrow()
        .clone()
        .unwrap_or_else(|| "not signed in".to_string());
    let theme = if app.prefs.get().dark_mode { "dark" } else { "light" };
    let line = Line::from(vec![
        Span::styled(" jobpicker ", Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)),
        Span::raw(format!("| {} | {} unread | {} theme", user, unread, theme)),
        Span::styled(
            if app.searching {
                "  searching..."
            } else if app.pending_auth.is_some() {
                "  signing in..."
            } else {
                ""
            },
            Style::default().fg(palette.accent),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_sidebar(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let mut items: Vec<ListItem> = Tab::ALL
        .iter()
        .map(|t| {
            let marker = if *t == app.tab { ">" } else { " " };
            ListItem::new(format!("{} {}", marker, t.title()))
        })
        .collect();

    let saved = &app.prefs.get().saved_searches;
    if !saved.is_empty() {
        items.push(ListItem::new(""));
        items.push(ListItem::new(Span::styled("Saved searches", Style::default().fg(palette.muted))));
        for search in saved {
            items.push(ListItem::new(format!("  {}", search.label())));
        }
    }

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Menu "));
    frame.render_widget(list, area);
}

fn draw_dashboard(frame: &mut Frame, palette: &Palette, area: Rect) {
    let stats = mock::automation_stats();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut lines = vec![
        Line::from(format!("Total applications:  {}", stats.total_applications)),
        Line::from(Span::styled(
            format!("Successful:          {}", stats.successful_applications),
            Style::default().fg(Color::Green),
        )),
        Line::from(Span::styled(
            format!("Failed:              {}", stats.failed_applications),
            Style::default().fg(Color::Red),
        )),
        Line::from(format!("Average match score: {:.1}%", stats.average_match_score)),
        Line::from(""),
        Line::from(Span::styled("By platform", Style::default().fg(palette.accent))),
    ];
    for (platform, count) in &stats.applications_by_platform {
        lines.push(Line::from(format!("  {:<12} {}", platform, count)));
    }
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Automation ")),
        cols[0],
    );

    let items: Vec<ListItem> = mock::recent_applications(Utc::now())
        .into_iter()
        .map(|app| {
            let color = match app.status.as_str() {
                "submitted" => Color::Green,
                "pending" => Color::Yellow,
                _ => Color::Red,
            };
            let mut text = format!(
                "Job #{} {:<10} {:>3}%  {}",
                app.job_id,
                app.status,
                app.match_score,
                app.timestamp.format("%Y-%m-%d")
            );
            if let Some(err) = &app.error {
                text.push_str(&format!("  ({})", err));
            }
            ListItem::new(Span::styled(text, Style::default().fg(color)))
        })
        .collect();
    frame.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title(" Recent applications ")),
        cols[1],
    );
}

fn draw_search(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let mut lines = vec![
        Line::from(format!("Role:     {}", if app.search.role.is_empty() { "-" } else { &app.search.role })),
        Line::from(format!("Location: {}", app.search.location.as_deref().unwrap_or("any"))),
        Line::from(format!(
            "Source:   {}",
            if app.live { "live job board (Indeed)" } else { "demo listings" }
        )),
        Line::from(""),
        Line::from(Span::styled("Platforms", Style::default().fg(palette.accent))),
    ];
    for (i, platform) in app.search.platforms.iter().enumerate() {
        let check = if platform.enabled { "[x]" } else { "[ ]" };
        let style = if i == app.platform_cursor {
            Style::default().bg(palette.highlight).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let topic = platform.topic.as_deref().map(|t| format!(" ({})", t)).unwrap_or_default();
        lines.push(Line::from(Span::styled(
            format!("  {} {}{}  {}", check, platform.name, topic, platform.url),
            style,
        )));
    }
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Job Search ")),
        area,
    );
}

fn draw_results(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let (items, number, total) = app.current_page();
    let title = format!(
        " {} ({}) - page {}/{} ",
        app.filter.label(),
        app.visible().len(),
        number,
        total
    );

    if items.is_empty() {
        let text = if app.searching {
            "Searching..."
        } else {
            match app.filter {
                ListingFilter::All => "No jobs yet. Run a search from the Job Search tab.",
                ListingFilter::Saved => "No saved jobs. Press f to show all.",
                ListingFilter::Applied => "No applied jobs. Press f to show all.",
            }
        };
        frame.render_widget(
            Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(title)),
            area,
        );
        return;
    }

    let rows: Vec<ListItem> = items
        .iter()
        .map(|job| {
            let saved = if job.saved { "*" } else { " " };
            let applied = if job.applied { "+" } else { " " };
            let score = job.match_score.map(|s| format!("{:>3}%", s)).unwrap_or_else(|| "   -".to_string());
            ListItem::new(format!(
                "{}{} {} {} | {} | {} | {}",
                saved, applied, score, job.title, job.company, job.location, job.platform
            ))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.selected));
    let list = List::new(rows)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(palette.highlight).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_resumes(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let list_height = (app.resumes.list().len().max(1) as u16 + 2).min(area.height / 2).max(3);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(list_height), Constraint::Min(0)])
        .split(area);

    match app.upload_progress {
        Some(progress) => {
            let gauge = Gauge::default()
                .block(Block::default().borders(Borders::ALL).title(" Uploading "))
                .gauge_style(Style::default().fg(palette.accent))
                .percent(progress.min(100) as u16);
            frame.render_widget(gauge, rows[0]);
        }
        None if app.resumes.list().is_empty() => {
            frame.render_widget(
                Paragraph::new("No resume uploaded. Press u to upload a PDF.")
                    .block(Block::default().borders(Borders::ALL).title(" Resumes ")),
                rows[0],
            );
        }
        None => {
            let items: Vec<ListItem> = app
                .resumes
                .list()
                .iter()
                .map(|r| {
                    ListItem::new(format!(
                        "{} ({} bytes, uploaded {})",
                        r.name,
                        r.size_bytes,
                        r.uploaded_at.format("%Y-%m-%d %H:%M")
                    ))
                })
                .collect();
            let mut state = ListState::default();
            state.select(Some(app.resume_cursor));
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title(" Resumes "))
                .highlight_style(Style::default().bg(palette.highlight).add_modifier(Modifier::BOLD))
                .highlight_symbol("> ");
            frame.render_stateful_widget(list, rows[0], &mut state);
        }
    }

    let mut lines = Vec::new();
    if let Some(analysis) = &app.analysis {
        let color = match resume::score_band(analysis.score) {
            "strong" => Color::Green,
            "fair" => palette.accent,
            _ => Color::Red,
        };
        lines.push(Line::from(Span::styled(
            format!("ATS score: {}%", analysis.score),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from(format!("Detected keywords: {}", analysis.keywords.join(", "))));
        lines.push(Line::from(format!("Missing keywords:  {}", analysis.missing_keywords.join(", "))));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Suggestions", Style::default().fg(palette.accent))));
        for suggestion in &analysis.suggestions {
            lines.push(Line::from(format!("  - {}", suggestion)));
        }
    } else if app.upload_progress.is_some() {
        lines.push(Line::from("Analyzing your resume..."));
    }
    let title = match app.analysis_for.as_deref().and_then(|id| app.resumes.get(id)) {
        Some(r) => format!(" Analysis: {} ", r.name),
        None => " Analysis ".to_string(),
    };
    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false }),
        rows[1],
    );
}

fn draw_settings(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let prefs = app.prefs.get();
    let app_prefs = &prefs.application_preferences;
    let list_or_none = |v: &[String]| if v.is_empty() { "none".to_string() } else { v.join(", ") };

    let lines = vec![
        Line::from(Span::styled("Appearance", Style::default().fg(palette.accent))),
        Line::from(format!("  Dark mode:          {}", if prefs.dark_mode { "on" } else { "off" })),
        Line::from(""),
        Line::from(Span::styled("AI", Style::default().fg(palette.accent))),
        Line::from(format!("  Provider:           {}", prefs.ai_settings.provider.as_str())),
        Line::from(format!(
            "  API key:            {}",
            if prefs.ai_settings.api_key.is_some() { "custom" } else { "default" }
        )),
        Line::from(format!(
            "  Job search API key: {}",
            if prefs.job_search_api_key.is_some() { "set" } else { "not set" }
        )),
        Line::from(""),
        Line::from(Span::styled("Applications", Style::default().fg(palette.accent))),
        Line::from(format!("  Auto-apply:         {}", if prefs.auto_apply_enabled { "on" } else { "off" })),
        Line::from(format!("  Remote preference:  {}", app_prefs.remote_preference.as_str())),
        Line::from(format!("  Blacklisted:        {}", list_or_none(&app_prefs.blacklisted_companies))),
        Line::from(format!("  Preferred places:   {}", list_or_none(&app_prefs.preferred_locations))),
        Line::from(""),
        Line::from(Span::styled("Account", Style::default().fg(palette.accent))),
        Line::from(format!(
            "  {}",
            app.session
                .user()
                .map(|u| format!("Signed in as {}", u.email))
                .unwrap_or_else(|| "Not signed in".to_string())
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Settings ")),
        area,
    );
}

fn centered(area: Rect, width_pct: u16, height: u16) -> Rect {
    let width = area.width * width_pct / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_details(frame: &mut Frame, job: &JobListing, palette: &Palette) {
    let area = centered(frame.area(), 70, 20);
    let mut lines = vec![
        Line::from(Span::styled(&job.title, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(format!("{} - {}", job.company, job.location)),
        Line::from(format!("Platform: {}", job.platform)),
    ];
    if let Some(salary) = &job.salary {
        lines.push(Line::from(format!("Salary: {}", salary)));
    }
    if let Some(posted) = &job.posted_date {
        lines.push(Line::from(format!("Posted: {}", posted)));
    }
    if !job.skills.is_empty() {
        lines.push(Line::from(format!("Skills: {}", job.skills.join(", "))));
    }
    lines.push(Line::from(Span::styled(job.url.clone(), Style::default().fg(palette.accent))));
    lines.push(Line::from(""));
    if let Some(summary) = &job.summary {
        let width = area.width.saturating_sub(4).max(20) as usize;
        for line in textwrap::fill(summary, width).lines() {
            lines.push(Line::from(line.to_string()));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        if job.applied { "Applied" } else { "a: mark as applied   Esc: close" },
        Style::default().fg(palette.muted),
    )));

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().bg(palette.bg).fg(palette.fg))
            .block(Block::default().borders(Borders::ALL).title(" Job details ")),
        area,
    );
}

fn draw_prompt(frame: &mut Frame, prompt: &Prompt, palette: &Palette) {
    let area = centered(frame.area(), 50, if prompt.error.is_some() { 4 } else { 3 });
    let shown = if prompt.kind.is_secret() {
        "*".repeat(prompt.buffer.chars().count())
    } else {
        prompt.buffer.clone()
    };
    let mut lines = vec![Line::from(format!("{}_", shown))];
    if let Some(error) = &prompt.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().bg(palette.bg).fg(palette.fg))
            .block(Block::default().borders(Borders::ALL).title(format!(" {} ", prompt.kind.label()))),
        area,
    );
}
