//! Application state management for the shepherd dashboard.
//!
//! This module contains the `App` struct that owns the session, the API
//! client, every screen's view state, and the channel that background API
//! tasks report back on.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use shepherd_core::api::{ApiClient, ApiError};
use shepherd_core::attachment::ImageAttachment;
use shepherd_core::auth::{SessionPhase, SessionState, SessionSync};
use shepherd_core::config::{env_password, Config};
use shepherd_core::forms::{ChurchEventForm, DevotionForm};
use shepherd_core::listing::{paginate, Page, SortDirection, SortState};
use shepherd_core::models::{
    rank_users, ChurchEvent, ChurchEventSortColumn, Devotion, DevotionSortColumn, RankedUser,
    UserProgress,
};
use shepherd_core::routes::Route;
use shepherd_core::storage::FileStore;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 100;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for a single form field (devotion bodies can be long)
const MAX_FIELD_LENGTH: usize = 10_000;

/// Devotions requested per call when loading the full list
const DEVOTION_BATCH_SIZE: usize = 100;

pub const SESSION_EXPIRED_NOTICE: &str = "Session expired. Please sign in again.";

// ============================================================================
// UI State Types
// ============================================================================

/// What a pending delete confirmation will remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Devotion(i64),
    ChurchEvent(i64),
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    ConfirmingDelete(DeleteTarget),
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

/// Focusable fields of the church event form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Title,
    Description,
    Date,
    Time,
    Location,
    Active,
    CheckIn,
    Image,
    Save,
}

impl EventField {
    pub const ALL: [EventField; 9] = [
        EventField::Title,
        EventField::Description,
        EventField::Date,
        EventField::Time,
        EventField::Location,
        EventField::Active,
        EventField::CheckIn,
        EventField::Image,
        EventField::Save,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EventField::Title => "Title",
            EventField::Description => "Description",
            EventField::Date => "Date (YYYY-MM-DD)",
            EventField::Time => "Time (HH:MM)",
            EventField::Location => "Location",
            EventField::Active => "Active",
            EventField::CheckIn => "Check-in allowed",
            EventField::Image => "Image file",
            EventField::Save => "Save",
        }
    }

    pub fn next(&self) -> Self {
        cycle(&Self::ALL, *self, 1)
    }

    pub fn prev(&self) -> Self {
        cycle(&Self::ALL, *self, Self::ALL.len() - 1)
    }
}

/// Focusable fields of the devotion form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevotionField {
    Date,
    Title,
    Subtitle,
    Book,
    VideoUrl,
    Content,
    Active,
    Save,
}

impl DevotionField {
    pub const ALL: [DevotionField; 8] = [
        DevotionField::Date,
        DevotionField::Title,
        DevotionField::Subtitle,
        DevotionField::Book,
        DevotionField::VideoUrl,
        DevotionField::Content,
        DevotionField::Active,
        DevotionField::Save,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DevotionField::Date => "Date (YYYY-MM-DD)",
            DevotionField::Title => "Title",
            DevotionField::Subtitle => "Subtitle",
            DevotionField::Book => "Book",
            DevotionField::VideoUrl => "Video URL",
            DevotionField::Content => "Content",
            DevotionField::Active => "Active",
            DevotionField::Save => "Save",
        }
    }

    pub fn next(&self) -> Self {
        cycle(&Self::ALL, *self, 1)
    }

    pub fn prev(&self) -> Self {
        cycle(&Self::ALL, *self, Self::ALL.len() - 1)
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, step: usize) -> T {
    let pos = all.iter().position(|f| *f == current).unwrap_or(0);
    all[(pos + step) % all.len()]
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Messages sent from background API tasks back to the main loop.
enum TaskResult {
    Devotions(Vec<Devotion>),
    Devotion(Devotion),
    ChurchEvents(Vec<ChurchEvent>),
    ChurchEvent(ChurchEvent),
    Leaderboard(Vec<UserProgress>),
    /// A create or update went through; return to `back_to`
    Saved { message: String, back_to: Route },
    Deleted { message: String, list: Route },
    Failed {
        action: &'static str,
        error: anyhow::Error,
    },
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub session: SessionSync<FileStore>,
    session_rx: watch::Receiver<SessionState>,
    pub api: ApiClient,

    // UI State
    pub state: AppState,
    pub route: Route,
    pub search_query: String,
    pub home_selection: usize,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    /// One-time notice shown above the login form
    pub notice: Option<String>,

    // Devotions
    pub devotions: Vec<Devotion>,
    pub devotion_sort: SortState<DevotionSortColumn>,
    pub devotion_page: usize,
    pub devotion_selection: usize,
    pub devotion_form: DevotionForm,
    pub devotion_field: DevotionField,

    // Church events
    pub events: Vec<ChurchEvent>,
    pub event_sort: SortState<ChurchEventSortColumn>,
    pub event_selection: usize,
    pub event_form: ChurchEventForm,
    pub event_field: EventField,

    // Shared form state
    pub form_error: Option<String>,
    form_dirty: bool,

    // Leaderboard
    pub leaderboard: Vec<RankedUser>,
    pub leaderboard_selection: usize,

    // Background task channel
    task_rx: mpsc::Receiver<(u64, TaskResult)>,
    task_tx: mpsc::Sender<(u64, TaskResult)>,
    pending_tasks: usize,
    /// Bumped whenever a session starts or ends; tasks carry the value
    /// they were spawned under
    session_generation: u64,

    pub status_message: Option<String>,
}

impl App {
    /// Create the application with session storage in the cache directory
    pub fn new(config: Config) -> Result<Self> {
        let storage_dir = config
            .storage_dir()
            .unwrap_or_else(|_| PathBuf::from("./.shepherd"));
        debug!(?storage_dir, "Storage directory configured");
        Self::with_storage(config, FileStore::in_dir(&storage_dir))
    }

    pub fn with_storage(config: Config, storage: FileStore) -> Result<Self> {
        let api = ApiClient::new(config.api_base_url())?;
        debug!(base_url = api.base_url(), "API client ready");

        let session = SessionSync::new(storage);
        let session_rx = session.subscribe();
        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_email = config.last_email.clone().unwrap_or_default();
        let login_password = env_password().unwrap_or_default();

        Ok(Self {
            config,
            session,
            session_rx,
            api,

            state: AppState::Normal,
            route: Route::Root,
            search_query: String::new(),
            home_selection: 0,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,
            notice: None,

            devotions: Vec::new(),
            devotion_sort: SortState::new(DevotionSortColumn::Date, SortDirection::Descending),
            devotion_page: 1,
            devotion_selection: 0,
            devotion_form: DevotionForm::default(),
            devotion_field: DevotionField::Date,

            events: Vec::new(),
            event_sort: SortState::new(ChurchEventSortColumn::EventDate, SortDirection::Descending),
            event_selection: 0,
            event_form: ChurchEventForm::new(),
            event_field: EventField::Title,

            form_error: None,
            form_dirty: false,

            leaderboard: Vec::new(),
            leaderboard_selection: 0,

            task_rx,
            task_tx,
            pending_tasks: 0,
            session_generation: 0,

            status_message: None,
        })
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Restore the stored session and land on the first screen. Must run
    /// before the first frame is drawn.
    pub fn initialize_session(&mut self) {
        let phase = self.session.initialize();
        if let Some(token) = self.session.token() {
            self.session_started(token);
        }
        info!(authenticated = phase == SessionPhase::Authenticated, "Session initialized");
        self.session_rx.mark_unchanged();
        self.navigate(Route::Root);
    }

    pub fn display_name(&self) -> String {
        self.session.current_display_name()
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        let email = self.login_email.trim().to_string();
        if email.is_empty() || self.login_password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return;
        }
        self.login_error = None;

        let outcome = match self.api.login(&email, &self.login_password).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Login failed");
                self.login_error = Some(login_error_message(&e));
                return;
            }
        };

        let token = outcome.credential.access_token.clone();
        if let Err(e) = self.session.login(outcome.credential) {
            error!(error = %e, "Failed to store session");
            self.login_error = Some(format!("Could not save session: {e}"));
            return;
        }
        self.session_started(token);

        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        self.login_password.clear();
        self.notice = None;
        let greeting = outcome
            .message
            .unwrap_or_else(|| format!("Welcome, {}", self.display_name()));
        self.status_message = Some(greeting);
        self.navigate(Route::Home);
    }

    /// Start the login process (reset the login form)
    pub fn start_login(&mut self) {
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// User-initiated sign out
    pub fn sign_out(&mut self) {
        self.session.logout();
        self.end_session(None);
        self.status_message = Some("Signed out".to_string());
    }

    /// Point the API at a freshly signed-in session. Results of tasks
    /// spawned before this are dropped.
    fn session_started(&mut self, token: String) {
        self.session_generation += 1;
        self.api.set_token(token);
    }

    fn end_session(&mut self, notice: Option<&str>) {
        self.session_generation += 1;
        self.api.clear_token();
        self.devotions.clear();
        self.events.clear();
        self.leaderboard.clear();
        self.notice = notice.map(str::to_string);
        self.session_rx.mark_unchanged();
        self.navigate(Route::Login);
    }

    /// Show a failed API call. An authorization denial ends the session.
    pub fn report_error(&mut self, action: &str, error: anyhow::Error) {
        if self.session.handle_api_error(&error) {
            warn!(action, "Authorization denied, session ended");
            self.end_session(Some(SESSION_EXPIRED_NOTICE));
            self.status_message = None;
            return;
        }
        error!(action, error = %format!("{error:#}"), "Request failed");
        self.status_message = Some(format!("{action} failed: {}", error_message(&error)));
    }

    /// Re-guard the current screen when the session changed underneath it
    fn sync_session_view(&mut self) {
        if !self.session_rx.has_changed().unwrap_or(false) {
            return;
        }
        let authenticated = self.session_rx.borrow_and_update().is_authenticated();
        let guarded = self.route.guard(authenticated);
        if guarded != self.route {
            debug!(from = ?self.route, to = ?guarded, "Session changed, leaving screen");
            self.navigate(guarded);
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Go to `route`, or wherever the guard sends us instead, and start
    /// loading what that screen shows.
    pub fn navigate(&mut self, route: Route) {
        let target = route.guard(self.session.is_authenticated());
        if target != route {
            debug!(requested = ?route, target = ?target, "Route redirected");
        }

        self.route = target;
        self.state = AppState::Normal;
        self.search_query.clear();
        self.form_error = None;
        self.form_dirty = false;

        match target {
            Route::Login => self.start_login(),
            Route::Devotions => self.load_devotions(),
            Route::DevotionEdit(id) => self.open_devotion(id),
            Route::ChurchEvents => self.load_church_events(),
            Route::ChurchEventCreate => {
                self.event_form = ChurchEventForm::new();
                self.event_field = EventField::Title;
            }
            Route::ChurchEventEdit(id) => self.open_church_event(id),
            Route::Leaderboard => self.load_leaderboard(),
            Route::Root | Route::Home | Route::Community => {}
        }
    }

    /// Where Esc leads from the current screen
    pub fn go_back(&mut self) {
        let parent = match self.route {
            Route::DevotionEdit(_) => Route::Devotions,
            Route::ChurchEventCreate | Route::ChurchEventEdit(_) => Route::ChurchEvents,
            _ => Route::Home,
        };
        self.navigate(parent);
    }

    pub fn is_loading(&self) -> bool {
        self.pending_tasks > 0
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    fn spawn_task<F>(&mut self, action: &'static str, task: F)
    where
        F: Future<Output = Result<TaskResult>> + Send + 'static,
    {
        let tx = self.task_tx.clone();
        let generation = self.session_generation;
        self.pending_tasks += 1;
        tokio::spawn(async move {
            let result = match task.await {
                Ok(result) => result,
                Err(error) => TaskResult::Failed { action, error },
            };
            if tx.send((generation, result)).await.is_err() {
                debug!(action, "App closed before task finished");
            }
        });
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.task_rx.try_recv() {
            results.push(result);
        }

        for (generation, result) in results {
            self.pending_tasks = self.pending_tasks.saturating_sub(1);
            self.process_task_result(generation, result);
        }

        self.sync_session_view();
    }

    fn process_task_result(&mut self, generation: u64, result: TaskResult) {
        // Answers to requests made under another session are stale
        if generation != self.session_generation || !self.session.is_authenticated() {
            debug!(generation, current = self.session_generation, "Dropping stale task result");
            return;
        }

        match result {
            TaskResult::Devotions(devotions) => {
                debug!(count = devotions.len(), "Devotions loaded");
                self.devotions = devotions;
                self.clamp_devotion_selection();
            }
            TaskResult::Devotion(devotion) => {
                if self.route == Route::DevotionEdit(devotion.id) && !self.form_dirty {
                    self.devotion_form = DevotionForm::from_devotion(&devotion);
                }
                upsert_by_id(&mut self.devotions, devotion, |d| d.id);
            }
            TaskResult::ChurchEvents(events) => {
                debug!(count = events.len(), "Church events loaded");
                self.events = events;
                self.clamp_event_selection();
            }
            TaskResult::ChurchEvent(event) => {
                if self.route == Route::ChurchEventEdit(event.id) && !self.form_dirty {
                    self.event_form = ChurchEventForm::from_event(&event);
                }
                upsert_by_id(&mut self.events, event, |e| e.id);
            }
            TaskResult::Leaderboard(progress) => {
                self.leaderboard = rank_users(progress);
                self.leaderboard_selection = 0;
            }
            TaskResult::Saved { message, back_to } => {
                info!(%message, "Saved");
                self.navigate(back_to);
                self.status_message = Some(message);
            }
            TaskResult::Deleted { message, list } => {
                info!(%message, "Deleted");
                self.status_message = Some(message);
                if self.route == list {
                    self.navigate(list);
                }
            }
            TaskResult::Failed { action, error } => self.report_error(action, error),
        }
    }

    fn load_devotions(&mut self) {
        let api = self.api.clone();
        self.spawn_task("Load devotions", async move {
            Ok(TaskResult::Devotions(fetch_all_devotions(&api).await?))
        });
    }

    fn load_church_events(&mut self) {
        let api = self.api.clone();
        self.spawn_task("Load church events", async move {
            Ok(TaskResult::ChurchEvents(api.fetch_church_events().await?))
        });
    }

    fn load_leaderboard(&mut self) {
        let api = self.api.clone();
        self.spawn_task("Load leaderboard", async move {
            Ok(TaskResult::Leaderboard(api.fetch_leaderboard().await?))
        });
    }

    fn open_devotion(&mut self, id: i64) {
        self.devotion_field = DevotionField::Date;
        self.devotion_form = self
            .devotions
            .iter()
            .find(|d| d.id == id)
            .map(DevotionForm::from_devotion)
            .unwrap_or_default();

        let api = self.api.clone();
        self.spawn_task("Load devotion", async move {
            Ok(TaskResult::Devotion(api.fetch_devotion(id).await?))
        });
    }

    fn open_church_event(&mut self, id: i64) {
        self.event_field = EventField::Title;
        self.event_form = self
            .events
            .iter()
            .find(|e| e.id == id)
            .map(ChurchEventForm::from_event)
            .unwrap_or_else(ChurchEventForm::new);

        let api = self.api.clone();
        self.spawn_task("Load church event", async move {
            Ok(TaskResult::ChurchEvent(api.fetch_church_event(id).await?))
        });
    }

    // =========================================================================
    // Devotions view
    // =========================================================================

    /// Devotions matching the search, in the current sort order
    pub fn visible_devotions(&self) -> Vec<&Devotion> {
        let sort = self.devotion_sort;
        let mut list: Vec<&Devotion> = self
            .devotions
            .iter()
            .filter(|d| d.matches_search(&self.search_query))
            .collect();
        list.sort_by(|a, b| sort.direction.apply(a.compare_by(b, sort.column)));
        list
    }

    pub fn devotions_per_page(&self) -> usize {
        self.config.devotions_per_page()
    }

    pub fn devotion_page_of<'v, 'd>(&self, visible: &'v [&'d Devotion]) -> Page<'v, &'d Devotion> {
        paginate(visible, self.devotion_page, self.devotions_per_page())
    }

    pub fn selected_devotion(&self) -> Option<&Devotion> {
        let visible = self.visible_devotions();
        let page = self.devotion_page_of(&visible);
        page.items.get(self.devotion_selection).copied()
    }

    pub fn toggle_devotion_sort(&mut self, column: DevotionSortColumn) {
        self.devotion_sort.toggle(column);
        self.devotion_page = 1;
        self.devotion_selection = 0;
    }

    pub fn next_devotion_page(&mut self) {
        let next = {
            let visible = self.visible_devotions();
            let page = self.devotion_page_of(&visible);
            page.has_next().then_some(page.page + 1)
        };
        if let Some(next) = next {
            self.devotion_page = next;
            self.devotion_selection = 0;
        }
    }

    pub fn prev_devotion_page(&mut self) {
        let prev = {
            let visible = self.visible_devotions();
            let page = self.devotion_page_of(&visible);
            page.has_prev().then(|| page.page - 1)
        };
        if let Some(prev) = prev {
            self.devotion_page = prev;
            self.devotion_selection = 0;
        }
    }

    fn clamp_devotion_selection(&mut self) {
        let (current, len) = {
            let visible = self.visible_devotions();
            let page = self.devotion_page_of(&visible);
            (page.page, page.items.len())
        };
        self.devotion_page = current;
        self.devotion_selection = self.devotion_selection.min(len.saturating_sub(1));
    }

    // =========================================================================
    // Church events view
    // =========================================================================

    pub fn visible_events(&self) -> Vec<&ChurchEvent> {
        let sort = self.event_sort;
        let mut list: Vec<&ChurchEvent> = self
            .events
            .iter()
            .filter(|e| e.matches_search(&self.search_query))
            .collect();
        list.sort_by(|a, b| sort.direction.apply(a.compare_by(b, sort.column)));
        list
    }

    pub fn selected_event(&self) -> Option<&ChurchEvent> {
        self.visible_events().get(self.event_selection).copied()
    }

    pub fn toggle_event_sort(&mut self, column: ChurchEventSortColumn) {
        self.event_sort.toggle(column);
        self.event_selection = 0;
    }

    fn clamp_event_selection(&mut self) {
        let len = self.visible_events().len();
        self.event_selection = self.event_selection.min(len.saturating_sub(1));
    }

    /// Search query changed; keep selections inside the filtered lists
    pub fn search_changed(&mut self) {
        self.devotion_page = 1;
        self.devotion_selection = 0;
        self.event_selection = 0;
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn list_len(&self) -> usize {
        match self.route {
            Route::Home => Route::menu().len(),
            Route::Devotions => {
                let visible = self.visible_devotions();
                self.devotion_page_of(&visible).items.len()
            }
            Route::ChurchEvents => self.visible_events().len(),
            Route::Leaderboard => self.leaderboard.len(),
            _ => 0,
        }
    }

    fn selection_mut(&mut self) -> Option<&mut usize> {
        match self.route {
            Route::Home => Some(&mut self.home_selection),
            Route::Devotions => Some(&mut self.devotion_selection),
            Route::ChurchEvents => Some(&mut self.event_selection),
            Route::Leaderboard => Some(&mut self.leaderboard_selection),
            _ => None,
        }
    }

    pub fn select_next(&mut self) {
        let len = self.list_len();
        if let Some(selection) = self.selection_mut() {
            if *selection + 1 < len {
                *selection += 1;
            }
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(selection) = self.selection_mut() {
            *selection = selection.saturating_sub(1);
        }
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Ask for confirmation before deleting the selected row
    pub fn request_delete(&mut self) {
        let target = match self.route {
            Route::Devotions => self.selected_devotion().map(|d| DeleteTarget::Devotion(d.id)),
            Route::ChurchEvents => self.selected_event().map(|e| DeleteTarget::ChurchEvent(e.id)),
            _ => None,
        };
        if let Some(target) = target {
            self.state = AppState::ConfirmingDelete(target);
        }
    }

    pub fn confirm_delete(&mut self, target: DeleteTarget) {
        self.state = AppState::Normal;
        let api = self.api.clone();
        match target {
            DeleteTarget::Devotion(id) => self.spawn_task("Delete devotion", async move {
                api.delete_devotion(id).await?;
                Ok(TaskResult::Deleted {
                    message: "Devotion deleted".to_string(),
                    list: Route::Devotions,
                })
            }),
            DeleteTarget::ChurchEvent(id) => self.spawn_task("Delete church event", async move {
                api.delete_church_event(id).await?;
                Ok(TaskResult::Deleted {
                    message: "Church event deleted".to_string(),
                    list: Route::ChurchEvents,
                })
            }),
        }
    }

    /// Display label for a pending delete
    pub fn delete_label(&self, target: DeleteTarget) -> String {
        match target {
            DeleteTarget::Devotion(id) => self
                .devotions
                .iter()
                .find(|d| d.id == id)
                .map(|d| format!("devotion \"{}\"", d.title))
                .unwrap_or_else(|| "this devotion".to_string()),
            DeleteTarget::ChurchEvent(id) => self
                .events
                .iter()
                .find(|e| e.id == id)
                .map(|e| format!("event \"{}\"", e.title))
                .unwrap_or_else(|| "this event".to_string()),
        }
    }

    // =========================================================================
    // Forms
    // =========================================================================

    /// Text buffer behind the focused form field, if it is a text field
    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.route {
            Route::DevotionEdit(_) => {
                let form = &mut self.devotion_form;
                match self.devotion_field {
                    DevotionField::Date => Some(&mut form.date),
                    DevotionField::Title => Some(&mut form.title),
                    DevotionField::Subtitle => Some(&mut form.subtitle),
                    DevotionField::Book => Some(&mut form.book),
                    DevotionField::VideoUrl => Some(&mut form.video_url),
                    DevotionField::Content => Some(&mut form.content),
                    DevotionField::Active | DevotionField::Save => None,
                }
            }
            Route::ChurchEventCreate | Route::ChurchEventEdit(_) => {
                let form = &mut self.event_form;
                match self.event_field {
                    EventField::Title => Some(&mut form.title),
                    EventField::Description => Some(&mut form.description),
                    EventField::Date => Some(&mut form.event_date),
                    EventField::Time => Some(&mut form.event_time),
                    EventField::Location => Some(&mut form.location),
                    EventField::Image => Some(&mut form.image_path),
                    EventField::Active | EventField::CheckIn | EventField::Save => None,
                }
            }
            _ => None,
        }
    }

    /// Whether the focused field is the event image path
    fn image_field_focused(&self) -> bool {
        matches!(self.route, Route::ChurchEventCreate | Route::ChurchEventEdit(_))
            && self.event_field == EventField::Image
    }

    fn text_edited(&mut self) {
        self.form_dirty = true;
        // A changed path invalidates the loaded image until it is re-attached
        if self.image_field_focused() {
            self.event_form.image = None;
        }
    }

    pub fn form_insert_char(&mut self, c: char) {
        let pushed = match self.focused_text_mut() {
            Some(text) if can_add_field_char(text.chars().count(), c) => {
                text.push(c);
                true
            }
            _ => false,
        };
        if pushed {
            self.text_edited();
        }
    }

    pub fn form_backspace(&mut self) {
        let popped = self
            .focused_text_mut()
            .is_some_and(|text| text.pop().is_some());
        if popped {
            self.text_edited();
        }
    }

    /// Flip the focused checkbox. Returns false if it is not a checkbox.
    pub fn form_toggle(&mut self) -> bool {
        let toggled = match self.route {
            Route::DevotionEdit(_) if self.devotion_field == DevotionField::Active => {
                self.devotion_form.is_active = !self.devotion_form.is_active;
                true
            }
            Route::ChurchEventCreate | Route::ChurchEventEdit(_) => match self.event_field {
                EventField::Active => {
                    self.event_form.is_active = !self.event_form.is_active;
                    true
                }
                EventField::CheckIn => {
                    self.event_form.is_eligible_to_check_in =
                        !self.event_form.is_eligible_to_check_in;
                    true
                }
                _ => false,
            },
            _ => false,
        };
        if toggled {
            self.form_dirty = true;
        }
        toggled
    }

    pub fn form_next_field(&mut self) {
        match self.route {
            Route::DevotionEdit(_) => self.devotion_field = self.devotion_field.next(),
            _ => self.event_field = self.event_field.next(),
        }
    }

    pub fn form_prev_field(&mut self) {
        match self.route {
            Route::DevotionEdit(_) => self.devotion_field = self.devotion_field.prev(),
            _ => self.event_field = self.event_field.prev(),
        }
    }

    /// Load the image typed into the image field so its preview shows
    /// before the form is submitted.
    pub async fn attach_image(&mut self) {
        let typed = self.event_form.image_path.trim().to_string();
        if typed.is_empty() {
            self.event_form.image = None;
            return;
        }
        match ImageAttachment::from_path(Path::new(&typed)).await {
            Ok(image) => {
                self.status_message = Some(format!("Attached {}", image.preview()));
                self.event_form.image = Some(image);
                self.form_error = None;
            }
            Err(e) => {
                warn!(path = %typed, error = %e, "Image rejected");
                self.event_form.image = None;
                self.form_error = Some(e.to_string());
            }
        }
    }

    pub fn submit_devotion_form(&mut self) {
        let Route::DevotionEdit(id) = self.route else {
            return;
        };
        let input = match self.devotion_form.validate() {
            Ok(input) => input,
            Err(e) => {
                self.form_error = Some(e.to_string());
                return;
            }
        };
        self.form_error = None;

        let api = self.api.clone();
        self.spawn_task("Update devotion", async move {
            let devotion = api.update_devotion(id, &input).await?;
            Ok(TaskResult::Saved {
                message: format!("Updated \"{}\"", devotion.title),
                back_to: Route::Devotions,
            })
        });
        self.status_message = Some("Saving devotion...".to_string());
    }

    pub fn submit_event_form(&mut self) {
        let input = match self.event_form.validate() {
            Ok(input) => input,
            Err(e) => {
                self.form_error = Some(e.to_string());
                return;
            }
        };
        self.form_error = None;

        let api = self.api.clone();
        let image = self.event_form.image.clone();
        match self.route {
            Route::ChurchEventEdit(id) => self.spawn_task("Update church event", async move {
                let event = api.update_church_event(id, &input, image.as_ref()).await?;
                Ok(TaskResult::Saved {
                    message: format!("Updated \"{}\"", event.title),
                    back_to: Route::ChurchEvents,
                })
            }),
            Route::ChurchEventCreate => self.spawn_task("Create church event", async move {
                let event = api.create_church_event(&input, image.as_ref()).await?;
                Ok(TaskResult::Saved {
                    message: format!("Created \"{}\"", event.title),
                    back_to: Route::ChurchEvents,
                })
            }),
            _ => return,
        }
        self.status_message = Some("Saving church event...".to_string());
    }
}

/// Fetch every devotion: the first batch tells us the total, the rest are
/// requested together.
async fn fetch_all_devotions(api: &ApiClient) -> Result<Vec<Devotion>> {
    let first = api.fetch_devotions(0, DEVOTION_BATCH_SIZE).await?;
    let total = usize::try_from(first.total_count).unwrap_or(usize::MAX);
    let mut devotions = first.items;
    if devotions.len() < DEVOTION_BATCH_SIZE || devotions.len() >= total {
        return Ok(devotions);
    }

    let offsets = (DEVOTION_BATCH_SIZE..total).step_by(DEVOTION_BATCH_SIZE);
    let pages = futures::future::try_join_all(
        offsets.map(|offset| api.fetch_devotions(offset, DEVOTION_BATCH_SIZE)),
    )
    .await?;
    for page in pages {
        devotions.extend(page.items);
    }
    Ok(devotions)
}

fn upsert_by_id<T>(items: &mut Vec<T>, item: T, id: impl Fn(&T) -> i64) {
    match items.iter().position(|existing| id(existing) == id(&item)) {
        Some(pos) => items[pos] = item,
        None => items.push(item),
    }
}

/// Login failures, phrased for the login form
pub fn login_error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::Unauthorized | ApiError::AccessDenied(_)) => {
            "Invalid email or password".to_string()
        }
        Some(ApiError::Rejected { message }) => message.clone(),
        Some(ApiError::NetworkError(e)) if e.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        Some(ApiError::NetworkError(_)) => {
            "Unable to connect to server. Check your internet connection.".to_string()
        }
        _ => format!("Login failed: {}", err),
    }
}

/// Short message for the status line
pub fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::Rejected { message }) => message.clone(),
        Some(api_err) => api_err.to_string(),
        None => format!("{:#}", err),
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
