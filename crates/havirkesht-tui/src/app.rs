//! Application state management for the Havirkesht console.
//!
//! `App` wraps the core `Console` with everything that only matters on a
//! terminal: overlays, the login and add forms, row selection, the search
//! line and the channel that background loads report on.

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use havirkesht_core::api::{ApiError, ApiStatus};
use havirkesht_core::console::UserDraft;
use havirkesht_core::debounce::Debouncer;
use havirkesht_core::listing::LoadTicket;
use havirkesht_core::messages::{user_message, Operation};
use havirkesht_core::models::{FilterOption, Page, Role};
use havirkesht_core::{Config, Console, ConsoleError, Navigate, ResourceKind, Section};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for any other form field.
const MAX_FIELD_LENGTH: usize = 128;

// ============================================================================
// UI State Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    EditingForm,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Username,
    Password,
    Remember,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Remember,
            LoginFocus::Remember => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Username,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Username,
            LoginFocus::Remember => LoginFocus::Password,
            LoginFocus::Button => LoginFocus::Remember,
        }
    }
}

/// Results delivered by spawned tasks.
#[derive(Debug)]
pub enum AppEvent {
    Loaded(LoadTicket, Result<Page, ApiError>),
    /// Search input has been quiet long enough to send.
    SearchSettled(ResourceKind),
    Status(ApiStatus),
}

// ============================================================================
// Forms
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    AddProvince,
    AddCity,
    AddVillage,
    AddUser,
    ChangePassword,
}

impl FormKind {
    pub fn for_resource(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Province => FormKind::AddProvince,
            ResourceKind::City => FormKind::AddCity,
            ResourceKind::Village => FormKind::AddVillage,
            ResourceKind::User => FormKind::AddUser,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FormKind::AddProvince => "Add province",
            FormKind::AddCity => "Add city",
            FormKind::AddVillage => "Add village",
            FormKind::AddUser => "Add user",
            FormKind::ChangePassword => "Change password",
        }
    }

    fn operation(&self) -> Operation {
        match self {
            FormKind::AddProvince => Operation::Create(ResourceKind::Province),
            FormKind::AddCity => Operation::Create(ResourceKind::City),
            FormKind::AddVillage => Operation::Create(ResourceKind::Village),
            FormKind::AddUser => Operation::CreateUser,
            FormKind::ChangePassword => Operation::ChangePassword,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Masked when drawn
    Secret,
    Toggle(bool),
    /// Index into the options
    Choice(Vec<FilterOption>, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub kind: FieldKind,
}

impl FormField {
    fn text(label: &'static str) -> Self {
        Self { label, value: String::new(), kind: FieldKind::Text }
    }

    fn secret(label: &'static str) -> Self {
        Self { label, value: String::new(), kind: FieldKind::Secret }
    }

    fn toggle(label: &'static str) -> Self {
        Self { label, value: String::new(), kind: FieldKind::Toggle(false) }
    }

    fn choice(label: &'static str, options: Vec<FilterOption>) -> Self {
        Self { label, value: String::new(), kind: FieldKind::Choice(options, 0) }
    }

    pub fn is_editable_text(&self) -> bool {
        matches!(self.kind, FieldKind::Text | FieldKind::Secret)
    }

    /// The value submitted for this field.
    pub fn submitted(&self) -> String {
        match &self.kind {
            FieldKind::Text | FieldKind::Secret => self.value.clone(),
            FieldKind::Toggle(on) => on.to_string(),
            FieldKind::Choice(options, i) => options
                .get(*i)
                .map(|o| o.value.clone())
                .unwrap_or_default(),
        }
    }

    /// What the form shows for this field.
    pub fn display(&self) -> String {
        match &self.kind {
            FieldKind::Text => self.value.clone(),
            FieldKind::Secret => "*".repeat(self.value.chars().count()),
            FieldKind::Toggle(true) => "[x]".to_string(),
            FieldKind::Toggle(false) => "[ ]".to_string(),
            FieldKind::Choice(options, i) => match options.get(*i) {
                Some(option) => format!("< {} >", option.label),
                None => "(none available)".to_string(),
            },
        }
    }

    /// Flip a toggle or step through choices. Other fields ignore it.
    pub fn cycle(&mut self, forward: bool) {
        match &mut self.kind {
            FieldKind::Toggle(on) => *on = !*on,
            FieldKind::Choice(options, i) if !options.is_empty() => {
                let len = options.len();
                *i = if forward { (*i + 1) % len } else { (*i + len - 1) % len };
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
}

impl Form {
    pub fn new(kind: FormKind, provinces: &[FilterOption], cities: &[FilterOption]) -> Self {
        let fields = match kind {
            FormKind::AddProvince => vec![FormField::text("Province")],
            FormKind::AddCity => vec![
                FormField::choice("Province", provinces.to_vec()),
                FormField::text("City"),
            ],
            FormKind::AddVillage => vec![
                FormField::choice("City", cities.to_vec()),
                FormField::text("Village"),
            ],
            FormKind::AddUser => vec![
                FormField::text("Username"),
                FormField::secret("Password"),
                FormField::text("Full name"),
                FormField::text("Email"),
                FormField::text("Phone"),
                FormField::choice("Role", role_options()),
                FormField::toggle("Disabled"),
            ],
            FormKind::ChangePassword => vec![
                FormField::secret("Current"),
                FormField::secret("New"),
                FormField::secret("Confirm"),
            ],
        };

        Self { kind, fields, focus: 0, error: None }
    }

    pub fn focused(&self) -> Option<&FormField> {
        self.fields.get(self.focus)
    }

    pub fn focused_mut(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.focus)
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.focused_mut() {
            if field.is_editable_text() && can_add_field_char(field.value.chars().count(), c) {
                field.value.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.focused_mut() {
            if field.is_editable_text() {
                field.value.pop();
            }
        }
    }

    fn values(&self) -> Vec<String> {
        self.fields.iter().map(FormField::submitted).collect()
    }

    fn user_draft(&self) -> UserDraft {
        let v = self.values();
        UserDraft {
            username: v[0].clone(),
            password: v[1].clone(),
            fullname: v[2].clone(),
            email: v[3].clone(),
            phone_number: v[4].clone(),
            role: v[5].clone(),
            disabled: v[6] == "true",
        }
    }
}

fn role_options() -> Vec<FilterOption> {
    [Role::User, Role::Admin]
        .into_iter()
        .map(|role| FilterOption {
            value: role.id().to_string(),
            label: role.to_string(),
        })
        .collect()
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub state: AppState,
    pub config: Config,
    pub console: Console,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_remember: bool,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    /// Highlighted row per resource list
    pub selections: [usize; 4],
    pub search_input: String,
    pub form: Option<Form>,
    pub api_status: Option<ApiStatus>,
    pub status_message: Option<String>,

    events_tx: mpsc::Sender<AppEvent>,
    events_rx: mpsc::Receiver<AppEvent>,
    search_debounce: Debouncer,
}

impl App {
    pub fn new(config: Config, console: Console) -> Self {
        let (events_tx, events_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let search_debounce = Debouncer::new(config.search_quiet_period());

        Self {
            state: AppState::Normal,
            login_username: config.last_username.clone().unwrap_or_default(),
            login_password: String::new(),
            login_remember: config.remember_me,
            login_focus: LoginFocus::Username,
            login_error: None,
            selections: [0; 4],
            search_input: String::new(),
            form: None,
            api_status: None,
            status_message: None,
            events_tx,
            events_rx,
            search_debounce,
            config,
            console,
        }
    }

    pub fn section(&self) -> Section {
        self.console.state().section
    }

    /// The resource behind the current tab, if it is a list.
    pub fn current_kind(&self) -> Option<ResourceKind> {
        self.section().resource()
    }

    pub fn selection(&self, kind: ResourceKind) -> usize {
        self.selections[kind.index()]
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Decide between the main view and the login overlay at startup.
    pub async fn startup(&mut self) {
        match self.console.resume().await {
            Navigate::Main => self.enter_main().await,
            Navigate::Login => self.start_login(),
        }
    }

    /// Show the login overlay
    pub fn start_login(&mut self) {
        self.search_debounce.cancel();
        self.form = None;
        self.state = AppState::LoggingIn;
        self.login_password.clear();
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        let username = self.login_username.clone();
        let password = self.login_password.clone();

        match self.console.login(&username, &password, self.login_remember).await {
            Ok(_) => {
                self.login_password.clear();
                self.login_error = None;
                self.config.last_username = Some(username.trim().to_string());
                self.config.remember_me = self.login_remember;
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                info!("Login successful");
                self.enter_main().await;
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.login_error = Some(user_message(Operation::Login, &e));
            }
        }
    }

    pub async fn logout(&mut self) {
        self.console.logout().await;
        self.selections = [0; 4];
        self.search_input.clear();
        self.start_login();
    }

    /// The server no longer accepts the session: show why, then ask for a
    /// new login.
    fn session_lost(&mut self, message: String) {
        info!("Session rejected, returning to login");
        self.start_login();
        self.login_error = Some(message);
    }

    /// Fill the main view: dashboard counts, filter choices, the API probe
    /// and the list on the current tab.
    pub async fn enter_main(&mut self) {
        self.state = AppState::Normal;
        self.selections = [0; 4];
        self.search_input.clear();
        self.probe_status();

        if let Err(e) = self.console.refresh_counts().await {
            if self.report(Operation::Load(ResourceKind::Province), &e) {
                return;
            }
        }
        if let Err(e) = self.console.load_filter_options().await {
            if self.report(Operation::Load(ResourceKind::City), &e) {
                return;
            }
        }
        if let Some(kind) = self.current_kind() {
            self.spawn_load(kind, 1);
        }
    }

    /// Route an operation failure to the status line, or to the login
    /// overlay when the session is gone. Returns true in the latter case.
    fn report(&mut self, op: Operation, err: &ConsoleError) -> bool {
        let message = user_message(op, err);
        if err.requires_login() {
            self.session_lost(message);
            true
        } else {
            self.status_message = Some(message);
            false
        }
    }

    // =========================================================================
    // Background work
    // =========================================================================

    /// Start a list load on a spawned task; the result comes back through
    /// `check_background_tasks`.
    pub fn spawn_load(&mut self, kind: ResourceKind, page: u32) {
        let ticket = self.console.begin_load(kind, page);
        self.spawn_ticket(ticket);
    }

    fn spawn_ticket(&self, ticket: LoadTicket) {
        debug!(kind = %ticket.kind, version = ticket.version, page = ticket.query.page, "Spawning load");
        let api = self.console.api().clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let (ticket, result) = Console::finish_load(api, ticket).await;
            let _ = tx.send(AppEvent::Loaded(ticket, result)).await;
        });
    }

    fn probe_status(&self) {
        let api = self.console.api().clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let status = api.status().await;
            let _ = tx.send(AppEvent::Status(status)).await;
        });
    }

    /// Check for completed background tasks and process results
    pub async fn check_background_tasks(&mut self) {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }

        for event in events {
            self.process_event(event);
        }
    }

    fn process_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Loaded(ticket, result) => {
                let kind = ticket.kind;
                match self.console.apply_load(&ticket, result) {
                    Ok(true) => self.clamp_selection(kind),
                    Ok(false) => debug!(kind = %kind, version = ticket.version, "Dropped stale load"),
                    Err(e) => {
                        self.report(Operation::Load(kind), &ConsoleError::Api(e));
                    }
                }
            }
            AppEvent::SearchSettled(kind) => {
                if self.current_kind() == Some(kind) {
                    let search = self.search_input.clone();
                    self.console.state_mut().list_mut(kind).set_search(&search);
                    self.selections[kind.index()] = 0;
                    self.spawn_load(kind, 1);
                }
            }
            AppEvent::Status(status) => self.api_status = Some(status),
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn select_section(&mut self, section: Section) {
        if self.section() == section {
            return;
        }
        self.search_debounce.cancel();
        self.console.select(section);
        self.status_message = None;

        if let Some(kind) = section.resource() {
            self.search_input = self.console.state().list(kind).criteria().search.clone();
            let view = self.console.state().list(kind);
            if view.version() == 0 {
                self.spawn_load(kind, 1);
            }
        }
    }

    pub fn next_page(&mut self) {
        if let Some(kind) = self.current_kind() {
            let collection = self.console.state().list(kind).collection();
            if collection.has_next() {
                let page = collection.page() + 1;
                self.selections[kind.index()] = 0;
                self.spawn_load(kind, page);
            }
        }
    }

    pub fn prev_page(&mut self) {
        if let Some(kind) = self.current_kind() {
            let collection = self.console.state().list(kind).collection();
            if collection.has_previous() {
                let page = collection.page() - 1;
                self.selections[kind.index()] = 0;
                self.spawn_load(kind, page);
            }
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        if let Some(kind) = self.current_kind() {
            let len = self.console.state().list(kind).collection().items.len();
            if len == 0 {
                return;
            }
            let current = self.selections[kind.index()] as isize;
            self.selections[kind.index()] = (current + delta).clamp(0, len as isize - 1) as usize;
        }
    }

    fn clamp_selection(&mut self, kind: ResourceKind) {
        let len = self.console.state().list(kind).collection().items.len();
        let selection = &mut self.selections[kind.index()];
        *selection = (*selection).min(len.saturating_sub(1));
    }

    /// Typing in the search line restarts the quiet period.
    pub fn search_changed(&mut self) {
        let Some(kind) = self.current_kind() else {
            return;
        };
        let tx = self.events_tx.clone();
        self.search_debounce.schedule(async move {
            let _ = tx.send(AppEvent::SearchSettled(kind)).await;
        });
    }

    /// Apply the search immediately, skipping the quiet period.
    pub fn search_now(&mut self) {
        self.search_debounce.cancel();
        if let Some(kind) = self.current_kind() {
            self.process_event(AppEvent::SearchSettled(kind));
        }
    }

    /// Step the parent filter through "all" and each parent choice.
    pub fn cycle_filter(&mut self) {
        let Some(kind) = self.current_kind() else {
            return;
        };
        let Some(parent) = kind.parent() else {
            self.status_message = Some(format!("{} have no filter", kind.spec().plural));
            return;
        };

        let options = self.console.state().filter_options(parent).to_vec();
        let current = self.console.state().list(kind).criteria().parent_filter.clone();
        let next = match options.iter().position(|o| o.value == current) {
            _ if current.is_empty() => options.first(),
            Some(i) => options.get(i + 1),
            None => None,
        };
        let (value, label) = match next {
            Some(option) => (option.value.clone(), option.label.clone()),
            None => (String::new(), "all".to_string()),
        };

        self.console.state_mut().list_mut(kind).set_parent_filter(&value);
        self.status_message = Some(format!("{}: {}", parent.spec().singular, label));
        self.selections[kind.index()] = 0;
        self.spawn_load(kind, 1);
    }

    /// Name of the parent the current list is filtered to.
    pub fn filter_label(&self, kind: ResourceKind) -> Option<String> {
        let parent = kind.parent()?;
        let value = &self.console.state().list(kind).criteria().parent_filter;
        if value.is_empty() {
            return None;
        }
        let label = self
            .console
            .state()
            .filter_options(parent)
            .iter()
            .find(|o| &o.value == value)
            .map(|o| o.label.clone())
            .unwrap_or_else(|| value.clone());
        Some(label)
    }

    /// Reload the dashboard or the list on screen.
    pub async fn refresh(&mut self) {
        self.probe_status();
        match self.current_kind() {
            Some(kind) => {
                let ticket = self.console.begin_reload(kind);
                self.spawn_ticket(ticket);
            }
            None => {
                if let Err(e) = self.console.refresh_counts().await {
                    if self.report(Operation::Load(ResourceKind::Province), &e) {
                        return;
                    }
                }
                if let Err(e) = self.console.load_filter_options().await {
                    self.report(Operation::Load(ResourceKind::City), &e);
                }
            }
        }
    }

    // =========================================================================
    // Forms
    // =========================================================================

    pub fn open_form(&mut self, kind: FormKind) {
        let state = self.console.state();
        self.form = Some(Form::new(
            kind,
            state.filter_options(ResourceKind::Province),
            state.filter_options(ResourceKind::City),
        ));
        self.state = AppState::EditingForm;
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.state = AppState::Normal;
    }

    pub async fn submit_form(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let kind = form.kind;
        let values = form.values();

        let result = match kind {
            FormKind::AddProvince => self.console.create_province(&values[0]).await.map(|_| None),
            FormKind::AddCity => self.console.create_city(&values[1], &values[0]).await.map(|_| None),
            FormKind::AddVillage => self.console.create_village(&values[1], &values[0]).await.map(|_| None),
            FormKind::AddUser => {
                let draft = form.user_draft();
                self.console.create_user(&draft).await.map(|_| None)
            }
            FormKind::ChangePassword => self
                .console
                .change_password(&values[0], &values[1], &values[2])
                .await
                .map(Some),
        };

        match result {
            Ok(Some(Navigate::Login)) => {
                self.close_form();
                self.start_login();
                self.login_error = Some("Password changed. Please sign in again.".to_string());
            }
            Ok(_) => {
                self.close_form();
                self.status_message = Some(format!("{}: done", kind.title()));
            }
            Err(e) if e.requires_login() => {
                self.session_lost(user_message(kind.operation(), &e));
            }
            Err(e) => {
                let message = user_message(kind.operation(), &e);
                if let Some(form) = self.form.as_mut() {
                    form.error = Some(message);
                }
            }
        }
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Ask for confirmation before deleting the highlighted row.
    pub fn request_delete(&mut self) {
        let Some(kind) = self.current_kind() else {
            return;
        };
        let view = self.console.state().list(kind);
        let Some(record) = view.collection().items.get(self.selection(kind)) else {
            return;
        };
        let Some(id) = kind.record_id(record) else {
            self.status_message = Some(format!("This {} has no identifier to delete by", kind));
            return;
        };
        let label = kind.display_name(record);

        self.console.request_delete(kind, &id, &label);
        self.state = AppState::ConfirmingDelete;
    }

    pub fn cancel_delete(&mut self) {
        self.console.cancel_delete();
        self.state = AppState::Normal;
    }

    pub async fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        let kind = self.console.state().delete_intent().map(|i| i.kind);

        match self.console.confirm_delete().await {
            Ok(intent) => {
                self.clamp_selection(intent.kind);
                self.status_message = Some(format!("Deleted {} {}", intent.kind, intent.label));
            }
            Err(e) => {
                let op = Operation::Delete(kind.unwrap_or(ResourceKind::Province));
                self.report(op, &e);
            }
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && is_valid_input_char(c)
}

/// Build the app from configuration: durable session tier, HTTP client
/// and console.
pub fn build(config: Config) -> Result<App> {
    let session = std::sync::Arc::new(config.session_store()?);
    let api = config.api_client(session)?;
    let console = Console::new(api, config.page_size);
    Ok(App::new(config, console))
}

// ============================================================================
// Tests
// ============================================================================
