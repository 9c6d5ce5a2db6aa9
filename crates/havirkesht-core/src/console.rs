//! Application state and the workflows that drive it.
//!
//! `Console` owns the `ApiClient` and an explicit `AdminState`: one list
//! view per resource, the dashboard counts, the current section, the
//! pending delete intent and the parent-filter choices. Front ends call
//! these operations and render `state()`; nothing here draws.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::SessionError;
use crate::listing::{ListView, LoadTicket, DEFAULT_PAGE_SIZE};
use crate::models::{
    FilterOption, NewCity, NewProvince, NewUser, NewVillage, Page, PasswordChange, ResourceKind,
    Role,
};

/// Shortest password accepted by the backend.
const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Dashboard,
    Provinces,
    Cities,
    Villages,
    Users,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Dashboard,
        Section::Provinces,
        Section::Cities,
        Section::Villages,
        Section::Users,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Provinces => "Provinces",
            Section::Cities => "Cities",
            Section::Villages => "Villages",
            Section::Users => "Users",
        }
    }

    pub fn resource(&self) -> Option<ResourceKind> {
        match self {
            Section::Dashboard => None,
            Section::Provinces => Some(ResourceKind::Province),
            Section::Cities => Some(ResourceKind::City),
            Section::Villages => Some(ResourceKind::Village),
            Section::Users => Some(ResourceKind::User),
        }
    }

    pub fn for_resource(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Province => Section::Provinces,
            ResourceKind::City => Section::Cities,
            ResourceKind::Village => Section::Villages,
            ResourceKind::User => Section::Users,
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Where the front end should go after an authentication step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigate {
    Main,
    Login,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// Rejected locally, nothing was sent
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Nothing is awaiting deletion")]
    NoDeleteIntent,
}

impl ConsoleError {
    fn invalid(message: &str) -> Self {
        ConsoleError::Invalid(message.to_string())
    }

    /// The session is gone and the user has to sign in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, ConsoleError::Api(ApiError::AuthInvalid))
    }
}

/// A delete the user asked for but has not confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteIntent {
    pub kind: ResourceKind,
    pub id: String,
    pub label: String,
}

/// Raw add-user form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDraft {
    pub username: String,
    pub password: String,
    pub fullname: String,
    pub email: String,
    pub phone_number: String,
    pub role: String,
    pub disabled: bool,
}

impl UserDraft {
    pub fn validate(&self) -> Result<NewUser, ConsoleError> {
        let username = self.username.trim();
        let fullname = self.fullname.trim();
        let email = self.email.trim();

        if username.is_empty() || self.password.is_empty() || fullname.is_empty() || email.is_empty() {
            return Err(ConsoleError::invalid("Please fill in all required fields."));
        }
        if self.role.trim().is_empty() {
            return Err(ConsoleError::invalid("Please choose a role for the user."));
        }
        let role: Role = self.role.parse().map_err(ConsoleError::Invalid)?;
        check_password_length(&self.password)?;
        if !is_valid_email(email) {
            return Err(ConsoleError::invalid("The email address is not valid."));
        }

        let phone = self.phone_number.trim();
        Ok(NewUser {
            username: username.to_string(),
            password: self.password.clone(),
            fullname: fullname.to_string(),
            email: email.to_string(),
            phone_number: (!phone.is_empty()).then(|| phone.to_string()),
            role_id: role.id(),
            disabled: self.disabled,
        })
    }
}

fn check_password_length(password: &str) -> Result<(), ConsoleError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ConsoleError::invalid("Password must be at least 6 characters."));
    }
    Ok(())
}

/// `local@domain.tld` shape: one `@`, no whitespace, and a dot inside the
/// domain with something on both sides of it.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Everything the screens render.
#[derive(Debug, Clone)]
pub struct AdminState {
    lists: [ListView; 4],
    counts: [Option<u64>; 4],
    pub section: Section,
    delete_intent: Option<DeleteIntent>,
    province_options: Vec<FilterOption>,
    city_options: Vec<FilterOption>,
}

impl AdminState {
    pub fn new(page_size: u32) -> Self {
        Self {
            lists: ResourceKind::ALL.map(|kind| ListView::new(kind, page_size)),
            counts: [None; 4],
            section: Section::Dashboard,
            delete_intent: None,
            province_options: Vec::new(),
            city_options: Vec::new(),
        }
    }

    pub fn list(&self, kind: ResourceKind) -> &ListView {
        &self.lists[kind.index()]
    }

    pub fn list_mut(&mut self, kind: ResourceKind) -> &mut ListView {
        &mut self.lists[kind.index()]
    }

    /// Dashboard count, `None` until the first successful fetch.
    pub fn count(&self, kind: ResourceKind) -> Option<u64> {
        self.counts[kind.index()]
    }

    pub fn delete_intent(&self) -> Option<&DeleteIntent> {
        self.delete_intent.as_ref()
    }

    /// Parent choices for filtering `kind`'s list.
    pub fn filter_options(&self, kind: ResourceKind) -> &[FilterOption] {
        match kind.parent() {
            Some(ResourceKind::Province) => &self.province_options,
            Some(ResourceKind::City) => &self.city_options,
            _ => &[],
        }
    }
}

impl Default for AdminState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

pub struct Console {
    api: ApiClient,
    state: AdminState,
    page_size: u32,
}

impl Console {
    pub fn new(api: ApiClient, page_size: u32) -> Self {
        Self {
            api,
            state: AdminState::new(page_size),
            page_size,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> &AdminState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AdminState {
        &mut self.state
    }

    pub fn select(&mut self, section: Section) {
        self.state.section = section;
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Startup check: reuse a fresh session, refresh a stale one, or ask
    /// for a login.
    pub async fn resume(&mut self) -> Navigate {
        let session = self.api.session().clone();

        let Some(credential) = session.current_token() else {
            session.clear();
            return Navigate::Login;
        };

        if credential.is_fresh_at(session.now()) {
            debug!("Stored session is fresh");
            return Navigate::Main;
        }

        match session.refresh(&self.api).await {
            Ok(_) => Navigate::Main,
            Err(SessionError::NoRefreshToken) => {
                info!("Stored session expired without a refresh token");
                session.clear();
                Navigate::Login
            }
            Err(SessionError::RefreshFailed(e)) if refresh_rejected(&e) => {
                warn!(error = %e, "Stored refresh token was rejected");
                session.clear();
                Navigate::Login
            }
            Err(e) => {
                // The server never judged the token; it is tried again next start.
                warn!(error = %e, "Could not refresh stored session, keeping it");
                Navigate::Login
            }
        }
    }

    pub async fn login(&mut self, username: &str, password: &str, remember: bool) -> Result<Navigate, ConsoleError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ConsoleError::invalid("Please enter both username and password."));
        }

        let tokens = self.api.login(username, password).await?;
        self.api.session().save(username, &tokens, remember);
        self.state = AdminState::new(self.page_size);
        Ok(Navigate::Main)
    }

    pub async fn logout(&mut self) {
        self.api.logout().await;
        self.state = AdminState::new(self.page_size);
        info!("Logged out");
    }

    /// The user behind the current session, for greetings.
    pub fn username(&self) -> Option<String> {
        self.api.session().username()
    }

    // ========================================================================
    // Lists
    // ========================================================================

    /// Stamp a new load of `kind` at `page`. Run `finish_load` elsewhere and
    /// hand the result back to `apply_load`.
    pub fn begin_load(&mut self, kind: ResourceKind, page: u32) -> LoadTicket {
        self.state.list_mut(kind).begin(page)
    }

    pub fn begin_reload(&mut self, kind: ResourceKind) -> LoadTicket {
        self.state.list_mut(kind).begin_reload()
    }

    /// The network half of a load. Owns its inputs so it can be spawned.
    pub async fn finish_load(api: ApiClient, ticket: LoadTicket) -> (LoadTicket, Result<Page, ApiError>) {
        let result = api.list(ticket.kind, &ticket.query).await;
        (ticket, result)
    }

    /// Apply a finished load. Returns false when a newer load superseded it.
    pub fn apply_load(&mut self, ticket: &LoadTicket, result: Result<Page, ApiError>) -> Result<bool, ApiError> {
        let view = self.state.list_mut(ticket.kind);
        match result {
            Ok(page) => Ok(view.apply(ticket, page)),
            Err(e) => {
                if view.fail(ticket, e.message()) {
                    Err(e)
                } else {
                    Ok(false)
                }
            }
        }
    }

    pub async fn load(&mut self, kind: ResourceKind, page: u32) -> Result<(), ConsoleError> {
        let ticket = self.begin_load(kind, page);
        let (ticket, result) = Self::finish_load(self.api.clone(), ticket).await;
        self.apply_load(&ticket, result)?;
        Ok(())
    }

    /// Reload the page on screen with the current search and filter.
    pub async fn reload(&mut self, kind: ResourceKind) -> Result<(), ConsoleError> {
        let page = self.state.list(kind).criteria().page;
        self.load(kind, page).await
    }

    pub async fn refresh_count(&mut self, kind: ResourceKind) -> Result<u64, ConsoleError> {
        let total = self.api.count(kind).await?;
        self.state.counts[kind.index()] = Some(total);
        Ok(total)
    }

    /// Fetch all four dashboard counts concurrently. Successful counts are
    /// stored even when others fail; the first failure is returned.
    pub async fn refresh_counts(&mut self) -> Result<(), ConsoleError> {
        let api = &self.api;
        let (provinces, cities, villages, users) = futures::join!(
            api.count(ResourceKind::Province),
            api.count(ResourceKind::City),
            api.count(ResourceKind::Village),
            api.count(ResourceKind::User),
        );

        let mut first_error = None;
        for (kind, result) in ResourceKind::ALL.into_iter().zip([provinces, cities, villages, users]) {
            match result {
                Ok(total) => self.state.counts[kind.index()] = Some(total),
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Failed to load count");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Load province and city choices for the parent filters.
    pub async fn load_filter_options(&mut self) -> Result<(), ConsoleError> {
        let (provinces, cities) = futures::join!(
            self.api.filter_options(ResourceKind::Province),
            self.api.filter_options(ResourceKind::City),
        );
        self.state.province_options = provinces?;
        self.state.city_options = cities?;
        Ok(())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn create_province(&mut self, name: &str) -> Result<(), ConsoleError> {
        let name = required(name, "Please enter a province name.")?;
        self.create(ResourceKind::Province, &NewProvince { province: name.to_string() }).await
    }

    pub async fn create_city(&mut self, name: &str, province: &str) -> Result<(), ConsoleError> {
        let province = required(province, "Please choose a province.")?;
        let name = required(name, "Please enter a city name.")?;
        self.create(ResourceKind::City, &NewCity::new(name, province)).await
    }

    pub async fn create_village(&mut self, name: &str, city: &str) -> Result<(), ConsoleError> {
        let city = required(city, "Please choose a city.")?;
        let name = required(name, "Please enter a village name.")?;
        self.create(ResourceKind::Village, &NewVillage::new(name, city)).await
    }

    pub async fn create_user(&mut self, draft: &UserDraft) -> Result<(), ConsoleError> {
        let user = draft.validate()?;
        self.api.create_user(&user).await?;
        info!(username = %user.username, "User created");
        self.after_mutation(ResourceKind::User).await?;
        Ok(())
    }

    async fn create<B: Serialize>(&mut self, kind: ResourceKind, body: &B) -> Result<(), ConsoleError> {
        self.api.create(kind, body).await?;
        info!(kind = %kind, "Record created");
        self.after_mutation(kind).await?;
        Ok(())
    }

    pub fn request_delete(&mut self, kind: ResourceKind, id: &str, label: &str) {
        self.state.delete_intent = Some(DeleteIntent {
            kind,
            id: id.to_string(),
            label: label.to_string(),
        });
    }

    pub fn cancel_delete(&mut self) {
        self.state.delete_intent = None;
    }

    /// Consume the pending intent and delete. The intent is gone afterwards
    /// whether or not the server accepted it.
    pub async fn confirm_delete(&mut self) -> Result<DeleteIntent, ConsoleError> {
        let intent = self
            .state
            .delete_intent
            .take()
            .ok_or(ConsoleError::NoDeleteIntent)?;

        self.api.delete(intent.kind, &intent.id).await?;
        info!(kind = %intent.kind, id = %intent.id, "Record deleted");
        self.after_mutation(intent.kind).await?;
        Ok(intent)
    }

    /// Reload the list on screen and its count. The mutation stands either
    /// way; only a lost session is reported, other failures are logged.
    async fn after_mutation(&mut self, kind: ResourceKind) -> Result<(), ConsoleError> {
        if let Err(e) = self.reload(kind).await {
            if e.requires_login() {
                return Err(e);
            }
            warn!(kind = %kind, error = %e, "Reload after change failed");
        }
        if let Err(e) = self.refresh_count(kind).await {
            if e.requires_login() {
                return Err(e);
            }
            warn!(kind = %kind, error = %e, "Count refresh after change failed");
        }
        Ok(())
    }

    /// Change the password, then end the session so the user signs in with
    /// the new one.
    pub async fn change_password(&mut self, current: &str, new: &str, confirm: &str) -> Result<Navigate, ConsoleError> {
        if current.is_empty() || new.is_empty() || confirm.is_empty() {
            return Err(ConsoleError::invalid("Please fill in all fields."));
        }
        if new != confirm {
            return Err(ConsoleError::invalid("The new password and its confirmation do not match."));
        }
        check_password_length(new)?;

        self.api
            .change_password(&PasswordChange {
                current_password: current.to_string(),
                new_password: new.to_string(),
            })
            .await?;

        info!("Password changed, ending session");
        self.logout().await;
        Ok(Navigate::Login)
    }
}

/// The server looked at the refresh token and said no. Transport failures
/// and server errors say nothing about the token.
fn refresh_rejected(err: &ApiError) -> bool {
    matches!(err, ApiError::AuthInvalid | ApiError::Validation { .. })
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str, ConsoleError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ConsoleError::invalid(message))
    } else {
        Ok(value)
    }
}
