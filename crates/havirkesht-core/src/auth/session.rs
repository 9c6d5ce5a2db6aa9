use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::storage::KeyValueStore;
use crate::api::ApiError;

const ACCESS_TOKEN_KEY: &str = "havirkesht_token";
const REFRESH_TOKEN_KEY: &str = "havirkesht_refresh_token";
const USERNAME_KEY: &str = "havirkesht_username";
const EXPIRY_KEY: &str = "havirkesht_token_expiry";

const ALL_KEYS: [&str; 4] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USERNAME_KEY, EXPIRY_KEY];

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Buffer time before expiry after which a token is no longer fresh (5 minutes)
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

/// Body returned by `/token` and `/refresh-token`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// A credential without a recorded expiry is treated as fresh; the
    /// backend still rejects it with 401, which tears the session down.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now < expires_at - Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES),
            None => true,
        }
    }

    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at.map(|expires_at| expires_at - now)
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.time_until_expiry(now).map(|d| d.num_minutes().max(0))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Token refresh was rejected: {0}")]
    RefreshFailed(#[source] ApiError),
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The network half of a token refresh. Implemented by `ApiClient`.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, ApiError>;
}

/// Single owner of the two storage tiers.
///
/// The live access token sits in exactly one tier: durable when the user
/// asked to be remembered, ephemeral otherwise. Refresh token, username and
/// expiry only ever go to the durable tier. Storage failures are logged and
/// swallowed so a broken keychain or full disk never blocks the console.
pub struct SessionStore {
    durable: Arc<dyn KeyValueStore>,
    ephemeral: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(durable: Arc<dyn KeyValueStore>, ephemeral: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(durable, ephemeral, Arc::new(SystemClock))
    }

    pub fn with_clock(
        durable: Arc<dyn KeyValueStore>,
        ephemeral: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            durable,
            ephemeral,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Persist a successful login.
    pub fn save(&self, username: &str, response: &TokenResponse, remember: bool) {
        let (live, other) = if remember {
            (&self.durable, &self.ephemeral)
        } else {
            (&self.ephemeral, &self.durable)
        };

        write(live.as_ref(), ACCESS_TOKEN_KEY, &response.access_token);
        remove(other.as_ref(), ACCESS_TOKEN_KEY);

        write(self.durable.as_ref(), USERNAME_KEY, username);
        if let Some(ref refresh_token) = response.refresh_token {
            write(self.durable.as_ref(), REFRESH_TOKEN_KEY, refresh_token);
        }
        self.store_expiry(response.expires_in);

        info!(username = %username, remember, "Session saved");
    }

    /// The live credential, durable tier first.
    pub fn current_token(&self) -> Option<Credential> {
        let access_token = read(self.durable.as_ref(), ACCESS_TOKEN_KEY)
            .or_else(|| read(self.ephemeral.as_ref(), ACCESS_TOKEN_KEY))?;

        Some(Credential {
            access_token,
            refresh_token: read(self.durable.as_ref(), REFRESH_TOKEN_KEY),
            expires_at: self.expires_at(),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_token().is_some()
    }

    pub fn is_fresh(&self) -> bool {
        self.current_token()
            .map(|c| c.is_fresh_at(self.clock.now()))
            .unwrap_or(false)
    }

    pub fn username(&self) -> Option<String> {
        read(self.durable.as_ref(), USERNAME_KEY)
    }

    /// Remove every session key from both tiers. Safe to call repeatedly.
    pub fn clear(&self) {
        for key in ALL_KEYS {
            remove(self.durable.as_ref(), key);
            remove(self.ephemeral.as_ref(), key);
        }
        debug!("Session cleared");
    }

    /// Swap the refresh token for a new access token, keeping the live
    /// token in whichever tier already holds it.
    pub async fn refresh(&self, exchange: &dyn TokenExchange) -> Result<String, SessionError> {
        let refresh_token =
            read(self.durable.as_ref(), REFRESH_TOKEN_KEY).ok_or(SessionError::NoRefreshToken)?;

        let response = exchange
            .exchange_refresh_token(&refresh_token)
            .await
            .map_err(|e| {
                warn!(error = %e, "Token refresh failed");
                SessionError::RefreshFailed(e)
            })?;

        let live = if read(self.durable.as_ref(), ACCESS_TOKEN_KEY).is_some() {
            &self.durable
        } else {
            &self.ephemeral
        };
        write(live.as_ref(), ACCESS_TOKEN_KEY, &response.access_token);

        if let Some(ref new_refresh) = response.refresh_token {
            write(self.durable.as_ref(), REFRESH_TOKEN_KEY, new_refresh);
        }
        self.store_expiry(response.expires_in);

        info!("Access token refreshed");
        Ok(response.access_token)
    }

    fn store_expiry(&self, expires_in: Option<i64>) {
        let expires_in = expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expires_at = self.clock.now() + Duration::seconds(expires_in);
        write(
            self.durable.as_ref(),
            EXPIRY_KEY,
            &expires_at.timestamp_millis().to_string(),
        );
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = read(self.durable.as_ref(), EXPIRY_KEY)?;
        match raw.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis) {
            Some(expires_at) => Some(expires_at),
            None => {
                // Unreadable expiry counts as already expired
                warn!(value = %raw, "Stored token expiry is not a timestamp");
                Some(DateTime::UNIX_EPOCH)
            }
        }
    }
}

fn read(tier: &dyn KeyValueStore, key: &str) -> Option<String> {
    match tier.get(key) {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            warn!(key, error = %e, "Failed to read session storage");
            None
        }
    }
}

fn write(tier: &dyn KeyValueStore, key: &str, value: &str) {
    if let Err(e) = tier.set(key, value) {
        warn!(key, error = %e, "Failed to write session storage");
    }
}

fn remove(tier: &dyn KeyValueStore, key: &str) {
    if let Err(e) = tier.remove(key) {
        warn!(key, error = %e, "Failed to clear session storage");
    }
}
