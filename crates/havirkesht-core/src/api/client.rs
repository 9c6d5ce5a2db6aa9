//! API client for the Havirkesht REST backend.
//!
//! `ApiClient` builds requests from the resource catalogue, attaches the
//! bearer token held by the `SessionStore` and classifies every failure
//! into an `ApiError`. It never retries.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::{SessionStore, TokenExchange, TokenResponse};
use crate::listing::ListQuery;
use crate::models::{FilterOption, NewUser, Page, PasswordChange, ResourceKind};

use super::request::{ApiRequest, QueryParams};
use super::transport::{PreparedRequest, Transport};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

pub const DEFAULT_API_BASE_URL: &str = "https://edu-api.havirkesht.ir";

/// OAuth2 password-grant client credentials expected by `/token`.
/// The secret is fixed and public; the backend does not treat it as a secret.
const CLIENT_ID: &str = "web-client";
const CLIENT_SECRET: &str = "secret-key";

/// Parent dropdowns fetch this many options in one request.
const FILTER_OPTIONS_PAGE_SIZE: u32 = 100;

/// Result of probing `GET /`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiStatus {
    Connected,
    HttpError(u16),
    Unreachable,
}

impl ApiStatus {
    pub fn label(&self) -> String {
        match self {
            ApiStatus::Connected => "Connected".to_string(),
            ApiStatus::HttpError(status) => format!("HTTP {}", status),
            ApiStatus::Unreachable => "Unreachable".to_string(),
        }
    }
}

/// Clone is cheap: the transport and session are shared.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    // ========================================================================
    // Request pipeline
    // ========================================================================

    /// Send one request and classify the outcome.
    pub async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = request.url(&self.base_url)?;

        let bearer = if request.authenticated {
            match self.session.current_token() {
                Some(credential) => Some(credential.access_token),
                None => {
                    warn!(path = %request.path, "No access token for authenticated request");
                    self.session.clear();
                    return Err(ApiError::AuthInvalid);
                }
            }
        } else {
            None
        };

        debug!(method = request.method.as_str(), url = %url, "API request");

        let prepared = PreparedRequest {
            method: request.method,
            url,
            bearer,
            body: request.body,
        };

        let response = self.transport.execute(prepared).await.map_err(|e| {
            warn!(path = %request.path, error = %e, "Request failed before a response");
            ApiError::Network(e.0)
        })?;

        let status = response.status;
        if status == 401 {
            if request.authenticated {
                warn!(path = %request.path, "Access token rejected, clearing session");
                self.session.clear();
            }
            return Err(ApiError::AuthInvalid);
        }

        if !(200..300).contains(&status) {
            let err = ApiError::from_status(status, &response.body);
            warn!(path = %request.path, status, error = %err, "API error response");
            return Err(err);
        }

        match serde_json::from_str::<Value>(&response.body) {
            Ok(value) => Ok(value),
            Err(_) if status == 204 || status == 201 || response.body.trim().is_empty() => {
                Ok(Value::Null)
            }
            Err(e) => Err(ApiError::Unknown {
                status: Some(status),
                message: format!("Invalid response body: {}", e),
            }),
        }
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Exchange username and password for tokens. Does not touch the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let request = ApiRequest::post("/token")
            .form(&[
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
                ("scope", ""),
                ("client_id", CLIENT_ID),
                ("client_secret", CLIENT_SECRET),
            ])
            .unauthenticated();

        let tokens = parse_tokens(self.execute(request).await?)?;
        info!(username = %username, "Login accepted");
        Ok(tokens)
    }

    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse, ApiError> {
        let request = ApiRequest::post("/refresh-token")
            .query(QueryParams::new().with("refresh_token", refresh_token))
            .unauthenticated();

        parse_tokens(self.execute(request).await?)
    }

    /// Tell the server, ignore the outcome, then clear the session.
    pub async fn logout(&self) {
        if let Some(credential) = self.session.current_token() {
            let request = ApiRequest::post("/logout")
                .query(QueryParams::new().with("access_token", &credential.access_token))
                .unauthenticated();
            if let Err(e) = self.execute(request).await {
                debug!(error = %e, "Server-side logout failed");
            }
        }
        self.session.clear();
    }

    // ========================================================================
    // Resources
    // ========================================================================

    pub async fn list(&self, kind: ResourceKind, query: &ListQuery) -> Result<Page, ApiError> {
        let request = ApiRequest::get(kind.endpoint()).query(query.to_params(kind));
        decode_page(self.execute(request).await?)
    }

    /// Total number of records, fetched with a one-item page.
    pub async fn count(&self, kind: ResourceKind) -> Result<u64, ApiError> {
        let request = ApiRequest::get(kind.endpoint()).query(QueryParams::new().with("size", 1));
        Ok(decode_page(self.execute(request).await?)?.total.unwrap_or(0))
    }

    /// Choices for a parent-filter dropdown.
    pub async fn filter_options(&self, kind: ResourceKind) -> Result<Vec<FilterOption>, ApiError> {
        let request = ApiRequest::get(kind.endpoint())
            .query(QueryParams::new().with("size", FILTER_OPTIONS_PAGE_SIZE));
        let page = decode_page(self.execute(request).await?)?;

        Ok(page
            .items
            .iter()
            .filter_map(|record| {
                let value = kind.option_value(record)?;
                Some(FilterOption {
                    value,
                    label: kind.display_name(record),
                })
            })
            .collect())
    }

    pub async fn create<B: Serialize + ?Sized>(&self, kind: ResourceKind, body: &B) -> Result<Value, ApiError> {
        let request = ApiRequest::post(kind.endpoint()).json(body)?;
        self.execute(request).await
    }

    /// Delete by name (geography) or numeric id (users). The identifier is
    /// percent-encoded as a single path segment.
    pub async fn delete(&self, kind: ResourceKind, id: &str) -> Result<(), ApiError> {
        let request = ApiRequest::delete(kind.endpoint()).segment(id);
        self.execute(request).await?;
        Ok(())
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<Value, ApiError> {
        let request = ApiRequest::post("/users/admin/").json(user)?;
        self.execute(request).await
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ApiError> {
        let request = ApiRequest::post("/changepassword/").json(change)?;
        self.execute(request).await?;
        Ok(())
    }

    /// Probe the API root. Never fails; unreachable is a status.
    pub async fn status(&self) -> ApiStatus {
        let request = ApiRequest::get("/").unauthenticated();
        match self.execute(request).await {
            Ok(_) => ApiStatus::Connected,
            Err(ApiError::Network(_)) => ApiStatus::Unreachable,
            Err(e) => match e.status() {
                Some(status) => ApiStatus::HttpError(status),
                None => ApiStatus::Unreachable,
            },
        }
    }
}

#[async_trait]
impl TokenExchange for ApiClient {
    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, ApiError> {
        self.refresh_access_token(refresh_token).await
    }
}

fn parse_tokens(value: Value) -> Result<TokenResponse, ApiError> {
    let tokens: TokenResponse = serde_json::from_value(value).map_err(|e| ApiError::Unknown {
        status: None,
        message: format!("Invalid token response: {}", e),
    })?;

    if tokens.access_token.is_empty() {
        return Err(ApiError::Unknown {
            status: None,
            message: "Token response has no access token".to_string(),
        });
    }
    Ok(tokens)
}

fn decode_page(value: Value) -> Result<Page, ApiError> {
    Page::from_value(value).map_err(|e| ApiError::Unknown {
        status: None,
        message: format!("Invalid list response: {}", e),
    })
}
