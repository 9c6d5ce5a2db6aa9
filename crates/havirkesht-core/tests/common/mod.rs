//! Shared harness: a console wired to in-memory storage tiers and a
//! scripted transport that answers by method and path.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use havirkesht_core::api::{
    ApiClient, Method, PreparedRequest, RawResponse, RequestBody, Transport, TransportError,
};
use havirkesht_core::auth::{Clock, KeyValueStore, MemoryStore, SessionStore, TokenResponse};
use havirkesht_core::Console;

struct Rule {
    method: Method,
    path: String,
    response: Result<RawResponse, TransportError>,
}

/// Each rule answers one request; rules for the same route are used in
/// the order they were added. Unmatched requests fail as network errors.
#[derive(Default)]
pub struct ScriptedTransport {
    rules: Mutex<Vec<Rule>>,
    seen: Mutex<Vec<PreparedRequest>>,
}

impl ScriptedTransport {
    pub fn on(&self, method: Method, path: &str, status: u16, body: &str) -> &Self {
        self.rules.lock().unwrap().push(Rule {
            method,
            path: path.to_string(),
            response: Ok(RawResponse::new(status, body)),
        });
        self
    }

    pub fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.rules.lock().unwrap().push(Rule {
            method,
            path: path.to_string(),
            response: Err(TransportError(message.to_string())),
        });
        self
    }

    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.seen.lock().unwrap().clone()
    }

    /// `METHOD /path?query` for every request seen, in order.
    pub fn log(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| match r.url.query() {
                Some(q) => format!("{} {}?{}", r.method.as_str(), r.url.path(), q),
                None => format!("{} {}", r.method.as_str(), r.url.path()),
            })
            .collect()
    }

    pub fn form_field(&self, index: usize, name: &str) -> Option<String> {
        let requests = self.requests();
        match &requests.get(index)?.body {
            RequestBody::Form(fields) => fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    pub fn json_body(&self, index: usize) -> Option<serde_json::Value> {
        match &self.requests().get(index)?.body {
            RequestBody::Json(value) => Some(value.clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: PreparedRequest) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());

        let mut rules = self.rules.lock().unwrap();
        let position = rules
            .iter()
            .position(|rule| rule.method == request.method && rule.path == request.url.path());
        match position {
            Some(i) => rules.remove(i).response,
            None => Err(TransportError(format!("unscripted {}", request.url))),
        }
    }
}

pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

pub struct Harness {
    pub console: Console,
    pub transport: Arc<ScriptedTransport>,
    pub session: Arc<SessionStore>,
    pub durable: Arc<MemoryStore>,
    pub ephemeral: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        let durable = Arc::new(MemoryStore::new());
        let ephemeral = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock(Mutex::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        )));
        let session = Arc::new(SessionStore::with_clock(
            durable.clone(),
            ephemeral.clone(),
            clock.clone(),
        ));
        let transport = Arc::new(ScriptedTransport::default());
        let api = ApiClient::new("https://api.test", transport.clone(), session.clone());

        Self {
            console: Console::new(api, 10),
            transport,
            session,
            durable,
            ephemeral,
            clock,
        }
    }

    /// A harness whose session already holds a token.
    pub fn logged_in() -> Self {
        let harness = Self::new();
        harness.session.save(
            "admin",
            &TokenResponse {
                access_token: "live-token".to_string(),
                refresh_token: Some("refresh-1".to_string()),
                expires_in: Some(3600),
                token_type: Some("bearer".to_string()),
            },
            true,
        );
        harness
    }

    pub fn durable_value(&self, key: &str) -> Option<String> {
        self.durable.get(key).unwrap()
    }

    pub fn ephemeral_value(&self, key: &str) -> Option<String> {
        self.ephemeral.get(key).unwrap()
    }
}

pub fn list_body(names: &[&str], total: u64) -> String {
    let items: Vec<serde_json::Value> = names
        .iter()
        .map(|name| serde_json::json!({ "name": name, "created_at": "2024-04-01T00:00:00Z" }))
        .collect();
    serde_json::json!({ "items": items, "total": total }).to_string()
}
