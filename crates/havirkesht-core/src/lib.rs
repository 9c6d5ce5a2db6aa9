//! Core library for the Havirkesht admin console.
//!
//! This crate owns everything the console needs that is not drawing:
//!
//! - `auth`: the session store, its two storage tiers and token freshness
//! - `api`: the REST client, request construction and error classification
//! - `models`: the resource catalogue, list records and create payloads
//! - `listing`: paged collections with versioned loads
//! - `debounce`: cancel-and-replace timers for search input
//! - `console`: the application state and the workflows that drive it
//! - `messages`: user-facing wording layered over the error taxonomy
//! - `config`: persisted settings and directory locations

pub mod api;
pub mod auth;
pub mod config;
pub mod console;
pub mod debounce;
pub mod listing;
pub mod messages;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{Credential, SessionStore, TokenResponse};
pub use config::Config;
pub use console::{Console, ConsoleError, Navigate, Section};
pub use models::ResourceKind;
