//! Authentication module for managing the console session.
//!
//! This module provides:
//! - `SessionStore`: token lifecycle over a durable and an ephemeral tier
//! - `KeyValueStore`: the storage seam, with `MemoryStore` and `FileStore`
//! - `KeyringStore`: an OS keychain backend for the durable tier
//!
//! Tokens are considered stale 5 minutes before the server-reported expiry.

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::KeyringStore;
pub use session::{
    Clock, Credential, SessionError, SessionStore, SystemClock, TokenExchange, TokenResponse,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
