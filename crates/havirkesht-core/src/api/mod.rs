//! REST API client module for the Havirkesht backend.
//!
//! This module provides the `ApiClient` for the province, city, village and
//! user endpoints, plus the token exchange used by the session store.
//!
//! Requests carry a bearer token from the `SessionStore`; a 401 on any
//! authenticated call clears the session before the error is returned.

pub mod client;
pub mod error;
pub mod request;
pub mod transport;

pub use client::{ApiClient, ApiStatus, DEFAULT_API_BASE_URL};
pub use error::ApiError;
pub use request::{ApiRequest, Method, QueryParams, RequestBody};
pub use transport::{PreparedRequest, RawResponse, ReqwestTransport, Transport, TransportError};
