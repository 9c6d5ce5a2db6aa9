//! Data models for the Havirkesht backend.
//!
//! - `ResourceKind`, `ResourceSpec`: the catalogue of listable resources
//! - `Record`, `Page`: list items and the paged list envelope
//! - Create payloads: `NewProvince`, `NewCity`, `NewVillage`, `NewUser`,
//!   `PasswordChange`

pub mod payload;
pub mod record;
pub mod resource;

pub use payload::{NewCity, NewProvince, NewUser, NewVillage, PasswordChange, Role};
pub use record::{FilterOption, Page, Record};
pub use resource::{Column, ColumnFormat, ResourceKind, ResourceSpec};
