pub mod dashboard;
pub mod listing;
