//! Data models for the QR menu backend.
//!
//! Field names serialize in camelCase to match the menu and admin web clients.

mod analytics;
mod category;
mod datastore;
mod dish;
mod ingredient;
mod locale;
mod order;
mod user;

pub use analytics::*;
pub use category::*;
pub use datastore::*;
pub use dish::*;
pub use ingredient::*;
pub use locale::*;
pub use order::*;
pub use user::*;

/// Current time in the fixed-width RFC 3339 form used for every stored timestamp.
pub fn now_timestamp() -> String {
    format_timestamp(chrono::Utc::now())
}

pub fn format_timestamp(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
