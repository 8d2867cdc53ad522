//! SQLite persistence for user state.

mod preferences;
mod schema;
mod types;

pub use schema::Database;
pub use types::{DatabaseError, JsonPreference};
