//! SQLite backend for the Showcase platform.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteStore`] is opened per
//! process (or per test) and cloned into whoever needs it.

mod chats;
mod encode;
mod moderation;
mod projects;
mod schema;
mod store;
mod users;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
