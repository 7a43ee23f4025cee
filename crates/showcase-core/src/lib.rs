//! Core types and trait definitions for the Showcase platform.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

pub mod actor;
pub mod chat;
pub mod error;
pub mod lifecycle;
pub mod moderation;
pub mod project;
pub mod store;
pub mod user;

pub use actor::{ActorContext, Authority, Role};
pub use error::{EntityKind, Error, Result, StoreError};
