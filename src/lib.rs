//! Todoserv - Todo backend core
//!
//! Authenticated, per-user todo storage with cursor-paginated listing over
//! a timestamp-prefixed composite sort key, and a change-stream pipeline
//! that keeps a per-user search index eventually consistent with the
//! primary store.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod cursor;
pub mod error;
pub mod index;
pub mod model;
pub mod service;
pub mod store;
pub mod stream;

pub use error::{ErrorKind, Result, TodoError};
pub use service::TodoService;
