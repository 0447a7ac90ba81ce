//! SQLite backend for the Strata sample catalogue.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod gateway;
mod schema;

pub mod error;

pub use error::{Error, Result};
pub use gateway::SqliteGateway;
pub use schema::SCHEMA;
