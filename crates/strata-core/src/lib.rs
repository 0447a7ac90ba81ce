//! Core types and query logic for the Strata sample catalogue.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`gateway::QueryGateway`]; the HTTP layer drives a
//! [`catalog::Catalog`] built on top of one.

// Native `async fn` in traits; the gateway trait spells out `Send` itself.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod ident;
pub mod media;
pub mod query;
pub mod value;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
