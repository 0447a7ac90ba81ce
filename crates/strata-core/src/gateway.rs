//! The `QueryGateway` trait: the only store collaborator the core consumes.
//!
//! A gateway executes one parameterised statement and returns every result
//! row as an ordered column → value mapping. Connection lifecycle, driver
//! choice and transport are the implementor's business.

use std::future::Future;

use crate::value::{Row, SqlValue};

/// Abstraction over a relational store that can run read queries.
///
/// Parameters are positional (`?`) and bound in order. Implementations must
/// release whatever connection they use before the returned future
/// resolves, on success and on error alike.
pub trait QueryGateway: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn execute(
    &self,
    sql: String,
    params: Vec<SqlValue>,
  ) -> impl Future<Output = Result<Vec<Row>, Self::Error>> + Send + '_;
}
