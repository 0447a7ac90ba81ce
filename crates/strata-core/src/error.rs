//! Error types for `strata-core`.

use std::time::Duration;

use thiserror::Error;

/// A boxed error crossing the gateway boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The primary record of a detail lookup does not exist.
  #[error("{entity} not found: {key}")]
  NotFound { entity: &'static str, key: String },

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  /// A secondary media lookup failed. Detail and listing assembly recover
  /// from this; it never reaches a client on its own.
  #[error("media resolution failed: {0}")]
  Media(#[source] BoxError),

  #[error("column {column:?}: {reason}")]
  Decode { column: String, reason: String },

  #[error("request deadline of {0:?} exceeded")]
  DeadlineExceeded(Duration),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub(crate) fn decode(column: &str, reason: impl Into<String>) -> Self {
    Self::Decode { column: column.to_owned(), reason: reason.into() }
  }

  /// Reclassify an error raised while resolving media.
  pub(crate) fn into_media(self) -> Self {
    match self {
      Self::Media(e) | Self::Store(e) => Self::Media(e),
      other => Self::Media(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
