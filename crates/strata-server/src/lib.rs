//! HTTP server assembly for Strata.
//!
//! Mounts the JSON API under `/api` with permissive CORS and per-request
//! tracing.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::Router;
use serde::Deserialize;
use strata_core::{
  catalog::{Catalog, CatalogOptions},
  gateway::QueryGateway,
};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `STRATA_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  /// Deadline for the primary fetch of one read, in milliseconds.
  pub request_timeout_ms:   u64,
  /// Deadline for one media lookup, in milliseconds.
  pub media_timeout_ms:     u64,
  pub preview_concurrency:  usize,
  pub list_limit:           u32,
  pub relation_file_prefix: String,
  pub video_strip_prefix:   String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let catalog = CatalogOptions::default();
    Self {
      host:                 "0.0.0.0".to_string(),
      port:                 3000,
      store_path:           PathBuf::from("strata.db"),
      request_timeout_ms:   catalog.deadline.as_millis() as u64,
      media_timeout_ms:     catalog.media_deadline.as_millis() as u64,
      preview_concurrency:  catalog.preview_concurrency,
      list_limit:           catalog.list_limit,
      relation_file_prefix: catalog.relation_file_prefix,
      video_strip_prefix:   catalog.video_strip_prefix,
    }
  }
}

impl ServerConfig {
  pub fn catalog_options(&self) -> CatalogOptions {
    CatalogOptions {
      deadline:             Duration::from_millis(self.request_timeout_ms),
      media_deadline:       Duration::from_millis(self.media_timeout_ms),
      preview_concurrency:  self.preview_concurrency,
      list_limit:           self.list_limit,
      relation_file_prefix: self.relation_file_prefix.clone(),
      video_strip_prefix:   self.video_strip_prefix.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application [`Router`].
pub fn router<G>(catalog: Arc<Catalog<G>>) -> Router
where
  G: QueryGateway + 'static,
{
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods(Any)
    .allow_headers(Any);

  Router::new()
    .nest("/api", strata_api::api_router(catalog))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
}
