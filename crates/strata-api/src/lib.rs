//! JSON REST API for Strata.
//!
//! Exposes an axum [`Router`] backed by a [`Catalog`] over any
//! [`QueryGateway`]. CORS, tracing and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", strata_api::api_router(catalog.clone()))
//! ```

pub mod error;
pub mod health;
pub mod models;
pub mod relations;
pub mod samples;
pub mod specimens;


use std::sync::Arc;

use axum::{Router, routing::get};
use strata_core::{catalog::Catalog, gateway::QueryGateway};

pub use error::ApiError;

/// Build a fully-materialised API router for `catalog`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<G>(catalog: Arc<Catalog<G>>) -> Router<()>
where
  G: QueryGateway + 'static,
{
  Router::new()
    // 3D models
    .route("/3d-models", get(models::list::<G>))
    .route("/3d-models/{id}", get(models::get_one::<G>))
    // Relations
    .route("/relations/{entity_id}", get(relations::list::<G>))
    // Sample details
    .route("/rock-sample/{code}", get(samples::rock_sample::<G>))
    .route("/thin-section/{code}", get(samples::thin_section::<G>))
    .route("/xrf-test/{code}", get(samples::xrf_test::<G>))
    // Specimen listing
    .route("/rock-samples/filters", get(specimens::filters::<G>))
    .route("/rock-samples", get(specimens::list::<G>))
    // Liveness
    .route("/health", get(health::handler::<G>))
    .with_state(catalog)
}
