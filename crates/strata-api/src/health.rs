//! Handler for `GET /health`.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use strata_core::{catalog::Catalog, gateway::QueryGateway};

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct Health {
  pub status: &'static str,
}

/// `GET /health` — 200 once the store answers a trivial query.
pub async fn handler<G>(State(catalog): State<Arc<Catalog<G>>>) -> Result<Json<Health>, ApiError>
where
  G: QueryGateway,
{
  catalog.ping().await?;
  Ok(Json(Health { status: "ok" }))
}
