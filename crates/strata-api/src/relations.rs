//! Handler for `GET /relations/{entity_id}`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use strata_core::{
  catalog::{Catalog, RelationView},
  gateway::QueryGateway,
};

use crate::error::ApiError;

/// `GET /relations/{entity_id}` — relations on either side, strongest first.
/// An unknown entity yields `[]`.
pub async fn list<G>(
  State(catalog): State<Arc<Catalog<G>>>,
  Path(entity_id): Path<String>,
) -> Result<Json<Vec<RelationView>>, ApiError>
where
  G: QueryGateway,
{
  Ok(Json(catalog.relations(&entity_id).await?))
}
