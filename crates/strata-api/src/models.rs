//! Handlers for `/3d-models` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/3d-models` | All models, by id |
//! | `GET`  | `/3d-models/{id}` | Model plus media; 400 on a non-numeric id, 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use strata_core::{
  catalog::{Catalog, WithMedia},
  entity::SpatialModel,
  gateway::QueryGateway,
};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /3d-models`
pub async fn list<G>(
  State(catalog): State<Arc<Catalog<G>>>,
) -> Result<Json<Vec<SpatialModel>>, ApiError>
where
  G: QueryGateway,
{
  Ok(Json(catalog.spatial_models().await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /3d-models/{id}`
pub async fn get_one<G>(
  State(catalog): State<Arc<Catalog<G>>>,
  Path(id): Path<String>,
) -> Result<Json<WithMedia<SpatialModel>>, ApiError>
where
  G: QueryGateway,
{
  let id: i64 = id
    .trim()
    .parse()
    .map_err(|_| ApiError::BadRequest(format!("invalid 3D model id: {id:?}")))?;
  Ok(Json(catalog.spatial_model(id).await?))
}
