//! Handlers for per-sample detail endpoints.
//!
//! Rock samples and thin sections carry their media inline; a failed media
//! lookup still returns the record, with `media_files: []`. XRF results are
//! matched leniently on spacing.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use strata_core::{
  catalog::{Catalog, WithMedia},
  entity::{RockSample, ThinSectionReport, XrfResult},
  gateway::QueryGateway,
};

use crate::error::ApiError;

/// `GET /rock-sample/{code}`
pub async fn rock_sample<G>(
  State(catalog): State<Arc<Catalog<G>>>,
  Path(code): Path<String>,
) -> Result<Json<WithMedia<RockSample>>, ApiError>
where
  G: QueryGateway,
{
  Ok(Json(catalog.rock_sample(&code).await?))
}

/// `GET /thin-section/{code}`
pub async fn thin_section<G>(
  State(catalog): State<Arc<Catalog<G>>>,
  Path(code): Path<String>,
) -> Result<Json<WithMedia<ThinSectionReport>>, ApiError>
where
  G: QueryGateway,
{
  Ok(Json(catalog.thin_section(&code).await?))
}

/// `GET /xrf-test/{code}`
pub async fn xrf_test<G>(
  State(catalog): State<Arc<Catalog<G>>>,
  Path(code): Path<String>,
) -> Result<Json<XrfResult>, ApiError>
where
  G: QueryGateway,
{
  Ok(Json(catalog.xrf_result(&code).await?))
}
