//! Handlers for the filtered specimen listing.
//!
//! Query params are matched by name against the listing's filter table;
//! unknown params and empty values are ignored.
//!
//! `GET /rock-samples?color=grey&name=sand`

use std::{collections::HashMap, sync::Arc};

use axum::{
  Json,
  extract::{Query, State},
};
use strata_core::{
  catalog::{Catalog, FilterCatalog, WithPreview},
  entity::RockSpecimen,
  gateway::QueryGateway,
  query::FilterValues,
};

use crate::error::ApiError;

/// `GET /rock-samples/filters`
pub async fn filters<G>(
  State(catalog): State<Arc<Catalog<G>>>,
) -> Result<Json<FilterCatalog>, ApiError>
where
  G: QueryGateway,
{
  Ok(Json(catalog.specimen_filters().await?))
}

/// `GET /rock-samples[?<filter>=<value>...]`
pub async fn list<G>(
  State(catalog): State<Arc<Catalog<G>>>,
  Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<WithPreview<RockSpecimen>>>, ApiError>
where
  G: QueryGateway,
{
  let values = FilterValues::from(params);
  Ok(Json(catalog.specimens(&values).await?))
}
