//! [`Catalog`] — the response assembler.
//!
//! Every public method is one composite read: fetch the primary record(s),
//! resolve associated media, merge. Primary-record failures always surface;
//! media failures ([`Error::Media`]) are downgraded to an empty or `null`
//! media indicator in explicit match arms. Primary fetches run under
//! [`CatalogOptions::deadline`]; each media lookup runs under its own
//! [`CatalogOptions::media_deadline`], and overrunning it counts as a media
//! failure.

use std::{cmp::Ordering, collections::BTreeMap, future::Future, sync::Arc, time::Duration};

use futures::{StreamExt as _, TryStreamExt as _, future::try_join_all, stream};
use serde::Serialize;

use crate::{
  Error, Result,
  entity::{Relation, RockSample, RockSpecimen, SpatialModel, ThinSectionReport, XrfResult},
  gateway::QueryGateway,
  ident::{despaced_column, normalize},
  media::{MediaOwner, MediaResolver, ResolvedMedia},
  query::{self, FilterValues, quote_ident, select_list},
  value::{FromRow, Row, SqlValue},
};

// ─── Options ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CatalogOptions {
  /// Upper bound on the primary fetch of one read.
  pub deadline:             Duration,
  /// Upper bound on one media lookup (a detail's media, or one listing
  /// preview).
  pub media_deadline:       Duration,
  /// Maximum concurrent preview lookups per listing.
  pub preview_concurrency:  usize,
  /// Maximum rows returned by the filtered listing.
  pub list_limit:           u32,
  /// Prepended to a relation's `file` to form its `url`.
  pub relation_file_prefix: String,
  /// Leading project segment stripped from video URLs.
  pub video_strip_prefix:   String,
}

impl Default for CatalogOptions {
  fn default() -> Self {
    Self {
      deadline:             Duration::from_secs(10),
      media_deadline:       Duration::from_secs(5),
      preview_concurrency:  8,
      list_limit:           500,
      relation_file_prefix: "/mock-models/".to_owned(),
      video_strip_prefix:   "my-cesium-app/".to_owned(),
    }
  }
}

// ─── Response shapes ─────────────────────────────────────────────────────────

/// A detail record with its media merged in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithMedia<T> {
  #[serde(flatten)]
  pub record:      T,
  pub media_files: Vec<ResolvedMedia>,
  pub has_media:   bool,
}

impl<T> WithMedia<T> {
  pub fn new(record: T, media_files: Vec<ResolvedMedia>) -> Self {
    let has_media = !media_files.is_empty();
    Self { record, media_files, has_media }
  }
}

/// A listing row with at most one inlined preview image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithPreview<T> {
  #[serde(flatten)]
  pub record:    T,
  #[serde(rename = "imageUrl")]
  pub image_url: Option<String>,
}

/// A relation with its model file resolved to a URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationView {
  #[serde(flatten)]
  pub relation: Relation,
  pub url:      Option<String>,
}

/// Filter name → distinct values observed in the listing table.
pub type FilterCatalog = BTreeMap<&'static str, Vec<String>>;

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Read-side façade over a [`QueryGateway`].
///
/// Cloning is cheap; the gateway is shared.
pub struct Catalog<G> {
  gateway: Arc<G>,
  options: CatalogOptions,
}

impl<G> Clone for Catalog<G> {
  fn clone(&self) -> Self {
    Self { gateway: Arc::clone(&self.gateway), options: self.options.clone() }
  }
}

impl<G: QueryGateway> Catalog<G> {
  pub fn new(gateway: Arc<G>, options: CatalogOptions) -> Self { Self { gateway, options } }

  pub fn options(&self) -> &CatalogOptions { &self.options }

  pub fn gateway(&self) -> &G { &self.gateway }

  // ── Plumbing ──────────────────────────────────────────────────────────────

  async fn within<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
    let deadline = self.options.deadline;
    tokio::time::timeout(deadline, fut)
      .await
      .map_err(|_| Error::DeadlineExceeded(deadline))?
  }

  async fn within_media<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
    let limit = self.options.media_deadline;
    tokio::time::timeout(limit, fut)
      .await
      .map_err(|_| Error::Media(Box::new(Error::DeadlineExceeded(limit))))?
  }

  async fn rows(&self, sql: String, params: Vec<SqlValue>) -> Result<Vec<Row>> {
    tracing::debug!(%sql, params = params.len(), "executing query");
    self.gateway.execute(sql, params).await.map_err(Error::store)
  }

  async fn fetch_all<T: FromRow>(&self, sql: String, params: Vec<SqlValue>) -> Result<Vec<T>> {
    self.rows(sql, params).await?.into_iter().map(T::from_row).collect()
  }

  async fn fetch_first<T: FromRow>(
    &self,
    sql:    String,
    params: Vec<SqlValue>,
  ) -> Result<Option<T>> {
    self.rows(sql, params).await?.into_iter().next().map(T::from_row).transpose()
  }

  fn media(&self) -> MediaResolver<'_, G> {
    MediaResolver::new(self.gateway.as_ref(), &self.options.video_strip_prefix)
  }

  fn select_from(projection: &[query::Column], table: &str) -> String {
    format!("SELECT {} FROM {}", select_list(projection), quote_ident(table))
  }

  /// Primary fetch by key under the request deadline, then media merge under
  /// the media deadline.
  async fn detail<T>(
    &self,
    entity: &'static str,
    sql:    String,
    key:    SqlValue,
  ) -> Result<WithMedia<T>>
  where
    T: FromRow + MediaOwner,
  {
    let key_text = key.to_text().unwrap_or_default();
    let record: T = self
      .within(self.fetch_first(sql, vec![key]))
      .await?
      .ok_or_else(|| Error::NotFound { entity, key: key_text.clone() })?;

    let resolver = self.media();
    let media = match record.association() {
      None => Vec::new(),
      Some(association) => match self.within_media(resolver.resolve(&association)).await {
        Ok(media) => media,
        Err(Error::Media(e)) => {
          tracing::warn!(
            entity,
            key = %key_text,
            error = %e,
            "media lookup failed; returning record without media"
          );
          Vec::new()
        }
        Err(e) => return Err(e),
      },
    };

    Ok(WithMedia::new(record, media))
  }

  /// The preview for one listing row. A failed lookup yields `None` for
  /// this row only.
  async fn preview_for<T: MediaOwner>(
    &self,
    resolver: &MediaResolver<'_, G>,
    record:   &T,
  ) -> Result<Option<String>> {
    let Some(association) = record.association() else { return Ok(None) };
    match self.within_media(resolver.preview(&association)).await {
      Ok(uri) => Ok(uri),
      Err(Error::Media(e)) => {
        tracing::warn!(
          association = association.type_tag(),
          key = %association.key(),
          error = %e,
          "preview lookup failed"
        );
        Ok(None)
      }
      Err(e) => Err(e),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Round-trip a trivial query to confirm the store is reachable.
  pub async fn ping(&self) -> Result<()> {
    self.within(async { self.rows("SELECT 1".to_owned(), Vec::new()).await.map(|_| ()) }).await
  }

  /// Every spatial model, by id.
  pub async fn spatial_models(&self) -> Result<Vec<SpatialModel>> {
    self
      .within(async {
        let sql = format!(
          "{} ORDER BY \"id\" ASC",
          Self::select_from(SpatialModel::PROJECTION, SpatialModel::TABLE)
        );
        self.fetch_all(sql, Vec::new()).await
      })
      .await
  }

  pub async fn spatial_model(&self, id: i64) -> Result<WithMedia<SpatialModel>> {
    let sql = format!(
      "{} WHERE \"id\" = ?",
      Self::select_from(SpatialModel::PROJECTION, SpatialModel::TABLE)
    );
    self.detail("3D model", sql, SqlValue::Integer(id)).await
  }

  pub async fn rock_sample(&self, code: &str) -> Result<WithMedia<RockSample>> {
    let sql = format!(
      "{} WHERE \"code\" = ?",
      Self::select_from(RockSample::PROJECTION, RockSample::TABLE)
    );
    self.detail("rock sample", sql, SqlValue::from(code)).await
  }

  pub async fn thin_section(&self, code: &str) -> Result<WithMedia<ThinSectionReport>> {
    let sql = format!(
      "{} WHERE \"code\" = ?",
      Self::select_from(ThinSectionReport::PROJECTION, ThinSectionReport::TABLE)
    );
    self.detail("thin section report", sql, SqlValue::from(code)).await
  }

  /// XRF results for `code`, tolerating stray spacing in stored codes.
  ///
  /// Tries the exact code, then the spaced form, then the despaced form
  /// against the despaced column; the first non-empty result wins.
  pub async fn xrf_result(&self, code: &str) -> Result<XrfResult> {
    self
      .within(async {
        let not_found = || Error::NotFound { entity: "XRF test result", key: code.to_owned() };
        let forms = normalize(code);
        if forms.despaced.is_empty() {
          return Err(not_found());
        }

        let select = Self::select_from(XrfResult::PROJECTION, XrfResult::TABLE);
        let column = quote_ident(XrfResult::KEY);
        let by_column = format!("{select} WHERE {column} = ?");

        let mut attempts = vec![(by_column.clone(), forms.exact.clone())];
        if forms.spaced != forms.exact {
          attempts.push((by_column, forms.spaced.clone()));
        }
        attempts.push((
          format!("{select} WHERE {} = ?", despaced_column(&column)),
          forms.despaced.clone(),
        ));

        for (sql, value) in attempts {
          if let Some(result) = self.fetch_first(sql, vec![SqlValue::Text(value)]).await? {
            return Ok(result);
          }
        }
        Err(not_found())
      })
      .await
  }

  /// Relations where `entity` is either reference, strongest first.
  pub async fn relations(&self, entity: &str) -> Result<Vec<RelationView>> {
    self
      .within(async {
        let mut relations: Vec<Relation> = self
          .fetch_all(
            Relation::SYMMETRIC_SQL.to_owned(),
            vec![SqlValue::from(entity), SqlValue::from(entity)],
          )
          .await?;

        // Stable, so ties keep the store's order.
        relations.sort_by(|a, b| match (a.degree, b.degree) {
          (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
          (Some(_), None) => Ordering::Less,
          (None, Some(_)) => Ordering::Greater,
          (None, None) => Ordering::Equal,
        });

        let prefix = &self.options.relation_file_prefix;
        Ok(
          relations
            .into_iter()
            .map(|relation| {
              let url = relation
                .file
                .as_deref()
                .filter(|f| !f.is_empty())
                .map(|f| format!("{prefix}{f}"));
              RelationView { relation, url }
            })
            .collect(),
        )
      })
      .await
  }

  /// Distinct values for each catalogue column. Any failing column fails the
  /// whole catalogue.
  pub async fn specimen_filters(&self) -> Result<FilterCatalog> {
    self
      .within(async {
        let table = quote_ident(RockSpecimen::TABLE);
        let lookups = RockSpecimen::CATALOG_COLUMNS.iter().map(|&(name, column)| {
          let column = quote_ident(column);
          let sql = format!(
            "SELECT DISTINCT {column} AS \"value\" FROM {table}
             WHERE {column} IS NOT NULL
             ORDER BY {column} ASC"
          );
          async move {
            let values = self
              .rows(sql, Vec::new())
              .await?
              .iter()
              .map(|row| row.text("value"))
              .collect::<Result<Vec<_>>>()?;
            Ok::<_, Error>((name, values))
          }
        });
        Ok(try_join_all(lookups).await?.into_iter().collect())
      })
      .await
  }

  /// Filtered specimen listing with one preview image per row.
  ///
  /// Preview lookups run concurrently, bounded by
  /// [`CatalogOptions::preview_concurrency`], and keep row order.
  pub async fn specimens(&self, values: &FilterValues) -> Result<Vec<WithPreview<RockSpecimen>>> {
    let q = query::build(
      RockSpecimen::PROJECTION,
      RockSpecimen::TABLE,
      RockSpecimen::FILTERS,
      values,
    )
    .order_by("id")
    .limit(self.options.list_limit);

    let specimens: Vec<RockSpecimen> = self.within(self.fetch_all(q.sql, q.params)).await?;
    tracing::debug!(rows = specimens.len(), "fetched specimens");

    let resolver = self.media();
    let lookups: Vec<_> = specimens.iter().map(|s| self.preview_for(&resolver, s)).collect();
    let previews: Vec<Option<String>> = stream::iter(lookups)
      .buffered(self.options.preview_concurrency.max(1))
      .try_collect()
      .await?;

    Ok(
      specimens
        .into_iter()
        .zip(previews)
        .map(|(record, image_url)| WithPreview { record, image_url })
        .collect(),
    )
  }
}
