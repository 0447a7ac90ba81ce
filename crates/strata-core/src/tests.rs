//! Assembler tests against a scriptable in-process gateway.

use std::{
  future::Future,
  sync::{Arc, Mutex},
  time::Duration,
};

use crate::{
  Error,
  catalog::{Catalog, CatalogOptions},
  gateway::QueryGateway,
  media::ResolvedMedia,
  query::FilterValues,
  value::{Row, SqlValue},
};

// ─── Fake gateway ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("fake store failure: {0}")]
struct FakeError(String);

type Responder = Box<dyn Fn(&str, &[SqlValue]) -> Result<Vec<Row>, FakeError> + Send + Sync>;
type Pacer = Box<dyn Fn(&str, &[SqlValue]) -> Duration + Send + Sync>;

/// Answers every query through `respond` and records what it was asked, in
/// completion order.
struct FakeGateway {
  respond: Responder,
  pace:    Option<Pacer>,
  log:     Mutex<Vec<(String, Vec<SqlValue>)>>,
}

impl FakeGateway {
  fn new(
    respond: impl Fn(&str, &[SqlValue]) -> Result<Vec<Row>, FakeError> + Send + Sync + 'static,
  ) -> Self {
    Self { respond: Box::new(respond), pace: None, log: Mutex::new(Vec::new()) }
  }

  /// Sleep for `pace(sql, params)` before answering each query.
  fn paced(
    mut self,
    pace: impl Fn(&str, &[SqlValue]) -> Duration + Send + Sync + 'static,
  ) -> Self {
    self.pace = Some(Box::new(pace));
    self
  }

  fn queries(&self) -> Vec<(String, Vec<SqlValue>)> { self.log.lock().unwrap().clone() }
}

impl QueryGateway for FakeGateway {
  type Error = FakeError;

  fn execute(
    &self,
    sql: String,
    params: Vec<SqlValue>,
  ) -> impl Future<Output = Result<Vec<Row>, FakeError>> + Send + '_ {
    async move {
      if let Some(pace) = &self.pace {
        let delay = pace(&sql, &params);
        if !delay.is_zero() {
          tokio::time::sleep(delay).await;
        }
      }
      let result = (self.respond)(&sql, &params);
      self.log.lock().unwrap().push((sql, params));
      result
    }
  }
}

fn catalog(gateway: FakeGateway) -> (Catalog<FakeGateway>, Arc<FakeGateway>) {
  let gateway = Arc::new(gateway);
  (Catalog::new(gateway.clone(), CatalogOptions::default()), gateway)
}

fn fail(what: &str) -> Result<Vec<Row>, FakeError> { Err(FakeError(what.to_owned())) }

fn text(v: &SqlValue) -> &str {
  match v {
    SqlValue::Text(s) => s,
    other => panic!("expected text, got {other:?}"),
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn rock_sample_row(code: &str) -> Row {
  Row::new()
    .with("code", code)
    .with("name", "Fine sandstone")
    .with("basin", "Ordos")
    .with("source", SqlValue::Null)
    .with("stratum", "Chang 7")
    .with("lithology", "sandstone")
    .with("description", SqlValue::Null)
    .with("location", "Yan'an")
    .with("sampled_at", "2021-06-01")
}

fn png_media_row(id: i64, payload: &[u8]) -> Row {
  Row::new()
    .with("id", id)
    .with("media_kind", "PNG")
    .with("file_name", format!("{id}.png"))
    .with("description", SqlValue::Null)
    .with("payload", payload.to_vec())
    .with("url", SqlValue::Null)
}

fn jpg_preview_row(id: i64, payload: &[u8]) -> Row {
  Row::new().with("id", id).with("media_kind", "jpg").with("payload", payload.to_vec())
}

fn video_media_row(id: i64, url: &str) -> Row {
  Row::new()
    .with("id", id)
    .with("media_kind", "mp4")
    .with("file_name", SqlValue::Null)
    .with("description", SqlValue::Null)
    .with("payload", SqlValue::Null)
    .with("url", url)
}

fn xrf_row(code: &str) -> Row {
  Row::new()
    .with("code", code)
    .with("stratum", "Chang 7")
    .with("field_name", "shale")
    .with("si", 61.2)
    .with("mg", 1.4)
    .with("al", 14.9)
    .with("k", 2.8)
    .with("ca", 0.9)
    .with("fe", 4.1)
    .with("ba", SqlValue::Null)
}

fn relation_row(id: i64, a: &str, b: &str, degree: f64, file: Option<&str>) -> Row {
  Row::new()
    .with("id", id)
    .with("relation_type", "lithologic")
    .with("entity_ref_1", a)
    .with("entity_ref_2", b)
    .with("degree", degree)
    .with("file", file)
    .with("entity_1_name", SqlValue::Null)
    .with("entity_2_name", SqlValue::Null)
}

fn specimen_row(id: i64) -> Row {
  Row::new()
    .with("id", id)
    .with("series", "Triassic")
    .with("group_section", "Yanchang")
    .with("base_name", "siltstone")
    .with("color", "grey")
    .with("main_composition", "quartz")
    .with("grain_size", "fine")
    .with("special_structure", SqlValue::Null)
    .with("special_mineral", SqlValue::Null)
    .with("rock_category", "sedimentary")
}

// ─── Detail ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn detail_unknown_key_is_not_found() {
  let (catalog, gateway) = catalog(FakeGateway::new(|_, _| Ok(vec![])));

  let err = catalog.rock_sample("missing-1").await.unwrap_err();
  match err {
    Error::NotFound { entity, key } => {
      assert_eq!(entity, "rock sample");
      assert_eq!(key, "missing-1");
    }
    other => panic!("expected NotFound, got {other:?}"),
  }
  // No media lookup for a record that does not exist.
  assert_eq!(gateway.queries().len(), 1);
}

#[tokio::test]
async fn detail_merges_media() {
  let payload = b"\x89PNG\r\n".to_vec();
  let media_payload = payload.clone();
  let (catalog, gateway) = catalog(FakeGateway::new(move |sql, _| {
    if sql.contains("media_files") {
      Ok(vec![png_media_row(1, &media_payload), video_media_row(2, "my-cesium-app/videos/a.mp4")])
    } else {
      Ok(vec![rock_sample_row("C7-2")])
    }
  }));

  let detail = catalog.rock_sample("C7-2").await.unwrap();
  assert_eq!(detail.record.code, "C7-2");
  assert!(detail.has_media);
  assert_eq!(detail.media_files.len(), 2);
  assert!(matches!(
    &detail.media_files[1],
    ResolvedMedia::Video { url: Some(url), .. } if url == "/videos/a.mp4"
  ));

  let queries = gateway.queries();
  let (_, media_params) = &queries[1];
  assert_eq!(text(&media_params[0]), "C7-2");
  assert_eq!(text(&media_params[1]), "rock_sample");
}

#[tokio::test]
async fn detail_media_failure_degrades_to_empty_media() {
  let (catalog, _) = catalog(FakeGateway::new(|sql, _| {
    if sql.contains("media_files") {
      fail("media table offline")
    } else {
      Ok(vec![rock_sample_row("C7-2")])
    }
  }));

  let detail = catalog.rock_sample("C7-2").await.unwrap();
  assert_eq!(detail.record.name.as_deref(), Some("Fine sandstone"));
  assert!(detail.media_files.is_empty());
  assert!(!detail.has_media);

  let json = serde_json::to_value(&detail).unwrap();
  assert_eq!(json["code"], "C7-2");
  assert_eq!(json["media_files"], serde_json::json!([]));
  assert_eq!(json["has_media"], false);
}

#[tokio::test]
async fn slow_media_degrades_detail_instead_of_timing_out() {
  let gateway = FakeGateway::new(|sql, _| {
    if sql.contains("media_files") {
      Ok(vec![png_media_row(1, b"png")])
    } else {
      Ok(vec![rock_sample_row("S1")])
    }
  })
  .paced(|sql, _| {
    if sql.contains("media_files") { Duration::from_millis(500) } else { Duration::ZERO }
  });
  let options = CatalogOptions {
    deadline: Duration::from_millis(200),
    media_deadline: Duration::from_millis(30),
    ..Default::default()
  };
  let catalog = Catalog::new(Arc::new(gateway), options);

  let detail = catalog.rock_sample("S1").await.unwrap();
  assert_eq!(detail.record.code, "S1");
  assert!(detail.media_files.is_empty());
  assert!(!detail.has_media);
}

#[tokio::test]
async fn detail_primary_failure_surfaces() {
  let (catalog, _) = catalog(FakeGateway::new(|_, _| fail("connection refused")));

  let err = catalog.thin_section("C7-2").await.unwrap_err();
  assert!(matches!(err, Error::Store(_)), "got {err:?}");
}

#[tokio::test]
async fn spatial_model_media_joins_on_geographic_name() {
  let (catalog, gateway) = catalog(FakeGateway::new(|sql, _| {
    if sql.contains("media_files") {
      Ok(vec![video_media_row(9, "/videos/flyover.mp4")])
    } else {
      Ok(vec![Row::new()
        .with("id", 3_i64)
        .with("geographic_name", "Yanhe Outcrop")
        .with("coord_x", 109.4)
        .with("coord_y", 36.6)])
    }
  }));

  let detail = catalog.spatial_model(3).await.unwrap();
  assert_eq!(detail.record.id, 3);
  assert!(detail.has_media);

  let queries = gateway.queries();
  assert_eq!(queries[0].1, vec![SqlValue::Integer(3)]);
  assert_eq!(text(&queries[1].1[0]), "Yanhe Outcrop");
  assert_eq!(text(&queries[1].1[1]), "spatial_model");
}

#[tokio::test]
async fn spatial_model_without_name_skips_media_lookup() {
  let (catalog, gateway) =
    catalog(FakeGateway::new(|_, _| Ok(vec![Row::new().with("id", 4_i64)])));

  let detail = catalog.spatial_model(4).await.unwrap();
  assert!(!detail.has_media);
  assert_eq!(gateway.queries().len(), 1);
}

// ─── XRF fallback ────────────────────────────────────────────────────────────

#[tokio::test]
async fn xrf_tries_exact_then_spaced_then_despaced() {
  let (catalog, gateway) = catalog(FakeGateway::new(|sql, _| {
    if sql.contains("REPLACE(") {
      Ok(vec![xrf_row("长 7 -2")])
    } else {
      Ok(vec![])
    }
  }));

  let result = catalog.xrf_result("长7-2").await.unwrap();
  assert_eq!(result.code, "长 7 -2");
  assert_eq!(result.si, Some(61.2));

  let queries = gateway.queries();
  assert_eq!(queries.len(), 3);
  assert_eq!(text(&queries[0].1[0]), "长7-2");
  assert!(!queries[0].0.contains("REPLACE("));
  assert_eq!(text(&queries[1].1[0]), "长 7 - 2");
  assert!(!queries[1].0.contains("REPLACE("));
  assert_eq!(text(&queries[2].1[0]), "长7-2");
  assert!(queries[2].0.contains("REPLACE("));
}

#[tokio::test]
async fn xrf_first_hit_wins() {
  let (catalog, gateway) = catalog(FakeGateway::new(|_, params| {
    if text(&params[0]) == "长 7 - 2" {
      Ok(vec![xrf_row("长 7 - 2")])
    } else {
      Ok(vec![])
    }
  }));

  let result = catalog.xrf_result("长7-2").await.unwrap();
  assert_eq!(result.code, "长 7 - 2");
  assert_eq!(gateway.queries().len(), 2);
}

#[tokio::test]
async fn xrf_skips_spaced_form_when_identical() {
  let (catalog, gateway) = catalog(FakeGateway::new(|_, _| Ok(vec![])));

  let err = catalog.xrf_result("A").await.unwrap_err();
  assert!(matches!(err, Error::NotFound { .. }));
  assert_eq!(gateway.queries().len(), 2);
}

#[tokio::test]
async fn xrf_all_forms_missing_is_not_found() {
  let (catalog, gateway) = catalog(FakeGateway::new(|_, _| Ok(vec![])));

  let err = catalog.xrf_result("长7-2").await.unwrap_err();
  assert!(matches!(err, Error::NotFound { ref key, .. } if key == "长7-2"));
  assert_eq!(gateway.queries().len(), 3);
}

#[tokio::test]
async fn xrf_blank_code_never_queries() {
  let (catalog, gateway) = catalog(FakeGateway::new(|_, _| Ok(vec![xrf_row("x")])));

  assert!(matches!(catalog.xrf_result("  ").await, Err(Error::NotFound { .. })));
  assert!(gateway.queries().is_empty());
}

// ─── Relations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn relations_are_symmetric_and_strongest_first() {
  let (catalog, gateway) = catalog(FakeGateway::new(|_, _| {
    Ok(vec![
      relation_row(1, "E1", "E2", 0.3, None),
      relation_row(2, "E3", "E1", 0.9, Some("m/a.glb")),
      relation_row(3, "E1", "E4", 0.3, Some("b.glb")),
      relation_row(4, "E5", "E1", 0.5, Some("")),
    ])
  }));

  let relations = catalog.relations("E1").await.unwrap();
  let ids: Vec<i64> = relations.iter().map(|r| r.relation.id).collect();
  assert_eq!(ids, vec![2, 4, 1, 3]);
  assert_eq!(relations[0].url.as_deref(), Some("/mock-models/m/a.glb"));
  assert_eq!(relations[1].url, None);
  assert_eq!(relations[2].url, None);
  assert_eq!(relations[3].url.as_deref(), Some("/mock-models/b.glb"));

  let queries = gateway.queries();
  assert_eq!(queries[0].1, vec![SqlValue::from("E1"), SqlValue::from("E1")]);
  assert!(queries[0].0.contains("entity_ref_1 = ? OR r.entity_ref_2 = ?"));
}

#[tokio::test]
async fn relations_for_unknown_entity_are_empty() {
  let (catalog, _) = catalog(FakeGateway::new(|_, _| Ok(vec![])));
  assert!(catalog.relations("nobody").await.unwrap().is_empty());
}

// ─── Filter catalogue ────────────────────────────────────────────────────────

#[tokio::test]
async fn filter_catalog_collects_every_column() {
  let (catalog, gateway) = catalog(FakeGateway::new(|sql, _| {
    let value = if sql.contains("\"color\"") { "grey" } else { "v" };
    Ok(vec![Row::new().with("value", value)])
  }));

  let filters = catalog.specimen_filters().await.unwrap();
  assert_eq!(
    filters.keys().copied().collect::<Vec<_>>(),
    vec!["category", "color", "grain_size", "mineral", "structure"]
  );
  assert_eq!(filters["color"], vec!["grey".to_owned()]);
  assert_eq!(gateway.queries().len(), 5);
}

#[tokio::test]
async fn filter_catalog_is_all_or_nothing() {
  let (catalog, _) = catalog(FakeGateway::new(|sql, _| {
    if sql.contains("special_mineral") {
      fail("column missing")
    } else {
      Ok(vec![Row::new().with("value", "v")])
    }
  }));

  let err = catalog.specimen_filters().await.unwrap_err();
  assert!(matches!(err, Error::Store(_)), "got {err:?}");
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn listing_isolates_preview_failures_and_keeps_order() {
  let (catalog, gateway) = catalog(FakeGateway::new(|sql, params| {
    if !sql.contains("media_files") {
      return Ok(vec![specimen_row(1), specimen_row(2), specimen_row(3)]);
    }
    match text(&params[0]) {
      "1" => Ok(vec![Row::new().with("id", 10_i64).with("media_kind", "jpg").with("payload", b"abc".to_vec())]),
      "2" => fail("blob read error"),
      _ => Ok(vec![]),
    }
  }));

  let values = FilterValues::new().with("category", "sedimentary").with("name", "silt");
  let listing = catalog.specimens(&values).await.unwrap();

  let ids: Vec<i64> = listing.iter().map(|r| r.record.id).collect();
  assert_eq!(ids, vec![1, 2, 3]);
  assert_eq!(listing[0].image_url.as_deref(), Some("data:image/jpg;base64,YWJj"));
  assert_eq!(listing[1].image_url, None);
  assert_eq!(listing[2].image_url, None);

  let queries = gateway.queries();
  let (sql, params) = &queries[0];
  assert!(sql.contains("\"base_name\" LIKE ?"));
  assert!(sql.contains("\"rock_category\" = ?"));
  assert_eq!(
    params,
    &vec![
      SqlValue::from("%silt%"),
      SqlValue::from("sedimentary"),
      SqlValue::Integer(500),
    ]
  );

  let json = serde_json::to_value(&listing).unwrap();
  assert_eq!(json[0]["imageUrl"], "data:image/jpg;base64,YWJj");
  assert!(json[1]["imageUrl"].is_null());
}

#[tokio::test]
async fn listing_preview_without_payload_is_null() {
  let (catalog, _) = catalog(FakeGateway::new(|sql, _| {
    if sql.contains("media_files") {
      Ok(vec![Row::new().with("id", 1_i64).with("media_kind", "mp4").with("payload", SqlValue::Null)])
    } else {
      Ok(vec![specimen_row(7)])
    }
  }));

  let listing = catalog.specimens(&FilterValues::new()).await.unwrap();
  assert_eq!(listing.len(), 1);
  assert_eq!(listing[0].image_url, None);
}

#[tokio::test]
async fn listing_video_preview_is_never_inlined() {
  let (catalog, _) = catalog(FakeGateway::new(|sql, _| {
    if sql.contains("media_files") {
      Ok(vec![Row::new().with("id", 1_i64).with("media_kind", "mp4").with("payload", b"VIDEO".to_vec())])
    } else {
      Ok(vec![specimen_row(7)])
    }
  }));

  let listing = catalog.specimens(&FilterValues::new()).await.unwrap();
  assert_eq!(listing[0].image_url, None);
  let json = serde_json::to_value(&listing).unwrap();
  assert!(json[0]["imageUrl"].is_null());
}

#[tokio::test]
async fn listing_keeps_row_order_when_previews_finish_out_of_order() {
  let gateway = FakeGateway::new(|sql, params| {
    if !sql.contains("media_files") {
      return Ok(vec![specimen_row(1), specimen_row(2), specimen_row(3)]);
    }
    let key = text(&params[0]).to_owned();
    Ok(vec![jpg_preview_row(10, format!("p{key}").as_bytes())])
  })
  .paced(|sql, params| {
    if !sql.contains("media_files") {
      return Duration::ZERO;
    }
    match text(&params[0]) {
      "1" => Duration::from_millis(120),
      "2" => Duration::from_millis(60),
      _ => Duration::ZERO,
    }
  });
  let gateway = Arc::new(gateway);
  let options = CatalogOptions { preview_concurrency: 3, ..Default::default() };
  let catalog = Catalog::new(gateway.clone(), options);

  let listing = catalog.specimens(&FilterValues::new()).await.unwrap();

  let ids: Vec<i64> = listing.iter().map(|r| r.record.id).collect();
  assert_eq!(ids, vec![1, 2, 3]);
  let urls: Vec<Option<&str>> = listing.iter().map(|r| r.image_url.as_deref()).collect();
  assert_eq!(
    urls,
    vec![
      Some("data:image/jpg;base64,cDE="),
      Some("data:image/jpg;base64,cDI="),
      Some("data:image/jpg;base64,cDM="),
    ]
  );

  // The lookups really did complete last-row-first.
  let finished: Vec<String> = gateway
    .queries()
    .iter()
    .filter(|(sql, _)| sql.contains("media_files"))
    .map(|(_, params)| text(&params[0]).to_owned())
    .collect();
  assert_eq!(finished, vec!["3", "2", "1"]);
}

#[tokio::test]
async fn slow_preview_nulls_only_its_row() {
  let gateway = FakeGateway::new(|sql, params| {
    if !sql.contains("media_files") {
      return Ok(vec![specimen_row(1), specimen_row(2)]);
    }
    Ok(vec![jpg_preview_row(10, format!("p{}", text(&params[0])).as_bytes())])
  })
  .paced(|sql, params| {
    if sql.contains("media_files") && text(&params[0]) == "2" {
      Duration::from_millis(500)
    } else {
      Duration::ZERO
    }
  });
  let options = CatalogOptions {
    deadline: Duration::from_millis(200),
    media_deadline: Duration::from_millis(30),
    ..Default::default()
  };
  let catalog = Catalog::new(Arc::new(gateway), options);

  let listing = catalog.specimens(&FilterValues::new()).await.unwrap();
  assert_eq!(listing.len(), 2);
  assert_eq!(listing[0].image_url.as_deref(), Some("data:image/jpg;base64,cDE="));
  assert_eq!(listing[1].image_url, None);
}

#[tokio::test]
async fn listing_store_failure_surfaces() {
  let (catalog, _) = catalog(FakeGateway::new(|_, _| fail("syntax error")));
  assert!(matches!(catalog.specimens(&FilterValues::new()).await, Err(Error::Store(_))));
}

// ─── Deadline ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn slow_store_hits_the_deadline() {
  let gateway =
    FakeGateway::new(|_, _| Ok(vec![])).paced(|_, _| Duration::from_millis(500));
  let options = CatalogOptions { deadline: Duration::from_millis(20), ..Default::default() };
  let catalog = Catalog::new(Arc::new(gateway), options);

  let err = catalog.spatial_models().await.unwrap_err();
  assert!(matches!(err, Error::DeadlineExceeded(d) if d == Duration::from_millis(20)));
}
