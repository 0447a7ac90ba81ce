//! Media association and resolution.
//!
//! A `media_files` row belongs to exactly one owner, identified by a type tag
//! and a natural key whose meaning depends on the owner kind. Each row is
//! surfaced as an inline data URI (images) or a reachable URL (video).

use std::str::FromStr as _;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  Error, Result,
  gateway::QueryGateway,
  value::{FromRow, Row, SqlValue},
};

// ─── Association ─────────────────────────────────────────────────────────────

/// The owner of a set of media rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Association {
  /// Spatial models associate by geographic name, not by numeric id.
  SpatialModel(String),
  RockSample(String),
  ThinSectionReport(String),
  /// Listing specimens associate by their numeric id.
  RockSpecimen(i64),
}

impl Association {
  /// The `association_type` tag stored on media rows.
  pub fn type_tag(&self) -> &'static str {
    match self {
      Self::SpatialModel(_) => "spatial_model",
      Self::RockSample(_) => "rock_sample",
      Self::ThinSectionReport(_) => "thin_section_report",
      Self::RockSpecimen(_) => "rock_specimen",
    }
  }

  /// The `association_key` value stored on media rows.
  pub fn key(&self) -> String {
    match self {
      Self::SpatialModel(name) => name.clone(),
      Self::RockSample(code) | Self::ThinSectionReport(code) => code.clone(),
      Self::RockSpecimen(id) => id.to_string(),
    }
  }
}

/// A record that can own media.
pub trait MediaOwner {
  /// The association to resolve, or `None` when the record has no usable
  /// natural key.
  fn association(&self) -> Option<Association>;
}

// ─── Kinds and resolved media ────────────────────────────────────────────────

/// Recognised `media_kind` values. Parsing is case-insensitive.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
  Png,
  Jpg,
  Jpeg,
  Mp4,
}

impl MediaKind {
  pub fn parse(raw: &str) -> Option<Self> { Self::from_str(raw.trim()).ok() }

  pub fn is_image(self) -> bool { matches!(self, Self::Png | Self::Jpg | Self::Jpeg) }
}

/// A media row converted into something a client can consume directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedMedia {
  Image {
    id:          i64,
    format:      MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_name:   Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    data_uri:    String,
  },
  /// A video is either reachable at `url`, or stored only as a binary
  /// payload that is deliberately not inlined.
  Video {
    id:                   i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_name:            Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description:          Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url:                  Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    has_unexposed_binary: bool,
  },
}

impl ResolvedMedia {
  pub fn id(&self) -> i64 {
    match self {
      Self::Image { id, .. } | Self::Video { id, .. } => *id,
    }
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `media_files` row as read from the store.
#[derive(Debug, Clone)]
pub struct MediaRecord {
  pub id:          i64,
  pub media_kind:  Option<String>,
  pub file_name:   Option<String>,
  pub description: Option<String>,
  pub payload:     Option<Bytes>,
  pub url:         Option<String>,
}

impl FromRow for MediaRecord {
  fn from_row(mut row: Row) -> Result<Self> {
    let payload = row.take_blob("payload")?;
    Ok(Self {
      id: row.i64("id")?,
      media_kind: row.opt_text("media_kind")?,
      file_name: row.opt_text("file_name")?,
      description: row.opt_text("description")?,
      payload,
      url: row.opt_text("url")?.filter(|u| !u.trim().is_empty()),
    })
  }
}

// ─── Encoding ────────────────────────────────────────────────────────────────

/// `data:image/<format>;base64,<payload>`
pub fn image_data_uri(format: &str, payload: &[u8]) -> String {
  format!("data:image/{format};base64,{}", B64.encode(payload))
}

/// Strip a leading project segment (e.g. `my-cesium-app/`) and guarantee a
/// leading `/`.
pub fn normalize_video_url(url: &str, strip_prefix: &str) -> String {
  let relative = url.trim().trim_start_matches('/');
  let relative = if strip_prefix.is_empty() {
    relative
  } else {
    relative.strip_prefix(strip_prefix).unwrap_or(relative)
  };
  format!("/{}", relative.trim_start_matches('/'))
}

/// Convert one media row. Returns `None` when the row carries neither a
/// usable payload nor a usable URL for its kind.
///
/// A payload without a kind is treated as PNG.
pub fn resolve_record(record: MediaRecord, video_strip_prefix: &str) -> Option<ResolvedMedia> {
  let kind = match record.media_kind.as_deref() {
    None => Some(MediaKind::Png),
    Some(raw) if raw.trim().is_empty() => Some(MediaKind::Png),
    Some(raw) => MediaKind::parse(raw),
  };

  match kind {
    Some(MediaKind::Mp4) => {
      if let Some(url) = &record.url {
        Some(ResolvedMedia::Video {
          id:                   record.id,
          file_name:            record.file_name,
          description:          record.description,
          url:                  Some(normalize_video_url(url, video_strip_prefix)),
          has_unexposed_binary: false,
        })
      } else if record.payload.is_some() {
        Some(ResolvedMedia::Video {
          id:                   record.id,
          file_name:            record.file_name,
          description:          record.description,
          url:                  None,
          has_unexposed_binary: true,
        })
      } else {
        None
      }
    }
    Some(format) if format.is_image() => {
      let payload = record.payload?;
      Some(ResolvedMedia::Image {
        id: record.id,
        format,
        file_name: record.file_name,
        description: record.description,
        data_uri: image_data_uri(&format.to_string(), &payload),
      })
    }
    _ => {
      tracing::debug!(
        media_id = record.id,
        kind = ?record.media_kind,
        "skipping media row with unsupported kind"
      );
      None
    }
  }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

const MEDIA_SQL: &str = "SELECT id, media_kind, file_name, description, payload, url
   FROM media_files
   WHERE association_key = ? AND association_type = ?
   ORDER BY id ASC";

const PREVIEW_SQL: &str = "SELECT id, media_kind, payload
   FROM media_files
   WHERE association_key = ? AND association_type = ?
   ORDER BY id ASC
   LIMIT 1";

/// Looks up and converts media for one owner at a time.
///
/// Every failure comes back as [`Error::Media`]; deciding whether that is
/// fatal is the caller's job.
#[derive(Debug)]
pub struct MediaResolver<'a, G> {
  gateway:            &'a G,
  video_strip_prefix: &'a str,
}

impl<'a, G: QueryGateway> MediaResolver<'a, G> {
  pub fn new(gateway: &'a G, video_strip_prefix: &'a str) -> Self {
    Self { gateway, video_strip_prefix }
  }

  async fn records(&self, sql: &str, association: &Association) -> Result<Vec<MediaRecord>> {
    let params = vec![
      SqlValue::Text(association.key()),
      SqlValue::from(association.type_tag()),
    ];
    let rows = self
      .gateway
      .execute(sql.to_owned(), params)
      .await
      .map_err(|e| Error::Media(Box::new(e)))?;
    rows
      .into_iter()
      .map(MediaRecord::from_row)
      .collect::<Result<_>>()
      .map_err(Error::into_media)
  }

  /// Every usable media item for `association`, in id order.
  pub async fn resolve(&self, association: &Association) -> Result<Vec<ResolvedMedia>> {
    let records = self.records(MEDIA_SQL, association).await?;
    let total = records.len();
    let media: Vec<ResolvedMedia> = records
      .into_iter()
      .filter_map(|r| resolve_record(r, self.video_strip_prefix))
      .collect();
    tracing::debug!(
      association = association.type_tag(),
      key = %association.key(),
      rows = total,
      resolved = media.len(),
      "resolved media"
    );
    Ok(media)
  }

  /// A single representative image URI for `association`: the first media
  /// row, inlined if it carries a payload. Video rows never yield a preview;
  /// missing or unrecognised kinds are labelled `image/jpeg`.
  pub async fn preview(&self, association: &Association) -> Result<Option<String>> {
    let Some(record) = self.records(PREVIEW_SQL, association).await?.into_iter().next() else {
      return Ok(None);
    };
    let format = match record.media_kind.as_deref().and_then(MediaKind::parse) {
      Some(MediaKind::Mp4) => return Ok(None),
      Some(kind) if kind.is_image() => kind,
      _ => MediaKind::Jpeg,
    };
    Ok(record.payload.map(|p| image_data_uri(&format.to_string(), &p)))
  }
}
