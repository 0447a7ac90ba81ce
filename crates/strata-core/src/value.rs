//! Dynamically-typed values exchanged with a [`QueryGateway`].
//!
//! Rows come back from the store as ordered `(column, value)` pairs. Entity
//! types decode themselves from a [`Row`] through [`FromRow`], mirroring the
//! five SQLite storage classes.
//!
//! [`QueryGateway`]: crate::gateway::QueryGateway

use bytes::Bytes;

use crate::{Error, Result};

// ─── SqlValue ────────────────────────────────────────────────────────────────

/// A single bound parameter or column value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
  /// Binary payloads are always materialised into one contiguous buffer.
  Blob(Bytes),
}

impl SqlValue {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  /// Render a scalar as text. Blobs and nulls have no text form.
  pub fn to_text(&self) -> Option<String> {
    match self {
      Self::Text(s) => Some(s.clone()),
      Self::Integer(i) => Some(i.to_string()),
      Self::Real(f) => Some(f.to_string()),
      Self::Null | Self::Blob(_) => None,
    }
  }
}

impl From<&str> for SqlValue {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for SqlValue {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<i64> for SqlValue {
  fn from(i: i64) -> Self { Self::Integer(i) }
}

impl From<f64> for SqlValue {
  fn from(f: f64) -> Self { Self::Real(f) }
}

impl From<Bytes> for SqlValue {
  fn from(b: Bytes) -> Self { Self::Blob(b) }
}

impl From<Vec<u8>> for SqlValue {
  fn from(b: Vec<u8>) -> Self { Self::Blob(Bytes::from(b)) }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

// ─── Row ─────────────────────────────────────────────────────────────────────

/// One result row: column names in projection order, each with its value.
///
/// Missing columns read as `NULL`, so optional attributes decode to `None`
/// whether the store returned `NULL` or omitted the column entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
  columns: Vec<(String, SqlValue)>,
}

impl Row {
  pub fn new() -> Self { Self::default() }

  pub fn push(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
    self.columns.push((name.into(), value.into()));
  }

  /// Builder form of [`Row::push`].
  pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
    self.push(name, value);
    self
  }

  pub fn len(&self) -> usize { self.columns.len() }

  pub fn is_empty(&self) -> bool { self.columns.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
    self.columns.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn get(&self, name: &str) -> Option<&SqlValue> {
    self.columns.iter().find(|(k, _)| k == name).map(|(_, v)| v)
  }

  /// Move a value out of the row, leaving `NULL` behind.
  pub fn take(&mut self, name: &str) -> SqlValue {
    self
      .columns
      .iter_mut()
      .find(|(k, _)| k == name)
      .map(|(_, v)| std::mem::replace(v, SqlValue::Null))
      .unwrap_or(SqlValue::Null)
  }

  // ── Typed accessors ───────────────────────────────────────────────────────

  /// Text column; numbers are rendered, since imported codes are sometimes
  /// stored with numeric affinity.
  pub fn opt_text(&self, name: &str) -> Result<Option<String>> {
    match self.get(name) {
      None | Some(SqlValue::Null) => Ok(None),
      Some(SqlValue::Blob(_)) => Err(Error::decode(name, "expected text, found blob")),
      Some(v) => Ok(v.to_text()),
    }
  }

  pub fn text(&self, name: &str) -> Result<String> {
    self
      .opt_text(name)?
      .ok_or_else(|| Error::decode(name, "unexpected NULL"))
  }

  pub fn opt_i64(&self, name: &str) -> Result<Option<i64>> {
    match self.get(name) {
      None | Some(SqlValue::Null) => Ok(None),
      Some(SqlValue::Integer(i)) => Ok(Some(*i)),
      Some(SqlValue::Real(f)) => integral(*f)
        .map(Some)
        .ok_or_else(|| Error::decode(name, format!("not an integer in range: {f}"))),
      Some(SqlValue::Text(s)) => s
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| Error::decode(name, format!("not an integer: {s:?}"))),
      Some(other) => Err(Error::decode(name, format!("expected integer, found {other:?}"))),
    }
  }

  pub fn i64(&self, name: &str) -> Result<i64> {
    self
      .opt_i64(name)?
      .ok_or_else(|| Error::decode(name, "unexpected NULL"))
  }

  pub fn opt_f64(&self, name: &str) -> Result<Option<f64>> {
    match self.get(name) {
      None | Some(SqlValue::Null) => Ok(None),
      Some(SqlValue::Real(f)) => Ok(Some(*f)),
      Some(SqlValue::Integer(i)) => Ok(Some(*i as f64)),
      Some(SqlValue::Text(s)) if s.trim().is_empty() => Ok(None),
      Some(SqlValue::Text(s)) => s
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| Error::decode(name, format!("not a number: {s:?}"))),
      Some(SqlValue::Blob(_)) => Err(Error::decode(name, "expected number, found blob")),
    }
  }

  /// Take a binary column out of the row. Text is accepted as its UTF-8
  /// bytes; empty payloads read as absent.
  pub fn take_blob(&mut self, name: &str) -> Result<Option<Bytes>> {
    let bytes = match self.take(name) {
      SqlValue::Null => return Ok(None),
      SqlValue::Blob(b) => b,
      SqlValue::Text(s) => Bytes::from(s.into_bytes()),
      other => {
        return Err(Error::decode(name, format!("expected blob, found {other:?}")));
      }
    };
    Ok((!bytes.is_empty()).then_some(bytes))
  }
}

/// `f` as an `i64`, if it is whole and representable. The upper bound is
/// exclusive since `i64::MAX as f64` rounds up to 2^63.
fn integral(f: f64) -> Option<i64> {
  const LIMIT: f64 = 9_223_372_036_854_775_808.0;
  (f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then(|| f as i64)
}

/// Decode a typed record from a gateway row.
pub trait FromRow: Sized {
  fn from_row(row: Row) -> Result<Self>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_and_null_columns_read_as_none() {
    let row = Row::new().with("a", SqlValue::Null);
    assert_eq!(row.opt_text("a").unwrap(), None);
    assert_eq!(row.opt_text("b").unwrap(), None);
    assert!(row.text("a").is_err());
  }

  #[test]
  fn numeric_codes_render_as_text() {
    let row = Row::new().with("code", 42_i64);
    assert_eq!(row.text("code").unwrap(), "42");
  }

  #[test]
  fn numbers_parse_from_text() {
    let row = Row::new().with("si", " 61.5 ").with("id", "7").with("blank", "");
    assert_eq!(row.opt_f64("si").unwrap(), Some(61.5));
    assert_eq!(row.i64("id").unwrap(), 7);
    assert_eq!(row.opt_f64("blank").unwrap(), None);
  }

  #[test]
  fn whole_reals_read_as_integers_within_range() {
    let row = Row::new()
      .with("whole", 42.0)
      .with("min", -9_223_372_036_854_775_808.0)
      .with("fraction", 1.5)
      .with("huge", 1e19)
      .with("nan", f64::NAN);
    assert_eq!(row.opt_i64("whole").unwrap(), Some(42));
    assert_eq!(row.opt_i64("min").unwrap(), Some(i64::MIN));
    assert!(matches!(row.opt_i64("fraction"), Err(Error::Decode { .. })));
    assert!(matches!(row.opt_i64("huge"), Err(Error::Decode { .. })));
    assert!(matches!(row.opt_i64("nan"), Err(Error::Decode { .. })));
  }

  #[test]
  fn take_blob_moves_payload_out() {
    let mut row = Row::new().with("payload", vec![1_u8, 2, 3]);
    let blob = row.take_blob("payload").unwrap();
    assert_eq!(blob.as_deref(), Some(&[1_u8, 2, 3][..]));
    assert!(row.get("payload").unwrap().is_null());
  }

  #[test]
  fn empty_blob_is_absent() {
    let mut row = Row::new().with("payload", Vec::<u8>::new());
    assert_eq!(row.take_blob("payload").unwrap(), None);
  }
}
