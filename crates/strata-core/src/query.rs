//! Parameterised `SELECT` construction from optional named filters.
//!
//! Filters are declared up front in a static [`FilterSpec`] table. The builder
//! walks that table in order, so request fields that are not declared never
//! reach the SQL text, and parameter order always equals clause order.

use std::collections::HashMap;

use crate::value::SqlValue;

// ─── Declarations ────────────────────────────────────────────────────────────

/// How a filter value is compared against its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
  /// `column = ?`
  Exact,
  /// `column LIKE ?` with the value wrapped in `%…%`.
  Contains,
}

/// A recognised filter: request name, target column, match mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
  pub name:   &'static str,
  pub column: &'static str,
  pub mode:   MatchMode,
}

impl FilterSpec {
  pub const fn exact(name: &'static str, column: &'static str) -> Self {
    Self { name, column, mode: MatchMode::Exact }
  }

  pub const fn contains(name: &'static str, column: &'static str) -> Self {
    Self { name, column, mode: MatchMode::Contains }
  }
}

/// One projected column, optionally renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub name:  &'static str,
  pub alias: Option<&'static str>,
}

impl Column {
  pub const fn new(name: &'static str) -> Self { Self { name, alias: None } }

  pub const fn aliased(name: &'static str, alias: &'static str) -> Self {
    Self { name, alias: Some(alias) }
  }

  /// The name the column carries in result rows.
  pub fn output_name(&self) -> &'static str { self.alias.unwrap_or(self.name) }
}

// ─── Filter values ───────────────────────────────────────────────────────────

/// Caller-supplied filter values keyed by filter name.
///
/// Empty strings are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct FilterValues(HashMap<String, String>);

impl FilterValues {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
    self.0.insert(name.into(), value.into());
  }

  pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.insert(name, value);
    self
  }

  /// The value for `name`, if present and non-empty.
  pub fn get(&self, name: &str) -> Option<&str> {
    self.0.get(name).map(String::as_str).filter(|v| !v.is_empty())
  }
}

impl From<HashMap<String, String>> for FilterValues {
  fn from(map: HashMap<String, String>) -> Self { Self(map) }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterValues {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// SQL text plus its positional parameters, in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
  pub sql:    String,
  pub params: Vec<SqlValue>,
}

impl BuiltQuery {
  /// Append `ORDER BY column ASC`.
  pub fn order_by(mut self, column: &str) -> Self {
    self.sql.push_str(&format!(" ORDER BY {} ASC", quote_ident(column)));
    self
  }

  /// Append `LIMIT ?`, binding `limit` after every filter parameter.
  pub fn limit(mut self, limit: u32) -> Self {
    self.sql.push_str(" LIMIT ?");
    self.params.push(SqlValue::Integer(i64::from(limit)));
    self
  }
}

/// Double-quote an identifier for SQL.
pub fn quote_ident(ident: &str) -> String {
  format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Render a projection as a `SELECT` list.
pub fn select_list(projection: &[Column]) -> String {
  projection
    .iter()
    .map(|c| match c.alias {
      Some(alias) => format!("{} AS {}", quote_ident(c.name), quote_ident(alias)),
      None => quote_ident(c.name),
    })
    .collect::<Vec<_>>()
    .join(", ")
}

/// Escape `LIKE` wildcards so the value matches literally.
fn escape_like(value: &str) -> String {
  let mut out = String::with_capacity(value.len() + 2);
  for c in value.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

/// Build `SELECT <projection> FROM <table> WHERE 1=1 [AND …]`.
///
/// Only filters with a present value in `values` emit a clause. Values are
/// always bound, never interpolated; only the fixed identifiers from
/// `projection`, `table` and `filters` appear in the text.
pub fn build(
  projection: &[Column],
  table:      &str,
  filters:    &[FilterSpec],
  values:     &FilterValues,
) -> BuiltQuery {
  let mut sql = format!(
    "SELECT {} FROM {} WHERE 1=1",
    select_list(projection),
    quote_ident(table)
  );
  let mut params = Vec::new();

  for spec in filters {
    let Some(value) = values.get(spec.name) else { continue };
    let column = quote_ident(spec.column);
    match spec.mode {
      MatchMode::Exact => {
        sql.push_str(&format!(" AND {column} = ?"));
        params.push(SqlValue::from(value));
      }
      MatchMode::Contains => {
        sql.push_str(&format!(" AND {column} LIKE ? ESCAPE '\\'"));
        params.push(SqlValue::Text(format!("%{}%", escape_like(value))));
      }
    }
  }

  BuiltQuery { sql, params }
}
