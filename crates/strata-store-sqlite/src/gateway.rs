//! [`SqliteGateway`] — the SQLite implementation of [`QueryGateway`].

use std::{future::Future, path::Path};

use strata_core::{
  gateway::QueryGateway,
  value::{Row, SqlValue},
};

use crate::{
  Result,
  encode::{from_sqlite, to_sqlite},
  schema::SCHEMA,
};

/// A query gateway backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Each
/// [`execute`](QueryGateway::execute) holds the connection only for the
/// duration of its closure.
#[derive(Clone)]
pub struct SqliteGateway {
  conn: tokio_rusqlite::Connection,
}

impl SqliteGateway {
  /// Open (or create) a store at `path` and ensure the schema exists.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let gateway = Self { conn };
    gateway.execute_batch(SCHEMA).await?;
    Ok(gateway)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let gateway = Self { conn };
    gateway.execute_batch(SCHEMA).await?;
    Ok(gateway)
  }

  /// Run a batch of semicolon-separated statements without parameters.
  pub async fn execute_batch(&self, sql: impl Into<String>) -> Result<()> {
    let sql = sql.into();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run one parameterised statement and return the number of changed rows.
  pub async fn execute_update(&self, sql: impl Into<String>, params: Vec<SqlValue>) -> Result<usize> {
    let sql = sql.into();
    let values: Vec<_> = params.into_iter().map(to_sqlite).collect();
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(values))?))
      .await?;
    Ok(changed)
  }

  async fn query(&self, sql: String, params: Vec<SqlValue>) -> Result<Vec<Row>> {
    let values: Vec<_> = params.into_iter().map(to_sqlite).collect();

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let names: Vec<String> =
          stmt.column_names().into_iter().map(str::to_owned).collect();

        let rows = stmt
          .query_map(rusqlite::params_from_iter(values), |row| {
            let mut out = Row::new();
            for (i, name) in names.iter().enumerate() {
              out.push(name.clone(), from_sqlite(row.get_ref(i)?));
            }
            Ok(out)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    tracing::trace!(rows = rows.len(), "sqlite query complete");
    Ok(rows)
  }
}

impl QueryGateway for SqliteGateway {
  type Error = crate::Error;

  fn execute(
    &self,
    sql: String,
    params: Vec<SqlValue>,
  ) -> impl Future<Output = Result<Vec<Row>>> + Send + '_ {
    self.query(sql, params)
  }
}
