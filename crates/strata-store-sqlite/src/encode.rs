//! Conversions between [`SqlValue`] and rusqlite's value types.
//!
//! Text is decoded lossily so a stray non-UTF-8 byte in an imported column
//! does not fail the whole row. Blobs are copied into an owned, contiguous
//! buffer before the statement is finalised.

use bytes::Bytes;
use rusqlite::types::{Value, ValueRef};
use strata_core::value::SqlValue;

pub fn to_sqlite(value: SqlValue) -> Value {
  match value {
    SqlValue::Null => Value::Null,
    SqlValue::Integer(i) => Value::Integer(i),
    SqlValue::Real(f) => Value::Real(f),
    SqlValue::Text(s) => Value::Text(s),
    SqlValue::Blob(b) => Value::Blob(b.to_vec()),
  }
}

pub fn from_sqlite(value: ValueRef<'_>) -> SqlValue {
  match value {
    ValueRef::Null => SqlValue::Null,
    ValueRef::Integer(i) => SqlValue::Integer(i),
    ValueRef::Real(f) => SqlValue::Real(f),
    ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
    ValueRef::Blob(b) => SqlValue::Blob(Bytes::copy_from_slice(b)),
  }
}
