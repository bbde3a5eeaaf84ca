//! SQL Server value mapping.
//!
//! TDS column values are converted to JSON so that every result set, whatever
//! its source query, has one uniform shape:
//!
//! - integers, floats and bits map to JSON numbers and booleans
//! - `DECIMAL`/`NUMERIC` map to strings to keep their exact representation
//! - date and time types map to ISO-8601 strings
//! - `UNIQUEIDENTIFIER` maps to its hyphenated string form
//! - binary data is base64 encoded

use crate::models::Record;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Number, Value as JsonValue};
use tiberius::{ColumnData, FromSql, Row};

/// Convert one result row into a record keyed by `columns`.
pub fn row_to_record(columns: &[String], row: Row) -> Record {
    columns
        .iter()
        .cloned()
        .zip(row.into_iter().map(|data| column_data_to_json(&data)))
        .collect()
}

/// Convert a single TDS value to JSON.
pub fn column_data_to_json(data: &ColumnData<'static>) -> JsonValue {
    match data {
        ColumnData::U8(v) => v.map(JsonValue::from).unwrap_or(JsonValue::Null),
        ColumnData::I16(v) => v.map(JsonValue::from).unwrap_or(JsonValue::Null),
        ColumnData::I32(v) => v.map(JsonValue::from).unwrap_or(JsonValue::Null),
        ColumnData::I64(v) => v.map(JsonValue::from).unwrap_or(JsonValue::Null),
        ColumnData::F32(v) => float_to_json(v.map(f64::from)),
        ColumnData::F64(v) => float_to_json(*v),
        ColumnData::Bit(v) => v.map(JsonValue::Bool).unwrap_or(JsonValue::Null),
        ColumnData::String(v) => string_or_null(v.as_ref().map(|s| s.to_string())),
        ColumnData::Guid(v) => string_or_null(v.as_ref().map(|g| g.to_string())),
        ColumnData::Binary(v) => string_or_null(v.as_ref().map(|b| STANDARD.encode(b))),
        ColumnData::Numeric(v) => string_or_null(v.as_ref().map(|n| n.to_string())),
        ColumnData::Xml(v) => string_or_null(v.as_ref().map(|x| x.to_string())),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            string_or_null(decode::<NaiveDateTime>(data).map(|v| {
                v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
            }))
        }
        ColumnData::Date(_) => string_or_null(decode::<NaiveDate>(data).map(|v| v.to_string())),
        ColumnData::Time(_) => string_or_null(decode::<NaiveTime>(data).map(|v| v.to_string())),
        ColumnData::DateTimeOffset(_) => {
            string_or_null(decode::<DateTime<FixedOffset>>(data).map(|v| v.to_rfc3339()))
        }
    }
}

fn decode<'a, T: FromSql<'a>>(data: &'a ColumnData<'static>) -> Option<T> {
    T::from_sql(data).ok().flatten()
}

fn float_to_json(value: Option<f64>) -> JsonValue {
    value
        .and_then(Number::from_f64)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn string_or_null(value: Option<String>) -> JsonValue {
    value.map(JsonValue::String).unwrap_or(JsonValue::Null)
}
