//! Text-format Postgres values to JSON.
//!
//! Statements run over the simple query protocol, so every value arrives as
//! text and only the column type decides how it is rendered.

use serde_json::{Map, Number, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use super::models::QueryResult;

/// Render one text value according to its Postgres type name.
pub fn text_to_json(type_name: &str, text: String) -> Value {
    match type_name {
        "BOOL" => match text.as_str() {
            "t" | "true" => Value::Bool(true),
            "f" | "false" => Value::Bool(false),
            _ => Value::String(text),
        },
        "INT2" | "INT4" | "INT8" | "OID" => match text.parse::<i64>() {
            Ok(n) => Value::Number(n.into()),
            Err(_) => Value::String(text),
        },
        "FLOAT4" | "FLOAT8" | "NUMERIC" => match text.parse::<f64>().ok().and_then(Number::from_f64) {
            Some(n) => Value::Number(n),
            // NaN, Infinity
            None => Value::String(text),
        },
        "JSON" | "JSONB" => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        _ => Value::String(text),
    }
}

pub fn row_to_json(row: &PgRow) -> Result<Map<String, Value>, sqlx::Error> {
    let mut object = Map::with_capacity(row.len());

    for (idx, column) in row.columns().iter().enumerate() {
        let value = if row.try_get_raw(idx)?.is_null() {
            Value::Null
        } else {
            let text: String = row.try_get_unchecked(idx)?;
            text_to_json(column.type_info().name(), text)
        };
        object.insert(column.name().to_string(), value);
    }

    Ok(object)
}

/// Rows to keep out of `total`, and whether any were cut. `max_rows == 0` keeps all.
pub fn row_limit(total: usize, max_rows: usize) -> (usize, bool) {
    if max_rows == 0 || max_rows >= total {
        (total, false)
    } else {
        (max_rows, true)
    }
}

/// Convert fetched rows, keeping at most `max_rows` (0 = all).
pub fn rows_to_result(rows: &[PgRow], max_rows: usize) -> Result<QueryResult, sqlx::Error> {
    let columns = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let (limit, truncated) = row_limit(rows.len(), max_rows);
    let converted = rows[..limit]
        .iter()
        .map(row_to_json)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QueryResult {
        columns,
        rows: converted,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(text_to_json("BOOL", "t".into()), json!(true));
        assert_eq!(text_to_json("BOOL", "f".into()), json!(false));
        assert_eq!(text_to_json("INT4", "42".into()), json!(42));
        assert_eq!(text_to_json("INT8", "-9000000000".into()), json!(-9_000_000_000i64));
        assert_eq!(text_to_json("FLOAT8", "1.5".into()), json!(1.5));
        assert_eq!(text_to_json("NUMERIC", "12.25".into()), json!(12.25));
    }

    #[test]
    fn test_non_finite_floats_stay_text() {
        assert_eq!(text_to_json("FLOAT8", "NaN".into()), json!("NaN"));
        assert_eq!(text_to_json("FLOAT4", "Infinity".into()), json!("Infinity"));
    }

    #[test]
    fn test_json_columns_are_parsed() {
        assert_eq!(
            text_to_json("JSONB", r#"{"a": [1, 2]}"#.into()),
            json!({"a": [1, 2]})
        );
    }

    #[test]
    fn test_other_types_are_text() {
        assert_eq!(text_to_json("TEXT", "hello".into()), json!("hello"));
        assert_eq!(
            text_to_json("TIMESTAMPTZ", "2026-01-01 00:00:00+00".into()),
            json!("2026-01-01 00:00:00+00")
        );
        assert_eq!(
            text_to_json("UUID", "67e55044-10b1-426f-9247-bb680e5fe0c8".into()),
            json!("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );
    }

    #[test]
    fn test_row_limit() {
        assert_eq!(row_limit(10, 0), (10, false));
        assert_eq!(row_limit(10, 3), (3, true));
        assert_eq!(row_limit(10, 10), (10, false));
        assert_eq!(row_limit(10, 50), (10, false));
        assert_eq!(row_limit(0, 5), (0, false));
    }

    #[test]
    fn test_empty_result() {
        let result = rows_to_result(&[], 0).unwrap();
        assert!(result.columns.is_empty());
        assert!(result.rows.is_empty());
        assert!(!result.truncated);
    }
}
