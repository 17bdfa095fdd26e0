use chrono::NaiveDate;
use mysql::{Opts, OptsBuilder, Params, Value};
use r2d2_mysql::MySqlConnectionManager;

pub mod procedures;

pub type Connection = mysql::Conn;

pub type DbPool = r2d2::Pool<MySqlConnectionManager>;

#[cfg(not(feature = "mockdata"))]
pub type DbPooledConnection = r2d2::PooledConnection<MySqlConnectionManager>;

pub fn init_db_pool(db_url: &str) -> DbPool {
    log::info!("Configuring database.");
    let opts = Opts::from_url(db_url).expect("Invalid DATABASE_URL value.");
    let manager = MySqlConnectionManager::new(OptsBuilder::from_opts(opts));
    let pool = r2d2::Pool::builder().build(manager).expect("Failed to create pool.");

    pool
}

/// Positional parameters for the driver; `Params::Empty` when there are none.
pub fn to_params(values: Vec<Value>) -> Params {
    if values.is_empty() {
        Params::Empty
    } else {
        Params::Positional(values)
    }
}

/// Extract an integer from a driver value, if it holds one.
pub fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Int(v) => Some(*v),
        Value::UInt(v) => i64::try_from(*v).ok(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).parse::<i64>().ok(),
        _ => None,
    }
}

/// Extract a string from a driver value, if it holds one.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// Convert a driver value to its JSON representation.
///
/// Temporal values are rendered as `%Y-%m-%d %H:%M:%S` strings, which is the
/// format the clients of this API have always received.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::NULL => serde_json::Value::Null,
        Value::Bytes(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()),
        Value::Int(v) => serde_json::Value::from(*v),
        Value::UInt(v) => serde_json::Value::from(*v),
        Value::Float(v) => serde_json::Value::from(*v as f64),
        Value::Double(v) => serde_json::Value::from(*v),
        Value::Date(year, month, day, hour, minute, second, _micros) => {
            let text = NaiveDate::from_ymd_opt(*year as i32, *month as u32, *day as u32)
                .and_then(|date| date.and_hms_opt(*hour as u32, *minute as u32, *second as u32))
                .map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            serde_json::Value::String(text)
        }
        Value::Time(negative, days, hours, minutes, seconds, _micros) => {
            let sign = if *negative { "-" } else { "" };
            let hours = (*days as u64) * 24 + (*hours as u64);
            serde_json::Value::String(format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds))
        }
    }
}

#[cfg(not(feature = "mockdata"))]
pub use self::query::{query_one, query_rows};

#[cfg(not(feature = "mockdata"))]
mod query {
    use mysql::prelude::Queryable;
    use mysql::{Row, Value};

    use super::{to_params, value_to_json, Connection};

    /// Run a read-only statement and return each row as a JSON object keyed
    /// by column name.
    pub fn query_rows(
        conn: &mut Connection,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Vec<serde_json::Value>, String> {
        let rows: Vec<Row> = conn.exec(sql, to_params(params)).map_err(|e| e.to_string())?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    /// Run a read-only statement and return the first row, if any.
    pub fn query_one(
        conn: &mut Connection,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Option<serde_json::Value>, String> {
        let rows = query_rows(conn, sql, params)?;
        Ok(rows.into_iter().next())
    }

    fn row_to_json(row: &Row) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (index, column) in row.columns_ref().iter().enumerate() {
            let value = row.as_ref(index).cloned().unwrap_or(Value::NULL);
            object.insert(column.name_str().into_owned(), value_to_json(&value));
        }
        serde_json::Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_to_i64_accepts_numeric_and_textual_values() {
        assert_eq!(value_to_i64(&Value::Int(-7)), Some(-7));
        assert_eq!(value_to_i64(&Value::UInt(42)), Some(42));
        assert_eq!(value_to_i64(&Value::Bytes(b"1001".to_vec())), Some(1001));
        assert_eq!(value_to_i64(&Value::NULL), None);
        assert_eq!(value_to_i64(&Value::Bytes(b"abc".to_vec())), None);
    }

    #[test]
    fn test_value_to_json_formats_datetime() {
        let value = Value::Date(2024, 3, 9, 18, 5, 7, 0);
        assert_eq!(
            value_to_json(&value),
            serde_json::Value::String("2024-03-09 18:05:07".to_string())
        );
    }

    #[test]
    fn test_value_to_json_passes_scalars_through() {
        assert_eq!(value_to_json(&Value::NULL), serde_json::Value::Null);
        assert_eq!(value_to_json(&Value::Int(5)), serde_json::Value::from(5));
        assert_eq!(
            value_to_json(&Value::Bytes(b"alice".to_vec())),
            serde_json::Value::String("alice".to_string())
        );
    }
}
