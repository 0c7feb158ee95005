use crate::error::QueryError;
use crate::session::{ConnectionParams, Connector, FieldInfo, QueryResult, Row, Session};
use futures::future::BoxFuture;
use serde_json::Value;
use sqlx::mysql::types::{MySqlTime, MySqlTimeSign};
use sqlx::mysql::{MySqlColumn, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::types::chrono::{NaiveDate, NaiveDateTime};
use sqlx::{Column, Connection, Executor, Row as _, Statement, TypeInfo, ValueRef};
use tracing::debug;

/// Opens a dedicated MySQL connection for every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlConnector;

pub struct MySqlSession {
    conn: MySqlConnection,
}

impl Connector for MySqlConnector {
    type Session = MySqlSession;

    fn connect<'a>(
        &'a self,
        params: &'a ConnectionParams,
    ) -> BoxFuture<'a, Result<MySqlSession, QueryError>> {
        Box::pin(async move {
            let opts = MySqlConnectOptions::new()
                .host(&params.host)
                .port(params.port)
                .username(&params.user)
                .password(&params.password)
                .database(&params.database);
            debug!(?params, "Opening MySQL connection");
            let conn = MySqlConnection::connect_with(&opts)
                .await
                .map_err(QueryError::connect)?;
            Ok(MySqlSession { conn })
        })
    }
}

impl Session for MySqlSession {
    fn query<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, Result<QueryResult, QueryError>> {
        Box::pin(async move {
            // Prepare first: column metadata must be available for empty results too
            let stmt = (&mut self.conn)
                .prepare(sql)
                .await
                .map_err(QueryError::query)?;
            let fields: Vec<FieldInfo> = stmt.columns().iter().map(field_info).collect();

            let rows = sqlx::query(sql)
                .fetch_all(&mut self.conn)
                .await
                .map_err(QueryError::query)?;

            let rows = rows
                .iter()
                .map(|row| {
                    let mut out = Row::new();
                    for field in &fields {
                        let value = to_json(decode_mysql_value(row, field.ordinal));
                        out.insert(field.name.clone(), value);
                    }
                    out
                })
                .collect();

            Ok(QueryResult { rows, fields })
        })
    }

    fn close(self) -> BoxFuture<'static, Result<(), QueryError>> {
        Box::pin(async move { self.conn.close().await.map_err(QueryError::close) })
    }
}

fn field_info(col: &MySqlColumn) -> FieldInfo {
    FieldInfo {
        name: col.name().to_string(),
        type_name: col.type_info().name().to_string(),
        ordinal: col.ordinal(),
    }
}

/// Decode strategy for a column, keyed by the sqlx type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Signed,
    Unsigned,
    Float,
    Double,
    Decimal,
    Text,
    Date,
    Time,
    DateTime,
    Json,
    Binary,
    Other,
}

fn column_kind(type_name: &str) -> ColumnKind {
    match type_name {
        // TINYINT(1) is reported as BOOLEAN but stays a 0/1 number in the dump
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => ColumnKind::Signed,
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" | "YEAR" | "BIT" => ColumnKind::Unsigned,
        "FLOAT" => ColumnKind::Float,
        "DOUBLE" => ColumnKind::Double,
        "DECIMAL" => ColumnKind::Decimal,
        "VARCHAR" | "CHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            ColumnKind::Text
        }
        "DATE" => ColumnKind::Date,
        "TIME" => ColumnKind::Time,
        "DATETIME" | "TIMESTAMP" => ColumnKind::DateTime,
        "JSON" => ColumnKind::Json,
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => {
            ColumnKind::Binary
        }
        _ => ColumnKind::Other,
    }
}

/// A column value pulled out of a row, before it is shaped into JSON.
#[derive(Debug, Clone, PartialEq)]
enum Decoded {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    Decimal(String),
    Text(String),
    Date(NaiveDate),
    // MySQL TIME is a signed duration, up to 838:59:59
    Time {
        negative: bool,
        hours: u32,
        minutes: u32,
        seconds: u32,
        micros: u32,
    },
    DateTime(NaiveDateTime),
    Json(Value),
    Bytes(Vec<u8>),
}

fn decode_mysql_value(row: &MySqlRow, idx: usize) -> Decoded {
    let Ok(vr) = row.try_get_raw(idx) else {
        return Decoded::Null;
    };
    if vr.is_null() {
        return Decoded::Null;
    }
    let kind = column_kind(vr.type_info().name());

    let typed = match kind {
        ColumnKind::Signed => row.try_get::<i64, _>(idx).ok().map(Decoded::Int),
        ColumnKind::Unsigned => row.try_get::<u64, _>(idx).ok().map(Decoded::UInt),
        ColumnKind::Float => row.try_get::<f32, _>(idx).ok().map(Decoded::Float),
        ColumnKind::Double => row.try_get::<f64, _>(idx).ok().map(Decoded::Double),
        ColumnKind::Decimal => row
            .try_get::<sqlx::types::BigDecimal, _>(idx)
            .ok()
            .map(|v| Decoded::Decimal(v.to_string())),
        ColumnKind::Text => row.try_get::<String, _>(idx).ok().map(Decoded::Text),
        ColumnKind::Date => row.try_get::<NaiveDate, _>(idx).ok().map(Decoded::Date),
        ColumnKind::Time => row.try_get::<MySqlTime, _>(idx).ok().map(|t| Decoded::Time {
            negative: matches!(t.sign(), MySqlTimeSign::Negative),
            hours: u32::from(t.hours()),
            minutes: u32::from(t.minutes()),
            seconds: u32::from(t.seconds()),
            micros: u32::from(t.microseconds()),
        }),
        ColumnKind::DateTime => row
            .try_get::<NaiveDateTime, _>(idx)
            .ok()
            .map(Decoded::DateTime),
        ColumnKind::Json => row
            .try_get::<sqlx::types::JsonValue, _>(idx)
            .ok()
            .map(Decoded::Json),
        ColumnKind::Binary => row.try_get::<Vec<u8>, _>(idx).ok().map(Decoded::Bytes),
        ColumnKind::Other => None,
    };
    if let Some(v) = typed {
        return v;
    }

    row.try_get::<String, _>(idx)
        .map(Decoded::Text)
        .or_else(|_| row.try_get::<i64, _>(idx).map(Decoded::Int))
        .or_else(|_| row.try_get::<u64, _>(idx).map(Decoded::UInt))
        .or_else(|_| row.try_get::<f64, _>(idx).map(Decoded::Double))
        .or_else(|_| row.try_get::<bool, _>(idx).map(Decoded::Bool))
        .unwrap_or(Decoded::Null)
}

fn to_json(value: Decoded) -> Value {
    match value {
        Decoded::Null => Value::Null,
        Decoded::Bool(v) => Value::Bool(v),
        Decoded::Int(v) => Value::from(v),
        Decoded::UInt(v) => Value::from(v),
        // Widening f32 directly would print 1.1 as 1.100000023841858
        Decoded::Float(v) => v
            .to_string()
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or(Value::Null),
        Decoded::Double(v) => Value::from(v),
        Decoded::Decimal(v) | Decoded::Text(v) => Value::String(v),
        Decoded::Date(v) => Value::String(v.format("%Y-%m-%d").to_string()),
        Decoded::Time {
            negative,
            hours,
            minutes,
            seconds,
            micros,
        } => Value::String(format_time(negative, hours, minutes, seconds, micros)),
        Decoded::DateTime(v) => Value::String(v.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
        Decoded::Json(v) => v,
        Decoded::Bytes(v) => Value::String(format!("0x{}", hex::encode(v))),
    }
}

fn format_time(negative: bool, hours: u32, minutes: u32, seconds: u32, micros: u32) -> String {
    let sign = if negative { "-" } else { "" };
    let mut out = format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds);
    if micros > 0 {
        let frac = format!("{:06}", micros);
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}
