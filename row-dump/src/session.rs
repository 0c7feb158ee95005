//! Seam between the handler and the database client.
//!
//! The handler only sees these traits, so a recording double can stand in
//! for MySQL in tests.

use crate::error::QueryError;
use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt;

/// One result row: column name to value, in column order.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub ordinal: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub fields: Vec<FieldInfo>,
}

#[derive(Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Opens a fresh, unshared session per call.
pub trait Connector: Send + Sync + 'static {
    type Session: Session;

    fn connect<'a>(
        &'a self,
        params: &'a ConnectionParams,
    ) -> BoxFuture<'a, Result<Self::Session, QueryError>>;
}

pub trait Session: Send + 'static {
    fn query<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, Result<QueryResult, QueryError>>;

    /// Releases the connection. Consumes the session so it cannot be reused.
    fn close(self) -> BoxFuture<'static, Result<(), QueryError>>
    where
        Self: Sized;
}
