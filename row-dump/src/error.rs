use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which step of the request's database work failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Connect,
    Query,
    Close,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Connect => "connect",
            Phase::Query => "query",
            Phase::Close => "close",
        };
        f.write_str(s)
    }
}

/// Any failure reported by the database client. Kinds are not distinguished
/// beyond the phase they happened in; the body is echoed to the client as-is.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{phase} failed: {message}")]
pub struct QueryError {
    pub phase: Phase,
    pub message: String,
    // MySQL server error number, e.g. 1146 for a missing table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errno: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_state: Option<String>,
    // Connection-level failure: the session is unusable afterwards
    pub fatal: bool,
}

impl QueryError {
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        QueryError {
            phase,
            message: message.into(),
            errno: None,
            sql_state: None,
            fatal: phase != Phase::Query,
        }
    }

    pub fn from_sqlx(phase: Phase, err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                let errno = db
                    .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
                    .map(|e| e.number());
                QueryError {
                    phase,
                    message: db.message().to_string(),
                    errno,
                    sql_state: db.code().map(|c| c.into_owned()),
                    fatal: phase == Phase::Connect,
                }
            }
            _ => {
                let mut e = QueryError::new(phase, err.to_string());
                e.fatal = true;
                e
            }
        }
    }

    pub fn connect(err: sqlx::Error) -> Self {
        QueryError::from_sqlx(Phase::Connect, err)
    }

    pub fn query(err: sqlx::Error) -> Self {
        QueryError::from_sqlx(Phase::Query, err)
    }

    pub fn close(err: sqlx::Error) -> Self {
        QueryError::from_sqlx(Phase::Close, err)
    }
}
