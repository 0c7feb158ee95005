//! Recording stand-in for the database client.

use crate::config::ErrorStatusMode;
use crate::error::{Phase, QueryError};
use crate::session::{ConnectionParams, Connector, FieldInfo, QueryResult, Row, Session};
use crate::state::AppState;
use futures::future::BoxFuture;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub enum Script {
    Rows(QueryResult),
    FailConnect,
    FailQuery,
}

#[derive(Default)]
pub struct Recorder {
    next_id: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub connect_attempts: AtomicUsize,
    pub opened: Mutex<Vec<usize>>,
    pub closed: Mutex<Vec<usize>>,
    pub queries: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn opened(&self) -> Vec<usize> {
        self.opened.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Vec<usize> {
        self.closed.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

pub struct FakeConnector {
    pub script: Script,
    pub recorder: Arc<Recorder>,
    pub query_delay: Duration,
    pub fail_close: bool,
}

impl FakeConnector {
    pub fn new(script: Script) -> Self {
        FakeConnector {
            script,
            recorder: Arc::new(Recorder::default()),
            query_delay: Duration::ZERO,
            fail_close: false,
        }
    }
}

pub struct FakeSession {
    id: usize,
    script: Script,
    recorder: Arc<Recorder>,
    query_delay: Duration,
    fail_close: bool,
}

impl Connector for FakeConnector {
    type Session = FakeSession;

    fn connect<'a>(
        &'a self,
        _params: &'a ConnectionParams,
    ) -> BoxFuture<'a, Result<FakeSession, QueryError>> {
        Box::pin(async move {
            self.recorder.connect_attempts.fetch_add(1, Ordering::SeqCst);
            if matches!(self.script, Script::FailConnect) {
                return Err(QueryError::new(
                    Phase::Connect,
                    "connect ECONNREFUSED 127.0.0.1:3306",
                ));
            }
            let id = self.recorder.next_id.fetch_add(1, Ordering::SeqCst);
            self.recorder.opened.lock().unwrap().push(id);
            Ok(FakeSession {
                id,
                script: self.script.clone(),
                recorder: self.recorder.clone(),
                query_delay: self.query_delay,
                fail_close: self.fail_close,
            })
        })
    }
}

impl Session for FakeSession {
    fn query<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, Result<QueryResult, QueryError>> {
        Box::pin(async move {
            self.recorder.queries.lock().unwrap().push(sql.to_string());

            let now = self.recorder.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.recorder.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.query_delay.is_zero() {
                tokio::time::sleep(self.query_delay).await;
            }
            self.recorder.in_flight.fetch_sub(1, Ordering::SeqCst);

            match &self.script {
                Script::Rows(result) => Ok(result.clone()),
                Script::FailQuery => Err(table_missing()),
                Script::FailConnect => unreachable!("no session exists when connect fails"),
            }
        })
    }

    fn close(self) -> BoxFuture<'static, Result<(), QueryError>> {
        Box::pin(async move {
            self.recorder.closed.lock().unwrap().push(self.id);
            if self.fail_close {
                return Err(QueryError::new(Phase::Close, "connection reset by peer"));
            }
            Ok(())
        })
    }
}

pub fn table_missing() -> QueryError {
    QueryError {
        phase: Phase::Query,
        message: "Table 'test.nodejs_user_test' doesn't exist".to_string(),
        errno: Some(1146),
        sql_state: Some("42S02".to_string()),
        fatal: false,
    }
}

pub fn sample_fields() -> Vec<FieldInfo> {
    vec![
        FieldInfo {
            name: "id".into(),
            type_name: "INT".into(),
            ordinal: 0,
        },
        FieldInfo {
            name: "name".into(),
            type_name: "VARCHAR".into(),
            ordinal: 1,
        },
    ]
}

pub fn sample_result() -> QueryResult {
    let rows = [(1, "kim"), (2, "lee"), (3, "park")]
        .into_iter()
        .map(|(id, name)| {
            let mut r = Row::new();
            r.insert("id".into(), json!(id));
            r.insert("name".into(), json!(name));
            r
        })
        .collect();
    QueryResult {
        rows,
        fields: sample_fields(),
    }
}

pub fn params() -> ConnectionParams {
    ConnectionParams {
        host: "localhost".into(),
        port: 3306,
        user: "root@localhost".into(),
        password: String::new(),
        database: "test".into(),
    }
}

pub fn fake_state(
    connector: FakeConnector,
    mode: ErrorStatusMode,
) -> (Arc<AppState<FakeConnector>>, Arc<Recorder>) {
    let recorder = connector.recorder.clone();
    (Arc::new(AppState::new(connector, params(), mode)), recorder)
}
