use std::{
    error::Error as StdError,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use dialectkit_core::{
    Connection, ConnectionManager, ConnectivityError, ExecutionError, Result, RowSet,
    TabularResult,
};

pub const BEGIN_SQL: &str = "BEGIN";
pub const COMMIT_SQL: &str = "COMMIT";
pub const ROLLBACK_SQL: &str = "ROLLBACK";

#[derive(Debug, Clone)]
enum Failure {
    Rejected(String),
    Disconnected,
}

#[derive(Debug, Clone)]
struct FailureRule {
    sql: String,
    failure: Failure,
}

#[derive(Debug, Clone)]
struct QueryResponse {
    fragment: String,
    rows: RowSet,
}

#[derive(Debug, Default)]
struct BackendState {
    executed_sql: Vec<String>,
    queried_sql: Vec<String>,
    responses: Vec<QueryResponse>,
    failures: Vec<FailureRule>,
    refuse_connections: bool,
    fail_ping: bool,
    columnar: bool,
    connects: usize,
    begin_count: usize,
    commit_count: usize,
    rollback_count: usize,
}

/// Shared in-memory backend recording everything its connections run.
///
/// Clones observe the same state, so a test keeps one handle while the pool
/// owns the manager.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn manager(&self) -> FakeManager {
        FakeManager {
            backend: self.clone(),
        }
    }

    /// Answers every query whose text contains `fragment` with `rows`. Later
    /// registrations win.
    pub fn respond_to(&self, fragment: impl Into<String>, rows: RowSet) {
        self.state().responses.push(QueryResponse {
            fragment: fragment.into(),
            rows,
        });
    }

    /// The backend rejects exactly `sql` with `message`.
    pub fn fail_on_sql(&self, sql: impl Into<String>, message: impl Into<String>) {
        self.state().failures.push(FailureRule {
            sql: sql.into(),
            failure: Failure::Rejected(message.into()),
        });
    }

    /// The connection drops while running exactly `sql`.
    pub fn disconnect_on_sql(&self, sql: impl Into<String>) {
        self.state().failures.push(FailureRule {
            sql: sql.into(),
            failure: Failure::Disconnected,
        });
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    pub fn set_refuse_connections(&self, refuse: bool) {
        self.state().refuse_connections = refuse;
    }

    pub fn set_fail_ping(&self, fail: bool) {
        self.state().fail_ping = fail;
    }

    /// Lets connections answer `fetch_columnar` natively.
    pub fn set_columnar(&self, columnar: bool) {
        self.state().columnar = columnar;
    }

    #[must_use]
    pub fn executed_sql(&self) -> Vec<String> {
        self.state().executed_sql.clone()
    }

    /// Executed statements other than transaction control.
    #[must_use]
    pub fn executed_statements(&self) -> Vec<String> {
        self.state()
            .executed_sql
            .iter()
            .filter(|sql| ![BEGIN_SQL, COMMIT_SQL, ROLLBACK_SQL].contains(&sql.as_str()))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn queried_sql(&self) -> Vec<String> {
        self.state().queried_sql.clone()
    }

    #[must_use]
    pub fn connects(&self) -> usize {
        self.state().connects
    }

    #[must_use]
    pub fn begin_count(&self) -> usize {
        self.state().begin_count
    }

    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.state().commit_count
    }

    #[must_use]
    pub fn rollback_count(&self) -> usize {
        self.state().rollback_count
    }

    fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run(&self, sql: &str) -> Result<()> {
        let mut state = self.state();
        if let Some(rule) = state.failures.iter().find(|rule| rule.sql == sql) {
            return Err(match &rule.failure {
                Failure::Rejected(message) => ExecutionError::statement_failed(
                    0,
                    sql,
                    0,
                    FakeSourceError(message.clone()),
                )
                .into(),
                Failure::Disconnected => ConnectivityError::unreachable(
                    "execute",
                    FakeSourceError("connection reset by peer".to_string()),
                )
                .into(),
            });
        }

        state.executed_sql.push(sql.to_string());
        match sql {
            BEGIN_SQL => state.begin_count += 1,
            COMMIT_SQL => state.commit_count += 1,
            ROLLBACK_SQL => state.rollback_count += 1,
            _ => {}
        }
        Ok(())
    }

    fn answer(&self, sql: &str) -> Result<RowSet> {
        let mut state = self.state();
        if let Some(rule) = state.failures.iter().find(|rule| rule.sql == sql) {
            return Err(match &rule.failure {
                Failure::Rejected(message) => ExecutionError::statement_failed(
                    0,
                    sql,
                    0,
                    FakeSourceError(message.clone()),
                )
                .into(),
                Failure::Disconnected => ConnectivityError::unreachable(
                    "query",
                    FakeSourceError("connection reset by peer".to_string()),
                )
                .into(),
            });
        }

        state.queried_sql.push(sql.to_string());
        Ok(state
            .responses
            .iter()
            .rev()
            .find(|response| sql.contains(&response.fragment))
            .map(|response| response.rows.clone())
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct FakeManager {
    backend: FakeBackend,
}

impl FakeManager {
    #[must_use]
    pub const fn backend(&self) -> &FakeBackend {
        &self.backend
    }
}

impl ConnectionManager for FakeManager {
    type Connection = FakeConnection;

    fn connect(&self) -> Result<Self::Connection> {
        let mut state = self.backend.state();
        if state.refuse_connections {
            return Err(ConnectivityError::unreachable(
                "connect",
                FakeSourceError("connection refused".to_string()),
            )
            .into());
        }
        state.connects += 1;
        Ok(FakeConnection {
            backend: self.backend.clone(),
            id: state.connects,
        })
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    backend: FakeBackend,
    id: usize,
}

impl FakeConnection {
    /// 1-based order in which the manager opened this connection.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }
}

impl Connection for FakeConnection {
    fn execute(&mut self, sql: &str) -> Result<()> {
        self.backend.run(sql)
    }

    fn query(&mut self, sql: &str) -> Result<RowSet> {
        self.backend.answer(sql)
    }

    fn ping(&mut self) -> Result<()> {
        if self.backend.state().fail_ping {
            return Err(ConnectivityError::unreachable(
                "ping",
                FakeSourceError("listener is not answering".to_string()),
            )
            .into());
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.backend.run(BEGIN_SQL)
    }

    fn commit(&mut self) -> Result<()> {
        self.backend.run(COMMIT_SQL)
    }

    fn rollback(&mut self) -> Result<()> {
        self.backend.run(ROLLBACK_SQL)
    }

    fn fetch_columnar(&mut self, sql: &str) -> Result<TabularResult> {
        if !self.backend.state().columnar {
            return Err(dialectkit_core::UnsupportedOperationError::new(
                "columnar fetch",
                "fake",
                "columnar fetch is disabled on this backend",
            )
            .into());
        }
        self.backend.answer(sql).map(TabularResult::from_rows)
    }
}

#[derive(Debug)]
struct FakeSourceError(String);

impl fmt::Display for FakeSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for FakeSourceError {}
