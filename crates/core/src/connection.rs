use std::{
    ops::{Deref, DerefMut},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{ConnectivityError, Error, Result, UnsupportedOperationError};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Integer(value) => u64::try_from(*value).ok(),
            Self::Float(value) if value.fract() == 0.0 && *value >= 0.0 => {
                format!("{value:.0}").parse().ok()
            }
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub type_name: String,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Row-major result of the generic driver path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.name.eq_ignore_ascii_case(name))
    }
}

/// Column-major result handed to dataframe consumers; the shape mirrors what
/// the driver reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularResult {
    pub columns: Vec<ColumnMeta>,
    pub values: Vec<Vec<Value>>,
    pub row_count: usize,
}

impl TabularResult {
    #[must_use]
    pub fn from_rows(rows: RowSet) -> Self {
        let row_count = rows.rows.len();
        let mut values = vec![Vec::with_capacity(row_count); rows.columns.len()];
        for row in rows.rows {
            for (column, value) in values.iter_mut().zip(row) {
                column.push(value);
            }
        }

        Self {
            columns: rows.columns,
            values,
            row_count,
        }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .position(|column| column.name == name)
            .and_then(|index| self.values.get(index))
            .map(Vec::as_slice)
    }
}

/// Pre-compiled statement text from an external query builder. Passed through
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Query {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Query {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One physical connection. Network or driver failures must surface as
/// `Error::Connectivity`; statements the backend rejects as
/// `Error::Execute`.
pub trait Connection: Send {
    fn execute(&mut self, sql: &str) -> Result<()>;
    fn query(&mut self, sql: &str) -> Result<RowSet>;
    fn ping(&mut self) -> Result<()>;
    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;

    /// Columnar fetch straight from the driver, for drivers that have one.
    fn fetch_columnar(&mut self, sql: &str) -> Result<TabularResult> {
        let _ = sql;
        Err(UnsupportedOperationError::new(
            "columnar fetch",
            "connection",
            "the driver only produces rows",
        )
        .into())
    }
}

pub trait ConnectionManager: Send + Sync + 'static {
    type Connection: Connection + 'static;

    fn connect(&self) -> Result<Self::Connection>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    pub max_size: usize,
    /// How long a checkout waits for a free or freshly opened connection.
    pub checkout_timeout_secs: u64,
}

impl PoolConfig {
    #[must_use]
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 4,
            checkout_timeout_secs: 30,
        }
    }
}

/// Granularity at which a waiting checkout looks for connect failures.
const CONNECT_FAILURE_POLL: Duration = Duration::from_millis(50);

/// A pooled connection plus the flag `observe` raises after a connectivity
/// failure.
struct Slot<C> {
    connection: C,
    broken: bool,
}

/// `r2d2` view of a [`ConnectionManager`].
struct PoolManager<M> {
    manager: M,
}

impl<M: ConnectionManager> r2d2::ManageConnection for PoolManager<M> {
    type Connection = Slot<M::Connection>;
    type Error = Error;

    fn connect(&self) -> Result<Self::Connection> {
        let connection = self.manager.connect()?;
        debug!("opened pooled connection");
        Ok(Slot {
            connection,
            broken: false,
        })
    }

    fn is_valid(&self, slot: &mut Self::Connection) -> Result<()> {
        slot.connection.ping()
    }

    fn has_broken(&self, slot: &mut Self::Connection) -> bool {
        if slot.broken {
            warn!("discarding pooled connection after connectivity failure");
        }
        slot.broken
    }
}

/// Keeps the most recent connect failure so a checkout can report the
/// backend's own error instead of a bare timeout.
#[derive(Debug, Clone, Default)]
struct ConnectFailures(Arc<Mutex<Option<Error>>>);

impl ConnectFailures {
    fn slot(&self) -> MutexGuard<'_, Option<Error>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clear(&self) {
        self.slot().take();
    }

    fn take(&self) -> Option<Error> {
        self.slot().take()
    }
}

impl r2d2::HandleError<Error> for ConnectFailures {
    fn handle_error(&self, error: Error) {
        warn!(error = %error, "could not open pooled connection");
        *self.slot() = Some(error);
    }
}

/// Blocking connection pool over `r2d2`. Connections open lazily, are never
/// validated on checkout, and stay open until they break.
pub struct ConnectionPool<M: ConnectionManager> {
    inner: r2d2::Pool<PoolManager<M>>,
    failures: ConnectFailures,
    checkout_timeout: Duration,
}

impl<M: ConnectionManager> ConnectionPool<M> {
    pub fn new(manager: M, config: PoolConfig) -> Self {
        let failures = ConnectFailures::default();
        let max_size = u32::try_from(config.max_size.max(1)).unwrap_or(u32::MAX);
        let checkout_timeout = Duration::from_secs(config.checkout_timeout_secs.max(1));
        let inner = r2d2::Pool::builder()
            .max_size(max_size)
            .min_idle(Some(0))
            .test_on_check_out(false)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_timeout(checkout_timeout)
            .error_handler(Box::new(failures.clone()))
            .build_unchecked(PoolManager { manager });

        Self {
            inner,
            failures,
            checkout_timeout,
        }
    }

    /// Hands out an idle connection, opens a new one below `max_size`, or
    /// waits for one to come back. A refused connect fails the checkout
    /// with the manager's error.
    pub fn checkout(&self) -> Result<PooledConnection<M>> {
        self.failures.clear();
        let deadline = Instant::now() + self.checkout_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.inner.get_timeout(remaining.min(CONNECT_FAILURE_POLL)) {
                Ok(inner) => return Ok(PooledConnection { inner }),
                Err(_) => {
                    if let Some(error) = self.failures.take() {
                        return Err(error);
                    }
                    if remaining <= CONNECT_FAILURE_POLL {
                        return Err(ConnectivityError::TimedOut {
                            operation: "connection checkout".to_string(),
                            timeout: self.checkout_timeout,
                        }
                        .into());
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn idle_connections(&self) -> usize {
        usize::try_from(self.inner.state().idle_connections).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn open_connections(&self) -> usize {
        usize::try_from(self.inner.state().connections).unwrap_or(usize::MAX)
    }
}

/// Exclusive use of one pooled connection; returned to the pool on drop
/// unless marked broken.
pub struct PooledConnection<M: ConnectionManager> {
    inner: r2d2::PooledConnection<PoolManager<M>>,
}

impl<M: ConnectionManager> PooledConnection<M> {
    /// Discards the connection instead of returning it.
    pub fn mark_broken(&mut self) {
        self.inner.broken = true;
    }

    /// Marks the connection broken when `result` carries a connectivity
    /// failure, then hands the result back untouched.
    pub fn observe<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(error) = &result
            && error.is_connectivity()
        {
            self.mark_broken();
        }
        result
    }
}

impl<M: ConnectionManager> Deref for PooledConnection<M> {
    type Target = M::Connection;

    fn deref(&self) -> &Self::Target {
        &self.inner.connection
    }
}

impl<M: ConnectionManager> DerefMut for PooledConnection<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner.connection
    }
}
