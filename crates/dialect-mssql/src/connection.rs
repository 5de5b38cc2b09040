use std::{future::Future, time::Duration};

use dialectkit_core::{
    ColumnMeta, ConfigurationError, Connection, ConnectionConfig, ConnectionManager,
    ConnectivityError, Error, ExecutionError, Result, RowSet, Value,
};
use futures_util::TryStreamExt;
use tiberius::{AuthMethod, Client, ColumnData, Config, QueryItem};
use tokio::{
    net::TcpStream,
    runtime::{Builder, Runtime},
};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

type TdsClient = Client<Compat<TcpStream>>;

const DEFAULT_MSSQL_HOST: &str = "127.0.0.1";
const DEFAULT_MSSQL_PORT: u16 = 1433;
const STATEMENT_TIMEOUT_KEY: &str = "mssql.statement_timeout_ms";
const CONNECTION_DOCUMENT: &str = "mssql connection config";

const PING_SQL: &str = "SELECT 1";
const BEGIN_SQL: &str = "BEGIN TRANSACTION";
const COMMIT_SQL: &str = "COMMIT TRANSACTION";
const ROLLBACK_SQL: &str = "ROLLBACK TRANSACTION";

/// Opens TDS connections for the pool. Settings are validated once, here.
#[derive(Debug, Clone)]
pub struct MssqlManager {
    config: ConnectionConfig,
    statement_timeout: Option<Duration>,
}

impl MssqlManager {
    pub fn new(config: ConnectionConfig) -> std::result::Result<Self, ConfigurationError> {
        if config.user.is_none() {
            return Err(invalid_config("`user` is required"));
        }
        let statement_timeout = config
            .extra_value(STATEMENT_TIMEOUT_KEY)
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|millis| *millis > 0)
                    .map(Duration::from_millis)
                    .ok_or_else(|| {
                        invalid_config(format!(
                            "`{STATEMENT_TIMEOUT_KEY}` must be a positive number of milliseconds, got `{raw}`"
                        ))
                    })
            })
            .transpose()?;

        Ok(Self {
            config,
            statement_timeout,
        })
    }

    #[must_use]
    pub const fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout
    }

    fn tiberius_config(&self) -> Config {
        let mut tds_config = Config::new();
        tds_config.host(self.config.host.as_deref().unwrap_or(DEFAULT_MSSQL_HOST));
        tds_config.port(self.config.port.unwrap_or(DEFAULT_MSSQL_PORT));
        tds_config.database(self.config.database.clone());
        tds_config.authentication(AuthMethod::sql_server(
            self.config.user.clone().unwrap_or_default(),
            self.config.password.clone().unwrap_or_default(),
        ));
        tds_config.trust_cert();
        tds_config
    }
}

impl ConnectionManager for MssqlManager {
    type Connection = MssqlConnection;

    fn connect(&self) -> Result<Self::Connection> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| ConnectivityError::unreachable("connect", source))?;
        let tds_config = self.tiberius_config();
        let address = tds_config.get_addr();

        let client = runtime.block_on(async {
            let tcp = TcpStream::connect(address.as_str())
                .await
                .map_err(|source| ConnectivityError::unreachable("connect", source))?;
            tcp.set_nodelay(true)
                .map_err(|source| ConnectivityError::unreachable("connect", source))?;

            Client::connect(tds_config, tcp.compat_write())
                .await
                .map_err(|source| Error::from(ConnectivityError::unreachable("connect", source)))
        })?;
        debug!(address = %address, "opened mssql connection");

        Ok(MssqlConnection {
            runtime,
            client,
            statement_timeout: self.statement_timeout,
        })
    }
}

/// One TDS session driven by its own current-thread runtime.
pub struct MssqlConnection {
    runtime: Runtime,
    client: TdsClient,
    statement_timeout: Option<Duration>,
}

impl MssqlConnection {
    fn run(&mut self, operation: &str, sql: &str) -> Result<()> {
        let Self {
            runtime,
            client,
            statement_timeout,
        } = self;

        runtime.block_on(with_deadline(operation, *statement_timeout, async {
            let mut stream = client
                .simple_query(sql)
                .await
                .map_err(|source| driver_error(operation, sql, source))?;
            while stream
                .try_next()
                .await
                .map_err(|source| driver_error(operation, sql, source))?
                .is_some()
            {}
            Ok(())
        }))
    }

    fn rows(&mut self, sql: &str) -> Result<RowSet> {
        let Self {
            runtime,
            client,
            statement_timeout,
        } = self;

        runtime.block_on(with_deadline("query", *statement_timeout, async {
            let mut stream = client
                .simple_query(sql)
                .await
                .map_err(|source| driver_error("query", sql, source))?;
            let mut rows = RowSet::default();

            // Only the first result set is kept.
            while let Some(item) = stream
                .try_next()
                .await
                .map_err(|source| driver_error("query", sql, source))?
            {
                match item {
                    QueryItem::Metadata(metadata) if metadata.result_index() == 0 => {
                        rows.columns = metadata
                            .columns()
                            .iter()
                            .map(|column| {
                                ColumnMeta::new(
                                    column.name(),
                                    format!("{:?}", column.column_type()),
                                )
                            })
                            .collect();
                    }
                    QueryItem::Row(row) if row.result_index() == 0 => {
                        rows.rows.push(row.into_iter().map(column_value).collect());
                    }
                    _ => {}
                }
            }

            Ok(rows)
        }))
    }
}

impl Connection for MssqlConnection {
    fn execute(&mut self, sql: &str) -> Result<()> {
        self.run("execute", sql)
    }

    fn query(&mut self, sql: &str) -> Result<RowSet> {
        self.rows(sql)
    }

    fn ping(&mut self) -> Result<()> {
        self.run("ping", PING_SQL).map_err(|error| match error {
            Error::Execute(error) => ConnectivityError::unreachable("ping", error).into(),
            other => other,
        })
    }

    fn begin(&mut self) -> Result<()> {
        self.run("begin", BEGIN_SQL)
    }

    fn commit(&mut self) -> Result<()> {
        self.run("commit", COMMIT_SQL)
    }

    fn rollback(&mut self) -> Result<()> {
        self.run("rollback", ROLLBACK_SQL)
    }
}

/// Expiry is reported once and never retried; the session is left to the
/// pool, which discards it.
async fn with_deadline<T>(
    operation: &str,
    timeout: Option<Duration>,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    let Some(timeout) = timeout else {
        return future.await;
    };

    tokio::time::timeout(timeout, future).await.map_err(|_| {
        Error::from(ConnectivityError::TimedOut {
            operation: operation.to_string(),
            timeout,
        })
    })?
}

/// Server-side rejections are statement failures; everything else means the
/// session can no longer be trusted.
fn driver_error(operation: &str, sql: &str, error: tiberius::error::Error) -> Error {
    match error {
        tiberius::error::Error::Server(_) => {
            ExecutionError::statement_failed(0, sql, 0, error).into()
        }
        other => ConnectivityError::unreachable(operation, other).into(),
    }
}

fn column_value(data: ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(value) => value.map_or(Value::Null, |value| Value::Integer(i64::from(value))),
        ColumnData::I16(value) => {
            value.map_or(Value::Null, |value| Value::Integer(i64::from(value)))
        }
        ColumnData::I32(value) => {
            value.map_or(Value::Null, |value| Value::Integer(i64::from(value)))
        }
        ColumnData::I64(value) => value.map_or(Value::Null, Value::Integer),
        ColumnData::F32(value) => value.map_or(Value::Null, |value| Value::Float(f64::from(value))),
        ColumnData::F64(value) => value.map_or(Value::Null, Value::Float),
        ColumnData::Bit(value) => value.map_or(Value::Null, Value::Bool),
        ColumnData::String(value) => {
            value.map_or(Value::Null, |value| Value::Text(value.into_owned()))
        }
        ColumnData::Binary(value) => {
            value.map_or(Value::Null, |value| Value::Bytes(value.into_owned()))
        }
        ColumnData::Numeric(value) => {
            value.map_or(Value::Null, |value| Value::Text(value.to_string()))
        }
        ColumnData::Guid(value) => value.map_or(Value::Null, |value| Value::Text(value.to_string())),
        // Temporal and XML values keep the driver's notation; cast in SQL for
        // a stable text form.
        other => Value::Text(format!("{other:?}")),
    }
}

fn invalid_config(message: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidDocument {
        document: CONNECTION_DOCUMENT.to_string(),
        message: message.into(),
    }
}

