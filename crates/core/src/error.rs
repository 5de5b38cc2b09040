use std::{error::Error as StdError, time::Duration};

use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedOperationError),
    #[error(transparent)]
    Execute(#[from] ExecutionError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("type `{type_name}` declares an empty parameter default list")]
    EmptyDefaults { type_name: String },

    #[error(
        "type `{type_name}` parameter default #{index} has arity {found}, expected {expected}"
    )]
    InconsistentDefaultArity {
        type_name: String,
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("type `{type_name}` declares a maximum parameter value of zero")]
    ZeroMaximum { type_name: String },

    #[error("identifier limit {max_length} is below the minimum of {minimum}")]
    IdentifierLimitTooSmall { max_length: usize, minimum: usize },

    #[error("dialect `{dialect}` capability mismatch: {detail}")]
    CapabilityMismatch { dialect: String, detail: String },

    #[error("invalid {document}: {message}")]
    InvalidDocument { document: String, message: String },
}

#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error("{operation} could not reach the backend: {source}")]
    Unreachable {
        operation: String,
        #[source]
        source: BoxError,
    },

    #[error("{operation} exceeded its deadline of {}ms", .timeout.as_millis())]
    TimedOut { operation: String, timeout: Duration },
}

impl ConnectivityError {
    pub fn unreachable<E>(operation: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Unreachable {
            operation: operation.into(),
            source: Box::new(source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dialect `{dialect}` does not support {operation}: {reason}")]
pub struct UnsupportedOperationError {
    pub operation: String,
    pub dialect: String,
    pub reason: String,
}

impl UnsupportedOperationError {
    pub fn new(
        operation: impl Into<String>,
        dialect: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            dialect: dialect.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(
        "statement[{statement_index}] failed after {executed_statements} executed statement(s): {sql}: {source}"
    )]
    StatementFailed {
        statement_index: usize,
        sql: String,
        executed_statements: usize,
        #[source]
        source: BoxError,
    },

    #[error("`{sql}` returned no value")]
    EmptyResult { sql: String },
}

impl ExecutionError {
    pub fn statement_failed<E>(
        statement_index: usize,
        sql: impl Into<String>,
        executed_statements: usize,
        source: E,
    ) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::StatementFailed {
            statement_index,
            sql: sql.into(),
            executed_statements,
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        match self {
            Self::StatementFailed { sql, .. } | Self::EmptyResult { sql } => sql,
        }
    }

    /// Re-positions an error reported by a connection (which only knows the
    /// statement it ran) within a multi-statement plan.
    #[must_use]
    pub fn at_position(self, statement_index: usize, executed_statements: usize) -> Self {
        match self {
            Self::StatementFailed { sql, source, .. } => Self::StatementFailed {
                statement_index,
                sql,
                executed_statements,
                source,
            },
            empty @ Self::EmptyResult { .. } => empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("column `{name}` is declared more than once")]
    DuplicateColumn { name: String },

    #[error("invalid type declaration `{text}`: {reason}")]
    InvalidType { text: String, reason: String },

    #[error("invalid table name `{text}`")]
    InvalidTableName { text: String },

    #[error("catalog row #{row} for `{table}` is malformed: {reason}")]
    MalformedCatalogRow {
        table: String,
        row: usize,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("dialect `{dialect}` cannot render {statement}")]
    UnsupportedStatement { statement: String, dialect: String },
}
