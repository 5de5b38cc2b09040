//! Independently selectable units of dialect behavior.
//!
//! A dialect picks one implementation per trait when its adapter is
//! composed; the adapter delegates to whatever it holds and never switches
//! implementation at runtime.

use sha2::{Digest, Sha256};

use crate::{
    ConfigurationError, Connection, ExecutionError, MergeOverwrite, OverwriteScope, Query, Result,
    Statement, TableName, TabularResult,
};

pub trait IndexSupport: Send + Sync {
    fn supports_standalone_indexes(&self) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StandaloneIndexes;

impl IndexSupport for StandaloneIndexes {
    fn supports_standalone_indexes(&self) -> bool {
        true
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoIndexes;

impl IndexSupport for NoIndexes {
    fn supports_standalone_indexes(&self) -> bool {
        false
    }
}

pub trait NativeFetch: Send + Sync {
    fn name(&self) -> &'static str;
    fn fetch(&self, connection: &mut dyn Connection, query: &Query) -> Result<TabularResult>;
}

/// Lets the driver materialize the columnar result itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct DriverNativeFetch;

impl NativeFetch for DriverNativeFetch {
    fn name(&self) -> &'static str {
        "driver-native"
    }

    fn fetch(&self, connection: &mut dyn Connection, query: &Query) -> Result<TabularResult> {
        connection.fetch_columnar(query.sql())
    }
}

/// Generic path: fetch rows, then pivot into columns.
#[derive(Debug, Default, Clone, Copy)]
pub struct RowByRowFetch;

impl NativeFetch for RowByRowFetch {
    fn name(&self) -> &'static str {
        "row-by-row"
    }

    fn fetch(&self, connection: &mut dyn Connection, query: &Query) -> Result<TabularResult> {
        connection.query(query.sql()).map(TabularResult::from_rows)
    }
}

pub trait InsertOverwrite: Send + Sync {
    fn name(&self) -> &'static str;

    /// Statements replacing the rows of `target` within `scope` by the rows
    /// of `source`. When more than one statement is returned the caller runs
    /// them in a single transaction.
    fn statements(
        &self,
        target: &TableName,
        source: &Query,
        columns: &[String],
        scope: &OverwriteScope,
    ) -> Vec<Statement>;
}

/// Single `MERGE` that never matches: target rows in scope that the source
/// does not match are deleted and every source row is inserted.
#[derive(Debug, Default, Clone, Copy)]
pub struct MergeInsertOverwrite;

impl InsertOverwrite for MergeInsertOverwrite {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn statements(
        &self,
        target: &TableName,
        source: &Query,
        columns: &[String],
        scope: &OverwriteScope,
    ) -> Vec<Statement> {
        vec![Statement::Merge(MergeOverwrite {
            target: target.clone(),
            source: source.clone(),
            columns: columns.to_vec(),
            scope: scope.clone(),
        })]
    }
}

/// `DELETE` of the rows in scope followed by `INSERT ... SELECT`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeleteInsertOverwrite;

impl InsertOverwrite for DeleteInsertOverwrite {
    fn name(&self) -> &'static str {
        "delete-insert"
    }

    fn statements(
        &self,
        target: &TableName,
        source: &Query,
        columns: &[String],
        scope: &OverwriteScope,
    ) -> Vec<Statement> {
        vec![
            Statement::Delete {
                table: target.clone(),
                scope: scope.clone(),
            },
            Statement::InsertSelect {
                table: target.clone(),
                columns: columns.to_vec(),
                source: source.clone(),
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentCatalog {
    Named(String),
    Unsupported,
}

pub trait CatalogResolver: Send + Sync {
    fn is_supported(&self) -> bool;
    fn current_catalog(&self, connection: &mut dyn Connection) -> Result<CurrentCatalog>;
}

/// For dialects without a catalog concept. Never substitutes a default name.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCatalog;

impl CatalogResolver for NoCatalog {
    fn is_supported(&self) -> bool {
        false
    }

    fn current_catalog(&self, _connection: &mut dyn Connection) -> Result<CurrentCatalog> {
        Ok(CurrentCatalog::Unsupported)
    }
}

/// Reads the catalog from a scalar query such as `SELECT DB_NAME()`.
#[derive(Debug, Clone)]
pub struct CatalogFromFunction {
    query: Query,
}

impl CatalogFromFunction {
    pub fn new(query: impl Into<Query>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

impl CatalogResolver for CatalogFromFunction {
    fn is_supported(&self) -> bool {
        true
    }

    fn current_catalog(&self, connection: &mut dyn Connection) -> Result<CurrentCatalog> {
        let rows = connection.query(self.query.sql())?;
        rows.rows
            .first()
            .and_then(|row| row.first())
            .and_then(|value| value.as_text())
            .map(|name| CurrentCatalog::Named(name.trim().to_string()))
            .ok_or_else(|| {
                ExecutionError::EmptyResult {
                    sql: self.query.sql().to_string(),
                }
                .into()
            })
    }
}

pub trait IdentifierWorkaround: Send + Sync {
    fn physical_name(&self, logical: &str) -> String;
    fn max_length(&self) -> Option<usize>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl IdentifierWorkaround for Passthrough {
    fn physical_name(&self, logical: &str) -> String {
        logical.to_string()
    }

    fn max_length(&self) -> Option<usize> {
        None
    }
}

const HASH_SUFFIX_LEN: usize = 8;

/// Shortens identifiers beyond `max_length` bytes to a prefix plus `_` and
/// the first 8 hex digits of their SHA-256. The same logical name always
/// maps to the same physical name.
#[derive(Debug, Clone, Copy)]
pub struct HashTruncate {
    max_length: usize,
}

impl HashTruncate {
    pub const MIN_LENGTH: usize = HASH_SUFFIX_LEN + 2;

    pub fn new(max_length: usize) -> std::result::Result<Self, ConfigurationError> {
        if max_length < Self::MIN_LENGTH {
            return Err(ConfigurationError::IdentifierLimitTooSmall {
                max_length,
                minimum: Self::MIN_LENGTH,
            });
        }
        Ok(Self { max_length })
    }
}

impl IdentifierWorkaround for HashTruncate {
    fn physical_name(&self, logical: &str) -> String {
        if logical.len() <= self.max_length {
            return logical.to_string();
        }

        let digest = format!("{:x}", Sha256::digest(logical.as_bytes()));
        let mut prefix_end = self.max_length - HASH_SUFFIX_LEN - 1;
        while !logical.is_char_boundary(prefix_end) {
            prefix_end -= 1;
        }

        format!("{}_{}", &logical[..prefix_end], &digest[..HASH_SUFFIX_LEN])
    }

    fn max_length(&self) -> Option<usize> {
        Some(self.max_length)
    }
}

/// One implementation per capability, fixed at composition time.
pub struct Capabilities {
    pub indexes: Box<dyn IndexSupport>,
    pub fetch: Box<dyn NativeFetch>,
    pub insert_overwrite: Box<dyn InsertOverwrite>,
    pub catalog: Box<dyn CatalogResolver>,
    pub identifiers: Box<dyn IdentifierWorkaround>,
}
