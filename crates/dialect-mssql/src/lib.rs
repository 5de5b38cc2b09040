use std::sync::Arc;

use dialectkit_core::{
    Capabilities, CatalogFromFunction, CatalogSupport, CommentCreationTable, CommentCreationView,
    ConfigurationError, ConnectionConfig, ConnectionManager, ConnectionPool, Dialect,
    DialectAdapter, DialectOverrides, DialectProfile, FeatureFlags, HashTruncate,
    MergeInsertOverwrite, Query, RenderContext, Result, RowByRowFetch, RowSet, Schema,
    StandaloneIndexes, Statement, TableName,
};
use tracing::debug;

mod catalog;
mod connection;
mod generator;
mod normalize;

pub use connection::{MssqlConnection, MssqlManager};

pub const DIALECT_NAME: &str = "mssql";

/// `sysname` length.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

pub const FEATURES: FeatureFlags = FeatureFlags {
    supports_tuple_in: false,
    supports_materialized_views: false,
    supports_replace_table: false,
    catalog_support: CatalogSupport::FullSupport,
    comment_on_table: CommentCreationTable::Unsupported,
    comment_on_view: CommentCreationView::Unsupported,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlDialect;

impl Dialect for MssqlDialect {
    fn name(&self) -> &'static str {
        DIALECT_NAME
    }

    fn render(&self, statement: &Statement, ctx: &RenderContext<'_>) -> Result<String> {
        generator::render(self.name(), statement, ctx)
    }

    fn quote_ident(&self, ident: &str) -> String {
        generator::quote_ident(ident)
    }

    fn table_columns_query(&self, table: &TableName) -> Query {
        catalog::table_columns_query(table)
    }

    fn schema_from_catalog(&self, table: &TableName, rows: &RowSet) -> Result<Schema> {
        catalog::schema_from_catalog(table, rows)
    }

    fn batch_separator(&self) -> &'static str {
        "GO"
    }
}

pub fn profile(
    overrides: &DialectOverrides,
) -> std::result::Result<DialectProfile, ConfigurationError> {
    DialectProfile::new(DIALECT_NAME, normalize::type_normalization()?, FEATURES)
        .with_overrides(overrides)
}

pub fn capabilities(
    max_identifier_length: Option<usize>,
) -> std::result::Result<Capabilities, ConfigurationError> {
    Ok(Capabilities {
        indexes: Box::new(StandaloneIndexes),
        fetch: Box::new(RowByRowFetch),
        insert_overwrite: Box::new(MergeInsertOverwrite),
        catalog: Box::new(CatalogFromFunction::new(catalog::CURRENT_CATALOG_QUERY)),
        identifiers: Box::new(HashTruncate::new(
            max_identifier_length.unwrap_or(MAX_IDENTIFIER_LENGTH),
        )?),
    })
}

/// Composes the SQL Server adapter over connections from `manager`.
pub fn adapter<M: ConnectionManager>(
    manager: M,
    overrides: &DialectOverrides,
) -> Result<DialectAdapter<M>> {
    let profile = profile(overrides)?;
    let capabilities = capabilities(overrides.max_identifier_length)?;
    debug!(
        dialect = DIALECT_NAME,
        max_pool_size = overrides.pool.max_size,
        "composing adapter"
    );

    Ok(DialectAdapter::new(
        Arc::new(MssqlDialect),
        profile,
        capabilities,
        ConnectionPool::new(manager, overrides.pool),
    )?
    .with_diff_config(overrides.diff.into()))
}

/// Adapter over live TDS connections. No connection is opened until the
/// first operation needs one.
pub fn connect(
    config: ConnectionConfig,
    overrides: &DialectOverrides,
) -> Result<DialectAdapter<MssqlManager>> {
    adapter(MssqlManager::new(config)?, overrides)
}
