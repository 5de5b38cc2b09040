//! Oracle dialect: type tables, feature flags, DDL rendering and
//! `ALL_TAB_COLUMNS` introspection.
//!
//! Insert-overwrite runs as a transactional `DELETE` followed by
//! `INSERT ... SELECT`. Oracle's `MERGE` has no `WHEN NOT MATCHED BY SOURCE`
//! clause, so it cannot remove target rows missing from the source.

use std::sync::Arc;

use dialectkit_core::{
    Capabilities, CatalogSupport, CommentCreationTable, CommentCreationView, ConfigurationError,
    ConnectionManager, ConnectionPool, DeleteInsertOverwrite, Dialect, DialectAdapter,
    DialectOverrides, DialectProfile, DriverNativeFetch, FeatureFlags, HashTruncate, NoCatalog,
    Query, RenderContext, Result, RowSet, Schema, StandaloneIndexes, Statement, TableName,
};
use tracing::debug;

mod catalog;
mod generator;
mod normalize;

pub const DIALECT_NAME: &str = "oracle";

/// Identifier length limit of Oracle 12.2 and later.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

pub const FEATURES: FeatureFlags = FeatureFlags {
    supports_tuple_in: false,
    supports_materialized_views: true,
    supports_replace_table: false,
    catalog_support: CatalogSupport::Unsupported,
    comment_on_table: CommentCreationTable::Unsupported,
    comment_on_view: CommentCreationView::Unsupported,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
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
}

/// Built-in type table and flags with `overrides` applied.
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
        fetch: Box::new(DriverNativeFetch),
        insert_overwrite: Box::new(DeleteInsertOverwrite),
        catalog: Box::new(NoCatalog),
        identifiers: Box::new(HashTruncate::new(
            max_identifier_length.unwrap_or(MAX_IDENTIFIER_LENGTH),
        )?),
    })
}

/// Composes the Oracle adapter over connections from `manager`. Oracle
/// connections come from the caller; this crate ships no driver.
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
        Arc::new(OracleDialect),
        profile,
        capabilities,
        ConnectionPool::new(manager, overrides.pool),
    )?
    .with_diff_config(overrides.diff.into()))
}
