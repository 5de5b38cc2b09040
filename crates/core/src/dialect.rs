use crate::{Query, RenderContext, Result, RowSet, Schema, Statement, TableName};

/// Dialect-specific SQL text: rendering, quoting and catalog introspection.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Renders one statement. Identifiers pass through `ctx` so the caller
    /// decides on quoting and length workarounds.
    fn render(&self, statement: &Statement, ctx: &RenderContext<'_>) -> Result<String>;

    fn quote_ident(&self, ident: &str) -> String;

    /// Catalog query listing the columns of `table`, in declaration order.
    fn table_columns_query(&self, table: &TableName) -> Query;

    fn schema_from_catalog(&self, table: &TableName, rows: &RowSet) -> Result<Schema>;

    /// Separator placed between statements in rendered scripts.
    fn batch_separator(&self) -> &'static str {
        ""
    }
}
