#![allow(dead_code)]

use std::sync::Arc;

use dialectkit_core::{
    Capabilities, CatalogFromFunction, CatalogSupport, ColumnMeta, ColumnSpec, ColumnType,
    CommentCreationTable, CommentCreationView, ConnectionPool, DeleteInsertOverwrite, Dialect,
    DialectAdapter, DialectProfile, FeatureFlags, GenerateError, HashTruncate, NoCatalog,
    NoIndexes, PoolConfig, Query, RenderContext, Result, RowByRowFetch, RowSet, Schema,
    SchemaError, StandaloneIndexes, Statement, TableName, TypeNormalization, Value,
};
use dialectkit_testkit::{FakeBackend, FakeManager};

pub const DIALECT_NAME: &str = "fake";
pub const CATALOG_FRAGMENT: &str = "FROM fake_columns";
pub const CURRENT_CATALOG_SQL: &str = "SELECT current_catalog()";

pub const FEATURES: FeatureFlags = FeatureFlags {
    supports_tuple_in: true,
    supports_materialized_views: false,
    supports_replace_table: false,
    catalog_support: CatalogSupport::Unsupported,
    comment_on_table: CommentCreationTable::Unsupported,
    comment_on_view: CommentCreationView::Unsupported,
};

/// Minimal dialect rendering column alterations in a neutral SQL flavor.
#[derive(Debug, Clone, Copy)]
pub struct FakeDialect {
    pub name: &'static str,
    pub separator: &'static str,
}

impl Default for FakeDialect {
    fn default() -> Self {
        Self {
            name: DIALECT_NAME,
            separator: "",
        }
    }
}

impl Dialect for FakeDialect {
    fn name(&self) -> &'static str {
        self.name
    }

    fn render(&self, statement: &Statement, ctx: &RenderContext<'_>) -> Result<String> {
        let quote = |ident: &str| self.quote_ident(ident);
        let sql = match statement {
            Statement::AddColumn { table, column } => format!(
                "ALTER TABLE {} ADD COLUMN {}",
                ctx.table(table, quote),
                column_definition(ctx, column, quote)
            ),
            Statement::DropColumn { table, column } => format!(
                "ALTER TABLE {} DROP COLUMN {}",
                ctx.table(table, quote),
                ctx.ident(column, quote)
            ),
            Statement::AlterColumnType { table, column } => format!(
                "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
                ctx.table(table, quote),
                ctx.ident(&column.name, quote),
                column.data_type
            ),
            Statement::AlterColumnNullability { table, column } => format!(
                "ALTER TABLE {} ALTER COLUMN {} {} NOT NULL",
                ctx.table(table, quote),
                ctx.ident(&column.name, quote),
                if column.nullable { "DROP" } else { "SET" }
            ),
            Statement::CreateTable { table, columns } => format!(
                "CREATE TABLE {} ({})",
                ctx.table(table, quote),
                columns
                    .iter()
                    .map(|column| column_definition(ctx, column, quote))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Statement::DropTable { table, if_exists } => format!(
                "DROP TABLE {}{}",
                if *if_exists { "IF EXISTS " } else { "" },
                ctx.table(table, quote)
            ),
            Statement::RenameTable { from, to } => format!(
                "ALTER TABLE {} RENAME TO {}",
                ctx.table(from, quote),
                ctx.ident(&to.name, quote)
            ),
            Statement::CreateIndex(index) => format!(
                "CREATE {}INDEX {} ON {} ({})",
                if index.unique { "UNIQUE " } else { "" },
                ctx.ident(&index.name, quote),
                ctx.table(&index.table, quote),
                index
                    .columns
                    .iter()
                    .map(|column| ctx.ident(column, quote))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Statement::Delete { table, scope } => match scope {
                dialectkit_core::OverwriteScope::AllRows => {
                    format!("DELETE FROM {}", ctx.table(table, quote))
                }
                dialectkit_core::OverwriteScope::Where(condition) => format!(
                    "DELETE FROM {} WHERE {}",
                    ctx.table(table, quote),
                    condition.sql()
                ),
            },
            Statement::InsertSelect {
                table,
                columns,
                source,
            } => format!(
                "INSERT INTO {} ({}) {}",
                ctx.table(table, quote),
                columns
                    .iter()
                    .map(|column| ctx.ident(column, quote))
                    .collect::<Vec<_>>()
                    .join(", "),
                source.sql()
            ),
            Statement::Raw(query) => query.sql().to_string(),
            other => {
                return Err(GenerateError::UnsupportedStatement {
                    statement: other.tag().to_string(),
                    dialect: self.name.to_string(),
                }
                .into());
            }
        };
        Ok(sql)
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn table_columns_query(&self, table: &TableName) -> Query {
        Query::new(format!(
            "SELECT name, type, nullable {CATALOG_FRAGMENT} WHERE table_name = '{table}'"
        ))
    }

    fn schema_from_catalog(&self, table: &TableName, rows: &RowSet) -> Result<Schema> {
        let mut schema = Schema::new();
        for (index, row) in rows.rows.iter().enumerate() {
            let [Value::Text(name), Value::Text(type_text), Value::Bool(nullable)] =
                row.as_slice()
            else {
                return Err(SchemaError::MalformedCatalogRow {
                    table: table.to_string(),
                    row: index,
                    reason: "expected (name, type, nullable)".to_string(),
                }
                .into());
            };
            schema.push(ColumnSpec {
                nullable: *nullable,
                ..ColumnSpec::new(name.clone(), ColumnType::parse(type_text)?)
            })?;
        }
        Ok(schema)
    }

    fn batch_separator(&self) -> &'static str {
        self.separator
    }
}

fn column_definition(
    ctx: &RenderContext<'_>,
    column: &ColumnSpec,
    quote: impl Fn(&str) -> String,
) -> String {
    let mut definition = format!("{} {}", ctx.ident(&column.name, quote), column.data_type);
    if !column.nullable {
        definition.push_str(" NOT NULL");
    }
    definition
}

pub fn types() -> TypeNormalization {
    TypeNormalization::builder()
        .defaults("DECIMAL", [vec![18, 0], vec![0]])
        .defaults("VARCHAR", [vec![1]])
        .max("VARCHAR", 65535)
        .build()
        .expect("valid fake type table")
}

pub fn profile() -> DialectProfile {
    DialectProfile::new(DIALECT_NAME, types(), FEATURES)
}

pub fn capabilities() -> Capabilities {
    Capabilities {
        indexes: Box::new(NoIndexes),
        fetch: Box::new(RowByRowFetch),
        insert_overwrite: Box::new(DeleteInsertOverwrite),
        catalog: Box::new(NoCatalog),
        identifiers: Box::new(HashTruncate::new(16).expect("valid limit")),
    }
}

/// Capabilities for a flavor that resolves catalogs and has standalone
/// indexes; pair with a profile whose catalog flag is supported.
pub fn catalog_capabilities() -> Capabilities {
    Capabilities {
        indexes: Box::new(StandaloneIndexes),
        catalog: Box::new(CatalogFromFunction::new(CURRENT_CATALOG_SQL)),
        ..capabilities()
    }
}

pub fn fake_adapter_with(
    dialect: FakeDialect,
    profile: DialectProfile,
    capabilities: Capabilities,
    pool: PoolConfig,
) -> (FakeBackend, DialectAdapter<FakeManager>) {
    let backend = FakeBackend::new();
    let adapter = DialectAdapter::new(
        Arc::new(dialect),
        profile,
        capabilities,
        ConnectionPool::new(backend.manager(), pool),
    )
    .expect("fake adapter composes");
    (backend, adapter)
}

pub fn fake_adapter() -> (FakeBackend, DialectAdapter<FakeManager>) {
    fake_adapter_with(
        FakeDialect::default(),
        profile(),
        capabilities(),
        PoolConfig::default(),
    )
}

pub fn catalog_rows(columns: &[(&str, &str, bool)]) -> RowSet {
    RowSet {
        columns: vec![
            ColumnMeta::new("name", "text"),
            ColumnMeta::new("type", "text"),
            ColumnMeta::new("nullable", "bool"),
        ],
        rows: columns
            .iter()
            .map(|(name, type_text, nullable)| {
                vec![
                    Value::Text((*name).to_string()),
                    Value::Text((*type_text).to_string()),
                    Value::Bool(*nullable),
                ]
            })
            .collect(),
    }
}
