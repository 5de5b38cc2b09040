use dialectkit_core::{
    ColumnSpec, ColumnType, GenerateError, IndexDef, MergeOverwrite, OverwriteScope, Query,
    RenderContext, Result, Statement, TableName, TypeParam,
};

const MERGE_TARGET_ALIAS: &str = "target";
const MERGE_SOURCE_ALIAS: &str = "source";

pub(crate) fn render(
    dialect_name: &str,
    statement: &Statement,
    ctx: &RenderContext<'_>,
) -> Result<String> {
    let sql = match statement {
        Statement::CreateTable { table, columns } => {
            let definitions = columns
                .iter()
                .map(|column| render_column_definition(ctx, column))
                .collect::<Vec<_>>()
                .join(", ");
            format!("CREATE TABLE {} ({definitions})", render_table(ctx, table))
        }
        Statement::CreateTableAs {
            replace: true, ..
        } => return Err(unsupported(dialect_name, statement, "CREATE OR REPLACE TABLE")),
        Statement::CreateTableAs {
            table,
            query,
            replace: false,
        } => format!(
            "SELECT * INTO {} FROM ({}) AS {}",
            render_table(ctx, table),
            query.sql(),
            quote_ident(MERGE_SOURCE_ALIAS)
        ),
        Statement::DropTable { table, if_exists } => format!(
            "DROP TABLE {}{}",
            if *if_exists { "IF EXISTS " } else { "" },
            render_table(ctx, table)
        ),
        // sp_rename takes the new name verbatim; brackets would become part of it.
        Statement::RenameTable { from, to } => format!(
            "EXEC sp_rename {}, {}",
            string_literal(&render_table(ctx, from)),
            string_literal(&ctx.identifiers.physical_name(&to.name))
        ),
        Statement::AddColumn { table, column } => format!(
            "ALTER TABLE {} ADD {}",
            render_table(ctx, table),
            render_column_definition(ctx, column)
        ),
        Statement::DropColumn { table, column } => format!(
            "ALTER TABLE {} DROP COLUMN {}",
            render_table(ctx, table),
            render_ident(ctx, column)
        ),
        // ALTER COLUMN resets nullability unless it is restated.
        Statement::AlterColumnType { table, column }
        | Statement::AlterColumnNullability { table, column } => format!(
            "ALTER TABLE {} ALTER COLUMN {} {} {}",
            render_table(ctx, table),
            render_ident(ctx, &column.name),
            render_data_type(&column.data_type),
            if column.nullable { "NULL" } else { "NOT NULL" }
        ),
        Statement::CreateIndex(index) => render_index(ctx, index),
        Statement::CreateView {
            materialized: true, ..
        }
        | Statement::DropView {
            materialized: true, ..
        } => return Err(unsupported(dialect_name, statement, "materialized view")),
        Statement::CreateView {
            view,
            query,
            replace,
            ..
        } => format!(
            "CREATE {}VIEW {} AS {}",
            if *replace { "OR ALTER " } else { "" },
            render_table(ctx, view),
            query.sql()
        ),
        Statement::DropView {
            view, if_exists, ..
        } => format!(
            "DROP VIEW {}{}",
            if *if_exists { "IF EXISTS " } else { "" },
            render_table(ctx, view)
        ),
        Statement::Comment { .. } => {
            return Err(unsupported(dialect_name, statement, "COMMENT ON"));
        }
        Statement::Delete { table, scope } => match scope {
            OverwriteScope::AllRows => format!("DELETE FROM {}", render_table(ctx, table)),
            OverwriteScope::Where(condition) => format!(
                "DELETE FROM {} WHERE {}",
                render_table(ctx, table),
                condition.sql()
            ),
        },
        Statement::InsertSelect {
            table,
            columns,
            source,
        } => render_insert_select(ctx, table, columns, source),
        Statement::Merge(merge) if merge.columns.is_empty() => {
            return Err(unsupported(dialect_name, statement, "MERGE without a column list"));
        }
        Statement::Merge(merge) => render_merge(ctx, merge),
        Statement::Raw(query) => query.sql().to_string(),
    };

    Ok(sql)
}

pub(crate) fn quote_ident(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

pub(crate) fn string_literal(value: &str) -> String {
    format!("N'{}'", value.replace('\'', "''"))
}

pub(crate) fn render_data_type(data_type: &ColumnType) -> String {
    let Some(params) = &data_type.params else {
        return data_type.name.to_string();
    };

    let rendered = params
        .iter()
        .map(|param| match param {
            TypeParam::Value(value) => value.to_string(),
            TypeParam::Max => "MAX".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({rendered})", data_type.name)
}

/// Never-matching `MERGE`: every source row is inserted and every target row
/// in scope is deleted, in one atomic statement.
fn render_merge(ctx: &RenderContext<'_>, merge: &MergeOverwrite) -> String {
    let target = quote_ident(MERGE_TARGET_ALIAS);
    let source = quote_ident(MERGE_SOURCE_ALIAS);
    let columns = merge
        .columns
        .iter()
        .map(|column| render_ident(ctx, column))
        .collect::<Vec<_>>();
    let values = columns
        .iter()
        .map(|column| format!("{source}.{column}"))
        .collect::<Vec<_>>()
        .join(", ");
    let scope = match &merge.scope {
        OverwriteScope::AllRows => String::new(),
        OverwriteScope::Where(condition) => format!(" AND ({})", condition.sql()),
    };

    format!(
        "MERGE INTO {} AS {target} USING ({}) AS {source} ON 1 = 0 \
WHEN NOT MATCHED BY SOURCE{scope} THEN DELETE \
WHEN NOT MATCHED THEN INSERT ({}) VALUES ({values});",
        render_table(ctx, &merge.target),
        merge.source.sql(),
        columns.join(", ")
    )
}

fn render_column_definition(ctx: &RenderContext<'_>, column: &ColumnSpec) -> String {
    let mut sql = format!(
        "{} {}",
        render_ident(ctx, &column.name),
        render_data_type(&column.data_type)
    );
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    sql
}

fn render_index(ctx: &RenderContext<'_>, index: &IndexDef) -> String {
    let columns = index
        .columns
        .iter()
        .map(|column| render_ident(ctx, column))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE {}INDEX {} ON {} ({columns})",
        if index.unique { "UNIQUE " } else { "" },
        render_ident(ctx, &index.name),
        render_table(ctx, &index.table)
    )
}

fn render_insert_select(
    ctx: &RenderContext<'_>,
    table: &TableName,
    columns: &[String],
    source: &Query,
) -> String {
    if columns.is_empty() {
        return format!("INSERT INTO {} {}", render_table(ctx, table), source.sql());
    }

    let columns = columns
        .iter()
        .map(|column| render_ident(ctx, column))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({columns}) {}",
        render_table(ctx, table),
        source.sql()
    )
}

fn render_table(ctx: &RenderContext<'_>, table: &TableName) -> String {
    ctx.table(table, quote_ident)
}

fn render_ident(ctx: &RenderContext<'_>, ident: &str) -> String {
    ctx.ident(ident, quote_ident)
}

fn unsupported(dialect_name: &str, statement: &Statement, construct: &str) -> dialectkit_core::Error {
    GenerateError::UnsupportedStatement {
        statement: format!("{} ({construct})", statement.tag()),
        dialect: dialect_name.to_string(),
    }
    .into()
}
