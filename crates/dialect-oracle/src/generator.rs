use dialectkit_core::{
    ColumnSpec, ColumnType, CommentTarget, GenerateError, IndexDef, OverwriteScope, Query,
    RenderContext, Result, Statement, TableName, TypeParam,
};

use crate::normalize;

/// ORA-00942: table or view does not exist.
const TABLE_OR_VIEW_MISSING: i32 = -942;
/// ORA-12003: materialized view does not exist.
const MATERIALIZED_VIEW_MISSING: i32 = -12003;

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
        } => format!("CREATE TABLE {} AS {}", render_table(ctx, table), query.sql()),
        Statement::DropTable { table, if_exists } => {
            let sql = format!("DROP TABLE {}", render_table(ctx, table));
            if *if_exists {
                ignore_missing(&sql, TABLE_OR_VIEW_MISSING)
            } else {
                sql
            }
        }
        Statement::RenameTable { from, to } => format!(
            "ALTER TABLE {} RENAME TO {}",
            render_table(ctx, from),
            render_ident(ctx, &to.name)
        ),
        Statement::AddColumn { table, column } => format!(
            "ALTER TABLE {} ADD ({})",
            render_table(ctx, table),
            render_column_definition(ctx, column)
        ),
        Statement::DropColumn { table, column } => format!(
            "ALTER TABLE {} DROP COLUMN {}",
            render_table(ctx, table),
            render_ident(ctx, column)
        ),
        Statement::AlterColumnType { table, column } => format!(
            "ALTER TABLE {} MODIFY ({} {})",
            render_table(ctx, table),
            render_ident(ctx, &column.name),
            render_data_type(&column.data_type)
        ),
        Statement::AlterColumnNullability { table, column } => format!(
            "ALTER TABLE {} MODIFY ({} {})",
            render_table(ctx, table),
            render_ident(ctx, &column.name),
            if column.nullable { "NULL" } else { "NOT NULL" }
        ),
        Statement::CreateIndex(index) => render_index(ctx, index),
        Statement::CreateView {
            materialized: true,
            replace: true,
            ..
        } => {
            return Err(unsupported(
                dialect_name,
                statement,
                "CREATE OR REPLACE MATERIALIZED VIEW",
            ));
        }
        Statement::CreateView {
            view,
            query,
            materialized,
            replace,
        } => format!(
            "CREATE {}{}VIEW {} AS {}",
            if *replace { "OR REPLACE " } else { "" },
            if *materialized { "MATERIALIZED " } else { "" },
            render_table(ctx, view),
            query.sql()
        ),
        Statement::DropView {
            view,
            materialized,
            if_exists,
        } => {
            let (kind, missing_code) = if *materialized {
                ("MATERIALIZED VIEW", MATERIALIZED_VIEW_MISSING)
            } else {
                ("VIEW", TABLE_OR_VIEW_MISSING)
            };
            let sql = format!("DROP {kind} {}", render_table(ctx, view));
            if *if_exists {
                ignore_missing(&sql, missing_code)
            } else {
                sql
            }
        }
        // Oracle comments on views through `COMMENT ON TABLE` as well.
        Statement::Comment {
            target: CommentTarget::Table | CommentTarget::View,
            object,
            comment,
        } => format!(
            "COMMENT ON TABLE {} IS {}",
            render_table(ctx, object),
            string_literal(comment)
        ),
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
        Statement::Merge(_) => {
            return Err(unsupported(
                dialect_name,
                statement,
                "MERGE without WHEN NOT MATCHED BY SOURCE",
            ));
        }
        Statement::Raw(query) => query.sql().to_string(),
    };

    Ok(sql)
}

pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub(crate) fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Oracle spelling of a declared type. `MAX` has no Oracle syntax: it
/// becomes the type's ceiling, or `*` for precision-style parameters.
pub(crate) fn render_data_type(data_type: &ColumnType) -> String {
    let Some(params) = &data_type.params else {
        return data_type.name.to_string();
    };

    let max = normalize::max_for(data_type.name.as_str());
    let rendered = params
        .iter()
        .map(|param| match (param, max) {
            (TypeParam::Value(value), _) => value.to_string(),
            (TypeParam::Max, Some(max)) => max.to_string(),
            (TypeParam::Max, None) => "*".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");

    match data_type.name.as_str().split_once(' ') {
        Some((head @ ("TIMESTAMP" | "INTERVAL"), tail)) => format!("{head}({rendered}) {tail}"),
        _ => format!("{}({rendered})", data_type.name),
    }
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
    let name = TableName {
        schema: index.table.schema.clone(),
        name: index.name.clone(),
    };
    let columns = index
        .columns
        .iter()
        .map(|column| render_ident(ctx, column))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE {}INDEX {} ON {} ({columns})",
        if index.unique { "UNIQUE " } else { "" },
        render_table(ctx, &name),
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

/// Wraps `sql` in a PL/SQL block that swallows only the "does not exist"
/// error `code`.
fn ignore_missing(sql: &str, code: i32) -> String {
    format!(
        "BEGIN EXECUTE IMMEDIATE {}; EXCEPTION WHEN OTHERS THEN IF SQLCODE != {code} THEN RAISE; END IF; END;",
        string_literal(sql)
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
