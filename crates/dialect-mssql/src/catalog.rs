use dialectkit_core::{
    ColumnSpec, ColumnType, Query, Result, RowSet, Schema, SchemaError, TableName, Value,
};

use crate::generator::{quote_ident, string_literal};

pub(crate) const CURRENT_CATALOG_QUERY: &str = "SELECT DB_NAME()";

const TABLE_COLUMNS_QUERY_TEMPLATE: &str = "\
SELECT c.name AS COLUMN_NAME, t.name AS DATA_TYPE, c.max_length AS MAX_LENGTH, \
c.precision AS PRECISION, c.scale AS SCALE, c.is_nullable AS IS_NULLABLE \
FROM sys.columns AS c \
JOIN sys.types AS t ON t.user_type_id = c.user_type_id \
WHERE c.object_id = OBJECT_ID({object}) \
ORDER BY c.column_id";

pub(crate) fn table_columns_query(table: &TableName) -> Query {
    let object = match &table.schema {
        Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(&table.name)),
        None => quote_ident(&table.name),
    };
    Query::new(TABLE_COLUMNS_QUERY_TEMPLATE.replace("{object}", &string_literal(&object)))
}

/// Rebuilds declared column types from `sys.columns` rows. A missing table
/// yields no rows because `OBJECT_ID` is `NULL`.
pub(crate) fn schema_from_catalog(table: &TableName, rows: &RowSet) -> Result<Schema> {
    let mut schema = Schema::new();
    if rows.rows.is_empty() {
        return Ok(schema);
    }

    let required = |name: &str| {
        rows.column_index(name)
            .ok_or_else(|| malformed(table, 0, format!("missing column {name}")))
    };
    let name_at = required("COLUMN_NAME")?;
    let type_at = required("DATA_TYPE")?;
    let length_at = rows.column_index("MAX_LENGTH");
    let precision_at = rows.column_index("PRECISION");
    let scale_at = rows.column_index("SCALE");
    let nullable_at = rows.column_index("IS_NULLABLE");

    for (index, row) in rows.rows.iter().enumerate() {
        let cell = |position: Option<usize>| position.and_then(|position| row.get(position));
        let number = |position: Option<usize>| cell(position).and_then(Value::as_u64);

        let name = cell(Some(name_at))
            .and_then(Value::as_text)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| malformed(table, index, "COLUMN_NAME is empty"))?;
        let data_type = cell(Some(type_at))
            .and_then(Value::as_text)
            .ok_or_else(|| malformed(table, index, "DATA_TYPE is empty"))?;
        let max_length = match cell(length_at) {
            Some(Value::Integer(length)) => Some(*length),
            Some(other) => other.as_u64().and_then(|length| i64::try_from(length).ok()),
            None => None,
        };

        let type_text = declared_type(
            data_type,
            max_length,
            number(precision_at),
            number(scale_at),
        );
        let nullable = cell(nullable_at).is_none_or(is_truthy);

        schema.push(ColumnSpec {
            nullable,
            ..ColumnSpec::new(name, ColumnType::parse(&type_text)?)
        })?;
    }

    Ok(schema)
}

/// `max_length` is in bytes and `-1` for `MAX`; national types store two
/// bytes per character.
fn declared_type(
    data_type: &str,
    max_length: Option<i64>,
    precision: Option<u64>,
    scale: Option<u64>,
) -> String {
    let data_type = data_type.trim().to_ascii_uppercase();
    match data_type.as_str() {
        "NVARCHAR" | "NCHAR" => match max_length {
            Some(-1) => format!("{data_type}(MAX)"),
            Some(length) => format!("{data_type}({})", (length / 2).max(1)),
            None => data_type,
        },
        "VARCHAR" | "CHAR" | "VARBINARY" | "BINARY" => match max_length {
            Some(-1) => format!("{data_type}(MAX)"),
            Some(length) => format!("{data_type}({})", length.max(1)),
            None => data_type,
        },
        "DECIMAL" | "NUMERIC" => match precision.filter(|precision| *precision > 0) {
            Some(precision) => format!("{data_type}({precision}, {})", scale.unwrap_or(0)),
            None => data_type,
        },
        // Scale 0 is a real declaration here, distinct from the default of 7.
        "DATETIME2" | "TIME" | "DATETIMEOFFSET" => scale.map_or(data_type.clone(), |scale| {
            format!("{data_type}({scale})")
        }),
        _ => data_type,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Null => true,
        other => other.as_u64().is_none_or(|flag| flag != 0),
    }
}

fn malformed(table: &TableName, row: usize, reason: impl Into<String>) -> SchemaError {
    SchemaError::MalformedCatalogRow {
        table: table.to_string(),
        row,
        reason: reason.into(),
    }
}
