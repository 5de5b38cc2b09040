use dialectkit_core::{
    ColumnSpec, ColumnType, Query, Result, RowSet, Schema, SchemaError, TableName, Value,
};

use crate::generator::string_literal;

const CURRENT_SCHEMA_EXPRESSION: &str = "SYS_CONTEXT('USERENV', 'CURRENT_SCHEMA')";

const TABLE_COLUMNS_QUERY_TEMPLATE: &str = "\
SELECT COLUMN_NAME, DATA_TYPE, DATA_LENGTH, CHAR_LENGTH, DATA_PRECISION, DATA_SCALE, NULLABLE \
FROM ALL_TAB_COLUMNS \
WHERE OWNER = {owner} AND TABLE_NAME = {table} \
ORDER BY COLUMN_ID";

pub(crate) fn table_columns_query(table: &TableName) -> Query {
    let owner = table
        .schema
        .as_deref()
        .map_or_else(|| CURRENT_SCHEMA_EXPRESSION.to_string(), string_literal);
    Query::new(
        TABLE_COLUMNS_QUERY_TEMPLATE
            .replace("{owner}", &owner)
            .replace("{table}", &string_literal(&table.name)),
    )
}

struct CatalogColumns {
    name: usize,
    data_type: usize,
    data_length: Option<usize>,
    char_length: Option<usize>,
    precision: Option<usize>,
    scale: Option<usize>,
    nullable: Option<usize>,
}

impl CatalogColumns {
    fn locate(table: &TableName, rows: &RowSet) -> Result<Self> {
        let required = |name: &str| {
            rows.column_index(name)
                .ok_or_else(|| malformed(table, 0, format!("missing column {name}")))
        };

        Ok(Self {
            name: required("COLUMN_NAME")?,
            data_type: required("DATA_TYPE")?,
            data_length: rows.column_index("DATA_LENGTH"),
            char_length: rows.column_index("CHAR_LENGTH"),
            precision: rows.column_index("DATA_PRECISION"),
            scale: rows.column_index("DATA_SCALE"),
            nullable: rows.column_index("NULLABLE"),
        })
    }
}

/// Rebuilds declared column types from `ALL_TAB_COLUMNS` rows.
pub(crate) fn schema_from_catalog(table: &TableName, rows: &RowSet) -> Result<Schema> {
    let mut schema = Schema::new();
    if rows.rows.is_empty() {
        return Ok(schema);
    }

    let columns = CatalogColumns::locate(table, rows)?;
    for (index, row) in rows.rows.iter().enumerate() {
        let cell = |position: Option<usize>| position.and_then(|position| row.get(position));
        let number = |position: Option<usize>| cell(position).and_then(Value::as_u64);

        let name = cell(Some(columns.name))
            .and_then(Value::as_text)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| malformed(table, index, "COLUMN_NAME is empty"))?;
        let data_type = cell(Some(columns.data_type))
            .and_then(Value::as_text)
            .ok_or_else(|| malformed(table, index, "DATA_TYPE is empty"))?;

        let type_text = declared_type(
            data_type,
            number(columns.data_length),
            number(columns.char_length),
            number(columns.precision),
            number(columns.scale),
        );
        let data_type = ColumnType::parse(&type_text)?;
        let nullable = cell(columns.nullable)
            .and_then(Value::as_text)
            .is_none_or(|flag| !flag.eq_ignore_ascii_case("N"));

        schema.push(ColumnSpec {
            nullable,
            ..ColumnSpec::new(name, data_type)
        })?;
    }

    Ok(schema)
}

fn declared_type(
    data_type: &str,
    data_length: Option<u64>,
    char_length: Option<u64>,
    precision: Option<u64>,
    scale: Option<u64>,
) -> String {
    let data_type = data_type.trim().to_ascii_uppercase();
    match data_type.as_str() {
        "NUMBER" => match (precision, scale) {
            (Some(precision), Some(scale)) => format!("NUMBER({precision}, {scale})"),
            (Some(precision), None) => format!("NUMBER({precision})"),
            (None, Some(scale)) => format!("NUMBER(*, {scale})"),
            (None, None) => data_type,
        },
        "FLOAT" => precision.map_or(data_type.clone(), |precision| {
            format!("FLOAT({precision})")
        }),
        "VARCHAR2" | "NVARCHAR2" | "CHAR" | "NCHAR" => char_length
            .filter(|length| *length > 0)
            .or(data_length)
            .map_or(data_type.clone(), |length| format!("{data_type}({length})")),
        "RAW" => data_length.map_or(data_type.clone(), |length| format!("RAW({length})")),
        // `INTERVAL DAY(2) TO SECOND(6)` carries two parameter lists.
        interval if interval.starts_with("INTERVAL") => strip_parameter_lists(interval),
        _ => data_type,
    }
}

fn strip_parameter_lists(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut depth = 0_usize;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(ch),
            _ => {}
        }
    }
    stripped
}

fn malformed(table: &TableName, row: usize, reason: impl Into<String>) -> SchemaError {
    SchemaError::MalformedCatalogRow {
        table: table.to_string(),
        row,
        reason: reason.into(),
    }
}
