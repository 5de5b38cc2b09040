use dialectkit_core::{ColumnMeta, DialectAdapter, DialectOverrides, RowSet, Value};
use dialectkit_dialect_oracle::adapter;
use dialectkit_testkit::{FakeBackend, FakeManager};

pub const CATALOG_FRAGMENT: &str = "FROM ALL_TAB_COLUMNS";

pub fn oracle_adapter() -> (FakeBackend, DialectAdapter<FakeManager>) {
    oracle_adapter_with(&DialectOverrides::default())
}

pub fn oracle_adapter_with(
    overrides: &DialectOverrides,
) -> (FakeBackend, DialectAdapter<FakeManager>) {
    let backend = FakeBackend::new();
    let adapter = adapter(backend.manager(), overrides).expect("oracle adapter composes");
    (backend, adapter)
}

/// One `ALL_TAB_COLUMNS` row: name, data type, char length, precision, scale,
/// nullable flag.
pub struct CatalogRow<'a> {
    pub name: &'a str,
    pub data_type: &'a str,
    pub char_length: Option<i64>,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
    pub nullable: bool,
}

impl<'a> CatalogRow<'a> {
    pub fn new(name: &'a str, data_type: &'a str) -> Self {
        Self {
            name,
            data_type,
            char_length: None,
            precision: None,
            scale: None,
            nullable: true,
        }
    }

    pub fn chars(mut self, length: i64) -> Self {
        self.char_length = Some(length);
        self
    }

    pub fn number(mut self, precision: i64, scale: i64) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

pub fn catalog_rows(rows: &[CatalogRow<'_>]) -> RowSet {
    let optional = |value: Option<i64>| value.map_or(Value::Null, Value::Integer);
    RowSet {
        columns: [
            "COLUMN_NAME",
            "DATA_TYPE",
            "DATA_LENGTH",
            "CHAR_LENGTH",
            "DATA_PRECISION",
            "DATA_SCALE",
            "NULLABLE",
        ]
        .into_iter()
        .map(|name| ColumnMeta::new(name, "VARCHAR2"))
        .collect(),
        rows: rows
            .iter()
            .map(|row| {
                vec![
                    Value::Text(row.name.to_string()),
                    Value::Text(row.data_type.to_string()),
                    Value::Integer(22),
                    optional(row.char_length),
                    optional(row.precision),
                    optional(row.scale),
                    Value::Text(if row.nullable { "Y" } else { "N" }.to_string()),
                ]
            })
            .collect(),
    }
}
