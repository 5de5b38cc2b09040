use dialectkit_core::{ColumnMeta, DialectAdapter, DialectOverrides, RowSet, Value};
use dialectkit_dialect_mssql::adapter;
use dialectkit_testkit::{FakeBackend, FakeManager};

pub const CATALOG_FRAGMENT: &str = "FROM sys.columns";

pub fn mssql_adapter() -> (FakeBackend, DialectAdapter<FakeManager>) {
    let backend = FakeBackend::new();
    let adapter = adapter(backend.manager(), &DialectOverrides::default())
        .expect("mssql adapter composes");
    (backend, adapter)
}

/// `(name, type, max_length, precision, scale, nullable)` as `sys.columns`
/// reports them.
pub fn catalog_rows(rows: &[(&str, &str, i64, i64, i64, bool)]) -> RowSet {
    RowSet {
        columns: [
            ("COLUMN_NAME", "NVarchar"),
            ("DATA_TYPE", "NVarchar"),
            ("MAX_LENGTH", "Int2"),
            ("PRECISION", "Int1"),
            ("SCALE", "Int1"),
            ("IS_NULLABLE", "Bit"),
        ]
        .into_iter()
        .map(|(name, type_name)| ColumnMeta::new(name, type_name))
        .collect(),
        rows: rows
            .iter()
            .map(|(name, data_type, max_length, precision, scale, nullable)| {
                vec![
                    Value::Text((*name).to_string()),
                    Value::Text((*data_type).to_string()),
                    Value::Integer(*max_length),
                    Value::Integer(*precision),
                    Value::Integer(*scale),
                    Value::Bool(*nullable),
                ]
            })
            .collect(),
    }
}
