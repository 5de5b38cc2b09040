use dialectkit_core::{DialectAdapter, DialectOverrides};
use dialectkit_testkit::{FakeBackend, FakeManager};

pub fn oracle() -> DialectAdapter<FakeManager> {
    dialectkit_dialect_oracle::adapter(FakeBackend::new().manager(), &DialectOverrides::default())
        .expect("oracle adapter composes")
}

pub fn mssql() -> DialectAdapter<FakeManager> {
    dialectkit_dialect_mssql::adapter(FakeBackend::new().manager(), &DialectOverrides::default())
        .expect("mssql adapter composes")
}
