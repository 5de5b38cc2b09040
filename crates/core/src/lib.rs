mod adapter;
pub mod capability;
mod config;
mod connection;
mod dialect;
mod diff;
mod error;
mod features;
mod normalize;
mod plan;
mod schema;
mod statement;
mod transaction;
mod types;

pub use adapter::{DialectAdapter, DialectProfile, ExecuteOptions};
pub use capability::{
    Capabilities, CatalogFromFunction, CatalogResolver, CurrentCatalog, DeleteInsertOverwrite,
    DriverNativeFetch, HashTruncate, IdentifierWorkaround, IndexSupport, InsertOverwrite,
    MergeInsertOverwrite, NativeFetch, NoCatalog, NoIndexes, Passthrough, RowByRowFetch,
    StandaloneIndexes,
};
pub use config::{ConnectionConfig, DialectOverrides, DiffSettings};
pub use connection::{
    ColumnMeta, Connection, ConnectionManager, ConnectionPool, PoolConfig, PooledConnection,
    Query, RowSet, TabularResult, Value,
};
pub use dialect::Dialect;
pub use diff::{DiffConfig, SchemaDiffer};
pub use error::{
    BoxError, ConfigurationError, ConnectivityError, Error, ExecutionError, GenerateError, Result,
    SchemaError, UnsupportedOperationError,
};
pub use features::{
    CatalogSupport, CommentCreationTable, CommentCreationView, FeatureFlags, FeatureOverrides,
};
pub use normalize::{
    NormalizedParam, NormalizedType, TypeNormalization, TypeNormalizationBuilder, TypeTableConfig,
};
pub use plan::{AlterationOp, AlterationPlan};
pub use schema::{ColumnDecl, ColumnSpec, Schema, TableName};
pub use statement::{
    CommentTarget, IndexDef, MergeOverwrite, OverwriteScope, RenderContext, Statement,
};
pub use transaction::Transaction;
pub use types::{ColumnType, TypeName, TypeParam};
