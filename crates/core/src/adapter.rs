use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    AlterationOp, AlterationPlan, Capabilities, ColumnSpec, CommentTarget, ConfigurationError,
    Connection, ConnectionManager, ConnectionPool, CurrentCatalog, Dialect, DialectOverrides,
    DiffConfig, FeatureFlags, IndexDef, OverwriteScope, Query, RenderContext, Result, Schema,
    SchemaDiffer, Statement, TableName, TabularResult, Transaction, TypeNormalization,
    UnsupportedOperationError, transaction::at_position,
};

/// Immutable per-dialect data shared by every adapter of that dialect.
#[derive(Debug, Clone)]
pub struct DialectProfile {
    pub name: &'static str,
    pub types: Arc<TypeNormalization>,
    pub features: FeatureFlags,
}

impl DialectProfile {
    pub fn new(name: &'static str, types: TypeNormalization, features: FeatureFlags) -> Self {
        Self {
            name,
            types: Arc::new(types),
            features,
        }
    }

    /// Applies a deployment's type and flag overrides. Type entries replace
    /// the built-in entry of the same name.
    pub fn with_overrides(
        self,
        overrides: &DialectOverrides,
    ) -> std::result::Result<Self, ConfigurationError> {
        let types = if overrides.types.defaults.is_empty() && overrides.types.maxima.is_empty() {
            self.types
        } else {
            Arc::new(self.types.merged_with(&overrides.types)?)
        };

        Ok(Self {
            name: self.name,
            types,
            features: self.features.with_overrides(&overrides.features),
        })
    }
}

/// Per-call switches for [`DialectAdapter::execute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// `None` keeps the default of quoting every identifier.
    pub quote_identifiers: Option<bool>,
}

impl ExecuteOptions {
    #[must_use]
    pub const fn unquoted() -> Self {
        Self {
            quote_identifiers: Some(false),
        }
    }

    const fn quotes(self) -> bool {
        match self.quote_identifiers {
            Some(quote) => quote,
            None => true,
        }
    }
}

/// One dialect's schema operations against a pooled backend.
///
/// All capability choices are fixed at construction. The adapter is
/// `Send + Sync` when its manager is; concurrent callers each check out
/// their own connection.
pub struct DialectAdapter<M: ConnectionManager> {
    dialect: Arc<dyn Dialect>,
    profile: Arc<DialectProfile>,
    capabilities: Capabilities,
    differ: SchemaDiffer,
    pool: ConnectionPool<M>,
}

impl<M: ConnectionManager> DialectAdapter<M> {
    pub fn new(
        dialect: Arc<dyn Dialect>,
        profile: DialectProfile,
        capabilities: Capabilities,
        pool: ConnectionPool<M>,
    ) -> Result<Self> {
        validate_composition(dialect.as_ref(), &profile, &capabilities)?;

        let differ = SchemaDiffer::new(Arc::clone(&profile.types));
        Ok(Self {
            dialect,
            profile: Arc::new(profile),
            capabilities,
            differ,
            pool,
        })
    }

    #[must_use]
    pub fn with_diff_config(mut self, config: DiffConfig) -> Self {
        self.differ = self.differ.with_config(config);
        self
    }

    #[must_use]
    pub fn dialect_name(&self) -> &'static str {
        self.profile.name
    }

    #[must_use]
    pub fn features(&self) -> FeatureFlags {
        self.profile.features
    }

    #[must_use]
    pub fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    #[must_use]
    pub const fn differ(&self) -> &SchemaDiffer {
        &self.differ
    }

    #[must_use]
    pub const fn pool(&self) -> &ConnectionPool<M> {
        &self.pool
    }

    #[must_use]
    pub fn supports_indexes(&self) -> bool {
        self.capabilities.indexes.supports_standalone_indexes()
    }

    #[must_use]
    pub fn physical_name(&self, logical: &str) -> String {
        self.capabilities.identifiers.physical_name(logical)
    }

    #[must_use]
    pub fn max_identifier_length(&self) -> Option<usize> {
        self.capabilities.identifiers.max_length()
    }

    pub fn ping(&self) -> Result<()> {
        let mut connection = self.pool.checkout()?;
        let result = connection.ping();
        connection.observe(result)
    }

    /// Dialect SQL for `statement` without executing it.
    pub fn render(&self, statement: &Statement, options: ExecuteOptions) -> Result<String> {
        let ctx = RenderContext::new(options.quotes(), self.capabilities.identifiers.as_ref());
        self.dialect.render(statement, &ctx)
    }

    /// Renders `statements` as one script, separated by the dialect's batch
    /// separator when it has one.
    pub fn render_script(&self, statements: &[Statement], options: ExecuteOptions) -> Result<String> {
        let separator = self.dialect.batch_separator();
        let mut script = String::new();
        for statement in statements {
            let sql = self.render(statement, options)?;
            script.push_str(&sql);
            // PL/SQL blocks and T-SQL MERGE carry their own terminator.
            if !sql.ends_with(';') {
                script.push(';');
            }
            script.push('\n');
            if !separator.is_empty() {
                script.push_str(separator);
                script.push('\n');
            }
        }
        Ok(script)
    }

    pub fn execute(&self, statement: &Statement, options: ExecuteOptions) -> Result<()> {
        let sql = self.render(statement, options)?;
        self.run(&[sql], false)
    }

    /// Runs an opaque pre-compiled statement untouched.
    pub fn execute_query(&self, query: &Query) -> Result<()> {
        self.run(&[query.sql().to_string()], false)
    }

    pub fn rename_table(&self, from: &TableName, to: &TableName) -> Result<()> {
        self.execute(
            &Statement::RenameTable {
                from: from.clone(),
                to: to.clone(),
            },
            ExecuteOptions::unquoted(),
        )
    }

    pub fn create_table(&self, table: &TableName, schema: &Schema) -> Result<()> {
        self.execute(
            &Statement::CreateTable {
                table: table.clone(),
                columns: schema.columns().cloned().collect(),
            },
            ExecuteOptions::default(),
        )
    }

    pub fn drop_table(&self, table: &TableName, if_exists: bool) -> Result<()> {
        self.execute(
            &Statement::DropTable {
                table: table.clone(),
                if_exists,
            },
            ExecuteOptions::default(),
        )
    }

    pub fn create_index(&self, index: &IndexDef) -> Result<()> {
        self.require(
            self.supports_indexes(),
            "create index",
            "standalone indexes are not supported",
        )?;
        self.execute(&Statement::CreateIndex(index.clone()), ExecuteOptions::default())
    }

    pub fn create_view(
        &self,
        view: &TableName,
        query: &Query,
        materialized: bool,
        replace: bool,
    ) -> Result<()> {
        if materialized {
            self.require(
                self.profile.features.supports_materialized_views,
                "create materialized view",
                "materialized views are not supported",
            )?;
        }
        self.execute(
            &Statement::CreateView {
                view: view.clone(),
                query: query.clone(),
                materialized,
                replace,
            },
            ExecuteOptions::default(),
        )
    }

    pub fn drop_view(&self, view: &TableName, materialized: bool, if_exists: bool) -> Result<()> {
        if materialized {
            self.require(
                self.profile.features.supports_materialized_views,
                "drop materialized view",
                "materialized views are not supported",
            )?;
        }
        self.execute(
            &Statement::DropView {
                view: view.clone(),
                materialized,
                if_exists,
            },
            ExecuteOptions::default(),
        )
    }

    /// Atomically swaps the content and shape of `table` for `query`'s result.
    pub fn replace_table(&self, table: &TableName, query: &Query) -> Result<()> {
        self.require(
            self.profile.features.supports_replace_table,
            "replace table",
            "CREATE OR REPLACE TABLE is not supported",
        )?;
        self.execute(
            &Statement::CreateTableAs {
                table: table.clone(),
                query: query.clone(),
                replace: true,
            },
            ExecuteOptions::default(),
        )
    }

    pub fn comment_on_table(&self, table: &TableName, comment: &str) -> Result<()> {
        self.require(
            self.profile.features.comment_on_table.supports_comment_command(),
            "comment on table",
            "table comments are not supported",
        )?;
        self.comment(CommentTarget::Table, table, comment)
    }

    pub fn comment_on_view(&self, view: &TableName, comment: &str) -> Result<()> {
        self.require(
            self.profile.features.comment_on_view.supports_comment_command(),
            "comment on view",
            "view comments are not supported",
        )?;
        self.comment(CommentTarget::View, view, comment)
    }

    /// Live column layout of `table`; empty when the table does not exist.
    pub fn table_schema(&self, table: &TableName) -> Result<Schema> {
        let physical = self.physical_table(table);
        let query = self.dialect.table_columns_query(&physical);

        let mut connection = self.pool.checkout()?;
        let result = connection.query(query.sql());
        let rows = connection.observe(result)?;
        drop(connection);

        self.dialect.schema_from_catalog(&physical, &rows)
    }

    /// Diffs the live table against `desired`. Desired columns are compared
    /// under their physical names, which is what the catalog reports back.
    pub fn plan_alterations(&self, table: &TableName, desired: &Schema) -> Result<AlterationPlan> {
        let current = self.table_schema(table)?;
        let desired = self.physical_schema(desired)?;
        let plan = self.differ.diff(&current, &desired);
        debug!(
            dialect = self.profile.name,
            table = %table,
            ops = plan.len(),
            "planned alterations"
        );
        Ok(plan)
    }

    /// Renders the whole plan first, then executes it step by step on one
    /// connection. Nothing runs when any step cannot be rendered.
    pub fn apply_plan(&self, table: &TableName, plan: AlterationPlan) -> Result<()> {
        if plan.is_empty() {
            debug!(dialect = self.profile.name, table = %table, "plan is empty");
            return Ok(());
        }

        let statements = alteration_statements(table, plan);
        let rendered = self.render_all(&statements, ExecuteOptions::default())?;
        info!(
            dialect = self.profile.name,
            table = %table,
            statements = rendered.len(),
            "applying alteration plan"
        );
        self.run(&rendered, false)
    }

    /// Dry-run counterpart of [`DialectAdapter::apply_plan`].
    pub fn render_plan(&self, table: &TableName, plan: &AlterationPlan) -> Result<String> {
        let statements = alteration_statements(table, plan.clone());
        self.render_script(&statements, ExecuteOptions::default())
    }

    /// Introspects, diffs and applies; returns the number of steps executed.
    pub fn reconcile_table(&self, table: &TableName, desired: &Schema) -> Result<usize> {
        let plan = self.plan_alterations(table, desired)?;
        let steps = plan.len();
        self.apply_plan(table, plan)?;
        Ok(steps)
    }

    /// Replaces the rows of `table` selected by `scope` with the rows of
    /// `source`, through the dialect's overwrite strategy.
    pub fn insert_overwrite(
        &self,
        table: &TableName,
        source: &Query,
        columns: &[String],
        scope: &OverwriteScope,
    ) -> Result<()> {
        let strategy = self.capabilities.insert_overwrite.as_ref();
        let statements = strategy.statements(table, source, columns, scope);
        let rendered = self.render_all(&statements, ExecuteOptions::default())?;
        info!(
            dialect = self.profile.name,
            table = %table,
            strategy = strategy.name(),
            "overwriting rows"
        );
        self.run(&rendered, rendered.len() > 1)
    }

    pub fn fetch(&self, query: &Query) -> Result<TabularResult> {
        let mut connection = self.pool.checkout()?;
        debug!(
            dialect = self.profile.name,
            path = self.capabilities.fetch.name(),
            "fetching tabular result"
        );
        let result = self.capabilities.fetch.fetch(&mut *connection, query);
        connection.observe(result)
    }

    pub fn current_catalog(&self) -> Result<CurrentCatalog> {
        if !self.capabilities.catalog.is_supported() {
            return Ok(CurrentCatalog::Unsupported);
        }

        let mut connection = self.pool.checkout()?;
        let result = self.capabilities.catalog.current_catalog(&mut *connection);
        connection.observe(result)
    }

    fn comment(&self, target: CommentTarget, object: &TableName, comment: &str) -> Result<()> {
        self.execute(
            &Statement::Comment {
                target,
                object: object.clone(),
                comment: comment.to_string(),
            },
            ExecuteOptions::default(),
        )
    }

    fn require(&self, supported: bool, operation: &str, reason: &str) -> Result<()> {
        if supported {
            return Ok(());
        }
        Err(UnsupportedOperationError::new(operation, self.profile.name, reason).into())
    }

    fn physical_table(&self, table: &TableName) -> TableName {
        TableName {
            schema: table.schema.as_deref().map(|schema| self.physical_name(schema)),
            name: self.physical_name(&table.name),
        }
    }

    fn physical_schema(&self, logical: &Schema) -> Result<Schema> {
        let columns = logical.columns().map(|column| ColumnSpec {
            name: self.physical_name(&column.name),
            ..column.clone()
        });
        Ok(Schema::from_columns(columns)?)
    }

    fn render_all(&self, statements: &[Statement], options: ExecuteOptions) -> Result<Vec<String>> {
        statements
            .iter()
            .map(|statement| self.render(statement, options))
            .collect()
    }

    fn run(&self, statements: &[String], transactional: bool) -> Result<()> {
        let mut connection = self.pool.checkout()?;
        let result = if transactional {
            run_in_transaction(&mut *connection, statements)
        } else {
            run_in_order(&mut *connection, statements)
        };
        connection.observe(result)
    }
}

fn validate_composition(
    dialect: &dyn Dialect,
    profile: &DialectProfile,
    capabilities: &Capabilities,
) -> std::result::Result<(), ConfigurationError> {
    if dialect.name() != profile.name {
        return Err(ConfigurationError::CapabilityMismatch {
            dialect: profile.name.to_string(),
            detail: format!("profile is paired with the `{}` dialect", dialect.name()),
        });
    }

    let flagged = profile.features.catalog_support.is_supported();
    if flagged != capabilities.catalog.is_supported() {
        return Err(ConfigurationError::CapabilityMismatch {
            dialect: profile.name.to_string(),
            detail: format!(
                "catalog support is {:?} but the catalog resolver {}",
                profile.features.catalog_support,
                if flagged {
                    "cannot resolve catalogs"
                } else {
                    "resolves catalogs"
                }
            ),
        });
    }

    Ok(())
}

fn alteration_statements(table: &TableName, plan: AlterationPlan) -> Vec<Statement> {
    plan.into_iter()
        .map(|op| alteration_statement(table, op))
        .collect()
}

fn alteration_statement(table: &TableName, op: AlterationOp) -> Statement {
    let table = table.clone();
    match op {
        AlterationOp::AddColumn(column) => Statement::AddColumn { table, column },
        AlterationOp::DropColumn(ColumnSpec { name, .. }) => Statement::DropColumn {
            table,
            column: name,
        },
        // Only the type changes; the live nullability is restated as is.
        AlterationOp::AlterColumnType { current, desired } => Statement::AlterColumnType {
            table,
            column: ColumnSpec {
                data_type: desired.data_type,
                ..current
            },
        },
        AlterationOp::AlterColumnNullability { desired, .. } => {
            Statement::AlterColumnNullability {
                table,
                column: desired,
            }
        }
    }
}

fn run_in_order(connection: &mut dyn Connection, statements: &[String]) -> Result<()> {
    for (index, sql) in statements.iter().enumerate() {
        debug!(statement_index = index, sql = %sql, "executing statement");
        connection
            .execute(sql)
            .map_err(|error| at_position(error, index, index))?;
    }
    Ok(())
}

fn run_in_transaction(connection: &mut dyn Connection, statements: &[String]) -> Result<()> {
    let mut transaction = Transaction::begin(connection)?;
    for sql in statements {
        debug!(
            statement_index = transaction.executed_statements(),
            sql = %sql,
            "executing statement in transaction"
        );
        transaction.execute(sql)?;
    }
    transaction.commit()
}
