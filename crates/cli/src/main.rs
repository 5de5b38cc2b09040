mod error_presentation;
mod offline;

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use dialectkit_core::{
    ConnectionConfig, ConnectionManager, DialectAdapter, DialectOverrides, Schema, TableName,
    UnsupportedOperationError,
};
use error_presentation::{CliError, CliResult, render_runtime_error};
use offline::OfflineManager;
use tracing::info;
use tracing_subscriber::EnvFilter;

const NO_CHANGES: &str = "-- no changes --";

#[derive(Debug, Parser)]
#[command(name = "dialectkit", version, about = "Plan and apply column-level schema changes")]
struct Cli {
    /// Log adapter activity to stderr; `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the script moving `--current` to `--desired` without a backend.
    Diff(DiffArgs),
    /// Reconcile a live table with `--desired`.
    Apply(ApplyArgs),
    /// Check that the backend answers.
    Ping(ConnectionArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DialectName {
    Oracle,
    Mssql,
}

impl DialectName {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::Mssql => "mssql",
        }
    }
}

#[derive(Debug, Args)]
struct TargetArgs {
    #[arg(long, value_enum)]
    dialect: DialectName,

    /// Table to reconcile, optionally schema-qualified.
    #[arg(long)]
    table: String,

    /// YAML mapping of column name to type.
    #[arg(long)]
    desired: PathBuf,

    /// YAML dialect overrides.
    #[arg(long)]
    overrides: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct DiffArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Current layout; an absent file means the table has no columns yet.
    #[arg(long)]
    current: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ApplyArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// YAML connection settings.
    #[arg(long)]
    connection: PathBuf,

    /// Print the planned script without executing it.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct ConnectionArgs {
    #[arg(long, value_enum)]
    dialect: DialectName,

    /// YAML connection settings.
    #[arg(long)]
    connection: PathBuf,

    /// YAML dialect overrides.
    #[arg(long)]
    overrides: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Diff(args) => diff(&args),
        Command::Apply(args) => apply(&args),
        Command::Ping(args) => ping(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", render_runtime_error(error));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn diff(args: &DiffArgs) -> CliResult<()> {
    let target = &args.target;
    let overrides = read_overrides(target.overrides.as_deref())?;
    let table = parse_table(&target.table, "diff")?;
    let desired: Schema = read_yaml(&target.desired)?;
    let current: Schema = match &args.current {
        Some(path) => read_yaml(path)?,
        None => Schema::new(),
    };

    let script = match target.dialect {
        DialectName::Oracle => {
            let adapter = oracle_adapter(OfflineManager, &overrides, "diff")?;
            render_diff(&adapter, &table, &current, &desired)
        }
        DialectName::Mssql => {
            let adapter = mssql_adapter(OfflineManager, &overrides, "diff")?;
            render_diff(&adapter, &table, &current, &desired)
        }
    }
    .map_err(CliError::core("diff"))?;

    print!("{script}");
    Ok(())
}

fn apply(args: &ApplyArgs) -> CliResult<()> {
    let target = &args.target;
    let overrides = read_overrides(target.overrides.as_deref())?;
    let table = parse_table(&target.table, "apply")?;
    let desired: Schema = read_yaml(&target.desired)?;
    let config: ConnectionConfig = read_yaml(&args.connection)?;

    match target.dialect {
        DialectName::Oracle => Err(no_bundled_driver("apply", DialectName::Oracle)),
        DialectName::Mssql => {
            let adapter = mssql_live(config, &overrides, "apply")?;
            reconcile(&adapter, &table, &desired, args.dry_run).map_err(CliError::core("apply"))
        }
    }
}

fn ping(args: &ConnectionArgs) -> CliResult<()> {
    let overrides = read_overrides(args.overrides.as_deref())?;
    let config: ConnectionConfig = read_yaml(&args.connection)?;

    match args.dialect {
        DialectName::Oracle => Err(no_bundled_driver("ping", DialectName::Oracle)),
        DialectName::Mssql => {
            let adapter = mssql_live(config, &overrides, "ping")?;
            adapter.ping().map_err(CliError::core("ping"))?;
            println!("ok");
            Ok(())
        }
    }
}

fn render_diff<M: ConnectionManager>(
    adapter: &DialectAdapter<M>,
    table: &TableName,
    current: &Schema,
    desired: &Schema,
) -> dialectkit_core::Result<String> {
    let plan = adapter.differ().diff(current, desired);
    if plan.is_empty() {
        return Ok(format!("{NO_CHANGES}\n"));
    }
    adapter.render_plan(table, &plan)
}

fn reconcile<M: ConnectionManager>(
    adapter: &DialectAdapter<M>,
    table: &TableName,
    desired: &Schema,
    dry_run: bool,
) -> dialectkit_core::Result<()> {
    let plan = adapter.plan_alterations(table, desired)?;
    if plan.is_empty() {
        println!("{NO_CHANGES}");
        return Ok(());
    }

    print!("{}", adapter.render_plan(table, &plan)?);
    if dry_run {
        return Ok(());
    }

    let steps = plan.len();
    adapter.apply_plan(table, plan)?;
    info!(table = %table, steps, "table reconciled");
    Ok(())
}

fn no_bundled_driver(command: &'static str, dialect: DialectName) -> CliError {
    CliError::Core {
        command,
        source: UnsupportedOperationError::new(
            command,
            dialect.as_str(),
            "no driver is bundled; use `diff` for offline plans",
        )
        .into(),
    }
}

fn parse_table(text: &str, command: &'static str) -> CliResult<TableName> {
    text.parse::<TableName>()
        .map_err(|error| CliError::core(command)(error.into()))
}

fn read_overrides(path: Option<&Path>) -> CliResult<DialectOverrides> {
    match path {
        Some(path) => read_yaml(path),
        None => Ok(DialectOverrides::default()),
    }
}

fn read_yaml<T: serde::de::DeserializeOwned + Default>(path: &Path) -> CliResult<T> {
    let source = fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    if source.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(&source).map_err(|source| CliError::Document {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(feature = "oracle")]
fn oracle_adapter<M: ConnectionManager>(
    manager: M,
    overrides: &DialectOverrides,
    command: &'static str,
) -> CliResult<DialectAdapter<M>> {
    dialectkit_dialect_oracle::adapter(manager, overrides).map_err(CliError::core(command))
}

#[cfg(not(feature = "oracle"))]
fn oracle_adapter<M: ConnectionManager>(
    _manager: M,
    _overrides: &DialectOverrides,
    _command: &'static str,
) -> CliResult<DialectAdapter<M>> {
    Err(CliError::DialectDisabled("oracle"))
}

#[cfg(feature = "mssql")]
fn mssql_adapter<M: ConnectionManager>(
    manager: M,
    overrides: &DialectOverrides,
    command: &'static str,
) -> CliResult<DialectAdapter<M>> {
    dialectkit_dialect_mssql::adapter(manager, overrides).map_err(CliError::core(command))
}

#[cfg(not(feature = "mssql"))]
fn mssql_adapter<M: ConnectionManager>(
    _manager: M,
    _overrides: &DialectOverrides,
    _command: &'static str,
) -> CliResult<DialectAdapter<M>> {
    Err(CliError::DialectDisabled("mssql"))
}

#[cfg(feature = "mssql")]
fn mssql_live(
    config: ConnectionConfig,
    overrides: &DialectOverrides,
    command: &'static str,
) -> CliResult<DialectAdapter<dialectkit_dialect_mssql::MssqlManager>> {
    dialectkit_dialect_mssql::connect(config, overrides).map_err(CliError::core(command))
}

#[cfg(not(feature = "mssql"))]
fn mssql_live(
    _config: ConnectionConfig,
    _overrides: &DialectOverrides,
    _command: &'static str,
) -> CliResult<DialectAdapter<OfflineManager>> {
    Err(CliError::DialectDisabled("mssql"))
}
