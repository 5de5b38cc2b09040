use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use dialectkit_core::{
    ConnectionManager, DialectAdapter, DiffConfig, Schema, SchemaDiffer, TableName,
};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_TABLE: &str = "t";

/// One named diff case. Both schemas are ordered column maps whose values are
/// either a type (`VARCHAR2(100)`) or `{ type, nullable }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestCase {
    pub table: Option<String>,
    pub current: Schema,
    pub desired: Schema,
    pub up: Option<String>,
    pub down: Option<String>,
    pub error: Option<String>,
    /// `oracle`, or `!oracle` for every dialect except oracle.
    pub dialect: Option<String>,
    /// `None` resolves to `false` when the case runs.
    pub enable_drop: Option<bool>,
    pub compare_nullability: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseFile {
    pub path: PathBuf,
    pub file_name: String,
    pub cases: BTreeMap<String, TestCase>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Core(#[from] dialectkit_core::Error),
    #[error("yaml testcase: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("reading `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Assertion(String),
}

pub fn load_test_cases_from_str(yaml: &str) -> Result<BTreeMap<String, TestCase>, RunnerError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Loads every `*.yml`/`*.yaml` file directly under `dir`, sorted by name.
pub fn load_test_cases_from_dir(dir: impl AsRef<Path>) -> Result<Vec<TestCaseFile>, RunnerError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|source| RunnerError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| RunnerError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yml" | "yaml")
        ) {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let source = fs::read_to_string(&path).map_err(|source| RunnerError::Io {
                path: path.clone(),
                source,
            })?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(TestCaseFile {
                cases: load_test_cases_from_str(&source)?,
                path,
                file_name,
            })
        })
        .collect()
}

pub fn matches_dialect(requirement: Option<&str>, dialect: &str) -> bool {
    let Some(requirement) = requirement.map(str::trim).filter(|value| !value.is_empty()) else {
        return true;
    };

    if let Some(excluded) = requirement.strip_prefix('!') {
        return excluded != dialect;
    }

    requirement == dialect
}

/// Diffs both directions without touching a backend and checks the rendered
/// scripts, plan completeness and idempotency.
pub fn run_offline_test<M: ConnectionManager>(
    adapter: &DialectAdapter<M>,
    test: &TestCase,
) -> TestResult {
    let dialect = adapter.dialect_name();
    if !matches_dialect(test.dialect.as_deref(), dialect) {
        return TestResult::Skipped(format!(
            "requires dialect '{}', running on '{dialect}'",
            test.dialect.as_deref().unwrap_or_default()
        ));
    }

    match evaluate_expected_error(test, run_offline_flow(adapter, test)) {
        Ok(()) => TestResult::Passed,
        Err(error) => TestResult::Failed(error.to_string()),
    }
}

fn run_offline_flow<M: ConnectionManager>(
    adapter: &DialectAdapter<M>,
    test: &TestCase,
) -> Result<(), RunnerError> {
    validate_direction_expectations(test)?;

    let table = match test.table.as_deref() {
        Some(text) => text.parse::<TableName>().map_err(dialectkit_core::Error::from)?,
        None => TableName::new(DEFAULT_TABLE),
    };
    let differ = adapter.differ().clone().with_config(DiffConfig::new(
        test.enable_drop.unwrap_or(false),
        test.compare_nullability,
    ));

    assert_direction(
        adapter,
        &differ,
        &table,
        "up",
        &test.current,
        &test.desired,
        test.up.as_deref(),
    )?;
    assert_direction(
        adapter,
        &differ,
        &table,
        "down",
        &test.desired,
        &test.current,
        test.down.as_deref(),
    )?;

    assert_idempotent(&differ, &test.desired, "desired schema")?;
    assert_idempotent(&differ, &test.current, "current schema")
}

fn assert_direction<M: ConnectionManager>(
    adapter: &DialectAdapter<M>,
    differ: &SchemaDiffer,
    table: &TableName,
    direction: &str,
    from: &Schema,
    to: &Schema,
    expected: Option<&str>,
) -> Result<(), RunnerError> {
    let plan = differ.diff(from, to);
    let actual = adapter.render_plan(table, &plan)?;

    let residual = differ.diff(&plan.applied_to(from), to);
    if !residual.is_empty() {
        let rendered = adapter.render_plan(table, &residual)?;
        return Err(RunnerError::Assertion(format!(
            "{direction} plan is incomplete; after applying it the differ still wants:\n{}",
            rendered.trim()
        )));
    }

    let Some(expected) = expected else {
        return Ok(());
    };
    if normalize_sql(expected) == normalize_sql(&actual) {
        return Ok(());
    }

    Err(RunnerError::Assertion(format!(
        "{direction} SQL mismatch; expected:\n{}\nactual:\n{}",
        expected.trim(),
        actual.trim()
    )))
}

fn assert_idempotent(
    differ: &SchemaDiffer,
    schema: &Schema,
    phase: &str,
) -> Result<(), RunnerError> {
    let plan = differ.diff(schema, schema);
    if plan.is_empty() {
        return Ok(());
    }

    Err(RunnerError::Assertion(format!(
        "{phase} is not idempotent; expected no changes but got {} step(s)",
        plan.len()
    )))
}

fn evaluate_expected_error(
    test: &TestCase,
    execution_result: Result<(), RunnerError>,
) -> Result<(), RunnerError> {
    let Some(expected_error) = test.error.as_deref() else {
        return execution_result;
    };

    match execution_result {
        Ok(()) => Err(RunnerError::Assertion(format!(
            "expected error: {expected_error}, but got no error"
        ))),
        Err(actual_error) => {
            let actual_error = actual_error.to_string();
            if actual_error == expected_error {
                Ok(())
            } else {
                Err(RunnerError::Assertion(format!(
                    "expected error: {expected_error}, but got: {actual_error}"
                )))
            }
        }
    }
}

fn validate_direction_expectations(test: &TestCase) -> Result<(), RunnerError> {
    match (&test.up, &test.down) {
        (Some(_), Some(_)) | (None, None) => Ok(()),
        _ => Err(RunnerError::Assertion(
            "`up` and `down` must either both be set or both be omitted".to_string(),
        )),
    }
}

fn normalize_sql(sql: &str) -> &str {
    sql.trim()
}
