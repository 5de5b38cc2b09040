use std::{fs, process::Command};

use tempfile::{TempDir, tempdir};

fn run_dialectkit(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_dialectkit"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|error| panic!("failed to run dialectkit: {error}"))
}

fn write(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap_or_else(|error| panic!("failed to write {name}: {error}"));
    path.to_string_lossy().into_owned()
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let output = run_dialectkit(&[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Usage: dialectkit"), "{}", stderr(&output));
}

#[test]
fn unknown_dialect_is_a_usage_error() {
    let output = run_dialectkit(&[
        "diff", "--dialect", "sqlite", "--table", "t", "--desired", "d.yml",
    ]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("sqlite"));
}

#[cfg(feature = "oracle")]
#[test]
fn oracle_diff_prints_the_rendered_plan() {
    let dir = tempdir().unwrap_or_else(|error| panic!("failed to create tempdir: {error}"));
    let current = write(
        &dir,
        "current.yml",
        "ID: NUMBER(10)\nNAME: VARCHAR2(50)\nFAX: VARCHAR2(20)\n",
    );
    let desired = write(
        &dir,
        "desired.yml",
        "ID: NUMBER(10, 0)\nNAME: VARCHAR2(100)\nEMAIL: { type: VARCHAR2(320), nullable: false }\n",
    );

    let output = run_dialectkit(&[
        "diff",
        "--dialect",
        "oracle",
        "--table",
        "HR.EMPLOYEES",
        "--current",
        current.as_str(),
        "--desired",
        desired.as_str(),
    ]);

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        concat!(
            r#"ALTER TABLE "HR"."EMPLOYEES" DROP COLUMN "FAX";"#,
            "\n",
            r#"ALTER TABLE "HR"."EMPLOYEES" MODIFY ("NAME" VARCHAR2(100));"#,
            "\n",
            r#"ALTER TABLE "HR"."EMPLOYEES" ADD ("EMAIL" VARCHAR2(320) NOT NULL);"#,
            "\n",
        )
    );
}

#[cfg(feature = "oracle")]
#[test]
fn overrides_can_disable_drops() {
    let dir = tempdir().unwrap_or_else(|error| panic!("failed to create tempdir: {error}"));
    let current = write(&dir, "current.yml", "ID: NUMBER\nFAX: VARCHAR2(20)\n");
    let desired = write(&dir, "desired.yml", "ID: number\n");
    let overrides = write(&dir, "overrides.yml", "diff:\n  enable_drop: false\n");

    let output = run_dialectkit(&[
        "diff",
        "--dialect",
        "oracle",
        "--table",
        "T",
        "--current",
        current.as_str(),
        "--desired",
        desired.as_str(),
        "--overrides",
        overrides.as_str(),
    ]);

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output), "-- no changes --\n");
}

#[cfg(feature = "mssql")]
#[test]
fn mssql_diff_separates_batches_with_go() {
    let dir = tempdir().unwrap_or_else(|error| panic!("failed to create tempdir: {error}"));
    let desired = write(&dir, "desired.yml", "id: INT\nnote: NVARCHAR(MAX)\n");

    let output = run_dialectkit(&[
        "diff",
        "--dialect",
        "mssql",
        "--table",
        "dbo.notes",
        "--desired",
        desired.as_str(),
    ]);

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "ALTER TABLE [dbo].[notes] ADD [id] INT;\nGO\nALTER TABLE [dbo].[notes] ADD [note] NVARCHAR(MAX);\nGO\n"
    );
}

#[cfg(feature = "oracle")]
#[test]
fn invalid_table_name_is_a_schema_error() {
    let dir = tempdir().unwrap_or_else(|error| panic!("failed to create tempdir: {error}"));
    let desired = write(&dir, "desired.yml", "ID: NUMBER\n");

    let output = run_dialectkit(&[
        "diff", "--dialect", "oracle", "--table", "a.b.c", "--desired", desired.as_str(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("[schema]"), "{stderr}");
    assert!(stderr.contains("while running `diff`"), "{stderr}");
    assert!(stderr.contains("invalid table name `a.b.c`"), "{stderr}");
}

#[test]
fn unreadable_and_malformed_documents_are_reported() {
    let dir = tempdir().unwrap_or_else(|error| panic!("failed to create tempdir: {error}"));
    let missing = dir.path().join("missing.yml");
    let missing = missing.to_string_lossy().into_owned();

    let output = run_dialectkit(&[
        "diff", "--dialect", "oracle", "--table", "T", "--desired", missing.as_str(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("[io]"), "{}", stderr(&output));

    let overrides = write(&dir, "overrides.yml", "pool:\n  min_size: 1\n");
    let desired = write(&dir, "desired.yml", "ID: NUMBER\n");
    let output = run_dialectkit(&[
        "diff",
        "--dialect",
        "oracle",
        "--table",
        "T",
        "--desired",
        desired.as_str(),
        "--overrides",
        overrides.as_str(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("[configuration]"), "{stderr}");
    assert!(stderr.contains("min_size"), "{stderr}");
}

#[test]
fn oracle_has_no_live_commands() {
    let dir = tempdir().unwrap_or_else(|error| panic!("failed to create tempdir: {error}"));
    let connection = write(&dir, "connection.yml", "database: ORCL\nuser: scott\n");

    let output = run_dialectkit(&["ping", "--dialect", "oracle", "--connection", connection.as_str()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("[unsupported]"), "{}", stderr(&output));
}

#[cfg(feature = "mssql")]
#[test]
fn unreachable_mssql_server_is_a_connectivity_error() {
    let dir = tempdir().unwrap_or_else(|error| panic!("failed to create tempdir: {error}"));
    let connection = write(
        &dir,
        "connection.yml",
        "host: 127.0.0.1\nport: 1\nuser: sa\npassword: secret\ndatabase: sales\n",
    );

    let output = run_dialectkit(&["ping", "--dialect", "mssql", "--connection", connection.as_str()]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("[connectivity]"), "{stderr}");
    assert!(stderr.contains("while running `ping`"), "{stderr}");
}

#[cfg(feature = "mssql")]
#[test]
fn apply_requires_a_connection_document() {
    let dir = tempdir().unwrap_or_else(|error| panic!("failed to create tempdir: {error}"));
    let desired = write(&dir, "desired.yml", "id: INT\n");
    let connection = dir.path().join("absent.yml");
    assert!(!connection.exists());
    let connection = connection.to_string_lossy().into_owned();

    let output = run_dialectkit(&[
        "apply",
        "--dialect",
        "mssql",
        "--table",
        "dbo.t",
        "--desired",
        desired.as_str(),
        "--connection",
        connection.as_str(),
        "--dry-run",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("[io]"), "{}", stderr(&output));
}
