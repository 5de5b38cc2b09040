use dialectkit_core::{
    ColumnSpec, ColumnType, CommentTarget, Dialect, Error, GenerateError, HashTruncate, IndexDef,
    MergeOverwrite, OverwriteScope, Passthrough, Query, RenderContext, Statement, TableName,
};
use dialectkit_dialect_oracle::OracleDialect;

fn render(statement: &Statement) -> String {
    OracleDialect
        .render(statement, &RenderContext::new(true, &Passthrough))
        .expect("statement renders")
}

fn render_unquoted(statement: &Statement) -> String {
    OracleDialect
        .render(statement, &RenderContext::new(false, &Passthrough))
        .expect("statement renders")
}

fn employees() -> TableName {
    TableName::qualified("HR", "EMPLOYEES")
}

fn column(name: &str, type_text: &str) -> ColumnSpec {
    ColumnSpec::new(name, type_text.parse::<ColumnType>().expect("valid type"))
}

#[test]
fn renders_column_alterations_with_oracle_syntax() {
    assert_eq!(
        render(&Statement::AddColumn {
            table: employees(),
            column: column("EMAIL", "VARCHAR2(320)").not_null(),
        }),
        r#"ALTER TABLE "HR"."EMPLOYEES" ADD ("EMAIL" VARCHAR2(320) NOT NULL)"#
    );
    assert_eq!(
        render(&Statement::DropColumn {
            table: employees(),
            column: "FAX".to_string(),
        }),
        r#"ALTER TABLE "HR"."EMPLOYEES" DROP COLUMN "FAX""#
    );
    assert_eq!(
        render(&Statement::AlterColumnType {
            table: employees(),
            column: column("SALARY", "NUMBER(12,2)"),
        }),
        r#"ALTER TABLE "HR"."EMPLOYEES" MODIFY ("SALARY" NUMBER(12, 2))"#
    );
    assert_eq!(
        render(&Statement::AlterColumnNullability {
            table: employees(),
            column: column("SALARY", "NUMBER(12,2)").not_null(),
        }),
        r#"ALTER TABLE "HR"."EMPLOYEES" MODIFY ("SALARY" NOT NULL)"#
    );
}

#[test]
fn rename_uses_rename_to_with_an_unqualified_target() {
    let statement = Statement::RenameTable {
        from: TableName::qualified("hr", "staff_old"),
        to: TableName::qualified("hr", "staff"),
    };

    assert_eq!(
        render_unquoted(&statement),
        "ALTER TABLE hr.staff_old RENAME TO staff"
    );
    assert_eq!(
        render(&statement),
        r#"ALTER TABLE "hr"."staff_old" RENAME TO "staff""#
    );
}

#[test]
fn max_parameters_render_as_the_type_ceiling_or_star() {
    assert_eq!(
        render(&Statement::CreateTable {
            table: TableName::new("T"),
            columns: vec![column("NOTE", "VARCHAR2(MAX)"), column("N", "NUMBER(*, 0)")],
        }),
        r#"CREATE TABLE "T" ("NOTE" VARCHAR2(32767), "N" NUMBER(*, 0))"#
    );
}

#[test]
fn timestamp_parameters_stay_before_the_zone_suffix() {
    assert_eq!(
        render(&Statement::AddColumn {
            table: TableName::new("EVENTS"),
            column: column("AT", "TIMESTAMP(3) WITH TIME ZONE"),
        }),
        r#"ALTER TABLE "EVENTS" ADD ("AT" TIMESTAMP(3) WITH TIME ZONE)"#
    );
}

#[test]
fn drop_if_exists_swallows_only_the_missing_object_error() {
    let sql = render(&Statement::DropTable {
        table: TableName::new("SCRATCH"),
        if_exists: true,
    });
    assert_eq!(
        sql,
        r#"BEGIN EXECUTE IMMEDIATE 'DROP TABLE "SCRATCH"'; EXCEPTION WHEN OTHERS THEN IF SQLCODE != -942 THEN RAISE; END IF; END;"#
    );

    let sql = render(&Statement::DropView {
        view: TableName::new("MV_SALES"),
        materialized: true,
        if_exists: true,
    });
    assert!(sql.contains("'DROP MATERIALIZED VIEW \"MV_SALES\"'"), "{sql}");
    assert!(sql.contains("SQLCODE != -12003"), "{sql}");
}

#[test]
fn views_indexes_and_comments() {
    assert_eq!(
        render(&Statement::CreateView {
            view: TableName::new("ACTIVE"),
            query: Query::new("SELECT * FROM EMPLOYEES WHERE ACTIVE = 1"),
            materialized: false,
            replace: true,
        }),
        r#"CREATE OR REPLACE VIEW "ACTIVE" AS SELECT * FROM EMPLOYEES WHERE ACTIVE = 1"#
    );
    assert_eq!(
        render(&Statement::CreateView {
            view: TableName::new("MV_SALES"),
            query: Query::new("SELECT 1 FROM DUAL"),
            materialized: true,
            replace: false,
        }),
        r#"CREATE MATERIALIZED VIEW "MV_SALES" AS SELECT 1 FROM DUAL"#
    );
    assert_eq!(
        render(&Statement::CreateIndex(IndexDef {
            name: "EMP_EMAIL_UX".to_string(),
            table: employees(),
            columns: vec!["EMAIL".to_string()],
            unique: true,
        })),
        r#"CREATE UNIQUE INDEX "HR"."EMP_EMAIL_UX" ON "HR"."EMPLOYEES" ("EMAIL")"#
    );
    assert_eq!(
        render(&Statement::Comment {
            target: CommentTarget::View,
            object: TableName::new("ACTIVE"),
            comment: "it's current".to_string(),
        }),
        r#"COMMENT ON TABLE "ACTIVE" IS 'it''s current'"#
    );
}

#[test]
fn delete_insert_overwrite_statements() {
    assert_eq!(
        render(&Statement::Delete {
            table: employees(),
            scope: OverwriteScope::Where(Query::new("DEPT = 10")),
        }),
        r#"DELETE FROM "HR"."EMPLOYEES" WHERE DEPT = 10"#
    );
    assert_eq!(
        render(&Statement::InsertSelect {
            table: employees(),
            columns: vec!["ID".to_string(), "DEPT".to_string()],
            source: Query::new("SELECT ID, DEPT FROM STAGING"),
        }),
        r#"INSERT INTO "HR"."EMPLOYEES" ("ID", "DEPT") SELECT ID, DEPT FROM STAGING"#
    );
}

#[test]
fn constructs_oracle_cannot_express_fail_to_render() {
    let merge = Statement::Merge(MergeOverwrite {
        target: employees(),
        source: Query::new("SELECT * FROM STAGING"),
        columns: vec!["ID".to_string()],
        scope: OverwriteScope::AllRows,
    });
    let replace = Statement::CreateTableAs {
        table: employees(),
        query: Query::new("SELECT * FROM STAGING"),
        replace: true,
    };

    for statement in [merge, replace] {
        let error = OracleDialect
            .render(&statement, &RenderContext::new(true, &Passthrough))
            .expect_err("must not render");
        assert!(
            matches!(
                &error,
                Error::Generate(GenerateError::UnsupportedStatement { dialect, .. }) if dialect == "oracle"
            ),
            "unexpected error: {error}"
        );
    }
}

#[test]
fn long_identifiers_are_shortened_before_quoting() {
    let workaround = HashTruncate::new(30).expect("valid limit");
    let sql = OracleDialect
        .render(
            &Statement::DropColumn {
                table: TableName::new("T"),
                column: "A_VERY_LONG_COLUMN_NAME_THAT_EXCEEDS_THE_LIMIT".to_string(),
            },
            &RenderContext::new(true, &workaround),
        )
        .expect("statement renders");

    let quoted = sql
        .strip_prefix(r#"ALTER TABLE "T" DROP COLUMN ""#)
        .and_then(|rest| rest.strip_suffix('"'))
        .expect("column is quoted");
    assert_eq!(quoted.len(), 30);
    assert!(quoted.starts_with("A_VERY_LONG_COLUMN_NA_"), "{quoted}");
}
