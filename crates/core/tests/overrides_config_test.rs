use std::path::Path;

use dialectkit_core::{
    CatalogSupport, ColumnType, CommentCreationTable, ConfigurationError, DialectOverrides,
    DialectProfile, PoolConfig, SchemaDiffer,
};

#[path = "support/fake_dialect.rs"]
mod fake_dialect;

use fake_dialect::{FEATURES, types};

#[test]
fn empty_document_means_no_overrides() {
    assert_eq!(
        DialectOverrides::from_yaml_str("  \n").expect("empty document"),
        DialectOverrides::default()
    );
    assert_eq!(DialectOverrides::default().pool, PoolConfig::with_max_size(4));
    assert_eq!(DialectOverrides::default().pool.checkout_timeout_secs, 30);
    assert!(DialectOverrides::default().diff.enable_drop);
}

#[test]
fn full_document_is_read() {
    let overrides = DialectOverrides::from_yaml_str(
        r"
types:
  defaults:
    DECIMAL: [[38, 0], [0]]
  maxima:
    VARCHAR: 8000
features:
  catalog_support: single_catalog_only
  comment_on_table: comment_command_only
max_identifier_length: 30
pool:
  max_size: 8
  checkout_timeout_secs: 5
diff:
  enable_drop: false
  compare_nullability: true
",
    )
    .expect("valid overrides");

    assert_eq!(overrides.types.maxima.get("VARCHAR"), Some(&8000));
    assert_eq!(
        overrides.features.catalog_support,
        Some(CatalogSupport::SingleCatalogOnly)
    );
    assert_eq!(overrides.max_identifier_length, Some(30));
    assert_eq!(overrides.pool.max_size, 8);
    assert_eq!(overrides.pool.checkout_timeout_secs, 5);
    assert!(!overrides.diff.enable_drop);
    assert!(overrides.diff.compare_nullability);
}

#[test]
fn unknown_fields_are_rejected() {
    let error = DialectOverrides::from_yaml_str("pool:\n  min_size: 1\n").expect_err("unknown");
    assert!(matches!(
        error,
        ConfigurationError::InvalidDocument { ref document, .. } if document == "dialect overrides"
    ));
    assert!(error.to_string().contains("min_size"), "{error}");
}

#[test]
fn missing_file_names_the_path() {
    let error = DialectOverrides::from_yaml_file(Path::new("/nonexistent/overrides.yml"))
        .expect_err("missing file");
    assert!(error.to_string().contains("/nonexistent/overrides.yml"), "{error}");
}

#[test]
fn profile_overrides_replace_only_named_entries() {
    let overrides = DialectOverrides::from_yaml_str(
        "types:\n  maxima:\n    varchar: 255\nfeatures:\n  comment_on_table: comment_command_only\n",
    )
    .expect("valid overrides");

    let profile = DialectProfile::new("fake", types(), FEATURES)
        .with_overrides(&overrides)
        .expect("overrides apply");
    assert_eq!(profile.types.max_for(&"VARCHAR".into()), Some(255));
    assert!(profile.types.defaults_for(&"DECIMAL".into()).is_some());
    assert_eq!(
        profile.features.comment_on_table,
        CommentCreationTable::CommentCommandOnly
    );
    assert_eq!(profile.features.catalog_support, FEATURES.catalog_support);

    let differ = SchemaDiffer::new(profile.types);
    let parse = |text: &str| text.parse::<ColumnType>().expect("type");
    assert!(differ.types_equivalent(&parse("VARCHAR(255)"), &parse("VARCHAR(1000)")));
}

#[test]
fn invalid_type_overrides_fail_profile_construction() {
    let overrides =
        DialectOverrides::from_yaml_str("types:\n  defaults:\n    DECIMAL: [[18, 0], [0, 0]]\n")
            .expect("document parses");

    let error = DialectProfile::new("fake", types(), FEATURES)
        .with_overrides(&overrides)
        .expect_err("arity mismatch");
    assert_eq!(
        error,
        ConfigurationError::InconsistentDefaultArity {
            type_name: "DECIMAL".to_string(),
            index: 1,
            expected: 1,
            found: 2,
        }
    );
}
