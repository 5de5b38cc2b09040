use dialectkit_core::{ConfigurationError, TypeNormalization};

const SINGLE_LENGTH_TYPES: &[&str] = &["BLOB", "CLOB", "CHAR", "VARCHAR2", "NCHAR", "NVARCHAR2"];
const FRACTIONAL_SECOND_TYPES: &[&str] = &["TIMESTAMP", "DATE", "INTERVAL"];

/// Largest declarable parameter per type; anything at or beyond is maxed.
pub(crate) const MAXIMA: &[(&str, u64)] = &[
    ("BLOB", 2_147_483_647),
    ("VARCHAR2", 32_767),
    ("NVARCHAR2", 2_147_483_647),
];

pub(crate) fn type_normalization() -> Result<TypeNormalization, ConfigurationError> {
    let mut builder = TypeNormalization::builder().defaults("NUMBER", [vec![40, 40], vec![0]]);
    for type_name in SINGLE_LENGTH_TYPES {
        builder = builder.defaults(*type_name, [vec![1]]);
    }
    for type_name in FRACTIONAL_SECOND_TYPES {
        builder = builder.defaults(*type_name, [vec![7]]);
    }
    for (type_name, max) in MAXIMA {
        builder = builder.max(*type_name, *max);
    }
    builder.build()
}

pub(crate) fn max_for(type_name: &str) -> Option<u64> {
    MAXIMA
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, max)| *max)
}
