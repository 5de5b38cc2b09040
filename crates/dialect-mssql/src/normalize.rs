use dialectkit_core::{ConfigurationError, TypeNormalization};

const EXACT_NUMERIC_TYPES: &[&str] = &["DECIMAL", "NUMERIC"];
const SINGLE_LENGTH_TYPES: &[&str] = &["CHAR", "VARCHAR", "NCHAR", "NVARCHAR", "BINARY", "VARBINARY"];
const FRACTIONAL_SECOND_TYPES: &[&str] = &["DATETIME2", "TIME", "DATETIMEOFFSET"];

/// One above the largest declarable length. `VARCHAR(8000)` is an ordinary
/// length; anything beyond it can only mean `MAX`.
const MAXIMA: &[(&str, u64)] = &[("VARCHAR", 8_001), ("VARBINARY", 8_001), ("NVARCHAR", 4_001)];

pub(crate) fn type_normalization() -> Result<TypeNormalization, ConfigurationError> {
    let mut builder = TypeNormalization::builder();
    for type_name in EXACT_NUMERIC_TYPES {
        builder = builder.defaults(*type_name, [vec![18, 0], vec![0]]);
    }
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
