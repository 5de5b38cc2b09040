use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{ColumnType, SchemaError};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }
}

impl FromStr for TableName {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SchemaError::InvalidTableName {
            text: s.to_string(),
        };
        let mut parts = s.trim().split('.').map(str::trim);
        let first = parts.next().filter(|part| !part.is_empty()).ok_or_else(invalid)?;
        match (parts.next(), parts.next()) {
            (None, _) => Ok(Self::new(first)),
            (Some(name), None) if !name.is_empty() => Ok(Self::qualified(first, name)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: ColumnType,
    pub nullable: bool,
    pub ordinal: usize,
}

impl ColumnSpec {
    /// Nullable column; the ordinal is assigned when it joins a [`Schema`].
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            ordinal: 0,
        }
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Ordered column-name -> column mapping. Order matters for rendering only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(
    try_from = "IndexMap<String, ColumnDecl>",
    into = "IndexMap<String, ColumnDecl>"
)]
pub struct Schema {
    columns: IndexMap<String, ColumnSpec>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(
        columns: impl IntoIterator<Item = ColumnSpec>,
    ) -> Result<Self, SchemaError> {
        let mut schema = Self::new();
        for column in columns {
            schema.push(column)?;
        }
        Ok(schema)
    }

    /// Builds a schema of nullable columns from `(name, type text)` pairs.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, SchemaError> {
        let mut schema = Self::new();
        for (name, type_text) in pairs {
            schema.push(ColumnSpec::new(name, type_text.parse()?))?;
        }
        Ok(schema)
    }

    pub fn push(&mut self, mut column: ColumnSpec) -> Result<(), SchemaError> {
        if self.columns.contains_key(&column.name) {
            return Err(SchemaError::DuplicateColumn { name: column.name });
        }
        column.ordinal = self.columns.len();
        self.columns.insert(column.name.clone(), column);
        Ok(())
    }

    /// Removes `name`, keeping the order of the remaining columns.
    pub fn remove(&mut self, name: &str) -> Option<ColumnSpec> {
        let removed = self.columns.shift_remove(name)?;
        for (ordinal, column) in self.columns.values_mut().enumerate() {
            column.ordinal = ordinal;
        }
        Some(removed)
    }

    /// Swaps the declaration of an existing column in place; returns `false`
    /// when no column of that name exists.
    pub fn replace(&mut self, mut column: ColumnSpec) -> bool {
        let Some(existing) = self.columns.get_mut(&column.name) else {
            return false;
        };
        column.ordinal = existing.ordinal;
        *existing = column;
        true
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn columns(&self) -> impl ExactSizeIterator<Item = &ColumnSpec> {
        self.columns.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns.len() == other.columns.len()
            && self.columns.values().all(|column| {
                other.columns.get(&column.name).is_some_and(|candidate| {
                    candidate.data_type == column.data_type && candidate.nullable == column.nullable
                })
            })
    }
}

impl Eq for Schema {}

/// Column declaration as written in schema documents: either a bare type or
/// a type with nullability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnDecl {
    Type(ColumnType),
    Detailed {
        #[serde(rename = "type")]
        data_type: ColumnType,
        #[serde(default = "nullable_by_default")]
        nullable: bool,
    },
}

const fn nullable_by_default() -> bool {
    true
}

impl TryFrom<IndexMap<String, ColumnDecl>> for Schema {
    type Error = SchemaError;

    fn try_from(value: IndexMap<String, ColumnDecl>) -> Result<Self, Self::Error> {
        let mut schema = Self::new();
        for (name, decl) in value {
            let column = match decl {
                ColumnDecl::Type(data_type) => ColumnSpec::new(name, data_type),
                ColumnDecl::Detailed {
                    data_type,
                    nullable,
                } => ColumnSpec {
                    nullable,
                    ..ColumnSpec::new(name, data_type)
                },
            };
            schema.push(column)?;
        }
        Ok(schema)
    }
}

impl From<Schema> for IndexMap<String, ColumnDecl> {
    fn from(value: Schema) -> Self {
        value
            .columns
            .into_iter()
            .map(|(name, column)| {
                let decl = if column.nullable {
                    ColumnDecl::Type(column.data_type)
                } else {
                    ColumnDecl::Detailed {
                        data_type: column.data_type,
                        nullable: false,
                    }
                };
                (name, decl)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnSpec, Schema, TableName};
    use crate::{ColumnType, SchemaError};

    #[test]
    fn push_assigns_ordinals_and_rejects_duplicates() {
        let mut schema = Schema::new();
        schema
            .push(ColumnSpec::new("ID", ColumnType::new("NUMBER")))
            .expect("first");
        schema
            .push(ColumnSpec::new("NAME", ColumnType::new("VARCHAR2")))
            .expect("second");

        let ordinals = schema.columns().map(|column| column.ordinal).collect::<Vec<_>>();
        assert_eq!(ordinals, vec![0, 1]);

        let error = schema
            .push(ColumnSpec::new("ID", ColumnType::new("DATE")))
            .expect_err("duplicate");
        assert_eq!(
            error,
            SchemaError::DuplicateColumn {
                name: "ID".to_string()
            }
        );
    }

    #[test]
    fn equality_ignores_column_order() {
        let left = Schema::from_pairs([("A", "NUMBER"), ("B", "DATE")]).expect("left");
        let right = Schema::from_pairs([("B", "DATE"), ("A", "NUMBER")]).expect("right");
        assert_eq!(left, right);

        let different = Schema::from_pairs([("A", "NUMBER"), ("B", "CLOB")]).expect("different");
        assert_ne!(left, different);
    }

    #[test]
    fn table_names_parse_with_optional_schema() {
        assert_eq!(
            "hr.employees".parse::<TableName>().expect("qualified"),
            TableName::qualified("hr", "employees")
        );
        assert_eq!(
            "employees".parse::<TableName>().expect("bare"),
            TableName::new("employees")
        );
        assert!("a.b.c".parse::<TableName>().is_err());
        assert!(".b".parse::<TableName>().is_err());
    }
}
