use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::SchemaError;

/// Canonical base type name within one dialect: upper case, single spaces.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeName(String);

impl TypeName {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let canonical = raw
            .as_ref()
            .split_whitespace()
            .map(str::to_ascii_uppercase)
            .collect::<Vec<_>>()
            .join(" ");
        Self(canonical)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TypeName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<TypeName> for String {
    fn from(value: TypeName) -> Self {
        value.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeParam {
    Value(u64),
    /// `MAX`, or Oracle's `*` precision.
    Max,
}

impl fmt::Display for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Max => f.write_str("MAX"),
        }
    }
}

/// A column type as declared, before any dialect normalization.
///
/// `params` is `None` when the declaration carries no parameter list at all,
/// which is distinct from any explicit list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnType {
    pub name: TypeName,
    pub params: Option<Vec<TypeParam>>,
}

impl ColumnType {
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            params: None,
        }
    }

    pub fn with_params(name: impl Into<TypeName>, params: &[u64]) -> Self {
        Self {
            name: name.into(),
            params: Some(params.iter().copied().map(TypeParam::Value).collect()),
        }
    }

    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        parse_column_type(text)
    }

    #[must_use]
    pub fn declared_params(&self) -> &[TypeParam] {
        self.params.as_deref().unwrap_or_default()
    }
}

impl FromStr for ColumnType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_column_type(s)
    }
}

impl TryFrom<String> for ColumnType {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_column_type(&value)
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(params) = &self.params else {
            return f.write_str(self.name.as_str());
        };

        let rendered = params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        // `TIMESTAMP WITH TIME ZONE` carries its parameters after the first word.
        match self.name.as_str().split_once(' ') {
            Some((head, tail)) if is_suffixed_type(head) => {
                write!(f, "{head}({rendered}) {tail}")
            }
            _ => write!(f, "{}({rendered})", self.name),
        }
    }
}

fn is_suffixed_type(head: &str) -> bool {
    matches!(head, "TIMESTAMP" | "INTERVAL")
}

fn parse_column_type(text: &str) -> Result<ColumnType, SchemaError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid_type(text, "type name is empty"));
    }

    let Some(open) = trimmed.find('(') else {
        return Ok(ColumnType::new(trimmed));
    };

    let close = trimmed
        .rfind(')')
        .filter(|close| *close > open)
        .ok_or_else(|| invalid_type(text, "unbalanced parameter list"))?;

    let head = trimmed[..open].trim();
    let inner = &trimmed[open + 1..close];
    let tail = trimmed[close + 1..].trim();

    if head.is_empty() {
        return Err(invalid_type(text, "type name is empty"));
    }
    if inner.contains('(') || inner.contains(')') {
        return Err(invalid_type(text, "nested parameter lists are not supported"));
    }

    let params = inner
        .split(',')
        .map(|raw| parse_param(text, raw))
        .collect::<Result<Vec<_>, _>>()?;

    let name = if tail.is_empty() {
        TypeName::new(head)
    } else {
        TypeName::new(format!("{head} {tail}"))
    };

    Ok(ColumnType {
        name,
        params: Some(params),
    })
}

fn parse_param(text: &str, raw: &str) -> Result<TypeParam, SchemaError> {
    let raw = raw.trim();
    // Oracle length semantics (`VARCHAR2(100 CHAR)`) do not change the value.
    let raw = raw
        .strip_suffix(" CHAR")
        .or_else(|| raw.strip_suffix(" BYTE"))
        .map_or(raw, str::trim_end);

    if raw == "*" || raw.eq_ignore_ascii_case("max") {
        return Ok(TypeParam::Max);
    }

    raw.parse::<u64>()
        .map(TypeParam::Value)
        .map_err(|_| invalid_type(text, format!("parameter `{raw}` is not a non-negative integer")))
}

fn invalid_type(text: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::InvalidType {
        text: text.to_string(),
        reason: reason.into(),
    }
}
