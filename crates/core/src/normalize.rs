use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ColumnType, ConfigurationError, TypeName, TypeParam};

/// A type parameter after dialect defaults and ceilings have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalizedParam {
    Value(u64),
    /// At or beyond the dialect ceiling; equal to every other maxed value.
    Maxed,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedType {
    pub name: TypeName,
    pub params: Vec<NormalizedParam>,
}

/// Per-dialect parameter defaults and ceilings, keyed by exact type name.
///
/// The defaults list of a type is positional: alternative `i` holds the
/// parameters assumed when `i` leading parameters were declared, so its arity
/// is always `arity(alternative 0) - i`. Alternative 0 is the full default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeNormalization {
    defaults: BTreeMap<TypeName, Vec<Vec<u64>>>,
    maxima: BTreeMap<TypeName, u64>,
}

#[derive(Debug, Clone, Default)]
pub struct TypeNormalizationBuilder {
    defaults: BTreeMap<TypeName, Vec<Vec<u64>>>,
    maxima: BTreeMap<TypeName, u64>,
}

/// Serializable form of a normalization table, as found in dialect override
/// documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeTableConfig {
    pub defaults: BTreeMap<String, Vec<Vec<u64>>>,
    pub maxima: BTreeMap<String, u64>,
}

impl TypeNormalization {
    #[must_use]
    pub fn builder() -> TypeNormalizationBuilder {
        TypeNormalizationBuilder::default()
    }

    pub fn from_config(config: &TypeTableConfig) -> Result<Self, ConfigurationError> {
        let mut builder = Self::builder();
        for (type_name, alternatives) in &config.defaults {
            builder = builder.defaults(type_name.as_str(), alternatives.clone());
        }
        for (type_name, max) in &config.maxima {
            builder = builder.max(type_name.as_str(), *max);
        }
        builder.build()
    }

    /// Layers `config` over this table; entries present in `config` replace
    /// the existing entry of the same type name.
    pub fn merged_with(&self, config: &TypeTableConfig) -> Result<Self, ConfigurationError> {
        let mut builder = TypeNormalizationBuilder {
            defaults: self.defaults.clone(),
            maxima: self.maxima.clone(),
        };
        for (type_name, alternatives) in &config.defaults {
            builder = builder.defaults(type_name.as_str(), alternatives.clone());
        }
        for (type_name, max) in &config.maxima {
            builder = builder.max(type_name.as_str(), *max);
        }
        builder.build()
    }

    #[must_use]
    pub fn defaults_for(&self, type_name: &TypeName) -> Option<&[Vec<u64>]> {
        self.defaults.get(type_name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn max_for(&self, type_name: &TypeName) -> Option<u64> {
        self.maxima.get(type_name).copied()
    }

    #[must_use]
    pub fn normalize(&self, column_type: &ColumnType) -> NormalizedType {
        let declared = column_type.declared_params();
        let mut params = declared
            .iter()
            .map(|param| self.clamp(&column_type.name, *param))
            .collect::<Vec<_>>();

        if let Some(completion) = self
            .defaults_for(&column_type.name)
            .and_then(|alternatives| alternatives.get(declared.len()))
        {
            params.extend(
                completion
                    .iter()
                    .map(|value| self.clamp(&column_type.name, TypeParam::Value(*value))),
            );
        }

        NormalizedType {
            name: column_type.name.clone(),
            params,
        }
    }

    /// True when `column_type`'s declared parameters spell out one of the
    /// default alternatives of its type, tried in priority order.
    #[must_use]
    pub fn matches_default_alternative(&self, column_type: &ColumnType) -> bool {
        let Some(alternatives) = self.defaults_for(&column_type.name) else {
            return false;
        };
        let declared = column_type
            .declared_params()
            .iter()
            .map(|param| self.clamp(&column_type.name, *param))
            .collect::<Vec<_>>();

        alternatives.iter().any(|alternative| {
            alternative.len() == declared.len()
                && alternative
                    .iter()
                    .zip(&declared)
                    .all(|(value, declared)| {
                        self.clamp(&column_type.name, TypeParam::Value(*value)) == *declared
                    })
        })
    }

    fn clamp(&self, type_name: &TypeName, param: TypeParam) -> NormalizedParam {
        match (param, self.max_for(type_name)) {
            (TypeParam::Max, _) => NormalizedParam::Maxed,
            (TypeParam::Value(value), Some(max)) if value >= max => NormalizedParam::Maxed,
            (TypeParam::Value(value), _) => NormalizedParam::Value(value),
        }
    }
}

impl TypeNormalizationBuilder {
    #[must_use]
    pub fn defaults(
        mut self,
        type_name: impl Into<TypeName>,
        alternatives: impl IntoIterator<Item = Vec<u64>>,
    ) -> Self {
        self.defaults
            .insert(type_name.into(), alternatives.into_iter().collect());
        self
    }

    #[must_use]
    pub fn max(mut self, type_name: impl Into<TypeName>, max: u64) -> Self {
        self.maxima.insert(type_name.into(), max);
        self
    }

    pub fn build(self) -> Result<TypeNormalization, ConfigurationError> {
        for (type_name, alternatives) in &self.defaults {
            validate_alternatives(type_name, alternatives)?;
        }
        for (type_name, max) in &self.maxima {
            if *max == 0 {
                return Err(ConfigurationError::ZeroMaximum {
                    type_name: type_name.to_string(),
                });
            }
        }

        Ok(TypeNormalization {
            defaults: self.defaults,
            maxima: self.maxima,
        })
    }
}

fn validate_alternatives(
    type_name: &TypeName,
    alternatives: &[Vec<u64>],
) -> Result<(), ConfigurationError> {
    let full_arity = alternatives.first().map_or(0, Vec::len);
    if full_arity == 0 {
        return Err(ConfigurationError::EmptyDefaults {
            type_name: type_name.to_string(),
        });
    }

    for (index, alternative) in alternatives.iter().enumerate() {
        let expected = full_arity.saturating_sub(index);
        if expected == 0 || alternative.len() != expected {
            return Err(ConfigurationError::InconsistentDefaultArity {
                type_name: type_name.to_string(),
                index,
                expected,
                found: alternative.len(),
            });
        }
    }

    Ok(())
}
