use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{ConfigurationError, DiffConfig, FeatureOverrides, PoolConfig, TypeTableConfig};

const OVERRIDES_DOCUMENT: &str = "dialect overrides";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
    pub socket: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl ConnectionConfig {
    #[must_use]
    pub fn extra_value(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

/// Serializable subset of [`DiffConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffSettings {
    pub enable_drop: bool,
    pub compare_nullability: bool,
}

impl Default for DiffSettings {
    fn default() -> Self {
        let config = DiffConfig::default();
        Self {
            enable_drop: config.enable_drop,
            compare_nullability: config.compare_nullability,
        }
    }
}

impl From<DiffSettings> for DiffConfig {
    fn from(settings: DiffSettings) -> Self {
        Self::new(settings.enable_drop, settings.compare_nullability)
    }
}

/// Deployment-level adjustments layered over a dialect's built-in profile.
///
/// ```yaml
/// types:
///   maxima:
///     VARCHAR2: 4000
/// features:
///   supports_replace_table: false
/// max_identifier_length: 30
/// pool:
///   max_size: 8
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DialectOverrides {
    pub types: TypeTableConfig,
    pub features: FeatureOverrides,
    pub max_identifier_length: Option<usize>,
    pub pool: PoolConfig,
    pub diff: DiffSettings,
}

impl DialectOverrides {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigurationError> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(source).map_err(|error| ConfigurationError::InvalidDocument {
            document: OVERRIDES_DOCUMENT.to_string(),
            message: error.to_string(),
        })
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigurationError> {
        let source =
            std::fs::read_to_string(path).map_err(|error| ConfigurationError::InvalidDocument {
                document: format!("{OVERRIDES_DOCUMENT} `{}`", path.display()),
                message: error.to_string(),
            })?;
        Self::from_yaml_str(&source)
    }
}
