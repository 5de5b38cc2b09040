use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSupport {
    Unsupported,
    SingleCatalogOnly,
    RequiresSetCatalog,
    FullSupport,
}

impl CatalogSupport {
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentCreationTable {
    Unsupported,
    InSchemaDef,
    CommentCommandOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentCreationView {
    Unsupported,
    InSchemaDef,
    CommentCommandOnly,
}

impl CommentCreationTable {
    #[must_use]
    pub const fn supports_comment_command(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl CommentCreationView {
    #[must_use]
    pub const fn supports_comment_command(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// Dialect-wide switches read by callers before attempting an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureFlags {
    pub supports_tuple_in: bool,
    pub supports_materialized_views: bool,
    pub supports_replace_table: bool,
    pub catalog_support: CatalogSupport,
    pub comment_on_table: CommentCreationTable,
    pub comment_on_view: CommentCreationView,
}

/// Partial flag set layered over a dialect's built-in flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureOverrides {
    pub supports_tuple_in: Option<bool>,
    pub supports_materialized_views: Option<bool>,
    pub supports_replace_table: Option<bool>,
    pub catalog_support: Option<CatalogSupport>,
    pub comment_on_table: Option<CommentCreationTable>,
    pub comment_on_view: Option<CommentCreationView>,
}

impl FeatureFlags {
    #[must_use]
    pub fn with_overrides(self, overrides: &FeatureOverrides) -> Self {
        Self {
            supports_tuple_in: overrides.supports_tuple_in.unwrap_or(self.supports_tuple_in),
            supports_materialized_views: overrides
                .supports_materialized_views
                .unwrap_or(self.supports_materialized_views),
            supports_replace_table: overrides
                .supports_replace_table
                .unwrap_or(self.supports_replace_table),
            catalog_support: overrides.catalog_support.unwrap_or(self.catalog_support),
            comment_on_table: overrides.comment_on_table.unwrap_or(self.comment_on_table),
            comment_on_view: overrides.comment_on_view.unwrap_or(self.comment_on_view),
        }
    }
}
