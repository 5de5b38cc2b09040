use std::sync::Arc;

use crate::{AlterationOp, AlterationPlan, ColumnSpec, ColumnType, Schema, TypeNormalization};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffConfig {
    pub enable_drop: bool,
    pub compare_nullability: bool,
}

impl DiffConfig {
    #[must_use]
    pub const fn new(enable_drop: bool, compare_nullability: bool) -> Self {
        Self {
            enable_drop,
            compare_nullability,
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            enable_drop: true,
            compare_nullability: false,
        }
    }
}

/// Computes column-level alteration plans under one dialect's type table.
///
/// Holds only shared, read-only state; one differ can serve many threads.
#[derive(Debug, Clone)]
pub struct SchemaDiffer {
    types: Arc<TypeNormalization>,
    config: DiffConfig,
}

impl SchemaDiffer {
    #[must_use]
    pub fn new(types: Arc<TypeNormalization>) -> Self {
        Self {
            types,
            config: DiffConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_config(mut self, config: DiffConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn config(&self) -> DiffConfig {
        self.config
    }

    #[must_use]
    pub fn types(&self) -> &TypeNormalization {
        &self.types
    }

    /// Plans drops, then type/nullability alterations, then additions.
    #[must_use]
    pub fn diff(&self, current: &Schema, desired: &Schema) -> AlterationPlan {
        let mut drops = Vec::new();
        let mut alters = Vec::new();
        let mut adds = Vec::new();

        if self.config.enable_drop {
            drops.extend(
                current
                    .columns()
                    .filter(|column| !desired.contains(&column.name))
                    .cloned()
                    .map(AlterationOp::DropColumn),
            );
        }

        for desired_column in desired.columns() {
            match current.get(&desired_column.name) {
                Some(current_column) => {
                    self.compare_column(current_column, desired_column, &mut alters);
                }
                None => adds.push(AlterationOp::AddColumn(desired_column.clone())),
            }
        }

        let mut ops = drops;
        ops.append(&mut alters);
        ops.append(&mut adds);
        AlterationPlan::new(ops)
    }

    /// Whether two declarations of a column type behave identically once
    /// defaults and ceilings are applied.
    #[must_use]
    pub fn types_equivalent(&self, current: &ColumnType, desired: &ColumnType) -> bool {
        if current.name != desired.name {
            return false;
        }
        if self.types.normalize(current) == self.types.normalize(desired) {
            return true;
        }

        // A spelled-out default alternative matches an undeclared parameter list.
        match (&current.params, &desired.params) {
            (None, Some(_)) => self.types.matches_default_alternative(desired),
            (Some(_), None) => self.types.matches_default_alternative(current),
            _ => false,
        }
    }

    fn compare_column(&self, current: &ColumnSpec, desired: &ColumnSpec, ops: &mut Vec<AlterationOp>) {
        if !self.types_equivalent(&current.data_type, &desired.data_type) {
            ops.push(AlterationOp::AlterColumnType {
                current: current.clone(),
                desired: desired.clone(),
            });
        }

        if self.config.compare_nullability && current.nullable != desired.nullable {
            ops.push(AlterationOp::AlterColumnNullability {
                current: current.clone(),
                desired: desired.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{DiffConfig, SchemaDiffer};
    use crate::{AlterationOp, ColumnSpec, ColumnType, Schema, TypeNormalization};

    fn differ() -> SchemaDiffer {
        let types = TypeNormalization::builder()
            .defaults("NUMBER", [vec![40, 40], vec![0]])
            .defaults("VARCHAR2", [vec![1]])
            .max("VARCHAR2", 32767)
            .build()
            .expect("valid table");
        SchemaDiffer::new(Arc::new(types))
    }

    #[test]
    fn different_base_types_never_match() {
        let differ = differ();
        assert!(!differ.types_equivalent(
            &ColumnType::new("NUMBER"),
            &ColumnType::new("VARCHAR2")
        ));
    }

    #[test]
    fn disabled_drops_keep_current_only_columns() {
        let differ = differ().with_config(DiffConfig::new(false, false));
        let current = Schema::from_pairs([("A", "NUMBER"), ("B", "NUMBER")]).expect("current");
        let desired = Schema::from_pairs([("B", "NUMBER")]).expect("desired");

        assert!(differ.diff(&current, &desired).is_empty());
    }

    #[test]
    fn nullability_is_compared_only_when_enabled() {
        let current = Schema::from_columns([ColumnSpec::new("A", ColumnType::new("NUMBER"))])
            .expect("current");
        let desired =
            Schema::from_columns([ColumnSpec::new("A", ColumnType::new("NUMBER")).not_null()])
                .expect("desired");

        assert!(differ().diff(&current, &desired).is_empty());

        let plan = differ()
            .with_config(DiffConfig::new(true, true))
            .diff(&current, &desired);
        assert!(matches!(
            plan.ops(),
            [AlterationOp::AlterColumnNullability { desired, .. }] if !desired.nullable
        ));
    }
}
