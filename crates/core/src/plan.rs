use crate::{ColumnSpec, Schema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterationOp {
    AddColumn(ColumnSpec),
    DropColumn(ColumnSpec),
    AlterColumnType {
        current: ColumnSpec,
        desired: ColumnSpec,
    },
    AlterColumnNullability {
        current: ColumnSpec,
        desired: ColumnSpec,
    },
}

impl AlterationOp {
    #[must_use]
    pub fn column_name(&self) -> &str {
        match self {
            Self::AddColumn(column) | Self::DropColumn(column) => &column.name,
            Self::AlterColumnType { desired, .. }
            | Self::AlterColumnNullability { desired, .. } => &desired.name,
        }
    }

    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::AddColumn(_) => "AddColumn",
            Self::DropColumn(_) => "DropColumn",
            Self::AlterColumnType { .. } => "AlterColumnType",
            Self::AlterColumnNullability { .. } => "AlterColumnNullability",
        }
    }
}

/// Ordered column changes moving a live table to its desired shape.
///
/// Built fresh by every diff and consumed by value when applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlterationPlan {
    ops: Vec<AlterationOp>,
}

impl AlterationPlan {
    pub(crate) const fn new(ops: Vec<AlterationOp>) -> Self {
        Self { ops }
    }

    #[must_use]
    pub fn ops(&self) -> &[AlterationOp] {
        &self.ops
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The schema `current` would have after every step ran successfully.
    #[must_use]
    pub fn applied_to(&self, current: &Schema) -> Schema {
        let mut schema = current.clone();
        for op in &self.ops {
            match op {
                AlterationOp::AddColumn(column) => {
                    if !schema.replace(column.clone()) {
                        let _ = schema.push(column.clone());
                    }
                }
                AlterationOp::DropColumn(column) => {
                    schema.remove(&column.name);
                }
                AlterationOp::AlterColumnType { desired, .. } => {
                    if let Some(existing) = schema.get(&desired.name) {
                        let altered = ColumnSpec {
                            data_type: desired.data_type.clone(),
                            ..existing.clone()
                        };
                        schema.replace(altered);
                    }
                }
                AlterationOp::AlterColumnNullability { desired, .. } => {
                    if let Some(existing) = schema.get(&desired.name) {
                        let altered = ColumnSpec {
                            nullable: desired.nullable,
                            ..existing.clone()
                        };
                        schema.replace(altered);
                    }
                }
            }
        }
        schema
    }
}

impl IntoIterator for AlterationPlan {
    type Item = AlterationOp;
    type IntoIter = std::vec::IntoIter<AlterationOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}
