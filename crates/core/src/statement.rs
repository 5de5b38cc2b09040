use crate::{ColumnSpec, IdentifierWorkaround, Query, TableName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub table: TableName,
    pub columns: Vec<String>,
    pub unique: bool,
}

/// Rows of the overwrite target that the incoming data replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverwriteScope {
    AllRows,
    /// Pre-compiled boolean condition over the target's columns.
    Where(Query),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOverwrite {
    pub target: TableName,
    pub source: Query,
    pub columns: Vec<String>,
    pub scope: OverwriteScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    Table,
    View,
}

/// Structured DDL/DML handed to a dialect for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateTable {
        table: TableName,
        columns: Vec<ColumnSpec>,
    },
    CreateTableAs {
        table: TableName,
        query: Query,
        replace: bool,
    },
    DropTable {
        table: TableName,
        if_exists: bool,
    },
    RenameTable {
        from: TableName,
        to: TableName,
    },
    AddColumn {
        table: TableName,
        column: ColumnSpec,
    },
    DropColumn {
        table: TableName,
        column: String,
    },
    /// `column` carries the new type and the nullability the column keeps.
    AlterColumnType {
        table: TableName,
        column: ColumnSpec,
    },
    AlterColumnNullability {
        table: TableName,
        column: ColumnSpec,
    },
    CreateIndex(IndexDef),
    CreateView {
        view: TableName,
        query: Query,
        materialized: bool,
        replace: bool,
    },
    DropView {
        view: TableName,
        materialized: bool,
        if_exists: bool,
    },
    Comment {
        target: CommentTarget,
        object: TableName,
        comment: String,
    },
    Delete {
        table: TableName,
        scope: OverwriteScope,
    },
    InsertSelect {
        table: TableName,
        columns: Vec<String>,
        source: Query,
    },
    Merge(MergeOverwrite),
    /// Pre-compiled statement passed through verbatim.
    Raw(Query),
}

impl Statement {
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::CreateTable { .. } => "CreateTable",
            Self::CreateTableAs { .. } => "CreateTableAs",
            Self::DropTable { .. } => "DropTable",
            Self::RenameTable { .. } => "RenameTable",
            Self::AddColumn { .. } => "AddColumn",
            Self::DropColumn { .. } => "DropColumn",
            Self::AlterColumnType { .. } => "AlterColumnType",
            Self::AlterColumnNullability { .. } => "AlterColumnNullability",
            Self::CreateIndex(_) => "CreateIndex",
            Self::CreateView { .. } => "CreateView",
            Self::DropView { .. } => "DropView",
            Self::Comment { .. } => "Comment",
            Self::Delete { .. } => "Delete",
            Self::InsertSelect { .. } => "InsertSelect",
            Self::Merge(_) => "Merge",
            Self::Raw(_) => "Raw",
        }
    }
}

/// Per-call rendering switches.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub quote_identifiers: bool,
    pub identifiers: &'a dyn IdentifierWorkaround,
}

impl<'a> RenderContext<'a> {
    #[must_use]
    pub const fn new(quote_identifiers: bool, identifiers: &'a dyn IdentifierWorkaround) -> Self {
        Self {
            quote_identifiers,
            identifiers,
        }
    }

    /// Physical form of `name`: length workaround first, then the dialect's
    /// quoting when enabled.
    pub fn ident(&self, name: &str, quote: impl Fn(&str) -> String) -> String {
        let physical = self.identifiers.physical_name(name);
        if self.quote_identifiers {
            quote(&physical)
        } else {
            physical
        }
    }

    pub fn table(&self, table: &TableName, quote: impl Fn(&str) -> String) -> String {
        match &table.schema {
            Some(schema) => format!(
                "{}.{}",
                self.ident(schema, &quote),
                self.ident(&table.name, &quote)
            ),
            None => self.ident(&table.name, quote),
        }
    }
}
