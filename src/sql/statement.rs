//! Parsed DDL statements, before schema resolution.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTable),
    AddForeignKey(AddForeignKey),
    /// `ALTER TABLE t ADD [CONSTRAINT name] PRIMARY KEY (cols)`
    AddPrimaryKey { table: String, columns: Vec<String> },
    CreateIndex(CreateIndex),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Columns named by a table-level `PRIMARY KEY (...)` clause
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub typ: String,
    pub modifiers: Vec<ColumnModifier>,
}

impl ColumnDef {
    pub fn has(&self, predicate: impl Fn(&ColumnModifier) -> bool) -> bool {
        self.modifiers.iter().any(predicate)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnModifier {
    Pk,
    NotNull,
    Null,
    Unique,
    Default(String),
    Check(String),
    References(ForeignTarget),
}

/// Target of a foreign key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignTarget {
    pub table: String,
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
}

/// `ALTER TABLE t ADD [CONSTRAINT name] FOREIGN KEY (col) REFERENCES ...`
#[derive(Debug, Clone, PartialEq)]
pub struct AddForeignKey {
    pub table: String,
    pub constraint: Option<String>,
    pub column: String,
    pub target: ForeignTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    pub name: Option<String>,
    pub table: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
        })
    }
}
