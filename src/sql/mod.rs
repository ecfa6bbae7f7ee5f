//! DDL text to statement conversion.

mod lexer;
mod parser;
mod statement;

pub use parser::{DdlError, DiagnosticKind, ParseDiagnostic, ParsedDdl, parse_ddl};
pub use statement::{
    AddForeignKey, ColumnDef, ColumnModifier, CreateIndex, CreateTable, ForeignTarget,
    ReferentialAction, Statement,
};
