//! SQL parser for CREATE TABLE / ALTER TABLE / CREATE INDEX statements.
//!
//! Parsing is best-effort: statements and clauses outside the supported
//! subset are skipped and reported as [`ParseDiagnostic`]s instead of
//! failing the whole input.

use super::lexer::{Lexer, Spanned, Token};
use super::statement::{
    AddForeignKey, ColumnDef, ColumnModifier, CreateIndex, CreateTable, ForeignTarget,
    ReferentialAction, Statement,
};
use serde::Serialize;
use std::ops::Range;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DdlError {
    #[error("No tables found: the input contains no CREATE TABLE statement ({skipped} statement(s) skipped)")]
    NoTables { skipped: usize },
}

/// Why part of the input was not turned into schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Statement kind outside the supported subset
    UnsupportedStatement,
    /// Recognized table-level clause that is not modeled
    IgnoredClause,
    /// Column definition that could not be read
    InvalidColumn,
    /// Foreign key form that cannot be resolved to a single column
    UnsupportedForeignKey,
    /// Statement of a supported kind that ended unexpectedly
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseDiagnostic {
    /// 1-based position of the statement in the input
    pub statement: usize,
    pub kind: DiagnosticKind,
    pub message: String,
    pub snippet: String,
}

/// Output of [`parse_ddl`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDdl {
    pub statements: Vec<Statement>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Parse a batch of DDL statements.
///
/// Fails only when no `CREATE TABLE` statement was recognized.
pub fn parse_ddl(input: &str) -> Result<ParsedDdl, DdlError> {
    let tokens = Lexer::new(input).tokenize();
    let parsed = Parser::new(input, tokens).parse();

    let has_tables = parsed
        .statements
        .iter()
        .any(|s| matches!(s, Statement::CreateTable(_)));
    if !has_tables {
        return Err(DdlError::NoTables {
            skipped: parsed.diagnostics.len(),
        });
    }

    Ok(parsed)
}

const SNIPPET_LEN: usize = 60;

fn snippet(text: &str) -> String {
    let compact = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() > SNIPPET_LEN {
        let cut: String = compact.chars().take(SNIPPET_LEN).collect();
        format!("{}…", cut)
    } else {
        compact
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    /// Exclusive token bound of the construct being parsed
    end: usize,
    statement: usize,
    diagnostics: Vec<ParseDiagnostic>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: Vec<Spanned>) -> Self {
        let end = tokens.len();
        Self {
            source,
            tokens,
            pos: 0,
            end,
            statement: 0,
            diagnostics: Vec::new(),
        }
    }

    fn current(&self) -> &Token {
        if self.pos < self.end {
            self.tokens.get(self.pos).map_or(&Token::Eof, |s| &s.token)
        } else {
            &Token::Eof
        }
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = self.pos + offset;
        if idx < self.end {
            self.tokens.get(idx).map_or(&Token::Eof, |s| &s.token)
        } else {
            &Token::Eof
        }
    }

    fn advance(&mut self) {
        if self.pos < self.end {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.current().is_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Source text covered by tokens `from..to`.
    fn text(&self, from: usize, to: usize) -> &'a str {
        if from >= to {
            return "";
        }
        let start = self.tokens[from].span.start;
        let end = self.tokens[to - 1].span.end;
        &self.source[start..end]
    }

    fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>, tokens: Range<usize>) {
        let message = message.into();
        let snippet = snippet(self.text(tokens.start, tokens.end));
        debug!(statement = self.statement, ?kind, %snippet, "{}", message);
        self.diagnostics.push(ParseDiagnostic {
            statement: self.statement,
            kind,
            message,
            snippet,
        });
    }

    fn parse(mut self) -> ParsedDdl {
        let mut statements = Vec::new();
        let total = self.tokens.len();

        while self.pos < total {
            match self.tokens[self.pos].token {
                Token::Eof => break,
                Token::Semicolon => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            let start = self.pos;
            let end = self.tokens[start..]
                .iter()
                .position(|s| matches!(s.token, Token::Semicolon | Token::Eof))
                .map_or(total, |offset| start + offset);

            self.statement += 1;
            self.end = end;
            let parsed = self.parse_statement(start);
            statements.extend(parsed);
            self.end = total;
            self.pos = end;
        }

        ParsedDdl {
            statements,
            diagnostics: self.diagnostics,
        }
    }

    fn parse_statement(&mut self, start: usize) -> Vec<Statement> {
        match self.current() {
            Token::Create => {
                self.advance();
                while self.eat_word("temp")
                    || self.eat_word("temporary")
                    || self.eat_word("unlogged")
                    || self.eat_word("global")
                    || self.eat_word("local")
                {}

                let statement = match self.current() {
                    Token::Table => self.parse_create_table(start).map(Statement::CreateTable),
                    Token::Unique | Token::Index => {
                        self.parse_create_index(start).map(Statement::CreateIndex)
                    }
                    _ => self.unsupported(start),
                };
                statement.into_iter().collect()
            }
            Token::Alter => self.parse_alter_table(start),
            _ => self.unsupported(start).into_iter().collect(),
        }
    }

    fn unsupported(&mut self, start: usize) -> Option<Statement> {
        let end = self.end;
        self.report(
            DiagnosticKind::UnsupportedStatement,
            "Statement is not CREATE TABLE, CREATE INDEX or ALTER TABLE ... ADD",
            start..end,
        );
        None
    }

    fn malformed(&mut self, start: usize, what: &str) -> Option<Statement> {
        let end = self.end;
        self.report(
            DiagnosticKind::Malformed,
            format!("Could not read {}", what),
            start..end,
        );
        None
    }

    /// Read a single identifier-like token and normalize it.
    ///
    /// Unquoted names are lower-cased; quoted names are kept verbatim.
    fn name_part(&mut self) -> Option<String> {
        let idx = self.pos;
        let name = match self.current() {
            Token::Ident(s) => s.to_lowercase(),
            Token::QuotedIdent(s) => s.clone(),
            Token::Str(_)
            | Token::Num(_)
            | Token::Op(_)
            | Token::LParen
            | Token::RParen
            | Token::LBracket
            | Token::RBracket
            | Token::Comma
            | Token::Semicolon
            | Token::Dot
            | Token::Eof => return None,
            // Keywords can still name columns and tables
            _ => self.text(idx, idx + 1).to_lowercase(),
        };
        self.advance();
        Some(name)
    }

    /// Read a possibly schema-qualified name, keeping its last segment.
    fn object_name(&mut self) -> Option<String> {
        let mut name = self.name_part()?;
        while self.current() == &Token::Dot {
            self.advance();
            name = self.name_part()?;
        }
        Some(name)
    }

    /// Index of the `)` matching the `(` at `open`, within the current bound.
    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for idx in open..self.end {
            match self.tokens[idx].token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Split tokens `from..to` on commas outside parentheses.
    fn split_top_level(&self, from: usize, to: usize) -> Vec<Range<usize>> {
        let mut parts = Vec::new();
        let mut depth = 0usize;
        let mut part_start = from;

        for idx in from..to {
            match self.tokens[idx].token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                Token::Comma if depth == 0 => {
                    if idx > part_start {
                        parts.push(part_start..idx);
                    }
                    part_start = idx + 1;
                }
                _ => {}
            }
        }
        if to > part_start {
            parts.push(part_start..to);
        }
        parts
    }

    /// Run `f` with the parser bounded to tokens `range`, restoring the
    /// enclosing bound afterwards.
    fn within<T>(&mut self, range: Range<usize>, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved_end = self.end;
        self.pos = range.start;
        self.end = range.end;
        let result = f(self);
        self.end = saved_end;
        self.pos = range.end;
        result
    }

    fn skip_if_not_exists(&mut self) {
        if self.current() == &Token::If {
            self.advance();
            self.eat(&Token::Not);
            self.eat(&Token::Exists);
        }
    }

    fn parse_create_table(&mut self, start: usize) -> Option<CreateTable> {
        self.advance(); // TABLE
        self.skip_if_not_exists();

        let Some(name) = self.object_name() else {
            self.malformed(start, "table name");
            return None;
        };

        if self.current() != &Token::LParen {
            // CREATE TABLE ... AS / PARTITION OF / OF type
            self.unsupported(start);
            return None;
        }
        let open = self.pos;
        let Some(close) = self.matching_paren(open) else {
            self.malformed(start, "table body");
            return None;
        };

        let mut table = CreateTable {
            name,
            columns: Vec::new(),
            primary_key: Vec::new(),
        };

        for def in self.split_top_level(open + 1, close) {
            self.within(def.clone(), |p| p.parse_table_element(def, &mut table));
        }

        Some(table)
    }

    fn parse_table_element(&mut self, def: Range<usize>, table: &mut CreateTable) {
        if self.current() == &Token::Constraint {
            self.advance();
            self.name_part();
        }

        match self.current() {
            Token::Primary => {
                self.advance();
                self.eat(&Token::Key);
                let columns = self.parse_column_list();
                if columns.is_empty() {
                    self.report(
                        DiagnosticKind::IgnoredClause,
                        "PRIMARY KEY clause without a column list",
                        def,
                    );
                } else {
                    table.primary_key.extend(columns);
                }
            }
            Token::Foreign => self.report(
                DiagnosticKind::IgnoredClause,
                "Table-level FOREIGN KEY is not resolved; use an inline REFERENCES or ALTER TABLE ... ADD CONSTRAINT",
                def,
            ),
            Token::Unique | Token::Check | Token::Index => {
                self.report(DiagnosticKind::IgnoredClause, "Table-level constraint is not modeled", def)
            }
            Token::Ident(word)
                if word.eq_ignore_ascii_case("exclude") || word.eq_ignore_ascii_case("like") =>
            {
                self.report(DiagnosticKind::IgnoredClause, "Table-level clause is not modeled", def)
            }
            // CONSTRAINT name followed by something unexpected
            _ if def.start < self.pos => {
                self.report(DiagnosticKind::IgnoredClause, "Named constraint is not modeled", def)
            }
            _ => match self.parse_column() {
                Some(column) => table.columns.push(column),
                None => self.report(
                    DiagnosticKind::InvalidColumn,
                    "Expected a column name followed by a type",
                    def,
                ),
            },
        }
    }

    fn parse_column(&mut self) -> Option<ColumnDef> {
        if self.current().is_constraint_keyword() {
            return None;
        }
        let name = self.name_part()?;
        let typ = self.parse_type()?;

        let mut modifiers = Vec::new();

        loop {
            match self.current() {
                Token::Eof => break,
                Token::Primary => {
                    self.advance();
                    self.eat(&Token::Key);
                    modifiers.push(ColumnModifier::Pk);
                }
                Token::Not => {
                    self.advance();
                    if self.eat(&Token::Null) {
                        modifiers.push(ColumnModifier::NotNull);
                    }
                }
                Token::Null => {
                    self.advance();
                    modifiers.push(ColumnModifier::Null);
                }
                Token::Unique => {
                    self.advance();
                    self.eat(&Token::Key);
                    modifiers.push(ColumnModifier::Unique);
                }
                Token::Default => {
                    self.advance();
                    if let Some(value) = self.parse_default_value() {
                        modifiers.push(ColumnModifier::Default(value));
                    }
                }
                Token::Check => {
                    self.advance();
                    if let Some(expr) = self.parse_parenthesized_text() {
                        modifiers.push(ColumnModifier::Check(expr));
                    }
                }
                Token::References => {
                    self.advance();
                    if let Some(target) = self.parse_reference() {
                        modifiers.push(ColumnModifier::References(target));
                    }
                }
                Token::Constraint => {
                    // Inline constraint name
                    self.advance();
                    self.name_part();
                }
                Token::LParen => self.skip_parenthesized(),
                _ => self.advance(),
            }
        }

        Some(ColumnDef {
            name,
            typ,
            modifiers,
        })
    }

    /// Read a column type such as `VARCHAR(255)`, `DOUBLE PRECISION`,
    /// `TIMESTAMP(3) WITH TIME ZONE` or `TEXT[]`, upper-cased.
    fn parse_type(&mut self) -> Option<String> {
        let mut typ = match self.current() {
            Token::Ident(s) | Token::QuotedIdent(s) => s.to_uppercase(),
            _ => return None,
        };
        self.advance();

        // schema-qualified type
        while self.current() == &Token::Dot {
            self.advance();
            match self.current() {
                Token::Ident(s) | Token::QuotedIdent(s) => {
                    typ = s.to_uppercase();
                    self.advance();
                }
                _ => break,
            }
        }

        const CONTINUATIONS: [&str; 6] = ["precision", "varying", "with", "without", "time", "zone"];

        loop {
            match self.current() {
                Token::Ident(word) if CONTINUATIONS.iter().any(|c| word.eq_ignore_ascii_case(c)) => {
                    typ.push(' ');
                    typ.push_str(&word.to_uppercase());
                    self.advance();
                }
                Token::LParen => {
                    let open = self.pos;
                    let Some(close) = self.matching_paren(open) else {
                        break;
                    };
                    let args: String = self
                        .text(open, close + 1)
                        .chars()
                        .filter(|c| !c.is_whitespace())
                        .collect();
                    typ.push_str(&args.to_uppercase());
                    self.pos = close + 1;
                }
                Token::LBracket => {
                    self.advance();
                    while !matches!(self.current(), Token::RBracket | Token::Eof) {
                        self.advance();
                    }
                    self.eat(&Token::RBracket);
                    typ.push_str("[]");
                }
                _ => break,
            }
        }

        Some(typ)
    }

    /// Read a default value: one whitespace-delimited expression, with
    /// parenthesized arguments kept whole (`NOW()`, `'{}'::text[]`).
    fn parse_default_value(&mut self) -> Option<String> {
        let first = self.pos;
        let mut last = first;
        let mut depth = 0usize;

        while self.current() != &Token::Eof {
            if self.pos > first && depth == 0 {
                let gap = self.tokens[self.pos - 1].span.end != self.tokens[self.pos].span.start;
                if gap {
                    break;
                }
            }
            match self.current() {
                Token::LParen => depth += 1,
                Token::RParen => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
            last = self.pos;
        }

        if last == first {
            None
        } else {
            Some(self.text(first, last).to_string())
        }
    }

    /// Read `( ... )` and return the trimmed inner source text.
    fn parse_parenthesized_text(&mut self) -> Option<String> {
        if self.current() != &Token::LParen {
            return None;
        }
        let open = self.pos;
        let close = self.matching_paren(open)?;
        let inner = self.text(open + 1, close).trim().to_string();
        self.pos = close + 1;
        Some(inner)
    }

    fn parse_reference(&mut self) -> Option<ForeignTarget> {
        let table = self.object_name()?;

        let column = if self.current() == &Token::LParen {
            self.parse_column_list().into_iter().next()
        } else {
            None
        };

        // MATCH FULL | MATCH PARTIAL | MATCH SIMPLE
        if self.eat_word("match") {
            self.advance();
        }

        let mut on_delete = None;
        while self.current() == &Token::On {
            self.advance();
            let is_delete = match self.current() {
                Token::Delete => true,
                Token::Update => false,
                _ => break,
            };
            self.advance();
            let action = self.parse_referential_action();
            if is_delete {
                on_delete = action;
            }
        }

        Some(ForeignTarget {
            table,
            column: column.unwrap_or_else(|| "id".to_string()),
            on_delete,
        })
    }

    fn parse_referential_action(&mut self) -> Option<ReferentialAction> {
        if self.eat_word("cascade") {
            Some(ReferentialAction::Cascade)
        } else if self.eat_word("restrict") {
            Some(ReferentialAction::Restrict)
        } else if self.eat_word("set") {
            if self.eat(&Token::Null) {
                Some(ReferentialAction::SetNull)
            } else if self.eat(&Token::Default) {
                Some(ReferentialAction::SetDefault)
            } else {
                None
            }
        } else if self.eat_word("no") {
            self.eat_word("action");
            Some(ReferentialAction::NoAction)
        } else {
            None
        }
    }

    /// Read `(a, b, ...)` as normalized names.
    fn parse_column_list(&mut self) -> Vec<String> {
        let mut cols = Vec::new();

        if self.current() != &Token::LParen {
            return cols;
        }
        self.advance();

        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Comma => self.advance(),
                Token::Eof => break,
                _ => match self.name_part() {
                    Some(name) => cols.push(name),
                    None => self.advance(),
                },
            }
        }

        cols
    }

    fn skip_parenthesized(&mut self) {
        match self.matching_paren(self.pos) {
            Some(close) => self.pos = close + 1,
            None => self.pos = self.end,
        }
    }

    fn parse_create_index(&mut self, start: usize) -> Option<CreateIndex> {
        let unique = self.eat(&Token::Unique);
        if !self.eat(&Token::Index) {
            self.unsupported(start);
            return None;
        }
        self.eat_word("concurrently");
        self.skip_if_not_exists();

        let name = if self.current() != &Token::On {
            self.object_name()
        } else {
            None
        };

        if !self.eat(&Token::On) {
            self.malformed(start, "index target");
            return None;
        }
        self.eat(&Token::Only);

        let Some(table) = self.object_name() else {
            self.malformed(start, "index table");
            return None;
        };

        if self.eat_word("using") {
            self.advance();
        }

        if self.current() != &Token::LParen {
            self.malformed(start, "index column list");
            return None;
        }
        let open = self.pos;
        let Some(close) = self.matching_paren(open) else {
            self.malformed(start, "index column list");
            return None;
        };

        let mut columns = Vec::new();
        for element in self.split_top_level(open + 1, close) {
            let column = self.within(element.clone(), |p| {
                let simple = matches!(p.current(), Token::Ident(_) | Token::QuotedIdent(_))
                    && p.peek_at(1) != &Token::LParen
                    && p.peek_at(1) != &Token::Op("::".to_string());
                if simple { p.name_part() } else { None }
            });
            let column =
                column.unwrap_or_else(|| self.text(element.start, element.end).trim().to_lowercase());
            columns.push(column);
        }

        Some(CreateIndex {
            name,
            table,
            columns,
            unique,
        })
    }

    fn parse_alter_table(&mut self, start: usize) -> Vec<Statement> {
        self.advance(); // ALTER
        if !self.eat(&Token::Table) {
            return self.unsupported(start).into_iter().collect();
        }
        if self.current() == &Token::If {
            self.advance();
            self.eat(&Token::Exists);
        }
        self.eat(&Token::Only);

        let Some(table) = self.object_name() else {
            return self.malformed(start, "table name").into_iter().collect();
        };

        // One statement may carry several comma-separated actions
        let actions = self.split_top_level(self.pos, self.end);
        if actions.is_empty() {
            return self.malformed(start, "ALTER TABLE action").into_iter().collect();
        }

        let mut statements = Vec::new();
        for action in actions {
            let parsed = self.within(action.clone(), |p| p.parse_alter_action(&table, action));
            statements.extend(parsed);
        }
        statements
    }

    fn parse_alter_action(&mut self, table: &str, action: Range<usize>) -> Option<Statement> {
        if !self.eat(&Token::Add) {
            self.report(
                DiagnosticKind::IgnoredClause,
                "Only ADD FOREIGN KEY and ADD PRIMARY KEY are applied from ALTER TABLE",
                action,
            );
            return None;
        }

        let constraint = if self.eat(&Token::Constraint) {
            self.name_part()
        } else {
            None
        };

        let statement = match self.current() {
            Token::Foreign => {
                self.advance();
                self.eat(&Token::Key);
                let columns = self.parse_column_list();
                if !self.eat(&Token::References) {
                    return self.malformed(action.start, "REFERENCES clause");
                }
                let Some(target) = self.parse_reference() else {
                    return self.malformed(action.start, "referenced table");
                };
                if columns.len() != 1 {
                    self.report(
                        DiagnosticKind::UnsupportedForeignKey,
                        format!("Foreign key over {} columns is not supported", columns.len()),
                        action,
                    );
                    return None;
                }
                let column = columns.into_iter().next()?;
                Statement::AddForeignKey(AddForeignKey {
                    table: table.to_string(),
                    constraint,
                    column,
                    target,
                })
            }
            Token::Primary => {
                self.advance();
                self.eat(&Token::Key);
                let columns = self.parse_column_list();
                if columns.is_empty() {
                    return self.malformed(action.start, "primary key columns");
                }
                Statement::AddPrimaryKey {
                    table: table.to_string(),
                    columns,
                }
            }
            _ => {
                self.report(
                    DiagnosticKind::IgnoredClause,
                    "Only ADD FOREIGN KEY and ADD PRIMARY KEY are applied from ALTER TABLE",
                    action,
                );
                return None;
            }
        };

        if self.pos < self.end {
            let rest = self.pos..self.end;
            self.report(
                DiagnosticKind::IgnoredClause,
                "Trailing constraint options are ignored",
                rest,
            );
        }
        Some(statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tables(parsed: &ParsedDdl) -> Vec<&CreateTable> {
        parsed
            .statements
            .iter()
            .filter_map(|s| match s {
                Statement::CreateTable(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_simple_table() {
        let sql = r#"
            CREATE TABLE users (
                id INT PRIMARY KEY,
                email VARCHAR(255) NOT NULL UNIQUE
            );
        "#;

        let parsed = parse_ddl(sql).unwrap();
        let tables = tables(&parsed);
        assert_eq!(tables.len(), 1);

        let users = tables[0];
        assert_eq!(users.name, "users");
        assert_eq!(users.columns.len(), 2);
        assert_eq!(users.columns[0].name, "id");
        assert!(users.columns[0].has(|m| matches!(m, ColumnModifier::Pk)));
        assert_eq!(users.columns[1].typ, "VARCHAR(255)");
        assert!(users.columns[1].has(|m| matches!(m, ColumnModifier::NotNull)));
        assert!(users.columns[1].has(|m| matches!(m, ColumnModifier::Unique)));
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_check_with_nested_parens_is_one_column() {
        let sql = "CREATE TABLE products (price NUMERIC(10, 2) CHECK (price > 0), qty INT CHECK (qty IN (1, 2)));";

        let parsed = parse_ddl(sql).unwrap();
        let t = tables(&parsed)[0];
        assert_eq!(t.columns.len(), 2);
        assert_eq!(t.columns[0].typ, "NUMERIC(10,2)");
        assert_eq!(
            t.columns[0].modifiers,
            vec![ColumnModifier::Check("price > 0".to_string())]
        );
        assert_eq!(
            t.columns[1].modifiers,
            vec![ColumnModifier::Check("qty IN (1, 2)".to_string())]
        );
    }

    #[test]
    fn test_default_values() {
        let sql = r#"
            CREATE TABLE t (
                a TIMESTAMP DEFAULT NOW(),
                b VARCHAR(20) DEFAULT 'new' NOT NULL,
                c INTEGER DEFAULT -1,
                d TEXT[] DEFAULT '{}'::text[]
            );
        "#;

        let parsed = parse_ddl(sql).unwrap();
        let t = tables(&parsed)[0];
        let defaults: Vec<&str> = t
            .columns
            .iter()
            .filter_map(|c| {
                c.modifiers.iter().find_map(|m| match m {
                    ColumnModifier::Default(v) => Some(v.as_str()),
                    _ => None,
                })
            })
            .collect();
        assert_eq!(defaults, vec!["NOW()", "'new'", "-1", "'{}'::text[]"]);
        assert!(t.columns[1].has(|m| matches!(m, ColumnModifier::NotNull)));
        assert_eq!(t.columns[3].typ, "TEXT[]");
    }

    #[test]
    fn test_multi_word_types() {
        let sql = r#"
            CREATE TABLE t (
                a DOUBLE PRECISION,
                b TIMESTAMP(3) WITH TIME ZONE NOT NULL,
                c CHARACTER VARYING(40)
            );
        "#;

        let parsed = parse_ddl(sql).unwrap();
        let t = tables(&parsed)[0];
        assert_eq!(t.columns[0].typ, "DOUBLE PRECISION");
        assert_eq!(t.columns[1].typ, "TIMESTAMP(3) WITH TIME ZONE");
        assert_eq!(t.columns[2].typ, "CHARACTER VARYING(40)");
    }

    #[test]
    fn test_inline_reference_with_on_delete() {
        let sql = "CREATE TABLE items (order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE SET NULL ON UPDATE CASCADE);";

        let parsed = parse_ddl(sql).unwrap();
        let t = tables(&parsed)[0];
        let target = t.columns[0]
            .modifiers
            .iter()
            .find_map(|m| match m {
                ColumnModifier::References(target) => Some(target.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(target.table, "orders");
        assert_eq!(target.column, "id");
        assert_eq!(target.on_delete, Some(ReferentialAction::SetNull));
    }

    #[test]
    fn test_reference_without_column_targets_id() {
        let sql = "CREATE TABLE a (b_id INT REFERENCES public.b);";

        let parsed = parse_ddl(sql).unwrap();
        let t = tables(&parsed)[0];
        assert_eq!(
            t.columns[0].modifiers,
            vec![ColumnModifier::References(ForeignTarget {
                table: "b".to_string(),
                column: "id".to_string(),
                on_delete: None,
            })]
        );
    }

    #[test]
    fn test_composite_primary_key_clause() {
        let sql = "CREATE TABLE t (a INT, b INT, CONSTRAINT t_pk PRIMARY KEY (a, b));";

        let parsed = parse_ddl(sql).unwrap();
        let t = tables(&parsed)[0];
        assert_eq!(t.columns.len(), 2);
        assert_eq!(t.primary_key, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_table_level_foreign_key_is_reported() {
        let sql = r#"
            CREATE TABLE t (
                a INT,
                FOREIGN KEY (a) REFERENCES other(id),
                UNIQUE (a)
            );
        "#;

        let parsed = parse_ddl(sql).unwrap();
        let t = tables(&parsed)[0];
        assert_eq!(t.columns.len(), 1);
        assert_eq!(parsed.diagnostics.len(), 2);
        assert!(
            parsed
                .diagnostics
                .iter()
                .all(|d| d.kind == DiagnosticKind::IgnoredClause && d.statement == 1)
        );
        assert!(parsed.diagnostics[0].snippet.starts_with("FOREIGN KEY (a)"));
    }

    #[test]
    fn test_keyword_column_names() {
        let sql = "CREATE TABLE settings (key VARCHAR(50) PRIMARY KEY, action TEXT);";

        let parsed = parse_ddl(sql).unwrap();
        let t = tables(&parsed)[0];
        assert_eq!(t.columns[0].name, "key");
        assert_eq!(t.columns[1].name, "action");
    }

    #[test]
    fn test_name_normalization() {
        let sql = r#"CREATE TABLE IF NOT EXISTS public.Users ("Email" TEXT, Name TEXT);"#;

        let parsed = parse_ddl(sql).unwrap();
        let t = tables(&parsed)[0];
        assert_eq!(t.name, "users");
        assert_eq!(t.columns[0].name, "Email");
        assert_eq!(t.columns[1].name, "name");
    }

    #[test]
    fn test_parse_alter_table_fk() {
        let sql = r#"
            CREATE TABLE departments (id SERIAL PRIMARY KEY, head_employee_id INTEGER);
            ALTER TABLE ONLY departments ADD CONSTRAINT fk_dept_head
                FOREIGN KEY (head_employee_id) REFERENCES employees(id) ON DELETE CASCADE;
        "#;

        let parsed = parse_ddl(sql).unwrap();
        assert_eq!(
            parsed.statements[1],
            Statement::AddForeignKey(AddForeignKey {
                table: "departments".to_string(),
                constraint: Some("fk_dept_head".to_string()),
                column: "head_employee_id".to_string(),
                target: ForeignTarget {
                    table: "employees".to_string(),
                    column: "id".to_string(),
                    on_delete: Some(ReferentialAction::Cascade),
                },
            })
        );
    }

    #[test]
    fn test_parse_alter_table_primary_key() {
        let sql = r#"
            CREATE TABLE t (id INTEGER);
            ALTER TABLE ONLY public.t ADD CONSTRAINT t_pkey PRIMARY KEY (id);
        "#;

        let parsed = parse_ddl(sql).unwrap();
        assert_eq!(
            parsed.statements[1],
            Statement::AddPrimaryKey {
                table: "t".to_string(),
                columns: vec!["id".to_string()],
            }
        );
    }

    #[test]
    fn test_multi_column_alter_fk_is_reported() {
        let sql = r#"
            CREATE TABLE t (a INT, b INT);
            ALTER TABLE t ADD CONSTRAINT fk FOREIGN KEY (a, b) REFERENCES u(a, b);
        "#;

        let parsed = parse_ddl(sql).unwrap();
        assert_eq!(parsed.statements.len(), 1);
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::UnsupportedForeignKey);
        assert_eq!(parsed.diagnostics[0].statement, 2);
    }

    #[test]
    fn test_alter_table_with_several_actions() {
        let sql = r#"
            CREATE TABLE c (id INT PRIMARY KEY, a_id INT, b_id INT);
            ALTER TABLE c
                ADD CONSTRAINT fk_a FOREIGN KEY (a_id) REFERENCES a(id),
                ADD CONSTRAINT fk_b FOREIGN KEY (b_id) REFERENCES b(id) ON DELETE CASCADE,
                ALTER COLUMN a_id SET NOT NULL;
        "#;

        let parsed = parse_ddl(sql).unwrap();
        let constraints: Vec<Option<&str>> = parsed
            .statements
            .iter()
            .filter_map(|s| match s {
                Statement::AddForeignKey(fk) => Some(fk.constraint.as_deref()),
                _ => None,
            })
            .collect();
        assert_eq!(constraints, vec![Some("fk_a"), Some("fk_b")]);

        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::IgnoredClause);
        assert_eq!(parsed.diagnostics[0].statement, 2);
        assert_eq!(parsed.diagnostics[0].snippet, "ALTER COLUMN a_id SET NOT NULL");
    }

    #[test]
    fn test_alter_fk_trailing_options_are_reported() {
        let sql = r#"
            CREATE TABLE t (id INT PRIMARY KEY, u_id INT);
            ALTER TABLE t ADD CONSTRAINT fk_u FOREIGN KEY (u_id) REFERENCES u(id) DEFERRABLE INITIALLY DEFERRED;
        "#;

        let parsed = parse_ddl(sql).unwrap();
        assert_eq!(parsed.statements.len(), 2);
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::IgnoredClause);
        assert_eq!(parsed.diagnostics[0].snippet, "DEFERRABLE INITIALLY DEFERRED");
    }

    #[test]
    fn test_parse_indexes() {
        let sql = r#"
            CREATE TABLE t (a INT, b INT);
            CREATE UNIQUE INDEX CONCURRENTLY IF NOT EXISTS idx_t_ab ON t USING btree (a, b DESC);
            CREATE INDEX ON t (lower(b::text));
        "#;

        let parsed = parse_ddl(sql).unwrap();
        assert_eq!(
            parsed.statements[1],
            Statement::CreateIndex(CreateIndex {
                name: Some("idx_t_ab".to_string()),
                table: "t".to_string(),
                columns: vec!["a".to_string(), "b".to_string()],
                unique: true,
            })
        );
        assert_eq!(
            parsed.statements[2],
            Statement::CreateIndex(CreateIndex {
                name: None,
                table: "t".to_string(),
                columns: vec!["lower(b::text)".to_string()],
                unique: false,
            })
        );
    }

    #[test]
    fn test_unsupported_statements_are_reported() {
        let sql = r#"
            SET search_path = public;
            CREATE TABLE t (id INT PRIMARY KEY);
            CREATE VIEW v AS SELECT 1;
            INSERT INTO t VALUES (1);
        "#;

        let parsed = parse_ddl(sql).unwrap();
        assert_eq!(parsed.statements.len(), 1);
        let kinds: Vec<(usize, DiagnosticKind)> = parsed
            .diagnostics
            .iter()
            .map(|d| (d.statement, d.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (1, DiagnosticKind::UnsupportedStatement),
                (3, DiagnosticKind::UnsupportedStatement),
                (4, DiagnosticKind::UnsupportedStatement),
            ]
        );
    }

    #[test]
    fn test_no_tables() {
        let err = parse_ddl("CREATE INDEX i ON t(a); -- nothing else").unwrap_err();
        assert!(matches!(err, DdlError::NoTables { skipped: 0 }));

        let err = parse_ddl("").unwrap_err();
        assert!(err.to_string().starts_with("No tables found"));
    }

    #[test]
    fn test_snippet_is_compacted_and_truncated() {
        assert_eq!(snippet("CREATE   VIEW\n  v"), "CREATE VIEW v");
        let long = "x ".repeat(100);
        assert_eq!(snippet(&long).chars().count(), SNIPPET_LEN + 1);
    }
}
