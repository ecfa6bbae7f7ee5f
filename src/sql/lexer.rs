//! SQL lexer for tokenizing DDL statements.

use std::iter::Peekable;
use std::ops::Range;
use std::str::CharIndices;

/// SQL token types.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Create,
    Alter,
    Add,
    Table,
    Only,
    Primary,
    Key,
    Foreign,
    References,
    Not,
    Null,
    Unique,
    Default,
    On,
    Delete,
    Update,
    Constraint,
    Index,
    If,
    Exists,
    Check,

    // Identifiers and literals
    Ident(String),
    QuotedIdent(String),
    Str(String),
    Num(String),
    Op(String),

    // Symbols
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,

    // End of input
    Eof,
}

impl Token {
    /// Keywords that may only start a table-level constraint, never a column.
    pub fn is_constraint_keyword(&self) -> bool {
        matches!(
            self,
            Token::Primary | Token::Foreign | Token::Constraint | Token::Unique | Token::Check | Token::Index
        )
    }

    /// True for an unquoted identifier equal to `word` (case-insensitive).
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Ident(s) if s.eq_ignore_ascii_case(word))
    }
}

/// A token with its byte range in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

/// SQL lexer.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    current: Option<(usize, char)>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.char_indices().peekable();
        let current = chars.next();
        Self {
            source,
            chars,
            current,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.current.map(|(_, c)| c)
    }

    fn pos(&self) -> usize {
        self.current.map_or(self.source.len(), |(i, _)| i)
    }

    fn advance(&mut self) {
        self.current = self.chars.next();
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current_char() {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // skip /
        self.advance(); // skip *
        while let Some(c) = self.current_char() {
            self.advance();
            if c == '*' && self.current_char() == Some('/') {
                self.advance();
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.current_char() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        ident
    }

    /// Reads a quoted run; a doubled quote character is an escaped quote.
    fn read_quoted(&mut self, quote: char) -> String {
        self.advance(); // skip opening quote
        let mut text = String::new();
        while let Some(c) = self.current_char() {
            if c == quote {
                if self.peek() == Some(quote) {
                    text.push(c);
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // skip closing quote
                    break;
                }
            } else {
                text.push(c);
                self.advance();
            }
        }
        text
    }

    /// Reads a `$tag$ ... $tag$` string, or returns `None` when the `$`
    /// does not open one.
    fn read_dollar_quoted(&mut self) -> Option<String> {
        let start = self.pos();
        let rest = &self.source[start + 1..];
        let tag_len = rest.find('$')?;
        if !rest[..tag_len].chars().all(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }

        let delimiter = &self.source[start..start + tag_len + 2];
        let body_start = start + delimiter.len();
        let body_len = self.source[body_start..].find(delimiter)?;
        let body = self.source[body_start..body_start + body_len].to_string();

        let end = body_start + body_len + delimiter.len();
        while self.pos() < end {
            self.advance();
        }
        Some(body)
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        let mut has_dot = false;

        while let Some(c) = self.current_char() {
            if c.is_ascii_digit() {
                num.push(c);
                self.advance();
            } else if c == '.' && !has_dot {
                has_dot = true;
                num.push(c);
                self.advance();
            } else {
                break;
            }
        }
        num
    }

    fn read_operator(&mut self) -> String {
        let mut op = String::new();
        while let Some(c) = self.current_char() {
            if is_operator_char(c) {
                // Stop before a comment opener glued to the operator
                if (c == '-' && self.peek() == Some('-')) || (c == '/' && self.peek() == Some('*')) {
                    break;
                }
                op.push(c);
                self.advance();
            } else {
                break;
            }
        }
        op
    }

    fn keyword_or_ident(s: &str) -> Token {
        match s.to_uppercase().as_str() {
            "CREATE" => Token::Create,
            "ALTER" => Token::Alter,
            "ADD" => Token::Add,
            "TABLE" => Token::Table,
            "ONLY" => Token::Only,
            "PRIMARY" => Token::Primary,
            "KEY" => Token::Key,
            "FOREIGN" => Token::Foreign,
            "REFERENCES" => Token::References,
            "NOT" => Token::Not,
            "NULL" => Token::Null,
            "UNIQUE" => Token::Unique,
            "DEFAULT" => Token::Default,
            "ON" => Token::On,
            "DELETE" => Token::Delete,
            "UPDATE" => Token::Update,
            "CONSTRAINT" => Token::Constraint,
            "INDEX" => Token::Index,
            "IF" => Token::If,
            "EXISTS" => Token::Exists,
            "CHECK" => Token::Check,
            _ => Token::Ident(s.to_string()),
        }
    }

    pub fn next_token(&mut self) -> Spanned {
        loop {
            self.skip_whitespace();
            let start = self.pos();

            let token = match self.current_char() {
                None => Token::Eof,

                Some('-') if self.peek() == Some('-') => {
                    self.skip_line_comment();
                    continue;
                }
                Some('/') if self.peek() == Some('*') => {
                    self.skip_block_comment();
                    continue;
                }

                Some('(') => {
                    self.advance();
                    Token::LParen
                }
                Some(')') => {
                    self.advance();
                    Token::RParen
                }
                Some('[') => {
                    self.advance();
                    Token::LBracket
                }
                Some(']') => {
                    self.advance();
                    Token::RBracket
                }
                Some(',') => {
                    self.advance();
                    Token::Comma
                }
                Some(';') => {
                    self.advance();
                    Token::Semicolon
                }
                Some('.') if !self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                    self.advance();
                    Token::Dot
                }

                Some('"') => Token::QuotedIdent(self.read_quoted('"')),
                Some('`') => Token::QuotedIdent(self.read_quoted('`')),
                Some('\'') => Token::Str(self.read_quoted('\'')),
                Some('$') => match self.read_dollar_quoted() {
                    Some(body) => Token::Str(body),
                    None => {
                        self.advance();
                        continue;
                    }
                },

                Some(c) if c.is_ascii_digit() || c == '.' => Token::Num(self.read_number()),
                Some(c) if c.is_alphabetic() || c == '_' => {
                    let ident = self.read_identifier();
                    // E'...' escape strings
                    if ident.eq_ignore_ascii_case("e") && self.current_char() == Some('\'') {
                        Token::Str(self.read_quoted('\''))
                    } else {
                        Self::keyword_or_ident(&ident)
                    }
                }
                Some(c) if is_operator_char(c) => Token::Op(self.read_operator()),

                Some(_) => {
                    // Skip unknown characters
                    self.advance();
                    continue;
                }
            };

            return Spanned {
                token,
                span: start..self.pos(),
            };
        }
    }

    /// Collect all tokens, ending with `Eof`.
    pub fn tokenize(&mut self) -> Vec<Spanned> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token();
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                break;
            }
        }
        tokens
    }
}

fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '<' | '>' | '=' | '~' | '!' | '@' | '#' | '%' | '^' | '&' | '|' | ':'
    )
}
