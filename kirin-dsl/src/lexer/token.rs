//! Lexer token types

use std::fmt;

// ============================================================================
// LEXER TYPES
// ============================================================================

/// Token kinds for the kirin DSL.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords (case-insensitive)
    Where,
    Not,
    And,
    Or,
    Match,
    Is,
    Contain,
    In,
    NotIn,

    // Operators
    EqEq,
    Ne,

    // Delimiters
    LParen,
    RParen,
    Comma,
    Dot,
    Semicolon,

    // Literals. Each keeps the lexeme exactly as written.
    String(String),
    Number(String),
    Boolean(String),
    Identifier(String),

    // Special
    Eof,
    Error(String),
}

impl TokenKind {
    /// Source-like text of the token, used in error reports.
    pub fn lexeme(&self) -> String {
        match self {
            TokenKind::Where => "where".to_string(),
            TokenKind::Not => "not".to_string(),
            TokenKind::And => "and".to_string(),
            TokenKind::Or => "or".to_string(),
            TokenKind::Match => "match".to_string(),
            TokenKind::Is => "is".to_string(),
            TokenKind::Contain => "contain".to_string(),
            TokenKind::In => "in".to_string(),
            TokenKind::NotIn => "notIn".to_string(),
            TokenKind::EqEq => "==".to_string(),
            TokenKind::Ne => "!=".to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
            TokenKind::Comma => ",".to_string(),
            TokenKind::Dot => ".".to_string(),
            TokenKind::Semicolon => ";".to_string(),
            TokenKind::String(raw)
            | TokenKind::Number(raw)
            | TokenKind::Boolean(raw)
            | TokenKind::Identifier(raw) => raw.clone(),
            TokenKind::Eof => String::new(),
            TokenKind::Error(msg) => msg.clone(),
        }
    }

    /// Human-readable name for "expected ..." messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Number(_) => "number".to_string(),
            TokenKind::Boolean(_) => "boolean".to_string(),
            TokenKind::Identifier(_) => "identifier".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Error(_) => "invalid token".to_string(),
            other => format!("'{}'", other.lexeme()),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Source location span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Keyword for an identifier-shaped lexeme, if it is one.
pub fn keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident.to_lowercase().as_str() {
        "where" => TokenKind::Where,
        "not" => TokenKind::Not,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "match" => TokenKind::Match,
        "is" => TokenKind::Is,
        "contain" => TokenKind::Contain,
        "in" => TokenKind::In,
        "notin" => TokenKind::NotIn,
        "true" | "false" => TokenKind::Boolean(ident.to_string()),
        _ => return None,
    };
    Some(kind)
}
