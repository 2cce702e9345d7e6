//! Lexer implementation

use super::token::*;
use std::iter::Peekable;
use std::str::CharIndices;

// ============================================================================
// LEXER IMPLEMENTATION
// ============================================================================

/// Lexer for the kirin DSL.
///
/// Never fails: malformed input becomes `TokenKind::Error` tokens, and the
/// stream always ends with exactly one `Eof`.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        tokens
    }

    /// Get the next token from the source.
    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => match c {
                '(' => {
                    self.advance();
                    TokenKind::LParen
                }
                ')' => {
                    self.advance();
                    TokenKind::RParen
                }
                ',' => {
                    self.advance();
                    TokenKind::Comma
                }
                '.' => {
                    self.advance();
                    TokenKind::Dot
                }
                ';' => {
                    self.advance();
                    TokenKind::Semicolon
                }

                '=' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        TokenKind::EqEq
                    } else {
                        TokenKind::Error("Unexpected character: = (did you mean '=='?)".to_string())
                    }
                }

                '!' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        TokenKind::Ne
                    } else {
                        TokenKind::Error("Unexpected character: !".to_string())
                    }
                }

                '-' => {
                    if self.peek_next_char().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                        self.scan_number()
                    } else {
                        self.advance();
                        TokenKind::Error("Unexpected character: -".to_string())
                    }
                }

                '"' | '\'' => self.scan_string(c),

                c if c.is_ascii_digit() => self.scan_number(),

                c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),

                c => {
                    self.advance();
                    TokenKind::Error(format!("Unexpected character: {}", c))
                }
            },
        };

        Token {
            kind,
            span: Span {
                start: start_pos,
                end: self.pos,
                line: start_line,
                column: start_col,
            },
        }
    }

    /// Scan an identifier or keyword.
    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.pos];
        keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()))
    }

    /// Scan a quoted string. The token keeps the raw lexeme, quotes included;
    /// escapes are checked but not decoded.
    fn scan_string(&mut self, quote: char) -> TokenKind {
        let start = self.pos;
        self.advance(); // consume opening quote
        let mut bad_escape: Option<String> = None;

        loop {
            match self.peek_char() {
                None => return TokenKind::Error("Unterminated string".to_string()),
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('"' | '\'' | '\\' | 'n' | 't' | 'r' | 'b' | 'f') => {
                            self.advance();
                        }
                        Some('u') => {
                            self.advance();
                            for _ in 0..4 {
                                match self.peek_char() {
                                    Some(h) if h.is_ascii_hexdigit() => {
                                        self.advance();
                                    }
                                    _ => {
                                        bad_escape.get_or_insert_with(|| {
                                            "Invalid unicode escape: expected 4 hex digits".to_string()
                                        });
                                        break;
                                    }
                                }
                            }
                        }
                        Some(other) => {
                            bad_escape
                                .get_or_insert_with(|| format!("Invalid escape sequence: \\{}", other));
                            self.advance();
                        }
                        None => return TokenKind::Error("Unterminated string".to_string()),
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        match bad_escape {
            Some(msg) => TokenKind::Error(msg),
            None => TokenKind::String(self.source[start..self.pos].to_string()),
        }
    }

    /// Scan `-?digits(.digits)?([eE][+-]?digits)?`.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos;

        if self.peek_char() == Some('-') {
            self.advance();
        }
        self.consume_digits();

        if self.peek_char() == Some('.')
            && self.peek_next_char().map(|c| c.is_ascii_digit()).unwrap_or(false)
        {
            self.advance();
            self.consume_digits();
        }

        if matches!(self.peek_char(), Some('e' | 'E')) {
            let exponent_follows = match self.peek_nth(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self.peek_nth(2).map(|c| c.is_ascii_digit()).unwrap_or(false),
                _ => false,
            };
            if exponent_follows {
                self.advance(); // e
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.advance();
                }
                self.consume_digits();
            }
        }

        TokenKind::Number(self.source[start..self.pos].to_string())
    }

    fn consume_digits(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip whitespace and comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    let next = self.peek_next_char();
                    if next == Some('/') {
                        // Line comment
                        while let Some(c) = self.peek_char() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    } else if next == Some('*') {
                        // Block comment
                        self.advance(); // /
                        self.advance(); // *
                        loop {
                            match self.peek_char() {
                                None => break,
                                Some('*') if self.peek_next_char() == Some('/') => {
                                    self.advance();
                                    self.advance();
                                    break;
                                }
                                _ => {
                                    self.advance();
                                }
                            }
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next_char(&self) -> Option<char> {
        self.peek_nth(1)
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((i, c)) = self.chars.next() {
            self.pos = i + c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(c)
        } else {
            None
        }
    }
}
