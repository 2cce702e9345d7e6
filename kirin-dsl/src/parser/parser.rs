//! Parser implementation

use crate::lexer::*;
use kirin_core::{
    Attribute, AtomicCondition, Condition, EntityDecl, ParseError, ParseErrorKind, ParseErrorList,
    Query, QuerySpans, RelMatch, RelOp, SourceSpan, ValueMatch, ValueOp,
};

// ============================================================================
// PARSER
// ============================================================================

/// Deepest condition nesting the parser accepts before failing.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Recursive-descent parser for the kirin DSL.
///
/// A parse either succeeds completely or returns every lexical error in the
/// input (or the first syntax error when the tokens are well formed).
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    depth: usize,
    source: Option<String>,
}

impl Parser {
    /// Create a new parser from a vector of tokens.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: ensure_eof(tokens),
            pos: 0,
            depth: 0,
            source: None,
        }
    }

    /// Lex `source` and keep it so lexical errors can quote the offending text.
    pub fn from_source(source: &str) -> Self {
        let tokens = Lexer::new(source).tokenize();
        Self {
            tokens: ensure_eof(tokens),
            pos: 0,
            depth: 0,
            source: Some(source.to_string()),
        }
    }

    /// Parse a complete root query: `EntityDecl where Condition ;` and nothing after.
    pub fn parse(&mut self) -> Result<Query, ParseErrorList> {
        self.check_lexical_errors()?;
        let query = self.parse_root_query()?;
        self.expect_end()?;
        Ok(query)
    }

    /// Parse a standalone condition. A single trailing `;` is tolerated.
    pub fn parse_condition_only(&mut self) -> Result<Condition, ParseErrorList> {
        self.check_lexical_errors()?;
        let condition = self.parse_condition()?;
        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        self.expect_end()?;
        Ok(condition)
    }

    /// Parse a sub-query as it appears after `contain`/`in`/`notIn`:
    /// the `where` clause and the trailing `;` are optional.
    pub fn parse_nested_only(&mut self) -> Result<Query, ParseErrorList> {
        self.check_lexical_errors()?;
        let query = self.parse_nested_query()?;
        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        self.expect_end()?;
        Ok(query)
    }

    fn check_lexical_errors(&self) -> Result<(), ParseErrorList> {
        let errors: Vec<ParseError> = self
            .tokens
            .iter()
            .filter_map(|token| match &token.kind {
                TokenKind::Error(msg) => Some(ParseError {
                    kind: ParseErrorKind::Lexical,
                    message: format!("Lexer error: {}", msg),
                    line: token.span.line,
                    column: token.span.column,
                    offset: token.span.start,
                    token: self.source_text(token),
                }),
                _ => None,
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ParseErrorList::new(errors))
        }
    }

    fn source_text(&self, token: &Token) -> String {
        self.source
            .as_deref()
            .and_then(|s| s.get(token.span.start..token.span.end))
            .map(str::to_string)
            .unwrap_or_else(|| token.kind.lexeme())
    }

    // ========================================================================
    // GRAMMAR RULES
    // ========================================================================

    pub(crate) fn parse_root_query(&mut self) -> Result<Query, ParseError> {
        let entity_start = self.current().span.start;
        let entity = self.parse_entity_decl()?;
        let entity_span = SourceSpan::new(entity_start, self.previous_end());

        let where_span = self.span_of_current();
        self.expect(TokenKind::Where, "Expected 'where' after entity declaration")?;

        let condition_start = self.current().span.start;
        let condition = self.parse_condition()?;
        let condition_span = SourceSpan::new(condition_start, self.previous_end());

        self.expect(TokenKind::Semicolon, "Expected ';' at end of query")?;

        Ok(Query {
            entity,
            condition,
            spans: QuerySpans {
                entity: Some(entity_span),
                where_keyword: Some(where_span),
                condition: Some(condition_span),
            },
        })
    }

    /// `EntityDecl ("where" Condition)? ";"?`
    ///
    /// The `;` is taken only when something other than end of input follows
    /// it; a `;` directly before end of input terminates the root query.
    pub(crate) fn parse_nested_query(&mut self) -> Result<Query, ParseError> {
        let entity_start = self.current().span.start;
        let entity = self.parse_entity_decl()?;
        let mut spans = QuerySpans {
            entity: Some(SourceSpan::new(entity_start, self.previous_end())),
            ..QuerySpans::default()
        };

        let condition = if self.check(&TokenKind::Where) {
            spans.where_keyword = Some(self.span_of_current());
            self.advance();
            let condition_start = self.current().span.start;
            let condition = self.parse_condition()?;
            spans.condition = Some(SourceSpan::new(condition_start, self.previous_end()));
            condition
        } else {
            Condition::placeholder(&entity)
        };

        if self.check(&TokenKind::Semicolon) && !self.peek_is(1, &TokenKind::Eof) {
            self.advance();
        }

        Ok(Query {
            entity,
            condition,
            spans,
        })
    }

    pub(crate) fn parse_entity_decl(&mut self) -> Result<EntityDecl, ParseError> {
        let node_type = self.expect_identifier("Expected node type")?;
        let alias = match &self.current().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };
        Ok(EntityDecl { node_type, alias })
    }

    pub(crate) fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error_at(
                self.pos,
                ParseErrorKind::Syntax,
                &format!("Conditions nested deeper than {} levels", MAX_NESTING_DEPTH),
            ));
        }
        self.depth += 1;
        let result = self.parse_condition_inner();
        self.depth -= 1;
        result
    }

    fn parse_condition_inner(&mut self) -> Result<Condition, ParseError> {
        match &self.current().kind {
            TokenKind::Not => {
                self.advance();
                self.expect(TokenKind::LParen, "Expected '(' after 'not'")?;
                let inner = self.parse_condition()?;
                self.expect(TokenKind::RParen, "Expected ')' to close 'not'")?;
                Ok(Condition::Not(Box::new(inner)))
            }
            TokenKind::And | TokenKind::Or => {
                let keyword_pos = self.pos;
                let is_and = self.check(&TokenKind::And);
                let name = if is_and { "and" } else { "or" };
                self.advance();
                self.expect(TokenKind::LParen, &format!("Expected '(' after '{}'", name))?;

                let mut subs = vec![self.parse_condition()?];
                while self.check(&TokenKind::Comma) {
                    self.advance();
                    subs.push(self.parse_condition()?);
                }
                self.expect(TokenKind::RParen, &format!("Expected ',' or ')' in '{}'", name))?;

                if subs.len() < 2 {
                    return Err(self.error_at(
                        keyword_pos,
                        ParseErrorKind::Syntax,
                        &format!("'{}' requires at least 2 conditions, found {}", name, subs.len()),
                    ));
                }

                Ok(if is_and {
                    Condition::And(subs)
                } else {
                    Condition::Or(subs)
                })
            }
            TokenKind::Identifier(_) => Ok(Condition::Atomic(self.parse_atomic()?)),
            _ => Err(self.error("Expected condition")),
        }
    }

    pub(crate) fn parse_atomic(&mut self) -> Result<AtomicCondition, ParseError> {
        let attribute = self.parse_attribute()?;

        let value_op = match &self.current().kind {
            TokenKind::Match => Some(ValueOp::Match),
            TokenKind::Is => Some(ValueOp::Is),
            TokenKind::EqEq => Some(ValueOp::Eq),
            TokenKind::Ne => Some(ValueOp::Ne),
            _ => None,
        };
        if let Some(operator) = value_op {
            self.advance();
            let value = self.parse_value()?;
            return Ok(AtomicCondition::Value(ValueMatch {
                attribute,
                operator,
                value,
            }));
        }

        let rel_op = match &self.current().kind {
            TokenKind::Contain => Some(RelOp::Contain),
            TokenKind::In => Some(RelOp::In),
            TokenKind::NotIn => Some(RelOp::NotIn),
            _ => None,
        };
        if let Some(operator) = rel_op {
            self.advance();
            let query = self.parse_nested_query()?;
            return Ok(AtomicCondition::Rel(RelMatch {
                attribute,
                operator,
                query: Box::new(query),
            }));
        }

        // bare attribute
        Ok(AtomicCondition::Value(ValueMatch {
            attribute,
            operator: ValueOp::Eq,
            value: "true".to_string(),
        }))
    }

    pub(crate) fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        let alias = self.expect_identifier("Expected attribute")?;
        let mut properties = Vec::new();
        while self.check(&TokenKind::Dot) {
            self.advance();
            properties.push(self.expect_identifier("Expected property name after '.'")?);
        }
        Ok(Attribute { alias, properties })
    }

    pub(crate) fn parse_value(&mut self) -> Result<String, ParseError> {
        let value = match &self.current().kind {
            TokenKind::String(raw)
            | TokenKind::Number(raw)
            | TokenKind::Boolean(raw)
            | TokenKind::Identifier(raw) => raw.clone(),
            _ => return Err(self.error("Expected value")),
        };
        self.advance();
        Ok(value)
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn peek_is(&self, offset: usize, kind: &TokenKind) -> bool {
        self.tokens
            .get(self.pos + offset)
            .map(|t| std::mem::discriminant(&t.kind) == std::mem::discriminant(kind))
            .unwrap_or(false)
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, msg: &str) -> Result<(), ParseError> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(msg))
        }
    }

    pub(crate) fn expect_identifier(&mut self, msg: &str) -> Result<String, ParseError> {
        match &self.current().kind {
            TokenKind::Identifier(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.error(msg)),
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.error_at(
                self.pos,
                ParseErrorKind::Unexpected,
                "Unexpected input after end of query",
            ))
        }
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    fn span_of_current(&self) -> SourceSpan {
        let span = self.current().span;
        SourceSpan::new(span.start, span.end)
    }

    pub(crate) fn error(&self, msg: &str) -> ParseError {
        let kind = if self.is_at_end() {
            ParseErrorKind::Unexpected
        } else {
            ParseErrorKind::Syntax
        };
        let found = self.current().kind.describe();
        self.error_at(self.pos, kind, &format!("{}, found {}", msg, found))
    }

    fn error_at(&self, index: usize, kind: ParseErrorKind, msg: &str) -> ParseError {
        let token = &self.tokens[index.min(self.tokens.len() - 1)];
        ParseError {
            kind,
            message: msg.to_string(),
            line: token.span.line,
            column: token.span.column,
            offset: token.span.start,
            token: match token.kind {
                TokenKind::Eof => String::new(),
                _ => self.source_text(token),
            },
        }
    }
}

fn ensure_eof(mut tokens: Vec<Token>) -> Vec<Token> {
    if tokens.last().map(|t| t.kind != TokenKind::Eof).unwrap_or(true) {
        let span = tokens
            .last()
            .map(|t| Span {
                start: t.span.end,
                end: t.span.end,
                line: t.span.line,
                column: t.span.column,
            })
            .unwrap_or_default();
        tokens.push(Token {
            kind: TokenKind::Eof,
            span,
        });
    }
    tokens
}
