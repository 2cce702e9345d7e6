//! Parser module for the kirin DSL

pub mod parser;

pub use parser::*;

use kirin_core::{AliasMap, Condition, ParseErrorList, Query};

/// A successfully parsed root query plus the indices callers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDsl {
    pub query: Query,
}

impl ParsedDsl {
    /// Alias → declaring query over the root and every nested query.
    pub fn alias_map(&self) -> AliasMap<'_> {
        AliasMap::build(&self.query)
    }

    pub fn node_by_alias(&self, alias: &str) -> Option<&Query> {
        self.alias_map().get(alias)
    }

    /// Root query followed by every nested query, pre-order.
    pub fn all_queries(&self) -> Vec<&Query> {
        self.query.queries()
    }

    pub fn into_query(self) -> Query {
        self.query
    }
}

/// Parse DSL source into a root query.
pub fn parse(source: &str) -> Result<ParsedDsl, ParseErrorList> {
    let query = Parser::from_source(source).parse()?;
    Ok(ParsedDsl { query })
}

/// Parse a standalone condition, e.g. `and(fc.name == "x", fc.arguments)`.
pub fn parse_condition(source: &str) -> Result<Condition, ParseErrorList> {
    Parser::from_source(source).parse_condition_only()
}

/// Parse a sub-query as written after `contain`/`in`/`notIn`.
pub fn parse_nested(source: &str) -> Result<Query, ParseErrorList> {
    Parser::from_source(source).parse_nested_only()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kirin_core::{AtomicCondition, ParseErrorKind, RelOp, ValueOp};

    fn value_match(condition: &Condition) -> &kirin_core::ValueMatch {
        match condition {
            Condition::Atomic(AtomicCondition::Value(vm)) => vm,
            other => panic!("expected value match, got {:?}", other),
        }
    }

    fn assert_parse_error(source: &str) -> ParseErrorList {
        match parse(source) {
            Ok(parsed) => panic!("expected parse failure for {:?}, got {:?}", source, parsed),
            Err(errors) => {
                assert!(!errors.is_empty());
                errors
            }
        }
    }

    #[test]
    fn test_parse_simple_query() -> Result<(), ParseErrorList> {
        let parsed = parse("functionCall fc where fc.name == \"test\" ;")?;
        assert_eq!(parsed.query.entity.node_type, "functionCall");
        assert_eq!(parsed.query.alias(), Some("fc"));

        let vm = value_match(&parsed.query.condition);
        assert_eq!(vm.attribute.alias, "fc");
        assert_eq!(vm.attribute.properties, vec!["name"]);
        assert_eq!(vm.operator, ValueOp::Eq);
        assert_eq!(vm.value, "\"test\"");
        Ok(())
    }

    #[test]
    fn test_parse_entity_without_alias() -> Result<(), ParseErrorList> {
        let parsed = parse("ifBlock where ifBlock.condition is binaryOperation ;")?;
        assert_eq!(parsed.query.entity.alias, None);
        assert!(parsed.alias_map().is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_bare_attribute_is_true() -> Result<(), ParseErrorList> {
        let parsed = parse("fieldAccess fa where fa.base ;")?;
        let vm = value_match(&parsed.query.condition);
        assert_eq!(vm.operator, ValueOp::Eq);
        assert_eq!(vm.value, "true");
        Ok(())
    }

    #[test]
    fn test_parse_boolean_connectives() -> Result<(), ParseErrorList> {
        let parsed = parse(
            "functionCall fc where and(fc.name match \"get.*\", or(fc.a == 1, fc.b != 2.5e3), not(fc.c)) ;",
        )?;
        match &parsed.query.condition {
            Condition::And(subs) => {
                assert_eq!(subs.len(), 3);
                assert!(matches!(&subs[1], Condition::Or(inner) if inner.len() == 2));
                assert!(matches!(&subs[2], Condition::Not(_)));
            }
            other => panic!("expected and, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_parse_nested_query_registers_alias() -> Result<(), ParseErrorList> {
        let parsed = parse(
            "functionCall fc where fc.arguments contain literal lit where lit.value == 1 ; ;",
        )?;
        let nested = parsed.node_by_alias("lit").expect("lit registered");
        assert_eq!(nested.entity.node_type, "literal");
        assert_eq!(parsed.all_queries().len(), 2);
        assert_eq!(parsed.alias_map().aliases(), vec!["fc", "lit"]);
        Ok(())
    }

    #[test]
    fn test_nested_semicolon_optional() -> Result<(), ParseErrorList> {
        let with = parse("functionCall fc where fc.arguments contain literal lit where lit.value == 1 ; ;")?;
        let without = parse("functionCall fc where fc.arguments contain literal lit where lit.value == 1 ;")?;
        assert_eq!(with, without);
        Ok(())
    }

    #[test]
    fn test_nested_query_without_where_gets_placeholder() -> Result<(), ParseErrorList> {
        let parsed = parse("functionCall fc where and(fc.arguments in literal lit, fc.name == \"x\") ;")?;
        let lit = parsed.node_by_alias("lit").expect("lit registered");
        let vm = value_match(&lit.condition);
        assert_eq!(vm.attribute.alias, "lit");
        assert_eq!(vm.operator, ValueOp::Is);
        assert_eq!(vm.value, "literal");
        Ok(())
    }

    #[test]
    fn test_parse_not_in_operator() -> Result<(), ParseErrorList> {
        let parsed = parse("literal lit where lit notIn functionCall fc ;")?;
        match &parsed.query.condition {
            Condition::Atomic(AtomicCondition::Rel(rel)) => assert_eq!(rel.operator, RelOp::NotIn),
            other => panic!("expected rel match, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_keywords_case_insensitive() -> Result<(), ParseErrorList> {
        let lower = parse("functionCall fc where and(fc.a is literal, not(fc.b)) ;")?;
        let upper = parse("functionCall fc WHERE AND(fc.a IS literal, NOT(fc.b)) ;")?;
        assert_eq!(lower, upper);
        Ok(())
    }

    #[test]
    fn test_query_spans() -> Result<(), ParseErrorList> {
        let source = "functionCall fc where fc.name == \"x\" ;";
        let parsed = parse(source)?;
        let spans = &parsed.query.spans;
        let entity = spans.entity.expect("entity span");
        let condition = spans.condition.expect("condition span");
        assert_eq!(&source[entity.start..entity.end], "functionCall fc");
        assert_eq!(&source[condition.start..condition.end], "fc.name == \"x\"");
        assert_eq!(spans.where_keyword.map(|s| &source[s.start..s.end]), Some("where"));
        Ok(())
    }

    #[test]
    fn test_missing_semicolon_fails() {
        let errors = assert_parse_error("functionCall fc where fc.name == \"test\"");
        let first = errors.first().expect("one error");
        assert_eq!(first.kind, ParseErrorKind::Unexpected);
        assert!(first.message.contains("';'"));
        assert_eq!(first.line, 1);
    }

    #[test]
    fn test_missing_alias_before_property_fails() {
        let errors = assert_parse_error("functionCall where .name == \"test\" ;");
        let first = errors.first().expect("one error");
        assert_eq!(first.kind, ParseErrorKind::Syntax);
        assert_eq!(first.column, 20);
        assert_eq!(first.offset, 19);
        assert_eq!(first.token, ".");
    }

    #[test]
    fn test_single_child_and_is_rejected() {
        let errors = assert_parse_error("functionCall fc where and(fc.name == \"a\") ;");
        let first = errors.first().expect("one error");
        assert!(first.message.contains("at least 2"));
        assert_eq!(first.token, "and");
    }

    #[test]
    fn test_trailing_input_rejected() {
        let errors = assert_parse_error("functionCall fc where fc.a ; extra");
        assert_eq!(errors.first().map(|e| e.kind), Some(ParseErrorKind::Unexpected));
    }

    #[test]
    fn test_lexical_errors_all_reported() {
        let errors = assert_parse_error("functionCall fc where fc.a = 1 and fc.b = \"x ;");
        assert!(errors.len() >= 2);
        assert!(errors.iter().all(|e| e.kind == ParseErrorKind::Lexical));
        assert_eq!(errors.first().map(|e| e.token.as_str()), Some("="));
    }

    #[test]
    fn test_error_position_on_later_line() {
        let errors = assert_parse_error("functionCall fc\nwhere\n  fc.name ==  ;");
        let first = errors.first().expect("one error");
        assert_eq!(first.line, 3);
        assert_eq!(first.column, 15);
    }

    #[test]
    fn test_parse_condition_standalone() -> Result<(), ParseErrorList> {
        let condition = parse_condition("and(fc.name == \"x\", fc.arguments contain literal lit)")?;
        assert!(matches!(condition, Condition::And(ref subs) if subs.len() == 2));
        assert!(parse_condition("fc.name == \"x\" ;").is_ok());
        assert!(parse_condition("fc.name == ").is_err());
        Ok(())
    }

    #[test]
    fn test_boolean_keeps_lexeme() -> Result<(), ParseErrorList> {
        let parsed = parse("literal lit where lit.value == FALSE ;")?;
        assert_eq!(value_match(&parsed.query.condition).value, "FALSE");
        Ok(())
    }

    fn nested_nots(depth: usize) -> String {
        format!(
            "fieldAccess fa where {}fa.base{} ;",
            "not(".repeat(depth),
            ")".repeat(depth)
        )
    }

    #[test]
    fn test_nesting_within_limit() -> Result<(), ParseErrorList> {
        parse(&nested_nots(MAX_NESTING_DEPTH - 1))?;
        Ok(())
    }

    #[test]
    fn test_deep_nesting_fails_with_position() {
        let source = nested_nots(5_000);
        let errors = assert_parse_error(&source);
        let first = errors.first().expect("one error");
        assert_eq!(first.kind, ParseErrorKind::Syntax);
        assert!(first.message.contains("nested deeper"), "message: {}", first.message);
        assert_eq!(first.offset, "fieldAccess fa where ".len() + 4 * MAX_NESTING_DEPTH);
    }

    #[test]
    fn test_deep_sub_queries_fail() {
        let source = format!(
            "functionCall fc where {}fc.name ;",
            "fc.arguments contain functionCall fc where ".repeat(1_000)
        );
        let errors = assert_parse_error(&source);
        assert!(errors.iter().any(|e| e.message.contains("nested deeper")));
    }

    #[test]
    fn test_parse_nested_standalone() -> Result<(), ParseErrorList> {
        let query = parse_nested("literal lit where lit.value == 1 ;")?;
        assert_eq!(query.alias(), Some("lit"));
        let bare = parse_nested("literal lit")?;
        assert_eq!(bare.condition, Condition::placeholder(&bare.entity));
        Ok(())
    }
}
