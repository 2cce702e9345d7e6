//! Canonical DSL rendering

use crate::lexer::{keyword, Lexer, Token, TokenKind};
use kirin_core::{AtomicCondition, Attribute, Condition, Query};

/// Render a query as DSL text.
///
/// Every query ends in ` ;`, nested ones included, so the output re-parses to
/// the same tree. A nested query whose condition is only its placeholder
/// (`alias is NodeType`) is written without a `where` clause.
pub fn render(query: &Query, is_nested: bool) -> String {
    let mut out = query.entity.node_type.clone();
    if let Some(alias) = &query.entity.alias {
        out.push(' ');
        out.push_str(alias);
    }

    let placeholder_only = is_nested && query.condition == Condition::placeholder(&query.entity);
    if !placeholder_only {
        out.push_str(" where ");
        out.push_str(&render_condition(&query.condition));
    }

    out.push_str(" ;");
    out
}

pub fn render_condition(condition: &Condition) -> String {
    match condition {
        Condition::Atomic(atomic) => render_atomic(atomic),
        Condition::Not(inner) => format!("not({})", render_condition(inner)),
        Condition::And(subs) => format!("and({})", join_conditions(subs)),
        Condition::Or(subs) => format!("or({})", join_conditions(subs)),
    }
}

fn join_conditions(subs: &[Condition]) -> String {
    subs.iter()
        .map(render_condition)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_atomic(atomic: &AtomicCondition) -> String {
    match atomic {
        AtomicCondition::Value(vm) => format!(
            "{} {} {}",
            render_attribute(&vm.attribute),
            vm.operator,
            escape_value(&vm.value)
        ),
        AtomicCondition::Rel(rm) => format!(
            "{} {} {}",
            render_attribute(&rm.attribute),
            rm.operator,
            render(&rm.query, true)
        ),
    }
}

pub fn render_attribute(attribute: &Attribute) -> String {
    attribute.path()
}

// ============================================================================
// VALUE LITERALS
// ============================================================================

/// Make a raw value safe to emit as a DSL value token.
///
/// A value that already lexes as exactly one string, boolean, number or
/// identifier token passes through unchanged. Anything else becomes a
/// double-quoted string with `\`, quotes and control characters escaped.
pub fn escape_value(value: &str) -> String {
    if is_quoted(value) || is_boolean(value) || is_numeric(value) || is_identifier(value) {
        return value.to_string();
    }
    quote(value)
}

/// Wrap `value` in double quotes, escaping as the lexer expects.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Strip one layer of matching surrounding quotes, if present.
pub fn unquote(value: &str) -> &str {
    if is_quoted(value) {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Whether `value` is one complete string literal and nothing else.
pub fn is_quoted(value: &str) -> bool {
    if !value.starts_with(['"', '\'']) {
        return false;
    }
    match Lexer::new(value).tokenize().as_slice() {
        [Token {
            kind: TokenKind::String(_),
            span,
        }, Token {
            kind: TokenKind::Eof,
            ..
        }] => span.start == 0 && span.end == value.len(),
        _ => false,
    }
}

fn is_boolean(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
}

/// `-?digits(.digits)?([eE][+-]?digits)?`, the lexer's number shape.
fn is_numeric(value: &str) -> bool {
    fn digits(s: &str) -> usize {
        s.bytes().take_while(u8::is_ascii_digit).count()
    }

    let rest = value.strip_prefix('-').unwrap_or(value);
    let int_len = digits(rest);
    if int_len == 0 {
        return false;
    }
    let mut rest = &rest[int_len..];

    if let Some(frac) = rest.strip_prefix('.') {
        let frac_len = digits(frac);
        if frac_len == 0 {
            return false;
        }
        rest = &frac[frac_len..];
    }

    if let Some(exp) = rest.strip_prefix(['e', 'E']) {
        let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        let exp_len = digits(exp);
        if exp_len == 0 {
            return false;
        }
        rest = &exp[exp_len..];
    }

    rest.is_empty()
}

/// An identifier the lexer will not read as a keyword.
fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let starts_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !matches!(keyword(value), Some(kind) if !matches!(kind, TokenKind::Boolean(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_escape_value_passthrough() {
        assert_eq!(escape_value("\"quoted\""), "\"quoted\"");
        assert_eq!(escape_value("'single'"), "'single'");
        assert_eq!(escape_value("true"), "true");
        assert_eq!(escape_value("FALSE"), "FALSE");
        assert_eq!(escape_value("42"), "42");
        assert_eq!(escape_value("-3.5e2"), "-3.5e2");
        assert_eq!(escape_value("instanceofExpression"), "instanceofExpression");
        assert_eq!(escape_value("_tmp1"), "_tmp1");
    }

    #[test]
    fn test_escape_value_quotes_everything_else() {
        assert_eq!(escape_value("hello world"), "\"hello world\"");
        assert_eq!(escape_value("a\"b"), "\"a\\\"b\"");
        assert_eq!(escape_value("back\\slash"), "\"back\\\\slash\"");
        assert_eq!(escape_value("it's"), "\"it\\'s\"");
        assert_eq!(escape_value(""), "\"\"");
        assert_eq!(escape_value("1.2.3"), "\"1.2.3\"");
        assert_eq!(escape_value("\""), "\"\\\"\"");
    }

    #[test]
    fn test_broken_literals_are_quoted() {
        for raw in ["\"a\" or \"b\"", "\"a\"b\"", "\"x\\\"", "\"a\" \"b\"", "\"a\" // c", " \"a\""] {
            assert!(!is_quoted(raw), "{} is not one literal", raw);
            assert_eq!(escape_value(raw), quote(raw));
            assert_eq!(unquote(raw), raw);
        }
        assert_eq!(escape_value("\"a\" or \"b\""), "\"\\\"a\\\" or \\\"b\\\"\"");
    }

    #[test]
    fn test_keywords_are_quoted() {
        assert_eq!(escape_value("where"), "\"where\"");
        assert_eq!(escape_value("notIn"), "\"notIn\"");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("abc"), "abc");
        assert_eq!(unquote("\"abc'"), "\"abc'");
    }

    #[test]
    fn test_render_simple_query() {
        let parsed = parse("functionCall   fc WHERE fc.name==\"test\";").unwrap();
        assert_eq!(render(&parsed.query, false), "functionCall fc where fc.name == \"test\" ;");
    }

    #[test]
    fn test_render_connectives_and_nesting() {
        let source = "functionCall fc where and(not(fc.name match \"get.*\"), or(fc.arguments contain literal lit where lit.value == 1 ;, fc.x)) ;";
        let parsed = parse(source).unwrap();
        assert_eq!(
            render(&parsed.query, false),
            "functionCall fc where and(not(fc.name match \"get.*\"), or(fc.arguments contain literal lit where lit.value == 1 ;, fc.x == true)) ;"
        );
    }

    #[test]
    fn test_render_nested_placeholder_compact() {
        let parsed = parse("functionCall fc where fc.arguments contain literal lit ;").unwrap();
        let rendered = render(&parsed.query, false);
        assert_eq!(rendered, "functionCall fc where fc.arguments contain literal lit ; ;");
        assert_eq!(parse(&rendered).unwrap(), parsed);
    }
}
