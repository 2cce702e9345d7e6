//! KIRIN Test Utilities
//!
//! Shared test infrastructure for the kirin workspace:
//! - Proptest generators for queries, conditions and constraints
//! - Fixtures for the common DSL scenarios
//! - Assertions for tree shape and validation outcomes

// Re-export core types for convenience
pub use kirin_core::{
    AtomicCondition, Attribute, CombineMode, Condition, ConstraintSource, ConstraintType,
    EntityDecl, ExtraConstraint, KirinConfig, ParseErrorKind, ParseErrorList, Query, RelMatch,
    RelOp, ValidationError, ValidationErrorType, ValidationResult, ValueMatch, ValueOp,
};

/// Identifier-shaped words the lexer turns into keywords or booleans.
pub const RESERVED_WORDS: &[&str] = &[
    "where", "not", "and", "or", "match", "is", "contain", "in", "notin", "true", "false",
];

/// Whether `word` would lex as a keyword rather than an identifier.
pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.iter().any(|r| r.eq_ignore_ascii_case(word))
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for kirin AST values.
    //!
    //! Everything generated here renders to DSL text that re-parses to the
    //! same tree: identifiers avoid keywords, values are valid literals, and
    //! `and`/`or` always carry at least two children.

    use super::*;
    use kirin_core::metadata::{VALID_NODE_TYPES, VALID_PROPERTIES};
    use proptest::prelude::*;

    // === Names ===

    /// An identifier that lexes as `Identifier`, never as a keyword.
    pub fn arb_identifier() -> impl Strategy<Value = String> {
        "[a-z][a-zA-Z0-9_]{0,7}".prop_filter("reserved word", |s| !is_reserved(s))
    }

    pub fn arb_node_type() -> impl Strategy<Value = String> {
        prop::sample::select(VALID_NODE_TYPES).prop_map(str::to_string)
    }

    pub fn arb_property() -> impl Strategy<Value = String> {
        prop_oneof![
            3 => prop::sample::select(VALID_PROPERTIES).prop_map(str::to_string),
            1 => arb_identifier(),
        ]
    }

    /// An attribute on `alias` with zero to two properties.
    pub fn arb_attribute(alias: String) -> impl Strategy<Value = Attribute> {
        prop::collection::vec(arb_property(), 0..3)
            .prop_map(move |properties| Attribute::new(alias.clone(), properties))
    }

    // === Values and operators ===

    /// A value in the lexical form the parser stores.
    pub fn arb_value() -> impl Strategy<Value = String> {
        prop_oneof![
            any::<bool>().prop_map(|b| b.to_string()),
            any::<i64>().prop_map(|n| n.to_string()),
            (0u32..1000, 0u32..100).prop_map(|(i, f)| format!("{}.{}", i, f)),
            "[a-zA-Z0-9 _.]{0,12}".prop_map(|s| format!("\"{}\"", s)),
            arb_identifier(),
        ]
    }

    pub fn arb_value_op() -> impl Strategy<Value = ValueOp> {
        prop::sample::select(ValueOp::ALL.to_vec())
    }

    pub fn arb_rel_op() -> impl Strategy<Value = RelOp> {
        prop::sample::select(RelOp::ALL.to_vec())
    }

    // === Conditions and queries ===

    /// An atomic condition on `alias`. Relational matches (with a nested
    /// query) are only generated while `depth > 0`.
    pub fn arb_atomic(alias: String, depth: u32) -> BoxedStrategy<Condition> {
        let value = (arb_attribute(alias.clone()), arb_value_op(), arb_value())
            .prop_map(|(attribute, operator, value)| Condition::value(attribute, operator, value));
        if depth == 0 {
            return value.boxed();
        }

        let rel = (arb_attribute(alias), arb_rel_op(), arb_query_with_depth(depth - 1))
            .prop_map(|(attribute, operator, query)| Condition::rel(attribute, operator, query));
        prop_oneof![3 => value, 1 => rel].boxed()
    }

    /// A condition tree over `alias`; `and`/`or` hold two or three children.
    pub fn arb_condition(alias: String, depth: u32) -> BoxedStrategy<Condition> {
        arb_atomic(alias, depth)
            .prop_recursive(3, 12, 3, |inner| {
                prop_oneof![
                    inner.clone().prop_map(Condition::negate),
                    prop::collection::vec(inner.clone(), 2..4).prop_map(Condition::And),
                    prop::collection::vec(inner, 2..4).prop_map(Condition::Or),
                ]
            })
            .boxed()
    }

    /// An aliased query nesting at most `depth` levels of sub-queries.
    pub fn arb_query_with_depth(depth: u32) -> BoxedStrategy<Query> {
        (arb_node_type(), arb_identifier())
            .prop_flat_map(move |(node_type, alias)| {
                let entity = EntityDecl::aliased(node_type, alias.clone());
                arb_condition(alias, depth).prop_map(move |condition| Query::new(entity.clone(), condition))
            })
            .boxed()
    }

    pub fn arb_query() -> BoxedStrategy<Query> {
        arb_query_with_depth(1)
    }

    /// A query whose every alias is distinct, so alias lookups are unambiguous.
    pub fn arb_query_unique_aliases() -> impl Strategy<Value = Query> {
        arb_query().prop_filter("duplicate alias", |query| {
            let mut seen = std::collections::HashSet::new();
            query
                .queries()
                .into_iter()
                .filter_map(Query::alias)
                .all(|alias| seen.insert(alias.to_string()))
        })
    }

    /// An ADD constraint with a value comparison on `alias`.
    pub fn arb_add_constraint(alias: String) -> impl Strategy<Value = ExtraConstraint> {
        (arb_attribute(alias), arb_value_op(), arb_value(), any::<bool>()).prop_map(
            |(attribute, operator, value, negative)| {
                let constraint = ExtraConstraint::add(attribute.path(), operator.as_str(), value);
                if negative {
                    constraint.negated()
                } else {
                    constraint
                }
            },
        )
    }

    pub fn arb_combine_mode() -> impl Strategy<Value = CombineMode> {
        prop_oneof![Just(CombineMode::And), Just(CombineMode::Or)]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! DSL sources and constraints for the common scenarios.

    use super::*;

    /// Calls named `foo`.
    pub const FUNCTION_CALL_BY_NAME: &str = "functionCall fc where fc.name == \"foo\" ;";

    /// A valid query with a nested `contain` sub-query.
    pub const IF_CONTAINS_CALL: &str =
        "ifBlock i where i.condition contain functionCall fc where fc.name == \"foo\" ; ;";

    /// Uses the unsupported `binaryOperation.operator` path.
    pub const BINARY_OPERATOR_INSTANCEOF: &str = "binaryOperation b where b.operator == \"instanceof\" ;";

    /// Refers to an alias that is never declared.
    pub const MISSING_ALIAS: &str = "functionCall fc where x.name == \"foo\" ;";

    /// Declares a node type that does not exist.
    pub const INVALID_NODE_TYPE: &str = "notARealNode n where n.name == \"foo\" ;";

    /// Two conditions under `and`.
    pub const AND_NAME_AND_ARGS: &str =
        "functionCall fc where and(fc.name == \"foo\", fc.arguments contain literal lit ;) ;";

    /// Only the placeholder condition.
    pub const PLACEHOLDER_ONLY: &str = "functionCall fc where fc is functionCall ;";

    /// The same alias declared twice.
    pub const DUPLICATE_ALIAS: &str =
        "functionCall fc where fc.arguments contain functionCall fc where fc.name == \"x\" ; ;";

    pub fn default_config() -> KirinConfig {
        KirinConfig::default()
    }

    pub fn or_config() -> KirinConfig {
        KirinConfig {
            combine: CombineMode::Or,
            ..KirinConfig::default()
        }
    }

    pub fn add_name(alias: &str, value: &str) -> ExtraConstraint {
        ExtraConstraint::add(format!("{}.name", alias), "==", value)
    }

    pub fn del_name(alias: &str) -> ExtraConstraint {
        ExtraConstraint::del(format!("{}.name", alias), "==", None)
    }

    pub fn edit_name(alias: &str, new_value: &str) -> ExtraConstraint {
        ExtraConstraint::edit(format!("{}.name", alias), "==", new_value, None)
    }

    /// A `[CONSTRAINTS]` block in the numbered-header layout.
    pub fn constraint_block(body: &str) -> String {
        format!("Some analysis first.\n[CONSTRAINTS]\n{}\n[/CONSTRAINTS]\nTrailing notes.", body)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over kirin trees and results.

    use super::*;

    /// Assert that a validation result has no errors.
    #[track_caller]
    pub fn assert_valid(result: &ValidationResult) {
        assert!(
            result.is_valid && result.errors.is_empty(),
            "Expected valid result, got errors: {:?}",
            result.errors
        );
    }

    /// Assert that a validation result carries an error of `error_type`.
    #[track_caller]
    pub fn assert_has_error(result: &ValidationResult, error_type: ValidationErrorType) {
        assert!(!result.is_valid, "Expected invalid result, got valid");
        assert!(
            result.has_error(error_type),
            "Expected {} error, got: {:?}",
            error_type.as_str(),
            result.errors
        );
    }

    /// Assert that a parse failed with a first error of `kind`.
    #[track_caller]
    pub fn assert_parse_error<T: std::fmt::Debug>(result: &Result<T, ParseErrorList>, kind: ParseErrorKind) {
        match result {
            Err(errors) => {
                let first = errors.first().map(|e| e.kind);
                assert_eq!(first, Some(kind), "Wrong parse error kind: {}", errors);
            }
            Ok(value) => panic!("Expected parse error, got: {:?}", value),
        }
    }

    /// Assert that every `and`/`or` in the tree, nested queries included,
    /// has at least two children.
    #[track_caller]
    pub fn assert_connective_arity(condition: &Condition) {
        match condition {
            Condition::And(subs) | Condition::Or(subs) => {
                assert!(subs.len() >= 2, "Connective with {} child(ren): {:?}", subs.len(), condition);
                subs.iter().for_each(assert_connective_arity);
            }
            Condition::Not(inner) => assert_connective_arity(inner),
            Condition::Atomic(AtomicCondition::Rel(rel)) => assert_connective_arity(&rel.query.condition),
            Condition::Atomic(AtomicCondition::Value(_)) => {}
        }
    }

    /// Assert that the query's condition is its `alias is NodeType` placeholder.
    #[track_caller]
    pub fn assert_placeholder(query: &Query) {
        assert_eq!(
            query.condition,
            Condition::placeholder(&query.entity),
            "Expected placeholder condition"
        );
    }
}
