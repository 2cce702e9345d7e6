//! Integration tests for constraint merging
//!
//! Covers the full path a caller takes: constraint text → extraction →
//! rule checks → merge → re-parse.

use kirin_dsl::kirin_core::{ConstraintSource, ConstraintType, ExtraConstraint, ParseErrorList};
use kirin_dsl::{
    escape_value, extract_constraints, merge_constraints, merge_constraints_with, parse,
    ConstraintValidator,
};
use kirin_test_utils::{assertions, fixtures};

type TestResult = Result<(), ParseErrorList>;

#[test]
fn test_extract_check_merge_pipeline() -> TestResult {
    let original = fixtures::AND_NAME_AND_ARGS;
    let text = fixtures::constraint_block(
        "Constraint 1:\n- Type: edit\n- Path: fc.name\n- Operator: ==\n- Value: \"bar\"\n- Original Value: \"foo\"\n\n\
         Constraint 2:\n- Type: add\n- Path: fc.arguments\n- Operator: contain\n- Value: literal lit2 ;\n\n\
         Constraint 3:\n- Type: add\n- Path: ghost.name\n- Operator: ==\n- Value: \"x\"",
    );

    let constraints = extract_constraints(&text, ConstraintSource::Buggy);
    assert_eq!(constraints.len(), 3);
    assert_eq!(constraints[0].constraint_type, ConstraintType::Edit);

    let report = ConstraintValidator::new().validate_all(&constraints, original);
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(report.rejected[0].index, 1);
    assert!(report.rejected[0].discard, "sub-query operators are discarded");
    assert_eq!(report.rejected[1].index, 2);
    assert!(report.rejected[1].message.starts_with("Constraint 3 (ghost.name):"));

    let accepted = report.retain_valid(&constraints);
    assert_eq!(accepted, vec![constraints[0].clone()]);

    let merged = merge_constraints(original, &accepted);
    assert_eq!(
        merged,
        "functionCall fc where and(fc.name == \"bar\", fc.arguments contain literal lit ;) ;"
    );
    parse(&merged)?;
    Ok(())
}

#[test]
fn test_delete_then_add_same_path() -> TestResult {
    let merged = merge_constraints(
        fixtures::FUNCTION_CALL_BY_NAME,
        &[
            fixtures::add_name("fc", "\"baz\""),
            fixtures::del_name("fc"),
        ],
    );
    assert_eq!(merged, "functionCall fc where fc.name == \"baz\" ;");
    Ok(())
}

#[test]
fn test_or_mode_joins_added_conditions() -> TestResult {
    let merged = merge_constraints_with(
        fixtures::FUNCTION_CALL_BY_NAME,
        &[fixtures::add_name("fc", "\"bar\"")],
        &fixtures::or_config(),
    );
    assert_eq!(
        merged,
        "functionCall fc where or(fc.name == \"foo\", fc.name == \"bar\") ;"
    );
    assertions::assert_connective_arity(&parse(&merged)?.query.condition);
    Ok(())
}

#[test]
fn test_nested_and_root_edited_together() -> TestResult {
    let merged = merge_constraints(
        fixtures::IF_CONTAINS_CALL,
        &[
            fixtures::edit_name("fc", "\"bar\""),
            ExtraConstraint::add("i.thenBlock", "contain", "returnStatement r ;"),
        ],
    );
    assert_eq!(
        merged,
        "ifBlock i where and(i.condition contain functionCall fc where fc.name == \"bar\" ;, \
         i.thenBlock contain returnStatement r ;) ;"
    );
    let reparsed = parse(&merged)?;
    assert_eq!(reparsed.all_queries().len(), 3);
    Ok(())
}

#[test]
fn test_deleting_only_condition_of_nested_query() -> TestResult {
    let merged = merge_constraints(fixtures::IF_CONTAINS_CALL, &[fixtures::del_name("fc")]);
    assert_eq!(merged, "ifBlock i where i.condition contain functionCall fc ; ;");

    let reparsed = parse(&merged)?;
    let nested = reparsed.node_by_alias("fc").expect("nested query");
    assertions::assert_placeholder(nested);
    Ok(())
}

#[test]
fn test_placeholder_replaced_by_added_condition() -> TestResult {
    let merged = merge_constraints(fixtures::PLACEHOLDER_ONLY, &[fixtures::add_name("fc", "\"x\"")]);
    assert_eq!(merged, "functionCall fc where fc.name == \"x\" ;");
    Ok(())
}

#[test]
fn test_malformed_constraints_skipped() -> TestResult {
    let merged = merge_constraints(
        fixtures::FUNCTION_CALL_BY_NAME,
        &[
            ExtraConstraint::new(ConstraintType::Add, "fc.name"),
            fixtures::add_name("fc", "\"bar\""),
        ],
    );
    assert_eq!(
        merged,
        "functionCall fc where and(fc.name == \"foo\", fc.name == \"bar\") ;"
    );
    Ok(())
}

#[test]
fn test_merge_output_is_stable() {
    let constraints = [fixtures::edit_name("fc", "\"bar\"")];
    let once = merge_constraints(fixtures::FUNCTION_CALL_BY_NAME, &constraints);
    let twice = merge_constraints(&once, &[]);
    assert_eq!(once, twice);
}

#[test]
fn test_values_that_are_not_one_literal_stay_parseable() -> TestResult {
    for raw in ["\"a\" or \"b\"", "\"a\"b\"", "\"x\\\""] {
        let merged = merge_constraints(
            fixtures::FUNCTION_CALL_BY_NAME,
            &[ExtraConstraint::add("fc.name", "!=", raw)],
        );
        let reparsed = parse(&merged)?;
        let atomics = reparsed.query.condition.atomics();
        assert_eq!(atomics.len(), 2, "ADD {} was dropped: {}", raw, merged);
        assert!(merged.contains(&escape_value(raw)), "{}", merged);
    }

    let merged = merge_constraints(
        fixtures::FUNCTION_CALL_BY_NAME,
        &[fixtures::edit_name("fc", "\"a\" \"b\"")],
    );
    assert_eq!(merged, "functionCall fc where fc.name == \"\\\"a\\\" \\\"b\\\"\" ;");
    parse(&merged)?;
    Ok(())
}

#[test]
fn test_duplicate_alias_receives_constraint_once() -> TestResult {
    let original = "functionCall fc where fc.arguments contain functionCall fc where fc.name == \"x\" ; ;";
    let merged = merge_constraints(original, &[fixtures::add_name("fc", "\"y\"")]);

    let reparsed = parse(&merged)?;
    let added = reparsed
        .all_queries()
        .iter()
        .flat_map(|q| q.condition.atomics())
        .filter(|a| a.attribute().path() == "fc.name" && a.operator_str() == "==")
        .count();
    assert_eq!(added, 2, "one original plus one added: {}", merged);

    let nested = reparsed.node_by_alias("fc").expect("nested fc");
    assert_eq!(nested.condition.atomics().len(), 2);
    Ok(())
}
