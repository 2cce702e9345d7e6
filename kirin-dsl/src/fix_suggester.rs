//! Replacement proposals for validation errors

use crate::writer::render::unquote;
use kirin_core::metadata::value_hint;
use kirin_core::{AtomicCondition, Query, ValidationError, ValidationErrorType};

/// Propose a replacement condition for `error`, if one can be derived.
///
/// Unsupported `operator` paths become a node-type check on the same alias,
/// e.g. `b.operator is instanceof` → `b is instanceofExpression`. Nested
/// queries are searched after their parent, in pre-order.
pub fn suggest_fix(error: &ValidationError, query: &Query) -> Option<String> {
    match error.error_type {
        ValidationErrorType::UnsupportedPropertyPath => {
            error.suggestion.as_ref()?;
            let atomic = query
                .queries()
                .into_iter()
                .flat_map(|q| q.condition.atomics())
                .find(|a| a.attribute().first_property() == Some("operator"))?;
            match atomic {
                AtomicCondition::Value(vm) => value_hint("operator", unquote(&vm.value))
                    .map(|node_type| format!("{} is {}", vm.attribute.alias, node_type)),
                AtomicCondition::Rel(_) => None,
            }
        }
        ValidationErrorType::InvalidValueForProperty => error.suggestion.clone(),
        _ => None,
    }
}

/// Format errors for a human or a model to act on. Empty for no errors.
pub fn generate_fix_message(errors: &[ValidationError]) -> String {
    if errors.is_empty() {
        return String::new();
    }

    let mut lines = vec!["DSL Validation Errors Found:\n".to_string()];
    for (i, error) in errors.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, error.message));
        if let Some(suggestion) = &error.suggestion {
            lines.push(format!("   Suggestion: {}", suggestion));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::validator::validate;
    use kirin_core::ParseErrorList;

    #[test]
    fn test_suggest_fix_for_operator_path() -> Result<(), ParseErrorList> {
        let parsed = parse("binaryOperation b where b.operator is instanceof ;")?;
        let result = validate(&parsed.query);
        let fix = suggest_fix(&result.errors[0], &parsed.query);
        assert_eq!(fix.as_deref(), Some("b is instanceofExpression"));
        Ok(())
    }

    #[test]
    fn test_suggest_fix_searches_nested_queries() -> Result<(), ParseErrorList> {
        let parsed = parse(
            "ifBlock i where i.condition contain binaryOperation b where b.operator == \"instanceof\" ; ;",
        )?;
        let result = validate(&parsed.query);
        let error = result
            .errors_of(ValidationErrorType::UnsupportedPropertyPath)
            .next()
            .expect("unsupported path");
        assert_eq!(
            suggest_fix(error, &parsed.query).as_deref(),
            Some("b is instanceofExpression")
        );
        Ok(())
    }

    #[test]
    fn test_no_fix_for_unknown_operator_value() -> Result<(), ParseErrorList> {
        let parsed = parse("binaryOperation b where b.operator == plus ;")?;
        let result = validate(&parsed.query);
        assert_eq!(suggest_fix(&result.errors[0], &parsed.query), None);
        Ok(())
    }

    #[test]
    fn test_invalid_value_uses_own_suggestion() -> Result<(), ParseErrorList> {
        let parsed = parse("fieldAccess fa where fa.operator == instanceof ;")?;
        let error = ValidationError::new(ValidationErrorType::InvalidValueForProperty, "bad value")
            .with_suggestion("fa is instanceofExpression");
        assert_eq!(
            suggest_fix(&error, &parsed.query).as_deref(),
            Some("fa is instanceofExpression")
        );
        Ok(())
    }

    #[test]
    fn test_other_errors_have_no_fix() -> Result<(), ParseErrorList> {
        let parsed = parse("functionCall fc where x.name == 1 ;")?;
        let result = validate(&parsed.query);
        assert_eq!(result.errors[0].error_type, ValidationErrorType::MissingAlias);
        assert_eq!(suggest_fix(&result.errors[0], &parsed.query), None);
        Ok(())
    }

    #[test]
    fn test_generate_fix_message() {
        assert_eq!(generate_fix_message(&[]), "");

        let errors = vec![
            ValidationError::new(ValidationErrorType::MissingAlias, "Alias 'x' is not defined")
                .with_suggestion("Declare x"),
            ValidationError::new(ValidationErrorType::InvalidNodeType, "Invalid node type: foo"),
        ];
        assert_eq!(
            generate_fix_message(&errors),
            "DSL Validation Errors Found:\n\n1. Alias 'x' is not defined\n   Suggestion: Declare x\n\n2. Invalid node type: foo\n"
        );
    }
}
