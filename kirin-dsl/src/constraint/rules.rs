//! Constraint validation rule chain

use crate::fix_suggester::generate_fix_message;
use crate::parser::{parse, parse_condition, ParsedDsl};
use crate::validator::Validator;
use crate::writer::{constraint_to_condition, render_condition};
use kirin_core::{
    Condition, ConstraintType, ExtraConstraint, KirinConfig, RelOp, ValidationError,
    ValidationErrorType, ValidationResult,
};
use serde::Serialize;

/// Outcome of running the rule chain on one constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintVerdict {
    pub result: ValidationResult,
    /// The constraint cannot be repaired and should be dropped, not retried.
    pub discard: bool,
}

impl ConstraintVerdict {
    pub fn accept() -> Self {
        Self {
            result: ValidationResult::valid(),
            discard: false,
        }
    }

    pub fn reject(error: ValidationError) -> Self {
        Self {
            result: ValidationResult::invalid(error),
            discard: false,
        }
    }

    pub fn discard(error: ValidationError) -> Self {
        Self {
            result: ValidationResult::invalid(error),
            discard: true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.result.is_valid
    }
}

/// State shared along the chain for one constraint.
pub struct RuleContext<'a> {
    /// The DSL the constraint edits, if it parsed.
    pub original: Option<&'a ParsedDsl>,
    pub config: &'a KirinConfig,
    /// Set by [`AstConversionRule`].
    pub condition: Option<Condition>,
    /// Set by [`DslSyntaxRule`].
    pub reparsed: Option<Condition>,
}

/// One link of the chain. `Err` stops the chain with that verdict.
pub trait ConstraintRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, constraint: &ExtraConstraint, ctx: &mut RuleContext<'_>) -> Result<(), ConstraintVerdict>;
}

// ============================================================================
// SYNTACTIC RULES
// ============================================================================

pub struct PathFormatRule;

impl ConstraintRule for PathFormatRule {
    fn name(&self) -> &'static str {
        "path_format"
    }

    fn check(&self, constraint: &ExtraConstraint, _ctx: &mut RuleContext<'_>) -> Result<(), ConstraintVerdict> {
        if constraint.constraint_path.trim().is_empty() {
            return Err(ConstraintVerdict::reject(ValidationError::new(
                ValidationErrorType::MissingAlias,
                "constraint_path is empty",
            )));
        }
        if constraint.leading_alias().is_empty() {
            return Err(ConstraintVerdict::reject(ValidationError::new(
                ValidationErrorType::MissingAlias,
                "Invalid constraint_path format: must be 'alias' or 'alias.property'",
            )));
        }
        Ok(())
    }
}

pub struct AliasExistsRule;

impl ConstraintRule for AliasExistsRule {
    fn name(&self) -> &'static str {
        "alias_exists"
    }

    fn check(&self, constraint: &ExtraConstraint, ctx: &mut RuleContext<'_>) -> Result<(), ConstraintVerdict> {
        let Some(original) = ctx.original else {
            return Err(ConstraintVerdict::reject(ValidationError::new(
                ValidationErrorType::InvalidNodeType,
                "Failed to parse original DSL",
            )));
        };

        let aliases = original.alias_map();
        let alias = constraint.leading_alias();
        if aliases.contains(alias) {
            return Ok(());
        }

        let available = aliases.aliases();
        let suggestion = if available.is_empty() {
            "No aliases found".to_string()
        } else {
            format!("Available aliases: {}", available.join(", "))
        };
        Err(ConstraintVerdict::reject(
            ValidationError::new(
                ValidationErrorType::MissingAlias,
                format!("Alias '{}' is not defined in original DSL", alias),
            )
            .with_suggestion(suggestion),
        ))
    }
}

/// Constraints may only touch existing nodes; `contain`/`in`/`notIn` would
/// declare new ones.
pub struct NoSubQueryOperatorRule;

impl ConstraintRule for NoSubQueryOperatorRule {
    fn name(&self) -> &'static str {
        "no_sub_query_operator"
    }

    fn check(&self, constraint: &ExtraConstraint, ctx: &mut RuleContext<'_>) -> Result<(), ConstraintVerdict> {
        let Some(operator) = constraint.operator() else {
            return Ok(());
        };
        if operator.parse::<RelOp>().is_err() {
            return Ok(());
        }

        let available = ctx
            .original
            .map(|parsed| parsed.alias_map().aliases().join(", "))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "none".to_string());
        Err(ConstraintVerdict::discard(
            ValidationError::new(
                ValidationErrorType::InvalidValueForProperty,
                format!(
                    "Operator '{}' creates sub-queries and is not allowed in constraints",
                    operator
                ),
            )
            .with_suggestion(format!(
                "To add constraints to existing nodes, use:\n- Path: <alias>.property (e.g., node_1.name)\n- Operator: ==, !=, match, is\n- Available aliases: {}",
                available
            )),
        ))
    }
}

// ============================================================================
// SEMANTIC RULES
// ============================================================================
//
// DEL constraints carry no condition to build, so these rules pass them.

pub struct AstConversionRule;

impl ConstraintRule for AstConversionRule {
    fn name(&self) -> &'static str {
        "ast_conversion"
    }

    fn check(&self, constraint: &ExtraConstraint, ctx: &mut RuleContext<'_>) -> Result<(), ConstraintVerdict> {
        if constraint.constraint_type == ConstraintType::Del {
            return Ok(());
        }
        match constraint_to_condition(constraint) {
            Some(condition) => {
                ctx.condition = Some(condition);
                Ok(())
            }
            None => Err(ConstraintVerdict::reject(
                ValidationError::new(
                    ValidationErrorType::InvalidValueForProperty,
                    "Failed to convert constraint to Condition AST",
                )
                .with_suggestion("Check that operator and value are compatible"),
            )),
        }
    }
}

pub struct DslSyntaxRule;

impl ConstraintRule for DslSyntaxRule {
    fn name(&self) -> &'static str {
        "dsl_syntax"
    }

    fn check(&self, _constraint: &ExtraConstraint, ctx: &mut RuleContext<'_>) -> Result<(), ConstraintVerdict> {
        let Some(condition) = &ctx.condition else {
            return Ok(());
        };
        let text = render_condition(condition);
        match parse_condition(&text) {
            Ok(reparsed) => {
                ctx.reparsed = Some(reparsed);
                Ok(())
            }
            Err(errors) => Err(ConstraintVerdict::reject(ValidationError::new(
                ValidationErrorType::InvalidValueForProperty,
                format!("Syntax error in generated DSL: {}", errors),
            ))),
        }
    }
}

pub struct DslSemanticRule;

impl ConstraintRule for DslSemanticRule {
    fn name(&self) -> &'static str {
        "dsl_semantic"
    }

    fn check(&self, _constraint: &ExtraConstraint, ctx: &mut RuleContext<'_>) -> Result<(), ConstraintVerdict> {
        let (Some(condition), Some(original)) = (&ctx.reparsed, ctx.original) else {
            return Ok(());
        };
        let aliases = original.alias_map();
        let result = Validator::with_config(ctx.config).validate_condition(condition, &aliases);
        if result.is_valid {
            Ok(())
        } else {
            Err(ConstraintVerdict {
                result,
                discard: false,
            })
        }
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// Runs the rule chain in order; the first failing rule decides.
pub struct ConstraintValidator {
    rules: Vec<Box<dyn ConstraintRule>>,
    config: KirinConfig,
}

impl Default for ConstraintValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintValidator {
    pub fn new() -> Self {
        Self::with_config(&KirinConfig::default())
    }

    pub fn with_config(config: &KirinConfig) -> Self {
        Self {
            rules: vec![
                Box::new(PathFormatRule),
                Box::new(AliasExistsRule),
                Box::new(NoSubQueryOperatorRule),
                Box::new(AstConversionRule),
                Box::new(DslSyntaxRule),
                Box::new(DslSemanticRule),
            ],
            config: config.clone(),
        }
    }

    /// Names of the rules, in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(&self, constraint: &ExtraConstraint, original_dsl: &str) -> ConstraintVerdict {
        let parsed = parse(original_dsl).ok();
        self.validate_parsed(constraint, parsed.as_ref())
    }

    fn validate_parsed(&self, constraint: &ExtraConstraint, original: Option<&ParsedDsl>) -> ConstraintVerdict {
        let mut ctx = RuleContext {
            original,
            config: &self.config,
            condition: None,
            reparsed: None,
        };
        for rule in &self.rules {
            if let Err(verdict) = rule.check(constraint, &mut ctx) {
                tracing::debug!(
                    rule = rule.name(),
                    path = %constraint.constraint_path,
                    discard = verdict.discard,
                    "Constraint rejected"
                );
                return verdict;
            }
        }
        ConstraintVerdict::accept()
    }

    /// Validate every constraint against the same original DSL.
    pub fn validate_all(&self, constraints: &[ExtraConstraint], original_dsl: &str) -> ConstraintReport {
        let parsed = parse(original_dsl).ok();
        let rejected = constraints
            .iter()
            .enumerate()
            .filter_map(|(index, constraint)| {
                let verdict = self.validate_parsed(constraint, parsed.as_ref());
                if verdict.is_valid() {
                    return None;
                }
                let message = verdict
                    .result
                    .errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                let fix = generate_fix_message(&verdict.result.errors);
                Some(RejectedConstraint {
                    index,
                    message: format!(
                        "Constraint {} ({}): {}",
                        index + 1,
                        constraint.constraint_path,
                        message
                    ),
                    fix: (!fix.is_empty()).then_some(fix),
                    discard: verdict.discard,
                })
            })
            .collect();
        ConstraintReport { rejected }
    }
}

/// Constraints that failed validation, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConstraintReport {
    pub rejected: Vec<RejectedConstraint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedConstraint {
    /// Zero-based position in the input list.
    pub index: usize,
    pub message: String,
    pub fix: Option<String>,
    pub discard: bool,
}

impl ConstraintReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Keep the constraints that passed.
    pub fn retain_valid(&self, constraints: &[ExtraConstraint]) -> Vec<ExtraConstraint> {
        constraints
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.rejected.iter().any(|r| r.index == *i))
            .map(|(_, c)| c.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGINAL: &str = "binaryOperation b where b.lhs contain literal lit ;";

    fn first_error(verdict: &ConstraintVerdict) -> &ValidationError {
        verdict.result.errors.first().expect("an error")
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(
            ConstraintValidator::new().rule_names(),
            vec![
                "path_format",
                "alias_exists",
                "no_sub_query_operator",
                "ast_conversion",
                "dsl_syntax",
                "dsl_semantic"
            ]
        );
    }

    #[test]
    fn test_valid_constraint_accepted() {
        let verdict = ConstraintValidator::new()
            .validate(&ExtraConstraint::add("b.rhs", "is", "literal"), ORIGINAL);
        assert!(verdict.is_valid(), "{:?}", verdict);
        assert!(!verdict.discard);
    }

    #[test]
    fn test_empty_path() {
        let verdict = ConstraintValidator::new().validate(&ExtraConstraint::add("  ", "==", "1"), ORIGINAL);
        assert_eq!(first_error(&verdict).message, "constraint_path is empty");
        assert_eq!(first_error(&verdict).error_type, ValidationErrorType::MissingAlias);
    }

    #[test]
    fn test_empty_alias_segment() {
        let verdict = ConstraintValidator::new().validate(&ExtraConstraint::add(".name", "==", "1"), ORIGINAL);
        assert!(first_error(&verdict).message.starts_with("Invalid constraint_path format"));
    }

    #[test]
    fn test_unparseable_original() {
        let verdict = ConstraintValidator::new()
            .validate(&ExtraConstraint::add("b.rhs", "is", "literal"), "binaryOperation b where");
        assert_eq!(first_error(&verdict).message, "Failed to parse original DSL");
        assert_eq!(first_error(&verdict).error_type, ValidationErrorType::InvalidNodeType);
    }

    #[test]
    fn test_unknown_alias_lists_available() {
        let verdict = ConstraintValidator::new().validate(&ExtraConstraint::add("zz.name", "==", "1"), ORIGINAL);
        let error = first_error(&verdict);
        assert_eq!(error.message, "Alias 'zz' is not defined in original DSL");
        assert_eq!(error.suggestion.as_deref(), Some("Available aliases: b, lit"));
    }

    #[test]
    fn test_sub_query_operator_discarded() {
        let verdict = ConstraintValidator::new()
            .validate(&ExtraConstraint::add("b.rhs", "contain", "literal x"), ORIGINAL);
        assert!(verdict.discard);
        let error = first_error(&verdict);
        assert_eq!(
            error.message,
            "Operator 'contain' creates sub-queries and is not allowed in constraints"
        );
        assert!(error.suggestion.as_deref().unwrap_or_default().ends_with("Available aliases: b, lit"));
    }

    #[test]
    fn test_conversion_failure() {
        let verdict = ConstraintValidator::new().validate(&ExtraConstraint::add("b.rhs", "~", "x"), ORIGINAL);
        assert_eq!(first_error(&verdict).message, "Failed to convert constraint to Condition AST");
    }

    #[test]
    fn test_semantic_failure_carries_validator_errors() {
        let verdict = ConstraintValidator::new()
            .validate(&ExtraConstraint::add("b.operator", "is", "instanceof"), ORIGINAL);
        assert!(!verdict.discard);
        let error = first_error(&verdict);
        assert_eq!(error.error_type, ValidationErrorType::UnsupportedPropertyPath);
        assert_eq!(error.suggestion.as_deref(), Some("b is instanceofExpression"));
    }

    #[test]
    fn test_del_skips_condition_rules() {
        let verdict = ConstraintValidator::new()
            .validate(&ExtraConstraint::del("b.lhs", "contain", None), ORIGINAL);
        // contain is still refused for DEL
        assert!(verdict.discard);

        let verdict = ConstraintValidator::new().validate(&ExtraConstraint::del("b.rhs", "==", None), ORIGINAL);
        assert!(verdict.is_valid());
    }

    #[test]
    fn test_validate_all_report() {
        let constraints = vec![
            ExtraConstraint::add("b.rhs", "is", "literal"),
            ExtraConstraint::add("zz.name", "==", "1"),
            ExtraConstraint::add("b.operator", "is", "instanceof"),
        ];
        let report = ConstraintValidator::new().validate_all(&constraints, ORIGINAL);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].index, 1);
        assert!(report.rejected[0]
            .message
            .starts_with("Constraint 2 (zz.name): Alias 'zz' is not defined"));
        assert!(report.rejected[1]
            .fix
            .as_deref()
            .unwrap_or_default()
            .starts_with("DSL Validation Errors Found:"));
        assert_eq!(report.retain_valid(&constraints), vec![constraints[0].clone()]);
    }
}
