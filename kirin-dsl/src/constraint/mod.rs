//! Constraint checking and extraction
//!
//! [`ConstraintValidator`] decides whether an [`ExtraConstraint`] can be
//! merged into a given DSL; [`extract_constraints`] builds constraints from
//! structured text.
//!
//! [`ExtraConstraint`]: kirin_core::ExtraConstraint

pub mod extract;
pub mod rules;

pub use extract::{extract_constraints, extract_constraints_with};
pub use rules::{
    AliasExistsRule, AstConversionRule, ConstraintReport, ConstraintRule, ConstraintValidator,
    ConstraintVerdict, DslSemanticRule, DslSyntaxRule, NoSubQueryOperatorRule, PathFormatRule,
    RejectedConstraint, RuleContext,
};

use kirin_core::ExtraConstraint;

/// Serialize constraints as a pretty JSON array, each entry numbered from 1.
pub fn constraints_to_json(constraints: &[ExtraConstraint]) -> serde_json::Result<String> {
    let entries: Vec<serde_json::Value> = constraints
        .iter()
        .enumerate()
        .map(|(i, c)| {
            serde_json::json!({
                "index": i + 1,
                "type": c.constraint_type,
                "path": c.constraint_path,
                "operator": c.operator,
                "value": c.value,
                "is_negative": c.is_negative,
                "original_value": c.original_value,
            })
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}
