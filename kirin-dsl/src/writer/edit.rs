//! Path-addressed edits on condition trees
//!
//! Every edit consumes the tree it is given and returns a rebuilt one; callers
//! that need the old tree clone it first.

use super::render::{escape_value, is_quoted, quote, unquote};
use crate::parser::parse_nested;
use kirin_core::{
    AtomicCondition, Attribute, Condition, ExtraConstraint, RelOp, ValueMatch, ValueOp,
};

/// Selects atomic conditions by dotted path, optional operator and optional
/// original value.
struct Matcher<'a> {
    path: &'a str,
    operator: Option<&'a str>,
    original_value: Option<&'a str>,
}

impl Matcher<'_> {
    fn matches(&self, atomic: &AtomicCondition) -> bool {
        if atomic.attribute().path() != self.path {
            return false;
        }
        if let Some(op) = self.operator {
            if !atomic.operator_str().eq_ignore_ascii_case(op.trim()) {
                return false;
            }
        }
        match atomic {
            AtomicCondition::Value(vm) => value_matches(&vm.value, self.original_value),
            AtomicCondition::Rel(_) => true,
        }
    }

    fn matches_value(&self, vm: &ValueMatch) -> bool {
        vm.attribute.path() == self.path
            && self
                .operator
                .map_or(true, |op| vm.operator.as_str().eq_ignore_ascii_case(op.trim()))
            && value_matches(&vm.value, self.original_value)
    }
}

/// Does a value as written in the tree correspond to a user-supplied original value?
fn value_matches(raw: &str, original: Option<&str>) -> bool {
    let Some(original) = original.map(str::trim) else {
        return true;
    };
    raw == original || escape_value(raw) == original || unquote(raw) == unquote(original)
}

// ============================================================================
// LOOKUP
// ============================================================================

/// First atomic condition (pre-order) whose attribute path and operator match.
pub fn find_by_path<'a>(
    condition: &'a Condition,
    path: &str,
    operator: &str,
) -> Option<&'a AtomicCondition> {
    let matcher = Matcher {
        path,
        operator: Some(operator),
        original_value: None,
    };
    condition.atomics().into_iter().find(|a| matcher.matches(a))
}

// ============================================================================
// REMOVAL
// ============================================================================

/// Remove the first matching atomic condition.
///
/// `and`/`or` nodes left with one child collapse to that child; a `not` whose
/// operand disappears disappears with it. `None` means nothing is left.
pub fn remove_by_path(
    condition: Condition,
    path: &str,
    operator: Option<&str>,
    original_value: Option<&str>,
) -> Option<Condition> {
    try_remove(condition, path, operator, original_value).0
}

/// As [`remove_by_path`], also reporting whether anything matched.
pub(crate) fn try_remove(
    condition: Condition,
    path: &str,
    operator: Option<&str>,
    original_value: Option<&str>,
) -> (Option<Condition>, bool) {
    let matcher = Matcher {
        path,
        operator,
        original_value,
    };
    let mut removed = false;
    let rebuilt = remove_first(condition, &matcher, &mut removed);
    (rebuilt, removed)
}

fn remove_first(condition: Condition, matcher: &Matcher<'_>, removed: &mut bool) -> Option<Condition> {
    if *removed {
        return Some(condition);
    }
    match condition {
        Condition::Atomic(atomic) => {
            if matcher.matches(&atomic) {
                *removed = true;
                None
            } else {
                Some(Condition::Atomic(atomic))
            }
        }
        Condition::Not(inner) => {
            remove_first(*inner, matcher, removed).map(|c| Condition::Not(Box::new(c)))
        }
        Condition::And(subs) => collapse(
            subs.into_iter()
                .filter_map(|sub| remove_first(sub, matcher, removed))
                .collect(),
            Condition::And,
        ),
        Condition::Or(subs) => collapse(
            subs.into_iter()
                .filter_map(|sub| remove_first(sub, matcher, removed))
                .collect(),
            Condition::Or,
        ),
    }
}

fn collapse(mut subs: Vec<Condition>, make: fn(Vec<Condition>) -> Condition) -> Option<Condition> {
    match subs.len() {
        0 => None,
        1 => subs.pop(),
        _ => Some(make(subs)),
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// Replace the value of the first matching value condition.
///
/// When the replaced value was a quoted string and the new one is not, the new
/// value is written as a string too.
pub fn update_by_path(
    condition: Condition,
    path: &str,
    operator: Option<&str>,
    new_value: &str,
    original_value: Option<&str>,
) -> Condition {
    try_update(condition, path, operator, new_value, original_value).0
}

pub(crate) fn try_update(
    condition: Condition,
    path: &str,
    operator: Option<&str>,
    new_value: &str,
    original_value: Option<&str>,
) -> (Condition, bool) {
    let matcher = Matcher {
        path,
        operator,
        original_value,
    };
    let mut updated = false;
    let rebuilt = update_first(condition, &matcher, new_value, &mut updated);
    (rebuilt, updated)
}

fn update_first(
    condition: Condition,
    matcher: &Matcher<'_>,
    new_value: &str,
    updated: &mut bool,
) -> Condition {
    if *updated {
        return condition;
    }
    match condition {
        Condition::Atomic(AtomicCondition::Value(mut vm)) if matcher.matches_value(&vm) => {
            *updated = true;
            vm.value = carry_quoting(&vm.value, new_value.trim());
            Condition::Atomic(AtomicCondition::Value(vm))
        }
        Condition::Atomic(atomic) => Condition::Atomic(atomic),
        Condition::Not(inner) => {
            Condition::Not(Box::new(update_first(*inner, matcher, new_value, updated)))
        }
        Condition::And(subs) => Condition::And(
            subs.into_iter()
                .map(|sub| update_first(sub, matcher, new_value, updated))
                .collect(),
        ),
        Condition::Or(subs) => Condition::Or(
            subs.into_iter()
                .map(|sub| update_first(sub, matcher, new_value, updated))
                .collect(),
        ),
    }
}

fn carry_quoting(old: &str, new: &str) -> String {
    if is_quoted(old) && !is_quoted(new) {
        quote(new)
    } else {
        new.to_string()
    }
}

// ============================================================================
// ADDITION
// ============================================================================

/// Combine a new condition into an existing tree.
///
/// `None` (an empty condition, or one holding only a placeholder) yields the
/// new condition alone. A tree whose root already has the requested
/// connective gets the new condition appended; anything else is wrapped.
pub fn add_condition_to_tree(current: Option<Condition>, new: Condition, use_and: bool) -> Condition {
    match (current, use_and) {
        (None, _) => new,
        (Some(Condition::And(mut subs)), true) => {
            subs.push(new);
            Condition::And(subs)
        }
        (Some(Condition::Or(mut subs)), false) => {
            subs.push(new);
            Condition::Or(subs)
        }
        (Some(existing), true) => Condition::And(vec![existing, new]),
        (Some(existing), false) => Condition::Or(vec![existing, new]),
    }
}

/// Build the condition an ADD/EDIT constraint describes.
///
/// Sub-query operators parse the value as a nested query. Returns `None` when
/// the path, operator or value is missing or unusable.
pub fn constraint_to_condition(constraint: &ExtraConstraint) -> Option<Condition> {
    let attribute = Attribute::from_path(constraint.constraint_path.trim())?;
    let operator = constraint.operator()?;
    let value = constraint.value()?;

    let condition = if let Ok(rel) = operator.parse::<RelOp>() {
        match parse_nested(value) {
            Ok(query) => Condition::rel(attribute, rel, query),
            Err(errors) => {
                tracing::warn!(
                    path = %constraint.constraint_path,
                    %errors,
                    "Sub-query value did not parse"
                );
                return None;
            }
        }
    } else if let Ok(op) = operator.parse::<ValueOp>() {
        Condition::value(attribute, op, value)
    } else {
        tracing::warn!(operator, "Unknown operator in constraint");
        return None;
    };

    Some(if constraint.is_negative {
        Condition::negate(condition)
    } else {
        condition
    })
}
