//! Constraint merge
//!
//! Constraints are grouped by the query their leading alias resolves to. When
//! an alias is declared more than once the last declaration (pre-order) is the
//! target. Each query in the tree is rebuilt once: its nested queries first,
//! then its own group (DEL, then EDIT, then ADD). A condition whose rendered
//! text would not parse back is never written.

use super::edit::{add_condition_to_tree, constraint_to_condition, try_remove, try_update};
use super::render::{render, render_condition};
use crate::parser::{parse, parse_condition};
use kirin_core::{
    AtomicCondition, Condition, ConstraintType, ExtraConstraint, KirinConfig, Query, RelMatch,
};
use std::collections::HashMap;

#[derive(Debug, Default)]
struct AliasGroup<'c> {
    del: Vec<&'c ExtraConstraint>,
    edit: Vec<&'c ExtraConstraint>,
    add: Vec<&'c ExtraConstraint>,
}

/// Merge constraints into `original` with the default configuration.
pub fn merge_constraints(original: &str, constraints: &[ExtraConstraint]) -> String {
    merge_constraints_with(original, constraints, &KirinConfig::default())
}

/// Merge constraints into `original`, returning the rendered result.
///
/// Never fails: if `original` does not parse, or no constraint targets a
/// declared alias, `original` comes back unchanged. Constraints that cannot be
/// applied are logged and skipped.
pub fn merge_constraints_with(
    original: &str,
    constraints: &[ExtraConstraint],
    config: &KirinConfig,
) -> String {
    if constraints.is_empty() {
        return original.to_string();
    }

    let parsed = match parse(original) {
        Ok(parsed) => parsed,
        Err(errors) => {
            tracing::error!(%errors, "Original DSL does not parse, returning it unchanged");
            return original.to_string();
        }
    };

    let groups = {
        let aliases = parsed.alias_map();
        let queries = parsed.all_queries();
        let mut groups: HashMap<usize, AliasGroup<'_>> = HashMap::new();
        for constraint in constraints {
            let alias = constraint.leading_alias();
            if alias.is_empty() {
                tracing::warn!(path = %constraint.constraint_path, "Constraint has no alias, skipping");
                continue;
            }
            let Some(target) = aliases
                .get(alias)
                .and_then(|query| queries.iter().position(|q| std::ptr::eq(*q, query)))
            else {
                tracing::warn!(alias, "Constraint targets an undeclared alias, skipping");
                continue;
            };
            let group = groups.entry(target).or_default();
            match constraint.constraint_type {
                ConstraintType::Del => group.del.push(constraint),
                ConstraintType::Edit => group.edit.push(constraint),
                ConstraintType::Add => group.add.push(constraint),
            }
        }
        groups
    };

    if groups.is_empty() {
        return original.to_string();
    }

    let merged = rebuild_query(parsed.into_query(), &groups, config, &mut 0);
    let rendered = render(&merged, false);
    tracing::info!(constraints = constraints.len(), "Merged constraints into DSL");
    rendered
}

/// `next` is the pre-order index of `query` among all queries of the tree.
fn rebuild_query(
    query: Query,
    groups: &HashMap<usize, AliasGroup<'_>>,
    config: &KirinConfig,
    next: &mut usize,
) -> Query {
    let index = *next;
    *next += 1;

    let Query {
        entity,
        condition,
        spans,
    } = query;

    let condition = rebuild_nested(condition, groups, config, next);
    let condition = match groups.get(&index) {
        Some(group) => apply_group(&entity, condition, group, config),
        None => condition,
    };

    Query {
        condition,
        entity,
        spans,
    }
}

fn rebuild_nested(
    condition: Condition,
    groups: &HashMap<usize, AliasGroup<'_>>,
    config: &KirinConfig,
    next: &mut usize,
) -> Condition {
    match condition {
        Condition::Atomic(AtomicCondition::Rel(RelMatch {
            attribute,
            operator,
            query,
        })) => Condition::Atomic(AtomicCondition::Rel(RelMatch {
            attribute,
            operator,
            query: Box::new(rebuild_query(*query, groups, config, next)),
        })),
        Condition::Atomic(atomic) => Condition::Atomic(atomic),
        Condition::Not(inner) => {
            Condition::Not(Box::new(rebuild_nested(*inner, groups, config, next)))
        }
        Condition::And(subs) => Condition::And(
            subs.into_iter()
                .map(|sub| rebuild_nested(sub, groups, config, next))
                .collect(),
        ),
        Condition::Or(subs) => Condition::Or(
            subs.into_iter()
                .map(|sub| rebuild_nested(sub, groups, config, next))
                .collect(),
        ),
    }
}

/// Whether `condition` renders to text the parser reads back.
fn renders_cleanly(condition: &Condition) -> bool {
    parse_condition(&render_condition(condition)).is_ok()
}

fn apply_group(
    entity: &kirin_core::EntityDecl,
    mut condition: Condition,
    group: &AliasGroup<'_>,
    config: &KirinConfig,
) -> Condition {
    let alias = entity.reference_name();
    let placeholder = Condition::placeholder(entity);

    for del in &group.del {
        let path = del.constraint_path.trim();
        let (rest, removed) = try_remove(condition, path, del.operator(), del.original_value.as_deref());
        if !removed {
            tracing::warn!(alias, path, "DEL matched no condition");
        }
        condition = rest.unwrap_or_else(|| {
            tracing::warn!(alias, "All conditions removed, substituting placeholder");
            placeholder.clone()
        });
    }

    for edit in &group.edit {
        let path = edit.constraint_path.trim();
        let Some(new_value) = edit.value() else {
            tracing::warn!(alias, path, "EDIT has no value, skipping");
            continue;
        };
        let before = condition.clone();
        let (rest, updated) = try_update(
            condition,
            path,
            edit.operator(),
            new_value,
            edit.original_value.as_deref(),
        );
        if !updated {
            tracing::warn!(alias, path, "EDIT matched no condition");
        }
        condition = if renders_cleanly(&rest) {
            rest
        } else {
            tracing::warn!(alias, path, "EDIT would not render as valid DSL, skipping");
            before
        };
    }

    for add in &group.add {
        let Some(new) = constraint_to_condition(add) else {
            tracing::warn!(alias, path = %add.constraint_path, "ADD could not be converted, skipping");
            continue;
        };
        if !renders_cleanly(&new) {
            tracing::warn!(alias, path = %add.constraint_path, "ADD would not render as valid DSL, skipping");
            continue;
        }
        let existing = if condition == placeholder {
            None
        } else {
            Some(condition)
        };
        condition = add_condition_to_tree(existing, new, config.combine.use_and());
    }

    condition
}
