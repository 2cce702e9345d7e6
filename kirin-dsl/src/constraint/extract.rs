//! Constraint extraction from free-form text
//!
//! Reads blocks such as
//!
//! ```text
//! [CONSTRAINTS]
//! Constraint 1:
//! - Type: edit
//! - Path: fc.name
//! - Operator: ==
//! - Value: "new"
//! - Original Value: "old"
//! [/CONSTRAINTS]
//! ```
//!
//! Extraction never fails; malformed blocks are logged and skipped.

use kirin_core::{ConstraintSource, ConstraintType, ExtraConstraint, KirinConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static CONSTRAINTS_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\[CONSTRAINTS\](.*?)\[/CONSTRAINTS\]").expect("static regex"));

static CONSTRAINT_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Constraint\s+\d+\s*:").expect("static regex"));

static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("static regex"));

static LIST_ITEM_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*-\s*(Type|Path)\s*[:|\-]").expect("static regex"));

static FIELD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*-?\s*(Type|Path|Operator|Original\s+Value|Value|Is\s+Negative)\s*[:\-]\s*(.*)$")
        .expect("static regex")
});

static TRAILING_FIELD_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(Type|Path|Operator|Value|Original\s+Value|Is\s+Negative)\s*:?\s*$")
        .expect("static regex")
});

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*").expect("static regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Extract constraints with the default configuration.
pub fn extract_constraints(text: &str, source: ConstraintSource) -> Vec<ExtraConstraint> {
    extract_constraints_with(text, source, &KirinConfig::default())
}

/// Extract constraints from `text`.
///
/// Only the `[CONSTRAINTS] ... [/CONSTRAINTS]` section is read when one is
/// present. Constraints without an explicit `Is Negative` field are negative
/// when `source` is [`ConstraintSource::Fp`].
pub fn extract_constraints_with(
    text: &str,
    source: ConstraintSource,
    config: &KirinConfig,
) -> Vec<ExtraConstraint> {
    let body = CONSTRAINTS_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
        .trim();

    if body.is_empty() {
        tracing::debug!("Empty constraints block");
        return Vec::new();
    }

    let constraints: Vec<ExtraConstraint> = split_blocks(body)
        .iter()
        .enumerate()
        .filter_map(|(i, block)| parse_block(block, i + 1, source))
        .collect();

    if constraints.is_empty() {
        tracing::warn!("No valid constraints extracted");
        return constraints;
    }

    if config.dedupe_constraints {
        dedupe(constraints)
    } else {
        constraints
    }
}

fn split_blocks(body: &str) -> Vec<String> {
    let by_header: Vec<&str> = CONSTRAINT_HEADER.split(body).collect();
    if by_header.len() > 1 {
        return by_header.into_iter().map(str::to_string).collect();
    }

    let by_blank: Vec<&str> = BLANK_LINE.split(body).collect();
    if by_blank.len() > 1 {
        return by_blank.into_iter().map(str::to_string).collect();
    }

    // a list item opens a new block once the current one already has its field
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut seen: Vec<Field> = Vec::new();
    for line in body.lines() {
        if let Some(field) = field_of(line) {
            if LIST_ITEM_START.is_match(line) && seen.contains(&field) {
                blocks.push(current.join("\n"));
                current.clear();
                seen.clear();
            }
            seen.push(field);
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}

// ============================================================================
// FIELDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Type,
    Path,
    Operator,
    Value,
    OriginalValue,
    IsNegative,
}

impl Field {
    fn from_name(name: &str) -> Self {
        let name = WHITESPACE.replace_all(name, " ").to_ascii_lowercase();
        match name.as_str() {
            "type" => Field::Type,
            "path" => Field::Path,
            "operator" => Field::Operator,
            "original value" => Field::OriginalValue,
            "is negative" => Field::IsNegative,
            _ => Field::Value,
        }
    }
}

fn field_of(line: &str) -> Option<Field> {
    FIELD_LINE.captures(line).map(|caps| Field::from_name(&caps[1]))
}

#[derive(Debug, Default)]
struct RawFields {
    kind: Option<String>,
    path: Option<String>,
    operator: Option<String>,
    value: Option<String>,
    original_value: Option<String>,
    is_negative: Option<String>,
}

impl RawFields {
    /// The first occurrence of a field wins; lines that are not field lines
    /// continue the previous field.
    fn read(block: &str) -> Self {
        let mut fields = RawFields::default();
        let mut last: Option<Field> = None;

        for line in block.lines() {
            if let Some(caps) = FIELD_LINE.captures(line) {
                let field = Field::from_name(&caps[1]);
                let slot = fields.slot(field);
                if slot.is_none() {
                    *slot = Some(caps[2].to_string());
                    last = Some(field);
                } else {
                    last = None;
                }
            } else if let Some(field) = last {
                if !line.trim().is_empty() {
                    if let Some(existing) = fields.slot(field) {
                        existing.push('\n');
                        existing.push_str(line);
                    }
                }
            }
        }

        fields
    }

    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Type => &mut self.kind,
            Field::Path => &mut self.path,
            Field::Operator => &mut self.operator,
            Field::Value => &mut self.value,
            Field::OriginalValue => &mut self.original_value,
            Field::IsNegative => &mut self.is_negative,
        }
    }
}

fn clean(raw: Option<&String>) -> Option<String> {
    let raw = raw?.trim();
    let cleaned = TRAILING_FIELD_NAME.replace(raw, "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn normalize_value(value: &str) -> String {
    if value.contains(';') {
        LINE_BREAK.replace_all(value, " ").into_owned()
    } else {
        WHITESPACE.replace_all(value, " ").into_owned()
    }
}

fn parse_type(raw: &str, index: usize) -> ConstraintType {
    match raw.trim().to_ascii_lowercase().as_str() {
        "add" | "a" => ConstraintType::Add,
        "edit" | "e" | "modify" | "update" => ConstraintType::Edit,
        "del" | "delete" | "remove" | "d" => ConstraintType::Del,
        other => {
            tracing::warn!(index, kind = other, "Unknown constraint type, treating as add");
            ConstraintType::Add
        }
    }
}

fn parse_block(block: &str, index: usize, source: ConstraintSource) -> Option<ExtraConstraint> {
    if block.trim().is_empty() {
        return None;
    }
    let fields = RawFields::read(block);

    let Some(kind) = clean(fields.kind.as_ref()) else {
        tracing::debug!(index, "Block has no Type field, skipping");
        return None;
    };
    let constraint_type = parse_type(&kind, index);

    let Some(path) = clean(fields.path.as_ref()) else {
        tracing::warn!(index, "Constraint has no Path field, skipping");
        return None;
    };
    let path = path.trim_end_matches('.').trim().to_string();
    if path.is_empty() {
        tracing::warn!(index, "Constraint path is empty, skipping");
        return None;
    }
    if !path.contains('.') {
        tracing::debug!(index, path = %path, "Path targets the node itself");
    }

    let operator = clean(fields.operator.as_ref());
    let value = clean(fields.value.as_ref()).map(|v| normalize_value(&v));

    let mut constraint = ExtraConstraint::new(constraint_type, path).with_source(source);
    match constraint_type {
        ConstraintType::Add | ConstraintType::Edit => {
            let (Some(operator), Some(value)) = (operator, value) else {
                tracing::warn!(index, kind = %constraint_type, "Constraint needs both Operator and Value, skipping");
                return None;
            };
            constraint = constraint.with_operator(operator).with_value(value);
            if constraint_type == ConstraintType::Edit {
                constraint.original_value = clean(fields.original_value.as_ref());
            }
        }
        ConstraintType::Del => {
            constraint.operator = operator;
            constraint.original_value = clean(fields.original_value.as_ref()).or(value);
        }
    }

    constraint.is_negative = match clean(fields.is_negative.as_ref()) {
        Some(flag) => matches!(flag.to_ascii_lowercase().as_str(), "yes" | "true" | "y" | "1"),
        None => source == ConstraintSource::Fp,
    };

    Some(constraint)
}

/// Drop exact repeats, then keep only the first constraint per (path, type).
fn dedupe(constraints: Vec<ExtraConstraint>) -> Vec<ExtraConstraint> {
    let total = constraints.len();
    let mut exact = HashSet::new();
    let mut by_path_type = HashSet::new();
    let mut kept = Vec::with_capacity(total);

    for constraint in constraints {
        let exact_key = (
            constraint.constraint_path.clone(),
            constraint.constraint_type,
            constraint.operator.clone(),
            constraint.value.clone(),
        );
        if !exact.insert(exact_key) {
            tracing::debug!(path = %constraint.constraint_path, "Removed duplicate constraint");
            continue;
        }
        if !by_path_type.insert((constraint.constraint_path.clone(), constraint.constraint_type)) {
            tracing::warn!(
                path = %constraint.constraint_path,
                kind = %constraint.constraint_type,
                "Several constraints for one path, keeping the first"
            );
            continue;
        }
        kept.push(constraint);
    }

    if kept.len() < total {
        tracing::info!(removed = total - kept.len(), "Deduplicated constraints");
    }
    kept
}
