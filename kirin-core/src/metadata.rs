//! Node and property metadata for semantic validation
//!
//! Mirrors the node/role mapping of the analysis engine that evaluates kirin
//! queries. The tables are known to be incomplete, so callers treat unknown
//! properties as warnings rather than errors.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Node types the engine can match.
pub static VALID_NODE_TYPES: &[&str] = &[
    "binaryOperation",
    "unaryOperation",
    "valueDeclaration",
    "thisExpression",
    "throwStatement",
    "tryWithResources",
    "tryBlock",
    "switchBlock",
    "synchronizedBlock",
    "ternaryOperation",
    "thisCall",
    "returnStatement",
    "superCall",
    "nullLiteral",
    "objectCreationExpression",
    "lambdaExpression",
    "literal",
    "methodReferenceExpression",
    "forBlock",
    "functionCall",
    "functionDeclaration",
    "ifBlock",
    "initArrayExpression",
    "instanceofExpression",
    "doWhileBlock",
    "exceptionBlock",
    "fieldAccess",
    "forEachBlock",
    "finallyBlock",
    "defaultStatement",
    "continueStatement",
    "catchBlock",
    "castExpression",
    "assertStatement",
    "caseStatement",
    "breakStatement",
    "anonymousInnerClassExpression",
    "arrayCreationExpression",
    "arrayAccess",
    "annotation",
    "annoMember",
    "whileBlock",
];

/// Property (role) names accepted on any node type.
pub static VALID_PROPERTIES: &[&str] = &[
    "body",
    "arguments",
    "type",
    "condition",
    "returnValue",
    "operand",
    "lhs",
    "rhs",
    "name",
    "value",
    "parameters",
    "base",
    "baseType",
    "castType",
    "arrayIndex",
    "dimensions",
    "initArray",
    "elements",
    "thenBlock",
    "elseBlock",
    "thenExpression",
    "elseExpression",
    "tryBlock",
    "catchBlocks",
    "finallyBlock",
    "tryResources",
    "forInit",
    "initialization",
    "iteration",
    "forIter",
    "switchSelector",
    "selector",
    "caseExpression",
    "variable",
    "iterable",
    "forEachVariable",
    "forEachIterable",
    "lock",
    "exceptionTypes",
    "throwExceptionTypes",
    "annotations",
    "annoValue",
    "annoMembers",
    "anonymousClassBody",
    "generics",
    "initializer",
    "variableInit",
    "message",
    "assertMessage",
    "primitiveTypeCode",
];

/// How a property is reached from its owning node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleAction {
    /// Several child nodes; query with `contain`/`in`, never `.`-access.
    Collection,
    /// A statement list; query with `contain`.
    Body,
    /// A single child node; `.`-access is allowed.
    Child,
    /// A plain value compared directly.
    Simple,
}

impl RoleAction {
    /// Whether sub-properties can be reached with `.` through this role.
    pub fn allows_dot_access(&self) -> bool {
        matches!(self, RoleAction::Child | RoleAction::Simple)
    }
}

pub static PROPERTY_ROLE_ACTIONS: &[(&str, RoleAction)] = &[
    ("arguments", RoleAction::Collection),
    ("parameters", RoleAction::Collection),
    ("dimensions", RoleAction::Collection),
    ("elements", RoleAction::Collection),
    ("generics", RoleAction::Collection),
    ("throwExceptionTypes", RoleAction::Collection),
    ("body", RoleAction::Body),
    ("thenBlock", RoleAction::Body),
    ("elseBlock", RoleAction::Body),
    ("tryBlock", RoleAction::Body),
    ("catchBlocks", RoleAction::Body),
    ("finallyBlock", RoleAction::Body),
    ("tryResources", RoleAction::Body),
    ("annoMembers", RoleAction::Body),
    ("annotations", RoleAction::Body),
    ("anonymousClassBody", RoleAction::Body),
    ("type", RoleAction::Child),
    ("condition", RoleAction::Child),
    ("returnValue", RoleAction::Child),
    ("operand", RoleAction::Child),
    ("lhs", RoleAction::Child),
    ("rhs", RoleAction::Child),
    ("base", RoleAction::Child),
    ("baseType", RoleAction::Child),
    ("castType", RoleAction::Child),
    ("arrayIndex", RoleAction::Child),
    ("initArray", RoleAction::Child),
    ("thenExpression", RoleAction::Child),
    ("elseExpression", RoleAction::Child),
    ("forInit", RoleAction::Child),
    ("forIter", RoleAction::Child),
    ("switchSelector", RoleAction::Child),
    ("caseExpression", RoleAction::Child),
    ("forEachVariable", RoleAction::Child),
    ("forEachIterable", RoleAction::Child),
    ("lock", RoleAction::Child),
    ("annoValue", RoleAction::Child),
    ("variableInit", RoleAction::Child),
    ("assertMessage", RoleAction::Child),
    ("value", RoleAction::Simple),
    ("primitiveTypeCode", RoleAction::Simple),
];

/// Known properties per node type. Not exhaustive.
pub static NODE_TYPE_TO_PROPERTIES: &[(&str, &[&str])] = &[
    // operator maps to a skipped role on binaryOperation
    ("binaryOperation", &["lhs", "rhs"]),
    ("unaryOperation", &["operand"]),
    ("valueDeclaration", &["type", "initializer"]),
    (
        "functionDeclaration",
        &["returnType", "parameters", "body", "exceptionTypes"],
    ),
    ("functionCall", &["arguments"]),
    ("ifBlock", &["condition", "thenBlock", "elseBlock"]),
    ("whileBlock", &["condition", "body"]),
    (
        "forBlock",
        &["initialization", "condition", "iteration", "body"],
    ),
    ("forEachBlock", &["variable", "iterable", "body"]),
    ("switchBlock", &["selector", "body"]),
    ("caseStatement", &["caseExpression"]),
    ("tryBlock", &["tryBlock", "catchBlocks", "finallyBlock"]),
    ("exceptionBlock", &["tryBlock", "catchBlocks", "finallyBlock"]),
    ("catchBlock", &["parameters", "body"]),
    ("throwStatement", &["operand"]),
    ("returnStatement", &["returnValue"]),
    ("arrayAccess", &["base", "arrayIndex"]),
    ("arrayCreationExpression", &["dimensions", "initArray"]),
    ("initArrayExpression", &["elements"]),
    ("castExpression", &["castType", "operand"]),
    ("fieldAccess", &["base"]),
    ("objectCreationExpression", &["type", "arguments"]),
    (
        "ternaryOperation",
        &["condition", "thenExpression", "elseExpression"],
    ),
    // rhs is the checked type here
    ("instanceofExpression", &["lhs", "rhs"]),
    ("annotation", &["annoValue", "annoMembers"]),
    ("literal", &["value"]),
    ("lambdaExpression", &["parameters", "body"]),
];

/// (node type, property) pairs the engine cannot evaluate.
pub static UNSUPPORTED_PROPERTY_PATHS: &[(&str, &str)] = &[
    ("binaryOperation", "operator"),
    ("unaryOperation", "operator"),
    ("postfixOperation", "operator"),
    ("prefixOperation", "operator"),
];

/// property → (literal value → node type that should be checked instead).
pub static PROPERTY_VALUE_TYPE_HINTS: &[(&str, &[(&str, &str)])] =
    &[("operator", &[("instanceof", "instanceofExpression")])];

/// Operator spellings that correspond to a dedicated node type.
pub static OPERATOR_TO_NODE_TYPE: &[(&str, &str)] = &[("instanceof", "instanceofExpression")];

// ============================================================================
// INDICES
// ============================================================================

static NODE_TYPE_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| VALID_NODE_TYPES.iter().copied().collect());

static SORTED_NODE_TYPES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut types = VALID_NODE_TYPES.to_vec();
    types.sort_unstable();
    types
});

static PROPERTY_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| VALID_PROPERTIES.iter().copied().collect());

static PROPERTIES_BY_NODE: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| NODE_TYPE_TO_PROPERTIES.iter().copied().collect());

static ROLE_BY_PROPERTY: Lazy<HashMap<&'static str, RoleAction>> =
    Lazy::new(|| PROPERTY_ROLE_ACTIONS.iter().copied().collect());

pub fn is_valid_node_type(node_type: &str) -> bool {
    NODE_TYPE_SET.contains(node_type)
}

/// All valid node types, sorted.
pub fn sorted_node_types() -> &'static [&'static str] {
    &SORTED_NODE_TYPES
}

pub fn is_valid_property(property: &str) -> bool {
    PROPERTY_SET.contains(property)
}

/// Known properties of `node_type`, if the table lists it.
pub fn properties_for(node_type: &str) -> Option<&'static [&'static str]> {
    PROPERTIES_BY_NODE.get(node_type).copied()
}

pub fn role_action(property: &str) -> Option<RoleAction> {
    ROLE_BY_PROPERTY.get(property).copied()
}

pub fn is_unsupported_path(node_type: &str, property: &str) -> bool {
    UNSUPPORTED_PROPERTY_PATHS
        .iter()
        .any(|(n, p)| *n == node_type && *p == property)
}

pub fn has_value_hints(property: &str) -> bool {
    PROPERTY_VALUE_TYPE_HINTS.iter().any(|(p, _)| *p == property)
}

/// The node type that should replace `property <op> value`, if any.
pub fn value_hint(property: &str, value: &str) -> Option<&'static str> {
    PROPERTY_VALUE_TYPE_HINTS
        .iter()
        .find(|(p, _)| *p == property)
        .and_then(|(_, hints)| hints.iter().find(|(v, _)| *v == value))
        .map(|(_, node_type)| *node_type)
}

pub fn operator_node_type(operator: &str) -> Option<&'static str> {
    OPERATOR_TO_NODE_TYPE
        .iter()
        .find(|(op, _)| *op == operator)
        .map(|(_, node_type)| *node_type)
}
