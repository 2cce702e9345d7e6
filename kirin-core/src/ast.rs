//! Query AST for the kirin DSL
//!
//! Pure data. Behaviour (parsing, validation, rendering, editing) lives in
//! `kirin-dsl`; the helpers here are limited to construction and traversal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SOURCE POSITIONS
// ============================================================================

/// Byte range in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where the pieces of a query sit in the text it was parsed from.
///
/// Synthesized queries (placeholders, constraint sub-queries) carry no spans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpans {
    pub entity: Option<SourceSpan>,
    pub where_keyword: Option<SourceSpan>,
    pub condition: Option<SourceSpan>,
}

// ============================================================================
// QUERY
// ============================================================================

/// A query: one entity declaration and the condition it must satisfy.
///
/// Equality is structural and ignores `spans`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub entity: EntityDecl,
    pub condition: Condition,
    #[serde(default)]
    pub spans: QuerySpans,
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity && self.condition == other.condition
    }
}

impl Eq for Query {}

impl Query {
    pub fn new(entity: EntityDecl, condition: Condition) -> Self {
        Self {
            entity,
            condition,
            spans: QuerySpans::default(),
        }
    }

    /// A query whose only condition is the `alias is NodeType` placeholder.
    pub fn with_placeholder(entity: EntityDecl) -> Self {
        let condition = Condition::placeholder(&entity);
        Self::new(entity, condition)
    }

    pub fn alias(&self) -> Option<&str> {
        self.entity.alias.as_deref()
    }

    /// This query and every query nested below it, pre-order.
    pub fn queries(&self) -> Vec<&Query> {
        let mut out = Vec::new();
        collect_queries(self, &mut out);
        out
    }

    /// Queries nested directly in this query's condition (one level deep).
    pub fn nested_queries(&self) -> Vec<&Query> {
        self.condition
            .atomics()
            .into_iter()
            .filter_map(|atomic| match atomic {
                AtomicCondition::Rel(rel) => Some(rel.query.as_ref()),
                AtomicCondition::Value(_) => None,
            })
            .collect()
    }
}

fn collect_queries<'a>(query: &'a Query, out: &mut Vec<&'a Query>) {
    out.push(query);
    for nested in query.nested_queries() {
        collect_queries(nested, out);
    }
}

/// `NodeType Alias?`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityDecl {
    pub node_type: String,
    pub alias: Option<String>,
}

impl EntityDecl {
    pub fn new(node_type: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            node_type: node_type.into(),
            alias,
        }
    }

    pub fn aliased(node_type: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(node_type, Some(alias.into()))
    }

    /// The name conditions use to refer to this entity: the alias, or the
    /// node type when the declaration has none.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.node_type)
    }
}

// ============================================================================
// CONDITIONS
// ============================================================================

/// Boolean condition tree.
///
/// `And` and `Or` hold at least two children whenever they come out of the
/// parser or the writer's edit primitives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Atomic(AtomicCondition),
    Not(Box<Condition>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn value(attribute: Attribute, operator: ValueOp, value: impl Into<String>) -> Self {
        Condition::Atomic(AtomicCondition::Value(ValueMatch {
            attribute,
            operator,
            value: value.into(),
        }))
    }

    pub fn rel(attribute: Attribute, operator: RelOp, query: Query) -> Self {
        Condition::Atomic(AtomicCondition::Rel(RelMatch {
            attribute,
            operator,
            query: Box::new(query),
        }))
    }

    pub fn negate(inner: Condition) -> Self {
        Condition::Not(Box::new(inner))
    }

    /// `alias is NodeType` for the given declaration.
    pub fn placeholder(entity: &EntityDecl) -> Self {
        Condition::value(
            Attribute::node(entity.reference_name()),
            ValueOp::Is,
            entity.node_type.clone(),
        )
    }

    /// Direct sub-conditions (empty for atomics).
    pub fn children(&self) -> &[Condition] {
        match self {
            Condition::Atomic(_) => &[],
            Condition::Not(inner) => std::slice::from_ref(inner.as_ref()),
            Condition::And(subs) | Condition::Or(subs) => subs,
        }
    }

    /// Atomic leaves of this tree, pre-order, left to right. Does not descend
    /// into nested queries.
    pub fn atomics(&self) -> Vec<&AtomicCondition> {
        let mut out = Vec::new();
        collect_atomics(self, &mut out);
        out
    }

    pub fn as_atomic(&self) -> Option<&AtomicCondition> {
        match self {
            Condition::Atomic(atomic) => Some(atomic),
            _ => None,
        }
    }
}

fn collect_atomics<'a>(condition: &'a Condition, out: &mut Vec<&'a AtomicCondition>) {
    match condition {
        Condition::Atomic(atomic) => out.push(atomic),
        other => {
            for child in other.children() {
                collect_atomics(child, out);
            }
        }
    }
}

/// A leaf condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomicCondition {
    Value(ValueMatch),
    Rel(RelMatch),
}

impl AtomicCondition {
    pub fn attribute(&self) -> &Attribute {
        match self {
            AtomicCondition::Value(vm) => &vm.attribute,
            AtomicCondition::Rel(rm) => &rm.attribute,
        }
    }

    pub fn operator_str(&self) -> &'static str {
        match self {
            AtomicCondition::Value(vm) => vm.operator.as_str(),
            AtomicCondition::Rel(rm) => rm.operator.as_str(),
        }
    }
}

/// `attr op value`; `value` keeps its lexical form (quotes included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMatch {
    pub attribute: Attribute,
    pub operator: ValueOp,
    pub value: String,
}

/// `attr op NestedQuery`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelMatch {
    pub attribute: Attribute,
    pub operator: RelOp,
    pub query: Box<Query>,
}

/// `alias(.prop)*`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub alias: String,
    pub properties: Vec<String>,
}

impl Attribute {
    pub fn new(alias: impl Into<String>, properties: Vec<String>) -> Self {
        Self {
            alias: alias.into(),
            properties,
        }
    }

    /// The node itself, no property access.
    pub fn node(alias: impl Into<String>) -> Self {
        Self::new(alias, Vec::new())
    }

    /// Split a dotted path. Returns `None` for an empty path or an empty segment.
    pub fn from_path(path: &str) -> Option<Self> {
        let mut segments = path.split('.');
        let alias = segments.next().filter(|s| !s.is_empty())?;
        let properties = segments
            .map(|s| (!s.is_empty()).then(|| s.to_string()))
            .collect::<Option<Vec<_>>>()?;
        Some(Self::new(alias, properties))
    }

    pub fn first_property(&self) -> Option<&str> {
        self.properties.first().map(String::as_str)
    }

    /// Dotted form, e.g. `fc.name`.
    pub fn path(&self) -> String {
        let mut out = self.alias.clone();
        for prop in &self.properties {
            out.push('.');
            out.push_str(prop);
        }
        out
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

// ============================================================================
// OPERATORS
// ============================================================================

/// Error returned when an operator string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operator '{}'", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueOp {
    #[serde(rename = "match")]
    Match,
    #[serde(rename = "is")]
    Is,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl ValueOp {
    pub const ALL: [ValueOp; 4] = [ValueOp::Match, ValueOp::Is, ValueOp::Eq, ValueOp::Ne];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueOp::Match => "match",
            ValueOp::Is => "is",
            ValueOp::Eq => "==",
            ValueOp::Ne => "!=",
        }
    }
}

impl FromStr for ValueOp {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "match" => Ok(ValueOp::Match),
            "is" => Ok(ValueOp::Is),
            "==" => Ok(ValueOp::Eq),
            "!=" => Ok(ValueOp::Ne),
            _ => Err(UnknownOperator(s.to_string())),
        }
    }
}

impl fmt::Display for ValueOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelOp {
    #[serde(rename = "contain")]
    Contain,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "notIn")]
    NotIn,
}

impl RelOp {
    pub const ALL: [RelOp; 3] = [RelOp::Contain, RelOp::In, RelOp::NotIn];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelOp::Contain => "contain",
            RelOp::In => "in",
            RelOp::NotIn => "notIn",
        }
    }
}

impl FromStr for RelOp {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "contain" => Ok(RelOp::Contain),
            "in" => Ok(RelOp::In),
            "notin" => Ok(RelOp::NotIn),
            _ => Err(UnknownOperator(s.to_string())),
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ALIAS MAP
// ============================================================================

/// Alias → declaring query, in declaration order (pre-order over nesting).
///
/// Lookups follow last-declaration-wins; the full declaration list stays
/// available so collisions can be reported.
#[derive(Debug, Clone, Default)]
pub struct AliasMap<'a> {
    entries: Vec<(&'a str, &'a Query)>,
}

impl<'a> AliasMap<'a> {
    pub fn build(root: &'a Query) -> Self {
        let entries = root
            .queries()
            .into_iter()
            .filter_map(|q| q.alias().map(|alias| (alias, q)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, alias: &str) -> Option<&'a Query> {
        self.entries
            .iter()
            .rev()
            .find(|(name, _)| *name == alias)
            .map(|(_, q)| *q)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.get(alias).is_some()
    }

    /// The first declared entry (the root query when it has an alias).
    pub fn first(&self) -> Option<(&'a str, &'a Query)> {
        self.entries.first().copied()
    }

    /// Distinct aliases in first-declaration order.
    pub fn aliases(&self) -> Vec<&'a str> {
        let mut out: Vec<&'a str> = Vec::new();
        for (name, _) in &self.entries {
            if !out.contains(name) {
                out.push(*name);
            }
        }
        out
    }

    /// Aliases declared more than once, in first-declaration order.
    pub fn duplicates(&self) -> Vec<&'a str> {
        self.aliases()
            .into_iter()
            .filter(|alias| self.entries.iter().filter(|(n, _)| n == alias).count() > 1)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.aliases().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fc_query() -> Query {
        let inner = Query::with_placeholder(EntityDecl::aliased("literal", "lit"));
        Query::new(
            EntityDecl::aliased("functionCall", "fc"),
            Condition::And(vec![
                Condition::value(
                    Attribute::new("fc", vec!["name".into()]),
                    ValueOp::Eq,
                    "\"foo\"",
                ),
                Condition::rel(
                    Attribute::new("fc", vec!["arguments".into()]),
                    RelOp::Contain,
                    inner,
                ),
            ]),
        )
    }

    #[test]
    fn test_attribute_from_path() {
        let attr = Attribute::from_path("fc.name.value").unwrap();
        assert_eq!(attr.alias, "fc");
        assert_eq!(attr.properties, vec!["name", "value"]);
        assert_eq!(attr.path(), "fc.name.value");

        let bare = Attribute::from_path("fc").unwrap();
        assert!(bare.properties.is_empty());

        assert!(Attribute::from_path("").is_none());
        assert!(Attribute::from_path(".name").is_none());
        assert!(Attribute::from_path("fc..name").is_none());
    }

    #[test]
    fn test_placeholder_uses_node_type_without_alias() {
        let entity = EntityDecl::new("ifBlock", None);
        let cond = Condition::placeholder(&entity);
        let vm = match cond {
            Condition::Atomic(AtomicCondition::Value(vm)) => vm,
            other => panic!("expected value match, got {:?}", other),
        };
        assert_eq!(vm.attribute.alias, "ifBlock");
        assert_eq!(vm.operator, ValueOp::Is);
        assert_eq!(vm.value, "ifBlock");
    }

    #[test]
    fn test_queries_pre_order() {
        let query = fc_query();
        let names: Vec<_> = query.queries().iter().map(|q| q.alias()).collect();
        assert_eq!(names, vec![Some("fc"), Some("lit")]);
    }

    #[test]
    fn test_alias_map_last_write_wins() {
        let inner = Query::with_placeholder(EntityDecl::aliased("literal", "fc"));
        let root = Query::new(
            EntityDecl::aliased("functionCall", "fc"),
            Condition::rel(Attribute::node("fc"), RelOp::Contain, inner),
        );
        let map = AliasMap::build(&root);
        assert_eq!(map.get("fc").unwrap().entity.node_type, "literal");
        assert_eq!(map.first().unwrap().1.entity.node_type, "functionCall");
        assert_eq!(map.duplicates(), vec!["fc"]);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!("MATCH".parse::<ValueOp>(), Ok(ValueOp::Match));
        assert_eq!("==".parse::<ValueOp>(), Ok(ValueOp::Eq));
        assert_eq!("notin".parse::<RelOp>(), Ok(RelOp::NotIn));
        assert!("contains".parse::<RelOp>().is_err());
        assert!("in".parse::<ValueOp>().is_err());
    }

    #[test]
    fn test_query_equality_ignores_spans() {
        let a = fc_query();
        let mut b = fc_query();
        b.spans.entity = Some(SourceSpan::new(0, 15));
        assert_eq!(a, b);
    }
}
