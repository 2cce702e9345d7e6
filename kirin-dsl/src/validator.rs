//! Semantic validation against the node/property metadata tables

use crate::writer::render::unquote;
use kirin_core::metadata::{
    is_unsupported_path, is_valid_node_type, is_valid_property, operator_node_type, properties_for,
    role_action, sorted_node_types, value_hint,
};
use kirin_core::{
    AliasMap, AtomicCondition, Attribute, Condition, KirinConfig, Query, RelMatch, ValidationError,
    ValidationErrorType, ValidationResult, ValueMatch, ValueOp,
};

/// Checks node types, property paths and values of parsed queries.
///
/// Validation never fails: every problem becomes a [`ValidationError`] or a
/// warning, in condition pre-order.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: KirinConfig,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &KirinConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn validate(&self, query: &Query) -> ValidationResult {
        let aliases = AliasMap::build(query);
        let mut pass = Pass::new(&aliases, &self.config);

        if self.config.report_duplicate_aliases {
            for alias in aliases.duplicates() {
                pass.errors.push(
                    ValidationError::new(
                        ValidationErrorType::DuplicateAlias,
                        format!("Alias '{}' is declared more than once", alias),
                    )
                    .with_suggestion(format!(
                        "Rename one of the declarations; conditions on '{}' resolve to the last one",
                        alias
                    )),
                );
            }
        }

        pass.query(query);
        pass.finish()
    }

    /// Validate a condition that is not part of a parsed query, resolving
    /// aliases through `aliases`. Aliases it cannot resolve are checked in the
    /// context of the first declared alias.
    pub fn validate_condition(&self, condition: &Condition, aliases: &AliasMap<'_>) -> ValidationResult {
        let mut pass = Pass::new(aliases, &self.config);
        let context = match aliases.first() {
            Some((alias, query)) => Context {
                node_type: &query.entity.node_type,
                alias: Some(alias),
            },
            None => Context {
                node_type: "unknown",
                alias: None,
            },
        };
        pass.condition(condition, context);
        pass.finish()
    }
}

/// Validate with the default configuration.
pub fn validate(query: &Query) -> ValidationResult {
    Validator::new().validate(query)
}

pub fn validate_condition(condition: &Condition, aliases: &AliasMap<'_>) -> ValidationResult {
    Validator::new().validate_condition(condition, aliases)
}

// ============================================================================
// TRAVERSAL
// ============================================================================

/// The query whose condition is being walked.
#[derive(Debug, Clone, Copy)]
struct Context<'q> {
    node_type: &'q str,
    alias: Option<&'q str>,
}

struct Pass<'a, 'q> {
    aliases: &'a AliasMap<'q>,
    config: &'a KirinConfig,
    errors: Vec<ValidationError>,
    warnings: Vec<String>,
}

impl<'a, 'q> Pass<'a, 'q> {
    fn new(aliases: &'a AliasMap<'q>, config: &'a KirinConfig) -> Self {
        Self {
            aliases,
            config,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn finish(self) -> ValidationResult {
        ValidationResult::from_parts(self.errors, self.warnings)
    }

    fn query(&mut self, query: &Query) {
        let node_type = query.entity.node_type.as_str();
        if !is_valid_node_type(node_type) {
            let sample = sorted_node_types()
                .iter()
                .take(self.config.node_type_sample)
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            self.errors.push(
                ValidationError::new(
                    ValidationErrorType::InvalidNodeType,
                    format!("Invalid node type: {}", node_type),
                )
                .with_suggestion(format!("Valid node types include: {}...", sample)),
            );
        }

        let context = Context {
            node_type,
            alias: Some(query.entity.reference_name()),
        };
        self.condition(&query.condition, context);
    }

    fn condition(&mut self, condition: &Condition, context: Context<'_>) {
        match condition {
            Condition::Atomic(AtomicCondition::Value(vm)) => self.value_match(vm, context),
            Condition::Atomic(AtomicCondition::Rel(rm)) => self.rel_match(rm, context),
            Condition::Not(_) | Condition::And(_) | Condition::Or(_) => {
                for sub in condition.children() {
                    self.condition(sub, context);
                }
            }
        }
    }

    fn value_match(&mut self, vm: &ValueMatch, context: Context<'_>) {
        let attribute = &vm.attribute;
        let Some(target) = self.resolve(attribute, context) else {
            return;
        };
        let Some(property) = attribute.first_property() else {
            return;
        };
        let value = unquote(&vm.value);

        if is_unsupported_path(&target, property) {
            let rewrite = if property == "operator" && matches!(vm.operator, ValueOp::Is | ValueOp::Eq) {
                operator_node_type(value)
            } else {
                None
            };
            let suggestion = match rewrite {
                Some(node_type) => format!("{} is {}", attribute.alias, node_type),
                None => format!("use {} is <nodeType> instead", attribute.alias),
            };
            self.errors.push(
                ValidationError::new(
                    ValidationErrorType::UnsupportedPropertyPath,
                    format!(
                        "Property '{}' is not supported on node type '{}'. Found: {} {} {}",
                        property, target, attribute, vm.operator, vm.value
                    ),
                )
                .with_suggestion(suggestion),
            );
            return;
        }

        self.check_property(&target, attribute, property);

        if vm.operator == ValueOp::Is && is_valid_node_type(value) {
            return;
        }
        if let Some(node_type) = value_hint(property, value) {
            self.errors.push(
                ValidationError::new(
                    ValidationErrorType::InvalidValueForProperty,
                    format!(
                        "Value '{}' for property '{}' should be replaced with node type check",
                        vm.value, property
                    ),
                )
                .with_suggestion(format!("{} is {}", attribute.alias, node_type)),
            );
        }
    }

    fn rel_match(&mut self, rm: &RelMatch, context: Context<'_>) {
        let attribute = &rm.attribute;
        if let Some(target) = self.resolve(attribute, context) {
            if let Some(property) = attribute.first_property() {
                if is_unsupported_path(&target, property) {
                    self.errors.push(
                        ValidationError::new(
                            ValidationErrorType::UnsupportedPropertyPath,
                            format!(
                                "Property '{}' is not supported on node type '{}'",
                                property, target
                            ),
                        )
                        .with_suggestion(format!("use {} is <nodeType> instead", attribute.alias)),
                    );
                } else {
                    self.check_property(&target, attribute, property);
                }
            }
        }

        self.query(&rm.query);
    }

    /// Node type the attribute's alias refers to, or `None` after reporting
    /// MISSING_ALIAS.
    fn resolve(&mut self, attribute: &Attribute, context: Context<'_>) -> Option<String> {
        if let Some(query) = self.aliases.get(&attribute.alias) {
            return Some(query.entity.node_type.clone());
        }
        if context.alias == Some(attribute.alias.as_str()) {
            return Some(context.node_type.to_string());
        }
        self.errors.push(
            ValidationError::new(
                ValidationErrorType::MissingAlias,
                format!("Alias '{}' is not defined", attribute.alias),
            )
            .with_suggestion(format!(
                "Make sure to declare the node with alias '{}' before using it",
                attribute.alias
            )),
        );
        None
    }

    /// Warnings only: the property tables are incomplete.
    fn check_property(&mut self, node_type: &str, attribute: &Attribute, property: &str) {
        let known = properties_for(node_type).unwrap_or(&[]);
        if !known.iter().any(|p| *p == property) && !is_valid_property(property) {
            let mut listed = known.to_vec();
            listed.sort_unstable();
            let listed = if listed.is_empty() {
                "none".to_string()
            } else {
                listed.join(", ")
            };
            self.warnings.push(format!(
                "Property '{}' on node type '{}' may not be valid. Valid properties for this node type: {}",
                property, node_type, listed
            ));
        }

        if attribute.properties.len() > 1 {
            if let Some(role) = role_action(property) {
                if !role.allows_dot_access() {
                    self.warnings.push(format!(
                        "Property '{}' holds several nodes; use '{}.{} contain <query>' instead of '{}'",
                        property, attribute.alias, property, attribute
                    ));
                }
            }
        }
    }
}
