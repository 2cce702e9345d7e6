//! Constraint edit instructions applied by the DSL writer

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a constraint does to the existing condition tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintType {
    Add,
    Edit,
    Del,
}

impl ConstraintType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintType::Add => "add",
            ConstraintType::Edit => "edit",
            ConstraintType::Del => "del",
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which analysis produced the constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintSource {
    Buggy,
    Fixed,
    /// False-positive analysis; constraints default to negative.
    Fp,
    #[default]
    Unknown,
}

/// One add/edit/delete instruction against a parsed query.
///
/// `constraint_path` is `alias(.prop)*`; its leading segment must name an
/// alias declared somewhere in the DSL being edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraConstraint {
    pub constraint_path: String,
    pub operator: Option<String>,
    pub value: Option<String>,
    pub constraint_type: ConstraintType,
    #[serde(default)]
    pub is_negative: bool,
    #[serde(default)]
    pub original_value: Option<String>,
    #[serde(default)]
    pub source: ConstraintSource,
}

impl ExtraConstraint {
    pub fn new(constraint_type: ConstraintType, path: impl Into<String>) -> Self {
        Self {
            constraint_path: path.into(),
            operator: None,
            value: None,
            constraint_type,
            is_negative: false,
            original_value: None,
            source: ConstraintSource::Unknown,
        }
    }

    pub fn add(path: impl Into<String>, operator: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ConstraintType::Add, path)
            .with_operator(operator)
            .with_value(value)
    }

    pub fn edit(
        path: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
        original_value: Option<String>,
    ) -> Self {
        let mut c = Self::new(ConstraintType::Edit, path)
            .with_operator(operator)
            .with_value(value);
        c.original_value = original_value;
        c
    }

    pub fn del(path: impl Into<String>, operator: impl Into<String>, original_value: Option<String>) -> Self {
        let mut c = Self::new(ConstraintType::Del, path).with_operator(operator);
        c.original_value = original_value;
        c
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_source(mut self, source: ConstraintSource) -> Self {
        self.source = source;
        self
    }

    pub fn negated(mut self) -> Self {
        self.is_negative = true;
        self
    }

    /// Leading path segment, the alias the constraint targets.
    pub fn leading_alias(&self) -> &str {
        self.constraint_path
            .split('.')
            .next()
            .unwrap_or_default()
            .trim()
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

impl fmt::Display for ExtraConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.constraint_type, self.constraint_path)?;
        if let Some(op) = self.operator() {
            write!(f, " {}", op)?;
        }
        if let Some(value) = self.value() {
            write!(f, " {}", value)?;
        }
        if self.is_negative {
            f.write_str(" (negative)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_alias() {
        assert_eq!(ExtraConstraint::add("fc.name", "==", "x").leading_alias(), "fc");
        assert_eq!(ExtraConstraint::add("fc", "is", "functionCall").leading_alias(), "fc");
        assert_eq!(ExtraConstraint::new(ConstraintType::Del, "").leading_alias(), "");
    }

    #[test]
    fn test_blank_fields_read_as_missing() {
        let c = ExtraConstraint::new(ConstraintType::Add, "fc.name")
            .with_operator("  ")
            .with_value("");
        assert!(c.operator().is_none());
        assert!(c.value().is_none());
    }

    #[test]
    fn test_display() {
        let c = ExtraConstraint::add("fc.name", "==", "\"x\"").negated();
        assert_eq!(c.to_string(), "[add] fc.name == \"x\" (negative)");
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{"constraint_path":"fc.name","operator":"==","value":"1","constraint_type":"edit"}"#;
        let c: ExtraConstraint = serde_json::from_str(json).unwrap();
        assert_eq!(c.constraint_type, ConstraintType::Edit);
        assert!(!c.is_negative);
        assert_eq!(c.source, ConstraintSource::Unknown);
    }
}
