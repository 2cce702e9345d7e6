//! Validation result types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic error categories reported by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorType {
    InvalidNodeType,
    InvalidProperty,
    UnsupportedPropertyPath,
    InvalidValueForProperty,
    MissingAlias,
    DuplicateAlias,
}

impl ValidationErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorType::InvalidNodeType => "INVALID_NODE_TYPE",
            ValidationErrorType::InvalidProperty => "INVALID_PROPERTY",
            ValidationErrorType::UnsupportedPropertyPath => "UNSUPPORTED_PROPERTY_PATH",
            ValidationErrorType::InvalidValueForProperty => "INVALID_VALUE_FOR_PROPERTY",
            ValidationErrorType::MissingAlias => "MISSING_ALIAS",
            ValidationErrorType::DuplicateAlias => "DUPLICATE_ALIAS",
        }
    }
}

impl fmt::Display for ValidationErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub error_type: ValidationErrorType,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(error_type: ValidationErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

/// Outcome of validating a query or condition. `is_valid` is true exactly
/// when `errors` is empty; warnings never affect it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self::from_parts(Vec::new(), Vec::new())
    }

    pub fn invalid(error: ValidationError) -> Self {
        Self::from_parts(vec![error], Vec::new())
    }

    pub fn from_parts(errors: Vec<ValidationError>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn has_error(&self, error_type: ValidationErrorType) -> bool {
        self.errors.iter().any(|e| e.error_type == error_type)
    }

    pub fn errors_of(&self, error_type: ValidationErrorType) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.error_type == error_type)
    }
}
