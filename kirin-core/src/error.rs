//! Error types for kirin operations

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    /// Malformed token (bad escape, unterminated string, stray character).
    Lexical,
    /// Well-formed tokens in an order the grammar does not accept.
    Syntax,
    /// Input ended or continued where it should not have.
    Unexpected,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::Lexical => "lexical",
            ParseErrorKind::Syntax => "syntax",
            ParseErrorKind::Unexpected => "unexpected",
        }
    }
}

/// A positioned parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    /// Byte offset into the source.
    pub offset: usize,
    /// Source text of the offending token, empty at end of input.
    pub token: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] line {}, column {} (offset {}): {}",
            self.kind.as_str(),
            self.line,
            self.column,
            self.offset,
            self.message
        )?;
        if !self.token.is_empty() {
            write!(f, " (token: {})", self.token)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Every error a failed parse produced. Never empty when returned as `Err`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseErrorList {
    pub errors: Vec<ParseError>,
}

impl ParseErrorList {
    pub fn new(errors: Vec<ParseError>) -> Self {
        Self { errors }
    }

    pub fn single(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.errors.iter()
    }
}

impl fmt::Display for ParseErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrorList {}

impl From<ParseError> for ParseErrorList {
    fn from(error: ParseError) -> Self {
        Self::single(error)
    }
}

impl IntoIterator for ParseErrorList {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrorList {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for the kirin engine.
#[derive(Debug, Error)]
pub enum KirinError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseErrorList),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl KirinError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        KirinError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for kirin operations.
pub type KirinResult<T> = Result<T, KirinError>;

// =============================================================================
// TESTS
// =============================================================================
