//! kirin core - data types shared by the kirin DSL engine
//!
//! Pure data structures, static metadata tables, error and configuration
//! types. Parsing, validation and rendering live in `kirin-dsl`.

pub mod ast;
pub mod config;
pub mod constraint;
pub mod error;
pub mod metadata;
pub mod validation;

pub use ast::*;
pub use config::{CombineMode, KirinConfig};
pub use constraint::{ConstraintSource, ConstraintType, ExtraConstraint};
pub use error::{ConfigError, KirinError, KirinResult, ParseError, ParseErrorKind, ParseErrorList};
pub use metadata::RoleAction;
pub use validation::{ValidationError, ValidationErrorType, ValidationResult};
