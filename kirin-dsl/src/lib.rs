//! KIRIN DSL - Query Language Parser, Validator & Writer
//!
//! Parses kirin queries (entity declarations with boolean condition trees
//! and nested sub-queries), checks them against the node/property metadata,
//! and merges add/edit/delete constraints back into canonical DSL text.
//!
//! Architecture:
//! ```text
//! DSL Source (.kirin files)
//!     ↓
//! Lexer (tokens + spans)
//!     ↓
//! Parser (tokens → Query AST + alias map)
//!     ↓
//! Validator (metadata checks → ValidationResult)
//!     ↓
//! Fix Suggester (errors → replacement conditions)
//!     ↓
//! Writer (constraints merged → canonical DSL text)
//! ```

pub mod constraint;
pub mod fix_suggester;
pub mod lexer;
pub mod parser;
pub mod validator;
pub mod writer;

// Re-export key types for convenience
pub use constraint::{
    constraints_to_json, extract_constraints, extract_constraints_with, ConstraintReport,
    ConstraintValidator, ConstraintVerdict,
};
pub use fix_suggester::{generate_fix_message, suggest_fix};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse, parse_condition, parse_nested, ParsedDsl, Parser};
pub use validator::{validate, validate_condition, Validator};
pub use writer::{
    add_condition_to_tree, constraint_to_condition, escape_value, find_by_path, merge_constraints,
    merge_constraints_with, remove_by_path, render, render_attribute, render_condition, round_trip,
    update_by_path,
};

pub use kirin_core;
