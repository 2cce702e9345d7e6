//! Lexer module for the kirin DSL

pub mod scanner;
pub mod token;

pub use scanner::*;
pub use token::*;
