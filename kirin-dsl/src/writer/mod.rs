//! DSL writer: canonical rendering, tree edits and constraint merge

pub mod edit;
pub mod merge;
pub mod render;

pub use edit::{add_condition_to_tree, constraint_to_condition, find_by_path, remove_by_path, update_by_path};
pub use merge::{merge_constraints, merge_constraints_with};
pub use render::{escape_value, render, render_atomic, render_attribute, render_condition};

use crate::parser::parse;
use kirin_core::ParseErrorList;

/// Parse `source` and render it back in canonical form.
pub fn round_trip(source: &str) -> Result<String, ParseErrorList> {
    let parsed = parse(source)?;
    Ok(render(&parsed.query, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_idempotent() -> Result<(), ParseErrorList> {
        let sources = [
            "functionCall fc where fc.name == \"test\" ;",
            "ifBlock where ifBlock.condition is binaryOperation ;",
            "functionCall fc where or(fc.arguments in literal ;, not(fc.base), fc.name match 'x') ;",
            "functionCall fc where fc.arguments contain literal lit where and(lit.value != -1.5, lit notIn functionCall g) ; ;",
        ];
        for source in sources {
            let once = round_trip(source)?;
            let twice = round_trip(&once)?;
            assert_eq!(once, twice, "round trip drifted for {}", source);
            assert_eq!(parse(&once)?, parse(source)?);
        }
        Ok(())
    }
}
