//! Fuzz test for the kirin DSL parser and writer
//!
//! Arbitrary UTF-8 must either fail with positioned errors or parse to a tree
//! whose canonical rendering parses back to the same tree.
//!
//! Run with: cargo +nightly fuzz run parser_fuzz -- -max_total_time=60

#![no_main]

use kirin_dsl::{parse, render, validate, Lexer, Parser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        match parse(input) {
            Ok(parsed) => {
                let canonical = render(&parsed.query, false);
                let reparsed = match parse(&canonical) {
                    Ok(reparsed) => reparsed,
                    Err(errors) => panic!("Canonical form {:?} does not parse: {}", canonical, errors),
                };
                assert_eq!(reparsed.query, parsed.query, "Round trip changed the tree");

                // Validation never panics and agrees with itself
                assert_eq!(validate(&parsed.query), validate(&reparsed.query));
            }
            Err(errors) => {
                assert!(!errors.is_empty(), "Failure should carry at least one error");
                for err in errors.iter() {
                    assert!(err.line >= 1, "Error line should be >= 1");
                    assert!(err.column >= 1, "Error column should be >= 1");
                    assert!(err.offset <= input.len(), "Error offset should be inside the input");
                    assert!(!err.message.is_empty(), "Error message should not be empty");
                }
            }
        }

        // Lexer -> parser pipeline with a raw token stream
        let mut parser = Parser::new(Lexer::new(input).tokenize());
        let _ = parser.parse();
    }
});
