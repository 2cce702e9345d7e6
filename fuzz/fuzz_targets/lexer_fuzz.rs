//! Fuzz test for the kirin DSL lexer
//!
//! Feeds arbitrary UTF-8 to the lexer looking for panics, infinite loops and
//! spans that point outside the input.
//!
//! Run with: cargo +nightly fuzz run lexer_fuzz -- -max_total_time=60

#![no_main]

use kirin_dsl::{Lexer, TokenKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let tokens = Lexer::new(input).tokenize();

        // Always terminated by exactly one Eof
        assert_eq!(
            tokens.last().map(|t| &t.kind),
            Some(&TokenKind::Eof),
            "Last token should always be Eof"
        );
        assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(),
            1,
            "Eof should appear once"
        );

        let mut previous_end = 0;
        for token in &tokens {
            assert!(token.span.start <= token.span.end, "Span start should be <= end");
            assert!(token.span.end <= input.len(), "Span should stay inside the input");
            assert!(token.span.start >= previous_end, "Spans should not overlap");
            assert!(input.is_char_boundary(token.span.start), "Span start on a char boundary");
            assert!(token.span.line >= 1, "Line numbers should be >= 1");
            assert!(token.span.column >= 1, "Column numbers should be >= 1");
            previous_end = token.span.end;
        }
    }
});
