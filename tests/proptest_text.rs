//! Property-based tests with proptest.
//!
//! Generate plain text, escaped argument contents, and element chains,
//! and check that they survive lexing, parsing, and evaluation intact.

use proptest::prelude::*;
use textml::{Block, Node, evaluate_str, parse_str, tokenize};

/// Text with no `#` markers and no closing braces.
fn plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,.!?{\n]{0,60}"
}

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

/// Argument content for an escape depth, plus the depth itself.
///
/// Words separated by single spaces from brace runs strictly shorter
/// than the depth, so no run can close the argument. Starts and ends
/// with a word so the delimiter-adjacent trimming never applies.
fn escaped_content() -> impl Strategy<Value = (usize, String)> {
    (2..=5usize).prop_flat_map(|depth| {
        let run = (prop::bool::ANY, 1..depth).prop_map(|(open, len)| {
            if open { "{".repeat(len) } else { "}".repeat(len) }
        });
        let pieces = prop::collection::vec((run, word()), 0..6);
        (Just(depth), word(), pieces).prop_map(|(depth, first, pieces)| {
            let mut content = first;
            for (run, word) in pieces {
                content.push(' ');
                content.push_str(&run);
                content.push(' ');
                content.push_str(&word);
            }
            (depth, content)
        })
    })
}

proptest! {
    /// A document without elements compiles to its own text.
    #[test]
    fn plain_text_is_verbatim(text in plain_text()) {
        let block = parse_str(&text).map_err(|e| TestCaseError::fail(e.to_string()))?;
        if text.is_empty() {
            prop_assert!(block.is_empty());
        } else {
            prop_assert_eq!(&block, &Block(vec![Node::text(text.clone())]));
        }
        prop_assert_eq!(evaluate_str(&text).map_err(|e| TestCaseError::fail(e.to_string()))?, text);
    }

    /// Brace runs shorter than the escape depth pass through as text.
    #[test]
    fn escaped_braces_pass_through((depth, content) in escaped_content()) {
        let source = std::format!(
            "#if{{true}}{}{}{}",
            "{".repeat(depth),
            content,
            "}".repeat(depth)
        );
        let output = evaluate_str(&source).map_err(|e| {
            TestCaseError::fail(std::format!("{e}\n--- source ---\n{source}"))
        })?;
        prop_assert_eq!(output, content);
    }

    /// Chained arguments become one element with one block per argument.
    #[test]
    fn chained_arguments(name in "[a-z][a-z0-9_-]{0,10}", args in prop::collection::vec(word(), 1..6)) {
        let mut source = std::format!("#{name}");
        for arg in &args {
            source.push('{');
            source.push_str(arg);
            source.push('}');
        }
        let block = parse_str(&source).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let expected = Block(vec![Node::element(
            name,
            args.iter().map(|arg| Block(vec![Node::text(arg.clone())])).collect(),
        )]);
        prop_assert_eq!(block, expected);
    }

    /// The lexer never panics, whatever the input.
    #[test]
    fn lexer_total(input in any::<String>()) {
        let _ = tokenize(&input);
        let _ = parse_str(&input);
    }

    /// The JSON encoding reproduces the compiled tree.
    #[test]
    fn json_round_trip(words in prop::collection::vec(word(), 1..5)) {
        let source: String = words
            .iter()
            .map(|w| std::format!("{w} #{w}{{#x{{{w}}}{w}}}"))
            .collect();
        let block = parse_str(&source).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let json = serde_json::to_string(&block).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let back: Block = serde_json::from_str(&json).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(back, block);
    }
}
