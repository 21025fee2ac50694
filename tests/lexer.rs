//! Lexer edge cases and error tests.

mod common;

use common::tokens;
use textml::{LexErrorKind, Lexer, Span, TokenKind, tokenize};

fn text(s: &str) -> (TokenKind, String) {
    (TokenKind::Text, s.to_string())
}

fn name(s: &str) -> (TokenKind, String) {
    (TokenKind::ElementName, s.to_string())
}

fn open(s: &str) -> (TokenKind, String) {
    (TokenKind::ArgumentOpen, s.to_string())
}

fn close(s: &str) -> (TokenKind, String) {
    (TokenKind::ArgumentClose, s.to_string())
}

fn eoi() -> (TokenKind, String) {
    (TokenKind::EndOfInput, String::new())
}

// -----------------------------------------------------------
// Basic lexer behaviour.
// -----------------------------------------------------------

#[test]
fn lex_plain_text_is_one_token() {
    let input = "Just some text,\nwith { an opening brace and # signs.";
    assert_eq!(tokens(input), vec![text(input), eoi()]);
}

#[test]
fn lex_empty_input() {
    assert_eq!(tokens(""), vec![eoi()]);
}

#[test]
fn lex_element_with_two_arguments() {
    assert_eq!(
        tokens("#sum{ 1 }{ 2 }"),
        vec![
            name("#sum"),
            open("{"),
            text("1"),
            close("}"),
            open("{"),
            text("2"),
            close("}"),
            eoi(),
        ]
    );
}

#[test]
fn lex_nested_escape_levels() {
    assert_eq!(
        tokens("#sum{ #sum{{ 3 }}{{{ 4 }}} }"),
        vec![
            name("#sum"),
            open("{"),
            name("#sum"),
            open("{{"),
            text("3"),
            close("}}"),
            open("{{{"),
            text("4"),
            close("}}}"),
            close("}"),
            eoi(),
        ]
    );
}

#[test]
fn lex_short_runs_inside_deep_argument_are_text() {
    assert_eq!(
        tokens("#code{{ fn f() { #x{y} } }}"),
        vec![
            name("#code"),
            open("{{"),
            text("fn f() { #x{y} }"),
            close("}}"),
            eoi(),
        ]
    );
}

#[test]
fn lex_anonymous_element() {
    assert_eq!(
        tokens("Hi #{name}!"),
        vec![
            text("Hi "),
            name("#"),
            open("{"),
            text("name"),
            close("}"),
            text("!"),
            eoi(),
        ]
    );
}

#[test]
fn lex_spaces_between_name_and_brace() {
    assert_eq!(
        tokens("#b   {x}"),
        vec![name("#b"), open("{"), text("x"), close("}"), eoi()]
    );
}

#[test]
fn lex_marker_without_argument_is_text() {
    assert_eq!(tokens("issue #42 is fixed"), vec![text("issue #42 is fixed"), eoi()]);
}

#[test]
fn lex_dotted_names() {
    let kinds = tokens("#html.p{x}");
    assert_eq!(kinds[0], name("#html.p"));
}

#[test]
fn lex_empty_argument() {
    assert_eq!(
        tokens("#a{}"),
        vec![name("#a"), open("{"), close("}"), eoi()]
    );
}

// -----------------------------------------------------------
// Space trimming next to delimiters.
// -----------------------------------------------------------

#[test]
fn lex_trims_one_adjacent_space_only() {
    assert_eq!(
        tokens("#a{  x  }"),
        vec![name("#a"), open("{"), text(" x "), close("}"), eoi()]
    );
}

#[test]
fn lex_keeps_non_adjacent_whitespace() {
    assert_eq!(
        tokens("#a{\nx\n}"),
        vec![name("#a"), open("{"), text("\nx\n"), close("}"), eoi()]
    );
}

#[test]
fn lex_space_after_close_is_text() {
    assert_eq!(
        tokens("#a{x} y"),
        vec![name("#a"), open("{"), text("x"), close("}"), text(" y"), eoi()]
    );
}

// -----------------------------------------------------------
// Closing runs.
// -----------------------------------------------------------

#[test]
fn lex_long_close_run_closes_several_arguments() {
    assert_eq!(
        tokens("#a{#b{#c{x}}}"),
        vec![
            name("#a"),
            open("{"),
            name("#b"),
            open("{"),
            name("#c"),
            open("{"),
            text("x"),
            close("}"),
            close("}"),
            close("}"),
            eoi(),
        ]
    );
}

#[test]
fn lex_close_run_spanning_escape_levels() {
    let tokens = tokenize("#o{{ #a{{x}}}} tail").expect("tokenize");
    let closes: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::ArgumentClose)
        .map(|t| (t.text.as_str(), t.span))
        .collect();
    assert_eq!(closes, [("}}", Span::new(1, 11)), ("}}", Span::new(1, 13))]);
    assert_eq!(tokens[tokens.len() - 2].text, " tail");
}

#[test]
fn lex_long_close_run_is_linear() {
    let n = 50_000;
    let input = format!("{}x{}", "#a{".repeat(n), "}".repeat(n));
    let tokens = tokenize(&input).expect("tokenize");
    let closes = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::ArgumentClose)
        .count();
    assert_eq!(closes, n);
    assert_eq!(tokens.len(), 3 * n + 2);
}

#[test]
fn lex_chained_argument_must_follow_immediately() {
    // the space breaks the chain, and a lone `{` at top level is text
    assert_eq!(
        tokens("#a{x} {y"),
        vec![name("#a"), open("{"), text("x"), close("}"), text(" {y"), eoi()]
    );
}

// -----------------------------------------------------------
// Positions.
// -----------------------------------------------------------

#[test]
fn lex_token_positions() {
    let tokens = tokenize("ab\n#c{d}").expect("tokenize");
    assert_eq!(tokens[0].span, Span::new(1, 1));
    assert_eq!(tokens[1].span, Span::new(2, 1));
    assert_eq!(tokens[2].span, Span::new(2, 3));
    assert_eq!(tokens[3].span, Span::new(2, 4));
    assert_eq!(tokens[4].span, Span::new(2, 5));
    assert_eq!(tokens[5].span, Span::new(2, 6));
}

#[test]
fn lex_strips_byte_order_mark() {
    assert_eq!(tokens("\u{FEFF}x"), vec![text("x"), eoi()]);
}

// -----------------------------------------------------------
// Errors.
// -----------------------------------------------------------

#[test]
fn lex_error_stray_closing_brace() {
    let err = tokenize("a\nb}c").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::TooManyClosingBraces { count: 1 });
    assert_eq!(err.span, Span::new(2, 2));
    assert_eq!(err.to_string(), "too many closing braces (1) at line 2, column 2");
}

#[test]
fn lex_error_excess_braces_after_close() {
    let err = tokenize("#a{x}}").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::TooManyClosingBraces { count: 1 });
    assert_eq!(err.span, Span::new(1, 6));
}

#[test]
fn lex_error_remainder_of_close_run() {
    // `}}}` closes `#a{{` and leaves one brace that cannot close `#o{{`
    let err = tokenize("#o{{ #a{{x}}} }}").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::TooManyClosingBraces { count: 1 });
    assert_eq!(err.span, Span::new(1, 13));

    let err = tokenize("#o{{{ #a{{{x}}}}} }}}").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::TooManyClosingBraces { count: 2 });
}

#[test]
fn lex_error_unterminated_argument() {
    let err = tokenize("x #a{{ open").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnterminatedArgument { depth: 2 });
    assert_eq!(err.span, Span::new(1, 5));
}

#[test]
fn lex_error_short_close_run_leaves_argument_open() {
    let err = tokenize("#a{{x}").unwrap_err();
    assert!(matches!(err.kind, LexErrorKind::UnterminatedArgument { .. }));
}

#[test]
fn lexer_is_lazy_and_single_pass() {
    let mut lexer = Lexer::new("a}b");
    assert!(matches!(lexer.next(), Some(Err(_))));
    assert!(lexer.next().is_none());

    let mut lexer = Lexer::new("#a{b}");
    let first = lexer.next().expect("token").expect("ok");
    assert_eq!(first.kind, TokenKind::ElementName);
    assert_eq!(lexer.count(), 4);
}
