use std::collections::VecDeque;
use std::fmt;

use crate::token::{Span, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// End of input reached while an argument was still open.
    UnterminatedArgument { depth: usize },
    /// Closing braces with no open argument left to close.
    TooManyClosingBraces { count: usize },
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedArgument { depth } => {
                write!(
                    f,
                    "unterminated argument, \
                     expected closing run of {depth} brace(s)"
                )
            }
            Self::TooManyClosingBraces { count } => {
                write!(f, "too many closing braces ({count})")
            }
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Tokenize a source string into a sequence of tokens.
///
/// The last token is always [`TokenKind::EndOfInput`].
///
/// # Errors
///
/// Returns `LexError` on unterminated arguments or closing braces
/// that do not match any open argument.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).collect()
}

#[derive(Debug, Clone, Copy)]
struct OpenArgument {
    depth: usize,
    span: Span,
}

/// Pull-based lexer.
///
/// Each call to [`Iterator::next`] runs the scanner just far enough to
/// produce the next token. The sequence is single-pass: after an error
/// or after [`TokenKind::EndOfInput`] it yields `None`.
///
/// Escaping works by brace-run length. An argument opened with `n`
/// braces is only closed by a run of `n` closing braces, and an element
/// inside it is only recognized when its own opening run is at least
/// `n` long. Shorter runs (and the `#` markers before them) are text.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    text_start: usize,
    text_span: Span,
    // Bottom entry is the top-level sentinel with depth 1.
    arguments: Vec<OpenArgument>,
    queue: VecDeque<Token>,
    done: bool,
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.')
}

impl Lexer {
    #[must_use]
    pub fn new(input: &str) -> Self {
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
        let start = Span::new(1, 1);
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            text_start: 0,
            text_span: start,
            arguments: vec![OpenArgument {
                depth: 1,
                span: start,
            }],
            queue: VecDeque::new(),
            done: false,
        }
    }

    fn depth(&self) -> usize {
        self.arguments.last().map_or(1, |open| open.depth)
    }

    fn is_top_level(&self) -> bool {
        self.arguments.len() <= 1
    }

    const fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn run_length(&self, ch: char) -> usize {
        self.chars[self.pos..]
            .iter()
            .take_while(|&&c| c == ch)
            .count()
    }

    fn advance(&mut self) {
        if let Some(&ch) = self.chars.get(self.pos) {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.pos += 1;
        }
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn slice(&self, from: usize, to: usize) -> String {
        self.chars[from..to].iter().collect()
    }

    fn push(&mut self, kind: TokenKind, text: String, span: Span) {
        log::trace!("{kind} {text:?} at {span}");
        self.queue.push_back(Token { kind, text, span });
    }

    /// Start a new pending text span at the cursor.
    fn mark(&mut self) {
        self.text_start = self.pos;
        self.text_span = self.span();
    }

    fn flush_text(&mut self, end: usize) {
        if end > self.text_start {
            let text = self.slice(self.text_start, end);
            self.push(TokenKind::Text, text, self.text_span);
        }
    }

    fn scan(&mut self) -> Result<(), LexError> {
        while self.queue.is_empty() {
            match self.peek() {
                None => return self.finish(),
                Some('#') => self.scan_element(),
                Some('}') => self.scan_closing()?,
                Some(_) => self.advance(),
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), LexError> {
        if !self.is_top_level() {
            if let Some(open) = self.arguments.last() {
                return Err(LexError {
                    kind: LexErrorKind::UnterminatedArgument { depth: open.depth },
                    span: open.span,
                });
            }
        }

        self.flush_text(self.pos);
        self.push(TokenKind::EndOfInput, String::new(), self.span());
        self.done = true;
        Ok(())
    }

    fn scan_element(&mut self) {
        let hash = self.pos;
        let hash_span = self.span();
        self.advance(); // skip #

        while self.peek().is_some_and(is_name_char) {
            self.advance();
        }
        let name_end = self.pos;

        while self.peek() == Some(' ') {
            self.advance();
        }

        // Too shallow for the current escape depth: everything consumed
        // so far stays in the pending text.
        let braces = self.run_length('{');
        if braces == 0 || braces < self.depth() {
            return;
        }

        self.flush_text(hash);
        let name = self.slice(hash, name_end);
        self.push(TokenKind::ElementName, name, hash_span);
        self.open_argument(braces);
    }

    fn open_argument(&mut self, braces: usize) {
        let span = self.span();
        let start = self.pos;
        self.advance_by(braces);

        let text = self.slice(start, self.pos);
        self.push(TokenKind::ArgumentOpen, text, span);
        self.arguments.push(OpenArgument {
            depth: braces,
            span,
        });

        if self.peek() == Some(' ') {
            self.advance();
        }
        self.mark();
    }

    fn scan_closing(&mut self) -> Result<(), LexError> {
        let span = self.span();
        let count = self.run_length('}');

        if self.is_top_level() {
            return Err(LexError {
                kind: LexErrorKind::TooManyClosingBraces { count },
                span,
            });
        }

        if count < self.depth() {
            self.advance_by(count);
            return Ok(());
        }

        let mut text_end = self.pos;
        if text_end > self.text_start && self.chars[text_end - 1] == ' ' {
            text_end -= 1;
        }
        self.flush_text(text_end);

        // One run closes as many arguments as it covers exactly; braces
        // left over after a close belong to no argument.
        let mut remaining = count;
        while !self.is_top_level() && remaining >= self.depth() {
            let depth = self.depth();
            let span = self.span();
            let start = self.pos;
            self.advance_by(depth);
            let text = self.slice(start, self.pos);
            self.push(TokenKind::ArgumentClose, text, span);
            self.arguments.pop();
            remaining -= depth;
        }
        if remaining > 0 {
            return Err(LexError {
                kind: LexErrorKind::TooManyClosingBraces { count: remaining },
                span: self.span(),
            });
        }
        self.mark();

        let braces = self.run_length('{');
        if braces > 0 && braces >= self.depth() {
            self.open_argument(braces);
        }

        Ok(())
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.queue.pop_front() {
            return Some(Ok(token));
        }
        if self.done {
            return None;
        }
        if let Err(err) = self.scan() {
            self.done = true;
            self.queue.clear();
            return Some(Err(err));
        }
        self.queue.pop_front().map(Ok)
    }
}
