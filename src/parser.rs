use std::fmt;

use crate::token::{Span, Token, TokenKind};

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The token stream was empty.
    EmptyInput,
    /// A token that cannot appear at this point.
    UnexpectedToken {
        expected: &'static str,
        found: TokenKind,
    },
    /// An argument was never closed.
    UnbalancedBlock,
    /// Closing run length differs from the opening run.
    MismatchedClose { open: String, close: String },
    /// Tokens ran out before `EndOfInput`.
    MissingEndOfInput,
    /// Elements nested inside arguments past the given depth.
    NestingTooDeep { limit: usize },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty token stream"),
            Self::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, got {found}")
            }
            Self::UnbalancedBlock => write!(f, "unbalanced block"),
            Self::MismatchedClose { open, close } => {
                write!(f, "argument opened with '{open}' closed with '{close}'")
            }
            Self::MissingEndOfInput => write!(f, "missing end of input"),
            Self::NestingTooDeep { limit } => {
                write!(f, "elements nested more than {limit} levels deep")
            }
        }
    }
}

/// Error produced during parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// A block of the parse tree, with the tokens that delimit it.
///
/// For the top-level block `begin` is the first token of the stream and
/// `end` is `EndOfInput`; for an argument they are its opening and
/// closing brace runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBlock {
    pub begin: Token,
    pub end: Token,
    pub children: Vec<ParseNode>,
}

/// A node of the parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseNode {
    Text(ParseText),
    Element(ParseElement),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseText {
    pub token: Token,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseElement {
    pub token: Token,
    pub name: String,
    pub arguments: Vec<ParseBlock>,
}

impl ParseNode {
    /// The token this node starts at.
    #[must_use]
    pub const fn token(&self) -> &Token {
        match self {
            Self::Text(text) => &text.token,
            Self::Element(element) => &element.token,
        }
    }
}

/// Parse a token stream into a parse tree.
///
/// # Errors
///
/// Returns `ParseError` on an empty stream, unbalanced arguments, or
/// tokens out of place. Parsing stops at the first error.
pub fn parse(tokens: &[Token]) -> Result<ParseBlock, ParseError> {
    Parser::new(tokens).parse_top_level()
}

/// Deepest element nesting the parser accepts.
pub const MAX_NESTING: usize = 128;

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    const fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn parse_top_level(mut self) -> Result<ParseBlock, ParseError> {
        let Some(begin) = self.peek() else {
            return Err(ParseError {
                kind: ParseErrorKind::EmptyInput,
                span: Span::new(1, 1),
            });
        };

        let mut children = Vec::new();
        loop {
            let Some(token) = self.peek() else {
                return Err(ParseError {
                    kind: ParseErrorKind::MissingEndOfInput,
                    span: self.eof_span(),
                });
            };

            match token.kind {
                TokenKind::Text => {
                    children.push(Self::text_node(token));
                    self.pos += 1;
                }
                TokenKind::ElementName => {
                    children.push(ParseNode::Element(self.parse_element()?));
                }
                TokenKind::EndOfInput => {
                    self.pos += 1;
                    return Ok(ParseBlock {
                        begin: begin.clone(),
                        end: token.clone(),
                        children,
                    });
                }
                TokenKind::ArgumentOpen | TokenKind::ArgumentClose => {
                    return Err(ParseError {
                        kind: ParseErrorKind::UnexpectedToken {
                            expected: "text or element",
                            found: token.kind,
                        },
                        span: token.span,
                    });
                }
            }
        }
    }

    fn parse_element(&mut self) -> Result<ParseElement, ParseError> {
        let token = match self.peek() {
            Some(token) if token.kind == TokenKind::ElementName => token,
            Some(token) => {
                return Err(ParseError {
                    kind: ParseErrorKind::UnexpectedToken {
                        expected: "element name",
                        found: token.kind,
                    },
                    span: token.span,
                });
            }
            None => {
                return Err(ParseError {
                    kind: ParseErrorKind::MissingEndOfInput,
                    span: self.eof_span(),
                });
            }
        };
        self.pos += 1;

        if self.depth == MAX_NESTING {
            return Err(ParseError {
                kind: ParseErrorKind::NestingTooDeep { limit: MAX_NESTING },
                span: token.span,
            });
        }
        let name = token.text.strip_prefix('#').unwrap_or(&token.text);

        self.depth += 1;
        let mut arguments = Vec::new();
        while self
            .peek()
            .is_some_and(|t| t.kind == TokenKind::ArgumentOpen)
        {
            arguments.push(self.parse_argument()?);
        }
        self.depth -= 1;

        Ok(ParseElement {
            token: token.clone(),
            name: name.to_string(),
            arguments,
        })
    }

    fn parse_argument(&mut self) -> Result<ParseBlock, ParseError> {
        let open = match self.peek() {
            Some(token) if token.kind == TokenKind::ArgumentOpen => token,
            Some(token) => {
                return Err(ParseError {
                    kind: ParseErrorKind::UnexpectedToken {
                        expected: "argument open",
                        found: token.kind,
                    },
                    span: token.span,
                });
            }
            None => {
                return Err(ParseError {
                    kind: ParseErrorKind::UnbalancedBlock,
                    span: self.eof_span(),
                });
            }
        };
        self.pos += 1;

        let mut children = Vec::new();
        loop {
            let Some(token) = self.peek() else {
                return Err(ParseError {
                    kind: ParseErrorKind::UnbalancedBlock,
                    span: open.span,
                });
            };

            match token.kind {
                TokenKind::ArgumentClose => {
                    if token.text.len() != open.text.len() {
                        return Err(ParseError {
                            kind: ParseErrorKind::MismatchedClose {
                                open: open.text.clone(),
                                close: token.text.clone(),
                            },
                            span: token.span,
                        });
                    }
                    self.pos += 1;
                    return Ok(ParseBlock {
                        begin: open.clone(),
                        end: token.clone(),
                        children,
                    });
                }
                TokenKind::Text => {
                    children.push(Self::text_node(token));
                    self.pos += 1;
                }
                TokenKind::ElementName => {
                    children.push(ParseNode::Element(self.parse_element()?));
                }
                TokenKind::EndOfInput => {
                    return Err(ParseError {
                        kind: ParseErrorKind::UnbalancedBlock,
                        span: open.span,
                    });
                }
                TokenKind::ArgumentOpen => {
                    return Err(ParseError {
                        kind: ParseErrorKind::UnexpectedToken {
                            expected: "text, element or argument close",
                            found: token.kind,
                        },
                        span: token.span,
                    });
                }
            }
        }
    }

    fn text_node(token: &Token) -> ParseNode {
        ParseNode::Text(ParseText {
            token: token.clone(),
            text: token.text.clone(),
        })
    }

    fn eof_span(&self) -> Span {
        self.tokens.last().map_or(Span::new(1, 1), |last| last.span)
    }
}
