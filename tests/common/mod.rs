#![allow(dead_code)]

use textml::template::{Config, Engine};
use textml::{Block, Error, EvalError, TokenKind, parse_str, tokenize};

/// Token kinds and texts, without positions.
pub fn tokens(input: &str) -> Vec<(TokenKind, String)> {
    tokenize(input)
        .expect("tokenize failed")
        .into_iter()
        .map(|t| (t.kind, t.text))
        .collect()
}

pub fn compile(input: &str) -> Block {
    parse_str(input).unwrap_or_else(|e| panic!("failed to compile {input:?}: {e}"))
}

/// Evaluate `input` with a fresh engine.
pub fn eval(input: &str) -> Result<String, EvalError> {
    eval_with(Engine::new(Config::default()), input)
}

/// Evaluate `input` with a prepared engine.
pub fn eval_with(mut engine: Engine, input: &str) -> Result<String, EvalError> {
    engine.evaluate(&compile(input))
}

pub fn eval_ok(input: &str) -> String {
    eval(input).unwrap_or_else(|e| panic!("failed to evaluate {input:?}: {e}"))
}

pub fn eval_err(input: &str) -> EvalError {
    match eval(input) {
        Ok(output) => panic!("expected {input:?} to fail, got {output:?}"),
        Err(e) => e,
    }
}

pub fn is_lex_error(err: &Error) -> bool {
    matches!(err, Error::Lex(_))
}
