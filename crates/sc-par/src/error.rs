//! Parser error type.

use sc_lex::TokenKind;
use sc_util::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("{span}: expected {expected}, found {found:?}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        span: Span,
    },

    #[error("{span}: lexical error: {message}")]
    LexError { message: String, span: Span },

    #[error("{span}: array size must be a positive integer literal")]
    InvalidArraySize { span: Span },

    #[error("{span}: register variable name must be r0..r31, found '{name}'")]
    InvalidRegisterName { name: String, span: Span },

    #[error("{span}: r31 is the instruction pointer and is not assignable from source")]
    R31NotAssignable { span: Span },

    #[error("{span}: interrupt-marked functions must take zero parameters")]
    InterruptHasParams { span: Span },

    #[error("program must define exactly one zero-parameter function named 'main' (found {count})")]
    MainCount { count: usize },

    #[error("{span}: integer literal '{text}' is out of range")]
    BadIntLiteral { text: String, span: Span },
}
