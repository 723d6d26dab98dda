//! Code generator errors: spec error kind 5, "emission".

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmitError {
    #[error("function '{name}' declares {count} locals, exceeding the fixed pool of {max}")]
    TooManyLocals { name: String, count: usize, max: usize },

    #[error("unknown operator in expression lowering: {op}")]
    UnknownOperator { op: String },

    #[error("array '{name}' size must be a literal known at emission time")]
    NonLiteralArraySize { name: String },

    #[error("'&' operand is not an addressable place")]
    InvalidAddressOfOperand,

    #[error("undefined variable '{name}' referenced during emission")]
    UndefinedVariable { name: String },

    #[error("undefined function '{name}' referenced during emission")]
    UndefinedFunction { name: String },

    #[error("register variable name must be r0..r31, found '{name}'")]
    InvalidRegisterName { name: String },

    #[error("builtin '{name}' expects {expected} argument(s), found {found}")]
    BuiltinArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}
