//! Runtime errors: spec error kind 4, "semantic/runtime (interpreter)".

use sc_util::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("program has no 'main' function")]
    MissingMain,

    #[error("'{name}' expects {expected} argument(s), got {found}")]
    ArgCountMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("{span}: undefined variable '{name}'")]
    UndefinedVariable { name: String, span: Span },

    #[error("{span}: undefined function '{name}'")]
    UndefinedFunction { name: String, span: Span },

    #[error("{span}: division by zero")]
    DivByZero { span: Span },

    #[error("{span}: modulo by zero")]
    ModByZero { span: Span },

    #[error("r31 is the instruction pointer and cannot be written at runtime")]
    R31Write,

    #[error("{span}: index {index} out of bounds for array '{name}' of size {size}")]
    ArrayOutOfBounds {
        name: String,
        index: u32,
        size: u32,
        span: Span,
    },

    #[error("{span}: dereference of address {address:#x} does not refer to a known variable or array element")]
    InvalidDereference { address: u32, span: Span },

    #[error("{span}: address-of operand is not an addressable place")]
    NotAddressable { span: Span },

    #[error("{span}: GPIO pin {pin} accessed before gpio_set configured it")]
    UnconfiguredGpio { pin: u32, span: Span },

    #[error("'{name}' expects {expected} argument(s), got {found}")]
    BuiltinArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}
