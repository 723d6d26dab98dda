//! Binding powers for the expression precedence-climbing parser.
//!
//! Levels mirror the language's twelve-level precedence table, lowest to
//! highest. Binary operators bind left-associatively: a level's right-hand
//! recursive call uses the *next* level up so that e.g. `a - b - c` parses
//! as `(a - b) - c`.

use sc_lex::TokenKind;

pub const MIN: u8 = 0;
pub const LOGICAL_OR: u8 = 2;
pub const LOGICAL_AND: u8 = 4;
pub const BITWISE_OR: u8 = 6;
pub const BITWISE_XOR: u8 = 8;
pub const BITWISE_AND: u8 = 10;
pub const EQUALITY: u8 = 12;
pub const RELATIONAL: u8 = 14;
pub const SHIFT: u8 = 16;
pub const ADDITIVE: u8 = 18;
pub const MULTIPLICATIVE: u8 = 20;
pub const UNARY: u8 = 22;
pub const POSTFIX: u8 = 24;

use crate::ast::BinOp;

/// Returns the left binding power of `kind` as an infix binary operator,
/// along with the `BinOp` it denotes, or `None` if it isn't one.
pub fn infix_binding_power(kind: TokenKind) -> Option<(u8, BinOp)> {
    use TokenKind::*;
    let pair = match kind {
        PipePipe => (LOGICAL_OR, BinOp::LogOr),
        AmpAmp => (LOGICAL_AND, BinOp::LogAnd),
        Pipe => (BITWISE_OR, BinOp::BitOr),
        Caret => (BITWISE_XOR, BinOp::BitXor),
        Amp => (BITWISE_AND, BinOp::BitAnd),
        EqEq => (EQUALITY, BinOp::Eq),
        NotEq => (EQUALITY, BinOp::Ne),
        Lt => (RELATIONAL, BinOp::Lt),
        Le => (RELATIONAL, BinOp::Le),
        Gt => (RELATIONAL, BinOp::Gt),
        Ge => (RELATIONAL, BinOp::Ge),
        Shl => (SHIFT, BinOp::Shl),
        Shr => (SHIFT, BinOp::Shr),
        Plus => (ADDITIVE, BinOp::Add),
        Minus => (ADDITIVE, BinOp::Sub),
        Star => (MULTIPLICATIVE, BinOp::Mul),
        Slash => (MULTIPLICATIVE, BinOp::Div),
        Percent => (MULTIPLICATIVE, BinOp::Mod),
        _ => return None,
    };
    Some(pair)
}
