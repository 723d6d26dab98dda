//! Expression parsing: precedence climbing over the binding-power table in
//! [`crate::bp`], plus prefix unary and postfix call/index handling.

use crate::ast::{Expr, UnOp};
use crate::bp;
use crate::error::ParseError;
use crate::parser::Parser;
use sc_lex::TokenKind;

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;

        loop {
            let Some((bp_here, op)) = bp::infix_binding_power(self.peek_kind()) else {
                break;
            };
            if bp_here < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(bp_here + 2)?;
            lhs = Expr::Binary {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    /// Prefix unary operators: `-`, `!`, `~`, `&` (address-of), `*`
    /// (dereference). All are right-associative, so the operand is itself
    /// parsed at unary binding power.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind() {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_expr(bp::UNARY)?;
                Ok(Expr::Unary {
                    op: UnOp::Neg,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Bang => {
                self.advance();
                let operand = self.parse_expr(bp::UNARY)?;
                Ok(Expr::Unary {
                    op: UnOp::Not,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Tilde => {
                self.advance();
                let operand = self.parse_expr(bp::UNARY)?;
                Ok(Expr::Unary {
                    op: UnOp::BitNot,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Amp => {
                self.advance();
                let operand = self.parse_expr(bp::UNARY)?;
                Ok(Expr::AddressOf(Box::new(operand)))
            }
            TokenKind::Star => {
                self.advance();
                let operand = self.parse_expr(bp::UNARY)?;
                Ok(Expr::Dereference(Box::new(operand)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind() {
            TokenKind::IntLiteral => {
                let tok = self.advance();
                let value = parse_int_literal(&tok.text).map_err(|_| ParseError::BadIntLiteral {
                    text: tok.text.clone(),
                    span: sc_util::Span::new(None, tok.line, tok.column),
                })?;
                Ok(Expr::Literal(value))
            }
            TokenKind::Identifier => {
                let tok = self.advance();
                let name = self.intern(&tok.text);
                match self.peek_kind() {
                    TokenKind::LParen => {
                        self.advance();
                        let args = self.parse_call_args()?;
                        Ok(Expr::Call { name, args })
                    }
                    TokenKind::LBracket => {
                        self.advance();
                        let index = self.parse_expr(bp::MIN)?;
                        self.expect(TokenKind::RBracket, "']'")?;
                        Ok(Expr::ArrayAccess {
                            name,
                            index: Box::new(index),
                        })
                    }
                    _ => Ok(Expr::Identifier(name)),
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr(bp::MIN)?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "an expression".to_string(),
                found: self.peek_kind(),
                span: self.span_here(),
            }),
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr(bp::MIN)?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(args)
    }
}

fn parse_int_literal(text: &str) -> Result<u32, ()> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|_| ())
    } else {
        text.parse::<u32>().map_err(|_| ())
    }
}

