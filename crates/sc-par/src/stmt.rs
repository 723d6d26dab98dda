//! Statement and local-declaration parsing.

use crate::ast::{ArrayDecl, PointerDecl, Stmt, StmtKind, Ty, VarDecl};
use crate::bp;
use crate::error::ParseError;
use crate::parser::Parser;
use sc_lex::TokenKind;

impl<'a> Parser<'a> {
    pub(crate) fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(stmts)
    }

    pub(crate) fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let span = self.span_here();
        let kind = match self.peek_kind() {
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::Do => self.parse_do_while()?,
            TokenKind::Return => {
                self.advance();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr(bp::MIN)?)
                };
                self.expect(TokenKind::Semicolon, "';'")?;
                StmtKind::Return(value)
            }
            TokenKind::Break => {
                self.advance();
                self.expect(TokenKind::Semicolon, "';'")?;
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                self.expect(TokenKind::Semicolon, "';'")?;
                StmtKind::Continue
            }
            TokenKind::Register | TokenKind::Volatile | TokenKind::Uint32 | TokenKind::Int32 => {
                let kind = self.parse_decl_stmt()?;
                self.expect(TokenKind::Semicolon, "';'")?;
                kind
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus | TokenKind::Star | TokenKind::Identifier => {
                let kind = self.parse_simple_stmt()?;
                self.expect(TokenKind::Semicolon, "';'")?;
                kind
            }
            _ => {
                return Err(ParseError::UnexpectedToken {
                    expected: "a statement".to_string(),
                    found: self.peek_kind(),
                    span,
                })
            }
        };
        Ok(Stmt { kind, span })
    }

    fn parse_if(&mut self) -> Result<StmtKind, ParseError> {
        self.advance();
        self.expect(TokenKind::LParen, "'('")?;
        let condition = self.parse_expr(bp::MIN)?;
        self.expect(TokenKind::RParen, "')'")?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.eat(TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<StmtKind, ParseError> {
        self.advance();
        self.expect(TokenKind::LParen, "'('")?;
        let condition = self.parse_expr(bp::MIN)?;
        self.expect(TokenKind::RParen, "')'")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(StmtKind::While { condition, body })
    }

    fn parse_do_while(&mut self) -> Result<StmtKind, ParseError> {
        self.advance();
        let body = Box::new(self.parse_stmt()?);
        self.expect(TokenKind::While, "'while'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let condition = self.parse_expr(bp::MIN)?;
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(StmtKind::DoWhile { body, condition })
    }

    fn parse_for(&mut self) -> Result<StmtKind, ParseError> {
        self.advance();
        self.expect(TokenKind::LParen, "'('")?;

        let init = if self.check(TokenKind::Semicolon) {
            None
        } else {
            let span = self.span_here();
            let kind = match self.peek_kind() {
                TokenKind::Register | TokenKind::Volatile | TokenKind::Uint32 | TokenKind::Int32 => {
                    self.parse_decl_stmt()?
                }
                _ => self.parse_simple_stmt()?,
            };
            Some(Box::new(Stmt { kind, span }))
        };
        self.expect(TokenKind::Semicolon, "';'")?;

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr(bp::MIN)?)
        };
        self.expect(TokenKind::Semicolon, "';'")?;

        let step = if self.check(TokenKind::RParen) {
            None
        } else {
            let span = self.span_here();
            let kind = self.parse_simple_stmt()?;
            Some(Box::new(Stmt { kind, span }))
        };
        self.expect(TokenKind::RParen, "')'")?;

        let body = Box::new(self.parse_stmt()?);

        Ok(StmtKind::For {
            init,
            condition,
            step,
            body,
        })
    }

    /// Declarations: `[register] [volatile] (uint32|int32) name [*] [= expr | [size] [= {...}]];`
    /// Qualifiers may appear in either order, matching the grammar's
    /// "qualifiers in any order" allowance.
    fn parse_decl_stmt(&mut self) -> Result<StmtKind, ParseError> {
        let mut is_register = false;
        let mut is_volatile = false;
        loop {
            match self.peek_kind() {
                TokenKind::Register => {
                    is_register = true;
                    self.advance();
                }
                TokenKind::Volatile => {
                    is_volatile = true;
                    self.advance();
                }
                _ => break,
            }
        }

        let ty = match self.peek_kind() {
            TokenKind::Uint32 => Ty::Uint32,
            TokenKind::Int32 => Ty::Int32,
            _ => {
                return Err(ParseError::UnexpectedToken {
                    expected: "'uint32' or 'int32'".to_string(),
                    found: self.peek_kind(),
                    span: self.span_here(),
                })
            }
        };
        self.advance();

        let is_pointer = self.eat(TokenKind::Star);
        let name_tok = self.expect(TokenKind::Identifier, "an identifier")?;
        let name = self.intern(&name_tok.text);

        if is_pointer {
            let init = if self.eat(TokenKind::Eq) {
                Some(self.parse_expr(bp::MIN)?)
            } else {
                None
            };
            return Ok(StmtKind::Pointer(PointerDecl { name, init }));
        }

        if self.eat(TokenKind::LBracket) {
            let span = self.span_here();
            let size_tok = self.expect(TokenKind::IntLiteral, "an array size")?;
            let size: u32 = size_tok
                .text
                .parse()
                .map_err(|_| ParseError::InvalidArraySize { span: span.clone() })?;
            if size == 0 {
                return Err(ParseError::InvalidArraySize { span });
            }
            self.expect(TokenKind::RBracket, "']'")?;
            let init = if self.eat(TokenKind::Eq) {
                self.expect(TokenKind::LBrace, "'{'")?;
                let mut values = Vec::new();
                if !self.check(TokenKind::RBrace) {
                    loop {
                        values.push(self.parse_expr(bp::MIN)?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBrace, "'}'")?;
                Some(values)
            } else {
                None
            };
            return Ok(StmtKind::Array(ArrayDecl { name, size, init }));
        }

        let register_num = if is_register {
            parse_register_suffix(&name_tok.text)
        } else {
            None
        };

        let init = if self.eat(TokenKind::Eq) {
            Some(self.parse_expr(bp::MIN)?)
        } else {
            None
        };

        Ok(StmtKind::Var(VarDecl {
            name,
            ty,
            is_register,
            is_volatile,
            register_num,
            init,
        }))
    }

    /// Assignment, array assignment, pointer assignment, or pre/post
    /// increment/decrement — disambiguated by one token of lookahead past
    /// the leading identifier or `*`.
    fn parse_simple_stmt(&mut self) -> Result<StmtKind, ParseError> {
        match self.peek_kind() {
            TokenKind::PlusPlus => {
                self.advance();
                let name = self.expect_ident()?;
                Ok(StmtKind::Increment {
                    name,
                    is_prefix: true,
                })
            }
            TokenKind::MinusMinus => {
                self.advance();
                let name = self.expect_ident()?;
                Ok(StmtKind::Decrement {
                    name,
                    is_prefix: true,
                })
            }
            TokenKind::Star => {
                self.advance();
                let addr = self.parse_expr(bp::UNARY)?;
                self.expect(TokenKind::Eq, "'='")?;
                let value = self.parse_expr(bp::MIN)?;
                Ok(StmtKind::PointerAssignment { addr, value })
            }
            TokenKind::Identifier => {
                let tok = self.advance();
                let name = self.intern(&tok.text);
                match self.peek_kind() {
                    TokenKind::PlusPlus => {
                        self.advance();
                        Ok(StmtKind::Increment {
                            name,
                            is_prefix: false,
                        })
                    }
                    TokenKind::MinusMinus => {
                        self.advance();
                        Ok(StmtKind::Decrement {
                            name,
                            is_prefix: false,
                        })
                    }
                    TokenKind::LBracket => {
                        self.advance();
                        let index = self.parse_expr(bp::MIN)?;
                        self.expect(TokenKind::RBracket, "']'")?;
                        self.expect(TokenKind::Eq, "'='")?;
                        let value = self.parse_expr(bp::MIN)?;
                        Ok(StmtKind::ArrayAssignment { name, index, value })
                    }
                    TokenKind::Eq => {
                        self.advance();
                        let value = self.parse_expr(bp::MIN)?;
                        Ok(StmtKind::Assignment { name, value })
                    }
                    TokenKind::LParen => {
                        self.advance();
                        let args = self.parse_call_args_public()?;
                        Ok(StmtKind::FunctionCallStmt(crate::ast::Expr::Call {
                            name,
                            args,
                        }))
                    }
                    _ => Err(ParseError::UnexpectedToken {
                        expected: "'=', '[', '(', '++', or '--'".to_string(),
                        found: self.peek_kind(),
                        span: self.span_here(),
                    }),
                }
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "a statement".to_string(),
                found: self.peek_kind(),
                span: self.span_here(),
            }),
        }
    }

    fn expect_ident(&mut self) -> Result<crate::ast::Ident, ParseError> {
        let tok = self.expect(TokenKind::Identifier, "an identifier")?;
        Ok(self.intern(&tok.text))
    }

    fn parse_call_args_public(&mut self) -> Result<Vec<crate::ast::Expr>, ParseError> {
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

/// Extracts the architectural register number from `register uint32 rN;`
/// variable names. Returns `None` for anything that isn't a well-formed
/// `rN` name; `validate()` turns that into an `InvalidRegisterName` error
/// with proper span context.
fn parse_register_suffix(name: &str) -> Option<u8> {
    let digits = name.strip_prefix('r')?;
    let n: u32 = digits.parse().ok()?;
    (n <= 31).then_some(n as u8)
}
