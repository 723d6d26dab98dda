//! Top-level item parsing: global declarations and function definitions.

use crate::ast::{ArrayDecl, FunctionDef, GlobalDecl, PointerDecl, Program, Ty, VarDecl};
use crate::bp;
use crate::error::ParseError;
use crate::parser::Parser;
use sc_lex::TokenKind;

impl<'a> Parser<'a> {
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::default();
        while !self.at_eof() {
            if self.check(TokenKind::Function) || self.check(TokenKind::Interrupt) {
                program.functions.push(self.parse_function()?);
            } else {
                program.globals.push(self.parse_global_decl()?);
            }
        }
        Ok(program)
    }

    fn parse_function(&mut self) -> Result<FunctionDef, ParseError> {
        let span = self.span_here();
        let is_interrupt = self.eat(TokenKind::Interrupt);
        self.expect(TokenKind::Function, "'function'")?;
        let name_tok = self.expect(TokenKind::Identifier, "a function name")?;
        let name = self.intern(&name_tok.text);

        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let param_tok = self.expect(TokenKind::Identifier, "a parameter name")?;
                params.push(self.intern(&param_tok.text));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        let body = self.parse_block()?;

        Ok(FunctionDef {
            name,
            params,
            body,
            is_interrupt,
            span,
        })
    }

    /// Globals share the declaration grammar used for locals but are parsed
    /// directly into `GlobalDecl` rather than wrapped in a `Stmt`, since a
    /// global isn't part of any function's statement list.
    fn parse_global_decl(&mut self) -> Result<GlobalDecl, ParseError> {
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
                    expected: "'uint32', 'int32', or 'function'".to_string(),
                    found: self.peek_kind(),
                    span: self.span_here(),
                })
            }
        };
        self.advance();

        let is_pointer = self.eat(TokenKind::Star);
        let name_tok = self.expect(TokenKind::Identifier, "an identifier")?;
        let name = self.intern(&name_tok.text);

        let decl = if is_pointer {
            let init = if self.eat(TokenKind::Eq) {
                Some(self.parse_expr(bp::MIN)?)
            } else {
                None
            };
            GlobalDecl::Pointer(PointerDecl { name, init })
        } else if self.eat(TokenKind::LBracket) {
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
            GlobalDecl::Array(ArrayDecl { name, size, init })
        } else {
            let register_num = if is_register {
                name_tok
                    .text
                    .strip_prefix('r')
                    .and_then(|d| d.parse::<u32>().ok())
                    .filter(|n| *n <= 31)
                    .map(|n| n as u8)
            } else {
                None
            };
            let init = if self.eat(TokenKind::Eq) {
                Some(self.parse_expr(bp::MIN)?)
            } else {
                None
            };
            GlobalDecl::Var(VarDecl {
                name,
                ty,
                is_register,
                is_volatile,
                register_num,
                init,
            })
        };

        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(decl)
    }
}
